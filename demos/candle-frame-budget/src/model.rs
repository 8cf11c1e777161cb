use candle_core::{DType, Device, Result, Tensor};
use framecap::ModelHandle;

/// A toy transformer that declares its width on a nested config only.
///
/// Mirrors how a host framework wraps a model: a patcher holding the base
/// model holding the diffusion transformer.
pub fn declared_width_model(device: &Device) -> Result<ModelHandle<Tensor>> {
    let transformer = ModelHandle::new("ToyVideoTransformer")
        .with_child("config", ModelHandle::new("ToyConfig").with_attribute("d_model", 1024))
        .with_parameters(layers(device, 2, 1024)?);

    Ok(ModelHandle::new("ModelPatcher").with_child(
        "model",
        ModelHandle::new("ToyBase")
            .with_attribute("model_type", "FLOW")
            .with_child("diffusion_model", transformer),
    ))
}

/// The same weights with nothing declared, so only the parameter count is left
pub fn opaque_model(device: &Device) -> Result<ModelHandle<Tensor>> {
    Ok(ModelHandle::new("GGUFModelPatcher")
        .with_child("model", ModelHandle::new("Opaque").with_parameters(layers(device, 2, 1024)?)))
}

/// `depth` blocks of attention and MLP weights at `width`
fn layers(device: &Device, depth: usize, width: usize) -> Result<Vec<Tensor>> {
    let mut tensors = Vec::with_capacity(depth * 4);
    for _ in 0..depth {
        tensors.push(Tensor::zeros(&[3 * width, width], DType::F16, device)?);
        tensors.push(Tensor::zeros(&[width, width], DType::F16, device)?);
        tensors.push(Tensor::zeros(&[4 * width, width], DType::F16, device)?);
        tensors.push(Tensor::zeros(&[width, 4 * width], DType::F16, device)?);
    }
    Ok(tensors)
}
