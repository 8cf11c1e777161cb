mod model;

use candle_core::{Device, Tensor};
use framecap::{
    Calibration, DeviceProbe, FixedCapacity, FrameLimitInputs, FrameLimitNode, ModelHandle,
    ModelInfoNode, NvidiaSmiProbe,
};
use crate::model::{declared_width_model, opaque_model};

fn main() {
    env_logger::init();

    let calibration = match std::env::args().nth(1) {
        Some(path) => match Calibration::from_toml_file(&path) {
            Ok(calibration) => calibration,
            Err(e) => {
                eprintln!("Err loading calibration {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => Calibration::default(),
    };

    let device = Device::Cpu;
    let models = match (declared_width_model(&device), opaque_model(&device)) {
        (Ok(declared), Ok(opaque)) => [declared, opaque],
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Err building models: {:?}", e);
            std::process::exit(1);
        }
    };

    let info = ModelInfoNode::new(calibration.clone());
    let detected = FrameLimitNode::new(NvidiaSmiProbe::default()).with_calibration(calibration.clone());
    let workstation = FrameLimitNode::new(FixedCapacity::bytes(24 << 30)).with_calibration(calibration);

    let inputs = FrameLimitInputs {
        width: 1280,
        height: 720,
        duration: 30.0,
        ..FrameLimitInputs::default()
    };

    for model in models.iter() {
        println!("{}\n", info.execute(Some(model)).text);
        report("detected", &detected, &inputs, model);
        report("24 GiB", &workstation, &inputs, model);
    }
}

fn report<P: DeviceProbe>(name: &str, node: &FrameLimitNode<P>, inputs: &FrameLimitInputs, model: &ModelHandle<Tensor>) {
    match node.execute(inputs, Some(model)) {
        Ok(output) => println!(
            "[{}] {} frames ({:.2}s)\n{}\n",
            name, output.capped_frames, output.capped_duration, output.text
        ),
        Err(e) => println!("[{}] Err: {}", name, e),
    }
}
