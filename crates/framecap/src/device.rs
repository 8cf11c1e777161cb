//! # Device Probes
//!
//! Where the budgeter's memory capacity comes from. A probe answers one
//! question: is there a compatible accelerator, and if so how much memory does
//! it have in total. Any failure to answer is reported as "no accelerator",
//! which disables frame limiting rather than limiting to zero.
//!
//! Capacity is read once per node execution and treated as a snapshot.

use std::process::Command;

/// Reports the total memory of the accelerator frames will be budgeted against
pub trait DeviceProbe {
    /// Total device memory in bytes, or `None` if no compatible device is available
    fn total_memory(&self) -> Option<u64>;
}

impl<P> DeviceProbe for &P
where
    P: DeviceProbe + ?Sized,
{
    fn total_memory(&self) -> Option<u64> {
        (**self).total_memory()
    }
}

/// A capacity known up front, e.g. from configuration or a test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedCapacity(pub Option<u64>);

impl FixedCapacity {
    pub fn bytes(bytes: u64) -> Self {
        Self(Some(bytes))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl DeviceProbe for FixedCapacity {
    fn total_memory(&self) -> Option<u64> {
        self.0
    }
}

/// Queries an NVIDIA device through `nvidia-smi`.
///
/// With the `candle` feature the probe first asks candle whether it can use
/// CUDA at all; a GPU candle cannot drive is not a compatible accelerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NvidiaSmiProbe {
    program: String,
    device_index: u32,
}

impl Default for NvidiaSmiProbe {
    fn default() -> Self {
        Self {
            program: "nvidia-smi".to_string(),
            device_index: 0,
        }
    }
}

impl NvidiaSmiProbe {
    pub fn new(device_index: u32) -> Self {
        Self {
            device_index,
            ..Self::default()
        }
    }

    /// Use a different executable, e.g. an absolute path
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn query(&self) -> Option<u64> {
        let output = Command::new(&self.program)
            .arg("--query-gpu=memory.total")
            .arg("--format=csv,noheader,nounits")
            .arg(format!("--id={}", self.device_index))
            .output();

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                log::debug!("{} unavailable: {}", self.program, e);
                return None;
            }
        };
        if !output.status.success() {
            log::debug!("{} exited with {}", self.program, output.status);
            return None;
        }

        let bytes = parse_total_memory(&String::from_utf8_lossy(&output.stdout));
        if bytes.is_none() {
            log::debug!("could not parse {} output", self.program);
        }
        bytes
    }
}

impl DeviceProbe for NvidiaSmiProbe {
    fn total_memory(&self) -> Option<u64> {
        #[cfg(feature = "candle")]
        if !candle_core::utils::cuda_is_available() {
            log::debug!("candle was built without CUDA, treating device as absent");
            return None;
        }

        self.query()
    }
}

/// Parse the first line of `memory.total` output, given in MiB
fn parse_total_memory(raw: &str) -> Option<u64> {
    let mebibytes: u64 = raw.lines().next()?.trim().parse().ok()?;
    if mebibytes == 0 {
        return None;
    }
    mebibytes.checked_mul(1024 * 1024)
}
