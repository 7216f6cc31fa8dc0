//! Backend abstraction
//!
//! Selects the compute backend at compile time: the NdArray CPU backend by
//! default, or CUDA when the `cuda` feature is enabled. The runtime hardware
//! preference is resolved against what was compiled in, falling back to
//! general-purpose compute with a logged warning when no accelerator exists.

use burn::backend::Autodiff;
use tracing::{info, warn};

use crate::config::Hardware;

#[cfg(feature = "cuda")]
pub type DefaultBackend = burn_cuda::Cuda;

#[cfg(not(feature = "cuda"))]
pub type DefaultBackend = burn::backend::NdArray<f32>;

/// The autodiff backend used for training
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Device type of the default backend
pub type DefaultDevice = <DefaultBackend as burn::tensor::backend::Backend>::Device;

/// Whether an accelerator backend was compiled in
pub fn accelerator_available() -> bool {
    cfg!(feature = "cuda")
}

/// Get a human-readable name for the current backend
pub fn backend_name() -> &'static str {
    #[cfg(feature = "cuda")]
    {
        "CUDA (GPU)"
    }
    #[cfg(not(feature = "cuda"))]
    {
        "NdArray (CPU)"
    }
}

/// Get the default device for the compiled backend
pub fn default_device() -> DefaultDevice {
    #[cfg(feature = "cuda")]
    {
        burn_cuda::CudaDevice::default()
    }
    #[cfg(not(feature = "cuda"))]
    {
        burn::backend::ndarray::NdArrayDevice::Cpu
    }
}

/// Resolve the requested hardware preference to a concrete device.
///
/// Requesting an accelerator without one compiled in is not an error: the
/// run proceeds on CPU, and the fallback is logged rather than silent.
pub fn select_device(hardware: Hardware) -> DefaultDevice {
    match hardware {
        Hardware::Accelerator if accelerator_available() => {
            info!("Using accelerator backend: {}", backend_name());
        }
        Hardware::Accelerator => {
            warn!(
                "Accelerator requested but none available; falling back to {}",
                backend_name()
            );
        }
        Hardware::Cpu => {
            info!("Using general-purpose backend: {}", backend_name());
        }
    }
    default_device()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_device_never_panics() {
        let _ = select_device(Hardware::Cpu);
        let _ = select_device(Hardware::Accelerator);
    }

    #[test]
    fn test_backend_name_matches_feature() {
        if accelerator_available() {
            assert!(backend_name().contains("CUDA"));
        } else {
            assert!(backend_name().contains("CPU"));
        }
    }
}
