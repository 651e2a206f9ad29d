//! Compute backends for result buffers.
//!
//! Provides CPU (rayon) and wgpu backends with automatic selection.

mod cpu_backend;
mod detect;
mod gpu_primitives;

#[cfg(feature = "wgpu")]
mod wgpu_backend;

pub use cpu_backend::{CpuImage, CpuPrimitives};
pub use detect::{BackendInfo, describe_backends, detect_backends, select_best_backend};
pub use gpu_primitives::{GpuPrimitives, ImageHandle};

#[cfg(feature = "wgpu")]
pub use wgpu_backend::{WgpuImage, WgpuPrimitives};

use std::str::FromStr;

use crate::ComputeError;

/// Available compute backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// Auto-select best available (wgpu > CPU).
    #[default]
    Auto,
    /// CPU backend using rayon for parallelization.
    Cpu,
    /// wgpu backend (Vulkan/Metal/DX12).
    Wgpu,
}

impl Backend {
    /// Check if this backend is available on current system.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Auto => true,
            Self::Cpu => true,
            #[cfg(feature = "wgpu")]
            Self::Wgpu => WgpuPrimitives::is_available(),
            #[cfg(not(feature = "wgpu"))]
            Self::Wgpu => false,
        }
    }

    /// Get human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Cpu => "cpu",
            Self::Wgpu => "wgpu",
        }
    }
}

impl FromStr for Backend {
    type Err = ComputeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "cpu" => Ok(Self::Cpu),
            "wgpu" | "gpu" => Ok(Self::Wgpu),
            other => Err(ComputeError::BackendNotAvailable(format!(
                "unknown backend '{other}'"
            ))),
        }
    }
}
