//! Typed result conversion for compositor graphs.
//!
//! When a result's type differs from what the consuming input expects, a
//! conversion operation is inserted between producer and consumer. Each of
//! the six conversions runs in one of three forms: a single-value form on the
//! calling thread, a per-element CPU loop (rayon), or a wgpu compute shader.
//!
//! # Architecture
//!
//! ```text
//! ConversionOperation (construct_if_needed / execute)
//!     └── ExecutionContext (config, backend)
//!             └── GpuPrimitives trait
//!                     ├── CpuPrimitives (rayon)
//!                     └── WgpuPrimitives (compute shaders)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use compositor_compute::{ConversionOperation, ExecutionContext};
//! use compositor_core::{Domain, InputDescriptor, ValueType};
//!
//! let context = ExecutionContext::cpu();
//! let domain = Domain::new(2, 1)?;
//! let mask = context.upload(ValueType::Float, domain, &[0.25, 0.75])?;
//!
//! let input = InputDescriptor::new(ValueType::Color);
//! if let Some(op) = ConversionOperation::construct_if_needed(&context, &mask, &input) {
//!     let color = op.execute(&mask)?;
//!     assert_eq!(color.value_type(), ValueType::Color);
//! }
//! ```

pub mod backend;
pub mod context;
pub mod conversion;
pub mod kernel;
pub mod result;
mod shaders;

pub use backend::{Backend, detect_backends, describe_backends, select_best_backend};
pub use context::{ContextConfig, ExecutionContext, PowerPreference};
pub use conversion::{ConversionOperation, convert_if_needed};
pub use kernel::{ConversionKernel, KernelSpec};
pub use result::{Storage, TypedResult};

use thiserror::Error;

/// Compute operation errors
#[derive(Error, Debug)]
pub enum ComputeError {
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    #[error("Backend not available: {0}")]
    BackendNotAvailable(String),

    #[error("Failed to create device: {0}")]
    DeviceCreation(String),

    #[error("Failed to compile shader: {0}")]
    ShaderCompilation(String),

    #[error("Result stored on {actual}, context expects {expected}")]
    StorageMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Buffer of {requested} bytes exceeds device limit of {limit} bytes")]
    ResourceExhausted { requested: u64, limit: u64 },

    #[error("GPU operation failed: {0}")]
    OperationFailed(String),

    #[error(transparent)]
    Core(#[from] compositor_core::Error),
}

pub type ComputeResult<T> = Result<T, ComputeError>;
