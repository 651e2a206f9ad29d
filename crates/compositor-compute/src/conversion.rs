//! Conversion operation inserted between a producer and a consumer whose
//! value types disagree.
//!
//! If the input is a single value, the kernel's single-value form runs on
//! the calling thread. Otherwise the kernel shader is dispatched on GPU
//! contexts, and the per-element loop runs on CPU contexts.

use compositor_core::{Error, InputDescriptor, ValueType};
use tracing::{debug, trace};

use crate::backend::{GpuPrimitives, ImageHandle};
use crate::context::{ComputeDevice, ExecutionContext};
use crate::kernel::ConversionKernel;
use crate::result::{Storage, TypedResult};
use crate::ComputeResult;

/// A one-shot conversion bound to an execution context.
#[derive(Debug, Clone, Copy)]
pub struct ConversionOperation<'a> {
    context: &'a ExecutionContext,
    kernel: ConversionKernel,
}

impl<'a> ConversionOperation<'a> {
    pub fn new(context: &'a ExecutionContext, kernel: ConversionKernel) -> Self {
        Self { context, kernel }
    }

    /// Conversion needed to feed `input_result` into an input described by
    /// `input_descriptor`, or `None` if the result can be passed through
    /// unchanged.
    pub fn construct_if_needed(
        context: &'a ExecutionContext,
        input_result: &TypedResult,
        input_descriptor: &InputDescriptor,
    ) -> Option<Self> {
        if input_descriptor.skip_type_conversion() {
            trace!(ty = %input_result.value_type(), "Type conversion skipped by descriptor");
            return None;
        }

        let kernel =
            ConversionKernel::for_types(input_result.value_type(), input_descriptor.value_type())?;
        Some(Self::new(context, kernel))
    }

    pub fn kernel(&self) -> ConversionKernel {
        self.kernel
    }

    pub fn source_type(&self) -> ValueType {
        self.kernel.source()
    }

    pub fn target_type(&self) -> ValueType {
        self.kernel.target()
    }

    /// Convert `input`, returning a new result of the target type over the
    /// same domain. `input` is left untouched.
    ///
    /// Buffer inputs must live on the context's backend.
    pub fn execute(&self, input: &TypedResult) -> ComputeResult<TypedResult> {
        let kernel = self.kernel;
        if input.value_type() != kernel.source() {
            return Err(Error::TypeMismatch {
                expected: kernel.source(),
                actual: input.value_type(),
            }
            .into());
        }

        let target = kernel.target();
        let output = match (input.storage(), self.context.device()) {
            (Storage::Single(value), _) => {
                debug!(%kernel, "Converting single value");
                TypedResult::single(kernel.execute_single(value)?)
            }
            (Storage::Cpu(image), ComputeDevice::Cpu(cpu)) => {
                debug!(%kernel, domain = %image.domain(), "Converting on CPU");
                TypedResult::from_cpu(target, run_kernel(cpu, kernel, image)?)?
            }
            #[cfg(feature = "wgpu")]
            (Storage::Gpu(image), ComputeDevice::Wgpu(gpu)) => {
                debug!(%kernel, domain = %image.domain(), "Converting on GPU");
                TypedResult::from_gpu(target, run_kernel(gpu, kernel, image)?)?
            }
            #[cfg(feature = "wgpu")]
            (storage, device) => {
                return Err(crate::ComputeError::StorageMismatch {
                    expected: device.name(),
                    actual: storage.location(),
                });
            }
        };

        debug_assert_eq!(output.domain(), input.domain());
        Ok(output)
    }
}

/// Allocate an output of the kernel's target type and run the kernel over
/// the whole domain.
fn run_kernel<G: GpuPrimitives>(
    gpu: &G,
    kernel: ConversionKernel,
    src: &G::Handle,
) -> ComputeResult<G::Handle> {
    let mut dst = gpu.allocate(src.domain(), kernel.target().channel_count())?;
    gpu.exec_conversion(kernel, src, &mut dst)?;
    Ok(dst)
}

/// Pass `result` through when it already matches `descriptor`, convert it
/// otherwise.
pub fn convert_if_needed(
    context: &ExecutionContext,
    result: TypedResult,
    descriptor: &InputDescriptor,
) -> ComputeResult<TypedResult> {
    match ConversionOperation::construct_if_needed(context, &result, descriptor) {
        Some(operation) => operation.execute(&result),
        None => {
            trace!(ty = %result.value_type(), "No conversion needed");
            Ok(result)
        }
    }
}
