//! Backend primitives shared by the CPU and wgpu paths.

use compositor_core::Domain;

use crate::ComputeResult;
use crate::kernel::ConversionKernel;

/// Handle to a result buffer owned by a backend.
pub trait ImageHandle: Send + Sync {
    /// Extent of the buffer.
    fn domain(&self) -> Domain;

    /// f32 channels per element.
    fn channels(&self) -> usize;

    /// Width.
    fn width(&self) -> u32 {
        self.domain().width()
    }

    /// Height.
    fn height(&self) -> u32 {
        self.domain().height()
    }

    /// Size in bytes of backend memory used.
    fn size_bytes(&self) -> u64 {
        (self.domain().buffer_len(self.channels()) as u64) * 4 // f32
    }
}

/// Core backend operations.
///
/// A conversion over a buffer is always `allocate` followed by
/// `exec_conversion`, so the output never aliases the input.
pub trait GpuPrimitives: Send + Sync {
    /// Backend-specific buffer handle type.
    type Handle: ImageHandle;

    /// Upload host data into a new buffer.
    fn upload(&self, data: &[f32], domain: Domain, channels: usize) -> ComputeResult<Self::Handle>;

    /// Read a buffer back to host memory.
    fn download(&self, handle: &Self::Handle) -> ComputeResult<Vec<f32>>;

    /// Allocate an output buffer. Contents are unspecified until written.
    fn allocate(&self, domain: Domain, channels: usize) -> ComputeResult<Self::Handle>;

    /// Run `kernel` over every element of `src`, writing into `dst`.
    fn exec_conversion(
        &self,
        kernel: ConversionKernel,
        src: &Self::Handle,
        dst: &mut Self::Handle,
    ) -> ComputeResult<()>;

    /// Backend name.
    fn name(&self) -> &'static str;
}
