//! CPU backend using rayon for parallelization.

use compositor_core::{Domain, Error, ValueType};

use super::gpu_primitives::{GpuPrimitives, ImageHandle};
use crate::ComputeResult;
use crate::kernel::ConversionKernel;

/// Domains smaller than this run the per-element loop on the calling
/// thread even when parallelism is enabled.
const PARALLEL_MIN_PIXELS: usize = 4096;

/// CPU buffer handle - data stored in RAM, row-major, `channels` f32 per element.
#[derive(Clone, PartialEq)]
pub struct CpuImage {
    data: Vec<f32>,
    domain: Domain,
    channels: usize,
}

impl CpuImage {
    /// Wrap host data.
    ///
    /// Fails with `BufferSizeMismatch` unless
    /// `data.len() == domain.buffer_len(channels)`.
    pub fn from_vec(data: Vec<f32>, domain: Domain, channels: usize) -> ComputeResult<Self> {
        let expected = domain.buffer_len(channels);
        if data.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: data.len(),
            }
            .into());
        }
        Ok(Self {
            data,
            domain,
            channels,
        })
    }

    /// Zero-filled buffer.
    pub fn zeroed(domain: Domain, channels: usize) -> Self {
        Self {
            data: vec![0.0; domain.buffer_len(channels)],
            domain,
            channels,
        }
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Fail with `ChannelMismatch` unless elements hold `value_type`.
    pub fn ensure_layout(&self, value_type: ValueType) -> compositor_core::Result<()> {
        let expected = value_type.channel_count();
        if self.channels != expected {
            return Err(Error::ChannelMismatch {
                value_type,
                expected,
                got: self.channels,
            });
        }
        Ok(())
    }

    /// Channels of the element at `index` (row-major).
    pub fn element(&self, index: usize) -> &[f32] {
        let start = index * self.channels;
        &self.data[start..start + self.channels]
    }
}

impl ImageHandle for CpuImage {
    fn domain(&self) -> Domain {
        self.domain
    }

    fn channels(&self) -> usize {
        self.channels
    }
}

impl std::fmt::Debug for CpuImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuImage")
            .field("domain", &self.domain)
            .field("channels", &self.channels)
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

/// CPU primitives implementation.
#[derive(Debug, Clone)]
pub struct CpuPrimitives {
    parallel: bool,
}

impl CpuPrimitives {
    pub fn new(parallel: bool) -> Self {
        Self { parallel }
    }
}

impl Default for CpuPrimitives {
    fn default() -> Self {
        Self::new(true)
    }
}

impl GpuPrimitives for CpuPrimitives {
    type Handle = CpuImage;

    fn upload(&self, data: &[f32], domain: Domain, channels: usize) -> ComputeResult<Self::Handle> {
        CpuImage::from_vec(data.to_vec(), domain, channels)
    }

    fn download(&self, handle: &Self::Handle) -> ComputeResult<Vec<f32>> {
        Ok(handle.data.clone())
    }

    fn allocate(&self, domain: Domain, channels: usize) -> ComputeResult<Self::Handle> {
        Ok(CpuImage::zeroed(domain, channels))
    }

    fn exec_conversion(
        &self,
        kernel: ConversionKernel,
        src: &Self::Handle,
        dst: &mut Self::Handle,
    ) -> ComputeResult<()> {
        let parallel = self.parallel && src.domain.pixel_count() >= PARALLEL_MIN_PIXELS;
        kernel.execute_cpu(src, dst, parallel)?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cpu"
    }
}
