//! wgpu backend implementation.
//!
//! Conversion kernels run as compute shaders over storage buffers.

use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use compositor_core::{Domain, Error};
use tracing::{debug, info};
use wgpu::util::DeviceExt;

use super::gpu_primitives::{GpuPrimitives, ImageHandle};
use crate::kernel::ConversionKernel;
use crate::{ComputeError, ComputeResult};

/// Must match `@workgroup_size` in the conversion shaders.
const WORKGROUP_SIZE: u32 = 256;

// =============================================================================
// Uniform Buffers
// =============================================================================

/// Dimensions uniform: [width, height, src channels, dst channels]
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct DimsUniform {
    dims: [u32; 4],
}

// =============================================================================
// WgpuImage Handle
// =============================================================================

/// GPU storage buffer holding a result's elements.
pub struct WgpuImage {
    buffer: wgpu::Buffer,
    domain: Domain,
    channels: usize,
}

impl ImageHandle for WgpuImage {
    fn domain(&self) -> Domain {
        self.domain
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn size_bytes(&self) -> u64 {
        self.buffer.size()
    }
}

impl std::fmt::Debug for WgpuImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuImage")
            .field("domain", &self.domain)
            .field("channels", &self.channels)
            .field("size_bytes", &self.size_bytes())
            .finish()
    }
}

// =============================================================================
// Shader Registry
// =============================================================================

/// One compiled pipeline per conversion kernel, indexed by
/// [`ConversionKernel::index`]. Built once per device.
struct ShaderRegistry {
    pipelines: Vec<wgpu::ComputePipeline>,
}

impl ShaderRegistry {
    fn new(device: &wgpu::Device) -> ComputeResult<Self> {
        let pipelines = ConversionKernel::ALL
            .iter()
            .map(|kernel| Self::create_pipeline(device, *kernel))
            .collect::<ComputeResult<Vec<_>>>()?;
        Ok(Self { pipelines })
    }

    fn create_pipeline(
        device: &wgpu::Device,
        kernel: ConversionKernel,
    ) -> ComputeResult<wgpu::ComputePipeline> {
        let label = kernel.label();

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(kernel.conversion_shader().into()),
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: None, // Auto layout
            module: &module,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(ComputeError::ShaderCompilation(format!("{label}: {err}")));
        }

        Ok(pipeline)
    }

    fn pipeline(&self, kernel: ConversionKernel) -> &wgpu::ComputePipeline {
        &self.pipelines[kernel.index()]
    }
}

// =============================================================================
// Buffer Limits
// =============================================================================

/// Device limits a result buffer must fit in. Every result buffer is bound
/// as a storage buffer, so the binding limit applies as well as the
/// allocation limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BufferLimits {
    max_buffer_bytes: u64,
    max_binding_bytes: u64,
}

impl BufferLimits {
    fn from_limits(limits: &wgpu::Limits) -> Self {
        Self {
            max_buffer_bytes: limits.max_buffer_size,
            max_binding_bytes: u64::from(limits.max_storage_buffer_binding_size),
        }
    }

    /// Size in bytes of a buffer for `domain` x `channels`, or
    /// `ResourceExhausted` if the device cannot hold or bind it.
    fn check(&self, domain: Domain, channels: usize) -> ComputeResult<u64> {
        let limit = self.max_buffer_bytes.min(self.max_binding_bytes);
        let requested = u64::from(domain.width())
            .saturating_mul(u64::from(domain.height()))
            .saturating_mul(channels as u64)
            .saturating_mul(4);
        if requested > limit {
            return Err(ComputeError::ResourceExhausted { requested, limit });
        }
        Ok(requested)
    }
}

// =============================================================================
// WgpuPrimitives
// =============================================================================

/// wgpu GPU primitives implementation.
pub struct WgpuPrimitives {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    shaders: ShaderRegistry,
    max_workgroups_per_dim: u32,
    buffer_limits: BufferLimits,
}

impl WgpuPrimitives {
    /// Check if wgpu is available.
    pub fn is_available() -> bool {
        pollster::block_on(async {
            let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
                backends: wgpu::Backends::all(),
                ..Default::default()
            });
            instance
                .request_adapter(&wgpu::RequestAdapterOptions {
                    power_preference: wgpu::PowerPreference::HighPerformance,
                    compatible_surface: None,
                    force_fallback_adapter: false,
                })
                .await
                .is_some()
        })
    }

    /// Create new wgpu primitives.
    pub fn new(power: wgpu::PowerPreference) -> ComputeResult<Self> {
        pollster::block_on(Self::new_async(power))
    }

    /// Create new wgpu primitives asynchronously.
    pub async fn new_async(power: wgpu::PowerPreference) -> ComputeResult<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: power,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(ComputeError::NoAdapter)?;

        let adapter_limits = adapter.limits();
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("compositor_device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: adapter_limits.clone(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    ..Default::default()
                },
                None,
            )
            .await
            .map_err(|e| ComputeError::DeviceCreation(e.to_string()))?;

        let adapter_info = adapter.get_info();
        info!(
            adapter = %adapter_info.name,
            backend = ?adapter_info.backend,
            max_buffer_bytes = adapter_limits.max_buffer_size,
            max_binding_bytes = adapter_limits.max_storage_buffer_binding_size,
            "wgpu device created"
        );

        let shaders = ShaderRegistry::new(&device)?;
        debug!(count = shaders.pipelines.len(), "Conversion pipelines compiled");

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            shaders,
            max_workgroups_per_dim: adapter_limits.max_compute_workgroups_per_dimension,
            buffer_limits: BufferLimits::from_limits(&adapter_limits),
        })
    }

    /// Create dims uniform buffer.
    fn create_dims_buffer(&self, w: u32, h: u32, src_c: u32, dst_c: u32) -> wgpu::Buffer {
        let uniform = DimsUniform {
            dims: [w, h, src_c, dst_c],
        };
        self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("dims_uniform"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM,
        })
    }

    /// Workgroup grid covering `total` invocations. Folds into a second
    /// dimension once the first exceeds the adapter limit.
    fn workgroups(&self, total: u32) -> (u32, u32, u32) {
        let groups = total.div_ceil(WORKGROUP_SIZE);
        let max = self.max_workgroups_per_dim.max(1);
        if groups <= max {
            (groups, 1, 1)
        } else {
            (max, groups.div_ceil(max), 1)
        }
    }

    /// Execute compute dispatch and wait.
    fn dispatch_and_wait(
        &self,
        label: &str,
        pipeline: &wgpu::ComputePipeline,
        bind_group: &wgpu::BindGroup,
        workgroups: (u32, u32, u32),
    ) {
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("conversion_encoder"),
            });

        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(label),
                timestamp_writes: None,
            });
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            pass.dispatch_workgroups(workgroups.0, workgroups.1, workgroups.2);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        self.device.poll(wgpu::Maintain::Wait);
    }

    /// Run `f` inside validation and out-of-memory error scopes, turning a
    /// captured error into `OperationFailed` instead of the device's
    /// uncaptured-error panic.
    fn scoped<T>(&self, label: &str, f: impl FnOnce(&wgpu::Device) -> T) -> ComputeResult<T> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let value = f(&self.device);

        let validation = pollster::block_on(self.device.pop_error_scope());
        let oom = pollster::block_on(self.device.pop_error_scope());
        match validation.or(oom) {
            Some(err) => Err(ComputeError::OperationFailed(format!("{label}: {err}"))),
            None => Ok(value),
        }
    }

    fn create_storage_buffer(&self, label: &str, size: u64) -> ComputeResult<wgpu::Buffer> {
        self.scoped(label, |device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(label),
                size,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            })
        })
    }
}

impl GpuPrimitives for WgpuPrimitives {
    type Handle = WgpuImage;

    fn upload(&self, data: &[f32], domain: Domain, channels: usize) -> ComputeResult<Self::Handle> {
        let expected = domain.buffer_len(channels);
        if data.len() != expected {
            return Err(Error::BufferSizeMismatch {
                expected,
                actual: data.len(),
            }
            .into());
        }
        self.buffer_limits.check(domain, channels)?;

        let buffer = self.scoped("result_buffer", |device| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("result_buffer"),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
            })
        })?;

        Ok(WgpuImage {
            buffer,
            domain,
            channels,
        })
    }

    fn download(&self, handle: &Self::Handle) -> ComputeResult<Vec<f32>> {
        let size = handle.buffer.size();

        // Create staging buffer
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_buffer"),
            size,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        // Copy to staging
        let mut encoder = self.device.create_command_encoder(&Default::default());
        encoder.copy_buffer_to_buffer(&handle.buffer, 0, &staging, 0, size);
        self.queue.submit(std::iter::once(encoder.finish()));

        // Map and read
        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        self.device.poll(wgpu::Maintain::Wait);

        rx.recv()
            .map_err(|_| ComputeError::OperationFailed("Map channel closed".into()))?
            .map_err(|e| ComputeError::OperationFailed(format!("Map failed: {e}")))?;

        let data = slice.get_mapped_range();
        let result: Vec<f32> = bytemuck::cast_slice(&data).to_vec();
        drop(data);
        staging.unmap();

        Ok(result)
    }

    fn allocate(&self, domain: Domain, channels: usize) -> ComputeResult<Self::Handle> {
        let size = self.buffer_limits.check(domain, channels)?;
        let buffer = self.create_storage_buffer("output_buffer", size)?;
        Ok(WgpuImage {
            buffer,
            domain,
            channels,
        })
    }

    fn exec_conversion(
        &self,
        kernel: ConversionKernel,
        src: &Self::Handle,
        dst: &mut Self::Handle,
    ) -> ComputeResult<()> {
        let source = kernel.source();
        let target = kernel.target();
        if src.channels != source.channel_count() {
            return Err(Error::ChannelMismatch {
                value_type: source,
                expected: source.channel_count(),
                got: src.channels,
            }
            .into());
        }
        if dst.channels != target.channel_count() {
            return Err(Error::ChannelMismatch {
                value_type: target,
                expected: target.channel_count(),
                got: dst.channels,
            }
            .into());
        }
        src.domain.ensure_matches(&dst.domain)?;

        let (w, h) = (src.domain.width(), src.domain.height());
        let total = w.checked_mul(h).ok_or_else(|| {
            ComputeError::OperationFailed(format!("domain {} exceeds GPU index range", src.domain))
        })?;

        let dims_buf = self.create_dims_buffer(w, h, src.channels as u32, dst.channels as u32);

        let pipeline = self.shaders.pipeline(kernel);
        let layout = pipeline.get_bind_group_layout(0);
        let bind_group = self.scoped(kernel.label(), |device| {
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(kernel.label()),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: src.buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: dst.buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: dims_buf.as_entire_binding(),
                    },
                ],
            })
        })?;

        self.dispatch_and_wait(kernel.label(), pipeline, &bind_group, self.workgroups(total));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "wgpu"
    }
}
