//! Execution context shared by every conversion in a compositing pass.
//!
//! The context owns the active backend and hands out buffers. It is passed
//! explicitly as `&ExecutionContext`; nothing here is global.

use compositor_core::{Domain, Value, ValueType};
use tracing::{info, warn};

#[cfg(feature = "wgpu")]
use crate::backend::WgpuPrimitives;
use crate::backend::{Backend, CpuPrimitives, GpuPrimitives, select_best_backend};
use crate::result::{Storage, TypedResult};
use crate::{ComputeError, ComputeResult};

/// Environment variable selecting the backend (`auto`, `cpu`, `wgpu`).
pub const BACKEND_ENV: &str = "COMPOSITOR_BACKEND";

/// Environment variable toggling rayon on the CPU path (`0`/`1`, `false`/`true`).
pub const PARALLEL_ENV: &str = "COMPOSITOR_PARALLEL";

/// GPU adapter preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PowerPreference {
    #[default]
    HighPerformance,
    LowPower,
}

#[cfg(feature = "wgpu")]
impl From<PowerPreference> for wgpu::PowerPreference {
    fn from(p: PowerPreference) -> Self {
        match p {
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
        }
    }
}

/// Execution context configuration.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Requested backend (`Auto` picks the best available).
    pub backend: Backend,
    /// Spread large CPU loops over the rayon pool.
    pub parallel: bool,
    /// Adapter preference for the wgpu backend.
    pub power_preference: PowerPreference,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Auto,
            parallel: true,
            power_preference: PowerPreference::HighPerformance,
        }
    }
}

impl ContextConfig {
    /// Defaults overridden by `COMPOSITOR_BACKEND` / `COMPOSITOR_PARALLEL`.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`ContextConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(value) = lookup(BACKEND_ENV) {
            match value.parse::<Backend>() {
                Ok(backend) => config.backend = backend,
                Err(e) => warn!(%value, error = %e, "Ignoring {BACKEND_ENV}"),
            }
        }

        if let Some(value) = lookup(PARALLEL_ENV) {
            match parse_bool(&value) {
                Some(parallel) => config.parallel = parallel,
                None => warn!(%value, "Ignoring {PARALLEL_ENV}"),
            }
        }

        config
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_power_preference(mut self, power_preference: PowerPreference) -> Self {
        self.power_preference = power_preference;
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Backend-specific primitives held by the context.
pub(crate) enum ComputeDevice {
    Cpu(CpuPrimitives),
    #[cfg(feature = "wgpu")]
    Wgpu(WgpuPrimitives),
}

impl ComputeDevice {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Cpu(cpu) => cpu.name(),
            #[cfg(feature = "wgpu")]
            Self::Wgpu(gpu) => gpu.name(),
        }
    }
}

/// Shared environment for conversions: backend selection and buffer services.
pub struct ExecutionContext {
    config: ContextConfig,
    device: ComputeDevice,
}

impl ExecutionContext {
    /// Create a context for `config.backend`.
    ///
    /// `Auto` falls back to the CPU when the GPU device cannot be created.
    /// An explicit `Wgpu` request propagates the failure instead.
    pub fn new(config: ContextConfig) -> ComputeResult<Self> {
        let device = match config.backend {
            Backend::Cpu => ComputeDevice::Cpu(CpuPrimitives::new(config.parallel)),
            Backend::Wgpu => Self::create_gpu(&config)?,
            Backend::Auto => match select_best_backend() {
                Backend::Wgpu => Self::create_gpu(&config).unwrap_or_else(|e| {
                    warn!(error = %e, "GPU unavailable, falling back to CPU");
                    ComputeDevice::Cpu(CpuPrimitives::new(config.parallel))
                }),
                _ => ComputeDevice::Cpu(CpuPrimitives::new(config.parallel)),
            },
        };

        info!(
            requested = config.backend.name(),
            backend = device.name(),
            parallel = config.parallel,
            "Execution context created"
        );

        Ok(Self { config, device })
    }

    /// CPU-only context with default settings.
    pub fn cpu() -> Self {
        let config = ContextConfig::default().with_backend(Backend::Cpu);
        let device = ComputeDevice::Cpu(CpuPrimitives::new(config.parallel));
        Self { config, device }
    }

    /// GPU context. Fails if no adapter or device is available.
    #[cfg(feature = "wgpu")]
    pub fn wgpu() -> ComputeResult<Self> {
        Self::new(ContextConfig::default().with_backend(Backend::Wgpu))
    }

    /// Context configured from the environment, see [`ContextConfig::from_env`].
    pub fn from_env() -> ComputeResult<Self> {
        Self::new(ContextConfig::from_env())
    }

    #[cfg(feature = "wgpu")]
    fn create_gpu(config: &ContextConfig) -> ComputeResult<ComputeDevice> {
        Ok(ComputeDevice::Wgpu(WgpuPrimitives::new(
            config.power_preference.into(),
        )?))
    }

    #[cfg(not(feature = "wgpu"))]
    fn create_gpu(_config: &ContextConfig) -> ComputeResult<ComputeDevice> {
        Err(ComputeError::BackendNotAvailable(
            "wgpu feature not enabled".to_string(),
        ))
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Backend actually in use (never `Auto`).
    pub fn backend(&self) -> Backend {
        match &self.device {
            ComputeDevice::Cpu(_) => Backend::Cpu,
            #[cfg(feature = "wgpu")]
            ComputeDevice::Wgpu(_) => Backend::Wgpu,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.device.name()
    }

    /// True when buffers live on the GPU.
    pub fn is_gpu(&self) -> bool {
        self.backend() == Backend::Wgpu
    }

    pub(crate) fn device(&self) -> &ComputeDevice {
        &self.device
    }

    /// Upload host data as a buffer result on the active backend.
    ///
    /// `data` holds `domain.pixel_count()` elements of
    /// `value_type.channel_count()` f32 each, row-major.
    pub fn upload(
        &self,
        value_type: ValueType,
        domain: Domain,
        data: &[f32],
    ) -> ComputeResult<TypedResult> {
        let channels = value_type.channel_count();
        let storage = match &self.device {
            ComputeDevice::Cpu(cpu) => Storage::Cpu(cpu.upload(data, domain, channels)?),
            #[cfg(feature = "wgpu")]
            ComputeDevice::Wgpu(gpu) => Storage::Gpu(gpu.upload(data, domain, channels)?),
        };
        TypedResult::from_storage(value_type, storage)
    }

    /// Upload a list of values as a buffer result, one value per element.
    ///
    /// The values must all share one type and cover the domain exactly.
    pub fn upload_values(&self, domain: Domain, values: &[Value]) -> ComputeResult<TypedResult> {
        let count_mismatch = || compositor_core::Error::ElementCountMismatch {
            expected: domain.pixel_count(),
            actual: values.len(),
        };
        if values.len() != domain.pixel_count() {
            return Err(count_mismatch().into());
        }
        let value_type = values.first().ok_or_else(count_mismatch)?.value_type();

        let mut data = Vec::with_capacity(domain.buffer_len(value_type.channel_count()));
        for value in values {
            if value.value_type() != value_type {
                return Err(compositor_core::Error::TypeMismatch {
                    expected: value_type,
                    actual: value.value_type(),
                }
                .into());
            }
            data.extend_from_slice(value.channels());
        }
        self.upload(value_type, domain, &data)
    }

    /// Allocate an output buffer result of `value_type` over `domain`.
    pub fn allocate(&self, value_type: ValueType, domain: Domain) -> ComputeResult<TypedResult> {
        let channels = value_type.channel_count();
        let storage = match &self.device {
            ComputeDevice::Cpu(cpu) => Storage::Cpu(cpu.allocate(domain, channels)?),
            #[cfg(feature = "wgpu")]
            ComputeDevice::Wgpu(gpu) => Storage::Gpu(gpu.allocate(domain, channels)?),
        };
        TypedResult::from_storage(value_type, storage)
    }

    /// Read a result back to host memory as flat f32 channels.
    ///
    /// Single values and CPU buffers are read directly; GPU buffers need a
    /// wgpu context.
    pub fn download(&self, result: &TypedResult) -> ComputeResult<Vec<f32>> {
        match (result.storage(), &self.device) {
            (Storage::Single(value), _) => Ok(value.channels().to_vec()),
            (Storage::Cpu(image), _) => Ok(image.data().to_vec()),
            #[cfg(feature = "wgpu")]
            (Storage::Gpu(image), ComputeDevice::Wgpu(gpu)) => gpu.download(image),
            #[cfg(feature = "wgpu")]
            (Storage::Gpu(_), device) => Err(ComputeError::StorageMismatch {
                expected: device.name(),
                actual: result.storage().location(),
            }),
        }
    }

    /// Read a result back as one [`Value`] per element.
    pub fn read_values(&self, result: &TypedResult) -> ComputeResult<Vec<Value>> {
        let data = self.download(result)?;
        data.chunks_exact(result.value_type().channel_count())
            .map(|chunk| Value::from_channels(result.value_type(), chunk).map_err(Into::into))
            .collect()
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("backend", &self.backend_name())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_bool_values() {
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool(" TRUE "), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn lookup_without_vars_keeps_defaults() {
        let config = ContextConfig::from_lookup(lookup(&[]));
        assert_eq!(config.backend, Backend::Auto);
        assert!(config.parallel);
        assert_eq!(config.power_preference, PowerPreference::HighPerformance);
    }

    #[test]
    fn lookup_overrides_backend_and_parallel() {
        let config = ContextConfig::from_lookup(lookup(&[
            (BACKEND_ENV, "cpu"),
            (PARALLEL_ENV, "0"),
        ]));
        assert_eq!(config.backend, Backend::Cpu);
        assert!(!config.parallel);

        let config = ContextConfig::from_lookup(lookup(&[
            (BACKEND_ENV, "GPU"),
            (PARALLEL_ENV, "false"),
        ]));
        assert_eq!(config.backend, Backend::Wgpu);
        assert!(!config.parallel);
    }

    #[test]
    fn lookup_ignores_bad_values() {
        let config = ContextConfig::from_lookup(lookup(&[
            (BACKEND_ENV, "cuda"),
            (PARALLEL_ENV, "sometimes"),
        ]));
        assert_eq!(config.backend, Backend::Auto);
        assert!(config.parallel);
    }

    #[test]
    fn config_builders() {
        let config = ContextConfig::default()
            .with_backend(Backend::Cpu)
            .with_parallel(false)
            .with_power_preference(PowerPreference::LowPower);
        assert_eq!(config.backend, Backend::Cpu);
        assert!(!config.parallel);
        assert_eq!(config.power_preference, PowerPreference::LowPower);
    }

    #[test]
    fn cpu_context_reports_cpu() {
        let ctx = ExecutionContext::cpu();
        assert_eq!(ctx.backend(), Backend::Cpu);
        assert!(!ctx.is_gpu());
        assert_eq!(ctx.backend_name(), "cpu");
    }

    #[test]
    fn explicit_cpu_config() {
        let ctx = ExecutionContext::new(ContextConfig::default().with_backend(Backend::Cpu)).unwrap();
        assert_eq!(ctx.backend(), Backend::Cpu);
    }

    #[test]
    fn upload_download_roundtrip() {
        let ctx = ExecutionContext::cpu();
        let domain = Domain::new(2, 1).unwrap();
        let result = ctx.upload(ValueType::Float, domain, &[0.25, 0.75]).unwrap();
        assert_eq!(ctx.download(&result).unwrap(), vec![0.25, 0.75]);
        assert_eq!(
            ctx.read_values(&result).unwrap(),
            vec![Value::float(0.25), Value::float(0.75)]
        );
    }

    #[test]
    fn upload_values_rejects_mixed_types() {
        let ctx = ExecutionContext::cpu();
        let domain = Domain::new(2, 1).unwrap();
        let mixed = [Value::float(1.0), Value::color(1.0, 1.0, 1.0, 1.0)];
        assert!(matches!(
            ctx.upload_values(domain, &mixed),
            Err(ComputeError::Core(compositor_core::Error::TypeMismatch { .. }))
        ));
    }

    #[test]
    fn upload_values_counts_elements() {
        let ctx = ExecutionContext::cpu();
        let domain = Domain::new(3, 2).unwrap();
        let err = ctx.upload_values(domain, &[]).unwrap_err();
        assert!(matches!(
            err,
            ComputeError::Core(compositor_core::Error::ElementCountMismatch {
                expected: 6,
                actual: 0,
            })
        ));

        let short = [Value::vector(1.0, 2.0, 3.0); 4];
        assert!(matches!(
            ctx.upload_values(domain, &short),
            Err(ComputeError::Core(compositor_core::Error::ElementCountMismatch {
                expected: 6,
                actual: 4,
            }))
        ));
        assert!(ctx.upload_values(domain, &[Value::vector(1.0, 2.0, 3.0); 6]).is_ok());
    }
}
