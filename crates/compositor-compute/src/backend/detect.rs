//! Backend probing for `Backend::Auto`.

use std::fmt;

use super::Backend;

/// Result of probing one backend.
#[derive(Debug, Clone)]
pub struct BackendInfo {
    pub backend: Backend,
    /// Whether a context can be created for this backend right now.
    pub available: bool,
    /// Auto-selection rank, higher wins. Unavailable backends rank 0.
    pub priority: u32,
    pub description: &'static str,
}

impl fmt::Display for BackendInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.available { "+" } else { "-" };
        let name = match self.backend {
            Backend::Cpu => "CPU",
            other => other.name(),
        };
        write!(f, "[{status}] {name}: {}", self.description)
    }
}

/// Probe every compiled-in backend, best first.
pub fn detect_backends() -> Vec<BackendInfo> {
    #[allow(unused_mut)]
    let mut backends = vec![BackendInfo {
        backend: Backend::Cpu,
        available: true,
        priority: 10,
        description: "per-element loops, rayon for large domains",
    }];

    #[cfg(feature = "wgpu")]
    {
        let available = super::WgpuPrimitives::is_available();
        backends.push(BackendInfo {
            backend: Backend::Wgpu,
            available,
            priority: if available { 100 } else { 0 },
            description: "conversion shaders via wgpu (Vulkan/Metal/DX12)",
        });
    }

    backends.sort_by(|a, b| b.priority.cmp(&a.priority));
    backends
}

/// Backend `Auto` resolves to. The CPU is always available.
pub fn select_best_backend() -> Backend {
    detect_backends()
        .into_iter()
        .find(|b| b.available)
        .map_or(Backend::Cpu, |b| b.backend)
}

/// One line per backend, for diagnostics.
pub fn describe_backends() -> String {
    detect_backends()
        .iter()
        .map(|info| format!("{info}\n"))
        .collect()
}
