//! Typed results exchanged between operations.

use compositor_core::{Domain, Error, Value, ValueType};

#[cfg(feature = "wgpu")]
use crate::backend::WgpuImage;
use crate::backend::{CpuImage, ImageHandle};
use crate::ComputeResult;

/// Where a result's elements live.
#[derive(Debug)]
pub enum Storage {
    /// A single value, always host-resident.
    Single(Value),
    /// Host buffer (CPU context).
    Cpu(CpuImage),
    /// GPU storage buffer (wgpu context).
    #[cfg(feature = "wgpu")]
    Gpu(WgpuImage),
}

impl Storage {
    /// Short name of the storage location, for diagnostics.
    pub fn location(&self) -> &'static str {
        match self {
            Storage::Single(_) => "single value",
            Storage::Cpu(_) => "cpu",
            #[cfg(feature = "wgpu")]
            Storage::Gpu(_) => "wgpu",
        }
    }
}

/// A typed, domain-sized value produced by one operation.
///
/// The storage always agrees with `value_type` (channel count) and `domain`
/// (extent); every constructor checks this.
#[derive(Debug)]
pub struct TypedResult {
    value_type: ValueType,
    domain: Domain,
    storage: Storage,
}

impl TypedResult {
    /// Single-value result. Its domain is the 1x1 sentinel.
    pub fn single(value: Value) -> Self {
        Self {
            value_type: value.value_type(),
            domain: Domain::single(),
            storage: Storage::Single(value),
        }
    }

    /// Result backed by a host buffer.
    pub fn from_cpu(value_type: ValueType, image: CpuImage) -> ComputeResult<Self> {
        Self::from_storage(value_type, Storage::Cpu(image))
    }

    /// Result backed by a GPU buffer.
    #[cfg(feature = "wgpu")]
    pub fn from_gpu(value_type: ValueType, image: WgpuImage) -> ComputeResult<Self> {
        Self::from_storage(value_type, Storage::Gpu(image))
    }

    pub(crate) fn from_storage(value_type: ValueType, storage: Storage) -> ComputeResult<Self> {
        let domain = match &storage {
            Storage::Single(value) => {
                if value.value_type() != value_type {
                    return Err(Error::TypeMismatch {
                        expected: value_type,
                        actual: value.value_type(),
                    }
                    .into());
                }
                Domain::single()
            }
            Storage::Cpu(image) => checked_domain(value_type, image)?,
            #[cfg(feature = "wgpu")]
            Storage::Gpu(image) => checked_domain(value_type, image)?,
        };
        Ok(Self {
            value_type,
            domain,
            storage,
        })
    }

    #[inline]
    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[inline]
    pub fn domain(&self) -> Domain {
        self.domain
    }

    #[inline]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// True when this result takes the single-value fast path.
    #[inline]
    pub fn is_single_value(&self) -> bool {
        matches!(self.storage, Storage::Single(_))
    }

    /// The value of a single-value result.
    pub fn single_value(&self) -> Option<Value> {
        match &self.storage {
            Storage::Single(value) => Some(*value),
            _ => None,
        }
    }

    /// The host buffer of a CPU result.
    pub fn cpu_image(&self) -> Option<&CpuImage> {
        match &self.storage {
            Storage::Cpu(image) => Some(image),
            _ => None,
        }
    }
}

fn checked_domain<H: ImageHandle>(value_type: ValueType, image: &H) -> ComputeResult<Domain> {
    let expected = value_type.channel_count();
    if image.channels() != expected {
        return Err(Error::ChannelMismatch {
            value_type,
            expected,
            got: image.channels(),
        }
        .into());
    }
    Ok(image.domain())
}
