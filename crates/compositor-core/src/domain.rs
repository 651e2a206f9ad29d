//! Spatial extent of a result.
//!
//! A [`Domain`] is the `width x height` grid a result is defined over.
//! Single values use the 1x1 sentinel returned by [`Domain::single`].
//! Whether a 1x1 result is a single value or a one-pixel buffer is decided
//! by its storage, not by its domain.
//!
//! # Invariants
//!
//! - `width >= 1` and `height >= 1`
//! - Element order is row-major, origin at the top-left
//!
//! # Usage
//!
//! ```rust
//! use compositor_core::Domain;
//!
//! let domain = Domain::new(1920, 1080).unwrap();
//! assert_eq!(domain.pixel_count(), 1920 * 1080);
//! assert_eq!(domain.index(3, 1), 1920 + 3);
//!
//! assert!(Domain::single().is_single());
//! assert!(Domain::new(0, 1).is_err());
//! ```

use std::fmt;

use crate::error::{Error, Result};

/// 2D extent of a result, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Domain {
    width: u32,
    height: u32,
}

impl Domain {
    /// Create a domain.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidDomain`] if either extent is zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDomain { width, height });
        }
        Ok(Self { width, height })
    }

    /// The 1x1 domain of single values.
    #[inline]
    pub const fn single() -> Self {
        Self {
            width: 1,
            height: 1,
        }
    }

    /// Width in pixels.
    #[inline]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[inline]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Number of elements.
    #[inline]
    pub const fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// True for the 1x1 extent.
    #[inline]
    pub const fn is_single(&self) -> bool {
        self.width == 1 && self.height == 1
    }

    /// Row-major element index of `(x, y)`.
    #[inline]
    pub const fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Number of f32 elements a buffer of `channels` per pixel needs.
    #[inline]
    pub const fn buffer_len(&self, channels: usize) -> usize {
        self.pixel_count() * channels
    }

    /// Fail with [`Error::DomainMismatch`] unless `other` is identical.
    pub fn ensure_matches(&self, other: &Domain) -> Result<()> {
        if self != other {
            return Err(Error::DomainMismatch {
                a_width: self.width,
                a_height: self.height,
                b_width: other.width,
                b_height: other.height,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
