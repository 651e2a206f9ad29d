//! # compositor-core
//!
//! Core types for typed compositor results.
//!
//! Compositor operations exchange typed values. Every input socket declares
//! the kind of value it expects, and every produced result carries its own
//! kind and extent:
//!
//! - [`ValueType`] - The closed set of value kinds (float, vector, color)
//! - [`Value`] - A single typed value
//! - [`Domain`] - The 2D extent a result is defined over
//! - [`InputDescriptor`] - What an input socket expects
//!
//! ## Crate Structure
//!
//! This crate has no GPU dependency. Backends, buffers and the conversion
//! stage live in `compositor-compute`:
//!
//! ```text
//! compositor-core (this crate)
//!    ^
//!    |
//!    +-- compositor-compute (context, backends, conversion kernels)
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod descriptor;
pub mod domain;
pub mod error;
pub mod value;

// Re-exports for convenience
pub use descriptor::InputDescriptor;
pub use domain::Domain;
pub use error::{Error, Result};
pub use value::{Value, ValueType};

/// Prelude module for convenient imports.
///
/// ```
/// use compositor_core::prelude::*;
///
/// let input = InputDescriptor::new(ValueType::Color);
/// assert_eq!(input.value_type(), ValueType::Color);
/// ```
pub mod prelude {
    pub use crate::descriptor::InputDescriptor;
    pub use crate::domain::Domain;
    pub use crate::error::{Error, Result};
    pub use crate::value::{Value, ValueType};
}
