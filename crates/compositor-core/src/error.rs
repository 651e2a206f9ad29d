//! Error types for compositor-core.
//!
//! # Overview
//!
//! The [`Error`] enum covers the contract violations a typed result can
//! run into:
//! - Value type disagreements between a result and the code consuming it
//! - Channel layouts that do not match the declared value type
//! - Buffers whose length does not match their domain
//! - Zero-sized domains
//!
//! None of these are recoverable at the conversion site. They indicate an
//! upstream invariant break and are propagated to whoever drives the graph.
//!
//! # Usage
//!
//! ```rust
//! use compositor_core::{Domain, Error, Result};
//!
//! fn checked(width: u32, height: u32) -> Result<Domain> {
//!     Domain::new(width, height)
//! }
//!
//! assert!(matches!(checked(0, 4), Err(Error::InvalidDomain { .. })));
//! ```
//!
//! # Dependencies
//!
//! - [`thiserror`] - For derive macro error implementation

use thiserror::Error;

use crate::value::ValueType;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by typed values, domains and descriptors.
///
/// # Categories
///
/// - **Type errors**: [`TypeMismatch`](Error::TypeMismatch), [`ChannelMismatch`](Error::ChannelMismatch)
/// - **Extent errors**: [`BufferSizeMismatch`](Error::BufferSizeMismatch),
///   [`ElementCountMismatch`](Error::ElementCountMismatch),
///   [`DomainMismatch`](Error::DomainMismatch), [`InvalidDomain`](Error::InvalidDomain)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A value of one type was handed to code that requires another.
    ///
    /// ```rust
    /// use compositor_core::{Error, ValueType};
    ///
    /// let err = Error::TypeMismatch {
    ///     expected: ValueType::Color,
    ///     actual: ValueType::Float,
    /// };
    /// assert!(err.to_string().contains("color"));
    /// ```
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Type required by the consumer
        expected: ValueType,
        /// Type actually provided
        actual: ValueType,
    },

    /// Channel slice length does not match the value type.
    #[error("channel mismatch for {value_type}: expected {expected}, got {got}")]
    ChannelMismatch {
        /// Value type being built
        value_type: ValueType,
        /// Channel count the type occupies in storage
        expected: usize,
        /// Channel count provided
        got: usize,
    },

    /// Buffer length does not match `width * height * channels`.
    #[error("buffer size mismatch: expected {expected} floats, got {actual}")]
    BufferSizeMismatch {
        /// Required number of f32 elements
        expected: usize,
        /// Provided number of f32 elements
        actual: usize,
    },

    /// Number of elements does not match `width * height`.
    #[error("element count mismatch: expected {expected} elements, got {actual}")]
    ElementCountMismatch {
        /// Elements in the domain
        expected: usize,
        /// Elements provided
        actual: usize,
    },

    /// Two domains that must be identical differ.
    #[error("domain mismatch: {a_width}x{a_height} vs {b_width}x{b_height}")]
    DomainMismatch {
        /// First domain width
        a_width: u32,
        /// First domain height
        a_height: u32,
        /// Second domain width
        b_width: u32,
        /// Second domain height
        b_height: u32,
    },

    /// Domain with a zero extent.
    #[error("invalid domain: {width}x{height}")]
    InvalidDomain {
        /// Requested width
        width: u32,
        /// Requested height
        height: u32,
    },
}
