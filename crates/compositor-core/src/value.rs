//! Value types carried between compositor operations.
//!
//! # Types
//!
//! - [`ValueType`] - The closed set of kinds an input can expect
//! - [`Value`] - One value of a given kind
//!
//! # Memory Layout
//!
//! Every kind is stored as a run of `f32` channels:
//!
//! | Type | Channels | Layout |
//! |------|----------|--------|
//! | [`ValueType::Float`] | 1 | `f` |
//! | [`ValueType::Vector`] | 4 | `x, y, z, _` (4th channel unused) |
//! | [`ValueType::Color`] | 4 | `r, g, b, a` |
//!
//! Vectors use four channels so that vector and color buffers share one
//! layout, which keeps color/vector copies a plain memcpy.
//!
//! ```
//! use compositor_core::{Value, ValueType};
//!
//! let color = Value::color(0.1, 0.2, 0.3, 1.0);
//! assert_eq!(color.value_type(), ValueType::Color);
//! assert_eq!(color.channels(), &[0.1, 0.2, 0.3, 1.0]);
//! ```

use std::fmt;

use crate::error::{Error, Result};

/// Kind of value an operation produces or an input expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Single scalar channel.
    Float,
    /// Three component vector, stored in four channels.
    Vector,
    /// RGBA color with alpha.
    Color,
}

impl ValueType {
    /// All value types, in declaration order.
    pub const ALL: [ValueType; 3] = [ValueType::Float, ValueType::Vector, ValueType::Color];

    /// Number of `f32` channels one element occupies in storage.
    #[inline]
    pub const fn channel_count(self) -> usize {
        match self {
            ValueType::Float => 1,
            ValueType::Vector | ValueType::Color => 4,
        }
    }

    /// Lowercase name, used in logs and error messages.
    pub const fn name(self) -> &'static str {
        match self {
            ValueType::Float => "float",
            ValueType::Vector => "vector",
            ValueType::Color => "color",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single typed value.
///
/// This is the payload of a single-value result: a result whose domain is
/// one element and which never lives in a backend buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// Scalar value.
    Float(f32),
    /// Vector `[x, y, z, _]`. The 4th channel carries no meaning.
    Vector([f32; 4]),
    /// Color `[r, g, b, a]`.
    Color([f32; 4]),
}

impl Value {
    /// Scalar value.
    #[inline]
    pub const fn float(value: f32) -> Self {
        Value::Float(value)
    }

    /// Vector value. The unused 4th channel is zero.
    #[inline]
    pub const fn vector(x: f32, y: f32, z: f32) -> Self {
        Value::Vector([x, y, z, 0.0])
    }

    /// Color value.
    #[inline]
    pub const fn color(r: f32, g: f32, b: f32, a: f32) -> Self {
        Value::Color([r, g, b, a])
    }

    /// Zero value of the given type. Used as the initial content of
    /// allocated single-value outputs.
    pub const fn zero(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Float => Value::Float(0.0),
            ValueType::Vector => Value::Vector([0.0; 4]),
            ValueType::Color => Value::Color([0.0; 4]),
        }
    }

    /// Rebuild a value from its storage channels.
    ///
    /// # Errors
    ///
    /// [`Error::ChannelMismatch`] if `channels.len()` differs from
    /// [`ValueType::channel_count`].
    ///
    /// ```
    /// use compositor_core::{Value, ValueType};
    ///
    /// let v = Value::from_channels(ValueType::Float, &[0.5]).unwrap();
    /// assert_eq!(v, Value::Float(0.5));
    /// assert!(Value::from_channels(ValueType::Color, &[0.5]).is_err());
    /// ```
    pub fn from_channels(value_type: ValueType, channels: &[f32]) -> Result<Self> {
        let expected = value_type.channel_count();
        if channels.len() != expected {
            return Err(Error::ChannelMismatch {
                value_type,
                expected,
                got: channels.len(),
            });
        }
        Ok(match value_type {
            ValueType::Float => Value::Float(channels[0]),
            ValueType::Vector => {
                Value::Vector([channels[0], channels[1], channels[2], channels[3]])
            }
            ValueType::Color => Value::Color([channels[0], channels[1], channels[2], channels[3]]),
        })
    }

    /// Type of this value.
    #[inline]
    pub const fn value_type(&self) -> ValueType {
        match self {
            Value::Float(_) => ValueType::Float,
            Value::Vector(_) => ValueType::Vector,
            Value::Color(_) => ValueType::Color,
        }
    }

    /// Storage channels of this value.
    #[inline]
    pub fn channels(&self) -> &[f32] {
        match self {
            Value::Float(f) => std::slice::from_ref(f),
            Value::Vector(v) | Value::Color(v) => v,
        }
    }

    /// Mutable storage channels of this value.
    #[inline]
    pub fn channels_mut(&mut self) -> &mut [f32] {
        match self {
            Value::Float(f) => std::slice::from_mut(f),
            Value::Vector(v) | Value::Color(v) => v,
        }
    }

    /// Scalar payload, if this is a float.
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Four channel payload, if this is a vector or color.
    pub fn as_vec4(&self) -> Option<[f32; 4]> {
        match self {
            Value::Vector(v) | Value::Color(v) => Some(*v),
            Value::Float(_) => None,
        }
    }
}
