//! Input socket descriptors.
//!
//! An [`InputDescriptor`] is part of an operation's static contract. The
//! graph evaluator compares it with the result feeding the socket to decide
//! whether a conversion has to be inserted.
//!
//! ```rust
//! use compositor_core::{InputDescriptor, ValueType};
//!
//! let mask = InputDescriptor::new(ValueType::Float).with_single_value(true);
//! assert!(mask.expects_single_value());
//!
//! let passthrough = InputDescriptor::new(ValueType::Color).with_skip_type_conversion(true);
//! assert!(passthrough.skip_type_conversion());
//! ```

use crate::value::ValueType;

/// Declared expectations of one input socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputDescriptor {
    value_type: ValueType,
    expects_single_value: bool,
    skip_type_conversion: bool,
}

impl InputDescriptor {
    /// Descriptor expecting `value_type`, with default flags.
    pub const fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            expects_single_value: false,
            skip_type_conversion: false,
        }
    }

    /// Mark the input as only ever reading a single value.
    ///
    /// Informational for the graph evaluator; it does not change how a
    /// conversion is executed.
    pub const fn with_single_value(mut self, expects_single_value: bool) -> Self {
        self.expects_single_value = expects_single_value;
        self
    }

    /// Take whatever type is fed to the socket without conversion.
    pub const fn with_skip_type_conversion(mut self, skip: bool) -> Self {
        self.skip_type_conversion = skip;
        self
    }

    /// Expected value type.
    #[inline]
    pub const fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Whether the input only reads a single value.
    #[inline]
    pub const fn expects_single_value(&self) -> bool {
        self.expects_single_value
    }

    /// Whether conversions are disabled for this input.
    #[inline]
    pub const fn skip_type_conversion(&self) -> bool {
        self.skip_type_conversion
    }
}

impl From<ValueType> for InputDescriptor {
    fn from(value_type: ValueType) -> Self {
        Self::new(value_type)
    }
}
