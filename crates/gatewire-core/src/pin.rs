//! Pin types and the values that travel over links.

use std::fmt;

/// The type a pin carries.
///
/// Fixed when a gate is constructed and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinType {
    /// No type assigned. Never link-compatible.
    Unset,
    /// Wildcard slot, compatible with every concrete type.
    Any,
    /// Integer value.
    Int,
    /// Boolean value.
    Bool,
}

impl PinType {
    /// Check whether a resolved value may sit on a pin of this type.
    pub fn accepts(self, value: Value) -> bool {
        types_compatible(self, value.pin_type())
    }
}

impl fmt::Display for PinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PinType::Unset => "unset",
            PinType::Any => "any",
            PinType::Int => "int",
            PinType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Whether the two ends of a link agree in type.
///
/// `Any` matches every type except `Unset`; `Unset` matches nothing.
pub fn types_compatible(a: PinType, b: PinType) -> bool {
    match (a, b) {
        (PinType::Unset, _) | (_, PinType::Unset) => false,
        (PinType::Any, _) | (_, PinType::Any) => true,
        (a, b) => a == b,
    }
}

/// A value produced on an output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// Integer result.
    Int(i64),
    /// Boolean result.
    Bool(bool),
}

impl Value {
    /// The concrete pin type of this value.
    pub fn pin_type(self) -> PinType {
        match self {
            Value::Int(_) => PinType::Int,
            Value::Bool(_) => PinType::Bool,
        }
    }

    /// The integer payload, if this is an integer.
    pub fn as_int(self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(v),
            Value::Bool(_) => None,
        }
    }

    /// The boolean payload, if this is a boolean.
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(v),
            Value::Int(_) => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}
