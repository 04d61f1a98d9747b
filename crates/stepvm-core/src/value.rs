//! Runtime values.
//!
//! The interpreter is dynamically typed over three value kinds. Integer
//! and floating values mix by promoting to float.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A value on the operand stack or bound in a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl Value {
    /// Name of the value kind, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "boolean",
            Value::Int(_) => "int",
            Value::Float(_) => "double",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(_) => None,
        }
    }

    /// Default value for a field of the given primitive type.
    ///
    /// Reference types have no executable default and yield `None`.
    pub fn default_for(primitive_type_code: &str) -> Option<Value> {
        match primitive_type_code {
            "boolean" => Some(Value::Bool(false)),
            "float" | "double" => Some(Value::Float(0.0)),
            "byte" | "short" | "int" | "long" | "char" => Some(Value::Int(0)),
            _ => None,
        }
    }

    /// Parse a numeric literal token.
    ///
    /// Accepts decimal and `0x` hexadecimal integers, `_` separators, the
    /// `L` suffix for integers and `f`/`d` suffixes or a fractional part or
    /// exponent for floating values.
    pub fn from_number_token(token: &str) -> Option<Value> {
        let cleaned: String = token.chars().filter(|c| *c != '_').collect();
        let lower = cleaned.to_ascii_lowercase();

        if let Some(hex) = lower.strip_prefix("0x") {
            let digits = hex.strip_suffix('l').unwrap_or(hex);
            return i64::from_str_radix(digits, 16).ok().map(Value::Int);
        }

        if let Some(digits) = lower.strip_suffix('l') {
            return digits.parse().ok().map(Value::Int);
        }

        if let Some(digits) = lower.strip_suffix('f').or_else(|| lower.strip_suffix('d')) {
            return digits.parse().ok().map(Value::Float);
        }

        if lower.contains(['.', 'e']) {
            return lower.parse().ok().map(Value::Float);
        }

        lower.parse().ok().map(Value::Int)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x:?}"),
        }
    }
}
