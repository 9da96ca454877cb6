//! Tolerant value extraction from payloads.
//!
//! Whatever shape a payload arrived in (comma-separated text, raw bytes or
//! an already-split list), [`parse_values`] turns it into a flat list of
//! [`Value`] tokens and never fails. Tokens that are not numbers stay text.
//! The `get_*` accessors return the caller's default for any index that is
//! out of range or holds the wrong kind of value.
//!
//! ```
//! use satlink::codec::{get_float, get_int, parse_values, Value};
//! use satlink::Payload;
//!
//! let values = parse_values(&Payload::from("100,abc,2.5"));
//! assert_eq!(values, vec![Value::Int(100), Value::Text("abc".into()), Value::Float(2.5)]);
//! assert_eq!(get_int(&values, 0, -1), 100);
//! assert_eq!(get_int(&values, 1, -1), -1);
//! assert_eq!(get_float(&values, 9, 0.5), 0.5);
//! ```

use std::fmt;

use crate::message::Payload;

/// One payload token.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Parse a single text token: integer first, then float, else text.
    pub fn parse(token: &str) -> Self {
        if let Ok(int) = token.parse::<i64>() {
            return Value::Int(int);
        }
        if let Ok(float) = token.parse::<f64>() {
            return Value::Float(float);
        }
        Value::Text(token.to_string())
    }

    /// Numeric value as an integer (floats truncate toward zero).
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Value::Int(int) => Some(int),
            Value::Float(float) => Some(float as i64),
            Value::Text(_) => None,
        }
    }

    /// Numeric value as a float.
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Int(int) => Some(int as f64),
            Value::Float(float) => Some(float),
            Value::Text(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(int) => write!(f, "{}", int),
            Value::Float(float) => write!(f, "{}", float),
            Value::Text(text) => f.write_str(text),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Int(v as i64)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Split comma-separated text into tokens, skipping empty ones.
pub fn parse_text(text: &str) -> Vec<Value> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(Value::parse)
        .collect()
}

/// Tokens of any payload shape. Bytes become one integer per byte.
pub fn parse_values(payload: &Payload) -> Vec<Value> {
    match payload {
        Payload::Text(text) => parse_text(text),
        Payload::Bytes(bytes) => bytes.iter().map(|&b| Value::from(b)).collect(),
        Payload::Values(values) => values.clone(),
    }
}

/// Integer at `index`, or `default`.
pub fn get_int(values: &[Value], index: usize, default: i64) -> i64 {
    values.get(index).and_then(Value::as_int).unwrap_or(default)
}

/// Float at `index`, or `default`.
pub fn get_float(values: &[Value], index: usize, default: f64) -> f64 {
    values.get(index).and_then(Value::as_float).unwrap_or(default)
}

/// Any value at `index` rendered as text, or `default`.
pub fn get_str(values: &[Value], index: usize, default: &str) -> String {
    values
        .get(index)
        .map(Value::to_string)
        .unwrap_or_else(|| default.to_string())
}
