//! Reply values carried on the response channel
//!
//! This module defines:
//! - Value: unified enum for everything the command engine can enqueue
//!
//! A reply is an ordinary value, a sequence of values, or a designated
//! error value. Engines produce text as `Bytes` (the raw transport form);
//! `Str` is the decoded form produced by [`Value::decode`]. The two are
//! distinct variants on purpose: whether a caller sees bytes or text is a
//! connection-level setting, not a property of the data.

use serde::{Deserialize, Serialize};

use crate::encoding::TextEncoding;
use crate::error::{MirageResult, RemoteError};

/// Canonical reply value for the simulated transport
///
/// ## Decoding
///
/// [`Value::decode`] converts byte leaves to text leaves recursively:
/// arrays decode element-wise, `Bytes` decodes through the configured
/// [`TextEncoding`], everything else passes through unchanged. Applying it
/// to already-decoded input is a no-op, so decoding is idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Absent value (nil reply)
    Nil,
    /// 64-bit signed integer reply
    Int(i64),
    /// Raw byte reply; the undecoded form of every string the engine produces
    Bytes(Vec<u8>),
    /// Decoded text reply
    Str(String),
    /// Sequence of replies
    Array(Vec<Value>),
    /// Designated error value; bypasses decoding entirely
    Error(RemoteError),
}

impl Value {
    /// Get the variant name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "Nil",
            Value::Int(_) => "Int",
            Value::Bytes(_) => "Bytes",
            Value::Str(_) => "Str",
            Value::Array(_) => "Array",
            Value::Error(_) => "Error",
        }
    }

    /// Check if this is the nil reply
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Check if this is an error reply
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// View as an integer, if this is an integer reply
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// View as bytes, if this is a byte reply
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// View as text, if this is a decoded text reply
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// View as a reply sequence, if this is an array reply
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Recursively decode byte leaves into text leaves.
    ///
    /// Arrays decode element-wise; `Bytes` decodes through `encoding`;
    /// `Nil`, `Int`, `Str`, and `Error` pass through unchanged. Only
    /// strict-mode decoding can fail.
    pub fn decode(self, encoding: &TextEncoding) -> MirageResult<Value> {
        match self {
            Value::Bytes(bytes) => Ok(Value::Str(encoding.decode(&bytes)?)),
            Value::Array(items) => {
                let decoded = items
                    .into_iter()
                    .map(|item| item.decode(encoding))
                    .collect::<MirageResult<Vec<_>>>()?;
                Ok(Value::Array(decoded))
            }
            other => Ok(other),
        }
    }

    /// True if no `Bytes` leaf remains anywhere in this value
    pub fn is_decoded(&self) -> bool {
        match self {
            Value::Bytes(_) => false,
            Value::Array(items) => items.iter().all(Value::is_decoded),
            _ => true,
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Bytes(s.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<RemoteError> for Value {
    fn from(err: RemoteError) -> Self {
        Value::Error(err)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Nil,
        }
    }
}
