//! Path segments navigating from a variable into its elements, entries and members.

use alloy_primitives::{Address, Bytes, B256, I256, U256};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// One step of a variable path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Array index, or an integer mapping key
    Index(u64),
    /// Big-endian mapping key of up to 32 bytes (address, large integer, bytesN, raw bytes)
    Key(Bytes),
    /// Struct member label, or a `string` mapping key
    Member(String),
}

impl PathSegment {
    /// The segment as an array index, if it denotes a non-negative integer that fits `u64`.
    pub fn as_index(&self) -> Option<u64> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Key(bytes) => U256::try_from_be_slice(bytes).and_then(|v| u64::try_from(v).ok()),
            Self::Member(_) => None,
        }
    }
}

/// Build a path from heterogeneous segments: `path![0u64, addr, "member"]`.
#[macro_export]
macro_rules! path {
    () => { ::std::vec::Vec::<$crate::PathSegment>::new() };
    ($($segment:expr),+ $(,)?) => {
        ::std::vec![$($crate::PathSegment::from($segment)),+]
    };
}

impl From<u64> for PathSegment {
    fn from(index: u64) -> Self {
        Self::Index(index)
    }
}

impl From<u32> for PathSegment {
    fn from(index: u32) -> Self {
        Self::Index(index.into())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index as u64)
    }
}

impl From<U256> for PathSegment {
    fn from(key: U256) -> Self {
        Self::Key(Bytes::copy_from_slice(&key.to_be_bytes::<32>()))
    }
}

/// Signed keys become their 32-byte two's-complement word.
impl From<I256> for PathSegment {
    fn from(key: I256) -> Self {
        Self::from(key.into_raw())
    }
}

impl From<i64> for PathSegment {
    fn from(key: i64) -> Self {
        match u64::try_from(key) {
            Ok(index) => Self::Index(index),
            Err(_) => Self::from(I256::from_raw(U256::from(key.unsigned_abs())).wrapping_neg()),
        }
    }
}

impl From<Address> for PathSegment {
    fn from(key: Address) -> Self {
        Self::Key(Bytes::copy_from_slice(key.as_slice()))
    }
}

impl From<B256> for PathSegment {
    fn from(key: B256) -> Self {
        Self::Key(Bytes::copy_from_slice(key.as_slice()))
    }
}

impl From<&str> for PathSegment {
    fn from(label: &str) -> Self {
        Self::Member(label.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(label: String) -> Self {
        Self::Member(label)
    }
}

/// Command-line syntax.
///
/// - decimal digits → index (or a 32-byte key when wider than `u64`)
/// - `-` and decimal digits → 32-byte two's-complement key
/// - `0x…` hex → key bytes
/// - `"quoted"` → member label / string key, taken literally
/// - anything else → member label
impl FromStr for PathSegment {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(inner) = s.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
            return Ok(Self::Member(inner.to_string()));
        }
        if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(index) = s.parse::<u64>() {
                return Ok(Self::Index(index));
            }
            if let Ok(wide) = U256::from_str_radix(s, 10) {
                return Ok(Self::from(wide));
            }
        }
        if let Some(digits) = s.strip_prefix('-') {
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                if let Ok(key) = I256::from_dec_str(s) {
                    return Ok(Self::from(key));
                }
            }
        }
        if let Some(digits) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            let padded = if digits.len() % 2 == 1 { format!("0{digits}") } else { digits.to_string() };
            if let Ok(bytes) = hex::decode(padded) {
                return Ok(Self::Key(Bytes::from(bytes)));
            }
        }
        Ok(Self::Member(s.to_string()))
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "[{i}]"),
            Self::Key(bytes) => write!(f, "[0x{}]", hex::encode(bytes)),
            Self::Member(label) => write!(f, ".{label}"),
        }
    }
}
