//! Decoded storage values.

use alloy_primitives::{Address, Bytes, I256, U256};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt;

/// A fully decoded storage value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    Bool(bool),
    /// Unsigned integer of any width up to 256 bits
    Uint(U256),
    /// Signed integer, already sign-extended
    Int(I256),
    Address(Address),
    /// `bytesN`
    FixedBytes(Bytes),
    /// Dynamic `bytes`
    Bytes(Bytes),
    String(String),
    /// Struct members in declaration order
    Struct(Vec<(String, DecodedValue)>),
    /// Elements of a fixed-size array
    Array(Vec<DecodedValue>),
    /// Bytes of a type without a dedicated interpretation
    Raw(Bytes),
}

impl DecodedValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    /// Unsigned value narrowed to `u64`, if it fits.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_uint().and_then(|v| u64::try_from(v).ok())
    }

    pub fn as_int(&self) -> Option<I256> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Signed value narrowed to `i64`, if it fits.
    pub fn as_i64(&self) -> Option<i64> {
        self.as_int().and_then(|v| i64::try_from(v).ok())
    }

    pub fn as_address(&self) -> Option<Address> {
        match self {
            Self::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Byte content of `bytesN`, `bytes` and raw values.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::FixedBytes(b) | Self::Bytes(b) | Self::Raw(b) => Some(b.as_ref()),
            _ => None,
        }
    }

    /// Look up a struct member by label.
    pub fn member(&self, label: &str) -> Option<&DecodedValue> {
        match self {
            Self::Struct(members) => members.iter().find(|(l, _)| l == label).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Look up a fixed-array element.
    pub fn element(&self, index: usize) -> Option<&DecodedValue> {
        match self {
            Self::Array(items) => items.get(index),
            _ => None,
        }
    }
}

impl fmt::Display for DecodedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Uint(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Address(a) => write!(f, "{}", a.to_checksum(None)),
            Self::FixedBytes(b) | Self::Bytes(b) | Self::Raw(b) => write!(f, "0x{}", hex::encode(b)),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Struct(members) => {
                f.write_str("{ ")?;
                for (i, (label, value)) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{label}: {value}")?;
                }
                f.write_str(" }")
            }
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Integers serialize as decimal strings so 256-bit values survive JSON consumers.
impl Serialize for DecodedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Uint(v) => serializer.serialize_str(&v.to_string()),
            Self::Int(v) => serializer.serialize_str(&v.to_string()),
            Self::Address(a) => serializer.serialize_str(&a.to_checksum(None)),
            Self::FixedBytes(b) | Self::Bytes(b) | Self::Raw(b) => {
                serializer.serialize_str(&format!("0x{}", hex::encode(b)))
            }
            Self::String(s) => serializer.serialize_str(s),
            Self::Struct(members) => {
                let mut map = serializer.serialize_map(Some(members.len()))?;
                for (label, value) in members {
                    map.serialize_entry(label, value)?;
                }
                map.end()
            }
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_scalars() {
        assert_eq!(DecodedValue::Uint(U256::from(500)).to_string(), "500");
        assert_eq!(DecodedValue::Int(I256::try_from(-128i64).unwrap()).to_string(), "-128");
        assert_eq!(DecodedValue::Bool(true).to_string(), "true");
        assert_eq!(DecodedValue::FixedBytes(Bytes::from(vec![0xbe, 0xef])).to_string(), "0xbeef");
        assert_eq!(DecodedValue::String("hi".into()).to_string(), "\"hi\"");
    }

    #[test]
    fn test_display_struct() {
        let value = DecodedValue::Struct(vec![
            ("num".into(), DecodedValue::Uint(U256::from(9))),
            ("msg".into(), DecodedValue::String("Hello".into())),
        ]);
        assert_eq!(value.to_string(), "{ num: 9, msg: \"Hello\" }");
    }

    #[test]
    fn test_serialize_json() {
        let value = DecodedValue::Struct(vec![
            ("num".into(), DecodedValue::Uint(U256::MAX)),
            ("neg".into(), DecodedValue::Int(I256::MINUS_ONE)),
            ("trio".into(), DecodedValue::Array(vec![DecodedValue::Bool(false)])),
        ]);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["num"], U256::MAX.to_string());
        assert_eq!(json["neg"], "-1");
        assert_eq!(json["trio"][0], false);
    }

    #[test]
    fn test_accessors() {
        let value = DecodedValue::Struct(vec![("a".into(), DecodedValue::Uint(U256::from(20)))]);
        assert_eq!(value.member("a").and_then(DecodedValue::as_u64), Some(20));
        assert!(value.member("b").is_none());
        assert!(value.as_uint().is_none());
        assert_eq!(DecodedValue::Int(I256::MINUS_ONE).as_i64(), Some(-1));
    }
}
