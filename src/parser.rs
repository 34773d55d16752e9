//! Value parser: isolated scalar bytes → typed value.

use crate::constants::{ADDRESS_BYTES, WORD_SIZE};
use crate::layout::ScalarKind;
use crate::value::DecodedValue;
use alloy_primitives::{Address, Bytes, I256, U256};

/// Interpret bytes already isolated by the extraction rule as a value of `kind`.
///
/// Never fails: inputs that do not fit the declared kind (wider than a word, an
/// address that is not 20 bytes) fall back to [`DecodedValue::Raw`].
pub fn parse_value(bytes: &[u8], kind: ScalarKind) -> DecodedValue {
    match kind {
        ScalarKind::Bool => DecodedValue::Bool(bytes.iter().any(|b| *b != 0)),
        ScalarKind::Uint(_) => match U256::try_from_be_slice(bytes) {
            Some(value) => DecodedValue::Uint(value),
            None => raw(bytes),
        },
        ScalarKind::Int(bits) => match U256::try_from_be_slice(bytes) {
            Some(value) => DecodedValue::Int(sign_extend(value, bits)),
            None => raw(bytes),
        },
        ScalarKind::Address if bytes.len() == ADDRESS_BYTES => {
            DecodedValue::Address(Address::from_slice(bytes))
        }
        ScalarKind::FixedBytes(_) => DecodedValue::FixedBytes(Bytes::copy_from_slice(bytes)),
        ScalarKind::Address | ScalarKind::Other => raw(bytes),
    }
}

/// Two's-complement sign extension of a `bits`-wide value to 256 bits.
///
/// If bit `bits - 1` is set the result is `value - 2^bits`.
pub fn sign_extend(value: U256, bits: u16) -> I256 {
    let bits = bits as usize;
    if bits == 0 || bits >= WORD_SIZE * 8 {
        return I256::from_raw(value);
    }
    let mask = (U256::from(1) << bits) - U256::from(1);
    let value = value & mask;
    if value.bit(bits - 1) {
        I256::from_raw(value | !mask)
    } else {
        I256::from_raw(value)
    }
}

fn raw(bytes: &[u8]) -> DecodedValue {
    DecodedValue::Raw(Bytes::copy_from_slice(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::{extract_bytes, place_bytes};
    use alloy_primitives::B256;

    fn int(v: i64) -> I256 {
        I256::try_from(v).unwrap()
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_value(&[1], ScalarKind::Bool), DecodedValue::Bool(true));
        assert_eq!(parse_value(&[0], ScalarKind::Bool), DecodedValue::Bool(false));
        assert_eq!(parse_value(&[0, 2], ScalarKind::Bool), DecodedValue::Bool(true));
    }

    #[test]
    fn test_parse_uint_widths() {
        assert_eq!(parse_value(&[0x01, 0xf4], ScalarKind::Uint(16)), DecodedValue::Uint(U256::from(500)));
        assert_eq!(parse_value(&[0xff; 32], ScalarKind::Uint(256)), DecodedValue::Uint(U256::MAX));
        assert_eq!(parse_value(&[], ScalarKind::Uint(8)), DecodedValue::Uint(U256::ZERO));
    }

    #[test]
    fn test_parse_int8_extremes() {
        assert_eq!(parse_value(&[0x80], ScalarKind::Int(8)), DecodedValue::Int(int(-128)));
        assert_eq!(parse_value(&[0x7f], ScalarKind::Int(8)), DecodedValue::Int(int(127)));
        assert_eq!(parse_value(&[0xff], ScalarKind::Int(8)), DecodedValue::Int(int(-1)));
    }

    #[test]
    fn test_parse_int256() {
        assert_eq!(parse_value(&[0xff; 32], ScalarKind::Int(256)), DecodedValue::Int(I256::MINUS_ONE));
        let mut max = [0xff; 32];
        max[0] = 0x7f;
        assert_eq!(parse_value(&max, ScalarKind::Int(256)), DecodedValue::Int(I256::MAX));
    }

    #[test]
    fn test_sign_extend_ignores_bits_above_width() {
        // a full word where only the low 16 bits belong to the value
        let value = U256::from(0xdead_fffeu64);
        assert_eq!(sign_extend(value, 16), int(-2));
    }

    #[test]
    fn test_parse_address_and_fixed_bytes() {
        let addr = Address::repeat_byte(0x11);
        assert_eq!(parse_value(addr.as_slice(), ScalarKind::Address), DecodedValue::Address(addr));
        assert_eq!(
            parse_value(&[0xbe, 0xef], ScalarKind::FixedBytes(2)),
            DecodedValue::FixedBytes(Bytes::from(vec![0xbe, 0xef]))
        );
        // an address slice of the wrong width is not guessed at
        assert!(matches!(parse_value(&[1, 2, 3], ScalarKind::Address), DecodedValue::Raw(_)));
    }

    #[test]
    fn test_parse_other_passthrough() {
        assert_eq!(
            parse_value(&[9, 8, 7], ScalarKind::Other),
            DecodedValue::Raw(Bytes::from(vec![9, 8, 7]))
        );
    }

    #[test]
    fn test_packed_round_trip() {
        // neg (int8, offset 0), pos (int8, offset 1), nibble (bytes2, offset 2), snacks (bytes6, offset 4)
        let mut word = B256::ZERO;
        place_bytes(&mut word, 0, &[0x80]);
        place_bytes(&mut word, 1, &[55]);
        place_bytes(&mut word, 2, &[0xbe, 0xef]);
        place_bytes(&mut word, 4, &[0xab, 0xcd, 0xef, 0x12, 0x34, 0x56]);

        assert_eq!(parse_value(extract_bytes(&word, 0, 1), ScalarKind::Int(8)), DecodedValue::Int(int(-128)));
        assert_eq!(parse_value(extract_bytes(&word, 1, 1), ScalarKind::Int(8)), DecodedValue::Int(int(55)));
        assert_eq!(
            parse_value(extract_bytes(&word, 2, 2), ScalarKind::FixedBytes(2)).to_string(),
            "0xbeef"
        );
        assert_eq!(
            parse_value(extract_bytes(&word, 4, 6), ScalarKind::FixedBytes(6)).to_string(),
            "0xabcdef123456"
        );
    }
}
