//! Slot arithmetic: hash addressing for arrays and mappings, packing inside a word.
//!
//! All additions wrap modulo 2^256, matching the EVM.

use crate::constants::WORD_SIZE;
use alloy_primitives::{Keccak256, B256, U256};

/// A slot number as the 32-byte big-endian storage key (`leftPad32(slot)`).
pub fn slot_key(slot: U256) -> B256 {
    B256::from(slot.to_be_bytes())
}

/// Compute the base slot for a dynamic array's (or long `bytes`) data.
///
/// For `uint256[] public numbers` at slot 13:
///   base = keccak256(abi.encode(13))
///   numbers[0] lives at base + 0
///   numbers[1] lives at base + 1
pub fn dynamic_array_base_slot(array_slot: U256) -> U256 {
    let mut hasher = Keccak256::new();
    hasher.update(slot_key(array_slot).as_slice());
    U256::from_be_bytes(hasher.finalize().0)
}

/// Compute the storage slot of a mapping entry from an already encoded key.
///
/// For `balances[addr]` at mapping slot 15:
///   slot = keccak256(leftPad32(addr) ++ leftPad32(15))
///
/// `string`/`bytes` keys are passed unpadded.
pub fn mapping_slot(encoded_key: &[u8], mapping_slot: U256) -> U256 {
    let mut hasher = Keccak256::new();
    hasher.update(encoded_key);
    hasher.update(slot_key(mapping_slot).as_slice());
    U256::from_be_bytes(hasher.finalize().0)
}

/// Left-pad up to 32 bytes into a word (integers, addresses, bool).
pub fn left_pad(bytes: &[u8]) -> Option<B256> {
    let len = bytes.len();
    if len > WORD_SIZE {
        return None;
    }
    let mut word = [0u8; WORD_SIZE];
    word[WORD_SIZE - len..].copy_from_slice(bytes);
    Some(B256::from(word))
}

/// Right-pad up to 32 bytes into a word (`bytesN` mapping keys).
pub fn right_pad(bytes: &[u8]) -> Option<B256> {
    let len = bytes.len();
    if len > WORD_SIZE {
        return None;
    }
    let mut word = [0u8; WORD_SIZE];
    word[..len].copy_from_slice(bytes);
    Some(B256::from(word))
}

/// Slot and byte offset of element `index` in an array whose data starts at `base`.
///
/// Elements narrower than a word are packed `32 / width` per slot, first element in
/// the low-order bytes, never straddling a slot boundary. Wider elements (structs,
/// fixed arrays) take `ceil(width / 32)` whole slots each.
pub fn element_location(base: U256, index: u64, element_bytes: u64) -> (U256, u8) {
    let word = WORD_SIZE as u64;
    if element_bytes == 0 {
        return (base, 0);
    }
    if element_bytes < word {
        let per_slot = word / element_bytes;
        let slot = base.wrapping_add(U256::from(index / per_slot));
        let offset = (index % per_slot) * element_bytes;
        (slot, offset as u8)
    } else {
        let slots_per_element = element_bytes.div_ceil(word);
        let slot = base.wrapping_add(U256::from(index).wrapping_mul(U256::from(slots_per_element)));
        (slot, 0)
    }
}

/// Isolate `width` bytes at `offset` (counted from the low-order end) of a word.
///
/// `start = 32 - width - offset`; a negative start is clamped to the first byte.
pub fn extract_bytes(word: &B256, offset: u8, width: usize) -> &[u8] {
    let width = width.min(WORD_SIZE);
    let start = (WORD_SIZE as isize - width as isize - offset as isize).max(0) as usize;
    let end = (start + width).min(WORD_SIZE);
    &word[start..end]
}

/// Write `bytes` into a word at `offset` from the low-order end; inverse of [`extract_bytes`].
pub fn place_bytes(word: &mut B256, offset: u8, bytes: &[u8]) {
    let width = bytes.len().min(WORD_SIZE);
    let start = (WORD_SIZE as isize - width as isize - offset as isize).max(0) as usize;
    let end = (start + width).min(WORD_SIZE);
    word[start..end].copy_from_slice(&bytes[..end - start]);
}

/// Number of 32-byte slots needed to hold `len` bytes.
pub fn word_count(len: usize) -> usize {
    len.div_ceil(WORD_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{keccak256, Address};

    #[test]
    fn test_dynamic_array_base_slot_is_keccak_of_padded_slot() {
        let slot = U256::from(13);
        let expected = keccak256(slot.to_be_bytes::<32>());
        assert_eq!(dynamic_array_base_slot(slot), U256::from_be_bytes(expected.0));
    }

    #[test]
    fn test_dynamic_array_base_slot_known_value() {
        // keccak256(abi.encode(0)), the well-known data slot of an array at slot 0
        let expected: U256 = "0x290decd9548b62a8d60345a988386fc84ba6bc95484008f6362f93160ef3e563"
            .parse()
            .unwrap();
        assert_eq!(dynamic_array_base_slot(U256::ZERO), expected);
    }

    #[test]
    fn test_mapping_slot_matches_manual_concat() {
        let key = left_pad(&[0x2a]).unwrap();
        let slot = U256::from(15);
        let mut preimage = Vec::with_capacity(64);
        preimage.extend_from_slice(key.as_slice());
        preimage.extend_from_slice(&slot.to_be_bytes::<32>());
        assert_eq!(mapping_slot(key.as_slice(), slot), U256::from_be_bytes(keccak256(&preimage).0));
    }

    #[test]
    fn test_mapping_slot_distinct_keys() {
        let slot = U256::from(2);
        let a = mapping_slot(left_pad(Address::repeat_byte(1).as_slice()).unwrap().as_slice(), slot);
        let b = mapping_slot(left_pad(Address::repeat_byte(2).as_slice()).unwrap().as_slice(), slot);
        assert_ne!(a, b);
        // same key under a different declaration lands elsewhere too
        let c = mapping_slot(left_pad(Address::repeat_byte(1).as_slice()).unwrap().as_slice(), U256::from(3));
        assert_ne!(a, c);
    }

    #[test]
    fn test_padding() {
        let left = left_pad(&[0xbe, 0xef]).unwrap();
        assert_eq!(left[30..], [0xbe, 0xef]);
        assert!(left[..30].iter().all(|b| *b == 0));

        let right = right_pad(&[0xbe, 0xef]).unwrap();
        assert_eq!(right[..2], [0xbe, 0xef]);
        assert!(right[2..].iter().all(|b| *b == 0));

        assert!(left_pad(&[0u8; 33]).is_none());
        assert!(right_pad(&[0u8; 33]).is_none());
    }

    #[test]
    fn test_element_location_full_words() {
        let base = U256::from(100);
        assert_eq!(element_location(base, 0, 32), (U256::from(100), 0));
        assert_eq!(element_location(base, 3, 32), (U256::from(103), 0));
    }

    #[test]
    fn test_element_location_packed() {
        let base = U256::from(100);
        // uint8: 32 per slot
        assert_eq!(element_location(base, 0, 1), (U256::from(100), 0));
        assert_eq!(element_location(base, 31, 1), (U256::from(100), 31));
        assert_eq!(element_location(base, 32, 1), (U256::from(101), 0));
        // uint64: 4 per slot
        assert_eq!(element_location(base, 5, 8), (U256::from(101), 8));
        // uint24: 10 per slot, never straddles
        assert_eq!(element_location(base, 9, 3), (U256::from(100), 27));
        assert_eq!(element_location(base, 10, 3), (U256::from(101), 0));
    }

    #[test]
    fn test_element_location_multi_slot_struct() {
        let base = U256::from(100);
        assert_eq!(element_location(base, 0, 96), (U256::from(100), 0));
        assert_eq!(element_location(base, 2, 96), (U256::from(106), 0));
        assert_eq!(element_location(base, 1, 40), (U256::from(102), 0));
    }

    #[test]
    fn test_element_location_wraps() {
        assert_eq!(element_location(U256::MAX, 1, 32), (U256::ZERO, 0));
    }

    #[test]
    fn test_extract_packed_fields() {
        // owner (20 bytes, offset 0) and isOn (1 byte, offset 20) sharing one slot
        let owner = Address::repeat_byte(0xaa);
        let mut word = B256::ZERO;
        place_bytes(&mut word, 0, owner.as_slice());
        place_bytes(&mut word, 20, &[1]);

        assert_eq!(extract_bytes(&word, 0, 20), owner.as_slice());
        assert_eq!(extract_bytes(&word, 20, 1), &[1]);
        assert_eq!(word[11], 1);
    }

    #[test]
    fn test_extract_full_word() {
        let word = B256::repeat_byte(7);
        assert_eq!(extract_bytes(&word, 0, 32), word.as_slice());
    }

    #[test]
    fn test_extract_clamps_negative_start() {
        let mut word = B256::ZERO;
        word[0] = 0xff;
        word[1] = 0xee;
        // offset 31 with width 2 would start at -1
        let bytes = extract_bytes(&word, 31, 2);
        assert_eq!(bytes, &[0xff, 0xee]);
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count(0), 0);
        assert_eq!(word_count(1), 1);
        assert_eq!(word_count(32), 1);
        assert_eq!(word_count(33), 2);
        assert_eq!(word_count(66), 3);
    }
}
