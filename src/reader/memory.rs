use super::WordReader;
use crate::constants::WORD_SIZE;
use crate::errors::ReaderError;
use crate::slots::{dynamic_array_base_slot, place_bytes, slot_key};
use alloy_primitives::{Address, B256, I256, U256};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// In-memory contract storage.
///
/// Unset slots read as zero, like real storage. The `store_*` helpers write
/// values using the compiler's encodings so tests and offline snapshots can be
/// populated without a node.
#[derive(Debug, Default)]
pub struct MemoryWordReader {
    words: BTreeMap<(Address, U256), B256>,
    reads: AtomicU64,
}

impl MemoryWordReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `read_word` calls served so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of non-zero words held.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Current word at a slot (zero when unset).
    pub fn word(&self, address: Address, slot: U256) -> B256 {
        self.words.get(&(address, slot)).copied().unwrap_or(B256::ZERO)
    }

    /// Overwrite a whole word.
    pub fn set_word(&mut self, address: Address, slot: U256, word: B256) -> &mut Self {
        if word.is_zero() {
            self.words.remove(&(address, slot));
        } else {
            self.words.insert((address, slot), word);
        }
        self
    }

    /// Write `bytes` at `offset` (from the low-order end) keeping the rest of the word.
    pub fn store_packed(&mut self, address: Address, slot: U256, offset: u8, bytes: &[u8]) -> &mut Self {
        let mut word = self.word(address, slot);
        place_bytes(&mut word, offset, bytes);
        self.set_word(address, slot, word)
    }

    /// Store an unsigned integer `width` bytes wide (at most a word).
    pub fn store_uint(&mut self, address: Address, slot: U256, offset: u8, width: usize, value: U256) -> &mut Self {
        let width = width.min(WORD_SIZE);
        let bytes = value.to_be_bytes::<WORD_SIZE>();
        self.store_packed(address, slot, offset, &bytes[WORD_SIZE - width..])
    }

    /// Store a signed integer `width` bytes wide (at most a word) in two's complement.
    pub fn store_int(&mut self, address: Address, slot: U256, offset: u8, width: usize, value: I256) -> &mut Self {
        let width = width.min(WORD_SIZE);
        let bytes = value.into_raw().to_be_bytes::<WORD_SIZE>();
        self.store_packed(address, slot, offset, &bytes[WORD_SIZE - width..])
    }

    pub fn store_bool(&mut self, address: Address, slot: U256, offset: u8, value: bool) -> &mut Self {
        self.store_packed(address, slot, offset, &[value as u8])
    }

    pub fn store_address(&mut self, address: Address, slot: U256, offset: u8, value: Address) -> &mut Self {
        self.store_packed(address, slot, offset, value.as_slice())
    }

    /// Store a `bytes`/`string` value with the compiler's short/long encoding.
    ///
    /// Up to 31 bytes: payload in the high-order bytes, `len * 2` in the lowest byte.
    /// Longer: `len * 2 + 1` at `slot`, payload from `keccak256(slot)` onwards.
    pub fn store_bytes(&mut self, address: Address, slot: U256, data: &[u8]) -> &mut Self {
        if data.len() < WORD_SIZE {
            let mut word = [0u8; WORD_SIZE];
            word[..data.len()].copy_from_slice(data);
            word[WORD_SIZE - 1] = (data.len() * 2) as u8;
            return self.set_word(address, slot, B256::from(word));
        }

        let length_field = U256::from(data.len()) * U256::from(2) + U256::from(1);
        self.set_word(address, slot, slot_key(length_field));

        let base = dynamic_array_base_slot(slot);
        for (i, chunk) in data.chunks(WORD_SIZE).enumerate() {
            let mut word = [0u8; WORD_SIZE];
            word[..chunk.len()].copy_from_slice(chunk);
            self.set_word(address, base + U256::from(i), B256::from(word));
        }
        self
    }

    pub fn store_string(&mut self, address: Address, slot: U256, value: &str) -> &mut Self {
        self.store_bytes(address, slot, value.as_bytes())
    }
}

#[async_trait::async_trait]
impl WordReader for MemoryWordReader {
    async fn read_word(&self, address: Address, slot: U256) -> Result<B256, ReaderError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.word(address, slot))
    }
}
