//! Storage resolver: variable path → decoded value.
//!
//! Resolution walks the type table recursively, consuming one path segment per
//! level:
//!
//! ```text
//!   lookup("mapFun")                        slot 12, mapping(uint256 => Fun[])
//!     [0]   keccak256(pad(0) ++ pad(12))    Fun[] length word
//!     [1]   keccak256(that slot) + 1        Fun, one slot
//!     .e    same slot, offset 6             uint32 → parse
//! ```
//!
//! The resolver holds no mutable state. Independent reads (struct members,
//! fixed-array elements, the data slots of a long string) are issued concurrently,
//! at most `max_concurrent_reads` at a time per aggregate. Packed arrays read each
//! slot once and slice their elements out of it.

use crate::constants::{DEFAULT_MAX_CONCURRENT_READS, DEFAULT_MAX_PAYLOAD_BYTES, WORD_SIZE};
use crate::errors::ResolveError;
use crate::layout::{Encoding, Inplace, ScalarKind, StorageLayout, StructMember, TypeDescriptor, VariableEntry};
use crate::parser::{parse_value, sign_extend};
use crate::path::PathSegment;
use crate::reader::WordReader;
use crate::slots::{
    dynamic_array_base_slot, element_location, extract_bytes, left_pad, mapping_slot, right_pad,
    slot_key, word_count,
};
use crate::value::DecodedValue;
use alloy_primitives::{Address, Bytes, B256, U256};
use futures_util::future::{BoxFuture, FutureExt};
use futures_util::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;
use tracing::{debug, trace};

/// Resolver limits and checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Read a dynamic array's length word and reject indices past it
    pub check_array_bounds: bool,
    /// Largest `bytes`/`string` payload (or fixed-array aggregate) to reassemble
    pub max_payload_bytes: usize,
    /// Reads in flight at once for one aggregate (0 is treated as 1)
    pub max_concurrent_reads: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            check_array_bounds: true,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            max_concurrent_reads: DEFAULT_MAX_CONCURRENT_READS,
        }
    }
}

/// Decodes the storage of one deployed contract.
pub struct StorageResolver<R> {
    layout: StorageLayout,
    reader: R,
    address: Address,
    config: ResolverConfig,
}

impl<R: WordReader> StorageResolver<R> {
    /// Bind a layout and a word reader to one contract address.
    pub fn new(layout: StorageLayout, reader: R, address: Address) -> Self {
        Self { layout, reader, address, config: ResolverConfig::default() }
    }

    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Find a top-level variable declaration.
    pub fn lookup(&self, name: &str) -> Result<&VariableEntry, ResolveError> {
        self.layout.lookup(name)
    }

    /// Decode variable `name`, following `path` into its elements, entries or members.
    pub async fn get_storage(&self, name: &str, path: &[PathSegment]) -> Result<DecodedValue, ResolveError> {
        let entry = self.layout.lookup(name)?;
        debug!(
            target: "storage_map::resolver",
            variable = name,
            slot = %entry.slot,
            segments = path.len(),
            "resolving"
        );
        self.resolve(&entry.type_id, entry.slot, entry.offset, path).await
    }

    /// Decode a value of type `type_id` stored at `slot`/`offset`, consuming `path`.
    pub fn resolve<'a>(
        &'a self,
        type_id: &'a str,
        slot: U256,
        offset: u8,
        path: &'a [PathSegment],
    ) -> BoxFuture<'a, Result<DecodedValue, ResolveError>> {
        async move {
            let descriptor = self.layout.type_of(type_id)?;
            match &descriptor.encoding {
                Encoding::Inplace(Inplace::Scalar(kind)) => {
                    self.read_scalar(descriptor, *kind, slot, offset, path).await
                }
                Encoding::Inplace(Inplace::Struct(members)) => {
                    self.resolve_struct(descriptor, members, slot, path).await
                }
                Encoding::Inplace(Inplace::Array { base, length }) => {
                    self.resolve_fixed_array(descriptor, base, *length, slot, path).await
                }
                Encoding::DynamicArray { base } => {
                    self.resolve_dynamic_array(descriptor, base, slot, path).await
                }
                Encoding::Bytes { is_string } => self.read_bytes(descriptor, *is_string, slot, path).await,
                Encoding::Mapping { key, value } => {
                    self.resolve_mapping(descriptor, key, value, slot, path).await
                }
            }
        }
        .boxed()
    }

    async fn read_word(&self, slot: U256) -> Result<B256, ResolveError> {
        trace!(target: "storage_map::resolver", %slot, "read");
        Ok(self.reader.read_word(self.address, slot).await?)
    }

    /// Drive `reads` with bounded concurrency, keeping their order.
    async fn join_bounded<T, F>(&self, reads: Vec<F>) -> Result<Vec<T>, ResolveError>
    where
        F: Future<Output = Result<T, ResolveError>>,
    {
        stream::iter(reads)
            .buffered(self.config.max_concurrent_reads.max(1))
            .try_collect()
            .await
    }

    /// `count` consecutive words starting at `start`.
    async fn read_words(&self, start: U256, count: usize) -> Result<Vec<B256>, ResolveError> {
        let reads: Vec<_> = (0..count)
            .map(|i| self.read_word(start.wrapping_add(U256::from(i))))
            .collect();
        self.join_bounded(reads).await
    }

    async fn read_scalar(
        &self,
        descriptor: &TypeDescriptor,
        kind: ScalarKind,
        slot: U256,
        offset: u8,
        path: &[PathSegment],
    ) -> Result<DecodedValue, ResolveError> {
        if let Some(segment) = path.first() {
            return Err(unexpected_segment(descriptor, segment));
        }
        let word = self.read_word(slot).await?;
        let bytes = extract_bytes(&word, offset, descriptor.number_of_bytes as usize);
        Ok(parse_value(bytes, kind))
    }

    async fn resolve_struct(
        &self,
        descriptor: &TypeDescriptor,
        members: &[StructMember],
        slot: U256,
        path: &[PathSegment],
    ) -> Result<DecodedValue, ResolveError> {
        let Some((segment, rest)) = path.split_first() else {
            // Whole struct: every member that can be read without further keys
            let mut included = Vec::with_capacity(members.len());
            for member in members {
                if !self.layout.requires_path(self.layout.type_of(&member.type_id)?) {
                    included.push(member);
                }
            }
            let reads: Vec<_> = included
                .iter()
                .map(|member| self.resolve(&member.type_id, slot.wrapping_add(member.slot), member.offset, &[]))
                .collect();
            let values = self.join_bounded(reads).await?;
            let fields = included.iter().map(|member| member.label.clone()).zip(values).collect();
            return Ok(DecodedValue::Struct(fields));
        };

        let member = match segment {
            PathSegment::Member(label) => members.iter().find(|member| member.label == *label),
            _ => None,
        }
        .ok_or_else(|| ResolveError::MemberNotFound {
            type_label: descriptor.label.clone(),
            member: segment_label(segment),
        })?;

        self.resolve(&member.type_id, slot.wrapping_add(member.slot), member.offset, rest)
            .await
    }

    async fn resolve_fixed_array(
        &self,
        descriptor: &TypeDescriptor,
        base: &str,
        length: u64,
        slot: U256,
        path: &[PathSegment],
    ) -> Result<DecodedValue, ResolveError> {
        let element = self.layout.type_of(base)?;

        let Some((segment, rest)) = path.split_first() else {
            if self.layout.requires_path(element) {
                return Err(ResolveError::MissingPathSegment { type_label: descriptor.label.clone() });
            }
            let total = element.number_of_bytes.saturating_mul(length);
            if total > self.config.max_payload_bytes as u64 {
                return Err(ResolveError::PayloadTooLarge {
                    slot,
                    length: U256::from(total),
                    limit: self.config.max_payload_bytes,
                });
            }
            if let Encoding::Inplace(Inplace::Scalar(kind)) = &element.encoding {
                return self.read_packed_array(slot, length, element.number_of_bytes, *kind).await;
            }
            let reads: Vec<_> = (0..length)
                .map(|index| {
                    let (element_slot, offset) = element_location(slot, index, element.number_of_bytes);
                    self.resolve(base, element_slot, offset, &[])
                })
                .collect();
            let values = self.join_bounded(reads).await?;
            return Ok(DecodedValue::Array(values));
        };

        let index = array_index(descriptor, segment)?;
        if index >= length {
            return Err(ResolveError::IndexOutOfBounds {
                type_label: descriptor.label.clone(),
                index,
                length: U256::from(length),
            });
        }
        let (element_slot, offset) = element_location(slot, index, element.number_of_bytes);
        self.resolve(base, element_slot, offset, rest).await
    }

    /// Every element of a fixed array of value types, reading each slot once.
    async fn read_packed_array(
        &self,
        slot: U256,
        length: u64,
        width: u64,
        kind: ScalarKind,
    ) -> Result<DecodedValue, ResolveError> {
        let width = width.clamp(1, WORD_SIZE as u64);
        let per_slot = WORD_SIZE as u64 / width;
        let words = self.read_words(slot, length.div_ceil(per_slot) as usize).await?;

        let values = (0..length)
            .map(|index| {
                let word = &words[(index / per_slot) as usize];
                let offset = ((index % per_slot) * width) as u8;
                parse_value(extract_bytes(word, offset, width as usize), kind)
            })
            .collect();
        Ok(DecodedValue::Array(values))
    }

    async fn resolve_dynamic_array(
        &self,
        descriptor: &TypeDescriptor,
        base: &str,
        slot: U256,
        path: &[PathSegment],
    ) -> Result<DecodedValue, ResolveError> {
        let (segment, rest) = path
            .split_first()
            .ok_or_else(|| ResolveError::MissingPathSegment { type_label: descriptor.label.clone() })?;
        let index = array_index(descriptor, segment)?;

        if self.config.check_array_bounds {
            let length = U256::from_be_bytes(self.read_word(slot).await?.0);
            if U256::from(index) >= length {
                return Err(ResolveError::IndexOutOfBounds {
                    type_label: descriptor.label.clone(),
                    index,
                    length,
                });
            }
        }

        let element = self.layout.type_of(base)?;
        let data_slot = dynamic_array_base_slot(slot);
        let (element_slot, offset) = element_location(data_slot, index, element.number_of_bytes);
        self.resolve(base, element_slot, offset, rest).await
    }

    async fn read_bytes(
        &self,
        descriptor: &TypeDescriptor,
        is_string: bool,
        slot: U256,
        path: &[PathSegment],
    ) -> Result<DecodedValue, ResolveError> {
        if let Some(segment) = path.first() {
            return Err(unexpected_segment(descriptor, segment));
        }

        let head = self.read_word(slot).await?;
        let low_byte = head[31];
        let data = if low_byte & 1 == 0 {
            // short: payload in the high-order bytes, length * 2 in the low byte
            let len = ((low_byte / 2) as usize).min(31);
            head[..len].to_vec()
        } else {
            let length = (U256::from_be_bytes(head.0) - U256::from(1)) >> 1;
            let len = usize::try_from(length)
                .ok()
                .filter(|len| *len <= self.config.max_payload_bytes)
                .ok_or(ResolveError::PayloadTooLarge {
                    slot,
                    length,
                    limit: self.config.max_payload_bytes,
                })?;
            let words = self.read_words(dynamic_array_base_slot(slot), word_count(len)).await?;
            let mut data: Vec<u8> = words.iter().flat_map(|word| word.0).collect();
            data.truncate(len);
            data
        };

        if is_string {
            String::from_utf8(data)
                .map(DecodedValue::String)
                .map_err(|_| ResolveError::InvalidUtf8 { slot })
        } else {
            Ok(DecodedValue::Bytes(Bytes::from(data)))
        }
    }

    async fn resolve_mapping(
        &self,
        descriptor: &TypeDescriptor,
        key: &str,
        value: &str,
        slot: U256,
        path: &[PathSegment],
    ) -> Result<DecodedValue, ResolveError> {
        let (segment, rest) = path
            .split_first()
            .ok_or_else(|| ResolveError::MissingPathSegment { type_label: descriptor.label.clone() })?;
        let key_type = self.layout.type_of(key)?;
        let encoded = encode_mapping_key(segment, key_type)?;
        let entry_slot = mapping_slot(&encoded, slot);
        self.resolve(value, entry_slot, 0, rest).await
    }
}

/// Encode a path segment as the hash preimage of a mapping key of type `key_type`.
///
/// Value types are left-padded to a word (signed integers sign-extended),
/// `bytesN` right-padded, and `string`/`bytes` keys used as-is.
pub fn encode_mapping_key(segment: &PathSegment, key_type: &TypeDescriptor) -> Result<Vec<u8>, ResolveError> {
    let invalid = || ResolveError::InvalidKey {
        key_type: key_type.label.clone(),
        segment: segment_label(segment),
    };

    match (&key_type.encoding, segment) {
        (Encoding::Bytes { .. }, PathSegment::Member(text)) => Ok(text.as_bytes().to_vec()),
        (Encoding::Bytes { .. }, PathSegment::Key(bytes)) => Ok(bytes.to_vec()),
        (Encoding::Bytes { .. }, PathSegment::Index(i)) => Ok(i.to_string().into_bytes()),

        (Encoding::Inplace(Inplace::Scalar(ScalarKind::FixedBytes(width))), PathSegment::Key(bytes)) => {
            if bytes.len() > *width as usize {
                return Err(invalid());
            }
            right_pad(bytes).map(|word| word.to_vec()).ok_or_else(invalid)
        }
        (Encoding::Inplace(Inplace::Scalar(ScalarKind::FixedBytes(_))), _) => Err(invalid()),

        (Encoding::Inplace(Inplace::Scalar(kind)), segment) => {
            let word = match segment {
                PathSegment::Index(i) => left_pad(&U256::from(*i).to_be_bytes::<32>()),
                PathSegment::Key(bytes) => match kind {
                    ScalarKind::Int(_) if !bytes.is_empty() && bytes.len() < WORD_SIZE => {
                        U256::try_from_be_slice(bytes)
                            .map(|raw| slot_key(sign_extend(raw, (bytes.len() * 8) as u16).into_raw()))
                    }
                    _ => left_pad(bytes),
                },
                PathSegment::Member(text) if *kind == ScalarKind::Bool => match text.as_str() {
                    "true" => left_pad(&[1]),
                    "false" => left_pad(&[0]),
                    _ => None,
                },
                PathSegment::Member(_) => None,
            };
            word.map(|word| word.to_vec()).ok_or_else(invalid)
        }

        _ => Err(invalid()),
    }
}

fn array_index(descriptor: &TypeDescriptor, segment: &PathSegment) -> Result<u64, ResolveError> {
    segment.as_index().ok_or_else(|| ResolveError::InvalidIndex {
        type_label: descriptor.label.clone(),
        segment: segment_label(segment),
    })
}

fn unexpected_segment(descriptor: &TypeDescriptor, segment: &PathSegment) -> ResolveError {
    ResolveError::UnexpectedPathSegment {
        type_label: descriptor.label.clone(),
        segment: segment_label(segment),
    }
}

fn segment_label(segment: &PathSegment) -> String {
    match segment {
        PathSegment::Member(label) => label.clone(),
        other => other.to_string(),
    }
}
