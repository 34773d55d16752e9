//! Compiler storage layout: where every state variable lives and how its type is encoded.
//!
//! Built once from solc's `storageLayout` JSON and never mutated afterwards.
//! Loading validates the whole type table up front, so the resolver can rely on
//! every type reference being present and every packed scalar fitting its slot.
//!
//! ```text
//!   solc --standard-json  →  storageLayout { storage: [...], types: {...} }
//!                                   ↓  StorageLayout::from_json
//!                           StorageLayout (typed, validated)
//!                                   ↓  lookup(label)
//!                           VariableEntry { slot, offset, type_id }
//! ```

mod raw;
mod types;

pub use types::{Encoding, Inplace, ScalarKind, StructMember, TypeDescriptor};

use crate::constants::WORD_SIZE;
use crate::errors::{LayoutError, ResolveError};
use alloy_primitives::U256;
use raw::{RawEntry, RawLayout, RawType};
use std::collections::HashMap;

/// One top-level state variable declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableEntry {
    /// Source-level variable name
    pub label: String,
    /// Base slot assigned by the compiler
    pub slot: U256,
    /// Byte offset inside the slot, counted from the low-order end
    pub offset: u8,
    /// Key into the layout's type table
    pub type_id: String,
}

/// Validated storage layout of one contract.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    types: HashMap<String, TypeDescriptor>,
    variables: Vec<VariableEntry>,
}

impl StorageLayout {
    /// Parse a bare `storageLayout` object, a build artifact carrying one under
    /// `storageLayout`, or a full solc standard-JSON output.
    ///
    /// `contract` selects the contract in standard-JSON output, as `File.sol:Name`
    /// or just `Name`. It is ignored for a bare layout.
    pub fn from_json(json: &str, contract: Option<&str>) -> Result<Self, LayoutError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        if value.get("contracts").is_some() {
            let selector = contract.unwrap_or_default();
            let layout = select_contract_layout(&value, selector)?;
            return Self::from_value(layout.clone());
        }
        match value {
            serde_json::Value::Object(mut artifact) if artifact.contains_key("storageLayout") => {
                let layout = artifact.remove("storageLayout").unwrap_or_default();
                Self::from_value(layout)
            }
            bare => Self::from_value(bare),
        }
    }

    /// Parse a bare `storageLayout` JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, LayoutError> {
        let raw: RawLayout = serde_json::from_value(value)?;
        Self::try_from_raw(raw)
    }

    /// Find a top-level variable by label.
    pub fn lookup(&self, name: &str) -> Result<&VariableEntry, ResolveError> {
        self.variables
            .iter()
            .find(|entry| entry.label == name)
            .ok_or_else(|| ResolveError::VariableNotFound { label: name.to_string() })
    }

    /// Look up a type descriptor by identifier.
    pub fn type_of(&self, type_id: &str) -> Result<&TypeDescriptor, ResolveError> {
        self.types
            .get(type_id)
            .ok_or_else(|| ResolveError::UnknownType(type_id.to_string()))
    }

    /// Whether decoding `descriptor` needs at least one more index or key.
    ///
    /// True for dynamic arrays and mappings, and for fixed arrays whose
    /// elements (at any depth) are one of those.
    pub fn requires_path(&self, descriptor: &TypeDescriptor) -> bool {
        match &descriptor.encoding {
            Encoding::Inplace(Inplace::Array { base, .. }) => {
                self.types.get(base).is_some_and(|element| self.requires_path(element))
            }
            _ => descriptor.is_lazy(),
        }
    }

    /// Variables in declaration order.
    pub fn variables(&self) -> impl Iterator<Item = &VariableEntry> {
        self.variables.iter()
    }

    /// Number of declared variables.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// Whether the contract declares no state variables.
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    fn try_from_raw(raw: RawLayout) -> Result<Self, LayoutError> {
        let mut types = HashMap::new();
        for (type_id, raw_type) in raw.types.unwrap_or_default() {
            let descriptor = convert_type(&type_id, raw_type)?;
            types.insert(type_id, descriptor);
        }

        let variables = raw
            .storage
            .into_iter()
            .map(|entry| {
                let slot = parse_slot(&entry)?;
                Ok(VariableEntry {
                    label: entry.label,
                    slot,
                    offset: entry.offset,
                    type_id: entry.type_id,
                })
            })
            .collect::<Result<Vec<_>, LayoutError>>()?;

        let layout = Self { types, variables };
        layout.validate()?;
        Ok(layout)
    }

    /// Check every type reference and every packed scalar placement.
    fn validate(&self) -> Result<(), LayoutError> {
        for entry in &self.variables {
            self.check_placement(&entry.label, &entry.type_id, entry.offset)?;
        }

        for (type_id, descriptor) in &self.types {
            match &descriptor.encoding {
                Encoding::Inplace(Inplace::Scalar(_)) | Encoding::Bytes { .. } => {}
                Encoding::Inplace(Inplace::Struct(members)) => {
                    for member in members {
                        self.check_placement(&member.label, &member.type_id, member.offset)?;
                    }
                }
                Encoding::Inplace(Inplace::Array { base, .. }) | Encoding::DynamicArray { base } => {
                    self.check_reference(base, type_id)?;
                }
                Encoding::Mapping { key, value } => {
                    self.check_reference(key, type_id)?;
                    self.check_reference(value, type_id)?;
                }
            }
        }
        Ok(())
    }

    fn check_reference(&self, type_id: &str, referenced_by: &str) -> Result<(), LayoutError> {
        if self.types.contains_key(type_id) {
            Ok(())
        } else {
            Err(LayoutError::UnknownTypeReference {
                type_id: type_id.to_string(),
                referenced_by: referenced_by.to_string(),
            })
        }
    }

    fn check_placement(&self, label: &str, type_id: &str, offset: u8) -> Result<(), LayoutError> {
        self.check_reference(type_id, label)?;
        let descriptor = &self.types[type_id];
        let width = if descriptor.is_value_type() { descriptor.number_of_bytes } else { 0 };
        if offset as u64 + width > WORD_SIZE as u64 || offset as usize >= WORD_SIZE {
            return Err(LayoutError::OffsetOutOfRange { label: label.to_string(), offset, width });
        }
        Ok(())
    }
}

/// Pick `contracts[file][name].storageLayout` out of standard-JSON output.
fn select_contract_layout<'a>(
    output: &'a serde_json::Value,
    selector: &str,
) -> Result<&'a serde_json::Value, LayoutError> {
    let not_found = || LayoutError::ContractNotFound { contract: selector.to_string() };
    let contracts = output["contracts"].as_object().ok_or_else(not_found)?;

    let (file, name) = match selector.rsplit_once(':') {
        Some((file, name)) => (Some(file), name),
        None => (None, selector),
    };

    let contract = contracts
        .iter()
        .filter(|(source, _)| file.is_none_or(|f| f == source.as_str()))
        .filter_map(|(_, per_file)| per_file.as_object())
        .find_map(|per_file| {
            if name.is_empty() && per_file.len() == 1 {
                per_file.values().next()
            } else {
                per_file.get(name)
            }
        })
        .ok_or_else(not_found)?;

    contract
        .get("storageLayout")
        .filter(|layout| !layout.is_null())
        .ok_or_else(|| LayoutError::MissingStorageLayout { contract: selector.to_string() })
}

fn parse_slot(entry: &RawEntry) -> Result<U256, LayoutError> {
    U256::from_str_radix(&entry.slot, 10).map_err(|_| LayoutError::InvalidSlot {
        label: entry.label.clone(),
        slot: entry.slot.clone(),
    })
}

fn convert_type(type_id: &str, raw: RawType) -> Result<TypeDescriptor, LayoutError> {
    let number_of_bytes: u64 =
        raw.number_of_bytes
            .parse()
            .map_err(|_| LayoutError::InvalidNumberOfBytes {
                type_id: type_id.to_string(),
                value: raw.number_of_bytes.clone(),
            })?;
    let missing = |field| LayoutError::MissingField { type_id: type_id.to_string(), field };

    let encoding = match raw.encoding.as_str() {
        "inplace" => {
            if let Some(members) = raw.members {
                let members = members
                    .into_iter()
                    .map(|member| {
                        let slot = parse_slot(&member)?;
                        Ok(StructMember {
                            label: member.label,
                            type_id: member.type_id,
                            slot,
                            offset: member.offset,
                        })
                    })
                    .collect::<Result<Vec<_>, LayoutError>>()?;
                Encoding::Inplace(Inplace::Struct(members))
            } else if let Some(base) = raw.base {
                let length = types::static_array_length(type_id, &raw.label)
                    .ok_or_else(|| missing("length"))?;
                Encoding::Inplace(Inplace::Array { base, length })
            } else {
                Encoding::Inplace(Inplace::Scalar(ScalarKind::from_type_id(type_id, number_of_bytes)))
            }
        }
        "dynamic_array" => Encoding::DynamicArray { base: raw.base.ok_or_else(|| missing("base"))? },
        "bytes" => Encoding::Bytes { is_string: type_id.starts_with("t_string") },
        "mapping" => Encoding::Mapping {
            key: raw.key.ok_or_else(|| missing("key"))?,
            value: raw.value.ok_or_else(|| missing("value"))?,
        },
        other => {
            return Err(LayoutError::UnknownEncoding {
                type_id: type_id.to_string(),
                encoding: other.to_string(),
            })
        }
    };

    Ok(TypeDescriptor { label: raw.label, number_of_bytes, encoding })
}
