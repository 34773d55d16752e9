//! Serde shapes of the solc `storageLayout` output, before validation.

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
pub(crate) struct RawLayout {
    #[serde(default)]
    pub storage: Vec<RawEntry>,
    /// solc emits `null` for contracts without state variables
    #[serde(default)]
    pub types: Option<BTreeMap<String, RawType>>,
}

/// A top-level variable or a struct member; both share the same shape.
#[derive(Debug, Deserialize)]
pub(crate) struct RawEntry {
    pub label: String,
    #[serde(default)]
    pub offset: u8,
    pub slot: String,
    #[serde(rename = "type")]
    pub type_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawType {
    pub encoding: String,
    pub label: String,
    pub number_of_bytes: String,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub members: Option<Vec<RawEntry>>,
}
