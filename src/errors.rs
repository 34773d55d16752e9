use alloy_primitives::U256;
use thiserror::Error;

/// Errors raised while loading and validating a compiler storage layout
#[derive(Debug, Error)]
pub enum LayoutError {
    /// The layout document is not valid JSON or does not have the expected shape
    #[error("Malformed storage layout JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Standard-JSON output does not contain the requested contract
    #[error("Contract {contract} not found in compiler output")]
    ContractNotFound {
        /// `file:Name` selector that was requested
        contract: String,
    },

    /// The selected contract was compiled without `storageLayout` output
    #[error("Contract {contract} has no storageLayout output")]
    MissingStorageLayout {
        /// `file:Name` selector that was requested
        contract: String,
    },

    /// A slot field is not a decimal 256-bit integer
    #[error("Invalid slot {slot:?} for {label}")]
    InvalidSlot {
        /// Variable or member label
        label: String,
        /// Raw slot string
        slot: String,
    },

    /// A `numberOfBytes` field is not a decimal integer
    #[error("Invalid numberOfBytes {value:?} for type {type_id}")]
    InvalidNumberOfBytes {
        /// Type identifier
        type_id: String,
        /// Raw field value
        value: String,
    },

    /// A type uses an encoding this crate does not know
    #[error("Unknown encoding {encoding:?} for type {type_id}")]
    UnknownEncoding {
        /// Type identifier
        type_id: String,
        /// Raw encoding name
        encoding: String,
    },

    /// A type descriptor lacks a field its encoding requires
    #[error("Type {type_id} is missing required field `{field}`")]
    MissingField {
        /// Type identifier
        type_id: String,
        /// Missing field name
        field: &'static str,
    },

    /// A variable, member, element or mapping value references a type absent from the table
    #[error("Type {type_id} referenced by {referenced_by} is not declared")]
    UnknownTypeReference {
        /// Referenced type identifier
        type_id: String,
        /// Label or type that holds the reference
        referenced_by: String,
    },

    /// A packed scalar would extend past the end of its slot
    #[error("{label}: byte offset {offset} + width {width} exceeds the 32-byte slot")]
    OffsetOutOfRange {
        /// Variable or member label
        label: String,
        /// Declared byte offset
        offset: u8,
        /// Declared scalar width
        width: u64,
    },
}

/// Failures of a word reader
#[derive(Debug, Error)]
pub enum ReaderError {
    /// The transport to the node failed (connection, timeout, HTTP status)
    #[error("Transport failure: {0}")]
    Transport(String),

    /// The node answered the call with a JSON-RPC error and substitution is disabled
    #[error("Node rejected eth_getStorageAt: {0}")]
    Rpc(String),

    /// The returned word is not hex or is wider than 32 bytes
    #[error("Malformed storage word {0:?}")]
    MalformedWord(String),
}

/// Errors surfaced while resolving a variable path
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Top-level label absent from the layout
    #[error("Storage variable '{label}' not found")]
    VariableNotFound {
        /// Requested variable label
        label: String,
    },

    /// Struct has no member with the requested label
    #[error("Member '{member}' not found in {type_label}")]
    MemberNotFound {
        /// Struct type label
        type_label: String,
        /// Requested member label
        member: String,
    },

    /// Array index segment is not a non-negative integer
    #[error("Invalid index {segment} for {type_label}")]
    InvalidIndex {
        /// Array type label
        type_label: String,
        /// Offending segment, rendered
        segment: String,
    },

    /// Mapping key segment cannot be encoded for the mapping's key type
    #[error("Invalid key {segment} for mapping key type {key_type}")]
    InvalidKey {
        /// Key type label
        key_type: String,
        /// Offending segment, rendered
        segment: String,
    },

    /// Path continues past a type that accepts no further navigation
    #[error("Unexpected path segment {segment} after {type_label}")]
    UnexpectedPathSegment {
        /// Terminal type label
        type_label: String,
        /// First leftover segment, rendered
        segment: String,
    },

    /// Array or mapping reached with no index/key left in the path
    #[error("{type_label} requires an index or key")]
    MissingPathSegment {
        /// Array or mapping type label
        type_label: String,
    },

    /// Index is past the stored (or declared) array length
    #[error("Index {index} out of bounds for {type_label} of length {length}")]
    IndexOutOfBounds {
        /// Array type label
        type_label: String,
        /// Requested index
        index: u64,
        /// Array length
        length: U256,
    },

    /// A bytes/string length field exceeds the configured limit
    #[error("Payload of {length} bytes at slot {slot} exceeds the limit of {limit}")]
    PayloadTooLarge {
        /// Slot holding the length field
        slot: U256,
        /// Decoded length
        length: U256,
        /// Configured limit
        limit: usize,
    },

    /// A string payload is not valid UTF-8
    #[error("String at slot {slot} is not valid UTF-8")]
    InvalidUtf8 {
        /// Slot holding the length field
        slot: U256,
    },

    /// A type identifier is missing from the layout's type table
    #[error("Type {0} is not declared in the storage layout")]
    UnknownType(String),

    /// The word reader failed
    #[error("Storage read failed: {0}")]
    ReaderFailure(#[from] ReaderError),
}
