use alloy_primitives::U256;

/// Typed form of one entry of the layout's type table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    /// Human-readable type name, e.g. `mapping(address => uint256)`
    pub label: String,
    /// Bytes the type occupies in storage (the value width for scalars)
    pub number_of_bytes: u64,
    /// How values of this type are laid out
    pub encoding: Encoding,
}

/// Storage strategy of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoding {
    /// Fixed location, possibly packed with neighbours
    Inplace(Inplace),
    /// Length at the declared slot, elements from `keccak256(slot)`
    DynamicArray {
        /// Element type
        base: String,
    },
    /// `bytes` or `string`: short inline or long hash-addressed payload
    Bytes {
        /// Decode the payload as UTF-8
        is_string: bool,
    },
    /// Values at `keccak256(key ++ slot)`
    Mapping {
        /// Key type
        key: String,
        /// Value type
        value: String,
    },
}

/// Shapes of an `inplace` type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inplace {
    /// Value type occupying `number_of_bytes` of one slot
    Scalar(ScalarKind),
    /// Struct with members at relative slots and offsets
    Struct(Vec<StructMember>),
    /// Fixed-size array `T[length]` laid out from the declared slot
    Array {
        /// Element type
        base: String,
        /// Declared length
        length: u64,
    },
}

/// Member of a struct type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructMember {
    pub label: String,
    pub type_id: String,
    /// Slot relative to the struct's base slot
    pub slot: U256,
    /// Byte offset inside that slot, from the low-order end
    pub offset: u8,
}

/// Interpretation of a value type's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    /// Unsigned integer of the given bit width
    Uint(u16),
    /// Two's-complement signed integer of the given bit width
    Int(u16),
    /// `address`, `address payable` and contract references
    Address,
    /// `bytesN`
    FixedBytes(u8),
    /// Anything else; passed through as raw bytes
    Other,
}

impl ScalarKind {
    /// Classify a value type from its solc type identifier.
    ///
    /// Enums are stored as the smallest unsigned integer that fits, so they
    /// decode as `Uint` of the declared width.
    pub fn from_type_id(type_id: &str, number_of_bytes: u64) -> Self {
        if type_id == "t_bool" {
            return Self::Bool;
        }
        if type_id.starts_with("t_address") || type_id.starts_with("t_contract(") {
            return Self::Address;
        }
        if type_id.starts_with("t_enum(") {
            return Self::Uint((number_of_bytes * 8) as u16);
        }
        if let Some(bits) = numeric_suffix(type_id, "t_uint") {
            return Self::Uint(bits);
        }
        if let Some(bits) = numeric_suffix(type_id, "t_int") {
            return Self::Int(bits);
        }
        if let Some(width) = numeric_suffix(type_id, "t_bytes") {
            if (1..=32).contains(&width) {
                return Self::FixedBytes(width as u8);
            }
        }
        Self::Other
    }
}

impl TypeDescriptor {
    /// Whether this is a single-slot value type (bool, integers, address, bytesN, enum).
    pub fn is_value_type(&self) -> bool {
        matches!(self.encoding, Encoding::Inplace(Inplace::Scalar(_)))
    }

    /// Whether the aggregate view of an enclosing struct should skip this type.
    ///
    /// Dynamic arrays are only read on explicit index request; mappings cannot
    /// be enumerated at all.
    pub fn is_lazy(&self) -> bool {
        matches!(self.encoding, Encoding::DynamicArray { .. } | Encoding::Mapping { .. })
    }
}

/// `t_uint256` → 256, `t_bytes4` → 4; `None` when the rest is not all digits.
fn numeric_suffix(type_id: &str, prefix: &str) -> Option<u16> {
    let rest = type_id.strip_prefix(prefix)?;
    if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok()
}

/// Declared length of a fixed-size array: `t_array(t_uint64)3_storage` → 3.
///
/// Falls back to the trailing `[n]` of the label.
pub(crate) fn static_array_length(type_id: &str, label: &str) -> Option<u64> {
    let from_id = type_id
        .rfind(')')
        .map(|close| &type_id[close + 1..])
        .map(|tail| tail.split('_').next().unwrap_or(tail))
        .and_then(|digits| digits.parse().ok());

    from_id.or_else(|| {
        let (_, tail) = label.rsplit_once('[')?;
        tail.strip_suffix(']')?.parse().ok()
    })
}
