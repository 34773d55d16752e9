//! # evm-storage-map - typed reads of EVM contract storage
//!
//! Resolves a named storage variable (optionally followed by array indices,
//! mapping keys or struct members) into a decoded value, using nothing but the
//! compiler's `storageLayout` output and a way to read one 32-byte word.

pub mod cli;
pub mod constants;
pub mod errors;
pub mod layout;
pub mod output;
pub mod parser;
pub mod path;
pub mod reader;
pub mod resolver;
pub mod slots;
pub mod value;

pub use errors::{LayoutError, ReaderError, ResolveError};
pub use layout::{Encoding, Inplace, ScalarKind, StorageLayout, StructMember, TypeDescriptor, VariableEntry};
pub use path::PathSegment;
pub use reader::{CacheConfig, CachedWordReader, MemoryWordReader, RpcReaderConfig, RpcWordReader, WordReader};
pub use resolver::{ResolverConfig, StorageResolver};
pub use value::DecodedValue;
