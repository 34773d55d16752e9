/// Size of one storage slot in bytes
pub const WORD_SIZE: usize = 32;

/// Width of an address value inside a slot
pub const ADDRESS_BYTES: usize = 20;

/// Upper bound on a `bytes`/`string` payload the resolver will reassemble (1 MiB)
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1 << 20;

/// Default LRU capacity for the cached word reader
pub const DEFAULT_CACHE_ENTRIES: usize = 1_024;

/// Default JSON-RPC request timeout in milliseconds
pub const DEFAULT_RPC_TIMEOUT_MS: u64 = 10_000;

/// Default JSON-RPC endpoint for a local dev node
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Reads a single aggregate keeps in flight at once
pub const DEFAULT_MAX_CONCURRENT_READS: usize = 16;
