use crate::constants::{
    DEFAULT_CACHE_ENTRIES, DEFAULT_MAX_CONCURRENT_READS, DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_RPC_TIMEOUT_MS,
    DEFAULT_RPC_URL,
};
use crate::path::PathSegment;
use crate::reader::{CacheConfig, RpcReaderConfig};
use crate::resolver::ResolverConfig;
use alloy_primitives::Address;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// CLI arguments for the storage decoder
#[derive(Parser, Debug)]
#[command(name = "storage-map", about = "Decode contract storage variables by name")]
pub struct Cli {
    /// Storage layout JSON: a solc `storageLayout` object or standard-JSON output
    #[arg(long)]
    pub layout: PathBuf,

    /// Contract to pick from standard-JSON output (`File.sol:Name` or `Name`).
    /// Not needed when the file holds a single contract.
    #[arg(long)]
    pub contract: Option<String>,

    /// Deployed contract address
    #[arg(long, required_unless_present = "list")]
    pub address: Option<Address>,

    /// HTTP JSON-RPC endpoint.
    /// Can also be set via STORAGE_MAP_RPC_URL environment variable.
    #[arg(long, env = "STORAGE_MAP_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Block to read storage at: a tag (latest, safe, finalized, ...) or a
    /// number, decimal or 0x-hex
    #[arg(long, default_value = "latest")]
    pub block: String,

    /// Maximum number of storage words kept in the read cache.
    /// Set to 0 to disable caching.
    #[arg(long, default_value_t = DEFAULT_CACHE_ENTRIES)]
    pub cache_size: usize,

    /// Per-request RPC timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_RPC_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Largest `bytes`/`string` payload to reassemble, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_PAYLOAD_BYTES)]
    pub max_payload_bytes: usize,

    /// Storage reads one struct, array or string keeps in flight at once
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT_READS)]
    pub max_concurrent_reads: usize,

    /// Skip the length check on dynamic array indices
    #[arg(long)]
    pub no_bounds_check: bool,

    /// Fail on JSON-RPC error responses instead of reading the slot as empty
    #[arg(long)]
    pub strict_rpc: bool,

    /// Print the decoded value as JSON
    #[arg(long)]
    pub json: bool,

    /// List the variables in the layout and exit
    #[arg(long)]
    pub list: bool,

    /// Top-level variable name
    #[arg(required_unless_present = "list")]
    pub variable: Option<String>,

    /// Path into the variable: array indices, mapping keys (decimal, 0x-hex or text)
    /// and struct member names
    pub path: Vec<PathSegment>,
}

impl Cli {
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            check_array_bounds: !self.no_bounds_check,
            max_payload_bytes: self.max_payload_bytes,
            max_concurrent_reads: self.max_concurrent_reads,
        }
    }

    pub fn rpc_config(&self) -> RpcReaderConfig {
        RpcReaderConfig {
            url: self.rpc_url.clone(),
            timeout: Duration::from_millis(self.timeout_ms),
            block: self.block.clone(),
            substitute_empty_on_call_error: !self.strict_rpc,
        }
    }

    /// `None` when caching is disabled.
    pub fn cache_config(&self) -> Option<CacheConfig> {
        (self.cache_size > 0).then(|| CacheConfig::with_capacity(self.cache_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Bytes, U256};

    const ADDRESS: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    #[test]
    fn test_minimal_invocation() {
        let cli = Cli::try_parse_from(["storage-map", "--layout", "layout.json", "--address", ADDRESS, "x"]).unwrap();
        assert_eq!(cli.variable.as_deref(), Some("x"));
        assert!(cli.path.is_empty());
        assert_eq!(cli.block, "latest");
        assert_eq!(cli.cache_config(), Some(CacheConfig::with_capacity(DEFAULT_CACHE_ENTRIES)));
        assert_eq!(cli.resolver_config(), ResolverConfig::default());
        assert!(cli.rpc_config().substitute_empty_on_call_error);
    }

    #[test]
    fn test_path_segments() {
        let cli = Cli::try_parse_from([
            "storage-map",
            "--layout",
            "layout.json",
            "--address",
            ADDRESS,
            "mapFun",
            "0",
            "1",
            "e",
            "0xdeadbeef",
        ])
        .unwrap();
        assert_eq!(
            cli.path,
            vec![
                PathSegment::Index(0),
                PathSegment::Index(1),
                PathSegment::Member("e".into()),
                PathSegment::Key(Bytes::from(vec![0xde, 0xad, 0xbe, 0xef])),
            ]
        );
    }

    #[test]
    fn test_flags_feed_configs() {
        let cli = Cli::try_parse_from([
            "storage-map",
            "--layout",
            "layout.json",
            "--address",
            ADDRESS,
            "--rpc-url",
            "http://node:8545",
            "--block",
            "0x10",
            "--cache-size",
            "0",
            "--timeout-ms",
            "500",
            "--no-bounds-check",
            "--strict-rpc",
            "--max-concurrent-reads",
            "4",
            "numbers",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.cache_config(), None);
        assert!(!cli.resolver_config().check_array_bounds);
        assert_eq!(cli.resolver_config().max_concurrent_reads, 4);

        let rpc = cli.rpc_config();
        assert_eq!(rpc.url, "http://node:8545");
        assert_eq!(rpc.block, "0x10");
        assert_eq!(rpc.timeout, Duration::from_millis(500));
        assert!(!rpc.substitute_empty_on_call_error);
        assert_eq!(cli.path[0].as_index(), Some(3));
    }

    #[test]
    fn test_list_needs_no_address_or_variable() {
        let cli = Cli::try_parse_from(["storage-map", "--layout", "layout.json", "--list"]).unwrap();
        assert!(cli.list);
        assert!(cli.address.is_none());
        assert!(cli.variable.is_none());
    }

    #[test]
    fn test_variable_required_without_list() {
        assert!(Cli::try_parse_from(["storage-map", "--layout", "layout.json", "--address", ADDRESS]).is_err());
    }

    #[test]
    fn test_bad_address_rejected() {
        assert!(Cli::try_parse_from(["storage-map", "--layout", "l.json", "--address", "0x1234", "x"]).is_err());
    }

    #[test]
    fn test_wide_numeric_key() {
        let wide = "340282366920938463463374607431768211456"; // 2^128
        let cli = Cli::try_parse_from(["storage-map", "--layout", "l.json", "--address", ADDRESS, "balances", wide])
            .unwrap();
        let expected = PathSegment::from(U256::from(1u64) << 128);
        assert_eq!(cli.path, vec![expected]);
    }
}
