//! Word readers: the one capability the resolver needs from the outside world.
//!
//! ```text
//!   StorageResolver
//!     → CachedWordReader      (optional in-memory LRU)
//!       → RpcWordReader       (eth_getStorageAt over HTTP)
//!       → MemoryWordReader    (tests, offline snapshots)
//! ```

pub mod cache;
pub mod memory;
pub mod rpc;

pub use cache::{CacheConfig, CacheStats, CachedWordReader, HotWordCache, SharedCache};
pub use memory::MemoryWordReader;
pub use rpc::{RpcReaderConfig, RpcWordReader};

use crate::errors::ReaderError;
use alloy_primitives::{Address, B256, U256};
use std::sync::Arc;

/// Reads one 32-byte storage word of a contract.
///
/// Implementations decide how to treat storage that was never written; the RPC
/// reader maps the known "call failed for an empty slot" provider behaviour to a
/// zero word so the resolver never sees it.
#[async_trait::async_trait]
pub trait WordReader: Send + Sync {
    /// Read the word at `slot` of `address`.
    async fn read_word(&self, address: Address, slot: U256) -> Result<B256, ReaderError>;
}

#[async_trait::async_trait]
impl<R: WordReader + ?Sized> WordReader for Arc<R> {
    async fn read_word(&self, address: Address, slot: U256) -> Result<B256, ReaderError> {
        (**self).read_word(address, slot).await
    }
}

#[async_trait::async_trait]
impl<R: WordReader + ?Sized> WordReader for &R {
    async fn read_word(&self, address: Address, slot: U256) -> Result<B256, ReaderError> {
        (**self).read_word(address, slot).await
    }
}
