use super::WordReader;
use crate::constants::{DEFAULT_RPC_TIMEOUT_MS, DEFAULT_RPC_URL, WORD_SIZE};
use crate::errors::ReaderError;
use crate::slots::{left_pad, slot_key};
use alloy_primitives::{Address, B256, U256};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::ClientError;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use std::time::Duration;
use tracing::{trace, warn};

/// Configuration for [`RpcWordReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcReaderConfig {
    /// HTTP JSON-RPC endpoint
    pub url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Block tag or number passed to `eth_getStorageAt`; decimal numbers are sent as hex quantities
    pub block: String,
    /// Answer a JSON-RPC error response with an all-zero word.
    ///
    /// Some dev backends fail the call for never-written slots instead of
    /// returning zero; with this set such slots decode as empty storage.
    pub substitute_empty_on_call_error: bool,
}

impl Default for RpcReaderConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_RPC_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_RPC_TIMEOUT_MS),
            block: "latest".to_string(),
            substitute_empty_on_call_error: true,
        }
    }
}

/// Reads storage words with `eth_getStorageAt` over HTTP.
pub struct RpcWordReader {
    client: HttpClient,
    config: RpcReaderConfig,
}

impl RpcWordReader {
    /// Build an HTTP client for the configured endpoint.
    pub fn new(mut config: RpcReaderConfig) -> Result<Self, ReaderError> {
        config.block = block_parameter(&config.block)?;
        let client = HttpClientBuilder::default()
            .request_timeout(config.timeout)
            .build(&config.url)
            .map_err(|e| ReaderError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &RpcReaderConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl WordReader for RpcWordReader {
    async fn read_word(&self, address: Address, slot: U256) -> Result<B256, ReaderError> {
        let params = rpc_params![address, slot_key(slot), self.config.block.as_str()];
        trace!(target: "storage_map::rpc", %address, %slot, "eth_getStorageAt");

        match self.client.request::<String, _>("eth_getStorageAt", params).await {
            Ok(raw) => parse_storage_word(&raw),
            Err(err) => handle_call_failure(err, slot, self.config.substitute_empty_on_call_error),
        }
    }
}

/// Normalize a block selector: `latest`/`safe`/... and `0x` quantities pass through,
/// decimal numbers become `0x` quantities.
pub fn block_parameter(block: &str) -> Result<String, ReaderError> {
    if !block.is_empty() && block.bytes().all(|b| b.is_ascii_digit()) {
        let number: u64 = block
            .parse()
            .map_err(|_| ReaderError::Transport(format!("block number {block} out of range")))?;
        return Ok(format!("{number:#x}"));
    }
    Ok(block.to_string())
}

/// Map a failed `eth_getStorageAt` call to a word or an error.
fn handle_call_failure(err: ClientError, slot: U256, substitute: bool) -> Result<B256, ReaderError> {
    match err {
        ClientError::Call(call) if substitute => {
            warn!(
                target: "storage_map::rpc",
                %slot,
                code = call.code(),
                message = call.message(),
                "eth_getStorageAt failed, reading slot as empty"
            );
            Ok(B256::ZERO)
        }
        ClientError::Call(call) => Err(ReaderError::Rpc(call.to_string())),
        ClientError::ParseError(e) => Err(ReaderError::MalformedWord(e.to_string())),
        other => Err(ReaderError::Transport(other.to_string())),
    }
}

/// Parse a node's hex word, left-padding short answers such as `"0x"` or `"0x1"`.
pub fn parse_storage_word(raw: &str) -> Result<B256, ReaderError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    let digits = if digits.len() % 2 == 1 { format!("0{digits}") } else { digits.to_string() };
    let bytes = hex::decode(&digits).map_err(|_| ReaderError::MalformedWord(raw.to_string()))?;
    if bytes.len() > WORD_SIZE {
        return Err(ReaderError::MalformedWord(raw.to_string()));
    }
    left_pad(&bytes).ok_or_else(|| ReaderError::MalformedWord(raw.to_string()))
}
