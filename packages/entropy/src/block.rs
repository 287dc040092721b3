//! Block records and the JSON-RPC source they are fetched from.

use std::time::Duration;

use alloy_provider::{network::Ethereum, Provider, RootProvider};
use alloy_rpc_types::BlockNumberOrTag;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::{EntropyError, Result};

/// One block as returned under `result` by `eth_getBlockByNumber`.
///
/// Only `number` and `hash` are interpreted; every other field the node sends
/// is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub number: String,
    pub hash: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl BlockRecord {
    pub fn new(number: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            hash: hash.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Block height, from a `0x`-prefixed hex or plain decimal `number`
    pub fn height(&self) -> Result<u64> {
        let number = self.number.trim();
        let parsed = match number
            .strip_prefix("0x")
            .or_else(|| number.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => number.parse(),
        };

        parsed.map_err(|e| EntropyError::Fetch(format!("block number {:?}: {}", self.number, e)))
    }
}

/// A source of blocks addressed by height or by the `latest` tag.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlockSource {
    /// Fetch exactly one block.
    async fn fetch_block(&self, tag: BlockNumberOrTag) -> Result<BlockRecord>;
}

/// Block source backed by an HTTP JSON-RPC endpoint
#[derive(Clone)]
pub struct RpcBlockSource {
    provider: RootProvider<Ethereum>,
    timeout: Duration,
}

impl RpcBlockSource {
    pub fn new(rpc_url: &str, timeout: Duration) -> Result<Self> {
        let url = rpc_url
            .trim_matches('"')
            .parse()
            .map_err(|_| EntropyError::Config(format!("invalid RPC URL: {rpc_url:?}")))?;

        Ok(Self {
            provider: RootProvider::new_http(url),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.rpc_url, config.timeout)
    }
}

#[async_trait]
impl BlockSource for RpcBlockSource {
    async fn fetch_block(&self, tag: BlockNumberOrTag) -> Result<BlockRecord> {
        let request = self
            .provider
            .raw_request("eth_getBlockByNumber".into(), (tag, false));

        let block: Option<BlockRecord> = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| {
                EntropyError::Fetch(format!(
                    "block {tag:?}: no response within {:?}",
                    self.timeout
                ))
            })?
            .map_err(|e| EntropyError::Fetch(format!("block {tag:?}: {e}")))?;
        let block =
            block.ok_or_else(|| EntropyError::Fetch(format!("block {tag:?} not found")))?;

        debug!(number = %block.number, hash = %block.hash, "fetched block");
        Ok(block)
    }
}

/// Height of the chain head, the exclusive upper bound for sampling.
pub async fn latest_height<S>(source: &S) -> Result<u64>
where
    S: BlockSource + Send + Sync + ?Sized,
{
    let head = source.fetch_block(BlockNumberOrTag::Latest).await?;
    let height = head.height()?;
    info!(height, hash = %head.hash, "chain head");
    Ok(height)
}
