//! Alloy-backed storage reader
//!
//! Supports HTTP, WebSocket and (on unix) IPC transports. Every storage read
//! is pinned to an explicit block number.

#[cfg(unix)]
use std::path::PathBuf;

use alloy::network::Ethereum;
use alloy::primitives::{Address, B256};
use alloy::providers::{
    fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
    Identity, Provider, ProviderBuilder, RootProvider,
};
use anyhow::{Context, Result};

use crate::domain::storage::{StorageReader, StorageSlot};

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
    /// IPC socket path (Unix only)
    #[cfg(unix)]
    Ipc(PathBuf),
}

impl ProviderConfig {
    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => path.display().to_string(),
        }
    }
}

type FilledProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

/// Storage reader over a connected alloy provider
pub struct AlloyStorageReader {
    provider: FilledProvider,
    endpoint: String,
}

/// Connect a storage reader from configuration
pub async fn create_reader(config: ProviderConfig) -> Result<AlloyStorageReader> {
    let endpoint = config.display();
    let provider = match config {
        ProviderConfig::Http(url) => {
            let rpc_url = url.parse().context("Invalid HTTP URL")?;
            ProviderBuilder::new().connect_http(rpc_url)
        }
        ProviderConfig::WebSocket(url) => ProviderBuilder::new()
            .connect(&url)
            .await
            .context("Failed to create WebSocket provider")?,
        #[cfg(unix)]
        ProviderConfig::Ipc(path) => {
            use alloy::providers::IpcConnect;
            let ipc = IpcConnect::new(path.to_string_lossy().to_string());
            ProviderBuilder::new()
                .connect_ipc(ipc)
                .await
                .context("Failed to create IPC provider")?
        }
    };
    tracing::debug!(%endpoint, "connected storage reader");
    Ok(AlloyStorageReader { provider, endpoint })
}

#[async_trait::async_trait]
impl StorageReader for AlloyStorageReader {
    async fn block_number(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .with_context(|| format!("eth_blockNumber on {}", self.endpoint))
    }

    async fn storage_at(&self, address: Address, slot: StorageSlot, block: u64) -> Result<B256> {
        let value = self
            .provider
            .get_storage_at(address, slot.as_u256())
            .number(block)
            .await
            .with_context(|| format!("eth_getStorageAt {address} {slot} @{block}"))?;
        Ok(B256::from(value))
    }

    fn endpoint_name(&self) -> String {
        self.endpoint.clone()
    }
}

/// Prefix bare host:port endpoints with `http://`
pub fn normalize_http_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
