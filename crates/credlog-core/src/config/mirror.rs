use crate::error::{CredlogError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Ledger network, used to pick a default mirror node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
    Previewnet,
}

impl Network {
    pub fn mirror_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://mainnet-public.mirrornode.hedera.com",
            Network::Testnet => "https://testnet.mirrornode.hedera.com",
            Network::Previewnet => "https://previewnet.mirrornode.hedera.com",
        }
    }
}

impl FromStr for Network {
    type Err = CredlogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "previewnet" => Ok(Network::Previewnet),
            other => Err(CredlogError::Config(format!("unknown network: {other}"))),
        }
    }
}

/// Configuration for the mirror node REST client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Base URL without the `/api/v1` suffix
    /// Default: testnet mirror node
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Messages requested per page (the mirror node caps this at 100)
    /// Default: 100
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Per-request timeout in seconds
    /// Default: 30
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    Network::default().mirror_url().to_string()
}

fn default_page_limit() -> u32 {
    100
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_limit: default_page_limit(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl MirrorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_network(network: Network) -> Self {
        Self::default().with_base_url(network.mirror_url())
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }

    pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
        self.request_timeout_secs = secs;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(CredlogError::Config("mirror base_url is empty".into()));
        }
        if self.page_limit == 0 || self.page_limit > 100 {
            return Err(CredlogError::Config(format!(
                "page_limit must be within 1..=100, got {}",
                self.page_limit
            )));
        }
        Ok(())
    }
}
