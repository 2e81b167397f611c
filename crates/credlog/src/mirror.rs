//! Mirror node REST client
//!
//! Reads topic messages through `GET /api/v1/topics/{id}/messages`. The
//! mirror node returns `links.next` as a path relative to its own base URL,
//! which this client turns back into an absolute URL for the next page.
//!
//! # Example
//!
//! ```no_run
//! use credlog::mirror::MirrorNodeClient;
//! use credlog::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let client = Arc::new(MirrorNodeClient::new(MirrorConfig::for_network(Network::Testnet))?);
//! let reader = LogReader::new(client, ReaderConfig::default());
//! let messages = reader.read_all(&"0.0.5202172".parse()?, Order::Asc).await?;
//! println!("{} messages", messages.len());
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use credlog_core::{
    CredlogError, MessagePage, MirrorConfig, Order, Result, TopicId, TopicMessage, TopicReader,
};
use serde::Deserialize;
use std::time::Duration;

/// Body of a mirror node messages response
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<TopicMessage>,

    #[serde(default)]
    links: Links,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    next: Option<String>,
}

/// [`TopicReader`] backed by a mirror node
pub struct MirrorNodeClient {
    config: MirrorConfig,
    client: reqwest::Client,
}

impl MirrorNodeClient {
    pub fn new(config: MirrorConfig) -> Result<Self> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| CredlogError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// URL of the first page
    pub fn messages_url(&self, topic: &TopicId, order: Order) -> String {
        format!(
            "{}/api/v1/topics/{}/messages?limit={}&order={}",
            self.config.base_url,
            topic,
            self.config.page_limit,
            order.as_str()
        )
    }

    /// URL for a `links.next` value
    pub fn next_url(&self, next: &str) -> String {
        if next.starts_with("http://") || next.starts_with("https://") {
            next.to_string()
        } else if next.starts_with('/') {
            format!("{}{}", self.config.base_url, next)
        } else {
            format!("{}/{}", self.config.base_url, next)
        }
    }

    async fn get_page(&self, url: &str) -> Result<MessagePage> {
        tracing::debug!("Fetching mirror node page: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CredlogError::Transport(format!("Failed to reach mirror node: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredlogError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let body: MessagesResponse = response.json().await.map_err(|e| {
            CredlogError::Serialization(format!("Failed to parse mirror node response: {e}"))
        })?;

        Ok(MessagePage {
            messages: body.messages,
            next: body.links.next.filter(|next| !next.is_empty()),
        })
    }
}

#[async_trait]
impl TopicReader for MirrorNodeClient {
    async fn fetch_page(
        &self,
        topic: &TopicId,
        order: Order,
        cursor: Option<&str>,
    ) -> Result<MessagePage> {
        let url = match cursor {
            Some(next) => self.next_url(next),
            None => self.messages_url(topic, order),
        };
        self.get_page(&url).await
    }
}
