use super::{MirrorConfig, Network, ReaderConfig, TopicConfig, VisibilityConfig};
use crate::error::{CredlogError, Result};
use crate::types::TopicId;
use std::time::Duration;

/// Everything a registry needs before it touches the network
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub mirror: MirrorConfig,
    pub topics: TopicConfig,
    pub reader: ReaderConfig,
    pub visibility: VisibilityConfig,
}

impl RegistryConfig {
    pub fn new(topics: TopicConfig) -> Self {
        Self {
            mirror: MirrorConfig::default(),
            topics,
            reader: ReaderConfig::default(),
            visibility: VisibilityConfig::default(),
        }
    }

    pub fn with_mirror(mut self, mirror: MirrorConfig) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn with_reader(mut self, reader: ReaderConfig) -> Self {
        self.reader = reader;
        self
    }

    pub fn with_visibility(mut self, visibility: VisibilityConfig) -> Self {
        self.visibility = visibility;
        self
    }

    /// Load configuration from environment variables
    ///
    /// Looks for:
    /// - CREDLOG_INSTITUTION_TOPIC_ID (required)
    /// - CREDLOG_APP_TOPIC_ID, CREDLOG_SUBMISSION_TOPIC_ID
    /// - CREDLOG_NETWORK (mainnet, testnet, previewnet; default testnet)
    /// - CREDLOG_MIRROR_URL (overrides the network default)
    /// - CREDLOG_PAGE_LIMIT, CREDLOG_MAX_PAGES, CREDLOG_VISIBILITY_TIMEOUT_MS
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let institution_topic = var("CREDLOG_INSTITUTION_TOPIC_ID").ok_or_else(|| {
            CredlogError::Config("CREDLOG_INSTITUTION_TOPIC_ID is not set".to_string())
        })?;
        let mut topics = TopicConfig::new(institution_topic.parse::<TopicId>()?);
        if let Some(app) = var("CREDLOG_APP_TOPIC_ID") {
            topics = topics.with_app_topic(app.parse()?);
        }
        if let Some(submissions) = var("CREDLOG_SUBMISSION_TOPIC_ID") {
            topics = topics.with_submission_topic(submissions.parse()?);
        }

        let network = match var("CREDLOG_NETWORK") {
            Some(name) => name.parse::<Network>()?,
            None => Network::default(),
        };
        let mut mirror = MirrorConfig::for_network(network);
        if let Some(url) = var("CREDLOG_MIRROR_URL") {
            mirror = mirror.with_base_url(url);
        }
        if let Some(limit) = var("CREDLOG_PAGE_LIMIT") {
            mirror = mirror.with_page_limit(parse_number("CREDLOG_PAGE_LIMIT", &limit)?);
        }
        mirror.validate()?;

        let mut reader = ReaderConfig::default();
        if let Some(max) = var("CREDLOG_MAX_PAGES") {
            reader = reader.with_max_pages(parse_number("CREDLOG_MAX_PAGES", &max)?);
        }

        let mut visibility = VisibilityConfig::default();
        if let Some(ms) = var("CREDLOG_VISIBILITY_TIMEOUT_MS") {
            let ms: u64 = parse_number("CREDLOG_VISIBILITY_TIMEOUT_MS", &ms)?;
            visibility = visibility.with_timeout(Duration::from_millis(ms));
        }

        Ok(Self {
            mirror,
            topics,
            reader,
            visibility,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CredlogError::Config(format!("{key} is not a valid number: {value}")))
}
