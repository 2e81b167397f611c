use serde::{Deserialize, Serialize};

/// Configuration for the pagination driver
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Upper bound on pages fetched by one read
    ///
    /// `None` follows `next` links until the topic is exhausted. When set,
    /// hitting the bound fails the read instead of returning a truncated log.
    #[serde(default)]
    pub max_pages: Option<usize>,
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_pages(mut self, max: usize) -> Self {
        self.max_pages = Some(max);
        self
    }
}
