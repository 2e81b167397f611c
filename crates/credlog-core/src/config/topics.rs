use crate::types::TopicId;
use serde::{Deserialize, Serialize};

/// Topics the registry reads and writes
///
/// - institutions: registrations and updates
/// - app: forms for institutions without a topic of their own
/// - submissions: applications against forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicConfig {
    pub institution_topic: TopicId,

    /// Falls back to `institution_topic`
    #[serde(default)]
    pub app_topic: Option<TopicId>,

    /// Falls back to the app topic
    #[serde(default)]
    pub submission_topic: Option<TopicId>,
}

impl TopicConfig {
    pub fn new(institution_topic: TopicId) -> Self {
        Self {
            institution_topic,
            app_topic: None,
            submission_topic: None,
        }
    }

    pub fn with_app_topic(mut self, topic: TopicId) -> Self {
        self.app_topic = Some(topic);
        self
    }

    pub fn with_submission_topic(mut self, topic: TopicId) -> Self {
        self.submission_topic = Some(topic);
        self
    }

    pub fn app_topic(&self) -> TopicId {
        self.app_topic.unwrap_or(self.institution_topic)
    }

    pub fn submission_topic(&self) -> TopicId {
        self.submission_topic.unwrap_or_else(|| self.app_topic())
    }
}
