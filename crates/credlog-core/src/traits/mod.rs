pub mod topic;

pub use topic::{TopicReader, TopicWriter};
