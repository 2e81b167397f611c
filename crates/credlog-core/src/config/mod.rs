pub mod mirror;
pub mod reader;
pub mod registry;
pub mod topics;
pub mod visibility;

pub use mirror::{MirrorConfig, Network};
pub use reader::ReaderConfig;
pub use registry::RegistryConfig;
pub use topics::TopicConfig;
pub use visibility::{BackoffStrategy, VisibilityConfig};
