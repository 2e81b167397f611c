pub mod entity;
pub mod event;
pub mod message;
pub mod topic;

pub use entity::{
    CredentialForm, FieldType, FormField, FormSubmission, Institution, InstitutionStatus,
};
pub use event::{EventKind, FormDeletion, FormUpdate, InstitutionUpdate, LedgerEvent};
pub use message::{ConsensusTimestamp, MessagePage, Order, SubmitReceipt, TopicMessage};
pub use topic::TopicId;
