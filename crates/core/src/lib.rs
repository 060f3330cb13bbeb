pub mod config;
pub mod domain;
pub mod errors;
pub mod format;

pub use domain::envelope::ApiEnvelope;
pub use domain::license::{ExpiryStatus, LicenseRecord, LicenseStatus};
pub use domain::session::{
    ActionEvent, ActionOutcome, ConversationTurn, Speaker, Tracker, TrackerEvent,
};
pub use errors::{ApplicationError, DomainError};
