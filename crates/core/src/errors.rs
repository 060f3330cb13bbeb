use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("license number `{0}` is not in a recognised format")]
    InvalidLicenseNumber(String),
    #[error("license status `{0}` is not supported")]
    UnsupportedStatus(String),
    #[error("required slot `{0}` is missing")]
    MissingSlot(&'static str),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Stable label used in structured log fields.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(_) => "validation",
            Self::Integration(_) => "integration",
            Self::Configuration(_) => "configuration",
        }
    }
}
