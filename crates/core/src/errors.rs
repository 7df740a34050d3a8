use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("database connectivity failure: {0}")]
    Connectivity(String),
    #[error("migration failure: {0}")]
    Migration(String),
}

impl ApplicationError {
    /// Stable machine-readable class, used in CLI payloads.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Persistence(_) => "persistence",
            Self::Configuration(_) => "config_validation",
            Self::Connectivity(_) => "db_connectivity",
            Self::Migration(_) => "migration",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Connectivity(_) => 4,
            Self::Migration(_) => 5,
            Self::NotFound(_) => 6,
            Self::Persistence(_) => 7,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "No matching customer exists.",
            Self::Persistence(_) => "The database is unavailable or returned an error.",
            Self::Configuration(_) => "The configuration is invalid.",
            Self::Connectivity(_) => "The database could not be reached.",
            Self::Migration(_) => "The database schema could not be migrated.",
        }
    }
}
