use async_trait::async_trait;
use thiserror::Error;

use vatbook_core::domain::customer::CustomerRecord;
use vatbook_core::errors::ApplicationError;

pub mod customer;
pub mod memory;

pub use customer::SqlCustomerGateway;
pub use memory::InMemoryCustomerGateway;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{context}: {source}")]
    Persistence { context: &'static str, source: PersistenceCause },
    #[error("customer not found for vat {vat}")]
    NotFound { vat: i32 },
}

#[derive(Debug, Error)]
pub enum PersistenceCause {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("statement returned no generated key")]
    MissingGeneratedKey,
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// A result row could not be turned into a `CustomerRecord`.
#[derive(Debug, Error)]
#[error("could not decode column `{column}`: {source}")]
pub struct LoadError {
    pub column: &'static str,
    #[source]
    pub source: sqlx::Error,
}

impl GatewayError {
    pub(crate) fn persistence(context: &'static str, cause: impl Into<PersistenceCause>) -> Self {
        Self::Persistence { context, source: cause.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<GatewayError> for ApplicationError {
    fn from(value: GatewayError) -> Self {
        match value {
            GatewayError::NotFound { .. } => Self::NotFound(value.to_string()),
            GatewayError::Persistence { .. } => Self::Persistence(value.to_string()),
        }
    }
}

/// Row Data Gateway over the `Customer` table.
#[async_trait]
pub trait CustomerGateway: Send + Sync {
    /// Persists `record` as a new row and fills in its generated id.
    ///
    /// On failure the record is left untouched.
    async fn insert(&self, record: &mut CustomerRecord) -> Result<(), GatewayError>;

    /// Loads the first row whose `vat` equals the given value.
    async fn find_by_vat(&self, vat: i32) -> Result<CustomerRecord, GatewayError>;
}
