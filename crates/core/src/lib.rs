pub mod config;
pub mod domain;
pub mod errors;

pub use domain::customer::{CustomerId, CustomerRecord};
pub use errors::ApplicationError;
