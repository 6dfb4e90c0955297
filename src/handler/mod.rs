pub mod audit;
pub mod error;
pub mod health;
pub mod params;

pub use error::ApiError;
pub use params::AuditParams;
