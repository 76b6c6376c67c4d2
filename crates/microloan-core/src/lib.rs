pub mod calculator;
pub mod config;
pub mod error;
pub mod format;
pub mod pricing;
pub mod provider;
pub mod repayment;
pub mod types;
pub mod validation;

pub use error::MicroloanError;
pub use types::*;

/// Standard result type for all microloan operations
pub type MicroloanResult<T> = Result<T, MicroloanError>;
