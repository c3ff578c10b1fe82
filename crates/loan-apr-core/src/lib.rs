pub mod error;
pub mod loan;
pub mod time_value;
pub mod types;

pub use error::LoanAprError;
pub use types::*;

/// Standard result type for all loan-apr operations
pub type LoanAprResult<T> = Result<T, LoanAprError>;
