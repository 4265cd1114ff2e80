mod executor;
mod request;
mod types;

pub(crate) use executor::cancel_reasons;
pub use executor::{TransactionExecutor, TransactionFailureReason};
pub use request::{TransactGetRequest, TransactWriteRequest};
pub use types::{TransactGetItem, TransactGetResult, TransactWriteItem};
