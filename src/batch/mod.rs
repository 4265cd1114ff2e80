mod executor;
mod request;
mod retry;
mod types;

pub use executor::BatchExecutor;
pub use request::{BatchGetRequest, BatchWriteRequest};
pub use retry::{run_batch_write, BatchRetryOptions};
pub use types::{BatchGetResult, BatchWriteItem, BatchWriteResult};
