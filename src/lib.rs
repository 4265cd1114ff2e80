pub mod batch;
pub mod cancellation;
pub mod condition;
pub mod engine;
pub mod error;
pub mod expr;
pub mod facade;
pub mod index;
pub mod query;
pub mod storage;
pub mod table;
pub mod transaction;
pub mod types;
pub mod update;
pub mod utils;

pub use batch::{
    BatchExecutor, BatchGetRequest, BatchGetResult, BatchRetryOptions, BatchWriteItem,
    BatchWriteRequest, BatchWriteResult,
};
pub use cancellation::CancellationToken;
pub use engine::{ConformanceFlags, Engine, StoreOptions};
pub use error::{
    EvalError, EvalResult, ParseError, ParseResult, StorageError, StorageResult, TableError,
    TableResult, TransactionCancelReason,
};
pub use expr::{
    ExpressionNames, ExpressionValues, apply_projection, parse_condition, parse_key_condition,
    parse_projection, parse_update,
};
pub use facade::Facade;
pub use index::{GlobalSecondaryIndex, GsiBuilder, LocalSecondaryIndex, LsiBuilder, Projection};
pub use query::{KeyCondition, QueryOptions, QueryResult, SortKeyOp};
pub use storage::{Direction, MemoryStorage, ScanPage, Storage, StorageExt};
pub use table::{
    DeleteRequest, GetRequest, PutRequest, QueryRequest, ScanRequest, Table, TableBuilder,
    UpdateRequest,
};
pub use transaction::{
    TransactGetItem, TransactGetRequest, TransactGetResult, TransactWriteItem,
    TransactWriteRequest, TransactionExecutor, TransactionFailureReason,
};
pub use types::{
    AttributeValue, DecodeError, Item, KeyAttribute, KeySchema, KeyType, KeyValidationError,
    KeyValue, PrimaryKey, ReturnValue, WriteResult, decode_key, encode_key,
};
pub use update::{UpdateAction, UpdateExecutor, UpdateExpression};
pub use utils::{
    add_numeric_strings, compare_key_values, compare_numeric_strings, compare_values,
    numbers_equal, subtract_numeric_strings,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
