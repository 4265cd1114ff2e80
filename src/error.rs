use thiserror::Error;

use crate::types::KeyValidationError;

/// Errors produced by the raw key-value storage substrate.
///
/// These never cross a public `Table`/`Engine` boundary directly; callers
/// convert them into the appropriate `TableError` variant per the
/// propagation rule in the error handling design.
#[derive(Debug, PartialEq, Eq, Clone, Error)]
pub enum StorageError {
    #[error("key not found: {key}")]
    KeyNotFound { key: String },
    #[error("key already exists: {key}")]
    KeyAlreadyExists { key: String },
    #[error("storage error: {message}")]
    Internal { message: String },
}

impl StorageError {
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    pub fn already_exists(key: impl Into<String>) -> Self {
        Self::KeyAlreadyExists { key: key.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            Self::KeyNotFound { key } => Some(key),
            Self::KeyAlreadyExists { key } => Some(key),
            Self::Internal { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }

    pub fn key_already_exists(&self) -> bool {
        matches!(self, Self::KeyAlreadyExists { .. })
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Per-item cancellation reason reported inside a `TransactionCanceled`
/// error, mirroring the hosted service's `CancellationReason` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionCancelReason {
    None,
    ConditionalCheckFailed,
    ValidationError(String),
    ItemNotFound,
    ThrottlingError,
}

impl std::fmt::Display for TransactionCancelReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::ConditionalCheckFailed => write!(f, "ConditionalCheckFailed"),
            Self::ValidationError(msg) => write!(f, "ValidationError: {msg}"),
            Self::ItemNotFound => write!(f, "ItemNotFound"),
            Self::ThrottlingError => write!(f, "ThrottlingError"),
        }
    }
}

/// Internal operational errors produced while executing a table operation.
///
/// Every variant maps onto one of the public error kinds in the error
/// handling design via [`TableError::public_kind`]; the richer internal
/// shape (e.g. distinguishing `ItemNotFound` from `ConditionFailed`) is kept
/// because call sites throughout the mutation/query/update layers want to
/// match on it precisely, not just on a generic `ValidationException`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyValidationError),

    #[error("conditional request failed")]
    ConditionFailed,

    #[error("item already exists")]
    ItemAlreadyExists,

    #[error("item not found")]
    ItemNotFound,

    #[error("update error: {0}")]
    UpdateError(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("index not found: {0}")]
    IndexNotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("validation error: {0}")]
    ValidationException(String),

    #[error("transaction canceled: {0:?}")]
    TransactionCanceled(Vec<TransactionCancelReason>),

    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("item collection size limit exceeded: {0}")]
    ItemCollectionSizeLimitExceeded(String),

    #[error("request limit exceeded: {0}")]
    RequestLimitExceeded(String),

    #[error("idempotent parameter mismatch: clientRequestToken reused with a different request")]
    IdempotentParameterMismatch,

    #[error("internal error: {0}")]
    InternalError(String),
}

impl TableError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationException(message.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::ResourceNotFound(resource.into())
    }

    pub fn index_not_found(name: impl Into<String>) -> Self {
        Self::IndexNotFound(name.into())
    }

    pub fn update_error(message: impl Into<String>) -> Self {
        Self::UpdateError(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ItemNotFound | Self::ResourceNotFound(_))
    }

    pub fn is_update_error(&self) -> bool {
        matches!(self, Self::UpdateError(_))
    }

    pub fn is_condition_failed(&self) -> bool {
        matches!(self, Self::ConditionFailed | Self::ItemAlreadyExists)
    }

    pub fn is_invalid_key(&self) -> bool {
        matches!(self, Self::InvalidKey(_))
    }

    pub fn is_transaction_canceled(&self) -> bool {
        matches!(self, Self::TransactionCanceled(_))
    }

    /// The name of the error kind as the external request facade reports it,
    /// collapsing the internal variant set onto the exhaustive public
    /// taxonomy.
    pub fn public_kind(&self) -> &'static str {
        match self {
            Self::InvalidKey(_) | Self::ValidationException(_) | Self::UpdateError(_) => {
                "ValidationException"
            }
            Self::ConditionFailed => "ConditionalCheckFailed",
            Self::ItemAlreadyExists => "ConditionalCheckFailed",
            Self::ItemNotFound => "ValidationException",
            Self::Encoding(_) | Self::InternalError(_) | Self::Storage(_) => "InternalError",
            Self::IndexNotFound(_) | Self::ResourceNotFound(_) => "ResourceNotFound",
            Self::TransactionCanceled(_) => "TransactionCanceled",
            Self::ItemCollectionSizeLimitExceeded(_) => "ItemCollectionSizeLimitExceeded",
            Self::RequestLimitExceeded(_) => "RequestLimitExceeded",
            Self::IdempotentParameterMismatch => "IdempotentParameterMismatch",
        }
    }
}

impl From<StorageError> for TableError {
    fn from(e: StorageError) -> Self {
        TableError::Storage(e.to_string())
    }
}

pub type TableResult<T> = Result<T, TableError>;

/// Errors raised while evaluating a condition expression against a
/// document, distinct from the syntax errors raised while parsing one.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("type mismatch evaluating condition: {0}")]
    TypeMismatch(String),
}

pub type EvalResult<T = bool> = Result<T, EvalError>;

impl From<EvalError> for TableError {
    fn from(e: EvalError) -> Self {
        TableError::ValidationException(e.to_string())
    }
}

/// Errors raised while parsing one of the three expression sublanguages
/// (key-condition, condition, update) or the projection-expression grammar.
/// Parsers never leak this type across the `Table`/`Engine` boundary; every
/// call site converts it to [`TableError::ValidationException`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("unexpected end of expression")]
    UnexpectedEof,
    #[error("unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("unknown identifier: {0}")]
    UnresolvedAlias(String),
    #[error("redundant parentheses are not allowed")]
    RedundantParens,
    #[error("reserved word used as identifier: {0}")]
    ReservedWord(String),
    #[error("path overlap between clauses: {0}")]
    PathOverlap(String),
    #[error("{0}")]
    Other(String),
}

pub type ParseResult<T> = Result<T, ParseError>;

impl From<ParseError> for TableError {
    fn from(e: ParseError) -> Self {
        match e {
            ParseError::PathOverlap(_) => TableError::ValidationException(format!("PathOverlap: {e}")),
            _ => TableError::ValidationException(e.to_string()),
        }
    }
}
