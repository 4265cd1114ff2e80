use std::collections::HashSet;

use super::types::{TransactGetItem, TransactGetResult, TransactWriteItem};
use crate::condition::evaluate;
use crate::error::{TableResult, TransactionCancelReason};
use crate::types::{Item, KeySchema, PrimaryKey};
use crate::update::UpdateExecutor;

/// Expands a single failure into the per-item cancellation reason list the
/// wire-level `TransactWriteItems` response reports, with every item but
/// the one that actually failed reported as `None`.
pub(crate) fn cancel_reasons(
    count: usize,
    reason: &TransactionFailureReason,
) -> Vec<TransactionCancelReason> {
    let failed_index = reason.index();
    (0..count)
        .map(|i| {
            if i != failed_index {
                TransactionCancelReason::None
            } else {
                match reason {
                    TransactionFailureReason::ConditionCheckFailed { .. } => {
                        TransactionCancelReason::ConditionalCheckFailed
                    }
                    TransactionFailureReason::ItemNotFound { .. } => {
                        TransactionCancelReason::ItemNotFound
                    }
                    TransactionFailureReason::KeyModification { .. } => {
                        TransactionCancelReason::ValidationError(
                            "cannot modify key attributes".to_string(),
                        )
                    }
                    TransactionFailureReason::DuplicateItem { .. } => {
                        TransactionCancelReason::ValidationError("duplicate item".to_string())
                    }
                    TransactionFailureReason::InvalidKey { message, .. } => {
                        TransactionCancelReason::ValidationError(message.clone())
                    }
                }
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionFailureReason {
    ConditionCheckFailed { index: usize },
    ItemNotFound { index: usize },
    KeyModification { index: usize },
    DuplicateItem { index: usize },
    InvalidKey { index: usize, message: String },
}

impl TransactionFailureReason {
    pub fn index(&self) -> usize {
        match self {
            Self::ConditionCheckFailed { index } => *index,
            Self::ItemNotFound { index } => *index,
            Self::KeyModification { index } => *index,
            Self::DuplicateItem { index } => *index,
            Self::InvalidKey { index, .. } => *index,
        }
    }
}

impl std::fmt::Display for TransactionFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConditionCheckFailed { index } => {
                write!(f, "condition check failed at index {}", index)
            }
            Self::ItemNotFound { index } => {
                write!(f, "item not found at index {}", index)
            }
            Self::KeyModification { index } => {
                write!(f, "cannot modify key attributes at index {}", index)
            }
            Self::DuplicateItem { index } => {
                write!(f, "duplicate item at index {}", index)
            }
            Self::InvalidKey { index, message } => {
                write!(f, "invalid key at index {}: {}", index, message)
            }
        }
    }
}

pub struct TransactionExecutor;

impl TransactionExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Validates every item against the pre-transaction state of its own
    /// table. `schema_for` and `get_item` are both keyed by
    /// [`TransactWriteItem::table_name`], so a single call can validate a
    /// transaction spanning any number of tables as long as the caller has
    /// already locked each of them.
    pub fn validate_write(
        &self,
        items: &[TransactWriteItem],
        schema_for: impl Fn(&str) -> Option<KeySchema>,
        get_item: impl Fn(&str, &PrimaryKey) -> TableResult<Option<Item>>,
    ) -> Result<(), TransactionFailureReason> {
        let mut seen = HashSet::new();

        for (index, item) in items.iter().enumerate() {
            let table_name = item.table_name();
            let schema = schema_for(table_name).ok_or(TransactionFailureReason::InvalidKey {
                index,
                message: format!("unknown table {table_name}"),
            })?;
            let key = self.extract_key(item, &schema, index)?;
            let key_str = format!("{table_name}:{}", key.to_storage_key());

            if seen.contains(&key_str) {
                tracing::warn!(table = table_name, index, "duplicate item in transaction");
                return Err(TransactionFailureReason::DuplicateItem { index });
            }
            seen.insert(key_str);
            self.validate_write_item(item, &key, &schema, index, |k| get_item(table_name, k))
                .inspect_err(|reason| {
                    tracing::warn!(table = table_name, index, %reason, "transaction item failed validation");
                })?;
        }

        Ok(())
    }

    fn extract_key(
        &self,
        item: &TransactWriteItem,
        schema: &KeySchema,
        index: usize,
    ) -> Result<PrimaryKey, TransactionFailureReason> {
        match item {
            TransactWriteItem::Put { item, .. } => {
                item.extract_key(schema)
                    .ok_or(TransactionFailureReason::InvalidKey {
                        index,
                        message: "missing key attributes".to_string(),
                    })
            }
            TransactWriteItem::Update { key, .. } => Ok(key.clone()),
            TransactWriteItem::Delete { key, .. } => Ok(key.clone()),
            TransactWriteItem::ConditionCheck { key, .. } => Ok(key.clone()),
        }
    }

    fn validate_write_item(
        &self,
        item: &TransactWriteItem,
        key: &PrimaryKey,
        schema: &KeySchema,
        index: usize,
        get_item: impl Fn(&PrimaryKey) -> TableResult<Option<Item>>,
    ) -> Result<(), TransactionFailureReason> {
        let current = get_item(key).map_err(|_| TransactionFailureReason::InvalidKey {
            index,
            message: "failed to read item".to_string(),
        })?;

        match item {
            TransactWriteItem::Put { item, condition } => {
                item.validate_key(schema)
                    .map_err(|e| TransactionFailureReason::InvalidKey {
                        index,
                        message: e.to_string(),
                    })?;

                if let Some(cond) = condition {
                    let check = current.unwrap_or_default();
                    if !evaluate(cond, &check).unwrap_or(false) {
                        return Err(TransactionFailureReason::ConditionCheckFailed { index });
                    }
                }
            }
            TransactWriteItem::Update {
                expression,
                condition,
                ..
            } => {
                let existing = current.ok_or(TransactionFailureReason::ItemNotFound { index })?;

                if let Some(cond) = condition {
                    if !evaluate(cond, &existing).unwrap_or(false) {
                        return Err(TransactionFailureReason::ConditionCheckFailed { index });
                    }
                }

                let executor = UpdateExecutor::new();
                let updated = executor.execute(existing, expression).map_err(|_| {
                    TransactionFailureReason::InvalidKey {
                        index,
                        message: "update execution failed".to_string(),
                    }
                })?;

                let new_key = updated
                    .extract_key(schema)
                    .ok_or(TransactionFailureReason::KeyModification { index })?;
                if &new_key != key {
                    return Err(TransactionFailureReason::KeyModification { index });
                }
            }
            TransactWriteItem::Delete { condition, .. } => {
                if let Some(cond) = condition {
                    let check = current.unwrap_or_default();
                    if !evaluate(cond, &check).unwrap_or(false) {
                        return Err(TransactionFailureReason::ConditionCheckFailed { index });
                    }
                }
            }
            TransactWriteItem::ConditionCheck { condition, .. } => {
                let check = current.unwrap_or_default();
                if !evaluate(condition, &check).unwrap_or(false) {
                    return Err(TransactionFailureReason::ConditionCheckFailed { index });
                }
            }
        }

        Ok(())
    }

    pub fn execute_get(
        &self,
        items: &[TransactGetItem],
        get_item: impl Fn(&str, &PrimaryKey) -> TableResult<Option<Item>>,
    ) -> TableResult<TransactGetResult> {
        let mut results = Vec::with_capacity(items.len());

        for item in items {
            match item {
                TransactGetItem::Get { table_name, key } => {
                    let item = get_item(table_name, key)?;
                    results.push(item);
                }
            }
        }

        Ok(TransactGetResult::new(results))
    }
}
