use super::types::{TransactGetItem, TransactWriteItem};

use crate::condition::Condition;
use crate::types::{Item, PrimaryKey};
use crate::update::UpdateExpression;

/// Placeholder table name for items built through these single-table
/// request builders, which don't know the owning table's name until
/// `Table::transact_write`/`transact_get` stamps it on just before
/// execution.
const UNBOUND_TABLE: &str = "";

#[derive(Debug, Clone, Default)]
pub struct TransactWriteRequest {
    pub(crate) items: Vec<TransactWriteItem>,
}

impl TransactWriteRequest {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn put(mut self, item: Item) -> Self {
        self.items.push(TransactWriteItem::put(UNBOUND_TABLE, item));
        self
    }
    pub fn put_with_condition(mut self, item: Item, condition: Condition) -> Self {
        self.items.push(TransactWriteItem::put_with_condition(
            UNBOUND_TABLE,
            item,
            condition,
        ));
        self
    }

    pub fn update(mut self, key: impl Into<PrimaryKey>, expression: UpdateExpression) -> Self {
        self.items
            .push(TransactWriteItem::update(UNBOUND_TABLE, key, expression));
        self
    }
    pub fn update_with_condition(
        mut self,
        key: impl Into<PrimaryKey>,
        expression: UpdateExpression,
        condition: Condition,
    ) -> Self {
        self.items.push(TransactWriteItem::update_with_condition(
            UNBOUND_TABLE,
            key,
            expression,
            condition,
        ));
        self
    }

    pub fn delete(mut self, key: impl Into<PrimaryKey>) -> Self {
        self.items.push(TransactWriteItem::delete(UNBOUND_TABLE, key));
        self
    }
    pub fn delete_with_condition(
        mut self,
        key: impl Into<PrimaryKey>,
        condition: Condition,
    ) -> Self {
        self.items.push(TransactWriteItem::delete_with_condition(
            UNBOUND_TABLE,
            key,
            condition,
        ));
        self
    }

    pub fn condition_check(mut self, key: impl Into<PrimaryKey>, condition: Condition) -> Self {
        self.items.push(TransactWriteItem::condition_check(
            UNBOUND_TABLE,
            key,
            condition,
        ));
        self
    }

    pub fn with_item(mut self, item: TransactWriteItem) -> Self {
        self.items.push(item);
        self
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stamps every item with the table it is actually running against.
    pub(crate) fn bind_table_name(self, table_name: &str) -> Vec<TransactWriteItem> {
        self.items
            .into_iter()
            .map(|item| item.with_table_name(table_name.to_string()))
            .collect()
    }
}

impl From<Vec<TransactWriteItem>> for TransactWriteRequest {
    fn from(items: Vec<TransactWriteItem>) -> Self {
        Self { items }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactGetRequest {
    pub(crate) items: Vec<TransactGetItem>,
}

impl TransactGetRequest {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn get(mut self, key: impl Into<PrimaryKey>) -> Self {
        self.items.push(TransactGetItem::get(UNBOUND_TABLE, key));
        self
    }

    pub fn with_item(mut self, item: TransactGetItem) -> Self {
        self.items.push(item);
        self
    }
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Stamps every item with the table it is actually running against.
    pub(crate) fn bind_table_name(self, table_name: &str) -> Vec<TransactGetItem> {
        self.items
            .into_iter()
            .map(|item| item.with_table_name(table_name.to_string()))
            .collect()
    }
}

impl From<Vec<TransactGetItem>> for TransactGetRequest {
    fn from(items: Vec<TransactGetItem>) -> Self {
        Self { items }
    }
}
