use super::types::{BatchGetResult, BatchWriteItem, BatchWriteResult};
use crate::error::TableResult;
use crate::types::{Item, KeySchema, PrimaryKey};

pub struct BatchExecutor;

impl BatchExecutor {
    pub fn new() -> Self {
        Self
    }

    pub fn execute_put<F>(
        &self,
        items: Vec<Item>,
        schema: &KeySchema,
        mut put_item: F,
    ) -> TableResult<BatchWriteResult>
    where
        F: FnMut(Item) -> TableResult<()>,
    {
        let mut result = BatchWriteResult::new();

        for item in items {
            if item.validate_key(schema).is_err() {
                result.unprocessed_items.push(BatchWriteItem::put(item));
                continue;
            }
            match put_item(item.clone()) {
                Ok(()) => result.processed_count += 1,
                Err(_) => result.unprocessed_items.push(BatchWriteItem::put(item)),
            }
        }

        Ok(result)
    }

    pub fn execute_delete<F>(
        &self,
        keys: Vec<PrimaryKey>,
        mut delete_item: F,
    ) -> TableResult<BatchWriteResult>
    where
        F: FnMut(&PrimaryKey) -> TableResult<()>,
    {
        let mut result = BatchWriteResult::new();

        for key in keys {
            match delete_item(&key) {
                Ok(()) => result.processed_count += 1,
                Err(_) => result.unprocessed_items.push(BatchWriteItem::delete(key)),
            }
        }

        Ok(result)
    }

    pub fn execute_get<F>(
        &self,
        keys: Vec<PrimaryKey>,
        mut get_item: F,
    ) -> TableResult<BatchGetResult>
    where
        F: FnMut(&PrimaryKey) -> TableResult<Option<Item>>,
    {
        let mut result = BatchGetResult::new();

        for key in keys {
            match get_item(&key) {
                Ok(Some(item)) => result.items.push(item),
                Ok(None) => result.not_found_keys.push(key),
                Err(_) => result.unprocessed_keys.push(key),
            }
        }

        Ok(result)
    }
}

impl Default for BatchExecutor {
    fn default() -> Self {
        Self::new()
    }
}
