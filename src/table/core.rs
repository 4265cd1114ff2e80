use std::collections::BTreeMap;

use crate::condition::{Condition, evaluate};
use crate::error::{TableError, TableResult};
use crate::index::{GlobalSecondaryIndex, GsiBuilder, LocalSecondaryIndex, LsiBuilder};
use crate::query::{KeyCondition, QueryExecutor, QueryOptions, QueryResult};
use crate::storage::{MemoryStorage, Storage};
use crate::types::{
    AttributeValue, Item, KeyAttribute, KeySchema, KeyValidationError, PrimaryKey, ReturnValue,
    WriteResult, decode, encode,
};
use crate::transaction::{
    TransactGetRequest, TransactGetResult, TransactWriteItem, TransactWriteRequest,
    TransactionExecutor, cancel_reasons,
};
use crate::update::{UpdateExecutor, UpdateExpression};

use super::request::{DeleteRequest, GetRequest, PutRequest, QueryRequest, ScanRequest, UpdateRequest};

#[derive(Debug)]
pub struct Table {
    name: String,
    schema: KeySchema,
    storage: MemoryStorage,
    gsis: BTreeMap<String, GlobalSecondaryIndex>,
    lsis: BTreeMap<String, LocalSecondaryIndex>,
    ttl_attribute: Option<String>,
}

impl Table {
    pub fn new(name: impl Into<String>, schema: KeySchema) -> Self {
        Self {
            name: name.into(),
            schema,
            storage: MemoryStorage::new(),
            gsis: BTreeMap::new(),
            lsis: BTreeMap::new(),
            ttl_attribute: None,
        }
    }

    pub fn with_ttl_attribute(mut self, name: impl Into<String>) -> Self {
        self.ttl_attribute = Some(name.into());
        self
    }

    pub fn ttl_attribute(&self) -> Option<&str> {
        self.ttl_attribute.as_deref()
    }

    /// Sweeps the table for items whose `ttlAttr` holds an `N` value less
    /// than or equal to the current wall-clock time, removing them (and
    /// their index entries) outright. A real deployment would run this on a
    /// timer; here it's exposed for an embedding application to call
    /// opportunistically since the engine has no background tasks.
    pub fn purge_expired(&mut self) -> TableResult<usize> {
        let Some(ttl_attr) = self.ttl_attribute.clone() else {
            return Ok(0);
        };
        let now = now_epoch_seconds();
        let expired_keys: Vec<PrimaryKey> = self
            .iter_with_keys()?
            .into_iter()
            .filter(|(_, item)| is_expired(item, &ttl_attr, now))
            .map(|(pk, _)| pk)
            .collect();

        let count = expired_keys.len();
        for pk in expired_keys {
            let storage_key = pk.to_storage_key();
            self.storage.delete(&storage_key)?;
            self.update_indexes_on_delete(&pk);
        }
        Ok(count)
    }

    fn is_live(&self, item: &Item) -> bool {
        match &self.ttl_attribute {
            Some(attr) => !is_expired(item, attr, now_epoch_seconds()),
            None => true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn schema(&self) -> &KeySchema {
        &self.schema
    }
    pub fn len(&self) -> usize {
        self.storage.len()
    }
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
    pub fn clear(&mut self) {
        self.storage.clear();
        for gsi in self.gsis.values_mut() {
            *gsi = GlobalSecondaryIndex::new(
                gsi.name(),
                gsi.schema().clone(),
                gsi.projection().clone(),
                self.schema.clone(),
            );
        }
        for lsi in self.lsis.values_mut() {
            *lsi = LocalSecondaryIndex::new(
                lsi.name(),
                KeyAttribute::new(lsi.sort_key_name(), lsi.sort_key_type()),
                lsi.projection().clone(),
                self.schema.clone(),
            );
        }
    }

    // index management
    pub fn add_gsi(&mut self, builder: GsiBuilder) {
        let gsi = builder.build(self.schema.clone());
        let name = gsi.name().to_string();

        let mut gsi = gsi;
        for item in self.scan().unwrap_or_default() {
            if let Some(pk) = item.extract_key(&self.schema) {
                gsi.put(pk, &item);
            }
        }

        self.gsis.insert(name, gsi);
    }

    pub fn gsi(&self, name: &str) -> Option<&GlobalSecondaryIndex> {
        self.gsis.get(name)
    }

    pub fn gsi_names(&self) -> impl Iterator<Item = &str> {
        self.gsis.keys().map(|s| s.as_str())
    }

    pub fn add_lsi(&mut self, builder: LsiBuilder) {
        let lsi = builder.build(self.schema.clone());
        let name = lsi.name().to_string();

        let mut lsi = lsi;
        for item in self.scan().unwrap_or_default() {
            if let Some(pk) = item.extract_key(&self.schema) {
                lsi.put(&pk, &item);
            }
        }

        self.lsis.insert(name, lsi);
    }

    pub fn lsi(&self, name: &str) -> Option<&LocalSecondaryIndex> {
        self.lsis.get(name)
    }

    pub fn lsi_names(&self) -> impl Iterator<Item = &str> {
        self.lsis.keys().map(|s| s.as_str())
    }

    // operations
    pub fn put_item(&mut self, item: Item) -> TableResult<Option<Item>> {
        let result = self.put_item_with_return(item, ReturnValue::AllOld)?;
        Ok(result.attributes)
    }

    pub fn put_item_with_return(
        &mut self,
        item: Item,
        return_value: ReturnValue,
    ) -> TableResult<WriteResult> {
        self.put_item_internal(item, None, return_value)
    }

    pub fn put_item_with_condition(
        &mut self,
        item: Item,
        condition: Condition,
    ) -> TableResult<Option<Item>> {
        let result =
            self.put_item_with_condition_and_return(item, condition, ReturnValue::AllOld)?;
        Ok(result.attributes)
    }

    pub fn put_item_with_condition_and_return(
        &mut self,
        item: Item,
        condition: Condition,
        return_value: ReturnValue,
    ) -> TableResult<WriteResult> {
        self.put_item_internal(item, Some(condition), return_value)
    }

    fn put_item_internal(
        &mut self,
        item: Item,
        condition: Option<Condition>,
        return_value: ReturnValue,
    ) -> TableResult<WriteResult> {
        let _ = item.validate_key(&self.schema)?;

        let pk = item.extract_key(&self.schema).ok_or_else(|| {
            TableError::InvalidKey(KeyValidationError::MissingAttribute {
                name: self.schema.pk_name().to_string(),
            })
        })?;

        let storage_key = pk.to_storage_key();
        let old_item = self.get_item_by_storage_key(&storage_key)?;

        if let Some(cond) = condition {
            let check_item = old_item.clone().unwrap_or_default();
            if !evaluate(&cond, &check_item)? {
                tracing::warn!(table = %self.name, "put_item condition check failed");
                return Err(TableError::ConditionFailed);
            }
        }

        let was_update = old_item.is_some();
        let encoded = self.encode_item(&item)?;
        self.storage.put(&storage_key, encoded)?;
        self.update_indexes_on_put(&pk, &item);
        tracing::debug!(table = %self.name, was_update, "put_item applied");

        let attributes = match return_value {
            ReturnValue::None => None,
            ReturnValue::AllOld | ReturnValue::UpdatedOld => old_item,
            ReturnValue::AllNew | ReturnValue::UpdatedNew => Some(item),
        };

        Ok(WriteResult {
            attributes,
            was_update,
        })
    }

    pub fn put_item_if_not_exists(&mut self, item: Item) -> TableResult<()> {
        let _ = item.validate_key(&self.schema())?;

        let pk = item.extract_key(&self.schema).ok_or_else(|| {
            TableError::InvalidKey(crate::types::KeyValidationError::MissingAttribute {
                name: self.schema.pk_name().to_string(),
            })
        })?;

        let storage_key = pk.to_storage_key();
        if self.storage.exists(&storage_key)? {
            return Err(TableError::ItemAlreadyExists);
        }

        let encoded = self.encode_item(&item)?;

        self.storage.put(&storage_key, encoded)?;
        self.update_indexes_on_put(&pk, &item);

        Ok(())
    }

    pub fn get_item(&self, key: &PrimaryKey) -> TableResult<Option<Item>> {
        let storage_key = key.to_storage_key();
        self.get_item_by_storage_key(&storage_key)
    }

    pub fn delete_item(&mut self, key: &PrimaryKey) -> TableResult<Option<Item>> {
        let result = self.delete_item_with_return(key, ReturnValue::AllOld)?;
        Ok(result.attributes)
    }

    pub fn delete_item_with_return(
        &mut self,
        key: &PrimaryKey,
        return_value: ReturnValue,
    ) -> TableResult<WriteResult> {
        self.delete_item_internal(key, None, return_value)
    }

    pub fn delete_item_with_condition(
        &mut self,
        key: &PrimaryKey,
        condition: Condition,
    ) -> TableResult<Option<Item>> {
        let result =
            self.delete_item_with_condition_and_return(key, condition, ReturnValue::AllOld)?;
        Ok(result.attributes)
    }

    pub fn delete_item_with_condition_and_return(
        &mut self,
        key: &PrimaryKey,
        condition: Condition,
        return_value: ReturnValue,
    ) -> TableResult<WriteResult> {
        self.delete_item_internal(key, Some(condition), return_value)
    }

    fn delete_item_internal(
        &mut self,
        key: &PrimaryKey,
        condition: Option<Condition>,
        return_value: ReturnValue,
    ) -> TableResult<WriteResult> {
        let storage_key = key.to_storage_key();
        let old_item = self.get_item_by_storage_key(&storage_key)?;

        if let Some(cond) = condition {
            let check_item = old_item.clone().unwrap_or_default();
            if !evaluate(&cond, &check_item)? {
                tracing::warn!(table = %self.name, "delete_item condition check failed");
                return Err(TableError::ConditionFailed);
            }
        }

        let was_update = old_item.is_some();

        self.storage.delete(&storage_key)?;

        if was_update {
            self.update_indexes_on_delete(key);
            tracing::debug!(table = %self.name, "delete_item applied");
        }

        let attributes = match return_value {
            ReturnValue::None => None,
            ReturnValue::AllOld | ReturnValue::UpdatedOld => old_item,
            ReturnValue::AllNew | ReturnValue::UpdatedNew => None, // Delete has no "new" item
        };

        Ok(WriteResult {
            attributes,
            was_update,
        })
    }

    pub fn query(&self, condition: KeyCondition) -> TableResult<QueryResult> {
        self.query_with_options(condition, QueryOptions::new())
    }

    pub fn query_with_options(
        &self,
        condition: KeyCondition,
        options: QueryOptions,
    ) -> TableResult<QueryResult> {
        let executor = QueryExecutor::new(&self.schema);
        executor.validate_condition(&condition)?;

        let items = self.iter_with_keys()?;
        executor.execute(items.into_iter(), &condition, &options)
    }

    pub fn query_with_filter(
        &self,
        key_condition: KeyCondition,
        filter: Condition,
    ) -> TableResult<QueryResult> {
        self.query_with_filter_and_options(key_condition, filter, QueryOptions::new())
    }

    pub fn query_with_filter_and_options(
        &self,
        key_condition: KeyCondition,
        filter: Condition,
        options: QueryOptions,
    ) -> TableResult<QueryResult> {
        let mut result = self.query_with_options(key_condition, options)?;
        let filtered: Vec<Item> = result
            .items
            .into_iter()
            .filter(|item| evaluate(&filter, item).unwrap_or(false))
            .collect();
        let count = filtered.len();
        result.items = filtered;
        result.count = count;

        Ok(result)
    }

    pub fn query_gsi(&self, index_name: &str, condition: KeyCondition) -> TableResult<QueryResult> {
        self.query_gsi_with_options(index_name, condition, QueryOptions::new())
    }

    pub fn query_gsi_with_options(
        &self,
        index_name: &str,
        condition: KeyCondition,
        options: QueryOptions,
    ) -> TableResult<QueryResult> {
        let gsi = self
            .gsis
            .get(index_name)
            .ok_or_else(|| TableError::index_not_found(index_name))?;

        gsi.query_with_options(condition, options)
    }

    pub fn query_gsi_with_filter(
        &self,
        index_name: &str,
        key_condition: KeyCondition,
        filter: Condition,
    ) -> TableResult<QueryResult> {
        let mut result = self.query_gsi(index_name, key_condition)?;

        let filtered: Vec<Item> = result
            .items
            .into_iter()
            .filter(|item| evaluate(&filter, item).unwrap_or(false))
            .collect();

        let count = filtered.len();
        result.items = filtered;
        result.count = count;

        Ok(result)
    }

    pub fn query_lsi(&self, index_name: &str, condition: KeyCondition) -> TableResult<QueryResult> {
        self.query_lsi_with_options(index_name, condition, QueryOptions::new())
    }

    pub fn query_lsi_with_options(
        &self,
        index_name: &str,
        condition: KeyCondition,
        options: QueryOptions,
    ) -> TableResult<QueryResult> {
        let lsi = self
            .lsis
            .get(index_name)
            .ok_or_else(|| TableError::index_not_found(index_name))?;

        lsi.query_with_options(condition, options)
    }

    pub fn update_item(
        &mut self,
        key: &PrimaryKey,
        expression: UpdateExpression,
    ) -> TableResult<Option<Item>> {
        let result = self.update_item_with_return(key, expression, ReturnValue::AllNew)?;
        Ok(result.attributes)
    }

    pub fn update_item_with_return(
        &mut self,
        key: &PrimaryKey,
        expression: UpdateExpression,
        return_value: ReturnValue,
    ) -> TableResult<WriteResult> {
        self.update_item_internal(key, expression, None, return_value)
    }

    pub fn update_item_with_condition(
        &mut self,
        key: &PrimaryKey,
        expression: UpdateExpression,
        condition: Condition,
    ) -> TableResult<Option<Item>> {
        let result = self.update_item_with_condition_and_return(
            key,
            expression,
            condition,
            ReturnValue::AllNew,
        )?;
        Ok(result.attributes)
    }

    pub fn update_item_with_condition_and_return(
        &mut self,
        key: &PrimaryKey,
        expression: UpdateExpression,
        condition: Condition,
        return_value: ReturnValue,
    ) -> TableResult<WriteResult> {
        self.update_item_internal(key, expression, Some(condition), return_value)
    }

    fn update_item_internal(
        &mut self,
        key: &PrimaryKey,
        expression: UpdateExpression,
        condition: Option<Condition>,
        return_value: ReturnValue,
    ) -> TableResult<WriteResult> {
        let storage_key = key.to_storage_key();
        let old_item = self
            .get_item_by_storage_key(&storage_key)?
            .ok_or(TableError::ItemNotFound)?;

        if let Some(cond) = condition {
            if !evaluate(&cond, &old_item)? {
                tracing::warn!(table = %self.name, "update_item condition check failed");
                return Err(TableError::ConditionFailed);
            }
        }

        let touched: Vec<&str> = expression.touched_roots();
        let executor = UpdateExecutor::new();
        let new_item = executor.execute(old_item.clone(), &expression)?;

        // failure checks
        let new_key = new_item.extract_key(&self.schema).ok_or_else(|| {
            TableError::UpdateError("update removed key attributes".to_string())
        })  ?;

        if &new_key != key {
            return Err(TableError::UpdateError("cannot modify key attributes".to_string()));
        }

        // save updated item
        let encoded = self.encode_item(&new_item)?;
        self.storage.put(&storage_key, encoded)?;
        self.update_indexes_on_put(key, &new_item);
        tracing::debug!(table = %self.name, "update_item applied");

        let attributes = match return_value {
            ReturnValue::AllNew => Some(new_item),
            ReturnValue::AllOld => Some(old_item),
            ReturnValue::UpdatedNew => Some(new_item.project(&touched)),
            ReturnValue::UpdatedOld => Some(old_item.project(&touched)),
            ReturnValue::None => None,
        };

        Ok(WriteResult {
            attributes,
            was_update: true,
        })
    }

    pub fn scan(&self) -> TableResult<Vec<Item>> {
        let mut items = Vec::new();

        for (_, value) in self.storage.iter() {
            let item = self.decode_item(value)?;
            if self.is_live(&item) {
                items.push(item);
            }
        }

        Ok(items)
    }

    pub fn scan_with_filter(&self, filter: Condition) -> TableResult<Vec<Item>> {
        let items = self.scan()?;

        Ok(items
            .into_iter()
            .filter(|item| evaluate(&filter, item).unwrap_or(false))
            .collect())
    }

    pub fn scan_limit(&self, limit: usize) -> TableResult<Vec<Item>> {
        let mut items = Vec::with_capacity(limit.min(self.storage.len()));

        for (_, value) in self.storage.iter() {
            let item = self.decode_item(value)?;
            if self.is_live(&item) {
                items.push(item);
                if items.len() >= limit {
                    break;
                }
            }
        }

        Ok(items)
    }

    pub fn put(&mut self, request: PutRequest) -> TableResult<WriteResult> {
        if request.if_not_exists {
            self.put_item_if_not_exists(request.item.clone())?;
            return Ok(WriteResult {
                attributes: None,
                was_update: false,
            });
        }
        self.put_item_internal(request.item, request.condition, request.return_value)
    }

    pub fn update(&mut self, request: UpdateRequest) -> TableResult<WriteResult> {
        self.update_item_internal(
            &request.key,
            request.expression,
            request.condition,
            request.return_value,
        )
    }

    pub fn delete(&mut self, request: DeleteRequest) -> TableResult<WriteResult> {
        self.delete_item_internal(&request.key, request.condition, request.return_value)
    }

    pub fn get(&self, request: GetRequest) -> TableResult<Option<Item>> {
        let item = self.get_item(&request.key)?;
        Ok(match (item, request.projection) {
            (Some(item), Some(names)) => {
                let refs: Vec<&str> = names.iter().map(String::as_str).collect();
                Some(item.project(&refs))
            }
            (item, _) => item,
        })
    }

    pub fn query_req(&self, request: QueryRequest) -> TableResult<QueryResult> {
        match request.filter {
            Some(filter) => {
                self.query_with_filter_and_options(request.key_condition, filter, request.options)
            }
            None => self.query_with_options(request.key_condition, request.options),
        }
    }

    pub fn scan_req(&self, request: ScanRequest) -> TableResult<Vec<Item>> {
        let items = match request.filter {
            Some(filter) => self.scan_with_filter(filter)?,
            None => self.scan()?,
        };
        Ok(match request.limit {
            Some(limit) => items.into_iter().take(limit).collect(),
            None => items,
        })
    }

    /// `{Put|Update|Delete|ConditionCheck}` items applied atomically against
    /// this table alone. Items built through `TransactWriteRequest` carry no
    /// table name of their own, so they're stamped with this table's name
    /// right before validation.
    pub fn transact_write(&mut self, request: impl Into<TransactWriteRequest>) -> TableResult<()> {
        let items: Vec<TransactWriteItem> = request.into().bind_table_name(&self.name);
        let schema = self.schema.clone();

        let executor = TransactionExecutor::new();
        let validation = executor.validate_write(
            &items,
            |_| Some(schema.clone()),
            |_, key| self.get_item(key),
        );

        match validation {
            Err(reason) => {
                let reasons = cancel_reasons(items.len(), &reason);
                Err(TableError::TransactionCanceled(reasons))
            }
            Ok(()) => {
                for item in items {
                    match item {
                        TransactWriteItem::Put { item, .. } => {
                            self.put_item(item)?;
                        }
                        TransactWriteItem::Update { key, expression, .. } => {
                            self.update_item(&key, expression)?;
                        }
                        TransactWriteItem::Delete { key, .. } => {
                            self.delete_item(&key)?;
                        }
                        TransactWriteItem::ConditionCheck { .. } => {}
                    }
                }
                Ok(())
            }
        }
    }

    /// Reads every item named by `request` against this table's current
    /// state in one pass.
    pub fn transact_get(&self, request: impl Into<TransactGetRequest>) -> TableResult<TransactGetResult> {
        let items = request.into().bind_table_name(&self.name);

        let executor = TransactionExecutor::new();
        executor.execute_get(&items, |_, key| self.get_item(key))
    }

    // internal helpers
    fn encode_item(&self, item: &Item) -> TableResult<Vec<u8>> {
        let map: BTreeMap<String, AttributeValue> = item
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let av = AttributeValue::M(map);
        Ok(encode(&av))
    }

    fn decode_item(&self, data: &[u8]) -> TableResult<Item> {
        let av = decode(data)?;
        match av {
            AttributeValue::M(map) => Ok(Item::from(map)),
            _ => Err(TableError::Encoding("expected map type".into())),
        }
    }

    fn get_item_by_storage_key(&self, storage_key: &[u8]) -> TableResult<Option<Item>> {
        match self.storage.get(storage_key)? {
            Some(data) => {
                let item = self.decode_item(&data)?;
                if self.is_live(&item) {
                    Ok(Some(item))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    /// TODO: performance: this allocates a Vec for all items. For large tables,
    /// consider returning an iterator that decodes lazily to reduce memory pressure
    fn iter_with_keys(&self) -> TableResult<Vec<(PrimaryKey, Item)>> {
        let mut result = Vec::new();
        for (_, value) in self.storage.iter() {
            let item = self.decode_item(value)?;
            if !self.is_live(&item) {
                continue;
            }
            if let Some(pk) = item.extract_key(&self.schema) {
                result.push((pk, item));
            }
        }

        Ok(result)
    }

    fn update_indexes_on_put(&mut self, pk: &PrimaryKey, item: &Item) {
        for gsi in self.gsis.values_mut() {
            gsi.put(pk.clone(), item);
        }
        for lsi in self.lsis.values_mut() {
            lsi.put(pk, item);
        }
    }

    fn update_indexes_on_delete(&mut self, pk: &PrimaryKey) {
        for gsi in self.gsis.values_mut() {
            gsi.delete(pk);
        }
        for lsi in self.lsis.values_mut() {
            lsi.delete(pk);
        }
    }
}

fn now_epoch_seconds() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn is_expired(item: &Item, ttl_attr: &str, now: i64) -> bool {
    match item.get(ttl_attr) {
        Some(AttributeValue::N(n)) => n.parse::<i64>().map(|v| v <= now).unwrap_or(false),
        _ => false,
    }
}

pub struct TableBuilder {
    name: String,
    schema: KeySchema,
    initial_capacity: Option<usize>,
    gsi_builders: Vec<GsiBuilder>,
    lsi_builders: Vec<LsiBuilder>,
    ttl_attribute: Option<String>,
}

impl TableBuilder {
    pub fn new(name: impl Into<String>, schema: KeySchema) -> Self {
        Self {
            name: name.into(),
            schema,
            initial_capacity: None,
            gsi_builders: Vec::new(),
            lsi_builders: Vec::new(),
            ttl_attribute: None,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    pub fn with_ttl_attribute(mut self, name: impl Into<String>) -> Self {
        self.ttl_attribute = Some(name.into());
        self
    }

    pub fn with_gsi(mut self, builder: GsiBuilder) -> Self {
        self.gsi_builders.push(builder);
        self
    }

    pub fn with_lsi(mut self, builder: LsiBuilder) -> Self {
        self.lsi_builders.push(builder);
        self
    }

    pub fn build(self) -> Table {
        let mut table = Table::new(self.name, self.schema);
        if let Some(cap) = self.initial_capacity {
            table.storage = MemoryStorage::with_capacity(cap);
        }
        if let Some(ttl_attr) = self.ttl_attribute {
            table = table.with_ttl_attribute(ttl_attr);
        }
        for gsi_builder in self.gsi_builders {
            table.add_gsi(gsi_builder);
        }
        for lsi_builder in self.lsi_builders {
            table.add_lsi(lsi_builder);
        }
        table
    }
}
