use crate::error::TableResult;
use crate::query::{KeyCondition, QueryExecutor, QueryOptions, QueryResult};
use crate::types::{Item, KeySchema, KeyValue, PrimaryKey};

use super::projection::Projection;
use super::storage::IndexStorage;

#[derive(Debug)]
pub struct GlobalSecondaryIndex {
    name: String,
    schema: KeySchema,
    projection: Projection,
    table_schema: KeySchema,
    storage: IndexStorage<(PrimaryKey, Item)>,
}

impl GlobalSecondaryIndex {
    pub fn new(
        name: impl Into<String>,
        schema: KeySchema,
        projection: Projection,
        table_schema: KeySchema,
    ) -> Self {
        Self {
            name: name.into(),
            schema,
            projection,
            table_schema,
            storage: IndexStorage::new(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn schema(&self) -> &KeySchema {
        &self.schema
    }

    #[inline]
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    pub fn put(&mut self, table_key: PrimaryKey, item: &Item) -> Option<Item> {
        // if an item doesn't have index keys, it's a sparse index - item just isn't indexed
        let index_key = match self.extract_index_key(item) {
            Some(k) => k,
            None => {
                return self
                    .storage
                    .remove_by_table_key(&table_key.to_storage_key())
                    .map(|(_, item)| item);
            }
        };

        let storage_key = self.make_storage_key(&index_key, &table_key);
        let table_storage_key = table_key.to_storage_key();
        let projected = self
            .projection
            .project_item(item, &self.table_schema, &self.schema);

        self.storage
            .put(table_storage_key, storage_key, (table_key, projected))
            .map(|(_, item)| item)
    }

    pub fn delete(&mut self, table_key: &PrimaryKey) -> Option<Item> {
        self.storage
            .remove_by_table_key(&table_key.to_storage_key())
            .map(|(_, item)| item)
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

        let items = self.storage.values().filter_map(|(_, item)| {
            self.extract_index_key(item)
                .map(|index_key| (index_key, item.clone()))
        });

        executor.execute(items, &condition, &options)
    }

    pub fn scan(&self) -> Vec<&Item> {
        self.storage.values().map(|(_, item)| item).collect()
    }

    pub fn clear(&mut self) {
        self.storage.clear();
    }

    fn extract_index_key(&self, item: &Item) -> Option<PrimaryKey> {
        let pk_attr = item.get(self.schema.pk_name())?;
        let pk = KeyValue::from_attribute_with_type(pk_attr, self.schema.partition_key.key_type)?;

        let sk = if let Some(sk_def) = &self.schema.sort_key {
            let sk_attr = item.get(&sk_def.name)?;
            Some(KeyValue::from_attribute_with_type(
                sk_attr,
                sk_def.key_type,
            )?)
        } else {
            None
        };

        Some(PrimaryKey { pk, sk })
    }

    #[inline]
    fn make_storage_key(&self, index_key: &PrimaryKey, table_key: &PrimaryKey) -> Vec<u8> {
        let mut key = index_key.to_storage_key();
        key.extend_from_slice(&table_key.to_storage_key());
        key
    }
}

pub struct GsiBuilder {
    name: String,
    schema: KeySchema,
    projection: Projection,
}

impl GsiBuilder {
    pub fn new(name: impl Into<String>, schema: KeySchema) -> Self {
        Self {
            name: name.into(),
            schema,
            projection: Projection::All,
        }
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn keys_only(mut self) -> Self {
        self.projection = Projection::KeysOnly;
        self
    }

    pub fn include<I, S>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projection = Projection::include(attrs);
        self
    }

    pub fn build(self, table_schema: KeySchema) -> GlobalSecondaryIndex {
        GlobalSecondaryIndex::new(self.name, self.schema, self.projection, table_schema)
    }
}
