//! External request facade: wire-shaped request/response structs mirroring
//! the hosted service's JSON operation shapes, dispatching through an
//! [`Engine`] so a front-end never touches locking or expression parsing
//! directly. Every struct here derives `serde::{Serialize, Deserialize}`;
//! `AttributeValue`/`Item`/`PrimaryKey` round-trip through the same
//! tagged-variant shape the core uses internally.

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::batch::{BatchGetRequest, BatchWriteItem, BatchWriteRequest};
use crate::condition::{Condition, evaluate};
use crate::engine::Engine;
use crate::error::{TableError, TableResult};
use crate::expr::{
    ExpressionNames, ExpressionValues, apply_projection, parse_condition, parse_key_condition,
    parse_projection, parse_update,
};
use crate::query::QueryOptions;
use crate::table::{
    DeleteRequest, GetRequest, PutRequest, QueryRequest as CoreQueryRequest,
    ScanRequest as CoreScanRequest, UpdateRequest,
};
use crate::transaction::{TransactGetItem, TransactWriteItem};
use crate::types::{AttributeValue, Item, KeySchema, PrimaryKey, ReturnValue};

/// Attributes keyed by name, the wire shape for both items and key maps.
/// `HashMap` rather than `Item`'s `BTreeMap` since this is what arrives off
/// the wire before it is known to be a full item or just a key.
pub type AttributeMap = HashMap<String, AttributeValue>;

fn item_from_map(map: AttributeMap) -> Item {
    map.into_iter().collect::<BTreeMap<_, _>>().into()
}

fn map_from_item(item: Item) -> AttributeMap {
    item.into_inner().into_iter().collect()
}

fn key_from_map(map: AttributeMap, schema: &KeySchema) -> TableResult<PrimaryKey> {
    item_from_map(map)
        .extract_key(schema)
        .ok_or_else(|| TableError::validation("key map is missing or mistypes the table's key attributes"))
}

fn key_to_map(key: &PrimaryKey, schema: &KeySchema) -> AttributeMap {
    let mut map = AttributeMap::new();
    map.insert(schema.pk_name().to_string(), key.pk.to_attribute_value());
    if let (Some(sk_name), Some(sk)) = (schema.sk_name(), &key.sk) {
        map.insert(sk_name.to_string(), sk.to_attribute_value());
    }
    map
}

fn parse_return_value(raw: Option<&str>) -> TableResult<ReturnValue> {
    match raw {
        None | Some("NONE") => Ok(ReturnValue::None),
        Some("ALL_OLD") => Ok(ReturnValue::AllOld),
        Some("ALL_NEW") => Ok(ReturnValue::AllNew),
        Some("UPDATED_OLD") => Ok(ReturnValue::UpdatedOld),
        Some("UPDATED_NEW") => Ok(ReturnValue::UpdatedNew),
        Some(other) => Err(TableError::validation(format!("unknown ReturnValues: {other}"))),
    }
}

fn names_or_default(names: &Option<ExpressionNames>) -> ExpressionNames {
    names.clone().unwrap_or_default()
}

fn values_or_default(values: &Option<ExpressionValues>) -> ExpressionValues {
    values.clone().unwrap_or_default()
}

fn parse_optional_condition(
    expr: &Option<String>,
    names: &Option<ExpressionNames>,
    values: &Option<ExpressionValues>,
) -> TableResult<Option<Condition>> {
    match expr {
        None => Ok(None),
        Some(expr) => {
            let cond = parse_condition(expr, &names_or_default(names), &values_or_default(values))?;
            Ok(Some(cond))
        }
    }
}

// ---------------------------------------------------------------------
// GetItem
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetItemInput {
    pub table_name: String,
    pub key: AttributeMap,
    #[serde(default)]
    pub consistent: bool,
    #[serde(default)]
    pub projection_expression: Option<String>,
    #[serde(default)]
    pub expression_attribute_names: Option<ExpressionNames>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetItemOutput {
    pub item: Option<Item>,
}

// ---------------------------------------------------------------------
// PutItem
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PutItemInput {
    pub table_name: String,
    pub item: Item,
    #[serde(default)]
    pub condition_expression: Option<String>,
    #[serde(default)]
    pub expression_attribute_names: Option<ExpressionNames>,
    #[serde(default)]
    pub expression_attribute_values: Option<ExpressionValues>,
    #[serde(default)]
    pub return_values: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PutItemOutput {
    pub attributes: Option<Item>,
}

// ---------------------------------------------------------------------
// UpdateItem
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateItemInput {
    pub table_name: String,
    pub key: AttributeMap,
    pub update_expression: String,
    #[serde(default)]
    pub condition_expression: Option<String>,
    #[serde(default)]
    pub expression_attribute_names: Option<ExpressionNames>,
    #[serde(default)]
    pub expression_attribute_values: Option<ExpressionValues>,
    #[serde(default)]
    pub return_values: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateItemOutput {
    pub attributes: Option<Item>,
}

// ---------------------------------------------------------------------
// DeleteItem
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteItemInput {
    pub table_name: String,
    pub key: AttributeMap,
    #[serde(default)]
    pub condition_expression: Option<String>,
    #[serde(default)]
    pub expression_attribute_names: Option<ExpressionNames>,
    #[serde(default)]
    pub expression_attribute_values: Option<ExpressionValues>,
    #[serde(default)]
    pub return_values: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeleteItemOutput {
    pub attributes: Option<Item>,
}

// ---------------------------------------------------------------------
// Query / Scan
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryInput {
    pub table_name: String,
    #[serde(default)]
    pub index_name: Option<String>,
    pub key_condition_expression: String,
    #[serde(default)]
    pub filter_expression: Option<String>,
    #[serde(default)]
    pub projection_expression: Option<String>,
    #[serde(default)]
    pub expression_attribute_names: Option<ExpressionNames>,
    #[serde(default)]
    pub expression_attribute_values: Option<ExpressionValues>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default = "default_true")]
    pub scan_forward: bool,
    #[serde(default)]
    pub exclusive_start_key: Option<AttributeMap>,
    #[serde(default)]
    pub consistent: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryOutput {
    pub items: Vec<Item>,
    pub count: usize,
    pub scanned_count: usize,
    pub last_evaluated_key: Option<AttributeMap>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanInput {
    pub table_name: String,
    #[serde(default)]
    pub index_name: Option<String>,
    #[serde(default)]
    pub filter_expression: Option<String>,
    #[serde(default)]
    pub projection_expression: Option<String>,
    #[serde(default)]
    pub expression_attribute_names: Option<ExpressionNames>,
    #[serde(default)]
    pub expression_attribute_values: Option<ExpressionValues>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub exclusive_start_key: Option<AttributeMap>,
    #[serde(default)]
    pub consistent: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanOutput {
    pub items: Vec<Item>,
    pub count: usize,
    pub scanned_count: usize,
    pub last_evaluated_key: Option<AttributeMap>,
}

/// Slices an already-ordered result set to one page, honoring
/// `exclusive_start_key`/`limit` and reporting the next `last_evaluated_key`.
/// The core query/scan layer materializes its full match set before
/// returning (see the pending range-scan pagination work noted in
/// `DESIGN.md`), so this page-slicing happens here rather than as a true
/// cursor-seeked read.
fn paginate(
    items: Vec<Item>,
    schema: &KeySchema,
    exclusive_start_key: Option<AttributeMap>,
    limit: Option<usize>,
) -> TableResult<(Vec<Item>, Option<AttributeMap>)> {
    let start_key = match exclusive_start_key {
        Some(map) => Some(key_from_map(map, schema)?.to_storage_key()),
        None => None,
    };

    let mut skipped = items;
    if let Some(start) = &start_key {
        let mut after_start = false;
        skipped.retain(|item| {
            if after_start {
                return true;
            }
            let matches_start = item
                .extract_key(schema)
                .map(|k| k.to_storage_key() == *start)
                .unwrap_or(false);
            if matches_start {
                after_start = true;
            }
            false
        });
    }

    match limit {
        Some(limit) if skipped.len() > limit => {
            let page: Vec<Item> = skipped.drain(..limit).collect();
            let last_key = page
                .last()
                .and_then(|item| item.extract_key(schema))
                .map(|key| key_to_map(&key, schema));
            Ok((page, last_key))
        }
        _ => Ok((skipped, None)),
    }
}

// ---------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "PascalCase")]
pub enum TransactWriteItemInput {
    Put {
        table_name: String,
        item: Item,
        #[serde(default)]
        condition_expression: Option<String>,
        #[serde(default)]
        expression_attribute_names: Option<ExpressionNames>,
        #[serde(default)]
        expression_attribute_values: Option<ExpressionValues>,
    },
    Update {
        table_name: String,
        key: AttributeMap,
        update_expression: String,
        #[serde(default)]
        condition_expression: Option<String>,
        #[serde(default)]
        expression_attribute_names: Option<ExpressionNames>,
        #[serde(default)]
        expression_attribute_values: Option<ExpressionValues>,
    },
    Delete {
        table_name: String,
        key: AttributeMap,
        #[serde(default)]
        condition_expression: Option<String>,
        #[serde(default)]
        expression_attribute_names: Option<ExpressionNames>,
        #[serde(default)]
        expression_attribute_values: Option<ExpressionValues>,
    },
    ConditionCheck {
        table_name: String,
        key: AttributeMap,
        condition_expression: String,
        #[serde(default)]
        expression_attribute_names: Option<ExpressionNames>,
        #[serde(default)]
        expression_attribute_values: Option<ExpressionValues>,
    },
}

impl TransactWriteItemInput {
    fn table_name(&self) -> &str {
        match self {
            Self::Put { table_name, .. }
            | Self::Update { table_name, .. }
            | Self::Delete { table_name, .. }
            | Self::ConditionCheck { table_name, .. } => table_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactWriteItemsInput {
    pub transact_items: Vec<TransactWriteItemInput>,
    #[serde(default)]
    pub client_request_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactGetItemInput {
    pub table_name: String,
    pub key: AttributeMap,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactGetItemsInput {
    pub transact_items: Vec<TransactGetItemInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactGetItemsOutput {
    pub items: Vec<Option<Item>>,
}

// ---------------------------------------------------------------------
// Batch write / get
// ---------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum WriteRequestItem {
    PutRequest { item: AttributeMap },
    DeleteRequest { key: AttributeMap },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchWriteItemInput {
    pub request_items: HashMap<String, Vec<WriteRequestItem>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchWriteItemOutput {
    pub unprocessed_items: HashMap<String, Vec<WriteRequestItem>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeysAndAttributes {
    pub keys: Vec<AttributeMap>,
    #[serde(default)]
    pub projection_expression: Option<String>,
    #[serde(default)]
    pub expression_attribute_names: Option<ExpressionNames>,
    #[serde(default)]
    pub consistent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchGetItemInput {
    pub request_items: HashMap<String, KeysAndAttributes>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchGetItemOutput {
    pub responses: HashMap<String, Vec<Item>>,
    pub unprocessed_keys: HashMap<String, KeysAndAttributes>,
}

// ---------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------

/// Dispatches wire-shaped requests to an [`Engine`], parsing every
/// expression string through the `expr` sublanguages and converting their
/// `ParseError`s into the same `ValidationException` a malformed request
/// would otherwise produce.
pub struct Facade<'a> {
    engine: &'a Engine,
}

impl<'a> Facade<'a> {
    pub fn new(engine: &'a Engine) -> Self {
        Self { engine }
    }

    pub fn get_item(&self, input: GetItemInput) -> TableResult<GetItemOutput> {
        self.engine.with_table(&input.table_name, |table| {
            let key = key_from_map(input.key.clone(), table.schema())?;
            let item = table.get(GetRequest::new(key))?;

            let item = match (&input.projection_expression, item) {
                (Some(expr), Some(item)) => {
                    let names = names_or_default(&input.expression_attribute_names);
                    let paths = parse_projection(expr, &names)?;
                    Some(apply_projection(&item, &paths))
                }
                (_, item) => item,
            };

            Ok(GetItemOutput { item })
        })
    }

    pub fn put_item(&self, input: PutItemInput) -> TableResult<PutItemOutput> {
        let condition = parse_optional_condition(
            &input.condition_expression,
            &input.expression_attribute_names,
            &input.expression_attribute_values,
        )?;
        let return_value = parse_return_value(input.return_values.as_deref())?;

        self.engine.with_table_mut(&input.table_name, |table| {
            let request = PutRequest::new(input.item)
                .condition_if(condition)
                .return_value(return_value);
            let result = table.put(request)?;
            Ok(PutItemOutput {
                attributes: result.attributes,
            })
        })
    }

    pub fn update_item(&self, input: UpdateItemInput) -> TableResult<UpdateItemOutput> {
        let names = names_or_default(&input.expression_attribute_names);
        let values = values_or_default(&input.expression_attribute_values);
        let expression = parse_update(&input.update_expression, &names, &values)?;
        let condition = parse_optional_condition(
            &input.condition_expression,
            &input.expression_attribute_names,
            &input.expression_attribute_values,
        )?;
        let return_value = parse_return_value(input.return_values.as_deref())?;

        self.engine.with_table_mut(&input.table_name, |table| {
            let key = key_from_map(input.key.clone(), table.schema())?;
            let request = UpdateRequest::new(key, expression)
                .condition_if(condition)
                .return_value(return_value);
            let result = table.update(request)?;
            Ok(UpdateItemOutput {
                attributes: result.attributes,
            })
        })
    }

    pub fn delete_item(&self, input: DeleteItemInput) -> TableResult<DeleteItemOutput> {
        let condition = parse_optional_condition(
            &input.condition_expression,
            &input.expression_attribute_names,
            &input.expression_attribute_values,
        )?;
        let return_value = parse_return_value(input.return_values.as_deref())?;

        self.engine.with_table_mut(&input.table_name, |table| {
            let key = key_from_map(input.key.clone(), table.schema())?;
            let request = DeleteRequest::new(key)
                .condition_if(condition)
                .return_value(return_value);
            let result = table.delete(request)?;
            Ok(DeleteItemOutput {
                attributes: result.attributes,
            })
        })
    }

    pub fn query(&self, input: QueryInput) -> TableResult<QueryOutput> {
        self.engine.with_table(&input.table_name, |table| {
            let names = names_or_default(&input.expression_attribute_names);
            let values = values_or_default(&input.expression_attribute_values);

            enum IndexKind {
                None,
                Gsi,
                Lsi,
            }

            let (index_schema, kind) = match &input.index_name {
                Some(name) if table.gsi(name).is_some() => {
                    (table.gsi(name).unwrap().schema().clone(), IndexKind::Gsi)
                }
                Some(name) if table.lsi(name).is_some() => {
                    (table.lsi(name).unwrap().schema().clone(), IndexKind::Lsi)
                }
                Some(name) => return Err(TableError::index_not_found(name.as_str())),
                None => (table.schema().clone(), IndexKind::None),
            };

            let key_condition = parse_key_condition(
                &input.key_condition_expression,
                &names,
                &values,
                &index_schema,
            )?;
            let filter = parse_optional_condition(
                &input.filter_expression,
                &input.expression_attribute_names,
                &input.expression_attribute_values,
            )?;

            let mut options = QueryOptions::new();
            if input.scan_forward {
                options = options.forward();
            } else {
                options = options.reverse();
            }

            let result = match kind {
                IndexKind::Gsi => {
                    let name = input.index_name.as_deref().unwrap();
                    match filter {
                        Some(filter) => table.query_gsi_with_filter(name, key_condition, filter)?,
                        None => table.query_gsi_with_options(name, key_condition, options)?,
                    }
                }
                IndexKind::Lsi => {
                    let name = input.index_name.as_deref().unwrap();
                    let mut result = table.query_lsi_with_options(name, key_condition, options)?;
                    if let Some(filter) = filter {
                        let filtered: Vec<Item> = result
                            .items
                            .into_iter()
                            .filter(|item| evaluate(&filter, item).unwrap_or(false))
                            .collect();
                        result.count = filtered.len();
                        result.items = filtered;
                    }
                    result
                }
                IndexKind::None => {
                    let request = match filter {
                        Some(filter) => CoreQueryRequest::new(key_condition).filter(filter).options(options),
                        None => CoreQueryRequest::new(key_condition).options(options),
                    };
                    table.query_req(request)?
                }
            };

            let items = match &input.projection_expression {
                Some(expr) => {
                    let paths = parse_projection(expr, &names)?;
                    result
                        .items
                        .into_iter()
                        .map(|item| apply_projection(&item, &paths))
                        .collect()
                }
                None => result.items,
            };

            let (page, last_evaluated_key) =
                paginate(items, &index_schema, input.exclusive_start_key.clone(), input.limit)?;

            Ok(QueryOutput {
                count: page.len(),
                scanned_count: result.scanned_count,
                items: page,
                last_evaluated_key,
            })
        })
    }

    pub fn scan(&self, input: ScanInput) -> TableResult<ScanOutput> {
        self.engine.with_table(&input.table_name, |table| {
            let names = names_or_default(&input.expression_attribute_names);
            let filter = parse_optional_condition(
                &input.filter_expression,
                &input.expression_attribute_names,
                &input.expression_attribute_values,
            )?;

            let items = match filter {
                Some(filter) => table.scan_req(CoreScanRequest::new().filter(filter))?,
                None => table.scan_req(CoreScanRequest::new())?,
            };
            let scanned_count = items.len();

            let items = match &input.projection_expression {
                Some(expr) => {
                    let paths = parse_projection(expr, &names)?;
                    items
                        .into_iter()
                        .map(|item| apply_projection(&item, &paths))
                        .collect()
                }
                None => items,
            };

            let (page, last_evaluated_key) = paginate(
                items,
                table.schema(),
                input.exclusive_start_key.clone(),
                input.limit,
            )?;

            Ok(ScanOutput {
                count: page.len(),
                scanned_count,
                items: page,
                last_evaluated_key,
            })
        })
    }

    /// Items may target any number of tables: the underlying engine locks
    /// every table touched in canonical (sorted-by-name) order and applies
    /// the whole batch atomically across them.
    pub fn transact_write_items(&self, input: TransactWriteItemsInput) -> TableResult<()> {
        if input.transact_items.is_empty() {
            return Err(TableError::validation("TransactWriteItems requires at least one item"));
        }

        let mut schemas: HashMap<String, KeySchema> = HashMap::new();
        for entry in &input.transact_items {
            let table_name = entry.table_name().to_string();
            if !schemas.contains_key(&table_name) {
                let schema = self.engine.with_table(&table_name, |t| Ok(t.schema().clone()))?;
                schemas.insert(table_name, schema);
            }
        }

        let mut items = Vec::with_capacity(input.transact_items.len());
        for entry in input.transact_items {
            let item = match entry {
                TransactWriteItemInput::Put {
                    table_name,
                    item,
                    condition_expression,
                    expression_attribute_names,
                    expression_attribute_values,
                } => {
                    let condition = parse_optional_condition(
                        &condition_expression,
                        &expression_attribute_names,
                        &expression_attribute_values,
                    )?;
                    match condition {
                        Some(c) => TransactWriteItem::put_with_condition(table_name, item, c),
                        None => TransactWriteItem::put(table_name, item),
                    }
                }
                TransactWriteItemInput::Update {
                    table_name,
                    key,
                    update_expression,
                    condition_expression,
                    expression_attribute_names,
                    expression_attribute_values,
                } => {
                    let schema = &schemas[&table_name];
                    let names = names_or_default(&expression_attribute_names);
                    let values = values_or_default(&expression_attribute_values);
                    let expression = parse_update(&update_expression, &names, &values)?;
                    let condition = parse_optional_condition(
                        &condition_expression,
                        &expression_attribute_names,
                        &expression_attribute_values,
                    )?;
                    let key = key_from_map(key, schema)?;
                    match condition {
                        Some(c) => {
                            TransactWriteItem::update_with_condition(table_name, key, expression, c)
                        }
                        None => TransactWriteItem::update(table_name, key, expression),
                    }
                }
                TransactWriteItemInput::Delete {
                    table_name,
                    key,
                    condition_expression,
                    expression_attribute_names,
                    expression_attribute_values,
                } => {
                    let schema = &schemas[&table_name];
                    let condition = parse_optional_condition(
                        &condition_expression,
                        &expression_attribute_names,
                        &expression_attribute_values,
                    )?;
                    let key = key_from_map(key, schema)?;
                    match condition {
                        Some(c) => TransactWriteItem::delete_with_condition(table_name, key, c),
                        None => TransactWriteItem::delete(table_name, key),
                    }
                }
                TransactWriteItemInput::ConditionCheck {
                    table_name,
                    key,
                    condition_expression,
                    expression_attribute_names,
                    expression_attribute_values,
                } => {
                    let schema = &schemas[&table_name];
                    let names = names_or_default(&expression_attribute_names);
                    let values = values_or_default(&expression_attribute_values);
                    let condition = parse_condition(&condition_expression, &names, &values)?;
                    let key = key_from_map(key, schema)?;
                    TransactWriteItem::condition_check(table_name, key, condition)
                }
            };
            items.push(item);
        }

        self.engine
            .transact_write_items(items, input.client_request_token)
    }

    pub fn transact_get_items(
        &self,
        input: TransactGetItemsInput,
    ) -> TableResult<TransactGetItemsOutput> {
        if input.transact_items.is_empty() {
            return Ok(TransactGetItemsOutput { items: Vec::new() });
        }

        let mut schemas: HashMap<String, KeySchema> = HashMap::new();
        for entry in &input.transact_items {
            if !schemas.contains_key(&entry.table_name) {
                let schema = self
                    .engine
                    .with_table(&entry.table_name, |t| Ok(t.schema().clone()))?;
                schemas.insert(entry.table_name.clone(), schema);
            }
        }

        let items: Vec<TransactGetItem> = input
            .transact_items
            .into_iter()
            .map(|entry| {
                let schema = &schemas[&entry.table_name];
                key_from_map(entry.key, schema)
                    .map(|key| TransactGetItem::get(entry.table_name, key))
            })
            .collect::<TableResult<_>>()?;

        let result = self.engine.transact_get_items(items)?;
        Ok(TransactGetItemsOutput { items: result.items })
    }

    pub fn batch_write_item(&self, input: BatchWriteItemInput) -> TableResult<BatchWriteItemOutput> {
        let mut unprocessed = HashMap::new();
        for (table_name, entries) in input.request_items {
            let schema = self.engine.with_table(&table_name, |t| Ok(t.schema().clone()))?;
            let mut request = BatchWriteRequest::new();
            for entry in entries {
                match entry {
                    WriteRequestItem::PutRequest { item } => {
                        request = request.put(item_from_map(item));
                    }
                    WriteRequestItem::DeleteRequest { key } => {
                        request = request.delete(key_from_map(key, &schema)?);
                    }
                }
            }
            let result = self.engine.batch_write_item(&table_name, request)?;
            if result.has_unprocessed() {
                let items = result
                    .unprocessed_items
                    .into_iter()
                    .map(|item| match item {
                        BatchWriteItem::Put { item } => WriteRequestItem::PutRequest {
                            item: map_from_item(item),
                        },
                        BatchWriteItem::Delete { key } => WriteRequestItem::DeleteRequest {
                            key: key_to_map(&key, &schema),
                        },
                    })
                    .collect();
                unprocessed.insert(table_name, items);
            }
        }
        Ok(BatchWriteItemOutput {
            unprocessed_items: unprocessed,
        })
    }

    pub fn batch_get_item(&self, input: BatchGetItemInput) -> TableResult<BatchGetItemOutput> {
        let mut responses = HashMap::new();
        let mut unprocessed_keys = HashMap::new();

        for (table_name, spec) in input.request_items {
            let schema = self.engine.with_table(&table_name, |t| Ok(t.schema().clone()))?;
            let mut request = BatchGetRequest::new();
            for key in &spec.keys {
                request = request.get(key_from_map(key.clone(), &schema)?);
            }

            let result = self.engine.batch_get_item(&table_name, request)?;

            let items = match &spec.projection_expression {
                Some(expr) => {
                    let names = names_or_default(&spec.expression_attribute_names);
                    let paths = parse_projection(expr, &names)?;
                    result
                        .items
                        .into_iter()
                        .map(|item| apply_projection(&item, &paths))
                        .collect()
                }
                None => result.items,
            };
            responses.insert(table_name.clone(), items);

            if result.has_unprocessed() {
                unprocessed_keys.insert(
                    table_name,
                    KeysAndAttributes {
                        keys: result
                            .unprocessed_keys
                            .into_iter()
                            .map(|key| key_to_map(&key, &schema))
                            .collect(),
                        projection_expression: spec.projection_expression,
                        expression_attribute_names: spec.expression_attribute_names,
                        consistent: spec.consistent,
                    },
                );
            }
        }

        Ok(BatchGetItemOutput {
            responses,
            unprocessed_keys,
        })
    }
}
