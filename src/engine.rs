//! Owns the table catalog, the `clientRequestToken` registry, and the
//! construction-time configuration surface. The external request facade
//! dispatches every wire-level operation through an `Engine` rather than
//! holding `Table`s directly, so it never has to know about locking order.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::batch::{BatchExecutor, BatchGetRequest, BatchGetResult, BatchWriteItem, BatchWriteRequest, BatchWriteResult};
use crate::error::{TableError, TableResult, TransactionCancelReason};
use crate::table::Table;
use crate::transaction::{
    cancel_reasons, TransactGetItem, TransactGetResult, TransactWriteItem, TransactionExecutor,
    TransactionFailureReason,
};
use crate::types::KeySchema;

const IDEMPOTENCY_TOKEN_TTL: Duration = Duration::from_secs(10 * 60);

/// `Copy` struct of flags gating behaviors the source spec leaves
/// source-ambiguous (see the Open Questions resolved in `DESIGN.md`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConformanceFlags {
    /// SHOULD detect and reject same-key duplicates within a single
    /// `BatchWriteItem` call. Defaults to `true`.
    pub reject_batch_duplicates: bool,
}

impl Default for ConformanceFlags {
    fn default() -> Self {
        Self {
            reject_batch_duplicates: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreOptions {
    pub in_memory: bool,
    pub conformance: ConformanceFlags,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conformance(mut self, conformance: ConformanceFlags) -> Self {
        self.conformance = conformance;
        self
    }
}

struct IdempotencyEntry {
    request_hash: u64,
    outcome: Result<(), Vec<TransactionCancelReason>>,
    inserted_at: Instant,
}

/// Process-wide (per-engine) registry of `clientRequestToken`s seen by
/// `TransactWriteItems`, TTL-swept opportunistically on every call.
struct IdempotencyRegistry {
    entries: Mutex<HashMap<String, IdempotencyEntry>>,
}

impl IdempotencyRegistry {
    fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn sweep(&self) {
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| entry.inserted_at.elapsed() < IDEMPOTENCY_TOKEN_TTL);
    }

    fn check(&self, token: &str, request_hash: u64) -> Option<Result<(), TableError>> {
        let entries = self.entries.lock();
        entries.get(token).map(|entry| {
            if entry.request_hash == request_hash {
                entry
                    .outcome
                    .clone()
                    .map_err(TableError::TransactionCanceled)
            } else {
                tracing::warn!(token, "idempotency token reused with a different request body");
                Err(TableError::IdempotentParameterMismatch)
            }
        })
    }

    fn record(&self, token: String, request_hash: u64, outcome: Result<(), Vec<TransactionCancelReason>>) {
        self.entries.lock().insert(
            token,
            IdempotencyEntry {
                request_hash,
                outcome,
                inserted_at: Instant::now(),
            },
        );
    }
}

/// The table catalog plus shared engine-level state: idempotency tokens and
/// construction-time options. Tables are created at construction and live
/// for the engine's lifetime; each owns its own `parking_lot::RwLock` so
/// reads (`Get`/`Query`/`Scan`/`TransactGetItems`) take a shared lock and
/// writes take an exclusive one.
pub struct Engine {
    tables: RwLock<BTreeMap<String, Arc<RwLock<Table>>>>,
    options: StoreOptions,
    idempotency: IdempotencyRegistry,
}

impl Engine {
    pub fn new(options: StoreOptions) -> Self {
        Self {
            tables: RwLock::new(BTreeMap::new()),
            options,
            idempotency: IdempotencyRegistry::new(),
        }
    }

    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    pub fn create_table(&self, table: Table) {
        let name = table.name().to_string();
        self.tables.write().insert(name, Arc::new(RwLock::new(table)));
    }

    pub fn delete_table(&self, name: &str) -> bool {
        self.tables.write().remove(name).is_some()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables.read().keys().cloned().collect()
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.read().contains_key(name)
    }

    fn table_handle(&self, name: &str) -> TableResult<Arc<RwLock<Table>>> {
        self.tables
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| TableError::not_found(name))
    }

    /// Runs `f` against a shared (read) lock on the named table.
    pub fn with_table<T>(&self, name: &str, f: impl FnOnce(&Table) -> TableResult<T>) -> TableResult<T> {
        let handle = self.table_handle(name)?;
        let guard = handle.read();
        f(&guard)
    }

    /// Runs `f` against an exclusive (write) lock on the named table.
    pub fn with_table_mut<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Table) -> TableResult<T>,
    ) -> TableResult<T> {
        let handle = self.table_handle(name)?;
        let mut guard = handle.write();
        f(&mut guard)
    }

    pub fn batch_write_item(
        &self,
        table_name: &str,
        request: BatchWriteRequest,
    ) -> TableResult<BatchWriteResult> {
        let items = request.into_items();

        if self.options.conformance.reject_batch_duplicates {
            self.with_table(table_name, |table| {
                check_no_duplicate_keys(&items, table)
            })?;
        }

        let (puts, deletes): (Vec<_>, Vec<_>) =
            items.into_iter().partition(|item| item.is_put());

        self.with_table_mut(table_name, |table| {
            let executor = BatchExecutor::new();
            let schema = table.schema().clone();
            let put_items: Vec<_> = puts
                .into_iter()
                .map(|item| match item {
                    BatchWriteItem::Put { item } => item,
                    BatchWriteItem::Delete { .. } => unreachable!(),
                })
                .collect();
            let delete_keys: Vec<_> = deletes
                .into_iter()
                .map(|item| match item {
                    BatchWriteItem::Delete { key } => key,
                    BatchWriteItem::Put { .. } => unreachable!(),
                })
                .collect();

            let put_result = executor.execute_put(put_items, &schema, |item| {
                table.put_item(item).map(|_| ())
            })?;
            let delete_result = executor.execute_delete(delete_keys, |key| {
                table.delete_item(key).map(|_| ())
            })?;

            let mut result = BatchWriteResult::new();
            result.processed_count = put_result.processed_count + delete_result.processed_count;
            result.unprocessed_items = put_result
                .unprocessed_items
                .into_iter()
                .chain(delete_result.unprocessed_items)
                .collect();
            Ok(result)
        })
    }

    pub fn batch_get_item(
        &self,
        table_name: &str,
        request: BatchGetRequest,
    ) -> TableResult<BatchGetResult> {
        let keys = request.into_keys();
        self.with_table(table_name, |table| {
            let executor = BatchExecutor::new();
            executor.execute_get(keys, |key| table.get_item(key))
        })
    }

    /// Reads across any number of tables, acquiring shared locks in
    /// canonical (sorted-by-name) order so a concurrent `transact_write_items`
    /// touching an overlapping set of tables can never deadlock against it.
    pub fn transact_get_items(&self, items: Vec<TransactGetItem>) -> TableResult<TransactGetResult> {
        let handles = self.canonical_table_handles(&items, TransactGetItem::table_name)?;
        let tables: HashMap<String, RwLockReadGuard<'_, Table>> = handles
            .iter()
            .map(|(name, handle)| (name.clone(), handle.read()))
            .collect();

        let executor = TransactionExecutor::new();
        executor.execute_get(&items, |name, key| {
            tables
                .get(name)
                .ok_or_else(|| TableError::not_found(name))?
                .get_item(key)
        })
    }

    /// `{Put|Update|Delete|ConditionCheck}` items applied atomically, possibly
    /// across several tables: every table touched is locked exclusively in
    /// canonical (sorted-by-name) order, every condition is checked against
    /// the pre-transaction state of its own table, and only then is any
    /// mutation applied.
    pub fn transact_write_items(
        &self,
        items: Vec<TransactWriteItem>,
        client_request_token: Option<String>,
    ) -> TableResult<()> {
        self.idempotency.sweep();

        let request_hash = hash_transact_write(&items);
        if let Some(token) = &client_request_token {
            if let Some(outcome) = self.idempotency.check(token, request_hash) {
                return outcome;
            }
        }

        let handles = self.canonical_table_handles(&items, TransactWriteItem::table_name)?;
        let mut tables: HashMap<String, RwLockWriteGuard<'_, Table>> = handles
            .iter()
            .map(|(name, handle)| (name.clone(), handle.write()))
            .collect();
        let schemas: HashMap<String, KeySchema> = tables
            .iter()
            .map(|(name, guard)| (name.clone(), guard.schema().clone()))
            .collect();

        let executor = TransactionExecutor::new();
        let validation = executor.validate_write(
            &items,
            |name| schemas.get(name).cloned(),
            |name, key| {
                tables
                    .get(name)
                    .ok_or_else(|| TableError::not_found(name))?
                    .get_item(key)
            },
        );

        let result = match validation {
            Err(reason) => {
                tracing::warn!(%reason, "transaction cancelled");
                let reasons = cancel_reasons(items.len(), &reason);
                Err(TableError::TransactionCanceled(reasons))
            }
            Ok(()) => apply_transaction(&mut tables, items),
        };

        if let Some(token) = client_request_token {
            let outcome = match &result {
                Ok(()) => Ok(()),
                Err(TableError::TransactionCanceled(reasons)) => Err(reasons.clone()),
                Err(_) => Ok(()), // non-transaction errors (e.g. storage failure) aren't cached
            };
            self.idempotency.record(token, request_hash, outcome);
        }

        result
    }

    /// Resolves the distinct, canonically-sorted set of tables named by
    /// `items`; callers lock each returned handle themselves (shared for
    /// reads, exclusive for writes) so guard lifetimes stay tied to the
    /// caller's own stack frame rather than this helper's.
    fn canonical_table_handles<I>(
        &self,
        items: &[I],
        table_name_of: impl Fn(&I) -> &str,
    ) -> TableResult<Vec<(String, Arc<RwLock<Table>>)>> {
        let mut names: Vec<String> = items.iter().map(|i| table_name_of(i).to_string()).collect();
        names.sort();
        names.dedup();

        names
            .into_iter()
            .map(|name| {
                let handle = self.table_handle(&name)?;
                Ok((name, handle))
            })
            .collect()
    }
}

fn apply_transaction(
    tables: &mut HashMap<String, RwLockWriteGuard<'_, Table>>,
    items: Vec<TransactWriteItem>,
) -> TableResult<()> {
    for item in items {
        match item {
            TransactWriteItem::Put { table_name, item, .. } => {
                table_for(tables, &table_name)?.put_item(item)?;
            }
            TransactWriteItem::Update {
                table_name,
                key,
                expression,
                ..
            } => {
                table_for(tables, &table_name)?.update_item(&key, expression)?;
            }
            TransactWriteItem::Delete { table_name, key, .. } => {
                table_for(tables, &table_name)?.delete_item(&key)?;
            }
            TransactWriteItem::ConditionCheck { .. } => {}
        }
    }
    Ok(())
}

fn table_for<'t, 'g>(
    tables: &'t mut HashMap<String, RwLockWriteGuard<'g, Table>>,
    name: &str,
) -> TableResult<&'t mut Table> {
    tables
        .get_mut(name)
        .map(|guard| &mut **guard)
        .ok_or_else(|| TableError::not_found(name))
}

fn hash_transact_write(items: &[TransactWriteItem]) -> u64 {
    let mut hasher = DefaultHasher::new();
    format!("{:?}", items).hash(&mut hasher);
    hasher.finish()
}

fn check_no_duplicate_keys(items: &[BatchWriteItem], table: &Table) -> TableResult<()> {
    let mut seen = std::collections::HashSet::new();
    for item in items {
        let key = match item {
            BatchWriteItem::Put { item } => item.extract_key(table.schema()),
            BatchWriteItem::Delete { key } => Some(key.clone()),
        };
        if let Some(key) = key {
            if !seen.insert(key.to_storage_key()) {
                return Err(TableError::validation(
                    "duplicate key in BatchWriteItem request",
                ));
            }
        }
    }
    Ok(())
}
