use crate::condition::Condition;
use crate::types::{Item, PrimaryKey};
use crate::update::UpdateExpression;

#[derive(Debug, Clone)]
pub enum TransactWriteItem {
    Put {
        table_name: String,
        item: Item,
        condition: Option<Condition>,
    },
    Update {
        table_name: String,
        key: PrimaryKey,
        expression: UpdateExpression,
        condition: Option<Condition>,
    },
    Delete {
        table_name: String,
        key: PrimaryKey,
        condition: Option<Condition>,
    },
    ConditionCheck {
        table_name: String,
        key: PrimaryKey,
        condition: Condition,
    },
}

impl TransactWriteItem {
    /// The table this item is applied against. `Engine::transact_write_items`
    /// groups items by this field to acquire per-table locks in canonical
    /// (sorted-by-name) order before validating or applying anything.
    pub fn table_name(&self) -> &str {
        match self {
            Self::Put { table_name, .. }
            | Self::Update { table_name, .. }
            | Self::Delete { table_name, .. }
            | Self::ConditionCheck { table_name, .. } => table_name,
        }
    }

    /// Overrides the table name, used by `Table::transact_write` to stamp
    /// its own name onto items built through `TransactWriteRequest`'s
    /// single-table builder, which has no table to name until then.
    pub(crate) fn with_table_name(self, table_name: String) -> Self {
        match self {
            Self::Put { item, condition, .. } => Self::Put {
                table_name,
                item,
                condition,
            },
            Self::Update {
                key,
                expression,
                condition,
                ..
            } => Self::Update {
                table_name,
                key,
                expression,
                condition,
            },
            Self::Delete { key, condition, .. } => Self::Delete {
                table_name,
                key,
                condition,
            },
            Self::ConditionCheck { key, condition, .. } => Self::ConditionCheck {
                table_name,
                key,
                condition,
            },
        }
    }

    pub fn put(table_name: impl Into<String>, item: Item) -> Self {
        Self::Put {
            table_name: table_name.into(),
            item,
            condition: None,
        }
    }
    pub fn put_with_condition(
        table_name: impl Into<String>,
        item: Item,
        condition: Condition,
    ) -> Self {
        Self::Put {
            table_name: table_name.into(),
            item,
            condition: Some(condition),
        }
    }

    pub fn update(
        table_name: impl Into<String>,
        key: impl Into<PrimaryKey>,
        expression: UpdateExpression,
    ) -> Self {
        Self::Update {
            table_name: table_name.into(),
            key: key.into(),
            expression,
            condition: None,
        }
    }
    pub fn update_with_condition(
        table_name: impl Into<String>,
        key: impl Into<PrimaryKey>,
        expression: UpdateExpression,
        condition: Condition,
    ) -> Self {
        Self::Update {
            table_name: table_name.into(),
            key: key.into(),
            expression,
            condition: Some(condition),
        }
    }

    pub fn delete(table_name: impl Into<String>, key: impl Into<PrimaryKey>) -> Self {
        Self::Delete {
            table_name: table_name.into(),
            key: key.into(),
            condition: None,
        }
    }
    pub fn delete_with_condition(
        table_name: impl Into<String>,
        key: impl Into<PrimaryKey>,
        condition: Condition,
    ) -> Self {
        Self::Delete {
            table_name: table_name.into(),
            key: key.into(),
            condition: Some(condition),
        }
    }

    pub fn condition_check(
        table_name: impl Into<String>,
        key: impl Into<PrimaryKey>,
        condition: Condition,
    ) -> Self {
        Self::ConditionCheck {
            table_name: table_name.into(),
            key: key.into(),
            condition,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TransactGetItem {
    Get { table_name: String, key: PrimaryKey },
}

impl TransactGetItem {
    pub fn table_name(&self) -> &str {
        match self {
            Self::Get { table_name, .. } => table_name,
        }
    }

    pub fn get(table_name: impl Into<String>, key: impl Into<PrimaryKey>) -> Self {
        Self::Get {
            table_name: table_name.into(),
            key: key.into(),
        }
    }

    pub(crate) fn with_table_name(self, table_name: String) -> Self {
        match self {
            Self::Get { key, .. } => Self::Get { table_name, key },
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransactGetResult {
    pub items: Vec<Option<Item>>,
}

impl TransactGetResult {
    pub fn new(items: Vec<Option<Item>>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn found_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_some()).count()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index).and_then(|i| i.as_ref())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::condition::attr;

    #[test]
    fn write_item_put() {
        let item = Item::new().with_s("pk", "test");

        let put = TransactWriteItem::put("users", item.clone());
        assert!(matches!(
            put,
            TransactWriteItem::Put {
                condition: None,
                ..
            }
        ));
        let put_cond = TransactWriteItem::put_with_condition(
            "users",
            item.clone(),
            attr("pk").not_exists(),
        );
        assert!(matches!(
            put_cond,
            TransactWriteItem::Put {
                condition: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn write_item_update() {
        let key = PrimaryKey::simple("pk");

        let update = TransactWriteItem::update(
            "users",
            key.clone(),
            UpdateExpression::new().set("name", "Alice"),
        );
        assert!(matches!(
            update,
            TransactWriteItem::Update {
                condition: None,
                ..
            }
        ));
        let update_cond = TransactWriteItem::update_with_condition(
            "users",
            key.clone(),
            UpdateExpression::new().set("name", "Alice"),
            attr("pk").not_exists(),
        );
        assert!(matches!(
            update_cond,
            TransactWriteItem::Update {
                condition: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn write_item_delete() {
        let delete = TransactWriteItem::delete("users", PrimaryKey::simple("test"));
        assert!(matches!(
            delete,
            TransactWriteItem::Delete {
                condition: None,
                ..
            }
        ));
    }

    #[test]
    fn condition_check() {
        let check = TransactWriteItem::condition_check(
            "users",
            PrimaryKey::simple("test"),
            attr("status").eq("active"),
        );
        assert!(matches!(check, TransactWriteItem::ConditionCheck { .. }));
    }

    #[test]
    fn table_name_accessor_covers_every_variant() {
        let put = TransactWriteItem::put("orders", Item::new().with_s("pk", "o1"));
        assert_eq!(put.table_name(), "orders");

        let get = TransactGetItem::get("orders", PrimaryKey::simple("o1"));
        assert_eq!(get.table_name(), "orders");
    }

    #[test]
    fn get_result() {
        let result = TransactGetResult::new(vec![
            Some(Item::new().with_s("pk", "item0")),
            None,
            Some(Item::new().with_s("pk", "item2")),
        ]);

        assert_eq!(result.len(), 3);
        assert_eq!(result.found_count(), 2);
        assert!(result.get(0).is_some());
        assert!(result.get(1).is_none());
        assert!(result.get(2).is_some());
        assert!(result.get(42).is_none()); // out of bounds
    }
}
