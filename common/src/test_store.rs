//! In-memory store for unit tests, with switches to make individual calls fail.

use crate::store_api::{Direction, Filter, RemoteStore, Select};
use crate::{Row, StoreError};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Default)]
pub(crate) struct MemoryStore {
    tables: RefCell<HashMap<String, Vec<Row>>>,
    next_id: Cell<i64>,
    pub unreachable: Cell<bool>,
    pub reject_delete: Cell<bool>,
    pub reject_insert: Cell<bool>,
    /// Rows to silently drop from each insert.
    pub drop_on_insert: Cell<usize>,
    pub calls: RefCell<Vec<&'static str>>,
}

impl MemoryStore {
    pub fn with_table(table: &str, rows: Vec<Row>) -> Self {
        let store = Self::default();
        store.seed(table, rows);
        store
    }

    pub fn seed(&self, table: &str, rows: Vec<Row>) {
        let rows = rows.into_iter().map(|row| self.with_id(row)).collect();
        self.tables.borrow_mut().insert(table.to_string(), rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables.borrow().get(table).cloned().unwrap_or_default()
    }

    fn with_id(&self, mut row: Row) -> Row {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        row.insert("id".to_string(), Value::from(id));
        row
    }

    fn enter(&self, call: &'static str) -> Result<(), StoreError> {
        self.calls.borrow_mut().push(call);
        if self.unreachable.get() {
            return Err(StoreError::Unreachable {
                kind: "connection",
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(a)), Some(Value::Number(b))) => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(a)), Some(Value::String(b))) => a.cmp(b),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
    }
}

fn rejected(what: &str) -> StoreError {
    StoreError::Rejected {
        status: 400,
        message: format!("{what} rejected by test store"),
    }
}

impl RemoteStore for MemoryStore {
    fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError> {
        self.enter("select")?;
        let tables = self.tables.borrow();
        let Some(rows) = tables.get(&query.table) else {
            return Err(StoreError::Rejected {
                status: 404,
                message: format!("relation \"{}\" does not exist", query.table),
            });
        };

        let mut rows: Vec<Row> = rows
            .iter()
            .filter(|row| query.filters.iter().all(|f| f.matches(row)))
            .cloned()
            .collect();
        if let Some((column, direction)) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(column), b.get(column));
                match direction {
                    Direction::Ascending => ord,
                    Direction::Descending => ord.reverse(),
                }
            });
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        if !query.columns.is_empty() {
            for row in &mut rows {
                row.retain(|k, _| query.columns.contains(k));
            }
        }
        Ok(rows)
    }

    fn delete_all(&self, table: &str) -> Result<(), StoreError> {
        self.enter("delete_all")?;
        if self.reject_delete.get() {
            return Err(rejected("delete"));
        }
        self.tables
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .clear();
        Ok(())
    }

    fn insert(&self, table: &str, rows: &[Row]) -> Result<Vec<Row>, StoreError> {
        self.enter("insert")?;
        if self.reject_insert.get() {
            return Err(rejected("insert"));
        }
        // PostgREST refuses a bulk insert whose objects have different keys
        if let Some(first) = rows.first()
            && rows.iter().any(|row| !row.keys().eq(first.keys()))
        {
            return Err(StoreError::Rejected {
                status: 400,
                message: "All object keys must match [PGRST102]".to_string(),
            });
        }
        let keep = rows.len().saturating_sub(self.drop_on_insert.get());
        let stored: Vec<Row> = rows[..keep]
            .iter()
            .map(|row| self.with_id(row.clone()))
            .collect();
        self.tables
            .borrow_mut()
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    fn count(&self, table: &str, filters: &[Filter]) -> Result<u64, StoreError> {
        self.enter("count")?;
        let tables = self.tables.borrow();
        let count = tables.get(table).map_or(0, |rows| {
            rows.iter()
                .filter(|row| filters.iter().all(|f| f.matches(row)))
                .count()
        });
        Ok(count as u64)
    }
}
