//! Replace the contents of a reference table with a transformed static list.
//!
//! The run is not atomic. Rows are deleted before the insert is attempted, so a rejected
//! insert leaves the table empty and nothing puts the old rows back.

use crate::store_api::RemoteStore;
use crate::transform::Transform;
use crate::{HOTELS_TABLE, Row, SyncError, TRANSPORT_TABLE};
use log::{info, warn};

/// What a completed synchronization did.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncResult {
    pub table: String,
    /// Rows in the table before it was cleared.
    pub previous_count: u64,
    pub requested_count: usize,
    pub inserted_count: usize,
    /// Rows as the store returned them, generated ids included.
    pub inserted_rows: Vec<Row>,
}

impl SyncResult {
    pub fn is_complete(&self) -> bool {
        self.inserted_count == self.requested_count
    }
}

/// A full-replace of one table from a source list.
#[derive(Debug, Clone)]
pub struct Synchronizer {
    table: String,
    transform: Transform,
}

impl Synchronizer {
    pub fn new(table: impl Into<String>, transform: Transform) -> Self {
        Self {
            table: table.into(),
            transform,
        }
    }

    pub fn hotels() -> Self {
        Self::new(HOTELS_TABLE, Transform::hotel())
    }

    pub fn transport() -> Self {
        Self::new(TRANSPORT_TABLE, Transform::transport())
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Transform the source list into table rows without touching the store.
    ///
    /// # Errors
    /// Returns a validation error if the list is empty or a record is missing a required field.
    pub fn prepare(&self, source: &[Row]) -> Result<Vec<Row>, SyncError> {
        if source.is_empty() {
            return Err(SyncError::Validation(format!(
                "no source records for table {}",
                self.table
            )));
        }
        self.transform.apply_all(source)
    }

    /// Replace every row of the table with the transformed source list.
    ///
    /// # Errors
    /// - `Validation` if the source list is empty or malformed (nothing sent to the store)
    /// - `Connection` / `Query` if the pre-flight count fails (nothing deleted)
    /// - `Delete` if the clear is rejected (table may be empty)
    /// - `Insert` if the insert is rejected after the clear (table is empty)
    pub fn run<S>(&self, store: &S, source: &[Row]) -> Result<SyncResult, SyncError>
    where
        S: RemoteStore + ?Sized,
    {
        let rows = self.prepare(source)?;
        let table = self.table.as_str();

        let previous_count = store
            .count(table, &[])
            .map_err(|e| SyncError::read(table, e))?;
        info!(
            "Table {table} holds {previous_count} rows, replacing with {} rows.",
            rows.len()
        );

        store
            .delete_all(table)
            .map_err(|source| SyncError::Delete {
                table: table.to_string(),
                source,
            })?;
        info!("Table {table} cleared.");

        let inserted_rows = store
            .insert(table, &rows)
            .map_err(|source| SyncError::Insert {
                table: table.to_string(),
                source,
            })?;

        let result = SyncResult {
            table: table.to_string(),
            previous_count,
            requested_count: rows.len(),
            inserted_count: inserted_rows.len(),
            inserted_rows,
        };
        if result.is_complete() {
            info!("Table {table} now holds {} rows.", result.inserted_count);
        } else {
            warn!(
                "Table {table}: asked to insert {} rows but the store returned {}.",
                result.requested_count, result.inserted_count
            );
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_data;
    use crate::test_store::MemoryStore;
    use serde_json::{Value, json};

    fn row(value: Value) -> Row {
        value.as_object().unwrap().clone()
    }

    fn stale_rows() -> Vec<Row> {
        vec![
            row(json!({"name": "Old One", "stars": 2})),
            row(json!({"name": "Old Two", "stars": 3})),
            row(json!({"name": "Old Three", "stars": 4})),
        ]
    }

    fn without_id(mut row: Row) -> Row {
        row.remove("id");
        row
    }

    #[test_log::test]
    fn test_sync_replaces_table() {
        let store = MemoryStore::with_table(HOTELS_TABLE, stale_rows());
        let source = source_data::hotels().unwrap();

        let result = Synchronizer::hotels().run(&store, &source).unwrap();

        assert_eq!(result.previous_count, 3);
        assert_eq!(result.requested_count, source.len());
        assert_eq!(result.inserted_count, source.len());
        assert!(result.is_complete());

        let rows = store.rows(HOTELS_TABLE);
        assert_eq!(rows.len(), source.len());
        assert!(rows.iter().all(|r| r.contains_key("cost_per_night")));
        assert!(!rows.iter().any(|r| r["name"] == json!("Old One")));
        assert_eq!(*store.calls.borrow(), vec!["count", "delete_all", "insert"]);
    }

    #[test_log::test]
    fn test_sync_is_idempotent() {
        let store = MemoryStore::with_table(TRANSPORT_TABLE, stale_rows());
        let source = source_data::transport().unwrap();
        let sync = Synchronizer::transport();

        sync.run(&store, &source).unwrap();
        let first: Vec<Row> = store
            .rows(TRANSPORT_TABLE)
            .into_iter()
            .map(without_id)
            .collect();
        let second_result = sync.run(&store, &source).unwrap();
        let second: Vec<Row> = store
            .rows(TRANSPORT_TABLE)
            .into_iter()
            .map(without_id)
            .collect();

        assert_eq!(second_result.previous_count, source.len() as u64);
        assert_eq!(first, second);
        assert_eq!(second.len(), source.len());
    }

    #[test_log::test]
    fn test_insert_failure_leaves_table_empty() {
        let store = MemoryStore::with_table(HOTELS_TABLE, stale_rows());
        store.reject_insert.set(true);
        let source = source_data::hotels().unwrap();

        let err = Synchronizer::hotels().run(&store, &source).unwrap_err();

        assert!(matches!(err, SyncError::Insert { .. }));
        assert!(err.left_table_empty());
        assert_eq!(err.step(), "insert");
        assert!(store.rows(HOTELS_TABLE).is_empty());
    }

    #[test_log::test]
    fn test_delete_failure_stops_before_insert() {
        let store = MemoryStore::with_table(HOTELS_TABLE, stale_rows());
        store.reject_delete.set(true);
        let source = source_data::hotels().unwrap();

        let err = Synchronizer::hotels().run(&store, &source).unwrap_err();

        assert!(matches!(err, SyncError::Delete { .. }));
        assert_eq!(*store.calls.borrow(), vec!["count", "delete_all"]);
        assert_eq!(store.rows(HOTELS_TABLE).len(), 3);
    }

    #[test_log::test]
    fn test_unreachable_store_is_connection_error() {
        let store = MemoryStore::with_table(HOTELS_TABLE, stale_rows());
        store.unreachable.set(true);
        let source = source_data::hotels().unwrap();

        let err = Synchronizer::hotels().run(&store, &source).unwrap_err();

        assert!(matches!(err, SyncError::Connection { .. }));
        assert_eq!(*store.calls.borrow(), vec!["count"]);
    }

    #[test_log::test]
    fn test_invalid_source_never_reaches_store() {
        let store = MemoryStore::with_table(TRANSPORT_TABLE, stale_rows());
        let source = vec![row(json!({"id": "basic", "label": "Basic Sedan"}))];

        let err = Synchronizer::transport().run(&store, &source).unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));

        let err = Synchronizer::transport().run(&store, &[]).unwrap_err();
        assert!(matches!(err, SyncError::Validation(_)));

        assert!(store.calls.borrow().is_empty());
        assert_eq!(store.rows(TRANSPORT_TABLE).len(), 3);
    }

    #[test_log::test]
    fn test_missing_optional_fields_still_insert() {
        let store = MemoryStore::with_table(TRANSPORT_TABLE, stale_rows());
        let transform = Transform::builder()
            .rename("id", "transport_id")
            .keep("label")
            .optional("notes", "notes");
        let source = vec![
            row(json!({"id": "basic", "label": "Basic Sedan", "notes": "cash only"})),
            row(json!({"id": "suv", "label": "Family SUV"})),
        ];

        let result = Synchronizer::new(TRANSPORT_TABLE, transform)
            .run(&store, &source)
            .unwrap();

        assert_eq!(result.inserted_count, 2);
        assert_eq!(store.rows(TRANSPORT_TABLE)[1]["notes"], Value::Null);
    }

    #[test_log::test]
    fn test_short_insert_is_reported_not_rolled_back() {
        let store = MemoryStore::with_table(TRANSPORT_TABLE, stale_rows());
        store.drop_on_insert.set(1);
        let source = source_data::transport().unwrap();

        let result = Synchronizer::transport().run(&store, &source).unwrap();

        assert!(!result.is_complete());
        assert_eq!(result.inserted_count, source.len() - 1);
        assert_eq!(store.rows(TRANSPORT_TABLE).len(), source.len() - 1);
    }
}
