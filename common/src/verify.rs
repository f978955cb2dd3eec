//! Read tables back for human confirmation, plus the few aggregates the inspection commands print.
//!
//! Aggregates run over rows already fetched. Only [`Verifier::count`] is answered by the store.

use crate::store_api::{Direction, Filter, RemoteStore, Select};
use crate::{Row, StoreError, SyncError};
use itertools::Itertools;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// A read-only query against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Verifier {
    query: Select,
}

impl Verifier {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            query: Select::all(table),
        }
    }

    #[must_use]
    pub fn columns<C: AsRef<str>>(mut self, columns: &[C]) -> Self {
        self.query.columns = columns.iter().map(|c| c.as_ref().to_string()).collect();
        self
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.query.order = Some((column.into(), direction));
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.query.filters.push(filter);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.query.limit = Some(limit);
        self
    }

    pub fn table(&self) -> &str {
        &self.query.table
    }

    /// Fetch every matching row.
    ///
    /// # Errors
    /// Returns a connection error if the store is unreachable, otherwise a query error.
    pub fn fetch<S>(&self, store: &S) -> Result<Vec<Row>, SyncError>
    where
        S: RemoteStore + ?Sized,
    {
        store
            .select(&self.query)
            .map_err(|e| SyncError::read(self.table(), e))
    }

    /// Ask the store for the number of matching rows without fetching them.
    /// Ordering and limit are ignored.
    ///
    /// # Errors
    /// Returns a connection error if the store is unreachable, otherwise a query error.
    pub fn count<S>(&self, store: &S) -> Result<u64, SyncError>
    where
        S: RemoteStore + ?Sized,
    {
        store
            .count(self.table(), &self.query.filters)
            .map_err(|e| SyncError::read(self.table(), e))
    }
}

/// Decode rows into a typed record.
///
/// # Errors
/// Returns a query error naming the first row that does not decode.
pub fn decode_rows<T: DeserializeOwned>(table: &str, rows: &[Row]) -> Result<Vec<T>, SyncError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            serde_json::from_value(Value::Object(row.clone())).map_err(|e| SyncError::Query {
                table: table.to_string(),
                source: StoreError::Decode(format!("row #{}: {e}", i + 1)),
            })
        })
        .collect()
}

/// Render a cell for grouping and display. Strings lose their quotes.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn count_rows(rows: &[Row]) -> usize {
    rows.len()
}

/// Number of distinct non-null values in a column.
pub fn count_distinct(rows: &[Row], column: &str) -> usize {
    rows.iter()
        .filter_map(|row| row.get(column))
        .filter(|v| !v.is_null())
        .map(display_value)
        .unique()
        .count()
}

/// Number of rows where `column` equals `value`.
pub fn count_where(rows: &[Row], column: &str, value: impl Into<Value>) -> usize {
    let filter = Filter::eq(column, value);
    rows.iter().filter(|row| filter.matches(row)).count()
}

/// Mean of the numeric values in a column. Non-numeric and missing cells are skipped.
pub fn mean(rows: &[Row], column: &str) -> Option<f64> {
    let values: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.get(column).and_then(Value::as_f64))
        .collect();
    if values.is_empty() {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = values.len() as f64;
    Some(values.iter().sum::<f64>() / count)
}

/// Rows per distinct value of a column, sorted by value. Missing cells are skipped.
pub fn value_counts(rows: &[Row], column: &str) -> Vec<(String, usize)> {
    rows.iter()
        .filter_map(|row| row.get(column))
        .filter(|v| !v.is_null())
        .map(display_value)
        .counts()
        .into_iter()
        .sorted()
        .collect()
}
