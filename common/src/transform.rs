//! Field-renaming transforms from authored source records to table rows.

use crate::{Row, SyncError};
use serde_json::Value;

/// Copy one source field into one target column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRule {
    pub source: String,
    pub target: String,
    pub required: bool,
}

/// An ordered list of field rules. Source fields without a rule are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transform {
    rules: Vec<FieldRule>,
}

impl Transform {
    pub fn builder() -> Self {
        Self::default()
    }

    /// Require `source` and store it under `target`.
    #[must_use]
    pub fn rename(mut self, source: &str, target: &str) -> Self {
        self.rules.push(FieldRule {
            source: source.to_string(),
            target: target.to_string(),
            required: true,
        });
        self
    }

    /// Require `field` and store it under the same name.
    #[must_use]
    pub fn keep(self, field: &str) -> Self {
        self.rename(field, field)
    }

    /// Copy `source` to `target` when present, store null otherwise.
    /// Every row keeps the same columns, which a bulk insert requires.
    #[must_use]
    pub fn optional(mut self, source: &str, target: &str) -> Self {
        self.rules.push(FieldRule {
            source: source.to_string(),
            target: target.to_string(),
            required: false,
        });
        self
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Hotels as authored: `{name, stars, costPerNight, category, ImageUrl, description}`.
    pub fn hotel() -> Self {
        Self::builder()
            .keep("name")
            .keep("stars")
            .rename("costPerNight", "cost_per_night")
            .keep("category")
            .rename("ImageUrl", "image_url")
            .keep("description")
    }

    /// Transport options as authored: `{id, label, costPerDay, ImageUrl}`.
    /// The slug id becomes `transport_id` so the table can generate its own key.
    pub fn transport() -> Self {
        Self::builder()
            .rename("id", "transport_id")
            .keep("label")
            .rename("costPerDay", "cost_per_day")
            .rename("ImageUrl", "image_url")
    }

    fn apply_record(&self, record: &Row) -> Result<Row, String> {
        let mut row = Row::new();
        for rule in &self.rules {
            match record.get(&rule.source).filter(|v| !v.is_null()) {
                Some(value) => {
                    row.insert(rule.target.clone(), value.clone());
                }
                None if rule.required => {
                    return Err(format!("missing required field `{}`", rule.source));
                }
                None => {
                    row.insert(rule.target.clone(), Value::Null);
                }
            }
        }
        Ok(row)
    }

    /// Transform a single record.
    ///
    /// # Errors
    /// Returns a validation error if a required field is missing or null.
    pub fn apply(&self, record: &Row) -> Result<Row, SyncError> {
        self.apply_record(record).map_err(SyncError::Validation)
    }

    /// Transform every record, keeping their order.
    ///
    /// # Errors
    /// Returns a validation error naming the first record (1-based) with a missing required field.
    pub fn apply_all(&self, records: &[Row]) -> Result<Vec<Row>, SyncError> {
        records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                self.apply_record(record)
                    .map_err(|msg| SyncError::Validation(format!("record #{}: {msg}", i + 1)))
            })
            .collect()
    }
}
