//! The static source lists, embedded at compile time.

use crate::{Row, SyncError};

const HOTELS_JSON: &str = include_str!("../data/hotels.json");
const TRANSPORT_JSON: &str = include_str!("../data/transport.json");

/// Parse a JSON array of flat objects into source records.
///
/// # Errors
/// Returns a validation error if the text is not an array of objects.
pub fn parse_records(name: &str, text: &str) -> Result<Vec<Row>, SyncError> {
    serde_json::from_str::<Vec<Row>>(text)
        .map_err(|e| SyncError::Validation(format!("{name} is not a list of records: {e}")))
}

/// The hotels as authored, camelCase field names and all.
///
/// # Errors
/// Returns a validation error if the embedded list is malformed.
pub fn hotels() -> Result<Vec<Row>, SyncError> {
    parse_records("hotels.json", HOTELS_JSON)
}

/// The transport options as authored.
///
/// # Errors
/// Returns a validation error if the embedded list is malformed.
pub fn transport() -> Result<Vec<Row>, SyncError> {
    parse_records("transport.json", TRANSPORT_JSON)
}
