//! A library with common utilities for seeding, inspecting and verifying the trip reference tables.

pub mod config;
pub mod error;
pub mod report;
pub mod source_data;
pub mod store_api;
pub mod sync;
pub mod transform;
pub mod verify;

#[cfg(test)]
mod test_store;

pub use error::{StoreError, SyncError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const HOTELS_TABLE: &str = "hotels";
pub const TRANSPORT_TABLE: &str = "transport_options";
pub const ATTRACTIONS_TABLE: &str = "attractions";

/// A single row as exchanged with the store, keyed by column name.
pub type Row = Map<String, Value>;

/// A hotel as stored in the hotels table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotelRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub stars: u8,
    /// Display range such as "147–294 AED", kept as authored.
    pub cost_per_night: String,
    pub category: String,
    pub image_url: String,
    pub description: String,
}

/// A transport option as stored in the transport table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub transport_id: String,
    pub label: String,
    pub cost_per_day: f64,
    pub image_url: String,
}

/// An attraction. Only ever read, never synchronized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttractionRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub emirate: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}
