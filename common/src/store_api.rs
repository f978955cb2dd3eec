//! Blocking client for the PostgREST endpoint that hosts the reference tables.
//!
//! Every call is a single request with no retry. A hung request is bounded only by the
//! configured timeout.

use crate::config::StoreConfig;
use crate::{CLIENT_VERSION, Row, StoreError, SyncError};
use log::debug;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{AUTHORIZATION, CONTENT_RANGE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::Value;

/// Sort direction for an ordered select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    fn as_query(self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

/// An equality filter on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub column: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            value: value.into(),
        }
    }

    /// The filter in PostgREST query syntax, e.g. `eq.5`.
    fn as_query(&self) -> String {
        match &self.value {
            Value::Null => "is.null".to_string(),
            Value::String(s) => format!("eq.{s}"),
            other => format!("eq.{other}"),
        }
    }

    /// Evaluate the filter against a row already in memory.
    /// Numbers compare by value, so `5` matches `5.0`.
    pub fn matches(&self, row: &Row) -> bool {
        match (row.get(&self.column), &self.value) {
            (None | Some(Value::Null), Value::Null) => true,
            (Some(Value::Number(a)), Value::Number(b)) => a.as_f64() == b.as_f64(),
            (Some(a), b) => a == b,
            (None, _) => false,
        }
    }
}

/// A read request against one table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Select {
    pub table: String,
    /// Empty selects every column.
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Select {
    pub fn all(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };
        let mut pairs = vec![("select".to_string(), columns)];
        pairs.extend(filter_pairs(&self.filters));
        if let Some((column, direction)) = &self.order {
            pairs.push((
                "order".to_string(),
                format!("{column}.{}", direction.as_query()),
            ));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

fn filter_pairs(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column.clone(), f.as_query()))
        .collect()
}

/// The narrow request/response contract the maintenance routines need from a store.
pub trait RemoteStore {
    /// Fetch rows matching the request.
    ///
    /// # Errors
    /// Returns an error if the store cannot be reached, rejects the request, or returns an unreadable body.
    fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError>;

    /// Remove every row of a table.
    ///
    /// # Errors
    /// Returns an error if the store cannot be reached or rejects the delete.
    fn delete_all(&self, table: &str) -> Result<(), StoreError>;

    /// Insert all rows in one request and return them as stored.
    ///
    /// # Errors
    /// Returns an error if the store cannot be reached, rejects the insert, or returns an unreadable body.
    fn insert(&self, table: &str, rows: &[Row]) -> Result<Vec<Row>, StoreError>;

    /// Count rows matching the filters without transferring them.
    ///
    /// # Errors
    /// Returns an error if the store cannot be reached, rejects the request, or omits the total.
    fn count(&self, table: &str, filters: &[Filter]) -> Result<u64, StoreError>;
}

/// Helper function to classify reqwest error types
fn error_type_str(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection"
    } else if e.is_request() {
        "request/DNS"
    } else if e.is_builder() {
        "builder"
    } else if e.is_redirect() {
        "redirect"
    } else {
        "unknown"
    }
}

/// Error body returned by PostgREST on a rejected request.
#[derive(Debug, Deserialize)]
struct PostgrestError {
    message: Option<String>,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// Pull a readable message out of a rejected response body.
fn rejection_message(body: &str) -> String {
    if let Ok(err) = serde_json::from_str::<PostgrestError>(body)
        && let Some(message) = err.message
    {
        let mut msg = match err.code {
            Some(code) => format!("{message} [{code}]"),
            None => message,
        };
        if let Some(details) = err.details {
            msg.push_str(&format!("; {details}"));
        }
        if let Some(hint) = err.hint {
            msg.push_str(&format!("; hint: {hint}"));
        }
        return msg;
    }
    let body = body.trim();
    if body.is_empty() {
        "no response body".to_string()
    } else {
        body.to_string()
    }
}

/// Read the total out of a `Content-Range` header such as `0-9/10` or `*/0`.
pub fn parse_content_range(header: &str) -> Option<u64> {
    let (_, total) = header.rsplit_once('/')?;
    total.trim().parse().ok()
}

/// Send a request, turning network failures and non-2xx statuses into store errors.
fn send(request: RequestBuilder) -> Result<Response, StoreError> {
    let response = request.send().map_err(|e| StoreError::Unreachable {
        kind: error_type_str(&e),
        message: e.to_string(),
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(StoreError::Rejected {
        status: status.as_u16(),
        message: rejection_message(&body),
    })
}

fn decode_rows(response: Response) -> Result<Vec<Row>, StoreError> {
    response
        .json::<Vec<Row>>()
        .map_err(|e| StoreError::Decode(e.to_string()))
}

/// A store client speaking PostgREST over HTTPS.
/// Built once per run and passed by reference to whatever needs it.
pub struct RestStore {
    client: Client,
    base_url: String,
}

impl RestStore {
    /// Build the HTTP client. No request is sent until a store method is called.
    ///
    /// # Errors
    /// Returns a configuration error if the key cannot be sent as a header or the client cannot be built.
    pub fn new(config: &StoreConfig) -> Result<Self, SyncError> {
        let invalid_key = |_| {
            SyncError::Configuration(
                "store key contains characters not allowed in a header".to_string(),
            )
        };

        let mut api_key = HeaderValue::from_str(&config.api_key).map_err(invalid_key)?;
        api_key.set_sensitive(true);
        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", config.api_key)).map_err(invalid_key)?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", api_key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(format!("tripdata/{CLIENT_VERSION}"))
            .default_headers(headers)
            .build()
            .map_err(|e| SyncError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.url.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }
}

impl RemoteStore for RestStore {
    fn select(&self, query: &Select) -> Result<Vec<Row>, StoreError> {
        let url = self.table_url(&query.table);
        debug!("GET {url} {:?}", query.query_pairs());
        let response = send(self.client.get(&url).query(&query.query_pairs()))?;
        decode_rows(response)
    }

    fn delete_all(&self, table: &str) -> Result<(), StoreError> {
        // PostgREST refuses a DELETE without a filter and has no truncate, so this predicate
        // is always true. Every row has a non-null primary key.
        let url = self.table_url(table);
        debug!("DELETE {url} id=not.is.null");
        send(
            self.client
                .delete(&url)
                .query(&[("id", "not.is.null")])
                .header("Prefer", "return=minimal"),
        )?;
        Ok(())
    }

    fn insert(&self, table: &str, rows: &[Row]) -> Result<Vec<Row>, StoreError> {
        let url = self.table_url(table);
        debug!("POST {url} ({} rows)", rows.len());
        let response = send(
            self.client
                .post(&url)
                .header("Prefer", "return=representation")
                .json(rows),
        )?;
        decode_rows(response)
    }

    fn count(&self, table: &str, filters: &[Filter]) -> Result<u64, StoreError> {
        let url = self.table_url(table);
        debug!("HEAD {url} count=exact");
        let response = send(
            self.client
                .head(&url)
                .query(&filter_pairs(filters))
                .header("Prefer", "count=exact"),
        )?;

        let header = response
            .headers()
            .get(CONTENT_RANGE)
            .ok_or_else(|| {
                StoreError::Decode("response has no Content-Range header".to_string())
            })?
            .to_str()
            .map_err(|e| StoreError::Decode(format!("unreadable Content-Range header: {e}")))?;
        parse_content_range(header).ok_or_else(|| {
            StoreError::Decode(format!("no total in Content-Range header: {header}"))
        })
    }
}
