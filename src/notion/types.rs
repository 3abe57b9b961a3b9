use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use crate::source::FetchError;

// Shared HTTP client with reasonable defaults for timeouts
static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("lyricsproj/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default HTTP client");
            Client::new()
        })
});

pub(crate) fn http_client() -> &'static Client {
    &HTTP_CLIENT
}

#[derive(Error, Debug)]
pub enum NotionError {
    #[error("Missing Notion credentials")]
    MissingCredentials,
    #[error("Notion rejected the credentials (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },
    #[error("Notion API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl From<NotionError> for FetchError {
    fn from(e: NotionError) -> Self {
        match e {
            NotionError::MissingCredentials | NotionError::Unauthorized { .. } => {
                FetchError::Auth(e.to_string())
            }
            other => FetchError::Data(other.to_string()),
        }
    }
}

/// One page of a paginated list endpoint.
#[derive(Debug, Deserialize)]
pub struct Paginated<T> {
    pub results: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

/// A database row. Properties stay untyped: their shape depends on the
/// property type configured in the database.
#[derive(Debug, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: String,
    pub paragraph: Option<Paragraph>,
}

#[derive(Debug, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
}

#[derive(Debug, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

/// Error body returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
