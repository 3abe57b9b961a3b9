use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::notion::parse::{lines_from_blocks, songs_from_pages};
use crate::notion::types::{ApiErrorBody, Block, NotionError, Page, Paginated, http_client};
use crate::source::{Credentials, FetchResult, Song, SongSource};

pub const NOTION_API: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u32 = 100;

/// Which database properties hold a song's title and group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub title_property: String,
    pub group_property: String,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            title_property: "Music".to_string(),
            group_property: "Group".to_string(),
        }
    }
}

/// Songs and lyrics read straight from the Notion API.
#[derive(Debug, Clone)]
pub struct NotionSource {
    base_url: String,
    schema: Schema,
}

impl NotionSource {
    pub fn new(schema: Schema) -> Self {
        Self {
            base_url: NOTION_API.to_string(),
            schema,
        }
    }

    /// Every row of the database, sorted ascending by title, across all
    /// result pages.
    pub async fn query_database(&self, creds: &Credentials) -> Result<Vec<Page>, NotionError> {
        if !creds.is_complete() {
            return Err(NotionError::MissingCredentials);
        }
        let url = format!(
            "{}/databases/{}/query",
            self.base_url,
            urlencoding::encode(creds.database_id.trim())
        );
        let mut rows = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut body = json!({
                "page_size": PAGE_SIZE,
                "sorts": [{ "property": self.schema.title_property, "direction": "ascending" }],
            });
            if let Some(c) = &cursor {
                body["start_cursor"] = json!(c);
            }
            let req = authorized(http_client().post(&url), creds).json(&body);
            let page: Paginated<Page> = send(req).await?;
            tracing::debug!(rows = page.results.len(), has_more = page.has_more, "database page");
            rows.extend(page.results);
            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }
        Ok(rows)
    }

    /// All child blocks of a page, in document order, across result pages.
    pub async fn list_children(
        &self,
        creds: &Credentials,
        block_id: &str,
    ) -> Result<Vec<Block>, NotionError> {
        if creds.token.trim().is_empty() {
            return Err(NotionError::MissingCredentials);
        }
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let mut url = format!(
                "{}/blocks/{}/children?page_size={}",
                self.base_url,
                urlencoding::encode(block_id),
                PAGE_SIZE
            );
            if let Some(c) = &cursor {
                url.push_str(&format!("&start_cursor={}", urlencoding::encode(c)));
            }
            let page: Paginated<Block> = send(authorized(http_client().get(&url), creds)).await?;
            tracing::debug!(blocks = page.results.len(), has_more = page.has_more, "block page");
            blocks.extend(page.results);
            match page.next_cursor {
                Some(next) if page.has_more => cursor = Some(next),
                _ => break,
            }
        }
        Ok(blocks)
    }
}

impl SongSource for NotionSource {
    async fn fetch_songs(&self, creds: &Credentials) -> FetchResult<Vec<Song>> {
        let pages = self.query_database(creds).await?;
        Ok(songs_from_pages(pages, &self.schema))
    }

    async fn fetch_lyrics(&self, creds: &Credentials, song_id: &str) -> FetchResult<Vec<String>> {
        if song_id.trim().is_empty() {
            return Err(crate::source::FetchError::Data("Missing song ID".to_string()));
        }
        let blocks = self.list_children(creds, song_id).await?;
        Ok(lines_from_blocks(blocks))
    }
}

fn authorized(req: RequestBuilder, creds: &Credentials) -> RequestBuilder {
    req.bearer_auth(creds.token.trim())
        .header("Notion-Version", NOTION_VERSION)
}

async fn send<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, NotionError> {
    let resp = req.send().await?;
    let status = resp.status();
    if status.is_success() {
        let text = resp.text().await?;
        return Ok(serde_json::from_str(&text)?);
    }
    let text = resp.text().await.unwrap_or_default();
    Err(status_error(status, &text))
}

/// Map a non-success response to an error. 401/403 are credential problems.
fn status_error(status: StatusCode, body: &str) -> NotionError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| {
            if b.message.is_empty() {
                b.code
            } else {
                b.message
            }
        })
        .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown error").to_string());
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => NotionError::Unauthorized {
            status: status.as_u16(),
            message,
        },
        _ => NotionError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
