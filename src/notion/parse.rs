//! Turning Notion pages and blocks into songs and lyric lines.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::notion::client::Schema;
use crate::notion::types::{Block, Page};
use crate::source::Song;

pub const DEFAULT_GROUP: &str = "Uncategorized";

static NOTION_ID_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r"(?i)([0-9a-f]{8})-?([0-9a-f]{4})-?([0-9a-f]{4})-?([0-9a-f]{4})-?([0-9a-f]{12})",
    )
    .ok()
});

/// Songs from database rows. Rows without a title are dropped; a missing
/// group falls back to [`DEFAULT_GROUP`].
pub fn songs_from_pages(pages: Vec<Page>, schema: &Schema) -> Vec<Song> {
    pages
        .into_iter()
        .filter_map(|page| {
            let title = page
                .properties
                .get(&schema.title_property)
                .and_then(|p| p.pointer("/title/0/plain_text"))
                .and_then(|v| v.as_str())
                .filter(|t| !t.is_empty())?
                .to_string();
            let group = page
                .properties
                .get(&schema.group_property)
                .and_then(|p| p.pointer("/select/name"))
                .and_then(|v| v.as_str())
                .unwrap_or(DEFAULT_GROUP)
                .to_string();
            Some(Song {
                id: page.id,
                title,
                group,
            })
        })
        .collect()
}

/// Lyric lines from page blocks: one line per paragraph, rich-text runs
/// joined. Blank paragraphs are kept; other block types are skipped.
pub fn lines_from_blocks(blocks: Vec<Block>) -> Vec<String> {
    blocks
        .into_iter()
        .filter(|b| b.kind == "paragraph")
        .map(|b| {
            b.paragraph
                .map(|p| p.rich_text.into_iter().map(|t| t.plain_text).collect())
                .unwrap_or_default()
        })
        .collect()
}

/// Extract a Notion object id from a raw id or a share URL, in dashed
/// lowercase form. For URLs the path id wins over `?v=` view ids.
pub fn normalize_notion_id(input: &str) -> Option<String> {
    let trimmed = input.trim();
    let path = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
    let caps = NOTION_ID_RE.as_ref()?.captures_iter(path).last()?;
    let parts: Vec<String> = (1..=5)
        .filter_map(|i| caps.get(i).map(|m| m.as_str().to_ascii_lowercase()))
        .collect();
    Some(parts.join("-"))
}
