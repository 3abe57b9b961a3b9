//! Notion-backed song source.

pub mod client;
pub mod parse;
pub mod types;

pub use client::{NotionSource, Schema};
pub use parse::normalize_notion_id;
