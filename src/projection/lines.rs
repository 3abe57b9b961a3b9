//! Line store: the ordered, immutable lyric lines of the projected song.

use std::sync::Arc;

/// Ordered lyric lines for one projection session.
///
/// Cloning is cheap (shared slice). A new song gets a new store; lines are
/// never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineStore {
    lines: Arc<[String]>,
}

impl LineStore {
    /// Build a store from the blocks returned by the data layer.
    ///
    /// Every block becomes exactly one line. Carriage returns are dropped and
    /// embedded newlines/tabs collapse to a single space, the same way the
    /// block would read when laid out as one paragraph. Empty blocks stay as
    /// spacer lines.
    pub fn from_fetched(blocks: Vec<String>) -> Self {
        let lines: Vec<String> = blocks.into_iter().map(|b| normalize_block(&b)).collect();
        Self {
            lines: lines.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

fn normalize_block(block: &str) -> String {
    let mut out = String::with_capacity(block.len());
    let mut last_was_break = false;
    for ch in block.chars() {
        match ch {
            '\r' => {}
            '\n' | '\t' => {
                if !last_was_break {
                    out.push(' ');
                }
                last_was_break = true;
            }
            c => {
                out.push(c);
                last_was_break = false;
            }
        }
    }
    out
}
