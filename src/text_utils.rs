// src/text_utils.rs
// Single-line text editing for the search box and login form

use unicode_segmentation::UnicodeSegmentation;

const MASK: char = '•';

/// Editable single-line buffer. Deletion works on grapheme clusters so a
/// combined emoji or accented letter goes away in one keystroke.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
}

impl TextInput {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn push(&mut self, c: char) {
        if !c.is_control() {
            self.value.push(c);
        }
    }

    /// Remove the last grapheme. Returns false when already empty.
    pub fn pop(&mut self) -> bool {
        let Some((start, _)) = self.value.grapheme_indices(true).next_back() else {
            return false;
        };
        self.value.truncate(start);
        true
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    /// One mask character per grapheme.
    pub fn masked(&self) -> String {
        self.value.graphemes(true).map(|_| MASK).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn pop_removes_whole_grapheme() {
        let mut input = TextInput::new("ae\u{301}");
        assert!(input.pop());
        assert_eq!(input.value(), "a");
        assert!(input.pop());
        assert!(!input.pop());
        assert!(input.is_empty());
    }

    #[test]
    fn control_characters_are_ignored() {
        let mut input = TextInput::default();
        input.push('a');
        input.push('\n');
        input.push('\t');
        input.push('b');
        assert_eq!(input.value(), "ab");
    }

    #[test]
    fn mask_counts_graphemes() {
        let input = TextInput::new("se\u{301}cret");
        assert_eq!(input.masked(), "••••••");
    }
}
