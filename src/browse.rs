//! Song list with group filter and title search.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::source::Song;
use crate::text_utils::TextInput;

pub const ALL_GROUPS: &str = "All";

/// What the app should do after a key in the browsing view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseAction {
    None,
    Project(Song),
    Reload,
    Logout,
}

#[derive(Debug, Default)]
pub struct BrowseState {
    songs: Vec<Song>,
    search: TextInput,
    group: usize,
    selected: usize,
    loading: bool,
}

impl BrowseState {
    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn search(&self) -> &str {
        self.search.value()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Song list fetch in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn set_songs(&mut self, songs: Vec<Song>) {
        let group = self.active_group().to_string();
        self.songs = songs;
        self.loading = false;
        let kept = self.groups().iter().position(|g| *g == group);
        self.group = kept.unwrap_or(0);
        self.clamp_selection();
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// `All` followed by each distinct group in first-seen order.
    pub fn groups(&self) -> Vec<&str> {
        let mut groups = vec![ALL_GROUPS];
        for song in &self.songs {
            if !groups.contains(&song.group.as_str()) {
                groups.push(&song.group);
            }
        }
        groups
    }

    pub fn active_group(&self) -> &str {
        self.groups().get(self.group).copied().unwrap_or(ALL_GROUPS)
    }

    pub fn filtered(&self) -> Vec<&Song> {
        let needle = self.search.value().to_lowercase();
        let group = self.active_group();
        self.songs
            .iter()
            .filter(|s| s.title.to_lowercase().contains(&needle))
            .filter(|s| group == ALL_GROUPS || s.group == group)
            .collect()
    }

    pub fn selected_song(&self) -> Option<&Song> {
        self.filtered().get(self.selected).copied()
    }

    /// Song at a row of the filtered list, for pointer selection.
    pub fn song_at(&self, row: usize) -> Option<Song> {
        self.filtered().get(row).map(|s| (*s).clone())
    }

    /// Move the selection onto a song if the current filter shows it.
    pub fn focus_song(&mut self, song_id: &str) {
        if let Some(row) = self.filtered().iter().position(|s| s.id == song_id) {
            self.selected = row;
        }
    }

    pub fn select(&mut self, row: usize) {
        self.selected = row;
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        let len = self.filtered().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    fn cycle_group(&mut self, forward: bool) {
        let count = self.groups().len();
        self.group = if forward {
            (self.group + 1) % count
        } else {
            (self.group + count - 1) % count
        };
        self.selected = 0;
        tracing::debug!(group = self.active_group(), "group filter changed");
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> BrowseAction {
        if key.kind != KeyEventKind::Press {
            return BrowseAction::None;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('r') if ctrl => return BrowseAction::Reload,
            KeyCode::Char('l') if ctrl => return BrowseAction::Logout,
            KeyCode::Char(_) if ctrl => {}
            KeyCode::Up => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down => {
                self.selected += 1;
                self.clamp_selection();
            }
            KeyCode::Enter => {
                if let Some(song) = self.selected_song() {
                    return BrowseAction::Project(song.clone());
                }
            }
            KeyCode::Tab => self.cycle_group(true),
            KeyCode::BackTab => self.cycle_group(false),
            KeyCode::Backspace => {
                if self.search.pop() {
                    self.clamp_selection();
                }
            }
            KeyCode::Esc => {
                self.search.clear();
                self.clamp_selection();
            }
            KeyCode::Char(c) => {
                self.search.push(c);
                self.clamp_selection();
            }
            _ => {}
        }
        BrowseAction::None
    }
}
