//! Session controller: Browsing -> LoadingLyrics -> Projecting -> Browsing.
//!
//! The controller owns the active index and is the only writer of it. Key
//! handling goes through the keyboard registry, whose listener is owned by
//! the live [`Session`]; tearing the session down drops the listener before
//! the phase returns to Browsing.

use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;

use crate::projection::cursor::{ActiveIndex, Transition};
use crate::projection::fullscreen::{self, FullscreenControl, FullscreenError};
use crate::projection::keyboard::{Command, KeyboardRegistry, ListenerGuard};
use crate::projection::layout::{LineLayout, layout_lines};
use crate::projection::lines::LineStore;
use crate::projection::render::{VisualState, project};
use crate::projection::scroll::{ScrollError, ScrollSynchronizer};
use crate::source::{FetchError, FetchResult, Song};

/// Identifies one lyrics request. A response is applied only if its ticket
/// is the one the controller is still waiting for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub request: u64,
    pub song_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Escape key.
    Escape,
    /// The on-screen close control.
    CloseControl,
    /// Another song was projected over this one.
    Replaced,
    /// The app is exiting.
    Shutdown,
    /// Credentials were rejected or cleared; back to the login form.
    SignedOut,
}

pub type OnClose = Box<dyn FnOnce(CloseReason) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Browsing,
    LoadingLyrics,
    Projecting,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Projecting,
    Failed(FetchError),
    /// Response for a request that is no longer awaited; nothing changed.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Consumed,
    PassThrough,
}

/// A live projection of one song.
pub struct Session {
    song: Song,
    lines: LineStore,
    cursor: ActiveIndex,
    scroll: ScrollSynchronizer,
    layout: Option<LineLayout>,
    hovered: Option<usize>,
    on_close: Option<OnClose>,
    listener: ListenerGuard,
}

impl Session {
    fn open(
        song: Song,
        lines: LineStore,
        listener: ListenerGuard,
        on_close: OnClose,
        scroll_duration: Duration,
    ) -> Self {
        Self {
            cursor: ActiveIndex::new(lines.len()),
            song,
            lines,
            scroll: ScrollSynchronizer::new(scroll_duration),
            layout: None,
            hovered: None,
            on_close: Some(on_close),
            listener,
        }
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    pub fn lines(&self) -> &LineStore {
        &self.lines
    }

    pub fn active(&self) -> Option<usize> {
        self.cursor.get()
    }

    #[cfg(test)]
    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn layout(&self) -> Option<&LineLayout> {
        self.layout.as_ref()
    }

    #[cfg(test)]
    pub fn scroll(&self) -> &ScrollSynchronizer {
        &self.scroll
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll.offset()
    }

    pub fn visual_state(&self, index: usize) -> VisualState {
        project(index, self.active(), self.hovered == Some(index))
    }

    /// Line under a viewport row, using the current scroll offset.
    pub fn line_at_row(&self, viewport_row: usize) -> Option<usize> {
        self.layout
            .as_ref()
            .and_then(|l| l.line_at(self.scroll.offset() + viewport_row))
    }

    fn apply(&mut self, transition: Transition, now: Instant) -> Option<usize> {
        let moved = self.cursor.apply(transition)?;
        // The column is about to scroll out from under the pointer.
        self.hovered = None;
        match self.scroll.request(moved, now) {
            Ok(_) => {}
            Err(ScrollError::TargetMissing(line)) => {
                tracing::trace!(line, "scroll target not bound yet; skipped");
            }
        }
        Some(moved)
    }

    /// Lay the lines out for a viewport, rebinding scroll targets when the
    /// size changed. The first layout and every resize snap to the active
    /// line.
    fn bind_layout(&mut self, width: u16, height: u16) {
        let fresh = self
            .layout
            .as_ref()
            .is_none_or(|l| l.width != width || l.viewport_height != usize::from(height));
        if !fresh {
            return;
        }
        let layout = layout_lines(&self.lines, width, height);
        self.scroll.bind(&layout);
        self.layout = Some(layout);
        if let Some(active) = self.cursor.get()
            && let Err(e) = self.scroll.snap_to(active)
        {
            tracing::trace!(error = %e, "snap skipped");
        }
    }
}

enum Phase {
    Browsing,
    LoadingLyrics {
        ticket: FetchTicket,
        song: Song,
        on_close: OnClose,
    },
    Projecting(Session),
}

pub struct SessionController {
    phase: Phase,
    keyboard: KeyboardRegistry,
    fullscreen: Box<dyn FullscreenControl + Send>,
    next_request: u64,
    scroll_duration: Duration,
}

impl SessionController {
    pub fn new(scroll_duration: Duration, fullscreen: Box<dyn FullscreenControl + Send>) -> Self {
        Self {
            phase: Phase::Browsing,
            keyboard: KeyboardRegistry::new(),
            fullscreen,
            next_request: 0,
            scroll_duration,
        }
    }

    pub fn state(&self) -> State {
        match self.phase {
            Phase::Browsing => State::Browsing,
            Phase::LoadingLyrics { .. } => State::LoadingLyrics,
            Phase::Projecting(_) => State::Projecting,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.phase {
            Phase::Projecting(s) => Some(s),
            _ => None,
        }
    }

    fn session_mut(&mut self) -> Option<&mut Session> {
        match &mut self.phase {
            Phase::Projecting(s) => Some(s),
            _ => None,
        }
    }

    /// Song whose lyrics are being fetched.
    pub fn loading_song(&self) -> Option<&Song> {
        match &self.phase {
            Phase::LoadingLyrics { song, .. } => Some(song),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn keyboard(&self) -> &KeyboardRegistry {
        &self.keyboard
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.is_active()
    }

    /// Start projecting `song`. A live session is torn down first. The
    /// returned ticket must accompany the lyrics response.
    pub fn enter_projection(&mut self, song: Song, on_close: OnClose) -> FetchTicket {
        if self.state() == State::Projecting {
            self.teardown(CloseReason::Replaced);
        }
        self.next_request += 1;
        let ticket = FetchTicket {
            request: self.next_request,
            song_id: song.id.clone(),
        };
        tracing::info!(request = ticket.request, song = %song.title, "loading lyrics");
        self.phase = Phase::LoadingLyrics {
            ticket: ticket.clone(),
            song,
            on_close,
        };
        ticket
    }

    /// Apply a lyrics response.
    pub fn lyrics_loaded(&mut self, ticket: &FetchTicket, result: FetchResult<Vec<String>>) -> LoadOutcome {
        let phase = std::mem::replace(&mut self.phase, Phase::Browsing);
        let (song, on_close) = match phase {
            Phase::LoadingLyrics {
                ticket: awaited,
                song,
                on_close,
            } if awaited == *ticket => (song, on_close),
            other => {
                self.phase = other;
                tracing::debug!(request = ticket.request, song_id = %ticket.song_id, "ignoring stale lyrics response");
                return LoadOutcome::Stale;
            }
        };

        match result {
            Ok(blocks) => {
                let lines = LineStore::from_fetched(blocks);
                tracing::info!(song = %song.title, lines = lines.len(), "projecting");
                let listener = self.keyboard.register();
                self.phase = Phase::Projecting(Session::open(
                    song,
                    lines,
                    listener,
                    on_close,
                    self.scroll_duration,
                ));
                LoadOutcome::Projecting
            }
            Err(e) => {
                tracing::warn!(song = %song.title, error = %e, "lyrics fetch failed");
                LoadOutcome::Failed(e)
            }
        }
    }

    /// Abandon an in-flight lyrics fetch. Its late response will be stale.
    pub fn cancel_loading(&mut self) -> Option<Song> {
        if self.state() != State::LoadingLyrics {
            return None;
        }
        match std::mem::replace(&mut self.phase, Phase::Browsing) {
            Phase::LoadingLyrics { ticket, song, .. } => {
                tracing::info!(request = ticket.request, "lyrics load cancelled");
                Some(song)
            }
            other => {
                self.phase = other;
                None
            }
        }
    }

    /// Leave projection. Returns false when nothing was projecting.
    pub fn close(&mut self, reason: CloseReason) -> bool {
        if self.state() != State::Projecting {
            return false;
        }
        self.teardown(reason);
        true
    }

    fn teardown(&mut self, reason: CloseReason) {
        let Phase::Projecting(session) = std::mem::replace(&mut self.phase, Phase::Browsing) else {
            return;
        };
        let Session {
            song,
            listener,
            on_close,
            ..
        } = session;
        drop(listener);

        if self.fullscreen.is_active()
            && let Err(e) = self.fullscreen.exit()
        {
            tracing::warn!(error = %e, "could not leave fullscreen on close");
        }
        tracing::info!(song = %song.title, ?reason, "projection closed");
        if let Some(cb) = on_close {
            cb(reason);
        }
    }

    /// Route a key press. Keys the projection does not bind pass through.
    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) -> KeyOutcome {
        let commands = self.keyboard.dispatch(&key);
        if commands.is_empty() {
            return KeyOutcome::PassThrough;
        }
        for command in commands {
            match command {
                Command::Next => {
                    self.transition(Transition::Next, now);
                }
                Command::Previous => {
                    self.transition(Transition::Previous, now);
                }
                Command::Close => {
                    self.close(CloseReason::Escape);
                }
            }
        }
        KeyOutcome::Consumed
    }

    /// Pointer selection of a line.
    pub fn jump_to(&mut self, index: usize, now: Instant) -> Option<usize> {
        self.transition(Transition::JumpTo(index), now)
    }

    fn transition(&mut self, transition: Transition, now: Instant) -> Option<usize> {
        let moved = self.session_mut()?.apply(transition, now);
        if let Some(index) = moved {
            tracing::debug!(?transition, index, "active line changed");
        }
        moved
    }

    pub fn hover(&mut self, index: Option<usize>) {
        if let Some(session) = self.session_mut() {
            session.hovered = index.filter(|&i| i < session.lines.len());
        }
    }

    /// Toggle native fullscreen. `Ok(None)` outside projection.
    pub fn toggle_fullscreen(&mut self) -> Result<Option<bool>, FullscreenError> {
        if self.state() != State::Projecting {
            return Ok(None);
        }
        let active = fullscreen::toggle(self.fullscreen.as_mut())?;
        tracing::info!(active, "fullscreen toggled");
        Ok(Some(active))
    }

    pub fn bind_layout(&mut self, width: u16, height: u16) {
        if let Some(session) = self.session_mut() {
            session.bind_layout(width, height);
        }
    }

    /// Advance scroll animation. True while more frames are needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.session_mut().is_some_and(|s| s.scroll.tick(now))
    }

    pub fn next_frame(&self, now: Instant) -> Option<Instant> {
        self.session().and_then(|s| s.scroll.next_frame(now))
    }
}
