//! Terminal app: login, browsing and projection over one event loop.
//!
//! The event loop uses `tokio::select!` to handle:
//! - terminal input forwarded from the input thread
//! - fetch responses from the worker
//! - projection close notifications
//! - animation frames and notice expiry

use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Position, Rect};
use ratatui::{Frame, Terminal};
use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

use crate::browse::{BrowseAction, BrowseState};
use crate::config::{self, Settings};
use crate::event::{self, AppEvent, on_close_notifier};
use crate::login::{LoginAction, LoginState};
use crate::pool::{self, FetchRequest, FetchResponse, SongsOrigin};
use crate::projection::{CloseReason, KeyOutcome, LoadOutcome, SessionController, State, TerminalFullscreen};
use crate::source::{Credentials, FetchError, FetchResult, Song, SongSource};
use crate::ui::browse_view::{draw_browse, row_at};
use crate::ui::login_view::draw_login;
use crate::ui::notice::{DEFAULT_TTL, LOGIN_FAILURE_TTL, NoticeKind, Notices, draw_notices};
use crate::ui::projection_view::{controls, draw_projection};
use crate::ui::styles::ViewStyles;

type BoxError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    /// Browsing, loading or projecting; the controller's state decides.
    Main,
}

pub struct App {
    view: View,
    controller: SessionController,
    browse: BrowseState,
    login: LoginState,
    credentials: Credentials,
    notices: Notices,
    styles: ViewStyles,
    config_path: PathBuf,
    requests: mpsc::Sender<FetchRequest>,
    app_tx: mpsc::Sender<AppEvent>,
    area: Rect,
    should_exit: bool,
}

impl App {
    pub fn new(
        controller: SessionController,
        credentials: Credentials,
        config_path: PathBuf,
        requests: mpsc::Sender<FetchRequest>,
        app_tx: mpsc::Sender<AppEvent>,
    ) -> Self {
        Self {
            view: View::Main,
            controller,
            browse: BrowseState::default(),
            login: LoginState::default(),
            credentials,
            notices: Notices::default(),
            styles: ViewStyles::default(),
            config_path,
            requests,
            app_tx,
            area: Rect::default(),
            should_exit: false,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn controller(&self) -> &SessionController {
        &self.controller
    }

    pub fn browse(&self) -> &BrowseState {
        &self.browse
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn should_exit(&self) -> bool {
        self.should_exit
    }

    /// Fetch the song list with known credentials, or ask for them.
    pub fn start(&mut self, now: Instant) {
        if self.credentials.is_complete() {
            let creds = self.credentials.clone();
            self.request_songs(creds, SongsOrigin::Startup, now);
        } else {
            self.show_login();
        }
    }

    /// Leave projection so fullscreen is released before the terminal is
    /// restored.
    pub fn shutdown(&mut self) {
        self.controller.cancel_loading();
        self.controller.close(CloseReason::Shutdown);
    }

    fn send(&mut self, request: FetchRequest, now: Instant) -> bool {
        match self.requests.try_send(request) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "fetch request not queued");
                self.notices.error("Request failed", "the fetch worker is busy or gone", now);
                false
            }
        }
    }

    fn request_songs(&mut self, creds: Credentials, origin: SongsOrigin, now: Instant) {
        if !matches!(origin, SongsOrigin::Login { .. }) {
            self.browse.set_loading(true);
        }
        if !self.send(FetchRequest::Songs { creds, origin }, now) {
            self.browse.set_loading(false);
            self.login.finish_submit();
        }
    }

    fn show_login(&mut self) {
        self.controller.cancel_loading();
        self.controller.close(CloseReason::SignedOut);
        self.browse.clear();
        self.login = LoginState::with_credentials(&Credentials::new("", self.credentials.database_id.clone()));
        self.view = View::Login;
    }

    fn auth_failed(&mut self, error: FetchError, now: Instant) {
        tracing::warn!(error = %error, "authentication rejected; back to login");
        let reason = match error {
            FetchError::Auth(msg) | FetchError::Data(msg) => msg,
        };
        self.show_login();
        self.notices
            .push(NoticeKind::Error, "Authentication invalid", Some(reason), DEFAULT_TTL, now);
    }

    fn logout(&mut self, now: Instant) {
        if let Err(e) = config::clear_credentials(&self.config_path) {
            tracing::warn!(error = %e, "could not clear saved credentials");
            self.notices.error("Could not clear saved credentials", e, now);
        }
        self.credentials = Credentials::default();
        self.show_login();
        self.notices.info("Signed out", now);
    }

    fn project(&mut self, song: Song, now: Instant) {
        let on_close = on_close_notifier(self.app_tx.clone(), song.id.clone());
        let ticket = self.controller.enter_projection(song, on_close);
        let creds = self.credentials.clone();
        if !self.send(FetchRequest::Lyrics { ticket, creds }, now) {
            self.controller.cancel_loading();
        }
    }

    fn toggle_fullscreen(&mut self, now: Instant) {
        if let Err(e) = self.controller.toggle_fullscreen() {
            tracing::warn!(error = %e, "fullscreen toggle failed");
            self.notices.error("Fullscreen unavailable", e, now);
        }
    }

    pub fn handle_event(&mut self, event: Event, now: Instant) {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => self.handle_key(key, now),
            Event::Mouse(mouse) => self.handle_mouse(mouse, now),
            Event::Resize(w, h) => {
                self.area = Rect::new(0, 0, w, h);
                self.controller.bind_layout(w, h);
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => {
                self.should_exit = true;
                return;
            }
            KeyCode::Char('x') if ctrl => {
                self.notices.dismiss_all();
                return;
            }
            _ => {}
        }

        if self.view == View::Login {
            match self.login.handle_key(key) {
                LoginAction::Submit { creds, remember } => {
                    self.request_songs(creds, SongsOrigin::Login { remember }, now);
                }
                LoginAction::Invalid(msg) => {
                    self.notices
                        .push(NoticeKind::Error, "Login failed", Some(msg), LOGIN_FAILURE_TTL, now);
                }
                LoginAction::None => {}
            }
            return;
        }

        match self.controller.state() {
            State::Projecting => {
                if key.code == KeyCode::Char('f') && !ctrl {
                    if key.kind == KeyEventKind::Press {
                        self.toggle_fullscreen(now);
                    }
                } else if self.controller.handle_key(key, now) == KeyOutcome::PassThrough {
                    tracing::trace!(code = ?key.code, "key ignored while projecting");
                }
            }
            State::LoadingLyrics => {
                if key.code == KeyCode::Esc
                    && let Some(song) = self.controller.cancel_loading()
                {
                    self.notices.info(format!("Stopped loading {}", song.title), now);
                }
            }
            State::Browsing => match self.browse.handle_key(key) {
                BrowseAction::Project(song) => self.project(song, now),
                BrowseAction::Reload => {
                    let creds = self.credentials.clone();
                    self.request_songs(creds, SongsOrigin::Reload, now);
                }
                BrowseAction::Logout => self.logout(now),
                BrowseAction::None => {}
            },
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        let pos = Position::new(mouse.column, mouse.row);
        let viewport_row = usize::from(mouse.row.saturating_sub(self.area.y));
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if self.notices.dismiss_at(self.area, pos) || self.view != View::Main {
                    return;
                }
                match self.controller.state() {
                    State::Projecting => {
                        let ctl = controls(self.area, self.controller.is_fullscreen());
                        if ctl.close.contains(pos) {
                            self.controller.close(CloseReason::CloseControl);
                        } else if ctl.fullscreen.contains(pos) {
                            self.toggle_fullscreen(now);
                        } else if let Some(line) = self
                            .controller
                            .session()
                            .and_then(|s| s.line_at_row(viewport_row))
                        {
                            self.controller.jump_to(line, now);
                        }
                    }
                    State::Browsing => {
                        if let Some(row) = row_at(self.area, &self.browse, pos)
                            && let Some(song) = self.browse.song_at(row)
                        {
                            self.browse.select(row);
                            self.project(song, now);
                        }
                    }
                    State::LoadingLyrics => {}
                }
            }
            MouseEventKind::Moved if self.controller.state() == State::Projecting => {
                let hovered = self
                    .controller
                    .session()
                    .and_then(|s| s.line_at_row(viewport_row));
                self.controller.hover(hovered);
            }
            _ => {}
        }
    }

    pub fn handle_fetch(&mut self, response: FetchResponse, now: Instant) {
        match response {
            FetchResponse::Songs {
                creds,
                origin,
                result,
            } => self.songs_loaded(creds, origin, result, now),
            FetchResponse::Lyrics { ticket, result } => match self.controller.lyrics_loaded(&ticket, result) {
                LoadOutcome::Projecting => {
                    if self.area.area() > 0 {
                        self.controller.bind_layout(self.area.width, self.area.height);
                    }
                }
                LoadOutcome::Failed(e) if e.is_auth() => self.auth_failed(e, now),
                LoadOutcome::Failed(e) => self.notices.error("Could not load lyrics", e, now),
                LoadOutcome::Stale => {}
            },
        }
    }

    fn songs_loaded(
        &mut self,
        creds: Credentials,
        origin: SongsOrigin,
        result: FetchResult<Vec<Song>>,
        now: Instant,
    ) {
        if let SongsOrigin::Login { remember } = origin {
            self.login.finish_submit();
            match result {
                Ok(songs) => {
                    if remember && let Err(e) = config::save_credentials(&self.config_path, &creds) {
                        tracing::warn!(error = %e, "could not save credentials");
                        self.notices.error("Could not save credentials", e, now);
                    }
                    self.credentials = creds;
                    self.browse.set_songs(songs);
                    self.view = View::Main;
                    self.notices.success("Login successful", now);
                }
                Err(e) => {
                    self.notices
                        .push(NoticeKind::Error, "Login failed", Some(e.to_string()), LOGIN_FAILURE_TTL, now);
                }
            }
            return;
        }

        if creds != self.credentials || self.view == View::Login {
            tracing::debug!(?origin, "ignoring song list for replaced credentials");
            return;
        }
        match result {
            Ok(songs) => {
                if origin == SongsOrigin::Reload {
                    self.notices.info(format!("{} songs loaded", songs.len()), now);
                }
                self.browse.set_songs(songs);
            }
            Err(e) if e.is_auth() => self.auth_failed(e, now),
            Err(e) => {
                self.browse.set_loading(false);
                self.notices.error("Could not load songs", e, now);
            }
        }
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ProjectionClosed { song_id, reason } => {
                tracing::debug!(%song_id, ?reason, "back to browsing");
                self.browse.focus_song(&song_id);
            }
        }
    }

    /// Advance time-driven state. True while the scroll is still moving.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.notices.expire(now);
        self.controller.tick(now)
    }

    /// Next instant the loop must wake up without input.
    pub fn next_deadline(&self, now: Instant) -> Option<Instant> {
        [self.controller.next_frame(now), self.notices.next_expiry()]
            .into_iter()
            .flatten()
            .min()
    }

    pub fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        self.area = area;
        match self.view {
            View::Login => draw_login(frame, area, &self.login, &self.styles),
            View::Main => {
                if self.controller.state() == State::Projecting {
                    self.controller.bind_layout(area.width, area.height);
                }
                match self.controller.session() {
                    Some(session) => draw_projection(
                        frame,
                        area,
                        session,
                        self.controller.is_fullscreen(),
                        &self.styles,
                    ),
                    None => draw_browse(
                        frame,
                        area,
                        &self.browse,
                        self.controller.loading_song(),
                        &self.styles,
                    ),
                }
            }
        }
        draw_notices(frame, area, &self.notices, &self.styles);
    }
}

fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}

/// Run the interactive app until the user quits.
pub async fn run<S: SongSource>(source: S, settings: Settings) -> Result<(), BoxError> {
    let (request_tx, request_rx) = mpsc::channel(16);
    let (response_tx, mut response_rx) = mpsc::channel(16);
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    tokio::spawn(pool::listen(Arc::new(source), request_rx, response_tx, shutdown_rx));

    let (app_tx, mut app_rx) = mpsc::channel(16);
    let (input_tx, mut input_rx) = mpsc::channel(64);
    event::spawn_input_thread(input_tx);

    let controller = SessionController::new(settings.scroll_duration, Box::new(TerminalFullscreen::stdout()));
    let mut app = App::new(controller, settings.credentials, settings.config_path, request_tx, app_tx);

    enable_raw_mode().map_err(to_boxed_err)?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture).map_err(to_boxed_err)?;
    install_panic_hook();
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout)).map_err(to_boxed_err)?;

    app.start(Instant::now());
    let result = event_loop(&mut terminal, &mut app, &mut input_rx, &mut response_rx, &mut app_rx).await;

    app.shutdown();
    let _ = shutdown_tx.send(()).await;
    disable_raw_mode().map_err(to_boxed_err)?;
    execute!(terminal.backend_mut(), DisableMouseCapture, LeaveAlternateScreen).map_err(to_boxed_err)?;
    terminal.show_cursor().map_err(to_boxed_err)?;
    result
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    input_rx: &mut mpsc::Receiver<Event>,
    response_rx: &mut mpsc::Receiver<FetchResponse>,
    app_rx: &mut mpsc::Receiver<AppEvent>,
) -> Result<(), BoxError> {
    while !app.should_exit() {
        terminal.draw(|f| app.draw(f)).map_err(to_boxed_err)?;
        let deadline = app.next_deadline(Instant::now());
        tokio::select! {
            biased;

            maybe_event = input_rx.recv() => match maybe_event {
                Some(event) => app.handle_event(event, Instant::now()),
                None => break,
            },

            Some(response) = response_rx.recv() => app.handle_fetch(response, Instant::now()),

            Some(event) = app_rx.recv() => app.handle_app_event(event),

            // Animation frame or notice expiry
            _ = async {
                match deadline {
                    Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
                    None => futures_util::future::pending::<()>().await,
                }
            } => {}
        }
        app.tick(Instant::now());
    }
    Ok(())
}

fn to_boxed_err<E: Error + Send + Sync + 'static>(e: E) -> BoxError {
    Box::new(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::test_helpers::render_to_string;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    struct Harness {
        app: App,
        requests: mpsc::Receiver<FetchRequest>,
        app_rx: mpsc::Receiver<AppEvent>,
        _config_dir: tempfile::TempDir,
    }

    fn harness(creds: Credentials) -> Harness {
        harness_with_fullscreen(creds, None)
    }

    fn harness_with_fullscreen(creds: Credentials, refusal: Option<String>) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let (request_tx, requests) = mpsc::channel(8);
        let (app_tx, app_rx) = mpsc::channel(8);
        let controller = SessionController::new(
            Duration::from_millis(500),
            Box::new(TerminalFullscreen::new(Vec::new(), refusal)),
        );
        let mut app = App::new(
            controller,
            creds,
            dir.path().join("config.toml"),
            request_tx,
            app_tx,
        );
        app.handle_event(Event::Resize(80, 24), Instant::now());
        Harness {
            app,
            requests,
            app_rx,
            _config_dir: dir,
        }
    }

    fn creds() -> Credentials {
        Credentials::new("ntn_token", "db")
    }

    fn songs() -> Vec<Song> {
        vec![
            Song {
                id: "a".into(),
                title: "Amazing Grace".into(),
                group: "Hymns".into(),
            },
            Song {
                id: "b".into(),
                title: "Oceans".into(),
                group: "Worship".into(),
            },
        ]
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    fn click(column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    impl Harness {
        fn press(&mut self, event: Event) {
            self.app.handle_event(event, Instant::now());
        }

        fn browsing_with_songs() -> Self {
            let mut h = harness(creds());
            h.app.start(Instant::now());
            h.requests.try_recv().unwrap();
            h.app.handle_fetch(
                FetchResponse::Songs {
                    creds: creds(),
                    origin: SongsOrigin::Startup,
                    result: Ok(songs()),
                },
                Instant::now(),
            );
            h
        }

        /// Answer the pending lyrics request.
        fn deliver_lyrics(&mut self, result: FetchResult<Vec<String>>) {
            match self.requests.try_recv().unwrap() {
                FetchRequest::Lyrics { ticket, creds: c } => {
                    assert_eq!(c, creds());
                    self.app
                        .handle_fetch(FetchResponse::Lyrics { ticket, result }, Instant::now());
                }
                other => panic!("expected lyrics request, got {other:?}"),
            }
        }

        fn notice_titles(&self) -> Vec<String> {
            self.app.notices().items().iter().map(|n| n.title.clone()).collect()
        }
    }

    fn lyrics(lines: &[&str]) -> FetchResult<Vec<String>> {
        Ok(lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn startup_without_credentials_shows_login() {
        let mut h = harness(Credentials::default());
        h.app.start(Instant::now());
        assert_eq!(h.app.view(), View::Login);
        assert!(h.requests.try_recv().is_err());
    }

    #[test]
    fn startup_with_credentials_fetches_songs() {
        let mut h = harness(creds());
        h.app.start(Instant::now());
        assert!(h.app.browse().is_loading());
        assert!(matches!(
            h.requests.try_recv().unwrap(),
            FetchRequest::Songs {
                origin: SongsOrigin::Startup,
                ..
            }
        ));
    }

    #[test]
    fn select_project_navigate_and_escape() {
        let mut h = Harness::browsing_with_songs();
        assert_eq!(h.app.browse().songs().len(), 2);
        h.press(key(KeyCode::Down));
        h.press(key(KeyCode::Enter));
        assert_eq!(h.app.controller().state(), State::LoadingLyrics);
        h.deliver_lyrics(lyrics(&["You call me out", "upon the waters", "the great unknown"]));
        assert_eq!(h.app.controller().state(), State::Projecting);

        h.press(key(KeyCode::Right));
        h.press(key(KeyCode::Right));
        h.press(key(KeyCode::Right));
        assert_eq!(h.app.controller().session().unwrap().active(), Some(2));

        h.press(key(KeyCode::Up));
        h.press(key(KeyCode::Esc));
        assert_eq!(h.app.controller().state(), State::Browsing);
        assert_eq!(h.app.controller().keyboard().listener_count(), 0);

        let closed = h.app_rx.try_recv().unwrap();
        assert_eq!(
            closed,
            AppEvent::ProjectionClosed {
                song_id: "b".into(),
                reason: CloseReason::Escape,
            }
        );
        h.app.handle_app_event(closed);
        assert_eq!(h.app.browse().selected(), 1);
    }

    #[test]
    fn escape_while_loading_cancels_and_late_lyrics_are_ignored() {
        let mut h = Harness::browsing_with_songs();
        h.press(key(KeyCode::Enter));
        h.press(key(KeyCode::Esc));
        assert_eq!(h.app.controller().state(), State::Browsing);
        h.deliver_lyrics(lyrics(&["late"]));
        assert_eq!(h.app.controller().state(), State::Browsing);
        assert_eq!(h.app.controller().keyboard().listener_count(), 0);
    }

    #[test]
    fn release_events_are_ignored() {
        let mut h = Harness::browsing_with_songs();
        let release = KeyEvent::new_with_kind(KeyCode::Enter, KeyModifiers::NONE, KeyEventKind::Release);
        h.press(Event::Key(release));
        assert_eq!(h.app.controller().state(), State::Browsing);
    }

    #[test]
    fn held_arrow_keeps_advancing_while_projecting() {
        let mut h = Harness::browsing_with_songs();
        h.press(key(KeyCode::Enter));
        h.deliver_lyrics(lyrics(&["one", "two", "three"]));
        let repeat = |code| Event::Key(KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Repeat));
        h.press(key(KeyCode::Down));
        h.press(repeat(KeyCode::Down));
        assert_eq!(h.app.controller().session().unwrap().active(), Some(2));
        h.press(repeat(KeyCode::Char('f')));
        assert!(!h.app.controller().is_fullscreen());
        h.press(repeat(KeyCode::Esc));
        assert_eq!(h.app.controller().state(), State::Projecting);
    }

    #[test]
    fn clicks_select_lines_and_close_control_closes() {
        let mut h = Harness::browsing_with_songs();
        // first song row sits below the four header rows
        h.press(click(5, 4));
        assert_eq!(h.app.controller().state(), State::LoadingLyrics);
        h.deliver_lyrics(lyrics(&["one", "two", "three"]));

        // 80x24: line 0 at row 12, line 2 at row 16
        h.press(click(10, 16));
        assert_eq!(h.app.controller().session().unwrap().active(), Some(2));
        h.press(click(10, 15));
        assert_eq!(h.app.controller().session().unwrap().active(), Some(2));

        let ctl = controls(Rect::new(0, 0, 80, 24), false);
        h.press(click(ctl.close.x, 0));
        assert_eq!(h.app.controller().state(), State::Browsing);
        assert_eq!(
            h.app_rx.try_recv().unwrap(),
            AppEvent::ProjectionClosed {
                song_id: "a".into(),
                reason: CloseReason::CloseControl,
            }
        );
    }

    #[test]
    fn fullscreen_key_and_exit_on_close() {
        let mut h = Harness::browsing_with_songs();
        h.press(key(KeyCode::Enter));
        h.deliver_lyrics(lyrics(&["one"]));
        h.press(key(KeyCode::Char('f')));
        assert!(h.app.controller().is_fullscreen());
        h.press(key(KeyCode::Esc));
        assert!(!h.app.controller().is_fullscreen());
    }

    #[test]
    fn refused_fullscreen_shows_notice_and_keeps_projecting() {
        let mut h = harness_with_fullscreen(creds(), Some("tmux".into()));
        h.app.start(Instant::now());
        h.requests.try_recv().unwrap();
        h.app.handle_fetch(
            FetchResponse::Songs {
                creds: creds(),
                origin: SongsOrigin::Startup,
                result: Ok(songs()),
            },
            Instant::now(),
        );
        h.press(key(KeyCode::Enter));
        h.deliver_lyrics(lyrics(&["one", "two"]));

        h.press(key(KeyCode::Char('f')));
        assert_eq!(h.notice_titles(), vec!["Fullscreen unavailable"]);
        assert_eq!(h.app.controller().state(), State::Projecting);
        assert!(!h.app.controller().is_fullscreen());

        h.press(ctrl('x'));
        assert!(h.app.notices().is_empty());
        assert_eq!(h.app.controller().state(), State::Projecting);
        h.press(key(KeyCode::Right));
        assert_eq!(h.app.controller().session().unwrap().active(), Some(1));
    }

    #[test]
    fn auth_failure_on_reload_while_projecting_closes_session() {
        let mut h = Harness::browsing_with_songs();
        h.press(ctrl('r'));
        assert!(matches!(
            h.requests.try_recv().unwrap(),
            FetchRequest::Songs {
                origin: SongsOrigin::Reload,
                ..
            }
        ));
        h.press(key(KeyCode::Enter));
        h.deliver_lyrics(lyrics(&["one", "two"]));
        h.press(key(KeyCode::Char('f')));
        assert!(h.app.controller().is_fullscreen());

        h.app.handle_fetch(
            FetchResponse::Songs {
                creds: creds(),
                origin: SongsOrigin::Reload,
                result: Err(FetchError::Auth("API token is invalid.".into())),
            },
            Instant::now(),
        );
        assert_eq!(h.app.view(), View::Login);
        assert_eq!(h.app.controller().state(), State::Browsing);
        assert_eq!(h.app.controller().keyboard().listener_count(), 0);
        assert!(!h.app.controller().is_fullscreen());
        assert_eq!(
            h.app_rx.try_recv().unwrap(),
            AppEvent::ProjectionClosed {
                song_id: "a".into(),
                reason: CloseReason::SignedOut,
            }
        );
    }

    #[test]
    fn auth_failure_on_lyrics_returns_to_login() {
        let mut h = Harness::browsing_with_songs();
        h.press(key(KeyCode::Enter));
        h.deliver_lyrics(Err(FetchError::Auth("API token is invalid.".into())));
        assert_eq!(h.app.view(), View::Login);
        assert_eq!(h.notice_titles(), vec!["Authentication invalid"]);
        assert!(h.app.browse().songs().is_empty());
    }

    #[test]
    fn data_failure_on_lyrics_stays_browsing() {
        let mut h = Harness::browsing_with_songs();
        h.press(key(KeyCode::Enter));
        h.deliver_lyrics(Err(FetchError::Data("Missing song ID".into())));
        assert_eq!(h.app.view(), View::Main);
        assert_eq!(h.app.controller().state(), State::Browsing);
        assert_eq!(h.notice_titles(), vec!["Could not load lyrics"]);
    }

    #[test]
    fn login_success_saves_credentials_when_remembered() {
        let mut h = harness(Credentials::default());
        h.app.start(Instant::now());
        for c in "db".chars() {
            h.press(key(KeyCode::Char(c)));
        }
        h.press(key(KeyCode::Tab));
        for c in "ntn_token".chars() {
            h.press(key(KeyCode::Char(c)));
        }
        h.press(key(KeyCode::F(2)));
        h.press(key(KeyCode::Enter));

        let (sent, origin) = match h.requests.try_recv().unwrap() {
            FetchRequest::Songs { creds, origin } => (creds, origin),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(sent, creds());
        assert_eq!(origin, SongsOrigin::Login { remember: true });

        h.app.handle_fetch(
            FetchResponse::Songs {
                creds: sent,
                origin,
                result: Ok(songs()),
            },
            Instant::now(),
        );
        assert_eq!(h.app.view(), View::Main);
        assert_eq!(h.notice_titles(), vec!["Login successful"]);
        let saved = config::FileConfig::load(&h.app.config_path).unwrap();
        assert_eq!(saved.notion.token, "ntn_token");
    }

    #[test]
    fn login_failure_keeps_the_form() {
        let mut h = harness(Credentials::default());
        h.app.start(Instant::now());
        h.app.handle_fetch(
            FetchResponse::Songs {
                creds: creds(),
                origin: SongsOrigin::Login { remember: false },
                result: Err(FetchError::Auth("API token is invalid.".into())),
            },
            Instant::now(),
        );
        assert_eq!(h.app.view(), View::Login);
        let notice = &h.app.notices().items()[0];
        assert_eq!(notice.title, "Login failed");
        assert!(!h.app.config_path.exists());
    }

    #[test]
    fn logout_clears_and_ignores_stale_song_list() {
        let mut h = Harness::browsing_with_songs();
        h.press(ctrl('r'));
        h.press(ctrl('l'));
        assert_eq!(h.app.view(), View::Login);
        assert_eq!(h.notice_titles(), vec!["Signed out"]);
        h.app.handle_fetch(
            FetchResponse::Songs {
                creds: creds(),
                origin: SongsOrigin::Reload,
                result: Ok(songs()),
            },
            Instant::now(),
        );
        assert!(h.app.browse().songs().is_empty());
    }

    #[test]
    fn notices_dismiss_and_expire() {
        let mut h = Harness::browsing_with_songs();
        h.press(key(KeyCode::Enter));
        h.deliver_lyrics(Err(FetchError::Data("boom".into())));
        assert_eq!(h.app.notices().items().len(), 1);
        h.press(ctrl('x'));
        assert!(h.app.notices().is_empty());

        let t0 = Instant::now();
        h.press(key(KeyCode::Enter));
        h.deliver_lyrics(Err(FetchError::Data("boom".into())));
        assert!(h.app.next_deadline(t0).is_some());
        h.app.tick(t0 + Duration::from_secs(10));
        assert!(h.app.notices().is_empty());
    }

    #[test]
    fn ctrl_c_exits_from_any_view() {
        let mut h = harness(Credentials::default());
        h.app.start(Instant::now());
        h.press(ctrl('c'));
        assert!(h.app.should_exit());
    }

    #[test]
    fn draws_projection_after_loading() {
        let mut h = Harness::browsing_with_songs();
        h.press(key(KeyCode::Enter));
        h.deliver_lyrics(lyrics(&["Amazing grace", "how sweet the sound"]));
        let app = &mut h.app;
        let out = render_to_string(80, 24, |f, _| app.draw(f));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[12].trim(), "Amazing grace");
        assert_eq!(lines[14].trim(), "how sweet the sound");
    }

    #[test]
    fn shutdown_releases_projection() {
        let mut h = Harness::browsing_with_songs();
        h.press(key(KeyCode::Enter));
        h.deliver_lyrics(lyrics(&["one"]));
        h.app.shutdown();
        assert_eq!(h.app.controller().state(), State::Browsing);
        assert_eq!(
            h.app_rx.try_recv().unwrap(),
            AppEvent::ProjectionClosed {
                song_id: "a".into(),
                reason: CloseReason::Shutdown,
            }
        );
    }
}
