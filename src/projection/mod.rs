//! Lyrics projection: the active-line engine behind the full-screen view.

pub mod cursor;
pub mod fullscreen;
pub mod keyboard;
pub mod layout;
pub mod lines;
pub mod render;
pub mod scroll;
pub mod session;

pub use fullscreen::TerminalFullscreen;
pub use session::{CloseReason, FetchTicket, KeyOutcome, LoadOutcome, Session, SessionController, State};
