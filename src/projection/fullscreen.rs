//! Fullscreen toggle for the projection overlay.
//!
//! Terminals expose "fullscreen" through the xterm window manipulation
//! sequence `CSI 10 ; n t`. Multiplexers swallow it, so those are refused up
//! front instead of pretending the request went through.

use crossterm::{Command, execute};
use std::fmt;
use std::io::{self, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FullscreenError {
    #[error("fullscreen is not supported here: {0}")]
    Unsupported(String),
    #[error("failed to write to terminal: {0}")]
    Io(#[from] io::Error),
}

pub trait FullscreenControl {
    fn is_active(&self) -> bool;
    fn enter(&mut self) -> Result<(), FullscreenError>;
    fn exit(&mut self) -> Result<(), FullscreenError>;
}

/// Request or leave native fullscreen, whichever applies.
pub fn toggle<F: FullscreenControl + ?Sized>(ctl: &mut F) -> Result<bool, FullscreenError> {
    if ctl.is_active() {
        ctl.exit()?;
    } else {
        ctl.enter()?;
    }
    Ok(ctl.is_active())
}

struct SetWindowFullscreen(bool);

impl Command for SetWindowFullscreen {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        if self.0 {
            f.write_str("\x1b[10;1t")
        } else {
            f.write_str("\x1b[10;0t")
        }
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "window fullscreen needs an ANSI terminal",
        ))
    }
}

/// Fullscreen through the controlling terminal.
pub struct TerminalFullscreen<W: Write> {
    out: W,
    active: bool,
    refusal: Option<String>,
}

impl TerminalFullscreen<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), detect_refusal(|k| std::env::var(k).ok()))
    }
}

impl<W: Write> TerminalFullscreen<W> {
    pub fn new(out: W, refusal: Option<String>) -> Self {
        Self {
            out,
            active: false,
            refusal,
        }
    }
}

impl<W: Write> FullscreenControl for TerminalFullscreen<W> {
    fn is_active(&self) -> bool {
        self.active
    }

    fn enter(&mut self) -> Result<(), FullscreenError> {
        if let Some(reason) = &self.refusal {
            return Err(FullscreenError::Unsupported(reason.clone()));
        }
        execute!(self.out, SetWindowFullscreen(true))?;
        self.active = true;
        Ok(())
    }

    fn exit(&mut self) -> Result<(), FullscreenError> {
        if !self.active {
            return Ok(());
        }
        execute!(self.out, SetWindowFullscreen(false))?;
        self.active = false;
        Ok(())
    }
}

/// Why this terminal cannot honour the request, judged from the environment.
pub fn detect_refusal(env: impl Fn(&str) -> Option<String>) -> Option<String> {
    if env("TMUX").is_some() {
        return Some("running inside tmux".into());
    }
    if env("STY").is_some() {
        return Some("running inside GNU screen".into());
    }
    match env("TERM").as_deref() {
        Some("linux") => Some("the Linux console has no windows".into()),
        Some("dumb") | None => Some("terminal does not support window operations".into()),
        _ => None,
    }
}
