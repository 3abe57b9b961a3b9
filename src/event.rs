use crossterm::event::Event;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::projection::CloseReason;
use crate::projection::session::OnClose;

/// Events raised by the app's own components rather than the terminal or
/// the fetch worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    ProjectionClosed { song_id: String, reason: CloseReason },
}

/// Close callback for a projection session: reports the closure back to the
/// UI loop. Never blocks; a full channel only loses the notification.
pub fn on_close_notifier(tx: mpsc::Sender<AppEvent>, song_id: String) -> OnClose {
    Box::new(move |reason| {
        if let Err(e) = tx.try_send(AppEvent::ProjectionClosed { song_id, reason }) {
            tracing::debug!(error = %e, "projection close notification dropped");
        }
    })
}

/// Single background thread to poll for crossterm events and forward them
/// to the async runtime. Exits once the receiver is gone.
pub fn spawn_input_thread(tx: mpsc::Sender<Event>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        loop {
            match crossterm::event::poll(Duration::from_millis(100)) {
                Ok(true) => match crossterm::event::read() {
                    Ok(ev) => {
                        if tx.blocking_send(ev).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::debug!(error = %e, "terminal read failed"),
                },
                Ok(false) => {
                    if tx.is_closed() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "terminal poll failed");
                    thread::sleep(Duration::from_millis(100));
                }
            }
        }
    })
}
