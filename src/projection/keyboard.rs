//! Keyboard listener registration for the projection overlay.
//!
//! The registry is the one place key events are routed to projection
//! commands. A listener is installed by [`KeyboardRegistry::register`] and
//! lives exactly as long as the returned [`ListenerGuard`].

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use std::sync::{Arc, Mutex};

/// What a projection key means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    Close,
}

/// Map a key to a projection command. Anything else passes through.
/// Held arrows keep stepping; close only fires on the initial press.
pub fn command_for(key: &KeyEvent) -> Option<Command> {
    match (key.kind, key.code) {
        (KeyEventKind::Release, _) => None,
        (_, KeyCode::Right | KeyCode::Down) => Some(Command::Next),
        (_, KeyCode::Left | KeyCode::Up) => Some(Command::Previous),
        (KeyEventKind::Press, KeyCode::Esc) => Some(Command::Close),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct Listeners {
    next_id: u64,
    installed: Vec<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct KeyboardRegistry {
    inner: Arc<Mutex<Listeners>>,
}

impl KeyboardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a listener. It stays installed until the guard is dropped.
    pub fn register(&self) -> ListenerGuard {
        let mut listeners = lock(&self.inner);
        listeners.next_id += 1;
        let id = listeners.next_id;
        listeners.installed.push(id);
        tracing::debug!(listener = id, installed = listeners.installed.len(), "keyboard listener registered");
        ListenerGuard {
            id,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Route a key through the installed listeners. Each listener yields at
    /// most one command for the event.
    pub fn dispatch(&self, key: &KeyEvent) -> Vec<Command> {
        let listeners = lock(&self.inner);
        if listeners.installed.is_empty() {
            return Vec::new();
        }
        command_for(key)
            .map(|cmd| vec![cmd; listeners.installed.len()])
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub fn listener_count(&self) -> usize {
        lock(&self.inner).installed.len()
    }
}

/// Owned registration handle; dropping it removes the listener.
#[derive(Debug)]
pub struct ListenerGuard {
    id: u64,
    registry: Arc<Mutex<Listeners>>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let mut listeners = lock(&self.registry);
        listeners.installed.retain(|&id| id != self.id);
        tracing::debug!(listener = self.id, installed = listeners.installed.len(), "keyboard listener removed");
    }
}

// A poisoned lock only means a panic happened mid-update of a plain Vec.
fn lock(m: &Mutex<Listeners>) -> std::sync::MutexGuard<'_, Listeners> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
