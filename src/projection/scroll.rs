//! Scroll synchronizer: keeps the viewport centred on the active line.
//!
//! Requests are fire-and-forget. Each one starts an eased motion from the
//! offset currently on screen toward the centred offset of the requested
//! line, so a burst of requests always settles on the most recent one.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::projection::layout::{LineLayout, ScrollTarget};

/// Interval between animation frames while a motion is in flight.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScrollError {
    /// The line has no bound target yet (store swapped, not laid out).
    #[error("no scroll target bound for line {0}")]
    TargetMissing(usize),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Motion {
    from: f64,
    to: f64,
    started: Instant,
}

#[derive(Debug)]
pub struct ScrollSynchronizer {
    targets: HashMap<usize, ScrollTarget>,
    viewport_height: usize,
    content_height: usize,
    offset: f64,
    motion: Option<Motion>,
    duration: Duration,
    requests: u64,
}

impl ScrollSynchronizer {
    pub fn new(duration: Duration) -> Self {
        Self {
            targets: HashMap::new(),
            viewport_height: 0,
            content_height: 0,
            offset: 0.0,
            motion: None,
            duration,
            requests: 0,
        }
    }

    /// Replace every binding with the targets of a fresh layout.
    pub fn bind(&mut self, layout: &LineLayout) {
        self.targets = layout.targets().collect();
        self.viewport_height = layout.viewport_height;
        self.content_height = layout.content_height;
        let max = self.max_offset() as f64;
        self.offset = self.offset.min(max);
        if let Some(motion) = &mut self.motion {
            motion.to = motion.to.min(max);
        }
    }

    /// Ask for `index` to be centred. `Ok(false)` means the viewport is
    /// already at (or already heading to) that position.
    pub fn request(&mut self, index: usize, now: Instant) -> Result<bool, ScrollError> {
        let target = self
            .targets
            .get(&index)
            .copied()
            .ok_or(ScrollError::TargetMissing(index))?;
        let destination = self.centred_offset(target) as f64;

        let heading = self.motion.map_or(self.offset, |m| m.to);
        if (heading - destination).abs() < f64::EPSILON {
            return Ok(false);
        }

        self.tick(now);
        self.motion = Some(Motion {
            from: self.offset,
            to: destination,
            started: now,
        });
        self.requests += 1;
        tracing::trace!(line = index, requests = self.requests, from = self.offset, to = destination, "scroll requested");
        Ok(true)
    }

    /// Jump straight to the position for `index` without animating.
    pub fn snap_to(&mut self, index: usize) -> Result<(), ScrollError> {
        let target = self
            .targets
            .get(&index)
            .copied()
            .ok_or(ScrollError::TargetMissing(index))?;
        self.offset = self.centred_offset(target) as f64;
        self.motion = None;
        Ok(())
    }

    /// Advance the motion to `now`. Returns true while still animating.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(motion) = self.motion else {
            return false;
        };
        let elapsed = now.saturating_duration_since(motion.started);
        if self.duration.is_zero() || elapsed >= self.duration {
            self.offset = motion.to;
            self.motion = None;
            return false;
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.offset = motion.from + (motion.to - motion.from) * ease_in_out_cubic(t);
        true
    }

    /// When the next frame should be drawn, if a motion is in flight.
    pub fn next_frame(&self, now: Instant) -> Option<Instant> {
        self.is_animating().then(|| now + FRAME_INTERVAL)
    }

    pub fn is_animating(&self) -> bool {
        self.motion.is_some()
    }

    /// Current top row of the viewport in content coordinates.
    pub fn offset(&self) -> usize {
        self.offset.round().max(0.0) as usize
    }

    #[cfg(test)]
    pub fn requests_issued(&self) -> u64 {
        self.requests
    }

    fn max_offset(&self) -> usize {
        self.content_height.saturating_sub(self.viewport_height)
    }

    fn centred_offset(&self, target: ScrollTarget) -> usize {
        let centre = target.top + target.height / 2;
        centre
            .saturating_sub(self.viewport_height / 2)
            .min(self.max_offset())
    }
}

fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
