//! Transient notices stacked at the bottom of the screen.

use ratatui::Frame;
use ratatui::layout::{Position, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use std::time::{Duration, Instant};

use crate::ui::styles::ViewStyles;

pub const DEFAULT_TTL: Duration = Duration::from_secs(3);
pub const LOGIN_FAILURE_TTL: Duration = Duration::from_secs(5);
const MAX_VISIBLE: usize = 3;
const MAX_WIDTH: u16 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: Option<String>,
    pub expires_at: Instant,
}

impl Notice {
    fn height(&self) -> u16 {
        if self.description.is_some() { 4 } else { 3 }
    }
}

#[derive(Debug, Default)]
pub struct Notices {
    items: Vec<Notice>,
}

impl Notices {
    pub fn push(
        &mut self,
        kind: NoticeKind,
        title: impl Into<String>,
        description: Option<String>,
        ttl: Duration,
        now: Instant,
    ) {
        let notice = Notice {
            kind,
            title: title.into(),
            description,
            expires_at: now + ttl,
        };
        tracing::debug!(kind = ?notice.kind, title = %notice.title, "notice");
        self.items.push(notice);
        if self.items.len() > MAX_VISIBLE {
            self.items.remove(0);
        }
    }

    pub fn info(&mut self, title: impl Into<String>, now: Instant) {
        self.push(NoticeKind::Info, title, None, DEFAULT_TTL, now);
    }

    pub fn success(&mut self, title: impl Into<String>, now: Instant) {
        self.push(NoticeKind::Success, title, None, DEFAULT_TTL, now);
    }

    pub fn error(&mut self, title: impl Into<String>, description: impl ToString, now: Instant) {
        self.push(
            NoticeKind::Error,
            title,
            Some(description.to_string()),
            DEFAULT_TTL,
            now,
        );
    }

    pub fn items(&self) -> &[Notice] {
        &self.items
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop expired notices. True if any went away.
    pub fn expire(&mut self, now: Instant) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.expires_at > now);
        self.items.len() != before
    }

    pub fn next_expiry(&self) -> Option<Instant> {
        self.items.iter().map(|n| n.expires_at).min()
    }

    pub fn dismiss_all(&mut self) -> bool {
        let had_any = !self.items.is_empty();
        self.items.clear();
        had_any
    }

    /// Dismiss the notice drawn under `pos`. True if one was hit.
    pub fn dismiss_at(&mut self, area: Rect, pos: Position) -> bool {
        let hit = self
            .areas(area)
            .into_iter()
            .position(|rect| rect.contains(pos));
        match hit {
            Some(i) => {
                self.items.remove(i);
                true
            }
            None => false,
        }
    }

    /// Screen rectangles of the notices, oldest on top, stacked against the
    /// bottom edge.
    fn areas(&self, area: Rect) -> Vec<Rect> {
        let width = area.width.min(MAX_WIDTH);
        let x = area.x + (area.width - width) / 2;
        let mut bottom = area.bottom();
        let mut rects: Vec<Rect> = self
            .items
            .iter()
            .rev()
            .map(|n| {
                let h = n.height().min(bottom.saturating_sub(area.y));
                bottom -= h;
                Rect::new(x, bottom, width, h)
            })
            .collect();
        rects.reverse();
        rects
    }
}

pub fn draw_notices(frame: &mut Frame, area: Rect, notices: &Notices, styles: &ViewStyles) {
    for (notice, rect) in notices.items().iter().zip(notices.areas(area)) {
        if rect.height == 0 {
            continue;
        }
        let style = match notice.kind {
            NoticeKind::Info => styles.info,
            NoticeKind::Success => styles.success,
            NoticeKind::Error => styles.error,
        };
        let mut lines = vec![Line::from(Span::styled(notice.title.clone(), style))];
        if let Some(desc) = &notice.description {
            lines.push(Line::from(desc.clone()));
        }
        let block = Block::default().borders(Borders::ALL).border_style(style);
        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
            rect,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::test_helpers::render_to_string;
    use pretty_assertions::assert_eq;

    #[test]
    fn notices_expire_after_their_ttl() {
        let t0 = Instant::now();
        let mut n = Notices::default();
        n.info("saved", t0);
        n.push(NoticeKind::Error, "Login failed", None, LOGIN_FAILURE_TTL, t0);
        assert_eq!(n.next_expiry(), Some(t0 + DEFAULT_TTL));
        assert!(!n.expire(t0 + Duration::from_secs(2)));
        assert!(n.expire(t0 + DEFAULT_TTL));
        assert_eq!(n.items().len(), 1);
        assert!(n.expire(t0 + LOGIN_FAILURE_TTL));
        assert!(n.is_empty());
    }

    #[test]
    fn only_the_newest_few_are_kept() {
        let t0 = Instant::now();
        let mut n = Notices::default();
        for i in 0..5 {
            n.info(format!("n{i}"), t0);
        }
        let titles: Vec<_> = n.items().iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["n2", "n3", "n4"]);
    }

    #[test]
    fn click_dismisses_the_notice_under_the_pointer() {
        let t0 = Instant::now();
        let area = Rect::new(0, 0, 80, 24);
        let mut n = Notices::default();
        n.info("first", t0);
        n.error("second", "boom", t0);
        // second (4 rows) sits on rows 20..24, first (3 rows) on 17..20
        assert!(!n.dismiss_at(area, Position::new(0, 18)));
        assert!(n.dismiss_at(area, Position::new(40, 18)));
        assert_eq!(n.items()[0].title, "second");
        assert!(n.dismiss_at(area, Position::new(40, 23)));
        assert!(n.is_empty());
    }

    #[test]
    fn draws_title_and_description() {
        let mut n = Notices::default();
        n.error("Login failed", "API token is invalid.", Instant::now());
        let out = render_to_string(80, 10, |frame, area| {
            draw_notices(frame, area, &n, &ViewStyles::default());
        });
        assert!(out.contains("Login failed"));
        assert!(out.contains("API token is invalid."));
    }
}
