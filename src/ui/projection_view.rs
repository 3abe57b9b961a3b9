//! Full-screen lyric projection: lines stacked in a left-aligned column,
//! scrolled so the active line sits at the vertical centre.

use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use crate::projection::Session;
use crate::ui::styles::{ViewStyles, background, line_style};

const FULLSCREEN_LABEL: &str = "[f] fullscreen";
const WINDOWED_LABEL: &str = "[f] windowed";
const CLOSE_LABEL: &str = "[esc] close";

/// Hit areas of the on-screen controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub fullscreen: Rect,
    pub close: Rect,
}

fn label_width(label: &str) -> u16 {
    u16::try_from(label.chars().count()).unwrap_or(u16::MAX)
}

fn fullscreen_label(active: bool) -> &'static str {
    if active { WINDOWED_LABEL } else { FULLSCREEN_LABEL }
}

/// Controls sit in the top-right corner, close outermost.
pub fn controls(area: Rect, fullscreen_active: bool) -> Controls {
    let close_w = label_width(CLOSE_LABEL).min(area.width);
    let close_x = area.right().saturating_sub(close_w);
    let fs_w = label_width(fullscreen_label(fullscreen_active)).min(close_x.saturating_sub(area.x));
    let fs_x = close_x.saturating_sub(fs_w + 1).max(area.x);
    Controls {
        fullscreen: Rect::new(fs_x, area.y, fs_w, area.height.min(1)),
        close: Rect::new(close_x, area.y, close_w, area.height.min(1)),
    }
}

pub fn draw_projection(
    frame: &mut Frame,
    area: Rect,
    session: &Session,
    fullscreen_active: bool,
    styles: &ViewStyles,
) {
    frame.render_widget(Block::default().style(Style::default().bg(background())), area);

    if session.lines().is_empty() {
        let y = area.y + area.height / 2;
        frame.render_widget(
            Paragraph::new(Span::styled("No lyrics for this song", styles.dim)).alignment(Alignment::Center),
            Rect::new(area.x, y, area.width, area.height.min(1)),
        );
    } else if let Some(layout) = session.layout() {
        let offset = session.scroll_offset();
        let visible = offset..offset + usize::from(area.height);
        for (index, target) in layout.targets() {
            if target.top + target.height <= visible.start || target.top >= visible.end {
                continue;
            }
            let style = line_style(session.visual_state(index));
            for (i, text) in layout.wrapped(index).iter().enumerate() {
                let row = target.top + i;
                if !visible.contains(&row) {
                    continue;
                }
                let Ok(dy) = u16::try_from(row - offset) else {
                    continue;
                };
                let rect = Rect::new(area.x + layout.column_x, area.y + dy, layout.column_width, 1)
                    .intersection(area);
                frame.render_widget(Paragraph::new(Line::styled(text.clone(), style)), rect);
            }
        }
    }

    let ctl = controls(area, fullscreen_active);
    let title_w = ctl.fullscreen.x.saturating_sub(area.x + 1);
    frame.render_widget(
        Paragraph::new(Span::styled(session.song().title.clone(), styles.dim.bg(background()))),
        Rect::new(area.x, area.y, title_w, area.height.min(1)),
    );
    frame.render_widget(
        Paragraph::new(Span::styled(fullscreen_label(fullscreen_active), styles.control)),
        ctl.fullscreen,
    );
    frame.render_widget(Paragraph::new(Span::styled(CLOSE_LABEL, styles.control)), ctl.close);
}
