use ratatui::Frame;
use ratatui::layout::{Alignment, Position, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::browse::BrowseState;
use crate::source::Song;
use crate::ui::styles::ViewStyles;

const HEADER_ROWS: u16 = 4;
const HINT: &str = "ctrl-r reload  ctrl-l logout";

pub fn list_area(area: Rect) -> Rect {
    let top = HEADER_ROWS.min(area.height);
    Rect::new(area.x, area.y + top, area.width, area.height - top)
}

/// First visible row of the list, keeping the selection on screen.
pub fn list_offset(selected: usize, height: u16) -> usize {
    selected.saturating_sub(usize::from(height).saturating_sub(1))
}

/// Filtered-list row under `pos`, if any.
pub fn row_at(area: Rect, browse: &BrowseState, pos: Position) -> Option<usize> {
    let list = list_area(area);
    if !list.contains(pos) {
        return None;
    }
    let row = list_offset(browse.selected(), list.height) + usize::from(pos.y - list.y);
    (row < browse.filtered().len()).then_some(row)
}

pub fn draw_browse(
    frame: &mut Frame,
    area: Rect,
    browse: &BrowseState,
    loading: Option<&Song>,
    styles: &ViewStyles,
) {
    let row = |y: u16| Rect::new(area.x, area.y + y, area.width, u16::from(y < area.height));

    frame.render_widget(
        Paragraph::new(Span::styled(HINT, styles.dim)).alignment(Alignment::Right),
        row(0),
    );
    frame.render_widget(Paragraph::new(Span::styled("Lyrics Projection", styles.title)), row(0));
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Search: ", styles.dim),
            Span::styled(browse.search().to_string(), styles.input_focused),
        ])),
        row(1),
    );

    let active = browse.active_group();
    let mut chips = Vec::new();
    for group in browse.groups() {
        let style = if group == active { styles.chip_active } else { styles.chip };
        chips.push(Span::styled(format!(" {group} "), style));
        chips.push(Span::raw(" "));
    }
    frame.render_widget(Paragraph::new(Line::from(chips)), row(2));

    let list = list_area(area);
    let songs = browse.filtered();
    if songs.is_empty() {
        let msg = if browse.is_loading() {
            "Loading songs..."
        } else if browse.songs().is_empty() {
            "No songs in this database"
        } else {
            "No songs match"
        };
        frame.render_widget(
            Paragraph::new(Span::styled(msg, styles.dim)).alignment(Alignment::Center),
            list,
        );
    } else {
        let offset = list_offset(browse.selected(), list.height);
        let lines: Vec<Line> = songs
            .iter()
            .enumerate()
            .skip(offset)
            .take(usize::from(list.height))
            .map(|(i, song)| {
                if i == browse.selected() {
                    Line::from(vec![
                        Span::styled(format!(" {} ", song.title), styles.selected),
                        Span::styled(format!("  {}", song.group), styles.dim),
                    ])
                } else {
                    Line::from(vec![
                        Span::raw(format!(" {} ", song.title)),
                        Span::styled(format!("  {}", song.group), styles.dim),
                    ])
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), list);
    }

    if let Some(song) = loading {
        draw_loading(frame, area, song, styles);
    }
}

fn draw_loading(frame: &mut Frame, area: Rect, song: &Song, styles: &ViewStyles) {
    let width = area.width.min(44);
    let height = area.height.min(5);
    let popup = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );
    let text = vec![
        Line::from(Span::styled("Loading lyrics...", styles.title)),
        Line::from(song.title.clone()),
        Line::from(Span::styled("esc to cancel", styles.dim)),
    ];
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(text)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL)),
        popup,
    );
}
