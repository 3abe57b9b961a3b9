use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::login::{Field, LoginState};
use crate::ui::styles::ViewStyles;

const FORM_WIDTH: u16 = 56;
const FORM_HEIGHT: u16 = 11;

pub fn draw_login(frame: &mut Frame, area: Rect, login: &LoginState, styles: &ViewStyles) {
    let width = area.width.min(FORM_WIDTH);
    let height = area.height.min(FORM_HEIGHT);
    let form = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    let field_style = |field: Field| {
        if login.focus() == field {
            styles.input_focused
        } else {
            styles.input
        }
    };
    let marker = |field: Field| if login.focus() == field { "> " } else { "  " };
    let checkbox = if login.remember() { "[x]" } else { "[ ]" };
    let submit = if login.is_submitting() {
        Span::styled("Connecting...", styles.dim)
    } else {
        Span::styled("enter to connect", styles.title)
    };

    let lines = vec![
        Line::from(Span::styled("Database ID", styles.dim)),
        Line::from(vec![
            Span::raw(marker(Field::Database)),
            Span::styled(login.database().value().to_string(), field_style(Field::Database)),
        ]),
        Line::default(),
        Line::from(Span::styled("Notion Token", styles.dim)),
        Line::from(vec![
            Span::raw(marker(Field::Token)),
            Span::styled(login.token().masked(), field_style(Field::Token)),
        ]),
        Line::default(),
        Line::from(format!("{checkbox} stay signed in (F2)")),
        Line::from(submit).alignment(Alignment::Center),
    ];

    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(" Login Notion ", styles.title)),
        ),
        form,
    );
}
