use ratatui::style::{Color, Modifier, Style};

use crate::projection::render::VisualState;

pub const BACKGROUND: (u8, u8, u8) = (0, 0, 0);
pub const FOREGROUND: (u8, u8, u8) = (255, 255, 255);
pub const ACCENT: Color = Color::Rgb(128, 90, 213);

/// Foreground mixed toward the background: 1.0 is full text colour, 0.0
/// disappears.
pub fn blend(opacity: f32) -> Color {
    let o = opacity.clamp(0.0, 1.0);
    let mix = |fg: u8, bg: u8| (f32::from(fg) * o + f32::from(bg) * (1.0 - o)).round() as u8;
    Color::Rgb(
        mix(FOREGROUND.0, BACKGROUND.0),
        mix(FOREGROUND.1, BACKGROUND.1),
        mix(FOREGROUND.2, BACKGROUND.2),
    )
}

/// Terminal rendition of a lyric line's visual state. Cells cannot blur or
/// scale, so blur shows as italics and full scale as bold.
pub fn line_style(v: VisualState) -> Style {
    let mut style = Style::default().fg(blend(v.opacity)).bg(background());
    if v.blur > 0.0 {
        style = style.add_modifier(Modifier::ITALIC);
    }
    if v.scale >= 1.0 {
        style = style.add_modifier(Modifier::BOLD);
    }
    style
}

pub fn background() -> Color {
    Color::Rgb(BACKGROUND.0, BACKGROUND.1, BACKGROUND.2)
}

pub struct ViewStyles {
    pub title: Style,
    pub dim: Style,
    pub selected: Style,
    pub chip: Style,
    pub chip_active: Style,
    pub input: Style,
    pub input_focused: Style,
    pub control: Style,
    pub error: Style,
    pub success: Style,
    pub info: Style,
}

impl Default for ViewStyles {
    fn default() -> Self {
        Self {
            title: Style::default().add_modifier(Modifier::BOLD),
            dim: Style::default().add_modifier(Modifier::DIM),
            selected: Style::default()
                .fg(Color::White)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD),
            chip: Style::default().fg(Color::Gray),
            chip_active: Style::default().fg(Color::White).bg(ACCENT),
            input: Style::default().fg(Color::Gray),
            input_focused: Style::default().fg(Color::White).add_modifier(Modifier::UNDERLINED),
            control: Style::default().fg(Color::Gray).bg(background()),
            error: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            success: Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            info: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        }
    }
}
