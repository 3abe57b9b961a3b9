//! Render projector: per-line visual emphasis as a pure function of the
//! active index.

pub const ACTIVE_OPACITY: f32 = 1.0;
pub const INACTIVE_OPACITY: f32 = 0.3;
pub const HOVER_OPACITY: f32 = 0.6;
/// Blur radius for inactive lines, in the display layer's length unit.
pub const INACTIVE_BLUR: f32 = 4.0;
pub const INACTIVE_SCALE: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualState {
    pub is_active: bool,
    pub opacity: f32,
    pub blur: f32,
    pub scale: f32,
}

/// Visual state of line `index` given the active line and whether the
/// pointer is over it. Hover only lifts inactive lines.
pub fn project(index: usize, active: Option<usize>, hovered: bool) -> VisualState {
    if active == Some(index) {
        return VisualState {
            is_active: true,
            opacity: ACTIVE_OPACITY,
            blur: 0.0,
            scale: 1.0,
        };
    }
    VisualState {
        is_active: false,
        opacity: if hovered { HOVER_OPACITY } else { INACTIVE_OPACITY },
        blur: INACTIVE_BLUR,
        scale: INACTIVE_SCALE,
    }
}
