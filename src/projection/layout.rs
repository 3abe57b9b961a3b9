//! Vertical layout of the projection column.
//!
//! Lines are wrapped into a left-aligned column and stacked with one blank
//! row between them. Half a viewport of padding sits above the first line and
//! below the last so that any line can be brought to the vertical centre.

use crate::projection::lines::LineStore;

/// Horizontal padding on each side, in percent of the terminal width.
const SIDE_PADDING_PCT: usize = 6;
/// Share of the padded width a line may use before wrapping.
const LINE_WIDTH_PCT: usize = 82;
/// Blank rows between consecutive lines.
const LINE_GAP: usize = 1;

/// Where a line sits in content coordinates (rows from the top of the
/// scrollable column, padding included).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollTarget {
    pub top: usize,
    pub height: usize,
}

impl ScrollTarget {
    pub fn contains(&self, row: usize) -> bool {
        row >= self.top && row < self.top + self.height
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineLayout {
    pub width: u16,
    pub viewport_height: usize,
    /// Left edge of the text column.
    pub column_x: u16,
    pub column_width: u16,
    pub content_height: usize,
    targets: Vec<ScrollTarget>,
    wrapped: Vec<Vec<String>>,
}

impl LineLayout {
    #[cfg(test)]
    pub fn target(&self, index: usize) -> Option<ScrollTarget> {
        self.targets.get(index).copied()
    }

    pub fn targets(&self) -> impl Iterator<Item = (usize, ScrollTarget)> + '_ {
        self.targets.iter().copied().enumerate()
    }

    pub fn wrapped(&self, index: usize) -> &[String] {
        self.wrapped.get(index).map_or(&[], Vec::as_slice)
    }

    #[cfg(test)]
    pub fn line_count(&self) -> usize {
        self.targets.len()
    }

    /// Line occupying the given content row, if any (gaps and padding map to
    /// `None`).
    pub fn line_at(&self, row: usize) -> Option<usize> {
        let idx = self.targets.partition_point(|t| t.top + t.height <= row);
        self.targets
            .get(idx)
            .filter(|t| t.contains(row))
            .map(|_| idx)
    }
}

/// Lay out `lines` for a viewport of `width` x `height` cells.
pub fn layout_lines(lines: &LineStore, width: u16, height: u16) -> LineLayout {
    let w = usize::from(width);
    let pad = w * SIDE_PADDING_PCT / 100;
    let inner = w.saturating_sub(pad * 2);
    let column_width = (inner * LINE_WIDTH_PCT / 100).max(1);

    let viewport_height = usize::from(height);
    let half = viewport_height / 2;

    let mut targets = Vec::with_capacity(lines.len());
    let mut wrapped = Vec::with_capacity(lines.len());
    let mut row = half;
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            row += LINE_GAP;
        }
        let rows = wrap_line(line, column_width);
        targets.push(ScrollTarget {
            top: row,
            height: rows.len(),
        });
        row += rows.len();
        wrapped.push(rows);
    }

    LineLayout {
        width,
        viewport_height,
        column_x: u16::try_from(pad).unwrap_or(u16::MAX),
        column_width: u16::try_from(column_width).unwrap_or(u16::MAX),
        content_height: row + half,
        targets,
        wrapped,
    }
}

fn wrap_line(line: &str, width: usize) -> Vec<String> {
    if line.trim().is_empty() {
        return vec![String::new()];
    }
    let rows: Vec<String> = textwrap::wrap(line, width)
        .into_iter()
        .map(|cow| cow.into_owned())
        .collect();
    if rows.is_empty() { vec![String::new()] } else { rows }
}
