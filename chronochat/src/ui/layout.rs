//! Layout calculations for the ChronoChat TUI

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// The main chat screen layout.
///
/// A title banner on top, the selection sidebar to the left of the chat
/// feed, then status, hotkey, and input rows along the bottom.
pub struct AppLayout {
    pub title_area: Rect,
    pub sidebar_area: Rect,
    pub feed_area: Rect,
    pub status_bar: Rect,
    pub hotkey_bar: Rect,
    pub input_area: Rect,
}

impl AppLayout {
    pub fn calculate(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Min(8),    // main
                Constraint::Length(3), // status
                Constraint::Length(1), // hotkeys
                Constraint::Length(3), // input
            ])
            .split(area);

        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(36), Constraint::Min(20)])
            .split(rows[1]);

        Self {
            title_area: rows[0],
            sidebar_area: main[0],
            feed_area: main[1],
            status_bar: rows[2],
            hotkey_bar: rows[3],
            input_area: rows[4],
        }
    }
}

/// Centered popup with a fixed size, capped to the containing area.
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect {
        x,
        y,
        width,
        height,
    }
}
