//! Color theme and styling for the ChronoChat TUI

use chronochat_core::LineKind;
use ratatui::style::{Color, Modifier, Style};

/// UI color theme
#[derive(Debug, Clone)]
pub struct ChatTheme {
    // Base colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,
    pub disabled: Color,

    // Chat feed colors
    pub user_text: Color,
    pub counterpart_text: Color,
    pub system_text: Color,

    // Selection colors
    pub selected: Color,
    pub chosen: Color,

    // Accents
    pub title: Color,
    pub busy: Color,
    pub error: Color,
}

impl Default for ChatTheme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Cyan,
            disabled: Color::DarkGray,

            user_text: Color::Cyan,
            counterpart_text: Color::White,
            system_text: Color::DarkGray,

            selected: Color::Yellow,
            chosen: Color::LightGreen,

            title: Color::LightMagenta,
            busy: Color::Yellow,
            error: Color::LightRed,
        }
    }
}

impl ChatTheme {
    /// Style for a feed line of the given kind.
    pub fn line_style(&self, kind: LineKind) -> Style {
        match kind {
            LineKind::User => Style::default()
                .fg(self.user_text)
                .add_modifier(Modifier::ITALIC),
            LineKind::Counterpart => Style::default().fg(self.counterpart_text),
            LineKind::System => Style::default()
                .fg(self.system_text)
                .add_modifier(Modifier::DIM),
        }
    }

    /// Style for a sender attribution.
    pub fn sender_style(&self, kind: LineKind) -> Style {
        self.line_style(kind).add_modifier(Modifier::BOLD)
    }

    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    /// Style for a picker entry.
    pub fn entry_style(&self, selected: bool, chosen: bool) -> Style {
        if selected {
            Style::default()
                .fg(self.selected)
                .add_modifier(Modifier::BOLD)
        } else if chosen {
            Style::default().fg(self.chosen)
        } else {
            Style::default().fg(self.foreground)
        }
    }

    /// Style for a picker that cannot be used yet.
    pub fn disabled_style(&self) -> Style {
        Style::default().fg(self.disabled).add_modifier(Modifier::DIM)
    }

    /// Style for the title banner.
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.title)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for the busy indicator.
    pub fn busy_style(&self) -> Style {
        Style::default().fg(self.busy).add_modifier(Modifier::BOLD)
    }

    /// Style for error and login-failure text.
    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error)
    }
}
