//! Input field widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::ui::theme::ChatTheme;

/// Single-line input field with a visible cursor.
pub struct InputWidget<'a> {
    content: &'a str,
    cursor_position: usize,
    theme: &'a ChatTheme,
    placeholder: &'a str,
    is_active: bool,
    is_command_mode: bool,
}

impl<'a> InputWidget<'a> {
    pub fn new(content: &'a str, theme: &'a ChatTheme) -> Self {
        Self {
            content,
            cursor_position: content.chars().count(),
            theme,
            placeholder: "Say something in this era...",
            is_active: true,
            is_command_mode: false,
        }
    }

    pub fn cursor_position(mut self, pos: usize) -> Self {
        self.cursor_position = pos;
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    pub fn command_mode(mut self, is_command: bool) -> Self {
        self.is_command_mode = is_command;
        self
    }
}

impl Widget for InputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.is_active));

        let inner = block.inner(area);
        block.render(area, buf);

        let line = if self.content.is_empty() && !self.is_command_mode {
            Line::from(vec![
                Span::styled("> ", self.theme.line_style(chronochat_core::LineKind::User)),
                Span::styled(
                    self.placeholder,
                    Style::default().add_modifier(Modifier::DIM),
                ),
            ])
        } else {
            // The command buffer carries its leading ':', shown as the prompt.
            let (prompt, display) = if self.is_command_mode {
                (":", self.content.strip_prefix(':').unwrap_or(self.content))
            } else {
                ("> ", self.content)
            };
            let cursor = if self.is_command_mode {
                self.cursor_position.saturating_sub(1)
            } else {
                self.cursor_position
            };

            let before: String = display.chars().take(cursor).collect();
            let at = display
                .chars()
                .nth(cursor)
                .map(|c| c.to_string())
                .unwrap_or_else(|| " ".to_string());
            let after: String = display.chars().skip(cursor + 1).collect();

            Line::from(vec![
                Span::styled(prompt, self.theme.line_style(chronochat_core::LineKind::User)),
                Span::raw(before),
                Span::styled(
                    at,
                    Style::default()
                        .add_modifier(Modifier::UNDERLINED | Modifier::BOLD)
                        .fg(self.theme.user_text),
                ),
                Span::raw(after),
            ])
        };

        Paragraph::new(line).render(inner, buf);
    }
}
