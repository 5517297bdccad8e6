//! Status and hotkey bar widgets

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::app::InputMode;
use crate::ui::theme::ChatTheme;

/// Bottom status bar: input mode, guidance text, busy indicator.
pub struct StatusBarWidget<'a> {
    message: &'a str,
    input_mode: InputMode,
    theme: &'a ChatTheme,
    busy: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(message: &'a str, input_mode: InputMode, theme: &'a ChatTheme) -> Self {
        Self {
            message,
            input_mode,
            theme,
            busy: None,
        }
    }

    pub fn busy(mut self, label: Option<&'a str>) -> Self {
        self.busy = label;
        self
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mode_span = match self.input_mode {
            InputMode::Normal => Span::styled(
                " NORMAL ",
                Style::default().fg(Color::Black).bg(Color::DarkGray),
            ),
            InputMode::Insert => Span::styled(
                " INSERT ",
                Style::default()
                    .fg(Color::Black)
                    .bg(self.theme.border_focused),
            ),
            InputMode::Command => Span::styled(
                " COMMAND ",
                Style::default().fg(Color::Black).bg(Color::Yellow),
            ),
        };

        let mut spans = vec![mode_span, Span::raw(" ")];
        if let Some(label) = self.busy {
            spans.push(Span::styled(label, self.theme.busy_style()));
            spans.push(Span::raw(" "));
        }
        spans.push(Span::raw(self.message));

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        Paragraph::new(Line::from(spans))
            .block(block)
            .render(area, buf);
    }
}

/// One-line hotkey reminder, contextual to the input mode.
pub struct HotkeyBarWidget<'a> {
    input_mode: InputMode,
    chat_ready: bool,
    theme: &'a ChatTheme,
}

impl<'a> HotkeyBarWidget<'a> {
    pub fn new(input_mode: InputMode, chat_ready: bool, theme: &'a ChatTheme) -> Self {
        Self {
            input_mode,
            chat_ready,
            theme,
        }
    }
}

impl Widget for HotkeyBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let hints = match self.input_mode {
            InputMode::Insert => "Enter send | Esc normal mode | ↑/↓ input history",
            InputMode::Command => "Enter run | Esc cancel | :q :help :snapshot :export :logout",
            InputMode::Normal if self.chat_ready => {
                "i type | Tab focus | j/k scroll | s snapshot | b back | : command | ? help | q quit"
            }
            InputMode::Normal => {
                "Tab focus | j/k move | Enter choose | b back | : command | ? help | q quit"
            }
        };

        let line = Line::from(Span::styled(
            hints,
            Style::default()
                .fg(self.theme.system_text)
                .add_modifier(Modifier::DIM),
        ));
        Paragraph::new(line).render(area, buf);
    }
}
