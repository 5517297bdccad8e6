//! Selection sidebar widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::ui::theme::ChatTheme;

/// One selectable row in a picker section.
#[derive(Debug, Clone)]
pub struct PickerEntry {
    pub label: String,
    /// This entry is the committed choice.
    pub chosen: bool,
}

/// One stage of the selection flow (mode, destination, role, counterpart).
#[derive(Debug, Clone)]
pub struct PickerSection {
    pub title: &'static str,
    pub entries: Vec<PickerEntry>,
    /// Row the cursor is on when this section is focused.
    pub cursor: usize,
    pub enabled: bool,
    pub focused: bool,
}

/// Sidebar showing the staged selection pickers.
pub struct SelectionPanelWidget<'a> {
    sections: &'a [PickerSection],
    theme: &'a ChatTheme,
    focused: bool,
}

impl<'a> SelectionPanelWidget<'a> {
    pub fn new(sections: &'a [PickerSection], theme: &'a ChatTheme) -> Self {
        Self {
            sections,
            theme,
            focused: false,
        }
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }
}

impl Widget for SelectionPanelWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Time Travel ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = Vec::new();

        for section in self.sections {
            let title_style = if !section.enabled {
                self.theme.disabled_style()
            } else if section.focused {
                Style::default()
                    .fg(self.theme.border_focused)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            lines.push(Line::from(Span::styled(section.title, title_style)));

            if !section.enabled {
                lines.push(Line::from(Span::styled(
                    "  (locked)",
                    self.theme.disabled_style(),
                )));
                lines.push(Line::from(""));
                continue;
            }

            for (i, entry) in section.entries.iter().enumerate() {
                let on_cursor = section.focused && i == section.cursor;
                let marker = if on_cursor {
                    "▸ "
                } else if entry.chosen {
                    "● "
                } else {
                    "  "
                };
                let style = self.theme.entry_style(on_cursor, entry.chosen);
                lines.push(Line::from(Span::styled(
                    format!("{marker}{}", entry.label),
                    style,
                )));
            }

            lines.push(Line::from(""));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(inner, buf);
    }
}
