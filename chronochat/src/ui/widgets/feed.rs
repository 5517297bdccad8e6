//! Chat feed widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
        StatefulWidget, Widget, Wrap,
    },
};

use chronochat_core::{ChatLine, LineKind};

use crate::ui::theme::ChatTheme;

/// Widget for the conversation feed.
pub struct ChatFeedWidget<'a> {
    lines: &'a [ChatLine],
    title: String,
    scroll: usize,
    theme: &'a ChatTheme,
    focused: bool,
    busy: bool,
}

impl<'a> ChatFeedWidget<'a> {
    pub fn new(lines: &'a [ChatLine], theme: &'a ChatTheme) -> Self {
        Self {
            lines,
            title: " Chat ".to_string(),
            scroll: 0,
            theme,
            focused: false,
            busy: false,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = format!(" {} ", title.into());
        self
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    pub fn busy(mut self, busy: bool) -> Self {
        self.busy = busy;
        self
    }
}

impl Widget for ChatFeedWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.focused {
            format!("{}[j/k scroll] ", self.title)
        } else {
            self.title.clone()
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let inner = block.inner(area);
        block.render(area, buf);

        // Build display lines from the feed
        let mut lines: Vec<Line> = Vec::new();

        for item in self.lines {
            let style = self.theme.line_style(item.kind);

            match item.kind {
                LineKind::System => {
                    for (i, text) in item.text.lines().enumerate() {
                        let rendered = if i == 0 {
                            format!("[ {text} ]")
                        } else {
                            text.to_string()
                        };
                        lines.push(Line::from(Span::styled(rendered, style)));
                    }
                }
                _ => {
                    for (i, text) in item.text.lines().enumerate() {
                        if i == 0 {
                            lines.push(Line::from(vec![
                                Span::styled(
                                    format!("{}: ", item.sender),
                                    self.theme.sender_style(item.kind),
                                ),
                                Span::styled(text.to_string(), style),
                            ]));
                        } else {
                            lines.push(Line::from(Span::styled(text.to_string(), style)));
                        }
                    }
                }
            }

            // Blank line between entries
            lines.push(Line::from(""));
        }

        // Waiting indicator while a reply is in flight
        if self.busy {
            lines.push(Line::from(Span::styled("▌ ...", self.theme.busy_style())));
        }

        let visible_height = inner.height as usize;
        let total_lines = lines.len();
        let max_scroll = total_lines.saturating_sub(visible_height);
        let scroll = self.scroll.min(max_scroll);

        let paragraph = Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .wrap(Wrap { trim: false });
        paragraph.render(inner, buf);

        // Scrollbar when content overflows
        if total_lines > visible_height {
            let scrollbar_area = Rect {
                x: inner.x + inner.width.saturating_sub(1),
                y: inner.y,
                width: 1,
                height: inner.height,
            };

            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .thumb_style(Style::default().fg(Color::DarkGray))
                .track_style(Style::default().fg(Color::Black))
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            let mut scrollbar_state = ScrollbarState::new(max_scroll).position(scroll);
            scrollbar.render(scrollbar_area, buf, &mut scrollbar_state);

            if scroll < max_scroll {
                let remaining = max_scroll - scroll;
                let hint = format!(" ↓{remaining} more ");
                let hint_y = inner.y + inner.height.saturating_sub(1);
                let hint_style = Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::DIM);
                for (i, ch) in hint.chars().enumerate() {
                    let x = inner.x + (i as u16);
                    if x < inner.x + inner.width.saturating_sub(2) {
                        buf[(x, hint_y)].set_char(ch).set_style(hint_style);
                    }
                }
            }
        }
    }
}
