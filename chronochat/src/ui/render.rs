//! UI rendering

use ratatui::{
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use chronochat_core::SnapshotResult;

use crate::app::{App, InputMode, LoginField, Screen};
use crate::ui::layout::{centered_rect_fixed, AppLayout};
use crate::ui::widgets::{
    ChatFeedWidget, HotkeyBarWidget, InputWidget, SelectionPanelWidget, StatusBarWidget,
};

/// Which panel has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Mode,
    Era,
    Role,
    Target,
    Feed,
}

/// Active overlay popup.
#[derive(Debug, Clone)]
pub enum Overlay {
    /// Help screen
    Help,
    /// A finished scene snapshot
    Snapshot(SnapshotResult),
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    match app.screen {
        Screen::Login => render_login(frame, app),
        Screen::Chat => render_chat(frame, app),
    }
}

// =============================================================================
// Login screen
// =============================================================================

fn render_login(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let area = centered_rect_fixed(56, 18, frame.area());

    frame.render_widget(Clear, area);

    let field_label = |focused: bool| {
        if focused {
            theme
                .border_style(true)
                .add_modifier(Modifier::BOLD)
        } else {
            theme.disabled_style()
        }
    };

    let username_focused = app.login.field == LoginField::Username;
    let password_focused = app.login.field == LoginField::Password;
    let masked: String = app.login.password.chars().map(|_| '*').collect();

    let cursor = |focused: bool| if focused { "_" } else { "" };

    let mut lines = vec![
        Line::from(Span::styled(
            "Chat with history, anytime.",
            theme.title_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("Username: ", field_label(username_focused)),
            Span::raw(app.login.username.clone()),
            Span::styled(cursor(username_focused), theme.busy_style()),
        ]),
        Line::from(vec![
            Span::styled("Password: ", field_label(password_focused)),
            Span::raw(masked),
            Span::styled(cursor(password_focused), theme.busy_style()),
        ]),
        Line::from(""),
    ];

    if let Some(error) = &app.login.error {
        lines.push(Line::from(Span::styled(error.clone(), theme.error_style())));
        lines.push(Line::from(""));
    }

    if let Some(capsule) = &app.capsule {
        lines.push(Line::from(Span::styled(
            "Today's Time Capsule",
            theme.title_style().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            capsule.clone(),
            theme.disabled_style(),
        )));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled(
        "Enter sign in | Tab switch field | Esc quit",
        theme.disabled_style(),
    )));

    let panel = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" ChronoChat ")
                .title_style(theme.title_style().add_modifier(Modifier::BOLD))
                .borders(Borders::ALL)
                .border_style(theme.border_style(true)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(panel, area);
}

// =============================================================================
// Chat screen
// =============================================================================

fn render_chat(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let layout = AppLayout::calculate(frame.area());

    // Title bar
    let mut title_spans = vec![Span::styled(
        " ChronoChat ",
        theme.title_style().add_modifier(Modifier::BOLD),
    )];
    if let Some(era) = app.session.current_era() {
        title_spans.push(Span::styled(era.name.clone(), theme.disabled_style()));
    }
    frame.render_widget(Paragraph::new(Line::from(title_spans)), layout.title_area);

    // Selection sidebar
    let sections = app.sections();
    let sidebar_focused = app.focus != Focus::Feed;
    frame.render_widget(
        SelectionPanelWidget::new(&sections, theme).focused(sidebar_focused),
        layout.sidebar_area,
    );

    // Conversation feed
    let feed_title = match app.session.counterpart_name() {
        Some(name) => name.to_string(),
        None => match app.session.current_era() {
            Some(era) => era.name.clone(),
            None => "Conversation".to_string(),
        },
    };
    let scroll = if app.scroll_locked_to_bottom {
        usize::MAX / 2
    } else {
        app.feed_scroll
    };
    frame.render_widget(
        ChatFeedWidget::new(app.session.lines(), theme)
            .title(feed_title)
            .scroll(scroll)
            .focused(app.focus == Focus::Feed)
            .busy(app.awaiting_reply || app.session.chat_busy()),
        layout.feed_area,
    );

    // Status bar
    frame.render_widget(
        StatusBarWidget::new(app.status_text(), app.input_mode, theme).busy(app.busy_label()),
        layout.status_bar,
    );

    // Hotkey hints
    frame.render_widget(
        HotkeyBarWidget::new(app.input_mode, app.session.chat_ready(), theme),
        layout.hotkey_bar,
    );

    // Input line
    frame.render_widget(
        InputWidget::new(app.input_buffer(), theme)
            .cursor_position(app.cursor_position())
            .active(app.input_mode != InputMode::Normal)
            .command_mode(app.input_mode == InputMode::Command),
        layout.input_area,
    );

    // Overlays on top
    if let Some(overlay) = app.overlay() {
        match overlay {
            Overlay::Help => render_help_overlay(frame, app),
            Overlay::Snapshot(snapshot) => render_snapshot_overlay(frame, app, snapshot),
        }
    }
}

// =============================================================================
// Overlays
// =============================================================================

fn render_help_overlay(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let area = centered_rect_fixed(58, 24, frame.area());

    frame.render_widget(Clear, area);

    let header =
        |text: &'static str| Line::from(Span::styled(text, theme.title_style().add_modifier(Modifier::BOLD)));

    let lines = vec![
        header("Navigation"),
        Line::from("  Tab / Shift+Tab   cycle panels"),
        Line::from("  j/k or arrows     move cursor / scroll feed"),
        Line::from("  Enter             choose the highlighted entry"),
        Line::from("  g / G             feed top / bottom"),
        Line::from(""),
        header("Chat"),
        Line::from("  i or a            type a message"),
        Line::from("  Enter             send (while typing)"),
        Line::from("  Esc               back to normal mode"),
        Line::from("  s                 take a scene snapshot"),
        Line::from("  b                 start over from mode selection"),
        Line::from("  Backspace         deselect counterpart (in Chat With)"),
        Line::from(""),
        header("Commands"),
        Line::from("  :snapshot         take a scene snapshot"),
        Line::from("  :export [path]    export the transcript as HTML"),
        Line::from("  :logout           sign out"),
        Line::from("  :q                quit"),
        Line::from(""),
        Line::from(Span::styled("Press Esc to close", theme.disabled_style())),
    ];

    let help = Paragraph::new(lines).block(
        Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(theme.border_style(true)),
    );

    frame.render_widget(help, area);
}

fn render_snapshot_overlay(frame: &mut Frame, app: &App, snapshot: &SnapshotResult) {
    let theme = &app.theme;
    let area = centered_rect_fixed(64, 12, frame.area());

    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(
            snapshot.title.clone(),
            theme.title_style().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Saved to:"),
        Line::from(Span::styled(
            format!("  {}", snapshot.path.display()),
            theme.disabled_style(),
        )),
        Line::from(""),
        Line::from(snapshot.share_line.clone()),
        Line::from(""),
        Line::from(Span::styled("Press Esc to close", theme.disabled_style())),
    ];

    let modal = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Scene Snapshot ")
                .borders(Borders::ALL)
                .border_style(theme.border_style(true)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(modal, area);
}
