//! Event handling for keyboard and mouse input

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind,
};

use crate::app::{App, InputMode, Screen, SelectAction};
use crate::ui::{Focus, Overlay};

/// Result of event processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Continue running
    Continue,
    /// Quit the application
    Quit,
    /// The UI should be redrawn
    NeedsRedraw,
    /// Input was submitted and should be processed (Enter in insert mode)
    ProcessInput(bool),
}

/// Process a terminal event.
pub fn handle_event(app: &mut App, event: Event) -> EventResult {
    match event {
        Event::Key(key) => handle_key_event(app, key),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse),
        Event::Resize(_, _) => EventResult::NeedsRedraw,
        _ => EventResult::Continue,
    }
}

fn handle_key_event(app: &mut App, key: KeyEvent) -> EventResult {
    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return EventResult::Quit;
    }

    if app.screen == Screen::Login {
        return handle_login_key(app, key);
    }

    // Overlay keys take priority
    if app.has_overlay() {
        return handle_overlay_key(app, key);
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Insert => handle_insert_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
    }
}

fn handle_mouse_event(app: &mut App, mouse: MouseEvent) -> EventResult {
    if app.screen != Screen::Chat {
        return EventResult::Continue;
    }
    match mouse.kind {
        MouseEventKind::ScrollUp => {
            app.scroll_up(3);
            EventResult::NeedsRedraw
        }
        MouseEventKind::ScrollDown => {
            app.scroll_down(3);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

// =============================================================================
// Login screen
// =============================================================================

fn handle_login_key(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => EventResult::Quit,
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
            app.login.toggle_field();
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => {
            let username = app.login.username.clone();
            let password = app.login.password.clone();
            app.pending_login = Some((username, password));
            EventResult::NeedsRedraw
        }
        KeyCode::Backspace => {
            app.login.backspace();
            EventResult::NeedsRedraw
        }
        KeyCode::Char(c) => {
            app.login.type_char(c);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

// =============================================================================
// Overlays
// =============================================================================

fn handle_overlay_key(app: &mut App, key: KeyEvent) -> EventResult {
    let is_help = matches!(app.overlay(), Some(Overlay::Help));
    match key.code {
        KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') => {
            app.close_overlay();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('?') if is_help => {
            app.close_overlay();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

// =============================================================================
// Normal mode
// =============================================================================

fn handle_normal_mode(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Char('q') => EventResult::Quit,
        KeyCode::Char('i') => {
            if app.session.chat_ready() {
                app.input_mode = InputMode::Insert;
                app.focus = Focus::Feed;
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Char('a') => {
            if app.session.chat_ready() {
                app.input_mode = InputMode::Insert;
                app.focus = Focus::Feed;
                app.cursor_end();
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Char(':') => {
            app.enter_command_mode();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('?') | KeyCode::F(1) => {
            app.toggle_help();
            EventResult::NeedsRedraw
        }
        KeyCode::Tab => {
            app.cycle_focus();
            EventResult::NeedsRedraw
        }
        KeyCode::BackTab => {
            app.cycle_focus_reverse();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.focus == Focus::Feed {
                app.scroll_down(1);
            } else {
                app.picker_down();
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Char('k') | KeyCode::Up => {
            if app.focus == Focus::Feed {
                app.scroll_up(1);
            } else {
                app.picker_up();
            }
            EventResult::NeedsRedraw
        }
        KeyCode::PageUp => {
            app.scroll_up(10);
            EventResult::NeedsRedraw
        }
        KeyCode::PageDown => {
            app.scroll_down(10);
            EventResult::NeedsRedraw
        }
        KeyCode::Char('G') => {
            app.scroll_to_bottom();
            EventResult::NeedsRedraw
        }
        KeyCode::Char('g') => {
            app.scroll_to_top();
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => {
            if app.focus != Focus::Feed {
                app.choose_current();
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Char('s') => {
            if app.session.chat_ready() {
                app.pending_snapshot = true;
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Char('b') => {
            app.pending_select = Some(SelectAction::Back);
            EventResult::NeedsRedraw
        }
        KeyCode::Backspace | KeyCode::Delete => {
            if app.focus == Focus::Target && app.session.selection().is_some() {
                app.pending_select = Some(SelectAction::ClearTarget);
            }
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

// =============================================================================
// Insert mode
// =============================================================================

fn handle_insert_mode(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => EventResult::ProcessInput(true),
        KeyCode::Char(c) => {
            app.type_char(c);
            EventResult::NeedsRedraw
        }
        KeyCode::Backspace => {
            app.backspace();
            EventResult::NeedsRedraw
        }
        KeyCode::Delete => {
            app.delete();
            EventResult::NeedsRedraw
        }
        KeyCode::Left => {
            app.cursor_left();
            EventResult::NeedsRedraw
        }
        KeyCode::Right => {
            app.cursor_right();
            EventResult::NeedsRedraw
        }
        KeyCode::Home => {
            app.cursor_home();
            EventResult::NeedsRedraw
        }
        KeyCode::End => {
            app.cursor_end();
            EventResult::NeedsRedraw
        }
        KeyCode::Up => {
            app.history_prev();
            EventResult::NeedsRedraw
        }
        KeyCode::Down => {
            app.history_next();
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}

// =============================================================================
// Command mode
// =============================================================================

fn handle_command_mode(app: &mut App, key: KeyEvent) -> EventResult {
    match key.code {
        KeyCode::Esc => {
            app.enter_normal_mode();
            EventResult::NeedsRedraw
        }
        KeyCode::Enter => {
            if let Some(command) = app.submit_input() {
                app.process_command(&command);
            }
            app.input_mode = InputMode::Normal;
            EventResult::NeedsRedraw
        }
        KeyCode::Backspace => {
            if app.input_buffer() == ":" {
                app.enter_normal_mode();
            } else {
                app.backspace();
            }
            EventResult::NeedsRedraw
        }
        KeyCode::Char(c) => {
            app.type_char(c);
            EventResult::NeedsRedraw
        }
        _ => EventResult::Continue,
    }
}
