//! Main application state and logic

use std::collections::VecDeque;
use std::path::PathBuf;

use chronochat_core::storage::KvStore;
use chronochat_core::{ChatMode, ChatSession, ChatTarget, TargetKind};

use crate::ui::theme::ChatTheme;
use crate::ui::widgets::{PickerEntry, PickerSection};
use crate::ui::{Focus, Overlay};

/// Vim-style input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal mode - navigation and hotkeys (default)
    #[default]
    Normal,
    /// Insert mode - free text input
    Insert,
    /// Command mode - entering : commands
    Command,
}

/// Which screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Chat,
}

/// Which login field is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

/// State of the login form.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub field: LoginField,
    pub error: Option<String>,
}

impl LoginForm {
    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            LoginField::Username => LoginField::Password,
            LoginField::Password => LoginField::Username,
        };
    }

    pub fn type_char(&mut self, c: char) {
        match self.field {
            LoginField::Username => self.username.push(c),
            LoginField::Password => self.password.push(c),
        }
    }

    pub fn backspace(&mut self) {
        match self.field {
            LoginField::Username => {
                self.username.pop();
            }
            LoginField::Password => {
                self.password.pop();
            }
        }
    }

    pub fn clear(&mut self) {
        self.username.clear();
        self.password.clear();
        self.field = LoginField::Username;
        self.error = None;
    }
}

/// A selection-flow action picked in the sidebar, executed by the main loop.
#[derive(Debug, Clone)]
pub enum SelectAction {
    Mode(ChatMode),
    Era(String),
    Role(String),
    Target(TargetKind, String),
    ClearTarget,
    Back,
}

/// Main application state
pub struct App {
    pub session: ChatSession,
    pub store: KvStore,

    // UI state
    pub theme: ChatTheme,
    pub screen: Screen,
    pub login: LoginForm,
    /// Daily capsule prompt shown on the login screen.
    pub capsule: Option<String>,
    pub focus: Focus,
    overlay: Option<Overlay>,

    // Sidebar cursors, one per picker
    pub mode_cursor: usize,
    pub era_cursor: usize,
    pub role_cursor: usize,
    pub target_cursor: usize,

    // Feed display
    pub feed_scroll: usize,
    pub scroll_locked_to_bottom: bool,

    // Input state
    pub input_mode: InputMode,
    input_buffer: String,
    cursor_position: usize,
    pub input_history: VecDeque<String>,
    pub history_index: Option<usize>,
    pub saved_input: Option<String>,

    // Status
    status_message: Option<String>,
    pub should_quit: bool,

    // A request is in flight; drives the busy indicators across draws
    pub awaiting_reply: bool,
    pub awaiting_snapshot: bool,

    // Async work requested by the event layer, drained by the main loop
    pub pending_select: Option<SelectAction>,
    pub pending_snapshot: bool,
    pub pending_export: Option<PathBuf>,
    pub pending_login: Option<(String, String)>,
    pub pending_logout: bool,
}

impl App {
    /// Create the application over an open session and store.
    pub fn new(session: ChatSession, store: KvStore, logged_in: bool) -> Self {
        Self {
            session,
            store,
            theme: ChatTheme::default(),
            screen: if logged_in { Screen::Chat } else { Screen::Login },
            login: LoginForm::default(),
            capsule: None,
            focus: Focus::default(),
            overlay: None,
            mode_cursor: 0,
            era_cursor: 0,
            role_cursor: 0,
            target_cursor: 0,
            feed_scroll: 0,
            scroll_locked_to_bottom: true,
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            cursor_position: 0,
            input_history: VecDeque::with_capacity(100),
            history_index: None,
            saved_input: None,
            status_message: None,
            should_quit: false,
            awaiting_reply: false,
            awaiting_snapshot: false,
            pending_select: None,
            pending_snapshot: false,
            pending_export: None,
            pending_login: None,
            pending_logout: false,
        }
    }

    // =========================================================================
    // Selection sidebar
    // =========================================================================

    /// Build the sidebar picker sections from the session state.
    pub fn sections(&self) -> Vec<PickerSection> {
        let state = self.session.state();
        let controls = state.controls();

        let mode_entries = ChatMode::all()
            .iter()
            .map(|mode| PickerEntry {
                label: mode.label().to_string(),
                chosen: state.mode() == Some(*mode),
            })
            .collect();

        let era_entries = self
            .session
            .catalog()
            .eras()
            .iter()
            .map(|era| PickerEntry {
                label: era.name.clone(),
                chosen: state.era_id() == Some(era.id.as_str()),
            })
            .collect();

        let role_entries = match self.session.current_era() {
            Some(era) => era
                .roles
                .iter()
                .map(|role| PickerEntry {
                    label: format!("{} ({})", role.name, role.description),
                    chosen: state.role_id() == Some(role.id.as_str()),
                })
                .collect(),
            None => Vec::new(),
        };

        let chosen_target = self.session.selection().map(|s| s.target.clone());
        let target_entries = self
            .session
            .offered_targets()
            .into_iter()
            .map(|option| {
                let chosen = chosen_target.as_ref().is_some_and(|target| match target {
                    ChatTarget::Persona { id } => option.kind == TargetKind::Ai && *id == option.id,
                    ChatTarget::Mock { id } => option.kind == TargetKind::Mock && *id == option.id,
                    ChatTarget::Group => false,
                });
                PickerEntry {
                    label: option.label,
                    chosen,
                }
            })
            .collect();

        vec![
            PickerSection {
                title: "Mode",
                entries: mode_entries,
                cursor: self.mode_cursor,
                enabled: true,
                focused: self.focus == Focus::Mode,
            },
            PickerSection {
                title: "Destination",
                entries: era_entries,
                cursor: self.era_cursor,
                enabled: controls.era_enabled,
                focused: self.focus == Focus::Era,
            },
            PickerSection {
                title: "Role",
                entries: role_entries,
                cursor: self.role_cursor,
                enabled: controls.role_enabled,
                focused: self.focus == Focus::Role,
            },
            PickerSection {
                title: "Chat With",
                entries: target_entries,
                cursor: self.target_cursor,
                enabled: controls.target_enabled,
                focused: self.focus == Focus::Target,
            },
        ]
    }

    fn focus_enabled(&self, focus: Focus) -> bool {
        let controls = self.session.state().controls();
        match focus {
            Focus::Mode | Focus::Feed => true,
            Focus::Era => controls.era_enabled,
            Focus::Role => controls.role_enabled,
            Focus::Target => controls.target_enabled,
        }
    }

    /// Cycle focus forward, skipping pickers that are locked.
    pub fn cycle_focus(&mut self) {
        let order = [Focus::Mode, Focus::Era, Focus::Role, Focus::Target, Focus::Feed];
        let start = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        for step in 1..=order.len() {
            let next = order[(start + step) % order.len()];
            if self.focus_enabled(next) {
                self.focus = next;
                return;
            }
        }
    }

    /// Cycle focus backward, skipping pickers that are locked.
    pub fn cycle_focus_reverse(&mut self) {
        let order = [Focus::Mode, Focus::Era, Focus::Role, Focus::Target, Focus::Feed];
        let start = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        for step in 1..=order.len() {
            let next = order[(start + order.len() - step) % order.len()];
            if self.focus_enabled(next) {
                self.focus = next;
                return;
            }
        }
    }

    fn focused_list_len(&self) -> usize {
        match self.focus {
            Focus::Mode => ChatMode::all().len(),
            Focus::Era => self.session.catalog().eras().len(),
            Focus::Role => self
                .session
                .current_era()
                .map(|era| era.roles.len())
                .unwrap_or(0),
            Focus::Target => self.session.offered_targets().len(),
            Focus::Feed => 0,
        }
    }

    fn focused_cursor_mut(&mut self) -> Option<&mut usize> {
        match self.focus {
            Focus::Mode => Some(&mut self.mode_cursor),
            Focus::Era => Some(&mut self.era_cursor),
            Focus::Role => Some(&mut self.role_cursor),
            Focus::Target => Some(&mut self.target_cursor),
            Focus::Feed => None,
        }
    }

    /// Move the cursor in the focused picker.
    pub fn picker_up(&mut self) {
        if let Some(cursor) = self.focused_cursor_mut() {
            *cursor = cursor.saturating_sub(1);
        }
    }

    /// Move the cursor in the focused picker.
    pub fn picker_down(&mut self) {
        let len = self.focused_list_len();
        if let Some(cursor) = self.focused_cursor_mut() {
            if len > 0 {
                *cursor = (*cursor + 1).min(len - 1);
            }
        }
    }

    /// Commit the focused picker row as a selection action.
    pub fn choose_current(&mut self) {
        let action = match self.focus {
            Focus::Mode => ChatMode::all()
                .get(self.mode_cursor)
                .copied()
                .map(SelectAction::Mode),
            Focus::Era => self
                .session
                .catalog()
                .eras()
                .get(self.era_cursor)
                .map(|era| SelectAction::Era(era.id.clone())),
            Focus::Role => self.session.current_era().and_then(|era| {
                era.roles
                    .get(self.role_cursor)
                    .map(|role| SelectAction::Role(role.id.clone()))
            }),
            Focus::Target => self
                .session
                .offered_targets()
                .get(self.target_cursor)
                .map(|option| SelectAction::Target(option.kind, option.id.clone())),
            Focus::Feed => None,
        };

        if action.is_some() {
            self.pending_select = action;
        }
    }

    /// Advance focus after a committed choice, following the forced order.
    pub fn advance_focus(&mut self) {
        let controls = self.session.state().controls();
        self.focus = if self.session.chat_ready() {
            Focus::Feed
        } else if controls.target_enabled {
            Focus::Target
        } else if controls.role_enabled {
            Focus::Role
        } else if controls.era_enabled {
            Focus::Era
        } else {
            Focus::Mode
        };
    }

    /// Clamp picker cursors after the underlying lists changed.
    pub fn clamp_cursors(&mut self) {
        let eras = self.session.catalog().eras().len();
        self.era_cursor = self.era_cursor.min(eras.saturating_sub(1));
        let roles = self
            .session
            .current_era()
            .map(|era| era.roles.len())
            .unwrap_or(0);
        self.role_cursor = self.role_cursor.min(roles.saturating_sub(1));
        let targets = self.session.offered_targets().len();
        self.target_cursor = self.target_cursor.min(targets.saturating_sub(1));
    }

    // =========================================================================
    // Input modes
    // =========================================================================

    /// Enter command mode (starts with :)
    pub fn enter_command_mode(&mut self) {
        self.input_mode = InputMode::Command;
        self.input_buffer.clear();
        self.input_buffer.push(':');
        self.cursor_position = 1;
    }

    /// Exit to normal mode
    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        if self.input_buffer.starts_with(':') {
            self.input_buffer.clear();
            self.cursor_position = 0;
        }
    }

    /// Submit current input
    pub fn submit_input(&mut self) -> Option<String> {
        if self.input_buffer.is_empty() {
            return None;
        }

        let input = std::mem::take(&mut self.input_buffer);
        self.cursor_position = 0;

        if !input.starts_with(':') {
            self.input_history.push_front(input.clone());
            if self.input_history.len() > 100 {
                self.input_history.pop_back();
            }
        }
        self.history_index = None;
        self.saved_input = None;

        Some(input)
    }

    /// Handle a typed character (unicode-safe)
    pub fn type_char(&mut self, c: char) {
        let byte_pos = self
            .input_buffer
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.input_buffer.len());
        self.input_buffer.insert(byte_pos, c);
        self.cursor_position += 1;
    }

    /// Handle backspace (unicode-safe)
    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(self.cursor_position)
            {
                self.input_buffer
                    .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
            }
        }
    }

    /// Handle delete (unicode-safe)
    pub fn delete(&mut self) {
        let char_count = self.input_buffer.chars().count();
        if self.cursor_position < char_count {
            if let Some((byte_pos, ch)) = self.input_buffer.char_indices().nth(self.cursor_position)
            {
                self.input_buffer
                    .replace_range(byte_pos..byte_pos + ch.len_utf8(), "");
            }
        }
    }

    /// Move cursor left
    pub fn cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    /// Move cursor right
    pub fn cursor_right(&mut self) {
        let char_count = self.input_buffer.chars().count();
        self.cursor_position = (self.cursor_position + 1).min(char_count);
    }

    /// Move cursor to start
    pub fn cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    /// Move cursor to end (unicode-safe)
    pub fn cursor_end(&mut self) {
        self.cursor_position = self.input_buffer.chars().count();
    }

    /// Navigate to previous input in history
    pub fn history_prev(&mut self) {
        if self.input_history.is_empty() {
            return;
        }

        if self.history_index.is_none() && !self.input_buffer.is_empty() {
            self.saved_input = Some(self.input_buffer.clone());
        }

        let new_index = match self.history_index {
            None => Some(0),
            Some(i) if i + 1 < self.input_history.len() => Some(i + 1),
            Some(i) => Some(i),
        };

        if let Some(idx) = new_index {
            if let Some(entry) = self.input_history.get(idx) {
                self.input_buffer = entry.clone();
                self.cursor_position = self.input_buffer.chars().count();
                self.history_index = new_index;
            }
        }
    }

    /// Navigate to next input in history
    pub fn history_next(&mut self) {
        match self.history_index {
            None => {}
            Some(0) => {
                self.input_buffer = self.saved_input.take().unwrap_or_default();
                self.cursor_position = self.input_buffer.chars().count();
                self.history_index = None;
            }
            Some(i) => {
                if let Some(entry) = self.input_history.get(i - 1) {
                    self.input_buffer = entry.clone();
                    self.cursor_position = self.input_buffer.chars().count();
                    self.history_index = Some(i - 1);
                }
            }
        }
    }

    // =========================================================================
    // Feed scrolling
    // =========================================================================

    /// Scroll the feed to the bottom and lock it there.
    pub fn scroll_to_bottom(&mut self) {
        self.feed_scroll = usize::MAX / 2;
        self.scroll_locked_to_bottom = true;
    }

    /// Scroll the feed to the top.
    pub fn scroll_to_top(&mut self) {
        self.feed_scroll = 0;
        self.scroll_locked_to_bottom = false;
    }

    /// Conservative line estimate for clamping manual scrolling.
    fn estimate_max_scroll(&self) -> usize {
        const ESTIMATED_WIDTH: usize = 60;
        const ESTIMATED_VISIBLE_HEIGHT: usize = 20;

        let estimated_lines: usize = self
            .session
            .lines()
            .iter()
            .map(|line| {
                line.text
                    .lines()
                    .map(|l| (l.len() / ESTIMATED_WIDTH).max(1))
                    .sum::<usize>()
                    + 1
            })
            .sum();

        estimated_lines.saturating_sub(ESTIMATED_VISIBLE_HEIGHT)
    }

    /// Scroll the feed up (unlocks from bottom).
    pub fn scroll_up(&mut self, lines: usize) {
        let max_scroll = self.estimate_max_scroll();
        if self.feed_scroll > max_scroll {
            self.feed_scroll = max_scroll;
        }
        self.feed_scroll = self.feed_scroll.saturating_sub(lines);
        self.scroll_locked_to_bottom = false;
    }

    /// Scroll the feed down.
    pub fn scroll_down(&mut self, lines: usize) {
        self.feed_scroll = self.feed_scroll.saturating_add(lines);
        let max_scroll = self.estimate_max_scroll();
        self.feed_scroll = self.feed_scroll.min(max_scroll + 100);
    }

    // =========================================================================
    // Commands and overlays
    // =========================================================================

    /// Process a colon command.
    pub fn process_command(&mut self, command: &str) {
        let cmd = command.trim_start_matches(':');
        let parts: Vec<&str> = cmd.split_whitespace().collect();

        let Some(first) = parts.first() else {
            return;
        };

        match *first {
            "q" | "quit" | "exit" => {
                self.should_quit = true;
            }
            "help" | "h" => {
                self.toggle_help();
            }
            "snapshot" | "snap" => {
                self.pending_snapshot = true;
            }
            "export" => {
                let path = parts
                    .get(1)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("chronochat-transcript.html"));
                self.pending_export = Some(path);
            }
            "logout" => {
                self.pending_logout = true;
            }
            "back" => {
                self.pending_select = Some(SelectAction::Back);
            }
            _ => {
                self.set_status(format!("Unknown command: {first}"));
            }
        }
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        if matches!(self.overlay, Some(Overlay::Help)) {
            self.overlay = None;
        } else {
            self.overlay = Some(Overlay::Help);
        }
    }

    /// Close any open overlay
    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Status text: an app-level message overrides session guidance.
    pub fn status_text(&self) -> &str {
        match &self.status_message {
            Some(message) => message,
            None => self.session.status(),
        }
    }

    /// Busy label for the status bar, when a request is in flight.
    pub fn busy_label(&self) -> Option<&'static str> {
        if self.awaiting_snapshot || self.session.snapshot_busy() {
            Some("[snapshot]")
        } else if self.awaiting_reply || self.session.chat_busy() {
            Some("[sending]")
        } else {
            None
        }
    }

    /// Title used for transcript export.
    pub fn export_title(&self) -> String {
        match self.session.current_era() {
            Some(era) => format!("ChronoChat Transcript - {}", era.name),
            None => "ChronoChat Transcript".to_string(),
        }
    }

    /// Set status message (always overwrites)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    /// Clear status message, falling back to session guidance.
    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    // =========================================================================
    // Getters for private fields
    // =========================================================================

    /// Get the current overlay
    pub fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    /// Check if an overlay is currently open
    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    /// Set the overlay
    pub fn set_overlay(&mut self, overlay: Overlay) {
        self.overlay = Some(overlay);
    }

    /// Get the current input buffer
    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    /// Get the current cursor position
    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    /// Clear the input buffer
    pub fn clear_input(&mut self) {
        self.input_buffer.clear();
        self.cursor_position = 0;
    }
}
