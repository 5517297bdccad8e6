//! ChatSession - the primary public API for a ChronoChat conversation.
//!
//! A session owns the catalog, the selection state machine, the assembled
//! context, the transcript, and the display feed. UIs drive it with the
//! selection and message methods and render from the accessors; all rules
//! about resets, busy states, and error surfacing live here.

use std::path::PathBuf;

use crate::catalog::{Catalog, Era};
use crate::context::{self, AssembledContext, ContextError, GreetingCache, SeedWelcome};
use crate::provider::{Provider, ProviderError};
use crate::selection::{
    self, ActiveSelection, ChatMode, ChatTarget, SelectionError, SelectionState, Selector,
    TargetKind, TargetOption,
};
use crate::snapshot;
use crate::storage::{self, StoreError};
use crate::transcript::Transcript;
use gemini::Message;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Shown in the feed when context assembly or the opening greeting fails.
pub const INIT_FAILED_MESSAGE: &str =
    "Error initializing your time travel. Please try again or select another option.";

/// Shown in the feed when a send fails after the user's turn is committed.
pub const SEND_FAILED_MESSAGE: &str =
    "An anomaly in the timeline has occurred. Please try sending your message again.";

/// Shown in the feed when image generation or saving fails.
pub const SNAPSHOT_FAILED_MESSAGE: &str =
    "Could not generate snapshot. The timeline is unstable here. Try again later.";

/// Shown in the feed when a snapshot is requested before the chat is live.
pub const SNAPSHOT_NOT_READY_MESSAGE: &str =
    "Please ensure your chat session is fully active before taking a snapshot.";

/// Status line when a send is attempted before initialization.
pub const CANNOT_SEND_MESSAGE: &str = "Cannot send message. Chat session not fully initialized.";

/// Status line when the selection is not complete enough to chat.
pub const INCOMPLETE_SELECTIONS_MESSAGE: &str =
    "Please complete all selections (Era, Role, and specific Chat Target if applicable) to \
     start chatting.";

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("chat session is not fully initialized")]
    NotInitialized,

    #[error("a request is already in flight")]
    Busy,

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("model request failed: {0}")]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No API key configured - set GEMINI_API_KEY environment variable")]
    NoApiKey,
}

/// Kind of a line in the display feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    User,
    Counterpart,
    System,
}

/// One rendered entry in the conversation feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub kind: LineKind,
    /// Attribution shown before the text; empty for bare system notices.
    pub sender: String,
    /// Raw text as produced. Markdown is rendered at the display boundary.
    pub text: String,
    /// Whether the text should pass through the markdown renderer.
    pub markdown: bool,
}

/// A generated and saved scene snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotResult {
    pub title: String,
    pub path: PathBuf,
    pub mime_type: String,
    pub share_line: String,
}

pub struct ChatSession {
    catalog: Catalog,
    provider: Box<dyn Provider>,
    selector: Selector,
    context: Option<AssembledContext>,
    transcript: Transcript,
    greetings: GreetingCache,
    lines: Vec<ChatLine>,
    status: String,
    chat_busy: bool,
    snapshot_busy: bool,
    snapshots_dir: Option<PathBuf>,
}

impl ChatSession {
    pub fn new(catalog: Catalog, provider: Box<dyn Provider>) -> Self {
        Self {
            catalog,
            provider,
            selector: Selector::new(),
            context: None,
            transcript: Transcript::new(),
            greetings: GreetingCache::new(),
            lines: Vec::new(),
            status: String::new(),
            chat_busy: false,
            snapshot_busy: false,
            snapshots_dir: None,
        }
    }

    /// Build a session backed by the live Gemini client, reading the API
    /// key and optional model overrides from the environment.
    pub fn from_env(catalog: Catalog) -> Result<Self, SessionError> {
        let mut client = gemini::Gemini::from_env().map_err(|_| SessionError::NoApiKey)?;
        if let Ok(model) = std::env::var("CHRONOCHAT_TEXT_MODEL") {
            client = client.with_text_model(model);
        }
        if let Ok(model) = std::env::var("CHRONOCHAT_IMAGE_MODEL") {
            client = client.with_image_model(model);
        }
        Ok(Self::new(catalog, Box::new(client)))
    }

    /// Override where snapshots are written.
    pub fn with_snapshots_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshots_dir = Some(dir.into());
        self
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Pick the chat mode. Restarts the whole flow.
    pub fn choose_mode(&mut self, mode: ChatMode) {
        self.selector.choose_mode(mode);
        self.reset_conversation();
        self.status = format!(
            "Mode selected: {}. Please choose your destination.",
            mode.label().to_uppercase()
        );
    }

    /// Pick the destination era. Any running conversation is discarded.
    pub fn choose_era(&mut self, era_id: &str) -> Result<(), SessionError> {
        self.reset_conversation();
        match self.selector.choose_era(&self.catalog, era_id) {
            Ok(()) => {
                if let Some(era) = self.catalog.era(era_id) {
                    self.status =
                        format!("Destination: {}. Now, please choose your role.", era.name);
                }
                Ok(())
            }
            Err(e) => {
                self.status = self.selection_prompt(&e);
                Err(e.into())
            }
        }
    }

    /// Pick the user's role. In group mode the conversation starts
    /// immediately; otherwise the counterpart still has to be chosen.
    pub async fn choose_role(&mut self, role_id: &str) -> Result<(), SessionError> {
        self.reset_conversation();
        match self.selector.choose_role(&self.catalog, role_id) {
            Ok(()) => {
                if self.selector.selection().is_some() {
                    self.initialize().await
                } else {
                    if let Some(name) = self.current_role_name() {
                        self.status = format!("Role: {name}. Now, select who to chat with.");
                    }
                    Ok(())
                }
            }
            Err(e) => {
                self.status = self.selection_prompt(&e);
                Err(e.into())
            }
        }
    }

    /// Pick the conversational counterpart and start the conversation.
    pub async fn choose_target(&mut self, kind: TargetKind, id: &str) -> Result<(), SessionError> {
        self.reset_conversation();
        match self.selector.choose_target(&self.catalog, kind, id) {
            Ok(()) => self.initialize().await,
            Err(e) => {
                self.status = self.selection_prompt(&e);
                Err(e.into())
            }
        }
    }

    /// Drop the counterpart without losing era and role.
    pub fn clear_target(&mut self) {
        self.reset_conversation();
        self.selector.clear_target();
        self.status = "Please select a character or guide to chat with.".to_string();
    }

    /// Return to mode selection, discarding everything.
    pub fn go_back(&mut self) {
        self.selector.go_back();
        self.reset_conversation();
        self.status.clear();
    }

    fn selection_prompt(&self, error: &SelectionError) -> String {
        match error {
            SelectionError::UnknownEra(_) => "Please select a destination.".to_string(),
            SelectionError::RoleNotInEra { .. } => match self.current_era() {
                Some(era) => format!("Please choose your role in {}.", era.name),
                None => "Please select a destination.".to_string(),
            },
            SelectionError::UnknownTarget { .. } | SelectionError::MockNotOffered => {
                "Please select a character or guide to chat with.".to_string()
            }
            SelectionError::ModeNotChosen
            | SelectionError::EraNotChosen
            | SelectionError::RoleNotChosen
            | SelectionError::TargetImplicitInGroup => INCOMPLETE_SELECTIONS_MESSAGE.to_string(),
        }
    }

    // ========================================================================
    // Conversation
    // ========================================================================

    /// Assemble the context for the resolved selection and open the
    /// conversation. Only a mock counterpart without a canned welcome
    /// touches the network here.
    async fn initialize(&mut self) -> Result<(), SessionError> {
        let Some(selection) = self.selector.selection().cloned() else {
            self.status = INCOMPLETE_SELECTIONS_MESSAGE.to_string();
            return Err(SessionError::NotInitialized);
        };

        self.chat_busy = true;
        let result = self.try_initialize(&selection).await;
        self.chat_busy = false;

        match result {
            Ok(()) => {
                debug!(era = %selection.era_id, "conversation opened");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, era = %selection.era_id, "conversation failed to open");
                self.context = None;
                self.push_bare_system(INIT_FAILED_MESSAGE);
                Err(e)
            }
        }
    }

    async fn try_initialize(&mut self, selection: &ActiveSelection) -> Result<(), SessionError> {
        let context = context::assemble(&self.catalog, selection)?;
        self.push_bare_system(context.session_note.clone());

        let seed_text = match &context.seed {
            SeedWelcome::None => None,
            SeedWelcome::Canned(text) => Some(text.clone()),
            SeedWelcome::Generate { request } => {
                Some(self.mock_greeting(selection, &context.instruction, request).await?)
            }
        };
        if let Some(text) = seed_text {
            self.push_line(
                LineKind::Counterpart,
                context.counterpart_name.clone(),
                text.clone(),
                true,
            );
            self.transcript.push_model(text);
        }

        self.context = Some(context);
        Ok(())
    }

    /// One-shot in-character greeting for a mock without a canned welcome.
    /// Successful greetings are cached per era and mock; failures are not,
    /// so re-selecting the same character retries.
    async fn mock_greeting(
        &mut self,
        selection: &ActiveSelection,
        instruction: &str,
        request: &str,
    ) -> Result<String, SessionError> {
        let ChatTarget::Mock { id } = &selection.target else {
            return Err(SessionError::NotInitialized);
        };

        if let Some(cached) = self.greetings.greeting(&selection.era_id, id) {
            debug!(mock = %id, "reusing cached greeting");
            return Ok(cached.to_string());
        }

        let text = self
            .provider
            .generate_text(instruction, vec![Message::user(request)])
            .await?;
        self.greetings.record(&selection.era_id, id, &text);
        Ok(text)
    }

    /// Send a user message and wait for the counterpart's reply.
    ///
    /// Blank input is a silent no-op. The user's turn is committed before
    /// the request goes out; a failed request leaves it in place, surfaces
    /// a retry notice, and re-enables input.
    pub async fn send_message(&mut self, input: &str) -> Result<(), SessionError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(());
        }
        if self.chat_busy {
            return Err(SessionError::Busy);
        }
        let Some(context) = self.context.clone() else {
            self.status = CANNOT_SEND_MESSAGE.to_string();
            return Err(SessionError::NotInitialized);
        };

        let role_name = self
            .current_role_name()
            .unwrap_or_else(|| "Time Traveler".to_string());
        self.push_line(
            LineKind::User,
            format!("You (as {role_name})"),
            input.to_string(),
            true,
        );
        self.transcript
            .push_user(format!("(Speaking as {role_name}): {input}"));

        self.chat_busy = true;
        let result = self
            .provider
            .generate_text(&context.send_instruction(), self.transcript.context_window())
            .await;
        self.chat_busy = false;

        match result {
            Ok(reply) => {
                self.push_line(
                    LineKind::Counterpart,
                    context.counterpart_name.clone(),
                    reply.clone(),
                    true,
                );
                self.transcript.push_model(reply);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "send failed");
                self.push_bare_system(SEND_FAILED_MESSAGE);
                Err(e.into())
            }
        }
    }

    /// Generate a scene snapshot for the live conversation and save it.
    pub async fn take_snapshot(&mut self) -> Result<SnapshotResult, SessionError> {
        if self.snapshot_busy {
            return Err(SessionError::Busy);
        }
        let selection = match self.selector.selection() {
            Some(selection) if self.context.is_some() => selection.clone(),
            _ => {
                self.push_bare_system(SNAPSHOT_NOT_READY_MESSAGE);
                return Err(SessionError::NotInitialized);
            }
        };

        self.snapshot_busy = true;
        let result = self.try_snapshot(&selection).await;
        self.snapshot_busy = false;

        match result {
            Ok(snap) => {
                info!(path = %snap.path.display(), "snapshot saved");
                Ok(snap)
            }
            Err(e) => {
                warn!(error = %e, "snapshot failed");
                self.push_bare_system(SNAPSHOT_FAILED_MESSAGE);
                Err(e)
            }
        }
    }

    async fn try_snapshot(
        &mut self,
        selection: &ActiveSelection,
    ) -> Result<SnapshotResult, SessionError> {
        let prompt = snapshot::scene_prompt(&self.catalog, selection)?;
        debug!(prompt = %prompt, "requesting scene snapshot");

        let image = self.provider.generate_image(&prompt).await?;

        let dir = match &self.snapshots_dir {
            Some(dir) => dir.clone(),
            None => storage::snapshots_dir()?,
        };
        let path = snapshot::save_snapshot(&dir, &selection.era_id, &image).await?;

        let era_name = self
            .current_era()
            .map(|era| era.name.clone())
            .unwrap_or_else(|| selection.era_id.clone());
        Ok(SnapshotResult {
            title: snapshot::modal_title(&era_name),
            path,
            mime_type: image.mime_type,
            share_line: snapshot::share_line(&self.catalog, selection)?,
        })
    }

    fn reset_conversation(&mut self) {
        self.transcript.clear();
        self.lines.clear();
        self.context = None;
    }

    fn push_line(
        &mut self,
        kind: LineKind,
        sender: impl Into<String>,
        text: impl Into<String>,
        markdown: bool,
    ) {
        self.lines.push(ChatLine {
            kind,
            sender: sender.into(),
            text: text.into(),
            markdown,
        });
    }

    fn push_bare_system(&mut self, text: impl Into<String>) {
        self.push_line(LineKind::System, "", text, false);
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn state(&self) -> &SelectionState {
        self.selector.state()
    }

    pub fn selection(&self) -> Option<&ActiveSelection> {
        self.selector.selection()
    }

    /// Whether the conversation is open for sending.
    pub fn chat_ready(&self) -> bool {
        self.context.is_some()
    }

    pub fn chat_busy(&self) -> bool {
        self.chat_busy
    }

    pub fn snapshot_busy(&self) -> bool {
        self.snapshot_busy
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn lines(&self) -> &[ChatLine] {
        &self.lines
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn counterpart_name(&self) -> Option<&str> {
        self.context.as_ref().map(|c| c.counterpart_name.as_str())
    }

    /// Counterparts offered for the current era and mode, once a role is
    /// chosen.
    pub fn offered_targets(&self) -> Vec<TargetOption> {
        let state = self.selector.state();
        match (state.mode(), state.era_id(), state.role_id()) {
            (Some(mode), Some(era_id), Some(_)) => self
                .catalog
                .era(era_id)
                .map(|era| selection::offered_targets(era, mode))
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    pub fn current_era(&self) -> Option<&Era> {
        self.catalog.era(self.selector.state().era_id()?)
    }

    fn current_role_name(&self) -> Option<String> {
        let era = self.current_era()?;
        let role = era.role(self.selector.state().role_id()?)?;
        Some(role.name.clone())
    }
}
