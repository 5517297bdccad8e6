//! Testing utilities for ChronoChat.
//!
//! This module provides tools for integration testing:
//! - `MockProvider` for deterministic testing without API calls
//! - `TestSession` for scripted conversation scenarios
//! - Assertion helpers for verifying the display feed

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::catalog::{Catalog, Era, MockParticipant, Role};
use crate::provider::{Provider, ProviderError};
use crate::selection::{ChatMode, TargetKind};
use crate::session::{ChatLine, ChatSession, LineKind, SessionError};
use async_trait::async_trait;
use gemini::{GeneratedImage, Message};

/// A scripted stand-in for the generative backend.
///
/// Replies and failures are queued in order; once the queue is exhausted, a
/// fixed fallback reply is returned. Every call is recorded so tests can
/// inspect the instruction and history that went out. Clones share state,
/// so keep one for assertions after handing one to the session.
#[derive(Clone, Default)]
pub struct MockProvider {
    inner: Arc<MockInner>,
}

#[derive(Default)]
struct MockInner {
    texts: Mutex<VecDeque<Result<String, ProviderError>>>,
    images: Mutex<VecDeque<Result<GeneratedImage, ProviderError>>>,
    text_calls: Mutex<Vec<TextCall>>,
    image_calls: Mutex<Vec<String>>,
}

/// One recorded text-generation call.
#[derive(Debug, Clone)]
pub struct TextCall {
    pub instruction: String,
    pub history: Vec<Message>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the next text reply.
    pub fn queue_text(&self, text: impl Into<String>) {
        self.inner
            .texts
            .lock()
            .expect("mock state poisoned")
            .push_back(Ok(text.into()));
    }

    /// Queue a text-generation failure.
    pub fn queue_text_error(&self, error: ProviderError) {
        self.inner
            .texts
            .lock()
            .expect("mock state poisoned")
            .push_back(Err(error));
    }

    /// Queue the next generated image.
    pub fn queue_image(&self, image: GeneratedImage) {
        self.inner
            .images
            .lock()
            .expect("mock state poisoned")
            .push_back(Ok(image));
    }

    /// Queue an image-generation failure.
    pub fn queue_image_error(&self, error: ProviderError) {
        self.inner
            .images
            .lock()
            .expect("mock state poisoned")
            .push_back(Err(error));
    }

    /// Recorded text calls, oldest first.
    pub fn text_calls(&self) -> Vec<TextCall> {
        self.inner
            .text_calls
            .lock()
            .expect("mock state poisoned")
            .clone()
    }

    /// Recorded image prompts, oldest first.
    pub fn image_calls(&self) -> Vec<String> {
        self.inner
            .image_calls
            .lock()
            .expect("mock state poisoned")
            .clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn generate_text(
        &self,
        instruction: &str,
        history: Vec<Message>,
    ) -> Result<String, ProviderError> {
        self.inner
            .text_calls
            .lock()
            .expect("mock state poisoned")
            .push(TextCall {
                instruction: instruction.to_string(),
                history: history.clone(),
            });
        match self
            .inner
            .texts
            .lock()
            .expect("mock state poisoned")
            .pop_front()
        {
            Some(result) => result,
            None => Ok("There are no more scripted responses.".to_string()),
        }
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ProviderError> {
        self.inner
            .image_calls
            .lock()
            .expect("mock state poisoned")
            .push(prompt.to_string());
        match self
            .inner
            .images
            .lock()
            .expect("mock state poisoned")
            .pop_front()
        {
            Some(result) => result,
            None => Ok(GeneratedImage {
                bytes: vec![0xFF, 0xD8, 0xFF, 0xE0],
                mime_type: "image/jpeg".to_string(),
            }),
        }
    }
}

/// A canned retryable failure for scripting error paths.
pub fn scripted_failure() -> ProviderError {
    ProviderError::Service(gemini::Error::Network("scripted failure".to_string()))
}

/// A minimal era with one silent mock, for exercising generated greetings.
pub fn era_with_silent_mock() -> Era {
    Era::new(
        "frontier-1849",
        "Gold Rush Frontier (1849)",
        "Pan for gold in the untamed American west.",
        "You are in a California mining camp in 1849, at the height of the Gold Rush.",
    )
    .with_roles(vec![
        Role::new("prospector", "Prospector", "Seeking fortune in the riverbeds."),
        Role::new("shopkeeper", "Shopkeeper", "Selling supplies at steep prices."),
    ])
    .with_mocks(vec![MockParticipant::new("sam-prospector", "Sam", "prospector")])
}

/// Harness bundling a session with its scripted provider.
pub struct TestSession {
    pub session: ChatSession,
    pub provider: MockProvider,
}

impl TestSession {
    /// A session over the built-in catalog.
    pub fn new() -> Self {
        Self::with_catalog(Catalog::builtin())
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        let provider = MockProvider::new();
        let session = ChatSession::new(catalog, Box::new(provider.clone()));
        Self { session, provider }
    }

    /// Queue the next model reply.
    pub fn expect_reply(&mut self, text: impl Into<String>) -> &mut Self {
        self.provider.queue_text(text);
        self
    }

    /// Queue a model failure for the next request.
    pub fn expect_failure(&mut self) -> &mut Self {
        self.provider.queue_text_error(scripted_failure());
        self
    }

    /// Walk the selection flow into a group chat.
    pub async fn open_group(&mut self, era_id: &str, role_id: &str) -> Result<(), SessionError> {
        self.session.choose_mode(ChatMode::Group);
        self.session.choose_era(era_id)?;
        self.session.choose_role(role_id).await
    }

    /// Walk the selection flow into a learn or dm conversation.
    pub async fn open_chat(
        &mut self,
        mode: ChatMode,
        era_id: &str,
        role_id: &str,
        kind: TargetKind,
        target_id: &str,
    ) -> Result<(), SessionError> {
        self.session.choose_mode(mode);
        self.session.choose_era(era_id)?;
        self.session.choose_role(role_id).await?;
        self.session.choose_target(kind, target_id).await
    }

    pub fn lines(&self) -> &[ChatLine] {
        self.session.lines()
    }
}

impl Default for TestSession {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert a feed line's kind, sender, and a substring of its text.
#[track_caller]
pub fn assert_line(lines: &[ChatLine], index: usize, kind: LineKind, sender: &str, contains: &str) {
    let line = lines
        .get(index)
        .unwrap_or_else(|| panic!("no line at index {index}, feed has {} lines", lines.len()));
    assert_eq!(line.kind, kind, "line {index} kind");
    assert_eq!(line.sender, sender, "line {index} sender");
    assert!(
        line.text.contains(contains),
        "line {index} text {:?} does not contain {:?}",
        line.text,
        contains
    );
}

/// Assert a feed line is a bare system notice with exactly this text.
#[track_caller]
pub fn assert_bare_system(lines: &[ChatLine], index: usize, text: &str) {
    let line = lines
        .get(index)
        .unwrap_or_else(|| panic!("no line at index {index}, feed has {} lines", lines.len()));
    assert_eq!(line.kind, LineKind::System, "line {index} kind");
    assert_eq!(line.sender, "", "line {index} sender");
    assert_eq!(line.text, text, "line {index} text");
    assert!(!line.markdown, "system notices are not markdown");
}

/// Assert the feed holds exactly this many lines.
#[track_caller]
pub fn assert_feed_len(lines: &[ChatLine], expected: usize) {
    assert_eq!(
        lines.len(),
        expected,
        "feed length mismatch: {:#?}",
        lines.iter().map(|l| &l.text).collect::<Vec<_>>()
    );
}
