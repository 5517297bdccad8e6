//! Model-facing conversation transcript.
//!
//! The transcript records the turns the language model is allowed to see.
//! User turns are stored in their model-facing form (role prefix included),
//! which may differ from what the UI renders. Status lines and errors never
//! enter the transcript.

use gemini::Message;
use serde::{Deserialize, Serialize};

/// Maximum number of turns sent to the model per request.
pub const CONTEXT_WINDOW_TURNS: usize = 10;

/// Who produced a transcript turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    User,
    Model,
}

/// One committed turn of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// An append-only sequence of turns with a bounded view for the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn {
            speaker: Speaker::User,
            text: text.into(),
        });
    }

    pub fn push_model(&mut self, text: impl Into<String>) {
        self.turns.push(Turn {
            speaker: Speaker::Model,
            text: text.into(),
        });
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// The last [`CONTEXT_WINDOW_TURNS`] turns, oldest first.
    pub fn window(&self) -> &[Turn] {
        let start = self.turns.len().saturating_sub(CONTEXT_WINDOW_TURNS);
        &self.turns[start..]
    }

    /// The context window mapped to wire messages, oldest first.
    pub fn context_window(&self) -> Vec<Message> {
        self.window()
            .iter()
            .map(|turn| match turn.speaker {
                Speaker::User => Message::user(&turn.text),
                Speaker::Model => Message::model(&turn.text),
            })
            .collect()
    }
}
