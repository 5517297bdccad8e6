//! Era-hopping roleplay chat engine with AI counterparts.
//!
//! This crate provides:
//! - A catalog of historical and speculative eras with roles, authored AI
//!   personas, and scripted mock characters
//! - A forced-linear selection state machine (mode, era, role, counterpart)
//! - Conversation sessions backed by Gemini, with a bounded context window
//!   and per-counterpart system instructions
//! - Scene snapshots via Imagen, saved locally with a shareable line
//! - A login gate, a daily capsule prompt, and transcript export
//!
//! # Quick Start
//!
//! ```ignore
//! use chronochat_core::{Catalog, ChatMode, ChatSession, TargetKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = ChatSession::from_env(Catalog::builtin())?;
//!
//!     session.choose_mode(ChatMode::Learn);
//!     session.choose_era("renaissance-europe")?;
//!     session.choose_role("apprentice-artist").await?;
//!     session.choose_target(TargetKind::Ai, "leonardo-da-vinci").await?;
//!
//!     session.send_message("Maestro, how do you mix your pigments?").await?;
//!     for line in session.lines() {
//!         println!("{}: {}", line.sender, line.text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod capsule;
pub mod catalog;
pub mod context;
pub mod export;
pub mod markdown;
pub mod provider;
pub mod selection;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod testing;
pub mod transcript;

// Primary public API
pub use catalog::{AiPersona, Catalog, Era, MockParticipant, Role, GENERAL_ERA_AI};
pub use context::{AssembledContext, ContextError, SeedWelcome};
pub use provider::{Provider, ProviderError};
pub use selection::{
    ActiveSelection, ChatMode, ChatTarget, Controls, SelectionError, SelectionState, Selector,
    TargetKind, TargetOption,
};
pub use session::{ChatLine, ChatSession, LineKind, SessionError, SnapshotResult};
pub use storage::{KvStore, StoreError};
pub use testing::{MockProvider, TestSession};
pub use transcript::{Speaker, Transcript, Turn};
