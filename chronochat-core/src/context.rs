//! Context assembly for a resolved selection.
//!
//! Assembly turns an [`ActiveSelection`] into the system instruction, the
//! counterpart's display name, the session note shown when the chat opens,
//! and the seed welcome (if any) that becomes the transcript's first model
//! turn. Follow-up sends reuse the assembled instruction with a single
//! appended request to weigh prior turns, regardless of counterpart kind.

use std::collections::HashMap;

use crate::catalog::{Catalog, Era, MockParticipant, Role, GENERAL_ERA_AI};
use crate::selection::{ActiveSelection, ChatTarget};
use thiserror::Error;

/// Appended to the assembled instruction on every follow-up send.
pub const HISTORY_CLAUSE: &str = " Consider previous messages in history.";

/// Stand-in role name when a mock's role id does not resolve.
const UNKNOWN_MOCK_ROLE: &str = "denizen of this era";

/// Errors resolving a selection against the catalog.
///
/// A selection built through the state machine never trips these with the
/// same catalog; they exist so a stale or foreign selection fails with a
/// name instead of a panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("era {0:?} is not in the catalog")]
    EraNotFound(String),

    #[error("role {0:?} is not in this era")]
    RoleNotFound(String),

    #[error("persona {0:?} is not in this era")]
    PersonaNotFound(String),

    #[error("mock participant {0:?} is not in this era")]
    MockNotFound(String),
}

/// How the conversation opens from the model's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedWelcome {
    /// No opening model turn. The group chat starts silent.
    None,
    /// A canned opening line, committed as the first model turn.
    Canned(String),
    /// Ask the model to improvise a greeting with this one-shot request.
    Generate { request: String },
}

/// Everything a chat session needs to talk to the model for one selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext {
    /// System instruction sent with the first request.
    pub instruction: String,
    /// Display name the counterpart's turns are attributed to.
    pub counterpart_name: String,
    /// Status line announcing the new conversation.
    pub session_note: String,
    pub seed: SeedWelcome,
}

impl AssembledContext {
    /// Instruction for follow-up sends: the assembled instruction plus a
    /// request to weigh prior turns.
    pub fn send_instruction(&self) -> String {
        format!("{}{}", self.instruction, HISTORY_CLAUSE)
    }
}

/// Assemble the context for a resolved selection.
pub fn assemble(
    catalog: &Catalog,
    selection: &ActiveSelection,
) -> Result<AssembledContext, ContextError> {
    let era = catalog
        .era(&selection.era_id)
        .ok_or_else(|| ContextError::EraNotFound(selection.era_id.clone()))?;
    let role = era
        .role(&selection.role_id)
        .ok_or_else(|| ContextError::RoleNotFound(selection.role_id.clone()))?;

    match &selection.target {
        ChatTarget::Group => Ok(AssembledContext {
            instruction: group_instruction(era, role),
            counterpart_name: guide_name(era),
            session_note: format!(
                "You have joined the {} group chat as a {}. The Era Guide AI is present. \
                 Other participants may join or speak.",
                era.name, role.name
            ),
            seed: SeedWelcome::None,
        }),

        ChatTarget::Persona { id } if id == GENERAL_ERA_AI => Ok(AssembledContext {
            instruction: format!(
                "{}{}",
                general_guide_instruction(era, role),
                binding_clause(role)
            ),
            counterpart_name: guide_name(era),
            session_note: private_chat_note(&guide_name(era)),
            seed: SeedWelcome::Canned(format!(
                "Hello, {}. I am the {} Guide. How can I assist you in your explorations today?",
                role.name, era.name
            )),
        }),

        ChatTarget::Persona { id } => {
            let persona = era
                .persona(id)
                .ok_or_else(|| ContextError::PersonaNotFound(id.clone()))?;
            Ok(AssembledContext {
                instruction: format!("{}{}", persona.instruction, binding_clause(role)),
                counterpart_name: persona.name.clone(),
                session_note: private_chat_note(&persona.name),
                seed: SeedWelcome::Canned(persona.welcome.clone()),
            })
        }

        ChatTarget::Mock { id } => {
            let mock = era
                .mock(id)
                .ok_or_else(|| ContextError::MockNotFound(id.clone()))?;
            let mock_role = mock_role_name(era, mock);
            let seed = match &mock.welcome {
                Some(welcome) => SeedWelcome::Canned(welcome.clone()),
                None => SeedWelcome::Generate {
                    request: format!(
                        "Hello! I'm a {}. Please greet me as {}, the {}. \
                         Keep it brief and in character.",
                        role.name, mock.name, mock_role
                    ),
                },
            };
            Ok(AssembledContext {
                instruction: mock_instruction(era, role, &mock.name, mock_role),
                counterpart_name: mock.name.clone(),
                session_note: format!(
                    "You are now in a private chat with {} (who is a {}). \
                     This is a simulated chat.",
                    mock.name, mock_role
                ),
                seed,
            })
        }
    }
}

pub fn guide_name(era: &Era) -> String {
    format!("{} Guide", era.name)
}

fn group_instruction(era: &Era, role: &Role) -> String {
    format!(
        "You are the Era Guide AI in a group chat for {}. Users are playing different roles. \
         The current user is a {}. Facilitate conversation, provide historical context, and \
         respond to general queries about the era. Your context is: \"{}\". If a user @mentions \
         you or asks a direct question, prioritize responding to them.",
        era.name, role.name, era.context
    )
}

fn general_guide_instruction(era: &Era, role: &Role) -> String {
    format!(
        "You are an AI guide for ChronoChat, specifically for {}. The user, playing the role \
         of a {}, is chatting directly with you. Your base context is: \"{}\". Engage them \
         based on their role and queries. Maintain the illusion of the time period.",
        era.name, role.name, era.context
    )
}

fn binding_clause(role: &Role) -> String {
    format!(
        " The user you are talking to is playing the role of a {}. Tailor your responses \
         accordingly.",
        role.name
    )
}

fn mock_instruction(era: &Era, role: &Role, mock_name: &str, mock_role: &str) -> String {
    format!(
        "You are an AI simulating a character for ChronoChat. You are pretending to be {}, a \
         {} in {}. The user you are chatting with is a {}. Respond naturally as your character \
         would, based on the era context: \"{}\". Do not reveal you are an AI or that this is \
         a simulation.",
        mock_name, mock_role, era.name, role.name, era.context
    )
}

fn private_chat_note(name: &str) -> String {
    format!("You are now in a private chat with {name} (AI).")
}

pub(crate) fn mock_role_name<'a>(era: &'a Era, mock: &MockParticipant) -> &'a str {
    era.role(&mock.role_id)
        .map(|r| r.name.as_str())
        .unwrap_or(UNKNOWN_MOCK_ROLE)
}

/// Successful one-shot mock greetings, keyed by era and mock id.
///
/// A greeting is recorded only after the model call succeeds, so re-opening
/// a chat with the same mock after a failure retries the request instead of
/// reusing a blank.
#[derive(Debug, Clone, Default)]
pub struct GreetingCache {
    greetings: HashMap<(String, String), String>,
}

impl GreetingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn greeting(&self, era_id: &str, mock_id: &str) -> Option<&str> {
        self.greetings
            .get(&(era_id.to_string(), mock_id.to_string()))
            .map(String::as_str)
    }

    pub fn record(&mut self, era_id: &str, mock_id: &str, text: impl Into<String>) {
        self.greetings
            .insert((era_id.to_string(), mock_id.to_string()), text.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::ChatMode;

    fn selection(era_id: &str, role_id: &str, target: ChatTarget) -> ActiveSelection {
        let mode = match target {
            ChatTarget::Group => ChatMode::Group,
            ChatTarget::Mock { .. } => ChatMode::Dm,
            ChatTarget::Persona { .. } => ChatMode::Learn,
        };
        ActiveSelection {
            mode,
            era_id: era_id.to_string(),
            role_id: role_id.to_string(),
            target,
        }
    }

    #[test]
    fn test_group_assembly() {
        let catalog = Catalog::builtin();
        let context = assemble(
            &catalog,
            &selection("moon-landing-1969", "news-reporter", ChatTarget::Group),
        )
        .unwrap();

        assert!(context.instruction.starts_with(
            "You are the Era Guide AI in a group chat for Moon Landing (July 20, 1969)."
        ));
        assert!(context
            .instruction
            .contains("The current user is a News Reporter."));
        assert!(context
            .instruction
            .ends_with("If a user @mentions you or asks a direct question, prioritize responding to them."));
        assert_eq!(context.counterpart_name, "Moon Landing (July 20, 1969) Guide");
        assert_eq!(
            context.session_note,
            "You have joined the Moon Landing (July 20, 1969) group chat as a News Reporter. \
             The Era Guide AI is present. Other participants may join or speak."
        );
        assert_eq!(context.seed, SeedWelcome::None);
    }

    #[test]
    fn test_general_guide_assembly() {
        let catalog = Catalog::builtin();
        let context = assemble(
            &catalog,
            &selection(
                "ancient-egypt",
                "royal-scribe",
                ChatTarget::Persona {
                    id: GENERAL_ERA_AI.to_string(),
                },
            ),
        )
        .unwrap();

        assert!(context.instruction.starts_with(
            "You are an AI guide for ChronoChat, specifically for Ancient Egypt (1350 BCE)."
        ));
        assert!(context.instruction.ends_with(
            "The user you are talking to is playing the role of a Royal Scribe. \
             Tailor your responses accordingly."
        ));
        assert_eq!(context.counterpart_name, "Ancient Egypt (1350 BCE) Guide");
        assert_eq!(
            context.seed,
            SeedWelcome::Canned(
                "Hello, Royal Scribe. I am the Ancient Egypt (1350 BCE) Guide. \
                 How can I assist you in your explorations today?"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_persona_assembly_seeds_authored_welcome() {
        let catalog = Catalog::builtin();
        let context = assemble(
            &catalog,
            &selection(
                "renaissance-europe",
                "apprentice-artist",
                ChatTarget::Persona {
                    id: "leonardo-da-vinci".to_string(),
                },
            ),
        )
        .unwrap();

        assert_eq!(context.counterpart_name, "Leonardo da Vinci");
        assert_eq!(
            context.session_note,
            "You are now in a private chat with Leonardo da Vinci (AI)."
        );
        let SeedWelcome::Canned(welcome) = &context.seed else {
            panic!("expected a canned welcome");
        };
        assert_eq!(
            welcome,
            "Ah, a new face in Firenze! Buon giorno. I am Leonardo. You find me amidst my \
             studies and creations. What curiosities or inquiries bring you to my attention \
             today?"
        );
        assert!(context
            .instruction
            .contains("playing the role of a Apprentice Artist"));
    }

    #[test]
    fn test_mock_assembly_with_canned_welcome() {
        let catalog = Catalog::builtin();
        let context = assemble(
            &catalog,
            &selection(
                "ancient-egypt",
                "royal-scribe",
                ChatTarget::Mock {
                    id: "bek-baker".to_string(),
                },
            ),
        )
        .unwrap();

        assert_eq!(context.counterpart_name, "Bek");
        assert!(context
            .instruction
            .starts_with("You are an AI simulating a character for ChronoChat."));
        assert!(context
            .instruction
            .contains("pretending to be Bek, a Artisan Baker in Ancient Egypt (1350 BCE)"));
        assert!(context
            .instruction
            .ends_with("Do not reveal you are an AI or that this is a simulation."));
        assert_eq!(
            context.session_note,
            "You are now in a private chat with Bek (who is a Artisan Baker). \
             This is a simulated chat."
        );
        assert!(matches!(context.seed, SeedWelcome::Canned(_)));
    }

    #[test]
    fn test_mock_without_welcome_requests_greeting() {
        let era = Era::new("test-era", "Test Era", "A test era.", "Test context.")
            .with_roles(vec![
                Role::new("traveler", "Traveler", "Just visiting."),
                Role::new("smith", "Blacksmith", "Works the forge."),
            ])
            .with_mocks(vec![MockParticipant::new("anvil-anna", "Anna", "smith")]);
        let catalog = Catalog::new(vec![era]);

        let context = assemble(
            &catalog,
            &ActiveSelection {
                mode: ChatMode::Dm,
                era_id: "test-era".to_string(),
                role_id: "traveler".to_string(),
                target: ChatTarget::Mock {
                    id: "anvil-anna".to_string(),
                },
            },
        )
        .unwrap();

        assert_eq!(
            context.seed,
            SeedWelcome::Generate {
                request: "Hello! I'm a Traveler. Please greet me as Anna, the Blacksmith. \
                          Keep it brief and in character."
                    .to_string()
            }
        );
    }

    #[test]
    fn test_send_instruction_appends_history_clause() {
        let catalog = Catalog::builtin();
        let context = assemble(
            &catalog,
            &selection("cyberpunk-2077", "street-samurai", ChatTarget::Group),
        )
        .unwrap();

        let send = context.send_instruction();
        assert!(send.starts_with(&context.instruction));
        assert!(send.ends_with(" Consider previous messages in history."));
    }

    #[test]
    fn test_stale_selection_fails_with_named_error() {
        let catalog = Catalog::builtin();
        let result = assemble(
            &catalog,
            &selection("lost-continent", "royal-scribe", ChatTarget::Group),
        );
        assert_eq!(
            result,
            Err(ContextError::EraNotFound("lost-continent".to_string()))
        );
    }

    #[test]
    fn test_greeting_cache_roundtrip() {
        let mut cache = GreetingCache::new();
        assert!(cache.greeting("ancient-egypt", "bek-baker").is_none());

        cache.record("ancient-egypt", "bek-baker", "Fresh bread, friend!");
        assert_eq!(
            cache.greeting("ancient-egypt", "bek-baker"),
            Some("Fresh bread, friend!")
        );
        assert!(cache.greeting("renaissance-europe", "bek-baker").is_none());
    }
}
