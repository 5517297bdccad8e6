//! Selection state machine: mode → era → role → counterpart.
//!
//! Transitions happen in forced linear order. Each successful transition
//! replaces the whole [`SelectionState`] value; each failed transition
//! reverts to the nearest resolved upstream state and reports what was
//! missing, so the machine is never left partially advanced.
//!
//! # Example
//!
//! ```ignore
//! let catalog = Catalog::builtin();
//! let mut selector = Selector::new();
//! selector.choose_mode(ChatMode::Dm);
//! selector.choose_era(&catalog, "ancient-egypt")?;
//! selector.choose_role(&catalog, "royal-scribe")?;
//! selector.choose_target(&catalog, TargetKind::Ai, GENERAL_ERA_AI)?;
//! assert!(selector.selection().is_some());
//! ```

use crate::catalog::{Catalog, Era, GENERAL_ERA_AI};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from selection transitions.
///
/// The machine has already reverted to a well-defined upstream state when
/// one of these is returned; the caller surfaces a re-selection prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("no chat mode selected")]
    ModeNotChosen,

    #[error("no destination selected")]
    EraNotChosen,

    #[error("no role selected")]
    RoleNotChosen,

    #[error("unknown era: {0:?}")]
    UnknownEra(String),

    #[error("role {role_id:?} is not available in era {era_id:?}")]
    RoleNotInEra { era_id: String, role_id: String },

    #[error("counterpart {id:?} is not offered here")]
    UnknownTarget { id: String },

    #[error("mock counterparts are only offered in dm mode")]
    MockNotOffered,

    #[error("group mode resolves its counterpart implicitly")]
    TargetImplicitInGroup,
}

/// How the user wants to chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatMode {
    /// One-on-one with an AI guide or authored persona.
    Learn,
    /// Direct messages with any counterpart, including mock characters.
    Dm,
    /// The shared era group chat.
    Group,
}

impl ChatMode {
    pub fn all() -> [ChatMode; 3] {
        [ChatMode::Learn, ChatMode::Dm, ChatMode::Group]
    }

    /// Lowercase wire/UI label.
    pub fn label(&self) -> &'static str {
        match self {
            ChatMode::Learn => "learn",
            ChatMode::Dm => "dm",
            ChatMode::Group => "group",
        }
    }

    /// Parse the lowercase label.
    pub fn parse(s: &str) -> Option<ChatMode> {
        match s {
            "learn" => Some(ChatMode::Learn),
            "dm" => Some(ChatMode::Dm),
            "group" => Some(ChatMode::Group),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChatMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Which category of counterpart a target id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Ai,
    Mock,
}

/// The resolved counterpart for a conversation.
///
/// Every consumer (context assembly, send, snapshot) matches exhaustively on
/// this, so a new counterpart category cannot be added without updating each
/// of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatTarget {
    /// The shared era group chat, facilitated by the era guide AI.
    Group,
    /// An authored persona, or the synthesized general guide
    /// (id [`GENERAL_ERA_AI`]).
    Persona { id: String },
    /// A scripted in-era character.
    Mock { id: String },
}

/// A fully-resolved selection: the immutable value a chat session runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSelection {
    pub mode: ChatMode,
    pub era_id: String,
    pub role_id: String,
    pub target: ChatTarget,
}

/// Where the user is in the forced-linear selection flow.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectionState {
    #[default]
    NoMode,
    ModeChosen {
        mode: ChatMode,
    },
    EraChosen {
        mode: ChatMode,
        era_id: String,
    },
    RoleChosen {
        mode: ChatMode,
        era_id: String,
        role_id: String,
    },
    TargetChosen(ActiveSelection),
}

impl SelectionState {
    pub fn mode(&self) -> Option<ChatMode> {
        match self {
            SelectionState::NoMode => None,
            SelectionState::ModeChosen { mode }
            | SelectionState::EraChosen { mode, .. }
            | SelectionState::RoleChosen { mode, .. } => Some(*mode),
            SelectionState::TargetChosen(selection) => Some(selection.mode),
        }
    }

    pub fn era_id(&self) -> Option<&str> {
        match self {
            SelectionState::NoMode | SelectionState::ModeChosen { .. } => None,
            SelectionState::EraChosen { era_id, .. }
            | SelectionState::RoleChosen { era_id, .. } => Some(era_id),
            SelectionState::TargetChosen(selection) => Some(&selection.era_id),
        }
    }

    pub fn role_id(&self) -> Option<&str> {
        match self {
            SelectionState::NoMode
            | SelectionState::ModeChosen { .. }
            | SelectionState::EraChosen { .. } => None,
            SelectionState::RoleChosen { role_id, .. } => Some(role_id),
            SelectionState::TargetChosen(selection) => Some(&selection.role_id),
        }
    }

    /// Enabled/disabled status of every control, derived from the state
    /// alone. There is no toggle logic anywhere else.
    pub fn controls(&self) -> Controls {
        Controls {
            era_enabled: self.mode().is_some(),
            role_enabled: self.era_id().is_some(),
            target_enabled: self.role_id().is_some() && self.mode() != Some(ChatMode::Group),
            chat_enabled: matches!(self, SelectionState::TargetChosen(_)),
        }
    }
}

/// Derived enablement of the selection and chat controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub era_enabled: bool,
    pub role_enabled: bool,
    pub target_enabled: bool,
    pub chat_enabled: bool,
}

/// A counterpart entry offered by the target selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOption {
    pub kind: TargetKind,
    pub id: String,
    pub label: String,
}

/// The counterparts offered for an era under a mode, in display order.
///
/// The general era guide is always first for `learn`/`dm`; authored personas
/// follow; mock characters are appended only in `dm` mode. Group mode offers
/// nothing because its counterpart resolves implicitly.
pub fn offered_targets(era: &Era, mode: ChatMode) -> Vec<TargetOption> {
    if mode == ChatMode::Group {
        return Vec::new();
    }

    let mut options = vec![TargetOption {
        kind: TargetKind::Ai,
        id: GENERAL_ERA_AI.to_string(),
        label: format!("{} Guide (AI)", era.name),
    }];

    for persona in &era.personas {
        options.push(TargetOption {
            kind: TargetKind::Ai,
            id: persona.id.clone(),
            label: format!("{} (AI Persona)", persona.name),
        });
    }

    if mode == ChatMode::Dm {
        for mock in &era.mocks {
            let role_name = era.role(&mock.role_id).map(|r| r.name.as_str()).unwrap_or("...");
            options.push(TargetOption {
                kind: TargetKind::Mock,
                id: mock.id.clone(),
                label: format!("{} (as {role_name})", mock.name),
            });
        }
    }

    options
}

/// The selection state machine.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    state: SelectionState,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// The resolved selection, if the machine has reached `TargetChosen`.
    pub fn selection(&self) -> Option<&ActiveSelection> {
        match &self.state {
            SelectionState::TargetChosen(selection) => Some(selection),
            _ => None,
        }
    }

    /// Choose (or re-choose) the chat mode. Valid from any state; acts as a
    /// reset-and-restart, discarding every downstream choice.
    pub fn choose_mode(&mut self, mode: ChatMode) {
        self.state = SelectionState::ModeChosen { mode };
    }

    /// Choose the destination era. Downstream choices are cleared whether or
    /// not the era resolves; an unknown/empty id leaves the machine waiting
    /// at `ModeChosen`.
    pub fn choose_era(&mut self, catalog: &Catalog, era_id: &str) -> Result<(), SelectionError> {
        let Some(mode) = self.state.mode() else {
            return Err(SelectionError::ModeNotChosen);
        };

        if catalog.era(era_id).is_none() {
            self.state = SelectionState::ModeChosen { mode };
            return Err(SelectionError::UnknownEra(era_id.to_string()));
        }

        self.state = SelectionState::EraChosen {
            mode,
            era_id: era_id.to_string(),
        };
        Ok(())
    }

    /// Choose the user's role within the current era. In group mode the
    /// counterpart resolves implicitly and the machine advances straight to
    /// `TargetChosen`; otherwise it waits for an explicit counterpart. An
    /// unknown id leaves the machine waiting at `EraChosen`.
    pub fn choose_role(&mut self, catalog: &Catalog, role_id: &str) -> Result<(), SelectionError> {
        let mode = self.state.mode().ok_or(SelectionError::ModeNotChosen)?;
        let Some(era_id) = self.state.era_id().map(str::to_string) else {
            return Err(SelectionError::EraNotChosen);
        };

        let Some(era) = catalog.era(&era_id) else {
            self.state = SelectionState::ModeChosen { mode };
            return Err(SelectionError::UnknownEra(era_id));
        };

        if era.role(role_id).is_none() {
            self.state = SelectionState::EraChosen {
                mode,
                era_id: era_id.clone(),
            };
            return Err(SelectionError::RoleNotInEra {
                era_id,
                role_id: role_id.to_string(),
            });
        }

        self.state = if mode == ChatMode::Group {
            SelectionState::TargetChosen(ActiveSelection {
                mode,
                era_id,
                role_id: role_id.to_string(),
                target: ChatTarget::Group,
            })
        } else {
            SelectionState::RoleChosen {
                mode,
                era_id,
                role_id: role_id.to_string(),
            }
        };
        Ok(())
    }

    /// Choose the conversational counterpart. Only valid in `learn`/`dm`
    /// mode with a role chosen; an id that does not resolve within the
    /// current era reverts the machine to `RoleChosen`, disabling sends.
    pub fn choose_target(
        &mut self,
        catalog: &Catalog,
        kind: TargetKind,
        id: &str,
    ) -> Result<(), SelectionError> {
        let mode = self.state.mode().ok_or(SelectionError::ModeNotChosen)?;
        if mode == ChatMode::Group {
            return Err(SelectionError::TargetImplicitInGroup);
        }
        let era_id = self
            .state
            .era_id()
            .map(str::to_string)
            .ok_or(SelectionError::EraNotChosen)?;
        let Some(role_id) = self.state.role_id().map(str::to_string) else {
            return Err(SelectionError::RoleNotChosen);
        };

        let unresolved = SelectionState::RoleChosen {
            mode,
            era_id: era_id.clone(),
            role_id: role_id.clone(),
        };

        let Some(era) = catalog.era(&era_id) else {
            self.state = SelectionState::ModeChosen { mode };
            return Err(SelectionError::UnknownEra(era_id));
        };

        let target = match kind {
            TargetKind::Ai => {
                if id != GENERAL_ERA_AI && era.persona(id).is_none() {
                    self.state = unresolved;
                    return Err(SelectionError::UnknownTarget { id: id.to_string() });
                }
                ChatTarget::Persona { id: id.to_string() }
            }
            TargetKind::Mock => {
                if mode != ChatMode::Dm {
                    self.state = unresolved;
                    return Err(SelectionError::MockNotOffered);
                }
                if era.mock(id).is_none() {
                    self.state = unresolved;
                    return Err(SelectionError::UnknownTarget { id: id.to_string() });
                }
                ChatTarget::Mock { id: id.to_string() }
            }
        };

        self.state = SelectionState::TargetChosen(ActiveSelection {
            mode,
            era_id,
            role_id,
            target,
        });
        Ok(())
    }

    /// Drop the counterpart, reverting to the intermediate `RoleChosen`
    /// state. Used when the target selector is cleared.
    pub fn clear_target(&mut self) {
        if let SelectionState::TargetChosen(selection) = &self.state {
            if selection.mode != ChatMode::Group {
                self.state = SelectionState::RoleChosen {
                    mode: selection.mode,
                    era_id: selection.era_id.clone(),
                    role_id: selection.role_id.clone(),
                };
            }
        }
    }

    /// Return to the top-level mode selection, discarding everything.
    pub fn go_back(&mut self) {
        self.state = SelectionState::NoMode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::builtin()
    }

    fn resolved_dm_selector() -> Selector {
        let catalog = catalog();
        let mut selector = Selector::new();
        selector.choose_mode(ChatMode::Dm);
        selector.choose_era(&catalog, "ancient-egypt").unwrap();
        selector.choose_role(&catalog, "royal-scribe").unwrap();
        selector
            .choose_target(&catalog, TargetKind::Ai, "high-priestess-meritaten")
            .unwrap();
        selector
    }

    #[test]
    fn test_forced_linear_order() {
        let catalog = catalog();
        let mut selector = Selector::new();

        assert_eq!(
            selector.choose_era(&catalog, "ancient-egypt"),
            Err(SelectionError::ModeNotChosen)
        );
        assert_eq!(
            selector.choose_role(&catalog, "royal-scribe"),
            Err(SelectionError::ModeNotChosen)
        );

        selector.choose_mode(ChatMode::Learn);
        assert_eq!(
            selector.choose_role(&catalog, "royal-scribe"),
            Err(SelectionError::EraNotChosen)
        );
        assert_eq!(
            selector.choose_target(&catalog, TargetKind::Ai, GENERAL_ERA_AI),
            Err(SelectionError::EraNotChosen)
        );

        selector.choose_era(&catalog, "ancient-egypt").unwrap();
        assert_eq!(
            selector.choose_target(&catalog, TargetKind::Ai, GENERAL_ERA_AI),
            Err(SelectionError::RoleNotChosen)
        );

        selector.choose_role(&catalog, "royal-scribe").unwrap();
        assert!(selector.selection().is_none());

        selector
            .choose_target(&catalog, TargetKind::Ai, GENERAL_ERA_AI)
            .unwrap();
        assert!(selector.selection().is_some());
    }

    #[test]
    fn test_selection_invariants_hold() {
        let catalog = catalog();
        let selector = resolved_dm_selector();
        let selection = selector.selection().unwrap();

        let era = catalog.era(&selection.era_id).unwrap();
        assert!(era.role(&selection.role_id).is_some());
        match &selection.target {
            ChatTarget::Persona { id } => {
                assert!(id == GENERAL_ERA_AI || era.persona(id).is_some())
            }
            ChatTarget::Mock { id } => assert!(era.mock(id).is_some()),
            ChatTarget::Group => panic!("dm selection resolved to group"),
        }
    }

    #[test]
    fn test_group_mode_auto_resolves_target() {
        let catalog = catalog();
        let mut selector = Selector::new();
        selector.choose_mode(ChatMode::Group);
        selector.choose_era(&catalog, "cyberpunk-2077").unwrap();
        selector.choose_role(&catalog, "info-broker").unwrap();

        let selection = selector.selection().unwrap();
        assert_eq!(selection.target, ChatTarget::Group);

        assert_eq!(
            selector.choose_target(&catalog, TargetKind::Ai, GENERAL_ERA_AI),
            Err(SelectionError::TargetImplicitInGroup)
        );
        assert_eq!(selector.selection().unwrap().target, ChatTarget::Group);
    }

    #[test]
    fn test_unknown_era_reverts_to_mode_chosen() {
        let catalog = catalog();
        let mut selector = Selector::new();
        selector.choose_mode(ChatMode::Learn);
        selector.choose_era(&catalog, "ancient-egypt").unwrap();

        assert!(matches!(
            selector.choose_era(&catalog, "atlantis"),
            Err(SelectionError::UnknownEra(_))
        ));
        assert_eq!(
            *selector.state(),
            SelectionState::ModeChosen {
                mode: ChatMode::Learn
            }
        );

        assert!(matches!(
            selector.choose_era(&catalog, ""),
            Err(SelectionError::UnknownEra(_))
        ));
    }

    #[test]
    fn test_unknown_role_reverts_to_era_chosen() {
        let catalog = catalog();
        let mut selector = Selector::new();
        selector.choose_mode(ChatMode::Dm);
        selector.choose_era(&catalog, "ancient-egypt").unwrap();

        assert!(matches!(
            selector.choose_role(&catalog, "street-samurai"),
            Err(SelectionError::RoleNotInEra { .. })
        ));
        assert_eq!(selector.state().era_id(), Some("ancient-egypt"));
        assert_eq!(selector.state().role_id(), None);
    }

    #[test]
    fn test_unknown_target_reverts_to_role_chosen() {
        let catalog = catalog();
        let mut selector = resolved_dm_selector();

        assert!(matches!(
            selector.choose_target(&catalog, TargetKind::Ai, "nobody"),
            Err(SelectionError::UnknownTarget { .. })
        ));
        assert!(selector.selection().is_none());
        assert_eq!(selector.state().role_id(), Some("royal-scribe"));
    }

    #[test]
    fn test_general_guide_valid_everywhere() {
        let catalog = catalog();
        for era in catalog.eras() {
            for mode in [ChatMode::Learn, ChatMode::Dm] {
                let mut selector = Selector::new();
                selector.choose_mode(mode);
                selector.choose_era(&catalog, &era.id).unwrap();
                selector.choose_role(&catalog, &era.roles[0].id).unwrap();
                selector
                    .choose_target(&catalog, TargetKind::Ai, GENERAL_ERA_AI)
                    .unwrap_or_else(|e| {
                        panic!("guide rejected for {} in {} mode: {e}", era.id, mode)
                    });
            }
        }
    }

    #[test]
    fn test_mock_rejected_outside_dm_mode() {
        let catalog = catalog();
        let mut selector = Selector::new();
        selector.choose_mode(ChatMode::Learn);
        selector.choose_era(&catalog, "ancient-egypt").unwrap();
        selector.choose_role(&catalog, "royal-scribe").unwrap();

        assert_eq!(
            selector.choose_target(&catalog, TargetKind::Mock, "bek-baker"),
            Err(SelectionError::MockNotOffered)
        );
        assert!(selector.selection().is_none());
    }

    #[test]
    fn test_upstream_change_discards_downstream() {
        let catalog = catalog();
        let mut selector = resolved_dm_selector();

        selector.choose_era(&catalog, "renaissance-europe").unwrap();
        assert!(selector.selection().is_none());
        assert_eq!(selector.state().role_id(), None);

        selector.choose_role(&catalog, "apprentice-artist").unwrap();
        selector
            .choose_target(&catalog, TargetKind::Ai, "leonardo-da-vinci")
            .unwrap();
        assert!(selector.selection().is_some());

        selector.choose_mode(ChatMode::Group);
        assert_eq!(
            *selector.state(),
            SelectionState::ModeChosen {
                mode: ChatMode::Group
            }
        );
    }

    #[test]
    fn test_go_back_resets_everything() {
        let mut selector = resolved_dm_selector();
        selector.go_back();
        assert_eq!(*selector.state(), SelectionState::NoMode);
        assert!(selector.selection().is_none());
    }

    #[test]
    fn test_controls_derivation() {
        let catalog = catalog();
        let mut selector = Selector::new();

        let controls = selector.state().controls();
        assert!(!controls.era_enabled && !controls.chat_enabled);

        selector.choose_mode(ChatMode::Dm);
        assert!(selector.state().controls().era_enabled);
        assert!(!selector.state().controls().role_enabled);

        selector.choose_era(&catalog, "ancient-egypt").unwrap();
        assert!(selector.state().controls().role_enabled);
        assert!(!selector.state().controls().target_enabled);

        selector.choose_role(&catalog, "royal-scribe").unwrap();
        let controls = selector.state().controls();
        assert!(controls.target_enabled);
        assert!(!controls.chat_enabled);

        selector
            .choose_target(&catalog, TargetKind::Ai, GENERAL_ERA_AI)
            .unwrap();
        assert!(selector.state().controls().chat_enabled);
    }

    #[test]
    fn test_group_mode_never_enables_target_selector() {
        let catalog = catalog();
        let mut selector = Selector::new();
        selector.choose_mode(ChatMode::Group);
        selector.choose_era(&catalog, "ancient-egypt").unwrap();
        selector.choose_role(&catalog, "royal-scribe").unwrap();

        let controls = selector.state().controls();
        assert!(!controls.target_enabled);
        assert!(controls.chat_enabled);
    }

    #[test]
    fn test_offered_targets_moon_landing_learn() {
        let catalog = catalog();
        let moon = catalog.era("moon-landing-1969").unwrap();

        let options = offered_targets(moon, ChatMode::Learn);
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].id, GENERAL_ERA_AI);
        assert_eq!(options[0].kind, TargetKind::Ai);
    }

    #[test]
    fn test_offered_targets_by_mode() {
        let catalog = catalog();
        let egypt = catalog.era("ancient-egypt").unwrap();

        // learn: guide + 1 persona, no mocks
        let learn = offered_targets(egypt, ChatMode::Learn);
        assert_eq!(learn.len(), 2);
        assert!(learn.iter().all(|o| o.kind == TargetKind::Ai));

        // dm: guide + 1 persona + 2 mocks
        let dm = offered_targets(egypt, ChatMode::Dm);
        assert_eq!(dm.len(), 4);
        assert_eq!(dm.iter().filter(|o| o.kind == TargetKind::Mock).count(), 2);

        assert!(offered_targets(egypt, ChatMode::Group).is_empty());
    }

    #[test]
    fn test_mock_target_label_includes_role() {
        let catalog = catalog();
        let cyberpunk = catalog.era("cyberpunk-2077").unwrap();

        let options = offered_targets(cyberpunk, ChatMode::Dm);
        let rogue = options.iter().find(|o| o.id == "rogue-samurai").unwrap();
        assert_eq!(rogue.label, "Rogue (as Street Samurai)");
    }
}
