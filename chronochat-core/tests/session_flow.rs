//! QA tests for the conversation flow using a scripted provider.
//!
//! These tests verify the full session behavior without API calls:
//! - Selection flow, resets, and status lines
//! - Context assembly and seed welcomes per counterpart kind
//! - The bounded context window and role prefixing on sends
//! - Failure surfacing for opens, sends, and snapshots
//!
//! Run with: cargo test -p chronochat-core --test session_flow

use chronochat_core::selection::SelectionState;
use chronochat_core::session::{
    CANNOT_SEND_MESSAGE, INIT_FAILED_MESSAGE, SEND_FAILED_MESSAGE, SNAPSHOT_FAILED_MESSAGE,
    SNAPSHOT_NOT_READY_MESSAGE,
};
use chronochat_core::testing::{
    assert_bare_system, assert_feed_len, assert_line, era_with_silent_mock, scripted_failure,
    MockProvider, TestSession,
};
use chronochat_core::transcript::Speaker;
use chronochat_core::{
    Catalog, ChatMode, ChatSession, LineKind, SessionError, TargetKind, GENERAL_ERA_AI,
};
use gemini::Role;

/// A harness whose snapshots land in the given directory.
fn session_with_snapshots(dir: &std::path::Path) -> TestSession {
    let provider = MockProvider::new();
    let session = ChatSession::new(Catalog::builtin(), Box::new(provider.clone()))
        .with_snapshots_dir(dir);
    TestSession { session, provider }
}

// =============================================================================
// OPENING CONVERSATIONS
// =============================================================================

#[tokio::test]
async fn test_group_open_is_offline_and_silent() {
    let mut ts = TestSession::new();
    ts.open_group("ancient-egypt", "royal-scribe").await.unwrap();

    assert!(ts.session.chat_ready());
    assert_feed_len(ts.lines(), 1);
    assert_bare_system(
        ts.lines(),
        0,
        "You have joined the Ancient Egypt (1350 BCE) group chat as a Royal Scribe. \
         The Era Guide AI is present. Other participants may join or speak.",
    );
    assert!(ts.session.transcript().is_empty());
    assert_eq!(ts.provider.text_calls().len(), 0);
}

#[tokio::test]
async fn test_persona_open_seeds_authored_welcome_verbatim() {
    let mut ts = TestSession::new();
    ts.open_chat(
        ChatMode::Learn,
        "renaissance-europe",
        "apprentice-artist",
        TargetKind::Ai,
        "leonardo-da-vinci",
    )
    .await
    .unwrap();

    let welcome = "Ah, a new face in Firenze! Buon giorno. I am Leonardo. You find me amidst my \
                   studies and creations. What curiosities or inquiries bring you to my \
                   attention today?";

    assert_feed_len(ts.lines(), 2);
    assert_bare_system(
        ts.lines(),
        0,
        "You are now in a private chat with Leonardo da Vinci (AI).",
    );
    assert_line(ts.lines(), 1, LineKind::Counterpart, "Leonardo da Vinci", welcome);

    assert_eq!(ts.session.transcript().len(), 1);
    assert_eq!(ts.session.transcript().turns()[0].speaker, Speaker::Model);
    assert_eq!(ts.session.transcript().turns()[0].text, welcome);

    // authored welcomes never touch the network
    assert_eq!(ts.provider.text_calls().len(), 0);
}

#[tokio::test]
async fn test_general_guide_open_works_for_every_era() {
    let catalog = Catalog::builtin();
    for era in catalog.eras() {
        for mode in [ChatMode::Learn, ChatMode::Dm] {
            let mut ts = TestSession::new();
            ts.open_chat(mode, &era.id, &era.roles[0].id, TargetKind::Ai, GENERAL_ERA_AI)
                .await
                .unwrap_or_else(|e| panic!("guide open failed for {} in {mode}: {e}", era.id));
            assert!(ts.session.chat_ready());
            assert_eq!(
                ts.session.counterpart_name(),
                Some(format!("{} Guide", era.name).as_str())
            );
        }
    }
}

#[tokio::test]
async fn test_mock_target_rejected_in_learn_mode() {
    let mut ts = TestSession::new();
    let result = ts
        .open_chat(
            ChatMode::Learn,
            "ancient-egypt",
            "royal-scribe",
            TargetKind::Mock,
            "bek-baker",
        )
        .await;

    assert!(matches!(result, Err(SessionError::Selection(_))));
    assert!(!ts.session.chat_ready());
    assert_eq!(
        ts.session.status(),
        "Please select a character or guide to chat with."
    );

    // the machine waits at the intermediate state, role intact
    assert_eq!(ts.session.state().role_id(), Some("royal-scribe"));
    assert!(ts.session.selection().is_none());
}

#[tokio::test]
async fn test_moon_landing_learn_offers_exactly_the_guide() {
    let mut ts = TestSession::new();
    ts.session.choose_mode(ChatMode::Learn);
    ts.session.choose_era("moon-landing-1969").unwrap();
    ts.session.choose_role("news-reporter").await.unwrap();

    let offered = ts.session.offered_targets();
    assert_eq!(offered.len(), 1);
    assert_eq!(offered[0].id, GENERAL_ERA_AI);
    assert_eq!(offered[0].label, "Moon Landing (July 20, 1969) Guide (AI)");
}

// =============================================================================
// MOCK GREETINGS
// =============================================================================

#[tokio::test]
async fn test_silent_mock_greeting_is_generated_once() {
    let catalog = Catalog::new(vec![era_with_silent_mock()]);
    let mut ts = TestSession::with_catalog(catalog);
    ts.expect_reply("Howdy, stranger! Sam's the name.");

    ts.open_chat(
        ChatMode::Dm,
        "frontier-1849",
        "shopkeeper",
        TargetKind::Mock,
        "sam-prospector",
    )
    .await
    .unwrap();

    let calls = ts.provider.text_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0]
        .instruction
        .starts_with("You are an AI simulating a character for ChronoChat."));
    assert_eq!(calls[0].history.len(), 1);
    assert_eq!(calls[0].history[0].role, Role::User);
    assert_eq!(
        calls[0].history[0].text,
        "Hello! I'm a Shopkeeper. Please greet me as Sam, the Prospector. Keep it brief and in \
         character."
    );

    assert_line(ts.lines(), 1, LineKind::Counterpart, "Sam", "Howdy, stranger!");
    assert_eq!(ts.session.transcript().len(), 1);

    // re-selecting the same character reuses the cached greeting offline
    ts.session
        .choose_target(TargetKind::Mock, "sam-prospector")
        .await
        .unwrap();
    assert_eq!(ts.provider.text_calls().len(), 1);
    assert_line(ts.lines(), 1, LineKind::Counterpart, "Sam", "Howdy, stranger!");
}

#[tokio::test]
async fn test_failed_greeting_is_not_cached() {
    let catalog = Catalog::new(vec![era_with_silent_mock()]);
    let mut ts = TestSession::with_catalog(catalog);
    ts.expect_failure();

    let result = ts
        .open_chat(
            ChatMode::Dm,
            "frontier-1849",
            "shopkeeper",
            TargetKind::Mock,
            "sam-prospector",
        )
        .await;
    assert!(matches!(result, Err(SessionError::Provider(_))));
    assert!(!ts.session.chat_ready());
    assert_feed_len(ts.lines(), 2);
    assert_bare_system(ts.lines(), 1, INIT_FAILED_MESSAGE);

    // sending is refused while uninitialized
    let send = ts.session.send_message("anyone there?").await;
    assert!(matches!(send, Err(SessionError::NotInitialized)));
    assert_eq!(ts.session.status(), CANNOT_SEND_MESSAGE);

    // picking the character again retries the request instead of reusing
    ts.expect_reply("Back from the river. Who's asking?");
    ts.session
        .choose_target(TargetKind::Mock, "sam-prospector")
        .await
        .unwrap();
    assert_eq!(ts.provider.text_calls().len(), 2);
    assert!(ts.session.chat_ready());
}

// =============================================================================
// SENDING MESSAGES
// =============================================================================

#[tokio::test]
async fn test_send_prefixes_role_in_transcript_only() {
    let mut ts = TestSession::new();
    ts.open_chat(
        ChatMode::Dm,
        "ancient-egypt",
        "royal-scribe",
        TargetKind::Ai,
        GENERAL_ERA_AI,
    )
    .await
    .unwrap();

    ts.expect_reply("The temple archives hold many secrets.");
    ts.session.send_message("What should I record today?").await.unwrap();

    // display shows the raw input under the role attribution
    assert_line(
        ts.lines(),
        2,
        LineKind::User,
        "You (as Royal Scribe)",
        "What should I record today?",
    );
    assert_line(
        ts.lines(),
        3,
        LineKind::Counterpart,
        "Ancient Egypt (1350 BCE) Guide",
        "The temple archives hold many secrets.",
    );

    // the model sees the prefixed form
    let turns = ts.session.transcript().turns();
    assert_eq!(
        turns[1].text,
        "(Speaking as Royal Scribe): What should I record today?"
    );
    assert_eq!(turns[2].text, "The temple archives hold many secrets.");
}

#[tokio::test]
async fn test_send_instruction_appends_history_clause_per_kind() {
    let mut ts = TestSession::new();
    ts.open_group("cyberpunk-2077", "info-broker").await.unwrap();

    ts.expect_reply("Welcome to the net, choom.");
    ts.session.send_message("Any leads tonight?").await.unwrap();

    let calls = ts.provider.text_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0]
        .instruction
        .starts_with("You are the Era Guide AI in a group chat for Cyberpunk Neo-City (2077 CE)."));
    assert!(calls[0]
        .instruction
        .ends_with(" Consider previous messages in history."));

    let mut ts = TestSession::new();
    ts.open_chat(
        ChatMode::Learn,
        "renaissance-europe",
        "apprentice-artist",
        TargetKind::Ai,
        "leonardo-da-vinci",
    )
    .await
    .unwrap();
    ts.expect_reply("Grind the lapis finely, then bind it.");
    ts.session.send_message("How is ultramarine made?").await.unwrap();

    let calls = ts.provider.text_calls();
    assert!(calls[0].instruction.ends_with(
        "The user you are talking to is playing the role of a Apprentice Artist. Tailor your \
         responses accordingly. Consider previous messages in history."
    ));
}

#[tokio::test]
async fn test_context_window_holds_last_ten_turns_oldest_first() {
    let mut ts = TestSession::new();
    ts.open_chat(
        ChatMode::Dm,
        "ancient-egypt",
        "royal-scribe",
        TargetKind::Ai,
        GENERAL_ERA_AI,
    )
    .await
    .unwrap();

    for i in 1..=6 {
        ts.expect_reply(format!("r{i}"));
        ts.session.send_message(&format!("u{i}")).await.unwrap();
    }

    // welcome + six exchanges
    assert_eq!(ts.session.transcript().len(), 13);

    let calls = ts.provider.text_calls();
    let last = calls.last().unwrap();
    assert_eq!(last.history.len(), 10);
    assert_eq!(last.history[0].role, Role::Model);
    assert_eq!(last.history[0].text, "r1");
    assert_eq!(last.history[9].role, Role::User);
    assert_eq!(last.history[9].text, "(Speaking as Royal Scribe): u6");
}

#[tokio::test]
async fn test_failed_send_keeps_user_turn_and_recovers() {
    let mut ts = TestSession::new();
    ts.open_chat(
        ChatMode::Dm,
        "ancient-egypt",
        "royal-scribe",
        TargetKind::Ai,
        GENERAL_ERA_AI,
    )
    .await
    .unwrap();

    ts.expect_failure();
    let result = ts.session.send_message("Is anyone out there?").await;
    assert!(matches!(result, Err(SessionError::Provider(_))));

    // transcript grew by the user's turn only; the feed surfaced a retry line
    let turns = ts.session.transcript().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns.last().unwrap().speaker, Speaker::User);
    assert_bare_system(ts.lines(), 3, SEND_FAILED_MESSAGE);
    assert!(!ts.session.chat_busy());

    // the next send includes the stranded turn and succeeds
    ts.expect_reply("I hear you now.");
    ts.session.send_message("Hello again?").await.unwrap();

    let calls = ts.provider.text_calls();
    let last = calls.last().unwrap();
    assert_eq!(last.history.len(), 3);
    assert_eq!(
        last.history[1].text,
        "(Speaking as Royal Scribe): Is anyone out there?"
    );
    assert_eq!(
        last.history[2].text,
        "(Speaking as Royal Scribe): Hello again?"
    );
}

// =============================================================================
// RESETS
// =============================================================================

#[tokio::test]
async fn test_changing_era_discards_conversation() {
    let mut ts = TestSession::new();
    ts.open_chat(
        ChatMode::Dm,
        "renaissance-europe",
        "apprentice-artist",
        TargetKind::Ai,
        "leonardo-da-vinci",
    )
    .await
    .unwrap();
    ts.expect_reply("A fine question.");
    ts.session.send_message("Maestro?").await.unwrap();
    assert!(ts.session.transcript().len() > 1);

    ts.session.choose_era("ancient-egypt").unwrap();

    assert!(ts.session.transcript().is_empty());
    assert!(ts.lines().is_empty());
    assert!(!ts.session.chat_ready());
    assert_eq!(ts.session.state().role_id(), None);
    assert_eq!(
        ts.session.status(),
        "Destination: Ancient Egypt (1350 BCE). Now, please choose your role."
    );
}

#[tokio::test]
async fn test_changing_role_discards_conversation_but_keeps_era() {
    let mut ts = TestSession::new();
    ts.open_chat(
        ChatMode::Dm,
        "ancient-egypt",
        "royal-scribe",
        TargetKind::Ai,
        GENERAL_ERA_AI,
    )
    .await
    .unwrap();

    ts.session.choose_role("artisan-baker").await.unwrap();

    assert!(!ts.session.chat_ready());
    assert!(ts.lines().is_empty());
    assert_eq!(ts.session.state().era_id(), Some("ancient-egypt"));
    assert_eq!(ts.session.state().role_id(), Some("artisan-baker"));
    assert_eq!(
        ts.session.status(),
        "Role: Artisan Baker. Now, select who to chat with."
    );
}

#[tokio::test]
async fn test_unknown_era_reverts_and_prompts() {
    let mut ts = TestSession::new();
    ts.session.choose_mode(ChatMode::Learn);
    let result = ts.session.choose_era("atlantis");

    assert!(matches!(result, Err(SessionError::Selection(_))));
    assert_eq!(ts.session.status(), "Please select a destination.");
    assert_eq!(
        *ts.session.state(),
        SelectionState::ModeChosen {
            mode: ChatMode::Learn
        }
    );
}

#[tokio::test]
async fn test_clear_target_returns_to_intermediate_state() {
    let mut ts = TestSession::new();
    ts.open_chat(
        ChatMode::Dm,
        "ancient-egypt",
        "royal-scribe",
        TargetKind::Ai,
        GENERAL_ERA_AI,
    )
    .await
    .unwrap();

    ts.session.clear_target();

    assert!(!ts.session.chat_ready());
    assert!(ts.session.selection().is_none());
    assert_eq!(ts.session.state().role_id(), Some("royal-scribe"));
    assert_eq!(
        ts.session.status(),
        "Please select a character or guide to chat with."
    );
}

#[tokio::test]
async fn test_go_back_resets_everything() {
    let mut ts = TestSession::new();
    ts.open_group("climate-summit-2050", "youth-activist")
        .await
        .unwrap();

    ts.session.go_back();

    assert_eq!(*ts.session.state(), SelectionState::NoMode);
    assert!(ts.lines().is_empty());
    assert!(!ts.session.chat_ready());
    assert_eq!(ts.session.status(), "");
}

// =============================================================================
// SNAPSHOTS
// =============================================================================

#[tokio::test]
async fn test_snapshot_prompt_and_share_line() {
    let dir = tempfile::tempdir().unwrap();
    let mut ts = session_with_snapshots(dir.path());

    ts.open_chat(
        ChatMode::Dm,
        "cyberpunk-2077",
        "corp-agent",
        TargetKind::Mock,
        "rogue-samurai",
    )
    .await
    .unwrap();

    let snap = ts.session.take_snapshot().await.unwrap();

    let prompts = ts.provider.image_calls();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with("A time traveler (as a Corporate Agent) interacting with"));
    assert!(prompts[0].contains("Rogue (as Street Samurai)"));
    assert!(prompts[0].contains("Neo-Kyoto"));
    assert!(prompts[0].ends_with(
        "The scene should be evocative of the era. Style: vibrant digital painting, \
         atmospheric, detailed."
    ));

    assert_eq!(snap.title, "Snapshot from Cyberpunk Neo-City (2077 CE)!");
    assert_eq!(snap.mime_type, "image/jpeg");
    assert!(snap.path.exists());
    assert!(snap
        .share_line
        .contains("as a Corporate Agent with Rogue on ChronoChat!"));
    assert!(snap.share_line.ends_with("#ChronoChat #cyberpunk-2077"));
}

#[tokio::test]
async fn test_snapshot_failure_is_surfaced_and_recoverable() {
    let dir = tempfile::tempdir().unwrap();
    let mut ts = session_with_snapshots(dir.path());
    ts.open_group("ancient-egypt", "royal-scribe").await.unwrap();

    ts.provider.queue_image_error(scripted_failure());
    let result = ts.session.take_snapshot().await;

    assert!(matches!(result, Err(SessionError::Provider(_))));
    assert!(!ts.session.snapshot_busy());
    let last = ts.lines().last().unwrap();
    assert_eq!(last.text, SNAPSHOT_FAILED_MESSAGE);

    // the next attempt goes through
    ts.session.take_snapshot().await.unwrap();
}

#[tokio::test]
async fn test_snapshot_requires_a_live_conversation() {
    let mut ts = TestSession::new();
    let result = ts.session.take_snapshot().await;

    assert!(matches!(result, Err(SessionError::NotInitialized)));
    assert_bare_system(ts.lines(), 0, SNAPSHOT_NOT_READY_MESSAGE);
    assert!(ts.provider.image_calls().is_empty());
}
