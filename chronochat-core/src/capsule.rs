//! Daily time-capsule prompt.
//!
//! One prompt is drawn at random per local day and stored, so repeat
//! visits on the same day always show the same line.

use crate::storage::{KvStore, StoreError, KEY_CAPSULE_CONTENT, KEY_CAPSULE_DATE};
use chrono::Local;
use rand::seq::SliceRandom;

pub const CAPSULE_PROMPTS: [&str; 8] = [
    "If you joined a chatroom in the Renaissance as an 'Apprentice Artist', what's the first \
     thing you'd ask Leonardo da Vinci?",
    "In a Cyberpunk 2077 chatroom, what kind of 'job' would your chosen role be looking for?",
    "Imagine a group chat during the Moon Landing. What would people with different roles \
     (e.g., Mission Control, Reporter, Viewer) be saying?",
    "What 'modern' slang would be most confusing if you used it in an Ancient Egypt chatroom?",
    "If you could send one object back in time to yourself 10 years ago, what would it be and \
     why?",
    "Describe a conversation with a robot from 2242. What's the most surprising thing it tells \
     you about daily life?",
    "You're at a Victorian-era séance. What question do you ask the spirits?",
    "What's one piece of advice a wise old tree from an enchanted forest might give you?",
];

/// Today's capsule prompt, drawing and storing a fresh one if the stored
/// draw is from another day.
pub async fn todays_capsule(store: &mut KvStore) -> Result<String, StoreError> {
    let today = Local::now().format("%Y-%m-%d").to_string();

    if store.get(KEY_CAPSULE_DATE) == Some(today.as_str()) {
        if let Some(content) = store.get(KEY_CAPSULE_CONTENT) {
            return Ok(content.to_string());
        }
    }

    let prompt = CAPSULE_PROMPTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(CAPSULE_PROMPTS[0]);
    store.set(KEY_CAPSULE_DATE, &today).await?;
    store.set(KEY_CAPSULE_CONTENT, prompt).await?;
    Ok(prompt.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_same_day_returns_stored_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = KvStore::open(dir.path().join("state.json")).await.unwrap();

        let today = Local::now().format("%Y-%m-%d").to_string();
        store.set(KEY_CAPSULE_DATE, &today).await.unwrap();
        store
            .set(KEY_CAPSULE_CONTENT, "a pinned capsule")
            .await
            .unwrap();

        assert_eq!(
            todays_capsule(&mut store).await.unwrap(),
            "a pinned capsule"
        );
    }

    #[tokio::test]
    async fn test_stale_date_draws_fresh_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = KvStore::open(dir.path().join("state.json")).await.unwrap();

        store.set(KEY_CAPSULE_DATE, "2001-01-01").await.unwrap();
        store.set(KEY_CAPSULE_CONTENT, "an old capsule").await.unwrap();

        let drawn = todays_capsule(&mut store).await.unwrap();
        assert!(CAPSULE_PROMPTS.contains(&drawn.as_str()));

        let today = Local::now().format("%Y-%m-%d").to_string();
        assert_eq!(store.get(KEY_CAPSULE_DATE), Some(today.as_str()));
    }

    #[tokio::test]
    async fn test_draw_is_stable_within_a_day() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = KvStore::open(dir.path().join("state.json")).await.unwrap();

        let first = todays_capsule(&mut store).await.unwrap();
        let second = todays_capsule(&mut store).await.unwrap();
        assert_eq!(first, second);
    }
}
