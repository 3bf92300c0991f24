//! High score leaderboard system
//!
//! One leaderboard per game id, top 10 scores, stored as a JSON array in a
//! key-value store (LocalStorage in the browser).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Maximum initials length
pub const MAX_INITIALS: usize = 3;

#[derive(Debug, Error)]
pub enum HighScoreError {
    #[error("game id must not be empty")]
    EmptyGameId,
    #[error("initials must not be empty")]
    EmptyInitials,
    #[error("failed to encode leaderboard: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Storage(String),
}

/// Key-value backend the leaderboards are persisted in
pub trait HighScoreStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), HighScoreError>;
}

/// Storage key for a game's leaderboard
pub fn storage_key(game_id: &str) -> String {
    format!("highscores_{}", game_id)
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Upper-case, at most three characters
    pub initials: String,
    pub score: u64,
    /// ISO-8601 timestamp
    pub date: String,
}

/// High score leaderboard, sorted descending by score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Load a game's leaderboard; missing or unreadable data yields an empty one
    pub fn load(store: &impl HighScoreStore, game_id: &str) -> Self {
        let Some(json) = store.get_item(&storage_key(game_id)) else {
            return Self::new();
        };
        match serde_json::from_str::<HighScores>(&json) {
            Ok(mut scores) => {
                scores.entries.sort_by(|a, b| b.score.cmp(&a.score));
                scores.entries.truncate(MAX_HIGH_SCORES);
                log::info!("Loaded {} high scores for {}", scores.entries.len(), game_id);
                scores
            }
            Err(err) => {
                log::warn!("Discarding unreadable high scores for {}: {}", game_id, err);
                Self::new()
            }
        }
    }

    pub fn save(&self, store: &mut impl HighScoreStore, game_id: &str) -> Result<(), HighScoreError> {
        let json = serde_json::to_string(self)?;
        store.set_item(&storage_key(game_id), &json)?;
        log::info!("High scores saved for {} ({} entries)", game_id, self.entries.len());
        Ok(())
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().is_none_or(|e| score > e.score)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a new score to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if didn't qualify
    pub fn add_score(&mut self, initials: &str, score: u64, date: &str) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            initials: normalize_initials(initials),
            score,
            date: date.to_string(),
        };

        // Ties rank below existing entries
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        // Trim to max size
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

/// Upper-case and cut to three characters
pub fn normalize_initials(initials: &str) -> String {
    initials
        .trim()
        .to_uppercase()
        .chars()
        .take(MAX_INITIALS)
        .collect()
}

/// Whether `score` would make the leaderboard of `game_id`
pub fn is_high_score(store: &impl HighScoreStore, game_id: &str, score: u64) -> bool {
    HighScores::load(store, game_id).qualifies(score)
}

/// Rank `score` would take on the leaderboard of `game_id`, if it makes it
pub fn entry_rank(store: &impl HighScoreStore, game_id: &str, score: u64) -> Option<usize> {
    HighScores::load(store, game_id).potential_rank(score)
}

/// Record a finished game's score. Returns the rank achieved, if any.
pub fn record_score(
    store: &mut impl HighScoreStore,
    game_id: &str,
    initials: &str,
    score: u64,
    date: &str,
) -> Result<Option<usize>, HighScoreError> {
    if game_id.is_empty() {
        return Err(HighScoreError::EmptyGameId);
    }
    if initials.trim().is_empty() {
        return Err(HighScoreError::EmptyInitials);
    }

    let mut scores = HighScores::load(store, game_id);
    let rank = scores.add_score(initials, score, date);
    if rank.is_some() {
        scores.save(store, game_id)?;
    }
    Ok(rank)
}

/// In-process store (native builds and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HighScoreStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), HighScoreError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Browser LocalStorage
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl HighScoreStore for LocalStorageStore {
    fn get_item(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok().flatten()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), HighScoreError> {
        let storage = Self::storage()
            .ok_or_else(|| HighScoreError::Storage("LocalStorage not available".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|e| HighScoreError::Storage(format!("{:?}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GAME: &str = "rhythm-defense";

    fn fill(store: &mut MemoryStore, count: u64) {
        for i in 0..count {
            record_score(store, GAME, "abc", (i + 1) * 100, "2024-01-01T00:00:00Z").unwrap();
        }
    }

    #[test]
    fn test_key_format() {
        assert_eq!(storage_key(GAME), "highscores_rhythm-defense");
    }

    #[test]
    fn test_empty_board_accepts_anything() {
        let store = MemoryStore::new();
        assert!(is_high_score(&store, GAME, 0));
    }

    #[test]
    fn test_full_board_needs_to_beat_lowest() {
        let mut store = MemoryStore::new();
        fill(&mut store, 10);
        assert!(!is_high_score(&store, GAME, 100));
        assert!(is_high_score(&store, GAME, 101));
    }

    #[test]
    fn test_record_sorts_and_trims() {
        let mut store = MemoryStore::new();
        fill(&mut store, 10);
        assert_eq!(HighScores::load(&store, GAME).potential_rank(550), Some(6));
        let rank = record_score(&mut store, GAME, "zed", 550, "2024-01-02T00:00:00Z").unwrap();
        assert_eq!(rank, Some(6));

        let scores = HighScores::load(&store, GAME);
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top_score(), Some(1000));
        assert_eq!(scores.entries.last().map(|e| e.score), Some(200));
        assert!(scores.entries.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(scores.entries[5].initials, "ZED");
    }

    #[test]
    fn test_entry_rank_matches_recorded_rank() {
        let mut store = MemoryStore::new();
        assert_eq!(entry_rank(&store, GAME, 0), Some(1));
        fill(&mut store, 10);
        assert_eq!(entry_rank(&store, GAME, 100), None);

        let expected = entry_rank(&store, GAME, 750);
        assert_eq!(expected, Some(4));
        let rank = record_score(&mut store, GAME, "new", 750, "d").unwrap();
        assert_eq!(rank, expected);
    }

    #[test]
    fn test_initials_normalized() {
        assert_eq!(normalize_initials("abcd"), "ABC");
        assert_eq!(normalize_initials(" x "), "X");
    }

    #[test]
    fn test_rejects_empty_inputs() {
        let mut store = MemoryStore::new();
        assert!(matches!(
            record_score(&mut store, "", "abc", 10, ""),
            Err(HighScoreError::EmptyGameId)
        ));
        assert!(matches!(
            record_score(&mut store, GAME, "  ", 10, ""),
            Err(HighScoreError::EmptyInitials)
        ));
        assert!(HighScores::load(&store, GAME).is_empty());
    }

    #[test]
    fn test_boards_are_per_game() {
        let mut store = MemoryStore::new();
        record_score(&mut store, "a", "aaa", 10, "").unwrap();
        assert!(HighScores::load(&store, "b").is_empty());
        assert_eq!(HighScores::load(&store, "a").top_score(), Some(10));
    }

    #[test]
    fn test_corrupt_data_starts_fresh() {
        let mut store = MemoryStore::new();
        store.set_item(&storage_key(GAME), "not json").unwrap();
        assert!(HighScores::load(&store, GAME).is_empty());
    }

    #[test]
    fn test_stored_as_plain_array() {
        let mut store = MemoryStore::new();
        record_score(&mut store, GAME, "ab", 42, "d").unwrap();
        let json = store.get_item(&storage_key(GAME)).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"initials\":\"AB\""));
    }
}
