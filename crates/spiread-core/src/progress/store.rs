//! Namespaced, versioned progress records on top of a [`KvBackend`].
//!
//! Every game owns one JSON record at `<prefix>.<version>.<game_id>`; the
//! earned badge list lives beside them at `<prefix>.<version>.achievements`.
//! Writes go straight to the backend. When the backend refuses a read or a
//! write the store logs a warning and keeps serving from an in-process
//! overlay, so a session is never lost to a full or disabled store.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::aggregate::AggregateProgress;
use super::types::{GameProgress, SessionSummary, UserAchievements};
use crate::error::ValidationError;
use crate::storage::{KvBackend, MemoryBackend};

const ACHIEVEMENTS_SEGMENT: &str = "achievements";

/// Key namespace: `<prefix>.<version>.`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    prefix: String,
    version: String,
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new("spiread.progress", "v1")
    }
}

impl Namespace {
    pub fn new(prefix: &str, version: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('.').to_string(),
            version: version.trim_matches('.').to_string(),
        }
    }

    /// Common prefix of every key this namespace owns, trailing dot included.
    pub fn game_prefix(&self) -> String {
        format!("{}.{}.", self.prefix, self.version)
    }

    pub fn key(&self, game_id: &str) -> String {
        format!("{}{game_id}", self.game_prefix())
    }

    pub fn achievements_key(&self) -> String {
        self.key(ACHIEVEMENTS_SEGMENT)
    }
}

/// Reject ids that would collide with another key in the namespace.
pub fn validate_game_id(game_id: &str) -> Result<(), ValidationError> {
    if game_id.is_empty() || game_id.contains('.') || game_id == ACHIEVEMENTS_SEGMENT {
        return Err(ValidationError::InvalidGameId(game_id.to_string()));
    }
    Ok(())
}

pub struct ProgressStore {
    backend: Box<dyn KvBackend>,
    namespace: Namespace,
    utc_offset_secs: i32,
    /// Values the backend refused. `None` marks a removal.
    overlay: HashMap<String, Option<String>>,
}

impl std::fmt::Debug for ProgressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressStore")
            .field("namespace", &self.namespace)
            .field("utc_offset_secs", &self.utc_offset_secs)
            .field("pending_writes", &self.overlay.len())
            .finish_non_exhaustive()
    }
}

impl ProgressStore {
    pub fn new(backend: impl KvBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            namespace: Namespace::default(),
            utc_offset_secs: 0,
            overlay: HashMap::new(),
        }
    }

    /// Store over a fresh [`MemoryBackend`].
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    pub fn with_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = namespace;
        self
    }

    /// Offset used to bucket session timestamps into calendar days.
    pub fn with_utc_offset(mut self, utc_offset_secs: i32) -> Self {
        self.utc_offset_secs = utc_offset_secs;
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// True while some write is held only in memory.
    pub fn is_degraded(&self) -> bool {
        !self.overlay.is_empty()
    }

    /// Stored record for `game_id`, or the default when missing or unreadable.
    pub fn get_game_progress(&self, game_id: &str) -> GameProgress {
        if validate_game_id(game_id).is_err() {
            return GameProgress::default();
        }
        self.read_record(&self.namespace.key(game_id)).unwrap_or_default()
    }

    /// Fold `summary` into the record for `game_id` and persist it.
    ///
    /// # Errors
    ///
    /// Returns an error if `game_id` is not a usable key segment. Storage
    /// failures are not errors; see the module docs.
    pub fn update_game_progress(
        &mut self,
        game_id: &str,
        summary: &SessionSummary,
    ) -> Result<GameProgress, ValidationError> {
        validate_game_id(game_id)?;
        let updated = self.get_game_progress(game_id).record(summary);
        self.write_record(&self.namespace.key(game_id), &updated);
        tracing::debug!(
            game_id,
            total_sessions = updated.total_sessions,
            best_score = updated.best_score,
            "progress updated"
        );
        Ok(updated)
    }

    pub fn reset_game_progress(&mut self, game_id: &str) -> Result<(), ValidationError> {
        validate_game_id(game_id)?;
        let key = self.namespace.key(game_id);
        self.write(&key, None);
        Ok(())
    }

    /// Remove every key in the namespace, earned badges included.
    pub fn reset_all_progress(&mut self) {
        for key in self.namespace_keys() {
            self.write(&key, None);
        }
        tracing::info!(prefix = %self.namespace.game_prefix(), "all progress reset");
    }

    /// Every stored game record, keyed by game id.
    pub fn get_all_games_progress(&self) -> BTreeMap<String, GameProgress> {
        let prefix = self.namespace.game_prefix();
        self.namespace_keys()
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .filter(|game_id| validate_game_id(game_id).is_ok())
            .map(|game_id| {
                let progress = self.get_game_progress(&game_id);
                (game_id, progress)
            })
            .collect()
    }

    /// Whole-account view used by achievement evaluation.
    pub fn get_overall_progress(&self) -> AggregateProgress {
        let earned = self.get_user_achievements().earned_badges;
        AggregateProgress::new(self.get_all_games_progress(), earned, self.utc_offset_secs)
    }

    pub fn get_user_achievements(&self) -> UserAchievements {
        self.read_record(&self.namespace.achievements_key())
            .unwrap_or_default()
    }

    pub fn save_user_achievements(&mut self, achievements: &UserAchievements) {
        let key = self.namespace.achievements_key();
        self.write_record(&key, achievements);
    }

    // Level/score shortcuts kept for shells that predate session summaries.

    pub fn get_last_level(&self, game_id: &str) -> f64 {
        self.get_game_progress(game_id).best_level
    }

    pub fn set_last_level(&mut self, game_id: &str, level: f64) -> Result<(), ValidationError> {
        validate_game_id(game_id)?;
        let mut progress = self.get_game_progress(game_id);
        progress.best_level = progress.best_level.max(level);
        self.write_record(&self.namespace.key(game_id), &progress);
        Ok(())
    }

    pub fn get_last_best_score(&self, game_id: &str) -> f64 {
        self.get_game_progress(game_id).best_score
    }

    pub fn update_best_score(&mut self, game_id: &str, score: f64) -> Result<(), ValidationError> {
        validate_game_id(game_id)?;
        let mut progress = self.get_game_progress(game_id);
        progress.best_score = progress.best_score.max(score);
        self.write_record(&self.namespace.key(game_id), &progress);
        Ok(())
    }

    fn read_record<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "corrupt progress record, using defaults");
                None
            }
        }
    }

    fn write_record<T: Serialize>(&mut self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.write(key, Some(json)),
            Err(e) => tracing::warn!(key, error = %e, "failed to serialize progress record"),
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        if let Some(pending) = self.overlay.get(key) {
            return pending.clone();
        }
        match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "progress read failed");
                None
            }
        }
    }

    fn write(&mut self, key: &str, value: Option<String>) {
        let result = match &value {
            Some(json) => self.backend.set(key, json),
            None => self.backend.remove(key),
        };
        match result {
            Ok(()) => {
                self.overlay.remove(key);
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "progress write failed, keeping it in memory");
                self.overlay.insert(key.to_string(), value);
            }
        }
    }

    /// Keys under the namespace as seen through the overlay.
    fn namespace_keys(&self) -> Vec<String> {
        let prefix = self.namespace.game_prefix();
        let mut keys: BTreeSet<String> = match self.backend.keys_with_prefix(&prefix) {
            Ok(keys) => keys.into_iter().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to list progress keys");
                BTreeSet::new()
            }
        };
        for (key, pending) in &self.overlay {
            if !key.starts_with(&prefix) {
                continue;
            }
            if pending.is_some() {
                keys.insert(key.clone());
            } else {
                keys.remove(key);
            }
        }
        keys.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn summary(game: &str, score: f64, ts: i64) -> SessionSummary {
        SessionSummary::new(game, score, 45.0, ts)
    }

    #[test]
    fn namespace_keys_are_prefixed_and_versioned() {
        let ns = Namespace::default();
        assert_eq!(ns.key("schulte"), "spiread.progress.v1.schulte");
        assert_eq!(ns.achievements_key(), "spiread.progress.v1.achievements");
        assert_eq!(Namespace::new("app.", "v2").game_prefix(), "app.v2.");
    }

    #[test]
    fn rejects_unusable_game_ids() {
        assert!(validate_game_id("schulte").is_ok());
        for bad in ["", "a.b", "achievements"] {
            assert_eq!(
                validate_game_id(bad),
                Err(ValidationError::InvalidGameId(bad.to_string()))
            );
        }
        let mut store = ProgressStore::in_memory();
        assert!(store.update_game_progress("x.y", &summary("x.y", 1.0, 1)).is_err());
    }

    #[test]
    fn missing_record_is_default() {
        let store = ProgressStore::in_memory();
        assert_eq!(store.get_game_progress("schulte"), GameProgress::default());
    }

    #[test]
    fn update_persists_through_backend() {
        let backend = MemoryBackend::new();
        let mut store = ProgressStore::new(backend.clone());
        store
            .update_game_progress("schulte", &summary("schulte", 40.0, 1_000).with_level(3.0))
            .unwrap();
        let updated = store
            .update_game_progress("schulte", &summary("schulte", 25.0, 2_000))
            .unwrap();
        assert_eq!(updated.best_score, 40.0);
        assert_eq!(updated.best_level, 3.0);
        assert_eq!(updated.total_sessions, 2);
        assert_eq!(updated.total_time_sec, 90.0);
        assert_eq!(updated.last_played_at, 2_000);

        // A second store over the same backend sees the write.
        let reopened = ProgressStore::new(backend);
        assert_eq!(reopened.get_game_progress("schulte"), updated);
    }

    #[test]
    fn corrupt_record_reads_as_default() {
        let backend = MemoryBackend::new();
        backend.set("spiread.progress.v1.schulte", "{not json").unwrap();
        let store = ProgressStore::new(backend);
        assert_eq!(store.get_game_progress("schulte"), GameProgress::default());
    }

    #[test]
    fn partial_record_fills_missing_fields() {
        let backend = MemoryBackend::new();
        backend
            .set("spiread.progress.v1.schulte", r#"{"bestScore": 12}"#)
            .unwrap();
        let store = ProgressStore::new(backend);
        let progress = store.get_game_progress("schulte");
        assert_eq!(progress.best_score, 12.0);
        assert_eq!(progress.best_level, 1.0);
        assert!(progress.recent_sessions.is_empty());
    }

    #[test]
    fn reset_game_leaves_others_untouched() {
        let mut store = ProgressStore::in_memory();
        store.update_game_progress("schulte", &summary("schulte", 10.0, 1)).unwrap();
        store.update_game_progress("anagrams", &summary("anagrams", 7.0, 2)).unwrap();
        store.reset_game_progress("schulte").unwrap();
        assert!(!store.get_game_progress("schulte").has_played());
        assert_eq!(store.get_game_progress("anagrams").best_score, 7.0);
    }

    #[test]
    fn reset_all_clears_namespace_only() {
        let backend = MemoryBackend::new();
        backend.set("unrelated", "keep").unwrap();
        let mut store = ProgressStore::new(backend.clone());
        store.update_game_progress("schulte", &summary("schulte", 10.0, 1)).unwrap();
        store.save_user_achievements(&UserAchievements {
            earned_badges: vec!["speed_demon".into()],
            last_checked_at: 5,
        });
        store.reset_all_progress();
        assert!(store.get_all_games_progress().is_empty());
        assert!(store.get_user_achievements().earned_badges.is_empty());
        assert_eq!(backend.get("unrelated").unwrap().as_deref(), Some("keep"));
    }

    #[test]
    fn all_games_excludes_achievements_record() {
        let mut store = ProgressStore::in_memory();
        store.update_game_progress("schulte", &summary("schulte", 10.0, 1)).unwrap();
        store.update_game_progress("par_impar", &summary("par_impar", 3.0, 2)).unwrap();
        store.save_user_achievements(&UserAchievements::default());
        let all = store.get_all_games_progress();
        assert_eq!(
            all.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["par_impar", "schulte"]
        );
    }

    #[test]
    fn other_namespaces_are_invisible() {
        let backend = MemoryBackend::new();
        let mut v1 = ProgressStore::new(backend.clone());
        v1.update_game_progress("schulte", &summary("schulte", 10.0, 1)).unwrap();
        let v2 = ProgressStore::new(backend).with_namespace(Namespace::new("spiread.progress", "v2"));
        assert!(v2.get_all_games_progress().is_empty());
    }

    #[test]
    fn unavailable_backend_keeps_session_in_memory() {
        let backend = MemoryBackend::new();
        let mut store = ProgressStore::new(backend.clone());
        backend.set_available(false);

        let updated = store
            .update_game_progress("schulte", &summary("schulte", 33.0, 1))
            .unwrap();
        assert_eq!(updated.total_sessions, 1);
        assert!(store.is_degraded());
        assert_eq!(store.get_game_progress("schulte").best_score, 33.0);
        assert_eq!(store.get_all_games_progress().len(), 1);

        // Next successful write flushes the pending record.
        backend.set_available(true);
        store
            .update_game_progress("schulte", &summary("schulte", 20.0, 2))
            .unwrap();
        assert!(!store.is_degraded());
        assert_eq!(ProgressStore::new(backend).get_game_progress("schulte").total_sessions, 2);
    }

    #[test]
    fn legacy_helpers_only_raise_bests() {
        let mut store = ProgressStore::in_memory();
        assert_eq!(store.get_last_level("memory_digits"), 1.0);
        store.set_last_level("memory_digits", 6.0).unwrap();
        store.set_last_level("memory_digits", 4.0).unwrap();
        assert_eq!(store.get_last_level("memory_digits"), 6.0);

        store.update_best_score("memory_digits", 90.0).unwrap();
        store.update_best_score("memory_digits", 50.0).unwrap();
        assert_eq!(store.get_last_best_score("memory_digits"), 90.0);
        assert_eq!(store.get_game_progress("memory_digits").total_sessions, 0);
    }

    #[test]
    fn overall_progress_carries_earned_badges() {
        let mut store = ProgressStore::in_memory().with_utc_offset(3600);
        store.update_game_progress("schulte", &summary("schulte", 10.0, 1)).unwrap();
        store.save_user_achievements(&UserAchievements {
            earned_badges: vec!["game_explorer".into()],
            last_checked_at: 9,
        });
        let overall = store.get_overall_progress();
        assert_eq!(overall.total_sessions, 1);
        assert!(overall.earned_badges.contains("game_explorer"));
        assert_eq!(overall.utc_offset_secs, 3600);
    }

    proptest! {
        #[test]
        fn bests_are_maxima_over_all_sessions(
            sessions in proptest::collection::vec((0.0f64..1000.0, 1.0f64..20.0, 0u32..50), 1..40)
        ) {
            let mut store = ProgressStore::in_memory();
            for (i, (score, level, streak)) in sessions.iter().enumerate() {
                let s = summary("schulte", *score, i as i64)
                    .with_level(*level)
                    .with_streak(*streak);
                store.update_game_progress("schulte", &s).unwrap();
            }
            let progress = store.get_game_progress("schulte");
            let max_score = sessions.iter().map(|s| s.0).fold(0.0, f64::max);
            let max_level = sessions.iter().map(|s| s.1).fold(1.0, f64::max);
            let max_streak = sessions.iter().map(|s| s.2).max().unwrap_or(0);
            prop_assert_eq!(progress.best_score, max_score);
            prop_assert_eq!(progress.best_level, max_level);
            prop_assert_eq!(progress.best_streak, max_streak);
            prop_assert_eq!(progress.total_sessions, sessions.len() as u64);
            prop_assert!(progress.recent_sessions.len() <= 10);
            let newest = progress.recent_sessions.last().map(|s| s.timestamp);
            prop_assert_eq!(newest, Some(sessions.len() as i64 - 1));
        }
    }
}
