//! Session lifecycle: calibrate, play, record, reward.
//!
//! [`TrainingEngine`] owns the progress store and runs the post-session
//! pipeline in a fixed order: the timer's one-shot result becomes a
//! [`SessionSummary`], the summary is persisted, then achievements are
//! evaluated against the updated aggregate and the new ids are saved.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::achievements::{catalog, check_new_achievements, Badge};
use crate::adaptive::Calibrator;
use crate::clock::Clock;
use crate::error::{Result, ValidationError};
use crate::events::Event;
use crate::progress::{validate_game_id, GameProgress, ProgressStore, SessionSummary};
use crate::storage::{Config, KvBackend};
use crate::timer::{SessionTimer, TimerState};

/// Game-specific results a shell reports once its session ends.
/// Duration and timestamp are filled in from the timer and clock.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDraft {
    pub game_id: String,
    pub score: f64,
    pub level: Option<f64>,
    pub streak: Option<u32>,
    pub accuracy: Option<f64>,
    pub extras: Option<Map<String, Value>>,
}

impl SessionDraft {
    pub fn new(game_id: impl Into<String>, score: f64) -> Self {
        Self {
            game_id: game_id.into(),
            score,
            level: None,
            streak: None,
            accuracy: None,
            extras: None,
        }
    }

    pub fn level(mut self, level: f64) -> Self {
        self.level = Some(level);
        self
    }

    pub fn streak(mut self, streak: u32) -> Self {
        self.streak = Some(streak);
        self
    }

    pub fn accuracy(mut self, accuracy: f64) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    fn into_summary(self, duration_sec: f64, timestamp: i64) -> SessionSummary {
        let mut summary = SessionSummary::new(self.game_id, self.score, duration_sec, timestamp);
        summary.level = self.level;
        summary.streak = self.streak;
        if let Some(accuracy) = self.accuracy {
            summary = summary.with_accuracy(accuracy);
        }
        summary.extras = self.extras;
        summary
    }
}

/// Everything that changed because one session finished.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOutcome {
    pub summary: SessionSummary,
    pub progress: GameProgress,
    pub new_badges: Vec<Badge>,
    /// One `BadgeUnlocked` per new badge.
    pub events: Vec<Event>,
}

pub struct TrainingEngine {
    store: ProgressStore,
    calibrator: Calibrator,
    catalog: Vec<Badge>,
    clock: Arc<dyn Clock>,
}

impl TrainingEngine {
    pub fn new(store: ProgressStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            calibrator: Calibrator::default(),
            catalog: catalog(),
            clock,
        }
    }

    /// Engine wired from a loaded [`Config`]: namespace, day offset and
    /// adaptation overrides all come from it.
    pub fn from_config(config: &Config, backend: impl KvBackend + 'static, clock: Arc<dyn Clock>) -> Self {
        let store = ProgressStore::new(backend)
            .with_namespace(config.storage.namespace())
            .with_utc_offset(config.achievements.utc_offset_secs());
        Self::new(store, clock).with_calibrator(Calibrator::with_overrides(config.adaptation.values()))
    }

    pub fn with_calibrator(mut self, calibrator: Calibrator) -> Self {
        self.calibrator = calibrator;
        self
    }

    pub fn with_catalog(mut self, catalog: Vec<Badge>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ProgressStore {
        &mut self.store
    }

    pub fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    pub fn catalog(&self) -> &[Badge] {
        &self.catalog
    }

    /// Difficulty to start the next session of `game_id` at.
    pub fn prepare(&self, game_id: &str) -> f64 {
        let recent = self.store.get_game_progress(game_id).recent_sessions;
        self.calibrator.adapted_parameter(game_id, &recent, None)
    }

    /// Record the session `timer` just ended.
    ///
    /// Returns `Ok(None)` when the timer's result was already consumed, so
    /// a shell that reports twice records once.
    ///
    /// # Errors
    ///
    /// Fails if the timer has not ended or the draft's game id is unusable.
    pub fn finish(&mut self, timer: &mut SessionTimer, draft: SessionDraft) -> Result<Option<SessionOutcome>> {
        if timer.state() != TimerState::Ended {
            return Err(ValidationError::TimerNotEnded {
                state: timer.state().to_string(),
            }
            .into());
        }
        validate_game_id(&draft.game_id)?;
        let Some(result) = timer.take_result() else {
            tracing::debug!(game_id = %draft.game_id, "session already recorded");
            return Ok(None);
        };

        let summary = draft.into_summary(result.elapsed_sec(), self.clock.now_epoch_ms());
        let progress = self.store.update_game_progress(&summary.game_id, &summary)?;
        let new_badges = self.evaluate_achievements();
        let at = self.clock.now_utc();
        let events = new_badges
            .iter()
            .map(|badge| Event::BadgeUnlocked {
                badge_id: badge.id.clone(),
                at,
            })
            .collect();

        Ok(Some(SessionOutcome {
            summary,
            progress,
            new_badges,
            events,
        }))
    }

    /// Check the catalog against stored progress and persist anything new.
    pub fn evaluate_achievements(&mut self) -> Vec<Badge> {
        let aggregate = self.store.get_overall_progress();
        let mut earned = self.store.get_user_achievements();
        let new_badges: Vec<Badge> =
            check_new_achievements(&self.catalog, &aggregate, earned.earned_badges.as_slice())
                .into_iter()
                .cloned()
                .collect();

        for badge in &new_badges {
            tracing::info!(badge_id = %badge.id, rarity = %badge.rarity, "badge unlocked");
        }
        earned.merge(new_badges.iter().map(|b| b.id.clone()));
        earned.last_checked_at = self.clock.now_epoch_ms();
        self.store.save_user_achievements(&earned);
        new_badges
    }
}
