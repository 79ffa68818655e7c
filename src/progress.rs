use crate::errors::StoreError;
use crate::models::{ProgressResponse, ProgressState};
use crate::storage::{ProgressStore, format_date};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

/// Completions per day the page shows progress against.
pub const DAILY_GOAL: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Recorded { completed_today: u32 },
    AlreadyCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DailyReset {
    pub counter_reset: bool,
    pub streak_updated: bool,
}

impl DailyReset {
    pub fn changed(&self) -> bool {
        self.counter_reset || self.streak_updated
    }
}

pub struct ProgressTracker {
    store: Arc<dyn ProgressStore>,
    state: ProgressState,
}

impl ProgressTracker {
    /// Reads whatever the store has. A store with nothing in it yields empty progress.
    pub async fn load(store: Arc<dyn ProgressStore>) -> Result<Self, StoreError> {
        let state = store.load().await?;
        debug!(
            completed = state.completed.len(),
            streak = state.streak,
            "progress loaded"
        );
        Ok(Self { store, state })
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn is_completed(&self, act_id: &str) -> bool {
        self.state.completed.contains(act_id)
    }

    /// Adds `act_id` to the completed set. The day's counter grows only when
    /// the set does, so repeating an act is a no-op. Nothing changes in memory
    /// unless the store accepted the new state.
    pub async fn mark_complete(&mut self, act_id: &str) -> Result<Completion, StoreError> {
        if self.state.completed.contains(act_id) {
            return Ok(Completion::AlreadyCompleted);
        }

        let mut next = self.state.clone();
        next.completed.insert(act_id.to_string());
        next.completed_today = next.completed_today.saturating_add(1);
        self.store.save(&next).await?;
        self.state = next;

        Ok(Completion::Recorded {
            completed_today: self.state.completed_today,
        })
    }

    /// Rolls the day counter and the streak forward to `today`. Calling it
    /// again with the same date changes nothing.
    pub async fn check_daily_reset(&mut self, today: NaiveDate) -> Result<DailyReset, StoreError> {
        let mut outcome = DailyReset::default();
        let mut next = self.state.clone();

        if next.last_reset != Some(today) {
            next.completed_today = 0;
            next.last_reset = Some(today);
            outcome.counter_reset = true;
        }

        if next.last_active != Some(today) {
            next.streak = next_streak(next.streak, next.last_active, today);
            next.last_active = Some(today);
            outcome.streak_updated = true;
        }

        if outcome.changed() {
            self.store.save(&next).await?;
            self.state = next;
            info!(
                date = %today,
                streak = self.state.streak,
                counter_reset = outcome.counter_reset,
                "new day observed"
            );
        }

        Ok(outcome)
    }

    pub fn summary(&self, today: NaiveDate) -> ProgressResponse {
        ProgressResponse {
            date: format_date(today),
            streak: self.state.streak,
            completed_today: self.state.completed_today,
            completed_total: self.state.completed.len(),
            daily_goal: DAILY_GOAL,
        }
    }
}

/// Streak after first seeing `today`, given the previous active day.
pub fn next_streak(streak: u32, last_active: Option<NaiveDate>, today: NaiveDate) -> u32 {
    match last_active {
        Some(previous) if previous == today => streak,
        Some(previous) if (today - previous).num_days() == 1 => streak.saturating_add(1),
        _ => 1,
    }
}
