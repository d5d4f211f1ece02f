//! Flashcard review state and the scheduling transitions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    Quality, SrsError, DEFAULT_EASE, INITIAL_INTERVAL_DAYS, MIN_EASE, SECOND_INTERVAL_DAYS,
};

/// Spaced-repetition fields carried by a note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlashcardState {
    /// Whether the note takes part in spaced repetition.
    pub is_flashcard: bool,

    /// Consecutive correct recalls since promotion or the last lapse.
    pub review_count: i32,

    /// Difficulty multiplier; lower is harder.
    pub ease: f64,

    /// Days until the next review.
    pub interval: i32,

    /// When the card becomes due. `None` until promoted.
    pub next_review: Option<DateTime<Utc>>,
}

impl Default for FlashcardState {
    fn default() -> Self {
        Self {
            is_flashcard: false,
            review_count: 0,
            ease: DEFAULT_EASE,
            interval: 0,
            next_review: None,
        }
    }
}

/// Where a card sits in its repetition chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashcardPhase {
    /// Not promoted.
    Inactive,
    /// Fresh or just lapsed: the chain starts over on the next review.
    New,
    /// At least one correct recall since the last reset.
    Learning,
}

/// Result of a review; the fields written back to the note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub next_review: DateTime<Utc>,
    pub interval: i32,
    pub ease: f64,
    pub review_count: i32,
}

impl FlashcardState {
    /// State of a note freshly promoted to a flashcard at `now`.
    ///
    /// Promotion always resets the chain, so promoting an existing flashcard
    /// again yields the same shape with a new due date.
    #[must_use]
    pub fn promote(now: DateTime<Utc>) -> Self {
        Self {
            is_flashcard: true,
            review_count: 0,
            ease: DEFAULT_EASE,
            interval: INITIAL_INTERVAL_DAYS,
            next_review: Some(now + Duration::days(i64::from(INITIAL_INTERVAL_DAYS))),
        }
    }

    /// Whether the card should be shown in a review session at `now`.
    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_flashcard && self.next_review.is_some_and(|due| due <= now)
    }

    #[must_use]
    pub fn phase(&self) -> FlashcardPhase {
        match (self.is_flashcard, self.review_count) {
            (false, _) => FlashcardPhase::Inactive,
            (true, 0) => FlashcardPhase::New,
            (true, _) => FlashcardPhase::Learning,
        }
    }

    /// Computes the state after reviewing the card with `quality` at `now`.
    ///
    /// `self` is left untouched; apply the outcome with [`Self::apply`] once
    /// it has been persisted.
    pub fn review(&self, quality: Quality, now: DateTime<Utc>) -> Result<ReviewOutcome, SrsError> {
        if !self.is_flashcard {
            return Err(SrsError::NotAFlashcard);
        }

        let mut review_count = self.review_count.saturating_add(1);
        let mut ease = self.ease;
        let interval;

        if quality.is_correct() {
            interval = match review_count {
                1 => INITIAL_INTERVAL_DAYS,
                2 => SECOND_INTERVAL_DAYS,
                _ => grow_interval(self.interval, self.ease)?,
            };
            ease += ease_delta(quality);
        } else {
            review_count = 0;
            interval = INITIAL_INTERVAL_DAYS;
        }

        let ease = ease.max(MIN_EASE);
        let next_review = Duration::try_days(i64::from(interval))
            .and_then(|delta| now.checked_add_signed(delta))
            .ok_or(SrsError::ScheduleOverflow {
                interval_days: f64::from(interval),
            })?;

        Ok(ReviewOutcome {
            next_review,
            interval,
            ease,
            review_count,
        })
    }

    /// Writes a review outcome into this state.
    pub fn apply(&mut self, outcome: &ReviewOutcome) {
        self.review_count = outcome.review_count;
        self.interval = outcome.interval;
        self.ease = outcome.ease;
        self.next_review = Some(outcome.next_review);
    }
}

/// SM-2 ease adjustment: `0.1 - (5 - q) * (0.08 + (5 - q) * 0.02)`.
fn ease_delta(quality: Quality) -> f64 {
    let miss = f64::from(Quality::MAX - quality.value());
    0.1 - miss * (0.08 + miss * 0.02)
}

/// `round(interval * ease)`, ties away from zero.
fn grow_interval(interval: i32, ease: f64) -> Result<i32, SrsError> {
    let days = (f64::from(interval) * ease).round();
    if !(0.0..=f64::from(i32::MAX)).contains(&days) {
        return Err(SrsError::ScheduleOverflow {
            interval_days: days,
        });
    }
    Ok(days as i32)
}
