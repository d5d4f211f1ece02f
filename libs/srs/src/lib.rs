//! # tramdoc-srs
//!
//! Spaced-repetition scheduling for notes that have been promoted to
//! flashcards. The scheduler is a simplified SM-2:
//!
//! - a correct recall (quality >= 3) advances the repetition chain and grows
//!   the interval (1 day, then 6 days, then `round(interval * ease)`),
//! - a lapse (quality < 3) restarts the chain at a 1 day interval,
//! - the ease factor is adjusted on correct recalls and never drops below
//!   [`MIN_EASE`].
//!
//! Everything here is pure: callers pass the current time in and persist the
//! returned state themselves.
//!
//! # Invariants
//!
//! - `ease >= MIN_EASE` after every review
//! - `interval` is a non-negative number of whole days
//! - `next_review == reviewed_at + interval days` for every scheduled card

mod error;
mod quality;
mod state;

pub use error::SrsError;
pub use quality::Quality;
pub use state::{FlashcardPhase, FlashcardState, ReviewOutcome};

/// Ease factor assigned on promotion.
pub const DEFAULT_EASE: f64 = 2.5;

/// Lower bound for the ease factor.
pub const MIN_EASE: f64 = 1.3;

/// Interval (days) assigned on promotion and after a lapse.
pub const INITIAL_INTERVAL_DAYS: i32 = 1;

/// Interval (days) after the second consecutive correct recall.
pub const SECOND_INTERVAL_DAYS: i32 = 6;
