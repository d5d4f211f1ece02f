//! Review quality score.

use std::fmt;

use crate::SrsError;

/// Self-assessed recall quality on the SM-2 scale.
///
/// - 0: complete blackout
/// - 1: incorrect, but the answer was recognised
/// - 2: incorrect, but the answer seemed easy once shown
/// - 3: correct with serious difficulty
/// - 4: correct after hesitation
/// - 5: perfect recall
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    /// Highest quality score.
    pub const MAX: u8 = 5;

    /// Lowest score that counts as a correct recall.
    pub const PASSING: u8 = 3;

    /// Creates a quality score, rejecting values outside `0..=5`.
    pub fn new(value: i64) -> Result<Self, SrsError> {
        match u8::try_from(value) {
            Ok(v) if v <= Self::MAX => Ok(Self(v)),
            _ => Err(SrsError::InvalidQuality(value)),
        }
    }

    /// Returns the raw score.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Whether this score counts as a correct recall.
    #[must_use]
    pub const fn is_correct(&self) -> bool {
        self.0 >= Self::PASSING
    }
}

impl TryFrom<i64> for Quality {
    type Error = SrsError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(3)]
    #[case(5)]
    fn accepts_scale(#[case] value: i64) {
        assert_eq!(Quality::new(value).unwrap().value() as i64, value);
    }

    #[rstest]
    #[case(-1)]
    #[case(6)]
    #[case(256)]
    #[case(i64::MAX)]
    fn rejects_out_of_range(#[case] value: i64) {
        assert_eq!(Quality::new(value), Err(SrsError::InvalidQuality(value)));
    }

    #[rstest]
    #[case(0, false)]
    #[case(2, false)]
    #[case(3, true)]
    #[case(5, true)]
    fn passing_threshold(#[case] value: i64, #[case] correct: bool) {
        assert_eq!(Quality::new(value).unwrap().is_correct(), correct);
    }
}
