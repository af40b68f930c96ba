//! Competition lifecycle phases derived from wall-clock dates.
//!
//! There is no persisted "current state" column. The phase is always
//! recomputed from (start_date, end_date, today, existence-of-result),
//! so it can never drift out of sync with the stored dates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Where a competition sits in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionPhase {
    /// Today is before the start date.
    Upcoming,
    /// Today is within [start_date, end_date].
    Active,
    /// Today is past the end date, or a result already exists.
    Finished,
}

impl CompetitionPhase {
    /// Derive the phase for a competition.
    ///
    /// A persisted result forces Finished regardless of dates: results
    /// are immutable, so a finalized competition can never reopen even
    /// if its dates were somehow edited afterwards.
    pub fn compute(
        start_date: NaiveDate,
        end_date: NaiveDate,
        today: NaiveDate,
        has_result: bool,
    ) -> Self {
        if has_result || today > end_date {
            CompetitionPhase::Finished
        } else if today < start_date {
            CompetitionPhase::Upcoming
        } else {
            CompetitionPhase::Active
        }
    }

    pub fn is_finished(&self) -> bool {
        *self == CompetitionPhase::Finished
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompetitionPhase::Upcoming => "upcoming",
            CompetitionPhase::Active => "active",
            CompetitionPhase::Finished => "finished",
        }
    }
}

impl std::fmt::Display for CompetitionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_phase_boundaries() {
        let start = d(2025, 6, 10);
        let end = d(2025, 6, 20);

        assert_eq!(
            CompetitionPhase::compute(start, end, d(2025, 6, 9), false),
            CompetitionPhase::Upcoming
        );
        // Start and end dates are inclusive.
        assert_eq!(
            CompetitionPhase::compute(start, end, d(2025, 6, 10), false),
            CompetitionPhase::Active
        );
        assert_eq!(
            CompetitionPhase::compute(start, end, d(2025, 6, 20), false),
            CompetitionPhase::Active
        );
        assert_eq!(
            CompetitionPhase::compute(start, end, d(2025, 6, 21), false),
            CompetitionPhase::Finished
        );
    }

    #[test]
    fn test_existing_result_forces_finished() {
        let start = d(2025, 6, 10);
        let end = d(2025, 6, 20);
        assert_eq!(
            CompetitionPhase::compute(start, end, d(2025, 6, 15), true),
            CompetitionPhase::Finished
        );
    }

    #[test]
    fn test_single_day_competition() {
        let day = d(2025, 6, 10);
        assert_eq!(
            CompetitionPhase::compute(day, day, day, false),
            CompetitionPhase::Active
        );
        assert_eq!(
            CompetitionPhase::compute(day, day, d(2025, 6, 11), false),
            CompetitionPhase::Finished
        );
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&CompetitionPhase::Upcoming).unwrap(),
            "\"upcoming\""
        );
    }
}
