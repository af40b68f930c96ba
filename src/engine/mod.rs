//! Pure computation engine for deterministic competition logic.
//!
//! Nothing in this module touches the store or the clock. Every
//! function takes rows already loaded and a caller-supplied "today",
//! so the same inputs always produce the same standings, phase, and
//! outcome.

pub mod aggregation;
pub mod outcome;
pub mod payout;
pub mod period;
pub mod phase;
pub mod ranking;

pub use aggregation::{
    compute_standings, CompetitionStandings, DailyTotal, MemberStanding, PlatformAmount,
    PlatformSlice, TeamStanding,
};
pub use outcome::{decide_outcome, OutcomeDecision};
pub use payout::split_even;
pub use period::{sum_in_window, DateWindow, RankingPeriod};
pub use phase::CompetitionPhase;
pub use ranking::{merge_ranking, GlobalRanking, RankingEntry, RankingTotals, WinCredit};
