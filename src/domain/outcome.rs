//! Finalized competition results and payout shares.

use crate::domain::{CompetitionId, Money, TeamId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who won a finalized competition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WinnerKind {
    Individual,
    Team,
    None,
}

impl WinnerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WinnerKind::Individual => "individual",
            WinnerKind::Team => "team",
            WinnerKind::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "individual" => Some(WinnerKind::Individual),
            "team" => Some(WinnerKind::Team),
            "none" => Some(WinnerKind::None),
            _ => None,
        }
    }
}

/// The one-time finalized outcome of a competition.
///
/// Immutable once written; at most one per competition, enforced by the
/// store's primary key on `competition_id`. A finished competition with
/// no result simply has not been finalized yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompetitionResult {
    pub competition_id: CompetitionId,
    /// Whether any entrant met its goal threshold.
    pub goal_reached: bool,
    pub winner_kind: WinnerKind,
    pub winner_user_id: Option<UserId>,
    pub winner_team_id: Option<TeamId>,
    /// The winner's final qualifying total; zero when nobody won.
    pub winning_score: Money,
    pub finalized_at: DateTime<Utc>,
}

/// One winner's slice of the prize pool, fixed at finalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutShare {
    pub user_id: UserId,
    pub amount: Money,
}
