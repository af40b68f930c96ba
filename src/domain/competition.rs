//! Competition, membership, and team records.

use crate::domain::{CompetitionId, Money, TeamId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// What a competition's goal value measures. Only income goals exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalKind {
    Income,
}

impl GoalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalKind::Income => "income",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "income" => Some(GoalKind::Income),
            _ => None,
        }
    }
}

/// A member's role within one competition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Host,
    Member,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Host => "host",
            MemberRole::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "host" => Some(MemberRole::Host),
            "member" => Some(MemberRole::Member),
            _ => None,
        }
    }
}

/// A time-boxed income contest.
///
/// `code` is the human-shareable join handle, stored uppercase and
/// resolved case-insensitively. The host's opt-in/out of scoring lives
/// on the host's membership (`is_competitor`), not here, so the flag
/// has exactly one source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Competition {
    pub id: CompetitionId,
    pub code: String,
    pub name: String,
    pub description: String,
    pub goal_kind: GoalKind,
    /// Per-participant income target; the group target scales with competitor count.
    pub goal_value: Money,
    /// Total prize pool paid out off-platform by the host.
    pub prize_value: Money,
    pub start_date: NaiveDate,
    /// Inclusive, date granularity.
    pub end_date: NaiveDate,
    pub max_members: Option<i64>,
    pub allow_teams: bool,
    pub team_size: Option<i64>,
    pub password_hash: Option<String>,
    pub host_id: UserId,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
}

impl Competition {
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Check a join attempt's password against the stored digest.
    ///
    /// Open competitions (no password set) accept any input.
    pub fn password_matches(&self, provided: Option<&str>) -> bool {
        match &self.password_hash {
            None => true,
            Some(stored) => match provided.map(str::trim).filter(|s| !s.is_empty()) {
                Some(pw) => hash_join_password(pw) == *stored,
                None => false,
            },
        }
    }
}

/// SHA-256 hex digest of a join password.
pub fn hash_join_password(password: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(password.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// A user's participation record in one competition.
///
/// `id` is the store's autoincrement row id and doubles as the join
/// order used for tie-breaks (earlier row id = earlier join).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub id: i64,
    pub competition_id: CompetitionId,
    pub user_id: UserId,
    pub role: MemberRole,
    /// False for observers: they can view but never accrue score or
    /// count toward the goal denominator.
    pub is_competitor: bool,
    pub team_id: Option<TeamId>,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    pub fn is_host(&self) -> bool {
        self.role == MemberRole::Host
    }
}

/// A named grouping of members within a team-mode competition.
///
/// Scores are never stored on the team; they are recomputed from member
/// contributions on every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: TeamId,
    pub competition_id: CompetitionId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
