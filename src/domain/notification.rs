//! Host and winner notifications generated at finalization.

use crate::domain::{CompetitionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Host summary with each winner's contact and payout key.
    Payout,
    /// Host summary when the goal was not met.
    NoWinner,
    /// Lighter note sent to each winning member.
    Winner,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Payout => "payout",
            NotificationKind::NoWinner => "no_winner",
            NotificationKind::Winner => "winner",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "payout" => Some(NotificationKind::Payout),
            "no_winner" => Some(NotificationKind::NoWinner),
            "winner" => Some(NotificationKind::Winner),
            _ => None,
        }
    }
}

/// A notification not yet accepted by the sink (no id or read state).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub kind: NotificationKind,
    pub competition_id: CompetitionId,
    pub recipient_id: UserId,
    pub payload: serde_json::Value,
}

/// A stored notification with per-recipient read/dismissed state.
///
/// Read and dismissed are idempotent flags owned by the store, not by
/// any client session cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: i64,
    pub kind: NotificationKind,
    pub competition_id: CompetitionId,
    pub recipient_id: UserId,
    pub payload: serde_json::Value,
    pub is_read: bool,
    pub is_dismissed: bool,
    pub created_at: DateTime<Utc>,
}
