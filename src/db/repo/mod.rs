//! Repository layer for database operations.
//!
//! All store access goes through the `Repository` struct. Methods are
//! organized across submodules by domain:
//! - `competitions.rs` - competition and membership operations
//! - `teams.rs` - team rows and member assignment
//! - `income.rs` - collaborator-owned income and profile tables
//! - `results.rs` - finalized outcomes, winners, ranking sources
//! - `notifications.rs` - notification rows and per-user read state

mod competitions;
mod income;
mod notifications;
mod results;
mod teams;

use crate::domain::{
    Competition, CompetitionId, CompetitionResult, GoalKind, MemberRole, Membership, Money,
    Notification, NotificationKind, Team, TeamId, UserId, WinnerKind,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::warn;
use uuid::Uuid;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }
}

/// True when `err` is a UNIQUE violation mentioning `constraint`.
///
/// SQLite reports these as generic database errors, so the constraint
/// is matched by name in the message.
pub(crate) fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            let message = db_err.message();
            message.contains("UNIQUE constraint failed") && message.contains(constraint)
        }
        _ => false,
    }
}

// Stored values are written in canonical form; parse failures are
// logged and fall back to defaults.

pub(crate) fn parse_money(value: &str, column: &str) -> Money {
    Money::from_str_canonical(value).unwrap_or_else(|e| {
        warn!(value = %value, column = %column, error = %e, "failed to parse stored amount, using zero");
        Money::zero()
    })
}

pub(crate) fn parse_date(value: &str, column: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap_or_else(|e| {
        warn!(value = %value, column = %column, error = %e, "failed to parse stored date, using epoch");
        NaiveDate::default()
    })
}

pub(crate) fn parse_timestamp(value: &str, column: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!(value = %value, column = %column, error = %e, "failed to parse stored timestamp, using epoch");
            DateTime::<Utc>::default()
        })
}

pub(crate) fn parse_competition_id(value: &str) -> CompetitionId {
    Uuid::parse_str(value)
        .map(CompetitionId)
        .unwrap_or_else(|e| {
            warn!(value = %value, error = %e, "failed to parse stored competition id, using nil");
            CompetitionId(Uuid::nil())
        })
}

pub(crate) fn competition_from_row(row: &SqliteRow) -> Competition {
    let id: String = row.get("id");
    let goal_kind: String = row.get("goal_kind");
    let goal_value: String = row.get("goal_value");
    let prize_value: String = row.get("prize_value");
    let start_date: String = row.get("start_date");
    let end_date: String = row.get("end_date");
    let created_at: String = row.get("created_at");

    Competition {
        id: parse_competition_id(&id),
        code: row.get("code"),
        name: row.get("name"),
        description: row.get("description"),
        goal_kind: GoalKind::parse(&goal_kind).unwrap_or_else(|| {
            warn!(value = %goal_kind, "unknown goal kind in store, using income");
            GoalKind::Income
        }),
        goal_value: parse_money(&goal_value, "competitions.goal_value"),
        prize_value: parse_money(&prize_value, "competitions.prize_value"),
        start_date: parse_date(&start_date, "competitions.start_date"),
        end_date: parse_date(&end_date, "competitions.end_date"),
        max_members: row.get("max_members"),
        allow_teams: row.get::<i32, _>("allow_teams") != 0,
        team_size: row.get("team_size"),
        password_hash: row.get("password_hash"),
        host_id: UserId::new(row.get("host_id")),
        is_public: row.get::<i32, _>("is_public") != 0,
        created_at: parse_timestamp(&created_at, "competitions.created_at"),
    }
}

pub(crate) fn membership_from_row(row: &SqliteRow) -> Membership {
    let competition_id: String = row.get("competition_id");
    let role: String = row.get("role");
    let joined_at: String = row.get("joined_at");

    Membership {
        id: row.get("id"),
        competition_id: parse_competition_id(&competition_id),
        user_id: UserId::new(row.get("user_id")),
        role: MemberRole::parse(&role).unwrap_or_else(|| {
            warn!(value = %role, "unknown member role in store, using member");
            MemberRole::Member
        }),
        is_competitor: row.get::<i32, _>("is_competitor") != 0,
        team_id: row.get::<Option<i64>, _>("team_id").map(TeamId::new),
        joined_at: parse_timestamp(&joined_at, "memberships.joined_at"),
    }
}

pub(crate) fn team_from_row(row: &SqliteRow) -> Team {
    let competition_id: String = row.get("competition_id");
    let created_at: String = row.get("created_at");

    Team {
        id: TeamId::new(row.get("id")),
        competition_id: parse_competition_id(&competition_id),
        name: row.get("name"),
        created_at: parse_timestamp(&created_at, "teams.created_at"),
    }
}

pub(crate) fn result_from_row(row: &SqliteRow) -> CompetitionResult {
    let competition_id: String = row.get("competition_id");
    let winner_kind: String = row.get("winner_kind");
    let winning_score: String = row.get("winning_score");
    let finalized_at: String = row.get("finalized_at");

    CompetitionResult {
        competition_id: parse_competition_id(&competition_id),
        goal_reached: row.get::<i32, _>("goal_reached") != 0,
        winner_kind: WinnerKind::parse(&winner_kind).unwrap_or_else(|| {
            warn!(value = %winner_kind, "unknown winner kind in store, using none");
            WinnerKind::None
        }),
        winner_user_id: row
            .get::<Option<String>, _>("winner_user_id")
            .map(UserId::new),
        winner_team_id: row
            .get::<Option<i64>, _>("winner_team_id")
            .map(TeamId::new),
        winning_score: parse_money(&winning_score, "competition_results.winning_score"),
        finalized_at: parse_timestamp(&finalized_at, "competition_results.finalized_at"),
    }
}

pub(crate) fn notification_from_row(row: &SqliteRow) -> Notification {
    let kind: String = row.get("kind");
    let competition_id: String = row.get("competition_id");
    let payload: String = row.get("payload");
    let created_at: String = row.get("created_at");

    Notification {
        id: row.get("id"),
        kind: NotificationKind::parse(&kind).unwrap_or_else(|| {
            warn!(value = %kind, "unknown notification kind in store, using winner");
            NotificationKind::Winner
        }),
        competition_id: parse_competition_id(&competition_id),
        recipient_id: UserId::new(row.get("recipient_id")),
        payload: serde_json::from_str(&payload).unwrap_or_else(|e| {
            warn!(column = "notifications.payload", error = %e, "failed to parse stored payload, using null");
            serde_json::Value::Null
        }),
        is_read: row.get::<i32, _>("is_read") != 0,
        is_dismissed: row.get::<i32, _>("is_dismissed") != 0,
        created_at: parse_timestamp(&created_at, "notifications.created_at"),
    }
}
