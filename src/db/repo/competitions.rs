//! Competition and membership operations.

use super::{competition_from_row, membership_from_row, Repository};
use crate::domain::{Competition, CompetitionId, MemberRole, Membership, UserId};
use chrono::{DateTime, Utc};
use sqlx::Row;

impl Repository {
    /// Insert a competition together with its host membership in one
    /// transaction. Returns the host membership row id.
    ///
    /// # Errors
    /// Returns an error if either insert fails; a UNIQUE violation on
    /// `competitions.code` means the generated code collided.
    pub async fn create_competition(
        &self,
        competition: &Competition,
        host_is_competitor: bool,
    ) -> Result<i64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO competitions
                (id, code, name, description, goal_kind, goal_value, prize_value,
                 start_date, end_date, max_members, allow_teams, team_size,
                 password_hash, host_id, is_public, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(competition.id.to_string())
        .bind(competition.code.as_str())
        .bind(competition.name.as_str())
        .bind(competition.description.as_str())
        .bind(competition.goal_kind.as_str())
        .bind(competition.goal_value.to_canonical_string())
        .bind(competition.prize_value.to_canonical_string())
        .bind(competition.start_date.format("%Y-%m-%d").to_string())
        .bind(competition.end_date.format("%Y-%m-%d").to_string())
        .bind(competition.max_members)
        .bind(if competition.allow_teams { 1 } else { 0 })
        .bind(competition.team_size)
        .bind(competition.password_hash.as_deref())
        .bind(competition.host_id.as_str())
        .bind(if competition.is_public { 1 } else { 0 })
        .bind(competition.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            INSERT INTO memberships (competition_id, user_id, role, is_competitor, joined_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(competition.id.to_string())
        .bind(competition.host_id.as_str())
        .bind(MemberRole::Host.as_str())
        .bind(if host_is_competitor { 1 } else { 0 })
        .bind(competition.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.last_insert_rowid())
    }

    /// Fetch a competition by id. Soft-deleted rows are invisible.
    pub async fn find_competition(
        &self,
        id: &CompetitionId,
    ) -> Result<Option<Competition>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, code, name, description, goal_kind, goal_value, prize_value,
                   start_date, end_date, max_members, allow_teams, team_size,
                   password_hash, host_id, is_public, created_at
            FROM competitions
            WHERE id = ? AND is_deleted = 0
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| competition_from_row(&r)))
    }

    /// Fetch a competition by join code, case-insensitively.
    pub async fn find_competition_by_code(
        &self,
        code: &str,
    ) -> Result<Option<Competition>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, code, name, description, goal_kind, goal_value, prize_value,
                   start_date, end_date, max_members, allow_teams, team_size,
                   password_hash, host_id, is_public, created_at
            FROM competitions
            WHERE code = ? AND is_deleted = 0
            "#,
        )
        .bind(code.trim().to_uppercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| competition_from_row(&r)))
    }

    /// Public competitions, newest first.
    pub async fn list_public_competitions(&self) -> Result<Vec<Competition>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, code, name, description, goal_kind, goal_value, prize_value,
                   start_date, end_date, max_members, allow_teams, team_size,
                   password_hash, host_id, is_public, created_at
            FROM competitions
            WHERE is_public = 1 AND is_deleted = 0
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(competition_from_row).collect())
    }

    /// Competitions the user belongs to, newest first.
    pub async fn list_competitions_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Competition>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.code, c.name, c.description, c.goal_kind, c.goal_value,
                   c.prize_value, c.start_date, c.end_date, c.max_members,
                   c.allow_teams, c.team_size, c.password_hash, c.host_id,
                   c.is_public, c.created_at
            FROM competitions c
            JOIN memberships m ON m.competition_id = c.id
            WHERE m.user_id = ? AND c.is_deleted = 0
            ORDER BY c.created_at DESC, c.id ASC
            "#,
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(competition_from_row).collect())
    }

    /// Soft-delete a competition. Returns false when no live row matched.
    pub async fn soft_delete_competition(
        &self,
        id: &CompetitionId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE competitions SET is_deleted = 1 WHERE id = ? AND is_deleted = 0",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Insert a membership idempotently.
    ///
    /// Returns the new row id, or None when the user was already a
    /// member (the UNIQUE(competition_id, user_id) row already exists).
    pub async fn insert_membership(
        &self,
        competition_id: &CompetitionId,
        user_id: &UserId,
        role: MemberRole,
        is_competitor: bool,
        joined_at: DateTime<Utc>,
    ) -> Result<Option<i64>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO memberships (competition_id, user_id, role, is_competitor, joined_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(competition_id, user_id) DO NOTHING
            "#,
        )
        .bind(competition_id.to_string())
        .bind(user_id.as_str())
        .bind(role.as_str())
        .bind(if is_competitor { 1 } else { 0 })
        .bind(joined_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            Ok(Some(result.last_insert_rowid()))
        } else {
            Ok(None)
        }
    }

    /// Fetch one user's membership in a competition.
    pub async fn get_membership(
        &self,
        competition_id: &CompetitionId,
        user_id: &UserId,
    ) -> Result<Option<Membership>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, competition_id, user_id, role, is_competitor, team_id, joined_at
            FROM memberships
            WHERE competition_id = ? AND user_id = ?
            "#,
        )
        .bind(competition_id.to_string())
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| membership_from_row(&r)))
    }

    /// All memberships of a competition in join order.
    pub async fn list_memberships(
        &self,
        competition_id: &CompetitionId,
    ) -> Result<Vec<Membership>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, competition_id, user_id, role, is_competitor, team_id, joined_at
            FROM memberships
            WHERE competition_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(competition_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(membership_from_row).collect())
    }

    /// Remove a user's membership. Returns false when none existed.
    pub async fn delete_membership(
        &self,
        competition_id: &CompetitionId,
        user_id: &UserId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM memberships WHERE competition_id = ? AND user_id = ?",
        )
        .bind(competition_id.to_string())
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count all members of a competition (hosts and observers included).
    pub async fn count_members(
        &self,
        competition_id: &CompetitionId,
    ) -> Result<i64, sqlx::Error> {
        let row = sqlx::query(
            "SELECT COUNT(*) as n FROM memberships WHERE competition_id = ?",
        )
        .bind(competition_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("n"))
    }
}
