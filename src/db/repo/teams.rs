//! Team rows and member assignment.

use super::{team_from_row, Repository};
use crate::domain::{CompetitionId, Team, TeamId, UserId};
use chrono::{DateTime, Utc};
use sqlx::Row;

impl Repository {
    /// Insert one team per name and apply the initial member
    /// assignments in a single transaction. `assignments` pairs each
    /// user with an index into `names`; the created rows come back in
    /// insertion order.
    pub async fn create_teams(
        &self,
        competition_id: &CompetitionId,
        names: &[String],
        assignments: &[(UserId, usize)],
        created_at: DateTime<Utc>,
    ) -> Result<Vec<Team>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut teams = Vec::with_capacity(names.len());

        for name in names {
            let result = sqlx::query(
                "INSERT INTO teams (competition_id, name, created_at) VALUES (?, ?, ?)",
            )
            .bind(competition_id.to_string())
            .bind(name.as_str())
            .bind(created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;

            teams.push(Team {
                id: TeamId::new(result.last_insert_rowid()),
                competition_id: *competition_id,
                name: name.clone(),
                created_at,
            });
        }

        for (user_id, team_idx) in assignments {
            let team = match teams.get(*team_idx) {
                Some(team) => team,
                None => continue,
            };
            sqlx::query(
                "UPDATE memberships SET team_id = ? WHERE competition_id = ? AND user_id = ?",
            )
            .bind(team.id.as_i64())
            .bind(competition_id.to_string())
            .bind(user_id.as_str())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(teams)
    }

    /// All teams of a competition in creation order.
    pub async fn list_teams(
        &self,
        competition_id: &CompetitionId,
    ) -> Result<Vec<Team>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, competition_id, name, created_at
            FROM teams
            WHERE competition_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(competition_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(team_from_row).collect())
    }

    /// Fetch one team scoped to its competition.
    pub async fn find_team(
        &self,
        competition_id: &CompetitionId,
        team_id: TeamId,
    ) -> Result<Option<Team>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, competition_id, name, created_at
            FROM teams
            WHERE id = ? AND competition_id = ?
            "#,
        )
        .bind(team_id.as_i64())
        .bind(competition_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| team_from_row(&r)))
    }

    /// True when another team in the competition already uses this name,
    /// compared case-insensitively.
    pub async fn team_name_taken(
        &self,
        competition_id: &CompetitionId,
        name: &str,
        exclude: TeamId,
    ) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as n
            FROM teams
            WHERE competition_id = ? AND lower(name) = lower(?) AND id <> ?
            "#,
        )
        .bind(competition_id.to_string())
        .bind(name)
        .bind(exclude.as_i64())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<i64, _>("n") > 0)
    }

    /// Rename a team. Returns false when the row does not exist.
    pub async fn rename_team(&self, team_id: TeamId, name: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE teams SET name = ? WHERE id = ?")
            .bind(name)
            .bind(team_id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Set or clear one member's team assignment. Returns false when
    /// the user has no membership in the competition.
    pub async fn set_member_team(
        &self,
        competition_id: &CompetitionId,
        user_id: &UserId,
        team_id: Option<TeamId>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE memberships SET team_id = ? WHERE competition_id = ? AND user_id = ?",
        )
        .bind(team_id.map(|t| t.as_i64()))
        .bind(competition_id.to_string())
        .bind(user_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Count competitor members currently assigned to a team.
    pub async fn count_team_members(&self, team_id: TeamId) -> Result<i64, sqlx::Error> {
        let row = sqlx::query(
            "SELECT COUNT(*) as n FROM memberships WHERE team_id = ? AND is_competitor = 1",
        )
        .bind(team_id.as_i64())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("n"))
    }
}
