//! Finalized outcomes, winner shares, and global ranking sources.

use super::{
    membership_from_row, parse_date, parse_money, result_from_row, Repository,
};
use crate::domain::{
    CompetitionId, CompetitionResult, Membership, Money, PayoutShare, TeamId, UserId,
};
use chrono::NaiveDate;
use sqlx::Row;

/// A finalized result joined with the competition fields the global
/// ranking needs for window filtering and prize crediting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedOutcome {
    pub result: CompetitionResult,
    pub end_date: NaiveDate,
    pub prize_value: Money,
}

impl Repository {
    /// Record a finalized result and its winner shares atomically.
    ///
    /// The insert races on the `competition_id` primary key: the caller
    /// that gets `true` owns the finalization and its winner rows are
    /// committed; `false` means another caller already finalized and
    /// nothing was written.
    pub async fn insert_result(
        &self,
        result: &CompetitionResult,
        winners: &[PayoutShare],
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO competition_results
                (competition_id, goal_reached, winner_kind, winner_user_id,
                 winner_team_id, winning_score, finalized_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(competition_id) DO NOTHING
            "#,
        )
        .bind(result.competition_id.to_string())
        .bind(if result.goal_reached { 1 } else { 0 })
        .bind(result.winner_kind.as_str())
        .bind(result.winner_user_id.as_ref().map(|u| u.as_str().to_string()))
        .bind(result.winner_team_id.map(|t| t.as_i64()))
        .bind(result.winning_score.to_canonical_string())
        .bind(result.finalized_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for share in winners {
            sqlx::query(
                r#"
                INSERT INTO competition_winners (competition_id, user_id, amount)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(result.competition_id.to_string())
            .bind(share.user_id.as_str())
            .bind(share.amount.to_canonical_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Fetch a competition's finalized result, if any.
    pub async fn get_result(
        &self,
        competition_id: &CompetitionId,
    ) -> Result<Option<CompetitionResult>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT competition_id, goal_reached, winner_kind, winner_user_id,
                   winner_team_id, winning_score, finalized_at
            FROM competition_results
            WHERE competition_id = ?
            "#,
        )
        .bind(competition_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| result_from_row(&r)))
    }

    /// Winner payout shares fixed at finalization, in join order.
    pub async fn get_winner_shares(
        &self,
        competition_id: &CompetitionId,
    ) -> Result<Vec<PayoutShare>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, amount
            FROM competition_winners
            WHERE competition_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(competition_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let amount: String = row.get("amount");
                PayoutShare {
                    user_id: UserId::new(row.get("user_id")),
                    amount: parse_money(&amount, "competition_winners.amount"),
                }
            })
            .collect())
    }

    /// Every finalized result of a live competition, joined with the
    /// end date and prize the ranking credits from. Window filtering
    /// happens in the caller.
    pub async fn finalized_outcomes(&self) -> Result<Vec<FinalizedOutcome>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT r.competition_id, r.goal_reached, r.winner_kind, r.winner_user_id,
                   r.winner_team_id, r.winning_score, r.finalized_at,
                   c.end_date, c.prize_value
            FROM competition_results r
            JOIN competitions c ON c.id = r.competition_id
            WHERE c.is_deleted = 0
            ORDER BY c.end_date ASC, r.competition_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let end_date: String = row.get("end_date");
                let prize_value: String = row.get("prize_value");
                FinalizedOutcome {
                    result: result_from_row(row),
                    end_date: parse_date(&end_date, "competitions.end_date"),
                    prize_value: parse_money(&prize_value, "competitions.prize_value"),
                }
            })
            .collect())
    }

    /// A team's current competitor members in join order. The global
    /// ranking resolves team prizes against this live list rather than
    /// the shares recorded at finalization.
    pub async fn team_competitor_members(
        &self,
        team_id: TeamId,
    ) -> Result<Vec<Membership>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, competition_id, user_id, role, is_competitor, team_id, joined_at
            FROM memberships
            WHERE team_id = ? AND is_competitor = 1
            ORDER BY id ASC
            "#,
        )
        .bind(team_id.as_i64())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(membership_from_row).collect())
    }

    /// Competitor memberships of live competitions, finalized or not,
    /// with the competition end date for window filtering in the caller.
    pub async fn competitor_participations(
        &self,
    ) -> Result<Vec<(UserId, CompetitionId, NaiveDate)>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT m.user_id, m.competition_id, c.end_date
            FROM memberships m
            JOIN competitions c ON c.id = m.competition_id
            WHERE m.is_competitor = 1 AND c.is_deleted = 0
            ORDER BY m.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let competition_id: String = row.get("competition_id");
                let end_date: String = row.get("end_date");
                (
                    UserId::new(row.get("user_id")),
                    super::parse_competition_id(&competition_id),
                    parse_date(&end_date, "competitions.end_date"),
                )
            })
            .collect())
    }
}
