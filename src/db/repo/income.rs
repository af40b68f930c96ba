//! Reads over the collaborator-owned income and profile tables.

use super::{parse_date, parse_money, Repository};
use crate::domain::{CompetitionId, IncomeRecord, Profile, UserId};
use chrono::NaiveDate;
use sqlx::Row;
use std::collections::HashMap;

impl Repository {
    /// All income rows of a competition's competitor members within the
    /// date range, both bounds inclusive. Rows come back unfiltered by
    /// platform; qualification is the engine's job.
    pub async fn income_for_competitors(
        &self,
        competition_id: &CompetitionId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<IncomeRecord>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT i.user_id, i.date, i.platform, i.amount
            FROM income_records i
            JOIN memberships m ON m.user_id = i.user_id
            WHERE m.competition_id = ? AND m.is_competitor = 1
              AND i.date >= ? AND i.date <= ?
            ORDER BY i.date ASC, i.id ASC
            "#,
        )
        .bind(competition_id.to_string())
        .bind(from.format("%Y-%m-%d").to_string())
        .bind(to.format("%Y-%m-%d").to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                let date: String = row.get("date");
                let amount: String = row.get("amount");
                IncomeRecord {
                    user_id: UserId::new(row.get("user_id")),
                    date: parse_date(&date, "income_records.date"),
                    platform: row.get("platform"),
                    amount: parse_money(&amount, "income_records.amount"),
                }
            })
            .collect())
    }

    /// Insert one income row. Only tests and seed tooling write here in
    /// this service; production rows arrive from the tracking module.
    pub async fn insert_income_record(&self, record: &IncomeRecord) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO income_records (user_id, date, platform, amount) VALUES (?, ?, ?, ?)",
        )
        .bind(record.user_id.as_str())
        .bind(record.date.format("%Y-%m-%d").to_string())
        .bind(record.platform.as_str())
        .bind(record.amount.to_canonical_string())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Display names for a set of users. Users without a profile row
    /// are simply absent from the map.
    ///
    /// Chunked to stay under SQLite's bound-parameter limit.
    pub async fn display_names(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, String>, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        const CHUNK_SIZE: usize = 500;
        let mut names = HashMap::with_capacity(user_ids.len());

        for chunk in user_ids.chunks(CHUNK_SIZE) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT user_id, display_name FROM profiles WHERE user_id IN ({})",
                placeholders
            );

            let mut query = sqlx::query(&sql);
            for user_id in chunk {
                query = query.bind(user_id.as_str());
            }

            let rows = query.fetch_all(&self.pool).await?;
            for row in rows {
                names.insert(UserId::new(row.get("user_id")), row.get("display_name"));
            }
        }

        Ok(names)
    }

    /// Fetch one user's profile.
    pub async fn get_profile(&self, user_id: &UserId) -> Result<Option<Profile>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT user_id, display_name, payout_key FROM profiles WHERE user_id = ?",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Profile {
            user_id: UserId::new(r.get("user_id")),
            display_name: r.get("display_name"),
            payout_key: r.get("payout_key"),
        }))
    }

    /// Insert or update a profile row.
    pub async fn upsert_profile(&self, profile: &Profile) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO profiles (user_id, display_name, payout_key)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                display_name = excluded.display_name,
                payout_key = excluded.payout_key
            "#,
        )
        .bind(profile.user_id.as_str())
        .bind(profile.display_name.as_str())
        .bind(profile.payout_key.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
