//! Notification rows and per-recipient read state.

use super::{notification_from_row, Repository};
use crate::domain::{Notification, NotificationDraft, UserId};
use chrono::{DateTime, Utc};

impl Repository {
    /// Append one notification row.
    pub async fn insert_notification(
        &self,
        draft: &NotificationDraft,
        created_at: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (kind, competition_id, recipient_id, payload, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(draft.kind.as_str())
        .bind(draft.competition_id.to_string())
        .bind(draft.recipient_id.as_str())
        .bind(draft.payload.to_string())
        .bind(created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// A recipient's notifications, newest first. Dismissed rows are
    /// excluded unless asked for.
    pub async fn list_notifications(
        &self,
        recipient_id: &UserId,
        include_dismissed: bool,
    ) -> Result<Vec<Notification>, sqlx::Error> {
        let sql = if include_dismissed {
            r#"
            SELECT id, kind, competition_id, recipient_id, payload,
                   is_read, is_dismissed, created_at
            FROM notifications
            WHERE recipient_id = ?
            ORDER BY created_at DESC, id DESC
            "#
        } else {
            r#"
            SELECT id, kind, competition_id, recipient_id, payload,
                   is_read, is_dismissed, created_at
            FROM notifications
            WHERE recipient_id = ? AND is_dismissed = 0
            ORDER BY created_at DESC, id DESC
            "#
        };

        let rows = sqlx::query(sql)
            .bind(recipient_id.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(notification_from_row).collect())
    }

    /// Mark a notification read. Repeat calls are no-ops that still
    /// succeed; false means the row does not belong to the recipient.
    pub async fn mark_notification_read(
        &self,
        id: i64,
        recipient_id: &UserId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1 WHERE id = ? AND recipient_id = ?",
        )
        .bind(id)
        .bind(recipient_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Dismiss a notification, removing it from default listings.
    /// Repeat calls are no-ops that still succeed.
    pub async fn dismiss_notification(
        &self,
        id: i64,
        recipient_id: &UserId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET is_dismissed = 1 WHERE id = ? AND recipient_id = ?",
        )
        .bind(id)
        .bind(recipient_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
