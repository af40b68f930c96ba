use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{AppState, Viewer};
use crate::domain::{CompetitionId, Notification, NotificationKind};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub include_dismissed: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationDto {
    pub id: i64,
    pub kind: NotificationKind,
    pub competition_id: CompetitionId,
    pub payload: serde_json::Value,
    pub is_read: bool,
    pub is_dismissed: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for NotificationDto {
    fn from(n: Notification) -> Self {
        NotificationDto {
            id: n.id,
            kind: n.kind,
            competition_id: n.competition_id,
            payload: n.payload,
            is_read: n.is_read,
            is_dismissed: n.is_dismissed,
            created_at: n.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsResponse {
    pub notifications: Vec<NotificationDto>,
}

/// The viewer's notifications, newest first. Dismissed ones are hidden
/// unless `includeDismissed=true`.
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
    Viewer(viewer): Viewer,
) -> Result<Json<ListNotificationsResponse>, AppError> {
    let notifications = state
        .repo
        .list_notifications(&viewer, query.include_dismissed)
        .await?;

    Ok(Json(ListNotificationsResponse {
        notifications: notifications.into_iter().map(Into::into).collect(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStateResponse {
    pub id: i64,
    pub updated: bool,
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Viewer(viewer): Viewer,
) -> Result<Json<NotificationStateResponse>, AppError> {
    let updated = state.repo.mark_notification_read(id, &viewer).await?;
    if !updated {
        return Err(AppError::NotFound(format!("no notification {}", id)));
    }

    Ok(Json(NotificationStateResponse { id, updated }))
}

pub async fn dismiss(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Viewer(viewer): Viewer,
) -> Result<Json<NotificationStateResponse>, AppError> {
    let updated = state.repo.dismiss_notification(id, &viewer).await?;
    if !updated {
        return Err(AppError::NotFound(format!("no notification {}", id)));
    }

    Ok(Json(NotificationStateResponse { id, updated }))
}
