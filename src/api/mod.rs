pub mod competitions;
pub mod dashboard;
pub mod health;
pub mod leaderboard;
pub mod notifications;
pub mod ranking;
pub mod teams;

use crate::config::Config;
use crate::db::Repository;
use crate::domain::{Competition, CompetitionId, Membership, UserId};
use crate::error::AppError;
use crate::finalize::Finalizer;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub finalizer: Arc<Finalizer>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: Config, finalizer: Arc<Finalizer>) -> Self {
        Self {
            repo,
            config,
            finalizer,
        }
    }
}

/// The authenticated caller, taken from the `X-User-Id` header that the
/// auth gateway in front of this service injects.
pub struct Viewer(pub UserId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AppError::InvalidCredentials("missing X-User-Id header".to_string())
            })?;

        Ok(Viewer(UserId::new(user_id.to_string())))
    }
}

/// Resolve a path key that may be a competition id or a join code.
pub(crate) async fn resolve_competition(
    repo: &Repository,
    key: &str,
) -> Result<Competition, AppError> {
    if let Ok(id) = key.parse::<CompetitionId>() {
        if let Some(competition) = repo.find_competition(&id).await? {
            return Ok(competition);
        }
    }

    repo.find_competition_by_code(key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("competition {} not found", key)))
}

/// Members always see a competition; everyone else only when it is
/// public. Returns the viewer's membership for downstream checks.
pub(crate) async fn authorize_view(
    repo: &Repository,
    competition: &Competition,
    viewer: &UserId,
) -> Result<Option<Membership>, AppError> {
    let membership = repo.get_membership(&competition.id, viewer).await?;
    if membership.is_none() && !competition.is_public {
        return Err(AppError::Forbidden(
            "competition is private to its members".to_string(),
        ));
    }
    Ok(membership)
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route(
            "/v1/competitions",
            get(competitions::list_competitions).post(competitions::create_competition),
        )
        .route("/v1/competitions/join", post(competitions::join_competition))
        .route(
            "/v1/competitions/:key",
            delete(competitions::delete_competition),
        )
        .route(
            "/v1/competitions/:key/leave",
            post(competitions::leave_competition),
        )
        .route("/v1/competitions/:key/dashboard", get(dashboard::get_dashboard))
        .route(
            "/v1/competitions/:key/leaderboard",
            get(leaderboard::get_leaderboard),
        )
        .route("/v1/competitions/:key/teams", post(teams::create_teams))
        .route(
            "/v1/competitions/:key/teams/:team_id",
            patch(teams::rename_team),
        )
        .route(
            "/v1/competitions/:key/teams/:team_id/members/:user_id",
            put(teams::assign_member),
        )
        .route(
            "/v1/competitions/:key/teams/members/:user_id",
            delete(teams::unassign_member),
        )
        .route("/v1/ranking", get(ranking::get_ranking))
        .route("/v1/notifications", get(notifications::list_notifications))
        .route(
            "/v1/notifications/:id/read",
            post(notifications::mark_read),
        )
        .route(
            "/v1/notifications/:id/dismiss",
            post(notifications::dismiss),
        )
        .layer(cors)
        .with_state(state)
}
