use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::api::competitions::{summarize, CompetitionSummary};
use crate::api::{authorize_view, resolve_competition, AppState, Viewer};
use crate::domain::{CompetitionResult, Money, TeamId, UserId, WinnerKind};
use crate::engine::{compute_standings, CompetitionStandings};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerContext {
    pub is_member: bool,
    pub is_host: bool,
    pub is_competitor: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerShareDto {
    pub user_id: String,
    pub amount: Money,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultDto {
    pub goal_reached: bool,
    pub winner_kind: WinnerKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_team_id: Option<TeamId>,
    pub winning_score: Money,
    pub finalized_at: DateTime<Utc>,
    pub winners: Vec<WinnerShareDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub competition: CompetitionSummary,
    pub standings: CompetitionStandings,
    pub viewer: ViewerContext,
    pub result: Option<ResultDto>,
}

/// Full dashboard: summary, live standings, breakdowns, and the
/// finalized result once the competition has ended.
pub async fn get_dashboard(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Viewer(viewer): Viewer,
) -> Result<Json<DashboardResponse>, AppError> {
    let competition = resolve_competition(&state.repo, &key).await?;
    let membership = authorize_view(&state.repo, &competition, &viewer).await?;

    let today = Utc::now().date_naive();
    let result = state.finalizer.ensure_finalized(&competition, today).await?;

    let memberships = state.repo.list_memberships(&competition.id).await?;
    let teams = state.repo.list_teams(&competition.id).await?;
    let income = state
        .repo
        .income_for_competitors(&competition.id, competition.start_date, competition.end_date)
        .await?;

    let user_ids: Vec<UserId> = memberships.iter().map(|m| m.user_id.clone()).collect();
    let names = state.repo.display_names(&user_ids).await?;

    let standings = compute_standings(&competition, &memberships, &teams, &income, &names);

    let result = match result {
        Some(result) => Some(build_result_dto(&state, result).await?),
        None => None,
    };

    let viewer = ViewerContext {
        is_member: membership.is_some(),
        is_host: competition.host_id == viewer,
        is_competitor: membership
            .as_ref()
            .map(|m| m.is_competitor)
            .unwrap_or(false),
        team_id: membership.as_ref().and_then(|m| m.team_id),
    };

    let competition = summarize(&state, &competition, today).await?;

    Ok(Json(DashboardResponse {
        competition,
        standings,
        viewer,
        result,
    }))
}

pub(crate) async fn build_result_dto(
    state: &AppState,
    result: CompetitionResult,
) -> Result<ResultDto, AppError> {
    let winners = state.repo.get_winner_shares(&result.competition_id).await?;

    Ok(ResultDto {
        goal_reached: result.goal_reached,
        winner_kind: result.winner_kind,
        winner_user_id: result.winner_user_id.map(|u| u.0),
        winner_team_id: result.winner_team_id,
        winning_score: result.winning_score,
        finalized_at: result.finalized_at,
        winners: winners
            .into_iter()
            .map(|share| WinnerShareDto {
                user_id: share.user_id.0,
                amount: share.amount,
            })
            .collect(),
    })
}
