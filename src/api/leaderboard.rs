use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::api::{authorize_view, resolve_competition, AppState, Viewer};
use crate::domain::{CompetitionId, MemberRole, Money, TeamId, UserId};
use crate::engine::{compute_standings, CompetitionPhase, MemberStanding, TeamStanding};
use crate::error::AppError;

/// One roster row. Unlike `members`, this covers every membership,
/// observers and opted-out hosts included.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    pub user_id: UserId,
    pub display_name: String,
    pub role: MemberRole,
    pub is_competitor: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub competition_id: CompetitionId,
    pub phase: String,
    pub competitor_count: i64,
    pub dynamic_goal: Money,
    pub total: Money,
    pub progress_pct: Money,
    pub members: Vec<MemberStanding>,
    pub teams: Vec<TeamStanding>,
    pub participants: Vec<ParticipantDto>,
}

/// Ranked standings plus the full roster, without the dashboard's
/// breakdowns.
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Viewer(viewer): Viewer,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let competition = resolve_competition(&state.repo, &key).await?;
    authorize_view(&state.repo, &competition, &viewer).await?;

    let today = Utc::now().date_naive();
    let result = state.finalizer.ensure_finalized(&competition, today).await?;
    let phase = CompetitionPhase::compute(
        competition.start_date,
        competition.end_date,
        today,
        result.is_some(),
    );

    let memberships = state.repo.list_memberships(&competition.id).await?;
    let teams = state.repo.list_teams(&competition.id).await?;
    let income = state
        .repo
        .income_for_competitors(&competition.id, competition.start_date, competition.end_date)
        .await?;

    let user_ids: Vec<UserId> = memberships.iter().map(|m| m.user_id.clone()).collect();
    let names = state.repo.display_names(&user_ids).await?;

    let standings = compute_standings(&competition, &memberships, &teams, &income, &names);

    // memberships arrive in join order, which the roster keeps.
    let participants: Vec<ParticipantDto> = memberships
        .iter()
        .map(|m| ParticipantDto {
            user_id: m.user_id.clone(),
            display_name: names
                .get(&m.user_id)
                .cloned()
                .unwrap_or_else(|| m.user_id.as_str().to_string()),
            role: m.role,
            is_competitor: m.is_competitor,
            team_id: m.team_id,
        })
        .collect();

    Ok(Json(LeaderboardResponse {
        competition_id: competition.id,
        phase: phase.as_str().to_string(),
        competitor_count: standings.competitor_count,
        dynamic_goal: standings.dynamic_goal,
        total: standings.total,
        progress_pct: standings.progress_pct,
        members: standings.members,
        teams: standings.teams,
        participants,
    }))
}
