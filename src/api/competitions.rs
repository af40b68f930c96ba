use axum::extract::{Path, State};
use axum::Json;
use chrono::{NaiveDate, Utc};
use futures::future::try_join_all;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{resolve_competition, AppState, Viewer};
use crate::db::repo::is_unique_violation;
use crate::domain::{
    hash_join_password, Competition, CompetitionId, GoalKind, MemberRole, Money,
};
use crate::engine::CompetitionPhase;
use crate::error::AppError;

/// Code alphabet without the lookalikes 0/O/1/I.
const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const CODE_ALLOCATION_ATTEMPTS: usize = 5;

fn generate_join_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..JOIN_CODE_ALPHABET.len());
            JOIN_CODE_ALPHABET[idx] as char
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompetitionRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub goal_value: Money,
    pub prize_value: Money,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub max_members: Option<i64>,
    #[serde(default)]
    pub allow_teams: bool,
    pub team_size: Option<i64>,
    pub password: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default = "default_true")]
    pub host_participates: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCompetitionResponse {
    pub id: CompetitionId,
    pub code: String,
}

pub async fn create_competition(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Json(req): Json<CreateCompetitionRequest>,
) -> Result<Json<CreateCompetitionResponse>, AppError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::InvalidInput("name must not be empty".to_string()));
    }
    if !req.goal_value.is_positive() {
        return Err(AppError::InvalidInput(
            "goalValue must be greater than zero".to_string(),
        ));
    }
    if !req.prize_value.is_positive() {
        return Err(AppError::InvalidInput(
            "prizeValue must be greater than zero".to_string(),
        ));
    }
    if req.end_date < req.start_date {
        return Err(AppError::InvalidInput(
            "endDate must not precede startDate".to_string(),
        ));
    }
    if let Some(max) = req.max_members {
        if max < 1 {
            return Err(AppError::InvalidInput(
                "maxMembers must be at least 1".to_string(),
            ));
        }
    }
    if let Some(size) = req.team_size {
        if !req.allow_teams {
            return Err(AppError::InvalidInput(
                "teamSize requires allowTeams".to_string(),
            ));
        }
        if size < 1 {
            return Err(AppError::InvalidInput(
                "teamSize must be at least 1".to_string(),
            ));
        }
    }

    let password_hash = req
        .password
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(hash_join_password);

    // Codes are random; on the rare collision, roll a fresh one.
    let mut last_code = String::new();
    for _ in 0..CODE_ALLOCATION_ATTEMPTS {
        let code = generate_join_code(state.config.join_code_length);
        let competition = Competition {
            id: CompetitionId::generate(),
            code: code.clone(),
            name: name.clone(),
            description: req.description.trim().to_string(),
            goal_kind: GoalKind::Income,
            goal_value: req.goal_value,
            prize_value: req.prize_value,
            start_date: req.start_date,
            end_date: req.end_date,
            max_members: req.max_members,
            allow_teams: req.allow_teams,
            team_size: req.team_size,
            password_hash: password_hash.clone(),
            host_id: viewer.clone(),
            is_public: req.is_public,
            created_at: Utc::now(),
        };

        match state
            .repo
            .create_competition(&competition, req.host_participates)
            .await
        {
            Ok(_) => {
                info!(competition_id = %competition.id, code = %code, "competition created");
                return Ok(Json(CreateCompetitionResponse {
                    id: competition.id,
                    code,
                }));
            }
            Err(e) if is_unique_violation(&e, "competitions.code") => {
                last_code = code;
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AppError::Internal(format!(
        "could not allocate a unique join code (last tried {})",
        last_code
    )))
}

/// Summary row shared by the listing, dashboard, and leaderboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionSummary {
    pub id: CompetitionId,
    pub code: String,
    pub name: String,
    pub description: String,
    pub phase: String,
    pub goal_value: Money,
    pub prize_value: Money,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub max_members: Option<i64>,
    pub allow_teams: bool,
    pub team_size: Option<i64>,
    pub has_password: bool,
    pub host_id: String,
    pub is_public: bool,
    pub member_count: i64,
}

pub(crate) async fn summarize(
    state: &AppState,
    competition: &Competition,
    today: NaiveDate,
) -> Result<CompetitionSummary, AppError> {
    let has_result = state.repo.get_result(&competition.id).await?.is_some();
    let phase = CompetitionPhase::compute(
        competition.start_date,
        competition.end_date,
        today,
        has_result,
    );
    let member_count = state.repo.count_members(&competition.id).await?;

    Ok(CompetitionSummary {
        id: competition.id,
        code: competition.code.clone(),
        name: competition.name.clone(),
        description: competition.description.clone(),
        phase: phase.as_str().to_string(),
        goal_value: competition.goal_value,
        prize_value: competition.prize_value,
        start_date: competition.start_date,
        end_date: competition.end_date,
        max_members: competition.max_members,
        allow_teams: competition.allow_teams,
        team_size: competition.team_size,
        has_password: competition.has_password(),
        host_id: competition.host_id.as_str().to_string(),
        is_public: competition.is_public,
        member_count,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCompetitionsResponse {
    pub mine: Vec<CompetitionSummary>,
    pub public: Vec<CompetitionSummary>,
}

pub async fn list_competitions(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
) -> Result<Json<ListCompetitionsResponse>, AppError> {
    let today = Utc::now().date_naive();

    let mine = state.repo.list_competitions_for_user(&viewer).await?;
    let mine_summaries =
        try_join_all(mine.iter().map(|c| summarize(&state, c, today))).await?;

    // Public competitions the viewer already belongs to stay in `mine`.
    let public: Vec<Competition> = state
        .repo
        .list_public_competitions()
        .await?
        .into_iter()
        .filter(|c| !mine.iter().any(|m| m.id == c.id))
        .collect();
    let public_summaries =
        try_join_all(public.iter().map(|c| summarize(&state, c, today))).await?;

    Ok(Json(ListCompetitionsResponse {
        mine: mine_summaries,
        public: public_summaries,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinCompetitionRequest {
    pub code: String,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinCompetitionResponse {
    pub competition_id: CompetitionId,
    pub code: String,
    pub name: String,
    pub already_member: bool,
}

pub async fn join_competition(
    State(state): State<AppState>,
    Viewer(viewer): Viewer,
    Json(req): Json<JoinCompetitionRequest>,
) -> Result<Json<JoinCompetitionResponse>, AppError> {
    let competition = state
        .repo
        .find_competition_by_code(&req.code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no competition with code {}", req.code)))?;

    // Joining twice is a soft success, not an error.
    if state
        .repo
        .get_membership(&competition.id, &viewer)
        .await?
        .is_some()
    {
        return Ok(Json(JoinCompetitionResponse {
            competition_id: competition.id,
            code: competition.code,
            name: competition.name,
            already_member: true,
        }));
    }

    let today = Utc::now().date_naive();
    let has_result = state.repo.get_result(&competition.id).await?.is_some();
    let phase = CompetitionPhase::compute(
        competition.start_date,
        competition.end_date,
        today,
        has_result,
    );
    if phase.is_finished() {
        return Err(AppError::Conflict("competition has ended".to_string()));
    }

    if !competition.password_matches(req.password.as_deref()) {
        return Err(AppError::InvalidCredentials(
            "wrong competition password".to_string(),
        ));
    }

    if let Some(max) = competition.max_members {
        let count = state.repo.count_members(&competition.id).await?;
        if count >= max {
            return Err(AppError::Conflict("competition is full".to_string()));
        }
    }

    let inserted = state
        .repo
        .insert_membership(&competition.id, &viewer, MemberRole::Member, true, Utc::now())
        .await?;

    if inserted.is_some() {
        info!(competition_id = %competition.id, user_id = %viewer, "member joined");
    }

    Ok(Json(JoinCompetitionResponse {
        competition_id: competition.id,
        code: competition.code,
        name: competition.name,
        already_member: inserted.is_none(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaveCompetitionResponse {
    pub left: bool,
}

pub async fn leave_competition(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Viewer(viewer): Viewer,
) -> Result<Json<LeaveCompetitionResponse>, AppError> {
    let competition = resolve_competition(&state.repo, &key).await?;

    let membership = state
        .repo
        .get_membership(&competition.id, &viewer)
        .await?
        .ok_or_else(|| AppError::NotFound("you are not a member".to_string()))?;

    if membership.is_host() {
        return Err(AppError::Conflict(
            "the host cannot leave; delete the competition instead".to_string(),
        ));
    }

    let left = state
        .repo
        .delete_membership(&competition.id, &viewer)
        .await?;

    Ok(Json(LeaveCompetitionResponse { left }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCompetitionResponse {
    pub deleted: bool,
}

pub async fn delete_competition(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Viewer(viewer): Viewer,
) -> Result<Json<DeleteCompetitionResponse>, AppError> {
    let competition = resolve_competition(&state.repo, &key).await?;

    if competition.host_id != viewer {
        return Err(AppError::Forbidden(
            "only the host can delete a competition".to_string(),
        ));
    }

    let deleted = state.repo.soft_delete_competition(&competition.id).await?;
    if deleted {
        info!(competition_id = %competition.id, "competition deleted");
    }

    Ok(Json(DeleteCompetitionResponse { deleted }))
}
