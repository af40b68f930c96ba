use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::{resolve_competition, AppState, Viewer};
use crate::domain::{Competition, TeamId, UserId};
use crate::engine::CompetitionPhase;
use crate::error::AppError;

fn check_host(competition: &Competition, viewer: &UserId) -> Result<(), AppError> {
    if competition.host_id != *viewer {
        return Err(AppError::Forbidden(
            "only the host can manage teams".to_string(),
        ));
    }
    Ok(())
}

fn check_teams_enabled(competition: &Competition) -> Result<(), AppError> {
    if !competition.allow_teams {
        return Err(AppError::Conflict(
            "teams are not enabled for this competition".to_string(),
        ));
    }
    Ok(())
}

fn round_robin(member_ids: &[UserId], team_count: usize) -> Vec<(UserId, usize)> {
    member_ids
        .iter()
        .enumerate()
        .map(|(i, user_id)| (user_id.clone(), i % team_count))
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamsRequest {
    pub team_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDto {
    pub id: TeamId,
    pub name: String,
    pub member_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamsResponse {
    pub teams: Vec<TeamDto>,
}

/// Create N default-named teams and spread current competitors across
/// them round-robin in join order.
pub async fn create_teams(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Viewer(viewer): Viewer,
    Json(req): Json<CreateTeamsRequest>,
) -> Result<Json<CreateTeamsResponse>, AppError> {
    let competition = resolve_competition(&state.repo, &key).await?;
    check_host(&competition, &viewer)?;
    check_teams_enabled(&competition)?;

    if req.team_count < 1 {
        return Err(AppError::InvalidInput(
            "teamCount must be at least 1".to_string(),
        ));
    }

    let today = Utc::now().date_naive();
    let has_result = state.repo.get_result(&competition.id).await?.is_some();
    let phase = CompetitionPhase::compute(
        competition.start_date,
        competition.end_date,
        today,
        has_result,
    );
    if phase != CompetitionPhase::Upcoming {
        return Err(AppError::Conflict(
            "teams must be created before the competition starts".to_string(),
        ));
    }

    if !state.repo.list_teams(&competition.id).await?.is_empty() {
        return Err(AppError::Conflict(
            "teams already exist for this competition".to_string(),
        ));
    }

    let memberships = state.repo.list_memberships(&competition.id).await?;
    let competitors: Vec<UserId> = memberships
        .iter()
        .filter(|m| m.is_competitor)
        .map(|m| m.user_id.clone())
        .collect();

    let team_count = req.team_count as usize;
    let names: Vec<String> = (1..=team_count).map(|i| format!("Team {}", i)).collect();
    let assignments = round_robin(&competitors, team_count);

    let teams = state
        .repo
        .create_teams(&competition.id, &names, &assignments, Utc::now())
        .await?;

    info!(
        competition_id = %competition.id,
        teams = teams.len(),
        members = assignments.len(),
        "teams created"
    );

    let mut counts = vec![0i64; teams.len()];
    for (_, idx) in &assignments {
        if let Some(n) = counts.get_mut(*idx) {
            *n += 1;
        }
    }

    Ok(Json(CreateTeamsResponse {
        teams: teams
            .into_iter()
            .zip(counts)
            .map(|(team, member_count)| TeamDto {
                id: team.id,
                name: team.name,
                member_count,
            })
            .collect(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameTeamRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameTeamResponse {
    pub id: TeamId,
    pub name: String,
}

pub async fn rename_team(
    State(state): State<AppState>,
    Path((key, team_id)): Path<(String, i64)>,
    Viewer(viewer): Viewer,
    Json(req): Json<RenameTeamRequest>,
) -> Result<Json<RenameTeamResponse>, AppError> {
    let competition = resolve_competition(&state.repo, &key).await?;
    check_host(&competition, &viewer)?;

    let team = state
        .repo
        .find_team(&competition.id, TeamId::new(team_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no team {} in this competition", team_id)))?;

    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidInput("name must not be empty".to_string()));
    }
    if state
        .repo
        .team_name_taken(&competition.id, name, team.id)
        .await?
    {
        return Err(AppError::Conflict(
            "a team with that name already exists".to_string(),
        ));
    }

    if !state.repo.rename_team(team.id, name).await? {
        return Err(AppError::NotFound(format!(
            "no team {} in this competition",
            team_id
        )));
    }

    Ok(Json(RenameTeamResponse {
        id: team.id,
        name: name.to_string(),
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignMemberResponse {
    pub user_id: String,
    pub team_id: TeamId,
}

pub async fn assign_member(
    State(state): State<AppState>,
    Path((key, team_id, user_id)): Path<(String, i64, String)>,
    Viewer(viewer): Viewer,
) -> Result<Json<AssignMemberResponse>, AppError> {
    let competition = resolve_competition(&state.repo, &key).await?;
    check_host(&competition, &viewer)?;
    check_teams_enabled(&competition)?;

    let team = state
        .repo
        .find_team(&competition.id, TeamId::new(team_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no team {} in this competition", team_id)))?;

    let user = UserId::new(user_id);
    let membership = state
        .repo
        .get_membership(&competition.id, &user)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} is not a member", user)))?;

    // A capacity cap only constrains moves into a different team.
    if let Some(size) = competition.team_size {
        if membership.team_id != Some(team.id) {
            let occupied = state.repo.count_team_members(team.id).await?;
            if occupied >= size {
                return Err(AppError::Conflict("team is full".to_string()));
            }
        }
    }

    state
        .repo
        .set_member_team(&competition.id, &user, Some(team.id))
        .await?;

    Ok(Json(AssignMemberResponse {
        user_id: user.0,
        team_id: team.id,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnassignMemberResponse {
    pub user_id: String,
    pub unassigned: bool,
}

pub async fn unassign_member(
    State(state): State<AppState>,
    Path((key, user_id)): Path<(String, String)>,
    Viewer(viewer): Viewer,
) -> Result<Json<UnassignMemberResponse>, AppError> {
    let competition = resolve_competition(&state.repo, &key).await?;
    check_host(&competition, &viewer)?;

    let user = UserId::new(user_id);
    state
        .repo
        .get_membership(&competition.id, &user)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} is not a member", user)))?;

    let unassigned = state
        .repo
        .set_member_team(&competition.id, &user, None)
        .await?;

    Ok(Json(UnassignMemberResponse {
        user_id: user.0,
        unassigned,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users(n: usize) -> Vec<UserId> {
        (0..n).map(|i| UserId::new(format!("driver-{}", i))).collect()
    }

    #[test]
    fn test_round_robin_spreads_members_evenly() {
        let members = users(5);
        let assignments = round_robin(&members, 2);

        let team_0: Vec<_> = assignments.iter().filter(|(_, t)| *t == 0).collect();
        let team_1: Vec<_> = assignments.iter().filter(|(_, t)| *t == 1).collect();
        assert_eq!(team_0.len(), 3);
        assert_eq!(team_1.len(), 2);

        // Join order alternates between teams.
        assert_eq!(assignments[0], (UserId::new("driver-0".into()), 0));
        assert_eq!(assignments[1], (UserId::new("driver-1".into()), 1));
        assert_eq!(assignments[2], (UserId::new("driver-2".into()), 0));
    }

    #[test]
    fn test_round_robin_leaves_extra_teams_empty() {
        let members = users(3);
        let assignments = round_robin(&members, 5);

        let used: Vec<usize> = assignments.iter().map(|(_, t)| *t).collect();
        assert_eq!(used, vec![0, 1, 2]);
    }

    #[test]
    fn test_round_robin_with_no_members() {
        assert!(round_robin(&[], 3).is_empty());
    }
}
