use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::api::{AppState, Viewer};
use crate::domain::{CompetitionId, UserId, WinnerKind};
use crate::engine::{
    merge_ranking, split_even, GlobalRanking, RankingEntry, RankingPeriod, RankingTotals,
    WinCredit,
};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct RankingQuery {
    pub period: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingResponse {
    pub period: String,
    pub entries: Vec<RankingEntry>,
    pub totals: RankingTotals,
}

/// Cross-competition ranking over finalized results, windowed by each
/// competition's end date.
pub async fn get_ranking(
    State(state): State<AppState>,
    Query(query): Query<RankingQuery>,
    Viewer(_viewer): Viewer,
) -> Result<Json<RankingResponse>, AppError> {
    let period = match query.period.as_deref() {
        None => RankingPeriod::AllTime,
        Some(raw) => RankingPeriod::from_str(raw)
            .map_err(|_| AppError::InvalidInput(format!("unknown period {}", raw)))?,
    };

    let today = Utc::now().date_naive();
    let window = period.window(today);

    let mut credits = Vec::new();
    let mut finalized_in_window = 0i64;
    for outcome in state.repo.finalized_outcomes().await? {
        if !window.contains(outcome.end_date) {
            continue;
        }
        finalized_in_window += 1;

        match outcome.result.winner_kind {
            WinnerKind::Individual => {
                if let Some(user_id) = outcome.result.winner_user_id {
                    credits.push(WinCredit {
                        user_id,
                        amount: outcome.prize_value,
                    });
                }
            }
            WinnerKind::Team => {
                if let Some(team_id) = outcome.result.winner_team_id {
                    // Roster is resolved now, not at win time, so the
                    // split follows the team's current members.
                    let members: Vec<UserId> = state
                        .repo
                        .team_competitor_members(team_id)
                        .await?
                        .into_iter()
                        .map(|m| m.user_id)
                        .collect();
                    for share in split_even(outcome.prize_value, &members) {
                        credits.push(WinCredit {
                            user_id: share.user_id,
                            amount: share.amount,
                        });
                    }
                }
            }
            WinnerKind::None => {}
        }
    }

    let participations: Vec<(UserId, CompetitionId)> = state
        .repo
        .competitor_participations()
        .await?
        .into_iter()
        .filter(|(_, _, end_date)| window.contains(*end_date))
        .map(|(user_id, competition_id, _)| (user_id, competition_id))
        .collect();

    let mut user_ids: Vec<UserId> = credits.iter().map(|c| c.user_id.clone()).collect();
    user_ids.extend(participations.iter().map(|(u, _)| u.clone()));
    user_ids.sort();
    user_ids.dedup();
    let names = state.repo.display_names(&user_ids).await?;

    let GlobalRanking { entries, totals } =
        merge_ranking(&credits, &participations, finalized_in_window, &names);

    Ok(Json(RankingResponse {
        period: period.as_str().to_string(),
        entries,
        totals,
    }))
}
