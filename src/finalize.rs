//! Lazy one-time finalization of finished competitions.
//!
//! There is no scheduled sweep: the first read that touches a finished
//! competition computes its result. Concurrent readers race on the
//! result row's primary key, exactly one inserts, and every loser
//! adopts the committed row, so the outcome is decided once no matter
//! how many requests arrive together.

use crate::db::Repository;
use crate::domain::{
    Competition, CompetitionResult, NotificationDraft, NotificationKind, PayoutShare, WinnerKind,
};
use crate::engine::{compute_standings, decide_outcome, CompetitionPhase};
use crate::notify::NotificationSink;
use chrono::{NaiveDate, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum FinalizeError {
    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

#[derive(Clone)]
pub struct Finalizer {
    repo: Arc<Repository>,
    sink: Arc<dyn NotificationSink>,
}

impl Finalizer {
    pub fn new(repo: Arc<Repository>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { repo, sink }
    }

    /// Ensure a finished competition has its result, computing it on
    /// first need. Returns None while the competition is upcoming or
    /// active; idempotent and race-safe once it is finished.
    pub async fn ensure_finalized(
        &self,
        competition: &Competition,
        today: NaiveDate,
    ) -> Result<Option<CompetitionResult>, FinalizeError> {
        if let Some(existing) = self.repo.get_result(&competition.id).await? {
            return Ok(Some(existing));
        }

        let phase = CompetitionPhase::compute(
            competition.start_date,
            competition.end_date,
            today,
            false,
        );
        if !phase.is_finished() {
            return Ok(None);
        }

        // Standings over the full window, scored as of the end date.
        let memberships = self.repo.list_memberships(&competition.id).await?;
        let teams = self.repo.list_teams(&competition.id).await?;
        let income = self
            .repo
            .income_for_competitors(&competition.id, competition.start_date, competition.end_date)
            .await?;
        let standings =
            compute_standings(competition, &memberships, &teams, &income, &HashMap::new());
        let decision = decide_outcome(competition, &standings, &memberships);

        let result = CompetitionResult {
            competition_id: competition.id,
            goal_reached: decision.goal_reached,
            winner_kind: decision.winner_kind,
            winner_user_id: decision.winner_user_id.clone(),
            winner_team_id: decision.winner_team_id,
            winning_score: decision.winning_score,
            finalized_at: Utc::now(),
        };

        let won_race = self.repo.insert_result(&result, &decision.payouts).await?;
        if !won_race {
            // Another request finalized first; its row is the truth.
            return Ok(self.repo.get_result(&competition.id).await?);
        }

        info!(
            competition_id = %competition.id,
            winner_kind = result.winner_kind.as_str(),
            goal_reached = result.goal_reached,
            "competition finalized"
        );

        self.dispatch_notifications(competition, &result, &decision.payouts)
            .await;

        Ok(Some(result))
    }

    /// Send the finalization notifications. Best effort: the result row
    /// is already committed, so delivery failures are logged and never
    /// unwind the finalization.
    async fn dispatch_notifications(
        &self,
        competition: &Competition,
        result: &CompetitionResult,
        payouts: &[PayoutShare],
    ) {
        let mut drafts: Vec<NotificationDraft> = Vec::new();

        if result.winner_kind == WinnerKind::None {
            drafts.push(NotificationDraft {
                kind: NotificationKind::NoWinner,
                competition_id: competition.id,
                recipient_id: competition.host_id.clone(),
                payload: json!({
                    "competitionId": competition.id.to_string(),
                    "competitionName": competition.name,
                }),
            });
        } else {
            for share in payouts {
                drafts.push(NotificationDraft {
                    kind: NotificationKind::Winner,
                    competition_id: competition.id,
                    recipient_id: share.user_id.clone(),
                    payload: json!({
                        "competitionId": competition.id.to_string(),
                        "competitionName": competition.name,
                        "amount": share.amount,
                        "winningScore": result.winning_score,
                    }),
                });
            }
            drafts.push(self.build_payout_draft(competition, payouts).await);
        }

        for draft in &drafts {
            if let Err(e) = self.sink.deliver(draft).await {
                warn!(
                    competition_id = %competition.id,
                    recipient = %draft.recipient_id,
                    error = %e,
                    "notification delivery failed"
                );
            }
        }
    }

    /// The host's settlement instructions: every winner's share plus
    /// their payout key, when one is on file.
    async fn build_payout_draft(
        &self,
        competition: &Competition,
        payouts: &[PayoutShare],
    ) -> NotificationDraft {
        let mut winners = Vec::with_capacity(payouts.len());
        for share in payouts {
            let payout_key = match self.repo.get_profile(&share.user_id).await {
                Ok(profile) => profile.and_then(|p| p.payout_key),
                Err(e) => {
                    warn!(user_id = %share.user_id, error = %e, "failed to load payout key");
                    None
                }
            };
            winners.push(json!({
                "userId": share.user_id.as_str(),
                "amount": share.amount,
                "payoutKey": payout_key,
            }));
        }

        NotificationDraft {
            kind: NotificationKind::Payout,
            competition_id: competition.id,
            recipient_id: competition.host_id.clone(),
            payload: json!({
                "competitionId": competition.id.to_string(),
                "competitionName": competition.name,
                "winners": winners,
            }),
        }
    }
}
