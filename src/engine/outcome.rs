//! Winner determination for a finished competition.

use crate::domain::{Competition, Membership, Money, PayoutShare, UserId, WinnerKind};
use crate::engine::aggregation::CompetitionStandings;
use crate::engine::payout::split_even;

/// What the lifecycle should record when a competition closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeDecision {
    pub goal_reached: bool,
    pub winner_kind: WinnerKind,
    pub winner_user_id: Option<UserId>,
    pub winner_team_id: Option<crate::domain::TeamId>,
    pub winning_score: Money,
    pub payouts: Vec<PayoutShare>,
}

impl OutcomeDecision {
    fn no_winner() -> Self {
        OutcomeDecision {
            goal_reached: false,
            winner_kind: WinnerKind::None,
            winner_user_id: None,
            winner_team_id: None,
            winning_score: Money::zero(),
            payouts: Vec::new(),
        }
    }
}

/// Decide the outcome from the end-of-window standings.
///
/// Team competitions with at least one team are judged on team totals
/// against the scaled team goal; everything else is judged on
/// individual totals against the base goal. The standings are already
/// ranked, so the first eligible row wins and the aggregation
/// tie-break (earlier joiner, earlier team) carries over. Falling
/// short on every row closes the competition with no winner.
pub fn decide_outcome(
    competition: &Competition,
    standings: &CompetitionStandings,
    memberships: &[Membership],
) -> OutcomeDecision {
    if competition.allow_teams && !standings.teams.is_empty() {
        decide_team_outcome(competition, standings, memberships)
    } else {
        decide_individual_outcome(competition, standings)
    }
}

fn decide_individual_outcome(
    competition: &Competition,
    standings: &CompetitionStandings,
) -> OutcomeDecision {
    // Members arrive ranked by total, so only the top row can win.
    let winner = standings
        .members
        .first()
        .filter(|m| m.total >= competition.goal_value);
    match winner {
        Some(member) => OutcomeDecision {
            goal_reached: true,
            winner_kind: WinnerKind::Individual,
            winner_user_id: Some(member.user_id.clone()),
            winner_team_id: None,
            winning_score: member.total,
            payouts: split_even(competition.prize_value, &[member.user_id.clone()]),
        },
        None => OutcomeDecision::no_winner(),
    }
}

fn decide_team_outcome(
    competition: &Competition,
    standings: &CompetitionStandings,
    memberships: &[Membership],
) -> OutcomeDecision {
    let winner = standings
        .teams
        .iter()
        .find(|t| t.member_count > 0 && t.total >= t.team_goal);
    match winner {
        Some(team) => {
            // Prize recipients are the winning team's competitor
            // members, in join order.
            let mut recipients: Vec<&Membership> = memberships
                .iter()
                .filter(|m| m.is_competitor && m.team_id == Some(team.team_id))
                .collect();
            recipients.sort_by_key(|m| m.id);
            let users: Vec<UserId> = recipients.iter().map(|m| m.user_id.clone()).collect();
            OutcomeDecision {
                goal_reached: true,
                winner_kind: WinnerKind::Team,
                winner_user_id: None,
                winner_team_id: Some(team.team_id),
                winning_score: team.total,
                payouts: split_even(competition.prize_value, &users),
            }
        }
        None => OutcomeDecision::no_winner(),
    }
}
