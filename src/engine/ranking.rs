//! Cross-competition ranking built from finalized outcomes.

use crate::domain::{CompetitionId, Money, UserId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One user's credit from one finalized competition win.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinCredit {
    pub user_id: UserId,
    pub amount: Money,
}

/// One row of the global ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank: i64,
    pub user_id: UserId,
    pub display_name: String,
    pub wins: i64,
    pub total_prizes: Money,
    pub participations: i64,
}

/// Aggregate figures across the whole ranking window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingTotals {
    pub total_wins: i64,
    pub total_prizes: Money,
    pub total_participations: i64,
    pub distinct_competitors: i64,
    pub finalized_competitions: i64,
    pub users_with_wins: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRanking {
    pub entries: Vec<RankingEntry>,
    pub totals: RankingTotals,
}

#[derive(Default)]
struct UserTally {
    wins: i64,
    prizes: Money,
    participations: i64,
}

/// Merge per-competition credits and participations into one ranking.
///
/// `credits` carries one entry per (winner, finalized competition);
/// team wins contribute one credit per member, valued at that member's
/// prize share. `participations` carries one entry per competitor
/// membership the caller's window admits, finalized or not. Ordering
/// is wins, then prizes, then user id, all descending except the id,
/// so the output is deterministic for equal records.
pub fn merge_ranking(
    credits: &[WinCredit],
    participations: &[(UserId, CompetitionId)],
    finalized_competitions: i64,
    names: &HashMap<UserId, String>,
) -> GlobalRanking {
    // BTreeMap keeps accumulation ordered by user id, which the later
    // stable sort preserves for full ties.
    let mut tallies: BTreeMap<&UserId, UserTally> = BTreeMap::new();

    for credit in credits {
        let tally = tallies.entry(&credit.user_id).or_default();
        tally.wins += 1;
        tally.prizes = tally.prizes + credit.amount;
    }

    let mut seen: BTreeSet<(&UserId, &CompetitionId)> = BTreeSet::new();
    for (user_id, competition_id) in participations {
        if seen.insert((user_id, competition_id)) {
            tallies.entry(user_id).or_default().participations += 1;
        }
    }

    let mut entries: Vec<RankingEntry> = tallies
        .into_iter()
        .map(|(user_id, tally)| RankingEntry {
            rank: 0,
            user_id: user_id.clone(),
            display_name: names
                .get(user_id)
                .cloned()
                .unwrap_or_else(|| user_id.as_str().to_string()),
            wins: tally.wins,
            total_prizes: tally.prizes,
            participations: tally.participations,
        })
        .collect();
    entries.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then_with(|| b.total_prizes.cmp(&a.total_prizes))
    });
    for (idx, entry) in entries.iter_mut().enumerate() {
        entry.rank = (idx + 1) as i64;
    }

    let totals = RankingTotals {
        total_wins: entries.iter().map(|e| e.wins).sum(),
        total_prizes: entries.iter().map(|e| e.total_prizes).sum(),
        total_participations: entries.iter().map(|e| e.participations).sum(),
        distinct_competitors: entries.len() as i64,
        finalized_competitions,
        users_with_wins: entries.iter().filter(|e| e.wins > 0).count() as i64,
    };

    GlobalRanking { entries, totals }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string())
    }

    fn money(s: &str) -> Money {
        Money::from_str_canonical(s).unwrap()
    }

    fn credit(id: &str, amount: &str) -> WinCredit {
        WinCredit {
            user_id: user(id),
            amount: money(amount),
        }
    }

    #[test]
    fn test_wins_rank_above_prizes() {
        let comp_a = CompetitionId::generate();
        let comp_b = CompetitionId::generate();
        let comp_c = CompetitionId::generate();
        let credits = vec![
            credit("rich", "1000"),
            credit("steady", "100"),
            credit("steady", "100"),
        ];
        let participations = vec![
            (user("rich"), comp_a),
            (user("steady"), comp_b),
            (user("steady"), comp_c),
        ];

        let ranking = merge_ranking(&credits, &participations, 3, &HashMap::new());

        // Two wins beat one, regardless of prize money.
        assert_eq!(ranking.entries[0].user_id, user("steady"));
        assert_eq!(ranking.entries[0].wins, 2);
        assert_eq!(ranking.entries[0].rank, 1);
        assert_eq!(ranking.entries[1].user_id, user("rich"));
        assert_eq!(ranking.entries[1].total_prizes, money("1000"));
    }

    #[test]
    fn test_prizes_break_win_ties() {
        let credits = vec![credit("a", "250"), credit("b", "500")];
        let ranking = merge_ranking(&credits, &[], 2, &HashMap::new());
        assert_eq!(ranking.entries[0].user_id, user("b"));
        assert_eq!(ranking.entries[1].user_id, user("a"));
    }

    #[test]
    fn test_full_ties_order_by_user_id() {
        let credits = vec![credit("zed", "100"), credit("amy", "100")];
        let ranking = merge_ranking(&credits, &[], 2, &HashMap::new());
        assert_eq!(ranking.entries[0].user_id, user("amy"));
        assert_eq!(ranking.entries[1].user_id, user("zed"));
    }

    #[test]
    fn test_participants_without_wins_still_listed() {
        let comp = CompetitionId::generate();
        let credits = vec![credit("winner", "500")];
        let participations = vec![(user("winner"), comp), (user("loser"), comp)];

        let ranking = merge_ranking(&credits, &participations, 1, &HashMap::new());

        assert_eq!(ranking.entries.len(), 2);
        let loser = &ranking.entries[1];
        assert_eq!(loser.user_id, user("loser"));
        assert_eq!(loser.wins, 0);
        assert!(loser.total_prizes.is_zero());
        assert_eq!(loser.participations, 1);
    }

    #[test]
    fn test_duplicate_participation_rows_count_once() {
        let comp = CompetitionId::generate();
        let participations = vec![(user("a"), comp), (user("a"), comp)];
        let ranking = merge_ranking(&[], &participations, 1, &HashMap::new());
        assert_eq!(ranking.entries[0].participations, 1);
    }

    #[test]
    fn test_totals_accumulate_across_entries() {
        let comp_a = CompetitionId::generate();
        let comp_b = CompetitionId::generate();
        let credits = vec![
            credit("a", "250"),
            credit("b", "250"),
            credit("a", "500"),
        ];
        let participations = vec![
            (user("a"), comp_a),
            (user("b"), comp_a),
            (user("c"), comp_a),
            (user("a"), comp_b),
        ];

        let ranking = merge_ranking(&credits, &participations, 2, &HashMap::new());

        assert_eq!(ranking.totals.total_wins, 3);
        assert_eq!(ranking.totals.total_prizes, money("1000"));
        assert_eq!(ranking.totals.total_participations, 4);
        assert_eq!(ranking.totals.distinct_competitors, 3);
        assert_eq!(ranking.totals.finalized_competitions, 2);
        assert_eq!(ranking.totals.users_with_wins, 2);
    }

    #[test]
    fn test_empty_inputs_yield_empty_ranking() {
        let ranking = merge_ranking(&[], &[], 0, &HashMap::new());
        assert!(ranking.entries.is_empty());
        assert_eq!(ranking.totals.distinct_competitors, 0);
    }

    #[test]
    fn test_display_names_resolve_from_profiles() {
        let mut names = HashMap::new();
        names.insert(user("a"), "Ana".to_string());
        let ranking = merge_ranking(&[credit("a", "10")], &[], 1, &names);
        assert_eq!(ranking.entries[0].display_name, "Ana");
    }
}
