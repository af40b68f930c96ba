//! Per-competition score aggregation.
//!
//! Everything here is recomputed from source rows on every call: member
//! totals, team rollups, the dynamic group goal, platform and daily
//! breakdowns, and the ranked standings. No derived value is ever read
//! back from a cache, so membership or income changes can never leave a
//! stale total behind.

use crate::domain::{
    Competition, IncomeRecord, Membership, Money, QualifyingPlatform, TeamId, UserId,
};
use crate::engine::period::{sum_in_window, DateWindow};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One competitor's row in the ranked standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStanding {
    pub rank: i64,
    pub user_id: UserId,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    pub total: Money,
}

/// One team's row in the ranked team standings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStanding {
    pub rank: i64,
    pub team_id: TeamId,
    pub name: String,
    /// Competitor members currently assigned to the team.
    pub member_count: i64,
    /// Individual goal scaled by the current member count.
    pub team_goal: Money,
    pub total: Money,
}

/// One platform's share of the qualifying total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSlice {
    pub platform: String,
    pub total: Money,
    /// Share of the filtered total, not of any unfiltered number.
    pub percentage: Money,
}

/// Qualifying income on one platform within one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformAmount {
    pub platform: String,
    pub total: Money,
}

/// Qualifying income for one day, split by platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: Money,
    pub platforms: Vec<PlatformAmount>,
}

/// The full recomputed aggregation snapshot for one competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionStandings {
    pub competitor_count: i64,
    /// Individual goal multiplied by the active competitor count.
    pub dynamic_goal: Money,
    pub total: Money,
    /// Progress toward the dynamic goal, uncapped (values above 100
    /// mean the goal was exceeded).
    pub progress_pct: Money,
    pub remaining: Money,
    pub members: Vec<MemberStanding>,
    pub teams: Vec<TeamStanding>,
    pub platforms: Vec<PlatformSlice>,
    pub daily: Vec<DailyTotal>,
}

/// Compute the aggregation snapshot from source rows.
///
/// `income` may contain rows for any user, platform, or date; only
/// qualifying platforms, competitor members, and dates inside the
/// competition window survive the filter. `names` resolves display
/// names, falling back to the raw user id.
pub fn compute_standings(
    competition: &Competition,
    memberships: &[Membership],
    teams: &[crate::domain::Team],
    income: &[IncomeRecord],
    names: &HashMap<UserId, String>,
) -> CompetitionStandings {
    let window = DateWindow::bounded(competition.start_date, competition.end_date);

    // Competitors in join order; join order is the ranking tie-break.
    let mut competitors: Vec<&Membership> =
        memberships.iter().filter(|m| m.is_competitor).collect();
    competitors.sort_by_key(|m| m.id);

    let competitor_ids: HashMap<&UserId, ()> =
        competitors.iter().map(|m| (&m.user_id, ())).collect();

    // Platform allow-list and competitor filter first; each
    // aggregation below applies the competition window itself.
    let qualifying: Vec<(&IncomeRecord, QualifyingPlatform)> = income
        .iter()
        .filter(|r| competitor_ids.contains_key(&r.user_id))
        .filter_map(|r| QualifyingPlatform::from_label(&r.platform).map(|p| (r, p)))
        .collect();

    let mut member_entries: HashMap<&UserId, Vec<(NaiveDate, Money)>> = HashMap::new();
    for (record, _) in &qualifying {
        member_entries
            .entry(&record.user_id)
            .or_default()
            .push((record.date, record.amount));
    }
    let member_totals: HashMap<&UserId, Money> = member_entries
        .into_iter()
        .map(|(user_id, entries)| (user_id, sum_in_window(entries, &window)))
        .collect();

    let total: Money = member_totals.values().copied().sum();

    let windowed: Vec<(&IncomeRecord, QualifyingPlatform)> = qualifying
        .iter()
        .copied()
        .filter(|(record, _)| window.contains(record.date))
        .collect();

    // Ranked members: stable sort keeps join order for equal totals.
    let mut members: Vec<MemberStanding> = competitors
        .iter()
        .map(|m| MemberStanding {
            rank: 0,
            user_id: m.user_id.clone(),
            display_name: display_name(names, &m.user_id),
            team_id: m.team_id,
            total: member_totals
                .get(&m.user_id)
                .copied()
                .unwrap_or_else(Money::zero),
        })
        .collect();
    members.sort_by(|a, b| b.total.cmp(&a.total));
    for (idx, member) in members.iter_mut().enumerate() {
        member.rank = (idx + 1) as i64;
    }

    // Team rollups, live from membership; creation order breaks ties.
    let mut team_rows: Vec<TeamStanding> = Vec::new();
    if competition.allow_teams {
        let mut sorted_teams: Vec<&crate::domain::Team> = teams.iter().collect();
        sorted_teams.sort_by_key(|t| t.id);
        for team in sorted_teams {
            let team_members: Vec<&&Membership> = competitors
                .iter()
                .filter(|m| m.team_id == Some(team.id))
                .collect();
            let team_total: Money = team_members
                .iter()
                .map(|m| {
                    member_totals
                        .get(&m.user_id)
                        .copied()
                        .unwrap_or_else(Money::zero)
                })
                .sum();
            let member_count = team_members.len() as i64;
            team_rows.push(TeamStanding {
                rank: 0,
                team_id: team.id,
                name: team.name.clone(),
                member_count,
                team_goal: competition.goal_value * Money::from(member_count),
                total: team_total,
            });
        }
        team_rows.sort_by(|a, b| b.total.cmp(&a.total));
        for (idx, team) in team_rows.iter_mut().enumerate() {
            team.rank = (idx + 1) as i64;
        }
    }

    let competitor_count = competitors.len() as i64;
    let dynamic_goal = competition.goal_value * Money::from(competitor_count);
    let progress_pct = if dynamic_goal.is_zero() {
        Money::zero()
    } else {
        ((total / dynamic_goal) * Money::hundred()).round_2dp()
    };
    let remaining = if dynamic_goal > total {
        dynamic_goal - total
    } else {
        Money::zero()
    };

    CompetitionStandings {
        competitor_count,
        dynamic_goal,
        total,
        progress_pct,
        remaining,
        members,
        teams: team_rows,
        platforms: platform_breakdown(&windowed, total),
        daily: daily_summary(&windowed),
    }
}

fn display_name(names: &HashMap<UserId, String>, user_id: &UserId) -> String {
    names
        .get(user_id)
        .cloned()
        .unwrap_or_else(|| user_id.as_str().to_string())
}

/// Per-platform totals with percentages recomputed from the filtered
/// total, so the slices always sum to 100 (within rounding).
fn platform_breakdown(
    qualifying: &[(&IncomeRecord, QualifyingPlatform)],
    total: Money,
) -> Vec<PlatformSlice> {
    let mut by_platform: BTreeMap<&'static str, Money> = BTreeMap::new();
    for (record, platform) in qualifying {
        let entry = by_platform
            .entry(platform.label())
            .or_insert_with(Money::zero);
        *entry = *entry + record.amount;
    }

    let mut slices: Vec<PlatformSlice> = by_platform
        .into_iter()
        .map(|(label, platform_total)| PlatformSlice {
            platform: label.to_string(),
            total: platform_total,
            percentage: if total.is_zero() {
                Money::zero()
            } else {
                ((platform_total / total) * Money::hundred()).round_2dp()
            },
        })
        .collect();
    slices.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.platform.cmp(&b.platform))
    });
    slices
}

/// Per-day qualifying totals; days with a zero qualifying total are
/// dropped rather than shown as zero.
fn daily_summary(qualifying: &[(&IncomeRecord, QualifyingPlatform)]) -> Vec<DailyTotal> {
    let mut by_day: BTreeMap<NaiveDate, BTreeMap<&'static str, Money>> = BTreeMap::new();
    for (record, platform) in qualifying {
        let day = by_day.entry(record.date).or_default();
        let entry = day.entry(platform.label()).or_insert_with(Money::zero);
        *entry = *entry + record.amount;
    }

    by_day
        .into_iter()
        .filter_map(|(date, platforms)| {
            let total: Money = platforms.values().copied().sum();
            if total.is_zero() {
                return None;
            }
            let mut amounts: Vec<PlatformAmount> = platforms
                .into_iter()
                .map(|(label, platform_total)| PlatformAmount {
                    platform: label.to_string(),
                    total: platform_total,
                })
                .collect();
            amounts.sort_by(|a, b| {
                b.total
                    .cmp(&a.total)
                    .then_with(|| a.platform.cmp(&b.platform))
            });
            Some(DailyTotal {
                date,
                total,
                platforms: amounts,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CompetitionId, GoalKind, MemberRole, Team};
    use chrono::Utc;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn money(s: &str) -> Money {
        Money::from_str_canonical(s).unwrap()
    }

    fn competition(goal: &str, allow_teams: bool) -> Competition {
        Competition {
            id: CompetitionId::generate(),
            code: "RALLY9".to_string(),
            name: "June sprint".to_string(),
            description: String::new(),
            goal_kind: GoalKind::Income,
            goal_value: money(goal),
            prize_value: money("500"),
            start_date: d(2025, 6, 1),
            end_date: d(2025, 6, 30),
            max_members: None,
            allow_teams,
            team_size: None,
            password_hash: None,
            host_id: UserId::new("host".to_string()),
            is_public: false,
            created_at: Utc::now(),
        }
    }

    fn membership(id: i64, comp: &Competition, user: &str, competitor: bool) -> Membership {
        Membership {
            id,
            competition_id: comp.id,
            user_id: UserId::new(user.to_string()),
            role: if id == 1 {
                MemberRole::Host
            } else {
                MemberRole::Member
            },
            is_competitor: competitor,
            team_id: None,
            joined_at: Utc::now(),
        }
    }

    fn income(user: &str, date: NaiveDate, platform: &str, amount: &str) -> IncomeRecord {
        IncomeRecord {
            user_id: UserId::new(user.to_string()),
            date,
            platform: platform.to_string(),
            amount: money(amount),
        }
    }

    #[test]
    fn test_non_qualifying_income_is_filtered_out() {
        // Scenario: goal 1000, two competitors, one earns 1200 qualifying
        // plus 300 non-qualifying. Dynamic goal 2000, progress 60%.
        let comp = competition("1000", false);
        let members = vec![
            membership(1, &comp, "ana", true),
            membership(2, &comp, "bia", true),
        ];
        let rows = vec![
            income("ana", d(2025, 6, 5), "Uber", "700"),
            income("ana", d(2025, 6, 6), "99", "500"),
            income("ana", d(2025, 6, 7), "cash tips", "300"),
        ];

        let standings = compute_standings(&comp, &members, &[], &rows, &HashMap::new());

        assert_eq!(standings.competitor_count, 2);
        assert_eq!(standings.dynamic_goal, money("2000"));
        assert_eq!(standings.total, money("1200"));
        assert_eq!(standings.progress_pct, money("60"));
        assert_eq!(standings.remaining, money("800"));
        assert_eq!(standings.members[0].total, money("1200"));
        assert_eq!(standings.members[1].total, money("0"));
    }

    #[test]
    fn test_dates_outside_window_never_count() {
        let comp = competition("1000", false);
        let members = vec![membership(1, &comp, "ana", true)];
        let rows = vec![
            income("ana", d(2025, 5, 31), "Uber", "100"),
            income("ana", d(2025, 6, 1), "Uber", "40"),
            income("ana", d(2025, 6, 30), "Uber", "60"),
            income("ana", d(2025, 7, 1), "Uber", "999"),
        ];

        let standings = compute_standings(&comp, &members, &[], &rows, &HashMap::new());
        assert_eq!(standings.total, money("100"));
    }

    #[test]
    fn test_non_competitor_income_is_excluded() {
        let comp = competition("1000", false);
        let members = vec![
            membership(1, &comp, "host", false),
            membership(2, &comp, "ana", true),
        ];
        let rows = vec![
            income("host", d(2025, 6, 5), "Uber", "800"),
            income("ana", d(2025, 6, 5), "Uber", "100"),
        ];

        let standings = compute_standings(&comp, &members, &[], &rows, &HashMap::new());

        // The observer host neither scores nor widens the goal.
        assert_eq!(standings.competitor_count, 1);
        assert_eq!(standings.dynamic_goal, money("1000"));
        assert_eq!(standings.total, money("100"));
        assert_eq!(standings.members.len(), 1);
    }

    #[test]
    fn test_adding_competitor_scales_goal_and_dilutes_progress() {
        let comp = competition("1000", false);
        let rows = vec![income("ana", d(2025, 6, 5), "Uber", "1000")];

        let two = compute_standings(
            &comp,
            &[
                membership(1, &comp, "ana", true),
                membership(2, &comp, "bia", true),
            ],
            &[],
            &rows,
            &HashMap::new(),
        );
        let three = compute_standings(
            &comp,
            &[
                membership(1, &comp, "ana", true),
                membership(2, &comp, "bia", true),
                membership(3, &comp, "cao", true),
            ],
            &[],
            &rows,
            &HashMap::new(),
        );

        assert_eq!(two.dynamic_goal, money("2000"));
        assert_eq!(three.dynamic_goal, money("3000"));
        assert!(three.progress_pct < two.progress_pct);
    }

    #[test]
    fn test_progress_is_not_capped_at_100() {
        let comp = competition("100", false);
        let members = vec![membership(1, &comp, "ana", true)];
        let rows = vec![income("ana", d(2025, 6, 5), "Uber", "150")];

        let standings = compute_standings(&comp, &members, &[], &rows, &HashMap::new());
        assert_eq!(standings.progress_pct, money("150"));
        assert_eq!(standings.remaining, money("0"));
    }

    #[test]
    fn test_ranking_ties_break_by_join_order() {
        let comp = competition("1000", false);
        let members = vec![
            membership(1, &comp, "ana", true),
            membership(2, &comp, "bia", true),
            membership(3, &comp, "cao", true),
        ];
        let rows = vec![
            income("bia", d(2025, 6, 5), "Uber", "500"),
            income("cao", d(2025, 6, 5), "Uber", "500"),
            income("ana", d(2025, 6, 5), "Uber", "200"),
        ];

        let standings = compute_standings(&comp, &members, &[], &rows, &HashMap::new());
        let order: Vec<&str> = standings
            .members
            .iter()
            .map(|m| m.user_id.as_str())
            .collect();
        // bia and cao tie on 500; bia joined earlier so ranks higher.
        assert_eq!(order, vec!["bia", "cao", "ana"]);
        assert_eq!(standings.members[0].rank, 1);
        assert_eq!(standings.members[1].rank, 2);
    }

    #[test]
    fn test_platform_breakdown_sums_to_total_and_100_percent() {
        let comp = competition("1000", false);
        let members = vec![membership(1, &comp, "ana", true)];
        let rows = vec![
            income("ana", d(2025, 6, 5), "Uber", "300"),
            income("ana", d(2025, 6, 6), "99", "200"),
            income("ana", d(2025, 6, 7), "indrive", "100"),
            income("ana", d(2025, 6, 7), "lunch money", "400"),
        ];

        let standings = compute_standings(&comp, &members, &[], &rows, &HashMap::new());

        let breakdown_sum: Money = standings.platforms.iter().map(|p| p.total).sum();
        assert_eq!(breakdown_sum, standings.total);
        assert_eq!(standings.total, money("600"));

        let pct_sum: Money = standings.platforms.iter().map(|p| p.percentage).sum();
        let drift = (pct_sum - Money::hundred()).inner().abs();
        assert!(
            drift <= rust_decimal::Decimal::new(1, 1),
            "percentages sum to {} (drift {})",
            pct_sum,
            drift
        );

        // Percentages are shares of the filtered 600, not the raw 1000.
        assert_eq!(standings.platforms[0].platform, "Uber");
        assert_eq!(standings.platforms[0].percentage, money("50"));
    }

    #[test]
    fn test_daily_summary_drops_zero_days() {
        let comp = competition("1000", false);
        let members = vec![membership(1, &comp, "ana", true)];
        let rows = vec![
            income("ana", d(2025, 6, 5), "Uber", "100"),
            income("ana", d(2025, 6, 6), "snacks", "50"),
            income("ana", d(2025, 6, 7), "99", "80"),
            income("ana", d(2025, 6, 7), "Uber", "20"),
        ];

        let standings = compute_standings(&comp, &members, &[], &rows, &HashMap::new());

        let days: Vec<NaiveDate> = standings.daily.iter().map(|t| t.date).collect();
        // June 6 had only non-qualifying income, so it is absent.
        assert_eq!(days, vec![d(2025, 6, 5), d(2025, 6, 7)]);
        assert_eq!(standings.daily[1].total, money("100"));
        assert_eq!(standings.daily[1].platforms[0].platform, "99");
        assert_eq!(standings.daily[1].platforms[0].total, money("80"));
    }

    #[test]
    fn test_team_totals_roll_up_member_contributions() {
        let mut comp = competition("1000", true);
        comp.team_size = Some(2);
        let team_x = Team {
            id: TeamId::new(1),
            competition_id: comp.id,
            name: "Team 1".to_string(),
            created_at: Utc::now(),
        };
        let team_y = Team {
            id: TeamId::new(2),
            competition_id: comp.id,
            name: "Team 2".to_string(),
            created_at: Utc::now(),
        };
        let mut members = vec![
            membership(1, &comp, "ana", true),
            membership(2, &comp, "bia", true),
            membership(3, &comp, "cao", true),
            membership(4, &comp, "dio", true),
        ];
        members[0].team_id = Some(team_x.id);
        members[1].team_id = Some(team_x.id);
        members[2].team_id = Some(team_y.id);
        members[3].team_id = Some(team_y.id);

        let rows = vec![
            income("ana", d(2025, 6, 5), "Uber", "600"),
            income("bia", d(2025, 6, 5), "Uber", "700"),
            income("cao", d(2025, 6, 5), "Uber", "400"),
            income("dio", d(2025, 6, 5), "Uber", "400"),
        ];

        let standings = compute_standings(
            &comp,
            &members,
            &[team_x.clone(), team_y.clone()],
            &rows,
            &HashMap::new(),
        );

        assert_eq!(standings.teams.len(), 2);
        assert_eq!(standings.teams[0].team_id, team_x.id);
        assert_eq!(standings.teams[0].total, money("1300"));
        assert_eq!(standings.teams[0].team_goal, money("2000"));
        assert_eq!(standings.teams[1].total, money("800"));
        assert_eq!(standings.teams[0].rank, 1);
    }

    #[test]
    fn test_unassigned_member_excluded_from_team_totals() {
        let comp = competition("1000", true);
        let team = Team {
            id: TeamId::new(1),
            competition_id: comp.id,
            name: "Team 1".to_string(),
            created_at: Utc::now(),
        };
        let mut members = vec![
            membership(1, &comp, "ana", true),
            membership(2, &comp, "bia", true),
        ];
        members[0].team_id = Some(team.id);

        let rows = vec![
            income("ana", d(2025, 6, 5), "Uber", "100"),
            income("bia", d(2025, 6, 5), "Uber", "999"),
        ];

        let standings = compute_standings(&comp, &members, &[team], &rows, &HashMap::new());
        assert_eq!(standings.teams[0].total, money("100"));
        assert_eq!(standings.teams[0].member_count, 1);
        // bia still counts toward the competition-wide total.
        assert_eq!(standings.total, money("1099"));
    }

    #[test]
    fn test_zero_competitors_yields_zero_progress() {
        let comp = competition("1000", false);
        let standings = compute_standings(&comp, &[], &[], &[], &HashMap::new());
        assert_eq!(standings.dynamic_goal, money("0"));
        assert_eq!(standings.progress_pct, money("0"));
        assert!(standings.members.is_empty());
    }

    #[test]
    fn test_display_names_fall_back_to_user_id() {
        let comp = competition("1000", false);
        let members = vec![membership(1, &comp, "ana", true)];
        let mut names = HashMap::new();
        names.insert(UserId::new("ana".to_string()), "Ana Dias".to_string());

        let with_names = compute_standings(&comp, &members, &[], &[], &names);
        assert_eq!(with_names.members[0].display_name, "Ana Dias");

        let without = compute_standings(&comp, &members, &[], &[], &HashMap::new());
        assert_eq!(without.members[0].display_name, "ana");
    }
}
