//! Date windows and scalar summation over them.
//!
//! The same window/sum utility serves both the per-competition scoring
//! window and the global-ranking period filters.

use crate::domain::Money;
use chrono::{Datelike, Days, NaiveDate};
use std::str::FromStr;

/// An inclusive date range with optional open ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateWindow {
    /// Both ends closed.
    pub fn bounded(from: NaiveDate, to: NaiveDate) -> Self {
        DateWindow {
            from: Some(from),
            to: Some(to),
        }
    }

    /// No bounds at all.
    pub fn unbounded() -> Self {
        DateWindow {
            from: None,
            to: None,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(from) = self.from {
            if date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if date > to {
                return false;
            }
        }
        true
    }
}

/// Sum dated amounts that fall inside the window.
pub fn sum_in_window<I>(entries: I, window: &DateWindow) -> Money
where
    I: IntoIterator<Item = (NaiveDate, Money)>,
{
    entries
        .into_iter()
        .filter(|(date, _)| window.contains(*date))
        .map(|(_, amount)| amount)
        .sum()
}

/// Selectable window for the global ranking, filtering competitions by
/// their end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankingPeriod {
    #[default]
    AllTime,
    Last30Days,
    ThisMonth,
    ThisYear,
}

impl RankingPeriod {
    /// Resolve the period to a concrete window relative to `today`.
    ///
    /// Calendar periods are bounded on both ends; "last 30 days" and
    /// "all time" have no upper bound, so competitions ending today (or
    /// later, for participation counts) still fall inside.
    pub fn window(&self, today: NaiveDate) -> DateWindow {
        match self {
            RankingPeriod::AllTime => DateWindow::unbounded(),
            RankingPeriod::Last30Days => DateWindow {
                from: Some(today - Days::new(30)),
                to: None,
            },
            RankingPeriod::ThisMonth => {
                let first = today.with_day(1).unwrap_or(today);
                let last = last_day_of_month(today);
                DateWindow::bounded(first, last)
            }
            RankingPeriod::ThisYear => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                let last = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
                DateWindow::bounded(first, last)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RankingPeriod::AllTime => "all_time",
            RankingPeriod::Last30Days => "last_30_days",
            RankingPeriod::ThisMonth => "this_month",
            RankingPeriod::ThisYear => "this_year",
        }
    }
}

impl FromStr for RankingPeriod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all_time" => Ok(RankingPeriod::AllTime),
            "last_30_days" => Ok(RankingPeriod::Last30Days),
            "this_month" => Ok(RankingPeriod::ThisMonth),
            "this_year" => Ok(RankingPeriod::ThisYear),
            _ => Err(()),
        }
    }
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let (next_year, next_month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .unwrap_or(date)
}
