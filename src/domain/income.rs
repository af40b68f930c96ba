//! Income records and driver profiles, read from collaborator-owned tables.

use crate::domain::{Money, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day's revenue on one platform for one driver.
///
/// The engine never writes these rows; the income-tracking side of the
/// product owns them. Platform labels are the driver's own and must go
/// through the qualifying-platform filter before any aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeRecord {
    pub user_id: UserId,
    pub date: NaiveDate,
    pub platform: String,
    pub amount: Money,
}

/// Display and payout details for a user, owned by the profile service.
///
/// `payout_key` is the off-platform payment handle (e.g. a PIX key) the
/// host uses to settle prizes manually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub display_name: String,
    pub payout_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_income_record_serializes_date_as_iso() {
        let record = IncomeRecord {
            user_id: UserId::new("driver-1".to_string()),
            date: NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
            platform: "Uber".to_string(),
            amount: Money::from_str_canonical("120.50").unwrap(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["date"], "2025-06-15");
        assert_eq!(json["platform"], "Uber");
    }
}
