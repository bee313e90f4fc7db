// Reminder thresholds and their target-date arithmetic

use chrono::{Duration, NaiveDate};

/// A single reminder threshold: how many days before expiry it fires, and
/// the label recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Threshold {
    pub label: &'static str,
    pub days_before_expiry: i64,
}

/// Every daily run walks this table in order, far-out warnings first and the
/// expired notice last
pub const THRESHOLDS: [Threshold; 5] = [
    Threshold {
        label: "30d",
        days_before_expiry: 30,
    },
    Threshold {
        label: "14d",
        days_before_expiry: 14,
    },
    Threshold {
        label: "7d",
        days_before_expiry: 7,
    },
    Threshold {
        label: "1d",
        days_before_expiry: 1,
    },
    Threshold {
        label: "expired",
        days_before_expiry: 0,
    },
];

impl Threshold {
    /// The expired marker fires the day after the end date rather than
    /// ahead of it
    pub fn is_expired_marker(&self) -> bool {
        self.label == "expired"
    }

    /// End date a license must have to hit this threshold today. Forward
    /// thresholds target `today + days`; the expired marker targets
    /// yesterday, so a license that ended yesterday is flagged today.
    pub fn target_date(&self, today: NaiveDate) -> NaiveDate {
        if self.is_expired_marker() {
            today - Duration::days(1)
        } else {
            today + Duration::days(self.days_before_expiry)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_thresholds_are_ordered_furthest_first() {
        let labels: Vec<&str> = THRESHOLDS.iter().map(|t| t.label).collect();
        assert_eq!(labels, vec!["30d", "14d", "7d", "1d", "expired"]);

        let days: Vec<i64> = THRESHOLDS.iter().map(|t| t.days_before_expiry).collect();
        assert_eq!(days, vec![30, 14, 7, 1, 0]);
    }

    #[test]
    fn test_forward_threshold_targets_future_date() {
        let today = date(2024, 3, 10);
        assert_eq!(THRESHOLDS[0].target_date(today), date(2024, 4, 9));
        assert_eq!(THRESHOLDS[1].target_date(today), date(2024, 3, 24));
        assert_eq!(THRESHOLDS[2].target_date(today), date(2024, 3, 17));
        assert_eq!(THRESHOLDS[3].target_date(today), date(2024, 3, 11));
    }

    #[test]
    fn test_expired_marker_targets_yesterday() {
        let today = date(2024, 3, 10);
        let expired = THRESHOLDS[4];
        assert!(expired.is_expired_marker());
        assert_eq!(expired.target_date(today), date(2024, 3, 9));
    }

    #[test]
    fn test_target_date_crosses_month_boundary() {
        let today = date(2024, 1, 25);
        assert_eq!(THRESHOLDS[2].target_date(today), date(2024, 2, 1));
    }

    #[test]
    fn test_expired_marker_crosses_month_boundary() {
        let today = date(2024, 3, 1);
        assert_eq!(THRESHOLDS[4].target_date(today), date(2024, 2, 29));
    }
}
