// Expiration reminder engine
//
// A daily run walks the fixed threshold table, queries licenses whose end
// date lands exactly on each threshold's target date, drops the ones the
// ledger already covers, and hands the rest to the notification dispatcher.

pub mod dispatcher;
pub mod engine;
pub mod render;
pub mod threshold;

pub use dispatcher::NotificationDispatcher;
pub use engine::{ReminderConfig, ReminderEngine, ReminderScheduler, RunSummary};
pub use threshold::{Threshold, THRESHOLDS};

use crate::errors::DatabaseError;
use crate::models::{Channel, ExpiringLicense};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashSet;

/// Source of licenses hitting a reminder date
#[async_trait]
pub trait ExpiringLicenseSource: Send + Sync {
    /// Non-terminated licenses whose end date equals `target`
    async fn find_expiring_on(
        &self,
        target: NaiveDate,
    ) -> Result<Vec<ExpiringLicense>, DatabaseError>;
}

/// Persistent record of reminders already delivered
#[async_trait]
pub trait ReminderLedger: Send + Sync {
    /// License ids with any ledger row for the threshold, regardless of
    /// channel. Applied before building a notification batch.
    async fn already_notified(&self, threshold: &str) -> Result<HashSet<i64>, DatabaseError>;

    /// License ids with a ledger row for the threshold on one channel.
    /// Applied before recording, to avoid duplicate channel rows.
    async fn already_notified_via(
        &self,
        threshold: &str,
        channel: Channel,
    ) -> Result<HashSet<i64>, DatabaseError>;

    /// Record a delivered reminder. Returns false when the row already
    /// existed and nothing was written.
    async fn record(
        &self,
        license_id: i64,
        threshold: &str,
        channel: Channel,
        details: Option<&str>,
    ) -> Result<bool, DatabaseError>;
}

/// Time source, injectable so runs can be pinned to a date in tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock implementation used outside of tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
