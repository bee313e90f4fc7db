// Behavior tests for the reminder engine, run against a fixed clock and
// in-memory collaborators

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use common::errors::{DatabaseError, NotifyError};
use common::models::{Channel, ExpiringLicense, LicenseStatus};
use common::notify::{ChatTransport, Delivery, EmailMessage, EmailTransport};
use common::reminder::{
    Clock, ExpiringLicenseSource, NotificationDispatcher, ReminderConfig, ReminderEngine,
    ReminderLedger, ReminderScheduler,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Clock pinned to a fixed instant
struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// License source backed by a map from end date to rows
#[derive(Default)]
struct MemorySource {
    by_date: HashMap<NaiveDate, Vec<ExpiringLicense>>,
    fail_dates: HashSet<NaiveDate>,
}

impl MemorySource {
    fn with(mut self, license: ExpiringLicense) -> Self {
        self.by_date
            .entry(license.end_date)
            .or_default()
            .push(license);
        self
    }

    fn failing_on(mut self, date: NaiveDate) -> Self {
        self.fail_dates.insert(date);
        self
    }
}

#[async_trait]
impl ExpiringLicenseSource for MemorySource {
    async fn find_expiring_on(
        &self,
        target: NaiveDate,
    ) -> Result<Vec<ExpiringLicense>, DatabaseError> {
        if self.fail_dates.contains(&target) {
            return Err(DatabaseError::QueryFailed("simulated outage".to_string()));
        }
        Ok(self.by_date.get(&target).cloned().unwrap_or_default())
    }
}

/// Ledger fake mirroring the unique constraint of the real table
#[derive(Default)]
struct MemoryLedger {
    rows: Mutex<HashSet<(i64, String, Channel)>>,
}

impl MemoryLedger {
    fn seed(&self, license_id: i64, threshold: &str, channel: Channel) {
        self.rows
            .lock()
            .unwrap()
            .insert((license_id, threshold.to_string(), channel));
    }

    fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn contains(&self, license_id: i64, threshold: &str, channel: Channel) -> bool {
        self.rows
            .lock()
            .unwrap()
            .contains(&(license_id, threshold.to_string(), channel))
    }
}

#[async_trait]
impl ReminderLedger for MemoryLedger {
    async fn already_notified(&self, threshold: &str) -> Result<HashSet<i64>, DatabaseError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, t, _)| t == threshold)
            .map(|(id, _, _)| *id)
            .collect())
    }

    async fn already_notified_via(
        &self,
        threshold: &str,
        channel: Channel,
    ) -> Result<HashSet<i64>, DatabaseError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, t, c)| t == threshold && *c == channel)
            .map(|(id, _, _)| *id)
            .collect())
    }

    async fn record(
        &self,
        license_id: i64,
        threshold: &str,
        channel: Channel,
        _details: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .insert((license_id, threshold.to_string(), channel)))
    }
}

/// Email transport recording every subject it delivers
#[derive(Default)]
struct RecordingEmail {
    subjects: Mutex<Vec<String>>,
}

impl RecordingEmail {
    fn subjects(&self) -> Vec<String> {
        self.subjects.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailTransport for RecordingEmail {
    async fn send(&self, message: &EmailMessage) -> Result<Delivery, NotifyError> {
        self.subjects.lock().unwrap().push(message.subject.clone());
        Ok(Delivery::Sent)
    }
}

/// Chat transport recording every text it posts
#[derive(Default)]
struct RecordingChat {
    posts: Mutex<Vec<String>>,
}

impl RecordingChat {
    fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatTransport for RecordingChat {
    async fn post(&self, text: &str) -> Result<Delivery, NotifyError> {
        self.posts.lock().unwrap().push(text.to_string());
        Ok(Delivery::Sent)
    }
}

/// Chat transport that is never configured
struct UnconfiguredChat;

#[async_trait]
impl ChatTransport for UnconfiguredChat {
    async fn post(&self, _text: &str) -> Result<Delivery, NotifyError> {
        Ok(Delivery::Skipped {
            reason: "webhook URL not configured".to_string(),
        })
    }
}

fn license(id: i64, customer: &str, product: &str, end: NaiveDate) -> ExpiringLicense {
    ExpiringLicense {
        license_id: id,
        public_id: Uuid::new_v4(),
        end_date: end,
        status: LicenseStatus::Active,
        license_key: Some(format!("KEY-{}", id)),
        seats: Some(10),
        customer_name: customer.to_string(),
        contact_email: Some("it@example.com".to_string()),
        product_name: product.to_string(),
    }
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Build an engine whose clock reads 08:00 UTC on the given day
fn engine_at(
    today: NaiveDate,
    source: MemorySource,
    ledger: Arc<MemoryLedger>,
    email: Arc<dyn EmailTransport>,
    chat: Arc<dyn ChatTransport>,
) -> ReminderEngine {
    let now = Utc.from_utc_datetime(&today.and_hms_opt(8, 0, 0).unwrap());
    let dispatcher =
        NotificationDispatcher::new(email, chat, ledger.clone(), "http://tracker.local");
    ReminderEngine::new(
        ReminderConfig {
            cron_expression: "0 0 8 * * *".to_string(),
            timezone: chrono_tz::UTC,
        },
        Arc::new(source),
        ledger,
        dispatcher,
        Arc::new(FixedClock(now)),
    )
}

/// A license ending exactly thirty days out is mailed and recorded
#[tokio::test]
async fn test_thirty_day_reminder_sent_and_recorded() {
    let today = day(2024, 3, 10);
    let source = MemorySource::default().with(license(1, "Acme", "Suite", day(2024, 4, 9)));
    let ledger = Arc::new(MemoryLedger::default());
    let email = Arc::new(RecordingEmail::default());

    let engine = engine_at(
        today,
        source,
        ledger.clone(),
        email.clone(),
        Arc::new(UnconfiguredChat),
    );
    let summary = engine.run_once().await;

    assert_eq!(summary.thresholds_processed, 5);
    assert_eq!(summary.thresholds_failed, 0);
    assert_eq!(summary.licenses_dispatched, 1);
    assert_eq!(
        email.subjects(),
        vec!["[Licenses] Licenses expiring in 30 days".to_string()]
    );
    assert!(ledger.contains(1, "30d", Channel::Email));
    assert!(!ledger.contains(1, "30d", Channel::Slack));
    assert_eq!(ledger.row_count(), 1);
}

/// Running the same day twice sends nothing new
#[tokio::test]
async fn test_second_run_is_idempotent() {
    let today = day(2024, 3, 10);
    let source = MemorySource::default().with(license(1, "Acme", "Suite", day(2024, 4, 9)));
    let ledger = Arc::new(MemoryLedger::default());
    let email = Arc::new(RecordingEmail::default());

    let engine = engine_at(
        today,
        source,
        ledger.clone(),
        email.clone(),
        Arc::new(UnconfiguredChat),
    );

    let first = engine.run_once().await;
    let second = engine.run_once().await;

    assert_eq!(first.licenses_dispatched, 1);
    assert_eq!(second.licenses_dispatched, 0);
    assert_eq!(email.subjects().len(), 1);
    assert_eq!(ledger.row_count(), 1);
}

/// A license whose end date passed yesterday is flagged as expired
#[tokio::test]
async fn test_expired_flagged_the_morning_after() {
    let today = day(2024, 3, 10);
    let source = MemorySource::default().with(license(7, "Globex", "CAD", day(2024, 3, 9)));
    let ledger = Arc::new(MemoryLedger::default());
    let email = Arc::new(RecordingEmail::default());

    let engine = engine_at(
        today,
        source,
        ledger.clone(),
        email.clone(),
        Arc::new(UnconfiguredChat),
    );
    let summary = engine.run_once().await;

    assert_eq!(summary.licenses_dispatched, 1);
    assert_eq!(
        email.subjects(),
        vec!["[Licenses] Expired licenses".to_string()]
    );
    assert!(ledger.contains(7, "expired", Channel::Email));
}

/// Each threshold matches only licenses ending exactly on its target date
#[tokio::test]
async fn test_thresholds_match_exact_dates_only() {
    let today = day(2024, 3, 10);
    let source = MemorySource::default()
        .with(license(1, "A", "P", day(2024, 4, 9))) // 30 days out
        .with(license(2, "B", "P", day(2024, 3, 24))) // 14 days out
        .with(license(3, "C", "P", day(2024, 3, 17))) // 7 days out
        .with(license(4, "D", "P", day(2024, 3, 11))) // tomorrow
        .with(license(5, "E", "P", day(2024, 3, 9))) // ended yesterday
        .with(license(6, "F", "P", day(2024, 4, 8))) // 29 days out, no window
        .with(license(8, "G", "P", day(2024, 3, 8))); // ended two days ago
    let ledger = Arc::new(MemoryLedger::default());
    let email = Arc::new(RecordingEmail::default());

    let engine = engine_at(
        today,
        source,
        ledger.clone(),
        email.clone(),
        Arc::new(UnconfiguredChat),
    );
    let summary = engine.run_once().await;

    assert_eq!(summary.licenses_dispatched, 5);
    assert_eq!(email.subjects().len(), 5);
    assert!(ledger.contains(1, "30d", Channel::Email));
    assert!(ledger.contains(2, "14d", Channel::Email));
    assert!(ledger.contains(3, "7d", Channel::Email));
    assert!(ledger.contains(4, "1d", Channel::Email));
    assert!(ledger.contains(5, "expired", Channel::Email));
    assert_eq!(ledger.row_count(), 5);
}

/// A failing threshold query is counted and the rest of the run proceeds
#[tokio::test]
async fn test_failed_threshold_does_not_stop_the_run() {
    let today = day(2024, 3, 10);
    let source = MemorySource::default()
        .with(license(3, "C", "P", day(2024, 3, 17)))
        .failing_on(day(2024, 4, 9));
    let ledger = Arc::new(MemoryLedger::default());
    let email = Arc::new(RecordingEmail::default());

    let engine = engine_at(
        today,
        source,
        ledger.clone(),
        email.clone(),
        Arc::new(UnconfiguredChat),
    );
    let summary = engine.run_once().await;

    assert_eq!(summary.thresholds_failed, 1);
    assert_eq!(summary.thresholds_processed, 4);
    assert_eq!(summary.licenses_dispatched, 1);
    assert!(ledger.contains(3, "7d", Channel::Email));
}

/// A license already notified on any channel is not picked up again, even
/// when another channel has become available since
#[tokio::test]
async fn test_prior_notification_suppresses_all_channels() {
    let today = day(2024, 3, 10);
    let source = MemorySource::default().with(license(1, "Acme", "Suite", day(2024, 4, 9)));
    let ledger = Arc::new(MemoryLedger::default());
    ledger.seed(1, "30d", Channel::Email);
    let email = Arc::new(RecordingEmail::default());
    let chat = Arc::new(RecordingChat::default());

    let engine = engine_at(today, source, ledger.clone(), email.clone(), chat.clone());
    let summary = engine.run_once().await;

    assert_eq!(summary.licenses_dispatched, 0);
    assert!(email.subjects().is_empty());
    assert!(chat.posts().is_empty());
    assert_eq!(ledger.row_count(), 1);
}

/// Both channels configured: one message each, one ledger row per channel
#[tokio::test]
async fn test_both_channels_deliver_and_record() {
    let today = day(2024, 3, 10);
    let source = MemorySource::default().with(license(1, "Acme", "Suite", day(2024, 3, 11)));
    let ledger = Arc::new(MemoryLedger::default());
    let email = Arc::new(RecordingEmail::default());
    let chat = Arc::new(RecordingChat::default());

    let engine = engine_at(today, source, ledger.clone(), email.clone(), chat.clone());
    engine.run_once().await;

    assert_eq!(email.subjects().len(), 1);
    assert_eq!(chat.posts().len(), 1);
    assert!(chat.posts()[0].starts_with("Licenses expiring in 1 days:"));
    assert!(ledger.contains(1, "1d", Channel::Email));
    assert!(ledger.contains(1, "1d", Channel::Slack));
    assert_eq!(ledger.row_count(), 2);
}
