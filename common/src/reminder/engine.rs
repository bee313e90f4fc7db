// Reminder engine and its daily scheduling loop

use crate::errors::{DatabaseError, ScheduleError};
use crate::models::ExpiringLicense;
use crate::reminder::dispatcher::NotificationDispatcher;
use crate::reminder::threshold::{Threshold, THRESHOLDS};
use crate::reminder::{Clock, ExpiringLicenseSource, ReminderLedger};
use crate::telemetry;
use async_trait::async_trait;
use chrono::NaiveDate;
use chrono_tz::Tz;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Configuration for the reminder engine
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    /// Six-field cron expression for the daily tick
    pub cron_expression: String,
    /// Timezone the schedule and "today" are evaluated in
    pub timezone: Tz,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            cron_expression: "0 0 8 * * *".to_string(),
            timezone: chrono_tz::Europe::Zurich,
        }
    }
}

/// Counters describing one full engine run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub thresholds_processed: usize,
    pub thresholds_failed: usize,
    pub licenses_dispatched: usize,
}

/// Scheduler interface of the reminder engine
#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    /// Start the scheduling loop; returns when stopped
    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Stop the scheduling loop gracefully
    async fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Execute one full pass over all thresholds
    async fn run_once(&self) -> RunSummary;
}

/// Main reminder engine implementation
///
/// Owns its collaborators behind trait objects so runs are reproducible
/// in tests with a fixed clock and in-memory stores.
pub struct ReminderEngine {
    config: ReminderConfig,
    licenses: Arc<dyn ExpiringLicenseSource>,
    ledger: Arc<dyn ReminderLedger>,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
    shutdown_tx: broadcast::Sender<()>,
}

impl ReminderEngine {
    pub fn new(
        config: ReminderConfig,
        licenses: Arc<dyn ExpiringLicenseSource>,
        ledger: Arc<dyn ReminderLedger>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);

        Self {
            config,
            licenses,
            ledger,
            dispatcher,
            clock,
            shutdown_tx,
        }
    }

    /// Get a receiver for shutdown signals
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Handle a single threshold: compute its target date, fetch licenses
    /// ending exactly that day, drop the ones already in the ledger, and
    /// hand the rest to the dispatcher
    #[tracing::instrument(skip(self, threshold), fields(threshold = threshold.label))]
    async fn process_threshold(
        &self,
        threshold: &Threshold,
        today: NaiveDate,
    ) -> Result<usize, DatabaseError> {
        let target = threshold.target_date(today);
        let candidates = self.licenses.find_expiring_on(target).await?;

        if candidates.is_empty() {
            debug!(target_date = %target, "No licenses on target date");
            return Ok(0);
        }

        let already = self.ledger.already_notified(threshold.label).await?;
        let total = candidates.len();
        let pending: Vec<ExpiringLicense> = candidates
            .into_iter()
            .filter(|license| !already.contains(&license.license_id))
            .collect();

        debug!(
            target_date = %target,
            total = total,
            pending = pending.len(),
            "Threshold batch assembled"
        );

        self.dispatcher.notify(threshold, &pending).await;
        Ok(pending.len())
    }
}

#[async_trait]
impl ReminderScheduler for ReminderEngine {
    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let schedule =
            Schedule::from_str(&self.config.cron_expression).map_err(|e| {
                ScheduleError::InvalidCronExpression {
                    expression: self.config.cron_expression.clone(),
                    reason: e.to_string(),
                }
            })?;

        info!(
            cron = %self.config.cron_expression,
            timezone = %self.config.timezone,
            "Starting reminder engine"
        );

        let mut shutdown_rx = self.shutdown_receiver();

        loop {
            let now = self.clock.now().with_timezone(&self.config.timezone);
            let Some(next) = schedule.after(&now).next() else {
                warn!("Schedule yields no further runs, stopping");
                break;
            };

            let wait = (next - now).to_std().unwrap_or(std::time::Duration::ZERO);
            debug!(next_run = %next, "Waiting for next scheduled run");

            tokio::select! {
                _ = sleep(wait) => {
                    let summary = self.run_once().await;
                    info!(
                        thresholds_processed = summary.thresholds_processed,
                        thresholds_failed = summary.thresholds_failed,
                        licenses_dispatched = summary.licenses_dispatched,
                        "Reminder run complete"
                    );
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping reminder engine");
                    break;
                }
            }
        }

        info!("Reminder engine stopped");
        Ok(())
    }

    async fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Stopping reminder engine");

        // Send shutdown signal
        let _ = self.shutdown_tx.send(());

        // Give the loop a moment to finish an in-flight run
        sleep(std::time::Duration::from_secs(2)).await;

        info!("Reminder engine stopped gracefully");
        Ok(())
    }

    /// One pass over all thresholds in fixed order
    ///
    /// A threshold that fails is counted and skipped; the remaining
    /// thresholds still run.
    #[tracing::instrument(skip(self))]
    async fn run_once(&self) -> RunSummary {
        let started = std::time::Instant::now();
        let today = self
            .clock
            .now()
            .with_timezone(&self.config.timezone)
            .date_naive();

        info!(today = %today, "Reminder run started");

        let mut summary = RunSummary::default();

        for threshold in THRESHOLDS.iter() {
            match self.process_threshold(threshold, today).await {
                Ok(dispatched) => {
                    summary.thresholds_processed += 1;
                    summary.licenses_dispatched += dispatched;
                }
                Err(e) => {
                    error!(
                        threshold = threshold.label,
                        error = %e,
                        "Threshold processing failed"
                    );
                    telemetry::record_threshold_failure(threshold.label);
                    summary.thresholds_failed += 1;
                    // Continue with the remaining thresholds
                }
            }
        }

        telemetry::record_reminder_run(started.elapsed().as_secs_f64());
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_config_default() {
        let config = ReminderConfig::default();
        assert_eq!(config.cron_expression, "0 0 8 * * *");
        assert_eq!(config.timezone, chrono_tz::Europe::Zurich);
    }

    #[test]
    fn test_reminder_config_custom() {
        let config = ReminderConfig {
            cron_expression: "0 30 6 * * *".to_string(),
            timezone: chrono_tz::UTC,
        };
        assert_eq!(config.cron_expression, "0 30 6 * * *");
        assert_eq!(config.timezone, chrono_tz::UTC);
    }

    #[test]
    fn test_run_summary_default_is_empty() {
        let summary = RunSummary::default();
        assert_eq!(summary.thresholds_processed, 0);
        assert_eq!(summary.thresholds_failed, 0);
        assert_eq!(summary.licenses_dispatched, 0);
    }
}
