// Reminder daemon entry point

use common::config::Settings;
use common::db::repositories::{LicenseRepository, ReminderLogRepository};
use common::db::DbPool;
use common::errors::ScheduleError;
use common::notify::{ChatTransport, EmailTransport, SlackWebhook, SmtpMailer};
use common::reminder::{
    Clock, ExpiringLicenseSource, NotificationDispatcher, ReminderConfig, ReminderEngine,
    ReminderLedger, ReminderScheduler, SystemClock,
};
use common::telemetry;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reminder=info,common=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting license expiration reminder daemon");

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        error!(error = %e, "Failed to load configuration");
        e
    })?;
    settings.validate()?;

    info!(
        cron = %settings.reminder.cron,
        timezone = %settings.reminder.timezone,
        "Configuration loaded"
    );

    // Expose engine metrics on the standalone listener
    telemetry::init_metrics(settings.observability.metrics_port).map_err(|e| {
        error!(error = %e, "Failed to initialize metrics exporter");
        e
    })?;

    // Initialize database connection pool
    info!("Initializing database connection pool");
    let db_pool = DbPool::new(&settings.database).await.map_err(|e| {
        error!(error = %e, "Failed to initialize database pool");
        e
    })?;
    info!("Database connection pool initialized");

    // Wire up the notification transports
    let email = Arc::new(SmtpMailer::new(&settings.notifier).map_err(|e| {
        error!(error = %e, "Failed to set up SMTP transport");
        e
    })?) as Arc<dyn EmailTransport>;
    let chat = Arc::new(SlackWebhook::new(
        settings.notifier.slack_webhook_url.clone(),
        30,
    )?) as Arc<dyn ChatTransport>;
    info!("Notification transports initialized");

    // Repositories backing the engine seams
    let licenses =
        Arc::new(LicenseRepository::new(db_pool.clone())) as Arc<dyn ExpiringLicenseSource>;
    let ledger = Arc::new(ReminderLogRepository::new(db_pool.clone())) as Arc<dyn ReminderLedger>;

    let dispatcher = NotificationDispatcher::new(
        email,
        chat,
        ledger.clone(),
        settings.notifier.base_url.clone(),
    );

    // Engine configuration
    let timezone = chrono_tz::Tz::from_str(&settings.reminder.timezone)
        .map_err(|_| ScheduleError::InvalidTimezone(settings.reminder.timezone.clone()))?;
    let reminder_config = ReminderConfig {
        cron_expression: settings.reminder.cron.clone(),
        timezone,
    };

    let engine = Arc::new(ReminderEngine::new(
        reminder_config,
        licenses,
        ledger,
        dispatcher,
        Arc::new(SystemClock) as Arc<dyn Clock>,
    ));
    info!("Reminder engine created");

    // Set up graceful shutdown
    let engine_for_shutdown = engine.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        info!("Received Ctrl+C signal, initiating graceful shutdown");
        if let Err(e) = engine_for_shutdown.stop().await {
            error!(error = %e, "Error during engine shutdown");
        }
    });

    // Start the engine loop
    info!("Starting reminder engine loop");
    if let Err(e) = engine.start().await {
        error!(error = %e, "Reminder engine error");
        return Err(e);
    }

    db_pool.close().await;
    info!("Reminder daemon stopped");
    Ok(())
}
