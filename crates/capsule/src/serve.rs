//! API server with an optional built-in sweep ticker.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use miette::{IntoDiagnostic, Result};
use tracing::{error, info};

use capsule_delivery::{LogNotifier, MemoryStore, Sweeper};
use capsule_web::{AppState, create_router};

/// Run the server. With `tick_secs > 0` a background loop drives both
/// sweeps: scheduled every tick, recurring at most once per calendar day
/// (its due-date granularity).
pub async fn run(bind: String, tick_secs: u64) -> Result<()> {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(LogNotifier);

    let state = Arc::new(AppState::new(
        store.clone(),
        Sweeper::new(store.clone(), notifier.clone()),
    ));

    if tick_secs > 0 {
        let sweeper = Sweeper::new(store.clone(), notifier);
        tokio::spawn(async move {
            run_ticker(sweeper, tick_secs).await;
        });
        info!(tick_secs, "built-in sweep ticker running");
    }

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(&bind).await.into_diagnostic()?;
    info!(%bind, "capsule API listening");
    axum::serve(listener, app).await.into_diagnostic()?;

    Ok(())
}

async fn run_ticker(sweeper: Sweeper, tick_secs: u64) {
    let mut tick = tokio::time::interval(Duration::from_secs(tick_secs));
    let mut last_recurring_day: Option<NaiveDate> = None;

    loop {
        tick.tick().await;
        let now = Utc::now();

        if let Err(e) = sweeper.process_scheduled(now).await {
            error!(error = %e, "scheduled sweep failed");
        }

        // Recurring due-ness is a calendar-day question; one pass per day.
        let today = now.date_naive();
        if last_recurring_day != Some(today) {
            match sweeper.process_recurring(now).await {
                Ok(_) => last_recurring_day = Some(today),
                Err(e) => error!(error = %e, "recurring sweep failed"),
            }
        }
    }
}
