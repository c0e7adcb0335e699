//! External cron trigger adapter.
//!
//! Thin client for deployments where the platform scheduler runs commands
//! rather than hitting HTTP endpoints directly: POSTs the corresponding
//! cron endpoint and prints the summary counts.

use miette::{IntoDiagnostic, Result, miette};
use tracing::info;

use crate::SweepKind;

pub async fn run(kind: SweepKind, url: String) -> Result<()> {
    let endpoint = match kind {
        SweepKind::Scheduled => "/api/cron/scheduled",
        SweepKind::Recurring => "/api/cron/recurring",
    };

    let client = reqwest::Client::new();
    let response = client
        .post(format!("{url}{endpoint}"))
        .send()
        .await
        .into_diagnostic()?;

    let status = response.status();
    let body: serde_json::Value = response.json().await.into_diagnostic()?;

    if !status.is_success() {
        return Err(miette!("sweep trigger failed ({status}): {body}"));
    }

    info!(
        processed = body["processed"].as_u64().unwrap_or(0),
        skipped = body["skipped"].as_u64().unwrap_or(0),
        failed = body["failed"].as_u64().unwrap_or(0),
        "sweep complete"
    );
    println!("{body}");

    Ok(())
}
