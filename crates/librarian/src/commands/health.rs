use eyre::{Result, bail};
use librarian_client::{ApiClient, Backend, Settings};

use crate::tui::HealthStatus;

/// Probe the backend once and print the status line the UI would show.
/// Exits with an error unless the backend reports it is healthy.
pub async fn run(settings: &Settings) -> Result<()> {
    let client = ApiClient::new(&settings.api_base)?;

    let result = client.health().await;
    if let Err(ref err) = result {
        tracing::debug!(error = %err, "health check failed");
    }

    let status = HealthStatus::from_probe(&result);
    println!("Health: {}", status.display_text());

    match result {
        Ok(true) => Ok(()),
        Ok(false) => bail!("backend at {} reported problems", settings.api_base),
        Err(err) => bail!("health check against {} failed: {err}", settings.api_base),
    }
}
