// EC2 instance identity from the instance metadata service.

use std::time::Duration;
use tracing::{info, warn};

/// Instance label used when the metadata service is unreachable.
pub const UNKNOWN_INSTANCE: &str = "NA";

/// Returns the instance id served at `url`, or [`UNKNOWN_INSTANCE`] on any failure.
pub async fn resolve_instance_id(url: &str, timeout: Duration) -> String {
    match fetch_instance_id(url, timeout).await {
        Ok(id) if !id.trim().is_empty() => {
            let id = id.trim().to_string();
            info!(instance = %id, "instance id resolved");
            id
        }
        Ok(_) => {
            warn!(url, "instance metadata returned an empty id; using NA");
            UNKNOWN_INSTANCE.to_string()
        }
        Err(e) => {
            info!(error = %e, url, "instance metadata unavailable; using NA");
            UNKNOWN_INSTANCE.to_string()
        }
    }
}

async fn fetch_instance_id(url: &str, timeout: Duration) -> Result<String, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}
