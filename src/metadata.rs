// metadata.rs - Client side of the family lookup service
use backoff::{future::retry, ExponentialBackoff};
use std::time::Duration;

use crate::types::CharacterRecord;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("lookup request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("lookup service returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Fetch the character records registered for a family.
///
/// One GET against the lookup service. A non-success status becomes
/// `FetchError::Status` so the orchestrator can stop the run instead of
/// feeding an error shape into the next stage.
pub async fn fetch_characters(
    base_url: &str,
    family_name: &str,
) -> Result<Vec<CharacterRecord>, FetchError> {
    let response = reqwest::Client::new()
        .get(format!("{}/mcp", base_url))
        .query(&[("family_name", family_name)])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(FetchError::Status {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response.json::<Vec<CharacterRecord>>().await?)
}

/// Wait until the lookup service answers its health check.
///
/// Replaces a fixed startup sleep: `/health` is retried with exponential
/// backoff until it responds or `timeout` elapses.
pub async fn wait_until_ready(base_url: &str, timeout: Duration) -> Result<(), FetchError> {
    let backoff_config = ExponentialBackoff {
        initial_interval: Duration::from_millis(100),
        max_interval: Duration::from_secs(2),
        max_elapsed_time: Some(timeout),
        ..Default::default()
    };

    let url = format!("{}/health", base_url);
    let client = reqwest::Client::new();

    retry(backoff_config, || async {
        let response = client
            .get(&url)
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .map_err(|e| backoff::Error::transient(FetchError::Http(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(backoff::Error::transient(FetchError::Status {
                status: status.as_u16(),
                body: String::new(),
            }));
        }

        Ok(())
    })
    .await
}
