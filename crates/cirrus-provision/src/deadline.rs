//! Deadline enforcement for orchestrator API calls.

use std::future::Future;
use std::time::Duration;

use cirrus_common::{Error, Result};

/// Run an orchestrator call under a deadline.
///
/// A timeout is reported distinctly from "not found" or a provisioning
/// failure so callers can tell "didn't answer" from "unknown".
pub(crate) async fn with_deadline<T>(
    what: &str,
    limit: Duration,
    fut: impl Future<Output = std::result::Result<T, kube::Error>> + Send,
) -> Result<T> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(Error::from),
        Err(_) => Err(Error::timeout(format!(
            "{what} did not complete within {limit:?}"
        ))),
    }
}
