//! Optional natural-language commentary on a reservation attempt. Strictly
//! advisory: the deterministic conflict check is the only authority, and a
//! failed or slow annotator must never stall or abort a submission.

use std::time::Duration;

use async_trait::async_trait;

/// Shown when the annotator fails, times out, or is not configured.
pub const FALLBACK_NOTE: &str = "Schedule check completed.";

/// How long a submission waits for commentary before moving on.
pub const ANNOTATION_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub struct AdvisoryError(pub String);

impl std::fmt::Display for AdvisoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "advisory annotation failed: {}", self.0)
    }
}

impl std::error::Error for AdvisoryError {}

/// External commentary service. Receives free-text descriptions of the
/// candidate and the nearby existing reservations; returns free-text
/// commentary.
#[async_trait]
pub trait AdvisoryAnnotator: Send + Sync {
    async fn annotate(
        &self,
        candidate: &str,
        existing_schedule: &str,
    ) -> Result<String, AdvisoryError>;
}

/// Default annotator: no external service, always the fallback note.
pub struct NoopAnnotator;

#[async_trait]
impl AdvisoryAnnotator for NoopAnnotator {
    async fn annotate(&self, _candidate: &str, _existing: &str) -> Result<String, AdvisoryError> {
        Ok(FALLBACK_NOTE.to_string())
    }
}

/// Await commentary under the timeout; swallow every failure mode into the
/// fallback note.
pub(crate) async fn annotate_best_effort(
    annotator: &dyn AdvisoryAnnotator,
    candidate: &str,
    existing_schedule: &str,
) -> String {
    match tokio::time::timeout(
        ANNOTATION_TIMEOUT,
        annotator.annotate(candidate, existing_schedule),
    )
    .await
    {
        Ok(Ok(note)) => note,
        Ok(Err(e)) => {
            tracing::debug!("advisory annotator error: {e}");
            metrics::counter!(crate::observability::ADVISORY_FALLBACKS_TOTAL).increment(1);
            FALLBACK_NOTE.to_string()
        }
        Err(_) => {
            tracing::debug!("advisory annotator timed out");
            metrics::counter!(crate::observability::ADVISORY_FALLBACKS_TOTAL).increment(1);
            FALLBACK_NOTE.to_string()
        }
    }
}
