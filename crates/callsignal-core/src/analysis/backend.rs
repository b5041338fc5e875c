//! Seam for remote analysis collaborators.

use async_trait::async_trait;

use super::model::{AnalysisOutcome, AnalysisRequest};

/// A remote service able to analyse transcript text.
///
/// Implementations never return transport or parse errors to the caller:
/// every failure is reported as [`AnalysisOutcome::FallbackRequired`].
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    async fn analyze(&self, request: &AnalysisRequest) -> AnalysisOutcome;
}
