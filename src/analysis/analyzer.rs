use async_trait::async_trait;
use std::sync::Arc;

use crate::analysis::result::AnalysisResult;

/// External AI-scoring collaborator, consumed as an opaque seam.
///
/// Infallible by contract: implementations degrade to
/// `AnalysisResult::fallback()` instead of surfacing transport or parse
/// errors, so a flaky analyzer can never wedge the submission flow.
#[async_trait]
pub trait Analyzer: Send + Sync + 'static {
    /// Produces a verdict for submitted content in the given subject
    async fn analyze(&self, content: &str, subject: &str, title: Option<&str>) -> AnalysisResult;
}

#[async_trait]
impl<T: Analyzer + ?Sized> Analyzer for Arc<T> {
    async fn analyze(&self, content: &str, subject: &str, title: Option<&str>) -> AnalysisResult {
        (**self).analyze(content, subject, title).await
    }
}
