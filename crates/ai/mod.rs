pub mod openai_client;

use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::analysis::AnalysisResults;

/// Scores a piece of writing for SEO, readability and engagement.
#[automock]
#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    async fn analyze(&self, text: &str) -> Result<AnalysisResults>;
}
