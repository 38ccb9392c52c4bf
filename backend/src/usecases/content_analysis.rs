use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use copyforge_core::{
    ai::ContentAnalyzer,
    domain::{
        entities::content::UpdateContentAnalysisEntity,
        repositories::content::ContentRepository,
        value_objects::analysis::{
            AnalysisResults, AnalyzeContentDto, AnalyzeContentModel, MIN_ANALYSIS_TEXT_LENGTH,
        },
    },
};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("content not found or access denied")]
    ContentNotFound,
    #[error("AI analysis service is not configured")]
    NotConfigured,
    #[error("failed to analyze content")]
    AnalysisFailed(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AnalysisError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalysisError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AnalysisError::ContentNotFound => StatusCode::NOT_FOUND,
            AnalysisError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
            AnalysisError::AnalysisFailed(_) | AnalysisError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, AnalysisError>;

pub struct ContentAnalysisUseCase<C, A>
where
    C: ContentRepository + Send + Sync + 'static,
    A: ContentAnalyzer + Send + Sync + 'static,
{
    content_repo: Arc<C>,
    /// `None` when no API key is configured.
    analyzer: Option<Arc<A>>,
}

impl<C, A> ContentAnalysisUseCase<C, A>
where
    C: ContentRepository + Send + Sync + 'static,
    A: ContentAnalyzer + Send + Sync + 'static,
{
    pub fn new(content_repo: Arc<C>, analyzer: Option<Arc<A>>) -> Self {
        Self {
            content_repo,
            analyzer,
        }
    }

    pub async fn analyze(
        &self,
        user_id: Uuid,
        model: AnalyzeContentModel,
    ) -> UseCaseResult<AnalyzeContentDto> {
        let (content_id, text) = validate(model)?;

        let owned = self
            .content_repo
            .is_owned_by(content_id, user_id)
            .await
            .map_err(|err| {
                error!(%user_id, %content_id, db_error = ?err, "content_analysis: failed to verify content access");
                AnalysisError::Internal(err)
            })?;
        if !owned {
            return Err(AnalysisError::ContentNotFound);
        }

        let Some(analyzer) = self.analyzer.as_ref() else {
            warn!("content_analysis: OPENAI_API_KEY is not configured");
            return Err(AnalysisError::NotConfigured);
        };

        let analysis = analyzer.analyze(&text).await.map_err(|err| {
            error!(%content_id, ai_error = ?err, "content_analysis: analysis failed");
            AnalysisError::AnalysisFailed(err)
        })?;

        self.content_repo
            .save_analysis(content_id, analysis_changeset(&analysis)?)
            .await
            .map_err(|err| {
                error!(%content_id, db_error = ?err, "content_analysis: failed to save analysis");
                AnalysisError::Internal(err)
            })?;

        info!(%user_id, %content_id, "content_analysis: analysis stored");
        Ok(AnalyzeContentDto {
            success: true,
            analysis,
        })
    }
}

fn validate(model: AnalyzeContentModel) -> UseCaseResult<(Uuid, String)> {
    let content_id = model
        .id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id).ok())
        .ok_or_else(|| AnalysisError::InvalidInput("Invalid Content ID format".to_string()))?;

    let text = model
        .text
        .filter(|text| text.chars().count() >= MIN_ANALYSIS_TEXT_LENGTH)
        .ok_or_else(|| {
            AnalysisError::InvalidInput(format!(
                "Text must be at least {MIN_ANALYSIS_TEXT_LENGTH} characters long"
            ))
        })?;

    Ok((content_id, text))
}

fn analysis_changeset(analysis: &AnalysisResults) -> UseCaseResult<UpdateContentAnalysisEntity> {
    let section = |value| serde_json::to_value(value).map_err(anyhow::Error::from);

    Ok(UpdateContentAnalysisEntity {
        seo_analysis: Some(section(&analysis.seo)?),
        readability_analysis: Some(section(&analysis.readability)?),
        engagement_analysis: Some(section(&analysis.engagement)?),
        updated_at: Utc::now(),
    })
}
