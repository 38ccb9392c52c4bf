use std::sync::Arc;

use axum::http::StatusCode;
use copyforge_core::domain::{
    entities::content::InsertContentEntity,
    repositories::content::ContentRepository,
    value_objects::{
        content::{
            ContentSummaryDto, CreateContentModel, CreatedContentDto, MAX_TITLE_LENGTH,
            empty_editor_document,
        },
        enums::content_statuses::ContentStatus,
    },
};
use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("content not found or access denied")]
    NotAccessible,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ContentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ContentError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ContentError::NotAccessible => StatusCode::FORBIDDEN,
            ContentError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type UseCaseResult<T> = std::result::Result<T, ContentError>;

pub struct ContentUseCase<C>
where
    C: ContentRepository + Send + Sync + 'static,
{
    content_repo: Arc<C>,
}

impl<C> ContentUseCase<C>
where
    C: ContentRepository + Send + Sync + 'static,
{
    pub fn new(content_repo: Arc<C>) -> Self {
        Self { content_repo }
    }

    pub async fn list(&self, user_id: Uuid) -> UseCaseResult<Vec<ContentSummaryDto>> {
        let items = self
            .content_repo
            .list_by_user_id(user_id)
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "content: failed to list content");
                ContentError::Internal(err)
            })?;

        info!(%user_id, count = items.len(), "content: listed");
        Ok(items.into_iter().map(ContentSummaryDto::from).collect())
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        model: CreateContentModel,
    ) -> UseCaseResult<CreatedContentDto> {
        let title = model
            .title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty())
            .ok_or_else(|| ContentError::InvalidInput("Title is required".to_string()))?;

        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(ContentError::InvalidInput(format!(
                "Title must be at most {MAX_TITLE_LENGTH} characters"
            )));
        }

        let id = self
            .content_repo
            .create(InsertContentEntity {
                user_id,
                title,
                body: model.body.unwrap_or_else(empty_editor_document),
                status: ContentStatus::Draft.to_string(),
            })
            .await
            .map_err(|err| {
                error!(%user_id, db_error = ?err, "content: failed to create content");
                ContentError::Internal(err)
            })?;

        info!(%user_id, content_id = %id, "content: created");
        Ok(CreatedContentDto { id })
    }
}

#[cfg(test)]
mod tests {
    use copyforge_core::domain::repositories::content::MockContentRepository;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn create_trims_title_and_defaults_to_an_empty_draft() {
        let user_id = Uuid::new_v4();
        let content_id = Uuid::new_v4();

        let mut content_repo = MockContentRepository::new();
        content_repo
            .expect_create()
            .withf(move |entity| {
                entity.user_id == user_id
                    && entity.title == "Launch post"
                    && entity.status == "draft"
                    && entity.body == json!({ "type": "doc", "content": [] })
            })
            .times(1)
            .returning(move |_| Ok(content_id));

        let created = ContentUseCase::new(Arc::new(content_repo))
            .create(
                user_id,
                CreateContentModel {
                    title: Some("  Launch post ".to_string()),
                    body: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(created.id, content_id);
    }

    #[tokio::test]
    async fn create_rejects_blank_or_oversized_titles() {
        let usecase = ContentUseCase::new(Arc::new(MockContentRepository::new()));

        for title in [None, Some("   ".to_string()), Some("x".repeat(MAX_TITLE_LENGTH + 1))] {
            let err = usecase
                .create(Uuid::new_v4(), CreateContentModel { title, body: None })
                .await
                .unwrap_err();
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn create_keeps_a_supplied_body() {
        let body = json!({ "type": "doc", "content": [{ "type": "paragraph" }] });
        let expected = body.clone();

        let mut content_repo = MockContentRepository::new();
        content_repo
            .expect_create()
            .withf(move |entity| entity.body == expected)
            .returning(|_| Ok(Uuid::new_v4()));

        let result = ContentUseCase::new(Arc::new(content_repo))
            .create(
                Uuid::new_v4(),
                CreateContentModel {
                    title: Some("Draft".to_string()),
                    body: Some(body),
                },
            )
            .await;

        assert!(result.is_ok());
    }
}
