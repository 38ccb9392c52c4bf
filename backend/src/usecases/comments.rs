use std::sync::Arc;

use copyforge_core::domain::{
    entities::comments::InsertCommentEntity,
    repositories::{comments::CommentRepository, content::ContentRepository},
    value_objects::comments::{CommentDto, CreateCommentModel},
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::content::{ContentError, UseCaseResult};

/// Comments on content. Only the content owner may read or write them.
pub struct CommentUseCase<Cm, C>
where
    Cm: CommentRepository + Send + Sync + 'static,
    C: ContentRepository + Send + Sync + 'static,
{
    comment_repo: Arc<Cm>,
    content_repo: Arc<C>,
}

impl<Cm, C> CommentUseCase<Cm, C>
where
    Cm: CommentRepository + Send + Sync + 'static,
    C: ContentRepository + Send + Sync + 'static,
{
    pub fn new(comment_repo: Arc<Cm>, content_repo: Arc<C>) -> Self {
        Self {
            comment_repo,
            content_repo,
        }
    }

    async fn ensure_visible(&self, user_id: Uuid, content_id: Uuid) -> UseCaseResult<()> {
        let owned = self
            .content_repo
            .is_owned_by(content_id, user_id)
            .await
            .map_err(|err| {
                error!(%user_id, %content_id, db_error = ?err, "comments: failed to check content access");
                ContentError::Internal(err)
            })?;

        if !owned {
            warn!(%user_id, %content_id, "comments: content not visible to caller");
            return Err(ContentError::NotAccessible);
        }
        Ok(())
    }

    pub async fn list(&self, user_id: Uuid, content_id: Uuid) -> UseCaseResult<Vec<CommentDto>> {
        self.ensure_visible(user_id, content_id).await?;

        let comments = self
            .comment_repo
            .list_by_content_id(content_id)
            .await
            .map_err(|err| {
                error!(%content_id, db_error = ?err, "comments: failed to list comments");
                ContentError::Internal(err)
            })?;

        Ok(comments.into_iter().map(CommentDto::from).collect())
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        content_id: Uuid,
        model: CreateCommentModel,
    ) -> UseCaseResult<CommentDto> {
        let comment_text = model
            .comment_text
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ContentError::InvalidInput("Comment text cannot be empty".to_string()))?;

        self.ensure_visible(user_id, content_id).await?;

        let created = self
            .comment_repo
            .create(InsertCommentEntity {
                content_id,
                user_id,
                comment_text,
                parent_comment_id: model.parent_comment_id,
            })
            .await
            .map_err(|err| {
                error!(%user_id, %content_id, db_error = ?err, "comments: failed to create comment");
                ContentError::Internal(err)
            })?;

        info!(%user_id, %content_id, comment_id = %created.comment.id, "comments: created");
        Ok(CommentDto::from(created))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::Utc;
    use copyforge_core::domain::{
        entities::comments::{CommentAuthorEntity, CommentEntity, CommentWithAuthorEntity},
        repositories::{comments::MockCommentRepository, content::MockContentRepository},
    };
    use mockall::predicate::eq;

    use super::*;

    fn owned(content_id: Uuid, user_id: Uuid, result: bool) -> MockContentRepository {
        let mut content_repo = MockContentRepository::new();
        content_repo
            .expect_is_owned_by()
            .with(eq(content_id), eq(user_id))
            .returning(move |_, _| Ok(result));
        content_repo
    }

    fn comment(content_id: Uuid, user_id: Uuid, text: &str) -> CommentWithAuthorEntity {
        CommentWithAuthorEntity {
            comment: CommentEntity {
                id: Uuid::new_v4(),
                content_id,
                user_id,
                comment_text: text.to_string(),
                parent_comment_id: None,
                created_at: Utc::now(),
            },
            author: Some(CommentAuthorEntity {
                id: user_id,
                full_name: Some("Ada Writer".to_string()),
                avatar_url: None,
            }),
        }
    }

    #[tokio::test]
    async fn lists_comments_with_authors_for_the_owner() {
        let user_id = Uuid::new_v4();
        let content_id = Uuid::new_v4();
        let rows = vec![comment(content_id, user_id, "first"), comment(content_id, user_id, "second")];

        let mut comment_repo = MockCommentRepository::new();
        comment_repo
            .expect_list_by_content_id()
            .with(eq(content_id))
            .returning(move |_| Ok(rows.clone()));

        let comments = CommentUseCase::new(
            Arc::new(comment_repo),
            Arc::new(owned(content_id, user_id, true)),
        )
        .list(user_id, content_id)
        .await
        .unwrap();

        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].comment_text, "first");
        assert_eq!(
            comments[0].author.as_ref().and_then(|a| a.full_name.as_deref()),
            Some("Ada Writer")
        );
    }

    #[tokio::test]
    async fn other_users_content_is_forbidden() {
        let user_id = Uuid::new_v4();
        let content_id = Uuid::new_v4();

        let err = CommentUseCase::new(
            Arc::new(MockCommentRepository::new()),
            Arc::new(owned(content_id, user_id, false)),
        )
        .list(user_id, content_id)
        .await
        .unwrap_err();

        assert!(matches!(err, ContentError::NotAccessible));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn creates_a_reply() {
        let user_id = Uuid::new_v4();
        let content_id = Uuid::new_v4();
        let parent = Uuid::new_v4();

        let mut comment_repo = MockCommentRepository::new();
        comment_repo
            .expect_create()
            .withf(move |entity| {
                entity.comment_text == "Nice intro"
                    && entity.parent_comment_id == Some(parent)
                    && entity.user_id == user_id
            })
            .times(1)
            .returning(move |entity| Ok(comment(entity.content_id, entity.user_id, &entity.comment_text)));

        let created = CommentUseCase::new(
            Arc::new(comment_repo),
            Arc::new(owned(content_id, user_id, true)),
        )
        .create(
            user_id,
            content_id,
            CreateCommentModel {
                comment_text: Some(" Nice intro ".to_string()),
                parent_comment_id: Some(parent),
            },
        )
        .await
        .unwrap();

        assert_eq!(created.comment_text, "Nice intro");
    }

    #[tokio::test]
    async fn empty_comment_is_rejected() {
        let err = CommentUseCase::new(
            Arc::new(MockCommentRepository::new()),
            Arc::new(MockContentRepository::new()),
        )
        .create(
            Uuid::new_v4(),
            Uuid::new_v4(),
            CreateCommentModel {
                comment_text: Some("  ".to_string()),
                parent_comment_id: None,
            },
        )
        .await
        .unwrap_err();

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
