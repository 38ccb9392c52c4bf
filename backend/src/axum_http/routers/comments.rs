use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use copyforge_core::{
    domain::{
        repositories::{comments::CommentRepository, content::ContentRepository},
        value_objects::comments::CreateCommentModel,
    },
    infra::db::{
        postgres::postgres_connection::PgPoolSquad,
        repositories::{comments::CommentPostgres, content::ContentPostgres},
    },
};
use uuid::Uuid;

use crate::{auth::AuthUser, usecases::comments::CommentUseCase};

pub fn routes(db_pool: Arc<PgPoolSquad>) -> Router {
    let comment_repository = CommentPostgres::new(Arc::clone(&db_pool));
    let content_repository = ContentPostgres::new(Arc::clone(&db_pool));
    let comment_usecase =
        CommentUseCase::new(Arc::new(comment_repository), Arc::new(content_repository));

    Router::new()
        .route("/:content_id/comments", get(list).post(create))
        .with_state(Arc::new(comment_usecase))
}

pub async fn list<Cm, C>(
    State(comment_usecase): State<Arc<CommentUseCase<Cm, C>>>,
    auth: AuthUser,
    Path(content_id): Path<Uuid>,
) -> Response
where
    Cm: CommentRepository + Send + Sync + 'static,
    C: ContentRepository + Send + Sync + 'static,
{
    match comment_usecase.list(auth.user_id, content_id).await {
        Ok(comments) => (StatusCode::OK, Json(comments)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn create<Cm, C>(
    State(comment_usecase): State<Arc<CommentUseCase<Cm, C>>>,
    auth: AuthUser,
    Path(content_id): Path<Uuid>,
    Json(create_comment_model): Json<CreateCommentModel>,
) -> Response
where
    Cm: CommentRepository + Send + Sync + 'static,
    C: ContentRepository + Send + Sync + 'static,
{
    match comment_usecase
        .create(auth.user_id, content_id, create_comment_model)
        .await
    {
        Ok(comment) => (StatusCode::CREATED, Json(comment)).into_response(),
        Err(err) => err.into_response(),
    }
}
