use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use copyforge_core::{
    ai::{ContentAnalyzer, openai_client::OpenAiClient},
    domain::{
        repositories::content::ContentRepository,
        value_objects::{analysis::AnalyzeContentModel, content::CreateContentModel},
    },
    infra::db::{postgres::postgres_connection::PgPoolSquad, repositories::content::ContentPostgres},
};

use crate::{
    auth::AuthUser,
    usecases::{content::ContentUseCase, content_analysis::ContentAnalysisUseCase},
};

pub fn routes(db_pool: Arc<PgPoolSquad>, analyzer: Option<Arc<OpenAiClient>>) -> Router {
    let content_repository = Arc::new(ContentPostgres::new(Arc::clone(&db_pool)));
    let content_usecase = ContentUseCase::new(Arc::clone(&content_repository));
    let analysis_usecase = ContentAnalysisUseCase::new(content_repository, analyzer);

    let content = Router::new()
        .route("/", get(list).post(create))
        .with_state(Arc::new(content_usecase));

    let analysis = Router::new()
        .route("/analyze", post(analyze))
        .with_state(Arc::new(analysis_usecase));

    content.merge(analysis)
}

pub async fn list<C>(
    State(content_usecase): State<Arc<ContentUseCase<C>>>,
    auth: AuthUser,
) -> Response
where
    C: ContentRepository + Send + Sync + 'static,
{
    match content_usecase.list(auth.user_id).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn create<C>(
    State(content_usecase): State<Arc<ContentUseCase<C>>>,
    auth: AuthUser,
    Json(create_content_model): Json<CreateContentModel>,
) -> Response
where
    C: ContentRepository + Send + Sync + 'static,
{
    match content_usecase.create(auth.user_id, create_content_model).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn analyze<C, A>(
    State(analysis_usecase): State<Arc<ContentAnalysisUseCase<C, A>>>,
    auth: AuthUser,
    Json(analyze_content_model): Json<AnalyzeContentModel>,
) -> Response
where
    C: ContentRepository + Send + Sync + 'static,
    A: ContentAnalyzer + Send + Sync + 'static,
{
    match analysis_usecase
        .analyze(auth.user_id, analyze_content_model)
        .await
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => err.into_response(),
    }
}
