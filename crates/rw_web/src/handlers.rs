use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rw_core::{Article, ArticleFields};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ApiError;
use crate::AppState;

type ApiResult<T> = std::result::Result<T, ApiError>;

pub async fn list_articles(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Article>>> {
    Ok(Json(state.storage.list().await?))
}

pub async fn create_article(
    State(state): State<Arc<AppState>>,
    Json(fields): Json<ArticleFields>,
) -> ApiResult<impl IntoResponse> {
    let article = state.storage.create(fields).await?;
    tracing::info!("🆕 Created article {} ({})", article.id, article.source_url);
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn get_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Article>> {
    Ok(Json(state.storage.get(id).await?))
}

pub async fn update_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(fields): Json<ArticleFields>,
) -> ApiResult<Json<Article>> {
    let article = state.storage.update(id, fields).await?;
    tracing::info!("📝 Updated article {}", article.id);
    Ok(Json(article))
}

pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    state.storage.delete(id).await?;
    tracing::info!("🗑️ Deleted article {}", id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
