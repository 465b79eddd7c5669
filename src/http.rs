use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::errors::Error;
use crate::store::{ItemStore, LookupStore};
use crate::{ItemDraft, ItemEngine};

pub struct AppState<S: ItemStore, L: LookupStore> {
    engine: Arc<ItemEngine<S, L>>,
}

impl<S: ItemStore, L: LookupStore> Clone for AppState<S, L> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
        }
    }
}

/// REST surface over the engine: items CRUD + search plus the two lookup
/// listings the dashboard populates its filters from.
pub fn router<S, L>(engine: Arc<ItemEngine<S, L>>) -> Router
where
    S: ItemStore + 'static,
    L: LookupStore + 'static,
{
    Router::new()
        .route("/api/items", get(list_items::<S, L>).post(create_item::<S, L>))
        .route("/api/items/search", get(search_items::<S, L>))
        .route(
            "/api/items/:id",
            get(get_item::<S, L>)
                .put(update_item::<S, L>)
                .delete(delete_item::<S, L>),
        )
        .route("/api/types", get(list_types::<S, L>))
        .route("/api/categories", get(list_categories::<S, L>))
        .layer(CorsLayer::permissive())
        .with_state(AppState { engine })
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
}

#[derive(Deserialize)]
struct CategoryParams {
    #[serde(rename = "typeId")]
    type_id: Option<i32>,
}

async fn list_items<S: ItemStore, L: LookupStore>(
    State(state): State<AppState<S, L>>,
) -> Result<Response, Error> {
    let items = state.engine.list_items().await?;
    Ok(Json(items).into_response())
}

async fn get_item<S: ItemStore, L: LookupStore>(
    State(state): State<AppState<S, L>>,
    Path(id): Path<i32>,
) -> Result<Response, Error> {
    match state.engine.get_item(id).await? {
        Some(item) => Ok(Json(item).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

async fn search_items<S: ItemStore, L: LookupStore>(
    State(state): State<AppState<S, L>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, Error> {
    let items = state.engine.search_items(&params.query).await?;
    Ok(Json(items).into_response())
}

async fn create_item<S: ItemStore, L: LookupStore>(
    State(state): State<AppState<S, L>>,
    Json(draft): Json<ItemDraft>,
) -> Result<Response, Error> {
    draft.validate()?;
    let created = state.engine.create_item(draft).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn update_item<S: ItemStore, L: LookupStore>(
    State(state): State<AppState<S, L>>,
    Path(id): Path<i32>,
    Json(draft): Json<ItemDraft>,
) -> Result<Response, Error> {
    draft.validate()?;
    match state.engine.update_item(id, draft).await? {
        Some(item) => Ok(Json(item).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

async fn delete_item<S: ItemStore, L: LookupStore>(
    State(state): State<AppState<S, L>>,
    Path(id): Path<i32>,
) -> Result<Response, Error> {
    if state.engine.delete_item(id).await? {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok(StatusCode::NOT_FOUND.into_response())
    }
}

async fn list_types<S: ItemStore, L: LookupStore>(
    State(state): State<AppState<S, L>>,
) -> Result<Response, Error> {
    let types = state.engine.lookups().all_types().await?;
    Ok(Json(types).into_response())
}

async fn list_categories<S: ItemStore, L: LookupStore>(
    State(state): State<AppState<S, L>>,
    Query(params): Query<CategoryParams>,
) -> Result<Response, Error> {
    let categories = match params.type_id {
        Some(type_id) => state.engine.lookups().categories_by_type(type_id).await?,
        None => state.engine.lookups().all_categories().await?,
    };
    Ok(Json(categories).into_response())
}

fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::Conflict(_) => StatusCode::CONFLICT,
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
