//! Handlers over the in-memory item store.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::error::AppError;
use crate::extractors::{extract_json, extract_path, extract_query};
use crate::models::{Item, MessageResponse, Pagination};
use crate::AppState;

#[instrument(skip_all, fields(item_id = tracing::field::Empty))]
pub async fn create_item(
    State(state): State<AppState>,
    body: Result<Json<Item>, JsonRejection>,
) -> Result<Json<Item>, AppError> {
    let item = extract_json(body)?;
    tracing::Span::current().record("item_id", item.id);

    let mut items = state.items.write().await;
    let created = items.create(item).map_err(|e| {
        warn!(error = %e, "Rejected item");
        e
    })?;
    state.metrics.set_items_stored(items.len());

    info!(item_name = %created.name, price = created.price, "Created item");
    Ok(Json(created))
}

#[instrument(skip_all)]
pub async fn list_items(
    State(state): State<AppState>,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<Item>>, AppError> {
    let page = extract_query(query)?;
    Ok(Json(state.items.read().await.list(page.skip, page.limit)))
}

#[instrument(skip_all, fields(item_id = tracing::field::Empty))]
pub async fn get_item(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Item>, AppError> {
    let id = extract_path(path)?;
    tracing::Span::current().record("item_id", id);

    let items = state.items.read().await;
    Ok(Json(items.get(id)?.clone()))
}

#[instrument(skip_all, fields(item_id = tracing::field::Empty))]
pub async fn replace_item(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<Item>, JsonRejection>,
) -> Result<Json<Item>, AppError> {
    let id = extract_path(path)?;
    tracing::Span::current().record("item_id", id);
    let item = extract_json(body)?;

    let updated = state.items.write().await.replace(id, item)?;
    info!(new_id = updated.id, "Replaced item");
    Ok(Json(updated))
}

#[instrument(skip_all, fields(item_id = tracing::field::Empty))]
pub async fn patch_item(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<Item>, AppError> {
    let id = extract_path(path)?;
    tracing::Span::current().record("item_id", id);
    let changes = extract_json(body)?;

    let updated = state.items.write().await.patch(id, &changes)?;
    info!(new_id = updated.id, field_count = changes.len(), "Patched item");
    Ok(Json(updated))
}

#[instrument(skip_all, fields(item_id = tracing::field::Empty))]
pub async fn delete_item(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = extract_path(path)?;
    tracing::Span::current().record("item_id", id);

    let mut items = state.items.write().await;
    items.delete(id)?;
    state.metrics.set_items_stored(items.len());

    info!("Deleted item");
    Ok(Json(MessageResponse::new("Item deleted successfully")))
}
