//! User table endpoints and the token-gated profile/admin views.

use std::time::Instant;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use sqlx::Connection;
use tracing::{info, instrument, warn};

use crate::auth::{AdminUser, CurrentUser};
use crate::db::{self, DbSession};
use crate::error::AppError;
use crate::extractors::{extract_json, extract_query};
use crate::models::{MessageResponse, NewUser, Pagination, User};
use crate::AppState;

const EMAIL_TAKEN: &str = "Email already registered";

#[instrument(skip_all, fields(user_name = tracing::field::Empty))]
pub async fn create_user(
    State(state): State<AppState>,
    DbSession(mut conn): DbSession,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let input = extract_json(body)?;
    tracing::Span::current().record("user_name", input.name.as_str());
    let db_start = Instant::now();

    // Dropping the transaction on any early return rolls it back.
    let mut tx = conn.begin().await?;
    if db::find_user_by_email(&mut tx, &input.email).await?.is_some() {
        warn!("Email already registered");
        return Err(AppError::Conflict(EMAIL_TAKEN.to_string()));
    }
    let user = db::insert_user(&mut tx, &input).await.map_err(insert_error)?;
    tx.commit().await?;

    state.metrics.observe_db(db_start.elapsed());
    info!(user_id = user.id, role = %user.role, "Created user");
    Ok(Json(user))
}

// The email check above runs in the same transaction, but the UNIQUE
// constraint still has the final word.
fn insert_error(err: sqlx::Error) -> AppError {
    if db::is_unique_violation(&err) {
        warn!("Email already registered (constraint)");
        AppError::Conflict(EMAIL_TAKEN.to_string())
    } else {
        AppError::from(err)
    }
}

#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    DbSession(mut conn): DbSession,
    query: Result<Query<Pagination>, QueryRejection>,
) -> Result<Json<Vec<User>>, AppError> {
    let page = extract_query(query)?;
    let db_start = Instant::now();
    let users = db::list_users(&mut conn, page.skip, page.limit).await?;
    state.metrics.observe_db(db_start.elapsed());
    Ok(Json(users))
}

#[instrument(skip_all, fields(user_id = user.id))]
pub async fn read_profile(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

#[instrument(skip_all, fields(user_id = admin.id))]
pub async fn read_admin(AdminUser(admin): AdminUser) -> Json<MessageResponse> {
    Json(MessageResponse::new(format!(
        "Welcome, {}! You have admin access.",
        admin.name
    )))
}
