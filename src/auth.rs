//! Token-to-user resolution and role gating.
//!
//! The token is the plain user name; there is no credential check beyond an
//! equality lookup. Handlers opt in by taking [`CurrentUser`] or
//! [`AdminUser`] as a parameter. A failed extraction short-circuits the
//! handler with 401 or 403.

use axum::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::db;
use crate::error::AppError;
use crate::extractors::extract_query;
use crate::models::User;
use crate::AppState;

pub const ADMIN_ROLE: &str = "admin";

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Looks up the user whose name equals `token`.
pub async fn resolve_identity(conn: &mut SqliteConnection, token: &str) -> Result<User, AppError> {
    match db::find_user_by_name(conn, token).await? {
        Some(user) => Ok(user),
        None => {
            warn!("Token did not resolve to a user");
            Err(invalid_credentials())
        }
    }
}

pub fn require_role(identity: &User, role: &str) -> Result<(), AppError> {
    if identity.role == role {
        Ok(())
    } else {
        warn!(user_id = identity.id, required = role, actual = %identity.role, "Role check failed");
        Err(AppError::Forbidden(
            "You do not have permission to access this resource".to_string(),
        ))
    }
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid authentication credentials".to_string())
}

/// Caller resolved from the `token` query parameter.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(resolved) = parts.extensions.get::<CurrentUser>() {
            return Ok(resolved.clone());
        }

        let query = extract_query(Query::<TokenQuery>::from_request_parts(parts, state).await)?;
        let token = query.token.ok_or_else(invalid_credentials)?;

        let user = {
            let mut conn = state.db_pool.acquire().await?;
            resolve_identity(&mut conn, &token).await?
        };
        debug!(user_id = user.id, "Resolved caller identity");

        let current = CurrentUser(user);
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

/// Caller that passed [`CurrentUser`] resolution and holds the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        require_role(&user, ADMIN_ROLE)?;
        Ok(AdminUser(user))
    }
}
