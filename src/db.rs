//! SQLite pool, `users` schema and queries.
//!
//! Handlers get a connection through [`DbSession`], which checks one out of
//! the pool when the request is extracted and hands it back when dropped.

use std::str::FromStr;
use std::time::Duration;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};

use crate::error::AppError;
use crate::models::{NewUser, User};
use crate::AppState;

pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    // Every connection to an in-memory database sees its own empty database,
    // so keep exactly one and never let it expire.
    let pool = if database_url.contains(":memory:") {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
    } else {
        SqlitePoolOptions::new().max_connections(max_connections.max(1))
    };

    Ok(pool.connect_with(options).await?)
}

pub async fn init_schema(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            role TEXT NOT NULL DEFAULT 'user'
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS ix_users_name ON users (name)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Request-scoped database connection.
pub struct DbSession(pub PoolConnection<Sqlite>);

#[async_trait]
impl FromRequestParts<AppState> for DbSession {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(DbSession(state.db_pool.acquire().await?))
    }
}

pub async fn find_user_by_email(
    conn: &mut SqliteConnection,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, name, email, role FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(&mut *conn)
        .await
}

pub async fn find_user_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT id, name, email, role FROM users WHERE name = ? ORDER BY id LIMIT 1",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await
}

pub async fn insert_user(conn: &mut SqliteConnection, user: &NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, role)
        VALUES (?, ?, ?)
        RETURNING id, name, email, role
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.role)
    .fetch_one(&mut *conn)
    .await
}

pub async fn list_users(
    conn: &mut SqliteConnection,
    skip: usize,
    limit: usize,
) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT id, name, email, role FROM users ORDER BY id LIMIT ? OFFSET ?")
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(skip).unwrap_or(i64::MAX))
        .fetch_all(&mut *conn)
        .await
}

pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_pool() -> SqlitePool {
        let pool = connect("sqlite::memory:", 5).await.unwrap();
        init_schema(&pool).await.unwrap();
        pool
    }

    async fn count_users(conn: &mut SqliteConnection) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *conn)
            .await
            .unwrap();
        count
    }

    fn new_user(name: &str, email: &str) -> NewUser {
        NewUser {
            name: name.to_string(),
            email: email.to_string(),
            role: "user".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        let alice = insert_user(&mut conn, &new_user("alice", "a@x.com")).await.unwrap();
        assert_eq!(alice.id, 1);
        assert_eq!(alice.role, "user");

        assert_eq!(find_user_by_email(&mut conn, "a@x.com").await.unwrap(), Some(alice.clone()));
        assert_eq!(find_user_by_name(&mut conn, "alice").await.unwrap(), Some(alice));
        assert_eq!(find_user_by_name(&mut conn, "bob").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unique_email_constraint() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();

        insert_user(&mut conn, &new_user("alice", "a@x.com")).await.unwrap();
        let err = insert_user(&mut conn, &new_user("alice2", "a@x.com")).await.unwrap_err();

        assert!(is_unique_violation(&err));
        assert_eq!(count_users(&mut conn).await, 1);
    }

    #[tokio::test]
    async fn test_list_users_paginates_by_id() {
        let pool = memory_pool().await;
        let mut conn = pool.acquire().await.unwrap();
        for n in 0..5 {
            insert_user(&mut conn, &new_user(&format!("u{n}"), &format!("u{n}@x.com")))
                .await
                .unwrap();
        }

        let page = list_users(&mut conn, 1, 2).await.unwrap();
        let names: Vec<&str> = page.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["u1", "u2"]);
        assert!(list_users(&mut conn, 10, 10).await.unwrap().is_empty());
    }
}
