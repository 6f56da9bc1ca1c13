use serde::{Deserialize, Serialize};

pub const DEFAULT_ROLE: &str = "user";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Item {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub on_offer: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    DEFAULT_ROLE.to_string()
}

/// `skip`/`limit` query parameters shared by the list endpoints.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Pagination {
    #[serde(default)]
    pub skip: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    10
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            skip: 0,
            limit: default_limit(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}
