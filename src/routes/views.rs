//! Greeting and user-info pages.

use axum::extract::Path;
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};

const GUEST_NAME: &str = "Guest";

#[derive(Debug, Serialize, Deserialize)]
pub struct WelcomeResponse {
    pub name: String,
}

pub async fn welcome_guest() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        name: GUEST_NAME.to_string(),
    })
}

pub async fn welcome(Path(name): Path<String>) -> Json<WelcomeResponse> {
    Json(WelcomeResponse { name })
}

pub async fn welcome_page(Path(name): Path<String>) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Welcome</title></head>\n<body>\n<h1>Welcome, {}!</h1>\n</body>\n</html>\n",
        escape_html(&name)
    ))
}

struct UserInfo {
    name: &'static str,
    username: &'static str,
    role: &'static str,
    tasks: &'static [&'static str],
    price: f64,
}

const DEMO_USER: UserInfo = UserInfo {
    name: "Hong Gildong",
    username: "hong",
    role: "staff",
    tasks: &["Notices", "Settings", "Log out"],
    price: 12345.6789,
};

pub async fn user_info() -> Html<String> {
    Html(render_user_info(&DEMO_USER))
}

fn render_user_info(user: &UserInfo) -> String {
    let tasks: String = user
        .tasks
        .iter()
        .map(|task| format!("    <li>{}</li>\n", escape_html(task)))
        .collect();

    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>User info</title></head>\n<body>\n\
         <h1>{name} ({username})</h1>\n<p>Role: {role}</p>\n<ul>\n{tasks}</ul>\n\
         <p>Price: {price:.2}</p>\n</body>\n</html>\n",
        name = escape_html(user.name),
        username = escape_html(user.username),
        role = escape_html(user.role),
        tasks = tasks,
        price = user.price,
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
