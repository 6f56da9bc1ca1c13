//! Route registration.
//!
//! Every endpoint is listed once in [`route_table`]; [`build_router`] folds the
//! table into a single router at startup.

pub mod health;
pub mod items;
pub mod users;
pub mod views;

use axum::routing::{get, post, MethodRouter};
use axum::Router;

use crate::telemetry::http_tracing_middleware;
use crate::AppState;

pub fn route_table() -> Vec<(&'static str, MethodRouter<AppState>)> {
    vec![
        ("/", get(health::health)),
        ("/health", get(health::health)),
        ("/metrics", get(health::metrics)),
        ("/items/", post(items::create_item).get(items::list_items)),
        ("/items", post(items::create_item).get(items::list_items)),
        (
            "/items/:id",
            get(items::get_item)
                .put(items::replace_item)
                .patch(items::patch_item)
                .delete(items::delete_item),
        ),
        ("/users/", post(users::create_user).get(users::list_users)),
        ("/users", post(users::create_user).get(users::list_users)),
        ("/profile", get(users::read_profile)),
        ("/admin", get(users::read_admin)),
        ("/welcome/", get(views::welcome_guest)),
        ("/welcome", get(views::welcome_guest)),
        ("/welcome/:name", get(views::welcome)),
        ("/welcome/welcome2/:name", get(views::welcome_page)),
        ("/user/userinfo", get(views::user_info)),
    ]
}

pub fn build_router(state: AppState) -> Router {
    route_table()
        .into_iter()
        .fold(Router::new(), |router, (path, handler)| router.route(path, handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            http_tracing_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_route_table_paths_are_unique() {
        let table = route_table();
        let paths: HashSet<&str> = table.iter().map(|(path, _)| *path).collect();
        assert_eq!(paths.len(), table.len());
        assert!(paths.contains("/items/:id"));
        assert!(paths.contains("/admin"));
        for collection in ["/items", "/users", "/welcome"] {
            assert!(paths.contains(collection), "{collection}");
            assert!(paths.contains(format!("{collection}/").as_str()), "{collection}/");
        }
    }
}
