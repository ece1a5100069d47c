//! Page routes

use crate::api::handlers::{
    add_article_page, delete_article, edit_article_page, list_articles, save_article,
    show_article, update_article, AppState,
};
use crate::auth::handlers::{login, login_page, logout, register, register_page};
use crate::auth::middleware::{ensure_authenticated, resolve_session};
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

/// Article routes; mounted at both `/` and `/article`
fn article_routes() -> Router<AppState> {
    let protected = Router::new()
        .route("/add_article", get(add_article_page))
        .route("/save_article", post(save_article))
        .route("/edit/:id", get(edit_article_page).post(update_article))
        .route("/delete/:id", delete(delete_article))
        .route_layer(middleware::from_fn(ensure_authenticated));

    Router::new()
        .route("/", get(list_articles))
        .route("/:id", get(show_article))
        .merge(protected)
}

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_page).post(register))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout))
}

/// Build every page route, with the caller's session resolved first
pub fn build_routes(state: AppState) -> Router {
    let articles = article_routes();

    Router::new()
        .merge(articles.clone())
        .nest("/article", articles)
        .nest("/user", user_routes())
        .layer(middleware::from_fn_with_state(state.clone(), resolve_session))
        .with_state(state)
}
