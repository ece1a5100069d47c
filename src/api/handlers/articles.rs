//! Article page and form handlers

use crate::api::flash::{Flash, FlashRedirect};
use crate::api::handlers::AppState;
use crate::api::models::{
    default_articles, ArticleForm, ArticleFormPage, ArticlePage, HomePage,
};
use crate::api::views::Page;
use crate::auth::middleware::{AuthUser, CurrentUser};
use crate::core::error::{BoardError, Result};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Form,
};

/// Handler for GET / - list every article
pub async fn list_articles(
    State(state): State<AppState>,
    user: CurrentUser,
    flash: Flash,
) -> Result<Response> {
    let articles = state.article_service.list_all().await?;
    tracing::debug!(count = articles.len(), "Listing articles");

    Ok(Page::new("home", "Article List")
        .with_data(HomePage {
            default_articles: default_articles(),
            articles,
        })
        .render(&user, flash))
}

/// Handler for GET /add_article
pub async fn add_article_page(user: CurrentUser, flash: Flash) -> Response {
    Page::new("add_article", "Add Article").render(&user, flash)
}

/// Handler for POST /save_article
pub async fn save_article(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    flash: Flash,
    Form(form): Form<ArticleForm>,
) -> Result<Response> {
    let request = form.authored_by(&user.username);

    match state.article_service.create(&request).await {
        Ok(_) => Ok(FlashRedirect::to("/").success("Article is saved.").into_response()),
        Err(BoardError::Validation(errors)) => Ok(Page::new("add_article", "Add Article")
            .with_data(ArticleFormPage {
                id: None,
                article: request,
            })
            .with_errors(errors)
            .render(&CurrentUser(Some(user)), flash)),
        Err(e) => Err(e),
    }
}

/// Handler for GET /:id
pub async fn show_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    user: CurrentUser,
    flash: Flash,
) -> Result<Response> {
    let article = state.article_service.get_by_id(&id).await?;

    Ok(Page::new("article", article.title.clone())
        .with_data(ArticlePage { article })
        .render(&user, flash))
}

/// Handler for GET /edit/:id - only the author gets the form
pub async fn edit_article_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AuthUser(user): AuthUser,
    flash: Flash,
) -> Result<Response> {
    let article = state.article_service.get_owned(&id, &user.username).await?;

    Ok(Page::new("edit_article", "Edit Article")
        .with_data(ArticlePage { article })
        .render(&CurrentUser(Some(user)), flash))
}

/// Handler for POST /edit/:id
pub async fn update_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AuthUser(user): AuthUser,
    flash: Flash,
    Form(form): Form<ArticleForm>,
) -> Result<Response> {
    let request = form.authored_by(&user.username);

    match state.article_service.update(&id, &request, &user.username).await {
        Ok(_) => Ok(FlashRedirect::to("/").success("Article is updated.").into_response()),
        Err(BoardError::Validation(errors)) => Ok(Page::new("edit_article", "Edit Article")
            .with_data(ArticleFormPage {
                id: Some(id),
                article: request,
            })
            .with_errors(errors)
            .render(&CurrentUser(Some(user)), flash)),
        Err(e) => Err(e),
    }
}

/// Handler for DELETE /delete/:id
pub async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AuthUser(user): AuthUser,
) -> Result<&'static str> {
    state.article_service.delete(&id, &user.username).await?;
    Ok("Deleted.")
}
