use crate::db::models::Article;
use serde::{Deserialize, Serialize};

/// Article form (`POST /save_article`, `POST /edit/:id`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticleForm {
    #[serde(default)]
    pub title: String,
    /// Ignored; articles are always authored by the logged-in user
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// Article fields handed to the article service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArticleRequest {
    pub title: String,
    pub author: String,
    pub content: String,
}

impl ArticleForm {
    /// Build a request authored by `author`
    pub fn authored_by(self, author: &str) -> ArticleRequest {
        ArticleRequest {
            title: self.title,
            author: author.to_string(),
            content: self.content,
        }
    }
}

/// Placeholder article shown on the home page
#[derive(Debug, Serialize)]
pub struct DefaultArticle {
    pub id: u32,
    pub title: &'static str,
    pub content: &'static str,
}

pub fn default_articles() -> Vec<DefaultArticle> {
    vec![DefaultArticle {
        id: 0,
        title: "The Code Ground",
        content: "This id default Article",
    }]
}

/// Data for the `home` page
#[derive(Debug, Serialize)]
pub struct HomePage {
    pub default_articles: Vec<DefaultArticle>,
    pub articles: Vec<Article>,
}

/// Data for the `article` and `edit_article` pages
#[derive(Debug, Serialize)]
pub struct ArticlePage {
    pub article: Article,
}

/// Data for a form page re-rendered after a failed submission
#[derive(Debug, Serialize)]
pub struct ArticleFormPage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub article: ArticleRequest,
}
