//! Business logic services
//!
//! This module implements the application layer that sits between the HTTP
//! handlers and the repositories: registration and login, session lookup, and
//! ownership-checked article management.

use crate::api::models::ArticleRequest;
use crate::auth::jwt::generate_token;
use crate::auth::models::{RegisterRequest, SessionUser};
use crate::auth::password::PasswordHasher;
use crate::core::error::{BoardError, Result};
use crate::core::utils::retry_once;
use crate::core::validation::{is_valid_email, FieldError, ValidationErrors};
use crate::db::models::{Article, Session, User};
use crate::db::repository::{ArticleRepository, Repository, SessionRepository, UserRepository};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Generic login failure; never says which half of the credentials was wrong
pub const INVALID_CREDENTIALS: &str = "Invalid username or password.";

/// Session signing and lifetime settings
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub secret: String,
    /// Lifetime in seconds
    pub ttl: u64,
}

/// Authentication service: credential store, login and server-side sessions
pub struct AuthService {
    user_repo: Arc<UserRepository>,
    session_repo: Arc<SessionRepository>,
    hasher: PasswordHasher,
    settings: SessionSettings,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        user_repo: Arc<UserRepository>,
        session_repo: Arc<SessionRepository>,
        hasher: PasswordHasher,
        settings: SessionSettings,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            hasher,
            settings,
        }
    }

    pub fn session_ttl(&self) -> u64 {
        self.settings.ttl
    }

    /// Register a new user
    ///
    /// Every failing check is reported, in form order. Nothing is written
    /// unless all checks pass.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        let username = request.username.trim();
        let mut errors = ValidationErrors::default();

        errors.require("name", &request.name, "Name is required.");
        errors.require("email", &request.email, "Email is required.");
        if !request.email.trim().is_empty() && !is_valid_email(&request.email) {
            errors.push(FieldError::new("email", "Email is not valid.", request.email.as_str()));
        }
        errors.require("username", username, "Username is required.");
        if request.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required.", ""));
        }
        if request.password2 != request.password {
            errors.push(FieldError::new("password2", "Passwords do not match.", ""));
        }

        if !username.is_empty() {
            let repo = &self.user_repo;
            let existing = retry_once("find_user", move || repo.find_by_username(username)).await?;
            if existing.is_some() {
                errors.push(taken(username));
            }
        }

        errors.into_result().map_err(BoardError::Validation)?;

        let password_hash = self.hasher.hash(&request.password).await?;
        let user = User {
            id: Uuid::new_v4().to_string(),
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            username: username.to_string(),
            password_hash,
            created_at: Utc::now().to_rfc3339(),
        };

        let repo = &self.user_repo;
        let record = &user;
        match retry_once("create_user", move || repo.create(record)).await {
            Ok(()) => {}
            // Lost a race with a concurrent registration for the same name
            Err(BoardError::DatabaseError(e)) if is_constraint_violation(&e) => {
                let mut errors = ValidationErrors::default();
                errors.push(taken(username));
                return Err(BoardError::Validation(errors));
            }
            Err(e) => return Err(e),
        }

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check credentials and open a session
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Session> {
        let username = username.trim();
        let repo = &self.user_repo;
        let user = match retry_once("find_user", move || repo.find_by_username(username)).await? {
            Some(user) => user,
            None => {
                warn!(username = %username, reason = "unknown_user", "Login rejected");
                return Err(BoardError::AuthenticationError(INVALID_CREDENTIALS.to_string()));
            }
        };

        if !self.hasher.verify(password, &user.password_hash).await? {
            warn!(username = %username, reason = "wrong_password", "Login rejected");
            return Err(BoardError::AuthenticationError(INVALID_CREDENTIALS.to_string()));
        }

        let now = Utc::now();
        let ttl = i64::try_from(self.settings.ttl).unwrap_or(i64::MAX / 2);
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            username: user.username.clone(),
            created_at: now.to_rfc3339(),
            expires_at: now.timestamp().saturating_add(ttl),
        };

        let repo = &self.session_repo;
        let record = &session;
        retry_once("create_session", move || repo.create(record)).await?;

        info!(user_id = %user.id, username = %user.username, "User logged in");
        Ok(session)
    }

    /// Signed cookie value naming `session`
    pub fn issue_token(&self, session: &Session) -> Result<String> {
        generate_token(&session.id, &session.user_id, session.expires_at, &self.settings.secret)
    }

    /// Validate a cookie token and resolve it to a live session
    ///
    /// Bad signatures and expired tokens are anonymous, not errors.
    pub async fn resolve_token(&self, token: &str) -> Result<Option<SessionUser>> {
        match crate::auth::jwt::validate_token(token, &self.settings.secret) {
            Ok(claims) => self.resolve(&claims.sid).await,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring invalid session token");
                Ok(None)
            }
        }
    }

    /// Load the session and its user; expired sessions are removed
    pub async fn resolve(&self, session_id: &str) -> Result<Option<SessionUser>> {
        let sessions = &self.session_repo;
        let session = match retry_once("find_session", move || sessions.find_by_id(session_id)).await? {
            Some(session) => session,
            None => return Ok(None),
        };

        if session.is_expired(Utc::now().timestamp()) {
            retry_once("delete_session", move || sessions.delete(session_id)).await?;
            return Ok(None);
        }

        let users = &self.user_repo;
        let user_id = session.user_id.as_str();
        let user = match retry_once("find_user", move || users.find_by_id(user_id)).await? {
            Some(user) => user,
            None => return Ok(None),
        };

        Ok(Some(SessionUser {
            session_id: session.id,
            id: user.id,
            username: user.username,
            name: user.name,
        }))
    }

    /// End a session; ending an unknown session is not an error
    pub async fn logout(&self, session_id: &str) -> Result<()> {
        let repo = &self.session_repo;
        let removed = retry_once("delete_session", move || repo.delete(session_id)).await?;
        if removed {
            info!(session_id = %session_id, "Session ended");
        }
        Ok(())
    }

    /// Drop every expired session row
    pub async fn purge_expired_sessions(&self) -> Result<usize> {
        let repo = &self.session_repo;
        let now = Utc::now().timestamp();
        retry_once("purge_sessions", move || repo.delete_expired(now)).await
    }
}

fn taken(username: &str) -> FieldError {
    FieldError::new("username", "Username is already taken.", username)
}

fn is_constraint_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Article service: CRUD with ownership checks
pub struct ArticleService {
    article_repo: Arc<ArticleRepository>,
    user_repo: Arc<UserRepository>,
}

impl ArticleService {
    /// Create a new ArticleService
    pub fn new(article_repo: Arc<ArticleRepository>, user_repo: Arc<UserRepository>) -> Self {
        Self {
            article_repo,
            user_repo,
        }
    }

    /// All articles in insertion order
    pub async fn list_all(&self) -> Result<Vec<Article>> {
        let repo = &self.article_repo;
        retry_once("list_articles", move || repo.find_all()).await
    }

    /// Get an article by ID
    pub async fn get_by_id(&self, id: &str) -> Result<Article> {
        let repo = &self.article_repo;
        retry_once("find_article", move || repo.find_by_id(id))
            .await?
            .ok_or_else(|| BoardError::NotFound(format!("Article {} not found", id)))
    }

    /// Create a new article
    pub async fn create(&self, request: &ArticleRequest) -> Result<Article> {
        self.validate(request).await?;

        let now = Utc::now().to_rfc3339();
        let article = Article {
            id: Uuid::new_v4().to_string(),
            title: request.title.trim().to_string(),
            author: request.author.clone(),
            content: request.content.clone(),
            created_at: now.clone(),
            updated_at: now,
        };

        let repo = &self.article_repo;
        let record = &article;
        retry_once("create_article", move || repo.create(record)).await?;

        info!(article_id = %article.id, author = %article.author, "Article created");
        Ok(article)
    }

    /// Get an article its author is about to edit
    pub async fn get_owned(&self, id: &str, acting_user: &str) -> Result<Article> {
        let article = self.get_by_id(id).await?;
        ensure_owner(&article, acting_user)?;
        Ok(article)
    }

    /// Overwrite an article's fields; only its author may do this
    pub async fn update(&self, id: &str, request: &ArticleRequest, acting_user: &str) -> Result<Article> {
        let mut article = self.get_owned(id, acting_user).await?;
        self.validate(request).await?;

        article.title = request.title.trim().to_string();
        article.author = request.author.clone();
        article.content = request.content.clone();
        article.updated_at = Utc::now().to_rfc3339();

        let repo = &self.article_repo;
        let record = &article;
        if !retry_once("update_article", move || repo.update(record)).await? {
            return Err(BoardError::NotFound(format!("Article {} not found", id)));
        }

        info!(article_id = %id, author = %article.author, "Article updated");
        Ok(article)
    }

    /// Delete an article; only its author may do this
    pub async fn delete(&self, id: &str, acting_user: &str) -> Result<()> {
        self.get_owned(id, acting_user).await?;

        let repo = &self.article_repo;
        if !retry_once("delete_article", move || repo.delete(id)).await? {
            return Err(BoardError::NotFound(format!("Article {} not found", id)));
        }

        info!(article_id = %id, author = %acting_user, "Article deleted");
        Ok(())
    }

    async fn validate(&self, request: &ArticleRequest) -> Result<()> {
        let mut errors = ValidationErrors::default();
        errors.require("title", &request.title, "Title is required.");
        errors.require("author", &request.author, "Author is required.");
        errors.require("content", &request.content, "Body is required.");

        if !request.author.trim().is_empty() {
            let repo = &self.user_repo;
            let author = request.author.as_str();
            if retry_once("find_user", move || repo.find_by_username(author))
                .await?
                .is_none()
            {
                errors.push(FieldError::new(
                    "author",
                    "Author is not a registered user.",
                    request.author.as_str(),
                ));
            }
        }

        errors.into_result().map_err(BoardError::Validation)
    }
}

fn ensure_owner(article: &Article, acting_user: &str) -> Result<()> {
    if article.author != acting_user {
        warn!(
            article_id = %article.id,
            author = %article.author,
            acting_user = %acting_user,
            "Rejected change by non-owner"
        );
        return Err(BoardError::PermissionDenied(
            "Only the author may change this article".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DatabaseManager;

    struct Fixture {
        auth: AuthService,
        articles: ArticleService,
        users: Arc<UserRepository>,
        sessions: Arc<SessionRepository>,
    }

    fn fixture() -> Fixture {
        let db = Arc::new(DatabaseManager::new_in_memory().unwrap());
        let users = Arc::new(UserRepository::new(db.clone()));
        let sessions = Arc::new(SessionRepository::new(db.clone()));
        let article_repo = Arc::new(ArticleRepository::new(db));
        let settings = SessionSettings {
            secret: "unit-test-secret-0123456789".to_string(),
            ttl: 3600,
        };

        Fixture {
            auth: AuthService::new(users.clone(), sessions.clone(), PasswordHasher::new(4), settings),
            articles: ArticleService::new(article_repo, users.clone()),
            users,
            sessions,
        }
    }

    fn registration(username: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Alice Doe".to_string(),
            email: "alice@example.com".to_string(),
            username: username.to_string(),
            password: "s3cret".to_string(),
            password2: "s3cret".to_string(),
        }
    }

    fn article(title: &str, author: &str, content: &str) -> ArticleRequest {
        ArticleRequest {
            title: title.to_string(),
            author: author.to_string(),
            content: content.to_string(),
        }
    }

    fn validation_params(err: BoardError) -> Vec<String> {
        match err {
            BoardError::Validation(errors) => errors.into_iter().map(|e| e.param).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_password() {
        let f = fixture();
        let user = f.auth.register(&registration("alice")).await.unwrap();

        assert_ne!(user.password_hash, "s3cret");
        let stored = f.users.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(stored.id, user.id);
    }

    #[tokio::test]
    async fn test_register_missing_name_writes_nothing() {
        let f = fixture();
        let mut req = registration("alice");
        req.name.clear();

        let err = f.auth.register(&req).await.unwrap_err();
        assert_eq!(validation_params(err), vec!["name"]);
        assert_eq!(f.users.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_password_mismatch_writes_nothing() {
        let f = fixture();
        let mut req = registration("alice");
        req.password2 = "different".to_string();

        let err = f.auth.register(&req).await.unwrap_err();
        assert_eq!(validation_params(err), vec!["password2"]);
        assert_eq!(f.users.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_reports_all_errors_in_order() {
        let f = fixture();
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "a".to_string(),
            ..Default::default()
        };

        let err = f.auth.register(&req).await.unwrap_err();
        assert_eq!(validation_params(err), vec!["name", "email", "username", "password2"]);
    }

    #[tokio::test]
    async fn test_register_errors_never_echo_passwords() {
        let f = fixture();
        let mut req = registration("alice");
        req.password2 = "typo".to_string();

        match f.auth.register(&req).await.unwrap_err() {
            BoardError::Validation(errors) => {
                assert!(errors.iter().all(|e| e.value != "s3cret" && e.value != "typo"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_is_a_validation_error() {
        let f = fixture();
        f.auth.register(&registration("alice")).await.unwrap();

        let err = f.auth.register(&registration("alice")).await.unwrap_err();
        assert_eq!(validation_params(err), vec!["username"]);
        assert_eq!(f.users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_padded_username_collides_with_existing() {
        let f = fixture();
        f.auth.register(&registration("alice")).await.unwrap();

        let err = f.auth.register(&registration("alice ")).await.unwrap_err();
        assert_eq!(validation_params(err), vec!["username"]);
        assert_eq!(f.users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_padded_username_is_stored_trimmed() {
        let f = fixture();
        let user = f.auth.register(&registration(" bob")).await.unwrap();
        assert_eq!(user.username, "bob");

        let session = f.auth.authenticate("bob", "s3cret").await.unwrap();
        assert_eq!(session.user_id, user.id);
        let session = f.auth.authenticate("bob ", "s3cret").await.unwrap();
        assert_eq!(session.username, "bob");
    }

    #[tokio::test]
    async fn test_authenticate_opens_session_for_user() {
        let f = fixture();
        let user = f.auth.register(&registration("alice")).await.unwrap();

        let session = f.auth.authenticate("alice", "s3cret").await.unwrap();
        assert_eq!(session.user_id, user.id);
        assert!(f.sessions.find_by_id(&session.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_authenticate_failures_are_indistinguishable() {
        let f = fixture();
        f.auth.register(&registration("alice")).await.unwrap();

        let unknown = f.auth.authenticate("nobody", "s3cret").await.unwrap_err();
        let wrong = f.auth.authenticate("alice", "wrong").await.unwrap_err();

        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(unknown, BoardError::AuthenticationError(_)));
        assert!(matches!(wrong, BoardError::AuthenticationError(_)));
    }

    #[tokio::test]
    async fn test_token_resolves_until_logout() {
        let f = fixture();
        f.auth.register(&registration("alice")).await.unwrap();
        let session = f.auth.authenticate("alice", "s3cret").await.unwrap();
        let token = f.auth.issue_token(&session).unwrap();

        let user = f.auth.resolve_token(&token).await.unwrap().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.name, "Alice Doe");

        f.auth.logout(&session.id).await.unwrap();
        f.auth.logout(&session.id).await.unwrap();
        assert!(f.auth.resolve_token(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_garbage_token_is_anonymous() {
        let f = fixture();
        assert!(f.auth.resolve_token("not.a.token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_removed_on_resolve() {
        let f = fixture();
        let user = f.auth.register(&registration("alice")).await.unwrap();
        f.sessions
            .create(&Session {
                id: "old".to_string(),
                user_id: user.id,
                username: "alice".to_string(),
                created_at: Utc::now().to_rfc3339(),
                expires_at: Utc::now().timestamp() - 10,
            })
            .await
            .unwrap();

        assert!(f.auth.resolve("old").await.unwrap().is_none());
        assert!(f.sessions.find_by_id("old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_then_get_returns_same_fields() {
        let f = fixture();
        f.auth.register(&registration("alice")).await.unwrap();

        let created = f.articles.create(&article("T", "alice", "body")).await.unwrap();
        let fetched = f.articles.get_by_id(&created.id).await.unwrap();

        assert!(!created.id.is_empty());
        assert_eq!(fetched, created);
        assert_eq!((fetched.title.as_str(), fetched.author.as_str()), ("T", "alice"));
    }

    #[tokio::test]
    async fn test_create_requires_fields_and_registered_author() {
        let f = fixture();
        let err = f.articles.create(&article("", "", "")).await.unwrap_err();
        assert_eq!(validation_params(err), vec!["title", "author", "content"]);

        let err = f.articles.create(&article("T", "ghost", "body")).await.unwrap_err();
        assert_eq!(validation_params(err), vec!["author"]);
        assert!(f.articles.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_by_non_owner_is_denied_and_leaves_article() {
        let f = fixture();
        f.auth.register(&registration("alice")).await.unwrap();
        f.auth.register(&registration("bob")).await.unwrap();
        let created = f.articles.create(&article("T", "alice", "body")).await.unwrap();

        let err = f
            .articles
            .update(&created.id, &article("Hijacked", "bob", "x"), "bob")
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::PermissionDenied(_)));
        assert_eq!(f.articles.get_by_id(&created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_update_by_owner_overwrites_fields() {
        let f = fixture();
        f.auth.register(&registration("alice")).await.unwrap();
        let created = f.articles.create(&article("T", "alice", "body")).await.unwrap();

        let updated = f
            .articles
            .update(&created.id, &article("T2", "alice", "body2"), "alice")
            .await
            .unwrap();
        assert_eq!(updated.title, "T2");
        assert_eq!(f.articles.get_by_id(&created.id).await.unwrap().content, "body2");
    }

    #[tokio::test]
    async fn test_update_missing_article_is_not_found() {
        let f = fixture();
        let err = f
            .articles
            .update("nope", &article("T", "alice", "body"), "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_lifecycle() {
        let f = fixture();
        f.auth.register(&registration("alice")).await.unwrap();
        let created = f.articles.create(&article("T", "alice", "body")).await.unwrap();

        assert!(matches!(
            f.articles.delete(&created.id, "bob").await,
            Err(BoardError::PermissionDenied(_))
        ));
        f.articles.delete(&created.id, "alice").await.unwrap();
        assert!(matches!(
            f.articles.get_by_id(&created.id).await,
            Err(BoardError::NotFound(_))
        ));
        assert!(matches!(
            f.articles.delete(&created.id, "alice").await,
            Err(BoardError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_all_keeps_insertion_order() {
        let f = fixture();
        f.auth.register(&registration("alice")).await.unwrap();
        for title in ["first", "second", "third"] {
            f.articles.create(&article(title, "alice", "body")).await.unwrap();
        }

        let titles: Vec<String> = f
            .articles
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.title)
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
    }
}
