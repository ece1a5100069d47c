//! Repository pattern implementation for data access layer
//!
//! Each repository owns one table and issues exactly one storage call per
//! operation; callers decide about retries.

use crate::core::error::Result;
use crate::db::manager::DatabaseManager;
use crate::db::models::{Article, Session, User};
use async_trait::async_trait;
use rusqlite::{OptionalExtension, Row};
use std::sync::Arc;

/// Generic repository trait for CRUD operations
#[async_trait]
pub trait Repository<T>: Send + Sync {
    /// Find an entity by its ID
    async fn find_by_id(&self, id: &str) -> Result<Option<T>>;

    /// Find all entities in the store's natural order
    async fn find_all(&self) -> Result<Vec<T>>;

    /// Create a new entity
    async fn create(&self, entity: &T) -> Result<()>;

    /// Update an existing entity; returns false when nothing matched
    async fn update(&self, entity: &T) -> Result<bool>;

    /// Delete an entity by its ID; returns false when nothing matched
    async fn delete(&self, id: &str) -> Result<bool>;
}

const USER_COLUMNS: &str = "id, name, email, username, password_hash, created_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        username: row.get(3)?,
        password_hash: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Repository for User entities (the credential store)
pub struct UserRepository {
    db: Arc<DatabaseManager>,
}

impl UserRepository {
    /// Create a new UserRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Find a user by exact username
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let username = username.to_string();
        self.db
            .execute(move |conn| {
                Ok(conn
                    .query_row(
                        &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?"),
                        [&username],
                        user_from_row,
                    )
                    .optional()?)
            })
            .await
    }

    /// Count total users
    pub async fn count(&self) -> Result<i64> {
        self.db
            .execute(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?))
            .await
    }
}

#[async_trait]
impl Repository<User> for UserRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                Ok(conn
                    .query_row(
                        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"),
                        [&id],
                        user_from_row,
                    )
                    .optional()?)
            })
            .await
    }

    async fn find_all(&self) -> Result<Vec<User>> {
        self.db
            .execute(|conn| {
                let mut stmt =
                    conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY rowid"))?;
                let users = stmt
                    .query_map([], user_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(users)
            })
            .await
    }

    async fn create(&self, user: &User) -> Result<()> {
        let user = user.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO users (id, name, email, username, password_hash, created_at) \
                     VALUES (?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        &user.id,
                        &user.name,
                        &user.email,
                        &user.username,
                        &user.password_hash,
                        &user.created_at,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    async fn update(&self, user: &User) -> Result<bool> {
        let user = user.clone();
        self.db
            .execute(move |conn| {
                let changed = conn.execute(
                    "UPDATE users SET name = ?, email = ?, username = ?, password_hash = ? WHERE id = ?",
                    rusqlite::params![
                        &user.name,
                        &user.email,
                        &user.username,
                        &user.password_hash,
                        &user.id,
                    ],
                )?;
                Ok(changed > 0)
            })
            .await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.db
            .execute(move |conn| Ok(conn.execute("DELETE FROM users WHERE id = ?", [&id])? > 0))
            .await
    }
}

const ARTICLE_COLUMNS: &str = "id, title, author, content, created_at, updated_at";

fn article_from_row(row: &Row<'_>) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(0)?,
        title: row.get(1)?,
        author: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

/// Repository for Article entities
pub struct ArticleRepository {
    db: Arc<DatabaseManager>,
}

impl ArticleRepository {
    /// Create a new ArticleRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl Repository<Article> for ArticleRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Article>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                Ok(conn
                    .query_row(
                        &format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = ?"),
                        [&id],
                        article_from_row,
                    )
                    .optional()?)
            })
            .await
    }

    async fn find_all(&self) -> Result<Vec<Article>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn
                    .prepare(&format!("SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY rowid"))?;
                let articles = stmt
                    .query_map([], article_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await
    }

    async fn create(&self, article: &Article) -> Result<()> {
        let article = article.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO articles (id, title, author, content, created_at, updated_at) \
                     VALUES (?, ?, ?, ?, ?, ?)",
                    rusqlite::params![
                        &article.id,
                        &article.title,
                        &article.author,
                        &article.content,
                        &article.created_at,
                        &article.updated_at,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    async fn update(&self, article: &Article) -> Result<bool> {
        let article = article.clone();
        self.db
            .execute(move |conn| {
                let changed = conn.execute(
                    "UPDATE articles SET title = ?, author = ?, content = ?, updated_at = ? WHERE id = ?",
                    rusqlite::params![
                        &article.title,
                        &article.author,
                        &article.content,
                        &article.updated_at,
                        &article.id,
                    ],
                )?;
                Ok(changed > 0)
            })
            .await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.db
            .execute(move |conn| Ok(conn.execute("DELETE FROM articles WHERE id = ?", [&id])? > 0))
            .await
    }
}

const SESSION_COLUMNS: &str = "id, user_id, username, created_at, expires_at";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        user_id: row.get(1)?,
        username: row.get(2)?,
        created_at: row.get(3)?,
        expires_at: row.get(4)?,
    })
}

/// Repository for server-side sessions
pub struct SessionRepository {
    db: Arc<DatabaseManager>,
}

impl SessionRepository {
    /// Create a new SessionRepository
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }

    /// Remove every session that expired at or before `now`
    pub async fn delete_expired(&self, now: i64) -> Result<usize> {
        self.db
            .execute(move |conn| {
                Ok(conn.execute("DELETE FROM sessions WHERE expires_at <= ?", [now])?)
            })
            .await
    }
}

#[async_trait]
impl Repository<Session> for SessionRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<Session>> {
        let id = id.to_string();
        self.db
            .execute(move |conn| {
                Ok(conn
                    .query_row(
                        &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?"),
                        [&id],
                        session_from_row,
                    )
                    .optional()?)
            })
            .await
    }

    async fn find_all(&self) -> Result<Vec<Session>> {
        self.db
            .execute(|conn| {
                let mut stmt = conn
                    .prepare(&format!("SELECT {SESSION_COLUMNS} FROM sessions ORDER BY rowid"))?;
                let sessions = stmt
                    .query_map([], session_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(sessions)
            })
            .await
    }

    async fn create(&self, session: &Session) -> Result<()> {
        let session = session.clone();
        self.db
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO sessions (id, user_id, username, created_at, expires_at) \
                     VALUES (?, ?, ?, ?, ?)",
                    rusqlite::params![
                        &session.id,
                        &session.user_id,
                        &session.username,
                        &session.created_at,
                        session.expires_at,
                    ],
                )?;
                Ok(())
            })
            .await
    }

    async fn update(&self, session: &Session) -> Result<bool> {
        let session = session.clone();
        self.db
            .execute(move |conn| {
                let changed = conn.execute(
                    "UPDATE sessions SET expires_at = ? WHERE id = ?",
                    rusqlite::params![session.expires_at, &session.id],
                )?;
                Ok(changed > 0)
            })
            .await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let id = id.to_string();
        self.db
            .execute(move |conn| Ok(conn.execute("DELETE FROM sessions WHERE id = ?", [&id])? > 0))
            .await
    }
}
