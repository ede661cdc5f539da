use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rw_core::{Article, ArticleFields, ArticleStorage, Error, Reference, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source TEXT NOT NULL DEFAULT 'beyondchats',
        source_url TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        content_html TEXT,
        status TEXT NOT NULL DEFAULT 'original' CHECK (status IN ('original', 'rewritten')),
        rewritten_from_id INTEGER REFERENCES articles(id) ON DELETE SET NULL,
        references_json TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles (created_at)",
    // Add future migrations here
];

const SELECT_COLUMNS: &str = "id, source, source_url, title, content_html, status, \
    rewritten_from_id, references_json, created_at, updated_at";

pub struct SQLiteStorage {
    pool: Arc<SqlitePool>,
    db_path: PathBuf,
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        Ok(Self {
            pool: Arc::new(pool),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }

    async fn fetch(&self, id: i64) -> Result<Option<Article>> {
        let row = sqlx::query(&format!("SELECT {} FROM articles WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to get article", e))?;
        row.as_ref().map(row_to_article).transpose()
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    // Fixed-width so text ordering in SQL matches chronological ordering
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("Failed to parse date {}: {}", value, e)))
}

fn map_sqlx_error(context: &str, err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return Error::Conflict(format!("{}: source_url already exists", context));
        }
        if db_err.is_foreign_key_violation() {
            return Error::Validation(format!(
                "{}: rewritten_from_id does not reference an existing article",
                context
            ));
        }
    }
    Error::Database(format!("{}: {}", context, err))
}

fn row_to_article(row: &SqliteRow) -> Result<Article> {
    let references = match row.get::<Option<String>, _>("references_json") {
        Some(json) => serde_json::from_str::<Vec<Reference>>(&json)?,
        None => Vec::new(),
    };

    Ok(Article {
        id: row.get("id"),
        source: row.get("source"),
        source_url: row.get("source_url"),
        title: row.get("title"),
        content_html: row.get("content_html"),
        status: row.get::<String, _>("status").parse()?,
        rewritten_from_id: row.get("rewritten_from_id"),
        references,
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

fn references_json(references: &[Reference]) -> Result<Option<String>> {
    if references.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::to_string(references)?))
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn list(&self) -> Result<Vec<Article>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM articles ORDER BY created_at DESC, id DESC",
            SELECT_COLUMNS
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to list articles", e))?;

        rows.iter().map(row_to_article).collect()
    }

    async fn create(&self, fields: ArticleFields) -> Result<Article> {
        fields.validate_for_create()?;
        let article = fields.into_article(0, Utc::now());

        let result = sqlx::query(
            r#"
            INSERT INTO articles
            (source, source_url, title, content_html, status, rewritten_from_id, references_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&article.source)
        .bind(&article.source_url)
        .bind(&article.title)
        .bind(article.content_html.as_deref())
        .bind(article.status.as_str())
        .bind(article.rewritten_from_id)
        .bind(references_json(&article.references)?)
        .bind(timestamp(article.created_at))
        .bind(timestamp(article.updated_at))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("Failed to store article", e))?;

        let id = result.last_insert_rowid();
        self.fetch(id).await?.ok_or(Error::NotFound(id))
    }

    async fn get(&self, id: i64) -> Result<Article> {
        self.fetch(id).await?.ok_or(Error::NotFound(id))
    }

    async fn update(&self, id: i64, fields: ArticleFields) -> Result<Article> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("Failed to start transaction", e))?;

        let row = sqlx::query(&format!("SELECT {} FROM articles WHERE id = ?", SELECT_COLUMNS))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("Failed to get article", e))?;
        let mut article = match row {
            Some(row) => row_to_article(&row)?,
            None => return Err(Error::NotFound(id)),
        };

        fields.apply_to(&mut article, Utc::now());

        sqlx::query(
            r#"
            UPDATE articles SET
                source = ?, source_url = ?, title = ?, content_html = ?, status = ?,
                rewritten_from_id = ?, references_json = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&article.source)
        .bind(&article.source_url)
        .bind(&article.title)
        .bind(article.content_html.as_deref())
        .bind(article.status.as_str())
        .bind(article.rewritten_from_id)
        .bind(references_json(&article.references)?)
        .bind(timestamp(article.updated_at))
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("Failed to update article", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("Failed to commit update", e))?;

        Ok(article)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("Failed to delete article", e))?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::contract;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_sqlite_storage_contract() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        contract::run_all(&storage).await;
    }

    #[tokio::test]
    async fn test_sqlite_storage_persists_across_reopen() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("articles.db");

        let id = {
            let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
            assert_eq!(storage.get_db_path(), db_path.as_path());
            storage
                .create(ArticleFields::original("beyondchats", "https://ex.com/keep", "Keep", "<p>k</p>"))
                .await
                .unwrap()
                .id
        };

        let reopened = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        let article = reopened.get(id).await.unwrap();
        assert_eq!(article.title, "Keep");
        assert_eq!(article.content_html.as_deref(), Some("<p>k</p>"));
    }
}
