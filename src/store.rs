// src/store.rs
//! Optional SQLite persistence of classified headlines.
//!
//! Single append-only table, no uniqueness constraint: running the same site twice
//! stores its headlines twice.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

use crate::error::Result;
use crate::extract::Headline;

#[derive(Debug, Clone, PartialEq)]
pub struct NewsRow {
    pub url: String,
    pub title: String,
    pub label: Option<String>,
    pub score: Option<f64>,
}

impl From<&Headline> for NewsRow {
    fn from(h: &Headline) -> Self {
        Self {
            url: h.link.clone(),
            title: h.text.clone(),
            label: h.label.as_ref().map(|l| l.to_string()),
            score: h.score.map(f64::from),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewsStore {
    pool: SqlitePool,
}

impl NewsStore {
    /// Open (creating if missing) the database at `database_url` and ensure the table.
    ///
    /// - `sqlite::memory:` for an ephemeral store
    /// - `sqlite://news.db` for a file next to the binary
    pub async fn connect(database_url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool_opts = if database_url.contains(":memory:") {
            // Each in-memory connection is its own database: keep exactly one, forever.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };
        let pool = pool_opts.connect_with(opts).await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        info!(database_url, "news store ready");
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS news(
                url TEXT,
                title TEXT,
                label TEXT,
                score REAL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Append one request's rows in a single transaction.
    pub async fn append(&self, rows: &[NewsRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        for r in rows {
            sqlx::query("INSERT INTO news (url, title, label, score) VALUES (?, ?, ?, ?)")
                .bind(&r.url)
                .bind(&r.title)
                .bind(&r.label)
                .bind(r.score)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(rows.len())
    }

    pub async fn count(&self) -> Result<i64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM news")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }

    /// Most recent rows first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<NewsRow>> {
        let rows: Vec<(String, String, Option<String>, Option<f64>)> = sqlx::query_as(
            "SELECT url, title, label, score FROM news ORDER BY rowid DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(url, title, label, score)| NewsRow {
                url,
                title,
                label,
                score,
            })
            .collect())
    }
}
