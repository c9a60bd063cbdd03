//! SQLite-backed post table.
//!
//! Layout: one row per post keyed by the textual identifier. Tags are stored as
//! a JSON array in a single TEXT column so the sequence round-trips exactly
//! (order, duplicates, commas inside a tag).

use core::str::FromStr;
use std::time::Instant;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use blogsync_core::{Post, PostId, PostRevision};

use super::{PostOrigin, PostTable, TableError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS posts (
    id         TEXT PRIMARY KEY,
    title      TEXT NOT NULL,
    body       TEXT NOT NULL,
    author     TEXT NOT NULL,
    tags       TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
)
"#;

/// Post table on an SQLite pool.
#[derive(Debug, Clone)]
pub struct SqlitePostTable {
    pool: SqlitePool,
}

impl SqlitePostTable {
    /// Opens (creating if missing) the database at `url` and ensures the schema.
    ///
    /// `sqlite::memory:` style URLs get a single long-lived connection, since
    /// every new SQLite connection to `:memory:` is a separate empty database.
    pub async fn connect(url: &str) -> Result<Self, TableError> {
        let started_at = Instant::now();
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = if is_memory_url(url) {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let table = Self::with_pool(pool).await?;
        info!(
            memory = is_memory_url(url),
            duration_ms = started_at.elapsed().as_millis() as u64,
            "sqlite post table ready"
        );
        Ok(table)
    }

    /// Fresh private in-memory database.
    pub async fn in_memory() -> Result<Self, TableError> {
        Self::connect("sqlite::memory:").await
    }

    /// Wraps an existing pool, creating the `posts` table if needed.
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, TableError> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn encode_tags(tags: &[String]) -> Result<String, TableError> {
    serde_json::to_string(tags).map_err(|e| TableError::Encode {
        column: "tags",
        reason: e.to_string(),
    })
}

fn decode_tags(raw: &str) -> Result<Vec<String>, TableError> {
    serde_json::from_str(raw).map_err(|e| TableError::Decode {
        column: "tags",
        reason: e.to_string(),
    })
}

fn post_from_row(row: &SqliteRow) -> Result<Post, TableError> {
    let raw_id: String = row.try_get("id")?;
    let id = PostId::from_str(&raw_id).map_err(|e| TableError::Decode {
        column: "id",
        reason: e.to_string(),
    })?;
    let raw_tags: String = row.try_get("tags")?;

    Ok(Post {
        id,
        title: row.try_get("title")?,
        body: row.try_get("body")?,
        author: row.try_get("author")?,
        tags: decode_tags(&raw_tags)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl PostTable for SqlitePostTable {
    async fn insert(&self, post: &Post) -> Result<u64, TableError> {
        let tags = encode_tags(&post.tags)?;
        let result = sqlx::query(
            r#"
            INSERT INTO posts (id, title, body, author, tags, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(post.id.to_string())
        .bind(&post.title)
        .bind(&post.body)
        .bind(&post.author)
        .bind(tags)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(post_id = %post.id, rows = result.rows_affected(), "sqlite insert");
        Ok(result.rows_affected())
    }

    async fn update(
        &self,
        id: PostId,
        revision: &PostRevision,
        updated_at: i64,
    ) -> Result<u64, TableError> {
        let tags = encode_tags(&revision.tags)?;
        let result = sqlx::query(
            r#"
            UPDATE posts
            SET title = ?, body = ?, tags = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&revision.title)
        .bind(&revision.body)
        .bind(tags)
        .bind(updated_at)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        debug!(post_id = %id, rows = result.rows_affected(), "sqlite update");
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: PostId) -> Result<u64, TableError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        debug!(post_id = %id, rows = result.rows_affected(), "sqlite delete");
        Ok(result.rows_affected())
    }

    async fn fetch_origin(&self, id: PostId) -> Result<Option<PostOrigin>, TableError> {
        let row = sqlx::query("SELECT author, created_at FROM posts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(PostOrigin {
                author: row.try_get("author")?,
                created_at: row.try_get("created_at")?,
            })),
            None => Ok(None),
        }
    }

    async fn load_all(&self) -> Result<Vec<Post>, TableError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, body, author, tags, created_at, updated_at
            FROM posts
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut posts = rows.iter().map(post_from_row).collect::<Result<Vec<_>, _>>()?;
        // Textual UUID order and byte order can disagree on case; sort on the parsed id.
        posts.sort_by_key(|p| p.id);
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogsync_core::PostDraft;

    fn post(title: &str, tags: &[&str]) -> Post {
        Post::from_draft(
            PostId::new(),
            PostDraft::new(title, "body", "alice", tags.iter().map(|t| t.to_string()).collect()),
            1_700_000_000,
        )
    }

    #[tokio::test]
    async fn tags_round_trip_exactly() {
        let table = SqlitePostTable::in_memory().await.unwrap();
        let p = post("tags", &["go", "Go", "go", "with,comma", ""]);
        table.insert(&p).await.unwrap();

        let all = table.load_all().await.unwrap();
        assert_eq!(all, vec![p]);
    }

    #[tokio::test]
    async fn empty_tag_list_round_trips() {
        let table = SqlitePostTable::in_memory().await.unwrap();
        let p = post("no tags", &[]);
        table.insert(&p).await.unwrap();

        let all = table.load_all().await.unwrap();
        assert!(all[0].tags.is_empty());
    }

    #[tokio::test]
    async fn update_preserves_origin_and_counts_rows() {
        let table = SqlitePostTable::in_memory().await.unwrap();
        let p = post("before", &["x"]);
        table.insert(&p).await.unwrap();

        let rev = PostRevision::new("after", "new body", vec!["y".into()]);
        assert_eq!(table.update(p.id, &rev, 1_700_000_100).await.unwrap(), 1);
        assert_eq!(table.update(PostId::new(), &rev, 1).await.unwrap(), 0);

        let origin = table.fetch_origin(p.id).await.unwrap().unwrap();
        assert_eq!(
            origin,
            PostOrigin {
                author: "alice".into(),
                created_at: 1_700_000_000
            }
        );

        let stored = table.load_all().await.unwrap().remove(0);
        assert_eq!(stored.title, "after");
        assert_eq!(stored.body, "new body");
        assert_eq!(stored.tags, vec!["y".to_string()]);
        assert_eq!(stored.updated_at, 1_700_000_100);
    }

    #[tokio::test]
    async fn delete_counts_rows_and_duplicate_insert_fails() {
        let table = SqlitePostTable::in_memory().await.unwrap();
        let p = post("gone", &[]);
        table.insert(&p).await.unwrap();

        assert!(table.insert(&p).await.is_err());
        assert_eq!(table.delete(p.id).await.unwrap(), 1);
        assert_eq!(table.delete(p.id).await.unwrap(), 0);
        assert!(table.fetch_origin(p.id).await.unwrap().is_none());
    }
}
