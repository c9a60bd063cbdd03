//! Command and query facades.
//!
//! Commands go to the authoritative store; queries are answered from the
//! read model only. The two sides share nothing but the event bus, so a query
//! issued right after a command may not observe it yet.

use std::sync::Arc;

use tracing::{info, warn};

use blogsync_core::{Post, PostDraft, PostId, PostRevision};
use blogsync_infra::{Page, PostReadStore, PostTable, PostWriteStore};

use crate::errors::{CommandError, CommandResult, QueryError, QueryResult};

/// Identifiers arrive as text; anything that does not parse cannot name a post.
fn parse_id(raw: &str) -> Option<PostId> {
    raw.trim().parse().ok()
}

pub struct CommandService<T> {
    store: Arc<PostWriteStore<T>>,
}

impl<T> Clone for CommandService<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<T> CommandService<T>
where
    T: PostTable,
{
    pub fn new(store: Arc<PostWriteStore<T>>) -> Self {
        Self { store }
    }

    pub async fn create_post(&self, draft: PostDraft) -> CommandResult<PostId> {
        info!(
            command = "create_post",
            title = %draft.title,
            author = %draft.author,
            tags = ?draft.tags,
            "command received"
        );

        let result = async {
            draft.validate()?;
            Ok::<_, CommandError>(self.store.create(draft).await?)
        }
        .await;

        if let Err(err) = &result {
            warn!(command = "create_post", error = %err, "command failed");
        }
        result
    }

    pub async fn update_post(&self, id: &str, revision: PostRevision) -> CommandResult<()> {
        info!(command = "update_post", post_id = %id, title = %revision.title, "command received");

        let result = async {
            revision.validate()?;
            let post_id = parse_id(id).ok_or_else(|| CommandError::NotFound(id.to_string()))?;
            Ok::<_, CommandError>(self.store.update(post_id, revision).await?)
        }
        .await;

        if let Err(err) = &result {
            warn!(command = "update_post", post_id = %id, error = %err, "command failed");
        }
        result
    }

    pub async fn delete_post(&self, id: &str) -> CommandResult<()> {
        info!(command = "delete_post", post_id = %id, "command received");

        let result = async {
            let post_id = parse_id(id).ok_or_else(|| CommandError::NotFound(id.to_string()))?;
            Ok::<_, CommandError>(self.store.delete(post_id).await?)
        }
        .await;

        if let Err(err) = &result {
            warn!(command = "delete_post", post_id = %id, error = %err, "command failed");
        }
        result
    }
}

#[derive(Debug, Clone)]
pub struct QueryService {
    reads: Arc<PostReadStore>,
    default_page_size: usize,
}

impl QueryService {
    pub fn new(reads: Arc<PostReadStore>, default_page_size: usize) -> Self {
        Self {
            reads,
            default_page_size,
        }
    }

    pub fn get_post(&self, id: &str) -> QueryResult<Post> {
        info!(query = "get_post", post_id = %id, "query received");
        parse_id(id)
            .and_then(|post_id| self.reads.get(post_id))
            .ok_or_else(|| QueryError::NotFound(id.to_string()))
    }

    /// `limit <= 0` means the configured default page size; a negative
    /// `offset` is treated as zero.
    pub fn list_posts(&self, limit: i64, offset: i64) -> Page {
        let limit = if limit <= 0 {
            i64::try_from(self.default_page_size).unwrap_or(i64::MAX)
        } else {
            limit
        };
        let offset = usize::try_from(offset).unwrap_or(0);

        info!(query = "list_posts", limit, offset, "query received");
        self.reads.list(limit, offset)
    }

    pub fn search_posts(&self, query: &str, tags: &[String]) -> Vec<Post> {
        info!(query = "search_posts", text = %query, tags = ?tags, "query received");
        self.reads.search(query, tags)
    }
}

#[cfg(test)]
mod tests {
    use blogsync_events::PostEventBus;
    use blogsync_infra::InMemoryPostTable;

    use super::*;

    fn setup() -> (Arc<PostEventBus>, CommandService<InMemoryPostTable>, QueryService) {
        let bus = Arc::new(PostEventBus::new());
        let reads = PostReadStore::new(&bus);
        let store = Arc::new(PostWriteStore::new(InMemoryPostTable::new(), Arc::clone(&bus)));
        (bus, CommandService::new(store), QueryService::new(reads, 3))
    }

    fn draft(title: &str) -> PostDraft {
        PostDraft::new(title, "body", "alice", vec!["demo".into()])
    }

    #[tokio::test]
    async fn create_rejects_missing_title_without_persisting() {
        let (bus, commands, queries) = setup();

        let err = commands.create_post(draft("")).await.unwrap_err();
        assert!(matches!(err, CommandError::Validation(_)));

        bus.quiesce().await;
        assert_eq!(queries.list_posts(0, 0).total, 0);
    }

    #[tokio::test]
    async fn create_accepts_blank_author_and_empty_tag() {
        let (bus, commands, queries) = setup();

        let id = commands
            .create_post(PostDraft::new("  ", "", "", vec!["".into()]))
            .await
            .unwrap();
        bus.quiesce().await;

        let post = queries.get_post(&id.to_string()).unwrap();
        assert_eq!(post.title, "  ");
        assert_eq!(post.author, "");
        assert_eq!(post.tags, vec![String::new()]);
    }

    #[tokio::test]
    async fn unparseable_or_unknown_ids_are_not_found() {
        let (_bus, commands, queries) = setup();
        let rev = PostRevision::new("t", "b", vec![]);

        let unknown = PostId::new().to_string();
        for id in ["not-a-uuid", "", unknown.as_str()] {
            assert!(matches!(
                commands.update_post(id, rev.clone()).await,
                Err(CommandError::NotFound(_))
            ));
            assert!(matches!(
                commands.delete_post(id).await,
                Err(CommandError::NotFound(_))
            ));
            assert_eq!(queries.get_post(id), Err(QueryError::NotFound(id.to_string())));
        }
    }

    #[tokio::test]
    async fn list_applies_configured_default_page_size() {
        let (bus, commands, queries) = setup();
        for i in 0..5 {
            commands.create_post(draft(&format!("p{i}"))).await.unwrap();
        }
        bus.quiesce().await;

        let page = queries.list_posts(0, 0);
        assert_eq!(page.posts.len(), 3);
        assert_eq!(page.total, 5);

        let page = queries.list_posts(-7, -2);
        assert_eq!(page.posts.len(), 3);
        assert_eq!(page.posts[0].title, "p0");

        assert_eq!(queries.list_posts(10, 4).posts.len(), 1);
        assert!(queries.list_posts(10, 9).posts.is_empty());
    }

    #[tokio::test]
    async fn queries_reflect_commands_after_convergence() {
        let (bus, commands, queries) = setup();
        let id = commands.create_post(draft("Hello")).await.unwrap();
        bus.quiesce().await;

        let post = queries.get_post(&id.to_string()).unwrap();
        assert_eq!(post.title, "Hello");
        assert_eq!(queries.search_posts("hel", &[]).len(), 1);

        commands.delete_post(&id.to_string()).await.unwrap();
        bus.quiesce().await;
        assert!(queries.get_post(&id.to_string()).is_err());
    }
}
