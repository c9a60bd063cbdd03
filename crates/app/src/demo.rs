//! End-to-end walkthrough run by the `blogsync` binary.
//!
//! create → converge → read → update → converge → read/search → delete →
//! converge → read (not found).

use anyhow::{Context, Result, ensure};
use tracing::info;

use blogsync_core::{PostDraft, PostId, PostRevision};

use crate::app::BlogSync;
use crate::errors::QueryError;

pub fn log_banner() {
    info!("========================================");
    info!("  CQRS blog service: write → event → read");
    info!("========================================");
    info!("Architecture:");
    info!("  [CommandService] --write--> [post table]");
    info!("                        |");
    info!("                   event sync");
    info!("                        v");
    info!("  [QueryService]   <--read--- [in-memory read model]");
}

/// Runs the scenario and returns the identifier of the post it created (and
/// deleted again).
pub async fn run(app: &BlogSync) -> Result<PostId> {
    let id = app
        .commands()
        .create_post(PostDraft::new(
            "Hello",
            "World",
            "alice",
            vec!["go".to_string(), "demo".to_string()],
        ))
        .await
        .context("create failed")?;
    let raw_id = id.to_string();
    info!(post_id = %id, "step 1: created");

    app.quiesce().await;
    let post = app.queries().get_post(&raw_id).context("created post not projected")?;
    info!(post = %serde_json::to_string(&post)?, "step 2: read after create");
    ensure!(post.created_at == post.updated_at, "fresh post must have equal timestamps");

    app.commands()
        .update_post(
            &raw_id,
            PostRevision::new("Hello2", "World2", vec!["demo".to_string()]),
        )
        .await
        .context("update failed")?;
    info!(post_id = %id, "step 3: updated");

    app.quiesce().await;
    let post = app.queries().get_post(&raw_id).context("updated post missing")?;
    info!(post = %serde_json::to_string(&post)?, "step 4: read after update");
    ensure!(post.author == "alice", "author must survive updates");

    let hits = app.queries().search_posts("hello2", &["DEMO".to_string()]);
    info!(hits = hits.len(), "step 5: search 'hello2' tagged 'DEMO'");

    let page = app.queries().list_posts(0, 0);
    info!(returned = page.posts.len(), total = page.total, "step 6: list first page");

    app.commands().delete_post(&raw_id).await.context("delete failed")?;
    info!(post_id = %id, "step 7: deleted");

    app.quiesce().await;
    match app.queries().get_post(&raw_id) {
        Err(QueryError::NotFound(_)) => info!(post_id = %id, "step 8: read after delete → not found"),
        Ok(_) => anyhow::bail!("deleted post still visible after convergence"),
    }

    Ok(id)
}
