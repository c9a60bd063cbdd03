use std::sync::Arc;
use std::time::Duration;

use blogsync_app::{AppConfig, BlogSync, CommandError, QueryError, Storage, demo};
use blogsync_core::{FixedClock, Post, PostDraft, PostRevision};
use blogsync_infra::{InMemoryPostTable, PostTable};

fn memory_config() -> AppConfig {
    AppConfig {
        storage: Storage::Memory,
        ..AppConfig::default()
    }
}

fn sqlite_memory_config() -> AppConfig {
    AppConfig {
        storage: Storage::Sqlite("sqlite::memory:".to_string()),
        ..AppConfig::default()
    }
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// The service is eventually consistent (command path vs read model update).
/// Poll briefly until the read side catches up.
async fn get_eventually(app: &BlogSync, id: &str, check: impl Fn(&Post) -> bool) -> Post {
    for _ in 0..50 {
        if let Ok(post) = app.queries().get_post(id) {
            if check(&post) {
                return post;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("post {id} did not reach the expected state in the read model within timeout");
}

async fn gone_eventually(app: &BlogSync, id: &str) {
    for _ in 0..50 {
        if app.queries().get_post(id).is_err() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    panic!("post {id} still visible in the read model after timeout");
}

#[tokio::test]
async fn demo_scenario_runs_on_both_backends() {
    for config in [memory_config(), sqlite_memory_config()] {
        let app = BlogSync::open(&config).await.unwrap();
        let id = demo::run(&app).await.unwrap();

        assert!(app.queries().get_post(&id.to_string()).is_err());
        assert_eq!(app.queries().list_posts(0, 0).total, 0);
        app.shutdown().await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn read_side_converges_without_explicit_barrier() {
    let app = BlogSync::open(&sqlite_memory_config()).await.unwrap();

    let id = app
        .commands()
        .create_post(PostDraft::new("Hello", "World", "alice", tags(&["go", "demo"])))
        .await
        .unwrap()
        .to_string();
    let created = get_eventually(&app, &id, |_| true).await;
    assert_eq!(created.tags, tags(&["go", "demo"]));

    app.commands()
        .update_post(&id, PostRevision::new("Hello2", "World2", tags(&["demo"])))
        .await
        .unwrap();
    let updated = get_eventually(&app, &id, |p| p.title == "Hello2").await;
    assert_eq!(updated.author, "alice");
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);

    app.commands().delete_post(&id).await.unwrap();
    gone_eventually(&app, &id).await;

    app.shutdown().await;
}

#[tokio::test]
async fn timestamps_follow_injected_clock() {
    let clock = Arc::new(FixedClock::new(1_700_000_000));
    let table: Arc<dyn PostTable> = Arc::new(InMemoryPostTable::new());
    let app = BlogSync::with_table(table, &memory_config(), clock.clone())
        .await
        .unwrap();

    let id = app
        .commands()
        .create_post(PostDraft::new("t", "b", "alice", vec![]))
        .await
        .unwrap()
        .to_string();
    clock.advance(45);
    app.commands()
        .update_post(&id, PostRevision::new("t2", "b2", vec![]))
        .await
        .unwrap();
    app.quiesce().await;

    let post = app.queries().get_post(&id).unwrap();
    assert_eq!(post.created_at, 1_700_000_000);
    assert_eq!(post.updated_at, 1_700_000_045);
}

#[tokio::test]
async fn restart_warms_read_model_from_table() {
    let table = Arc::new(InMemoryPostTable::new());
    let clock = Arc::new(FixedClock::new(10));

    let first = BlogSync::with_table(table.clone(), &memory_config(), clock.clone())
        .await
        .unwrap();
    for title in ["one", "two", "three"] {
        first
            .commands()
            .create_post(PostDraft::new(title, "", "bob", tags(&["warm"])))
            .await
            .unwrap();
    }
    first.shutdown().await;

    let second = BlogSync::with_table(table, &memory_config(), clock)
        .await
        .unwrap();
    let page = second.queries().list_posts(10, 0);
    assert_eq!(page.total, 3);
    let titles: Vec<_> = page.posts.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["one", "two", "three"]);
    assert_eq!(second.queries().search_posts("", &tags(&["WARM"])).len(), 3);
}

#[tokio::test]
async fn errors_surface_through_facades() {
    let app = BlogSync::open(&memory_config()).await.unwrap();

    assert!(matches!(
        app.commands()
            .create_post(PostDraft::new("", "body", "alice", vec![]))
            .await,
        Err(CommandError::Validation(_))
    ));
    assert!(matches!(
        app.commands().delete_post("nope").await,
        Err(CommandError::NotFound(_))
    ));
    assert_eq!(
        app.queries().get_post("nope"),
        Err(QueryError::NotFound("nope".to_string()))
    );

    app.quiesce().await;
    assert!(app.read_model().is_empty());
}
