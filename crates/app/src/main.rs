use blogsync_app::{AppConfig, BlogSync, demo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    blogsync_observability::init(&config.log_filter, config.log_format);
    config.log_summary();
    demo::log_banner();

    let app = BlogSync::open(&config).await?;

    let outcome = demo::run(&app).await;
    app.shutdown().await;

    match outcome {
        Ok(id) => {
            tracing::info!(post_id = %id, "demo finished");
            Ok(())
        }
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "demo failed");
            Err(err)
        }
    }
}
