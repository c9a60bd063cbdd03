//! Composition root: wires bus, authoritative table, write store and read
//! model into the two facades.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use blogsync_core::{Clock, SystemClock};
use blogsync_events::PostEventBus;
use blogsync_infra::{InMemoryPostTable, PostReadStore, PostTable, PostWriteStore, SqlitePostTable};

use crate::config::{AppConfig, Storage};
use crate::services::{CommandService, QueryService};

/// Table handle shared by the write store, whichever engine backs it.
pub type SharedTable = Arc<dyn PostTable>;

pub struct BlogSync {
    bus: Arc<PostEventBus>,
    reads: Arc<PostReadStore>,
    commands: CommandService<SharedTable>,
    queries: QueryService,
    sqlite: Option<SqlitePostTable>,
}

impl BlogSync {
    /// Opens the configured storage and starts the synchronized service.
    pub async fn open(config: &AppConfig) -> Result<Self> {
        match &config.storage {
            Storage::Memory => {
                Self::assemble(Arc::new(InMemoryPostTable::new()), None, config, Arc::new(SystemClock))
                    .await
            }
            Storage::Sqlite(url) => {
                let table = SqlitePostTable::connect(url)
                    .await
                    .with_context(|| format!("failed to open post table at {url}"))?;
                Self::assemble(
                    Arc::new(table.clone()),
                    Some(table),
                    config,
                    Arc::new(SystemClock),
                )
                .await
            }
        }
    }

    /// Builds the service over an already-open table with an explicit clock.
    pub async fn with_table(
        table: SharedTable,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Self::assemble(table, None, config, clock).await
    }

    async fn assemble(
        table: SharedTable,
        sqlite: Option<SqlitePostTable>,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let started_at = Instant::now();
        let bus = Arc::new(PostEventBus::new());

        // Subscribe the read side BEFORE anything can publish.
        let reads = PostReadStore::new(&bus);

        let existing = table
            .load_all()
            .await
            .context("failed to load posts for read model warm start")?;
        let warmed = existing.len();
        reads.rebuild(existing);

        let writes = Arc::new(PostWriteStore::new(table, Arc::clone(&bus)).with_clock(clock));

        info!(
            storage = %config.storage,
            warmed_posts = warmed,
            duration_ms = started_at.elapsed().as_millis() as u64,
            "blog service ready"
        );

        Ok(Self {
            commands: CommandService::new(writes),
            queries: QueryService::new(Arc::clone(&reads), config.default_page_size),
            bus,
            reads,
            sqlite,
        })
    }

    pub fn commands(&self) -> &CommandService<SharedTable> {
        &self.commands
    }

    pub fn queries(&self) -> &QueryService {
        &self.queries
    }

    pub fn bus(&self) -> &Arc<PostEventBus> {
        &self.bus
    }

    pub fn read_model(&self) -> &Arc<PostReadStore> {
        &self.reads
    }

    /// Waits until every event published so far has been applied.
    pub async fn quiesce(&self) {
        self.bus.quiesce().await;
    }

    /// Drains in-flight handlers, then closes the database pool.
    pub async fn shutdown(self) {
        info!(in_flight = self.bus.in_flight(), "shutting down");
        self.bus.quiesce().await;
        if let Some(table) = &self.sqlite {
            table.close().await;
        }
        info!("shutdown complete");
    }
}
