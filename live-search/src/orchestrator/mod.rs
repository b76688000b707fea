//! Orchestrator module for the live search binary.
//!
//! Reads commands line by line, applies them to the source collection and the
//! search service, and writes one reply per command.

mod commands;

pub use commands::{Command, Reply};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tokio::time::{interval, Duration};
use tracing::{debug, info, instrument, warn};

use crate::errors::SyncError;
use crate::feed::MemoryCollection;
use crate::service::SearchService;
use crate::LiveSearchError;
use live_search_shared::SearchRequest;

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// How often progress counters are logged.
    pub progress_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_secs(10),
        }
    }
}

/// Orchestrator that drives the service from a command stream.
///
/// The orchestrator:
/// - Parses and dispatches commands
/// - Writes a reply for every input line, including malformed ones
/// - Handles shutdown signals
/// - Logs progress counters
pub struct Orchestrator<R, W> {
    service: SearchService,
    collection: Arc<MemoryCollection>,
    default_index: String,
    lines: Lines<R>,
    output: W,
    config: OrchestratorConfig,
    /// Total number of commands handled since startup.
    total_commands: Arc<AtomicU64>,
    /// Total number of commands that failed.
    total_errors: Arc<AtomicU64>,
}

impl<R, W> Orchestrator<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a new orchestrator serving `default_index` over `collection`.
    pub fn new(
        service: SearchService,
        collection: Arc<MemoryCollection>,
        default_index: impl Into<String>,
        input: R,
        output: W,
    ) -> Self {
        Self::with_config(
            service,
            collection,
            default_index,
            input,
            output,
            OrchestratorConfig::default(),
        )
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        service: SearchService,
        collection: Arc<MemoryCollection>,
        default_index: impl Into<String>,
        input: R,
        output: W,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            service,
            collection,
            default_index: default_index.into(),
            lines: input.lines(),
            output,
            config,
            total_commands: Arc::new(AtomicU64::new(0)),
            total_errors: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run until the input ends or a shutdown signal is received.
    #[instrument(skip(self), fields(index = %self.default_index))]
    pub async fn run(&mut self) -> Result<(), LiveSearchError> {
        info!("Ready to process commands");

        let mut progress_timer = interval(self.config.progress_interval);
        progress_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                line = self.lines.next_line() => {
                    match line? {
                        Some(line) if line.trim().is_empty() => continue,
                        Some(line) => {
                            let reply = self.handle_line(&line).await;
                            self.write_reply(&reply).await?;
                        }
                        None => {
                            info!("Input closed");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
                _ = progress_timer.tick() => {
                    self.log_progress().await;
                }
            }
        }

        // Ending the feed lets the writer finish what was already queued
        self.collection.close().await;
        self.service.drain(&self.default_index).await?;
        self.service.shutdown().await;

        info!(
            total_commands = self.total_commands.load(Ordering::Relaxed),
            total_errors = self.total_errors.load(Ordering::Relaxed),
            "Orchestrator shutdown complete"
        );
        Ok(())
    }

    /// Total number of commands handled so far.
    pub fn commands_handled(&self) -> u64 {
        self.total_commands.load(Ordering::Relaxed)
    }

    /// Consume the orchestrator and return its output.
    pub fn into_output(self) -> W {
        self.output
    }

    async fn handle_line(&self, line: &str) -> Reply {
        self.total_commands.fetch_add(1, Ordering::Relaxed);

        let command: Command = match serde_json::from_str(line) {
            Ok(command) => command,
            Err(e) => {
                self.total_errors.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "Malformed command");
                return Reply::error(format!("Malformed command: {}", e));
            }
        };

        let op = command.op();
        match self.dispatch(command).await {
            Ok(reply) => {
                debug!(op = %op, "Command handled");
                reply
            }
            Err(e) => {
                self.total_errors.fetch_add(1, Ordering::Relaxed);
                warn!(op = %op, error = %e, "Command failed");
                Reply::error(e)
            }
        }
    }

    async fn dispatch(&self, command: Command) -> Result<Reply, SyncError> {
        let reply = match command {
            Command::Insert { id, fields } => {
                self.collection.insert(id, fields).await?;
                Reply::done(true)
            }
            Command::Update { id, fields } => Reply::done(self.collection.update(&id, fields).await?),
            Command::Remove { id } => Reply::done(self.collection.remove(&id).await?),
            Command::Search {
                index,
                query,
                fields,
            } => {
                let index = self.index_or_default(index);
                let mut request = SearchRequest::new(index.clone(), query);
                if let Some(fields) = fields {
                    request = request.with_fields(fields);
                }
                match self.service.search_request(request).await? {
                    Some(result) => Reply::Results(result),
                    None => Reply::error(SyncError::index_not_found(index)),
                }
            }
            Command::ChangeProperty { index, key, value } => {
                let index = self.index_or_default(index);
                Reply::done(self.service.change_property(&index, &key, value).await?)
            }
            Command::AddFacet {
                index,
                name,
                title,
                terms,
            } => {
                let index = self.index_or_default(index);
                Reply::done(self.service.add_facet(&index, &name, &title, terms).await)
            }
            Command::AddFacets { index, facets } => {
                let index = self.index_or_default(index);
                Reply::done(self.service.add_facets(&index, facets).await)
            }
            Command::AddFilter { index, field, term } => {
                let index = self.index_or_default(index);
                Reply::done(self.service.add_filter(&index, &field, term).await)
            }
        };
        Ok(reply)
    }

    fn index_or_default(&self, index: Option<String>) -> String {
        index.unwrap_or_else(|| self.default_index.clone())
    }

    async fn write_reply(&mut self, reply: &Reply) -> Result<(), LiveSearchError> {
        let mut line = serde_json::to_vec(reply).map_err(std::io::Error::from)?;
        line.push(b'\n');
        self.output.write_all(&line).await?;
        self.output.flush().await?;
        Ok(())
    }

    async fn log_progress(&self) {
        let commands = self.total_commands.load(Ordering::Relaxed);
        let errors = self.total_errors.load(Ordering::Relaxed);

        match self.service.sync_stats(&self.default_index).await {
            Some(stats) => info!(
                commands_handled = commands,
                command_errors = errors,
                events_received = stats.events_received(),
                documents_upserted = stats.documents_upserted(),
                documents_deleted = stats.documents_deleted(),
                write_failures = stats.write_failures(),
                "Processing progress"
            ),
            None => info!(
                commands_handled = commands,
                command_errors = errors,
                "Processing progress"
            ),
        }
    }
}
