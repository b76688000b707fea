//! Dependency initialization and wiring for live search.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{stdin, stdout, BufReader, Stdin, Stdout};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::feed::MemoryCollection;
use crate::orchestrator::Orchestrator;
use crate::registry::{IndexOptions, SearchFields};
use crate::service::SearchService;
use crate::LiveSearchError;
use live_search_repository::{
    BackendConfig, OpenSearchProvider, SearchIndexProvider, DEFAULT_HOST, DEFAULT_PORT,
};
use live_search_shared::OutputFormat;

/// Default index name.
const DEFAULT_INDEX_NAME: &str = "documents";

/// Default searchable field.
const DEFAULT_INDEX_FIELDS: &str = "title";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for the index backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if the backend cannot be reached.
    FailFast,
    /// Retry until the backend answers.
    Retry,
}

impl ConnectionMode {
    /// Parse a connection mode.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Anything else falls back to "retry".
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!(value = %value, "Invalid SEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Settings read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub backend: BackendConfig,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
    pub index_name: String,
    pub index_fields: SearchFields,
    pub index_limit: Option<usize>,
    pub index_format: Option<OutputFormat>,
}

impl Settings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SEARCH_HOST`: Backend host (default: localhost)
    /// - `SEARCH_PORT`: Backend port (default: 9200)
    /// - `SEARCH_SECURE`: Use HTTPS (default: false)
    /// - `SEARCH_DEBUG`: Log every write acknowledgment at info (default: false)
    /// - `SEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `SEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `INDEX_NAME`: Name of the index to serve (default: documents)
    /// - `INDEX_FIELDS`: Comma-separated searchable fields (default: title)
    /// - `INDEX_LIMIT`: Maximum results per search (default: 10)
    /// - `INDEX_FORMAT`: "normalized" or "native" (default: normalized)
    pub fn from_env() -> Result<Self, LiveSearchError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LiveSearchError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("SEARCH_PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|_| LiveSearchError::config(format!("Invalid SEARCH_PORT: {}", port)))?,
            None => DEFAULT_PORT,
        };

        let backend = BackendConfig {
            host: lookup("SEARCH_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            secure: parse_flag(lookup("SEARCH_SECURE")),
            debug: parse_flag(lookup("SEARCH_DEBUG")),
        };

        let connection_mode = lookup("SEARCH_CONNECTION_MODE")
            .map(|mode| ConnectionMode::parse(&mode))
            .unwrap_or(ConnectionMode::Retry);
        let retry_interval = lookup("SEARCH_RETRY_INTERVAL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);

        let fields: Vec<String> = lookup("INDEX_FIELDS")
            .unwrap_or_else(|| DEFAULT_INDEX_FIELDS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .map(str::to_string)
            .collect();
        let index_fields = match fields.len() {
            0 => return Err(LiveSearchError::config("INDEX_FIELDS names no field")),
            1 => SearchFields::Single(fields[0].clone()),
            _ => SearchFields::Many(fields),
        };

        let index_limit = match lookup("INDEX_LIMIT") {
            Some(limit) => Some(limit.parse::<usize>().map_err(|_| {
                LiveSearchError::config(format!("Invalid INDEX_LIMIT: {}", limit))
            })?),
            None => None,
        };
        let index_format = match lookup("INDEX_FORMAT") {
            Some(format) => Some(OutputFormat::parse(&format).ok_or_else(|| {
                LiveSearchError::config(format!("Invalid INDEX_FORMAT: {}", format))
            })?),
            None => None,
        };

        Ok(Self {
            backend,
            connection_mode,
            retry_interval: Duration::from_secs(retry_interval),
            index_name: lookup("INDEX_NAME").unwrap_or_else(|| DEFAULT_INDEX_NAME.to_string()),
            index_fields,
            index_limit,
            index_format,
        })
    }

    /// Registration options for the served index over `collection`.
    pub fn index_options(&self, collection: Arc<MemoryCollection>) -> IndexOptions {
        let mut options = IndexOptions::new(collection, self.index_fields.clone());
        if let Some(limit) = self.index_limit {
            options = options.with_limit(limit);
        }
        if let Some(format) = self.index_format {
            options = options.with_format(format);
        }
        options
    }
}

fn parse_flag(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::to_lowercase).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator<BufReader<Stdin>, Stdout>,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables.
    ///
    /// See [`Settings::from_env`] for the variables read.
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(LiveSearchError)` - If the settings are invalid, or the backend is
    ///   unreachable in fail-fast mode
    pub async fn new() -> Result<Self, LiveSearchError> {
        let settings = Settings::from_env()?;

        info!(
            backend_url = %settings.backend.url(),
            index = %settings.index_name,
            connection_mode = ?settings.connection_mode,
            retry_interval_secs = settings.retry_interval.as_secs(),
            "Initializing dependencies"
        );

        let provider = Self::connect_to_backend(&settings).await?;

        info!("Backend connection established");

        let service = SearchService::with_provider(provider, settings.backend.clone());
        let collection = Arc::new(MemoryCollection::new(settings.index_name.clone()));

        service
            .register_index(
                &settings.index_name,
                settings.index_options(Arc::clone(&collection)),
            )
            .await?;

        let orchestrator = Orchestrator::new(
            service,
            collection,
            settings.index_name,
            BufReader::new(stdin()),
            stdout(),
        );

        Ok(Self { orchestrator })
    }

    /// Connect to the backend with retry logic based on the connection mode.
    ///
    /// The connection is checked by making sure the served index exists.
    async fn connect_to_backend(
        settings: &Settings,
    ) -> Result<Arc<dyn SearchIndexProvider>, LiveSearchError> {
        let provider: Arc<dyn SearchIndexProvider> = Arc::new(
            OpenSearchProvider::from_config(&settings.backend).map_err(|e| {
                LiveSearchError::config(format!("Failed to create OpenSearch provider: {}", e))
            })?,
        );

        loop {
            match provider.ensure_index_exists(&settings.index_name).await {
                Ok(()) => return Ok(provider),
                Err(e) => match settings.connection_mode {
                    ConnectionMode::FailFast => {
                        return Err(LiveSearchError::config(format!(
                            "Failed to connect to backend: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            backend_url = %settings.backend.url(),
                            error = %e,
                            retry_interval_secs = settings.retry_interval.as_secs(),
                            "Failed to connect to backend, retrying..."
                        );
                        sleep(settings.retry_interval).await;
                    }
                },
            }
        }
    }
}
