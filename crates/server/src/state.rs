use std::sync::Arc;

use appcatalog_core::{
    BatchRegistry, Config, SanitizedConfig, ScrapeRunner, SharedDatabase, SourceClient,
};

/// Shared application state
pub struct AppState {
    config: Config,
    database: SharedDatabase,
    runner: Arc<ScrapeRunner>,
    batches: BatchRegistry,
    sources: Option<Arc<SourceClient>>,
}

impl AppState {
    pub fn new(
        config: Config,
        runner: Arc<ScrapeRunner>,
        sources: Option<Arc<SourceClient>>,
    ) -> Self {
        let batches = BatchRegistry::with_retention(config.scrape.retained_batches);
        Self {
            config,
            database: runner.database().clone(),
            runner,
            batches,
            sources,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn database(&self) -> &SharedDatabase {
        &self.database
    }

    pub fn runner(&self) -> &Arc<ScrapeRunner> {
        &self.runner
    }

    pub fn batches(&self) -> &BatchRegistry {
        &self.batches
    }

    /// Feed client, if one could be built from the configuration.
    pub fn sources(&self) -> Option<&SourceClient> {
        self.sources.as_deref()
    }

    /// Parent hops used when a request does not say.
    pub fn default_depth(&self) -> u32 {
        self.config.scrape.fallback_depth
    }
}
