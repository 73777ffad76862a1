//! Dual-interval scheduler
//!
//! Two independent loops share nothing but a `watch` channel:
//!
//! - **refresh** (every `REFRESH_INTERVAL`): regenerate the collection from the
//!   OpenAPI sources, re-resolve collection/environment and publish the paths
//! - **execute** (every `RUN_INTERVAL`, first tick immediately): load the
//!   latest published paths, run the collection and hand the outcome to the
//!   aggregator
//!
//! Each loop awaits its own tick's work, so a slow run only delays later runs.
//! Collection files are replaced by atomic rename, so the execute loop never
//! reads a half-written file.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tracing::{debug, error, info, warn};

use crate::aggregator::Aggregator;
use crate::collection::{CollectionDocument, Combiner, EnvironmentDocument};
use crate::config::{RunVariables, Settings};
use crate::runner::{RunConfig, RunEngine, RunRequest};
use crate::source::{ResolveError, ResolvedSources, Resolver};
use crate::transform::{CollectionGenerator, SpecTransformer};

/// Name given to a collection combined from several OpenAPI sources
pub const COMBINED_COLLECTION_NAME: &str = "Combined API Collection";

/// Errors that stop the scheduler
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Failed to resolve sources: {0}")]
    Resolve(#[from] ResolveError),
}

/// Refresh-loop work: generation, combination and resolution
pub struct Refresher {
    settings: Arc<Settings>,
    resolver: Resolver,
    transformer: SpecTransformer,
    combiner: Combiner,
}

impl Refresher {
    pub fn new(
        settings: Arc<Settings>,
        resolver: Resolver,
        generator: Arc<dyn CollectionGenerator>,
    ) -> Self {
        Self {
            transformer: SpecTransformer::new(generator, &settings.work_dir),
            combiner: Combiner::new(&settings.work_dir),
            resolver,
            settings,
        }
    }

    /// One refresh cycle
    pub async fn refresh(&mut self) -> Result<ResolvedSources, ResolveError> {
        self.generate().await;
        self.resolver.resolve_settings(&self.settings).await
    }

    /// Regenerate the collection file from the OpenAPI sources, if any
    ///
    /// Failures are logged and leave the previous collection file in place.
    pub async fn generate(&mut self) {
        let settings = Arc::clone(&self.settings);
        let sources = settings.openapi_sources();
        let target = settings.collection_file.as_path();

        match sources.as_slice() {
            [] => debug!("No OpenAPI sources configured, skipping generation"),
            [source] => {
                info!(source = %source, "Generating collection from OpenAPI source");
                self.transformer.initialize(source);
                let generated = self.transformer.generate_collection().await.map(|_| ());
                if let Err(e) = generated.and_then(|()| self.transformer.save_collection(target)) {
                    error!(source = %source, error = %e, "Failed to process OpenAPI source");
                }
            }
            sources => {
                info!(count = sources.len(), "Processing OpenAPI sources");
                self.combiner.reset();

                for source in sources {
                    self.transformer.initialize(source);
                    if let Err(e) = self.transformer.generate_collection().await {
                        error!(source = %source, error = %e, "Failed to process OpenAPI source");
                        continue;
                    }
                    if let Err(e) = self.combiner.add_collection(source) {
                        error!(source = %source, error = %e, "Failed to add generated collection");
                    }
                }

                let combined = self.combiner.combine(COMBINED_COLLECTION_NAME).map(|_| ());
                if let Err(e) = combined.and_then(|()| self.combiner.save_collection(target)) {
                    error!(error = %e, "Failed to combine collections");
                }
            }
        }
    }
}

/// Execute-loop work: load, run, aggregate
pub struct Executor {
    settings: Arc<Settings>,
    engine: Arc<dyn RunEngine>,
    aggregator: Aggregator,
    variables: Arc<RunVariables>,
}

impl Executor {
    pub fn new(
        settings: Arc<Settings>,
        engine: Arc<dyn RunEngine>,
        aggregator: Aggregator,
        variables: Arc<RunVariables>,
    ) -> Self {
        Self {
            settings,
            engine,
            aggregator,
            variables,
        }
    }

    /// Run the collection once
    ///
    /// Documents are read from disk every time since the refresh loop may
    /// have replaced them. Returns `false` when the run was skipped.
    pub async fn execute(&self, sources: &ResolvedSources) -> bool {
        let collection = match CollectionDocument::from_file(&sources.collection) {
            Ok(collection) => collection,
            Err(e) => {
                error!(error = %e, "Failed to load collection, skipping run");
                return false;
            }
        };
        let environment = match sources.environment.as_deref() {
            Some(path) => match EnvironmentDocument::from_file(path) {
                Ok(env) => Some(env),
                Err(e) => {
                    error!(error = %e, "Failed to load environment, skipping run");
                    return false;
                }
            },
            None => None,
        };

        info!(
            collection = %sources.collection.display(),
            engine = self.engine.name(),
            "Starting run"
        );
        self.aggregator.set_loaded_collection(collection.clone());

        let outcome = self
            .engine
            .run(RunRequest {
                collection,
                environment,
                config: RunConfig::from_settings(&self.settings, Arc::clone(&self.variables)),
            })
            .await;
        self.aggregator.handle_outcome(outcome);
        true
    }
}

/// Owns both loops
pub struct Scheduler {
    settings: Arc<Settings>,
    refresher: Refresher,
    executor: Executor,
}

impl Scheduler {
    pub fn new(
        settings: Arc<Settings>,
        generator: Arc<dyn CollectionGenerator>,
        engine: Arc<dyn RunEngine>,
        aggregator: Aggregator,
        variables: Arc<RunVariables>,
    ) -> Self {
        let resolver = Resolver::new(&settings.work_dir);
        Self {
            refresher: Refresher::new(Arc::clone(&settings), resolver, generator),
            executor: Executor::new(Arc::clone(&settings), engine, aggregator, variables),
            settings,
        }
    }

    /// First refresh cycle, run before serving
    pub async fn prepare(&mut self) -> Result<ResolvedSources, SchedulerError> {
        Ok(self.refresher.refresh().await?)
    }

    /// Run both loops until one fails
    pub async fn run(self, initial: ResolvedSources) -> Result<(), SchedulerError> {
        let (tx, rx) = watch::channel(initial);

        info!(
            run_interval_secs = self.settings.run_interval,
            refresh_interval_secs = self.settings.refresh_interval,
            "Scheduler started"
        );

        tokio::try_join!(
            refresh_loop(self.refresher, &self.settings, tx),
            execute_loop(self.executor, &self.settings, rx),
        )?;
        Ok(())
    }
}

async fn refresh_loop(
    mut refresher: Refresher,
    settings: &Settings,
    tx: watch::Sender<ResolvedSources>,
) -> Result<(), SchedulerError> {
    let period = settings.refresh_period();
    // The first cycle already ran in `prepare`
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        match refresher.refresh().await {
            Ok(sources) => {
                tx.send_replace(sources);
            }
            Err(e) if settings.keep_last_good => {
                warn!(error = %e, "Refresh failed, keeping previous sources");
            }
            Err(e) => {
                error!(error = %e, "Refresh failed");
                return Err(e.into());
            }
        }
    }
}

async fn execute_loop(
    executor: Executor,
    settings: &Settings,
    rx: watch::Receiver<ResolvedSources>,
) -> Result<(), SchedulerError> {
    let mut ticker = interval(settings.run_period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let sources = rx.borrow().clone();
        executor.execute(&sources).await;
    }
}
