//! Harvest coordinator - main run orchestration logic
//!
//! This module ties the phases of a run together:
//! - Opening the state store, output log and session (setup failures abort)
//! - Running the discovery walk unless asked to skip it
//! - Deriving the work queue from the store
//! - Driving extraction workers and persisting each item's outcome
//! - Checkpointing session credentials at the end

use crate::config::Config;
use crate::crawler::discovery::{walk, WalkReport};
use crate::crawler::extractor::extract;
use crate::crawler::governor::Session;
use crate::crawler::queue::build_work_queue;
use crate::output::{CsvSink, ItemMeta};
use crate::state::OutcomeStatus;
use crate::storage::{now_timestamp, ItemRecord, OutcomeRecord, SqliteStorage, Storage};
use crate::RippleError;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinSet;

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Discovery report, if discovery ran
    pub discovery: Option<WalkReport>,

    /// Items in the work queue
    pub queued: usize,

    /// Items already done before this run started
    pub already_done: u64,

    /// Items extracted successfully in this run
    pub succeeded: usize,

    /// Items that failed in this run
    pub failed: usize,
}

/// Main harvest coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    storage: Arc<AsyncMutex<SqliteStorage>>,
    sink: Arc<Mutex<CsvSink>>,
    session: Arc<Session>,
}

/// State shared by the extraction workers
struct WorkerContext {
    storage: Arc<AsyncMutex<SqliteStorage>>,
    sink: Arc<Mutex<CsvSink>>,
    session: Arc<Session>,
    queue: Mutex<VecDeque<(usize, ItemRecord)>>,
    total: usize,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The run configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Store, output log and session are ready
    /// * `Err(RippleError)` - Setup failed; nothing has been fetched
    pub fn new(config: Config) -> Result<Self, RippleError> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let sink = CsvSink::new(&config.output.csv_path);
        let session = Session::open(&config)?;

        Ok(Self {
            config: Arc::new(config),
            storage: Arc::new(AsyncMutex::new(storage)),
            sink: Arc::new(Mutex::new(sink)),
            session: Arc::new(session),
        })
    }

    /// Shared handle to the state store
    pub fn storage(&self) -> Arc<AsyncMutex<SqliteStorage>> {
        Arc::clone(&self.storage)
    }

    /// Runs discovery (unless skipped) and then scrapes every pending item
    ///
    /// Per-item failures are recorded as `error` outcomes and never stop
    /// the run. A failing state store does.
    pub async fn run(&mut self) -> Result<RunSummary, RippleError> {
        let mut summary = RunSummary::default();

        if self.config.run.skip_discovery {
            tracing::info!("Skipping discovery, resuming from stored items");
        } else {
            let mut storage = self.storage.lock().await;
            let report = walk(&self.session, &self.config.catalog, &mut *storage).await?;
            summary.discovery = Some(report);
        }

        let queue = {
            let storage = self.storage.lock().await;
            summary.already_done = storage.count_outcomes_by_status(OutcomeStatus::Ok)?;
            build_work_queue(
                &*storage,
                self.config.run.retry_errors,
                self.config.run.max_items,
            )?
        };
        summary.queued = queue.len();

        tracing::info!(
            "Scraping {} items (already done: {})",
            summary.queued,
            summary.already_done
        );

        if !queue.is_empty() {
            let (succeeded, failed) = self.scrape(queue).await?;
            summary.succeeded = succeeded;
            summary.failed = failed;
        }

        tracing::debug!(
            "Saving session credentials after {} successful items",
            self.session.successes()
        );
        if let Err(e) = self.session.save_credentials().await {
            tracing::warn!("Failed to save session credentials: {}", e);
        }

        tracing::info!(
            "Run finished: {} ok, {} errors",
            summary.succeeded,
            summary.failed
        );

        Ok(summary)
    }

    /// Drives the workers over `items` and returns (succeeded, failed)
    async fn scrape(&self, items: Vec<ItemRecord>) -> Result<(usize, usize), RippleError> {
        let total = items.len();
        let context = Arc::new(WorkerContext {
            storage: Arc::clone(&self.storage),
            sink: Arc::clone(&self.sink),
            session: Arc::clone(&self.session),
            queue: Mutex::new(items.into_iter().enumerate().collect()),
            total,
        });

        let workers = (self.config.run.workers.max(1) as usize).min(total);
        let mut tasks = JoinSet::new();
        for worker in 0..workers {
            let context = Arc::clone(&context);
            tasks.spawn(async move { run_worker(worker, context).await });
        }

        let mut succeeded = 0;
        let mut failed = 0;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined
                .map_err(|e| RippleError::Worker(e.to_string()))
                .and_then(|result| result);
            match outcome {
                Ok((ok, errors)) => {
                    succeeded += ok;
                    failed += errors;
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        Ok((succeeded, failed))
    }
}

/// Takes items off the shared queue until it is empty
async fn run_worker(
    worker: usize,
    context: Arc<WorkerContext>,
) -> Result<(usize, usize), RippleError> {
    let pacer = context.session.item_pacer();
    let mut succeeded = 0;
    let mut failed = 0;

    loop {
        let next = lock(&context.queue)?.pop_front();
        let Some((index, item)) = next else {
            break;
        };

        pacer.pause().await;
        if process_item(&context, index + 1, &item).await? {
            succeeded += 1;
        } else {
            failed += 1;
        }
    }

    tracing::debug!("Worker {} done: {} ok, {} errors", worker, succeeded, failed);
    Ok((succeeded, failed))
}

/// Extracts one item and persists its outcome
///
/// Returns whether the item succeeded. Only state store failures are errors.
async fn process_item(
    context: &WorkerContext,
    position: usize,
    item: &ItemRecord,
) -> Result<bool, RippleError> {
    let timestamp = now_timestamp();

    let written = match extract(&context.session, item).await {
        Ok(extraction) => {
            let product_name = if extraction.product_name.is_empty() {
                item.display_name.clone().unwrap_or_default()
            } else {
                extraction.product_name
            };
            let meta = ItemMeta {
                item_id: &item.id,
                product_name: &product_name,
                source_url: &item.detail_url,
                category: &item.category,
                family: &item.family,
            };
            let sink = lock(&context.sink)?;
            sink.append(&meta, &extraction.fields, &timestamp)
                .map_err(|e| format!("output log write failed: {}", e))
        }
        Err(e) => Err(e.to_string()),
    };

    match written {
        Ok(rows) => {
            context
                .storage
                .lock()
                .await
                .upsert_outcome(&OutcomeRecord::ok(&item.id, &timestamp))?;
            tracing::info!("[{}/{}] OK id={} rows={}", position, context.total, item.id, rows);
            context.session.record_success().await;
            Ok(true)
        }
        Err(detail) => {
            context
                .storage
                .lock()
                .await
                .upsert_outcome(&OutcomeRecord::error(&item.id, &timestamp, &detail))?;
            tracing::warn!("[{}/{}] ERROR id={}: {}", position, context.total, item.id, detail);
            Ok(false)
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, RippleError> {
    mutex
        .lock()
        .map_err(|_| RippleError::Worker("shared state lock poisoned".to_string()))
}

/// Runs a complete harvest with the given configuration
///
/// # Example
///
/// ```no_run
/// use catalog_ripple::config::Config;
/// use catalog_ripple::crawler::run_harvest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = run_harvest(Config::default()).await?;
/// println!("{} items scraped", summary.succeeded);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config) -> Result<RunSummary, RippleError> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run().await
}
