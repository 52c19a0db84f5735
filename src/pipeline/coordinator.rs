//! Bounded fan-out of keyword pipelines

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::{FutureExt, StreamExt, stream};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::TaskResult;
use super::error::PipelineError;
use super::task::run_keyword;
use crate::config::Settings;
use crate::monitor::ResourceMonitor;
use crate::search::SearchProvider;
use crate::site::SiteEmitter;

/// How keyword pipelines are scheduled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Each keyword runs as a spawned task, admitted through a semaphore
    #[default]
    Pooled,

    /// Keywords are polled concurrently on the calling task
    Inline,
}

/// Runs the keyword pipeline for many keywords with bounded concurrency
pub struct Coordinator<P> {
    provider: Arc<P>,
    emitter: Arc<SiteEmitter>,
    monitor: ResourceMonitor,
    max_workers: usize,
    mode: ExecutionMode,
}

impl<P: SearchProvider + 'static> Coordinator<P> {
    pub fn new(provider: Arc<P>, emitter: Arc<SiteEmitter>, settings: &Settings) -> Self {
        Self {
            provider,
            emitter,
            monitor: ResourceMonitor::new(settings.max_memory_percent),
            max_workers: settings.max_workers.max(1),
            mode: ExecutionMode::default(),
        }
    }

    /// Replace the memory monitor
    pub fn with_monitor(mut self, monitor: ResourceMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Run every keyword and return one result per keyword.
    ///
    /// Returns only after every keyword has finished. When `progress` is given, each
    /// finished keyword is sent on it.
    pub async fn run(
        &self,
        keywords: &[String],
        progress: Option<mpsc::Sender<String>>,
    ) -> Vec<TaskResult> {
        info!(
            "Processing {} keywords with {} workers ({:?})",
            keywords.len(),
            self.max_workers,
            self.mode
        );

        let results = match self.mode {
            ExecutionMode::Pooled => self.run_pooled(keywords, progress).await,
            ExecutionMode::Inline => self.run_inline(keywords, progress).await,
        };

        let failed = results.iter().filter(|r| !r.is_success()).count();
        info!(
            "Finished {} keywords: {} generated, {} failed",
            results.len(),
            results.len() - failed,
            failed
        );
        results
    }

    async fn run_pooled(
        &self,
        keywords: &[String],
        progress: Option<mpsc::Sender<String>>,
    ) -> Vec<TaskResult> {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let mut tasks = JoinSet::new();
        let mut results = Vec::with_capacity(keywords.len());

        for keyword in keywords {
            // Admission happens here so a queued keyword is not counted as running
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("Failed to acquire worker for {}: {}", keyword, e);
                    results.push(TaskResult::failed(keyword.clone(), "worker pool closed"));
                    continue;
                }
            };
            self.check_memory(keyword);

            let provider = self.provider.clone();
            let emitter = self.emitter.clone();
            let progress = progress.clone();
            let keyword = keyword.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let result = execute(provider.as_ref(), &emitter, &keyword).await;
                report(progress.as_ref(), &result).await;
                result
            });
        }

        // Panics are caught inside `execute`, so a join error means the task was cancelled
        let mut join_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => {
                    let err = PipelineError::from(e);
                    error!("Keyword task failed: {}", err);
                    join_error = Some(err.to_string());
                }
            }
        }

        if let Some(reason) = join_error {
            let finished: HashSet<String> = results.iter().map(|r| r.keyword.clone()).collect();
            for keyword in keywords.iter().filter(|k| !finished.contains(*k)) {
                results.push(TaskResult::failed(keyword.clone(), reason.clone()));
            }
        }

        results
    }

    async fn run_inline(
        &self,
        keywords: &[String],
        progress: Option<mpsc::Sender<String>>,
    ) -> Vec<TaskResult> {
        stream::iter(keywords)
            .map(|keyword| {
                self.check_memory(keyword);
                let progress = progress.clone();
                async move {
                    let result = execute(self.provider.as_ref(), &self.emitter, keyword).await;
                    report(progress.as_ref(), &result).await;
                    result
                }
            })
            .buffer_unordered(self.max_workers)
            .collect()
            .await
    }

    /// Soft throttle: warn when memory is above the ceiling, never block
    fn check_memory(&self, keyword: &str) {
        if let Some(percent) = self.monitor.over_ceiling() {
            warn!(
                "Memory usage {:.1}% exceeds {:.1}% while starting {}",
                percent,
                self.monitor.max_memory_percent(),
                keyword
            );
        }
    }
}

/// Run one keyword, turning errors and panics into a failed result
async fn execute<P: SearchProvider>(provider: &P, emitter: &SiteEmitter, keyword: &str) -> TaskResult {
    let outcome = AssertUnwindSafe(run_keyword(provider, emitter, keyword))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(PipelineError::Panicked(panic_message(panic.as_ref()))));

    match outcome {
        Ok(site) => TaskResult::generated(keyword, site),
        Err(e) => {
            error!("Keyword {} failed: {}", keyword, e);
            TaskResult::failed(keyword, e.to_string())
        }
    }
}

async fn report(progress: Option<&mpsc::Sender<String>>, result: &TaskResult) {
    if let Some(sender) = progress {
        // Ignore errors from sending (e.g., if receiver is dropped)
        let _ = sender.send(result.keyword.clone()).await;
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
