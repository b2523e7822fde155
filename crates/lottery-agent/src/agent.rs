//! The agent: startup reconciliation, timed scans, and the reply worker.

use crate::queue::ReplyQueue;
use crate::scanner::Scanner;
use crate::state::StateStore;
use crate::worker::{shutdown_requested, ReplyWorker, WorkerReport};
use crate::{AgentConfig, AgentError, AgentResult};
use chrono::Utc;
use forum_client::ForumApi;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

/// A configured agent bound to one forum session.
pub struct LotteryAgent {
    api: Arc<dyn ForumApi>,
    state: Arc<StateStore>,
    queue: Arc<ReplyQueue>,
    scanner: Scanner,
    config: AgentConfig,
}

impl LotteryAgent {
    pub fn new(
        api: Arc<dyn ForumApi>,
        state: Arc<StateStore>,
        config: AgentConfig,
    ) -> AgentResult<Self> {
        config.validate()?;
        let queue = Arc::new(ReplyQueue::new(config.queue_capacity));
        let scanner = Scanner::new(api.clone(), state.clone(), queue.clone(), config.clone());
        Ok(Self {
            api,
            state,
            queue,
            scanner,
            config,
        })
    }

    pub fn state(&self) -> &Arc<StateStore> {
        &self.state
    }

    pub fn queue(&self) -> &Arc<ReplyQueue> {
        &self.queue
    }

    /// Merge the server's reply history into local state. Failures are
    /// logged and the local record is used as is.
    pub async fn reconcile(&self) -> usize {
        match self.api.user_replied_topics().await {
            Ok(remote) => {
                let added = self.state.merge_remote(remote);
                info!(
                    added,
                    total = self.state.replied_count(),
                    "Reconciled reply history with the server"
                );
                added
            }
            Err(e) => {
                warn!(error = %e, "Loading reply history failed, using local records");
                0
            }
        }
    }

    /// Run until `shutdown` flips to true.
    ///
    /// Scans never overlap: the next tick is only awaited after the current
    /// scan returns. Shutdown is observed between scans and inside the
    /// worker's pauses.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> AgentResult<WorkerReport> {
        let receiver = self.queue.take_receiver().ok_or(AgentError::AlreadyStarted)?;

        if self.config.reconcile_history {
            self.reconcile().await;
        }
        let pruned = self.state.prune(
            chrono::Duration::days(self.config.retention_days),
            Utc::now(),
        );
        if pruned > 0 {
            info!(pruned, "Pruned old reply records");
        }

        let worker = ReplyWorker::new(
            self.api.clone(),
            self.state.clone(),
            self.queue.clone(),
            &self.config,
        );
        let worker_handle = tokio::spawn(worker.run(receiver, shutdown.clone()));

        info!(
            interval_secs = self.config.check_interval.as_secs(),
            keywords = ?self.config.keywords,
            "Lottery agent started"
        );

        let mut ticker = interval(self.config.check_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_rx = shutdown;

        loop {
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown_rx) => {
                    info!("Shutdown requested");
                    break;
                }
                _ = ticker.tick() => {
                    match self.scanner.scan_once().await {
                        Ok(report) => info!(
                            pages = report.pages,
                            checked = report.topics_checked,
                            matches = report.matches,
                            queued = report.queued,
                            skipped_replied = report.skipped_replied,
                            server_confirmed = report.server_confirmed,
                            dropped = report.dropped,
                            "Scan complete"
                        ),
                        Err(e) => error!(error = %e, "Scan failed, retrying next cycle"),
                    }
                }
            }
        }

        self.queue.close();
        match worker_handle.await {
            Ok(report) => Ok(report),
            Err(e) => {
                error!(error = %e, "Reply worker panicked");
                Ok(WorkerReport::default())
            }
        }
    }
}
