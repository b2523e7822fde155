//! Consumer side of the agent: one task at a time, paced like a person.

use crate::queue::{ReplyQueue, ReplyTask};
use crate::reply::ReplyComposer;
use crate::state::StateStore;
use crate::AgentConfig;
use forum_client::ForumApi;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

/// Counters over a worker's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    pub replied: usize,
    pub failed: usize,
    pub rate_limited: usize,
    pub skipped: usize,
}

enum Flow {
    Continue,
    Stop,
}

/// Posts queued replies in FIFO order.
pub struct ReplyWorker {
    api: Arc<dyn ForumApi>,
    state: Arc<StateStore>,
    queue: Arc<ReplyQueue>,
    composer: ReplyComposer,
    rate_limit_cooldown: Duration,
    rng: StdRng,
}

impl ReplyWorker {
    pub fn new(
        api: Arc<dyn ForumApi>,
        state: Arc<StateStore>,
        queue: Arc<ReplyQueue>,
        config: &AgentConfig,
    ) -> Self {
        Self {
            api,
            state,
            queue,
            composer: ReplyComposer::from_config(config),
            rate_limit_cooldown: config.rate_limit_cooldown,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the random source, for reproducible runs.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Consume tasks until the channel closes or shutdown is signalled.
    ///
    /// Shutdown interrupts the pre-post delay and the rate-limit cooldown;
    /// a task interrupted before posting is abandoned, not posted.
    pub async fn run(
        mut self,
        mut receiver: mpsc::Receiver<ReplyTask>,
        mut shutdown: watch::Receiver<bool>,
    ) -> WorkerReport {
        let mut report = WorkerReport::default();
        info!("Reply worker started");

        loop {
            let task = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                task = receiver.recv() => match task {
                    Some(task) => task,
                    None => break,
                },
            };

            let topic_id = task.topic_id;
            let flow = self.handle(task, &mut shutdown, &mut report).await;
            self.queue.complete(topic_id);
            if let Flow::Stop = flow {
                break;
            }
        }

        info!(
            replied = report.replied,
            failed = report.failed,
            rate_limited = report.rate_limited,
            "Reply worker stopped"
        );
        report
    }

    async fn handle(
        &mut self,
        task: ReplyTask,
        shutdown: &mut watch::Receiver<bool>,
        report: &mut WorkerReport,
    ) -> Flow {
        if self.state.has_replied(task.topic_id) {
            debug!(topic_id = task.topic_id, "Already replied, skipping task");
            report.skipped += 1;
            return Flow::Continue;
        }

        let delay = self.composer.delay(&mut self.rng);
        debug!(topic_id = task.topic_id, delay_ms = delay.as_millis() as u64, "Waiting before reply");
        if !pause(delay, shutdown).await {
            return Flow::Stop;
        }

        let text = match task.content {
            Some(text) => text,
            None => self.composer.compose(&mut self.rng).text,
        };

        match self.api.create_post(task.topic_id, &text, None).await {
            Ok(created) => {
                self.state.record_reply(task.topic_id);
                report.replied += 1;
                info!(
                    topic_id = task.topic_id,
                    post_id = created.id,
                    title = %task.title,
                    reply = %text,
                    "Replied"
                );
                Flow::Continue
            }
            Err(e) if e.is_rate_limited() => {
                report.rate_limited += 1;
                warn!(
                    topic_id = task.topic_id,
                    error = %e,
                    cooldown_secs = self.rate_limit_cooldown.as_secs(),
                    "Rate limited, cooling down"
                );
                if pause(self.rate_limit_cooldown, shutdown).await {
                    Flow::Continue
                } else {
                    Flow::Stop
                }
            }
            Err(e) => {
                report.failed += 1;
                error!(topic_id = task.topic_id, error = %e, "Reply failed, skipping topic");
                Flow::Continue
            }
        }
    }
}

/// Sleep for `duration`. Returns false if shutdown cut it short.
async fn pause(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        biased;
        _ = shutdown_requested(shutdown) => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Resolves once shutdown is signalled; never resolves if the sender is gone
/// without signalling.
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::EnqueueOutcome;
    use crate::testing::ScriptedForum;
    use forum_client::ForumError;
    use tempfile::tempdir;
    use tokio::time::Instant;

    struct Harness {
        forum: Arc<ScriptedForum>,
        state: Arc<StateStore>,
        queue: Arc<ReplyQueue>,
        worker: ReplyWorker,
        receiver: mpsc::Receiver<ReplyTask>,
        _dir: tempfile::TempDir,
    }

    fn harness(forum: ScriptedForum) -> Harness {
        let dir = tempdir().unwrap();
        let config = AgentConfig::default();
        let forum = Arc::new(forum);
        let state = Arc::new(StateStore::open(dir.path().join("state.json")));
        let queue = Arc::new(ReplyQueue::new(config.queue_capacity));
        let receiver = queue.take_receiver().unwrap();
        let worker = ReplyWorker::new(forum.clone(), state.clone(), queue.clone(), &config)
            .with_rng(StdRng::seed_from_u64(11));
        Harness {
            forum,
            state,
            queue,
            worker,
            receiver,
            _dir: dir,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_replies_in_fifo_order_and_records_state() {
        let h = harness(ScriptedForum::new("me"));
        for id in [30, 10, 20] {
            assert_eq!(h.queue.try_enqueue(ReplyTask::new(id, "抽奖")), EnqueueOutcome::Queued);
        }
        h.queue.close();
        let (_tx, shutdown) = watch::channel(false);

        let start = Instant::now();
        let report = h.worker.run(h.receiver, shutdown).await;

        assert_eq!(report.replied, 3);
        let order: Vec<u64> = h.forum.created().iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![30, 10, 20]);
        assert!(h.state.has_replied(30) && h.state.has_replied(10) && h.state.has_replied(20));
        assert!(!h.queue.is_pending(10));
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_cools_down_and_does_not_retry() {
        let h = harness(ScriptedForum::new("me"));
        h.forum.fail_next_post(ForumError::RateLimited {
            message: "slow down".into(),
            wait_seconds: Some(5),
        });
        h.queue.try_enqueue(ReplyTask::new(1, "a"));
        h.queue.try_enqueue(ReplyTask::new(2, "b"));
        h.queue.close();
        let (_tx, shutdown) = watch::channel(false);

        let start = Instant::now();
        let report = h.worker.run(h.receiver, shutdown).await;

        assert_eq!(report.rate_limited, 1);
        assert_eq!(report.replied, 1);
        assert_eq!(h.forum.created().len(), 1);
        assert_eq!(h.forum.created()[0].0, 2);
        assert!(!h.state.has_replied(1));
        assert!(start.elapsed() >= Duration::from_secs(60 + 20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_failures_are_skipped() {
        let h = harness(ScriptedForum::new("me"));
        h.forum.fail_next_post(ForumError::Http {
            status: 422,
            endpoint: "/posts.json".into(),
            body: "too similar".into(),
        });
        h.queue.try_enqueue(ReplyTask::new(1, "a"));
        h.queue.close();
        let (_tx, shutdown) = watch::channel(false);

        let report = h.worker.run(h.receiver, shutdown).await;
        assert_eq!(report.failed, 1);
        assert!(h.forum.created().is_empty());
        assert!(!h.queue.is_pending(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_replied_task_is_skipped() {
        let h = harness(ScriptedForum::new("me"));
        h.state.record_reply(3);
        h.queue.try_enqueue(ReplyTask::new(3, "a"));
        h.queue.close();
        let (_tx, shutdown) = watch::channel(false);

        let report = h.worker.run(h.receiver, shutdown).await;
        assert_eq!(report.skipped, 1);
        assert!(h.forum.created().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_precomposed_content_is_posted_verbatim() {
        let h = harness(ScriptedForum::new("me"));
        h.queue.try_enqueue(ReplyTask {
            topic_id: 8,
            title: "t".into(),
            content: Some("来了来了".into()),
        });
        h.queue.close();
        let (_tx, shutdown) = watch::channel(false);

        h.worker.run(h.receiver, shutdown).await;
        assert_eq!(h.forum.created(), vec![(8, "来了来了".to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_delay_without_posting() {
        let h = harness(ScriptedForum::new("me"));
        h.queue.try_enqueue(ReplyTask::new(1, "a"));
        let (tx, shutdown) = watch::channel(false);

        let worker = tokio::spawn(h.worker.run(h.receiver, shutdown));
        tokio::time::sleep(Duration::from_secs(1)).await;
        tx.send(true).unwrap();

        let report = worker.await.unwrap();
        assert_eq!(report.replied, 0);
        assert!(h.forum.created().is_empty());
        assert!(!h.queue.is_pending(1));
    }
}
