//! Bounded reply queue between the scanner and the reply worker.

use std::collections::HashSet;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

/// Intent to reply to one topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTask {
    pub topic_id: u64,
    pub title: String,
    /// Pre-composed text; the worker composes one when absent.
    pub content: Option<String>,
}

impl ReplyTask {
    pub fn new(topic_id: u64, title: impl Into<String>) -> Self {
        Self {
            topic_id,
            title: title.into(),
            content: None,
        }
    }
}

/// Result of [`ReplyQueue::try_enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    /// Queue full or closed; the task was discarded.
    Dropped,
    /// A task for the same topic is queued or being worked on.
    AlreadyPending,
}

/// FIFO of [`ReplyTask`]s with a fixed capacity.
///
/// Enqueueing never waits. A topic stays pending from enqueue until the
/// worker calls [`ReplyQueue::complete`], so at most one task per topic is
/// ever outstanding.
#[derive(Debug)]
pub struct ReplyQueue {
    sender: Mutex<Option<mpsc::Sender<ReplyTask>>>,
    receiver: Mutex<Option<mpsc::Receiver<ReplyTask>>>,
    pending: Mutex<HashSet<u64>>,
    capacity: usize,
}

impl ReplyQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            pending: Mutex::new(HashSet::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tasks waiting in the channel (not counting one being worked on).
    pub fn len(&self) -> usize {
        match self.sender.lock().unwrap().as_ref() {
            Some(sender) => sender.max_capacity() - sender.capacity(),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_pending(&self, topic_id: u64) -> bool {
        self.pending.lock().unwrap().contains(&topic_id)
    }

    pub fn try_enqueue(&self, task: ReplyTask) -> EnqueueOutcome {
        let topic_id = task.topic_id;
        let mut pending = self.pending.lock().unwrap();
        if pending.contains(&topic_id) {
            return EnqueueOutcome::AlreadyPending;
        }

        let sender = self.sender.lock().unwrap();
        let Some(sender) = sender.as_ref() else {
            warn!(topic_id, "Reply queue closed, dropping task");
            return EnqueueOutcome::Dropped;
        };

        match sender.try_send(task) {
            Ok(()) => {
                pending.insert(topic_id);
                EnqueueOutcome::Queued
            }
            Err(mpsc::error::TrySendError::Full(task)) => {
                warn!(
                    topic_id,
                    title = %task.title,
                    capacity = self.capacity,
                    "Reply queue full, dropping task"
                );
                EnqueueOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!(topic_id, "Reply worker gone, dropping task");
                EnqueueOutcome::Dropped
            }
        }
    }

    /// Release a topic once the worker is done with it.
    pub fn complete(&self, topic_id: u64) {
        self.pending.lock().unwrap().remove(&topic_id);
    }

    /// Hand the receiving end to the worker. Succeeds once.
    pub fn take_receiver(&self) -> Option<mpsc::Receiver<ReplyTask>> {
        self.receiver.lock().unwrap().take()
    }

    /// Stop accepting tasks; the worker sees the end of the channel after
    /// the remaining tasks.
    pub fn close(&self) {
        self.sender.lock().unwrap().take();
    }
}
