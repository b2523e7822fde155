//! One scan cycle: list, match, de-duplicate, enqueue.

use crate::matcher::KeywordMatcher;
use crate::queue::{EnqueueOutcome, ReplyQueue, ReplyTask};
use crate::state::StateStore;
use crate::{AgentConfig, AgentResult};
use chrono::Utc;
use forum_client::{ForumApi, Topic, TopicFilter};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters for one scan cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub pages: usize,
    pub topics_checked: usize,
    pub matches: usize,
    pub queued: usize,
    pub skipped_replied: usize,
    pub skipped_pending: usize,
    pub server_confirmed: usize,
    pub dropped: usize,
    pub detail_errors: usize,
}

/// Producer side of the agent.
pub struct Scanner {
    api: Arc<dyn ForumApi>,
    state: Arc<StateStore>,
    queue: Arc<ReplyQueue>,
    matcher: KeywordMatcher,
    config: AgentConfig,
}

impl Scanner {
    pub fn new(
        api: Arc<dyn ForumApi>,
        state: Arc<StateStore>,
        queue: Arc<ReplyQueue>,
        config: AgentConfig,
    ) -> Self {
        Self {
            matcher: KeywordMatcher::new(&config.keywords),
            api,
            state,
            queue,
            config,
        }
    }

    /// Collect up to `max_topics` topics over at most `max_pages` pages.
    async fn collect_topics(&self, report: &mut ScanReport) -> AgentResult<Vec<Topic>> {
        let first = if self.config.prefer_unread {
            match self.api.list_topics(TopicFilter::Unread).await {
                Ok(list) => list,
                Err(e) => {
                    warn!(error = %e, "Unread listing failed, falling back to latest");
                    self.api.list_topics(TopicFilter::Latest).await?
                }
            }
        } else {
            self.api.list_topics(TopicFilter::Latest).await?
        };
        report.pages = 1;

        let mut cursor = first.more_cursor().map(str::to_string);
        let mut topics = first.topic_list.topics;

        while report.pages < self.config.max_pages && topics.len() < self.config.max_topics {
            let Some(more_url) = cursor.take() else {
                break;
            };
            tokio::time::sleep(self.config.page_delay).await;

            match self.api.more_topics(&more_url).await {
                Ok(list) => {
                    cursor = list.more_cursor().map(str::to_string);
                    topics.extend(list.topic_list.topics);
                    report.pages += 1;
                }
                Err(e) => {
                    warn!(error = %e, page = report.pages + 1, "Loading more topics failed");
                    break;
                }
            }
        }

        topics.truncate(self.config.max_topics);
        Ok(topics)
    }

    /// Run one cycle. Only a failure of the first listing is an error;
    /// per-topic failures are counted and skipped.
    pub async fn scan_once(&self) -> AgentResult<ScanReport> {
        let mut report = ScanReport::default();
        let topics = self.collect_topics(&mut report).await?;
        debug!(pages = report.pages, topics = topics.len(), "Topics collected");

        for topic in &topics {
            report.topics_checked += 1;

            if self.state.has_replied(topic.id) {
                report.skipped_replied += 1;
                continue;
            }
            if self.queue.is_pending(topic.id) {
                report.skipped_pending += 1;
                continue;
            }

            let detail = match self.api.topic(topic.id).await {
                Ok(detail) => detail,
                Err(e) => {
                    warn!(topic_id = topic.id, error = %e, "Fetching topic detail failed");
                    report.detail_errors += 1;
                    continue;
                }
            };

            let matched = self.matcher.match_topic(&topic.title, &detail);
            if !matched.is_candidate() {
                continue;
            }
            report.matches += 1;
            info!(
                topic_id = topic.id,
                title = %topic.title,
                title_match = matched.title,
                content_match = matched.content,
                "Lottery topic found"
            );

            // Only the loaded posts are inspected; an older reply deep in a
            // long thread goes unnoticed.
            if detail.has_reply_from(self.api.username()) {
                info!(topic_id = topic.id, "Already replied on the server, recording");
                self.state.record_reply(topic.id);
                report.server_confirmed += 1;
                continue;
            }

            match self
                .queue
                .try_enqueue(ReplyTask::new(topic.id, topic.title.clone()))
            {
                EnqueueOutcome::Queued => report.queued += 1,
                EnqueueOutcome::Dropped => report.dropped += 1,
                EnqueueOutcome::AlreadyPending => report.skipped_pending += 1,
            }
        }

        self.state.mark_checked(Utc::now());
        Ok(report)
    }
}
