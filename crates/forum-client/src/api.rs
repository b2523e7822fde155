//! The operations the pager and the agent need, as a trait.

use crate::client::CreatedPost;
use crate::models::{Post, TopicDetail, TopicFilter, TopicList};
use crate::{ForumClient, ForumResult};
use async_trait::async_trait;
use std::collections::BTreeSet;

/// Forum operations consumed by higher layers.
#[async_trait]
pub trait ForumApi: Send + Sync {
    /// Name of the authenticated user.
    fn username(&self) -> &str;

    async fn list_topics(&self, filter: TopicFilter) -> ForumResult<TopicList>;

    async fn more_topics(&self, more_url: &str) -> ForumResult<TopicList>;

    async fn topic(&self, topic_id: u64) -> ForumResult<TopicDetail>;

    async fn posts_by_ids(&self, topic_id: u64, post_ids: &[u64]) -> ForumResult<Vec<Post>>;

    async fn create_post(
        &self,
        topic_id: u64,
        raw: &str,
        reply_to_post_number: Option<u32>,
    ) -> ForumResult<CreatedPost>;

    async fn like_post(&self, post_id: u64) -> ForumResult<()>;

    async fn unlike_post(&self, post_id: u64) -> ForumResult<()>;

    async fn user_replied_topics(&self) -> ForumResult<BTreeSet<u64>>;
}

#[async_trait]
impl ForumApi for ForumClient {
    fn username(&self) -> &str {
        ForumClient::username(self)
    }

    async fn list_topics(&self, filter: TopicFilter) -> ForumResult<TopicList> {
        ForumClient::list_topics(self, filter).await
    }

    async fn more_topics(&self, more_url: &str) -> ForumResult<TopicList> {
        ForumClient::more_topics(self, more_url).await
    }

    async fn topic(&self, topic_id: u64) -> ForumResult<TopicDetail> {
        ForumClient::topic(self, topic_id).await
    }

    async fn posts_by_ids(&self, topic_id: u64, post_ids: &[u64]) -> ForumResult<Vec<Post>> {
        ForumClient::posts_by_ids(self, topic_id, post_ids).await
    }

    async fn create_post(
        &self,
        topic_id: u64,
        raw: &str,
        reply_to_post_number: Option<u32>,
    ) -> ForumResult<CreatedPost> {
        ForumClient::create_post(self, topic_id, raw, reply_to_post_number).await
    }

    async fn like_post(&self, post_id: u64) -> ForumResult<()> {
        ForumClient::like_post(self, post_id).await
    }

    async fn unlike_post(&self, post_id: u64) -> ForumResult<()> {
        ForumClient::unlike_post(self, post_id).await
    }

    async fn user_replied_topics(&self) -> ForumResult<BTreeSet<u64>> {
        ForumClient::user_replied_topics(self).await
    }
}
