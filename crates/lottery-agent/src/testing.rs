//! Scripted forum used by the agent's unit tests.

use async_trait::async_trait;
use forum_client::{
    CreatedPost, ForumApi, ForumError, ForumResult, Post, PostStream, Topic, TopicDetail,
    TopicFilter, TopicList, TopicListBody,
};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Mutex;

pub fn topic(id: u64, title: &str) -> Topic {
    Topic {
        id,
        title: title.to_string(),
        reply_count: 0,
        posts_count: 1,
        views: 0,
        category_id: None,
        pinned: false,
        visible: true,
        closed: false,
        archived: false,
        last_posted_at: None,
    }
}

pub fn topic_list(topics: Vec<Topic>, more: Option<&str>) -> TopicList {
    TopicList {
        users: vec![],
        topic_list: TopicListBody {
            topics,
            more_topics_url: more.map(str::to_string),
        },
    }
}

fn post(topic_id: u64, floor: u32, username: &str, raw: &str) -> Post {
    Post {
        id: topic_id * 1000 + floor as u64,
        username: username.to_string(),
        raw: raw.to_string(),
        cooked: format!("<p>{}</p>", raw),
        post_number: floor,
        reply_to_post_number: None,
        created_at: None,
        actions_summary: vec![],
    }
}

/// A topic whose opening post says `body`, followed by replies from
/// `repliers` at floors 2, 3, ...
pub fn detail(id: u64, title: &str, body: &str, repliers: &[&str]) -> TopicDetail {
    let mut posts = vec![post(id, 1, "op", body)];
    for (i, name) in repliers.iter().enumerate() {
        posts.push(post(id, i as u32 + 2, name, "reply"));
    }
    TopicDetail {
        id,
        title: title.to_string(),
        category_id: None,
        posts_count: posts.len() as u32,
        post_stream: PostStream {
            stream: posts.iter().map(|p| p.id).collect(),
            posts,
        },
    }
}

#[derive(Default)]
pub struct ScriptedForum {
    pub username: String,
    /// `None` makes the unread listing fail.
    pub unread: Option<TopicList>,
    pub latest: TopicList,
    pub more: HashMap<String, TopicList>,
    pub details: HashMap<u64, TopicDetail>,
    pub history: BTreeSet<u64>,
    pub create_failures: Mutex<VecDeque<ForumError>>,
    pub created: Mutex<Vec<(u64, String)>>,
    pub detail_calls: Mutex<Vec<u64>>,
    pub listing_calls: Mutex<Vec<String>>,
}

impl ScriptedForum {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            ..Self::default()
        }
    }

    pub fn with_detail(mut self, detail: TopicDetail) -> Self {
        self.details.insert(detail.id, detail);
        self
    }

    pub fn fail_next_post(&self, err: ForumError) {
        self.create_failures.lock().unwrap().push_back(err);
    }

    pub fn created(&self) -> Vec<(u64, String)> {
        self.created.lock().unwrap().clone()
    }

    pub fn detail_calls(&self) -> Vec<u64> {
        self.detail_calls.lock().unwrap().clone()
    }

    pub fn listing_calls(&self) -> Vec<String> {
        self.listing_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ForumApi for ScriptedForum {
    fn username(&self) -> &str {
        &self.username
    }

    async fn list_topics(&self, filter: TopicFilter) -> ForumResult<TopicList> {
        self.listing_calls
            .lock()
            .unwrap()
            .push(filter.name().to_string());
        match filter {
            TopicFilter::Unread => self.unread.clone().ok_or(ForumError::Http {
                status: 500,
                endpoint: "/unread.json".into(),
                body: String::new(),
            }),
            _ => Ok(self.latest.clone()),
        }
    }

    async fn more_topics(&self, more_url: &str) -> ForumResult<TopicList> {
        self.listing_calls.lock().unwrap().push(more_url.to_string());
        self.more.get(more_url).cloned().ok_or(ForumError::Http {
            status: 404,
            endpoint: more_url.to_string(),
            body: String::new(),
        })
    }

    async fn topic(&self, topic_id: u64) -> ForumResult<TopicDetail> {
        self.detail_calls.lock().unwrap().push(topic_id);
        self.details.get(&topic_id).cloned().ok_or(ForumError::Http {
            status: 404,
            endpoint: format!("/t/{}.json", topic_id),
            body: String::new(),
        })
    }

    async fn posts_by_ids(&self, _topic_id: u64, _post_ids: &[u64]) -> ForumResult<Vec<Post>> {
        Ok(vec![])
    }

    async fn create_post(
        &self,
        topic_id: u64,
        raw: &str,
        _reply_to: Option<u32>,
    ) -> ForumResult<CreatedPost> {
        if let Some(err) = self.create_failures.lock().unwrap().pop_front() {
            return Err(err);
        }
        let mut created = self.created.lock().unwrap();
        created.push((topic_id, raw.to_string()));
        Ok(CreatedPost {
            id: created.len() as u64,
            topic_id,
            post_number: 2,
        })
    }

    async fn like_post(&self, _post_id: u64) -> ForumResult<()> {
        Ok(())
    }

    async fn unlike_post(&self, _post_id: u64) -> ForumResult<()> {
        Ok(())
    }

    async fn user_replied_topics(&self) -> ForumResult<BTreeSet<u64>> {
        Ok(self.history.clone())
    }
}
