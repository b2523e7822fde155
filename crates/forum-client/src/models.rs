//! Wire models for the Discourse JSON endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// `post_action_type_id` of a like.
pub const LIKE_ACTION_TYPE: u32 = 2;

/// Period for the `top` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopPeriod {
    Daily,
    #[default]
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    All,
}

impl TopPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopPeriod::Daily => "daily",
            TopPeriod::Weekly => "weekly",
            TopPeriod::Monthly => "monthly",
            TopPeriod::Quarterly => "quarterly",
            TopPeriod::Yearly => "yearly",
            TopPeriod::All => "all",
        }
    }
}

impl FromStr for TopPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(TopPeriod::Daily),
            "weekly" => Ok(TopPeriod::Weekly),
            "monthly" => Ok(TopPeriod::Monthly),
            "quarterly" => Ok(TopPeriod::Quarterly),
            "yearly" => Ok(TopPeriod::Yearly),
            "all" => Ok(TopPeriod::All),
            other => Err(format!("unknown period '{}'", other)),
        }
    }
}

/// Which topic listing to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopicFilter {
    #[default]
    Latest,
    Hot,
    New,
    Top(TopPeriod),
    Unread,
}

impl TopicFilter {
    /// Endpoint path relative to the forum base URL.
    pub fn path(&self) -> String {
        match self {
            TopicFilter::Latest => "/latest.json".to_string(),
            TopicFilter::Hot => "/hot.json".to_string(),
            TopicFilter::New => "/new.json".to_string(),
            TopicFilter::Top(period) => format!("/top.json?period={}", period.as_str()),
            TopicFilter::Unread => "/unread.json".to_string(),
        }
    }

    /// Short name as typed by users (`top` regardless of period).
    pub fn name(&self) -> &'static str {
        match self {
            TopicFilter::Latest => "latest",
            TopicFilter::Hot => "hot",
            TopicFilter::New => "new",
            TopicFilter::Top(_) => "top",
            TopicFilter::Unread => "unread",
        }
    }
}

impl fmt::Display for TopicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicFilter::Top(period) => write!(f, "top ({})", period.as_str()),
            other => f.write_str(other.name()),
        }
    }
}

impl FromStr for TopicFilter {
    type Err = String;

    /// Accepts `latest`, `hot`, `new`, `unread`, `top` and `top:<period>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        if let Some(period) = s.strip_prefix("top:") {
            return Ok(TopicFilter::Top(period.parse()?));
        }
        match s.as_str() {
            "latest" => Ok(TopicFilter::Latest),
            "hot" => Ok(TopicFilter::Hot),
            "new" => Ok(TopicFilter::New),
            "top" => Ok(TopicFilter::Top(TopPeriod::default())),
            "unread" => Ok(TopicFilter::Unread),
            other => Err(format!(
                "unknown filter '{}' (latest, hot, new, top, unread)",
                other
            )),
        }
    }
}

/// Author reference embedded in topic listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
}

/// One thread summary in a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub reply_count: u32,
    #[serde(default)]
    pub posts_count: u32,
    #[serde(default)]
    pub views: u32,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub last_posted_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicListBody {
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub more_topics_url: Option<String>,
}

/// Response of a listing endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicList {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub topic_list: TopicListBody,
}

impl TopicList {
    pub fn topics(&self) -> &[Topic] {
        &self.topic_list.topics
    }

    /// Continuation cursor; an absent or empty value means no further pages.
    pub fn more_cursor(&self) -> Option<&str> {
        self.topic_list
            .more_topics_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// One entry of a post's action summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSummary {
    pub id: u32,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub acted: bool,
}

/// One floor of a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub username: String,
    /// Markdown source; absent from topic detail responses by default.
    #[serde(default)]
    pub raw: String,
    /// Rendered HTML.
    #[serde(default)]
    pub cooked: String,
    pub post_number: u32,
    #[serde(default)]
    pub reply_to_post_number: Option<u32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actions_summary: Vec<ActionSummary>,
}

impl Post {
    fn like_summary(&self) -> Option<&ActionSummary> {
        self.actions_summary
            .iter()
            .find(|a| a.id == LIKE_ACTION_TYPE)
    }

    /// Whether the current user has liked this post.
    pub fn is_liked(&self) -> bool {
        self.like_summary().map(|a| a.acted).unwrap_or(false)
    }

    pub fn like_count(&self) -> u32 {
        self.like_summary().and_then(|a| a.count).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostStream {
    #[serde(default)]
    pub posts: Vec<Post>,
    /// Every post id of the thread in floor order.
    #[serde(default)]
    pub stream: Vec<u64>,
}

/// Full thread state as returned by `/t/{id}.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicDetail {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub posts_count: u32,
    #[serde(default)]
    pub post_stream: PostStream,
}

impl TopicDetail {
    /// The opening post, if it is among the loaded posts.
    pub fn first_post(&self) -> Option<&Post> {
        self.post_stream.posts.iter().find(|p| p.post_number == 1)
    }

    /// Whether `username` already has a reply (floor > 1) among the loaded
    /// posts. Posts beyond the first loaded batch are not inspected.
    pub fn has_reply_from(&self, username: &str) -> bool {
        self.post_stream
            .posts
            .iter()
            .any(|p| p.post_number > 1 && p.username == username)
    }
}

/// One full-text search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: u64,
    pub username: String,
    pub topic_id: u64,
    pub post_number: u32,
    pub like_count: u32,
    pub blurb: String,
    /// Joined from the response's topic list; empty when the topic is absent.
    pub topic_title: String,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub query: String,
    pub page: u32,
    pub results: Vec<SearchResult>,
    /// Set only when the server reports more results.
    pub next_page: Option<u32>,
}

/// A saved bookmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    /// Path relative to the forum base URL.
    #[serde(default)]
    pub bookmarkable_url: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub topic_id: Option<u64>,
}

impl Bookmark {
    /// `YYYY-MM-DD` of creation, or `-` when unknown.
    pub fn created_date(&self) -> String {
        self.created_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub posts: Vec<SearchPost>,
    #[serde(default)]
    pub topics: Vec<SearchTopic>,
    #[serde(default)]
    pub grouped_search_result: Option<GroupedSearchResult>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchPost {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    pub topic_id: u64,
    #[serde(default)]
    pub post_number: u32,
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub blurb: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchTopic {
    pub id: u64,
    #[serde(default)]
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GroupedSearchResult {
    #[serde(default)]
    pub more_full_page_results: Option<bool>,
}

impl SearchResponse {
    pub fn into_page(self, query: &str, page: u32) -> SearchPage {
        let SearchResponse {
            posts,
            topics,
            grouped_search_result,
        } = self;

        let results = posts
            .into_iter()
            .map(|p| SearchResult {
                topic_title: topics
                    .iter()
                    .find(|t| t.id == p.topic_id)
                    .map(|t| t.title.clone())
                    .unwrap_or_default(),
                id: p.id,
                username: p.username,
                topic_id: p.topic_id,
                post_number: p.post_number,
                like_count: p.like_count,
                blurb: p.blurb,
            })
            .collect();

        let has_more = grouped_search_result
            .and_then(|g| g.more_full_page_results)
            .unwrap_or(false);

        SearchPage {
            query: query.to_string(),
            page,
            results,
            next_page: has_more.then_some(page + 1),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostsResponse {
    #[serde(default)]
    pub post_stream: PostStream,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CsrfResponse {
    pub csrf: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserActionsResponse {
    #[serde(default)]
    pub user_actions: Vec<UserAction>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserAction {
    pub action_type: u32,
    pub topic_id: u64,
    #[serde(default)]
    pub post_number: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BookmarksResponse {
    #[serde(default)]
    pub user_bookmark_list: Option<BookmarkListBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BookmarkListBody {
    #[serde(default)]
    pub bookmarks: Vec<Bookmark>,
    #[serde(default)]
    pub more_bookmarks_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_paths() {
        assert_eq!(TopicFilter::Latest.path(), "/latest.json");
        assert_eq!(TopicFilter::Unread.path(), "/unread.json");
        assert_eq!(
            TopicFilter::Top(TopPeriod::Monthly).path(),
            "/top.json?period=monthly"
        );
    }

    #[test]
    fn filter_parsing() {
        assert_eq!("HOT".parse::<TopicFilter>().unwrap(), TopicFilter::Hot);
        assert_eq!(
            "top".parse::<TopicFilter>().unwrap(),
            TopicFilter::Top(TopPeriod::Weekly)
        );
        assert_eq!(
            "top:yearly".parse::<TopicFilter>().unwrap(),
            TopicFilter::Top(TopPeriod::Yearly)
        );
        assert!("trending".parse::<TopicFilter>().is_err());
        assert!("top:hourly".parse::<TopicFilter>().is_err());
    }

    #[test]
    fn topic_list_cursor_absent_or_empty() {
        let json = r#"{"users":[{"id":1,"username":"a"}],
            "topic_list":{"topics":[{"id":7,"title":"hello","posts_count":3}],
            "more_topics_url":"/latest?page=1"}}"#;
        let list: TopicList = serde_json::from_str(json).unwrap();
        assert_eq!(list.topics().len(), 1);
        assert_eq!(list.more_cursor(), Some("/latest?page=1"));
        assert!(list.topics()[0].visible);

        let list: TopicList =
            serde_json::from_str(r#"{"topic_list":{"topics":[],"more_topics_url":""}}"#).unwrap();
        assert_eq!(list.more_cursor(), None);

        let list: TopicList = serde_json::from_str(r#"{"topic_list":{"topics":[]}}"#).unwrap();
        assert_eq!(list.more_cursor(), None);
    }

    #[test]
    fn post_like_state() {
        let json = r#"{"id":10,"username":"a","cooked":"<p>x</p>","post_number":2,
            "created_at":"2024-05-01T12:00:00.000Z",
            "actions_summary":[{"id":2,"count":4,"acted":true}]}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert!(post.is_liked());
        assert_eq!(post.like_count(), 4);
        assert_eq!(post.raw, "");

        let json = r#"{"id":11,"username":"b","post_number":3,"actions_summary":[{"id":2,"count":1}]}"#;
        let post: Post = serde_json::from_str(json).unwrap();
        assert!(!post.is_liked());
    }

    fn post(number: u32, username: &str) -> Post {
        Post {
            id: number as u64 + 100,
            username: username.to_string(),
            raw: String::new(),
            cooked: String::new(),
            post_number: number,
            reply_to_post_number: None,
            created_at: None,
            actions_summary: vec![],
        }
    }

    #[test]
    fn has_reply_from_ignores_opening_post() {
        let mut detail = TopicDetail {
            id: 1,
            title: "t".into(),
            category_id: None,
            posts_count: 5,
            post_stream: PostStream {
                posts: vec![post(1, "me"), post(2, "other")],
                stream: vec![101, 102, 103, 104, 105],
            },
        };
        assert!(!detail.has_reply_from("me"));

        detail.post_stream.posts.push(post(5, "me"));
        assert!(detail.has_reply_from("me"));
        assert_eq!(detail.first_post().map(|p| p.post_number), Some(1));
    }

    #[test]
    fn search_response_joins_titles_and_cursor() {
        let json = r#"{"posts":[
                {"id":1,"username":"a","topic_id":10,"post_number":3,"like_count":2,"blurb":"x"},
                {"id":2,"username":"b","topic_id":99,"post_number":1,"like_count":0,"blurb":"y"}],
            "topics":[{"id":10,"title":"Ten"}],
            "grouped_search_result":{"more_full_page_results":true}}"#;
        let resp: SearchResponse = serde_json::from_str(json).unwrap();
        let page = resp.into_page("mcp", 2);

        assert_eq!(page.results[0].topic_title, "Ten");
        assert_eq!(page.results[1].topic_title, "");
        assert_eq!(page.next_page, Some(3));

        let resp: SearchResponse = serde_json::from_str(r#"{"posts":[]}"#).unwrap();
        assert_eq!(resp.into_page("mcp", 1).next_page, None);
    }

    #[test]
    fn bookmark_created_date() {
        let json = r#"{"id":5,"title":"T","bookmarkable_url":"/t/t/1/2",
            "created_at":"2024-03-09T08:07:06.000Z","excerpt":"e"}"#;
        let bm: Bookmark = serde_json::from_str(json).unwrap();
        assert_eq!(bm.created_date(), "2024-03-09");

        let bm: Bookmark = serde_json::from_str(r#"{"id":6}"#).unwrap();
        assert_eq!(bm.created_date(), "-");
    }
}
