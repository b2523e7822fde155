//! Authenticated forum client.

use crate::auth_fsm::{SessionMachine, SessionMachineInput, SessionState};
use crate::models::{
    Bookmark, BookmarksResponse, Post, PostsResponse, SearchPage, SearchResponse, TopPeriod,
    TopicDetail, TopicFilter, TopicList, UserAction, UserActionsResponse, LIKE_ACTION_TYPE,
};
use crate::session::HttpSession;
use crate::{ClientConfig, ForumError, ForumResult};
use forum_config_and_utils::Credentials;
use serde::{Deserialize, Serialize};
use session_cache_store::{SessionCache, SessionStore};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// `action_type` of a reply in the user action log.
const REPLY_ACTION_TYPE: u32 = 5;
/// Full page length of `/user_actions.json`; a shorter page is the last.
const USER_ACTIONS_PAGE_SIZE: usize = 30;
/// Upper bound on bookmark pages followed in one listing.
const MAX_BOOKMARK_PAGES: usize = 50;
/// Upper bound on action-log pages read when reconciling reply history.
const MAX_USER_ACTION_PAGES: usize = 40;

/// How a client obtained its verified session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOrigin {
    /// Cached cookies passed verification.
    CachedCookies,
    /// Warmup and a fresh login.
    FreshLogin,
}

/// Server acknowledgement of a created post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedPost {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub topic_id: u64,
    #[serde(default)]
    pub post_number: u32,
}

/// One page of a user's bookmarks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookmarkPage {
    pub bookmarks: Vec<Bookmark>,
    /// Continuation cursor; `None` once exhausted.
    pub more_url: Option<String>,
}

#[derive(Serialize)]
struct CreatePostBody<'a> {
    topic_id: u64,
    raw: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_post_number: Option<u32>,
}

#[derive(Serialize)]
struct PostActionBody {
    id: u64,
    post_action_type_id: u32,
}

/// Authenticated client for one forum.
///
/// Only obtainable through [`ForumClient::connect`], so every instance holds
/// a verified session.
pub struct ForumClient {
    session: HttpSession,
    username: String,
    origin: SessionOrigin,
    default_top_period: TopPeriod,
}

impl std::fmt::Debug for ForumClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForumClient")
            .field("base_url", &self.session.base_url())
            .field("username", &self.username)
            .field("origin", &self.origin)
            .finish()
    }
}

impl ForumClient {
    /// Establish an authenticated session.
    ///
    /// Reuses cached cookies when they load and verify; otherwise warms up,
    /// logs in with `credentials` and caches the new cookies. Login failures
    /// are fatal and never retried here.
    pub async fn connect(config: ClientConfig, credentials: &Credentials) -> ForumResult<Self> {
        let mut machine = SessionMachine::new();
        let username = credentials.username.clone();

        if let Some(store) = &config.session_store {
            transition(&mut machine, &SessionMachineInput::CheckCache)?;

            let session = HttpSession::new(&config)?;
            match resume_cached(&session, store, &username).await {
                Ok(()) => {
                    transition(&mut machine, &SessionMachineInput::CacheVerified)?;
                    info!(username = %username, "Resumed cached session");
                    persist_cookies(&session, Some(store), &username);
                    return Ok(Self::verified(
                        session,
                        username,
                        SessionOrigin::CachedCookies,
                        &config,
                    ));
                }
                Err(e) => {
                    info!(reason = %e, "Cached session unusable, logging in");
                    transition(&mut machine, &SessionMachineInput::CacheRejected)?;
                }
            }
        } else {
            transition(&mut machine, &SessionMachineInput::SkipCache)?;
        }

        // Fresh transport so rejected cookies do not leak into the login.
        let session = HttpSession::new(&config)?;

        if let Err(e) = session.warmup().await {
            transition(&mut machine, &SessionMachineInput::WarmupFailed)?;
            return Err(e);
        }
        tokio::time::sleep(config.warmup_delay).await;
        transition(&mut machine, &SessionMachineInput::WarmupComplete)?;

        let login = async {
            session.refresh_csrf().await?;
            session.login(&username, &credentials.password).await?;
            // Discourse rotates the token on login.
            session.refresh_csrf().await
        };
        if let Err(e) = login.await {
            transition(&mut machine, &SessionMachineInput::LoginFailed)?;
            return Err(e);
        }
        transition(&mut machine, &SessionMachineInput::LoginSucceeded)?;
        info!(username = %username, "Logged in");

        persist_cookies(&session, config.session_store.as_ref(), &username);
        Ok(Self::verified(
            session,
            username,
            SessionOrigin::FreshLogin,
            &config,
        ))
    }

    fn verified(
        session: HttpSession,
        username: String,
        origin: SessionOrigin,
        config: &ClientConfig,
    ) -> Self {
        Self {
            session,
            username,
            origin,
            default_top_period: config.default_top_period,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn base_url(&self) -> &str {
        self.session.base_url()
    }

    /// Whether the session was resumed from cache or freshly logged in.
    pub fn origin(&self) -> SessionOrigin {
        self.origin
    }

    pub fn default_top_period(&self) -> TopPeriod {
        self.default_top_period
    }

    /// Browser URL of a topic.
    pub fn topic_url(&self, topic_id: u64) -> String {
        self.session.url(&format!("/t/{}", topic_id))
    }

    pub async fn list_topics(&self, filter: TopicFilter) -> ForumResult<TopicList> {
        self.session.get_json(&filter.path()).await
    }

    /// Follow a listing's continuation cursor.
    pub async fn more_topics(&self, more_url: &str) -> ForumResult<TopicList> {
        let more_url = more_url.trim();
        if more_url.is_empty() {
            return Err(ForumError::validation("no continuation cursor"));
        }
        self.session.get_json(more_url).await
    }

    pub async fn topic(&self, topic_id: u64) -> ForumResult<TopicDetail> {
        self.session.get_json(&format!("/t/{}.json", topic_id)).await
    }

    /// Fetch an arbitrary subset of a topic's posts.
    pub async fn posts_by_ids(&self, topic_id: u64, post_ids: &[u64]) -> ForumResult<Vec<Post>> {
        if post_ids.is_empty() {
            return Err(ForumError::validation("no post ids requested"));
        }
        let ids = post_ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let path = format!("/t/{}/posts.json?post_ids[]={}", topic_id, ids);
        let response: PostsResponse = self.session.get_json(&path).await?;
        Ok(response.post_stream.posts)
    }

    pub async fn create_post(
        &self,
        topic_id: u64,
        raw: &str,
        reply_to_post_number: Option<u32>,
    ) -> ForumResult<CreatedPost> {
        if raw.trim().is_empty() {
            return Err(ForumError::validation("reply is empty"));
        }
        let body = CreatePostBody {
            topic_id,
            raw,
            reply_to_post_number: reply_to_post_number.filter(|n| *n > 0),
        };
        let created: CreatedPost = self
            .session
            .post_json("/posts.json", &body, &format!("/t/{}", topic_id))
            .await?;
        info!(topic_id, post_id = created.id, "Post created");
        Ok(created)
    }

    pub async fn like_post(&self, post_id: u64) -> ForumResult<()> {
        let body = PostActionBody {
            id: post_id,
            post_action_type_id: LIKE_ACTION_TYPE,
        };
        let _: serde_json::Value = self
            .session
            .post_json("/post_actions.json", &body, "/")
            .await?;
        debug!(post_id, "Post liked");
        Ok(())
    }

    pub async fn unlike_post(&self, post_id: u64) -> ForumResult<()> {
        self.session
            .delete(&format!(
                "/post_actions/{}.json?post_action_type_id={}",
                post_id, LIKE_ACTION_TYPE
            ))
            .await?;
        debug!(post_id, "Post unliked");
        Ok(())
    }

    /// Topic ids the current user has replied in (floor > 1), from the
    /// server's action log.
    pub async fn user_replied_topics(&self) -> ForumResult<BTreeSet<u64>> {
        let mut topics = BTreeSet::new();
        let mut offset = 0usize;
        let mut exhausted = false;

        for _ in 0..MAX_USER_ACTION_PAGES {
            let path = format!(
                "/user_actions.json?offset={}&username={}&filter=4,5",
                offset,
                urlencode(&self.username)
            );
            let page: UserActionsResponse = self.session.get_json(&path).await?;
            let count = page.user_actions.len();
            topics.extend(replied_topic_ids(&page.user_actions));

            if count < USER_ACTIONS_PAGE_SIZE {
                exhausted = true;
                break;
            }
            offset += count;
        }

        if !exhausted {
            warn!(
                pages = MAX_USER_ACTION_PAGES,
                count = topics.len(),
                "Reply history still had full pages at the page cap; stopping"
            );
        }
        debug!(count = topics.len(), "Fetched replied topics");
        Ok(topics)
    }

    /// Full-text search, 1-based `page`.
    pub async fn search(&self, query: &str, page: u32) -> ForumResult<SearchPage> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ForumError::validation("search query is empty"));
        }
        let page = page.max(1);
        let path = format!("/search?q={}&page={}", urlencode(query), page);
        let response: SearchResponse = self.session.get_json(&path).await?;
        Ok(response.into_page(query, page))
    }

    /// One page of bookmarks; `None` fetches the first page.
    pub async fn bookmarks_page(&self, more_url: Option<&str>) -> ForumResult<BookmarkPage> {
        let path = match more_url {
            Some(url) => url.to_string(),
            None => format!("/u/{}/bookmarks.json", urlencode(&self.username)),
        };
        let response: BookmarksResponse = self.session.get_json(&path).await?;
        Ok(match response.user_bookmark_list {
            Some(list) => BookmarkPage {
                bookmarks: list.bookmarks,
                more_url: list
                    .more_bookmarks_url
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty()),
            },
            None => BookmarkPage::default(),
        })
    }

    /// Every bookmark, following continuation cursors.
    pub async fn all_bookmarks(&self) -> ForumResult<Vec<Bookmark>> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_BOOKMARK_PAGES {
            let page = self.bookmarks_page(cursor.as_deref()).await?;
            if page.bookmarks.is_empty() {
                break;
            }
            all.extend(page.bookmarks);
            match page.more_url {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        debug!(count = all.len(), "Fetched bookmarks");
        Ok(all)
    }

    pub async fn delete_bookmark(&self, bookmark_id: u64) -> ForumResult<()> {
        self.session
            .delete(&format!("/bookmarks/{}.json", bookmark_id))
            .await
    }
}

/// Topics of real replies (floor > 1) in one page of the action log.
fn replied_topic_ids(actions: &[UserAction]) -> impl Iterator<Item = u64> + '_ {
    actions
        .iter()
        .filter(|a| a.action_type == REPLY_ACTION_TYPE && a.post_number > 1)
        .map(|a| a.topic_id)
}

/// Load, install and verify cached cookies.
async fn resume_cached(
    session: &HttpSession,
    store: &SessionStore,
    username: &str,
) -> ForumResult<()> {
    let cache = store.load(username)?;
    session.install_cookies(&cache.cookies);
    session.refresh_csrf().await?;
    let _: TopicList = session.get_json(&TopicFilter::Latest.path()).await?;
    Ok(())
}

/// Cache the session's cookies. Failures are logged, never fatal.
fn persist_cookies(session: &HttpSession, store: Option<&SessionStore>, username: &str) {
    let Some(store) = store else {
        return;
    };
    let cookies = session.export_cookies();
    if cookies.is_empty() {
        warn!("No cookies to cache after login");
        return;
    }
    if let Err(e) = store.save(&SessionCache::new(username, cookies)) {
        warn!(path = %store.path().display(), error = %e, "Failed to cache session");
    }
}

fn transition(machine: &mut SessionMachine, input: &SessionMachineInput) -> ForumResult<()> {
    let old_state = SessionState::from(machine.state());
    machine.consume(input).map_err(|_| {
        ForumError::InvalidStateTransition(format!(
            "Cannot apply {:?} in state {:?}",
            input,
            machine.state()
        ))
    })?;
    let new_state = SessionState::from(machine.state());
    debug!(
        old_state = ?old_state,
        new_state = ?new_state,
        "Session state transition"
    );
    Ok(())
}

fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
