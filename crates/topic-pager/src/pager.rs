use crate::{PagerError, PagerResult};
use forum_client::{ForumApi, Post, TopicDetail};
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use tracing::debug;

/// Posts requested per "load more".
pub const LOAD_MORE_BATCH: usize = 20;
/// Posts fetched on each side of a jump target.
pub const JUMP_CONTEXT: usize = 10;

/// Result of [`TopicPager::load_more`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMoreOutcome {
    /// A batch was requested; `received` may be lower for deleted posts.
    Loaded { requested: usize, received: usize },
    /// Every stream id has already been requested.
    Exhausted,
}

/// Where a jump landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpOutcome {
    /// Index of the target in [`TopicPager::posts`].
    pub target_index: usize,
    /// Floor actually landed on; differs from the request only when the
    /// exact post is gone.
    pub floor: u32,
}

/// Result of [`TopicPager::toggle_like`].
#[derive(Debug, Clone, PartialEq)]
pub struct LikeOutcome {
    /// True if a like was added, false if one was removed.
    pub liked: bool,
    /// The floor as re-fetched after the action.
    pub post: Post,
}

/// Stream indices fetched when jumping to `floor` in a stream of
/// `stream_len` ids: up to [`JUMP_CONTEXT`] posts on each side.
pub fn jump_window(floor: u32, stream_len: usize) -> Range<usize> {
    let target = (floor as usize).saturating_sub(1);
    let start = target.saturating_sub(JUMP_CONTEXT);
    let end = (target + JUMP_CONTEXT + 1).min(stream_len);
    start..end.max(start)
}

/// Floor-addressed view over one topic.
///
/// The loaded posts live in the detail's post stream, ordered by floor and
/// unique by post id.
#[derive(Debug, Clone)]
pub struct TopicPager {
    detail: TopicDetail,
    /// Post ids already asked for, whether or not the server returned them.
    requested: HashSet<u64>,
}

impl TopicPager {
    /// Fetch a topic and its first batch of posts.
    pub async fn open(api: &dyn ForumApi, topic_id: u64) -> PagerResult<Self> {
        let detail = api.topic(topic_id).await?;
        Ok(Self::from_detail(detail))
    }

    /// Wrap an already-fetched topic.
    pub fn from_detail(mut detail: TopicDetail) -> Self {
        let posts = std::mem::take(&mut detail.post_stream.posts);
        let mut pager = Self {
            detail,
            requested: HashSet::new(),
        };
        pager.merge(posts);
        pager
    }

    pub fn detail(&self) -> &TopicDetail {
        &self.detail
    }

    pub fn topic_id(&self) -> u64 {
        self.detail.id
    }

    /// Loaded posts in floor order.
    pub fn posts(&self) -> &[Post] {
        &self.detail.post_stream.posts
    }

    pub fn stream(&self) -> &[u64] {
        &self.detail.post_stream.stream
    }

    pub fn posts_count(&self) -> u32 {
        self.detail.posts_count
    }

    pub fn loaded_count(&self) -> usize {
        self.posts().len()
    }

    /// True once every id of the stream has been requested.
    pub fn is_fully_loaded(&self) -> bool {
        self.stream().iter().all(|id| self.requested.contains(id))
    }

    pub fn find_loaded(&self, floor: u32) -> Option<&Post> {
        self.posts().iter().find(|p| p.post_number == floor)
    }

    fn validate_floor(&self, floor: u32) -> PagerResult<()> {
        let max = self.posts_count();
        if floor == 0 || floor > max {
            return Err(PagerError::InvalidFloor { floor, max });
        }
        Ok(())
    }

    /// Insert posts keeping floor order; a post id already present is
    /// replaced by the newer copy.
    fn merge(&mut self, incoming: Vec<Post>) {
        let posts = &mut self.detail.post_stream.posts;
        for post in incoming {
            self.requested.insert(post.id);
            match posts.iter().position(|p| p.id == post.id) {
                Some(i) => posts[i] = post,
                None => posts.push(post),
            }
        }
        posts.sort_by_key(|p| p.post_number);
    }

    /// Next ids to fetch: unrequested ids after the furthest loaded stream
    /// position first, then earlier gaps.
    fn next_batch(&self) -> Vec<u64> {
        let stream = self.stream();
        let position: HashMap<u64, usize> =
            stream.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let frontier = self
            .posts()
            .iter()
            .filter_map(|p| position.get(&p.id))
            .max()
            .map(|i| i + 1)
            .unwrap_or(0);

        stream[frontier..]
            .iter()
            .chain(stream[..frontier].iter())
            .filter(|id| !self.requested.contains(id))
            .take(LOAD_MORE_BATCH)
            .copied()
            .collect()
    }

    /// Fetch the next batch of up to [`LOAD_MORE_BATCH`] posts.
    pub async fn load_more(&mut self, api: &dyn ForumApi) -> PagerResult<LoadMoreOutcome> {
        let batch = self.next_batch();
        if batch.is_empty() {
            return Ok(LoadMoreOutcome::Exhausted);
        }

        let posts = api.posts_by_ids(self.topic_id(), &batch).await?;
        let received = posts.len();
        self.requested.extend(batch.iter().copied());
        self.merge(posts);

        debug!(
            topic_id = self.topic_id(),
            requested = batch.len(),
            received,
            loaded = self.loaded_count(),
            "Loaded more posts"
        );
        Ok(LoadMoreOutcome::Loaded {
            requested: batch.len(),
            received,
        })
    }

    /// One floor, from the loaded set or by fetching that single post.
    ///
    /// A fetched post is returned but not added to the loaded set.
    pub async fn view_floor(&self, api: &dyn ForumApi, floor: u32) -> PagerResult<Post> {
        self.validate_floor(floor)?;
        if let Some(post) = self.find_loaded(floor) {
            return Ok(post.clone());
        }

        let id = *self
            .stream()
            .get(floor as usize - 1)
            .ok_or(PagerError::PostUnavailable(floor))?;
        let posts = api.posts_by_ids(self.topic_id(), &[id]).await?;
        posts
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(PagerError::PostUnavailable(floor))
    }

    /// Re-fetch one floor after acting on it (like, unlike).
    ///
    /// A loaded copy is replaced in place; an unloaded floor is fetched and
    /// returned without growing the loaded set.
    pub async fn reload_floor(&mut self, api: &dyn ForumApi, floor: u32) -> PagerResult<Post> {
        self.validate_floor(floor)?;
        let id = match self.find_loaded(floor) {
            Some(post) => post.id,
            None => *self
                .stream()
                .get(floor as usize - 1)
                .ok_or(PagerError::PostUnavailable(floor))?,
        };

        let fresh = api
            .posts_by_ids(self.topic_id(), &[id])
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(PagerError::PostUnavailable(floor))?;

        if let Some(slot) = self
            .detail
            .post_stream
            .posts
            .iter_mut()
            .find(|p| p.id == id)
        {
            *slot = fresh.clone();
        }
        debug!(topic_id = self.topic_id(), floor, "Reloaded floor");
        Ok(fresh)
    }

    /// Like or unlike a floor according to its current server state, then
    /// re-fetch it so the next toggle sees the change.
    pub async fn toggle_like(&mut self, api: &dyn ForumApi, floor: u32) -> PagerResult<LikeOutcome> {
        let current = self.view_floor(api, floor).await?;
        let liked = !current.is_liked();
        if liked {
            api.like_post(current.id).await?;
        } else {
            api.unlike_post(current.id).await?;
        }

        let post = self.reload_floor(api, floor).await?;
        debug!(topic_id = self.topic_id(), floor, liked, "Toggled like");
        Ok(LikeOutcome { liked, post })
    }

    /// Jump to a floor with surrounding context.
    ///
    /// A floor that is already loaded costs no request. Otherwise the loaded
    /// set is replaced by the window from [`jump_window`] and the target is
    /// located by floor number in the server's response.
    pub async fn jump_to_floor(&mut self, api: &dyn ForumApi, floor: u32) -> PagerResult<JumpOutcome> {
        self.validate_floor(floor)?;
        if let Some(index) = self.posts().iter().position(|p| p.post_number == floor) {
            return Ok(JumpOutcome {
                target_index: index,
                floor,
            });
        }

        let window = jump_window(floor, self.stream().len());
        let ids: Vec<u64> = self.stream()[window.clone()].to_vec();
        if ids.is_empty() {
            return Err(PagerError::PostUnavailable(floor));
        }

        let posts = api.posts_by_ids(self.topic_id(), &ids).await?;
        if posts.is_empty() {
            return Err(PagerError::PostUnavailable(floor));
        }

        self.detail.post_stream.posts.clear();
        self.requested = ids.iter().copied().collect();
        self.merge(posts);

        let target_index = self
            .posts()
            .iter()
            .enumerate()
            .min_by_key(|(_, p)| p.post_number.abs_diff(floor))
            .map(|(i, _)| i)
            .ok_or(PagerError::PostUnavailable(floor))?;
        let landed = self.posts()[target_index].post_number;

        debug!(
            topic_id = self.topic_id(),
            floor,
            landed,
            window_start = window.start,
            window_end = window.end,
            "Jumped to floor"
        );
        Ok(JumpOutcome {
            target_index,
            floor: landed,
        })
    }

    pub async fn jump_to_last(&mut self, api: &dyn ForumApi) -> PagerResult<JumpOutcome> {
        let last = self.posts_count();
        self.jump_to_floor(api, last).await
    }

    /// Re-fetch the topic, discarding every loaded post.
    pub async fn refresh(&mut self, api: &dyn ForumApi) -> PagerResult<()> {
        let detail = api.topic(self.topic_id()).await?;
        *self = Self::from_detail(detail);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use forum_client::{
        ActionSummary, CreatedPost, ForumError, ForumResult, PostStream, TopicFilter, TopicList,
    };
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    fn post_id(floor: u32) -> u64 {
        10_000 + floor as u64
    }

    fn post(floor: u32) -> Post {
        Post {
            id: post_id(floor),
            username: format!("user{}", floor % 7),
            raw: String::new(),
            cooked: format!("<p>floor {}</p>", floor),
            post_number: floor,
            reply_to_post_number: None,
            created_at: None,
            actions_summary: vec![],
        }
    }

    /// A topic of `total` posts whose detail carries the first 20 and whose
    /// batch endpoint answers in reverse order.
    struct MockForum {
        total: u32,
        deleted: HashSet<u32>,
        liked: Mutex<HashSet<u32>>,
        like_calls: Mutex<Vec<(&'static str, u64)>>,
        batch_calls: Mutex<Vec<Vec<u64>>>,
    }

    impl MockForum {
        fn new(total: u32) -> Self {
            Self {
                total,
                deleted: HashSet::new(),
                liked: Mutex::new(HashSet::new()),
                like_calls: Mutex::new(Vec::new()),
                batch_calls: Mutex::new(Vec::new()),
            }
        }

        fn post(&self, floor: u32) -> Post {
            let mut post = post(floor);
            if self.liked.lock().unwrap().contains(&floor) {
                post.actions_summary = vec![ActionSummary {
                    id: 2,
                    count: Some(1),
                    acted: true,
                }];
            }
            post
        }

        fn calls(&self) -> Vec<Vec<u64>> {
            self.batch_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ForumApi for MockForum {
        fn username(&self) -> &str {
            "me"
        }

        async fn list_topics(&self, _filter: TopicFilter) -> ForumResult<TopicList> {
            Ok(TopicList::default())
        }

        async fn more_topics(&self, _more_url: &str) -> ForumResult<TopicList> {
            Ok(TopicList::default())
        }

        async fn topic(&self, topic_id: u64) -> ForumResult<TopicDetail> {
            Ok(TopicDetail {
                id: topic_id,
                title: "thread".to_string(),
                category_id: None,
                posts_count: self.total,
                post_stream: PostStream {
                    posts: (1..=self.total.min(20))
                        .filter(|f| !self.deleted.contains(f))
                        .map(|f| self.post(f))
                        .collect(),
                    stream: (1..=self.total).map(post_id).collect(),
                },
            })
        }

        async fn posts_by_ids(&self, _topic_id: u64, post_ids: &[u64]) -> ForumResult<Vec<Post>> {
            if post_ids.is_empty() {
                return Err(ForumError::Validation("no post ids requested".into()));
            }
            self.batch_calls.lock().unwrap().push(post_ids.to_vec());
            Ok(post_ids
                .iter()
                .rev()
                .map(|id| (*id - 10_000) as u32)
                .filter(|f| !self.deleted.contains(f))
                .map(|f| self.post(f))
                .collect())
        }

        async fn create_post(
            &self,
            _topic_id: u64,
            _raw: &str,
            _reply_to: Option<u32>,
        ) -> ForumResult<CreatedPost> {
            Ok(CreatedPost::default())
        }

        async fn like_post(&self, post_id: u64) -> ForumResult<()> {
            let floor = (post_id - 10_000) as u32;
            if !self.liked.lock().unwrap().insert(floor) {
                // Discourse refuses a second like on the same post.
                return Err(ForumError::Blocked {
                    endpoint: "/post_actions.json".into(),
                });
            }
            self.like_calls.lock().unwrap().push(("like", post_id));
            Ok(())
        }

        async fn unlike_post(&self, post_id: u64) -> ForumResult<()> {
            self.liked.lock().unwrap().remove(&((post_id - 10_000) as u32));
            self.like_calls.lock().unwrap().push(("unlike", post_id));
            Ok(())
        }

        async fn user_replied_topics(&self) -> ForumResult<BTreeSet<u64>> {
            Ok(BTreeSet::new())
        }
    }

    fn floors(pager: &TopicPager) -> Vec<u32> {
        pager.posts().iter().map(|p| p.post_number).collect()
    }

    fn assert_strictly_increasing(pager: &TopicPager) {
        let floors = floors(pager);
        assert!(floors.windows(2).all(|w| w[0] < w[1]), "{:?}", floors);
    }

    #[test]
    fn test_jump_window_is_clipped_to_stream() {
        assert_eq!(jump_window(37, 200), 26..47);
        assert_eq!(jump_window(1, 200), 0..11);
        assert_eq!(jump_window(200, 200), 189..200);
        assert_eq!(jump_window(3, 5), 0..5);
    }

    #[tokio::test]
    async fn test_open_loads_first_batch() {
        let api = MockForum::new(45);
        let pager = TopicPager::open(&api, 1).await.unwrap();

        assert_eq!(pager.posts_count(), 45);
        assert_eq!(pager.loaded_count(), 20);
        assert_eq!(pager.stream().len(), 45);
        assert!(!pager.is_fully_loaded());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_load_more_converges_then_is_noop() {
        let api = MockForum::new(45);
        let mut pager = TopicPager::open(&api, 1).await.unwrap();

        let mut previous = pager.loaded_count();
        loop {
            match pager.load_more(&api).await.unwrap() {
                LoadMoreOutcome::Loaded { requested, .. } => {
                    assert!(requested <= LOAD_MORE_BATCH);
                    assert!(pager.loaded_count() > previous);
                    previous = pager.loaded_count();
                    assert_strictly_increasing(&pager);
                }
                LoadMoreOutcome::Exhausted => break,
            }
        }

        assert_eq!(pager.loaded_count(), 45);
        assert!(pager.is_fully_loaded());
        assert_eq!(api.calls().len(), 2);
        assert_eq!(api.calls()[0], (21..=40).map(post_id).collect::<Vec<_>>());

        assert_eq!(
            pager.load_more(&api).await.unwrap(),
            LoadMoreOutcome::Exhausted
        );
        assert_eq!(api.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_load_more_terminates_with_deleted_posts() {
        let mut api = MockForum::new(30);
        api.deleted.insert(25);
        let mut pager = TopicPager::open(&api, 1).await.unwrap();

        assert_eq!(
            pager.load_more(&api).await.unwrap(),
            LoadMoreOutcome::Loaded {
                requested: 10,
                received: 9
            }
        );
        assert!(pager.is_fully_loaded());
        assert_eq!(
            pager.load_more(&api).await.unwrap(),
            LoadMoreOutcome::Exhausted
        );
    }

    #[tokio::test]
    async fn test_invalid_floors_are_rejected_without_requests() {
        let api = MockForum::new(45);
        let mut pager = TopicPager::open(&api, 1).await.unwrap();

        assert!(matches!(
            pager.view_floor(&api, 0).await,
            Err(PagerError::InvalidFloor { floor: 0, max: 45 })
        ));
        assert!(matches!(
            pager.jump_to_floor(&api, 46).await,
            Err(PagerError::InvalidFloor { floor: 46, .. })
        ));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_view_floor_uses_loaded_post_or_fetches_single_id() {
        let api = MockForum::new(45);
        let pager = TopicPager::open(&api, 1).await.unwrap();

        let loaded = pager.view_floor(&api, 5).await.unwrap();
        assert_eq!(loaded.post_number, 5);
        assert!(api.calls().is_empty());

        let fetched = pager.view_floor(&api, 33).await.unwrap();
        assert_eq!(fetched.post_number, 33);
        assert_eq!(api.calls(), vec![vec![post_id(33)]]);
        assert!(pager.find_loaded(33).is_none());
    }

    #[tokio::test]
    async fn test_view_floor_of_deleted_post_is_unavailable() {
        let mut api = MockForum::new(45);
        api.deleted.insert(33);
        let pager = TopicPager::open(&api, 1).await.unwrap();

        assert!(matches!(
            pager.view_floor(&api, 33).await,
            Err(PagerError::PostUnavailable(33))
        ));
    }

    #[tokio::test]
    async fn test_jump_to_floor_37_of_200_fetches_context_window() {
        let api = MockForum::new(200);
        let mut pager = TopicPager::open(&api, 1).await.unwrap();

        let outcome = pager.jump_to_floor(&api, 37).await.unwrap();

        assert_eq!(api.calls(), vec![(27..=47).map(post_id).collect::<Vec<_>>()]);
        assert_eq!(floors(&pager), (27..=47).collect::<Vec<_>>());
        assert_eq!(outcome.floor, 37);
        assert_eq!(pager.posts()[outcome.target_index].post_number, 37);
        assert_eq!(outcome.target_index, 10);
    }

    #[tokio::test]
    async fn test_jump_to_loaded_floor_makes_no_request() {
        let api = MockForum::new(200);
        let mut pager = TopicPager::open(&api, 1).await.unwrap();

        let outcome = pager.jump_to_floor(&api, 12).await.unwrap();
        assert_eq!(outcome.target_index, 11);
        assert!(api.calls().is_empty());
        assert_eq!(pager.loaded_count(), 20);
    }

    #[tokio::test]
    async fn test_jump_to_deleted_floor_lands_on_nearest() {
        let mut api = MockForum::new(200);
        api.deleted.insert(100);
        let mut pager = TopicPager::open(&api, 1).await.unwrap();

        let outcome = pager.jump_to_floor(&api, 100).await.unwrap();
        assert!(outcome.floor == 99 || outcome.floor == 101);
        assert_eq!(pager.posts()[outcome.target_index].post_number, outcome.floor);
    }

    #[tokio::test]
    async fn test_jump_to_last_and_edges() {
        let api = MockForum::new(200);
        let mut pager = TopicPager::open(&api, 1).await.unwrap();

        let outcome = pager.jump_to_last(&api).await.unwrap();
        assert_eq!(outcome.floor, 200);
        assert_eq!(floors(&pager), (190..=200).collect::<Vec<_>>());
        assert_eq!(outcome.target_index, pager.loaded_count() - 1);
    }

    #[tokio::test]
    async fn test_load_more_after_jump_converges_without_duplicates() {
        let api = MockForum::new(200);
        let mut pager = TopicPager::open(&api, 1).await.unwrap();
        pager.jump_to_floor(&api, 37).await.unwrap();

        pager.load_more(&api).await.unwrap();
        assert_eq!(api.calls()[1], (48..=67).map(post_id).collect::<Vec<_>>());

        while let LoadMoreOutcome::Loaded { .. } = pager.load_more(&api).await.unwrap() {
            assert_strictly_increasing(&pager);
        }

        assert_eq!(pager.loaded_count(), 200);
        assert_eq!(floors(&pager), (1..=200).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_refresh_replaces_loaded_set() {
        let api = MockForum::new(60);
        let mut pager = TopicPager::open(&api, 1).await.unwrap();
        pager.jump_to_floor(&api, 50).await.unwrap();
        assert_eq!(floors(&pager)[0], 40);

        pager.refresh(&api).await.unwrap();
        assert_eq!(floors(&pager), (1..=20).collect::<Vec<_>>());
        assert!(!pager.is_fully_loaded());
    }

    #[tokio::test]
    async fn test_reload_floor_replaces_loaded_copy() {
        let api = MockForum::new(45);
        let mut pager = TopicPager::open(&api, 1).await.unwrap();
        assert!(!pager.find_loaded(3).unwrap().is_liked());

        api.liked.lock().unwrap().insert(3);
        let fresh = pager.reload_floor(&api, 3).await.unwrap();

        assert!(fresh.is_liked());
        assert!(pager.find_loaded(3).unwrap().is_liked());
        assert_eq!(pager.loaded_count(), 20);
        assert_eq!(api.calls(), vec![vec![post_id(3)]]);
        assert_strictly_increasing(&pager);
    }

    #[tokio::test]
    async fn test_reload_unloaded_floor_does_not_grow_loaded_set() {
        let api = MockForum::new(45);
        let mut pager = TopicPager::open(&api, 1).await.unwrap();

        api.liked.lock().unwrap().insert(33);
        let fresh = pager.reload_floor(&api, 33).await.unwrap();

        assert!(fresh.is_liked());
        assert!(pager.find_loaded(33).is_none());
        assert_eq!(pager.loaded_count(), 20);
        assert!(matches!(
            pager.reload_floor(&api, 46).await,
            Err(PagerError::InvalidFloor { floor: 46, .. })
        ));
    }

    #[tokio::test]
    async fn test_toggle_like_twice_likes_then_unlikes() {
        let api = MockForum::new(45);
        let mut pager = TopicPager::open(&api, 1).await.unwrap();

        let first = pager.toggle_like(&api, 3).await.unwrap();
        assert!(first.liked);
        assert!(first.post.is_liked());
        assert!(pager.find_loaded(3).unwrap().is_liked());

        let second = pager.toggle_like(&api, 3).await.unwrap();
        assert!(!second.liked);
        assert!(!pager.find_loaded(3).unwrap().is_liked());

        assert_eq!(
            *api.like_calls.lock().unwrap(),
            vec![("like", post_id(3)), ("unlike", post_id(3))]
        );
    }

    #[tokio::test]
    async fn test_toggle_like_on_unloaded_floor() {
        let api = MockForum::new(45);
        let mut pager = TopicPager::open(&api, 1).await.unwrap();

        assert!(pager.toggle_like(&api, 40).await.unwrap().liked);
        assert!(!pager.toggle_like(&api, 40).await.unwrap().liked);
        assert!(pager.find_loaded(40).is_none());
    }
}
