//! Shell view state.

use forum_client::{SearchPage, Topic, TopicFilter, TopicList};
use topic_pager::TopicPager;

/// The topic list the shell returns to with `cd ..`.
#[derive(Debug, Default)]
pub struct TopicListing {
    pub filter: TopicFilter,
    pub topics: Vec<Topic>,
    pub more: Option<String>,
}

impl TopicListing {
    pub fn new(filter: TopicFilter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Replace the contents with a fresh first page.
    pub fn reset(&mut self, page: TopicList) {
        self.topics.clear();
        self.more = None;
        self.append(page);
    }

    /// Append a continuation page, skipping topics already listed.
    pub fn append(&mut self, page: TopicList) -> usize {
        self.more = page.more_cursor().map(str::to_string);
        let before = self.topics.len();
        for topic in page.topic_list.topics {
            if !self.topics.iter().any(|t| t.id == topic.id) {
                self.topics.push(topic);
            }
        }
        self.topics.len() - before
    }

    /// Topic id at a 1-based list position.
    pub fn topic_id_at(&self, position: usize) -> Option<u64> {
        position
            .checked_sub(1)
            .and_then(|i| self.topics.get(i))
            .map(|t| t.id)
    }
}

/// What the shell is looking at. Each variant owns only what it needs.
pub enum BrowseView {
    TopicList,
    TopicDetail(TopicPager),
    Search(SearchPage),
}

impl BrowseView {
    /// Path-like description for `pwd`.
    pub fn location(&self, listing: &TopicListing) -> String {
        match self {
            BrowseView::TopicList => format!("/topics ({})", listing.filter),
            BrowseView::TopicDetail(pager) => {
                format!("/topics/{} - {}", pager.topic_id(), pager.detail().title)
            }
            BrowseView::Search(page) => format!("/search?q={}&page={}", page.query, page.page),
        }
    }

    /// Topic id at a 1-based position in the current list or search page.
    pub fn topic_id_at(&self, listing: &TopicListing, position: usize) -> Option<u64> {
        match self {
            BrowseView::Search(page) => position
                .checked_sub(1)
                .and_then(|i| page.results.get(i))
                .map(|r| r.topic_id),
            _ => listing.topic_id_at(position),
        }
    }

    pub fn pager(&self) -> Option<&TopicPager> {
        match self {
            BrowseView::TopicDetail(pager) => Some(pager),
            _ => None,
        }
    }

    pub fn pager_mut(&mut self) -> Option<&mut TopicPager> {
        match self {
            BrowseView::TopicDetail(pager) => Some(pager),
            _ => None,
        }
    }
}
