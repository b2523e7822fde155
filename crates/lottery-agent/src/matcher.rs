//! Keyword matching for lottery topics.

use forum_client::TopicDetail;

/// Which parts of a topic matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub title: bool,
    pub content: bool,
}

impl MatchResult {
    pub fn is_candidate(&self) -> bool {
        self.title || self.content
    }
}

/// Case-insensitive substring matcher over a fixed keyword set.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keywords: Vec<String>,
}

impl KeywordMatcher {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    /// Match a topic title and the raw and rendered body of its first
    /// loaded post.
    pub fn match_topic(&self, title: &str, detail: &TopicDetail) -> MatchResult {
        let content = detail
            .post_stream
            .posts
            .first()
            .map(|p| self.matches(&p.raw) || self.matches(&p.cooked))
            .unwrap_or(false);
        MatchResult {
            title: self.matches(title),
            content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forum_client::{Post, PostStream};

    fn detail(raw: &str, cooked: &str) -> TopicDetail {
        TopicDetail {
            id: 1,
            title: "t".into(),
            category_id: None,
            posts_count: 1,
            post_stream: PostStream {
                posts: vec![Post {
                    id: 10,
                    username: "op".into(),
                    raw: raw.into(),
                    cooked: cooked.into(),
                    post_number: 1,
                    reply_to_post_number: None,
                    created_at: None,
                    actions_summary: vec![],
                }],
                stream: vec![10],
            },
        }
    }

    #[test]
    fn test_title_only_match_is_candidate() {
        let matcher = KeywordMatcher::new(["抽奖", "抽取"]);
        let result = matcher.match_topic("抽奖: win a license", &detail("", "<p>hello</p>"));

        assert!(result.title);
        assert!(!result.content);
        assert!(result.is_candidate());
    }

    #[test]
    fn test_content_match_checks_raw_and_cooked() {
        let matcher = KeywordMatcher::new(["抽取"]);
        assert!(matcher.match_topic("news", &detail("随机抽取三位", "")).content);
        assert!(matcher.match_topic("news", &detail("", "<p>随机抽取</p>")).content);
        assert!(!matcher.match_topic("news", &detail("nothing", "here")).is_candidate());
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let matcher = KeywordMatcher::new(["Giveaway"]);
        assert!(matcher.matches("Weekly GIVEAWAY thread"));
        assert!(!matcher.matches("give away"));
    }

    #[test]
    fn test_blank_keywords_are_ignored() {
        let matcher = KeywordMatcher::new(["", "  "]);
        assert!(!matcher.matches("anything"));
    }
}
