//! Agent tunables.

use crate::{AgentError, AgentResult};
use std::time::Duration;

const DEFAULT_KEYWORDS: &[&str] = &["抽奖", "抽取"];

const DEFAULT_REPLY_PHRASES: &[&str] = &[
    "参与一下",
    "谢谢大佬",
    "参与参与",
    "感谢分享",
    "来了来了",
    "支持支持",
    "来参与一下",
    "参与一下，万一中了呢",
    "来了来了来了",
];

const DEFAULT_SUFFIXES: &[&str] = &["~", "！", "!", "～", "。", " 🙏", " 🎉", " 😄"];

/// Configuration for one agent instance.
///
/// Everything the scheduler reads is here; nothing is process-global, so
/// several agents (or tests) can run side by side with different pools.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Case-insensitive substrings that mark a lottery topic.
    pub keywords: Vec<String>,
    /// Base phrases a reply is built from.
    pub reply_phrases: Vec<String>,
    /// Emoji/punctuation endings appended to some replies.
    pub suffixes: Vec<String>,
    /// Chance of a single lowercase letter before the phrase.
    pub prefix_probability: f64,
    /// Chance of a suffix after the phrase.
    pub suffix_probability: f64,
    /// Time between scan cycles.
    pub check_interval: Duration,
    /// Listing pages fetched per cycle, first page included.
    pub max_pages: usize,
    /// Topics examined per cycle.
    pub max_topics: usize,
    /// Pause before each continuation page.
    pub page_delay: Duration,
    /// Reply queue capacity; excess candidates are dropped.
    pub queue_capacity: usize,
    /// Lower bound of the random pause before posting.
    pub reply_delay_min: Duration,
    /// Upper bound of the random pause before posting.
    pub reply_delay_max: Duration,
    /// Worker pause after a rate-limit rejection.
    pub rate_limit_cooldown: Duration,
    /// Local reply records older than this are pruned at startup.
    pub retention_days: i64,
    /// Scan the unread list first, falling back to latest.
    pub prefer_unread: bool,
    /// Merge the server's reply history into local state at startup.
    pub reconcile_history: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            keywords: to_strings(DEFAULT_KEYWORDS),
            reply_phrases: to_strings(DEFAULT_REPLY_PHRASES),
            suffixes: to_strings(DEFAULT_SUFFIXES),
            prefix_probability: 0.1,
            suffix_probability: 0.4,
            check_interval: Duration::from_secs(5 * 60),
            max_pages: 4,
            max_topics: 200,
            page_delay: Duration::from_secs(1),
            queue_capacity: 100,
            reply_delay_min: Duration::from_secs(10),
            reply_delay_max: Duration::from_secs(30),
            rate_limit_cooldown: Duration::from_secs(60),
            retention_days: 30,
            prefer_unread: true,
            reconcile_history: true,
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

impl AgentConfig {
    pub fn validate(&self) -> AgentResult<()> {
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(AgentError::Config("at least one keyword is required".into()));
        }
        if self.reply_phrases.iter().all(|p| p.trim().is_empty()) {
            return Err(AgentError::Config("reply phrase pool is empty".into()));
        }
        for (name, p) in [
            ("prefix_probability", self.prefix_probability),
            ("suffix_probability", self.suffix_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(AgentError::Config(format!("{} must be within 0..=1", name)));
            }
        }
        if self.suffix_probability > 0.0 && self.suffixes.is_empty() {
            return Err(AgentError::Config("suffix pool is empty".into()));
        }
        if self.reply_delay_min > self.reply_delay_max {
            return Err(AgentError::Config(
                "reply_delay_min must not exceed reply_delay_max".into(),
            ));
        }
        if self.check_interval.is_zero() {
            return Err(AgentError::Config("check_interval must be positive".into()));
        }
        if self.queue_capacity == 0 || self.max_pages == 0 || self.max_topics == 0 {
            return Err(AgentError::Config(
                "queue_capacity, max_pages and max_topics must be positive".into(),
            ));
        }
        Ok(())
    }
}
