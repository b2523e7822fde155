//! Randomized reply text and pacing.

use crate::AgentConfig;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

/// A synthesized reply and how it was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedReply {
    pub text: String,
    pub base: String,
    pub prefix: Option<char>,
    pub suffix: Option<String>,
}

/// Builds replies from a phrase pool so no fixed string repeats verbatim
/// across topics.
#[derive(Debug, Clone)]
pub struct ReplyComposer {
    phrases: Vec<String>,
    suffixes: Vec<String>,
    prefix_probability: f64,
    suffix_probability: f64,
    delay_min: Duration,
    delay_max: Duration,
}

impl ReplyComposer {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            phrases: config
                .reply_phrases
                .iter()
                .filter(|p| !p.trim().is_empty())
                .cloned()
                .collect(),
            suffixes: config.suffixes.clone(),
            prefix_probability: config.prefix_probability,
            suffix_probability: config.suffix_probability,
            delay_min: config.reply_delay_min,
            delay_max: config.reply_delay_max,
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn compose<R: Rng + ?Sized>(&self, rng: &mut R) -> ComposedReply {
        let base = self
            .phrases
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| "参与一下".to_string());

        let prefix = rng
            .gen_bool(self.prefix_probability)
            .then(|| rng.gen_range(b'a'..=b'z') as char);

        let suffix = if rng.gen_bool(self.suffix_probability) {
            self.suffixes.choose(rng).cloned()
        } else {
            None
        };

        let mut text = String::new();
        if let Some(c) = prefix {
            text.push(c);
        }
        text.push_str(&base);
        if let Some(s) = &suffix {
            text.push_str(s);
        }

        ComposedReply {
            text,
            base,
            prefix,
            suffix,
        }
    }

    /// Random pause before posting, uniform in the configured bounds.
    pub fn delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let min = self.delay_min.as_millis() as u64;
        let max = self.delay_max.as_millis() as u64;
        if max <= min {
            return self.delay_min;
        }
        Duration::from_millis(rng.gen_range(min..=max))
    }
}
