//! # lottery-agent
//!
//! Watches a forum for lottery topics and replies to each one exactly once,
//! with randomized text and human-like pacing.
//!
//! ## Architecture
//!
//! ```text
//!   interval (5 min)
//!         │
//!         ▼
//! ┌───────────────┐  try_enqueue   ┌──────────────┐  recv   ┌──────────────┐
//! │    Scanner    │ ─────────────► │  ReplyQueue  │ ──────► │ ReplyWorker  │
//! │ list → match  │  (drop if full)│  (cap 100)   │  FIFO   │ delay → post │
//! └───────┬───────┘                └──────────────┘         └──────┬───────┘
//!         │ server-confirmed reply                                 │ success
//!         ▼                                                        ▼
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                 StateStore (topic id → reply time)                   │
//! │              one lock, flushed to disk on every change               │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! On startup the agent merges the server's reply history into the local
//! state and prunes records older than the retention window. A topic in
//! the state is never replied to again; a topic in the queue is never
//! queued twice.

mod agent;
mod config;
mod error;
mod matcher;
mod queue;
mod reply;
mod scanner;
mod state;
mod worker;

#[cfg(test)]
mod testing;

pub use agent::LotteryAgent;
pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};
pub use matcher::{KeywordMatcher, MatchResult};
pub use queue::{EnqueueOutcome, ReplyQueue, ReplyTask};
pub use reply::{ComposedReply, ReplyComposer};
pub use scanner::{ScanReport, Scanner};
pub use state::{AgentState, StateStore};
pub use worker::{ReplyWorker, WorkerReport};
