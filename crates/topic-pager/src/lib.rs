//! # topic-pager
//!
//! Presents a topic as a flat, 1-based floor sequence while the forum only
//! serves the first batch on open and arbitrary id subsets afterwards.
//!
//! ```text
//! stream:  [id1 id2 id3 ... id200]      every post id, floor order
//! loaded:  {floor 1..20} ∪ {27..47}     what has been fetched so far
//! ```
//!
//! Sequential reading grows the loaded set with [`TopicPager::load_more`];
//! a jump replaces it with a window around the target floor.

mod error;
mod pager;

pub use error::{PagerError, PagerResult};
pub use pager::{
    jump_window, JumpOutcome, LikeOutcome, LoadMoreOutcome, TopicPager, JUMP_CONTEXT,
    LOAD_MORE_BATCH,
};
