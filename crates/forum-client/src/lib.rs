//! # forum-client
//!
//! Authenticated HTTP client for a Discourse forum behind a bot-mitigation
//! edge. The transport presents a Chrome 124 TLS and HTTP/2 fingerprint.
//!
//! ## Construction
//!
//! [`ForumClient::connect`] drives the session state machine in
//! [`auth_fsm`]: a cached cookie set is tried first and verified with one
//! real listing call; otherwise the client lands on the homepage, pauses,
//! fetches a CSRF token and logs in. New cookies are cached per forum host.
//!
//! ## Requests
//!
//! Every call carries the Chrome header profile from [`headers`], the XHR
//! marker and the current CSRF token. Failures are classified into
//! [`ErrorKind`] where the response is read: a 403 is an anti-bot block,
//! a `BAD CSRF` 403 refreshes the token, and rate limits carry the
//! server's suggested wait.
//!
//! ## Trait seam
//!
//! [`ForumApi`] is the subset of operations the pager and the agent use;
//! tests substitute scripted implementations.

pub mod api;
pub mod auth_fsm;
pub mod client;
pub mod config;
pub mod error;
pub mod headers;
pub mod models;
pub mod proxy;
mod session;

#[cfg(test)]
mod testing;

pub use api::ForumApi;
pub use auth_fsm::SessionState;
pub use client::{BookmarkPage, CreatedPost, ForumClient, SessionOrigin};
pub use config::ClientConfig;
pub use error::{ErrorKind, ForumError, ForumResult};
pub use models::{
    ActionSummary, Bookmark, Post, PostStream, SearchPage, SearchResult, TopPeriod, Topic,
    TopicDetail, TopicFilter, TopicList, TopicListBody, User,
};
pub use proxy::{resolve_proxy_with, resolve_system_proxy, ResolvedProxy};
