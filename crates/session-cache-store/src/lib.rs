//! Durable cache of an authenticated forum session.
//!
//! A successful login leaves behind the cookie set, the username it belongs
//! to and the time it was saved. The next process start reuses it when the
//! username matches and the record is at most seven days old; anything else
//! sends the caller back to a fresh login.

mod cache;
mod error;
mod store;

pub use cache::{SessionCache, StoredCookie, MAX_SESSION_AGE_DAYS};
pub use error::{CacheError, CacheResult, StaleReason};
pub use store::SessionStore;
