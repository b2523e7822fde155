//! Session construction state machine using rust-fsm.
//!
//! A client is only handed out once it reaches `Verified`. Every other
//! terminal path surfaces as an error from [`crate::ForumClient::connect`].
//!
//! ## State Diagram
//!
//! ```text
//! ┌─────────────────┐
//! │  Uninitialized  │ (initial)
//! └────────┬────────┘
//!          │ CheckCache                      SkipCache
//!          ▼                                     │
//! ┌─────────────────┐   CacheRejected   ┌────────▼────────┐
//! │   CacheCheck    │ ────────────────► │     Warmup      │
//! └────────┬────────┘                   └────────┬────────┘
//!          │ CacheVerified                       │ WarmupComplete / WarmupFailed
//!          │                                     ▼
//!          │                            ┌─────────────────┐
//!          │                            │      Login      │──► Failed
//!          │                            └────────┬────────┘  (LoginFailed)
//!          │                                     │ LoginSucceeded
//!          ▼                                     ▼
//! ┌──────────────────────────────────────────────────────┐
//! │                       Verified                       │
//! └──────────────────────────────────────────────────────┘
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Uninitialized)

    Uninitialized => {
        CheckCache => CacheCheck,
        SkipCache => Warmup
    },
    CacheCheck => {
        // Cookies installed and one listing call succeeded
        CacheVerified => Verified,
        // Missing, stale, corrupt, or refused by the server
        CacheRejected => Warmup
    },
    Warmup => {
        WarmupComplete => Login,
        WarmupFailed => Failed
    },
    Login => {
        LoginSucceeded => Verified,
        LoginFailed => Failed
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Externally visible session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    CacheCheck,
    Warmup,
    Login,
    Verified,
    Failed,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Verified)
    }

    /// Returns true while construction is still in progress.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SessionState::CacheCheck | SessionState::Warmup | SessionState::Login
        )
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Uninitialized => SessionState::Uninitialized,
            SessionMachineState::CacheCheck => SessionState::CacheCheck,
            SessionMachineState::Warmup => SessionState::Warmup,
            SessionMachineState::Login => SessionState::Login,
            SessionMachineState::Verified => SessionState::Verified,
            SessionMachineState::Failed => SessionState::Failed,
        }
    }
}
