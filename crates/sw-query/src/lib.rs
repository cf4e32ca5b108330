//! Query life cycle: states, expiry timers, streaming `replyNext`
//! throttling, and synchronous `waitForReply` (spec §4.8).

pub mod error;
pub mod query;
pub mod state;

pub use error::QueryError;
pub use query::{ExpiryHook, Query, QueryKind, QueryManager};
pub use state::QueryState;
