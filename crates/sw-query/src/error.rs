//! Query errors, `thiserror`-derived per this crate's place in the split
//! documented in DESIGN.md.

use crate::state::QueryState;

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("invalid query transition from {from:?} via {action}")]
    InvalidTransition { from: QueryState, action: &'static str },
    #[error("query id {0} not found")]
    NotFound(u16),
}
