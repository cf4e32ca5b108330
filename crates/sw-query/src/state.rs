//! The query state machine (spec §4.8).
//!
//! ```text
//! QUERY ──onInquire→ REPLIED ─┐
//! QUERY ──replyNext→ NEXT ──(replyNext)*→ NEXT ──replyEnd→ END
//! any   ──abort→    ABORTED   (terminal)
//! ```

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryState {
    Query,
    Replied,
    Next,
    End,
    Aborted,
}

impl QueryState {
    /// `REPLIED`, `END`, and `ABORTED` are terminal: no further transition
    /// is possible and the query is eligible for removal from the pending
    /// map once observed.
    pub fn is_terminal(self) -> bool {
        matches!(self, QueryState::Replied | QueryState::End | QueryState::Aborted)
    }
}
