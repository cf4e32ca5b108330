use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetterError {
    /// The item/end-of-data channel was closed (a concurrent `restart`).
    Closed,
    /// `run_pump` was called while a pump task already owns the receiver.
    AlreadyRunning,
}

impl fmt::Display for ResetterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetterError::Closed => write!(f, "resetter queue closed"),
            ResetterError::AlreadyRunning => write!(f, "resetter pump already running"),
        }
    }
}

impl std::error::Error for ResetterError {}
