//! Top-level error type and the `ReportError` hook wiring (spec §7). The
//! taxonomy itself lives in `sw_util` since several crates below this one
//! need to tag errors with it; this module just re-exports it alongside the
//! aggregate error this crate's own public API returns.

pub use sw_util::{ErrorKind, ReportError, TracingReporter};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
    #[error(transparent)]
    Tree(#[from] sw_objects::TreeError),
    #[error(transparent)]
    Hub(#[from] sw_hub::HubError),
    #[error(transparent)]
    Lossless(#[from] sw_lossless::LosslessError),
    #[error(transparent)]
    Resetter(#[from] sw_resetter::ResetterError),
    #[error(transparent)]
    Query(#[from] sw_query::QueryError),
    #[error(transparent)]
    Channel(#[from] sw_channel::ChannelError),
}

impl RuntimeError {
    /// Map this error to the spec §7 taxonomy kind used for `ReportError`.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::Config(_) => ErrorKind::ConfigInvalid,
            RuntimeError::Tree(sw_objects::TreeError::FactoryMiss(_)) => ErrorKind::FactoryMiss,
            RuntimeError::Tree(_) => ErrorKind::ParseError,
            RuntimeError::Hub(sw_hub::HubError::Lossless(_)) => ErrorKind::LosslessSkip,
            RuntimeError::Hub(_) => ErrorKind::TransientIo,
            RuntimeError::Lossless(_) => ErrorKind::LosslessSkip,
            RuntimeError::Resetter(_) => ErrorKind::BufferOverflow,
            RuntimeError::Query(_) => ErrorKind::QueryExpired,
            RuntimeError::Channel(_) => ErrorKind::TransientIo,
        }
    }
}

/// Report `err` through `hook`, tagged with its taxonomy kind and critical
/// flag, then log it regardless (spec §7: "never panics on a data error").
pub fn report(hook: &dyn ReportError, err: &RuntimeError) {
    let kind = err.kind();
    hook.report_error(kind, &err.to_string(), "", kind.is_critical());
}
