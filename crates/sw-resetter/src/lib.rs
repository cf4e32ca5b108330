//! Bounded, rate-moderated reset-item queue and pump, one per `ObjectCode`
//! (spec §4.7).

pub mod error;
pub mod resetter;

pub use error::ResetterError;
pub use resetter::{ResetItem, ResetMode, ResetSink, Resetter};
