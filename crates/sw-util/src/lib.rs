//! Shared primitives used by several fabric components:
//!
//! - [`RateModerator`]: a token-bucket limiter used by the sequencer's
//!   reset-request throttle, the resetter's pump, and the lossless pipe's
//!   resend loop (spec §4.3, §4.6, §4.7 each describe a rate-moderated
//!   behavior; this is the one primitive behind all three). The async
//!   callers (`Resetter::run_pump`, `LosslessPipe::resend`) poll `try_take`
//!   with `tokio::time::sleep`; `take_blocking` is the thread-sleeping
//!   variant for a genuinely dedicated blocking thread.
//! - [`ErrorKind`] / [`ReportError`]: the error taxonomy and observability
//!   hook from spec §7, shared so every crate reports through the same
//!   vocabulary regardless of which local error type it uses internally.

use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// RateModerator
// ---------------------------------------------------------------------------

/// A simple token-bucket rate limiter.
///
/// Credits accumulate at `rate_per_min / 60` per second, capped at one
/// minute's worth of credit (`rate_per_min`). `try_take(n)` consumes `n`
/// credits if available and returns `true`; otherwise it returns `false`
/// without blocking. `restart()` resets the accumulated credit to zero,
/// matching the resetter's "restart clears the moderator's accumulated
/// credit" requirement (spec §4.7).
pub struct RateModerator {
    rate_per_min: Mutex<f64>,
    state: Mutex<BucketState>,
}

struct BucketState {
    credit: f64,
    last_refill: Instant,
}

impl RateModerator {
    pub fn new(rate_per_min: u64) -> Self {
        RateModerator {
            rate_per_min: Mutex::new(rate_per_min as f64),
            state: Mutex::new(BucketState {
                credit: rate_per_min as f64,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Replace the configured rate without resetting accumulated credit.
    pub fn set_rate(&self, rate_per_min: u64) {
        *self.rate_per_min.lock().unwrap() = rate_per_min as f64;
    }

    /// Attempt to consume `n` credits. Returns `true` if granted.
    pub fn try_take(&self, n: u64) -> bool {
        let rate = *self.rate_per_min.lock().unwrap();
        let mut state = self.state.lock().unwrap();
        self.refill(&mut state, rate);
        if state.credit >= n as f64 {
            state.credit -= n as f64;
            true
        } else {
            false
        }
    }

    /// Block the calling thread (via short sleeps) until `n` credits are
    /// available, then consume them. This sleeps the OS thread, not the
    /// async task, so it must only be called from a genuinely dedicated
    /// blocking thread (e.g. inside `tokio::task::spawn_blocking`), never
    /// directly on a tokio worker. Callers running inside an async context
    /// should loop on `try_take` with `tokio::time::sleep` instead, the way
    /// `Resetter::run_pump` and `LosslessPipe::resend` do.
    pub fn take_blocking(&self, n: u64) {
        loop {
            if self.try_take(n) {
                return;
            }
            std::thread::sleep(Duration::from_millis(25));
        }
    }

    /// Clear accumulated credit back to zero. Called when a resetter or
    /// sequencer instance is restarted (spec §4.7, §3.9's reset handling).
    pub fn restart(&self) {
        let mut state = self.state.lock().unwrap();
        state.credit = 0.0;
        state.last_refill = Instant::now();
    }

    fn refill(&self, state: &mut BucketState, rate_per_min: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.last_refill = now;
        state.credit = (state.credit + elapsed * rate_per_min / 60.0).min(rate_per_min);
    }
}

// ---------------------------------------------------------------------------
// Once-per-window gate (the sequencer's "rate-limited to once per 3 min")
// ---------------------------------------------------------------------------

/// A gate that permits one action per `window`, keyed externally by the
/// caller (the sequencer keeps one `OnceWindow` per `(channel, ObjectCode)`).
pub struct OnceWindow {
    window: Duration,
    last_fired: Mutex<Option<Instant>>,
}

impl OnceWindow {
    pub fn new(window: Duration) -> Self {
        OnceWindow {
            window,
            last_fired: Mutex::new(None),
        }
    }

    /// Returns `true` if the action may fire now, and records that it did.
    pub fn try_fire(&self) -> bool {
        let mut last = self.last_fired.lock().unwrap();
        let now = Instant::now();
        match *last {
            Some(t) if now.duration_since(t) < self.window => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Error taxonomy (spec §7)
// ---------------------------------------------------------------------------

/// The error taxonomy from spec §7. Every recoverable error surfaces through
/// [`ReportError::report_error`] tagged with one of these kinds; the core
/// never aborts the process on a data error regardless of kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Channel read/write or file I/O failure; retried with reconnect backoff.
    TransientIo,
    /// Inbound frame gap; frame dropped, reset requested (rate-limited).
    OutOfSequence,
    /// Malformed frame or corrupted archive line; counted and skipped.
    ParseError,
    /// Frame names an ObjectCode with no registered factory.
    FactoryMiss,
    /// Lossless ack arrived past the expected serial; range queued for resend.
    LosslessSkip,
    /// A bounded queue is saturated.
    BufferOverflow,
    /// A query's expiry timer fired before completion.
    QueryExpired,
    /// Config is missing or unparsable at startup.
    ConfigInvalid,
    /// Uncaught error in an application-supplied hook.
    FatalLocal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TransientIo => "transient_io",
            ErrorKind::OutOfSequence => "out_of_sequence",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::FactoryMiss => "factory_miss",
            ErrorKind::LosslessSkip => "lossless_skip",
            ErrorKind::BufferOverflow => "buffer_overflow",
            ErrorKind::QueryExpired => "query_expired",
            ErrorKind::ConfigInvalid => "config_invalid",
            ErrorKind::FatalLocal => "fatal_local",
        }
    }

    /// Whether this kind represents a critical failure: the affected
    /// subsystem refuses to start, but unaffected subsystems continue
    /// (spec §7 propagation policy).
    pub fn is_critical(&self) -> bool {
        matches!(self, ErrorKind::ConfigInvalid)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The observability hook an application may override (spec §7:
/// `reportError(kind, message, detail, critical)`). The default
/// implementation just logs via `tracing`.
pub trait ReportError: Send + Sync {
    fn report_error(&self, kind: ErrorKind, message: &str, detail: &str, critical: bool);
}

/// Default reporter: logs at `error` for critical kinds, `warn` otherwise.
pub struct TracingReporter;

impl ReportError for TracingReporter {
    fn report_error(&self, kind: ErrorKind, message: &str, detail: &str, critical: bool) {
        if critical {
            tracing::error!(kind = %kind, critical, detail, "{}", message);
        } else {
            tracing::warn!(kind = %kind, critical, detail, "{}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_moderator_denies_past_capacity_then_refills() {
        let m = RateModerator::new(60); // 1 credit/sec
        for _ in 0..60 {
            assert!(m.try_take(1));
        }
        assert!(!m.try_take(1));
    }

    #[test]
    fn rate_moderator_restart_clears_credit() {
        let m = RateModerator::new(60);
        m.restart();
        assert!(!m.try_take(1));
    }

    #[test]
    fn once_window_fires_once_per_window() {
        let gate = OnceWindow::new(Duration::from_millis(50));
        assert!(gate.try_fire());
        assert!(!gate.try_fire());
        std::thread::sleep(Duration::from_millis(60));
        assert!(gate.try_fire());
    }

    #[test]
    fn error_kind_critical_flags_config_invalid_only() {
        assert!(ErrorKind::ConfigInvalid.is_critical());
        assert!(!ErrorKind::ParseError.is_critical());
        assert!(!ErrorKind::TransientIo.is_critical());
    }
}
