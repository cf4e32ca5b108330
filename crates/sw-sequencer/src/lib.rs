//! Per-`(channel, ObjectCode)` sequencing for one direction of one channel
//! (spec §4.3). A `Sequencer` is owned per-channel-per-direction by
//! `sw-hub`; two peers talking on one channel each own one for outbound and
//! consult the other side's counters via their own inbound `Sequencer`.
//!
//! The modulus is 2^16. Wrap-around to 0 is not special-cased on send — it
//! is a natural consequence of `u16` wrapping — and the receive path
//! recognizes a received `0` as the reset marker, per spec.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use sw_util::OnceWindow;
use sw_wire::keyframe::KeyframeTable;

/// Rate limit on reset-requests, scoped per-`(channel, ObjectCode)` by
/// virtue of living inside the per-code state here. See DESIGN.md Open
/// Question 1.
const RESET_REQUEST_WINDOW: Duration = Duration::from_secs(180);

/// Half of the 2^16 modulus: the boundary used to tell "ahead" (gap) from
/// "behind" (boomerang) when a received sequence doesn't match expectation.
/// See DESIGN.md Open Question 3.
const HALF_MODULUS: u32 = 1 << 15;

struct CodeState {
    expected: u16,
    keyframe: KeyframeTable,
    reset_gate: OnceWindow,
}

impl CodeState {
    fn new() -> Self {
        CodeState {
            expected: 0,
            keyframe: KeyframeTable::new(),
            reset_gate: OnceWindow::new(RESET_REQUEST_WINDOW),
        }
    }
}

/// Outcome of processing one inbound frame's sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqOutcome {
    /// Matches expectation; counter advanced, process the frame normally.
    InSequence,
    /// `received == 0`: reset marker. Keyframe and counter cleared; the
    /// frame itself is a (or starts a) keyframe and should still be
    /// processed.
    Reset,
    /// Behind expectation (modulo): a boomerang or a duplicate retransmit.
    /// Drop silently.
    Duplicate,
    /// Ahead of expectation: a gap. Drop the frame. `reset_requested` is
    /// `true` at most once per `RESET_REQUEST_WINDOW` for this code.
    OutOfSequence { reset_requested: bool },
}

/// Sequencing state for one direction of one channel, covering every
/// `ObjectCode` seen on it.
pub struct Sequencer {
    channel: String,
    states: Mutex<HashMap<String, CodeState>>,
}

impl Sequencer {
    pub fn new(channel: impl Into<String>) -> Self {
        Sequencer {
            channel: channel.into(),
            states: Mutex::new(HashMap::new()),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Stamp the next outbound sequence number for `code` and advance the
    /// counter (spec §4.3: "next value is stamped... and post-incremented").
    pub fn on_send(&self, code: &str) -> u16 {
        let mut states = self.states.lock().unwrap();
        let state = states.entry(code.to_owned()).or_insert_with(CodeState::new);
        let seq = state.expected;
        state.expected = state.expected.wrapping_add(1);
        seq
    }

    /// Process an inbound frame's sequence number for `code`.
    pub fn on_receive(&self, code: &str, received: u16) -> SeqOutcome {
        let mut states = self.states.lock().unwrap();
        let state = states.entry(code.to_owned()).or_insert_with(CodeState::new);

        if received == 0 {
            state.keyframe.clear();
            state.expected = 1;
            return SeqOutcome::Reset;
        }

        if received == state.expected {
            state.expected = state.expected.wrapping_add(1);
            return SeqOutcome::InSequence;
        }

        let forward_distance = received.wrapping_sub(state.expected) as u32;
        if forward_distance <= HALF_MODULUS {
            let reset_requested = state.reset_gate.try_fire();
            SeqOutcome::OutOfSequence { reset_requested }
        } else {
            SeqOutcome::Duplicate
        }
    }

    /// Force a reset on a specific code, e.g. because this side is the one
    /// sending `^Reset` (clears our own tracking so the next send/receive
    /// starts a fresh keyframe exchange).
    pub fn force_reset(&self, code: &str) {
        let mut states = self.states.lock().unwrap();
        let state = states.entry(code.to_owned()).or_insert_with(CodeState::new);
        state.keyframe.clear();
        state.expected = 0;
    }

    /// Run `f` against the keyframe table for `code`, creating it empty if
    /// this is the first frame seen for it.
    pub fn with_keyframe<R>(&self, code: &str, f: impl FnOnce(&mut KeyframeTable) -> R) -> R {
        let mut states = self.states.lock().unwrap();
        let state = states.entry(code.to_owned()).or_insert_with(CodeState::new);
        f(&mut state.keyframe)
    }
}
