//! One reset queue + pump, scoped to a single `ObjectCode` (spec §4.7).

use std::sync::Mutex;
use std::time::Duration;

use sw_util::RateModerator;
use tokio::sync::mpsc;

use crate::error::ResetterError;

const DEFAULT_CAPACITY: usize = 200_000;
const DEFAULT_RATE_PER_MIN: u64 = 30_000;
const PUMP_POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetMode {
    /// Excess items are dropped when the queue is full.
    Lossy,
    /// The producer blocks until space is available.
    Lossless,
}

/// One item to replay, destined either for every consumer of `object_code`
/// (`target_channel: None`) or for a specific channel that requested a
/// reset (`target_channel: Some(channel)`).
#[derive(Debug, Clone)]
pub struct ResetItem {
    pub object_code: String,
    pub payload: String,
    pub target_channel: Option<String>,
}

enum QueueMsg {
    Item(ResetItem),
    EndOfData,
}

/// Where pumped items go. Implemented by `sw-hub` in the real runtime; an
/// in-memory recorder is used in tests.
pub trait ResetSink: Send + Sync {
    fn broadcast(&self, object_code: &str, payload: &str);
    fn send_to_channel(&self, channel: &str, object_code: &str, payload: &str);
}

struct ChannelState {
    tx: mpsc::Sender<QueueMsg>,
    rx: Option<mpsc::Receiver<QueueMsg>>,
}

fn new_channel(capacity: usize) -> ChannelState {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    ChannelState { tx, rx: Some(rx) }
}

/// Queue and pump for one `ObjectCode`'s reset stream.
pub struct Resetter {
    mode: ResetMode,
    capacity: usize,
    moderator: RateModerator,
    state: Mutex<ChannelState>,
}

impl Resetter {
    pub fn new(mode: ResetMode) -> Self {
        Resetter::with_params(mode, DEFAULT_CAPACITY, DEFAULT_RATE_PER_MIN)
    }

    pub fn with_params(mode: ResetMode, capacity: usize, rate_per_min: u64) -> Self {
        Resetter {
            mode,
            capacity,
            moderator: RateModerator::new(rate_per_min),
            state: Mutex::new(new_channel(capacity)),
        }
    }

    fn sender(&self) -> mpsc::Sender<QueueMsg> {
        self.state.lock().unwrap().tx.clone()
    }

    /// Enqueue an item for the pump. In `Lossy` mode this drops the item
    /// (and logs) when the queue is full; in `Lossless` mode it awaits
    /// space, backpressuring the caller.
    pub async fn push(&self, item: ResetItem) -> Result<(), ResetterError> {
        let tx = self.sender();
        match self.mode {
            ResetMode::Lossless => tx.send(QueueMsg::Item(item)).await.map_err(|_| ResetterError::Closed),
            ResetMode::Lossy => {
                let object_code = item.object_code.clone();
                if let Err(mpsc::error::TrySendError::Full(_)) = tx.try_send(QueueMsg::Item(item)) {
                    tracing::warn!(object_code, "resetter queue full, dropping item");
                }
                Ok(())
            }
        }
    }

    /// Signal that no more items will be pushed this round. The pump calls
    /// `on_completed` once it observes this and exits.
    pub async fn end_of_data(&self) -> Result<(), ResetterError> {
        let tx = self.sender();
        tx.send(QueueMsg::EndOfData).await.map_err(|_| ResetterError::Closed)
    }

    /// Drain the queue into `sink`, rate-moderated, until `end_of_data` is
    /// observed or the channel is dropped by a `restart`. Only one caller
    /// may run the pump at a time (it takes ownership of the receiver).
    pub async fn run_pump(&self, sink: &dyn ResetSink, on_completed: impl FnOnce()) -> Result<(), ResetterError> {
        let mut rx = {
            let mut state = self.state.lock().unwrap();
            state.rx.take().ok_or(ResetterError::AlreadyRunning)?
        };
        loop {
            match rx.recv().await {
                Some(QueueMsg::Item(item)) => {
                    while !self.moderator.try_take(1) {
                        tokio::time::sleep(PUMP_POLL_INTERVAL).await;
                    }
                    match &item.target_channel {
                        Some(channel) => sink.send_to_channel(channel, &item.object_code, &item.payload),
                        None => sink.broadcast(&item.object_code, &item.payload),
                    }
                }
                Some(QueueMsg::EndOfData) => {
                    on_completed();
                    break;
                }
                None => break,
            }
        }
        Ok(())
    }

    /// Replace the queue with a fresh, empty one and clear the rate
    /// moderator's accumulated credit (spec §4.7). A pump currently
    /// draining the old queue observes it close and returns.
    pub fn restart(&self) {
        let mut state = self.state.lock().unwrap();
        *state = new_channel(self.capacity);
        drop(state);
        self.moderator.restart();
    }
}
