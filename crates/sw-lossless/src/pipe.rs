//! The durable at-least-once pipe itself (spec §4.6).

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use sw_util::RateModerator;
use tokio::sync::Notify;

use crate::error::LosslessError;
use crate::history::History;

const RESEND_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Structural tuning parameters (spec §4.6, defaults in parens).
#[derive(Debug, Clone, Copy)]
pub struct PipeParams {
    pub buffer_size: u64,
    pub buffers_per_file: u64,
    pub max_files: u64,
}

impl Default for PipeParams {
    fn default() -> Self {
        PipeParams {
            buffer_size: 1000,
            buffers_per_file: 10,
            max_files: 100_000,
        }
    }
}

impl PipeParams {
    fn lines_per_file(&self) -> u64 {
        self.buffer_size * self.buffers_per_file
    }

    fn modulus(&self) -> u64 {
        self.lines_per_file() * self.max_files
    }
}

struct State {
    next_put: u64,
    next_get: u64,
    next_ack: u64,
    skipped_ranges: Vec<(u64, u64)>,
    block: Vec<String>,
    block_start: u64,
}

/// A durable, modulo-indexed, at-least-once delivery pipe backed by a
/// directory of `<startIndex>.txt` files plus a `history.txt` sidecar.
pub struct LosslessPipe {
    dir: PathBuf,
    params: PipeParams,
    state: Mutex<State>,
    notify: Notify,
}

impl LosslessPipe {
    pub fn open(dir: impl Into<PathBuf>, params: PipeParams) -> Result<Self, LosslessError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let history_path = dir.join("history.txt");
        let history = History::load(&history_path)?.unwrap_or_default();
        let state = State {
            next_put: history.next_put,
            next_get: history.next_get,
            next_ack: history.next_ack,
            skipped_ranges: history.skipped_ranges,
            block: Vec::new(),
            block_start: history.next_put,
        };
        Ok(LosslessPipe {
            dir,
            params,
            state: Mutex::new(state),
            notify: Notify::new(),
        })
    }

    fn history_path(&self) -> PathBuf {
        self.dir.join("history.txt")
    }

    fn file_index_for(&self, idx: u64) -> u64 {
        idx - (idx % self.params.lines_per_file())
    }

    fn file_path(&self, start: u64) -> PathBuf {
        self.dir.join(format!("{start}.txt"))
    }

    fn save_history(&self, state: &State) -> Result<(), LosslessError> {
        let h = History {
            next_put: state.next_put,
            next_get: state.next_get,
            next_ack: state.next_ack,
            skipped_ranges: state.skipped_ranges.clone(),
        };
        h.save(&self.history_path())
    }

    /// Append `payload` and return its assigned index.
    pub fn put(&self, payload: &str) -> Result<u64, LosslessError> {
        let mut state = self.state.lock().unwrap();
        let idx = state.next_put;
        state.next_put = state.next_put.wrapping_add(1) % self.params.modulus();
        state.block.push(payload.to_owned());
        if state.block.len() as u64 == self.params.buffer_size {
            self.flush_block(&mut state)?;
        }
        self.save_history(&state)?;
        drop(state);
        self.notify.notify_waiters();
        Ok(idx)
    }

    fn flush_block(&self, state: &mut State) -> Result<(), LosslessError> {
        if state.block.is_empty() {
            return Ok(());
        }
        let file_start = self.file_index_for(state.block_start);
        let path = self.file_path(file_start);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        for (i, payload) in state.block.iter().enumerate() {
            let idx = state.block_start + i as u64;
            writeln!(file, "^,{idx},{payload}")?;
        }
        state.block_start += state.block.len() as u64;
        state.block.clear();
        self.cleanup_drained_files(state)?;
        Ok(())
    }

    fn cleanup_drained_files(&self, state: &State) -> Result<(), LosslessError> {
        let lines_per_file = self.params.lines_per_file();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let path = entry.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else { continue };
            let Ok(start) = stem.parse::<u64>() else { continue };
            let last_index = start + lines_per_file - 1;
            if state.next_get > last_index {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn read_line_at(&self, path: &Path, idx: u64) -> Result<Option<String>, LosslessError> {
        let Ok(file) = File::open(path) else { return Ok(None) };
        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let mut parts = line.splitn(3, ',');
            let (Some(tag), Some(index_str), Some(payload)) = (parts.next(), parts.next(), parts.next()) else {
                return Err(LosslessError::CorruptLine {
                    file: path.display().to_string(),
                    line: lineno,
                });
            };
            if tag != "^" {
                return Err(LosslessError::CorruptLine {
                    file: path.display().to_string(),
                    line: lineno,
                });
            }
            if index_str.parse::<u64>() == Ok(idx) {
                return Ok(Some(payload.to_owned()));
            }
        }
        Ok(None)
    }

    fn read_at(&self, state: &State, idx: u64) -> Result<Option<String>, LosslessError> {
        if idx >= state.block_start && idx < state.block_start + state.block.len() as u64 {
            return Ok(Some(state.block[(idx - state.block_start) as usize].clone()));
        }
        let file_start = self.file_index_for(idx);
        self.read_line_at(&self.file_path(file_start), idx)
    }

    /// Return and consume the next item, or `None` if the consumer has
    /// caught up to the producer.
    pub fn get(&self) -> Result<Option<String>, LosslessError> {
        let mut state = self.state.lock().unwrap();
        if state.next_get == state.next_put {
            return Ok(None);
        }
        let idx = state.next_get;
        let payload = self.read_at(&state, idx)?;
        state.next_get = state.next_get.wrapping_add(1) % self.params.modulus();
        self.cleanup_drained_files(&state)?;
        self.save_history(&state)?;
        Ok(payload)
    }

    /// Block until an item is available, then return it (the auto-getter's
    /// activation/condition signal, spec §4.6).
    pub async fn get_blocking(&self) -> Result<String, LosslessError> {
        loop {
            let notified = self.notify.notified();
            if let Some(item) = self.get()? {
                return Ok(item);
            }
            notified.await;
        }
    }

    /// Advance the ack cursor. A gap between the previous ack and `n` is
    /// recorded as a skipped range for resend.
    pub fn acknowledge(&self, n: u64) -> Result<(), LosslessError> {
        let mut state = self.state.lock().unwrap();
        if n >= state.next_ack {
            if n > state.next_ack {
                let prev_ack = state.next_ack;
                state.skipped_ranges.push((prev_ack, n));
            }
            state.next_ack = n.wrapping_add(1);
        }
        self.save_history(&state)
    }

    /// Replay every skipped range, rate-moderated, invoking `callback` with
    /// each item's index and payload. Ranges are cleared as they complete.
    ///
    /// `async` so the rate limiter's wait is a `tokio::time::sleep` rather
    /// than a blocking one (the same pattern `Resetter::run_pump` uses) —
    /// this runs straight on a tokio task without starving the runtime's
    /// other work the way `RateModerator::take_blocking` would.
    pub async fn resend(&self, moderator: &RateModerator, mut callback: impl FnMut(u64, &str)) -> Result<(), LosslessError> {
        let ranges = {
            let mut state = self.state.lock().unwrap();
            std::mem::take(&mut state.skipped_ranges)
        };
        for (start, end) in ranges {
            let mut idx = start;
            while idx < end {
                while !moderator.try_take(1) {
                    tokio::time::sleep(RESEND_POLL_INTERVAL).await;
                }
                let payload = {
                    let state = self.state.lock().unwrap();
                    self.read_at(&state, idx)?
                };
                if let Some(payload) = payload {
                    callback(idx, &payload);
                }
                idx += 1;
            }
        }
        let state = self.state.lock().unwrap();
        self.save_history(&state)
    }

    pub fn next_put(&self) -> u64 {
        self.state.lock().unwrap().next_put
    }

    pub fn next_get(&self) -> u64 {
        self.state.lock().unwrap().next_get
    }

    pub fn next_ack(&self) -> u64 {
        self.state.lock().unwrap().next_ack
    }

    pub fn pending_count(&self) -> u64 {
        let state = self.state.lock().unwrap();
        state.next_put.wrapping_sub(state.next_get) % self.params.modulus()
    }
}
