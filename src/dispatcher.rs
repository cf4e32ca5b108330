//! Bounded async event dispatcher (spec §5): one queue, a fixed pool of
//! worker tasks draining it, consumer callbacks registered per `ObjectCode`.
//! Grounded on the teacher's per-consumer writer-task fan-out
//! (`local_fanout.rs`) and its bus-draining worker pool (`workers/client_pool.rs`),
//! collapsed into a single shared queue since dispatch here has no
//! per-peer socket to hold open.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use sw_wire::Frame;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

pub type DispatchCallback = dyn Fn(&Frame) + Send + Sync;

struct DispatchJob {
    object_code: String,
    frame: Frame,
}

/// Drains dispatch jobs across `worker_count` tasks, invoking whatever
/// callback is registered for the job's `ObjectCode`.
pub struct Dispatcher {
    tx: mpsc::Sender<DispatchJob>,
    callbacks: Arc<RwLock<HashMap<String, Arc<DispatchCallback>>>>,
    workers: Vec<JoinHandle<()>>,
}

impl Dispatcher {
    pub fn start(worker_count: usize, queue_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel::<DispatchJob>(queue_capacity);
        let rx = Arc::new(Mutex::new(rx));
        let callbacks: Arc<RwLock<HashMap<String, Arc<DispatchCallback>>>> = Arc::new(RwLock::new(HashMap::new()));

        let workers = (0..worker_count.max(1))
            .map(|_| {
                let rx = rx.clone();
                let callbacks = callbacks.clone();
                tokio::spawn(async move {
                    loop {
                        let job = { rx.lock().await.recv().await };
                        let Some(job) = job else { return };
                        let callback = callbacks.read().unwrap().get(&job.object_code).cloned();
                        if let Some(callback) = callback {
                            callback(&job.frame);
                        } else {
                            tracing::debug!(object_code = %job.object_code, "dispatched frame with no registered consumer callback");
                        }
                    }
                })
            })
            .collect();

        Dispatcher { tx, callbacks, workers }
    }

    pub fn register(&self, object_code: impl Into<String>, callback: Arc<DispatchCallback>) {
        self.callbacks.write().unwrap().insert(object_code.into(), callback);
    }

    /// Enqueue a frame for dispatch. Returns `Err` if the queue is closed
    /// (spec §7 `BufferOverflow` handles the saturated, not closed, case —
    /// callers awaiting `send` naturally apply backpressure instead).
    pub async fn dispatch(&self, object_code: impl Into<String>, frame: Frame) -> Result<(), Frame> {
        let object_code = object_code.into();
        self.tx.send(DispatchJob { object_code, frame }).await.map_err(|e| e.0.frame)
    }

    pub async fn shutdown(self) {
        drop(self.tx);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}
