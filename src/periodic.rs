//! One periodic-tasks worker on a 1-minute tick (spec §5), used for
//! resetter pump upkeep, stale-node sweeps, and anything else the runtime
//! needs to poke on a schedule rather than in response to a frame.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;

pub type PeriodicTask = dyn Fn() + Send + Sync;

pub struct PeriodicRunner {
    tasks: Arc<RwLock<Vec<Arc<PeriodicTask>>>>,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicRunner {
    pub fn start(interval: Duration) -> Self {
        let tasks: Arc<RwLock<Vec<Arc<PeriodicTask>>>> = Arc::new(RwLock::new(Vec::new()));
        let tasks_for_loop = tasks.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // first tick fires immediately; skip it
            loop {
                ticker.tick().await;
                let snapshot: Vec<Arc<PeriodicTask>> = tasks_for_loop.read().unwrap().clone();
                for task in snapshot {
                    task();
                }
            }
        });
        PeriodicRunner { tasks, handle: Some(handle) }
    }

    pub fn register(&self, task: Arc<PeriodicTask>) {
        self.tasks.write().unwrap().push(task);
    }
}

impl Drop for PeriodicRunner {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn registered_task_fires_on_tick() {
        let runner = PeriodicRunner::start(Duration::from_millis(10));
        let count = Arc::new(AtomicUsize::new(0));
        let count2 = count.clone();
        runner.register(Arc::new(move || {
            count2.fetch_add(1, Ordering::SeqCst);
        }));
        // Let the spawned loop task reach its first `.await` (constructing
        // the interval and consuming its immediate first tick) before we
        // advance the paused clock, so the ticks we simulate below are
        // actually counted against it.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(35)).await;
        tokio::task::yield_now().await;
        assert!(count.load(Ordering::SeqCst) >= 2);
    }
}
