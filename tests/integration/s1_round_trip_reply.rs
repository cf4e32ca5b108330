//! S1: Node A posts a query broadcast with a 1000ms expiry; Node B replies
//! once and A's `waitForReply()` observes the reply with the updated text.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sw_query::{ExpiryHook, QueryKind, QueryManager};

struct NoopHook;
impl ExpiryHook for NoopHook {
    fn on_expire(&self, _query_id: u16) {}
}

#[derive(Clone)]
struct PingQuery {
    text: Arc<std::sync::Mutex<String>>,
}

#[tokio::test]
async fn round_trip_single_reply() {
    let manager_a = QueryManager::new(Arc::new(NoopHook));
    let query = manager_a.create(QueryKind::Closed, Duration::from_millis(1000), vec!["node-b".into()], 1000.0);

    let ping = PingQuery { text: Arc::new(std::sync::Mutex::new("hi".to_string())) };

    // Node B's onInquire: mutate the shared object and acknowledge the query.
    let ping_b = ping.clone();
    let query_b = query.clone();
    let handled = Arc::new(AtomicUsize::new(0));
    let handled2 = handled.clone();
    tokio::spawn(async move {
        *ping_b.text.lock().unwrap() = "hi-pong".to_string();
        query_b.on_inquire().unwrap();
        handled2.fetch_add(1, Ordering::SeqCst);
    });

    let replied = query.wait_for_reply().await;
    assert!(replied);
    assert_eq!(*ping.text.lock().unwrap(), "hi-pong");
    assert_eq!(handled.load(Ordering::SeqCst), 1);
}
