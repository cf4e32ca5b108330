//! S2: an open query streaming many `replyNext` calls is throttled to its
//! configured rate rather than bursting, and `replyEnd` closes it cleanly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sw_query::{ExpiryHook, QueryKind, QueryManager, QueryState};

struct NoopHook;
impl ExpiryHook for NoopHook {
    fn on_expire(&self, _query_id: u16) {}
}

#[tokio::test]
async fn reply_next_stream_is_rate_moderated() {
    let manager = QueryManager::new(Arc::new(NoopHook));
    // 100 items/sec -> 10 items takes at least ~90ms end to end.
    let query = manager.create(QueryKind::Open, Duration::from_secs(5), vec![], 100.0);

    let start = Instant::now();
    for _ in 0..10 {
        query.reply_next().await.unwrap();
        assert_eq!(query.state(), QueryState::Next);
    }
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(80), "stream should be throttled, took {elapsed:?}");

    query.reply_end().unwrap();
    assert_eq!(query.state(), QueryState::End);
    assert!(query.is_terminal());
}

#[tokio::test]
async fn closed_query_rejects_reply_next() {
    let manager = QueryManager::new(Arc::new(NoopHook));
    let query = manager.create(QueryKind::Closed, Duration::from_secs(5), vec![], 100.0);
    query.on_inquire().unwrap();
    assert!(query.reply_next().await.is_err());
}
