//! S3: producer P emits 10 items over a lossless pipe; consumer C acks
//! 1,2,6,7,...,10 (0-indexed: 0,1,5,6,7,8,9) but never saw 3,4,5 on the
//! wire. P must resend exactly those three items once, after which every
//! value has been observed.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use sw_lossless::{LosslessPipe, PipeParams};
use sw_util::RateModerator;

#[tokio::test]
async fn lossless_resend_recovers_dropped_middle_range() {
    let dir = tempfile::tempdir().unwrap();
    let pipe = LosslessPipe::open(dir.path(), PipeParams::default()).unwrap();

    for i in 1..=10u32 {
        pipe.put(&format!("value-{i}")).unwrap();
    }

    // Consumer observed indices 0,1 then jumped to 5,6,7,8,9 on the wire,
    // dropping 2,3,4 (items "value-3","value-4","value-5").
    let mut seen: HashSet<u64> = [0u64, 1, 5, 6, 7, 8, 9].into_iter().collect();
    for &idx in &[0u64, 1, 5, 6, 7, 8, 9] {
        pipe.acknowledge(idx).unwrap();
    }

    let moderator = RateModerator::new(60_000);
    let resent = Arc::new(Mutex::new(Vec::new()));
    let resent2 = resent.clone();
    pipe.resend(&moderator, |idx, payload| {
        resent2.lock().unwrap().push((idx, payload.to_string()));
    })
    .await
    .unwrap();

    let resent = resent.lock().unwrap();
    assert_eq!(resent.len(), 3, "exactly indices 2, 3, 4 should be resent");
    for (idx, payload) in resent.iter() {
        assert!((2..=4).contains(idx), "unexpected resend index {idx}");
        let expected_value = format!("value-{}", idx + 1);
        assert_eq!(payload, &expected_value);
        seen.insert(*idx);
    }
    assert_eq!(seen.len(), 10, "every value from 1..=10 has now been observed");

    // A second resend pass finds nothing left to resend.
    let empty = Arc::new(Mutex::new(Vec::new()));
    let empty2 = empty.clone();
    pipe.resend(&moderator, |idx, payload| empty2.lock().unwrap().push((idx, payload.to_string())))
        .await
        .unwrap();
    assert!(empty.lock().unwrap().is_empty());
}
