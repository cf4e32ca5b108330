//! S5: consumer receives frames 5,6,7,9 for one `ObjectCode`; on 9 it
//! drops the frame and, within the 3-minute window, emits exactly one
//! reset request for that code. After a reset (seq 0) arrives, delivery
//! resumes in-order.

use sw_sequencer::{SeqOutcome, Sequencer};

#[test]
fn gap_triggers_single_reset_request_then_resumes_after_reset() {
    let seq = Sequencer::new("chan-1");

    // Establish expectation at 5 by forcing a reset then fast-forwarding
    // through 0..5 as if they'd already been seen.
    assert_eq!(seq.on_receive("Car", 0), SeqOutcome::Reset);
    for i in 1..5u16 {
        assert_eq!(seq.on_receive("Car", i), SeqOutcome::InSequence);
    }

    assert_eq!(seq.on_receive("Car", 5), SeqOutcome::InSequence);
    assert_eq!(seq.on_receive("Car", 6), SeqOutcome::InSequence);
    assert_eq!(seq.on_receive("Car", 7), SeqOutcome::InSequence);

    // Frame 9 arrives instead of 8: a gap. Dropped, and exactly one reset
    // request fires within the throttle window.
    match seq.on_receive("Car", 9) {
        SeqOutcome::OutOfSequence { reset_requested } => assert!(reset_requested),
        other => panic!("expected out-of-sequence, got {other:?}"),
    }
    // A repeat of the same gap within the window must not re-request.
    match seq.on_receive("Car", 9) {
        SeqOutcome::OutOfSequence { reset_requested } => assert!(!reset_requested),
        other => panic!("expected out-of-sequence, got {other:?}"),
    }

    // A different ObjectCode on the same channel is unaffected.
    assert_eq!(seq.on_receive("Driver", 0), SeqOutcome::Reset);

    // The reset completes: receiver sees seq 0 again for Car, and delivery
    // resumes in-order from there.
    assert_eq!(seq.on_receive("Car", 0), SeqOutcome::Reset);
    assert_eq!(seq.on_receive("Car", 1), SeqOutcome::InSequence);
    assert_eq!(seq.on_receive("Car", 2), SeqOutcome::InSequence);
}
