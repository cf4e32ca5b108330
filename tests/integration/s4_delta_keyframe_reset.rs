//! S4: a value is delta-encoded against a keyframe, then a sequencer
//! `Reset` (received seq 0) clears the keyframe, forcing the next frame to
//! be treated as a fresh baseline rather than diffed against stale state.

use sw_sequencer::{SeqOutcome, Sequencer};
use sw_wire::{apply_str, diff_str, Value};

#[test]
fn reset_clears_keyframe_so_next_value_is_a_fresh_baseline() {
    let seq = Sequencer::new("chan-1");

    assert_eq!(seq.on_receive("Car", 0), SeqOutcome::Reset);
    seq.with_keyframe("Car", |kf| kf.entry("root|car-1").set("color", Value::Str("red".to_string())));

    assert_eq!(seq.on_receive("Car", 1), SeqOutcome::InSequence);
    let previous = seq.with_keyframe("Car", |kf| match kf.entry("root|car-1").get("color") {
        Some(Value::Str(s)) => Some(s.clone()),
        _ => None,
    });
    let diff = diff_str(previous.as_deref(), "crimson");
    assert_ne!(diff, "crimson", "a real diff against a keyframe should not just be the literal value");
    assert_eq!(apply_str(previous.as_deref(), &diff), "crimson");
    seq.with_keyframe("Car", |kf| kf.entry("root|car-1").set("color", Value::Str("crimson".to_string())));

    // A boomerang reset (received seq 0 again) clears the table.
    assert_eq!(seq.on_receive("Car", 0), SeqOutcome::Reset);
    assert!(seq.with_keyframe("Car", |kf| kf.is_empty()));

    // The next value for this key has no prior keyframe entry, so it must
    // be encoded as a full value rather than a diff.
    let post_reset_previous = seq.with_keyframe("Car", |kf| kf.entry("root|car-1").get("color").cloned());
    assert!(post_reset_previous.is_none());
    let full = diff_str(None, "blue");
    assert_eq!(full, "blue");
}
