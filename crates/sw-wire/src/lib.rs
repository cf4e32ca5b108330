//! Line-oriented wire format for the spiderwiz fabric: escaping, field
//! value serialization, delta compression against a per-object keyframe,
//! and the frame grammar that carries it all (spec §4.2).

pub mod delta;
pub mod escape;
pub mod frame;
pub mod keyframe;
pub mod value;

pub use delta::{
    apply_int, apply_float, apply_map, apply_sequence, apply_str, diff_int, diff_float, diff_map,
    diff_sequence, diff_str,
};
pub use escape::{decode_one, escape, unescape};
pub use frame::{Frame, FrameError, Prefix, SubHeader};
pub use keyframe::{KeyframeRegistry, KeyframeTable, ObjectKeyframe};
pub use value::{
    decode_embedded, decode_generic, decode_keys, decode_list, decode_map, decode_scalar_token,
    decode_set, encode_fields, encode_keys, encode_value, split_fields, Value, ValueKind,
};
