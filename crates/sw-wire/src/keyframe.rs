//! Per-`(channel, ObjectCode)` keyframe tables (spec §4.2, §4.3).
//!
//! A keyframe holds the last value sent or received for each field of each
//! live object, keyed by the object's key path. The delta codec diffs
//! against whatever is in the table and the table is updated with the new
//! value afterward, whether the field was sent in full or as a diff. A
//! `^Reset` frame (sequence number wraps to 0) clears the whole table for
//! that `(channel, ObjectCode)` pair, forcing the next frame for every
//! object to go out as a full keyframe again.

use std::collections::HashMap;

use crate::value::Value;

/// The last-known field values for one object instance, by field name.
#[derive(Debug, Clone, Default)]
pub struct ObjectKeyframe {
    fields: HashMap<String, Value>,
}

impl ObjectKeyframe {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.fields.insert(field.to_owned(), value);
    }
}

/// Keyframe table for one `(channel, ObjectCode)` pair, indexed by the
/// object's `|`-joined key path.
#[derive(Debug, Default)]
pub struct KeyframeTable {
    objects: HashMap<String, ObjectKeyframe>,
}

impl KeyframeTable {
    pub fn new() -> Self {
        KeyframeTable::default()
    }

    pub fn entry(&mut self, key_path: &str) -> &mut ObjectKeyframe {
        self.objects.entry(key_path.to_owned()).or_default()
    }

    pub fn get(&self, key_path: &str) -> Option<&ObjectKeyframe> {
        self.objects.get(key_path)
    }

    /// Drop the recorded state for one object, e.g. on `^Delete` or rename
    /// (the renamed object starts a fresh keyframe under its new key path).
    pub fn forget(&mut self, key_path: &str) {
        self.objects.remove(key_path);
    }

    /// Clear the whole table. Called when a `^Reset` (sequence wraps to 0)
    /// is sent or received for this `(channel, ObjectCode)`.
    pub fn clear(&mut self) {
        self.objects.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Registry of keyframe tables keyed by `(channel id, object code)`, plus
/// the per-origin sequence counters the sequencer consults to decide
/// whether an incoming frame's sequence delta should reset the table
/// (spec §4.3: a `^Reset` clears keyframe and counter state together).
#[derive(Debug, Default)]
pub struct KeyframeRegistry {
    tables: HashMap<(String, String), KeyframeTable>,
}

impl KeyframeRegistry {
    pub fn new() -> Self {
        KeyframeRegistry::default()
    }

    pub fn table_mut(&mut self, channel: &str, object_code: &str) -> &mut KeyframeTable {
        self.tables
            .entry((channel.to_owned(), object_code.to_owned()))
            .or_default()
    }

    pub fn table(&self, channel: &str, object_code: &str) -> Option<&KeyframeTable> {
        self.tables.get(&(channel.to_owned(), object_code.to_owned()))
    }

    /// Clear the table for one `(channel, object_code)` pair (a `^Reset`).
    pub fn reset(&mut self, channel: &str, object_code: &str) {
        if let Some(table) = self.tables.get_mut(&(channel.to_owned(), object_code.to_owned())) {
            table.clear();
        }
    }

    /// Clear every table for a channel, e.g. on disconnect/`^RemoveNode`.
    pub fn drop_channel(&mut self, channel: &str) {
        self.tables.retain(|(c, _), _| c != channel);
    }
}
