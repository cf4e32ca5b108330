//! Wire line grammar: `<prefix><ObjectCode>,<timestamp>,<seq>,<subheader>,<keys>,<values...>`
//! (spec §4.2), where `subheader = originUUID | destinations | objSeq | ackSeq?`.
//!
//! `Frame` itself is a thin carrier: `timestamp`/`seq` are opaque tokens
//! because whether they are a full value or a diff against the previous
//! frame on this `(channel, ObjectCode, direction)` is the sequencer's
//! decision (spec §4.3), not the wire layer's. Likewise each entry in
//! `value_tokens` is already-encoded (full or delta) field text; `sw-wire`
//! only guarantees the tokens split back out the way they went in.
//!
//! The subheader's `originUUID`/`destinations` fields are always written in
//! full rather than delta-encoded against the previous frame's origin —
//! spec §4.2 allows eliding `originUUID` when it repeats the previous
//! frame's, but the hub's own anti-boomerang and per-`(origin, ObjectCode)`
//! monotonic checks (spec §4.5) need the value on every frame regardless,
//! so this crate always spells it out (see DESIGN.md).

use std::fmt;

use uuid::Uuid;

use crate::value::{decode_keys, encode_keys, split_top_level};

/// The leading sigil of a wire line (spec §4.2: `prefix ∈ { $, ~, ?, ! }` —
/// update, removal, query, urgent-query).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// Ordinary property update, full or delta.
    Data,
    /// The object is removed, or (per testable property #8) renamed: a
    /// rename is carried as a removal frame whose `keys` holds the old key
    /// path and whose first value token holds the rename target.
    Removal,
    /// A query or a reply to one.
    Query,
    /// A query that should jump the line ahead of queued ordinary traffic.
    UrgentQuery,
}

impl Prefix {
    fn to_char(self) -> char {
        match self {
            Prefix::Data => '$',
            Prefix::Removal => '~',
            Prefix::Query => '?',
            Prefix::UrgentQuery => '!',
        }
    }

    fn from_char(c: char) -> Option<Prefix> {
        match c {
            '$' => Some(Prefix::Data),
            '~' => Some(Prefix::Removal),
            '?' => Some(Prefix::Query),
            '!' => Some(Prefix::UrgentQuery),
            _ => None,
        }
    }
}

/// What kind of update this frame carries, orthogonal to `Prefix`: a `Data`
/// frame is `Full` or `Delta`; a `Removal` frame is a plain `Remove` or a
/// `Rename` carrying its target (testable property #8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubHeader {
    /// Every field is sent in full (new object, or after a reset).
    Full,
    /// Fields are diffed against the sender's keyframe.
    Delta,
    /// The object is being removed from the tree.
    Remove,
    /// The object is being renamed; `keys` holds the old key path and the
    /// first value token holds the escaped rename target.
    Rename,
}

impl SubHeader {
    fn to_char(self) -> char {
        match self {
            SubHeader::Full => 'F',
            SubHeader::Delta => 'D',
            SubHeader::Remove => 'X',
            SubHeader::Rename => 'R',
        }
    }

    fn from_char(c: char) -> Option<SubHeader> {
        match c {
            'F' => Some(SubHeader::Full),
            'D' => Some(SubHeader::Delta),
            'X' => Some(SubHeader::Remove),
            'R' => Some(SubHeader::Rename),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    Empty,
    UnknownPrefix(char),
    UnknownSubHeader(String),
    MissingField(&'static str),
    /// The `subheader` field parsed as a string but one of its `|`-separated
    /// parts (origin, destinations, objSeq, ackSeq) was malformed.
    MalformedSubHeader(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Empty => write!(f, "empty frame line"),
            FrameError::UnknownPrefix(c) => write!(f, "unknown frame prefix {c:?}"),
            FrameError::UnknownSubHeader(s) => write!(f, "unknown sub-header {s:?}"),
            FrameError::MissingField(name) => write!(f, "frame missing field: {name}"),
            FrameError::MalformedSubHeader(s) => write!(f, "malformed subheader {s:?}"),
        }
    }
}

impl std::error::Error for FrameError {}

/// A single decoded wire line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub prefix: Prefix,
    pub object_code: String,
    pub timestamp_token: String,
    pub seq_token: String,
    pub sub_header: SubHeader,
    /// The producing node's UUID (spec §4.2 subheader `originUUID`), used
    /// by the hub for anti-boomerang and per-origin monotonic checks.
    pub origin: Uuid,
    /// Explicit recipient set (spec §4.2 subheader `destinations`); empty
    /// means "every consumer", matching the teacher's broadcast default.
    pub destinations: Vec<Uuid>,
    /// Per-`(origin, ObjectCode)` application sequence (spec §4.2 subheader
    /// `objSeq`), strictly monotonic at every hop across the mesh (spec §5).
    pub obj_seq: u32,
    /// Present only on a lossless-pipe acknowledgement echo (spec §4.2
    /// subheader `ackSeq?`, §4.5 step 7).
    pub ack_seq: Option<u64>,
    pub keys: Vec<String>,
    pub value_tokens: Vec<String>,
}

impl Frame {
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        out.push(self.prefix.to_char());
        out.push_str(&self.object_code);
        out.push(',');
        out.push_str(&self.timestamp_token);
        out.push(',');
        out.push_str(&self.seq_token);
        out.push(',');
        out.push_str(&self.encode_subheader());
        out.push(',');
        out.push_str(&encode_keys(&self.keys));
        for token in &self.value_tokens {
            out.push(',');
            out.push_str(token);
        }
        out
    }

    fn encode_subheader(&self) -> String {
        let destinations = self.destinations.iter().map(Uuid::to_string).collect::<Vec<_>>().join(";");
        let ack = self.ack_seq.map(|a| a.to_string()).unwrap_or_default();
        format!("{}|{}|{destinations}|{}|{ack}", self.sub_header.to_char(), self.origin, self.obj_seq)
    }

    fn parse_subheader(raw: &str) -> Result<(SubHeader, Uuid, Vec<Uuid>, u32, Option<u64>), FrameError> {
        let parts: Vec<&str> = raw.splitn(5, '|').collect();
        let kind_char = parts
            .first()
            .and_then(|s| s.chars().next())
            .ok_or_else(|| FrameError::UnknownSubHeader(raw.to_owned()))?;
        let sub_header = SubHeader::from_char(kind_char).ok_or_else(|| FrameError::UnknownSubHeader(raw.to_owned()))?;

        let origin_raw = parts.get(1).ok_or_else(|| FrameError::MalformedSubHeader(raw.to_owned()))?;
        let origin = Uuid::parse_str(origin_raw).map_err(|_| FrameError::MalformedSubHeader(raw.to_owned()))?;

        let destinations_raw = parts.get(2).ok_or_else(|| FrameError::MalformedSubHeader(raw.to_owned()))?;
        let destinations = if destinations_raw.is_empty() {
            Vec::new()
        } else {
            destinations_raw
                .split(';')
                .map(Uuid::parse_str)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| FrameError::MalformedSubHeader(raw.to_owned()))?
        };

        let obj_seq_raw = parts.get(3).ok_or_else(|| FrameError::MalformedSubHeader(raw.to_owned()))?;
        let obj_seq: u32 = obj_seq_raw.parse().map_err(|_| FrameError::MalformedSubHeader(raw.to_owned()))?;

        let ack_raw = parts.get(4).copied().unwrap_or("");
        let ack_seq = if ack_raw.is_empty() {
            None
        } else {
            Some(ack_raw.parse().map_err(|_| FrameError::MalformedSubHeader(raw.to_owned()))?)
        };

        Ok((sub_header, origin, destinations, obj_seq, ack_seq))
    }

    pub fn parse(line: &str) -> Result<Frame, FrameError> {
        let mut chars = line.chars();
        let prefix_char = chars.next().ok_or(FrameError::Empty)?;
        let prefix = Prefix::from_char(prefix_char).ok_or(FrameError::UnknownPrefix(prefix_char))?;
        let body = chars.as_str();
        let parts = split_top_level(body, ',');

        let object_code = parts.first().cloned().ok_or(FrameError::MissingField("object_code"))?;
        let timestamp_token = parts.get(1).cloned().ok_or(FrameError::MissingField("timestamp"))?;
        let seq_token = parts.get(2).cloned().ok_or(FrameError::MissingField("seq"))?;
        let sub_header_raw = parts.get(3).cloned().ok_or(FrameError::MissingField("sub_header"))?;
        let (sub_header, origin, destinations, obj_seq, ack_seq) = Self::parse_subheader(&sub_header_raw)?;
        let keys_raw = parts.get(4).cloned().ok_or(FrameError::MissingField("keys"))?;
        let keys = decode_keys(&keys_raw);
        let value_tokens = parts.get(5..).map(<[String]>::to_vec).unwrap_or_default();

        Ok(Frame {
            prefix,
            object_code,
            timestamp_token,
            seq_token,
            sub_header,
            origin,
            destinations,
            obj_seq,
            ack_seq,
            keys,
            value_tokens,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Frame {
        Frame {
            prefix: Prefix::Data,
            object_code: "Car".to_owned(),
            timestamp_token: "1234".to_owned(),
            seq_token: "7".to_owned(),
            sub_header: SubHeader::Delta,
            origin: Uuid::nil(),
            destinations: vec![],
            obj_seq: 3,
            ack_seq: None,
            keys: vec!["root".to_owned(), "car-1".to_owned()],
            value_tokens: vec!["#5".to_owned(), "[1;2;3]".to_owned()],
        }
    }

    #[test]
    fn round_trips() {
        let f = sample();
        let line = f.serialize();
        let parsed = Frame::parse(&line).unwrap();
        assert_eq!(parsed, f);
    }

    #[test]
    fn round_trips_keys_with_bar() {
        let mut f = sample();
        f.keys = vec!["root".to_owned(), "car|with|bars".to_owned()];
        let line = f.serialize();
        assert_eq!(Frame::parse(&line).unwrap().keys, f.keys);
    }

    #[test]
    fn round_trips_destinations_and_ack_seq() {
        let mut f = sample();
        f.origin = Uuid::from_u128(0x1234_5678);
        f.destinations = vec![Uuid::from_u128(1), Uuid::from_u128(2)];
        f.ack_seq = Some(42);
        let line = f.serialize();
        let parsed = Frame::parse(&line).unwrap();
        assert_eq!(parsed.origin, f.origin);
        assert_eq!(parsed.destinations, f.destinations);
        assert_eq!(parsed.ack_seq, Some(42));
    }

    #[test]
    fn rejects_unknown_prefix() {
        assert_eq!(Frame::parse("%Car,1,1,F|00000000-0000-0000-0000-000000000000||0|,root,1"), Err(FrameError::UnknownPrefix('%')));
    }

    #[test]
    fn rejects_empty_line() {
        assert_eq!(Frame::parse(""), Err(FrameError::Empty));
    }

    #[test]
    fn rejects_unknown_subheader_kind() {
        assert!(matches!(
            Frame::parse("$Car,1,1,Q|00000000-0000-0000-0000-000000000000||0|,root,1"),
            Err(FrameError::UnknownSubHeader(_))
        ));
    }

    #[test]
    fn rejects_malformed_subheader_origin() {
        assert!(matches!(
            Frame::parse("$Car,1,1,F|not-a-uuid||0|,root,1"),
            Err(FrameError::MalformedSubHeader(_))
        ));
    }

    #[test]
    fn rename_is_a_removal_frame_carrying_the_target() {
        // Testable property #8: rename(a -> b) appears on the wire as a
        // single removal frame, `keys` holding the old path and the first
        // value token holding the rename target.
        let mut f = sample();
        f.prefix = Prefix::Removal;
        f.sub_header = SubHeader::Rename;
        f.keys = vec!["root".to_owned(), "a".to_owned()];
        f.value_tokens = vec!["b".to_owned()];

        let line = f.serialize();
        assert!(line.starts_with('~'));
        let parsed = Frame::parse(&line).unwrap();
        assert_eq!(parsed.prefix, Prefix::Removal);
        assert_eq!(parsed.sub_header, SubHeader::Rename);
        assert_eq!(parsed.keys, vec!["root".to_owned(), "a".to_owned()]);
        assert_eq!(parsed.value_tokens, vec!["b".to_owned()]);
    }

    #[test]
    fn plain_removal_frame_round_trips() {
        let mut f = sample();
        f.prefix = Prefix::Removal;
        f.sub_header = SubHeader::Remove;
        f.value_tokens = vec![];

        let line = f.serialize();
        assert!(line.starts_with('~'));
        let parsed = Frame::parse(&line).unwrap();
        assert_eq!(parsed.prefix, Prefix::Removal);
        assert_eq!(parsed.sub_header, SubHeader::Remove);
    }

    #[test]
    fn value_tokens_preserve_embedded_commas_inside_brackets() {
        let mut f = sample();
        f.value_tokens = vec!["{1,2,3}".to_owned()];
        let line = f.serialize();
        let parsed = Frame::parse(&line).unwrap();
        assert_eq!(parsed.value_tokens, vec!["{1,2,3}".to_owned()]);
    }
}
