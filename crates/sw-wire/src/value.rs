//! Field values and their container/scalar encodings (spec §4.2).
//!
//! `Value` is the self-describing payload type every data-object field
//! reduces to before it hits the wire. Field order itself (append-only,
//! base-class fields first) is the caller's responsibility — `sw-objects`
//! hands a `Vec<(String, Value)>` to [`encode_fields`] in declaration order.

use crate::escape::{escape, unescape};

/// A single field value. Containers nest recursively.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Set(Vec<Value>),
    Map(Vec<(String, Value)>),
    /// An embedded object: a fixed, known field list (no class name on the wire).
    Embedded(Vec<(String, Value)>),
    /// A heterogeneous object whose concrete type isn't known until decode.
    Generic {
        class_name: String,
        payload: Box<Value>,
    },
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

/// Encode a scalar value (everything except List/Set/Map/Embedded/Generic,
/// which recurse through [`encode_value`]) to its wire token.
fn encode_scalar(v: &Value) -> String {
    match v {
        Value::Null => "*".to_owned(),
        Value::Bool(b) => if *b { "1" } else { "0" }.to_owned(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                format!("{f:.1}")
            } else {
                f.to_string()
            }
        }
        Value::Str(s) => {
            if s.is_empty() {
                "^".to_owned()
            } else {
                escape(s)
            }
        }
        _ => unreachable!("encode_scalar called on a container"),
    }
}

/// Decode a single scalar token of the given kind. Exposed for the delta
/// codec, which decodes individual container-element tokens outside the
/// full container grammar.
pub fn decode_scalar_token(token: &str, kind: ValueKind) -> Value {
    decode_scalar_str(kind, token)
}

fn decode_scalar_str(kind: ValueKind, token: &str) -> Value {
    match kind {
        ValueKind::Null => Value::Null,
        ValueKind::Bool => Value::Bool(token == "1"),
        ValueKind::Int => Value::Int(token.parse().unwrap_or(0)),
        ValueKind::Float => Value::Float(token.parse().unwrap_or(0.0)),
        ValueKind::Str => {
            if token == "^" {
                Value::Str(String::new())
            } else {
                Value::Str(unescape(token))
            }
        }
    }
}

/// The shape a decoder must be told in advance (the registration-based field
/// table supplies this; see spec §9's "replace reflection with registration").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Bool,
    Int,
    Float,
    Str,
}

/// Encode a value (scalar or container) to its wire representation.
pub fn encode_value(v: &Value) -> String {
    match v {
        Value::Null
        | Value::Bool(_)
        | Value::Int(_)
        | Value::Float(_)
        | Value::Str(_) => encode_scalar(v),
        Value::List(items) => {
            let body = items
                .iter()
                .map(encode_value)
                .collect::<Vec<_>>()
                .join(";");
            format!("[{body}]")
        }
        Value::Set(items) => {
            let body = items
                .iter()
                .map(encode_value)
                .collect::<Vec<_>>()
                .join(";");
            format!("<{body}>")
        }
        Value::Map(entries) => {
            let body = entries
                .iter()
                .map(|(k, v)| format!("{}={}", escape(k), encode_value(v)))
                .collect::<Vec<_>>()
                .join(";");
            format!("<{body}>")
        }
        Value::Embedded(fields) => {
            let body = fields
                .iter()
                .map(|(_, v)| encode_value(v))
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{body}}}")
        }
        Value::Generic { class_name, payload } => {
            format!("{{{}={}}}", escape(class_name), encode_value(payload))
        }
    }
}

/// Split a comma/semicolon-delimited body respecting nested brackets and
/// backslash escapes, on the given top-level separator.
pub(crate) fn split_top_level(body: &str, sep: char) -> Vec<String> {
    if body.is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut cur = String::new();
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                cur.push(c);
                if let Some(n) = chars.next() {
                    cur.push(n);
                }
            }
            '[' | '<' | '{' => {
                depth += 1;
                cur.push(c);
            }
            ']' | '>' | '}' => {
                depth -= 1;
                cur.push(c);
            }
            c if c == sep && depth == 0 => {
                parts.push(std::mem::take(&mut cur));
            }
            c => cur.push(c),
        }
    }
    parts.push(cur);
    parts
}

/// Find the top-level `=` separating a map/generic key from its value body
/// (not inside nested brackets or an escape pair).
fn split_top_level_eq(body: &str) -> Option<(String, String)> {
    let mut depth = 0i32;
    let mut chars = body.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '[' | '<' | '{' => depth += 1,
            ']' | '>' | '}' => depth -= 1,
            '=' if depth == 0 => return Some((body[..i].to_owned(), body[i + 1..].to_owned())),
            _ => {}
        }
    }
    None
}

/// Decode a List: `[e1;e2;...]` of scalar kind `kind`.
pub fn decode_list(token: &str, kind: ValueKind) -> Value {
    let body = token.strip_prefix('[').and_then(|t| t.strip_suffix(']')).unwrap_or(token);
    let items = split_top_level(body, ';')
        .into_iter()
        .filter(|t| !t.is_empty() || body.is_empty())
        .map(|t| decode_scalar_str(kind, &t))
        .collect();
    Value::List(items)
}

/// Decode a Set: `<e1;...>` of scalar kind `kind`.
pub fn decode_set(token: &str, kind: ValueKind) -> Value {
    let body = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')).unwrap_or(token);
    let items = split_top_level(body, ';')
        .into_iter()
        .filter(|t| !t.is_empty())
        .map(|t| decode_scalar_str(kind, &t))
        .collect();
    Value::Set(items)
}

/// Decode a Map: `<k=v;...>` with string keys and scalar values of kind `kind`.
pub fn decode_map(token: &str, kind: ValueKind) -> Value {
    let body = token.strip_prefix('<').and_then(|t| t.strip_suffix('>')).unwrap_or(token);
    let entries = split_top_level(body, ';')
        .into_iter()
        .filter(|t| !t.is_empty())
        .filter_map(|entry| {
            let (k, v) = split_top_level_eq(&entry)?;
            Some((unescape(&k), decode_scalar_str(kind, &v)))
        })
        .collect();
    Value::Map(entries)
}

/// Decode an embedded object `{f1,f2,...}` given the expected field kinds in
/// declaration order.
pub fn decode_embedded(token: &str, field_names: &[&str], kinds: &[ValueKind]) -> Value {
    let body = token.strip_prefix('{').and_then(|t| t.strip_suffix('}')).unwrap_or(token);
    let parts = split_top_level(body, ',');
    let fields = field_names
        .iter()
        .zip(kinds.iter())
        .enumerate()
        .map(|(i, (name, kind))| {
            let raw = parts.get(i).cloned().unwrap_or_default();
            ((*name).to_owned(), decode_scalar_str(*kind, &raw))
        })
        .collect();
    Value::Embedded(fields)
}

/// Decode a generic heterogeneous object `{className=payload}`.
pub fn decode_generic(token: &str, kind: ValueKind) -> Value {
    let body = token.strip_prefix('{').and_then(|t| t.strip_suffix('}')).unwrap_or(token);
    match split_top_level_eq(body) {
        Some((class_name, payload)) => Value::Generic {
            class_name: unescape(&class_name),
            payload: Box::new(decode_scalar_str(kind, &payload)),
        },
        None => Value::Null,
    }
}

/// Join already-encoded field value tokens into the comma-separated
/// `values` segment of a wire line (spec §4.2).
pub fn encode_fields(fields: &[Value]) -> String {
    fields.iter().map(encode_value).collect::<Vec<_>>().join(",")
}

/// Split the `values` segment back into per-field tokens, respecting nested
/// container brackets.
pub fn split_fields(values: &str) -> Vec<String> {
    split_top_level(values, ',')
}

/// Bar-separated, escape-encoded key path (spec §4.2 `keys`).
pub fn encode_keys(keys: &[String]) -> String {
    keys.iter().map(|k| escape(k)).collect::<Vec<_>>().join("|")
}

pub fn decode_keys(token: &str) -> Vec<String> {
    if token.is_empty() {
        return Vec::new();
    }
    split_top_level(token, '|').into_iter().map(|k| unescape(&k)).collect()
}
