//! Delta compression against a per-field keyframe (spec §4.2's "delta
//! compression" requirement, tested by testable property #3: "decompressing
//! a delta against the keyframe it was built from always recovers the
//! original value").
//!
//! Three independent mini-languages, one per field shape:
//!
//! - numeric: `#<signed-delta>` against the keyframe value, or the bare
//!   value when there is no keyframe entry yet.
//! - string: an interleaved sequence of copy operators (`:{skip}:{copy}`,
//!   both continuation-encoded) and escaped literal insert segments. `:` is
//!   a reserved delimiter (see `escape.rs`) so a bare `:` in the diff string
//!   is unambiguously the start of a copy operator, never literal text.
//! - container (List/Set/Map): a `;`-joined, per-position or per-key token
//!   list. An empty token means "unchanged, copy from the keyframe"; `+...`
//!   means insert/replace; `~` (List) or `~key` (Map) means delete. A
//!   trailing run of `~` tokens is trimmed entirely, and a delta with no
//!   surviving tokens collapses to the empty string.

use crate::escape::{decode_one, escape, unescape};
use crate::value::{encode_value, Value, ValueKind};

const B64_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Continuation-encode `n`: emit the max-value symbol while `n >= 63`, then
/// a final symbol `< 63`. The final symbol is always unambiguous, so decode
/// never needs a separate terminator.
fn encode_b64(mut n: u64) -> String {
    let mut s = String::new();
    while n >= 63 {
        s.push(B64_ALPHABET[63] as char);
        n -= 63;
    }
    s.push(B64_ALPHABET[n as usize] as char);
    s
}

/// Decode one continuation-encoded number starting at byte offset `pos`,
/// returning the value and the offset just past it, or `None` if the string
/// is truncated or contains a byte outside the alphabet (spec §7: a
/// malformed peer-supplied diff must never panic the decoder).
fn decode_b64(s: &str, mut pos: usize) -> Option<(u64, usize)> {
    let mut total = 0u64;
    loop {
        let c = s[pos..].chars().next()?;
        let val = B64_ALPHABET.iter().position(|&b| b as char == c)? as u64;
        pos += c.len_utf8();
        total += val;
        if val < 63 {
            break;
        }
    }
    Some((total, pos))
}

fn copy_token(skip: usize, copy: usize) -> String {
    format!(":{}:{}", encode_b64(skip as u64), encode_b64(copy as u64))
}

// ---------------------------------------------------------------------------
// Numeric diff
// ---------------------------------------------------------------------------

pub fn diff_int(prev: Option<i64>, new: i64) -> String {
    match prev {
        Some(old) => format!("#{}", new - old),
        None => new.to_string(),
    }
}

pub fn apply_int(prev: Option<i64>, token: &str) -> i64 {
    if let Some(rest) = token.strip_prefix('#') {
        prev.unwrap_or(0) + rest.parse::<i64>().unwrap_or(0)
    } else {
        token.parse().unwrap_or(0)
    }
}

pub fn diff_float(prev: Option<f64>, new: f64) -> String {
    match prev {
        Some(old) => format!("#{}", new - old),
        None => new.to_string(),
    }
}

pub fn apply_float(prev: Option<f64>, token: &str) -> f64 {
    if let Some(rest) = token.strip_prefix('#') {
        prev.unwrap_or(0.0) + rest.parse::<f64>().unwrap_or(0.0)
    } else {
        token.parse().unwrap_or(0.0)
    }
}

// ---------------------------------------------------------------------------
// String diff
// ---------------------------------------------------------------------------

pub fn diff_str(prev: Option<&str>, new: &str) -> String {
    match prev {
        None => {
            if new.is_empty() {
                "^".to_owned()
            } else {
                escape(new)
            }
        }
        Some(old) => {
            if new.is_empty() {
                String::new()
            } else if old == new {
                let len = new.chars().count();
                copy_token(0, len)
            } else {
                build_copy_insert_diff(old, new)
            }
        }
    }
}

pub fn apply_str(prev: Option<&str>, token: &str) -> String {
    match prev {
        None => {
            if token == "^" {
                String::new()
            } else {
                unescape(token)
            }
        }
        Some(old) => {
            if token.is_empty() {
                String::new()
            } else {
                apply_copy_insert_diff(old, token)
            }
        }
    }
}

fn build_copy_insert_diff(old: &str, new: &str) -> String {
    let oc: Vec<char> = old.chars().collect();
    let nc: Vec<char> = new.chars().collect();

    let max_p = oc.len().min(nc.len());
    let mut p = 0;
    while p < max_p && oc[p] == nc[p] {
        p += 1;
    }
    let max_q = (oc.len() - p).min(nc.len() - p);
    let mut q = 0;
    while q < max_q && oc[oc.len() - 1 - q] == nc[nc.len() - 1 - q] {
        q += 1;
    }

    let middle_old_len = oc.len() - p - q;
    let middle_new: String = nc[p..nc.len() - q].iter().collect();

    let mut out = String::new();
    if p > 0 {
        out.push_str(&copy_token(0, p));
    }
    if !middle_new.is_empty() {
        out.push_str(&escape(&middle_new));
    }
    if q > 0 {
        out.push_str(&copy_token(middle_old_len, q));
    }
    out
}

/// Replays a [`build_copy_insert_diff`] token against `old`. A malformed
/// token (truncated copy operator, bad b64 digit, dangling escape) stops
/// the replay and returns whatever was decoded before it, rather than
/// panicking a dispatcher worker on one corrupt frame (spec §7).
fn apply_copy_insert_diff(old: &str, token: &str) -> String {
    let oc: Vec<char> = old.chars().collect();
    let mut out = String::new();
    let mut old_pos = 0usize;
    let mut pos = 0usize;
    while pos < token.len() {
        if token[pos..].starts_with(':') {
            pos += 1;
            let Some((skip, p2)) = decode_b64(token, pos) else { break };
            pos = p2;
            if !token[pos..].starts_with(':') {
                break;
            }
            pos += 1;
            let Some((copy, p3)) = decode_b64(token, pos) else { break };
            pos = p3;
            old_pos += skip as usize;
            let end = (old_pos + copy as usize).min(oc.len());
            if old_pos > end {
                break;
            }
            out.extend(&oc[old_pos..end]);
            old_pos = end;
        } else {
            let Some((c, consumed)) = decode_one(&token[pos..]) else { break };
            out.push(c);
            pos += consumed;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Container diff: List / Set (positional) and Map (keyed)
// ---------------------------------------------------------------------------

fn trim_trailing_deletions(tokens: &mut Vec<String>) {
    while matches!(tokens.last().map(String::as_str), Some("~")) {
        tokens.pop();
    }
    if tokens.iter().all(String::is_empty) {
        tokens.clear();
    }
}

/// Diff two positional containers (List or Set, in insertion order).
pub fn diff_sequence(old: &[Value], new: &[Value]) -> String {
    let len = old.len().max(new.len());
    let mut tokens = Vec::with_capacity(len);
    for i in 0..len {
        match (old.get(i), new.get(i)) {
            (Some(o), Some(n)) if o == n => tokens.push(String::new()),
            (_, Some(n)) => tokens.push(format!("+{}", encode_value(n))),
            (Some(_), None) => tokens.push("~".to_owned()),
            (None, None) => unreachable!(),
        }
    }
    trim_trailing_deletions(&mut tokens);
    tokens.join(";")
}

/// Apply a sequence diff produced by [`diff_sequence`] against `old`.
pub fn apply_sequence(old: &[Value], diff: &str, kind: ValueKind) -> Vec<Value> {
    if diff.is_empty() {
        return old.to_vec();
    }
    let tokens: Vec<&str> = diff.split(';').collect();
    let mut out = Vec::with_capacity(tokens.len());
    for (i, tok) in tokens.iter().enumerate() {
        if tok.is_empty() {
            if let Some(v) = old.get(i) {
                out.push(v.clone());
            }
        } else if let Some(rest) = tok.strip_prefix('+') {
            out.push(crate::value::decode_scalar_token(rest, kind));
        }
        // "~" (explicit mid-sequence deletion): push nothing.
    }
    out
}

/// Diff two maps by key.
pub fn diff_map(old: &[(String, Value)], new: &[(String, Value)]) -> String {
    let mut tokens = Vec::new();
    for (k, v) in new {
        match old.iter().find(|(ok, _)| ok == k) {
            Some((_, ov)) if ov == v => {}
            _ => tokens.push(format!("+{}={}", escape(k), encode_value(v))),
        }
    }
    for (k, _) in old {
        if !new.iter().any(|(nk, _)| nk == k) {
            tokens.push(format!("~{}", escape(k)));
        }
    }
    if tokens.is_empty() {
        String::new()
    } else {
        tokens.join(";")
    }
}

/// Apply a map diff produced by [`diff_map`] against `old`.
pub fn apply_map(old: &[(String, Value)], diff: &str, kind: ValueKind) -> Vec<(String, Value)> {
    if diff.is_empty() {
        return old.to_vec();
    }
    let mut out = old.to_vec();
    for tok in diff.split(';') {
        if let Some(rest) = tok.strip_prefix('+') {
            if let Some(eq) = rest.find('=') {
                let key = unescape(&rest[..eq]);
                let val = crate::value::decode_scalar_token(&rest[eq + 1..], kind);
                match out.iter_mut().find(|(k, _)| *k == key) {
                    Some(entry) => entry.1 = val,
                    None => out.push((key, val)),
                }
            }
        } else if let Some(rest) = tok.strip_prefix('~') {
            let key = unescape(rest);
            out.retain(|(k, _)| *k != key);
        }
    }
    out
}
