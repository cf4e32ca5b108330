//! Character escaping for the line-oriented wire format (spec §4.2).
//!
//! Every delimiter used by the frame grammar — comma, bar, the four bracket
//! pairs, `= ; # : ~ * ^`, the backslash escape leader itself, and every
//! control character 0-31 — has a fixed single-character escape. Delimiters
//! escape to `\` followed by themselves (an identity alphabet); control
//! characters escape to `\` followed by one symbol out of a 32-symbol
//! alphabet (`0-9a-v`), which shares no characters with the delimiter set so
//! the two escape families never collide during decode.

const DELIMITERS: &[char] = &[
    ',', '|', '[', ']', '<', '>', '{', '}', '=', ';', '#', ':', '~', '*', '^', '\\',
];

const CONTROL_ALPHABET: &[u8; 32] = b"0123456789abcdefghijklmnopqrstuv";

fn control_escape_char(c: char) -> Option<char> {
    let code = c as u32;
    if code < 32 {
        Some(CONTROL_ALPHABET[code as usize] as char)
    } else {
        None
    }
}

fn control_unescape_char(c: char) -> Option<char> {
    CONTROL_ALPHABET
        .iter()
        .position(|&b| b as char == c)
        .map(|idx| char::from_u32(idx as u32).unwrap())
}

/// Escape `s` so it may be embedded in a wire line without colliding with
/// any structural delimiter.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if DELIMITERS.contains(&c) {
            out.push('\\');
            out.push(c);
        } else if let Some(e) = control_escape_char(c) {
            out.push('\\');
            out.push(e);
        } else {
            out.push(c);
        }
    }
    out
}

/// Inverse of [`escape`]. Malformed trailing backslashes (no following
/// character) are treated as a literal backslash, matching the "never
/// terminate the process on a data error" policy (spec §7).
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(n) if DELIMITERS.contains(&n) => out.push(n),
                Some(n) => {
                    if let Some(u) = control_unescape_char(n) {
                        out.push(u);
                    } else {
                        // Unknown escape sequence: keep literally (tolerant decode).
                        out.push('\\');
                        out.push(n);
                    }
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Consume one escape "token" (either a bare character or a `\X` pair)
/// starting at byte offset 0 of `s`, returning the decoded character and the
/// number of bytes consumed. Used by the delta codec's literal-insert
/// segments, which are interleaved with copy operators and must be decoded
/// incrementally rather than all at once.
pub fn decode_one(s: &str) -> Option<(char, usize)> {
    let mut chars = s.char_indices();
    let (_, c) = chars.next()?;
    if c == '\\' {
        let (i2, n) = chars.next()?;
        let consumed = i2 + n.len_utf8();
        if let Some(u) = control_unescape_char(n) {
            Some((u, consumed))
        } else {
            Some((n, consumed))
        }
    } else {
        Some((c, c.len_utf8()))
    }
}
