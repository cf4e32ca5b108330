//! The `history.txt` sidecar: `{nextPut, nextGet, skippedRanges}`, rewritten
//! on every block flush and every resend/acknowledge that changes it (spec
//! §4.6 "Data model" / "Invariants").

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::error::LosslessError;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct History {
    pub next_put: u64,
    pub next_get: u64,
    pub next_ack: u64,
    pub skipped_ranges: Vec<(u64, u64)>,
}

impl History {
    pub fn load(path: &Path) -> Result<Option<History>, LosslessError> {
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(path)?;
        let mut h = History::default();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(LosslessError::CorruptHistory(format!("no '=' in line {line:?}")));
            };
            match key {
                "nextPut" => {
                    h.next_put = value
                        .parse()
                        .map_err(|_| LosslessError::CorruptHistory(format!("bad nextPut {value:?}")))?
                }
                "nextGet" => {
                    h.next_get = value
                        .parse()
                        .map_err(|_| LosslessError::CorruptHistory(format!("bad nextGet {value:?}")))?
                }
                "nextAck" => {
                    h.next_ack = value
                        .parse()
                        .map_err(|_| LosslessError::CorruptHistory(format!("bad nextAck {value:?}")))?
                }
                "skipped" => {
                    h.skipped_ranges = parse_ranges(value)?;
                }
                other => {
                    return Err(LosslessError::CorruptHistory(format!("unknown key {other:?}")));
                }
            }
        }
        Ok(Some(h))
    }

    pub fn save(&self, path: &Path) -> Result<(), LosslessError> {
        let tmp = path.with_extension("tmp");
        {
            let mut f = fs::File::create(&tmp)?;
            writeln!(f, "nextPut={}", self.next_put)?;
            writeln!(f, "nextGet={}", self.next_get)?;
            writeln!(f, "nextAck={}", self.next_ack)?;
            let ranges = self
                .skipped_ranges
                .iter()
                .map(|(s, e)| format!("{s}-{e}"))
                .collect::<Vec<_>>()
                .join(";");
            writeln!(f, "skipped={ranges}")?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn parse_ranges(value: &str) -> Result<Vec<(u64, u64)>, LosslessError> {
    if value.is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(';')
        .map(|r| {
            let (s, e) = r
                .split_once('-')
                .ok_or_else(|| LosslessError::CorruptHistory(format!("bad range {r:?}")))?;
            let s: u64 = s.parse().map_err(|_| LosslessError::CorruptHistory(format!("bad range start {s:?}")))?;
            let e: u64 = e.parse().map_err(|_| LosslessError::CorruptHistory(format!("bad range end {e:?}")))?;
            Ok((s, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        let h = History {
            next_put: 42,
            next_get: 10,
            next_ack: 9,
            skipped_ranges: vec![(3, 7), (20, 25)],
        };
        h.save(&path).unwrap();
        let loaded = History::load(&path).unwrap().unwrap();
        assert_eq!(loaded, h);
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(History::load(&dir.path().join("nope.txt")).unwrap().is_none());
    }

    #[test]
    fn empty_skipped_ranges_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.txt");
        let h = History { next_put: 1, next_get: 1, next_ack: 0, skipped_ranges: vec![] };
        h.save(&path).unwrap();
        assert_eq!(History::load(&path).unwrap().unwrap(), h);
    }
}
