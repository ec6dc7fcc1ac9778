//! Text dumps of register data
//!
//! A dump lists words as hex runs keyed by their starting address:
//!
//! ```text
//! RegisterData{
//! 	0x00000000: 0FD30001000000030000
//! 	0x0000001D: FFFFFC18
//! }
//! ```
//!
//! [`Snapshot::debug_string`] writes this format and [`parse_register_dump`]
//! reads it back, along with looser hand-written fixtures (decimal addresses,
//! `0x` prefixed words, commas, `#` comments).

use std::collections::BTreeMap;

use itertools::Itertools;
use thiserror::Error;

use super::store::Snapshot;

const WORDS_PER_LINE: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DumpError {
    #[error("Line {line}: {message}")]
    Malformed { line: usize, message: String },
}

fn malformed(line: usize, message: impl Into<String>) -> DumpError {
    DumpError::Malformed {
        line,
        message: message.into(),
    }
}

impl Snapshot {
    /// Render the words as a register dump, at most 8 words per line
    pub fn debug_string(&self) -> String {
        let mut buf = String::from("RegisterData{");
        if self.is_empty() {
            buf.push('}');
            return buf;
        }
        let runs = self
            .words()
            .iter()
            .enumerate()
            .chunk_by(|(i, (addr, _))| i64::from(**addr) - *i as i64);
        for (_, run) in &runs {
            let run: Vec<(u32, u16)> = run.map(|(_, (a, w))| (*a, *w)).collect();
            for line in run.chunks(WORDS_PER_LINE) {
                let bytes: Vec<u8> = line.iter().flat_map(|(_, w)| w.to_be_bytes()).collect();
                buf.push_str(&format!("\n\t0x{:08X}: {}", line[0].0, hex::encode_upper(bytes)));
            }
        }
        buf.push_str("\n}");
        buf
    }
}

fn parse_address(s: &str, line: usize) -> Result<u32, DumpError> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|_| malformed(line, format!("invalid address '{}'", s)))
}

/// Parse a register dump into an address to word map
pub fn parse_register_dump(text: &str) -> Result<BTreeMap<u32, u16>, DumpError> {
    let mut words = BTreeMap::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() || content == "}" || content.ends_with('{') {
            continue;
        }

        let (addr, data) = content
            .split_once(':')
            .ok_or_else(|| malformed(line, "expected 'ADDRESS: WORDS'"))?;
        let address = parse_address(addr.trim(), line)?;

        let digits: String = data
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .map(|t| t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")).unwrap_or(t))
            .collect();
        if digits.is_empty() || digits.len() % 4 != 0 {
            return Err(malformed(
                line,
                format!("expected 4 hex digits per word, got {} digits", digits.len()),
            ));
        }
        let bytes = hex::decode(&digits).map_err(|e| malformed(line, e.to_string()))?;

        for (i, pair) in bytes.chunks(2).enumerate() {
            let addr = u32::try_from(i)
                .ok()
                .and_then(|i| address.checked_add(i))
                .ok_or_else(|| malformed(line, "words run past the end of the address space"))?;
            words.insert(addr, u16::from_be_bytes([pair[0], pair[1]]));
        }
    }
    Ok(words)
}
