//! `tracestate` list members: lenient scanning, grammar validation, cursor
//!
//! The raw header string is never validated as a whole. Each comma-separated
//! segment is parsed independently, and validity is a per-entry
//! classification computed on read. Foreign vendors may ship entries this
//! crate considers invalid; the lenient cursor yields them anyway so they can
//! be preserved verbatim.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TraceContextError};

/// Most list members a cursor yields; members past this window are
/// unreachable through the public API
pub const MAX_LIST_MEMBERS: usize = 32;

/// Simple key: lowercase letter first, then up to 255 of the key alphabet
fn simple_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9_\-*/]{0,255}$").expect("simple-key pattern is valid")
    })
}

/// Multi-tenant key: `{tenant}@{system}` with bounded field widths
fn tenant_key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9_\-*/]{0,240}@[a-z][a-z0-9_\-*/]{0,13}$")
            .expect("tenant-key pattern is valid")
    })
}

/// Value: 1-256 printable ASCII characters excluding `,` and `=`, not
/// ending in a space
fn value_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[\x20-\x2b\x2d-\x3c\x3e-\x7e]{0,255}[\x21-\x2b\x2d-\x3c\x3e-\x7e]$")
            .expect("value pattern is valid")
    })
}

pub(crate) fn is_valid_key(key: &str) -> bool {
    simple_key_pattern().is_match(key) || tenant_key_pattern().is_match(key)
}

pub(crate) fn is_valid_value(value: &str) -> bool {
    value_pattern().is_match(value)
}

/// One `tracestate` list member
///
/// An entry produced by the lenient cursor carries whatever key/value the
/// wire had (boundary whitespace trimmed, see [`Entries`]); it may well
/// report `is_valid() == false`. An entry built through
/// [`Entry::validated`] is always grammar-checked up front.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// List-member key, byte-exact as parsed
    pub key: String,
    /// List-member value, byte-exact as parsed
    pub value: String,
}

impl Entry {
    /// Build a grammar-checked entry for insertion into a `tracestate`
    pub(crate) fn validated(key: &str, value: &str) -> Result<Self> {
        if !is_valid_key(key) {
            return Err(TraceContextError::InvalidKey);
        }
        if !is_valid_value(value) {
            return Err(TraceContextError::InvalidValue);
        }
        Ok(Self {
            key: key.to_owned(),
            value: value.to_owned(),
        })
    }

    /// Classify this entry against the key and value grammars
    ///
    /// Computed on read; the lenient cursor never rejects an entry for
    /// failing this check.
    pub fn is_valid(&self) -> bool {
        is_valid_key(&self.key) && is_valid_value(&self.value)
    }
}

/// Scan the next parseable list member starting at `*pos`
///
/// Splits on the next comma (or end of string). Segments without a `=`, or
/// with `=` in first position (empty key), are skipped without counting
/// toward any cap. Leading space/tab is trimmed from the key side only,
/// trailing space/tab from the value side only; asymmetric or internal
/// whitespace stays part of the content.
pub(crate) fn next_member(raw: &str, pos: &mut usize) -> Option<(String, String)> {
    while *pos < raw.len() {
        let end = raw[*pos..]
            .find(',')
            .map(|i| *pos + i)
            .unwrap_or(raw.len());
        let segment = &raw[*pos..end];
        *pos = end + 1;

        if let Some(eq) = segment.find('=') {
            if eq > 0 {
                let key = segment[..eq].trim_start_matches(|c| c == ' ' || c == '\t');
                let value = segment[eq + 1..].trim_end_matches(|c| c == ' ' || c == '\t');
                return Some((key.to_owned(), value.to_owned()));
            }
        }
    }
    None
}

/// Lazy, restartable cursor over the list members of a raw `tracestate`
///
/// Yields at most [`MAX_LIST_MEMBERS`] entries, invalid ones included.
/// Obtain a fresh cursor from [`TraceState::entries`](crate::TraceState::entries);
/// each call restarts the scan over the same immutable source string.
///
/// Option-driven consumption goes through the [`Iterator`] impl. Callers
/// that want the hard misuse contract instead check [`has_next`](Self::has_next)
/// and call [`try_next`](Self::try_next), which fails with
/// [`TraceContextError::EntriesExhausted`] past the end.
#[derive(Debug, Clone)]
pub struct Entries<'a> {
    raw: &'a str,
    pos: usize,
    yielded: usize,
}

impl<'a> Entries<'a> {
    pub(crate) fn new(raw: &'a str) -> Self {
        Self {
            raw,
            pos: 0,
            yielded: 0,
        }
    }

    /// Whether another list member is available within the cursor window
    ///
    /// Pure with respect to the cursor: probing does not consume.
    pub fn has_next(&self) -> bool {
        self.clone().next().is_some()
    }

    /// The next list member, or [`TraceContextError::EntriesExhausted`]
    /// when the cursor is past its last element
    pub fn try_next(&mut self) -> Result<Entry> {
        self.next().ok_or(TraceContextError::EntriesExhausted)
    }
}

impl Iterator for Entries<'_> {
    type Item = Entry;

    fn next(&mut self) -> Option<Entry> {
        if self.yielded >= MAX_LIST_MEMBERS {
            return None;
        }
        let (key, value) = next_member(self.raw, &mut self.pos)?;
        self.yielded += 1;
        Some(Entry { key, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(raw: &str) -> Vec<Entry> {
        Entries::new(raw).collect()
    }

    #[test]
    fn test_simple_key_grammar() {
        assert!(is_valid_key("congo"));
        assert!(is_valid_key("k1"));
        assert!(is_valid_key("a-b_c*d/e"));
        assert!(is_valid_key(&format!("a{}", "b".repeat(255))));

        assert!(!is_valid_key(""));
        assert!(!is_valid_key("1key"));
        assert!(!is_valid_key("UPPER"));
        assert!(!is_valid_key("key "));
        assert!(!is_valid_key(&format!("a{}", "b".repeat(256))));
    }

    #[test]
    fn test_tenant_key_grammar() {
        assert!(is_valid_key("tenant@system"));
        assert!(is_valid_key("0tenant@s"));
        assert!(is_valid_key(&format!("t{}@sys", "x".repeat(240))));
        assert!(is_valid_key(&format!("t@s{}", "y".repeat(13))));

        assert!(!is_valid_key("tenant@"));
        assert!(!is_valid_key("@system"));
        assert!(!is_valid_key("tenant@0system"));
        assert!(!is_valid_key("tenant@system@more"));
        assert!(!is_valid_key(&format!("t@s{}", "y".repeat(14))));
    }

    #[test]
    fn test_value_grammar() {
        assert!(is_valid_value("v"));
        assert!(is_valid_value("rojo;00f067aa0ba902b7"));
        assert!(is_valid_value("has spaces inside"));
        assert!(is_valid_value(&"v".repeat(256)));

        assert!(!is_valid_value(""));
        assert!(!is_valid_value("ends in space "));
        assert!(!is_valid_value("no,comma"));
        assert!(!is_valid_value("no=equals"));
        assert!(!is_valid_value("tab\tinside"));
        assert!(!is_valid_value(&"v".repeat(257)));
    }

    #[test]
    fn test_validated_entry() {
        let entry = Entry::validated("congo", "t61rcWkgMzE").unwrap();
        assert!(entry.is_valid());

        assert_eq!(
            Entry::validated("BAD!", "v").unwrap_err(),
            TraceContextError::InvalidKey
        );
        assert_eq!(
            Entry::validated("good", "bad=value").unwrap_err(),
            TraceContextError::InvalidValue
        );
    }

    #[test]
    fn test_scan_basic_list() {
        let parsed = entries("congo=t61rcWkgMzE,rojo=00f067aa0ba902b7");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].key, "congo");
        assert_eq!(parsed[0].value, "t61rcWkgMzE");
        assert_eq!(parsed[1].key, "rojo");
        assert!(parsed.iter().all(Entry::is_valid));
    }

    #[test]
    fn test_scan_trims_boundaries_only() {
        // Leading whitespace trimmed from the key side, trailing from the
        // value side; everything else is literal content.
        let parsed = entries(" \tcongo=t61rcWkgMzE \t");
        assert_eq!(parsed[0].key, "congo");
        assert_eq!(parsed[0].value, "t61rcWkgMzE");

        let parsed = entries("congo = value");
        assert_eq!(parsed[0].key, "congo ");
        assert_eq!(parsed[0].value, " value");
        assert!(!parsed[0].is_valid());
    }

    #[test]
    fn test_scan_yields_invalid_entries() {
        let parsed = entries("INVALID!KEY =invalid?value");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].key, "INVALID!KEY ");
        assert_eq!(parsed[0].value, "invalid?value");
        assert!(!parsed[0].is_valid());
    }

    #[test]
    fn test_scan_skips_keyless_segments() {
        // No '=', or '=' at segment start: skipped, no cap consumed.
        assert_eq!(entries("").len(), 0);
        assert_eq!(entries("no-equals-here").len(), 0);
        assert_eq!(entries("=value").len(), 0);
        assert_eq!(entries(",,,").len(), 0);

        let parsed = entries("garbage,k1=v1,=nope,k2=v2,");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].key, "k1");
        assert_eq!(parsed[1].key, "k2");
    }

    #[test]
    fn test_scan_preserves_empty_value() {
        // "k=" parses to an empty value, which the grammar then rejects.
        let parsed = entries("k=");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].value, "");
        assert!(!parsed[0].is_valid());
    }

    #[test]
    fn test_cursor_caps_at_32_members() {
        let raw = (1..=40)
            .map(|i| format!("k{i:02}=v{i:02}"))
            .collect::<Vec<_>>()
            .join(",");
        let parsed = entries(&raw);
        assert_eq!(parsed.len(), MAX_LIST_MEMBERS);
        assert_eq!(parsed[0].key, "k01");
        assert_eq!(parsed[31].key, "k32");
    }

    #[test]
    fn test_cursor_restarts() {
        let state = "k1=v1,k2=v2";
        let first: Vec<_> = Entries::new(state).collect();
        let second: Vec<_> = Entries::new(state).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_cursor_has_next_does_not_consume() {
        let mut cursor = Entries::new("k1=v1");
        assert!(cursor.has_next());
        assert!(cursor.has_next());
        assert_eq!(cursor.try_next().unwrap().key, "k1");
        assert!(!cursor.has_next());
    }

    #[test]
    fn test_cursor_overrun_fails() {
        let mut cursor = Entries::new("k1=v1");
        cursor.try_next().unwrap();
        assert_eq!(
            cursor.try_next().unwrap_err(),
            TraceContextError::EntriesExhausted
        );
        // Still exhausted on repeat calls.
        assert_eq!(
            cursor.try_next().unwrap_err(),
            TraceContextError::EntriesExhausted
        );
    }
}
