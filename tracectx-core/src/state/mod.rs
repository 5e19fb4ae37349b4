//! The `tracestate` header: an ordered list of vendor key=value members
//!
//! ## Key properties
//!
//! - **Raw passthrough**: the header string is stored verbatim and never
//!   validated as a whole; validity is a per-member classification.
//! - **Lenient reads, strict writes**: foreign/malformed members are
//!   tolerated and preserved, while members written through [`TraceState::mutate`]
//!   are grammar-checked up front.
//! - **Most-recently-updated first**: mutation floats updated keys to the
//!   front and re-appends untouched members in their original order.
//! - **Capacity bound**: at most 32 members survive a mutation, and reads
//!   never look past the first 32 parseable members.

mod entry;

pub use entry::{Entries, Entry, MAX_LIST_MEMBERS};

use std::collections::HashSet;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::Result;

use entry::next_member;

/// Immutable `tracestate` value
///
/// Created empty, from a raw inbound header, or as the output of
/// [`mutate`](Self::mutate). Mutation produces a new instance; the source is
/// left untouched, so instances are freely shareable across threads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceState {
    raw: String,
}

impl TraceState {
    /// Empty state; serializes to `""`
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a raw inbound header value, unvalidated
    ///
    /// An absent header yields the empty state.
    pub fn from_header(value: Option<&str>) -> Self {
        Self {
            raw: value.unwrap_or_default().to_owned(),
        }
    }

    /// Value of the first member whose key is byte-for-byte equal to `key`
    ///
    /// Scans in stored order through the lenient cursor window (the first
    /// 32 parseable members); a duplicate beyond that window is unreachable.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries().find(|e| e.key == key).map(|e| e.value)
    }

    /// A fresh lenient cursor over this state's list members
    ///
    /// Restartable: every call begins a new scan of the same raw string.
    pub fn entries(&self) -> Entries<'_> {
        Entries::new(&self.raw)
    }

    /// Upsert or delete a single key; sugar for [`mutate_all`](Self::mutate_all)
    ///
    /// A `None` or empty value deletes the key.
    pub fn mutate(&self, key: &str, value: Option<&str>) -> Result<TraceState> {
        self.mutate_all(&[(key, value)])
    }

    /// Apply a batch of updates, returning the resulting state
    ///
    /// Updates apply in slice order. A pair with a non-empty value is an
    /// upsert and is grammar-checked (`InvalidKey`/`InvalidValue`); a pair
    /// with `None` or `Some("")` is a deletion and contributes nothing (its
    /// key is not validated, so foreign invalid keys can be deleted).
    ///
    /// The output list is built by appending the validated upserts first, in
    /// update order, then re-scanning the existing members leniently and
    /// appending every member whose key is not named in `updates`. Existing
    /// invalid members are preserved verbatim. Collection stops at 32
    /// members; anything beyond that is discarded permanently. Deleting a
    /// key therefore frees a slot that a member past the original 32-member
    /// read window may fill.
    pub fn mutate_all(&self, updates: &[(&str, Option<&str>)]) -> Result<TraceState> {
        let mut members: Vec<String> = Vec::new();

        for (key, value) in updates {
            match value {
                Some(value) if !value.is_empty() => {
                    let entry = Entry::validated(key, value)?;
                    if members.len() < MAX_LIST_MEMBERS {
                        members.push(format!("{}={}", entry.key, entry.value));
                    }
                }
                // Deletion: handled by the key filter below.
                _ => {}
            }
        }

        let updated_keys: HashSet<&str> = updates.iter().map(|(key, _)| *key).collect();

        // Unlike the read path, this scan is not capped at 32 source
        // members; only the output list is. A deletion can thus surface a
        // member that the read window had truncated.
        let mut pos = 0;
        while members.len() < MAX_LIST_MEMBERS {
            let Some((key, value)) = next_member(&self.raw, &mut pos) else {
                break;
            };
            if updated_keys.contains(key.as_str()) {
                continue;
            }
            members.push(format!("{key}={value}"));
        }

        Ok(TraceState {
            raw: members.join(","),
        })
    }
}

impl fmt::Display for TraceState {
    /// The exact raw string: untouched passthrough for inbound values,
    /// canonical `,`-joined form for mutation results
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for TraceState {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.raw)
    }
}
