//! The `traceparent` header: parse, generate, mutate, render
//!
//! Wire format (W3C Trace Context):
//!
//! ```text
//! traceparent: {2-hex version}-{32-hex trace-id}-{16-hex parent-id}-{2-hex flags}
//! ```
//!
//! Only the version-0 layout is understood. Per the forward-compatibility
//! rule, content after the flags field is accepted and ignored as long as it
//! is dash-delimited.

use std::fmt;
use std::sync::OnceLock;

use rand::rngs::OsRng;
use rand::RngCore;
use regex::Regex;
use serde::{Serialize, Serializer};

/// Trace-context version emitted by this crate (the only layout understood)
pub const TRACEPARENT_VERSION: u8 = 0;

/// Byte width of a trace ID (rendered as 32 hex characters)
const TRACE_ID_BYTES: usize = 16;

/// Byte width of a parent ID (rendered as 16 hex characters)
const PARENT_ID_BYTES: usize = 8;

/// Sampled bit of the flags byte
const FLAG_SAMPLED: u8 = 0x01;

/// Anchored at position 0; trailing content is allowed only when it is
/// delimited by a dash after the flags field.
fn traceparent_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[0-9a-f]{2}-[0-9a-f]{32}-[0-9a-f]{16}-[0-9a-f]{2}(?:$|-)")
            .expect("traceparent pattern is valid")
    })
}

fn is_all_zeros(s: &str) -> bool {
    s.bytes().all(|b| b == b'0')
}

/// Fill `len` random bytes, retrying until at least one byte is non-zero,
/// and render them as lowercase hex. The all-zero ID is reserved as the
/// invalid sentinel on the wire, so it must never be minted.
fn random_id(len: usize) -> String {
    let mut buf = vec![0u8; len];
    loop {
        OsRng.fill_bytes(&mut buf);
        if buf.iter().any(|b| *b != 0) {
            return hex::encode(&buf);
        }
    }
}

/// Immutable `traceparent` value: a 16-byte trace ID, an 8-byte parent ID
/// and the sampled decision
///
/// Every live instance holds syntactically valid, non-zero IDs. Mutation
/// produces a new instance; nothing is ever modified in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceParent {
    /// 32 lowercase-hex characters, never all zeros
    trace_id: String,
    /// 16 lowercase-hex characters, never all zeros
    parent_id: String,
    /// Bit 0 of the flags byte
    sampled: bool,
}

impl TraceParent {
    /// Start a new trace: both IDs freshly generated from the OS random
    /// source, version 0, the given sampled decision
    pub fn new(sampled: bool) -> Self {
        Self {
            trace_id: random_id(TRACE_ID_BYTES),
            parent_id: random_id(PARENT_ID_BYTES),
            sampled,
        }
    }

    /// Parse an inbound `traceparent` header value
    ///
    /// Total and silent: any malformed input yields `None`. Rejected inputs:
    /// anything that does not match the anchored header pattern (including
    /// bare extra characters immediately after the flags field), the `ff`
    /// version sentinel, and all-zero trace or parent IDs.
    ///
    /// Quirk preserved from the wire contract: any version byte other than
    /// `ff` is accepted even though only the version-0 layout is understood,
    /// and [`version`](Self::version) reports 0 for such values.
    pub fn try_parse(input: &str) -> Option<Self> {
        traceparent_pattern().find(input)?;

        let version = &input[0..2];
        let trace_id = &input[3..35];
        let parent_id = &input[36..52];
        let flags = &input[53..55];

        if version == "ff" {
            return None;
        }
        if is_all_zeros(trace_id) || is_all_zeros(parent_id) {
            return None;
        }

        // The pattern guarantees two hex digits.
        let flags = u8::from_str_radix(flags, 16).ok()?;

        Some(Self {
            trace_id: trace_id.to_owned(),
            parent_id: parent_id.to_owned(),
            sampled: flags & FLAG_SAMPLED == FLAG_SAMPLED,
        })
    }

    /// Derive the outbound parent: same trace ID, freshly generated parent
    /// ID, the given sampled decision
    pub fn mutate(&self, sampled: bool) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            parent_id: random_id(PARENT_ID_BYTES),
            sampled,
        }
    }

    /// Trace-context version; always 0
    pub fn version(&self) -> u8 {
        TRACEPARENT_VERSION
    }

    /// The 32-hex-character trace ID
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// The 16-hex-character parent ID
    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    /// The sampled decision (bit 0 of the flags byte)
    pub fn sampled(&self) -> bool {
        self.sampled
    }
}

impl fmt::Display for TraceParent {
    /// Renders the canonical 55-character header value
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = if self.sampled { FLAG_SAMPLED } else { 0 };
        write!(
            f,
            "{:02x}-{}-{}-{:02x}",
            TRACEPARENT_VERSION, self.trace_id, self.parent_id, flags
        )
    }
}

impl Serialize for TraceParent {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
