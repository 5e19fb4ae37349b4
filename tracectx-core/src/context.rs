//! Composition of `traceparent` and `tracestate` into a propagated identity
//!
//! [`TraceContext`] pairs one [`TraceParent`] with one [`TraceState`] and
//! orchestrates the two propagation flows: deriving an outbound context from
//! inbound headers, and merging local mutations before emission. Header I/O
//! itself stays with the caller behind the [`Headers`] carrier trait.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::Result;
use crate::parent::TraceParent;
use crate::state::TraceState;
use crate::{TRACEPARENT_HEADER, TRACESTATE_HEADER};

/// Minimal header-carrier abstraction consumed by the codec
///
/// Any request/response type that can read and write named string headers
/// can participate in propagation.
pub trait Headers {
    /// The header value under `name`, if present
    fn get(&self, name: &str) -> Option<&str>;

    /// Set the header `name` to `value`, replacing any previous value
    fn set(&mut self, name: &str, value: &str);
}

impl Headers for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<&str> {
        HashMap::get(self, name).map(String::as_str)
    }

    fn set(&mut self, name: &str, value: &str) {
        self.insert(name.to_owned(), value.to_owned());
    }
}

/// A caller's propagated trace identity: one parent, one state
///
/// Always derived from a single inbound request or created fresh; never
/// persisted. Immutable: [`propagate`](Self::propagate) derives new values
/// and writes them out without touching this instance.
#[derive(Debug, Clone, Serialize)]
pub struct TraceContext {
    parent: TraceParent,
    state: TraceState,
}

impl TraceContext {
    /// Start a new trace: fresh unsampled parent, empty state
    ///
    /// Used when no valid inbound context exists.
    pub fn new() -> Self {
        Self {
            parent: TraceParent::new(false),
            state: TraceState::new(),
        }
    }

    /// Derive the context carried by an inbound request
    ///
    /// A missing or unparseable `traceparent` discards the entire inbound
    /// context, `tracestate` included; a trace cannot be continued without
    /// a valid parent. Otherwise the parsed parent is paired with the raw
    /// `tracestate` (absent means empty).
    pub fn from_request(inbound: &impl Headers) -> Self {
        match inbound.get(TRACEPARENT_HEADER).and_then(TraceParent::try_parse) {
            Some(parent) => Self {
                parent,
                state: TraceState::from_header(inbound.get(TRACESTATE_HEADER)),
            },
            None => Self::new(),
        }
    }

    /// Forward both headers verbatim, without parsing or validation
    ///
    /// `traceparent` is copied only if present and non-empty; without it,
    /// nothing is copied at all. `tracestate` follows only when
    /// `traceparent` was copied and is itself present and non-empty.
    pub fn pass_through(inbound: &impl Headers, outbound: &mut impl Headers) {
        let Some(parent) = inbound.get(TRACEPARENT_HEADER).filter(|v| !v.is_empty()) else {
            return;
        };
        outbound.set(TRACEPARENT_HEADER, parent);

        if let Some(state) = inbound.get(TRACESTATE_HEADER).filter(|v| !v.is_empty()) {
            outbound.set(TRACESTATE_HEADER, state);
        }
    }

    /// Write this context to an outbound carrier with a fresh parent ID and
    /// the caller's sampled decision
    ///
    /// The trace ID and version never change. `tracestate` is written only
    /// if non-empty.
    pub fn propagate(&self, outbound: &mut impl Headers, sampled: bool) {
        self.write(outbound, self.parent.mutate(sampled), self.state.clone());
    }

    /// Like [`propagate`](Self::propagate), but first applies `updates` to
    /// the state
    ///
    /// Fails without writing anything if an update fails grammar
    /// validation.
    pub fn propagate_with_state(
        &self,
        outbound: &mut impl Headers,
        sampled: bool,
        updates: &[(&str, Option<&str>)],
    ) -> Result<()> {
        let state = self.state.mutate_all(updates)?;
        self.write(outbound, self.parent.mutate(sampled), state);
        Ok(())
    }

    fn write(&self, outbound: &mut impl Headers, parent: TraceParent, state: TraceState) {
        outbound.set(TRACEPARENT_HEADER, &parent.to_string());
        let state = state.to_string();
        if !state.is_empty() {
            outbound.set(TRACESTATE_HEADER, &state);
        }
    }

    /// The propagated parent
    pub fn parent(&self) -> &TraceParent {
        &self.parent
    }

    /// The propagated state
    pub fn state(&self) -> &TraceState {
        &self.state
    }

    /// Shorthand for the parent's trace ID
    pub fn trace_id(&self) -> &str {
        self.parent.trace_id()
    }

    /// Shorthand for the parent's sampled decision
    pub fn sampled(&self) -> bool {
        self.parent.sampled()
    }
}

impl Default for TraceContext {
    fn default() -> Self {
        Self::new()
    }
}
