//! # tracectx Core - W3C Trace Context propagation
//!
//! A codec for the two headers that carry distributed-tracing identity
//! across service calls:
//!
//! - **`traceparent`**: version, 16-byte trace ID, 8-byte parent ID and the
//!   sampled flag, as fixed-width lowercase hex ([`TraceParent`])
//! - **`tracestate`**: an ordered, capacity-bounded list of vendor
//!   `key=value` members ([`TraceState`])
//!
//! ## Core Principle
//!
//! > Tolerant on the wire, strict at the pen.
//!
//! Parsing is total: malformed or foreign trace data from other vendors is
//! never an error, it is preserved or skipped. Values this crate writes
//! itself are validated strictly and rejected with typed errors.
//!
//! All three public types are immutable; every mutating operation returns a
//! new instance, so values are freely shareable across threads.
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use tracectx_core::{TraceContext, TRACEPARENT_HEADER, TRACESTATE_HEADER};
//!
//! // Inbound headers from an upstream caller.
//! let mut inbound = HashMap::new();
//! inbound.insert(
//!     TRACEPARENT_HEADER.to_string(),
//!     "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01".to_string(),
//! );
//! inbound.insert(TRACESTATE_HEADER.to_string(), "congo=t61rcWkgMzE".to_string());
//!
//! // Continue the trace.
//! let context = TraceContext::from_request(&inbound);
//! assert_eq!(context.trace_id(), "0af7651916cd43dd8448eb211c80319c");
//!
//! // Emit it downstream with our own sampling decision and state entry.
//! let mut outbound = HashMap::new();
//! context
//!     .propagate_with_state(&mut outbound, true, &[("mine", Some("opaque-1"))])
//!     .unwrap();
//! assert_eq!(outbound["tracestate"], "mine=opaque-1,congo=t61rcWkgMzE");
//! ```

pub mod context;
pub mod error;
pub mod parent;
pub mod state;

// Re-export main types
pub use context::{Headers, TraceContext};
pub use error::{Result, TraceContextError};
pub use parent::{TraceParent, TRACEPARENT_VERSION};
pub use state::{Entries, Entry, TraceState, MAX_LIST_MEMBERS};

/// Name of the header carrying the trace parent
pub const TRACEPARENT_HEADER: &str = "traceparent";

/// Name of the header carrying vendor trace state
pub const TRACESTATE_HEADER: &str = "tracestate";
