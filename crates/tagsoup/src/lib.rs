//! Tolerant HTML scanning and tag balancing.
//!
//! The [`Scanner`] turns arbitrary, possibly malformed HTML into a stream of
//! document events. The [`TagBalancer`] sits in that stream and repairs it
//! into a well-formed element structure. [`ParseSession`] wires the two.

pub mod balancer;
pub mod config;
pub mod diagnostics;
pub mod elements;
pub mod entities;
pub mod error;
pub mod events;
pub mod scanner;
pub mod session;

pub use crate::balancer::TagBalancer;
pub use crate::config::{BalancerConfig, NameCase, ScannerConfig};
pub use crate::diagnostics::{
    Diagnostic, DiagnosticCollector, DiagnosticSink, LogDiagnostics, MessageKey, Severity,
};
pub use crate::elements::{ElementDescriptor, ElementFlags};
pub use crate::error::ScanError;
pub use crate::events::{Attribute, Event, EventInfo, EventRecorder, EventSink};
pub use crate::scanner::{InputSource, Scanner};
pub use crate::session::{ParseSession, parse_bytes, parse_str};
pub use tools::Charset;
