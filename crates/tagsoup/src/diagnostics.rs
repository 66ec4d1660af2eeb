//! Recoverable markup diagnostics.
//!
//! Nothing here formats prose: a diagnostic is a stable message key plus
//! positional arguments, and rendering is left to whoever receives it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// Stable message keys. Scanner keys are `HTML1xxx`, balancer keys `HTML2xxx`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// `[charset]` named by a `<meta>` is not supported.
    UnsupportedCharset,
    /// `[charset]` cannot be switched to mid-stream.
    IncompatibleCharset,
    /// `[reference]` lacks its closing `;`.
    UnterminatedReference,
    /// `[reference]` names no known entity.
    UnknownEntity,
    /// `[reference]` is a numeric reference outside Unicode.
    InvalidCharacterReference,
    /// `[element, attribute]` repeats an attribute; the first one wins.
    DuplicateAttribute,
    /// `[construct]` is cut off by the end of input.
    UnexpectedEof,
    /// `[text]` a markup declaration nobody understands was skipped.
    BogusMarkupDeclaration,
    /// `[element, parent]` had its natural parent synthesized.
    MissingParent,
    /// `[closed, cause]` was ended implicitly.
    ImplicitlyClosed,
    /// `[element]` end tag has no open match and was dropped.
    UnmatchedEndTag,
    /// `[element]` was still open at the end of the document.
    UnclosedElement,
    /// `[element]` start tag repeats a document-level element.
    DuplicateElement,
    /// `[element]` appeared after the root element ended and was dropped.
    ContentAfterRoot,
}

impl MessageKey {
    pub fn code(self) -> &'static str {
        match self {
            MessageKey::UnsupportedCharset => "HTML1000",
            MessageKey::IncompatibleCharset => "HTML1001",
            MessageKey::UnterminatedReference => "HTML1004",
            MessageKey::UnknownEntity => "HTML1005",
            MessageKey::InvalidCharacterReference => "HTML1006",
            MessageKey::DuplicateAttribute => "HTML1007",
            MessageKey::UnexpectedEof => "HTML1008",
            MessageKey::BogusMarkupDeclaration => "HTML1009",
            MessageKey::MissingParent => "HTML2000",
            MessageKey::ImplicitlyClosed => "HTML2001",
            MessageKey::UnmatchedEndTag => "HTML2002",
            MessageKey::UnclosedElement => "HTML2003",
            MessageKey::DuplicateElement => "HTML2004",
            MessageKey::ContentAfterRoot => "HTML2005",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            MessageKey::UnmatchedEndTag
            | MessageKey::UnsupportedCharset
            | MessageKey::InvalidCharacterReference => Severity::Error,
            _ => Severity::Warning,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub key: MessageKey,
    pub severity: Severity,
    pub args: Vec<String>,
}

impl Diagnostic {
    pub fn new(key: MessageKey, args: &[&str]) -> Self {
        Self {
            key,
            severity: key.severity(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.key.code(), self.args.join(", "))
    }
}

/// Receiver of diagnostics.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Forwards diagnostics to the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogDiagnostics;

impl DiagnosticSink for LogDiagnostics {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => log::warn!(target: "html.diagnostics", "{diagnostic}"),
            Severity::Warning => log::debug!(target: "html.diagnostics", "{diagnostic}"),
        }
    }
}

/// Collects diagnostics into shared storage; clones share the same list, so
/// one collector can be handed to the scanner and the balancer.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    items: Rc<RefCell<Vec<Diagnostic>>>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.items.borrow_mut())
    }

    pub fn keys(&self) -> Vec<MessageKey> {
        self.items.borrow().iter().map(|d| d.key).collect()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.items.borrow_mut().push(diagnostic);
    }
}

/// Reporting front-end owned by each component: drops everything unless
/// reporting is enabled.
pub(crate) struct Reporter {
    enabled: bool,
    sink: Box<dyn DiagnosticSink>,
}

impl Reporter {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled,
            sink: Box::new(LogDiagnostics),
        }
    }

    pub(crate) fn set_sink(&mut self, sink: Box<dyn DiagnosticSink>) {
        self.sink = sink;
    }

    pub(crate) fn report(&mut self, key: MessageKey, args: &[&str]) {
        if self.enabled {
            self.sink.report(Diagnostic::new(key, args));
        }
    }
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
