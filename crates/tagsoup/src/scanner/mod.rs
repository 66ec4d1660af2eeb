//! Tolerant HTML scanner.
//!
//! Pulls characters from a stack of input sources and emits one document
//! event per token to its handler. Markup is never rejected: anything the
//! scanner cannot classify degrades to text, a comment, or is skipped.
//!
//! Invariants:
//! - Adjacent text (including resolved references) reaches the handler as a
//!   single `characters` call unless entity notification is requested.
//! - After an encoding pivot no event already delivered is delivered again:
//!   events are suppressed until the element counter passes the threshold
//!   recorded at the pivot.
//! - Only I/O failures of the underlying source surface as errors.

mod markup;
mod playback;
mod raw_text;
mod source;
mod states;

use crate::config::ScannerConfig;
use crate::diagnostics::{DiagnosticSink, MessageKey, Reporter};
use crate::entities::{REFERENCE_LOOKAHEAD, match_reference};
use crate::error::ScanError;
use crate::events::EventSink;
use source::{Entity, EntityKind, SourceStack};
use states::ScanState;
use tools::Charset;

pub use source::InputSource;

/// Raw-text element currently being scanned.
#[derive(Clone, Debug)]
struct RawTextElement {
    canonical: String,
    name: String,
}

/// HTML scanner driving an [`EventSink`].
pub struct Scanner<H> {
    config: ScannerConfig,
    handler: H,
    reporter: Reporter,
    sources: SourceStack,
    state: ScanState,
    raw_text: Option<RawTextElement>,
    text: String,
    element_count: usize,
    element_threshold: Option<usize>,
    pivoted: bool,
}

impl<H: EventSink> Scanner<H> {
    pub fn new(config: ScannerConfig, handler: H) -> Self {
        let reporter = Reporter::new(config.report_errors);
        Self {
            config,
            handler,
            reporter,
            sources: SourceStack::default(),
            state: ScanState::StartDocument,
            raw_text: None,
            text: String::new(),
            element_count: 0,
            element_threshold: None,
            pivoted: false,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn set_diagnostic_sink(&mut self, sink: Box<dyn DiagnosticSink>) {
        self.reporter.set_sink(sink);
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Start a new document from `source`, discarding any previous one.
    pub fn set_source(&mut self, source: InputSource) {
        self.cleanup();
        let record = !self.config.ignore_specified_charset;
        self.sources.push(Entity::open(
            source,
            EntityKind::Document,
            self.config.default_encoding,
            record,
        ));
        self.state = ScanState::StartDocument;
        self.element_count = 0;
        self.element_threshold = None;
        self.pivoted = false;
    }

    /// Drop every open source.
    pub fn cleanup(&mut self) {
        self.sources.clear();
        self.raw_text = None;
        self.text.clear();
    }

    /// Charset of the document source, once its first bytes are decoded.
    pub fn current_encoding(&self) -> Option<Charset> {
        self.sources.root().and_then(|entity| entity.charset())
    }

    /// System identifier of the source currently being read.
    pub fn system_id(&self) -> Option<&str> {
        self.sources.top().and_then(|entity| entity.system_id())
    }

    /// Scan the document. With `complete` set, runs to the end; otherwise
    /// performs one scanning step. Returns `false` once the end-document
    /// event has been delivered.
    pub fn scan_document(&mut self, complete: bool) -> Result<bool, ScanError> {
        loop {
            let more = self.step()?;
            if !more {
                return Ok(false);
            }
            if !complete {
                return Ok(true);
            }
        }
    }

    /// Read `source` before the rest of the current one. The current source
    /// resumes when `source` is exhausted.
    pub fn push_input_source(&mut self, source: InputSource) {
        self.sources.push(Entity::open(
            source,
            EntityKind::Pushed,
            self.config.default_encoding,
            false,
        ));
    }

    /// Scan `source` to its end right away, as if its markup appeared at the
    /// current position, then resume the current source where it stopped.
    pub fn evaluate_input_source(&mut self, source: InputSource) -> Result<(), ScanError> {
        self.flush_text();
        let saved_state = self.state;
        let saved_raw_text = self.raw_text.take();
        let depth = self.sources.depth();
        self.sources.push(Entity::open(
            source,
            EntityKind::Evaluated,
            self.config.default_encoding,
            false,
        ));
        self.set_state(ScanState::Content);

        let result = self.run_evaluated();

        while self.sources.depth() > depth {
            self.sources.pop();
        }
        self.flush_text();
        self.raw_text = saved_raw_text;
        self.set_state(saved_state);
        result
    }

    fn run_evaluated(&mut self) -> Result<(), ScanError> {
        while self.step()? {}
        Ok(())
    }

    fn step(&mut self) -> Result<bool, ScanError> {
        match self.state {
            ScanState::StartDocument => {
                self.handler.start_document();
                self.set_state(ScanState::Content);
                Ok(true)
            }
            ScanState::Content => self.scan_content(),
            ScanState::MarkupBracket => {
                self.scan_markup()?;
                Ok(true)
            }
            ScanState::RawText => self.scan_raw_text(),
            ScanState::EndDocument => {
                self.flush_text();
                self.handler.end_document();
                self.set_state(ScanState::Finished);
                Ok(false)
            }
            ScanState::Finished => Ok(false),
        }
    }

    fn set_state(&mut self, next: ScanState) {
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "html.scanner", "state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Character data up to the next `<`.
    fn scan_content(&mut self) -> Result<bool, ScanError> {
        loop {
            if !self.sources.fill()? {
                return Ok(self.end_of_input());
            }
            let rest = self.sources.rest();
            match memchr::memchr2(b'<', b'&', rest.as_bytes()) {
                Some(0) => {}
                Some(index) => {
                    self.text.push_str(&rest[..index]);
                    self.sources.advance(index);
                }
                None => {
                    let len = rest.len();
                    self.text.push_str(rest);
                    self.sources.advance(len);
                    continue;
                }
            }
            if self.sources.skip_char('<')? {
                // The whole construct is scanned in this step so that no
                // source can be pushed between `<` and the tag name.
                self.set_state(ScanState::MarkupBracket);
                self.scan_markup()?;
                return Ok(true);
            }
            self.scan_reference()?;
        }
    }

    /// The current source ran out. Ends the document, or reports the end of
    /// an evaluated source to its caller.
    fn end_of_input(&mut self) -> bool {
        self.flush_text();
        if self.sources.top_kind() == Some(EntityKind::Evaluated) {
            return false;
        }
        self.set_state(ScanState::EndDocument);
        true
    }

    /// A `&` in character data.
    fn scan_reference(&mut self) -> Result<(), ScanError> {
        self.sources.ensure(REFERENCE_LOOKAHEAD)?;
        let rest = self.sources.rest();
        let Some(reference) = match_reference(rest, self.config.fix_windows_char_refs) else {
            if let Some(written) = unknown_entity(rest) {
                self.reporter.report(MessageKey::UnknownEntity, &[written]);
            }
            self.text.push('&');
            self.sources.advance(1);
            return Ok(());
        };

        let written = &rest[..reference.len];
        if !reference.terminated {
            self.reporter
                .report(MessageKey::UnterminatedReference, &[written]);
        }
        if reference.invalid {
            self.reporter
                .report(MessageKey::InvalidCharacterReference, &[written]);
        }
        let notify = if reference.numeric {
            self.config.notify_char_refs
        } else if matches!(reference.name, "amp" | "lt" | "gt" | "quot" | "apos") {
            self.config.notify_builtin_refs
        } else {
            self.config.notify_html_builtin_refs
        };
        let name = reference.name.to_string();
        let value = reference.value;
        self.sources.advance(reference.len);

        if notify {
            self.flush_text();
            if !self.suppressed() {
                let mut buf = [0u8; 4];
                self.handler.start_general_entity(&name);
                self.handler.characters(value.encode_utf8(&mut buf));
                self.handler.end_general_entity(&name);
            }
        } else {
            self.text.push(value);
        }
        Ok(())
    }

    /// Whether events are held back while an encoding replay catches up.
    fn suppressed(&self) -> bool {
        self.element_threshold
            .is_some_and(|threshold| self.element_count < threshold)
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        if !self.suppressed() {
            self.handler.characters(&text);
        }
    }
}

impl<H: std::fmt::Debug> std::fmt::Debug for Scanner<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("state", &self.state)
            .field("sources", &self.sources)
            .field("element_count", &self.element_count)
            .field("element_threshold", &self.element_threshold)
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

/// `&name;` with a name the entity table does not know.
fn unknown_entity(rest: &str) -> Option<&str> {
    let bytes = rest.as_bytes();
    let len = bytes
        .get(1..)?
        .iter()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    (len > 0 && bytes.get(1 + len) == Some(&b';')).then(|| &rest[..len + 2])
}
