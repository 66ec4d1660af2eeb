//! Scanner and balancer wired into one pipeline.

use crate::balancer::TagBalancer;
use crate::config::{BalancerConfig, ScannerConfig};
use crate::diagnostics::DiagnosticSink;
use crate::error::ScanError;
use crate::events::{Event, EventRecorder, EventSink};
use crate::scanner::{InputSource, Scanner};

/// A scanner feeding a tag balancer feeding `S`.
pub struct ParseSession<S> {
    scanner: Scanner<TagBalancer<S>>,
}

impl<S: EventSink> ParseSession<S> {
    pub fn new(scanner_config: ScannerConfig, balancer_config: BalancerConfig, sink: S) -> Self {
        let balancer = TagBalancer::new(balancer_config, sink);
        Self {
            scanner: Scanner::new(scanner_config, balancer),
        }
    }

    /// Route diagnostics from both stages to clones of `sink`.
    pub fn set_diagnostic_sink<D>(&mut self, sink: D)
    where
        D: DiagnosticSink + Clone + 'static,
    {
        self.scanner
            .handler_mut()
            .set_diagnostic_sink(Box::new(sink.clone()));
        self.scanner.set_diagnostic_sink(Box::new(sink));
    }

    /// Parse a whole document.
    pub fn parse(&mut self, source: InputSource) -> Result<(), ScanError> {
        self.scanner.set_source(source);
        let result = self.scanner.scan_document(true);
        if result.is_err() {
            self.scanner.cleanup();
        }
        result.map(|_| ())
    }

    /// The scanner, for stepping a document or inserting sources.
    pub fn scanner_mut(&mut self) -> &mut Scanner<TagBalancer<S>> {
        &mut self.scanner
    }

    pub fn sink(&self) -> &S {
        self.scanner.handler().sink()
    }

    pub fn into_sink(self) -> S {
        self.scanner.into_handler().into_sink()
    }
}

/// Balanced events for a byte document with default configuration.
pub fn parse_bytes(bytes: &[u8]) -> Result<Vec<Event>, ScanError> {
    parse(InputSource::from_bytes(bytes.to_vec()))
}

/// Balanced events for an already-decoded document with default
/// configuration.
pub fn parse_str(html: &str) -> Result<Vec<Event>, ScanError> {
    parse(InputSource::from_text(html))
}

fn parse(source: InputSource) -> Result<Vec<Event>, ScanError> {
    let mut session = ParseSession::new(
        ScannerConfig::default(),
        BalancerConfig::default(),
        EventRecorder::new(),
    );
    session.parse(source)?;
    Ok(session.into_sink().into_events())
}

#[cfg(test)]
mod tests {
    use super::{ParseSession, parse_bytes, parse_str};
    use crate::config::{BalancerConfig, ScannerConfig};
    use crate::diagnostics::{DiagnosticCollector, MessageKey};
    use crate::events::{Event, EventRecorder};
    use crate::scanner::InputSource;
    use std::io::{self, Read};

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("disk on fire"))
        }
    }

    #[test]
    fn session_smoke() {
        let events = parse_str("<p>x").expect("in-memory source");
        assert_eq!(events.first(), Some(&Event::StartDocument));
        assert_eq!(events.last(), Some(&Event::EndDocument));
        assert_eq!(events, parse_bytes(b"<p>x").expect("in-memory source"));
    }

    #[test]
    fn io_failure_surfaces_as_error() {
        let mut session = ParseSession::new(
            ScannerConfig::default(),
            BalancerConfig::default(),
            EventRecorder::new(),
        );
        let err = session
            .parse(InputSource::from_reader(FailingReader))
            .expect_err("read failure must propagate");
        assert!(err.to_string().contains("disk on fire"), "unexpected error: {err}");
    }

    #[test]
    fn both_stages_share_one_collector() {
        let collector = DiagnosticCollector::new();
        let mut session = ParseSession::new(
            ScannerConfig {
                report_errors: true,
                ..ScannerConfig::default()
            },
            BalancerConfig {
                report_errors: true,
                ..BalancerConfig::default()
            },
            EventRecorder::new(),
        );
        session.set_diagnostic_sink(collector.clone());
        session
            .parse(InputSource::from_text("&bogus;</font>"))
            .expect("in-memory source");
        let keys = collector.keys();
        assert!(keys.contains(&MessageKey::UnknownEntity));
        assert!(keys.contains(&MessageKey::UnmatchedEndTag));
    }
}
