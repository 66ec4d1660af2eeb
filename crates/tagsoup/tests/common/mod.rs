#![allow(dead_code)]

use tagsoup::{
    BalancerConfig, DiagnosticCollector, Event, EventRecorder, InputSource, ParseSession,
    ScannerConfig, elements,
};
use tagsoup_test_support::{escape_html_attr, escape_html_text};

/// Balanced events with adjacent text merged, so re-parsed output that splits
/// text at references compares equal.
pub fn balanced_events(
    source: InputSource,
    scanner: ScannerConfig,
    balancer: BalancerConfig,
) -> (Vec<Event>, DiagnosticCollector) {
    let collector = DiagnosticCollector::new();
    let mut session = ParseSession::new(
        ScannerConfig {
            report_errors: true,
            ..scanner
        },
        BalancerConfig {
            report_errors: true,
            ..balancer
        },
        EventRecorder::coalescing(),
    );
    session.set_diagnostic_sink(collector.clone());
    session
        .parse(source)
        .unwrap_or_else(|err| panic!("in-memory parse failed: {err}"));
    (session.into_sink().into_events(), collector)
}

pub fn balanced_lines(html: &str) -> Vec<String> {
    let (events, _) = balanced_events(
        InputSource::from_text(html),
        ScannerConfig::default(),
        BalancerConfig::default(),
    );
    assert_well_formed(&events);
    events.iter().map(Event::to_test_string).collect()
}

/// Every start has one matching end, pairs never cross, and the document
/// brackets everything.
pub fn assert_well_formed(events: &[Event]) {
    assert_eq!(events.first(), Some(&Event::StartDocument), "{events:?}");
    assert_eq!(events.last(), Some(&Event::EndDocument), "{events:?}");
    let mut open: Vec<&str> = Vec::new();
    let mut entities: Vec<&str> = Vec::new();
    let mut in_cdata = false;
    for (index, event) in events.iter().enumerate() {
        match event {
            Event::StartDocument | Event::EndDocument if index != 0 && index != events.len() - 1 => {
                panic!("document event in the middle at {index}: {events:?}")
            }
            Event::StartElement { name, .. } => open.push(name),
            Event::EndElement { name, .. } => {
                let top = open
                    .pop()
                    .unwrap_or_else(|| panic!("end of {name} with nothing open at {index}"));
                assert_eq!(top, name, "crossing pair at event {index}: {events:?}");
            }
            Event::StartGeneralEntity(name) => entities.push(name),
            Event::EndGeneralEntity(name) => {
                assert_eq!(entities.pop(), Some(name.as_str()), "entity pair at {index}");
            }
            Event::StartCdata => {
                assert!(!in_cdata, "nested CDATA at {index}");
                in_cdata = true;
            }
            Event::EndCdata => {
                assert!(in_cdata, "CDATA end without start at {index}");
                in_cdata = false;
            }
            _ => {}
        }
    }
    assert!(open.is_empty(), "elements left open: {open:?}");
    assert!(entities.is_empty(), "entities left open: {entities:?}");
    assert!(!in_cdata, "CDATA left open");
}

/// Write balanced events back out as markup.
pub fn serialize(events: &[Event]) -> String {
    let mut out = String::new();
    let mut verbatim: Vec<bool> = Vec::new();
    for event in events {
        match event {
            Event::StartDocument | Event::EndDocument => {}
            Event::Doctype {
                root,
                public_id,
                system_id,
            } => {
                out.push_str("<!DOCTYPE ");
                out.push_str(root);
                match (public_id, system_id) {
                    (Some(public), system) => {
                        out.push_str(&format!(" PUBLIC \"{public}\""));
                        if let Some(system) = system {
                            out.push_str(&format!(" \"{system}\""));
                        }
                    }
                    (None, Some(system)) => out.push_str(&format!(" SYSTEM \"{system}\"")),
                    (None, None) => {}
                }
                out.push('>');
            }
            Event::StartElement { name, attrs, .. } => {
                write_tag(&mut out, name, attrs);
                let descriptor = elements::lookup(name);
                verbatim.push(
                    descriptor.is_special()
                        && !matches!(name.to_ascii_uppercase().as_str(), "TEXTAREA" | "TITLE"),
                );
            }
            Event::EmptyElement { name, attrs, .. } => write_tag(&mut out, name, attrs),
            Event::EndElement { name, .. } => {
                verbatim.pop();
                out.push_str(&format!("</{name}>"));
            }
            Event::Characters(text) => {
                if verbatim.last().copied().unwrap_or(false) {
                    out.push_str(text);
                } else {
                    out.push_str(&escape_html_text(text));
                }
            }
            Event::Comment(text) => out.push_str(&format!("<!--{text}-->")),
            Event::ProcessingInstruction { target, data } => {
                if data.is_empty() {
                    out.push_str(&format!("<?{target}>"));
                } else {
                    out.push_str(&format!("<?{target} {data}>"));
                }
            }
            Event::StartGeneralEntity(_)
            | Event::EndGeneralEntity(_)
            | Event::StartCdata
            | Event::EndCdata => {}
        }
    }
    out
}

fn write_tag(out: &mut String, name: &str, attrs: &[tagsoup::Attribute]) {
    out.push('<');
    out.push_str(name);
    for attr in attrs {
        out.push_str(&format!(" {}=\"{}\"", attr.name, escape_html_attr(&attr.value)));
    }
    out.push('>');
}
