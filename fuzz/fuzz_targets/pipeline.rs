#![no_main]

use libfuzzer_sys::fuzz_target;
use tagsoup::{BalancerConfig, Event, EventRecorder, InputSource, ParseSession, ScannerConfig};

fn assert_balanced(events: &[Event]) {
    assert_eq!(events.first(), Some(&Event::StartDocument));
    assert_eq!(events.last(), Some(&Event::EndDocument));
    let mut open: Vec<&str> = Vec::new();
    for event in events {
        match event {
            Event::StartElement { name, .. } => open.push(name),
            Event::EndElement { name, .. } => {
                assert_eq!(open.pop(), Some(name.as_str()), "crossing or stray end");
            }
            _ => {}
        }
    }
    assert!(open.is_empty(), "elements left open: {open:?}");
}

fuzz_target!(|data: &[u8]| {
    let Ok(html) = std::str::from_utf8(data) else {
        return;
    };
    for fragment in [false, true] {
        let mut session = ParseSession::new(
            ScannerConfig::default(),
            BalancerConfig {
                fragment,
                ..BalancerConfig::default()
            },
            EventRecorder::new(),
        );
        session
            .parse(InputSource::from_text(html))
            .expect("in-memory source never fails");
        assert_eq!(session.scanner_mut().handler().depth(), 0);
        assert_balanced(session.sink().events());
    }
});
