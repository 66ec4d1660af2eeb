#![no_main]

use libfuzzer_sys::fuzz_target;
use tagsoup::{Event, parse_bytes};

// Byte input goes through BOM sniffing and the `<meta>` charset replay.
fuzz_target!(|data: &[u8]| {
    let events = parse_bytes(data).expect("in-memory source never fails");
    assert_eq!(events.first(), Some(&Event::StartDocument));
    assert_eq!(events.last(), Some(&Event::EndDocument));
    let starts = events
        .iter()
        .filter(|event| matches!(event, Event::StartElement { .. }))
        .count();
    let ends = events
        .iter()
        .filter(|event| matches!(event, Event::EndElement { .. }))
        .count();
    assert_eq!(starts, ends);
});
