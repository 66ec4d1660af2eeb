mod common;

use common::{assert_well_formed, balanced_events, balanced_lines, serialize};
use tagsoup::{
    BalancerConfig, Charset, Event, EventRecorder, InputSource, MessageKey, ParseSession,
    ScannerConfig, parse_bytes,
};
use tagsoup_test_support::diff_lines;

const MESSY_DOCUMENTS: &[&str] = &[
    "",
    "Hello",
    "<p>A<p>B",
    "<td>x</td>",
    "<b>bold <i>both</b> italic</i>",
    "<script>a < b</script>",
    "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01//EN\" \"http://www.w3.org/TR/html4/strict.dtd\">\n<title>T</title>\n<p>x",
    "<!-- lead --><html><body><p class=a id=b>one</p></body></html>",
    "<ul><li>one<li>two<ul><li>deep</ul><li>three</ul>",
    "<table><tr><td>a<td>b<tr><td>c</table>after",
    "<font color=red>red<div>block</div>still</font>",
    "<div><b>open</div>text</b>",
    "<p>x</p></body>tail</html>more",
    "<foo><bar>unknown</foo> tags</bar>",
    "<head><style>p { color: red }</style></head><p>x<br>y<hr>",
    "<textarea>a &lt; b</textarea><select><option>1<option>2</select>",
    "<?xml-stylesheet href=\"s.css\"?><p>pi first",
    "</font></p>stray ends<p>ok",
    "<dl><dt>term<dd>def<dt>next</dl>",
    "<h1>one<h2>two</h1>three",
];

#[test]
fn every_document_balances_and_ends_with_an_empty_stack() {
    for html in MESSY_DOCUMENTS {
        let mut session = ParseSession::new(
            ScannerConfig::default(),
            BalancerConfig::default(),
            EventRecorder::new(),
        );
        session
            .parse(InputSource::from_text(*html))
            .unwrap_or_else(|err| panic!("parse of {html:?} failed: {err}"));
        assert_eq!(
            session.scanner_mut().handler().depth(),
            0,
            "open elements left for {html:?}"
        );
        assert_well_formed(session.sink().events());
    }
}

#[test]
fn fragments_balance_too() {
    for html in MESSY_DOCUMENTS {
        let (events, _) = balanced_events(
            InputSource::from_text(*html),
            ScannerConfig::default(),
            BalancerConfig::fragment(),
        );
        assert_well_formed(&events);
        let synthesized_roots = events
            .iter()
            .filter(|event| {
                event.is_synthesized()
                    && matches!(event, Event::StartElement { name, .. } if name == "HTML" || name == "BODY")
            })
            .count();
        assert_eq!(synthesized_roots, 0, "fragment mode synthesized a wrapper for {html:?}");
    }
}

#[test]
fn balanced_output_is_a_fixed_point() {
    for html in MESSY_DOCUMENTS {
        let (first, _) = balanced_events(
            InputSource::from_text(*html),
            ScannerConfig::default(),
            BalancerConfig::default(),
        );
        let markup = serialize(&first);
        let (second, collector) = balanced_events(
            InputSource::from_text(markup.as_str()),
            ScannerConfig::default(),
            BalancerConfig::default(),
        );
        let first: Vec<String> = first.iter().map(Event::to_test_string).collect();
        let second: Vec<String> = second.iter().map(Event::to_test_string).collect();
        if first != second {
            panic!(
                "re-parse of {html:?} as {markup:?} changed the events\n{}",
                diff_lines(&first, &second)
            );
        }
        assert!(
            !collector.keys().contains(&MessageKey::UnmatchedEndTag),
            "re-parse of {markup:?} dropped an end tag"
        );
    }
}

#[test]
fn paragraphs_become_siblings() {
    assert_eq!(
        balanced_lines("<p>A<p>B"),
        vec![
            "START-DOCUMENT",
            "START name=HTML attrs=[]",
            "START name=BODY attrs=[]",
            "START name=P attrs=[]",
            "CHAR text=\"A\"",
            "END name=P",
            "START name=P attrs=[]",
            "CHAR text=\"B\"",
            "END name=P",
            "END name=BODY",
            "END name=HTML",
            "END-DOCUMENT",
        ]
    );
}

#[test]
fn table_cell_gets_table_and_row() {
    let lines = balanced_lines("<td>x</td>");
    let start = lines
        .iter()
        .position(|line| line == "START name=TABLE attrs=[]")
        .expect("TABLE must be synthesized");
    assert_eq!(
        &lines[start..start + 7],
        [
            "START name=TABLE attrs=[]",
            "START name=TR attrs=[]",
            "START name=TD attrs=[]",
            "CHAR text=\"x\"",
            "END name=TD",
            "END name=TR",
            "END name=TABLE",
        ]
    );

    let (events, _) = balanced_events(
        InputSource::from_text("<td>x</td>"),
        ScannerConfig::default(),
        BalancerConfig::fragment(),
    );
    let lines: Vec<String> = events.iter().map(Event::to_test_string).collect();
    assert_eq!(
        lines,
        vec![
            "START-DOCUMENT",
            "START name=TD attrs=[]",
            "CHAR text=\"x\"",
            "END name=TD",
            "END-DOCUMENT",
        ]
    );
}

#[test]
fn crossed_inline_elements_are_repaired() {
    let (events, _) = balanced_events(
        InputSource::from_text("<b>bold <i>both</b> italic</i>"),
        ScannerConfig::default(),
        BalancerConfig::fragment(),
    );
    assert_eq!(
        serialize(&events),
        "<B>bold <I>both</I></B><I> italic</I>"
    );
    let reopened = events
        .iter()
        .filter(|event| event.is_synthesized())
        .count();
    assert_eq!(reopened, 2, "one synthesized end and one reopened start");
}

#[test]
fn bare_text_gets_a_skeleton() {
    let (events, _) = balanced_events(
        InputSource::from_text("Hello"),
        ScannerConfig::default(),
        BalancerConfig::default(),
    );
    assert_eq!(
        events.iter().map(Event::to_test_string).collect::<Vec<_>>(),
        vec![
            "START-DOCUMENT",
            "START name=HTML attrs=[]",
            "START name=BODY attrs=[]",
            "CHAR text=\"Hello\"",
            "END name=BODY",
            "END name=HTML",
            "END-DOCUMENT",
        ]
    );
    assert!(
        events
            .iter()
            .filter(|event| !matches!(event, Event::Characters(_)))
            .filter(|event| !matches!(event, Event::StartDocument | Event::EndDocument))
            .all(Event::is_synthesized)
    );
}

#[test]
fn script_body_stays_one_text_event() {
    let lines = balanced_lines("<script>a < b</script>");
    let start = lines
        .iter()
        .position(|line| line == "START name=SCRIPT attrs=[]")
        .expect("SCRIPT must open");
    assert_eq!(lines[start + 1], "CHAR text=\"a < b\"");
    assert_eq!(lines[start + 2], "END name=SCRIPT");
}

#[test]
fn meta_charset_pivot_decodes_the_rest_once() {
    let html = b"<html><head><meta charset=\"utf-8\"><title>caf\xC3\xA9</title></head>\
                 <body><p>\xE2\x82\xAC 5</p></body></html>";
    let events = parse_bytes(html).expect("in-memory source");
    assert_well_formed(&events);
    let lines: Vec<String> = events.iter().map(Event::to_test_string).collect();
    assert_eq!(
        lines,
        vec![
            "START-DOCUMENT",
            "START name=HTML attrs=[]",
            "START name=HEAD attrs=[]",
            "EMPTY name=META attrs=[charset=\"utf-8\"]",
            "START name=TITLE attrs=[]",
            "CHAR text=\"caf\u{E9}\"",
            "END name=TITLE",
            "END name=HEAD",
            "START name=BODY attrs=[]",
            "START name=P attrs=[]",
            "CHAR text=\"\u{20AC} 5\"",
            "END name=P",
            "END name=BODY",
            "END name=HTML",
            "END-DOCUMENT",
        ]
    );
}

#[test]
fn without_a_declaration_bytes_use_the_default_charset() {
    let events = parse_bytes(b"<p>caf\xE9</p>").expect("in-memory source");
    assert!(events.contains(&Event::Characters("caf\u{E9}".to_string())));

    let (events, _) = balanced_events(
        InputSource::from_bytes(b"<p>caf\xC3\xA9</p>".to_vec()),
        ScannerConfig {
            default_encoding: Charset::Utf8,
            ..ScannerConfig::default()
        },
        BalancerConfig::default(),
    );
    assert!(events.contains(&Event::Characters("caf\u{E9}".to_string())));
}

#[test]
fn trailing_content_stays_in_the_body() {
    let lines = balanced_lines("<p>x</p></body></html>tail");
    assert_eq!(
        &lines[lines.len() - 4..],
        ["CHAR text=\"tail\"", "END name=BODY", "END name=HTML", "END-DOCUMENT"]
    );
}

#[test]
fn evaluated_source_flows_through_the_balancer() {
    let mut session = ParseSession::new(
        ScannerConfig::default(),
        BalancerConfig::default(),
        EventRecorder::coalescing(),
    );
    let scanner = session.scanner_mut();
    scanner.set_source(InputSource::from_text("<p>before<script>w()</script>after</p>"));
    while scanner.scan_document(false).expect("in-memory source") {
        let script_done = scanner
            .handler()
            .sink()
            .events()
            .last()
            .is_some_and(|event| matches!(event, Event::EndElement { name, .. } if name == "SCRIPT"));
        if script_done {
            scanner
                .evaluate_input_source(InputSource::from_text("<b>written</b>"))
                .expect("in-memory source");
        }
    }
    let events = session.into_sink().into_events();
    assert_well_formed(&events);
    let lines: Vec<String> = events.iter().map(Event::to_test_string).collect();
    let script_end = lines
        .iter()
        .position(|line| line == "END name=SCRIPT")
        .expect("script closes");
    assert_eq!(
        &lines[script_end + 1..script_end + 5],
        [
            "START name=B attrs=[]",
            "CHAR text=\"written\"",
            "END name=B",
            "CHAR text=\"after\"",
        ]
    );
}
