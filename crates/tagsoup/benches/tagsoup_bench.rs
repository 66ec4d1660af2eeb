use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use tagsoup::{
    Attribute, BalancerConfig, EventInfo, EventSink, InputSource, ParseSession, Scanner,
    ScannerConfig,
};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;

/// Sink that only counts, so the benches measure scanning and balancing.
#[derive(Default)]
struct CountingSink {
    events: usize,
}

impl EventSink for CountingSink {
    fn start_element(&mut self, _name: &str, _attrs: &[Attribute], _info: EventInfo) {
        self.events += 1;
    }

    fn empty_element(&mut self, _name: &str, _attrs: &[Attribute], _info: EventInfo) {
        self.events += 1;
    }

    fn end_element(&mut self, _name: &str, _info: EventInfo) {
        self.events += 1;
    }

    fn characters(&mut self, _text: &str) {
        self.events += 1;
    }
}

fn make_blocks(blocks: usize) -> String {
    let mut out = String::with_capacity(blocks * 64);
    out.push_str("<html><head><title>bench</title></head><body>");
    for i in 0..blocks {
        out.push_str("<div class=box><span>hello &amp; bye</span><img src=x>");
        if i % 3 == 0 {
            out.push_str("<p>unclosed <b>bold");
        }
        out.push_str("</div>");
    }
    out.push_str("</body></html>");
    out
}

/// Markup soup that exercises the balancer's repairs on every block.
fn make_soup(blocks: usize) -> String {
    let mut out = String::with_capacity(blocks * 48);
    for _ in 0..blocks {
        out.push_str("<td>cell<b>bold <i>both</b> italic</i><li>item<p>para");
    }
    out
}

fn make_rawtext_adversarial(bytes: usize) -> String {
    let mut body = String::with_capacity(bytes + 32);
    body.push_str("<script>");
    while body.len() < bytes {
        body.push_str("</scri");
        body.push('<');
        body.push_str("pt");
    }
    body.push_str("</script>");
    body
}

fn scan_only(input: &str) -> usize {
    let mut scanner = Scanner::new(ScannerConfig::default(), CountingSink::default());
    scanner.set_source(InputSource::from_text(input));
    scanner
        .scan_document(true)
        .expect("in-memory source should scan");
    scanner.into_handler().events
}

fn parse(source: InputSource) -> usize {
    let mut session = ParseSession::new(
        ScannerConfig::default(),
        BalancerConfig::default(),
        CountingSink::default(),
    );
    session.parse(source).expect("in-memory source should parse");
    session.into_sink().events
}

fn bench_scan_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_scan_small", |b| {
        b.iter(|| black_box(scan_only(black_box(&input))));
    });
}

fn bench_scan_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_scan_large", |b| {
        b.iter(|| black_box(scan_only(black_box(&input))));
    });
}

fn bench_parse_large_end_to_end(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_parse_large_end_to_end", |b| {
        b.iter(|| black_box(parse(InputSource::from_text(black_box(input.as_str())))));
    });
}

fn bench_parse_soup(c: &mut Criterion) {
    let input = make_soup(LARGE_BLOCKS);
    c.bench_function("bench_parse_soup", |b| {
        b.iter(|| black_box(parse(InputSource::from_text(black_box(input.as_str())))));
    });
}

fn bench_parse_bytes_with_meta_pivot(c: &mut Criterion) {
    let mut input = String::from("<html><head><meta charset=utf-8></head><body>");
    input.push_str(&make_blocks(LARGE_BLOCKS));
    let bytes = input.into_bytes();
    c.bench_function("bench_parse_bytes_with_meta_pivot", |b| {
        b.iter_batched(
            || bytes.clone(),
            |bytes| black_box(parse(InputSource::from_bytes(bytes))),
            BatchSize::LargeInput,
        );
    });
}

fn bench_scan_rawtext_adversarial(c: &mut Criterion) {
    let input = make_rawtext_adversarial(512 * 1024);
    c.bench_function("bench_scan_rawtext_adversarial", |b| {
        b.iter(|| black_box(scan_only(black_box(&input))));
    });
}

criterion_group!(
    benches,
    bench_scan_small,
    bench_scan_large,
    bench_parse_large_end_to_end,
    bench_parse_soup,
    bench_parse_bytes_with_meta_pivot,
    bench_scan_rawtext_adversarial
);
criterion_main!(benches);
