//! Input sources and the stack of sources the scanner reads from.

use std::fmt;
use std::io::{self, Read};

use tools::{Charset, Decoder, sniff_bom};

use super::playback::Playback;

const READ_CHUNK: usize = 8 * 1024;
const COMPACT_THRESHOLD: usize = 64 * 1024;
const BOM_PROBE_LEN: usize = 3;

/// A byte or character stream handed to the scanner.
pub struct InputSource {
    input: SourceInput,
    encoding: Option<Charset>,
    system_id: Option<String>,
}

enum SourceInput {
    Bytes(Box<dyn Read>),
    Text(String),
}

impl InputSource {
    /// Bytes decoded by BOM, declared encoding or the configured default.
    pub fn from_reader(reader: impl Read + 'static) -> Self {
        Self {
            input: SourceInput::Bytes(Box::new(reader)),
            encoding: None,
            system_id: None,
        }
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::from_reader(io::Cursor::new(bytes.into()))
    }

    /// Already-decoded characters; never subject to an encoding pivot.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            input: SourceInput::Text(text.into()),
            encoding: None,
            system_id: None,
        }
    }

    /// Caller-declared encoding. Disables `<meta>` charset detection.
    pub fn with_encoding(mut self, charset: Charset) -> Self {
        self.encoding = Some(charset);
        self
    }

    pub fn with_system_id(mut self, system_id: impl Into<String>) -> Self {
        self.system_id = Some(system_id.into());
        self
    }

    pub fn encoding(&self) -> Option<Charset> {
        self.encoding
    }

    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }
}

impl fmt::Debug for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.input {
            SourceInput::Bytes(_) => "bytes",
            SourceInput::Text(_) => "text",
        };
        f.debug_struct("InputSource")
            .field("kind", &kind)
            .field("encoding", &self.encoding)
            .field("system_id", &self.system_id)
            .finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EntityKind {
    /// The document itself; its end is the end of the document.
    Document,
    /// Read before the rest of the source beneath it, popped at its end.
    Pushed,
    /// Scanned to its end in isolation.
    Evaluated,
}

/// One open source with its decoded text window.
pub(crate) struct Entity {
    pub(crate) kind: EntityKind,
    reader: Option<Box<dyn Read>>,
    decoder: Option<Decoder>,
    declared: Option<Charset>,
    default_encoding: Charset,
    probe: Option<Vec<u8>>,
    playback: Option<Playback>,
    text: String,
    pos: usize,
    pending_cr: bool,
    eof: bool,
    system_id: Option<String>,
}

impl Entity {
    /// `record` asks for raw-byte recording; it only takes effect for byte
    /// sources with no declared encoding and no BOM.
    pub(crate) fn open(
        source: InputSource,
        kind: EntityKind,
        default_encoding: Charset,
        record: bool,
    ) -> Self {
        let InputSource {
            input,
            encoding,
            system_id,
        } = source;
        match input {
            SourceInput::Bytes(reader) => Self {
                kind,
                reader: Some(reader),
                decoder: None,
                declared: encoding,
                default_encoding,
                probe: Some(Vec::with_capacity(BOM_PROBE_LEN)),
                playback: (record && encoding.is_none()).then(Playback::new),
                text: String::new(),
                pos: 0,
                pending_cr: false,
                eof: false,
                system_id,
            },
            SourceInput::Text(text) => {
                let mut entity = Self {
                    kind,
                    reader: None,
                    decoder: None,
                    declared: None,
                    default_encoding,
                    probe: None,
                    playback: None,
                    text: String::with_capacity(text.len()),
                    pos: 0,
                    pending_cr: false,
                    eof: true,
                    system_id,
                };
                entity.append(&text);
                entity
            }
        }
    }

    pub(crate) fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    pub(crate) fn charset(&self) -> Option<Charset> {
        self.decoder.as_ref().map(Decoder::charset)
    }

    pub(crate) fn is_recording(&self) -> bool {
        self.playback.is_some()
    }

    /// Stop recording and release the recorded bytes.
    pub(crate) fn commit(&mut self) {
        if let Some(playback) = self.playback.take() {
            log::debug!(target: "html.scanner", "playback committed after {} bytes", playback.len());
        }
    }

    /// Re-decode everything read so far under `charset` and restart reading
    /// from the first character. Recording ends.
    pub(crate) fn replay_with(&mut self, charset: Charset) {
        let Some(playback) = self.playback.take() else {
            return;
        };
        let bytes = playback.into_bytes();
        self.decoder = Some(charset.new_decoder());
        self.text.clear();
        self.pos = 0;
        self.pending_cr = false;
        self.decode(&bytes);
        if self.eof {
            self.finish_decoder();
        }
    }

    pub(crate) fn rest(&self) -> &str {
        &self.text[self.pos..]
    }

    pub(crate) fn advance(&mut self, bytes: usize) {
        debug_assert!(self.text.is_char_boundary(self.pos + bytes));
        self.pos += bytes;
    }

    fn has_buffered(&self) -> bool {
        self.pos < self.text.len()
    }

    /// Read and decode the next chunk. Returns `false` once the source is
    /// exhausted and everything has been decoded.
    pub(crate) fn load(&mut self) -> io::Result<bool> {
        if self.eof {
            return Ok(false);
        }
        self.compact();
        let Some(reader) = self.reader.as_mut() else {
            self.eof = true;
            return Ok(false);
        };
        let mut buf = [0u8; READ_CHUNK];
        let n = loop {
            match reader.read(&mut buf) {
                Ok(n) => break n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        };
        if n == 0 {
            self.eof = true;
            self.reader = None;
            if self.probe.is_some() {
                self.resolve_probe(&[]);
            }
            self.finish_decoder();
            return Ok(true);
        }
        self.feed(&buf[..n]);
        Ok(true)
    }

    fn feed(&mut self, bytes: &[u8]) {
        if self.probe.is_some() {
            self.resolve_probe(bytes);
            return;
        }
        if let Some(playback) = self.playback.as_mut() {
            playback.record(bytes);
        }
        self.decode(bytes);
    }

    /// Collect the first bytes until a BOM can be recognized, then pick the
    /// initial decoder.
    fn resolve_probe(&mut self, bytes: &[u8]) {
        let Some(mut head) = self.probe.take() else {
            return;
        };
        head.extend_from_slice(bytes);
        if head.len() < BOM_PROBE_LEN && !self.eof {
            self.probe = Some(head);
            return;
        }
        let (charset, skip) = match sniff_bom(&head) {
            Some((charset, len)) => {
                self.playback = None;
                (charset, len)
            }
            None => (self.declared.unwrap_or(self.default_encoding), 0),
        };
        log::debug!(target: "html.scanner", "initial decoder {}", charset.name());
        self.decoder = Some(charset.new_decoder());
        if let Some(playback) = self.playback.as_mut() {
            playback.record(&head);
        }
        self.decode(&head[skip..]);
    }

    fn decode(&mut self, bytes: &[u8]) {
        let Some(decoder) = self.decoder.as_mut() else {
            return;
        };
        let mut decoded = String::new();
        decoder.decode(bytes, &mut decoded);
        self.append(&decoded);
    }

    fn finish_decoder(&mut self) {
        let Some(decoder) = self.decoder.as_mut() else {
            return;
        };
        let mut decoded = String::new();
        decoder.finish(&mut decoded);
        self.append(&decoded);
    }

    /// Append decoded text with CR LF and lone CR folded to LF.
    fn append(&mut self, decoded: &str) {
        let mut rest = decoded;
        if self.pending_cr {
            self.pending_cr = false;
            if let Some(stripped) = rest.strip_prefix('\n') {
                rest = stripped;
            }
        }
        while let Some(cr) = memchr::memchr(b'\r', rest.as_bytes()) {
            self.text.push_str(&rest[..cr]);
            self.text.push('\n');
            rest = &rest[cr + 1..];
            if rest.is_empty() {
                self.pending_cr = true;
            } else if let Some(stripped) = rest.strip_prefix('\n') {
                rest = stripped;
            }
        }
        self.text.push_str(rest);
    }

    fn compact(&mut self) {
        if self.pos >= COMPACT_THRESHOLD {
            self.text.drain(..self.pos);
            self.pos = 0;
        }
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("kind", &self.kind)
            .field("charset", &self.charset())
            .field("recording", &self.is_recording())
            .field("buffered", &(self.text.len() - self.pos))
            .field("eof", &self.eof)
            .finish()
    }
}

/// LIFO stack of open sources. Pushed sources are popped transparently when
/// they run dry; the document and evaluated sources report their end instead.
#[derive(Debug, Default)]
pub(crate) struct SourceStack {
    entities: Vec<Entity>,
}

impl SourceStack {
    pub(crate) fn push(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub(crate) fn pop(&mut self) -> Option<Entity> {
        self.entities.pop()
    }

    pub(crate) fn clear(&mut self) {
        self.entities.clear();
    }

    pub(crate) fn depth(&self) -> usize {
        self.entities.len()
    }

    pub(crate) fn top(&self) -> Option<&Entity> {
        self.entities.last()
    }

    pub(crate) fn top_mut(&mut self) -> Option<&mut Entity> {
        self.entities.last_mut()
    }

    pub(crate) fn root(&self) -> Option<&Entity> {
        self.entities.first()
    }

    pub(crate) fn root_mut(&mut self) -> Option<&mut Entity> {
        self.entities.first_mut()
    }

    pub(crate) fn top_kind(&self) -> Option<EntityKind> {
        self.top().map(|entity| entity.kind)
    }

    /// Make at least one character available. Returns `false` at the end of
    /// the current document or evaluated source.
    pub(crate) fn fill(&mut self) -> io::Result<bool> {
        loop {
            let Some(top) = self.entities.last_mut() else {
                return Ok(false);
            };
            if top.has_buffered() {
                return Ok(true);
            }
            if top.load()? {
                continue;
            }
            if top.kind == EntityKind::Pushed {
                self.entities.pop();
                continue;
            }
            return Ok(false);
        }
    }

    /// Buffer at least `bytes` bytes of the current source, or all of it.
    pub(crate) fn ensure(&mut self, bytes: usize) -> io::Result<()> {
        if !self.fill()? {
            return Ok(());
        }
        if let Some(top) = self.entities.last_mut() {
            while top.rest().len() < bytes && top.load()? {}
        }
        Ok(())
    }

    /// Buffer the current source until `needle` (ASCII, case-insensitive)
    /// appears or the source ends.
    pub(crate) fn lookahead_contains(&mut self, needle: &str) -> io::Result<bool> {
        let Some(top) = self.entities.last_mut() else {
            return Ok(false);
        };
        loop {
            if find_ignore_ascii_case(top.rest(), needle).is_some() {
                return Ok(true);
            }
            if !top.load()? {
                return Ok(false);
            }
        }
    }

    pub(crate) fn rest(&self) -> &str {
        self.top().map_or("", Entity::rest)
    }

    pub(crate) fn advance(&mut self, bytes: usize) {
        if let Some(top) = self.entities.last_mut() {
            top.advance(bytes);
        }
    }

    pub(crate) fn peek(&mut self) -> io::Result<Option<char>> {
        if !self.fill()? {
            return Ok(None);
        }
        Ok(self.rest().chars().next())
    }

    pub(crate) fn next_char(&mut self) -> io::Result<Option<char>> {
        let ch = self.peek()?;
        if let Some(ch) = ch {
            self.advance(ch.len_utf8());
        }
        Ok(ch)
    }

    /// Consume `ch` if it is next.
    pub(crate) fn skip_char(&mut self, ch: char) -> io::Result<bool> {
        if self.peek()? == Some(ch) {
            self.advance(ch.len_utf8());
            return Ok(true);
        }
        Ok(false)
    }

    /// Consume `prefix` (ASCII, case-insensitive) if it is next.
    pub(crate) fn skip_prefix_ignore_case(&mut self, prefix: &str) -> io::Result<bool> {
        self.ensure(prefix.len())?;
        let matched = self
            .rest()
            .as_bytes()
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix.as_bytes()));
        if matched {
            self.advance(prefix.len());
        }
        Ok(matched)
    }

    /// Consume whitespace; returns whether any was skipped.
    pub(crate) fn skip_spaces(&mut self) -> io::Result<bool> {
        let mut skipped = false;
        while let Some(ch) = self.peek()? {
            if !ch.is_whitespace() {
                break;
            }
            self.advance(ch.len_utf8());
            skipped = true;
        }
        Ok(skipped)
    }

    /// Consume characters while `accept` holds, appending them to `out`.
    pub(crate) fn take_while(
        &mut self,
        out: &mut String,
        mut accept: impl FnMut(char) -> bool,
    ) -> io::Result<()> {
        while self.fill()? {
            let rest = self.rest();
            let len = rest
                .char_indices()
                .find(|&(_, ch)| !accept(ch))
                .map_or(rest.len(), |(index, _)| index);
            out.push_str(&rest[..len]);
            let exhausted = len == rest.len();
            self.advance(len);
            if !exhausted {
                break;
            }
        }
        Ok(())
    }
}

pub(crate) fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    let (&first, _) = needle.split_first()?;
    let (lower, upper) = (first.to_ascii_lowercase(), first.to_ascii_uppercase());
    let mut from = 0;
    while let Some(rel) = memchr::memchr2(lower, upper, &hay[from..]) {
        let at = from + rel;
        if hay
            .get(at..at + needle.len())
            .is_some_and(|window| window.eq_ignore_ascii_case(needle))
        {
            return Some(at);
        }
        from = at + 1;
    }
    None
}
