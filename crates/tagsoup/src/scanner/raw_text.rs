//! Content of SPECIAL elements, taken verbatim up to the element's own end
//! tag.

use crate::diagnostics::MessageKey;
use crate::entities::decode_entities;
use crate::error::ScanError;
use crate::events::{EventInfo, EventSink};

use super::markup::is_name_char;
use super::states::ScanState;
use super::{RawTextElement, Scanner};

impl<H: EventSink> Scanner<H> {
    pub(super) fn scan_raw_text(&mut self) -> Result<bool, ScanError> {
        let Some(element) = self.raw_text.take() else {
            self.set_state(ScanState::Content);
            return Ok(true);
        };
        let mut body = String::new();
        let closed = self.take_raw_text(&element, &mut body)?;

        let body = match element.canonical.as_str() {
            "TEXTAREA" | "TITLE" => decode_entities(&body, self.config.fix_windows_char_refs),
            "SCRIPT" | "STYLE" if self.config.strip_comment_delims => {
                strip_comment_delims(&body).to_string()
            }
            _ => body,
        };
        if !body.is_empty() && !self.suppressed() {
            self.handler.characters(&body);
        }

        if !closed {
            if element.canonical != "PLAINTEXT" {
                self.reporter
                    .report(MessageKey::UnexpectedEof, &[&element.name]);
            }
            return Ok(self.end_of_input());
        }
        if !self.suppressed() {
            self.handler.end_element(&element.name, EventInfo::PARSED);
        }
        self.set_state(ScanState::Content);
        Ok(true)
    }

    /// Append the body to `body`. Returns `false` when the input ended first.
    fn take_raw_text(
        &mut self,
        element: &RawTextElement,
        body: &mut String,
    ) -> Result<bool, ScanError> {
        let plaintext = element.canonical == "PLAINTEXT";
        let closer = format!("</{}", element.canonical);
        loop {
            if !self.sources.fill()? {
                return Ok(false);
            }
            let rest = self.sources.rest();
            let index = if plaintext {
                None
            } else {
                memchr::memchr(b'<', rest.as_bytes())
            };
            let Some(index) = index else {
                let len = rest.len();
                body.push_str(rest);
                self.sources.advance(len);
                continue;
            };
            body.push_str(&rest[..index]);
            self.sources.advance(index);

            self.sources.ensure(closer.len() + 1)?;
            let rest = self.sources.rest();
            let is_closer = rest
                .as_bytes()
                .get(..closer.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(closer.as_bytes()))
                && !rest[closer.len()..]
                    .chars()
                    .next()
                    .is_some_and(is_name_char);
            if is_closer {
                self.sources.advance(closer.len());
                let mut skipped = String::new();
                self.sources.take_while(&mut skipped, |ch| ch != '>')?;
                self.sources.skip_char('>')?;
                return Ok(true);
            }
            body.push('<');
            self.sources.advance(1);
        }
    }
}

/// Drop a `<!--` opening and `-->` closing the body of a script or style.
fn strip_comment_delims(body: &str) -> &str {
    let Some(inner) = body.trim_start().strip_prefix("<!--") else {
        return body;
    };
    let inner = inner.trim_end();
    inner.strip_suffix("-->").unwrap_or(inner)
}
