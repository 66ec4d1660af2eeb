//! Everything that starts with `<`: tags, comments, declarations and
//! processing instructions.

use crate::diagnostics::MessageKey;
use crate::elements;
use crate::entities::decode_entities;
use crate::error::ScanError;
use crate::events::{Attribute, EventInfo, EventSink};
use tools::Charset;

use super::source::{Entity, find_ignore_ascii_case};
use super::states::ScanState;
use super::{RawTextElement, Scanner};

/// Characters allowed in element names after the first one.
pub(super) fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '-' | '.' | ':')
}

fn is_attribute_name_char(ch: char) -> bool {
    !ch.is_whitespace() && !matches!(ch, '=' | '>' | '<' | '/' | '"' | '\'')
}

impl<H: EventSink> Scanner<H> {
    /// Called with the `<` already consumed.
    pub(super) fn scan_markup(&mut self) -> Result<(), ScanError> {
        match self.sources.peek()? {
            Some('!') => {
                self.sources.advance(1);
                self.scan_declaration()?;
                self.set_state(ScanState::Content);
            }
            Some('/') => {
                self.sources.advance(1);
                self.scan_end_tag()?;
                self.set_state(ScanState::Content);
            }
            Some('?') => {
                self.sources.advance(1);
                self.scan_processing_instruction()?;
                self.set_state(ScanState::Content);
            }
            Some(ch) if ch.is_alphabetic() => self.scan_start_tag()?,
            _ => {
                self.text.push('<');
                self.set_state(ScanState::Content);
            }
        }
        Ok(())
    }

    fn scan_start_tag(&mut self) -> Result<(), ScanError> {
        self.flush_text();
        let mut raw = String::new();
        self.sources.take_while(&mut raw, is_name_char)?;
        let canonical = raw.to_ascii_uppercase();
        let name = self.config.element_case.apply(&raw);
        let attrs = self.scan_attributes(&name)?;
        self.element_count += 1;

        if canonical == "META" && self.try_charset_pivot(&attrs) {
            return Ok(());
        }
        self.check_commit_point(&canonical);

        if !self.suppressed() {
            self.handler.start_element(&name, &attrs, EventInfo::PARSED);
        }

        let raw_text = self.config.is_raw_text(&canonical)
            && (canonical != "TITLE" || self.sources.lookahead_contains("</title")?);
        if raw_text {
            self.raw_text = Some(RawTextElement { canonical, name });
            self.set_state(ScanState::RawText);
        } else {
            self.set_state(ScanState::Content);
        }
        Ok(())
    }

    /// Attributes up to the end of the tag. A `<` ends the tag without being
    /// consumed; `/>` is an ordinary close.
    fn scan_attributes(&mut self, element: &str) -> Result<Vec<Attribute>, ScanError> {
        let mut attrs: Vec<Attribute> = Vec::new();
        loop {
            self.sources.skip_spaces()?;
            match self.sources.peek()? {
                None => {
                    self.reporter.report(MessageKey::UnexpectedEof, &[element]);
                    break;
                }
                Some('>') => {
                    self.sources.advance(1);
                    break;
                }
                Some('<') => break,
                Some('/') => {
                    self.sources.advance(1);
                    if self.sources.skip_char('>')? {
                        break;
                    }
                    continue;
                }
                Some(_) => {}
            }

            let mut raw_name = String::new();
            self.sources.take_while(&mut raw_name, is_attribute_name_char)?;
            if raw_name.is_empty() {
                // Stray quote or `=`.
                self.sources.next_char()?;
                continue;
            }

            self.sources.skip_spaces()?;
            let value = if self.sources.skip_char('=')? {
                self.sources.skip_spaces()?;
                self.scan_attribute_value()?
            } else {
                String::new()
            };

            if attrs
                .iter()
                .any(|attr| attr.name.eq_ignore_ascii_case(&raw_name))
            {
                self.reporter
                    .report(MessageKey::DuplicateAttribute, &[element, &raw_name]);
                continue;
            }
            attrs.push(Attribute::new(
                self.config.attribute_case.apply(&raw_name),
                value,
            ));
        }
        Ok(attrs)
    }

    fn scan_attribute_value(&mut self) -> Result<String, ScanError> {
        let mut raw = String::new();
        match self.sources.peek()? {
            Some(quote @ ('"' | '\'')) => {
                self.sources.advance(1);
                self.sources.take_while(&mut raw, |ch| ch != quote)?;
                self.sources.skip_char(quote)?;
            }
            _ => {
                self.sources.take_while(&mut raw, |ch| {
                    !ch.is_whitespace() && ch != '>' && ch != '<'
                })?;
            }
        }
        let normalized = raw.replace(['\t', '\n'], " ");
        Ok(decode_entities(
            &normalized,
            self.config.fix_windows_char_refs,
        ))
    }

    fn scan_end_tag(&mut self) -> Result<(), ScanError> {
        self.flush_text();
        let mut raw = String::new();
        if self.sources.peek()?.is_some_and(char::is_alphabetic) {
            self.sources.take_while(&mut raw, is_name_char)?;
        }
        let mut skipped = String::new();
        self.sources
            .take_while(&mut skipped, |ch| ch != '>' && ch != '<')?;
        self.sources.skip_char('>')?;
        if raw.is_empty() {
            return Ok(());
        }
        if !self.suppressed() {
            let name = self.config.element_case.apply(&raw);
            self.handler.end_element(&name, EventInfo::PARSED);
        }
        Ok(())
    }

    /// `<!` already consumed.
    fn scan_declaration(&mut self) -> Result<(), ScanError> {
        self.flush_text();
        if self.sources.skip_prefix_ignore_case("--")? {
            let text = self.scan_until_terminator("--", "comment")?;
            if !self.suppressed() {
                self.handler.comment(&text);
            }
        } else if self.sources.skip_prefix_ignore_case("[CDATA[")? {
            let text = self.scan_until_terminator("]]", "CDATA")?;
            if self.suppressed() {
                return Ok(());
            }
            if self.config.cdata_sections {
                self.handler.start_cdata();
                if !text.is_empty() {
                    self.handler.characters(&text);
                }
                self.handler.end_cdata();
            } else {
                self.handler.comment(&format!("[CDATA[{text}]]"));
            }
        } else if self.sources.skip_prefix_ignore_case("DOCTYPE")? {
            self.scan_doctype()?;
        } else {
            self.skip_bogus_declaration()?;
        }
        Ok(())
    }

    /// Text up to `suffix>`, with exactly one `suffix` removed. Extra
    /// terminator characters stay in the text.
    fn scan_until_terminator(&mut self, suffix: &str, construct: &str) -> Result<String, ScanError> {
        let mut text = String::new();
        loop {
            self.sources.take_while(&mut text, |ch| ch != '>')?;
            if self.sources.next_char()?.is_none() {
                self.reporter.report(MessageKey::UnexpectedEof, &[construct]);
                return Ok(text);
            }
            if text.ends_with(suffix) {
                text.truncate(text.len() - suffix.len());
                return Ok(text);
            }
            text.push('>');
        }
    }

    fn scan_doctype(&mut self) -> Result<(), ScanError> {
        self.sources.skip_spaces()?;
        let mut root = String::new();
        self.sources
            .take_while(&mut root, |ch| !ch.is_whitespace() && ch != '>')?;
        self.sources.skip_spaces()?;

        let (mut public_id, mut system_id) = (None, None);
        if self.sources.skip_prefix_ignore_case("PUBLIC")? {
            self.sources.skip_spaces()?;
            public_id = self.scan_quoted()?;
            self.sources.skip_spaces()?;
            system_id = self.scan_quoted()?;
        } else if self.sources.skip_prefix_ignore_case("SYSTEM")? {
            self.sources.skip_spaces()?;
            system_id = self.scan_quoted()?;
        }

        let mut rest = String::new();
        self.sources.take_while(&mut rest, |ch| ch != '>')?;
        if !self.sources.skip_char('>')? {
            self.reporter.report(MessageKey::UnexpectedEof, &["DOCTYPE"]);
        }
        if !self.suppressed() {
            let root = self.config.element_case.apply(&root);
            self.handler
                .doctype(&root, public_id.as_deref(), system_id.as_deref());
        }
        Ok(())
    }

    fn scan_quoted(&mut self) -> Result<Option<String>, ScanError> {
        let Some(quote @ ('"' | '\'')) = self.sources.peek()? else {
            return Ok(None);
        };
        self.sources.advance(1);
        let mut value = String::new();
        self.sources
            .take_while(&mut value, |ch| ch != quote && ch != '>')?;
        self.sources.skip_char(quote)?;
        Ok(Some(value))
    }

    /// Unknown `<!...>`: skipped, nested `<`/`>` pairs balanced.
    fn skip_bogus_declaration(&mut self) -> Result<(), ScanError> {
        let mut skipped = String::new();
        let mut depth = 1usize;
        while let Some(ch) = self.sources.next_char()? {
            match ch {
                '<' => depth += 1,
                '>' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            skipped.push(ch);
        }
        self.reporter
            .report(MessageKey::BogusMarkupDeclaration, &[&skipped]);
        Ok(())
    }

    /// `<?` already consumed.
    fn scan_processing_instruction(&mut self) -> Result<(), ScanError> {
        self.flush_text();
        let mut target = String::new();
        self.sources.take_while(&mut target, |ch| {
            !ch.is_whitespace() && ch != '>' && ch != '?'
        })?;
        self.sources.skip_spaces()?;
        let mut data = String::new();
        self.sources.take_while(&mut data, |ch| ch != '>')?;
        if !self.sources.skip_char('>')? {
            self.reporter
                .report(MessageKey::UnexpectedEof, &["processing instruction"]);
        }
        let data = data.strip_suffix('?').unwrap_or(&data).trim_end();
        if !self.suppressed() {
            self.handler.processing_instruction(&target, data);
        }
        Ok(())
    }

    /// Switch the document decoder to the charset a `<meta>` declares.
    /// Returns `true` when the document is being replayed.
    fn try_charset_pivot(&mut self, attrs: &[Attribute]) -> bool {
        if self.config.ignore_specified_charset || self.pivoted || self.sources.depth() != 1 {
            return false;
        }
        if !self.sources.root().is_some_and(Entity::is_recording) {
            return false;
        }
        let Some(label) = meta_charset(attrs) else {
            return false;
        };
        let Some(charset) = Charset::for_label(&label) else {
            self.reporter
                .report(MessageKey::UnsupportedCharset, &[&label]);
            if let Some(root) = self.sources.root_mut() {
                root.commit();
            }
            return false;
        };
        let current = self.current_encoding();
        if current == Some(charset) {
            return false;
        }
        if !charset.is_ascii_compatible() {
            self.reporter
                .report(MessageKey::IncompatibleCharset, &[charset.name()]);
            return false;
        }

        log::debug!(
            target: "html.scanner",
            "switching decoder {} -> {} after {} elements",
            current.map_or("none", Charset::name),
            charset.name(),
            self.element_count
        );
        if let Some(root) = self.sources.root_mut() {
            root.replay_with(charset);
        }
        self.element_threshold = Some(self.element_count);
        self.element_count = 0;
        self.text.clear();
        self.raw_text = None;
        self.pivoted = true;
        self.set_state(ScanState::Content);
        true
    }

    /// BODY, or anything that belongs in the body, ends raw-byte recording.
    fn check_commit_point(&mut self, canonical: &str) {
        let descriptor = elements::lookup(canonical);
        if canonical == "BODY" || descriptor.first_parent() == Some("BODY") {
            if let Some(root) = self.sources.root_mut() {
                root.commit();
            }
        }
    }
}

/// Charset label from `<meta charset>` or a content-type `http-equiv`.
fn meta_charset(attrs: &[Attribute]) -> Option<String> {
    let get = |name: &str| {
        attrs
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
            .map(|attr| attr.value.as_str())
    };
    if let Some(charset) = get("charset").map(str::trim).filter(|c| !c.is_empty()) {
        return Some(charset.to_string());
    }
    if !get("http-equiv")?.trim().eq_ignore_ascii_case("content-type") {
        return None;
    }
    let content = get("content")?;
    let at = find_ignore_ascii_case(content, "charset=")?;
    let label = content[at + "charset=".len()..]
        .trim_start()
        .trim_start_matches(['"', '\'']);
    let end = label
        .find(|ch: char| ch == ';' || ch == '"' || ch == '\'' || ch.is_whitespace())
        .unwrap_or(label.len());
    let label = &label[..end];
    (!label.is_empty()).then(|| label.to_string())
}
