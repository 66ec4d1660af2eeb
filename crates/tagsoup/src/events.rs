//! Document event interface shared by the scanner, the balancer and callers.

use std::fmt::Write;

/// One attribute in encounter order. Attributes written without a value carry
/// an empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Per-event augmentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventInfo {
    /// Set on every element event invented by structural repair.
    pub synthesized: bool,
}

impl EventInfo {
    pub const PARSED: EventInfo = EventInfo { synthesized: false };
    pub const SYNTHESIZED: EventInfo = EventInfo { synthesized: true };
}

/// Push-based receiver of document events.
pub trait EventSink {
    fn start_document(&mut self) {}

    fn end_document(&mut self) {}

    fn doctype(&mut self, _root: &str, _public_id: Option<&str>, _system_id: Option<&str>) {}

    fn start_element(&mut self, name: &str, attrs: &[Attribute], info: EventInfo);

    /// An element that has no content. Defaults to a start/end pair.
    fn empty_element(&mut self, name: &str, attrs: &[Attribute], info: EventInfo) {
        self.start_element(name, attrs, info);
        self.end_element(name, info);
    }

    fn end_element(&mut self, name: &str, info: EventInfo);

    fn characters(&mut self, text: &str);

    fn comment(&mut self, _text: &str) {}

    fn processing_instruction(&mut self, _target: &str, _data: &str) {}

    fn start_general_entity(&mut self, _name: &str) {}

    fn end_general_entity(&mut self, _name: &str) {}

    fn start_cdata(&mut self) {}

    fn end_cdata(&mut self) {}
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn start_document(&mut self) {
        (**self).start_document();
    }

    fn end_document(&mut self) {
        (**self).end_document();
    }

    fn doctype(&mut self, root: &str, public_id: Option<&str>, system_id: Option<&str>) {
        (**self).doctype(root, public_id, system_id);
    }

    fn start_element(&mut self, name: &str, attrs: &[Attribute], info: EventInfo) {
        (**self).start_element(name, attrs, info);
    }

    fn empty_element(&mut self, name: &str, attrs: &[Attribute], info: EventInfo) {
        (**self).empty_element(name, attrs, info);
    }

    fn end_element(&mut self, name: &str, info: EventInfo) {
        (**self).end_element(name, info);
    }

    fn characters(&mut self, text: &str) {
        (**self).characters(text);
    }

    fn comment(&mut self, text: &str) {
        (**self).comment(text);
    }

    fn processing_instruction(&mut self, target: &str, data: &str) {
        (**self).processing_instruction(target, data);
    }

    fn start_general_entity(&mut self, name: &str) {
        (**self).start_general_entity(name);
    }

    fn end_general_entity(&mut self, name: &str) {
        (**self).end_general_entity(name);
    }

    fn start_cdata(&mut self) {
        (**self).start_cdata();
    }

    fn end_cdata(&mut self) {
        (**self).end_cdata();
    }
}

/// Owned form of an event, as collected by [`EventRecorder`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    StartDocument,
    EndDocument,
    Doctype {
        root: String,
        public_id: Option<String>,
        system_id: Option<String>,
    },
    StartElement {
        name: String,
        attrs: Vec<Attribute>,
        info: EventInfo,
    },
    EmptyElement {
        name: String,
        attrs: Vec<Attribute>,
        info: EventInfo,
    },
    EndElement {
        name: String,
        info: EventInfo,
    },
    Characters(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
    StartGeneralEntity(String),
    EndGeneralEntity(String),
    StartCdata,
    EndCdata,
}

impl Event {
    /// Deterministic one-line form used by snapshots. Synthesis markers are
    /// left out so repaired and already-valid input compare equal.
    pub fn to_test_string(&self) -> String {
        match self {
            Event::StartDocument => "START-DOCUMENT".to_string(),
            Event::EndDocument => "END-DOCUMENT".to_string(),
            Event::Doctype {
                root,
                public_id,
                system_id,
            } => format!(
                "DOCTYPE root={root} public_id={} system_id={}",
                quoted_or_null(public_id.as_deref()),
                quoted_or_null(system_id.as_deref())
            ),
            Event::StartElement { name, attrs, .. } => {
                format!("START name={name} attrs=[{}]", format_attrs(attrs))
            }
            Event::EmptyElement { name, attrs, .. } => {
                format!("EMPTY name={name} attrs=[{}]", format_attrs(attrs))
            }
            Event::EndElement { name, .. } => format!("END name={name}"),
            Event::Characters(text) => format!("CHAR text=\"{}\"", escape_text(text)),
            Event::Comment(text) => format!("COMMENT text=\"{}\"", escape_text(text)),
            Event::ProcessingInstruction { target, data } => {
                format!("PI target={target} data=\"{}\"", escape_text(data))
            }
            Event::StartGeneralEntity(name) => format!("ENTITY-START name={name}"),
            Event::EndGeneralEntity(name) => format!("ENTITY-END name={name}"),
            Event::StartCdata => "CDATA-START".to_string(),
            Event::EndCdata => "CDATA-END".to_string(),
        }
    }

    pub fn is_synthesized(&self) -> bool {
        match self {
            Event::StartElement { info, .. }
            | Event::EmptyElement { info, .. }
            | Event::EndElement { info, .. } => info.synthesized,
            _ => false,
        }
    }
}

fn format_attrs(attrs: &[Attribute]) -> String {
    let mut out = String::new();
    for (i, attr) in attrs.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(&mut out, "{}=\"{}\"", attr.name, escape_text(&attr.value));
    }
    out
}

fn quoted_or_null(value: Option<&str>) -> String {
    value.map_or_else(|| "null".to_string(), |s| format!("\"{}\"", escape_text(s)))
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ch if ch < ' ' || ch == '\u{7f}' => {
                let _ = write!(&mut out, "\\u{{{:02X}}}", ch as u32);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Sink that keeps every event it receives. Adjacent character events are
/// merged when `coalesce_text` is set.
#[derive(Clone, Debug, Default)]
pub struct EventRecorder {
    events: Vec<Event>,
    coalesce_text: bool,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coalescing() -> Self {
        Self {
            events: Vec::new(),
            coalesce_text: true,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn test_lines(&self) -> Vec<String> {
        self.events.iter().map(Event::to_test_string).collect()
    }

    fn push(&mut self, event: Event) {
        self.events.push(event);
    }
}

impl EventSink for EventRecorder {
    fn start_document(&mut self) {
        self.push(Event::StartDocument);
    }

    fn end_document(&mut self) {
        self.push(Event::EndDocument);
    }

    fn doctype(&mut self, root: &str, public_id: Option<&str>, system_id: Option<&str>) {
        self.push(Event::Doctype {
            root: root.to_string(),
            public_id: public_id.map(str::to_string),
            system_id: system_id.map(str::to_string),
        });
    }

    fn start_element(&mut self, name: &str, attrs: &[Attribute], info: EventInfo) {
        self.push(Event::StartElement {
            name: name.to_string(),
            attrs: attrs.to_vec(),
            info,
        });
    }

    fn empty_element(&mut self, name: &str, attrs: &[Attribute], info: EventInfo) {
        self.push(Event::EmptyElement {
            name: name.to_string(),
            attrs: attrs.to_vec(),
            info,
        });
    }

    fn end_element(&mut self, name: &str, info: EventInfo) {
        self.push(Event::EndElement {
            name: name.to_string(),
            info,
        });
    }

    fn characters(&mut self, text: &str) {
        if self.coalesce_text
            && let Some(Event::Characters(existing)) = self.events.last_mut()
        {
            existing.push_str(text);
            return;
        }
        self.push(Event::Characters(text.to_string()));
    }

    fn comment(&mut self, text: &str) {
        self.push(Event::Comment(text.to_string()));
    }

    fn processing_instruction(&mut self, target: &str, data: &str) {
        self.push(Event::ProcessingInstruction {
            target: target.to_string(),
            data: data.to_string(),
        });
    }

    fn start_general_entity(&mut self, name: &str) {
        self.push(Event::StartGeneralEntity(name.to_string()));
    }

    fn end_general_entity(&mut self, name: &str) {
        self.push(Event::EndGeneralEntity(name.to_string()));
    }

    fn start_cdata(&mut self) {
        self.push(Event::StartCdata);
    }

    fn end_cdata(&mut self) {
        self.push(Event::EndCdata);
    }
}
