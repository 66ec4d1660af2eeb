//! Tag balancer.
//!
//! Sits between the scanner and a consumer and repairs the event stream so
//! that every start has a matching end, elements nest according to the
//! descriptor table, and a full document always has an HTML root with HEAD
//! and BODY where they belong. Repairs are emitted as synthesized events.

mod inline;
mod stack;

use crate::config::BalancerConfig;
use crate::diagnostics::{DiagnosticSink, MessageKey, Reporter};
use crate::elements::{self, ElementDescriptor};
use crate::events::{Attribute, EventInfo, EventSink};
use inline::ReopenList;
use stack::{OpenElement, OpenElementsStack};

/// Event sink that balances tags before forwarding them to `S`.
pub struct TagBalancer<S> {
    config: BalancerConfig,
    sink: S,
    reporter: Reporter,
    stack: OpenElementsStack,
    seen_root: bool,
    seen_head: bool,
    seen_body: bool,
    /// `</body>` or `</html>` arrived and is held until the document ends.
    deferred_body: bool,
    deferred_html: bool,
    /// The body or root ended with `ignore_outside_content` set.
    outside_content: bool,
}

impl<S: EventSink> TagBalancer<S> {
    pub fn new(config: BalancerConfig, sink: S) -> Self {
        let reporter = Reporter::new(config.report_errors);
        Self {
            config,
            sink,
            reporter,
            stack: OpenElementsStack::default(),
            seen_root: false,
            seen_head: false,
            seen_body: false,
            deferred_body: false,
            deferred_html: false,
            outside_content: false,
        }
    }

    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }

    pub fn set_diagnostic_sink(&mut self, sink: Box<dyn DiagnosticSink>) {
        self.reporter.set_sink(sink);
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Number of currently open elements.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn reset(&mut self) {
        self.stack.clear();
        self.seen_root = false;
        self.seen_head = false;
        self.seen_body = false;
        self.deferred_body = false;
        self.deferred_html = false;
        self.outside_content = false;
    }

    fn start(&mut self, canonical: &str, name: &str, attrs: &[Attribute], info: EventInfo) {
        if self.outside_content {
            self.reporter.report(MessageKey::ContentAfterRoot, &[name]);
            return;
        }
        if self.is_duplicate(canonical) {
            self.reporter.report(MessageKey::DuplicateElement, &[name]);
            return;
        }
        let descriptor = elements::lookup(canonical);

        if !self.config.fragment {
            self.ensure_parent(canonical, descriptor);
        }

        let mut reopen = ReopenList::default();
        if descriptor.is_block_level() {
            while let Some(entry) = self.stack.pop_if(|e| e.descriptor().is_inline()) {
                self.sink.end_element(entry.name(), EventInfo::SYNTHESIZED);
                reopen.cache(entry);
            }
        }

        self.close_for_start(canonical, descriptor);

        if descriptor.is_empty() {
            self.sink.empty_element(name, attrs, info);
        } else {
            let saved = if descriptor.is_inline() {
                attrs.to_vec()
            } else {
                Vec::new()
            };
            self.stack
                .push(OpenElement::new(canonical, name, descriptor, saved));
            match canonical {
                "HTML" => self.seen_root = true,
                "HEAD" => self.seen_head = true,
                "BODY" => self.seen_body = true,
                _ => {}
            }
            self.sink.start_element(name, attrs, info);
        }

        self.reopen(reopen);
    }

    fn is_duplicate(&self, canonical: &str) -> bool {
        match canonical {
            "HTML" => self.seen_root,
            "HEAD" => self.seen_head || self.seen_body,
            "BODY" => self.seen_body,
            _ => false,
        }
    }

    /// Open the first natural parent when none is in reach. Before the root
    /// element this always happens, so every chain ends at HTML.
    fn ensure_parent(&mut self, canonical: &str, descriptor: &'static ElementDescriptor) {
        let Some(parent) = descriptor.first_parent() else {
            return;
        };
        if self.seen_root {
            if parent == "HEAD" && (self.seen_head || self.seen_body) {
                return;
            }
            if self.stack.has_natural_parent(descriptor) || self.is_duplicate(parent) {
                return;
            }
        }
        self.reporter
            .report(MessageKey::MissingParent, &[canonical, parent]);
        log::debug!(target: "html.balancer", "synthesizing {parent} for {canonical}");
        self.synthesize_start(parent);
    }

    fn synthesize_start(&mut self, canonical: &str) {
        let name = self.config.element_case.apply(canonical);
        self.start(canonical, &name, &[], EventInfo::SYNTHESIZED);
    }

    /// End open elements named in the new element's closes-set. The scan
    /// stops at a container or at a block that is not closed.
    fn close_for_start(&mut self, canonical: &str, descriptor: &ElementDescriptor) {
        if descriptor.closes.is_empty() {
            return;
        }
        let mut index = self.stack.len();
        while index > 0 {
            index -= 1;
            let Some(entry) = self.stack.get(index) else {
                break;
            };
            if descriptor.closes(entry.canonical()) {
                self.pop_implicitly(index, canonical);
                continue;
            }
            let open = entry.descriptor();
            if open.is_container() || open.is_block() {
                break;
            }
        }
    }

    /// Pop every element at `index` and above.
    fn pop_implicitly(&mut self, index: usize, cause: &str) {
        while self.stack.len() > index {
            let Some(entry) = self.stack.pop() else {
                break;
            };
            self.reporter
                .report(MessageKey::ImplicitlyClosed, &[entry.canonical(), cause]);
            log::debug!(target: "html.balancer", "{} ended by {cause}", entry.canonical());
            self.sink.end_element(entry.name(), EventInfo::SYNTHESIZED);
        }
    }

    fn reopen(&mut self, reopen: ReopenList) {
        for entry in reopen.into_outer_to_inner() {
            log::debug!(target: "html.balancer", "reopening {}", entry.canonical());
            self.sink
                .start_element(entry.name(), entry.attrs(), EventInfo::SYNTHESIZED);
            self.stack.push(entry);
        }
    }

    fn end(&mut self, canonical: &str, name: &str, info: EventInfo) {
        let closing_root = canonical == "HTML" && self.stack.contains("HTML");
        if self.outside_content && !closing_root {
            self.reporter.report(MessageKey::ContentAfterRoot, &[name]);
            return;
        }
        let document_level = matches!(canonical, "BODY" | "HTML");
        if document_level && !self.config.ignore_outside_content {
            if !self.stack.contains(canonical) {
                self.reporter.report(MessageKey::UnmatchedEndTag, &[name]);
                return;
            }
            log::debug!(target: "html.balancer", "deferring </{canonical}> to end of document");
            if canonical == "BODY" {
                self.deferred_body = true;
            } else {
                self.deferred_html = true;
            }
            return;
        }

        let descriptor = elements::lookup(canonical);
        let Some(depth) = self.stack.end_tag_depth(canonical, descriptor) else {
            self.reporter.report(MessageKey::UnmatchedEndTag, &[name]);
            return;
        };

        let mut reopen = ReopenList::default();
        for remaining in (0..depth).rev() {
            let Some(entry) = self.stack.pop() else {
                break;
            };
            if remaining == 0 {
                self.sink.end_element(entry.name(), info);
                break;
            }
            self.reporter
                .report(MessageKey::ImplicitlyClosed, &[entry.canonical(), canonical]);
            self.sink.end_element(entry.name(), EventInfo::SYNTHESIZED);
            if descriptor.is_inline() && entry.descriptor().is_inline() {
                reopen.cache(entry);
            }
        }

        if document_level {
            self.outside_content = true;
        }
        self.reopen(reopen);
    }

    /// Put the document in a state where content can appear. Returns `false`
    /// when the content is dropped.
    fn prepare_content(&mut self, whitespace: bool) -> bool {
        if self.outside_content {
            if !whitespace {
                self.reporter.report(MessageKey::ContentAfterRoot, &["#text"]);
            }
            return false;
        }
        if self.config.fragment {
            return true;
        }
        if !self.seen_root {
            if whitespace {
                return false;
            }
            self.synthesize_start("BODY");
            return true;
        }
        if whitespace {
            return true;
        }
        if let Some(head) = self.stack.pop_if(|e| e.canonical() == "HEAD") {
            self.sink.end_element(head.name(), EventInfo::SYNTHESIZED);
        }
        let in_root = self
            .stack
            .current()
            .is_some_and(|e| e.canonical() == "HTML");
        if in_root && !self.seen_body {
            self.synthesize_start("BODY");
        }
        true
    }

    fn end_document_elements(&mut self) {
        if !self.config.fragment && !self.seen_root {
            let name = self.config.element_case.apply("HTML");
            self.sink.start_element(&name, &[], EventInfo::SYNTHESIZED);
            self.sink.end_element(&name, EventInfo::SYNTHESIZED);
            return;
        }
        while let Some(entry) = self.stack.pop() {
            let deferred = match entry.canonical() {
                "BODY" => self.deferred_body,
                "HTML" => self.deferred_html,
                _ => false,
            };
            if deferred {
                self.sink.end_element(entry.name(), EventInfo::PARSED);
            } else {
                self.reporter
                    .report(MessageKey::UnclosedElement, &[entry.canonical()]);
                self.sink.end_element(entry.name(), EventInfo::SYNTHESIZED);
            }
        }
    }
}

impl<S: EventSink> EventSink for TagBalancer<S> {
    fn start_document(&mut self) {
        self.reset();
        self.sink.start_document();
    }

    fn end_document(&mut self) {
        self.end_document_elements();
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "html.balancer", "max open depth {}", self.stack.max_depth());
        self.sink.end_document();
    }

    fn doctype(&mut self, root: &str, public_id: Option<&str>, system_id: Option<&str>) {
        self.sink.doctype(root, public_id, system_id);
    }

    fn start_element(&mut self, name: &str, attrs: &[Attribute], info: EventInfo) {
        let canonical = name.to_ascii_uppercase();
        self.start(&canonical, name, attrs, info);
    }

    fn empty_element(&mut self, name: &str, attrs: &[Attribute], info: EventInfo) {
        let canonical = name.to_ascii_uppercase();
        self.start(&canonical, name, attrs, info);
        if !elements::lookup(&canonical).is_empty() {
            self.end(&canonical, name, info);
        }
    }

    fn end_element(&mut self, name: &str, info: EventInfo) {
        let canonical = name.to_ascii_uppercase();
        self.end(&canonical, name, info);
    }

    fn characters(&mut self, text: &str) {
        let whitespace = text.chars().all(char::is_whitespace);
        if self.prepare_content(whitespace) {
            self.sink.characters(text);
        }
    }

    fn comment(&mut self, text: &str) {
        self.sink.comment(text);
    }

    fn processing_instruction(&mut self, target: &str, data: &str) {
        self.sink.processing_instruction(target, data);
    }

    fn start_general_entity(&mut self, name: &str) {
        if self.prepare_content(false) {
            self.sink.start_general_entity(name);
        }
    }

    fn end_general_entity(&mut self, name: &str) {
        if !self.outside_content {
            self.sink.end_general_entity(name);
        }
    }

    fn start_cdata(&mut self) {
        if self.prepare_content(false) {
            self.sink.start_cdata();
        }
    }

    fn end_cdata(&mut self) {
        if !self.outside_content {
            self.sink.end_cdata();
        }
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for TagBalancer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagBalancer")
            .field("config", &self.config)
            .field("stack", &self.stack)
            .field("sink", &self.sink)
            .finish_non_exhaustive()
    }
}
