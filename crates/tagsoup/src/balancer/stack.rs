//! Stack of open elements.

use crate::elements::ElementDescriptor;
use crate::events::Attribute;

/// Entry in the stack of open elements.
#[derive(Clone, Debug)]
pub(crate) struct OpenElement {
    canonical: String,
    name: String,
    descriptor: &'static ElementDescriptor,
    /// Start-tag attributes, kept for inline elements so they can be
    /// reopened with them.
    attrs: Vec<Attribute>,
}

impl OpenElement {
    pub(crate) fn new(
        canonical: &str,
        name: &str,
        descriptor: &'static ElementDescriptor,
        attrs: Vec<Attribute>,
    ) -> Self {
        Self {
            canonical: canonical.to_string(),
            name: name.to_string(),
            descriptor,
            attrs,
        }
    }

    pub(crate) fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Name as it was reported in the start event.
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn descriptor(&self) -> &'static ElementDescriptor {
        self.descriptor
    }

    pub(crate) fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }
}

#[derive(Clone, Debug, Default)]
pub(crate) struct OpenElementsStack {
    items: Vec<OpenElement>,
    max_depth: usize,
}

impl OpenElementsStack {
    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.max_depth = 0;
    }

    pub(crate) fn push(&mut self, entry: OpenElement) {
        self.items.push(entry);
        self.max_depth = self.max_depth.max(self.items.len());
    }

    pub(crate) fn current(&self) -> Option<&OpenElement> {
        self.items.last()
    }

    pub(crate) fn pop(&mut self) -> Option<OpenElement> {
        self.items.pop()
    }

    /// Pop the current element if `predicate` holds for it.
    pub(crate) fn pop_if(
        &mut self,
        predicate: impl FnOnce(&OpenElement) -> bool,
    ) -> Option<OpenElement> {
        if self.items.last().is_some_and(predicate) {
            return self.items.pop();
        }
        None
    }

    pub(crate) fn get(&self, index: usize) -> Option<&OpenElement> {
        self.items.get(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    #[cfg(any(test, feature = "debug-stats"))]
    pub(crate) fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub(crate) fn contains(&self, canonical: &str) -> bool {
        self.items.iter().any(|entry| entry.canonical == canonical)
    }

    #[cfg(test)]
    pub(crate) fn iter_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.iter().map(|entry| entry.canonical.as_str())
    }

    /// Whether one of `descriptor`'s natural parents is open, searching
    /// top-down and giving up at its bounding element.
    pub(crate) fn has_natural_parent(&self, descriptor: &ElementDescriptor) -> bool {
        for entry in self.items.iter().rev() {
            if descriptor.is_parent(&entry.canonical) {
                return true;
            }
            if descriptor.bounds == Some(entry.canonical.as_str()) {
                return false;
            }
        }
        false
    }

    /// Distance from the top (1 = current element) of the element an end tag
    /// for `canonical` closes. Non-container elements cannot close across a
    /// block they do not close themselves.
    pub(crate) fn end_tag_depth(
        &self,
        canonical: &str,
        descriptor: &ElementDescriptor,
    ) -> Option<usize> {
        for (depth, entry) in self.items.iter().rev().enumerate() {
            if entry.canonical == canonical {
                return Some(depth + 1);
            }
            if !descriptor.is_container()
                && entry.descriptor.is_block()
                && !descriptor.closes(&entry.canonical)
            {
                return None;
            }
        }
        None
    }
}
