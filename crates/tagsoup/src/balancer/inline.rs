//! Inline elements closed by a repair, waiting to be reopened.

use super::stack::OpenElement;

/// Frames are cached innermost first, as they come off the stack, and
/// reopened outermost first.
#[derive(Clone, Debug, Default)]
pub(crate) struct ReopenList {
    items: Vec<OpenElement>,
}

impl ReopenList {
    pub(crate) fn cache(&mut self, entry: OpenElement) {
        self.items.push(entry);
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub(crate) fn into_outer_to_inner(self) -> impl Iterator<Item = OpenElement> {
        self.items.into_iter().rev()
    }
}
