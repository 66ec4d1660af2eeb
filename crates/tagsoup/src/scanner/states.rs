//! Scanner macro states.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScanState {
    StartDocument,
    /// Character data between tags.
    Content,
    /// Just past a `<`.
    MarkupBracket,
    /// Inside a raw-text element, watching for its end tag only.
    RawText,
    EndDocument,
    Finished,
}
