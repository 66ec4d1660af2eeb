//! Scanner and balancer configuration.

use tools::Charset;

/// Case policy applied to reported element and attribute names.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NameCase {
    #[default]
    Preserve,
    Upper,
    Lower,
}

impl NameCase {
    pub fn apply(self, name: &str) -> String {
        match self {
            NameCase::Preserve => name.to_string(),
            NameCase::Upper => name.to_ascii_uppercase(),
            NameCase::Lower => name.to_ascii_lowercase(),
        }
    }
}

/// Configuration for the scanner.
#[derive(Clone, Debug)]
pub struct ScannerConfig {
    /// Case of element names in emitted events.
    pub element_case: NameCase,
    /// Case of attribute names in emitted events.
    pub attribute_case: NameCase,
    /// Charset for byte sources with no BOM and no declared encoding.
    pub default_encoding: Charset,
    /// Ignore `<meta>` charset declarations.
    pub ignore_specified_charset: bool,
    /// Report `<![CDATA[...]]>` as CDATA events instead of a comment.
    pub cdata_sections: bool,
    /// Wrap numeric character references in general-entity events.
    pub notify_char_refs: bool,
    /// Wrap named references to the five XML built-ins in general-entity
    /// events.
    pub notify_builtin_refs: bool,
    /// Wrap every other named reference in general-entity events.
    pub notify_html_builtin_refs: bool,
    /// Read numeric references 128..=159 as windows-1252 bytes.
    pub fix_windows_char_refs: bool,
    /// Remove `<!--` / `-->` wrapping SCRIPT and STYLE bodies.
    pub strip_comment_delims: bool,
    /// Replaces the raw-text element set. Names are matched case-insensitively;
    /// `None` uses the SPECIAL elements of the descriptor table.
    pub raw_text_elements: Option<Vec<String>>,
    /// Forward diagnostics to the configured sink.
    pub report_errors: bool,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            element_case: NameCase::Upper,
            attribute_case: NameCase::Lower,
            default_encoding: Charset::Windows1252,
            ignore_specified_charset: false,
            cdata_sections: false,
            notify_char_refs: false,
            notify_builtin_refs: false,
            notify_html_builtin_refs: false,
            fix_windows_char_refs: false,
            strip_comment_delims: false,
            raw_text_elements: None,
            report_errors: false,
        }
    }
}

impl ScannerConfig {
    pub(crate) fn is_raw_text(&self, canonical: &str) -> bool {
        match &self.raw_text_elements {
            Some(names) => names.iter().any(|n| n.eq_ignore_ascii_case(canonical)),
            None => crate::elements::lookup(canonical).is_special(),
        }
    }
}

/// Configuration for the tag balancer.
#[derive(Clone, Debug)]
pub struct BalancerConfig {
    /// Balance a fragment: no document-level wrappers are synthesized.
    pub fragment: bool,
    /// Treat `</html>` as final and drop anything after it. When unset,
    /// `</body>` and `</html>` are deferred to the end of the document so
    /// trailing content stays inside the body.
    pub ignore_outside_content: bool,
    /// Case of element names the balancer synthesizes.
    pub element_case: NameCase,
    /// Forward repair diagnostics to the configured sink.
    pub report_errors: bool,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            fragment: false,
            ignore_outside_content: false,
            element_case: NameCase::Upper,
            report_errors: false,
        }
    }
}

impl BalancerConfig {
    pub fn fragment() -> Self {
        Self {
            fragment: true,
            ..Self::default()
        }
    }
}
