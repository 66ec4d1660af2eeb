use serde::de::DeserializeOwned;
use std::fmt::Write;
use std::fs;
use std::path::Path;

/// Show the first mismatching snapshot line with a little context.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    let max = expected.len().max(actual.len());
    let mut out = String::new();
    let missing = "<missing>";
    let mismatch = (0..max).find(|&i| {
        expected.get(i).map(String::as_str).unwrap_or(missing)
            != actual.get(i).map(String::as_str).unwrap_or(missing)
    });
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for line_idx in start..end {
            let left = expected
                .get(line_idx)
                .map(String::as_str)
                .unwrap_or(missing);
            let right = actual.get(line_idx).map(String::as_str).unwrap_or(missing);
            let marker = if line_idx == i { ">" } else { " " };
            let _ = writeln!(&mut out, "{marker} {:>4}  expected: {left}", line_idx + 1);
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {right}", line_idx + 1);
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

/// Read and deserialize a TOML file, panicking with the path on failure.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> T {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read TOML {path:?}: {err}"));
    toml::from_str(&content).unwrap_or_else(|err| panic!("failed to parse TOML {path:?}: {err}"))
}

/// Escape character data for re-serialized markup.
pub fn escape_html_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape a value for a double-quoted attribute.
pub fn escape_html_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn parse_env_bool(key: &str) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("1") | Some("true") | Some("yes") | Some("on") => true,
        Some("0") | Some("false") | Some("no") | Some("off") | Some("") | None => false,
        Some(other) => panic!("unsupported {key} value '{other}'; use 1/0 or true/false"),
    }
}

/// Substring filter over fixture names, read from an environment variable.
pub struct FixtureFilter {
    raw: Option<String>,
}

impl FixtureFilter {
    pub fn from_env(key: &str) -> Self {
        Self {
            raw: std::env::var(key).ok().filter(|value| !value.is_empty()),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        self.raw.as_deref().is_none_or(|filter| name.contains(filter))
    }
}

#[cfg(test)]
mod tests {
    use super::{FixtureFilter, diff_lines, escape_html_attr, escape_html_text};

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn diff_points_at_first_mismatch() {
        let out = diff_lines(&lines(&["a", "b", "c"]), &lines(&["a", "x", "c"]));
        assert!(out.starts_with("first mismatch at line 2"), "{out}");
        assert!(out.contains(">    2  expected: b"), "{out}");
        assert!(out.contains(">    2    actual: x"), "{out}");
    }

    #[test]
    fn diff_reports_missing_lines() {
        let out = diff_lines(&lines(&["a"]), &lines(&["a", "b"]));
        assert!(out.contains("expected: <missing>"), "{out}");
        assert!(out.ends_with("expected 1 lines, actual 2 lines\n"), "{out}");
    }

    #[test]
    fn escaping_targets_markup_characters() {
        assert_eq!(escape_html_text("a<b & c>"), "a&lt;b &amp; c&gt;");
        assert_eq!(escape_html_attr("say \"hi\" & <go>"), "say &quot;hi&quot; &amp; <go>");
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = FixtureFilter { raw: None };
        assert!(filter.matches("anything"));
        let filter = FixtureFilter {
            raw: Some("table".to_string()),
        };
        assert!(filter.matches("table-cells"));
        assert!(!filter.matches("paragraphs"));
    }
}
