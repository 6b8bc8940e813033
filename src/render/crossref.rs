// Cross-reference markup
//
// References are emitted as hover spans keyed by the full dotted path. The
// host's cross-reference pass turns them into links; nothing here checks
// that the target exists.

use std::fmt;

/// Separator between references rendered by [`multi_crossref`]
pub const CROSSREF_SEPARATOR: &str = ", ";

/// A reference to a documented symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossReference {
    pub full_path: String,
    pub label: String,
}

impl CrossReference {
    /// Build a reference. With `brief`, the label is the last dotted segment.
    pub fn new(path: &str, brief: bool) -> Self {
        let label = if brief {
            path.rsplit('.').next().unwrap_or(path)
        } else {
            path
        };
        Self {
            full_path: path.to_string(),
            label: label.to_string(),
        }
    }
}

impl fmt::Display for CrossReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<span data-autorefs-optional-hover=\"{}\">{}</span>",
            html_escape(&self.full_path),
            html_escape(&self.label)
        )
    }
}

/// Render a single cross-reference
pub fn crossref(path: &str, brief: bool) -> String {
    CrossReference::new(path, brief).to_string()
}

/// Render references for each path in order, joined by [`CROSSREF_SEPARATOR`]
pub fn multi_crossref<I, S>(paths: I, brief: bool) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    paths
        .into_iter()
        .map(|p| crossref(p.as_ref(), brief))
        .collect::<Vec<_>>()
        .join(CROSSREF_SEPARATOR)
}

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
