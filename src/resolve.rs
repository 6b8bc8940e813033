// Identifier resolution
//
// `package:Symbol.path` identifiers are looked up against the top-level
// children of the package's metadata tree.

use crate::error::Result;
use crate::extract::Extractor;
use crate::model::{DocNode, DocValue};
use std::fmt;
use tracing::debug;

/// Separator between package and symbol
pub const IDENTIFIER_SEPARATOR: char = ':';

/// A parsed `package:symbol` identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier<'a> {
    pub package: &'a str,
    pub name: &'a str,
}

impl<'a> Identifier<'a> {
    /// Split on the first separator only. Returns `None` when there is no
    /// separator.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let (package, name) = raw.split_once(IDENTIFIER_SEPARATOR)?;
        Some(Self { package, name })
    }
}

impl fmt::Display for Identifier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.package, IDENTIFIER_SEPARATOR, self.name)
    }
}

/// First top-level child of `tree` named exactly `name`
pub fn find_top_level<'t>(tree: &'t DocValue, name: &str) -> Option<&'t DocValue> {
    tree.get("children")
        .and_then(DocValue::as_list)?
        .iter()
        .find(|child| child.get("name").and_then(DocValue::as_str) == Some(name))
}

/// Resolve an identifier to a documentation node.
///
/// A malformed identifier or an unknown symbol yields `Ok(None)`. Extraction
/// failures and malformed metadata for the matched node are errors.
pub fn resolve<E>(extractor: &E, raw: &str) -> Result<Option<DocNode>>
where
    E: Extractor + ?Sized,
{
    let Some(identifier) = Identifier::parse(raw) else {
        debug!(identifier = raw, "identifier has no package separator");
        return Ok(None);
    };

    let tree = extractor.extract(identifier.package)?;
    match find_top_level(&tree, identifier.name) {
        Some(value) => Ok(Some(DocNode::from_value(value)?)),
        None => {
            debug!(%identifier, "symbol not found");
            Ok(None)
        }
    }
}
