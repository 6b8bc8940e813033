// Documentation nodes
//
// A DocNode is a typed view over one wrapped metadata record: the fields
// every template needs (name, kind, children, comment) are decoded once,
// everything else is kept verbatim for pass-through rendering.

use crate::error::{Error, Result};
use crate::model::value::DocValue;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of a documented entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Project,
    Module,
    Namespace,
    Enum,
    EnumMember,
    Variable,
    Function,
    Class,
    Interface,
    Constructor,
    Property,
    Method,
    CallSignature,
    IndexSignature,
    ConstructorSignature,
    Parameter,
    TypeLiteral,
    TypeParameter,
    Accessor,
    GetSignature,
    SetSignature,
    TypeAlias,
    Reference,
    Unknown,
}

/// Display grouping used when ordering members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Constructor,
    Property,
    Accessor,
    Method,
    Type,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Constructor => "constructor",
            Category::Property => "property",
            Category::Accessor => "accessor",
            Category::Method => "method",
            Category::Type => "type",
            Category::Other => "other",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Category> {
        match tag.to_ascii_lowercase().trim_end_matches('s') {
            "constructor" => Some(Category::Constructor),
            "property" | "propertie" => Some(Category::Property),
            "accessor" => Some(Category::Accessor),
            "method" => Some(Category::Method),
            "type" => Some(Category::Type),
            "other" => Some(Category::Other),
            _ => None,
        }
    }
}

impl Kind {
    const ALL: [Kind; 23] = [
        Kind::Project,
        Kind::Module,
        Kind::Namespace,
        Kind::Enum,
        Kind::EnumMember,
        Kind::Variable,
        Kind::Function,
        Kind::Class,
        Kind::Interface,
        Kind::Constructor,
        Kind::Property,
        Kind::Method,
        Kind::CallSignature,
        Kind::IndexSignature,
        Kind::ConstructorSignature,
        Kind::Parameter,
        Kind::TypeLiteral,
        Kind::TypeParameter,
        Kind::Accessor,
        Kind::GetSignature,
        Kind::SetSignature,
        Kind::TypeAlias,
        Kind::Reference,
    ];

    /// TypeDoc `ReflectionKind` bit value
    pub fn bit(self) -> i64 {
        match self {
            Kind::Unknown => 0,
            kind => 1 << (kind as i64),
        }
    }

    /// Decode a TypeDoc `ReflectionKind` bit value
    pub fn from_bit(bit: i64) -> Kind {
        Kind::ALL
            .iter()
            .copied()
            .find(|kind| kind.bit() == bit)
            .unwrap_or(Kind::Unknown)
    }

    /// Parse a kind tag. Accepts snake case (`type_alias`), TypeDoc's
    /// `kindString` spelling (`Type alias`) and camel case (`typeAlias`).
    pub fn from_tag(tag: &str) -> Kind {
        let normalized: String = tag
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "project" => Kind::Project,
            "module" => Kind::Module,
            "package" | "namespace" => Kind::Namespace,
            "enum" | "enumeration" => Kind::Enum,
            "enummember" | "enumerationmember" => Kind::EnumMember,
            "variable" | "const" => Kind::Variable,
            "function" => Kind::Function,
            "class" => Kind::Class,
            "interface" => Kind::Interface,
            "constructor" => Kind::Constructor,
            "property" => Kind::Property,
            "method" => Kind::Method,
            "callsignature" => Kind::CallSignature,
            "indexsignature" => Kind::IndexSignature,
            "constructorsignature" => Kind::ConstructorSignature,
            "parameter" => Kind::Parameter,
            "typeliteral" => Kind::TypeLiteral,
            "typeparameter" => Kind::TypeParameter,
            "accessor" => Kind::Accessor,
            "getsignature" => Kind::GetSignature,
            "setsignature" => Kind::SetSignature,
            "typealias" => Kind::TypeAlias,
            "reference" => Kind::Reference,
            _ => Kind::Unknown,
        }
    }

    /// Decode the `kind` field of a record, string or numeric
    pub(crate) fn from_value(value: Option<&DocValue>) -> Kind {
        match value {
            Some(v) => match (v.as_str(), v.as_i64()) {
                (Some(tag), _) => Kind::from_tag(tag),
                (_, Some(bit)) => Kind::from_bit(bit),
                _ => Kind::Unknown,
            },
            None => Kind::Unknown,
        }
    }

    /// Snake case tag used in templates and configuration
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Project => "project",
            Kind::Module => "module",
            Kind::Namespace => "namespace",
            Kind::Enum => "enum",
            Kind::EnumMember => "enum_member",
            Kind::Variable => "variable",
            Kind::Function => "function",
            Kind::Class => "class",
            Kind::Interface => "interface",
            Kind::Constructor => "constructor",
            Kind::Property => "property",
            Kind::Method => "method",
            Kind::CallSignature => "call_signature",
            Kind::IndexSignature => "index_signature",
            Kind::ConstructorSignature => "constructor_signature",
            Kind::Parameter => "parameter",
            Kind::TypeLiteral => "type_literal",
            Kind::TypeParameter => "type_parameter",
            Kind::Accessor => "accessor",
            Kind::GetSignature => "get_signature",
            Kind::SetSignature => "set_signature",
            Kind::TypeAlias => "type_alias",
            Kind::Reference => "reference",
            Kind::Unknown => "unknown",
        }
    }

    /// Human readable label for headings
    pub fn label(self) -> &'static str {
        match self {
            Kind::Project => "Project",
            Kind::Module => "Module",
            Kind::Namespace => "Namespace",
            Kind::Enum => "Enumeration",
            Kind::EnumMember => "Enumeration Member",
            Kind::Variable => "Variable",
            Kind::Function => "Function",
            Kind::Class => "Class",
            Kind::Interface => "Interface",
            Kind::Constructor => "Constructor",
            Kind::Property => "Property",
            Kind::Method => "Method",
            Kind::CallSignature => "Call Signature",
            Kind::IndexSignature => "Index Signature",
            Kind::ConstructorSignature => "Constructor Signature",
            Kind::Parameter => "Parameter",
            Kind::TypeLiteral => "Type Literal",
            Kind::TypeParameter => "Type Parameter",
            Kind::Accessor => "Accessor",
            Kind::GetSignature => "Get Signature",
            Kind::SetSignature => "Set Signature",
            Kind::TypeAlias => "Type Alias",
            Kind::Reference => "Reference",
            Kind::Unknown => "Unknown",
        }
    }

    /// Display group of this kind
    pub fn category(self) -> Category {
        match self {
            Kind::Constructor | Kind::ConstructorSignature => Category::Constructor,
            Kind::Property | Kind::Variable | Kind::EnumMember | Kind::IndexSignature => {
                Category::Property
            }
            Kind::Accessor | Kind::GetSignature | Kind::SetSignature => Category::Accessor,
            Kind::Method | Kind::Function | Kind::CallSignature => Category::Method,
            Kind::Class
            | Kind::Interface
            | Kind::Enum
            | Kind::TypeAlias
            | Kind::Namespace
            | Kind::Module => Category::Type,
            _ => Category::Other,
        }
    }

    /// Whether members of this kind can be invoked
    pub fn is_callable(self) -> bool {
        matches!(
            self,
            Kind::Method | Kind::Function | Kind::Constructor | Kind::CallSignature
        )
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Visibility> {
        match tag.to_ascii_lowercase().as_str() {
            "public" => Some(Visibility::Public),
            "protected" => Some(Visibility::Protected),
            "private" => Some(Visibility::Private),
            _ => None,
        }
    }
}

/// A block tag such as `@returns` or `@deprecated`
#[derive(Debug, Clone, PartialEq)]
pub struct BlockTag {
    pub tag: String,
    pub content: String,
}

/// A structured doc comment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Comment {
    /// Summary fragments in source order
    pub summary: Vec<String>,
    pub block_tags: Vec<BlockTag>,
}

impl Comment {
    /// Decode a comment record. Fragments may be plain strings or
    /// `{kind, text}` records; older extractor output uses `shortText`.
    fn from_value(value: &DocValue) -> Option<Comment> {
        value.as_record()?;

        let mut summary: Vec<String> = value
            .get("summary")
            .and_then(DocValue::as_list)
            .map(|parts| parts.iter().filter_map(fragment_text).collect())
            .unwrap_or_default();
        if summary.is_empty() {
            if let Some(text) = value.get("shortText").and_then(DocValue::as_str) {
                summary.push(text.to_string());
            }
        }

        let block_tags = value
            .get("blockTags")
            .and_then(DocValue::as_list)
            .map(|tags| {
                tags.iter()
                    .filter_map(|tag| {
                        let name = tag.get("tag").and_then(DocValue::as_str)?;
                        let content = tag
                            .get("content")
                            .and_then(DocValue::as_list)
                            .map(|parts| parts.iter().filter_map(fragment_text).collect())
                            .unwrap_or_default();
                        Some(BlockTag {
                            tag: name.to_string(),
                            content,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Comment {
            summary,
            block_tags,
        })
    }

    /// Concatenated summary text
    pub fn summary_text(&self) -> String {
        self.summary.concat()
    }

    pub fn is_deprecated(&self) -> bool {
        self.block_tags.iter().any(|t| t.tag == "@deprecated")
    }
}

fn fragment_text(fragment: &DocValue) -> Option<String> {
    fragment
        .as_str()
        .or_else(|| fragment.get("text").and_then(DocValue::as_str))
        .map(str::to_string)
}

// Keys decoded into typed fields. Every other raw key passes through.
const DECODED_KEYS: [&str; 3] = ["name", "kind", "children"];

/// Key under which serialization exposes values computed from the node
const COMPUTED_KEY: &str = "doc";

#[derive(serde::Serialize)]
struct Computed {
    kind_label: &'static str,
    visibility: &'static str,
    summary: String,
    deprecated: bool,
}

/// A node in the documentation tree
#[derive(Debug, Clone, PartialEq)]
pub struct DocNode {
    name: String,
    kind: Kind,
    visibility: Visibility,
    comment: Option<Comment>,
    children: Vec<DocNode>,
    fields: BTreeMap<String, DocValue>,
}

impl DocNode {
    /// Build a node from a wrapped record. Fails if the record (or any
    /// descendant) lacks a string `name`.
    pub fn from_value(value: &DocValue) -> Result<Self> {
        let record = value
            .as_record()
            .ok_or_else(|| Error::metadata("documentation node is not a record"))?;

        let name = value
            .get("name")
            .and_then(DocValue::as_str)
            .ok_or_else(|| Error::metadata("documentation node has no string 'name'"))?
            .to_string();

        let children = match value.get("children") {
            None => Vec::new(),
            Some(DocValue::List(items)) => items
                .iter()
                .enumerate()
                .map(|(i, child)| {
                    DocNode::from_value(child).map_err(|e| {
                        Error::metadata(format!("in '{}', child {}: {}", name, i, e))
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(_) => {
                return Err(Error::metadata(format!(
                    "'children' of '{}' is not a list",
                    name
                )))
            }
        };

        let fields: BTreeMap<String, DocValue> = record
            .iter()
            .filter(|(k, _)| !DECODED_KEYS.contains(&k.as_str()) && *k != COMPUTED_KEY)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            visibility: visibility_of(&name, value),
            kind: match Kind::from_value(value.get("kind")) {
                Kind::Unknown => Kind::from_value(value.get("kindString")),
                kind => kind,
            },
            comment: value.get("comment").and_then(Comment::from_value),
            name,
            children,
            fields,
        })
    }

    /// Build a node directly from extractor JSON
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        Self::from_value(&DocValue::from_json(value))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn comment(&self) -> Option<&Comment> {
        self.comment.as_ref()
    }

    pub fn children(&self) -> &[DocNode] {
        &self.children
    }

    /// First direct child with this exact name
    pub fn child(&self, name: &str) -> Option<&DocNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Pass-through field access (`signatures`, `type`, `sources`, ...)
    pub fn get(&self, key: &str) -> Option<&DocValue> {
        self.fields.get(key)
    }

    pub fn signatures(&self) -> &[DocValue] {
        self.get("signatures")
            .and_then(DocValue::as_list)
            .unwrap_or(&[])
    }

    /// Summary text of the node's comment. Callables carry their comment on
    /// the first signature, which is used when the node has none.
    pub fn summary(&self) -> String {
        if let Some(comment) = &self.comment {
            return comment.summary_text();
        }
        self.signatures()
            .first()
            .and_then(|sig| sig.get("comment"))
            .and_then(Comment::from_value)
            .map(|c| c.summary_text())
            .unwrap_or_default()
    }

    pub fn is_deprecated(&self) -> bool {
        self.comment.as_ref().is_some_and(Comment::is_deprecated)
    }
}

fn visibility_of(name: &str, value: &DocValue) -> Visibility {
    let flag = |key: &str| {
        value
            .get_path(["flags", key])
            .and_then(DocValue::as_bool)
            .unwrap_or(false)
    };

    if flag("isPrivate") || name.starts_with('#') {
        Visibility::Private
    } else if flag("isProtected") {
        Visibility::Protected
    } else {
        Visibility::Public
    }
}

// Templates see the pass-through fields, the decoded ones, and the computed
// values under `doc`. The output decodes back into an equal node.
impl Serialize for DocNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let len = self.fields.len() + DECODED_KEYS.len() + 1;
        let mut map = serializer.serialize_map(Some(len))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("kind", self.kind.as_str())?;
        map.serialize_entry("children", &self.children)?;
        map.serialize_entry(
            COMPUTED_KEY,
            &Computed {
                kind_label: self.kind.label(),
                visibility: self.visibility.as_str(),
                summary: self.summary(),
                deprecated: self.is_deprecated(),
            },
        )?;
        map.end()
    }
}
