// Template engine for rendering documentation fragments

use crate::error::Result;
use crate::members::{order_members, Members};
use crate::model::{Category, DocNode, DocValue, Kind, Visibility};
use crate::render::crossref::{crossref, multi_crossref};
use crate::render::signature::format_signature;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tera::{Context, Tera, Value};
use tracing::debug;
use walkdir::WalkDir;

/// Signature of a template filter
pub type FilterFn = fn(&Value, &HashMap<String, Value>) -> tera::Result<Value>;

/// Named filters installed into the engine at construction
#[derive(Clone)]
pub struct FilterTable {
    filters: Vec<(&'static str, FilterFn)>,
}

impl FilterTable {
    /// A table with no filters
    pub fn empty() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add or replace a filter
    pub fn with(mut self, name: &'static str, filter: FilterFn) -> Self {
        self.filters.retain(|(n, _)| *n != name);
        self.filters.push((name, filter));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|(n, _)| *n).collect()
    }

    fn install(&self, tera: &mut Tera) {
        for (name, filter) in &self.filters {
            tera.register_filter(name, *filter);
        }
    }
}

impl Default for FilterTable {
    fn default() -> Self {
        Self::empty()
            .with("crossref", crossref_filter)
            .with("multi_crossref", multi_crossref_filter)
            .with("order_members", order_members_filter)
            .with("filter_objects", filter_objects_filter)
            .with("format_signature", format_signature_filter)
    }
}

const BUILTIN_TEMPLATES: [(&str, &str); 9] = [
    ("node.html", include_str!("../../templates/node.html.tera")),
    ("member.html", include_str!("../../templates/member.html.tera")),
    ("class.html", include_str!("../../templates/class.html.tera")),
    ("interface.html", include_str!("../../templates/interface.html.tera")),
    ("function.html", include_str!("../../templates/function.html.tera")),
    ("enum.html", include_str!("../../templates/enum.html.tera")),
    ("namespace.html", include_str!("../../templates/namespace.html.tera")),
    ("type_alias.html", include_str!("../../templates/type_alias.html.tera")),
    ("empty.html", include_str!("../../templates/empty.html.tera")),
];

/// Template engine wrapping Tera with a fixed filter table
pub struct TemplateEngine {
    tera: Tera,
    filters: FilterTable,
}

impl TemplateEngine {
    /// Create an engine with the embedded templates
    pub fn new(filters: FilterTable) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(BUILTIN_TEMPLATES.to_vec())?;
        configure(&mut tera, &filters);
        Ok(Self { tera, filters })
    }

    /// Create an engine where `*.html` or `*.html.tera` files under
    /// `template_dir` override the embedded templates of the same relative
    /// name. The `.tera` suffix is dropped from the template name.
    pub fn from_dir(template_dir: &Path, filters: FilterTable) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(BUILTIN_TEMPLATES.to_vec())?;

        let mut files: Vec<(PathBuf, Option<String>)> = Vec::new();
        for entry in WalkDir::new(template_dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let relative = path
                .strip_prefix(template_dir)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");
            let Some(name) = override_name(&relative) else {
                continue;
            };
            debug!(template = %name, "custom template override");
            files.push((path.to_path_buf(), Some(name)));
        }
        tera.add_template_files(files)?;

        configure(&mut tera, &filters);
        Ok(Self { tera, filters })
    }

    /// Pick the template for a node kind, falling back to `node.html`
    pub fn select_template(&self, kind: Option<Kind>) -> String {
        let Some(kind) = kind else {
            return "empty.html".to_string();
        };
        let name = match kind {
            Kind::Class => "class.html",
            Kind::Interface => "interface.html",
            Kind::Function | Kind::Method | Kind::Constructor => "function.html",
            Kind::Enum => "enum.html",
            Kind::Namespace | Kind::Module | Kind::Project => "namespace.html",
            Kind::TypeAlias => "type_alias.html",
            _ => "node.html",
        };
        if self.has_template(name) {
            name.to_string()
        } else {
            "node.html".to_string()
        }
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Render a named template with context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Names of the installed filters
    pub fn filter_names(&self) -> Vec<&'static str> {
        self.filters.names()
    }
}

/// Template name for an override file, or `None` for files that are not
/// HTML templates
fn override_name(relative: &str) -> Option<String> {
    let name = relative.strip_suffix(".tera").unwrap_or(relative);
    name.ends_with(".html").then(|| name.to_string())
}

fn configure(tera: &mut Tera, filters: &FilterTable) {
    tera.autoescape_on(vec![".html"]);
    filters.install(tera);
}

fn brief_arg(args: &HashMap<String, Value>) -> bool {
    args.get("brief").and_then(Value::as_bool).unwrap_or(true)
}

/// `{{ path | crossref(brief=true) }}`
fn crossref_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let path = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("crossref expects a string path"))?;
    Ok(Value::String(crossref(path, brief_arg(args))))
}

/// `{{ paths | multi_crossref(brief=true) }}`
fn multi_crossref_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let paths: Vec<&str> = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
        Value::String(s) => vec![s.as_str()],
        _ => return Err(tera::Error::msg("multi_crossref expects a list of paths")),
    };
    Ok(Value::String(multi_crossref(paths, brief_arg(args))))
}

fn decode_nodes(value: &Value, filter: &str) -> tera::Result<Vec<DocNode>> {
    let items = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        _ => return Err(tera::Error::msg(format!("{} expects a list of objects", filter))),
    };
    items
        .iter()
        .map(|item| {
            DocNode::from_value(&DocValue::from_json(item))
                .map_err(|e| tera::Error::msg(format!("{}: {}", filter, e)))
        })
        .collect()
}

fn encode_nodes(nodes: &[&DocNode]) -> tera::Result<Value> {
    serde_json::to_value(nodes).map_err(|e| tera::Error::msg(e.to_string()))
}

/// `{{ node.children | order_members }}`
fn order_members_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let nodes = decode_nodes(value, "order_members")?;
    encode_nodes(&order_members(&nodes))
}

/// Read a filter argument given either as a single string or a list
fn tag_list(args: &HashMap<String, Value>, key: &str) -> Vec<String> {
    match args.get(key) {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Parse every tag of a filter argument, failing on the first unknown one
fn parse_tags<T>(
    args: &HashMap<String, Value>,
    key: &str,
    parse: impl Fn(&str) -> Option<T>,
) -> tera::Result<Vec<T>> {
    tag_list(args, key)
        .iter()
        .map(|tag| {
            parse(tag).ok_or_else(|| {
                tera::Error::msg(format!("filter_objects: unknown {} tag '{}'", key, tag))
            })
        })
        .collect()
}

/// `{{ members | filter_objects(kinds=["method"], visibility="public") }}`
///
/// Keeps input order; chain `order_members` to sort.
fn filter_objects_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let nodes = decode_nodes(value, "filter_objects")?;
    let mut members = Members::new(&nodes);

    let kinds = parse_tags(args, "kinds", |t| {
        Some(Kind::from_tag(t)).filter(|kind| *kind != Kind::Unknown)
    })?;
    if !kinds.is_empty() {
        members = members.kinds(&kinds);
    }

    let categories = parse_tags(args, "categories", Category::from_tag)?;
    if !categories.is_empty() {
        members = members.categories(&categories);
    }

    let levels = parse_tags(args, "visibility", Visibility::from_tag)?;
    if !levels.is_empty() {
        members = members.visibility(&levels);
    }

    let selected: Vec<&DocNode> = members.collect();
    encode_nodes(&selected)
}

/// `{{ signature | format_signature }}`
fn format_signature_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(format_signature(&DocValue::from_json(value))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn names(value: &Value) -> Vec<String> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_default_table_registers_filters() {
        let engine = TemplateEngine::new(FilterTable::default()).unwrap();
        let names = engine.filter_names();
        for name in [
            "crossref",
            "multi_crossref",
            "order_members",
            "filter_objects",
            "format_signature",
        ] {
            assert!(names.contains(&name), "missing filter {}", name);
        }
    }

    #[test]
    fn test_filter_table_replaces_by_name() {
        let table = FilterTable::default().with("crossref", format_signature_filter);
        assert_eq!(table.names().iter().filter(|n| **n == "crossref").count(), 1);
        assert!(FilterTable::empty().names().is_empty());
    }

    #[test]
    fn test_crossref_filter() {
        let out = crossref_filter(&json!("a.b.C"), &HashMap::new()).unwrap();
        assert_eq!(out, json!("<span data-autorefs-optional-hover=\"a.b.C\">C</span>"));

        let out = crossref_filter(&json!("a.b.C"), &args(&[("brief", json!(false))])).unwrap();
        assert!(out.as_str().unwrap().ends_with(">a.b.C</span>"));

        assert!(crossref_filter(&json!(3), &HashMap::new()).is_err());
    }

    #[test]
    fn test_multi_crossref_filter() {
        let out = multi_crossref_filter(&json!(["x.Y", "a.B"]), &HashMap::new()).unwrap();
        assert_eq!(out.as_str().unwrap().matches("<span").count(), 2);
        assert!(out.as_str().unwrap().contains("</span>, <span"));

        let out = multi_crossref_filter(&json!([]), &HashMap::new()).unwrap();
        assert_eq!(out, json!(""));
    }

    #[test]
    fn test_order_members_filter() {
        let input = json!([
            {"name": "zoom", "kind": "method"},
            {"name": "label", "kind": "property"},
            {"name": "constructor", "kind": "constructor"},
            {"name": "blur", "kind": "method"},
        ]);
        let out = order_members_filter(&input, &HashMap::new()).unwrap();
        assert_eq!(names(&out), vec!["constructor", "label", "blur", "zoom"]);

        let empty = order_members_filter(&json!([]), &HashMap::new()).unwrap();
        assert_eq!(empty, json!([]));
    }

    #[test]
    fn test_filter_objects_filter() {
        let input = json!([
            {"name": "zoom", "kind": "method"},
            {"name": "label", "kind": "property"},
            {"name": "hidden", "kind": "method", "flags": {"isPrivate": true}},
        ]);

        let out = filter_objects_filter(&input, &args(&[("kinds", json!("method"))])).unwrap();
        assert_eq!(names(&out), vec!["zoom", "hidden"]);

        let out = filter_objects_filter(
            &input,
            &args(&[("kinds", json!(["method"])), ("visibility", json!("public"))]),
        )
        .unwrap();
        assert_eq!(names(&out), vec!["zoom"]);

        let out =
            filter_objects_filter(&input, &args(&[("categories", json!(["properties"]))])).unwrap();
        assert_eq!(names(&out), vec!["label"]);
    }

    #[test]
    fn test_filter_objects_rejects_unknown_tags() {
        let input = json!([
            {"name": "hid", "kind": "property", "flags": {"isPrivate": true}},
            {"name": "pub", "kind": "property"},
        ]);

        for (key, tag) in [
            ("visibility", json!("publik")),
            ("categories", json!(["property", "propertys"])),
            ("kinds", json!("methd")),
        ] {
            let err = filter_objects_filter(&input, &args(&[(key, tag)])).unwrap_err();
            let message = err.to_string();
            assert!(message.contains(key), "{}", message);
        }

        let err = filter_objects_filter(&input, &args(&[("visibility", json!("publik"))]))
            .unwrap_err();
        assert!(err.to_string().contains("'publik'"));
    }

    #[test]
    fn test_filter_objects_unknown_tag_fails_render() {
        let mut tera = Tera::default();
        tera.add_raw_template(
            "t.html",
            "{% for m in members | filter_objects(visibility=\"publik\") %}{{ m.name }};{% endfor %}",
        )
        .unwrap();
        FilterTable::default().install(&mut tera);
        let mut ctx = Context::new();
        ctx.insert(
            "members",
            &json!([
                {"name": "hid", "kind": "property", "flags": {"isPrivate": true}},
                {"name": "pub", "kind": "property"},
            ]),
        );
        assert!(tera.render("t.html", &ctx).is_err());
    }

    #[test]
    fn test_filter_objects_rejects_malformed() {
        let err = filter_objects_filter(&json!([{"kind": "method"}]), &HashMap::new());
        assert!(err.is_err());
        assert!(filter_objects_filter(&json!("nope"), &HashMap::new()).is_err());
    }

    #[test]
    fn test_format_signature_filter() {
        let sig = json!({"name": "len", "type": {"type": "intrinsic", "name": "number"}});
        let out = format_signature_filter(&sig, &HashMap::new()).unwrap();
        assert_eq!(out, json!("len(): number"));
    }

    #[test]
    fn test_override_name() {
        assert_eq!(override_name("class.html"), Some("class.html".to_string()));
        assert_eq!(override_name("class.html.tera"), Some("class.html".to_string()));
        assert_eq!(override_name("sub/node.html.tera"), Some("sub/node.html".to_string()));
        assert_eq!(override_name("notes.txt"), None);
        assert_eq!(override_name("macros.tera"), None);
    }

    #[test]
    fn test_from_dir_accepts_tera_suffix() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("enum.html.tera"), "custom enum {{ node.name }}").unwrap();
        std::fs::write(dir.path().join("README.md"), "ignored").unwrap();

        let engine = TemplateEngine::from_dir(dir.path(), FilterTable::default()).unwrap();
        assert!(engine.has_template("enum.html"));
        assert!(!engine.has_template("enum.html.tera"));

        let mut ctx = Context::new();
        ctx.insert("node", &json!({"name": "Size"}));
        assert_eq!(engine.render("enum.html", &ctx).unwrap(), "custom enum Size");
    }

    #[test]
    fn test_select_template() {
        let engine = TemplateEngine::new(FilterTable::default()).unwrap();
        assert_eq!(engine.select_template(Some(Kind::Class)), "class.html");
        assert_eq!(engine.select_template(Some(Kind::Method)), "function.html");
        assert_eq!(engine.select_template(Some(Kind::Variable)), "node.html");
        assert_eq!(engine.select_template(None), "empty.html");
    }

    #[test]
    fn test_render_with_filters() {
        let mut tera = Tera::default();
        tera.add_raw_template("t.html", "{{ path | crossref | safe }}|{{ path }}")
            .unwrap();
        FilterTable::default().install(&mut tera);
        let mut ctx = Context::new();
        ctx.insert("path", "a.<b>");
        let out = tera.render("t.html", &ctx).unwrap();
        assert_eq!(
            out,
            "<span data-autorefs-optional-hover=\"a.&lt;b&gt;\">&lt;b&gt;</span>|a.&lt;b&gt;"
        );
    }
}
