//! The TypeScript documentation handler.
//!
//! [`Handler`] is what a documentation host talks to: `collect` turns an
//! identifier into a node, `render` turns a node (or a lookup miss) into a
//! markup fragment.

use crate::config::{default_options, merge_options, HandlerConfig, Options, RenderOptions};
use crate::error::Result;
use crate::extract::{CachedExtractor, CommandExtractor, Extractor, JsonFileExtractor};
use crate::members::Members;
use crate::model::DocNode;
use crate::render::crossref::crossref;
use crate::render::templates::{FilterTable, TemplateEngine};
use crate::resolve::resolve;
use serde_json::{json, Value};
use tera::Context;
use tracing::{debug, info};

/// Cross-reference domain served by this handler
pub const DOMAIN: &str = "typescript";
/// Whether an object inventory is produced
pub const ENABLE_INVENTORY: bool = false;
/// Theme used when the requested one has no templates
pub const FALLBACK_THEME: &str = "material";

/// Options used when the host collects an item for a fallback lookup
pub fn fallback_options() -> Options {
    let mut options = Options::new();
    options.insert("fallback".to_string(), Value::Bool(true));
    options
}

pub struct Handler {
    extractor: Box<dyn Extractor>,
    engine: TemplateEngine,
    defaults: Options,
}

impl Handler {
    /// Create a handler over an extractor with the embedded templates
    pub fn new(extractor: Box<dyn Extractor>) -> Result<Self> {
        Ok(Self {
            extractor,
            engine: TemplateEngine::new(FilterTable::default())?,
            defaults: default_options(),
        })
    }

    /// Build a handler from loaded configuration
    pub fn from_config(config: &HandlerConfig) -> Result<Self> {
        config.validate()?;

        let extractor: Box<dyn Extractor> = match &config.extractor.json_dir {
            Some(dir) => {
                info!(dir = %dir.display(), "using pre-generated metadata");
                Box::new(JsonFileExtractor::new(dir))
            }
            None => {
                let mut command =
                    CommandExtractor::new(&config.extractor.command, config.extractor.args.clone());
                if let Some(dir) = &config.extractor.working_dir {
                    command = command.with_working_dir(dir);
                }
                Box::new(command)
            }
        };

        let extractor: Box<dyn Extractor> = if config.extractor.cache {
            let mut cached = CachedExtractor::new(extractor);
            if let Some(root) = &config.extractor.source_root {
                cached = cached.with_source_root(root);
            }
            Box::new(cached)
        } else {
            extractor
        };

        let engine = match &config.templates.dir {
            Some(dir) => TemplateEngine::from_dir(dir, FilterTable::default())?,
            None => TemplateEngine::new(FilterTable::default())?,
        };

        Ok(Self {
            extractor,
            engine,
            defaults: merge_options(&default_options(), &config.options),
        })
    }

    /// Replace the template engine
    pub fn with_engine(mut self, engine: TemplateEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Default options every render call starts from
    pub fn default_options(&self) -> &Options {
        &self.defaults
    }

    /// Resolve an identifier. A malformed identifier or missing symbol is
    /// `Ok(None)`; extraction failures are errors.
    pub fn collect(&self, identifier: &str, _config: &Options) -> Result<Option<DocNode>> {
        let node = resolve(self.extractor.as_ref(), identifier)?;
        if node.is_none() {
            info!(identifier, "no documentation found");
        }
        Ok(node)
    }

    /// Render a node, or the empty fragment for a lookup miss
    pub fn render(&self, node: Option<&DocNode>, config: &Options) -> Result<String> {
        let options = merge_options(&self.defaults, config);
        let typed = RenderOptions::from_options(&options)?;

        let template = self.engine.select_template(node.map(DocNode::kind));
        debug!(template = %template, "rendering");

        let mut context = Context::new();
        context.insert("config", &options);
        context.insert("heading_level", &typed.heading_level);
        context.insert("root", &true);

        match node {
            Some(node) => {
                let members = Members::of(node).ordered();
                context.insert("node", node);
                context.insert("is_empty", &false);
                context.insert("summary", &node.summary());
                context.insert("members", &members);
            }
            None => {
                context.insert("node", &json!({}));
                context.insert("is_empty", &true);
                context.insert("summary", "");
                context.insert("members", &Vec::<Value>::new());
            }
        }

        self.engine.render(&template, &context)
    }

    /// Collect and render in one step
    pub fn document(&self, identifier: &str, config: &Options) -> Result<String> {
        let node = self.collect(identifier, config)?;
        self.render(node.as_ref(), config)
    }

    /// Cross-reference markup for `path`. Templates use the registered
    /// `crossref` filter; this is the same rendering for code callers.
    pub fn crossref(&self, path: &str, brief: bool) -> String {
        crossref(path, brief)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::extract::StaticExtractor;
    use serde_json::json;

    fn handler() -> Handler {
        let extractor = StaticExtractor::new().with_package(
            "ui",
            json!({
                "children": [
                    {
                        "name": "Button",
                        "kind": 128,
                        "comment": {"summary": [{"kind": "text", "text": "A clickable "}, {"kind": "code", "text": "<button>"}]},
                        "extendedTypes": [{"type": "reference", "name": "Widget"}],
                        "children": [
                            {"name": "render", "kind": 2048, "signatures": [
                                {"name": "render", "kind": 4096, "type": {"type": "intrinsic", "name": "void"}}
                            ]},
                            {"name": "label", "kind": 1024, "type": {"type": "intrinsic", "name": "string"}},
                            {"name": "constructor", "kind": 512},
                        ]
                    },
                    {"name": "VERSION", "kind": 32, "type": {"type": "intrinsic", "name": "string"}},
                ]
            }),
        );
        Handler::new(Box::new(extractor)).unwrap()
    }

    fn opts(value: Value) -> Options {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_collect_and_miss() {
        let handler = handler();
        let node = handler.collect("ui:Button", &Options::new()).unwrap();
        assert_eq!(node.unwrap().name(), "Button");
        assert!(handler.collect("ui:Nope", &Options::new()).unwrap().is_none());
        assert!(handler.collect("Button", &Options::new()).unwrap().is_none());
    }

    #[test]
    fn test_collect_extraction_failure() {
        let err = handler().collect("core:Button", &Options::new()).unwrap_err();
        assert!(matches!(err, Error::Extraction { .. }));
    }

    #[test]
    fn test_render_members_in_order() {
        let handler = handler();
        let node = handler.collect("ui:Button", &Options::new()).unwrap().unwrap();
        let html = handler.render(Some(&node), &Options::new()).unwrap();

        let ctor = html.find("<code>constructor</code>").unwrap();
        let label = html.find("<code>label</code>").unwrap();
        let render = html.find("<code>render</code>").unwrap();
        assert!(ctor < label && label < render);
        assert!(html.contains("render(): void"));
        assert!(html.contains("label: string"));
    }

    #[test]
    fn test_render_summary_and_bases() {
        let handler = handler();
        let node = handler.collect("ui:Button", &Options::new()).unwrap().unwrap();
        let html = handler.render(Some(&node), &Options::new()).unwrap();
        assert!(html.contains("A clickable &lt;button&gt;"));
        assert!(html.contains("<span data-autorefs-optional-hover=\"Widget\">Widget</span>"));
    }

    #[test]
    fn test_render_heading_options() {
        let handler = handler();
        let node = handler.collect("ui:Button", &Options::new()).unwrap().unwrap();

        let hidden = handler.render(Some(&node), &Options::new()).unwrap();
        assert!(hidden.contains("<h2 id=\"Button\" class=\"doc doc-heading hidden-toc\""));
        assert!(hidden.contains("<h3 id=\"Button.render\""));

        let shown = handler
            .render(Some(&node), &opts(json!({"show_root_heading": true, "heading_level": 4})))
            .unwrap();
        assert!(shown.contains("<h4 id=\"Button\" class=\"doc doc-heading\">"));
        assert!(shown.contains("<h5 id=\"Button.render\""));

        let no_toc = handler
            .render(Some(&node), &opts(json!({"show_root_toc_entry": false})))
            .unwrap();
        assert!(!no_toc.contains("hidden-toc"));
    }

    #[test]
    fn test_render_empty_result() {
        let html = handler().render(None, &Options::new()).unwrap();
        assert!(html.contains("doc-empty"));
    }

    #[test]
    fn test_render_rejects_invalid_heading_level() {
        let handler = handler();
        let err = handler
            .render(None, &opts(json!({"heading_level": 0})))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigValidation(_)));
    }

    #[test]
    fn test_render_variable_uses_generic_template() {
        let handler = handler();
        let html = handler.document("ui:VERSION", &Options::new()).unwrap();
        assert!(html.contains("doc-variable"));
        assert!(!html.contains("doc-members"));
    }

    #[test]
    fn test_bound_crossref_matches_filter_output() {
        assert_eq!(
            handler().crossref("a.b.C", true),
            "<span data-autorefs-optional-hover=\"a.b.C\">C</span>"
        );
    }

    #[test]
    fn test_handler_constants() {
        assert_eq!(DOMAIN, "typescript");
        assert!(!ENABLE_INVENTORY);
        assert_eq!(FALLBACK_THEME, "material");
        assert_eq!(fallback_options()["fallback"], json!(true));
    }

    #[test]
    fn test_from_config_json_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("ui.json"),
            r#"{"children": [{"name": "Button", "kind": "class"}]}"#,
        )
        .unwrap();

        let mut config = HandlerConfig::default();
        config.extractor.json_dir = Some(dir.path().to_path_buf());
        config.extractor.cache = true;
        config
            .options
            .insert("show_root_heading".to_string(), json!(true));

        let handler = Handler::from_config(&config).unwrap();
        assert_eq!(handler.default_options()["show_root_heading"], json!(true));
        let html = handler.document("ui:Button", &Options::new()).unwrap();
        assert!(html.contains("<h2 id=\"Button\" class=\"doc doc-heading\">"));
    }
}
