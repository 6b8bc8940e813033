//! tsdocgen - Render cross-referenced API docs from TypeScript metadata
//!
//! Wraps the JSON tree produced by an external extractor (TypeDoc) into an
//! owned documentation model, resolves `package:Symbol` identifiers against
//! it and renders HTML fragments through Tera templates.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod members;
pub mod model;
pub mod render;
pub mod resolve;

// Re-export main types
pub use config::{HandlerConfig, Options, RenderOptions};
pub use error::{Error, Result};
pub use extract::{CachedExtractor, CommandExtractor, Extractor, JsonFileExtractor, StaticExtractor};
pub use handler::Handler;
pub use members::{order_members, Members};
pub use model::{DocNode, DocValue, Kind, Visibility};
pub use render::{crossref, multi_crossref, FilterTable, TemplateEngine};
pub use resolve::{resolve, Identifier};
