// Rendering: cross-references, signatures and templates

pub mod crossref;
pub mod signature;
pub mod templates;

pub use crossref::{crossref, multi_crossref, CrossReference};
pub use signature::{format_signature, format_type};
pub use templates::{FilterFn, FilterTable, TemplateEngine};
