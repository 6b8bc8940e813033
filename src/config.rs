use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Flat mapping of render options passed to templates
pub type Options = Map<String, Value>;

pub const SHOW_ROOT_HEADING: &str = "show_root_heading";
pub const SHOW_ROOT_TOC_ENTRY: &str = "show_root_toc_entry";
pub const HEADING_LEVEL: &str = "heading_level";

/// The default render options
pub fn default_options() -> Options {
    let mut options = Options::new();
    options.insert(SHOW_ROOT_HEADING.to_string(), Value::Bool(false));
    options.insert(SHOW_ROOT_TOC_ENTRY.to_string(), Value::Bool(true));
    options.insert(HEADING_LEVEL.to_string(), Value::from(2));
    options
}

/// Overlay `overrides` on `base`; keys in `overrides` win
pub fn merge_options(base: &Options, overrides: &Options) -> Options {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Typed view of the recognized render options. Other keys are passed to
/// templates untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_root_heading: bool,
    pub show_root_toc_entry: bool,
    pub heading_level: u64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_root_heading: false,
            show_root_toc_entry: true,
            heading_level: 2,
        }
    }
}

impl RenderOptions {
    /// Read and validate the recognized keys of a merged option map
    pub fn from_options(options: &Options) -> Result<Self> {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| match options.get(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => Err(Error::config_validation(format!(
                "{} must be a boolean, got {}",
                key, other
            ))),
        };

        let heading_level = match options.get(HEADING_LEVEL) {
            None => defaults.heading_level,
            Some(value) => value.as_u64().ok_or_else(|| {
                Error::config_validation(format!(
                    "{} must be a positive integer, got {}",
                    HEADING_LEVEL, value
                ))
            })?,
        };
        if heading_level == 0 {
            return Err(Error::config_validation("heading_level must be at least 1"));
        }

        Ok(Self {
            show_root_heading: flag(SHOW_ROOT_HEADING, defaults.show_root_heading)?,
            show_root_toc_entry: flag(SHOW_ROOT_TOC_ENTRY, defaults.show_root_toc_entry)?,
            heading_level,
        })
    }
}

/// Parse a `key=value` option. Values are read as JSON when they parse,
/// otherwise kept as strings.
pub fn parse_option(pair: &str) -> Result<(String, Value)> {
    let (key, raw) = pair
        .split_once('=')
        .ok_or_else(|| Error::config_validation(format!("option '{}' is not key=value", pair)))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(Error::config_validation(format!("option '{}' has an empty key", pair)));
    }
    let value = serde_json::from_str(raw.trim()).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Main configuration, loaded from `tsdocgen.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlerConfig {
    pub extractor: ExtractorConfig,
    pub templates: TemplateConfig,
    /// Render options applied under the caller's options
    pub options: Options,
}

/// Extraction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Read pre-generated `<package>.json` files instead of running a command
    pub json_dir: Option<PathBuf>,
    /// Keep extracted trees between lookups
    pub cache: bool,
    /// Sources watched for cache invalidation
    pub source_root: Option<PathBuf>,
}

/// Template settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Directory of `*.html` templates overriding the embedded ones
    pub dir: Option<PathBuf>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        let command = crate::extract::CommandExtractor::default();
        Self {
            command: command.command,
            args: command.args,
            working_dir: None,
            json_dir: None,
            cache: false,
            source_root: None,
        }
    }
}

impl HandlerConfig {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: HandlerConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file or return defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(
        &mut self,
        json_dir: Option<PathBuf>,
        options: Vec<(String, Value)>,
        heading_level: Option<u64>,
        show_root_heading: bool,
    ) {
        if let Some(dir) = json_dir {
            self.extractor.json_dir = Some(dir);
        }

        for (key, value) in options {
            self.options.insert(key, value);
        }

        if let Some(level) = heading_level {
            self.options
                .insert(HEADING_LEVEL.to_string(), Value::from(level));
        }

        if show_root_heading {
            self.options
                .insert(SHOW_ROOT_HEADING.to_string(), Value::Bool(true));
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.extractor.json_dir.is_none() && self.extractor.command.trim().is_empty() {
            return Err(Error::config_validation(
                "extractor command must not be empty",
            ));
        }

        if self.extractor.source_root.is_some() && !self.extractor.cache {
            return Err(Error::config_validation(
                "source_root requires cache = true",
            ));
        }

        RenderOptions::from_options(&merge_options(&default_options(), &self.options))?;
        Ok(())
    }
}
