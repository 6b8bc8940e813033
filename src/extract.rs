//! Metadata extraction.
//!
//! The extractor turns a package identifier into a metadata tree of the shape
//! `{ "children": [ ... ] }`. Every failure (missing tool, non-zero exit,
//! missing output, unparsable JSON) is reported as [`Error::Extraction`] so
//! callers can tell it apart from a symbol that simply does not exist.

use crate::error::{Error, Result};
use crate::model::DocValue;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Source of metadata trees
pub trait Extractor {
    /// Produce the metadata tree of `package`
    fn extract(&self, package: &str) -> Result<DocValue>;
}

impl<E: Extractor + ?Sized> Extractor for Box<E> {
    fn extract(&self, package: &str) -> Result<DocValue> {
        (**self).extract(package)
    }
}

impl<E: Extractor + ?Sized> Extractor for &E {
    fn extract(&self, package: &str) -> Result<DocValue> {
        (**self).extract(package)
    }
}

/// Parse extractor output and check it has the expected top-level shape
pub fn parse_tree(package: &str, raw: &str) -> Result<DocValue> {
    let json: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| Error::extraction(package, format!("unparsable output: {}", e)))?;
    check_tree(package, DocValue::from_json(&json))
}

fn check_tree(package: &str, tree: DocValue) -> Result<DocValue> {
    if !tree.is_record() {
        return Err(Error::extraction(package, "output is not a JSON object"));
    }
    // The extractor omits `children` for a package with no exports.
    match tree.get("children") {
        None | Some(DocValue::List(_)) => Ok(tree),
        Some(_) => Err(Error::extraction(package, "'children' is not a list")),
    }
}

/// Placeholder replaced by the package identifier in command arguments
pub const PACKAGE_PLACEHOLDER: &str = "{package}";
/// Placeholder replaced by the output file path in command arguments
pub const OUTPUT_PLACEHOLDER: &str = "{output}";

/// Runs an external extractor command (TypeDoc by default) and reads the
/// JSON file it writes
#[derive(Debug, Clone)]
pub struct CommandExtractor {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
}

impl Default for CommandExtractor {
    fn default() -> Self {
        Self {
            command: "npx".to_string(),
            args: vec![
                "typedoc".to_string(),
                "--json".to_string(),
                OUTPUT_PLACEHOLDER.to_string(),
                PACKAGE_PLACEHOLDER.to_string(),
            ],
            working_dir: None,
        }
    }
}

impl CommandExtractor {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            working_dir: None,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    fn expand_args(&self, package: &str, output: &Path) -> Vec<String> {
        let output = output.to_string_lossy();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(PACKAGE_PLACEHOLDER, package)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }
}

impl Extractor for CommandExtractor {
    fn extract(&self, package: &str) -> Result<DocValue> {
        let out_dir = tempfile::tempdir()
            .map_err(|e| Error::extraction(package, format!("cannot create output dir: {}", e)))?;
        let output_path = out_dir.path().join("docs.json");
        let args = self.expand_args(package, &output_path);

        info!(package, command = %self.command, "running extractor");
        let mut cmd = Command::new(&self.command);
        cmd.args(&args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().map_err(|e| {
            Error::extraction(package, format!("failed to run '{}': {}", self.command, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let detail = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            warn!(package, status = %output.status, "extractor failed");
            return Err(Error::extraction(
                package,
                format!("'{}' exited with {}: {}", self.command, output.status, detail),
            ));
        }

        let raw = std::fs::read_to_string(&output_path).map_err(|e| {
            Error::extraction(
                package,
                format!("missing output artifact {}: {}", output_path.display(), e),
            )
        })?;
        debug!(package, bytes = raw.len(), "extractor output read");
        parse_tree(package, &raw)
    }
}

/// Reads pre-generated trees from `<dir>/<package>.json`
#[derive(Debug, Clone)]
pub struct JsonFileExtractor {
    dir: PathBuf,
}

impl JsonFileExtractor {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, package: &str) -> PathBuf {
        self.dir.join(format!("{}.json", package))
    }
}

impl Extractor for JsonFileExtractor {
    fn extract(&self, package: &str) -> Result<DocValue> {
        let path = self.path_for(package);
        debug!(package, path = %path.display(), "reading metadata file");
        let raw = std::fs::read_to_string(&path).map_err(|e| {
            Error::extraction(package, format!("cannot read {}: {}", path.display(), e))
        })?;
        parse_tree(package, &raw)
    }
}

/// In-memory trees keyed by package
#[derive(Debug, Clone, Default)]
pub struct StaticExtractor {
    trees: HashMap<String, serde_json::Value>,
}

impl StaticExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_package(mut self, package: impl Into<String>, tree: serde_json::Value) -> Self {
        self.trees.insert(package.into(), tree);
        self
    }
}

impl Extractor for StaticExtractor {
    fn extract(&self, package: &str) -> Result<DocValue> {
        let tree = self
            .trees
            .get(package)
            .ok_or_else(|| Error::extraction(package, "no metadata registered"))?;
        check_tree(package, DocValue::from_json(tree))
    }
}

struct CacheEntry {
    tree: DocValue,
    extracted_at: SystemTime,
}

/// Explicit per-package cache in front of another extractor.
///
/// Entries are dropped by [`CachedExtractor::invalidate`] or
/// [`CachedExtractor::clear`]. With a source root, an entry is also stale
/// once any file under the root was modified after it was extracted.
pub struct CachedExtractor<E> {
    inner: E,
    source_root: Option<PathBuf>,
    entries: RefCell<HashMap<String, CacheEntry>>,
}

impl<E: Extractor> CachedExtractor<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            source_root: None,
            entries: RefCell::new(HashMap::new()),
        }
    }

    /// Watch modification times under `root` for staleness
    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }

    pub fn invalidate(&self, package: &str) -> bool {
        self.entries.borrow_mut().remove(package).is_some()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Walks `source_root` until a file newer than `extracted_at` turns up.
    /// Errors reading the tree are extraction failures for `package`.
    fn is_stale(&self, package: &str, extracted_at: SystemTime) -> Result<bool> {
        let Some(root) = &self.source_root else {
            return Ok(false);
        };
        let unreadable = |e: &dyn std::fmt::Display| {
            Error::extraction(
                package,
                format!("cannot check sources under {}: {}", root.display(), e),
            )
        };
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|e| unreadable(&e))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let modified = entry
                .metadata()
                .map_err(|e| unreadable(&e))?
                .modified()
                .map_err(|e| unreadable(&e))?;
            if modified > extracted_at {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl<E: Extractor> Extractor for CachedExtractor<E> {
    fn extract(&self, package: &str) -> Result<DocValue> {
        let cached = self
            .entries
            .borrow()
            .get(package)
            .map(|entry| (entry.tree.clone(), entry.extracted_at));

        if let Some((tree, extracted_at)) = cached {
            if !self.is_stale(package, extracted_at)? {
                debug!(package, "metadata cache hit");
                return Ok(tree);
            }
            debug!(package, "metadata cache entry stale");
        }

        let extracted_at = SystemTime::now();
        let tree = self.inner.extract(package)?;
        self.entries.borrow_mut().insert(
            package.to_string(),
            CacheEntry {
                tree: tree.clone(),
                extracted_at,
            },
        );
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;
    use tempfile::TempDir;

    struct Counting {
        calls: Cell<usize>,
    }

    impl Extractor for Counting {
        fn extract(&self, package: &str) -> Result<DocValue> {
            self.calls.set(self.calls.get() + 1);
            parse_tree(package, r#"{"children": [{"name": "A"}]}"#)
        }
    }

    #[test]
    fn test_parse_tree_shapes() {
        assert!(parse_tree("p", r#"{"children": []}"#).is_ok());
        assert!(parse_tree("p", r#"{"name": "p"}"#).is_ok());

        let err = parse_tree("p", "not json").unwrap_err();
        assert!(err.is_extraction());
        let err = parse_tree("p", "[1, 2]").unwrap_err();
        assert!(err.to_string().contains("not a JSON object"));
        let err = parse_tree("p", r#"{"children": 4}"#).unwrap_err();
        assert!(err.to_string().contains("'children' is not a list"));
    }

    #[test]
    fn test_static_extractor() {
        let extractor = StaticExtractor::new().with_package("ui", json!({"children": []}));
        assert!(extractor.extract("ui").is_ok());
        let err = extractor.extract("core").unwrap_err();
        assert!(err.is_extraction());
        assert!(err.to_string().contains("'core'"));
    }

    #[test]
    fn test_json_file_extractor() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("ui.json"),
            r#"{"children": [{"name": "Button", "kind": 128}]}"#,
        )
        .unwrap();

        let extractor = JsonFileExtractor::new(dir.path());
        let tree = extractor.extract("ui").unwrap();
        assert_eq!(tree.get("children").and_then(DocValue::as_list).unwrap().len(), 1);

        let err = extractor.extract("missing").unwrap_err();
        assert!(err.is_extraction());
    }

    #[test]
    fn test_command_args_expand_placeholders() {
        let extractor = CommandExtractor::default();
        let args = extractor.expand_args("ui", Path::new("/tmp/out/docs.json"));
        assert_eq!(args, vec!["typedoc", "--json", "/tmp/out/docs.json", "ui"]);
    }

    #[test]
    fn test_command_extractor_missing_tool() {
        let extractor = CommandExtractor::new("tsdocgen-no-such-extractor", vec![]);
        let err = extractor.extract("ui").unwrap_err();
        assert!(err.is_extraction());
        assert!(err.to_string().contains("failed to run"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_extractor_nonzero_exit() {
        let extractor = CommandExtractor::new(
            "sh",
            vec!["-c".to_string(), "echo broken tsconfig >&2; exit 3".to_string()],
        );
        let err = extractor.extract("ui").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'ui'"));
        assert!(msg.contains("broken tsconfig"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_extractor_missing_artifact() {
        let extractor = CommandExtractor::new("sh", vec!["-c".to_string(), "true".to_string()]);
        let err = extractor.extract("ui").unwrap_err();
        assert!(err.to_string().contains("missing output artifact"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_extractor_reads_output() {
        let extractor = CommandExtractor::new(
            "sh",
            vec![
                "-c".to_string(),
                format!(
                    "printf '{{\"children\": [{{\"name\": \"%s\"}}]}}' {} > {}",
                    PACKAGE_PLACEHOLDER, OUTPUT_PLACEHOLDER
                ),
            ],
        );
        let tree = extractor.extract("Button").unwrap();
        let children = tree.get("children").and_then(DocValue::as_list).unwrap();
        assert_eq!(children[0].get("name").and_then(DocValue::as_str), Some("Button"));
    }

    #[test]
    fn test_cache_hits_until_invalidated() {
        let cached = CachedExtractor::new(Counting { calls: Cell::new(0) });
        cached.extract("ui").unwrap();
        cached.extract("ui").unwrap();
        assert_eq!(cached.inner.calls.get(), 1);
        assert_eq!(cached.len(), 1);

        assert!(cached.invalidate("ui"));
        assert!(!cached.invalidate("ui"));
        cached.extract("ui").unwrap();
        assert_eq!(cached.inner.calls.get(), 2);

        cached.clear();
        assert!(cached.is_empty());
    }

    #[test]
    fn test_cache_stale_after_source_change() {
        let src = TempDir::new().unwrap();
        let file = src.path().join("index.ts");
        std::fs::write(&file, "export class A {}").unwrap();

        let cached = CachedExtractor::new(Counting { calls: Cell::new(0) })
            .with_source_root(src.path());
        cached.extract("ui").unwrap();
        cached.extract("ui").unwrap();
        assert_eq!(cached.inner.calls.get(), 1);

        let later = SystemTime::now() + std::time::Duration::from_secs(60);
        std::fs::File::options()
            .write(true)
            .open(&file)
            .unwrap()
            .set_modified(later)
            .unwrap();
        cached.extract("ui").unwrap();
        assert_eq!(cached.inner.calls.get(), 2);
    }

    #[test]
    fn test_cache_source_errors_are_extraction_failures() {
        let src = TempDir::new().unwrap();
        let root = src.path().join("src");
        std::fs::create_dir(&root).unwrap();

        let cached = CachedExtractor::new(Counting { calls: Cell::new(0) }).with_source_root(&root);
        cached.extract("ui").unwrap();

        std::fs::remove_dir(&root).unwrap();
        let err = cached.extract("ui").unwrap_err();
        assert!(err.is_extraction());
        assert!(err.to_string().contains("'ui'"));
        assert!(err.to_string().contains("cannot check sources"));
    }
}
