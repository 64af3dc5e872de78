//! Check Discovery
//!
//! Two halves meet here. The filesystem walk finds check modules: `.rs`
//! files named `perftest_*`, in lexicographic path order. The registry
//! holds every function tagged `#[perftest]`, each remembering its source
//! file and line. A check is discovered when its source file is one of the
//! walked modules and its own name carries the same prefix; within a module,
//! checks run in declaration order.

use perftest_core::{CHECK_PREFIX, CheckDef};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Discovery failures
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The root does not exist
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    /// A single file was given that is not a check module
    #[error("not a check module (expected a `{prefix}*.rs` file): {path}")]
    NotACheckModule {
        /// Offending path
        path: PathBuf,
        /// Required file name prefix
        prefix: &'static str,
    },

    /// Directory traversal failed
    #[error("failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// A registered check matched to the module it was found in
#[derive(Debug, Clone)]
pub struct DiscoveredCheck {
    /// Module file the check was discovered in
    pub module: PathBuf,
    /// Registration record
    pub def: &'static CheckDef,
}

impl DiscoveredCheck {
    /// `module::path::function`
    pub fn qualified_name(&self) -> String {
        self.def.qualified_name()
    }
}

/// Whether `path` names a check module
pub fn is_check_module(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.starts_with(CHECK_PREFIX) && path.extension().is_some_and(|ext| ext == "rs")
}

/// Enumerate check modules under `root`.
///
/// A file root must itself be a check module and yields only itself. A
/// directory root is walked recursively. Paths are canonical and sorted.
pub fn discover_modules(root: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
    let root = root
        .canonicalize()
        .map_err(|_| DiscoveryError::PathNotFound(root.to_path_buf()))?;

    if root.is_file() {
        if !is_check_module(&root) {
            return Err(DiscoveryError::NotACheckModule {
                path: root,
                prefix: CHECK_PREFIX,
            });
        }
        return Ok(vec![root]);
    }

    let mut modules = Vec::new();
    for entry in WalkDir::new(&root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_check_module(entry.path()) {
            modules.push(entry.into_path());
        }
    }
    modules.sort();

    tracing::debug!(root = %root.display(), count = modules.len(), "check modules found");
    Ok(modules)
}

/// Whether a check registered from `source` (as given by `file!()`) lives in `module`
fn defined_in(module: &Path, source: &str) -> bool {
    let source = Path::new(source);
    if source.is_absolute() {
        return module == source;
    }
    // `file!()` is relative to the package or workspace root; compare the
    // trailing components of the canonical module path.
    module.ends_with(source)
}

/// Select the registered checks defined in `modules`.
///
/// Order: module order, then declaration line.
pub fn match_checks(
    modules: &[PathBuf],
    registry: &[&'static CheckDef],
) -> Vec<DiscoveredCheck> {
    let mut discovered = Vec::new();
    for module in modules {
        let mut in_module: Vec<&'static CheckDef> = registry
            .iter()
            .copied()
            .filter(|def| def.has_check_name() && defined_in(module, def.file))
            .collect();
        in_module.sort_by_key(|def| (def.line, def.name));

        discovered.extend(in_module.into_iter().map(|def| DiscoveredCheck {
            module: module.clone(),
            def,
        }));
    }
    discovered
}

/// Walk `root` and match it against `registry`
pub fn discover(
    root: &Path,
    registry: &[&'static CheckDef],
    filter: Option<&regex::Regex>,
) -> Result<Vec<DiscoveredCheck>, DiscoveryError> {
    let modules = discover_modules(root)?;
    let mut checks = match_checks(&modules, registry);
    if let Some(re) = filter {
        checks.retain(|check| re.is_match(&check.qualified_name()));
    }
    Ok(checks)
}
