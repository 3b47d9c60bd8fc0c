use serde::Serialize;
use std::path::PathBuf;

/// Default builtin namespace prefix (`@builtin/widgets`).
pub const DEFAULT_NAMESPACE: &str = "@builtin";
/// Descriptor file every package directory carries.
pub const DESCRIPTOR_FILE: &str = "package.json";
/// Packages with more files than this produce an advisory warning.
pub const DEFAULT_MAX_FILES: usize = 1000;
/// How many ancestors of the project root are searched for SDK and
/// `node_modules` directories.
pub const ANCESTOR_SEARCH_DEPTH: usize = 10;

/// What to do when a package cannot be located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    /// Raise a `NotFound` error that aborts the current call chain.
    #[default]
    Strict,
    /// Substitute an empty stub package and record a warning.
    Tolerant,
}

impl ResolutionMode {
    pub fn is_strict(self) -> bool {
        self == ResolutionMode::Strict
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub project_root: PathBuf,
    pub mode: ResolutionMode,
    pub max_files: usize,
    pub namespace: String,
    pub descriptor_file: String,
    pub search_depth: usize,
}

impl ResolverConfig {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// The prefix a builtin specifier starts with, e.g. `@builtin/`.
    pub fn namespace_prefix(&self) -> String {
        format!("{}/", self.namespace.trim_end_matches('/'))
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            mode: ResolutionMode::default(),
            max_files: DEFAULT_MAX_FILES,
            namespace: DEFAULT_NAMESPACE.to_string(),
            descriptor_file: DESCRIPTOR_FILE.to_string(),
            search_depth: ANCESTOR_SEARCH_DEPTH,
        }
    }
}

/// Options for copying a resolution into an output tree.
#[derive(Debug, Clone)]
pub struct MaterializeOptions {
    pub output_root: PathBuf,
    pub mode: ResolutionMode,
    /// Copy independent packages on the rayon pool.
    pub parallel: bool,
}

impl MaterializeOptions {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            mode: ResolutionMode::default(),
            parallel: true,
        }
    }

    pub fn with_mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}
