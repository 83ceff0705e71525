pub mod project;
pub mod resolve;
pub mod stdlib;

use std::path::PathBuf;

/// Settings for one compilation.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Target version, 2 through 5.
    pub version: u8,
    /// Appended to user imports that have no extension.
    pub default_extension: String,
    /// Searched after the importing file's directory.
    pub search_paths: Vec<PathBuf>,
}

pub const DEFAULT_VERSION: u8 = 5;
pub const MIN_VERSION: u8 = 2;
pub const MAX_VERSION: u8 = 5;
pub const DEFAULT_EXTENSION: &str = ".tl";

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            version: DEFAULT_VERSION,
            default_extension: DEFAULT_EXTENSION.to_string(),
            search_paths: Vec::new(),
        }
    }
}

impl CompileOptions {
    /// Fill in what the project file pins; explicit settings made later win.
    pub fn with_project(mut self, project: &project::Project) -> Self {
        if let Some(version) = project.version {
            self.version = version;
        }
        self.search_paths.extend(project.module_paths.iter().cloned());
        self
    }
}
