use std::path::{Path, PathBuf};

use thiserror::Error;

/// Name of the project file looked up next to the sources.
pub const PROJECT_FILE: &str = "tealang.toml";

/// Project configuration from tealang.toml.
#[derive(Clone, Debug)]
pub struct Project {
    pub name: String,
    /// Main source file, relative paths resolved against `root_dir`.
    pub entry: Option<PathBuf>,
    /// Target version to compile for, if pinned by the project.
    pub version: Option<u8>,
    /// Extra directories searched for imported modules.
    pub module_paths: Vec<PathBuf>,
    pub root_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("missing 'name' in {file}")]
    MissingName { file: String },
    #[error("invalid target version '{value}' in {file}: expected a number from 2 to 5")]
    InvalidVersion { value: String, file: String },
}

/// Parse a minimal TOML string array: `["a", "b", "c"]` → `vec!["a", "b", "c"]`.
fn parse_string_array(s: &str) -> Vec<String> {
    let s = s.trim();
    if !s.starts_with('[') || !s.ends_with(']') {
        return Vec::new();
    }
    let inner = &s[1..s.len() - 1];
    inner
        .split(',')
        .map(|part| part.trim().trim_matches('"').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Project {
    /// Load a project from a tealang.toml file.
    pub fn load(toml_path: &Path) -> Result<Project, ConfigError> {
        let content = std::fs::read_to_string(toml_path).map_err(|source| ConfigError::Io {
            path: toml_path.to_path_buf(),
            source,
        })?;
        let root_dir = toml_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        Self::parse(&content, root_dir)
    }

    /// Section-aware reader for the handful of keys the compiler uses.
    pub fn parse(content: &str, root_dir: PathBuf) -> Result<Project, ConfigError> {
        let mut name = String::new();
        let mut entry = None;
        let mut version = None;
        let mut module_paths = Vec::new();
        let mut current_section = String::new();

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                current_section = trimmed[1..trimmed.len() - 1].trim().to_string();
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                continue;
            };
            let key = key.trim().trim_matches('"');
            let value = value.trim();

            match (current_section.as_str(), key) {
                ("project", "name") => name = value.trim_matches('"').to_string(),
                ("project", "entry") => entry = Some(root_dir.join(value.trim_matches('"'))),
                ("project", "version") => {
                    let raw = value.trim_matches('"');
                    let parsed = raw
                        .parse::<u8>()
                        .ok()
                        .filter(|v| (2..=5).contains(v))
                        .ok_or_else(|| ConfigError::InvalidVersion {
                            value: raw.to_string(),
                            file: PROJECT_FILE.to_string(),
                        })?;
                    version = Some(parsed);
                }
                ("modules", "paths") => {
                    module_paths = parse_string_array(value)
                        .into_iter()
                        .map(|p| root_dir.join(p))
                        .collect();
                }
                _ => {}
            }
        }

        if name.is_empty() {
            return Err(ConfigError::MissingName {
                file: PROJECT_FILE.to_string(),
            });
        }

        Ok(Project {
            name,
            entry,
            version,
            module_paths,
            root_dir,
        })
    }

    /// Try to find a tealang.toml in the given directory or its ancestors.
    pub fn find(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(PROJECT_FILE);
            if candidate.exists() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }
}
