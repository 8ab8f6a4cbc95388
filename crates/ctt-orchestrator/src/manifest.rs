//! Library manifests (`ctt.toml`): what a library is called and where its
//! sources live.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Parsed `ctt.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    pub name: String,
    #[serde(default = "default_sources")]
    pub library_sources: Vec<PathBuf>,
}

fn default_sources() -> Vec<PathBuf> {
    vec![PathBuf::from("src")]
}

/// Errors that can occur while loading a manifest.
#[derive(Debug)]
pub enum ManifestError {
    Io(PathBuf, String),
    Parse(PathBuf, String),
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Io(path, e) => write!(f, "failed to read {}: {}", path.display(), e),
            ManifestError::Parse(path, e) => write!(f, "failed to parse {}: {}", path.display(), e),
        }
    }
}

impl std::error::Error for ManifestError {}

/// A swappable source of manifests, so tests can supply an in-memory one
/// without touching the filesystem.
pub trait ManifestLoader {
    fn load(&self, dir: &Path) -> Result<LibraryConfig, ManifestError>;
}

/// The manifest file name used by this toolchain (by analogy with the
/// teacher's `Largo.toml`; see `DESIGN.md`).
pub const MANIFEST_FILE_NAME: &str = "ctt.toml";

/// Loads `ctt.toml` from disk via `serde` + `toml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlManifestLoader;

impl ManifestLoader for TomlManifestLoader {
    fn load(&self, dir: &Path) -> Result<LibraryConfig, ManifestError> {
        let path = dir.join(MANIFEST_FILE_NAME);
        let content = fs::read_to_string(&path).map_err(|e| ManifestError::Io(path.clone(), e.to_string()))?;
        toml::from_str(&content).map_err(|e| ManifestError::Parse(path, e.to_string()))
    }
}

/// Walks upward from `start` looking for a directory containing `ctt.toml`,
/// the same discovery strategy the teacher's `find_project_root` uses for
/// `Largo.toml`.
pub fn find_library_root(start: &Path) -> Option<PathBuf> {
    let mut current = if start.is_file() {
        start.parent()?.to_path_buf()
    } else {
        start.to_path_buf()
    };
    loop {
        if current.join(MANIFEST_FILE_NAME).exists() {
            return Some(current);
        }
        if !current.pop() {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_a_minimal_manifest() {
        let toml = "name = \"demo\"\n";
        let config: LibraryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.name, "demo");
        assert_eq!(config.library_sources, vec![PathBuf::from("src")]);
    }

    #[test]
    fn find_library_root_walks_up_to_the_manifest() {
        let temp = tempfile::tempdir().unwrap();
        let nested = temp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let mut manifest = fs::File::create(temp.path().join(MANIFEST_FILE_NAME)).unwrap();
        writeln!(manifest, "name = \"demo\"").unwrap();

        let found = find_library_root(&nested).unwrap();
        assert_eq!(found, temp.path());
    }

    #[test]
    fn find_library_root_returns_none_without_a_manifest() {
        let temp = tempfile::tempdir().unwrap();
        assert!(find_library_root(temp.path()).is_none());
    }

    #[test]
    fn toml_manifest_loader_reports_io_errors() {
        let temp = tempfile::tempdir().unwrap();
        let err = TomlManifestLoader.load(temp.path()).unwrap_err();
        assert!(matches!(err, ManifestError::Io(..)));
    }
}
