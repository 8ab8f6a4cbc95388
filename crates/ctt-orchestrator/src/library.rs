//! A library: a manifest plus the source files it owns, read either from
//! disk or from an in-memory fixture for tests.

use crate::manifest::{LibraryConfig, ManifestError, ManifestLoader};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where a library's file contents actually come from.
#[derive(Debug, Clone)]
pub enum LibrarySource {
    Disk(PathBuf),
    Mocked(HashMap<PathBuf, String>),
}

/// A library ready to be fed into the build graph.
#[derive(Debug, Clone)]
pub struct Library {
    pub config: LibraryConfig,
    pub source: LibrarySource,
}

impl Library {
    /// Discovers a library rooted above `start` using `loader` to parse its
    /// manifest.
    pub fn discover(start: &Path, loader: &dyn ManifestLoader) -> Result<Library, ManifestError> {
        let root = crate::manifest::find_library_root(start).ok_or_else(|| {
            ManifestError::Io(start.to_path_buf(), "no ctt.toml found above this path".to_string())
        })?;
        let config = loader.load(&root)?;
        Ok(Library {
            config,
            source: LibrarySource::Disk(root),
        })
    }

    /// Builds a library backed entirely by in-memory fixtures, for tests.
    pub fn mocked(name: &str, files: HashMap<PathBuf, String>) -> Library {
        Library {
            config: LibraryConfig {
                name: name.to_string(),
                library_sources: files.keys().cloned().collect(),
            },
            source: LibrarySource::Mocked(files),
        }
    }

    pub fn read_file(&self, path: &Path) -> io::Result<String> {
        match &self.source {
            LibrarySource::Disk(root) => fs::read_to_string(root.join(path)),
            LibrarySource::Mocked(files) => files.get(path).cloned().ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, format!("{} not in mocked library", path.display()))
            }),
        }
    }

    /// A stable identity for this library, suitable as a
    /// [`crate::primitive_factory`] cache key.
    pub fn identity(&self) -> String {
        match &self.source {
            LibrarySource::Disk(root) => root.display().to_string(),
            LibrarySource::Mocked(_) => format!("mocked:{}", self.config.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mocked_library_reads_its_fixture_files() {
        let mut files = HashMap::new();
        files.insert(PathBuf::from("main.ctt"), "Type0".to_string());
        let lib = Library::mocked("demo", files);
        assert_eq!(lib.read_file(Path::new("main.ctt")).unwrap(), "Type0");
    }

    #[test]
    fn mocked_library_reports_missing_files() {
        let lib = Library::mocked("demo", HashMap::new());
        assert!(lib.read_file(Path::new("missing.ctt")).is_err());
    }

    #[test]
    fn identity_differs_between_mocked_libraries_with_different_names() {
        let a = Library::mocked("a", HashMap::new());
        let b = Library::mocked("b", HashMap::new());
        assert_ne!(a.identity(), b.identity());
    }
}
