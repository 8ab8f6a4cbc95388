//! The `Advisor` collaborator: a swappable policy for whether a build node
//! should be reused or recompiled, mirroring how the teacher isolates
//! `Loader`/`RegistryClient` as collaborators the build logic doesn't own.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Decides whether previously computed results for a file are still good.
pub trait Advisor {
    fn should_reuse(&self, path: &Path) -> bool;
}

/// Never reuses a result; every build pass recomputes everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRecompile;

impl Advisor for AlwaysRecompile {
    fn should_reuse(&self, _path: &Path) -> bool {
        false
    }
}

/// Reuses a result as long as the file's recorded modification time hasn't
/// advanced past the last time it was seen.
#[derive(Debug, Clone, Default)]
pub struct MtimeAdvisor {
    last_seen: HashMap<PathBuf, SystemTime>,
}

impl MtimeAdvisor {
    pub fn new() -> Self {
        MtimeAdvisor::default()
    }

    pub fn record(&mut self, path: &Path, modified: SystemTime) {
        self.last_seen.insert(path.to_path_buf(), modified);
    }
}

impl Advisor for MtimeAdvisor {
    fn should_reuse(&self, path: &Path) -> bool {
        let recorded = match self.last_seen.get(path) {
            Some(t) => *t,
            None => return false,
        };
        match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(current) => current <= recorded,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_recompile_never_reuses() {
        assert!(!AlwaysRecompile.should_reuse(Path::new("a.ctt")));
    }

    #[test]
    fn mtime_advisor_refuses_reuse_for_unseen_files() {
        let advisor = MtimeAdvisor::new();
        assert!(!advisor.should_reuse(Path::new("never-seen.ctt")));
    }
}
