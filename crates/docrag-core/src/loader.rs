use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::types::Document;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Loads every file under `root` whose relative path matches a glob.
///
/// `*.md` only matches files directly in `root`; use `**/*.md` to recurse.
pub struct DirectoryLoader {
    root: PathBuf,
    pattern: Pattern,
}

impl DirectoryLoader {
    pub fn new(root: impl Into<PathBuf>, glob: &str) -> Result<Self> {
        let pattern = Pattern::new(glob)
            .map_err(|e| Error::InvalidConfig(format!("invalid glob '{}': {}", glob, e)))?;
        Ok(Self { root: root.into(), pattern })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Files that fail to read or decode are logged and skipped.
    pub fn load(&self) -> Result<Vec<Document>> {
        if !self.root.is_dir() {
            return Err(Error::NotFound(format!("source directory {}", self.root.display())));
        }
        let files = self.list_matching_files();
        let mut documents = Vec::with_capacity(files.len());
        for path in &files {
            match fs::read_to_string(path) {
                Ok(content) => {
                    debug!(path = %path.display(), bytes = content.len(), "loaded document");
                    documents.push(Document::new(content, path.to_string_lossy()));
                }
                Err(e) => warn!("skipping {}: {}", path.display(), e),
            }
        }
        info!(
            "Loaded {}/{} files matching '{}' from {}",
            documents.len(),
            files.len(),
            self.pattern,
            self.root.display()
        );
        Ok(documents)
    }

    fn list_matching_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) => Some(e),
                Err(e) => {
                    warn!("skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|path| {
                let relative = path.strip_prefix(&self.root).unwrap_or(path);
                self.pattern.matches_path_with(relative, MATCH_OPTIONS)
            })
            .collect();
        files.sort();
        files
    }
}
