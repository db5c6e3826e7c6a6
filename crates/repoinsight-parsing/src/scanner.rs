//! Repository file scanner
//!
//! Walks a repository root in filesystem order, applying the directory
//! exclusion list, `.gitignore` rules, the binary-extension deny set,
//! and the configured allow-list.

use crate::error::{ParsingError, ParsingResult};
use crate::file_types::{classify, extension_of, is_binary_extension, FileType};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A file the scanner decided to emit
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub absolute_path: PathBuf,
    /// Repo-relative path with POSIX separators
    pub relative_path: String,
    pub file_type: FileType,
    pub language: Option<&'static str>,
    pub extension: Option<String>,
    pub size_bytes: u64,
}

/// Scanner configured with allow/deny lists
pub struct FileScanner {
    allowed_extensions: Vec<String>,
    excluded_directories: Vec<String>,
}

impl FileScanner {
    pub fn new(allowed_extensions: Vec<String>, excluded_directories: Vec<String>) -> Self {
        Self {
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.to_lowercase())
                .collect(),
            excluded_directories,
        }
    }

    /// Build a scanner from the application scanner config
    pub fn from_config(config: &repoinsight_config::ScannerConfig) -> Self {
        Self::new(
            config.allowed_extensions.clone(),
            config.excluded_directories.clone(),
        )
    }

    /// Scan the repository, returning emitted files in walk order.
    ///
    /// # Errors
    ///
    /// Returns `ParsingError::InvalidRoot` when the root is not a
    /// directory. Per-file stat failures are logged and skipped.
    #[tracing::instrument(skip(self), fields(root = %root.display()))]
    pub fn scan(&self, root: &Path) -> ParsingResult<Vec<ScannedFile>> {
        if !root.is_dir() {
            return Err(ParsingError::InvalidRoot(root.display().to_string()));
        }

        let gitignore = load_gitignore(root);
        let mut emitted = Vec::new();
        let mut skipped = 0_usize;

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                !self.should_skip_directory(&name)
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Walk error: {e}");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let absolute = entry.path();
            let relative = match absolute.strip_prefix(root) {
                Ok(rel) => posix_path(rel),
                Err(_) => continue,
            };

            if !self.should_process(absolute, &relative, &gitignore) {
                skipped += 1;
                continue;
            }

            let size_bytes = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    tracing::warn!(path = %relative, "Failed to stat file: {e}");
                    continue;
                }
            };

            let (file_type, language) = classify(absolute);
            emitted.push(ScannedFile {
                absolute_path: absolute.to_path_buf(),
                relative_path: relative,
                file_type,
                language,
                extension: extension_of(absolute),
                size_bytes,
            });
        }

        tracing::info!(
            emitted = emitted.len(),
            skipped,
            "Repository scan complete"
        );
        Ok(emitted)
    }

    fn should_skip_directory(&self, name: &str) -> bool {
        name.starts_with('.') || self.excluded_directories.iter().any(|d| d == name)
    }

    fn should_process(&self, absolute: &Path, relative: &str, gitignore: &Gitignore) -> bool {
        // Gitignore rules match the relative path, its parents, or the
        // basename
        if gitignore
            .matched_path_or_any_parents(relative, false)
            .is_ignore()
        {
            return false;
        }

        let basename = absolute
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if let Some(extension) = extension_of(absolute) {
            if is_binary_extension(&extension) {
                return false;
            }
            return self.allowed_extensions.iter().any(|e| e == &extension);
        }

        // No extension: allow-list entries without a leading dot match
        // the basename case-insensitively (dockerfile, makefile, ...)
        self.allowed_extensions
            .iter()
            .filter(|e| !e.starts_with('.'))
            .any(|e| basename == *e)
    }
}

fn load_gitignore(root: &Path) -> Gitignore {
    let mut builder = GitignoreBuilder::new(root);
    let gitignore_path = root.join(".gitignore");
    if gitignore_path.is_file() {
        if let Some(e) = builder.add(&gitignore_path) {
            tracing::warn!("Failed to parse .gitignore: {e}");
        }
    }
    builder.build().unwrap_or_else(|e| {
        tracing::warn!("Failed to build gitignore matcher: {e}");
        Gitignore::empty()
    })
}

fn posix_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
