//! Gathers input documents from files and directories.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const RDF_EXTENSIONS: &[&str] = &["json", "jsonld", "ttl"];

/// Files found plus the inputs that were skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedFiles {
    pub files: Vec<PathBuf>,
    pub ignored: Vec<PathBuf>,
}

impl CollectedFiles {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn has_supported_extension(allowed: &[&str], path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lower = ext.to_ascii_lowercase();
            allowed.iter().any(|candidate| *candidate == lower)
        })
        .unwrap_or(false)
}

/// Expands `paths` into a sorted, duplicate-free list of files whose
/// extension is one of `extensions`. Directories are walked recursively.
/// A file with another extension or a path that does not exist is logged
/// and recorded in `ignored`.
pub fn collect_files<P: AsRef<Path>>(paths: &[P], extensions: &[&str]) -> CollectedFiles {
    let mut files = BTreeSet::new();
    let mut ignored = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if path.is_file() {
            if has_supported_extension(extensions, path) {
                files.insert(path.to_path_buf());
            } else {
                warn!(path = %path.display(), ?extensions, "ignoring file with unsupported extension");
                ignored.push(path.to_path_buf());
            }
        } else if path.is_dir() {
            for entry in WalkDir::new(path).follow_links(true) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                if has_supported_extension(extensions, entry.path()) {
                    files.insert(entry.into_path());
                }
            }
        } else {
            warn!(path = %path.display(), "ignoring path that is neither a file nor a directory");
            ignored.push(path.to_path_buf());
        }
    }

    debug!(files = files.len(), ignored = ignored.len(), "collected input files");
    CollectedFiles {
        files: files.into_iter().collect(),
        ignored,
    }
}

/// JSON-LD and Turtle together, the formats both validation and the syntax
/// check accept.
pub fn collect_rdf_files<P: AsRef<Path>>(paths: &[P]) -> CollectedFiles {
    collect_files(paths, RDF_EXTENSIONS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const JSONLD: &[&str] = &["json", "jsonld"];

    #[test]
    fn walks_directories_recursively() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::create_dir_all(dir.path().join("nested/deeper"))?;
        fs::write(dir.path().join("a.jsonld"), "{}")?;
        fs::write(dir.path().join("nested/b.json"), "{}")?;
        fs::write(dir.path().join("nested/deeper/c.JSONLD"), "{}")?;
        fs::write(dir.path().join("nested/notes.txt"), "")?;
        fs::write(dir.path().join("shapes.ttl"), "")?;

        let collected = collect_files(&[dir.path()], JSONLD);
        assert_eq!(collected.files.len(), 3);
        assert!(collected.ignored.is_empty());
        assert!(collected.files.windows(2).all(|pair| pair[0] < pair[1]));
        Ok(())
    }

    #[test]
    fn deduplicates_overlapping_inputs() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let file = dir.path().join("a.ttl");
        fs::write(&file, "")?;

        let collected = collect_files(&[dir.path().to_path_buf(), file.clone()], &["ttl"]);
        assert_eq!(collected.files, vec![file]);
        Ok(())
    }

    #[test]
    fn records_ignored_inputs() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        let text = dir.path().join("readme.md");
        fs::write(&text, "")?;
        let missing = dir.path().join("missing.jsonld");

        let collected = collect_files(&[text.clone(), missing.clone()], JSONLD);
        assert!(collected.is_empty());
        assert_eq!(collected.ignored, vec![text, missing]);
        Ok(())
    }

    #[test]
    fn rdf_collection_takes_both_formats() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("a.jsonld"), "{}")?;
        fs::write(dir.path().join("b.ttl"), "")?;
        assert_eq!(collect_rdf_files(&[dir.path()]).files.len(), 2);
        Ok(())
    }
}
