// Directory walker: flattens a directory tree into the list of files sent
// in one multipart request. Relative names keep the directory structure by
// escaping the separators, the service rebuilds the hierarchy from them.

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result, SizeSubject};
use crate::limits::SizeLimits;

/// Literal that replaces every path separator in a transport name.
pub const ESCAPED_SEPARATOR: &str = "%2F";

/// One file to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the parent of the walk root, separators escaped.
    pub transport_name: String,
    pub absolute_path: PathBuf,
}

/// Enumerate every regular file below `root`.
///
/// Each file is checked against the single-file limit while walking, the
/// first offender aborts the walk. Directories produce no entries. Order is
/// whatever the filesystem returns.
pub fn enumerate(root: &Path, limits: &SizeLimits) -> Result<Vec<FileEntry>> {
    let base = root.parent().unwrap_or(root);
    let mut files = Vec::new();
    walk(base, root, limits, &mut files)?;
    Ok(files)
}

fn walk(base: &Path, current: &Path, limits: &SizeLimits, files: &mut Vec<FileEntry>) -> Result<()> {
    for entry in fs::read_dir(current)? {
        let entry = entry?;
        let path = entry.path();
        let metadata = fs::metadata(&path)?;

        if metadata.is_dir() {
            walk(base, &path, limits, files)?;
        } else if metadata.is_file() {
            let check = limits.check_file(&path)?;
            if check.exceeds {
                let name = entry.file_name().to_string_lossy().into_owned();
                return Err(Error::size_limit(SizeSubject::File, name, check.size, check.limit));
            }

            let relative = path.strip_prefix(base).map_err(std::io::Error::other)?;
            let transport_name = escape(relative);
            debug!(file = %path.display(), %transport_name, "queued for upload");
            files.push(FileEntry {
                transport_name,
                absolute_path: path,
            });
        }
    }
    Ok(())
}

/// Join the components of a relative path with the escaped separator.
pub fn escape(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(ESCAPED_SEPARATOR)
}
