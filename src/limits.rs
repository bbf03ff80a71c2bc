// Size limits: file and directory-tree thresholds checked before any
// upload is attempted.

use std::fs;
use std::path::Path;

use crate::error::Result;

pub const MB: u64 = 1024 * 1024;

/// Default single-file limit in megabytes.
pub const DEFAULT_FILE_LIMIT_MB: u64 = 100;
/// Default directory-tree limit in megabytes.
pub const DEFAULT_DIRECTORY_LIMIT_MB: u64 = 500;

/// Outcome of a single size check. Nothing here is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeCheck {
    pub size: u64,
    pub limit: u64,
    pub exceeds: bool,
}

impl SizeCheck {
    fn new(size: u64, limit: u64) -> Self {
        SizeCheck {
            size,
            limit,
            exceeds: size > limit,
        }
    }
}

/// Byte thresholds for a single file and for a whole directory tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    pub file: u64,
    pub directory: u64,
}

impl Default for SizeLimits {
    fn default() -> Self {
        SizeLimits {
            file: DEFAULT_FILE_LIMIT_MB * MB,
            directory: DEFAULT_DIRECTORY_LIMIT_MB * MB,
        }
    }
}

impl SizeLimits {
    pub fn from_megabytes(file_mb: u64, directory_mb: u64) -> Self {
        SizeLimits {
            file: file_mb.saturating_mul(MB),
            directory: directory_mb.saturating_mul(MB),
        }
    }

    /// Compare the size reported by filesystem metadata with the file limit.
    pub fn check_file(&self, path: &Path) -> Result<SizeCheck> {
        let size = fs::metadata(path)?.len();
        Ok(SizeCheck::new(size, self.file))
    }

    /// Sum every regular file below `path` and compare with the directory limit.
    pub fn check_directory(&self, path: &Path) -> Result<SizeCheck> {
        let total = directory_size(path)?;
        Ok(SizeCheck::new(total, self.directory))
    }
}

/// Recursive byte count of all regular files under `path`.
pub fn directory_size(path: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in fs::read_dir(path)? {
        let entry_path = entry?.path();
        let metadata = fs::metadata(&entry_path)?;
        if metadata.is_file() {
            total += metadata.len();
        } else if metadata.is_dir() {
            total += directory_size(&entry_path)?;
        }
    }
    Ok(total)
}

/// Human readable size, e.g. `"1.50 MB"`.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < MB {
        format!("{:.2} KB", b / KB)
    } else if bytes < MB * 1024 {
        format!("{:.2} MB", b / (KB * KB))
    } else {
        format!("{:.2} GB", b / (KB * KB * KB))
    }
}
