// Upload pipeline: size pre-check, directory walk, one multipart POST,
// hash extraction, then a best-effort history entry.

use std::fs;
use std::path::{Path, PathBuf};

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{info, warn};

use crate::api::{AddEntry, ApiClient};
use crate::config::{AppContext, Settings};
use crate::error::{Error, Result, SizeSubject};
use crate::history::{HistoryStore, UploadKind, UploadRecord};
use crate::limits::MB;
use crate::walker::{self, FileEntry};

/// Characters left alone by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Service code for an oversized upload.
pub const CODE_SIZE_LIMIT: i64 = 30001;
/// Service code for an exhausted storage quota.
pub const CODE_STORAGE_QUOTA: i64 = 30002;

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOutcome {
    pub content_hash: String,
    pub short_alias: Option<String>,
    pub kind: UploadKind,
    pub size_bytes: u64,
    pub file_count: u64,
    /// Set when the upload went through but its history record was lost.
    pub history_error: Option<String>,
}

pub struct Uploader {
    api: ApiClient,
    settings: Settings,
    history: HistoryStore,
}

impl Uploader {
    pub fn new(api: ApiClient, settings: Settings, history: HistoryStore) -> Self {
        Uploader {
            api,
            settings,
            history,
        }
    }

    pub fn from_context(ctx: &AppContext) -> Result<Self> {
        Ok(Self::new(
            ApiClient::from_context(ctx)?,
            ctx.settings.clone(),
            ctx.history.clone(),
        ))
    }

    /// Upload a file or a directory, whichever `path` is.
    pub fn upload(&self, path: &Path) -> Result<UploadOutcome> {
        if fs::metadata(path)?.is_dir() {
            self.upload_directory(path)
        } else {
            self.upload_file(path)
        }
    }

    pub fn upload_file(&self, path: &Path) -> Result<UploadOutcome> {
        let check = self.settings.limits.check_file(path)?;
        if check.exceeds {
            return Err(Error::size_limit(
                SizeSubject::File,
                path.display().to_string(),
                check.size,
                check.limit,
            ));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let entry = FileEntry {
            transport_name: utf8_percent_encode(&file_name, URI_COMPONENT).to_string(),
            absolute_path: path.to_path_buf(),
        };

        let entries = self.api.add(&[entry]).map_err(|e| self.translate(e))?;
        let item = find_entry(&entries, &file_name).ok_or_else(|| Error::HashNotFound("File".into()))?;

        Ok(self.finish(path, item, check.size, 1, UploadKind::File))
    }

    pub fn upload_directory(&self, path: &Path) -> Result<UploadOutcome> {
        let check = self.settings.limits.check_directory(path)?;
        if check.exceeds {
            return Err(Error::size_limit(
                SizeSubject::Directory,
                path.display().to_string(),
                check.size,
                check.limit,
            ));
        }

        // Rebuilding from components drops a trailing separator.
        let root: PathBuf = path.components().collect();
        let dist = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let files = walker::enumerate(&root, &self.settings.limits)?;
        if files.is_empty() {
            return Err(Error::EmptyDirectory(root.display().to_string()));
        }

        let entries = self.api.add(&files).map_err(|e| self.translate(e))?;
        let item = find_entry(&entries, &dist).ok_or_else(|| Error::HashNotFound("Directory".into()))?;

        Ok(self.finish(&root, item, check.size, files.len() as u64, UploadKind::Directory))
    }

    fn finish(
        &self,
        path: &Path,
        item: &AddEntry,
        size_bytes: u64,
        file_count: u64,
        kind: UploadKind,
    ) -> UploadOutcome {
        let short_alias = item.short_url.clone().filter(|s| !s.is_empty());
        info!(path = %path.display(), hash = %item.hash, files = file_count, "upload complete");

        let record = UploadRecord::new(
            path,
            item.hash.clone(),
            size_bytes,
            file_count,
            kind,
            short_alias.clone(),
        );
        let history_error = match self.history.save(record) {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "failed to save upload history");
                Some(e.to_string())
            }
        };

        UploadOutcome {
            content_hash: item.hash.clone(),
            short_alias,
            kind,
            size_bytes,
            file_count,
            history_error,
        }
    }

    /// Replace the message of known service codes with one that names the
    /// configured limits.
    fn translate(&self, err: Error) -> Error {
        match err {
            Error::Remote {
                status,
                code: Some(code),
                message,
            } => {
                let message = match describe_code(code, &self.settings) {
                    Some(text) => format!("{} (Code: {})", text, code),
                    None => message,
                };
                Error::Remote {
                    status,
                    code: Some(code),
                    message,
                }
            }
            other => other,
        }
    }
}

fn find_entry<'a>(entries: &'a [AddEntry], name: &str) -> Option<&'a AddEntry> {
    entries.iter().find(|e| e.name == name)
}

/// Human text for the service codes this client knows about.
pub fn describe_code(code: i64, settings: &Settings) -> Option<String> {
    match code {
        CODE_SIZE_LIMIT => Some(format!(
            "File too large, single file max size: {}MB,single folder max size: {}MB",
            settings.limits.file / MB,
            settings.limits.directory / MB
        )),
        CODE_STORAGE_QUOTA => {
            let quota = settings
                .storage_limit_mb
                .map(|mb| (mb as f64 / 1000.0).to_string())
                .unwrap_or_else(|| "unknown".to_string());
            Some(format!("Max storage quorum {} GB reached", quota))
        }
        _ => None,
    }
}
