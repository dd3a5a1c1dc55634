//! File system archive.
//!
//! Reads an export laid out as `<root>/<contact folder>/message_*.json`.

use super::{is_hidden, is_message_file, ArchiveError, MessageSource};
use crate::models::{ContactId, MessageFile};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Archive backed by a directory on disk.
#[derive(Debug, Clone)]
pub struct FsArchive {
    root: PathBuf,
}

impl FsArchive {
    /// Create an archive reader for the given root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open an archive, failing if the root directory does not exist.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let archive = Self::new(root);
        if !archive.root.is_dir() {
            return Err(ArchiveError::RootNotFound(archive.root));
        }
        Ok(archive)
    }

    /// Root directory of the archive.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List the immediate, non-hidden children of a directory in name order.
    fn children(&self, dir: &Path) -> Result<Vec<DirEntry>, ArchiveError> {
        let mut entries = Vec::new();

        let walker = WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_hidden(&entry.file_name().to_string_lossy()));

        for entry in walker {
            let entry = entry.map_err(|source| ArchiveError::Walk {
                path: dir.to_path_buf(),
                source,
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }
}

impl MessageSource for FsArchive {
    fn list_contacts(&self) -> Result<Vec<ContactId>, ArchiveError> {
        if !self.root.is_dir() {
            return Err(ArchiveError::RootNotFound(self.root.clone()));
        }

        let contacts: Vec<ContactId> = self
            .children(&self.root)?
            .into_iter()
            .filter(|entry| entry.file_type().is_dir())
            .map(|entry| ContactId::new(entry.file_name().to_string_lossy()))
            .collect();

        debug!(
            "Found {} contact folders in {}",
            contacts.len(),
            self.root.display()
        );
        Ok(contacts)
    }

    fn load_message_files(&self, contact: &ContactId) -> Result<Vec<MessageFile>, ArchiveError> {
        let contact_dir = self.root.join(contact.as_str());
        if !contact_dir.is_dir() {
            return Err(ArchiveError::ContactNotFound(contact.to_string()));
        }

        let mut files = Vec::new();
        for entry in self.children(&contact_dir)? {
            let name = entry.file_name().to_string_lossy();
            if !entry.file_type().is_file() || !is_message_file(&name) {
                continue;
            }

            let path = entry.path();
            let content = fs::read_to_string(path).map_err(|source| ArchiveError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let file: MessageFile =
                serde_json::from_str(&content).map_err(|source| ArchiveError::Parse {
                    path: path.to_path_buf(),
                    source,
                })?;

            debug!("{}: {} messages", path.display(), file.messages.len());
            files.push(file);
        }

        Ok(files)
    }
}
