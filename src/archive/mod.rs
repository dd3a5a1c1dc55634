//! Access to exported message archives.
//!
//! An archive is a root directory with one folder per contact. This module
//! exposes it through the [`MessageSource`] trait so analyses can run against
//! the file system ([`FsArchive`]) or an in-memory fixture ([`InMemoryArchive`]).

pub mod fs;
#[cfg(test)]
pub mod memory;

pub use fs::FsArchive;
#[cfg(test)]
pub use memory::InMemoryArchive;

use crate::models::{ContactId, Message, MessageFile};
use std::path::PathBuf;
use thiserror::Error;

/// Substring a file name must contain to be read as a message log.
pub const MESSAGE_FILE_MARKER: &str = "message";

/// Errors raised while reading an archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("archive root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("contact folder not found: {0}")]
    ContactNotFound(String),

    #[error("failed to list {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed message file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A repository of per-contact message logs.
pub trait MessageSource {
    /// Lists every contact of the archive in a stable order.
    fn list_contacts(&self) -> Result<Vec<ContactId>, ArchiveError>;

    /// Loads every message file of a contact in a stable order.
    fn load_message_files(&self, contact: &ContactId) -> Result<Vec<MessageFile>, ArchiveError>;

    /// Loads all messages of a contact, concatenated across files.
    fn load_messages(&self, contact: &ContactId) -> Result<Vec<Message>, ArchiveError> {
        Ok(self
            .load_message_files(contact)?
            .into_iter()
            .flat_map(|file| file.messages)
            .collect())
    }
}

/// Check if a directory entry name is hidden.
pub(crate) fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Check if a file name designates a message log.
pub(crate) fn is_message_file(name: &str) -> bool {
    !is_hidden(name) && name.contains(MESSAGE_FILE_MARKER)
}
