//! Message aggregation over an archive.
//!
//! Contacts whose folder or files cannot be read are skipped: the failure is
//! logged, the contact contributes nothing, and it is recorded in
//! [`Aggregate::skipped`] so the caller can report it at the end of the run.

use crate::archive::{ArchiveError, MessageSource};
use crate::models::{ContactId, Message, MessageFile};
use crate::names::DisplayNameFormatter;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// A contact left out of an aggregate and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedContact {
    pub contact: ContactId,
    pub reason: String,
}

/// Aggregated values keyed by contact, plus the contacts that were skipped.
#[derive(Debug, Clone, Serialize)]
pub struct Aggregate<T> {
    pub entries: BTreeMap<String, T>,
    pub skipped: Vec<SkippedContact>,
}

impl<T> Default for Aggregate<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
            skipped: Vec::new(),
        }
    }
}

impl Aggregate<usize> {
    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.entries.values().sum()
    }
}

/// Messages of one contact, keyed by display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactMessages {
    pub name: String,
    pub messages: Vec<Message>,
}

impl ContactMessages {
    /// Timestamps of every message.
    pub fn timestamps(&self) -> Vec<i64> {
        self.messages.iter().map(|m| m.timestamp_ms).collect()
    }
}

/// Messages for a ranked list of contacts, in rank order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RankedMessages {
    pub contacts: Vec<ContactMessages>,
    pub skipped: Vec<SkippedContact>,
}

/// Walks an archive and aggregates message counts or message lists.
pub struct Aggregator<'a> {
    source: &'a dyn MessageSource,
    formatter: &'a dyn DisplayNameFormatter,
    show_progress: bool,
}

impl<'a> Aggregator<'a> {
    /// Create an aggregator over a message source.
    pub fn new(source: &'a dyn MessageSource, formatter: &'a dyn DisplayNameFormatter) -> Self {
        Self {
            source,
            formatter,
            show_progress: false,
        }
    }

    /// Show a progress bar while contacts are loaded.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Display name of a contact.
    pub fn display_name(&self, contact: &ContactId) -> String {
        self.formatter.display_name(contact)
    }

    /// Count messages per contact, keyed by raw folder name.
    pub fn count_interactions(&self) -> Result<Aggregate<usize>, ArchiveError> {
        let contacts = self.source.list_contacts()?;
        let progress = self.progress_bar(contacts.len(), "Counting messages");
        let mut aggregate = Aggregate::default();

        for contact in &contacts {
            progress.inc(1);
            let Some(files) = self.load(contact, &mut aggregate.skipped) else {
                continue;
            };
            if files.is_empty() {
                debug!("No message files for {}", contact);
                continue;
            }

            let count: usize = files.iter().map(|f| f.messages.len()).sum();
            *aggregate
                .entries
                .entry(contact.as_str().to_string())
                .or_insert(0) += count;
        }

        progress.finish_and_clear();
        Ok(aggregate)
    }

    /// Collect all messages per display name. Folders sharing a display name are merged.
    pub fn collect_messages(&self) -> Result<Aggregate<Vec<Message>>, ArchiveError> {
        let contacts = self.source.list_contacts()?;
        let progress = self.progress_bar(contacts.len(), "Loading messages");
        let mut aggregate: Aggregate<Vec<Message>> = Aggregate::default();

        for contact in &contacts {
            progress.inc(1);
            let Some(files) = self.load(contact, &mut aggregate.skipped) else {
                continue;
            };
            if files.is_empty() {
                debug!("No message files for {}", contact);
                continue;
            }

            aggregate
                .entries
                .entry(self.display_name(contact))
                .or_default()
                .extend(files.into_iter().flat_map(|f| f.messages));
        }

        progress.finish_and_clear();
        Ok(aggregate)
    }

    /// Collect messages for an already ranked list of contacts, keeping rank order.
    ///
    /// A contact whose display name collides with an earlier one is merged into it.
    pub fn collect_ranked_messages(&self, ranked: &[ContactId]) -> RankedMessages {
        let progress = self.progress_bar(ranked.len(), "Loading messages");
        let mut result = RankedMessages::default();

        for contact in ranked {
            progress.inc(1);
            let name = self.display_name(contact);
            debug!("Retrieving messages to/from {}", name);

            let messages = match self.source.load_messages(contact) {
                Ok(messages) => messages,
                Err(e) => {
                    skip(contact, e, &mut result.skipped);
                    continue;
                }
            };

            match result.contacts.iter_mut().find(|c| c.name == name) {
                Some(existing) => existing.messages.extend(messages),
                None => result.contacts.push(ContactMessages { name, messages }),
            }
        }

        progress.finish_and_clear();
        result
    }

    /// Load a contact's files, recording it as skipped on failure.
    fn load(
        &self,
        contact: &ContactId,
        skipped: &mut Vec<SkippedContact>,
    ) -> Option<Vec<MessageFile>> {
        match self.source.load_message_files(contact) {
            Ok(files) => Some(files),
            Err(e) => {
                skip(contact, e, skipped);
                None
            }
        }
    }

    fn progress_bar(&self, len: usize, message: &'static str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} {msg} [{bar:40.cyan/blue}] {pos}/{len}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message(message);
        pb
    }
}

fn skip(contact: &ContactId, error: ArchiveError, skipped: &mut Vec<SkippedContact>) {
    warn!("Skipping {}: {}", contact, error);
    skipped.push(SkippedContact {
        contact: contact.clone(),
        reason: error.to_string(),
    });
}
