//! Participation statistics for a single group conversation.

use super::ranking::{rank, Ranked};
use crate::archive::{ArchiveError, MessageSource};
use crate::models::ContactId;
use serde::Serialize;
use std::collections::HashMap;

/// Default admin cut-off, as a share of the most active sender's count.
pub const DEFAULT_ADMIN_CUTOFF: f64 = 0.375;

/// Messages per sender in a group chat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupChatStats {
    pub chat: String,
    /// Everyone listed as participant in any of the chat's files.
    pub participants: Vec<String>,
    /// Senders ranked by number of messages.
    pub senders: Vec<Ranked>,
    /// Message count a sender needs to reach the admin line.
    pub admin_cutoff: f64,
}

impl GroupChatStats {
    /// Senders at or above the admin line.
    pub fn above_cutoff(&self) -> impl Iterator<Item = &Ranked> {
        self.senders
            .iter()
            .filter(move |r| r.count as f64 >= self.admin_cutoff)
    }
}

/// Count messages per sender across all files of a group chat.
///
/// A missing or unreadable chat folder is an error: there is nothing to analyse.
pub fn group_chat_stats(
    source: &dyn MessageSource,
    chat: &ContactId,
    cutoff_ratio: f64,
) -> Result<GroupChatStats, ArchiveError> {
    let files = source.load_message_files(chat)?;

    let mut participants: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for file in files {
        for participant in file.participants {
            if !participants.contains(&participant.name) {
                participants.push(participant.name);
            }
        }
        for sender in file.messages.into_iter().filter_map(|m| m.sender_name) {
            *counts.entry(sender).or_default() += 1;
        }
    }

    let senders = rank(counts);
    let max = senders.first().map(|r| r.count).unwrap_or(0);

    Ok(GroupChatStats {
        chat: chat.to_string(),
        participants,
        senders,
        admin_cutoff: max as f64 * cutoff_ratio,
    })
}
