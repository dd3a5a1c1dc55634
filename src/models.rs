//! Data models for exported message archives.
//!
//! This module contains the structures read from the archive (message files,
//! messages, participants) and the contact identifier derived from folder names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a contact: the raw folder name inside the archive root.
///
/// Folder names look like `<DisplayName>_<opaque-suffix>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContactId(String);

impl ContactId {
    /// Creates a contact identifier from a raw folder name.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw folder name, suffix included.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The part of the folder name before the first underscore.
    pub fn stem(&self) -> &str {
        self.0.split('_').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContactId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// A single message record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Send time in milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    /// Display name of the sender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    /// Text content, when the message has any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Message {
    /// Creates a message without content.
    #[cfg(test)]
    pub fn new(timestamp_ms: i64, sender_name: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            sender_name: Some(sender_name.into()),
            content: None,
        }
    }

    /// Returns true if the message was sent by `name`.
    pub fn is_from(&self, name: &str) -> bool {
        self.sender_name.as_deref() == Some(name)
    }
}

/// A conversation participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
}

/// One JSON message log file of a contact folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageFile {
    /// Messages stored in this file.
    pub messages: Vec<Message>,
    /// People taking part in the conversation.
    #[serde(default)]
    pub participants: Vec<Participant>,
}

impl MessageFile {
    /// Creates a file holding the given messages and no participants.
    #[cfg(test)]
    pub fn with_messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            participants: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_stem() {
        assert_eq!(ContactId::from("AliceSmith_abc123").stem(), "AliceSmith");
        assert_eq!(ContactId::from("Carol_Def_Ghi").stem(), "Carol");
        assert_eq!(ContactId::from("NoSuffix").stem(), "NoSuffix");
        assert_eq!(ContactId::from("_hidden").stem(), "");
    }

    #[test]
    fn test_parse_message_file() {
        let json = r#"{
            "participants": [{"name": "Bob"}, {"name": "Alice"}],
            "messages": [
                {"sender_name": "Bob", "timestamp_ms": 1577836800000, "content": "hi", "type": "Generic"},
                {"sender_name": "Alice", "timestamp_ms": 1577836900000}
            ]
        }"#;

        let file: MessageFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.messages.len(), 2);
        assert_eq!(file.participants.len(), 2);
        assert!(file.messages[0].is_from("Bob"));
        assert_eq!(file.messages[0].content.as_deref(), Some("hi"));
        assert_eq!(file.messages[1].content, None);
    }

    #[test]
    fn test_message_without_sender() {
        let message: Message = serde_json::from_str(r#"{"timestamp_ms": 5}"#).unwrap();
        assert_eq!(message.sender_name, None);
        assert!(!message.is_from("Bob"));
    }

    #[test]
    fn test_missing_messages_key_is_an_error() {
        let result: Result<MessageFile, _> = serde_json::from_str(r#"{"participants": []}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_timestamp_is_an_error() {
        let result: Result<Message, _> = serde_json::from_str(r#"{"sender_name": "Bob"}"#);
        assert!(result.is_err());
    }
}
