//! In-memory archive, mainly for fixtures.

use super::{ArchiveError, MessageSource};
use crate::models::{ContactId, MessageFile};
use std::collections::HashMap;

/// Archive held entirely in memory. Contacts are listed in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArchive {
    order: Vec<ContactId>,
    files: HashMap<ContactId, Vec<MessageFile>>,
}

impl InMemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a contact with its message files.
    pub fn with_contact(mut self, contact: impl Into<ContactId>, files: Vec<MessageFile>) -> Self {
        self.insert(contact.into(), files);
        self
    }

    /// Add a contact that is listed but whose folder cannot be loaded.
    pub fn with_missing_contact(mut self, contact: impl Into<ContactId>) -> Self {
        let contact = contact.into();
        if !self.order.contains(&contact) {
            self.order.push(contact);
        }
        self
    }

    /// Add (or extend) a contact's message files.
    pub fn insert(&mut self, contact: ContactId, files: Vec<MessageFile>) {
        if !self.order.contains(&contact) {
            self.order.push(contact.clone());
        }
        self.files.entry(contact).or_default().extend(files);
    }
}

impl MessageSource for InMemoryArchive {
    fn list_contacts(&self) -> Result<Vec<ContactId>, ArchiveError> {
        Ok(self.order.clone())
    }

    fn load_message_files(&self, contact: &ContactId) -> Result<Vec<MessageFile>, ArchiveError> {
        self.files
            .get(contact)
            .cloned()
            .ok_or_else(|| ArchiveError::ContactNotFound(contact.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Message;

    #[test]
    fn test_insertion_order_is_listing_order() {
        let archive = InMemoryArchive::new()
            .with_contact("Zed_1", vec![])
            .with_contact("Amy_2", vec![])
            .with_missing_contact("Gone_3");

        let contacts = archive.list_contacts().unwrap();
        assert_eq!(
            contacts,
            vec![
                ContactId::from("Zed_1"),
                ContactId::from("Amy_2"),
                ContactId::from("Gone_3")
            ]
        );
    }

    #[test]
    fn test_missing_contact_fails_to_load() {
        let archive = InMemoryArchive::new().with_missing_contact("Gone_3");
        assert!(matches!(
            archive.load_message_files(&ContactId::from("Gone_3")),
            Err(ArchiveError::ContactNotFound(_))
        ));
    }

    #[test]
    fn test_insert_extends_existing_contact() {
        let mut archive = InMemoryArchive::new();
        let id = ContactId::from("Amy_2");
        archive.insert(id.clone(), vec![MessageFile::with_messages(vec![Message::new(1, "Amy")])]);
        archive.insert(id.clone(), vec![MessageFile::with_messages(vec![Message::new(2, "Amy")])]);

        assert_eq!(archive.list_contacts().unwrap().len(), 1);
        assert_eq!(archive.load_message_files(&id).unwrap().len(), 2);
    }
}
