//! Interaction factor: how much a contact writes back compared to the user.

use super::aggregator::ContactMessages;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

/// Errors raised by contact analyses.
#[derive(Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("{user} never sent a message to {contact}")]
    NoMessagesSent { user: String, contact: String },
}

/// Messages exchanged between the user and one contact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exchange {
    pub contact: String,
    /// Messages written by the user.
    pub sent: usize,
    /// Messages written by anyone else in the conversation.
    pub received: usize,
}

impl Exchange {
    /// Split a contact's messages by sender. Messages without a sender are ignored.
    pub fn from_messages(contact: &ContactMessages, username: &str) -> Self {
        let mut sent = 0;
        let mut received = 0;

        for message in &contact.messages {
            match message.sender_name {
                Some(_) if message.is_from(username) => sent += 1,
                Some(_) => received += 1,
                None => debug!("Message at {} in {} has no sender", message.timestamp_ms, contact.name),
            }
        }

        Self {
            contact: contact.name.clone(),
            sent,
            received,
        }
    }

    /// `received / sent`, rounded to 3 decimals.
    pub fn factor(&self, username: &str) -> Result<f64, AnalysisError> {
        if self.sent == 0 {
            return Err(AnalysisError::NoMessagesSent {
                user: username.to_string(),
                contact: self.contact.clone(),
            });
        }
        Ok(round3(self.received as f64 / self.sent as f64))
    }
}

/// Interaction factor of one contact; `None` when it is undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionFactor {
    pub exchange: Exchange,
    pub factor: Option<f64>,
}

/// Compute the interaction factor for every contact.
pub fn interaction_factors(contacts: &[ContactMessages], username: &str) -> Vec<InteractionFactor> {
    contacts
        .iter()
        .map(|contact| {
            let exchange = Exchange::from_messages(contact, username);
            let factor = exchange.factor(username).ok();
            InteractionFactor { exchange, factor }
        })
        .collect()
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
