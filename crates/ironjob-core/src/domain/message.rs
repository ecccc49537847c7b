//! QueueMessage - one message as returned by the remote service.

use std::collections::HashMap;

use super::ids::{MessageId, ReservationId};
use super::payload::Payload;
use crate::error::JobError;

/// Header carrying the message id on push callbacks.
pub const PUSH_MESSAGE_ID_HEADER: &str = "iron-message-id";

/// How the message reached us.
///
/// A reservation exists iff the message was pulled, so the two are one enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Pulled and leased; deleting requires the reservation.
    Reserved(ReservationId),

    /// Delivered by the service calling us; acknowledged by the callback returning.
    Pushed,
}

/// Immutable snapshot of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    id: MessageId,
    body: String,
    delivery: Delivery,
}

impl QueueMessage {
    pub fn reserved(id: MessageId, body: impl Into<String>, reservation: ReservationId) -> Self {
        Self {
            id,
            body: body.into(),
            delivery: Delivery::Reserved(reservation),
        }
    }

    pub fn pushed(id: MessageId, body: impl Into<String>) -> Self {
        Self {
            id,
            body: body.into(),
            delivery: Delivery::Pushed,
        }
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn delivery(&self) -> &Delivery {
        &self.delivery
    }

    pub fn is_pushed(&self) -> bool {
        matches!(self.delivery, Delivery::Pushed)
    }

    pub fn reservation(&self) -> Option<&ReservationId> {
        match &self.delivery {
            Delivery::Reserved(reservation) => Some(reservation),
            Delivery::Pushed => None,
        }
    }

    /// Decode the body.
    pub fn payload(&self) -> Result<Payload, JobError> {
        Payload::parse(&self.body)
    }
}

/// Build a pushed message from a push callback's headers and raw body.
///
/// Header names are matched case-insensitively.
pub fn marshal_push(
    headers: &HashMap<String, String>,
    body: impl Into<String>,
) -> Result<QueueMessage, JobError> {
    let id = headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(PUSH_MESSAGE_ID_HEADER))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            JobError::malformed(format!("push request without `{PUSH_MESSAGE_ID_HEADER}` header"))
        })?;
    Ok(QueueMessage::pushed(MessageId::new(id), body))
}
