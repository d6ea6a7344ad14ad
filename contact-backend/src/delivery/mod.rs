mod relay;
mod sendmail;
mod smtp;

pub use relay::{RelayApiDeliverer, RELAY_FALLBACK_MESSAGE};
pub use sendmail::SendmailDeliverer;
pub use smtp::SmtpDeliverer;

use crate::{
    config::{DeliveryStrategy, EnvironmentError},
    submission::ValidatedSubmission,
    ContactFormError,
};
use async_trait::async_trait;
use lettre::message::Mailbox;
use std::fmt::Display;

/// The delivery half of the submission pipeline: one implementation per
/// configured strategy, each performing a single best-effort send.
#[async_trait]
pub trait Deliverer: Send + Sync {
    async fn deliver(&self, submission: &ValidatedSubmission<'_>) -> Result<(), DeliveryError>;
}

pub fn for_strategy(
    strategy: DeliveryStrategy,
    from_address: Mailbox,
    to_address: Mailbox,
) -> Result<Box<dyn Deliverer>, EnvironmentError> {
    Ok(match strategy {
        DeliveryStrategy::Relay => Box::new(RelayApiDeliverer::from_environment(&to_address)?),
        DeliveryStrategy::Smtp => Box::new(SmtpDeliverer::new(from_address, to_address)),
        DeliveryStrategy::Sendmail => Box::new(SendmailDeliverer::new(from_address, to_address)),
    })
}

#[derive(Debug)]
pub enum DeliveryError {
    /// The delivery service turned the submission down and supplied text fit
    /// for the caller to see.
    Rejected(String),
    /// The transport failed. The description lands in the log, never in the
    /// response.
    Internal(String),
}

impl DeliveryError {
    pub fn into_contact_form_error(self) -> ContactFormError {
        match self {
            DeliveryError::Rejected(message) => ContactFormError::DeliveryRejected { message },
            DeliveryError::Internal(description) => ContactFormError::Internal { description },
        }
    }
}

impl Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Rejected(message) => write!(f, "Delivery rejected: {message}"),
            DeliveryError::Internal(description) => write!(f, "Delivery failed: {description}"),
        }
    }
}

impl std::error::Error for DeliveryError {}
