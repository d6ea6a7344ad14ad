use crate::ContactFormError;
use lettre::{message::Mailbox, Address};
use serde::Deserialize;

/// A single contact form submission. Created at form-submit time, consumed by
/// exactly one delivery attempt, then discarded.
///
/// The legacy form markup posted the subject field capitalised, so `Subject`
/// is accepted as an alias.
#[derive(Deserialize, Debug)]
pub struct ContactSubmission {
    name: Option<String>,
    email: Option<String>,
    #[serde(alias = "Subject")]
    subject: Option<String>,
    message: Option<String>,
}

impl ContactSubmission {
    /// Checks that all four fields are present and non-blank after trimming
    /// and that the email field parses as an address. Runs before any
    /// delivery is attempted.
    pub fn validate(&self) -> Result<ValidatedSubmission, ContactFormError> {
        let ContactSubmission {
            name: Some(name),
            email: Some(email),
            subject: Some(subject),
            message: Some(message),
        } = self
        else {
            return Err(ContactFormError::MissingFields);
        };
        let (name, email, subject, message) =
            (name.trim(), email.trim(), subject.trim(), message.trim());
        if name.is_empty() || email.is_empty() || subject.is_empty() || message.is_empty() {
            return Err(ContactFormError::MissingFields);
        }
        let Ok(address) = email.parse::<Address>() else {
            return Err(ContactFormError::InvalidEmailFormat);
        };
        Ok(ValidatedSubmission {
            name,
            email,
            subject,
            message,
            address,
        })
    }
}

#[derive(Debug)]
pub struct ValidatedSubmission<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub subject: &'a str,
    pub message: &'a str,
    address: Address,
}

impl ValidatedSubmission<'_> {
    /// The submitter as a mailbox. The message is sent from a fixed address
    /// with this as Reply-To, so replies reach the submitter without the
    /// submitter controlling the envelope sender.
    pub fn reply_to(&self) -> Mailbox {
        Mailbox::new(Some(self.name.to_owned()), self.address.clone())
    }
}

#[cfg(test)]
impl<'a> ValidatedSubmission<'a> {
    pub fn for_testing(
        name: &'a str,
        email: &'a str,
        subject: &'a str,
        message: &'a str,
    ) -> Self {
        Self {
            name,
            email,
            subject,
            message,
            address: email.parse().unwrap(),
        }
    }
}
