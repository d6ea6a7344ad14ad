use lettre::message::Mailbox;
use std::{borrow::Cow, fmt::Display, str::FromStr};

pub const DELIVERY_STRATEGY_VARIABLE: &str = "CONTACT_DELIVERY";
pub const BIND_ADDRESS_VARIABLE: &str = "CONTACT_BIND_ADDRESS";
pub const FROM_ADDRESS_VARIABLE: &str = "CONTACT_FROM_ADDRESS";
pub const TO_ADDRESS_VARIABLE: &str = "CONTACT_TO_ADDRESS";

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_FROM_ADDRESS: &str = "Web contact form <noreply@example.com>";
const DEFAULT_TO_ADDRESS: &str = "Site owner <contact@example.com>";

/// How a validated submission leaves the process. Selected once at startup;
/// exactly one deliverer exists per process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryStrategy {
    /// Post the submission to a hosted email-relay API.
    Relay,
    /// Submit an HTML message to an SMTP server.
    Smtp,
    /// Hand a plain-text message to the local mail transport agent.
    Sendmail,
}

impl DeliveryStrategy {
    pub fn from_environment() -> Result<Self, EnvironmentError> {
        match std::env::var(DELIVERY_STRATEGY_VARIABLE) {
            Ok(value) => value.parse(),
            Err(_) => Ok(DeliveryStrategy::Smtp),
        }
    }
}

impl FromStr for DeliveryStrategy {
    type Err = EnvironmentError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "relay" => Ok(DeliveryStrategy::Relay),
            "smtp" => Ok(DeliveryStrategy::Smtp),
            "sendmail" => Ok(DeliveryStrategy::Sendmail),
            _ => Err(EnvironmentError::UnrecognisedStrategy(value.to_owned())),
        }
    }
}

pub fn bind_address() -> Cow<'static, str> {
    variable_or(BIND_ADDRESS_VARIABLE, DEFAULT_BIND_ADDRESS)
}

pub fn from_address() -> Result<Mailbox, EnvironmentError> {
    mailbox_from(FROM_ADDRESS_VARIABLE, DEFAULT_FROM_ADDRESS)
}

pub fn to_address() -> Result<Mailbox, EnvironmentError> {
    mailbox_from(TO_ADDRESS_VARIABLE, DEFAULT_TO_ADDRESS)
}

fn mailbox_from(variable: &'static str, default: &'static str) -> Result<Mailbox, EnvironmentError> {
    let value = variable_or(variable, default);
    value.parse().map_err(|_| EnvironmentError::BadAddress {
        variable,
        value: value.into_owned(),
    })
}

pub fn variable_or(name: &'static str, default: &'static str) -> Cow<'static, str> {
    std::env::var(name).map(Cow::Owned).unwrap_or(default.into())
}

pub fn require_variable(name: &'static str) -> Result<String, EnvironmentError> {
    std::env::var(name).map_err(|_| EnvironmentError::MissingVariable(name))
}

#[derive(Debug)]
pub enum EnvironmentError {
    MissingVariable(&'static str),
    UnrecognisedStrategy(String),
    BadAddress {
        variable: &'static str,
        value: String,
    },
}

impl Display for EnvironmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvironmentError::MissingVariable(name) => {
                write!(f, "Missing environment variable {name}")
            }
            EnvironmentError::UnrecognisedStrategy(value) => {
                write!(f, "Unrecognised delivery strategy {value}")
            }
            EnvironmentError::BadAddress { variable, value } => {
                write!(f, "Invalid mail address {value} in {variable}")
            }
        }
    }
}

impl std::error::Error for EnvironmentError {}
