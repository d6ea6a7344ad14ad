mod body;
mod config;
mod delivery;
mod submission;

use actix_web::{
    http::header::ContentType,
    post,
    web::{self, Form, Json},
    App, Either, HttpResponse, HttpServer,
};
use config::{DeliveryStrategy, EnvironmentError};
use delivery::{Deliverer, DeliveryError};
use std::fmt::Display;
use submission::ContactSubmission;
use tracing::error;

const SUCCESS_MESSAGE: &str = "Thank you for your message. We will get back to you shortly.";
const MISSING_FIELDS_MESSAGE: &str = "All fields are required.";
const INVALID_EMAIL_MESSAGE: &str = "Invalid email format.";
const INVALID_METHOD_MESSAGE: &str = "Invalid request method.";
const FAILURE_MESSAGE: &str = "Sorry, something went wrong. Please try again later.";

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let handler = web::Data::new(ContactFormHandler::from_environment()?);
    let bind_address = config::bind_address();
    tracing::info!("Accepting contact form submissions on {bind_address}");
    HttpServer::new(move || {
        App::new()
            .app_data(handler.clone())
            .service(send_message)
            .default_service(web::to(reject_method))
    })
    .bind(&*bind_address)?
    .run()
    .await?;
    Ok(())
}

#[post("/messages")]
async fn send_message(
    submission: Either<Form<ContactSubmission>, Json<ContactSubmission>>,
    handler: web::Data<ContactFormHandler>,
) -> HttpResponse {
    handler.handle(submission.into_inner()).await
}

async fn reject_method() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .content_type(ContentType::plaintext())
        .body(INVALID_METHOD_MESSAGE)
}

/// The one submission pipeline: validate, then hand off to whichever
/// deliverer the configuration selected at startup.
struct ContactFormHandler {
    deliverer: Box<dyn Deliverer>,
}

impl ContactFormHandler {
    fn from_environment() -> Result<Self, EnvironmentError> {
        let strategy = DeliveryStrategy::from_environment()?;
        let deliverer =
            delivery::for_strategy(strategy, config::from_address()?, config::to_address()?)?;
        Ok(Self { deliverer })
    }

    async fn handle(&self, submission: ContactSubmission) -> HttpResponse {
        match self.process(&submission).await {
            Ok(()) => HttpResponse::Ok()
                .content_type(ContentType::plaintext())
                .body(SUCCESS_MESSAGE),
            Err(error) => {
                error.log();
                error.into_response()
            }
        }
    }

    async fn process(&self, submission: &ContactSubmission) -> Result<(), ContactFormError> {
        let validated = submission.validate()?;
        self.deliverer
            .deliver(&validated)
            .await
            .map_err(DeliveryError::into_contact_form_error)
    }
}

#[derive(Debug)]
pub enum ContactFormError {
    MissingFields,
    InvalidEmailFormat,
    DeliveryRejected { message: String },
    Internal { description: String },
}

impl ContactFormError {
    fn log(&self) {
        match self {
            ContactFormError::MissingFields | ContactFormError::InvalidEmailFormat => {
                error!("Client error handling contact form submission: {self}");
            }
            ContactFormError::DeliveryRejected { message } => {
                error!("Delivery service rejected contact form submission: {message}");
            }
            ContactFormError::Internal { description } => {
                error!("Internal error sending contact form email: {description}");
            }
        }
    }

    fn into_response(self) -> HttpResponse {
        match self {
            ContactFormError::MissingFields => HttpResponse::BadRequest()
                .content_type(ContentType::plaintext())
                .body(MISSING_FIELDS_MESSAGE),
            ContactFormError::InvalidEmailFormat => HttpResponse::BadRequest()
                .content_type(ContentType::plaintext())
                .body(INVALID_EMAIL_MESSAGE),
            ContactFormError::DeliveryRejected { message } => HttpResponse::BadGateway()
                .content_type(ContentType::plaintext())
                .body(message),
            ContactFormError::Internal { .. } => HttpResponse::InternalServerError()
                .content_type(ContentType::plaintext())
                .body(FAILURE_MESSAGE),
        }
    }
}

impl Display for ContactFormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContactFormError::MissingFields => write!(f, "missing or blank required fields"),
            ContactFormError::InvalidEmailFormat => write!(f, "invalid submitter email address"),
            ContactFormError::DeliveryRejected { message } => {
                write!(f, "delivery rejected: {message}")
            }
            ContactFormError::Internal { description } => {
                write!(f, "internal error: {description}")
            }
        }
    }
}

impl std::error::Error for ContactFormError {}
