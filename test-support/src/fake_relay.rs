use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::Value;
use std::{borrow::Cow, future::Future, sync::Arc, time::Duration};
use tokio::{
    sync::watch::{self, error::RecvError, Receiver, Sender},
    time::timeout,
};

pub const RELAY_PORT: u16 = 5283;
const SEND_PATH: &str = "/api/v1.0/email/send";

pub const FAKE_RELAY_SERVICE_ID: &str = "service_arbitrary";
pub const FAKE_RELAY_TEMPLATE_ID: &str = "template_arbitrary";
pub const FAKE_RELAY_PUBLIC_KEY: &str = "arbitrary public key";

/// Stands in for the hosted email-relay API. Records every payload it
/// receives and answers according to the configured behaviour.
pub struct FakeRelayApi {
    behaviour: RelayBehaviour,
    receiver: tokio::sync::Mutex<Receiver<String>>,
}

#[derive(Clone)]
struct RelayBehaviour {
    required_service_id: Cow<'static, str>,
    required_template_id: Cow<'static, str>,
    required_user_id: Cow<'static, str>,
    rejection: Option<Cow<'static, str>>,
    published: Arc<Sender<String>>,
}

#[derive(Deserialize)]
struct SendRequestPayload {
    service_id: String,
    template_id: String,
    user_id: String,
    #[allow(dead_code)]
    template_params: TemplateParams,
}

#[derive(Deserialize)]
#[allow(dead_code)]
struct TemplateParams {
    from_name: String,
    from_email: String,
    subject: String,
    message: String,
    to_email: String,
}

impl FakeRelayApi {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(String::new());
        Self {
            behaviour: RelayBehaviour {
                required_service_id: FAKE_RELAY_SERVICE_ID.into(),
                required_template_id: FAKE_RELAY_TEMPLATE_ID.into(),
                required_user_id: FAKE_RELAY_PUBLIC_KEY.into(),
                rejection: None,
                published: Arc::new(sender),
            },
            receiver: tokio::sync::Mutex::new(receiver),
        }
    }

    /// Rejects every send with the given error text in the response body.
    pub fn rejecting_with(mut self, text: impl Into<Cow<'static, str>>) -> Self {
        self.behaviour.rejection = Some(text.into());
        self
    }

    /// Rejects every send with an empty response body.
    pub fn rejecting_silently(self) -> Self {
        self.rejecting_with("")
    }

    pub fn serve(&self) -> impl Future<Output = ()> + Send + 'static {
        let behaviour = self.behaviour.clone();
        async move {
            let app = Router::new()
                .route(SEND_PATH, post(send))
                .with_state(behaviour);
            let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{RELAY_PORT}"))
                .await
                .unwrap();
            axum::serve(listener, app).await.unwrap();
        }
    }

    pub async fn last_payload(&self) -> Result<String, RecvError> {
        let mut receiver = self.receiver.lock().await;
        receiver.changed().await?;
        let payload = receiver.borrow_and_update().clone();
        drop(receiver);
        Ok(payload)
    }

    /// Discards anything still pending so the next `last_payload` only sees
    /// requests made after this call.
    pub async fn flush(&self) {
        let mut receiver = self.receiver.lock().await;
        let _ = timeout(Duration::from_millis(100), receiver.changed()).await;
    }

    pub fn setup_environment() {
        std::env::set_var(
            "CONTACT_RELAY_URL",
            format!("http://localhost:{RELAY_PORT}{SEND_PATH}"),
        );
        std::env::set_var("CONTACT_RELAY_SERVICE_ID", FAKE_RELAY_SERVICE_ID);
        std::env::set_var("CONTACT_RELAY_TEMPLATE_ID", FAKE_RELAY_TEMPLATE_ID);
        std::env::set_var("CONTACT_RELAY_PUBLIC_KEY", FAKE_RELAY_PUBLIC_KEY);
    }
}

impl Default for FakeRelayApi {
    fn default() -> Self {
        Self::new()
    }
}

async fn send(
    State(behaviour): State<RelayBehaviour>,
    Json(payload): Json<Value>,
) -> (StatusCode, String) {
    behaviour.published.send(payload.to_string()).unwrap();
    if let Some(text) = behaviour.rejection {
        return (StatusCode::BAD_REQUEST, text.into_owned());
    }
    let payload: SendRequestPayload = match serde_json::from_value(payload) {
        Ok(payload) => payload,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                "The request payload is malformed".into(),
            )
        }
    };
    if payload.service_id != behaviour.required_service_id {
        return (StatusCode::BAD_REQUEST, "The service ID is invalid".into());
    }
    if payload.template_id != behaviour.required_template_id {
        return (StatusCode::BAD_REQUEST, "The template ID is invalid".into());
    }
    if payload.user_id != behaviour.required_user_id {
        return (StatusCode::FORBIDDEN, "The user ID is invalid".into());
    }
    (StatusCode::OK, "OK".into())
}
