use log::debug;
use mailin_embedded::{Handler, Server, SslConfig};
use std::{net::IpAddr, sync::Arc, time::Duration};
use tokio::{
    sync::watch::{self, error::RecvError, Receiver, Sender},
    time::timeout,
};

pub const SMTP_PORT: u16 = 4567;
pub const POISONED_SMTP_PORT: u16 = 4568;

/// Records every message submitted to it and publishes the raw DATA content
/// through a watch channel.
#[derive(Clone)]
struct RecordingHandler {
    buffer: Vec<u8>,
    published: Arc<Sender<String>>,
}

impl Handler for RecordingHandler {
    fn data(&mut self, buf: &[u8]) -> std::io::Result<()> {
        debug!("Got data:\n{}", String::from_utf8_lossy(buf));
        self.buffer.extend(buf);
        Ok(())
    }

    fn data_end(&mut self) -> mailin_embedded::Response {
        self.published
            .send(String::from_utf8(self.buffer.drain(..).collect()).unwrap())
            .unwrap();
        mailin_embedded::response::OK
    }

    fn auth_plain(
        &mut self,
        authorization_id: &str,
        authentication_id: &str,
        password: &str,
    ) -> mailin_embedded::Response {
        debug!("Got authentication data {authorization_id}, {authentication_id}, {password}");
        mailin_embedded::response::AUTH_OK
    }
}

pub struct FakeSmtpServer {
    server: std::sync::Mutex<Option<Server<RecordingHandler>>>,
    received: tokio::sync::Mutex<Receiver<String>>,
}

impl FakeSmtpServer {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(String::new());
        let handler = RecordingHandler {
            buffer: Vec::new(),
            published: Arc::new(sender),
        };
        let mut server = Server::new(handler);
        server
            .with_name("example.com")
            .with_ssl(SslConfig::None)
            .unwrap()
            .with_addr(format!("0.0.0.0:{SMTP_PORT}"))
            .unwrap();
        Self {
            server: std::sync::Mutex::new(Some(server)),
            received: tokio::sync::Mutex::new(receiver),
        }
    }

    pub fn start(&self) {
        let mut guard = self.server.lock().unwrap();
        if let Some(server) = guard.take() {
            std::thread::spawn(move || {
                let _ = server.serve();
            });
        }
    }

    pub async fn last_mail_content(&self) -> Result<String, RecvError> {
        let mut receiver = self.received.lock().await;
        receiver.changed().await?;
        let content = receiver.borrow_and_update().clone();
        drop(receiver);
        Ok(content)
    }

    /// Discards anything still pending so the next `last_mail_content` only
    /// sees messages sent after this call.
    pub async fn flush(&self) {
        let mut receiver = self.received.lock().await;
        let _ = timeout(Duration::from_millis(100), receiver.changed()).await;
    }

    pub fn setup_environment() {
        std::env::set_var("SMTP_URL", format!("smtp://localhost:{SMTP_PORT}"));
    }
}

impl Default for FakeSmtpServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Fails every session at the first command, so any delivery attempt against
/// it surfaces as a transport error.
#[derive(Clone)]
struct PoisonedSmtpHandler;

impl Handler for PoisonedSmtpHandler {
    fn helo(&mut self, _ip: IpAddr, _domain: &str) -> mailin_embedded::Response {
        mailin_embedded::response::INTERNAL_ERROR
    }

    fn mail(&mut self, _ip: IpAddr, _domain: &str, _from: &str) -> mailin_embedded::Response {
        mailin_embedded::response::INTERNAL_ERROR
    }
}

pub fn start_poisoned_smtp_server() {
    let handler = PoisonedSmtpHandler;
    let mut server = Server::new(handler);
    server
        .with_name("example.com")
        .with_ssl(SslConfig::None)
        .unwrap()
        .with_addr(format!("0.0.0.0:{POISONED_SMTP_PORT}"))
        .unwrap();
    std::thread::spawn(move || {
        let _ = server.serve();
    });
}
