//! UberNet login and stream listing.

use papatch_manifest::Stream;
use papatch_sync::{Session, SessionProvider, StreamCatalog};
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const TITLE_ID: u32 = 4;
const PLATFORM: &str = "Linux";

#[derive(Debug, thiserror::Error)]
pub enum UberNetError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service answered {0}")]
    Status(StatusCode),

    #[error("response carries no session ticket")]
    MissingTicket,

    #[error("failed to encode credentials: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Credentials<'a> {
    title_id: u32,
    auth_method: &'static str,
    uber_name: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    #[serde(rename = "SessionTicket")]
    session_ticket: Option<String>,
}

#[derive(Deserialize)]
struct StreamsResponse {
    #[serde(rename = "Streams")]
    streams: Vec<Stream>,
}

/// Session provider backed by the UberNet game service.
pub struct UberNet {
    client: Client,
    base_url: String,
    ubername: String,
    password: String,
}

impl UberNet {
    pub fn new(client: Client, base_url: impl Into<String>, ubername: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            ubername: ubername.into(),
            password: password.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl SessionProvider for UberNet {
    type Error = UberNetError;

    async fn login(&self) -> Result<Session, UberNetError> {
        let body = Credentials {
            title_id: TITLE_ID,
            auth_method: "UberCredentials",
            uber_name: &self.ubername,
            password: &self.password,
        };
        let response = self
            .client
            .post(self.url("/GC/Authenticate"))
            .header(header::CONTENT_TYPE, "application/json;charset=utf-8")
            .body(serde_json::to_vec(&body)?)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(UberNetError::Status(response.status()));
        }
        let auth: AuthResponse = response.json().await?;
        let ticket = auth.session_ticket.ok_or(UberNetError::MissingTicket)?;

        info!(ubername = %self.ubername, "logged in to UberNet");
        Ok(Session::new(ticket))
    }

    async fn streams(&self, session: Session) -> Result<StreamCatalog, UberNetError> {
        let response = self
            .client
            .get(self.url("/Launcher/ListStreams"))
            .query(&[("Platform", PLATFORM)])
            .header("X-Authorization", session.ticket())
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(UberNetError::Status(response.status()));
        }
        let listing: StreamsResponse = response.json().await?;

        debug!(count = listing.streams.len(), "stream list received");
        Ok(listing.streams.into_iter().collect())
    }
}
