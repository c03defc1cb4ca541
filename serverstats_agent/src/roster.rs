//! Client for the external roster endpoint. One GET per tick, with hard
//! connect/read timeouts so a slow service cannot starve the tick cadence.

use std::time::Duration;

use thiserror::Error;

use crate::types::{RosterMember, RosterResponse};

const ROSTER_TIMEOUT: Duration = Duration::from_secs(10);
const SOURCE_HEADER: &str = "X-Stats-Source";

#[derive(Debug, Error)]
pub enum RosterError {
    #[error("roster request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("roster response malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("roster unavailable: {0}")]
    Unavailable(String),
}

/// Snapshot provider for currently-active identities. An empty list means
/// the service confirmed nobody is present; an error means the answer is
/// unknown this tick.
#[allow(async_fn_in_trait)]
pub trait RosterClient {
    async fn fetch_active(&self) -> Result<Vec<RosterMember>, RosterError>;
}

/// HTTP implementation: GET of the configured endpoint with the shared
/// secret appended urlencoded, JSON body `{"activeSessions": [...]}`.
pub struct HttpRosterClient {
    client: reqwest::Client,
    url: String,
}

impl HttpRosterClient {
    pub fn new(endpoint: &str, secret: &str) -> Result<Self, RosterError> {
        let client = reqwest::Client::builder()
            .timeout(ROSTER_TIMEOUT)
            .connect_timeout(ROSTER_TIMEOUT)
            .build()?;
        let encoded: String = url::form_urlencoded::byte_serialize(secret.as_bytes()).collect();
        Ok(Self {
            client,
            url: format!("{endpoint}{encoded}"),
        })
    }
}

impl RosterClient for HttpRosterClient {
    async fn fetch_active(&self) -> Result<Vec<RosterMember>, RosterError> {
        let body = self
            .client
            .get(&self.url)
            .header(SOURCE_HEADER, env!("CARGO_PKG_NAME"))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        if body.trim().is_empty() {
            return Ok(Vec::new());
        }
        let response: RosterResponse = serde_json::from_str(&body)?;
        Ok(response.active_sessions)
    }
}
