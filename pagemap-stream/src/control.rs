use crate::client::{build_http_client, parse_base_url, session_endpoint};
use crate::error::{Result, StreamError};
use crate::status::SessionCommand;
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

/// Sends pause, resume and cancel requests for discovery sessions.
#[derive(Clone)]
pub struct SessionControl {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl SessionControl {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, 10)
    }

    pub fn with_timeout(base_url: &str, connect_timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: build_http_client(connect_timeout_secs)?,
            base_url: parse_base_url(base_url)?,
            token: None,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub async fn send(&self, session_id: &str, command: SessionCommand) -> Result<()> {
        let url = session_endpoint(&self.base_url, session_id, command.as_str())?;

        let mut request = self.client.post(url);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(
                "{} of session {} rejected with {}",
                command.as_str(),
                session_id,
                status
            );
            return Err(StreamError::Rejected {
                action: command.as_str().to_string(),
                status: status.as_u16(),
            });
        }

        info!("{} of session {} accepted", command.as_str(), session_id);
        Ok(())
    }

    pub async fn pause(&self, session_id: &str) -> Result<()> {
        self.send(session_id, SessionCommand::Pause).await
    }

    pub async fn resume(&self, session_id: &str) -> Result<()> {
        self.send(session_id, SessionCommand::Resume).await
    }

    pub async fn cancel(&self, session_id: &str) -> Result<()> {
        self.send(session_id, SessionCommand::Cancel).await
    }
}
