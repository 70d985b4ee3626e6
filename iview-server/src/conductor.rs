//! Conductor client
//!
//! The Conductor runs the live interview. Starting a session registers it
//! there and records the URL the candidate is sent to. Without a configured
//! Conductor, or when registration fails, the candidate goes to the local
//! interview page instead.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("iview/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConductorError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Conductor returned {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Serialize)]
struct RegisterSessionRequest<'a> {
    session_id: &'a str,
    interview_id: &'a str,
    invitation_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegisterSessionResponse {
    url: String,
}

#[derive(Debug, Clone)]
pub struct ConductorClient {
    http_client: reqwest::Client,
    base_url: Option<String>,
    public_base_url: String,
}

impl ConductorClient {
    pub fn new(base_url: Option<String>, public_base_url: String) -> Result<Self, ConductorError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConductorError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            public_base_url,
        })
    }

    /// Candidate-facing page for an invitation token
    pub fn local_url(&self, token: &str) -> String {
        format!("{}/interview/{}", self.public_base_url, token)
    }

    /// Register a started session; falls back to [`Self::local_url`]
    pub async fn register_session(
        &self,
        session_id: &str,
        interview_id: &str,
        token: &str,
    ) -> String {
        let Some(base_url) = &self.base_url else {
            return self.local_url(token);
        };

        match self.post_session(base_url, session_id, interview_id, token).await {
            Ok(url) => {
                debug!(session_id = %session_id, "Registered session with conductor");
                url
            }
            Err(e) => {
                warn!(session_id = %session_id, "Conductor registration failed: {}", e);
                self.local_url(token)
            }
        }
    }

    async fn post_session(
        &self,
        base_url: &str,
        session_id: &str,
        interview_id: &str,
        token: &str,
    ) -> Result<String, ConductorError> {
        let response = self
            .http_client
            .post(format!("{}/sessions", base_url))
            .json(&RegisterSessionRequest {
                session_id,
                interview_id,
                invitation_token: token,
            })
            .send()
            .await
            .map_err(|e| ConductorError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ConductorError::Api(status.as_u16(), error_text));
        }

        let body: RegisterSessionResponse = response
            .json()
            .await
            .map_err(|e| ConductorError::Parse(e.to_string()))?;
        Ok(body.url)
    }
}
