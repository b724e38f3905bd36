//! # Voting Gateway
//!
//! The external voting system, behind its stated API: process creation,
//! process state retrieval, block height, envelope submission, envelope
//! status by nullifier, and results retrieval. Its internals are out of
//! scope; production talks JSON over HTTP, tests use the in-memory
//! gateway.

use serde::{Deserialize, Serialize};

use gig_core::Address;

use crate::envelope::VoteEnvelope;
use crate::error::GatewayError;

/// Parameters for registering a new voting process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessSpec {
    /// The dispute contract the process decides.
    pub subject: Address,
    /// How many gateway blocks the voting window stays open.
    pub duration_blocks: u64,
    /// Number of selectable options.
    pub option_count: u8,
}

/// A voting process as the gateway reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// The gateway-assigned process identifier.
    pub id: String,
    /// First block at which ballots are accepted.
    pub start_block: u64,
    /// Last block of the voting window.
    pub end_block: u64,
}

/// Tallied results: one count per option index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessResults {
    pub tallies: Vec<u64>,
}

/// The external voting system's API surface.
pub trait VotingGateway: Send + Sync {
    /// Register a voting process; returns its identifier. The process may
    /// not be observable immediately after this returns.
    fn create_process(
        &self,
        spec: &ProcessSpec,
    ) -> impl std::future::Future<Output = Result<String, GatewayError>> + Send;

    /// Retrieve a process, or `None` while it is not yet observable.
    fn process(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<ProcessInfo>, GatewayError>> + Send;

    /// The gateway's current block height.
    fn block_height(
        &self,
    ) -> impl std::future::Future<Output = Result<u64, GatewayError>> + Send;

    /// Submit one sealed vote envelope.
    fn submit_envelope(
        &self,
        envelope: &VoteEnvelope,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;

    /// Whether an envelope with this nullifier has been recorded.
    fn envelope_registered(
        &self,
        process_id: &str,
        nullifier: &str,
    ) -> impl std::future::Future<Output = Result<bool, GatewayError>> + Send;

    /// Tallied results; available once the process has concluded.
    fn results(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<ProcessResults, GatewayError>> + Send;
}

/// JSON-over-HTTP gateway client.
#[derive(Debug)]
pub struct HttpVotingGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpVotingGateway {
    /// Build a client for the gateway at `base_url` (no trailing slash).
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: std::time::Duration,
    ) -> Result<Self, GatewayError> {
        let base_url = base_url.into();
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| GatewayError::Transport {
                operation: "client construction",
                reason: e.to_string(),
            })?;
        Ok(Self { client, base_url })
    }

    async fn get_json<D: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        operation: &'static str,
    ) -> Result<D, GatewayError> {
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .map_err(|e| GatewayError::Transport {
                operation,
                reason: e.to_string(),
            })?;
        let status = resp.status();
        if !status.is_success() {
            let reason = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                operation,
                reason: format!("HTTP {status}: {reason}"),
            });
        }
        resp.json().await.map_err(|e| GatewayError::Malformed {
            operation,
            reason: e.to_string(),
        })
    }
}

#[derive(Deserialize)]
struct CreatedProcess {
    id: String,
}

#[derive(Deserialize)]
struct Height {
    height: u64,
}

#[derive(Deserialize)]
struct EnvelopeStatus {
    registered: bool,
}

impl VotingGateway for HttpVotingGateway {
    async fn create_process(&self, spec: &ProcessSpec) -> Result<String, GatewayError> {
        let operation = "create_process";
        let resp = self
            .client
            .post(format!("{}/processes", self.base_url))
            .json(spec)
            .send()
            .await
            .map_err(|e| GatewayError::Transport {
                operation,
                reason: e.to_string(),
            })?;
        let status = resp.status();
        if !status.is_success() {
            let reason = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                operation,
                reason: format!("HTTP {status}: {reason}"),
            });
        }
        let created: CreatedProcess =
            resp.json().await.map_err(|e| GatewayError::Malformed {
                operation,
                reason: e.to_string(),
            })?;
        Ok(created.id)
    }

    async fn process(&self, id: &str) -> Result<Option<ProcessInfo>, GatewayError> {
        let operation = "process";
        let resp = self
            .client
            .get(format!("{}/processes/{id}", self.base_url))
            .send()
            .await
            .map_err(|e| GatewayError::Transport {
                operation,
                reason: e.to_string(),
            })?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = resp.status();
        if !status.is_success() {
            let reason = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                operation,
                reason: format!("HTTP {status}: {reason}"),
            });
        }
        let info: ProcessInfo = resp.json().await.map_err(|e| GatewayError::Malformed {
            operation,
            reason: e.to_string(),
        })?;
        Ok(Some(info))
    }

    async fn block_height(&self) -> Result<u64, GatewayError> {
        let height: Height = self.get_json("/height", "block_height").await?;
        Ok(height.height)
    }

    async fn submit_envelope(&self, envelope: &VoteEnvelope) -> Result<(), GatewayError> {
        let operation = "submit_envelope";
        let resp = self
            .client
            .post(format!("{}/envelopes", self.base_url))
            .json(envelope)
            .send()
            .await
            .map_err(|e| GatewayError::Transport {
                operation,
                reason: e.to_string(),
            })?;
        let status = resp.status();
        if !status.is_success() {
            let reason = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                operation,
                reason: format!("HTTP {status}: {reason}"),
            });
        }
        Ok(())
    }

    async fn envelope_registered(
        &self,
        process_id: &str,
        nullifier: &str,
    ) -> Result<bool, GatewayError> {
        let status: EnvelopeStatus = self
            .get_json(
                &format!("/envelopes/{process_id}/{nullifier}"),
                "envelope_registered",
            )
            .await?;
        Ok(status.registered)
    }

    async fn results(&self, id: &str) -> Result<ProcessResults, GatewayError> {
        self.get_json(&format!("/results/{id}"), "results").await
    }
}
