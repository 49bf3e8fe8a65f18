//! HTTP client for a message relay.
//!
//! # Responsibilities
//! - Submit signed messages
//! - List and fetch messages for a recipient
//! - Download externally stored payloads and inline them after verification
//!
//! # Design Decisions
//! - Every request carries the configured timeout, surfaced as
//!   `TransportError::Timeout`
//! - An address without messages is an empty list, not an error

use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::RelayConfig;
use crate::record::message::SignedMessage;
use crate::record::types::ValidationError;
use crate::relay::types::{
    ListOptions, MessageSummary, RelayStatus, SendResponse, TransportError,
};

/// Client for the relay REST API.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    default_limit: usize,
}

impl RelayClient {
    pub fn new(config: &RelayConfig) -> Result<Self, TransportError> {
        let mut base_url = Url::parse(&config.url)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", config.url, e)))?;
        // Relative joins must keep any path prefix
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            timeout,
            default_limit: config.message_limit,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Listing options with the configured page size.
    pub fn default_list_options(&self) -> ListOptions {
        ListOptions::new(self.default_limit)
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", path, e)))
    }

    fn transport_error(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout.as_secs())
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Unreachable(err.to_string())
        }
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, TransportError> {
        let response = request.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound);
        }
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, TransportError> {
        let response = self.execute(self.http.get(url)).await?;
        response.json().await.map_err(|e| self.transport_error(e))
    }

    /// Liveness of the relay.
    pub async fn health(&self) -> Result<RelayStatus, TransportError> {
        self.get_json(self.endpoint("")?).await
    }

    /// Submit `message`; returns the hash the relay stored it under.
    pub async fn send(&self, message: &SignedMessage) -> Result<B256, TransportError> {
        if message.record.recipient().is_none() {
            return Err(ValidationError::MissingRecipient.into());
        }

        let url = self.endpoint("messages")?;
        let response = self.execute(self.http.post(url).json(message)).await?;
        let sent: SendResponse = response.json().await.map_err(|e| self.transport_error(e))?;

        tracing::info!(
            hash = %sent.hash,
            recipient = ?message.record.recipient(),
            size = message.record.content().size(),
            "Message sent to relay"
        );
        Ok(sent.hash)
    }

    /// Summaries of messages addressed to `recipient`, newest first.
    pub async fn list_summaries(
        &self,
        recipient: Address,
        options: ListOptions,
    ) -> Result<Vec<MessageSummary>, TransportError> {
        let mut url = self.endpoint(&format!("messages/{}", recipient))?;
        url.query_pairs_mut()
            .append_pair("limit", &options.limit.to_string())
            .append_pair("offset", &options.offset.to_string());

        match self.get_json(url).await {
            Ok(summaries) => Ok(summaries),
            Err(TransportError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Full signed record stored under `hash` for `recipient`.
    pub async fn fetch_full(
        &self,
        recipient: Address,
        hash: B256,
    ) -> Result<SignedMessage, TransportError> {
        let url = self.endpoint(&format!("messages/{}/{}", recipient, hash))?;
        self.get_json(url).await
    }

    /// Raw bytes behind an external payload URL.
    pub async fn download(&self, url: &str) -> Result<Bytes, TransportError> {
        let url = Url::parse(url).map_err(|e| TransportError::InvalidUrl(format!("{}: {}", url, e)))?;
        let response = self.execute(self.http.get(url)).await?;
        response
            .bytes()
            .await
            .map(Bytes::from)
            .map_err(|e| self.transport_error(e))
    }

    /// Inline an externally stored payload after checking its digest.
    ///
    /// Messages with inline content are returned unchanged.
    pub async fn resolve(&self, message: SignedMessage) -> Result<SignedMessage, TransportError> {
        let Some(url) = message.record.content().url().map(str::to_string) else {
            return Ok(message);
        };
        let bytes = self.download(&url).await?;
        tracing::debug!(url = %url, size = bytes.len(), "External payload downloaded");
        Ok(message.resolve(bytes)?)
    }
}
