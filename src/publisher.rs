use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::PublishConfig;
use crate::error::TrackerError;
use crate::record::ParticipationRecord;

/// Reply from the spreadsheet web app
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SinkResponse {
    pub status: Option<String>,
    pub message: Option<String>,
}

/// Destination for a finished record set. Returns the destination's message.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn send(&self, records: &[ParticipationRecord]) -> Result<String, TrackerError>;
}

#[async_trait]
impl<T: RecordSink + ?Sized> RecordSink for &T {
    async fn send(&self, records: &[ParticipationRecord]) -> Result<String, TrackerError> {
        (**self).send(records).await
    }
}

/// Sends the full record set to the spreadsheet web app.
pub struct Publisher {
    client: reqwest::Client,
    config: PublishConfig,
}

impl Publisher {
    pub fn new(client: reqwest::Client, config: PublishConfig) -> Self {
        Publisher { client, config }
    }

    /// Posts every record and returns the sink's message on success.
    ///
    /// Transport errors, non-2xx replies, unreadable JSON and a non-"success"
    /// status are all errors for the caller to log.
    pub async fn publish(&self, records: &[ParticipationRecord]) -> Result<String, TrackerError> {
        let url = &self.config.web_app_url;
        info!("Sending {} records to the spreadsheet web app", records.len());

        let response = self
            .client
            .post(url)
            .query(&[("token", self.config.secret_token.as_str())])
            .json(records)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| TrackerError::from_request(e, url))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| TrackerError::from_request(e, url))?;
        if !status.is_success() {
            debug!("Sink response body: {}", body);
            return Err(TrackerError::HttpStatus { status: status.as_u16(), url: url.clone() });
        }

        interpret_response(&body)
    }
}

#[async_trait]
impl RecordSink for Publisher {
    async fn send(&self, records: &[ParticipationRecord]) -> Result<String, TrackerError> {
        self.publish(records).await
    }
}

/// Checks a sink reply body for `"status": "success"`.
pub fn interpret_response(body: &str) -> Result<String, TrackerError> {
    let reply: SinkResponse = serde_json::from_str(body)
        .map_err(|e| TrackerError::SinkProtocol(format!("{e}: {}", body.trim())))?;

    let message = reply.message.unwrap_or_default();
    match reply.status.as_deref() {
        Some("success") => Ok(message),
        _ => Err(TrackerError::SinkRejected(message)),
    }
}
