use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::config::WebhookConfig;
use crate::database::models::RecordView;

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid webhook URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Kind of intake that produced the forwarded records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeKind {
    InvoiceUploaded,
    StatementUploaded,
    BalanceAdded,
}

/// Document posted to the automation webhook after a successful intake.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeEvent {
    pub event: IntakeKind,
    pub user_id: Uuid,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    pub records: Vec<RecordView>,
}

/// Fire-and-forget delivery of intake events. A forwarder without a target
/// URL accepts events and drops them.
#[derive(Debug, Clone, Default)]
pub struct WebhookForwarder {
    target: Option<(Url, reqwest::Client)>,
}

impl WebhookForwarder {
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn from_config(config: &WebhookConfig) -> Result<Self, WebhookError> {
        let Some(raw) = config.url.as_deref() else {
            return Ok(Self::disabled());
        };

        let url = Url::parse(raw).map_err(|e| WebhookError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(WebhookError::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            target: Some((url, client)),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Post the event on a detached task. Returns the task handle when an
    /// event was actually sent.
    pub fn forward(&self, event: IntakeEvent) -> Option<tokio::task::JoinHandle<()>> {
        let (url, client) = self.target.clone()?;

        Some(tokio::spawn(async move {
            match client.post(url.clone()).json(&event).send().await {
                Ok(response) if response.status().is_success() => {
                    tracing::debug!("Forwarded {:?} for {} to webhook", event.event, event.username);
                }
                Ok(response) => {
                    tracing::warn!("Webhook {} answered {}", url, response.status());
                }
                Err(e) => {
                    tracing::warn!("Webhook {} unreachable: {}", url, e);
                }
            }
        }))
    }
}
