//! Client for the external breach prediction service.
//!
//! The service is a black box: we forward the caller's parameters and keep
//! whatever JSON it answers with.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::PredictorConfig;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("prediction service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("prediction service returned HTTP {0}")]
    Status(u16),
}

/// Parameters forwarded to the prediction service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub breach_type: Option<String>,
    #[serde(default)]
    pub year: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct PredictionClient {
    http: reqwest::Client,
    url: String,
}

impl PredictionClient {
    pub fn new(config: &PredictorConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn predict(&self, request: &PredictionRequest) -> Result<Value, PredictError> {
        debug!(url = %self.url, ?request, "forwarding prediction request");

        let response = self.http.post(&self.url).json(request).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(url = %self.url, status = status.as_u16(), "prediction service rejected request");
            return Err(PredictError::Status(status.as_u16()));
        }

        Ok(response.json::<Value>().await?)
    }
}
