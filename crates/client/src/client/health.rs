//! Health check operations.

use serde::{Deserialize, Serialize};

use super::TodoClient;
use crate::error::{ClientError, Result};

/// Body of `GET /api/healthcheck`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub backend: String,
    pub database: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

impl TodoClient {
    /// Check database reachability. An unhealthy server is reported as a
    /// status, not an error.
    pub async fn healthcheck(&self) -> Result<HealthStatus> {
        let response = self
            .client
            .get(self.url("/api/healthcheck"))
            .send()
            .await?;

        let status = response.status().as_u16();
        if status == 200 || status == 503 {
            Ok(response.json().await?)
        } else {
            Err(ClientError::ServerError {
                status,
                message: response.text().await.unwrap_or_default(),
            })
        }
    }

    /// Liveness check.
    pub async fn livez(&self) -> Result<()> {
        let response = self.client.get(self.url("/livez")).send().await?;
        response.error_for_status()?;
        Ok(())
    }
}
