//! HTTP client for the `cmd_serve` proxy API.

use cmd_core::{AgeKey, CatalogQuery, FinderChart, FinderRequest, IsochronePoint};
use serde::{Deserialize, Serialize};

use crate::{CatalogReply, ClientError, CmdServices};

/// Body of `POST /api/cmd`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogRequest {
    pub ra: Option<f64>,
    pub dec: Option<f64>,
    pub radius: Option<f64>,
}

impl From<&CatalogQuery> for CatalogRequest {
    fn from(query: &CatalogQuery) -> Self {
        Self {
            ra: Some(query.ra),
            dec: Some(query.dec),
            radius: Some(query.radius),
        }
    }
}

/// Reply of `GET /api/finder_chart`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinderChartResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finder_chart_url: Option<String>,
}

/// Client for the proxy API.
#[derive(Debug, Clone)]
pub struct CmdServerClient {
    base_url: String,
    http: reqwest::Client,
}

impl CmdServerClient {
    /// Create a new client pointing to the given base URL.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the server (e.g., "http://localhost:5000")
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Get the base URL this client is configured for.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn error_message(response: reqwest::Response) -> String {
        response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string())
    }
}

impl CmdServices for CmdServerClient {
    async fn fetch_catalog(&self, query: &CatalogQuery) -> Result<CatalogReply, ClientError> {
        let response = self
            .http
            .post(self.url("/api/cmd"))
            .json(&CatalogRequest::from(query))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(CatalogReply { status, body })
    }

    async fn fetch_isochrone(
        &self,
        age_key: &AgeKey,
        metallicity: &str,
    ) -> Result<Vec<IsochronePoint>, ClientError> {
        let response = self
            .http
            .get(self.url("/api/isochrone"))
            .query(&[("age", age_key.as_str()), ("z", metallicity)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            log::warn!(
                "Isochrone request failed ({}): {}",
                status,
                Self::error_message(response).await
            );
            return Err(ClientError::ServerError {
                status,
                message: format!("Isochrone file not found or server error ({status})"),
            });
        }

        let text = response.text().await?;
        cmd_core::isochrone::parse_track(&text).map_err(ClientError::from)
    }

    async fn finder_chart(&self, request: &FinderRequest) -> Result<FinderChart, ClientError> {
        let response = self
            .http
            .get(self.url("/api/finder_chart"))
            .query(&[
                ("ra", request.ra.to_string()),
                ("dec", request.dec.to_string()),
                ("scale", request.scale.to_string()),
                ("width", request.width.to_string()),
                ("height", request.height.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(ClientError::ServerError {
                status,
                message: format!("Finder chart server error ({status})"),
            });
        }

        let reply: FinderChartResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Parse(e.to_string()))?;

        reply
            .finder_chart_url
            .map(|finder_chart_url| FinderChart { finder_chart_url })
            .ok_or(ClientError::MissingField("Finder chart URL"))
    }
}
