//! Services reached without the proxy server.

use cmd_core::{AgeKey, CatalogQuery, FinderChart, FinderRequest, IsochronePoint};

use crate::upstream::{fetch_votable, UpstreamConfig};
use crate::{CatalogReply, ClientError, CmdServices};

/// Queries VizieR directly, reads tracks from a local directory and builds
/// SDSS cutout URLs without a round trip.
#[derive(Debug, Clone)]
pub struct DirectServices {
    http: reqwest::Client,
    upstream: UpstreamConfig,
}

impl DirectServices {
    pub fn new(upstream: UpstreamConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            upstream,
        }
    }

    pub fn upstream(&self) -> &UpstreamConfig {
        &self.upstream
    }
}

impl CmdServices for DirectServices {
    async fn fetch_catalog(&self, query: &CatalogQuery) -> Result<CatalogReply, ClientError> {
        fetch_votable(&self.http, &self.upstream, query).await
    }

    async fn fetch_isochrone(
        &self,
        age_key: &AgeKey,
        metallicity: &str,
    ) -> Result<Vec<IsochronePoint>, ClientError> {
        let track =
            cmd_core::isochrone::load_track(&self.upstream.isochrone_dir, age_key, metallicity)?;
        Ok(track)
    }

    async fn finder_chart(&self, request: &FinderRequest) -> Result<FinderChart, ClientError> {
        let url = self.upstream.finder_chart_url(request)?;
        Ok(FinderChart {
            finder_chart_url: url.to_string(),
        })
    }
}
