//! Upstream archive endpoints: VizieR cone search and SDSS image cutouts.

use std::path::PathBuf;

use cmd_core::catalog::GAIA_COLUMNS;
use cmd_core::{CatalogQuery, FinderRequest};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{CatalogReply, ClientError};

/// VizieR VOTable endpoint.
pub const DEFAULT_VIZIER_URL: &str = "https://vizier.cds.unistra.fr/viz-bin/votable";
/// Gaia DR2, full sky coverage.
pub const DEFAULT_CATALOG: &str = "I/345/gaia2";
/// SDSS DR16 JPEG cutout endpoint.
pub const DEFAULT_CUTOUT_URL: &str =
    "https://skyserver.sdss.org/dr16/SkyServerWS/ImgCutout/getjpeg";

/// Where the upstream services live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// VizieR VOTable endpoint
    pub vizier_url: String,
    /// VizieR catalog identifier
    pub catalog: String,
    /// SDSS cutout endpoint
    pub cutout_url: String,
    /// Directory holding `{age}_z{Z}.json` track files
    pub isochrone_dir: PathBuf,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            vizier_url: DEFAULT_VIZIER_URL.to_string(),
            catalog: DEFAULT_CATALOG.to_string(),
            cutout_url: DEFAULT_CUTOUT_URL.to_string(),
            isochrone_dir: PathBuf::from("static/isochrones"),
        }
    }
}

impl UpstreamConfig {
    /// Cone search URL returning `RA_ICRS,DE_ICRS,Gmag,BPmag,RPmag` columns.
    pub fn cone_search_url(&self, query: &CatalogQuery) -> Result<Url, ClientError> {
        let url = Url::parse_with_params(
            &self.vizier_url,
            &[
                ("-source", self.catalog.clone()),
                ("-c", format!("{} {}", query.ra, query.dec)),
                ("-c.r", query.radius.to_string()),
                ("-out", GAIA_COLUMNS.join(",")),
            ],
        )?;
        Ok(url)
    }

    /// Cutout image URL for a finder chart.
    pub fn finder_chart_url(&self, request: &FinderRequest) -> Result<Url, ClientError> {
        let url = Url::parse_with_params(
            &self.cutout_url,
            &[
                ("ra", request.ra.to_string()),
                ("dec", request.dec.to_string()),
                ("scale", request.scale.to_string()),
                ("width", request.width.to_string()),
                ("height", request.height.to_string()),
            ],
        )?;
        Ok(url)
    }
}

/// Run a cone search against VizieR.
///
/// The reply is returned whatever its status; only transport failures are
/// errors here.
pub async fn fetch_votable(
    http: &reqwest::Client,
    upstream: &UpstreamConfig,
    query: &CatalogQuery,
) -> Result<CatalogReply, ClientError> {
    let url = upstream.cone_search_url(query)?;
    log::info!("VizieR cone search: {}", url);

    let response = http.get(url).send().await?;
    let status = response.status().as_u16();
    let body = response.text().await?;

    log::debug!("VizieR replied {} with {} bytes", status, body.len());
    Ok(CatalogReply { status, body })
}
