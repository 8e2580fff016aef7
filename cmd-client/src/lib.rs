//! Clients for the services the CMD pipeline consumes.
//!
//! Three services are involved: the star catalog (a VizieR cone search
//! returning VOTable text), the isochrone track store, and the finder chart
//! cutout service. They can be reached two ways, both implementing
//! [`CmdServices`]:
//!
//! - [`CmdServerClient`] talks to the `cmd_serve` proxy API
//!   (`/api/cmd`, `/api/isochrone`, `/api/finder_chart`);
//! - [`DirectServices`] queries VizieR itself, reads tracks from a local
//!   directory and builds SDSS cutout URLs locally.

mod direct;
mod error;
mod server_client;
pub mod upstream;

pub use direct::DirectServices;
pub use error::ClientError;
pub use server_client::{CatalogRequest, CmdServerClient, FinderChartResponse};
pub use upstream::UpstreamConfig;

use cmd_core::{AgeKey, CatalogQuery, FinderChart, FinderRequest, IsochronePoint, StarRecord};

/// Raw catalog reply: HTTP status and VOTable body.
///
/// The status is kept because a failed query may still carry a VOTable with
/// an explanatory `QUERY_STATUS` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogReply {
    pub status: u16,
    pub body: String,
}

impl CatalogReply {
    /// Interpret the reply into normalized stars.
    pub fn into_stars(self) -> cmd_core::Result<Vec<StarRecord>> {
        cmd_core::stars_from_response(self.status, &self.body)
    }
}

/// The service seam used by the orchestration layer.
#[allow(async_fn_in_trait)]
pub trait CmdServices {
    /// Run a cone search and return the raw reply.
    async fn fetch_catalog(&self, query: &CatalogQuery) -> Result<CatalogReply, ClientError>;

    /// Fetch an isochrone track (model space, unshifted).
    async fn fetch_isochrone(
        &self,
        age_key: &AgeKey,
        metallicity: &str,
    ) -> Result<Vec<IsochronePoint>, ClientError>;

    /// Resolve a finder chart image URL.
    async fn finder_chart(&self, request: &FinderRequest) -> Result<FinderChart, ClientError>;
}
