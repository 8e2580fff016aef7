//! Color-magnitude diagram workbench.
//!
//! Ties the pure pipeline in `cmd-core` to the services in `cmd-client`:
//! [`Workbench`] runs fetch, isochrone, export and plot actions against a
//! [`Session`](cmd_core::Session); [`server`] exposes the proxy API used by
//! remote workbenches; [`config`] persists defaults between runs.

pub mod config;
pub mod plot;
pub mod server;
pub mod shell;
pub mod workbench;

pub use config::{ConfigStorage, PlotConfig, ServicesConfig, ToolConfig};
pub use plot::{PlotError, PlotOptions};
pub use workbench::{FinderPreview, Workbench};

use cmd_client::{CatalogReply, ClientError, CmdServerClient, CmdServices, DirectServices};
use cmd_core::{AgeKey, CatalogQuery, FinderChart, FinderRequest, IsochronePoint};

/// Either route to the services, picked from configuration.
#[derive(Debug, Clone)]
pub enum Services {
    Proxy(CmdServerClient),
    Direct(DirectServices),
}

impl Services {
    /// Use the proxy when a server URL is configured, otherwise go direct.
    pub fn from_config(config: &ServicesConfig) -> Self {
        match &config.server_url {
            Some(url) => {
                log::info!("Using CMD proxy at {}", url);
                Services::Proxy(CmdServerClient::new(url))
            }
            None => {
                log::info!(
                    "Querying {} directly, tracks from {}",
                    config.upstream.vizier_url,
                    config.upstream.isochrone_dir.display()
                );
                Services::Direct(DirectServices::new(config.upstream.clone()))
            }
        }
    }
}

impl CmdServices for Services {
    async fn fetch_catalog(&self, query: &CatalogQuery) -> Result<CatalogReply, ClientError> {
        match self {
            Services::Proxy(client) => client.fetch_catalog(query).await,
            Services::Direct(direct) => direct.fetch_catalog(query).await,
        }
    }

    async fn fetch_isochrone(
        &self,
        age_key: &AgeKey,
        metallicity: &str,
    ) -> Result<Vec<IsochronePoint>, ClientError> {
        match self {
            Services::Proxy(client) => client.fetch_isochrone(age_key, metallicity).await,
            Services::Direct(direct) => direct.fetch_isochrone(age_key, metallicity).await,
        }
    }

    async fn finder_chart(&self, request: &FinderRequest) -> Result<FinderChart, ClientError> {
        match self {
            Services::Proxy(client) => client.finder_chart(request).await,
            Services::Direct(direct) => direct.finder_chart(request).await,
        }
    }
}
