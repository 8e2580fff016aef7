//! Shared fixtures for the workbench and shell tests.
#![allow(dead_code)]

use std::cell::Cell;

use cmd_client::{CatalogReply, ClientError, CmdServices};
use cmd_core::{
    AgeKey, CatalogQuery, FinderChart, FinderRequest, IsochroneParams, IsochronePoint, PlotFrame,
};
use cmd_tool::Workbench;
use test_helpers::votable_fixture;

/// In-memory stand-in for the three services.
pub struct FakeServices {
    pub catalog: Option<(u16, String)>,
    /// Simulates the catalog service going away between fetches
    pub down: Cell<bool>,
    pub tracks: Vec<(AgeKey, String, Vec<IsochronePoint>)>,
    pub finder_ok: bool,
}

impl FakeServices {
    pub fn with_stars(rows: &[[&str; 5]]) -> Self {
        Self {
            catalog: Some((200, votable_fixture(rows))),
            down: Cell::new(false),
            tracks: vec![(
                AgeKey::default(),
                "0.019".to_string(),
                vec![IsochronePoint::new(1.5, 5.0), IsochronePoint::new(2.5, 8.0)],
            )],
            finder_ok: true,
        }
    }
}

impl CmdServices for FakeServices {
    async fn fetch_catalog(&self, _query: &CatalogQuery) -> Result<CatalogReply, ClientError> {
        match &self.catalog {
            Some((status, body)) if !self.down.get() => Ok(CatalogReply {
                status: *status,
                body: body.clone(),
            }),
            _ => Err(ClientError::Http("connection refused".to_string())),
        }
    }

    async fn fetch_isochrone(
        &self,
        age_key: &AgeKey,
        metallicity: &str,
    ) -> Result<Vec<IsochronePoint>, ClientError> {
        self.tracks
            .iter()
            .find(|(age, z, _)| age == age_key && z == metallicity)
            .map(|(_, _, track)| track.clone())
            .ok_or(ClientError::ServerError {
                status: 404,
                message: "Isochrone file not found or server error (404)".to_string(),
            })
    }

    async fn finder_chart(&self, request: &FinderRequest) -> Result<FinderChart, ClientError> {
        if self.finder_ok {
            Ok(FinderChart {
                finder_chart_url: format!("https://cutouts.test/{}/{}", request.ra, request.dec),
            })
        } else {
            Err(ClientError::ServerError {
                status: 500,
                message: "Finder chart server error (500)".to_string(),
            })
        }
    }
}

pub const ROWS: [[&str; 5]; 3] = [
    ["250.4", "36.4", "15.0", "16.0", "14.5"],
    ["250.5", "36.5", "12.0", "13.0", "12.5"],
    ["250.6", "36.6", "abc", "13.0", "12.5"],
];

pub fn query() -> CatalogQuery {
    CatalogQuery::new(250.423, 36.46, 0.2).unwrap()
}

pub fn bench(services: FakeServices) -> Workbench<FakeServices> {
    Workbench::new(services, PlotFrame::default(), IsochroneParams::default())
}
