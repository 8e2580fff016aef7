//! The CMD pipeline: one async task per user action.
//!
//! [`Workbench`] owns the session and is the only writer to it. Every
//! operation reports its outcome twice: as a `Result` for the caller and as
//! the current [`StatusMessage`] for the user.

use std::path::{Path, PathBuf};

use cmd_client::CmdServices;
use cmd_core::{
    AgeKey, CatalogQuery, CmdError, FinderChart, FinderRequest, IsochroneParams, MatchSummary,
    PlotFrame, Result, Session, SkyView, StatusMessage,
};

use crate::plot::{self, PlotError, PlotOptions};

/// State of the finder chart preview for the last fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FinderPreview {
    Loaded(FinderChart),
    Failed(String),
}

pub struct Workbench<S> {
    services: S,
    session: Session,
    frame: PlotFrame,
    status: StatusMessage,
    /// Isochrone selection re-applied after every successful fetch
    selection: IsochroneParams,
    query: Option<CatalogQuery>,
    sky_view: Option<SkyView>,
    finder: Option<FinderPreview>,
}

impl<S: CmdServices> Workbench<S> {
    pub fn new(services: S, frame: PlotFrame, selection: IsochroneParams) -> Self {
        Self {
            services,
            session: Session::new(),
            frame,
            status: StatusMessage::default(),
            selection,
            query: None,
            sky_view: None,
            finder: None,
        }
    }

    pub fn services(&self) -> &S {
        &self.services
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> &StatusMessage {
        &self.status
    }

    pub fn frame(&self) -> &PlotFrame {
        &self.frame
    }

    pub fn selection(&self) -> &IsochroneParams {
        &self.selection
    }

    pub fn query(&self) -> Option<&CatalogQuery> {
        self.query.as_ref()
    }

    pub fn sky_view(&self) -> Option<&SkyView> {
        self.sky_view.as_ref()
    }

    pub fn finder(&self) -> Option<&FinderPreview> {
        self.finder.as_ref()
    }

    fn set_status(&mut self, status: StatusMessage) {
        log::info!("{}", status);
        self.status = status;
    }

    /// Record a failure that happened before any pipeline stage ran.
    pub fn report(&mut self, err: &CmdError) {
        self.set_status(StatusMessage::from(err));
    }

    /// Fetch stars around `query`, then refresh the finder chart and
    /// re-apply the current isochrone selection.
    ///
    /// Returns the number of stars loaded. On failure the plot data is
    /// cleared; an empty result still loads the finder chart.
    pub async fn fetch_catalog(&mut self, query: CatalogQuery) -> Result<usize> {
        self.set_status(StatusMessage::info(format!(
            "Fetching Gaia DR2 data for RA={}, Dec={}, Radius={}°...",
            query.ra, query.dec, query.radius
        )));
        self.sky_view = Some(SkyView::for_query(&query));
        self.query = Some(query);
        self.session.clear();
        self.finder = None;

        let ticket = self.session.begin_fetch();
        let stars = match self.services.fetch_catalog(&query).await {
            Ok(reply) => reply.into_stars(),
            Err(e) => Err(CmdError::from(e)),
        };

        match stars {
            Ok(stars) => {
                let count = stars.len();
                if !self.session.commit_stars(ticket, stars) {
                    return Ok(0);
                }
                self.set_status(StatusMessage::success(format!(
                    "Found {count} stars. Plotting CMD..."
                )));
                self.load_finder_chart(&query).await;

                let selection = self.selection.clone();
                // Isochrone failures are reported through the status line only.
                let _ = self.apply_params(selection).await;
                Ok(count)
            }
            Err(e) if e.is_empty_result() => {
                self.set_status(StatusMessage::error(e.to_string()));
                self.load_finder_chart(&query).await;
                Err(e)
            }
            Err(e) => {
                self.set_status(StatusMessage::error(format!("Error: {e}")));
                self.session.clear();
                self.finder = Some(FinderPreview::Failed(
                    "Could not fetch star data.".to_string(),
                ));
                Err(e)
            }
        }
    }

    async fn load_finder_chart(&mut self, query: &CatalogQuery) {
        let request = FinderRequest::for_query(query);
        match self.services.finder_chart(&request).await {
            Ok(chart) => {
                log::debug!("Finder chart: {}", chart.finder_chart_url);
                self.finder = Some(FinderPreview::Loaded(chart));
            }
            Err(e) => {
                log::warn!("Finder chart fetch error: {}", e);
                self.finder = Some(FinderPreview::Failed(format!(
                    "Failed to load finder chart: {e}"
                )));
                if !self.status.severity.is_final() {
                    self.set_status(StatusMessage::error("Failed to load finder chart."));
                }
            }
        }
    }

    /// Load an isochrone and match it against the current stars.
    ///
    /// With no stars the overlay is removed. Invalid parameters leave the
    /// state untouched. A load failure keeps the stars and removes the overlay.
    pub async fn apply_isochrone(
        &mut self,
        age_key: AgeKey,
        metallicity: f64,
        distance_modulus: f64,
        tolerance: f64,
    ) -> Result<MatchSummary> {
        if self.session.is_empty() {
            return Err(self.no_stars_for_isochrone());
        }
        let params = match IsochroneParams::new(age_key, metallicity, distance_modulus, tolerance)
        {
            Ok(params) => params,
            Err(e) => {
                self.report(&e);
                return Err(e);
            }
        };
        self.apply_params(params).await
    }

    fn no_stars_for_isochrone(&mut self) -> CmdError {
        let err = CmdError::InvalidInput("Cannot apply isochrone: No stars plotted.".to_string());
        self.report(&err);
        self.session.clear_isochrone();
        err
    }

    async fn apply_params(&mut self, params: IsochroneParams) -> Result<MatchSummary> {
        if self.session.is_empty() {
            return Err(self.no_stars_for_isochrone());
        }

        self.set_status(StatusMessage::info(format!(
            "Loading isochrone ({params})..."
        )));
        self.selection = params.clone();

        let track = self
            .services
            .fetch_isochrone(&params.age_key, &params.metallicity_str())
            .await
            .map_err(CmdError::from);

        match track {
            Ok(track) => {
                let summary = self.session.set_isochrone(track, params);
                self.set_status(StatusMessage::success(format!(
                    "Isochrone applied. {summary}."
                )));
                Ok(summary)
            }
            Err(e) => {
                self.set_status(StatusMessage::error(format!(
                    "Error loading isochrone: {e}"
                )));
                self.session.clear_isochrone();
                Err(e)
            }
        }
    }

    /// Write the current stars as CSV.
    ///
    /// `Matched_Isochrone` reflects the overlay currently loaded; with no
    /// overlay every row is `No`.
    pub fn export_csv(&mut self, path: &Path) -> Result<PathBuf> {
        if self.session.is_empty() {
            let err = CmdError::InvalidInput("No star data available to download.".to_string());
            self.report(&err);
            return Err(err);
        }

        match cmd_core::export::save_csv(self.session.stars(), path) {
            Ok(()) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.set_status(StatusMessage::success(format!(
                    "CMD data downloaded as {name}"
                )));
                Ok(path.to_path_buf())
            }
            Err(e) => {
                self.set_status(StatusMessage::error(format!("Error: {e}")));
                Err(e)
            }
        }
    }

    /// Project the session into the plot frame and render it to `path`.
    pub fn render_plot(
        &mut self,
        path: &Path,
        options: PlotOptions,
    ) -> std::result::Result<(), PlotError> {
        self.session.project(&self.frame);
        let rendered = plot::render_file(path, &self.session, &self.frame, options);
        if let Err(e) = &rendered {
            self.set_status(StatusMessage::error(e.to_string()));
        }
        rendered
    }
}
