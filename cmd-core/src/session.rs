//! Session state: the current star list and the active isochrone.
//!
//! A [`Session`] has a single owner (the orchestration layer) which passes it
//! by reference to each pipeline stage. Updates are all-or-nothing: stars are
//! replaced wholesale, and replacing them discards the isochrone because its
//! match flags no longer describe the new star set.

use crate::catalog::StarRecord;
use crate::isochrone::{match_isochrone, IsochroneParams, IsochronePoint, MatchSummary};
use crate::projection::PlotFrame;

/// Identifies one catalog fetch.
///
/// Issued by [`Session::begin_fetch`]; only the most recent ticket may commit
/// stars, so a slow reply to a superseded fetch cannot overwrite newer data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

/// An isochrone track together with the parameters it was matched under.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedIsochrone {
    pub track: Vec<IsochronePoint>,
    pub params: IsochroneParams,
}

#[derive(Debug, Default)]
pub struct Session {
    stars: Vec<StarRecord>,
    isochrone: Option<LoadedIsochrone>,
    generation: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new fetch, superseding any outstanding one.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.generation += 1;
        FetchTicket(self.generation)
    }

    /// True if `ticket` belongs to the most recent fetch.
    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Replace the star list and discard the isochrone.
    pub fn replace_stars(&mut self, stars: Vec<StarRecord>) {
        log::debug!(
            "Session: replacing {} stars with {}",
            self.stars.len(),
            stars.len()
        );
        self.stars = stars;
        self.isochrone = None;
    }

    /// Replace the star list only if `ticket` is still current.
    ///
    /// Returns false (and leaves the session untouched) for a stale ticket.
    pub fn commit_stars(&mut self, ticket: FetchTicket, stars: Vec<StarRecord>) -> bool {
        if !self.is_current(ticket) {
            log::warn!(
                "Dropping stale catalog reply ({:?}, current generation {})",
                ticket,
                self.generation
            );
            return false;
        }
        self.replace_stars(stars);
        true
    }

    /// Install a track, matching it against the current stars.
    pub fn set_isochrone(
        &mut self,
        track: Vec<IsochronePoint>,
        params: IsochroneParams,
    ) -> MatchSummary {
        let matched = match_isochrone(&mut self.stars, &track, &params);
        self.isochrone = Some(LoadedIsochrone { track, params });
        MatchSummary {
            matched,
            total: self.stars.len(),
        }
    }

    /// Remove the isochrone overlay and reset every star to unmatched.
    pub fn clear_isochrone(&mut self) {
        self.isochrone = None;
        for star in &mut self.stars {
            star.matched = false;
        }
    }

    /// Drop stars and isochrone.
    pub fn clear(&mut self) {
        self.stars.clear();
        self.isochrone = None;
    }

    pub fn stars(&self) -> &[StarRecord] {
        &self.stars
    }

    pub fn isochrone(&self) -> Option<&LoadedIsochrone> {
        self.isochrone.as_ref()
    }

    pub fn params(&self) -> Option<&IsochroneParams> {
        self.isochrone.as_ref().map(|iso| &iso.params)
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    pub fn matched_count(&self) -> usize {
        self.stars.iter().filter(|s| s.matched).count()
    }

    /// Refresh display positions of stars and track for `frame`.
    pub fn project(&mut self, frame: &PlotFrame) {
        frame.project_stars(&mut self.stars);
        if let Some(iso) = self.isochrone.as_mut() {
            frame.project_track(&mut iso.track, &iso.params);
        }
    }
}
