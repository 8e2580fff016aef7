//! Core of the color-magnitude diagram toolkit.
//!
//! Turns a raw star catalog (VOTable rows from the Gaia archive) into
//! [`StarRecord`]s, classifies them against a theoretical isochrone track,
//! and maps both into a shared display frame for plotting and export.
//!
//! Data flow:
//! ```text
//! catalog text -> votable -> normalize -> StarRecord[]
//!              -> match_isochrone(track, params) -> matched flags
//!              -> PlotFrame::project (display)  /  export::write_csv (file)
//! ```
//!
//! Everything here is synchronous and free of I/O except the exporter's
//! writer and the isochrone file loader. Network access lives in
//! `cmd-client`, orchestration in `cmd-tool`.

pub mod catalog;
pub mod error;
pub mod export;
pub mod finder;
pub mod isochrone;
pub mod projection;
pub mod session;
pub mod status;

pub use catalog::{normalize, stars_from_response, CatalogQuery, RawRow, StarRecord};
pub use error::{CmdError, Result};
pub use finder::{FinderChart, FinderRequest, SkyView};
pub use isochrone::{match_isochrone, AgeKey, IsochroneParams, IsochronePoint, MatchSummary};
pub use projection::{project, DisplayPoint, PlotDomain, PlotFrame, Viewport};
pub use session::{FetchTicket, LoadedIsochrone, Session};
pub use status::{Severity, StatusMessage};
