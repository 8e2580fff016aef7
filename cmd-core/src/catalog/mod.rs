//! Catalog normalization.
//!
//! Converts raw catalog rows (ordered `[ra, dec, gMag, bpMag, rpMag, ...]`)
//! into [`StarRecord`]s with derived photometric quantities, and interprets
//! whole catalog service replies.

pub mod votable;

use serde::{Deserialize, Serialize};

use crate::error::{CmdError, Result};
use crate::projection::DisplayPoint;

/// One raw catalog row: cell text in column order.
pub type RawRow = Vec<String>;

/// Default cone search radius in degrees.
pub const DEFAULT_RADIUS_DEG: f64 = 0.2;

/// Column list requested from the Gaia DR2 catalog, in the order `normalize` expects.
pub const GAIA_COLUMNS: [&str; 5] = ["RA_ICRS", "DE_ICRS", "Gmag", "BPmag", "RPmag"];

/// One observed object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarRecord {
    /// Right ascension in degrees (absent if the catalog cell was unreadable)
    pub ra: Option<f64>,
    /// Declination in degrees (absent if the catalog cell was unreadable)
    pub dec: Option<f64>,
    /// Gaia G band magnitude
    pub g_mag: f64,
    /// Gaia BP band magnitude
    pub bp_mag: f64,
    /// Gaia RP band magnitude
    pub rp_mag: f64,
    /// BP - RP color index
    pub color: f64,
    /// Plotted magnitude (G)
    pub mag: f64,
    /// Set by the isochrone matcher
    pub matched: bool,
    /// Display position from the last projection, absent when off the plot
    #[serde(skip)]
    pub projected: Option<DisplayPoint>,
}

impl StarRecord {
    /// Build a record from band magnitudes, deriving color and plotted magnitude.
    pub fn from_photometry(
        ra: Option<f64>,
        dec: Option<f64>,
        g_mag: f64,
        bp_mag: f64,
        rp_mag: f64,
    ) -> Self {
        Self {
            ra,
            dec,
            g_mag,
            bp_mag,
            rp_mag,
            color: bp_mag - rp_mag,
            mag: g_mag,
            matched: false,
            projected: None,
        }
    }
}

/// Parse a catalog cell as a finite float.
///
/// Surrounding whitespace is ignored. `NaN`, infinities and empty cells are
/// rejected.
pub fn parse_finite(field: &str) -> Option<f64> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Normalize raw rows into star records.
///
/// Rows whose G, BP or RP cell is not a finite number are dropped without
/// error, as are rows with fewer than five cells. Trailing cells are ignored
/// and input order is preserved.
pub fn normalize<R, S>(rows: &[R]) -> Vec<StarRecord>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let stars: Vec<StarRecord> = rows
        .iter()
        .filter_map(|row| {
            let cells = row.as_ref();
            if cells.len() < 5 {
                return None;
            }
            let g_mag = parse_finite(cells[2].as_ref())?;
            let bp_mag = parse_finite(cells[3].as_ref())?;
            let rp_mag = parse_finite(cells[4].as_ref())?;
            Some(StarRecord::from_photometry(
                parse_finite(cells[0].as_ref()),
                parse_finite(cells[1].as_ref()),
                g_mag,
                bp_mag,
                rp_mag,
            ))
        })
        .collect();

    log::debug!(
        "Normalized {} of {} catalog rows",
        stars.len(),
        rows.len()
    );

    stars
}

/// Interpret a catalog service reply.
///
/// `status` is the HTTP status of the reply and `body` its VOTable text.
/// Returns the normalized stars, or the error kind the reply represents:
/// an explicit service error or non-success status is a
/// [`CmdError::FetchFailure`], a reply without a data table is a
/// [`CmdError::ParseFailure`], and a table without usable rows is a
/// [`CmdError::EmptyResult`].
pub fn stars_from_response(status: u16, body: &str) -> Result<Vec<StarRecord>> {
    if !(200..300).contains(&status) {
        let message = votable::parse(body)
            .ok()
            .and_then(|table| table.error_status)
            .filter(|msg| !msg.is_empty())
            .unwrap_or_else(|| format!("Server responded with status {status}"));
        return Err(CmdError::FetchFailure(message));
    }

    let table = votable::parse(body)?;

    if !table.has_table_data {
        if let Some(msg) = table.error_status {
            let msg = if msg.is_empty() {
                "Unknown VizieR Error".to_string()
            } else {
                msg
            };
            return Err(CmdError::FetchFailure(format!("Error from VizieR: {msg}")));
        }
        if body.contains("No table found") {
            return Err(CmdError::EmptyResult(
                "No stars found in VizieR for this query.".to_string(),
            ));
        }
        return Err(CmdError::ParseFailure(
            "Error parsing star data: No <TABLEDATA> found in response.".to_string(),
        ));
    }

    let stars = normalize(&table.rows);
    if stars.is_empty() {
        log::warn!("Catalog returned {} rows, none usable", table.rows.len());
        return Err(CmdError::EmptyResult(
            "No stars with valid G, BP, RP magnitudes found. \
             Try increasing the radius or changing coordinates."
                .to_string(),
        ));
    }

    log::info!("Catalog reply yielded {} stars", stars.len());
    Ok(stars)
}

/// A cone search around a sky position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatalogQuery {
    /// Center right ascension in degrees
    pub ra: f64,
    /// Center declination in degrees
    pub dec: f64,
    /// Search radius in degrees
    pub radius: f64,
}

impl CatalogQuery {
    /// Validate a cone search: all values finite and a positive radius.
    pub fn new(ra: f64, dec: f64, radius: f64) -> Result<Self> {
        if !ra.is_finite() || !dec.is_finite() || !radius.is_finite() || radius <= 0.0 {
            return Err(CmdError::InvalidInput(
                "Invalid input: RA, Dec must be numbers, Radius must be positive.".to_string(),
            ));
        }
        Ok(Self { ra, dec, radius })
    }

    /// Build a query from user-entered text fields.
    pub fn parse(ra: &str, dec: &str, radius: &str) -> Result<Self> {
        let nan = f64::NAN;
        Self::new(
            parse_finite(ra).unwrap_or(nan),
            parse_finite(dec).unwrap_or(nan),
            parse_finite(radius).unwrap_or(nan),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;
    use test_helpers::{votable_error_fixture, votable_fixture};

    #[test]
    fn test_normalize_single_row() {
        let stars = normalize(&[["10", "20", "15.0", "16.2", "14.1"]]);

        assert_eq!(stars.len(), 1);
        let star = &stars[0];
        assert_relative_eq!(star.color, 2.1, epsilon = 1e-9);
        assert_relative_eq!(star.mag, 15.0);
        assert_eq!(star.ra, Some(10.0));
        assert_eq!(star.dec, Some(20.0));
        assert!(!star.matched);
        assert!(star.projected.is_none());
    }

    #[rstest]
    #[case(["1", "2", "", "16.2", "14.1"])]
    #[case(["1", "2", "15.0", "abc", "14.1"])]
    #[case(["1", "2", "15.0", "16.2", "NaN"])]
    #[case(["1", "2", "inf", "16.2", "14.1"])]
    fn test_normalize_drops_bad_magnitudes(#[case] row: [&str; 5]) {
        assert!(normalize(&[row]).is_empty());
    }

    #[test]
    fn test_normalize_keeps_order_and_filters() {
        let rows: Vec<Vec<String>> = vec![
            vec!["1", "1", "12", "13", "12"],
            vec!["2", "2", "x", "13", "12"],
            vec!["3", "3", "14", "15", "13"],
            vec!["4", "4", "14"],
        ]
        .into_iter()
        .map(|r| r.into_iter().map(String::from).collect())
        .collect();

        let stars = normalize(&rows);
        assert!(stars.len() <= rows.len());
        assert_eq!(stars.len(), 2);
        assert_eq!(stars[0].ra, Some(1.0));
        assert_eq!(stars[1].ra, Some(3.0));
    }

    #[test]
    fn test_normalize_tolerates_unreadable_position() {
        let stars = normalize(&[["", " 20.5 ", "15", "16", "14", "extra", "cells"]]);
        assert_eq!(stars.len(), 1);
        assert_eq!(stars[0].ra, None);
        assert_eq!(stars[0].dec, Some(20.5));
    }

    #[test]
    fn test_normalize_empty_input() {
        let rows: Vec<RawRow> = Vec::new();
        assert!(normalize(&rows).is_empty());
    }

    #[test]
    fn test_response_with_stars() {
        let body = votable_fixture(&[
            ["10", "20", "15.0", "16.2", "14.1"],
            ["10", "20", "", "16.2", "14.1"],
        ]);
        let stars = stars_from_response(200, &body).unwrap();
        assert_eq!(stars.len(), 1);
    }

    #[test]
    fn test_response_without_usable_rows_is_empty_result() {
        let body = votable_fixture(&[["10", "20", "", "", ""]]);
        let err = stars_from_response(200, &body).unwrap_err();
        assert!(err.is_empty_result());
    }

    #[test]
    fn test_response_error_status_on_failure() {
        let body = votable_error_fixture("Catalogue not available");
        let err = stars_from_response(500, &body).unwrap_err();
        match err {
            CmdError::FetchFailure(msg) => assert_eq!(msg, "Catalogue not available"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_response_plain_failure_status() {
        let err = stars_from_response(503, "Service Unavailable").unwrap_err();
        match err {
            CmdError::FetchFailure(msg) => assert_eq!(msg, "Server responded with status 503"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_response_error_info_with_ok_status() {
        let body = votable_error_fixture("Bad position");
        let err = stars_from_response(200, &body).unwrap_err();
        match err {
            CmdError::FetchFailure(msg) => assert_eq!(msg, "Error from VizieR: Bad position"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_response_no_table_found() {
        let body = "<VOTABLE><INFO name=\"Warning\">No table found</INFO></VOTABLE>";
        let err = stars_from_response(200, body).unwrap_err();
        assert!(err.is_empty_result());
    }

    #[test]
    fn test_response_without_table_is_parse_failure() {
        let err = stars_from_response(200, "<VOTABLE></VOTABLE>").unwrap_err();
        assert!(matches!(err, CmdError::ParseFailure(_)));
    }

    #[rstest]
    #[case(250.423, 36.46, 0.2, true)]
    #[case(250.423, 36.46, 0.0, false)]
    #[case(250.423, 36.46, -1.0, false)]
    #[case(f64::NAN, 36.46, 0.2, false)]
    fn test_query_validation(
        #[case] ra: f64,
        #[case] dec: f64,
        #[case] radius: f64,
        #[case] ok: bool,
    ) {
        assert_eq!(CatalogQuery::new(ra, dec, radius).is_ok(), ok);
    }

    #[test]
    fn test_query_parse_text() {
        let query = CatalogQuery::parse("250.423", " 36.460", "0.2").unwrap();
        assert_relative_eq!(query.dec, 36.46);

        let err = CatalogQuery::parse("north", "36.46", "0.2").unwrap_err();
        assert!(matches!(err, CmdError::InvalidInput(_)));
    }
}
