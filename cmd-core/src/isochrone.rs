//! Isochrone tracks and star matching.
//!
//! A track is a list of model `(color, mag)` points at fixed age and
//! metallicity. Stars are matched against the track shifted by a distance
//! modulus using an axis-aligned open box of half-width `tolerance`.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::catalog::StarRecord;
use crate::error::{CmdError, Result};
use crate::projection::DisplayPoint;

/// One point of a theoretical stellar track (model space, unshifted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsochronePoint {
    pub color: f64,
    pub mag: f64,
    /// Display position from the last projection, absent when off the plot
    #[serde(skip)]
    pub projected: Option<DisplayPoint>,
}

impl IsochronePoint {
    pub fn new(color: f64, mag: f64) -> Self {
        Self {
            color,
            mag,
            projected: None,
        }
    }
}

/// Identifier selecting an age track, e.g. `parsec_9.0` or `parsec_globular`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgeKey(String);

impl AgeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human label: the part after the model prefix (`parsec_9.0` -> `9.0`).
    pub fn label(&self) -> &str {
        self.0
            .split_once('_')
            .map(|(_, rest)| rest)
            .unwrap_or(&self.0)
    }
}

impl Default for AgeKey {
    fn default() -> Self {
        Self::new("parsec_9.0")
    }
}

impl fmt::Display for AgeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgeKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Parameters under which an isochrone is loaded and matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsochroneParams {
    pub age_key: AgeKey,
    /// Metallicity Z
    pub metallicity: f64,
    /// Additive shift applied to model magnitudes
    pub distance_modulus: f64,
    /// Half-width of the matching box in both axes
    pub tolerance: f64,
}

impl IsochroneParams {
    /// Validate matching parameters.
    ///
    /// Distance modulus and tolerance must be finite and tolerance non-negative.
    pub fn new(
        age_key: AgeKey,
        metallicity: f64,
        distance_modulus: f64,
        tolerance: f64,
    ) -> Result<Self> {
        if !distance_modulus.is_finite() || !tolerance.is_finite() || tolerance < 0.0 {
            return Err(CmdError::InvalidInput(
                "Invalid Distance Modulus or Tolerance (must be non-negative).".to_string(),
            ));
        }
        if !metallicity.is_finite() || metallicity < 0.0 {
            return Err(CmdError::InvalidInput(format!(
                "Invalid metallicity Z: {metallicity}"
            )));
        }
        Ok(Self {
            age_key,
            metallicity,
            distance_modulus,
            tolerance,
        })
    }

    /// Metallicity as sent to the track service (`0.019`).
    pub fn metallicity_str(&self) -> String {
        format!("{}", self.metallicity)
    }

    /// Track magnitude shifted into observed space.
    pub fn shifted_mag(&self, point: &IsochronePoint) -> f64 {
        point.mag + self.distance_modulus
    }
}

impl Default for IsochroneParams {
    fn default() -> Self {
        Self {
            age_key: AgeKey::default(),
            metallicity: 0.019,
            distance_modulus: 10.0,
            tolerance: 0.2,
        }
    }
}

impl fmt::Display for IsochroneParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Age: {}, Z: {}, DM: {}, Tol: {}",
            self.age_key.label(),
            self.metallicity,
            self.distance_modulus,
            self.tolerance
        )
    }
}

/// Outcome of a matching pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSummary {
    pub matched: usize,
    pub total: usize,
}

impl MatchSummary {
    /// Matched fraction in percent, 0 when there are no stars.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.matched as f64 / self.total as f64 * 100.0
        }
    }
}

impl fmt::Display for MatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Matched {} / {} stars ({:.1}%)",
            self.matched,
            self.total,
            self.percent()
        )
    }
}

/// Classify stars against a track.
///
/// Each star is reset to unmatched, then marked matched on the first track
/// point (in track order) for which both
/// `|star.color - p.color| < tolerance` and
/// `|star.mag - (p.mag + distance_modulus)| < tolerance` hold. The box is
/// open, so a star exactly on the boundary does not match. Only the
/// `matched` flags are written.
///
/// Returns the number of matched stars.
pub fn match_isochrone(
    stars: &mut [StarRecord],
    track: &[IsochronePoint],
    params: &IsochroneParams,
) -> usize {
    let tol = params.tolerance;
    let mut matched = 0;

    for star in stars.iter_mut() {
        star.matched = track.iter().any(|point| {
            (star.color - point.color).abs() < tol
                && (star.mag - params.shifted_mag(point)).abs() < tol
        });
        if star.matched {
            matched += 1;
        }
    }

    log::debug!(
        "Isochrone match: {} / {} stars against {} track points",
        matched,
        stars.len(),
        track.len()
    );

    matched
}

/// File name of a stored track: `{age}_z{metallicity without dots}.json`.
pub fn track_filename(age_key: &AgeKey, metallicity: &str) -> String {
    format!("{}_z{}.json", age_key.as_str(), metallicity.replace('.', ""))
}

/// Resolve a track file inside `dir`, refusing keys that would escape it.
pub fn track_path(dir: &Path, age_key: &AgeKey, metallicity: &str) -> Result<PathBuf> {
    let unsafe_part = |s: &str| s.is_empty() || s.contains(['/', '\\']) || s.contains("..");
    if unsafe_part(age_key.as_str()) || unsafe_part(metallicity) {
        return Err(CmdError::InvalidInput(format!(
            "Invalid isochrone selection: age '{age_key}', Z '{metallicity}'"
        )));
    }
    Ok(dir.join(track_filename(age_key, metallicity)))
}

/// Decode a JSON track: an array of `{"color": .., "mag": ..}` objects.
pub fn parse_track(json: &str) -> Result<Vec<IsochronePoint>> {
    serde_json::from_str(json)
        .map_err(|e| CmdError::ParseFailure(format!("Invalid isochrone data: {e}")))
}

/// Load a stored track from `dir`.
///
/// A missing file is a [`CmdError::FetchFailure`] naming the file.
pub fn load_track(
    dir: &Path,
    age_key: &AgeKey,
    metallicity: &str,
) -> Result<Vec<IsochronePoint>> {
    let path = track_path(dir, age_key, metallicity)?;
    if !path.exists() {
        return Err(CmdError::FetchFailure(format!(
            "Isochrone file '{}' not found",
            track_filename(age_key, metallicity)
        )));
    }
    let json = std::fs::read_to_string(&path)?;
    let track = parse_track(&json)?;
    log::debug!("Loaded {} track points from {}", track.len(), path.display());
    Ok(track)
}
