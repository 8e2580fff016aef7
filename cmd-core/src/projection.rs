//! Data-space to display-space projection for the CMD plot.
//!
//! Stars and isochrone points go through the same [`project`] function so
//! the plotted picture agrees with the matcher's numeric comparison. The
//! magnitude axis is inverted: `y_max_display` (the numerically smaller,
//! brighter magnitude) maps to the top of the plot.
//!
//! ```text
//! x = x_pad + (color - x_min) / (x_max - x_min) * (width  - 2 x_pad)
//! y = y_pad + (mag - y_max_display) / (y_min_display - y_max_display) * (height - 2 y_pad)
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::StarRecord;
use crate::error::{CmdError, Result};
use crate::isochrone::{IsochroneParams, IsochronePoint};

/// Widest color or magnitude range a frame may span.
pub const MAX_DOMAIN_SPAN: f64 = 100.0;

/// Largest viewport edge in pixels.
pub const MAX_VIEWPORT_PX: f64 = 10_000.0;

/// Upper bound on ticks per axis.
const MAX_TICKS: i64 = 1_000;

/// A point in display (pixel) space, origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayPoint {
    pub x: f64,
    pub y: f64,
}

/// Data ranges shown on the plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotDomain {
    /// Color at the left edge
    pub x_min: f64,
    /// Color at the right edge
    pub x_max: f64,
    /// Magnitude at the bottom edge (faint end)
    pub y_min_display: f64,
    /// Magnitude at the top edge (bright end)
    pub y_max_display: f64,
}

impl Default for PlotDomain {
    fn default() -> Self {
        Self {
            x_min: -0.5,
            x_max: 3.0,
            y_min_display: 22.0,
            y_max_display: 10.0,
        }
    }
}

/// Display surface size and the padding reserved for axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub x_padding: f64,
    pub y_padding: f64,
}

impl Viewport {
    /// Width of the drawable area between the paddings.
    pub fn plot_width(&self) -> f64 {
        self.width - 2.0 * self.x_padding
    }

    /// Height of the drawable area between the paddings.
    pub fn plot_height(&self) -> f64 {
        self.height - 2.0 * self.y_padding
    }

    /// Inclusive bounds check against the drawable area.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_padding
            && x <= self.width - self.x_padding
            && y >= self.y_padding
            && y <= self.height - self.y_padding
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 550.0,
            x_padding: 60.0,
            y_padding: 40.0,
        }
    }
}

/// Map a `(color, mag)` value into display space.
///
/// Returns `None` when the result falls outside the padded plot area, or
/// when the domain is degenerate and no finite position exists.
/// Isochrone magnitudes must already include the distance modulus.
pub fn project(
    color: f64,
    mag: f64,
    domain: &PlotDomain,
    viewport: &Viewport,
) -> Option<DisplayPoint> {
    let x = viewport.x_padding
        + (color - domain.x_min) / (domain.x_max - domain.x_min) * viewport.plot_width();
    let y = viewport.y_padding
        + (mag - domain.y_max_display) / (domain.y_min_display - domain.y_max_display)
            * viewport.plot_height();

    if !x.is_finite() || !y.is_finite() || !viewport.contains(x, y) {
        return None;
    }
    Some(DisplayPoint { x, y })
}

/// A labelled tick on one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisTick {
    /// Data value at the tick
    pub value: f64,
    /// Display coordinate along the axis (x for color, y for magnitude)
    pub position: f64,
}

/// Domain and viewport bundled together: one shared coordinate frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotFrame {
    pub domain: PlotDomain,
    pub viewport: Viewport,
}

impl PlotFrame {
    pub fn new(domain: PlotDomain, viewport: Viewport) -> Self {
        Self { domain, viewport }
    }

    /// Reject frames that cannot be drawn.
    ///
    /// Each axis range must be finite, non-empty and within
    /// [`MAX_DOMAIN_SPAN`]; the viewport must leave room between its
    /// paddings and stay within [`MAX_VIEWPORT_PX`].
    pub fn validate(&self) -> Result<()> {
        let d = &self.domain;
        let color_span = (d.x_max - d.x_min).abs();
        let mag_span = (d.y_min_display - d.y_max_display).abs();
        for (name, span) in [("color", color_span), ("magnitude", mag_span)] {
            if !(span.is_finite() && span > 0.0 && span <= MAX_DOMAIN_SPAN) {
                return Err(CmdError::InvalidInput(format!(
                    "Invalid plot {name} range: {span} (at most {MAX_DOMAIN_SPAN})."
                )));
            }
        }

        let v = &self.viewport;
        let fits = |edge: f64| edge.is_finite() && edge <= MAX_VIEWPORT_PX;
        if !(fits(v.width) && fits(v.height) && v.plot_width() > 0.0 && v.plot_height() > 0.0)
            || v.x_padding < 0.0
            || v.y_padding < 0.0
        {
            return Err(CmdError::InvalidInput(format!(
                "Invalid plot size {}x{} with padding {}/{}.",
                v.width, v.height, v.x_padding, v.y_padding
            )));
        }
        Ok(())
    }

    pub fn project(&self, color: f64, mag: f64) -> Option<DisplayPoint> {
        project(color, mag, &self.domain, &self.viewport)
    }

    /// Store each star's display position (or `None` when off the plot).
    pub fn project_stars(&self, stars: &mut [StarRecord]) {
        for star in stars.iter_mut() {
            star.projected = self.project(star.color, star.mag);
        }
    }

    /// Store each track point's display position after the distance shift.
    pub fn project_track(&self, track: &mut [IsochronePoint], params: &IsochroneParams) {
        for point in track.iter_mut() {
            point.projected = self.project(point.color, params.shifted_mag(point));
        }
    }

    /// Split a track into polyline sub-paths of consecutive in-bounds points.
    ///
    /// An off-plot point ends the current sub-path; the next in-bounds point
    /// starts a new one, so no segment crosses an off-plot gap.
    pub fn track_subpaths(
        &self,
        track: &[IsochronePoint],
        params: &IsochroneParams,
    ) -> Vec<Vec<DisplayPoint>> {
        let mut paths = Vec::new();
        let mut current = Vec::new();

        for point in track {
            match self.project(point.color, params.shifted_mag(point)) {
                Some(p) => current.push(p),
                None => {
                    if !current.is_empty() {
                        paths.push(std::mem::take(&mut current));
                    }
                }
            }
        }
        if !current.is_empty() {
            paths.push(current);
        }

        paths
    }

    /// Color ticks every 0.5 across the domain.
    pub fn color_ticks(&self) -> Vec<AxisTick> {
        let d = &self.domain;
        let v = &self.viewport;
        let (lo, hi) = (d.x_min.min(d.x_max), d.x_min.max(d.x_max));
        let first = (lo / 0.5).ceil() as i64;
        let last = (hi / 0.5).floor() as i64;
        if !lo.is_finite() || !hi.is_finite() || last.saturating_sub(first) > MAX_TICKS {
            return Vec::new();
        }

        (first..=last)
            .map(|k| {
                let value = k as f64 * 0.5;
                let position =
                    v.x_padding + (value - d.x_min) / (d.x_max - d.x_min) * v.plot_width();
                AxisTick { value, position }
            })
            .collect()
    }

    /// Magnitude ticks at even integers across the domain.
    pub fn magnitude_ticks(&self) -> Vec<AxisTick> {
        let d = &self.domain;
        let v = &self.viewport;
        let (lo, hi) = (
            d.y_max_display.min(d.y_min_display),
            d.y_max_display.max(d.y_min_display),
        );
        if !lo.is_finite() || !hi.is_finite() {
            return Vec::new();
        }
        let (lo, hi) = (lo.ceil() as i64, hi.floor() as i64);
        if hi.saturating_sub(lo) > 2 * MAX_TICKS {
            return Vec::new();
        }

        (lo..=hi)
            .filter(|mag| mag % 2 == 0)
            .map(|mag| {
                let value = mag as f64;
                let position = v.y_padding
                    + (value - d.y_max_display) / (d.y_min_display - d.y_max_display)
                        * v.plot_height();
                AxisTick { value, position }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isochrone::AgeKey;
    use approx::assert_relative_eq;

    fn frame() -> PlotFrame {
        PlotFrame::default()
    }

    #[test]
    fn test_corners_map_to_padding() {
        let f = frame();
        let d = f.domain;

        let top_left = f.project(d.x_min, d.y_max_display).unwrap();
        assert_relative_eq!(top_left.x, 60.0, epsilon = 1e-9);
        assert_relative_eq!(top_left.y, 40.0, epsilon = 1e-9);

        let bottom_right = f.project(d.x_max, d.y_min_display).unwrap();
        assert_relative_eq!(bottom_right.x, 740.0, epsilon = 1e-9);
        assert_relative_eq!(bottom_right.y, 510.0, epsilon = 1e-9);
    }

    #[test]
    fn test_brighter_plots_higher() {
        let f = frame();
        let bright = f.project(1.0, 12.0).unwrap();
        let faint = f.project(1.0, 20.0).unwrap();
        assert!(bright.y < faint.y);
    }

    #[test]
    fn test_out_of_bounds_is_absent() {
        let f = frame();
        assert!(f.project(-1.0, 15.0).is_none());
        assert!(f.project(1.0, 23.0).is_none());
        assert!(f.project(1.0, 9.0).is_none());
    }

    #[test]
    fn test_degenerate_domain_is_absent() {
        let f = PlotFrame::new(
            PlotDomain {
                x_min: 1.0,
                x_max: 1.0,
                ..PlotDomain::default()
            },
            Viewport::default(),
        );
        assert!(f.project(1.0, 15.0).is_none());
    }

    #[test]
    fn test_project_stars_fills_positions() {
        let f = frame();
        let mut stars = vec![
            StarRecord::from_photometry(None, None, 15.0, 1.5, 0.5),
            StarRecord::from_photometry(None, None, 30.0, 1.5, 0.5),
        ];
        f.project_stars(&mut stars);

        assert!(stars[0].projected.is_some());
        assert!(stars[1].projected.is_none());
    }

    #[test]
    fn test_track_is_shifted_before_projection() {
        let f = frame();
        let params = IsochroneParams::new(AgeKey::default(), 0.019, 10.0, 0.2).unwrap();
        let mut track = vec![IsochronePoint::new(1.0, 5.0)];
        f.project_track(&mut track, &params);

        let expected = f.project(1.0, 15.0).unwrap();
        assert_eq!(track[0].projected, Some(expected));
    }

    #[test]
    fn test_subpaths_break_at_gaps() {
        let f = frame();
        let params = IsochroneParams::new(AgeKey::default(), 0.019, 0.0, 0.2).unwrap();
        let track = vec![
            IsochronePoint::new(0.0, 12.0),
            IsochronePoint::new(0.5, 13.0),
            IsochronePoint::new(5.0, 14.0), // off plot
            IsochronePoint::new(1.0, 15.0),
            IsochronePoint::new(1.5, 16.0),
            IsochronePoint::new(2.0, 17.0),
        ];

        let paths = f.track_subpaths(&track, &params);
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].len(), 2);
        assert_eq!(paths[1].len(), 3);
    }

    #[test]
    fn test_subpaths_leading_gap() {
        let f = frame();
        let params = IsochroneParams::new(AgeKey::default(), 0.019, 0.0, 0.2).unwrap();
        let track = vec![
            IsochronePoint::new(1.0, 5.0), // above the plot
            IsochronePoint::new(1.0, 12.0),
            IsochronePoint::new(1.2, 13.0),
        ];

        let paths = f.track_subpaths(&track, &params);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].len(), 2);
    }

    #[test]
    fn test_color_ticks() {
        let ticks = frame().color_ticks();
        let values: Vec<f64> = ticks.iter().map(|t| t.value).collect();
        assert_eq!(values, vec![-0.5, 0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0]);
        assert_relative_eq!(ticks[0].position, 60.0, epsilon = 1e-9);
        assert_relative_eq!(ticks[7].position, 740.0, epsilon = 1e-9);
    }

    #[test]
    fn test_magnitude_ticks() {
        let ticks = frame().magnitude_ticks();
        let values: Vec<f64> = ticks.iter().map(|t| t.value).collect();
        assert_eq!(values, vec![10.0, 12.0, 14.0, 16.0, 18.0, 20.0, 22.0]);
        assert_relative_eq!(ticks[0].position, 40.0, epsilon = 1e-9);
        assert_relative_eq!(ticks[6].position, 510.0, epsilon = 1e-9);
    }

    #[test]
    fn test_huge_domain_has_no_ticks() {
        let f = PlotFrame::new(
            PlotDomain {
                x_min: -1e300,
                x_max: 1e300,
                y_min_display: 1e300,
                y_max_display: 10.0,
            },
            Viewport::default(),
        );
        assert!(f.color_ticks().is_empty());
        assert!(f.magnitude_ticks().is_empty());
        assert!(matches!(f.validate(), Err(CmdError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_frame() {
        assert!(frame().validate().is_ok());

        let inverted = PlotFrame::new(
            PlotDomain {
                x_min: 3.0,
                x_max: -0.5,
                ..PlotDomain::default()
            },
            Viewport::default(),
        );
        assert!(inverted.validate().is_ok());

        let nan = PlotFrame::new(
            PlotDomain {
                y_min_display: f64::NAN,
                ..PlotDomain::default()
            },
            Viewport::default(),
        );
        assert!(nan.validate().is_err());

        let cramped = PlotFrame::new(
            PlotDomain::default(),
            Viewport {
                width: 100.0,
                ..Viewport::default()
            },
        );
        assert!(cramped.validate().is_err());

        let huge = PlotFrame::new(
            PlotDomain::default(),
            Viewport {
                width: 1e9,
                ..Viewport::default()
            },
        );
        assert!(huge.validate().is_err());
    }
}
