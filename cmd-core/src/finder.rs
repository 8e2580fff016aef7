//! Finder chart and sky view geometry for a catalog field.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogQuery;

/// Smallest pixel scale requested from the cutout service (arcsec/pixel).
pub const MIN_SCALE_ARCSEC: f64 = 0.2;
/// Largest pixel scale requested from the cutout service (arcsec/pixel).
pub const MAX_SCALE_ARCSEC: f64 = 10.0;
/// Default preview size in pixels.
pub const PREVIEW_SIZE_PX: u32 = 250;

/// Parameters of a finder chart cutout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinderRequest {
    pub ra: f64,
    pub dec: f64,
    /// Pixel scale in arcsec/pixel, within `[0.2, 10]`
    pub scale: f64,
    pub width: u32,
    pub height: u32,
}

impl FinderRequest {
    /// Cutout covering the search cone: the diameter spans the image width,
    /// clamped so tiny or huge radii still give a usable picture.
    pub fn for_field(ra: f64, dec: f64, radius_deg: f64, width: u32, height: u32) -> Self {
        let radius_arcsec = radius_deg * 3600.0;
        let scale = (radius_arcsec * 2.0 / width.max(1) as f64)
            .max(MIN_SCALE_ARCSEC)
            .min(MAX_SCALE_ARCSEC);
        Self {
            ra,
            dec,
            scale,
            width,
            height,
        }
    }

    /// Default-size preview for a catalog query.
    pub fn for_query(query: &CatalogQuery) -> Self {
        Self::for_field(
            query.ra,
            query.dec,
            query.radius,
            PREVIEW_SIZE_PX,
            PREVIEW_SIZE_PX,
        )
    }
}

/// Finder chart reply: an image URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinderChart {
    pub finder_chart_url: String,
}

/// Pointing handed to the external sky viewer after a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyView {
    pub ra: f64,
    pub dec: f64,
    /// Field of view in arcminutes
    pub fov_arcmin: f64,
}

impl SkyView {
    pub fn for_query(query: &CatalogQuery) -> Self {
        Self {
            ra: query.ra,
            dec: query.dec,
            fov_arcmin: query.radius * 60.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_scale_for_default_field() {
        let req = FinderRequest::for_field(250.423, 36.46, 0.2, 250, 250);
        // 0.2 deg = 720 arcsec radius, 1440 arcsec across 250 px
        assert_relative_eq!(req.scale, 5.76, epsilon = 1e-9);
    }

    #[test]
    fn test_scale_is_clamped() {
        assert_relative_eq!(FinderRequest::for_field(0.0, 0.0, 0.001, 250, 250).scale, 0.2);
        assert_relative_eq!(FinderRequest::for_field(0.0, 0.0, 5.0, 250, 250).scale, 10.0);
    }

    #[test]
    fn test_sky_view_fov() {
        let query = CatalogQuery::new(10.0, 20.0, 0.2).unwrap();
        let view = SkyView::for_query(&query);
        assert_relative_eq!(view.fov_arcmin, 12.0, epsilon = 1e-9);
    }
}
