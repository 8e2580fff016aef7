//! CMD rendering with plotters.
//!
//! Everything is drawn in pixel space using the positions [`PlotFrame`]
//! produces, so the picture uses exactly the geometry the projector reports.
//! Call [`Session::project`] with the same frame before rendering.

use std::path::Path;

use cmd_core::{PlotFrame, Session, StarRecord};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;

const MATCHED_COLOR: RGBColor = RGBColor(0, 128, 0);
const UNMATCHED_COLOR: RGBColor = BLUE;
const TRACK_COLOR: RGBColor = RED;
const GRID_COLOR: RGBColor = RGBColor(224, 224, 224);
const MATCHED_RADIUS: i32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum PlotError {
    #[error("Error rendering plot: {0}")]
    Render(String),
    #[error("Viewport {width}x{height} is too small to draw")]
    Size { width: f64, height: f64 },
}

fn render_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> PlotError {
    PlotError::Render(err.to_string())
}

/// Drawing switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlotOptions {
    /// Hide stars the isochrone did not match
    pub matched_only: bool,
}

fn pixel_size(frame: &PlotFrame) -> Result<(u32, u32), PlotError> {
    let v = &frame.viewport;
    if !(v.plot_width() > 0.0 && v.plot_height() > 0.0) {
        return Err(PlotError::Size {
            width: v.width,
            height: v.height,
        });
    }
    Ok((v.width.round() as u32, v.height.round() as u32))
}

/// Render to `path`: PNG when the extension is `.png`, SVG otherwise.
pub fn render_file(
    path: &Path,
    session: &Session,
    frame: &PlotFrame,
    options: PlotOptions,
) -> Result<(), PlotError> {
    let size = pixel_size(frame)?;
    let is_png = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));

    if is_png {
        let root = BitMapBackend::new(path, size).into_drawing_area();
        draw_cmd(&root, session, frame, options).map_err(render_error)?;
        root.present().map_err(render_error)?;
    } else {
        let root = SVGBackend::new(path, size).into_drawing_area();
        draw_cmd(&root, session, frame, options).map_err(render_error)?;
        root.present().map_err(render_error)?;
    }

    log::info!("Rendered CMD to {}", path.display());
    Ok(())
}

/// Render to an SVG document in memory.
pub fn render_svg(
    session: &Session,
    frame: &PlotFrame,
    options: PlotOptions,
) -> Result<String, PlotError> {
    let size = pixel_size(frame)?;
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw_cmd(&root, session, frame, options).map_err(render_error)?;
        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

fn px(value: f64) -> i32 {
    value.round() as i32
}

fn visible<'a>(
    stars: &'a [StarRecord],
    options: PlotOptions,
) -> impl Iterator<Item = &'a StarRecord> + 'a {
    stars
        .iter()
        .filter(move |star| !options.matched_only || star.matched)
}

fn draw_cmd<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    session: &Session,
    frame: &PlotFrame,
    options: PlotOptions,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;
    draw_axes(root, frame)?;

    for star in visible(session.stars(), options) {
        let Some(p) = star.projected else {
            continue;
        };
        let (x, y) = (px(p.x), px(p.y));
        if star.matched {
            root.draw(&Circle::new((x, y), MATCHED_RADIUS, MATCHED_COLOR.filled()))?;
        } else {
            root.draw(&Rectangle::new(
                [(x - 1, y - 1), (x + 2, y + 2)],
                UNMATCHED_COLOR.filled(),
            ))?;
        }
    }

    if let Some(iso) = session.isochrone() {
        for path in frame.track_subpaths(&iso.track, &iso.params) {
            let points: Vec<(i32, i32)> = path.iter().map(|p| (px(p.x), px(p.y))).collect();
            if points.len() > 1 {
                root.draw(&PathElement::new(points, TRACK_COLOR.stroke_width(2)))?;
            }
        }
    }

    Ok(())
}

fn draw_axes<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    frame: &PlotFrame,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let v = &frame.viewport;
    let left = px(v.x_padding);
    let right = px(v.width - v.x_padding);
    let top = px(v.y_padding);
    let bottom = px(v.height - v.y_padding);
    let label_font = ("sans-serif", 12).into_font().color(&BLACK);
    let title_font = ("sans-serif", 14).into_font().color(&BLACK);

    for tick in frame.color_ticks() {
        let x = px(tick.position);
        root.draw(&PathElement::new(vec![(x, top), (x, bottom)], GRID_COLOR))?;
        root.draw(&PathElement::new(vec![(x, bottom), (x, bottom + 5)], BLACK))?;
        root.draw(&Text::new(
            format!("{:.1}", tick.value),
            (x - 9, bottom + 8),
            label_font.clone(),
        ))?;
    }

    for tick in frame.magnitude_ticks() {
        let y = px(tick.position);
        root.draw(&PathElement::new(vec![(left, y), (right, y)], GRID_COLOR))?;
        root.draw(&PathElement::new(vec![(left - 5, y), (left, y)], BLACK))?;
        root.draw(&Text::new(
            format!("{}", tick.value),
            (left - 25, y - 6),
            label_font.clone(),
        ))?;
    }

    root.draw(&PathElement::new(
        vec![(left, top), (left, bottom), (right, bottom)],
        BLACK.stroke_width(1),
    ))?;

    root.draw(&Text::new(
        "BP - RP Color",
        ((left + right) / 2 - 40, bottom + 24),
        title_font.clone(),
    ))?;
    root.draw(&Text::new("G Magnitude", (4, top - 24), title_font))?;

    Ok(())
}
