//! Line commands of the interactive `cmd_tool shell`.

use std::path::PathBuf;

use cmd_client::CmdServices;
use cmd_core::catalog::{parse_finite, DEFAULT_RADIUS_DEG};
use cmd_core::{AgeKey, CatalogQuery, CmdError};

use crate::plot::PlotOptions;
use crate::workbench::{FinderPreview, Workbench};

pub const HELP: &str = "\
Commands:
  fetch RA DEC [RADIUS]     cone search (degrees, default radius 0.2)
  iso AGE Z DM TOL          apply isochrone, e.g. iso parsec_9.0 0.019 10 0.2
  export [PATH]             write CSV (default cmd_data.csv)
  plot PATH [matched]       render PNG/SVG, optionally matched stars only
  status                    show status, field and finder chart
  help                      this text
  quit                      leave the shell";

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    Fetch(CatalogQuery),
    Isochrone {
        age_key: AgeKey,
        metallicity: f64,
        distance_modulus: f64,
        tolerance: f64,
    },
    Export(PathBuf),
    Plot { path: PathBuf, options: PlotOptions },
    Status,
    Help,
    Quit,
}

impl ShellCommand {
    /// Parse one input line. Blank lines yield `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>, CmdError> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = words.split_first() else {
            return Ok(None);
        };

        let command = match (name, args) {
            ("fetch", [ra, dec]) => {
                Self::Fetch(CatalogQuery::parse(ra, dec, &DEFAULT_RADIUS_DEG.to_string())?)
            }
            ("fetch", [ra, dec, radius]) => Self::Fetch(CatalogQuery::parse(ra, dec, radius)?),
            ("iso", [age, z, dm, tol]) => Self::Isochrone {
                age_key: AgeKey::new(*age),
                metallicity: parse_finite(z).ok_or_else(|| {
                    CmdError::InvalidInput(format!("Invalid metallicity Z: {z}"))
                })?,
                distance_modulus: parse_finite(dm).unwrap_or(f64::NAN),
                tolerance: parse_finite(tol).unwrap_or(f64::NAN),
            },
            ("export", []) => Self::Export(PathBuf::from(cmd_core::export::DEFAULT_EXPORT_NAME)),
            ("export", [path]) => Self::Export(PathBuf::from(path)),
            ("plot", [path]) => Self::Plot {
                path: PathBuf::from(path),
                options: PlotOptions::default(),
            },
            ("plot", [path, "matched"]) => Self::Plot {
                path: PathBuf::from(path),
                options: PlotOptions { matched_only: true },
            },
            ("status", []) => Self::Status,
            ("help", []) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            _ => {
                return Err(CmdError::InvalidInput(format!(
                    "Unrecognized command '{}'. Type 'help' for usage.",
                    line.trim()
                )))
            }
        };
        Ok(Some(command))
    }
}

/// Text shown for the `status` command.
pub fn describe<S: CmdServices>(workbench: &Workbench<S>) -> String {
    let mut lines = vec![workbench.status().to_string()];
    let session = workbench.session();
    lines.push(format!(
        "{} stars, {} matched",
        session.stars().len(),
        session.matched_count()
    ));
    if let Some(params) = session.params() {
        lines.push(format!("Isochrone: {params}"));
    }
    if let Some(view) = workbench.sky_view() {
        lines.push(format!(
            "Field: RA={:.4}, Dec={:.4}, FOV={:.1}'",
            view.ra, view.dec, view.fov_arcmin
        ));
    }
    match workbench.finder() {
        Some(FinderPreview::Loaded(chart)) => {
            lines.push(format!("Finder chart (SDSS): {}", chart.finder_chart_url))
        }
        Some(FinderPreview::Failed(msg)) => lines.push(msg.clone()),
        None => {}
    }
    lines.join("\n")
}

/// Run one command. Returns false when the shell should exit.
pub async fn execute<S: CmdServices>(workbench: &mut Workbench<S>, command: ShellCommand) -> bool {
    match command {
        ShellCommand::Fetch(query) => {
            let _ = workbench.fetch_catalog(query).await;
        }
        ShellCommand::Isochrone {
            age_key,
            metallicity,
            distance_modulus,
            tolerance,
        } => {
            let _ = workbench
                .apply_isochrone(age_key, metallicity, distance_modulus, tolerance)
                .await;
        }
        ShellCommand::Export(path) => {
            let _ = workbench.export_csv(&path);
        }
        ShellCommand::Plot { path, options } => {
            if workbench.render_plot(&path, options).is_ok() {
                println!("Plot written to {}", path.display());
            }
        }
        ShellCommand::Status => {
            println!("{}", describe(workbench));
            return true;
        }
        ShellCommand::Help => {
            println!("{HELP}");
            return true;
        }
        ShellCommand::Quit => return false,
    }
    println!("{}", workbench.status());
    true
}
