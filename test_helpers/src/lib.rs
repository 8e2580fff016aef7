//! Testing infrastructure shared by the CMD workspace crates.
//!
//! Provides two things:
//!
//! - **Project paths**: locate the workspace root from any test context and
//!   hand out paths under `<root>/test_output/` for artifacts worth keeping
//!   after a run (rendered plots, exported CSV files).
//! - **Fixtures**: VOTable documents shaped like VizieR cone search replies
//!   and JSON isochrone tracks, built from plain literals so tests stay
//!   readable.
//!
//! ```text
//! test_output/
//! ├── plots/     # rendered CMD images
//! └── exports/   # CSV exports
//! ```

use once_cell::sync::Lazy;
use std::env;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Errors from test infrastructure setup.
#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    /// Workspace root could not be located from the current directory.
    #[error("Failed to find project root: {0}")]
    ProjectRootNotFound(String),
}

/// Locate the workspace root.
///
/// Walks up from the current directory until a `Cargo.toml` containing a
/// `[workspace]` section is found.
pub fn find_project_root() -> Result<PathBuf, TestHelperError> {
    let mut current_dir = env::current_dir().map_err(|e| {
        TestHelperError::ProjectRootNotFound(format!("Failed to get current directory: {}", e))
    })?;

    loop {
        let cargo_toml = current_dir.join("Cargo.toml");
        if cargo_toml.exists() {
            let content = std::fs::read_to_string(&cargo_toml).map_err(|e| {
                TestHelperError::ProjectRootNotFound(format!("Failed to read Cargo.toml: {}", e))
            })?;

            if content.contains("[workspace]") {
                return Ok(current_dir);
            }
        }

        if !current_dir.pop() {
            break;
        }
    }

    Err(TestHelperError::ProjectRootNotFound(
        "Workspace root not found".to_string(),
    ))
}

static PROJECT_ROOT: Lazy<PathBuf> =
    Lazy::new(|| find_project_root().expect("Failed to find project root directory"));

/// Test output directory (`<root>/test_output`), created on first use.
pub fn get_output_dir() -> PathBuf {
    let output_dir = PROJECT_ROOT.join("test_output");

    if !output_dir.exists() {
        std::fs::create_dir_all(&output_dir).expect("Failed to create output directory");
    }

    output_dir
}

/// Path inside the test output directory; parent directories are created.
pub fn output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    let full = get_output_dir().join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create output subdirectory");
    }
    full
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// A VizieR-style VOTable with one `<TR>` per row.
///
/// Cells are given as `[ra, dec, Gmag, BPmag, RPmag]`; an empty string
/// produces a self-closing `<TD/>` like VizieR does for null values.
pub fn votable_fixture(rows: &[[&str; 5]]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<VOTABLE version="1.3" xmlns="http://www.ivoa.net/xml/VOTable/v1.3">
<INFO name="QUERY_STATUS" value="OK"/>
<RESOURCE ID="yCat_1345" name="I/345">
<TABLE ID="I_345_gaia2" name="I/345/gaia2">
<FIELD name="RA_ICRS" ucd="pos.eq.ra;meta.main" datatype="double" unit="deg"/>
<FIELD name="DE_ICRS" ucd="pos.eq.dec;meta.main" datatype="double" unit="deg"/>
<FIELD name="Gmag" ucd="phot.mag;em.opt" datatype="double" unit="mag"/>
<FIELD name="BPmag" ucd="phot.mag;em.opt.B" datatype="double" unit="mag"/>
<FIELD name="RPmag" ucd="phot.mag;em.opt.R" datatype="double" unit="mag"/>
<DATA><TABLEDATA>
"#,
    );
    for row in rows {
        xml.push_str("<TR>");
        for cell in row {
            if cell.is_empty() {
                xml.push_str("<TD/>");
            } else {
                let _ = write!(xml, "<TD>{}</TD>", escape(cell));
            }
        }
        xml.push_str("</TR>\n");
    }
    xml.push_str("</TABLEDATA></DATA>\n</TABLE>\n</RESOURCE>\n</VOTABLE>\n");
    xml
}

/// A VOTable reporting a failed query, with no data table.
pub fn votable_error_fixture(message: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<VOTABLE version="1.3" xmlns="http://www.ivoa.net/xml/VOTable/v1.3">
<INFO name="QUERY_STATUS" value="ERROR">{}</INFO>
</VOTABLE>
"#,
        escape(message)
    )
}

/// JSON isochrone track from `(color, mag)` pairs.
pub fn isochrone_json(points: &[(f64, f64)]) -> String {
    let body: Vec<String> = points
        .iter()
        .map(|(color, mag)| format!(r#"{{"color": {color}, "mag": {mag}}}"#))
        .collect();
    format!("[{}]", body.join(", "))
}

/// Write a track file named the way the isochrone store expects
/// (`{age}_z{metallicity without dots}.json`) and return its path.
pub fn write_isochrone_fixture(
    dir: &Path,
    age_key: &str,
    metallicity: &str,
    points: &[(f64, f64)],
) -> PathBuf {
    let path = dir.join(format!("{}_z{}.json", age_key, metallicity.replace('.', "")));
    std::fs::write(&path, isochrone_json(points)).expect("Failed to write isochrone fixture");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_root_exists() {
        let root = find_project_root().expect("Failed to find project root");
        assert!(root.join("Cargo.toml").exists());
    }

    #[test]
    fn test_output_path_creates_parent() {
        let path = output_path("fixtures/probe.txt");
        assert!(path.parent().unwrap().is_dir());
        assert!(path.starts_with(get_output_dir()));
    }

    #[test]
    fn test_votable_fixture_shape() {
        let xml = votable_fixture(&[["1", "2", "", "4", "5"]]);
        assert!(xml.contains("<TR><TD>1</TD><TD>2</TD><TD/><TD>4</TD><TD>5</TD></TR>"));
        assert!(xml.contains("<TABLEDATA>"));
    }

    #[test]
    fn test_error_fixture_escapes() {
        let xml = votable_error_fixture("a < b");
        assert!(xml.contains("a &lt; b"));
    }

    #[test]
    fn test_isochrone_json() {
        assert_eq!(
            isochrone_json(&[(1.5, 5.0)]),
            r#"[{"color": 1.5, "mag": 5}]"#
        );
    }
}
