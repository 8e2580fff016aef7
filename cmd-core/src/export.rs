//! CSV export of star records and their match status.
//!
//! Columns: `RA_ICRS,DE_ICRS,Gmag,BPmag,RPmag,BP_RP,Matched_Isochrone`.
//! Positions use 6 decimals, magnitudes and color 4. Missing or non-finite
//! values are written as empty fields.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::catalog::StarRecord;
use crate::error::Result;

/// Header row of the export format.
pub const CSV_HEADER: [&str; 7] = [
    "RA_ICRS",
    "DE_ICRS",
    "Gmag",
    "BPmag",
    "RPmag",
    "BP_RP",
    "Matched_Isochrone",
];

/// Default file name offered for exports.
pub const DEFAULT_EXPORT_NAME: &str = "cmd_data.csv";

fn fixed(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.decimals$}"),
        _ => String::new(),
    }
}

/// Export fields of one star, in header order.
pub fn csv_fields(star: &StarRecord) -> [String; 7] {
    [
        fixed(star.ra, 6),
        fixed(star.dec, 6),
        fixed(Some(star.g_mag), 4),
        fixed(Some(star.bp_mag), 4),
        fixed(Some(star.rp_mag), 4),
        fixed(Some(star.color), 4),
        if star.matched { "Yes" } else { "No" }.to_string(),
    ]
}

/// Write the header and one row per star to `writer`.
pub fn write_csv<W: Write>(stars: &[StarRecord], writer: W) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    csv.write_record(CSV_HEADER)?;
    for star in stars {
        csv.write_record(csv_fields(star))?;
    }
    csv.flush()?;
    Ok(())
}

/// Render the export as a string.
pub fn to_csv_string(stars: &[StarRecord]) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(stars, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write the export to `path`, creating or truncating the file.
pub fn save_csv(stars: &[StarRecord], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_csv(stars, BufWriter::new(file))?;
    log::info!("Exported {} stars to {}", stars.len(), path.display());
    Ok(())
}
