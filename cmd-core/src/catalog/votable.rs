//! Minimal streaming VOTable reader.
//!
//! Only the pieces the catalog pipeline needs are extracted: the cell text of
//! every `<TR>` in the first `<TABLEDATA>` block, and the text of an
//! `<INFO name="QUERY_STATUS" value="ERROR">` element if the service reported
//! a query failure. Column metadata (`<FIELD>`) is ignored; the catalog query
//! fixes the column order.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::RawRow;
use crate::error::{CmdError, Result};

/// Rows and status extracted from a VOTable document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoTable {
    /// Cell text of each data row, in document order.
    pub rows: Vec<RawRow>,
    /// Whether a `<TABLEDATA>` element was present at all.
    pub has_table_data: bool,
    /// Message of an `INFO QUERY_STATUS=ERROR` element, if any.
    pub error_status: Option<String>,
}

/// Parse VOTable text.
///
/// Self-closing `<TD/>` cells become empty strings so column positions are
/// preserved. Only the first `<TABLEDATA>` block contributes rows.
pub fn parse(text: &str) -> Result<VoTable> {
    let mut reader = Reader::from_str(text);
    let mut table = VoTable::default();

    let mut in_table_data = false;
    let mut table_data_done = false;
    let mut row: Option<RawRow> = None;
    let mut cell: Option<String> = None;
    let mut info: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"TABLEDATA" if !table_data_done => {
                    in_table_data = true;
                    table.has_table_data = true;
                }
                b"TR" if in_table_data => row = Some(Vec::new()),
                b"TD" if row.is_some() => cell = Some(String::new()),
                b"INFO" if is_error_status(&e)? => info = Some(String::new()),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"TABLEDATA" if !table_data_done => {
                    table.has_table_data = true;
                    table_data_done = true;
                }
                b"TD" => {
                    if let Some(r) = row.as_mut() {
                        r.push(String::new());
                    }
                }
                b"INFO" if is_error_status(&e)? => {
                    table.error_status.get_or_insert_with(String::new);
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(malformed)?;
                if let Some(c) = cell.as_mut() {
                    c.push_str(&text);
                } else if let Some(i) = info.as_mut() {
                    i.push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                if let Some(c) = cell.as_mut() {
                    c.push_str(&text);
                } else if let Some(i) = info.as_mut() {
                    i.push_str(&text);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"TD" => {
                    if let (Some(r), Some(c)) = (row.as_mut(), cell.take()) {
                        r.push(c);
                    }
                }
                b"TR" => {
                    if let Some(r) = row.take() {
                        table.rows.push(r);
                    }
                }
                b"TABLEDATA" if in_table_data => {
                    in_table_data = false;
                    table_data_done = true;
                }
                b"INFO" => {
                    if let Some(i) = info.take() {
                        if table.error_status.is_none() {
                            table.error_status = Some(i.trim().to_string());
                        }
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(malformed(e)),
            _ => {}
        }
    }

    log::debug!(
        "VOTable parsed: {} rows, tabledata={}, error_status={:?}",
        table.rows.len(),
        table.has_table_data,
        table.error_status
    );

    Ok(table)
}

fn is_error_status(e: &BytesStart) -> Result<bool> {
    let mut name_ok = false;
    let mut value_ok = false;
    for attr in e.attributes() {
        let attr = attr.map_err(|err| malformed(err.to_string()))?;
        let value = attr.unescape_value().map_err(malformed)?;
        match attr.key.local_name().as_ref() {
            b"name" => name_ok = value == "QUERY_STATUS",
            b"value" => value_ok = value == "ERROR",
            _ => {}
        }
    }
    Ok(name_ok && value_ok)
}

fn malformed(err: impl ToString) -> CmdError {
    CmdError::ParseFailure(format!("Malformed VOTable: {}", err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_helpers::votable_fixture;

    #[test]
    fn test_rows_in_document_order() {
        let xml = votable_fixture(&[
            ["10.0", "20.0", "15.0", "16.2", "14.1"],
            ["11.0", "21.0", "12.5", "13.0", "12.0"],
        ]);
        let table = parse(&xml).unwrap();

        assert!(table.has_table_data);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][2], "15.0");
        assert_eq!(table.rows[1][0], "11.0");
        assert!(table.error_status.is_none());
    }

    #[test]
    fn test_empty_cells_keep_positions() {
        let xml = r#"<VOTABLE><RESOURCE><TABLE><DATA><TABLEDATA>
            <TR><TD>1.0</TD><TD/><TD>15.0</TD><TD></TD><TD>14.1</TD></TR>
        </TABLEDATA></DATA></TABLE></RESOURCE></VOTABLE>"#;
        let table = parse(xml).unwrap();

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0], vec!["1.0", "", "15.0", "", "14.1"]);
    }

    #[test]
    fn test_query_status_error_extracted() {
        let xml = r#"<VOTABLE>
            <INFO name="QUERY_STATUS" value="ERROR">  Illegal target position  </INFO>
        </VOTABLE>"#;
        let table = parse(xml).unwrap();

        assert!(!table.has_table_data);
        assert_eq!(table.error_status.as_deref(), Some("Illegal target position"));
    }

    #[test]
    fn test_query_status_ok_ignored() {
        let xml = r#"<VOTABLE><INFO name="QUERY_STATUS" value="OK"/>
            <RESOURCE><TABLE><DATA><TABLEDATA/></DATA></TABLE></RESOURCE></VOTABLE>"#;
        let table = parse(xml).unwrap();

        assert!(table.has_table_data);
        assert!(table.rows.is_empty());
        assert!(table.error_status.is_none());
    }

    #[test]
    fn test_only_first_tabledata_used() {
        let xml = r#"<VOTABLE>
            <TABLEDATA><TR><TD>a</TD></TR></TABLEDATA>
            <TABLEDATA><TR><TD>b</TD></TR></TABLEDATA>
        </VOTABLE>"#;
        let table = parse(xml).unwrap();

        assert_eq!(table.rows, vec![vec!["a".to_string()]]);
    }

    #[test]
    fn test_mismatched_tags_are_parse_failures() {
        let err = parse("<VOTABLE><TABLEDATA></VOTABLE>").unwrap_err();
        assert!(matches!(err, CmdError::ParseFailure(_)));
    }
}
