//! Tabular ingest (CSV and spreadsheet workbooks).
//!
//! This module turns a vendor export into a `Table` of trimmed string cells.
//!
//! Design goals:
//! - **Hard stop** on a missing/unreadable file (exit code 2)
//! - **Row-level tolerance** (undecodable bytes are replaced and recorded, never dropped)
//! - **No typing**: every cell stays a string; checks coerce on demand

use std::fs::File;
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use tracing::{debug, warn};

use crate::domain::{RowError, Table, normalize_header};
use crate::error::AppError;

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Load a CSV or workbook file (decided by extension).
pub fn load_table(path: &Path) -> Result<Table, AppError> {
    if !path.is_file() {
        return Err(AppError::input(format!(
            "Input file not found: '{}'",
            path.display()
        )));
    }

    let table = if is_workbook(path) {
        load_workbook(path)?
    } else {
        load_csv(path)?
    };

    debug!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.len(),
        row_errors = table.row_errors.len(),
        "loaded table"
    );
    for err in &table.row_errors {
        warn!(line = err.line, "{}", err.message);
    }
    Ok(table)
}

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| WORKBOOK_EXTENSIONS.iter().any(|w| e.eq_ignore_ascii_case(w)))
        .unwrap_or(false)
}

fn load_csv(path: &Path) -> Result<Table, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader
        .byte_headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers from '{}': {e}", path.display())))?
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect();

    if headers.iter().all(|h| normalize_header(h).is_empty()) {
        return Err(AppError::input(format!("No data found in '{}'", path.display())));
    }

    // Every record is kept so row indices line up with the file; bytes that
    // are not UTF-8 become U+FFFD and the line is reported.
    let mut rows = Vec::new();
    let mut row_errors = Vec::new();
    for (idx, result) in reader.byte_records().enumerate() {
        let record = result.map_err(|e| {
            AppError::input(format!("Failed to read '{}' near line {}: {e}", path.display(), idx + 2))
        })?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);

        let mut lossy = false;
        let row: Vec<String> = record
            .iter()
            .map(|field| match std::str::from_utf8(field) {
                Ok(text) => text.to_string(),
                Err(_) => {
                    lossy = true;
                    String::from_utf8_lossy(field).into_owned()
                }
            })
            .collect();
        if lossy {
            row_errors.push(RowError {
                line,
                message: format!("row {}: invalid UTF-8 replaced with U+FFFD", rows.len()),
            });
        }
        rows.push(row);
    }

    let mut table = build_table(path, headers, rows);
    table.row_errors = row_errors;
    Ok(table)
}

fn load_workbook(path: &Path) -> Result<Table, AppError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::input(format!("Failed to open workbook '{}': {e}", path.display())))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::input(format!("Workbook '{}' has no sheets", path.display())))?
        .map_err(|e| AppError::input(format!("Failed to read first sheet of '{}': {e}", path.display())))?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = match sheet_rows.next() {
        Some(row) => row.iter().map(cell_text).collect(),
        None => return Err(AppError::input(format!("No data found in '{}'", path.display()))),
    };

    let rows = sheet_rows
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(build_table(path, headers, rows))
}

/// Drop blank / `Unnamed: N` header columns and build the table.
fn build_table(path: &Path, headers: Vec<String>, rows: Vec<Vec<String>>) -> Table {
    let keep: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| {
            let name = normalize_header(h);
            !name.is_empty() && !name.starts_with("unnamed")
        })
        .map(|(idx, _)| idx)
        .collect();

    if keep.len() == headers.len() {
        let headers = headers.iter().map(|h| clean_header(h)).collect();
        return Table::new(path, headers, rows);
    }

    debug!(dropped = headers.len() - keep.len(), "dropping unnamed columns");
    let kept_headers = keep.iter().map(|&i| clean_header(&headers[i])).collect();
    let kept_rows = rows
        .into_iter()
        .map(|row| {
            keep.iter()
                .map(|&i| row.get(i).cloned().unwrap_or_default())
                .collect()
        })
        .collect();
    Table::new(path, kept_headers, kept_rows)
}

fn clean_header(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').trim().to_string()
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        // Workbooks store integral numbers as floats; render `2.0` as `2`.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string().trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp(name: &str, contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_csv_with_bom_and_trims_cells() {
        let (_dir, path) = write_tmp(
            "cisco.csv",
            "\u{feff}option_part_no , ranks\n UCS-MR-X8G1RS-H , 1\nUCSX-MRX96G2RF3,2\n",
        );
        let table = load_table(&path).unwrap();
        assert_eq!(table.headers, vec!["option_part_no", "ranks"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "option_part_no"), "UCS-MR-X8G1RS-H");
        assert_eq!(table.cell(1, "ranks"), "2");
    }

    #[test]
    fn drops_unnamed_columns() {
        let (_dir, path) = write_tmp("hpe.csv", ",store,Unnamed: 3,category\n0,hpe,,memory\n");
        let table = load_table(&path).unwrap();
        assert_eq!(table.headers, vec!["store", "category"]);
        assert_eq!(table.rows[0], vec!["hpe", "memory"]);
    }

    #[test]
    fn missing_file_is_an_input_error() {
        let err = load_table(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().contains("not found"));
    }

    #[test]
    fn empty_file_is_an_input_error() {
        let (_dir, path) = write_tmp("empty.csv", "");
        let err = load_table(&path).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
    }

    #[test]
    fn undecodable_bytes_keep_the_row_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cisco.csv");
        std::fs::write(
            &path,
            b"option_part_no,ranks,rank_width,dimm_ranks\nUCS-A,1,4,1Rx4\nUCS-\xAE,2,8,1Rx4\nUCS-C,1,4,1Rx4\n",
        )
        .unwrap();

        let table = load_table(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.cell(1, "option_part_no"), "UCS-\u{fffd}");
        assert_eq!(table.cell(1, "ranks"), "2");
        assert_eq!(table.cell(2, "option_part_no"), "UCS-C");
        assert_eq!(table.row_errors.len(), 1);
        assert_eq!(table.row_errors[0].line, 3);
        assert!(table.row_errors[0].message.contains("U+FFFD"));
    }

    /// Minimal xlsx package: one sheet of inline strings and numbers.
    fn write_xlsx(path: &Path, sheet_rows: &str) {
        use zip::write::SimpleFileOptions;

        let parts = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#
                    .to_string(),
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#
                    .to_string(),
            ),
            (
                "xl/workbook.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#
                    .to_string(),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#
                    .to_string(),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{sheet_rows}</sheetData></worksheet>"#
                ),
            ),
        ];

        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, body) in parts {
            zip.start_file(name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn text_cell(cell_ref: &str, text: &str) -> String {
        format!(r#"<c r="{cell_ref}" t="inlineStr"><is><t>{text}</t></is></c>"#)
    }

    #[test]
    fn loads_first_sheet_of_a_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("06052025_cisco_db_import.xlsx");
        let rows = format!(
            r#"<row r="1">{}{}</row><row r="2">{}<c r="B2"><v>7</v></c>{}</row><row r="3">{}<c r="C3"><v>2</v></c></row>"#,
            text_cell("A1", "option_part_no"),
            text_cell("C1", " ranks "),
            text_cell("A2", " UCS-MR-X8G1RS-H "),
            text_cell("C2", "1"),
            text_cell("A3", "UCSX-MRX96G2RF3"),
        );
        write_xlsx(&path, &rows);

        let table = load_table(&path).unwrap();
        assert_eq!(table.headers, vec!["option_part_no", "ranks"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "option_part_no"), "UCS-MR-X8G1RS-H");
        assert_eq!(table.cell(0, "ranks"), "1");
        assert_eq!(table.cell(1, "option_part_no"), "UCSX-MRX96G2RF3");
        assert_eq!(table.cell(1, "ranks"), "2");
        assert!(table.row_errors.is_empty());
    }

    #[test]
    fn empty_or_corrupt_workbooks_are_input_errors() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.xlsx");
        write_xlsx(&empty, "");
        let err = load_table(&empty).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().starts_with("No data found"));

        let corrupt = dir.path().join("corrupt.xlsx");
        std::fs::write(&corrupt, "option_part_no\nUCS-A\n").unwrap();
        let err = load_table(&corrupt).unwrap_err();
        assert_eq!(err.exit_code(), crate::error::EXIT_INPUT);
        assert!(err.message().starts_with("Failed to open workbook"));
    }

    #[test]
    fn workbook_detection_by_extension() {
        assert!(is_workbook(Path::new("06052025_cisco_db_import.XLSX")));
        assert!(is_workbook(Path::new("a.ods")));
        assert!(!is_workbook(Path::new("a.csv")));
        assert!(!is_workbook(Path::new("noext")));
    }

    #[test]
    fn workbook_cells_render_as_plain_text() {
        assert_eq!(cell_text(&Data::Float(2.0)), "2");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::String(" 1Rx4 ".to_string())), "1Rx4");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
