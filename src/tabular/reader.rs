use crate::tabular::table::{Table, TypedValue};
use crate::utils::{Result, TranslatorError};
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Csv,
    Xlsx,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(SourceFormat::Xlsx),
            _ => Err(TranslatorError::SourceUnreachable(format!(
                "unsupported file type: {} (expected .csv or .xlsx)",
                path.display()
            ))),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Xlsx => "xlsx",
        }
    }
}

/// Reads CSV with the first record as the header row.
pub fn read_csv<R: Read>(reader: R) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::new(headers, rows))
}

pub fn read_csv_bytes(bytes: &[u8]) -> Result<Table> {
    read_csv(bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes))
}

/// Reads one worksheet of a workbook; `None` selects the first sheet.
pub fn read_workbook_bytes(bytes: Vec<u8>, worksheet: Option<&str>) -> Result<Table> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let sheet_names = workbook.sheet_names().to_vec();

    let sheet_name = match worksheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| {
                TranslatorError::SourceUnreachable(format!("worksheet not found: {}", name))
            })?,
        None => sheet_names.first().cloned().ok_or_else(|| {
            TranslatorError::SourceUnreachable("workbook contains no sheets".to_string())
        })?,
    };

    let range = workbook.worksheet_range(&sheet_name)?;
    Ok(table_from_range(&range))
}

fn table_from_range(range: &Range<Data>) -> Table {
    // calamine ranges start at the first used cell; keep A1 addressing aligned with the sheet
    let (row_offset, col_offset) = range
        .start()
        .map(|(r, c)| (r as usize, c as usize))
        .unwrap_or((0, 0));

    let mut grid: Vec<Vec<String>> = vec![Vec::new(); row_offset];
    let mut typed = Vec::new();
    for (i, row) in range.rows().enumerate() {
        // sheet row 0 is the header
        let data_row = (row_offset + i).checked_sub(1);
        let mut cells = vec![String::new(); col_offset];
        for (j, cell) in row.iter().enumerate() {
            if let (Some(row), Some(value)) = (data_row, typed_value(cell)) {
                typed.push((row, col_offset + j, value));
            }
            cells.push(cell_to_string(cell));
        }
        grid.push(cells);
    }

    let mut table = table_from_values(grid);
    for (row, col, value) in typed {
        table.set_typed(row, col, value);
    }
    table
}

fn typed_value(cell: &Data) -> Option<TypedValue> {
    match cell {
        Data::Float(n) => Some(TypedValue::Number(*n)),
        Data::Int(n) => Some(TypedValue::Number(*n as f64)),
        Data::Bool(b) => Some(TypedValue::Bool(*b)),
        Data::DateTime(dt) => Some(TypedValue::DateTime(dt.as_f64())),
        _ => None,
    }
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                n.to_string()
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(true) => "TRUE".to_string(),
        Data::Bool(false) => "FALSE".to_string(),
        Data::Error(e) => format!("#{:?}", e),
        Data::DateTime(dt) => dt.as_f64().to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}

/// Values as returned by a spreadsheet API: first row is the header.
pub fn table_from_values(mut values: Vec<Vec<String>>) -> Table {
    if values.is_empty() {
        return Table::default();
    }
    let headers = values.remove(0);
    Table::new(headers, values)
}

/// Loads a local CSV or workbook file.
pub fn load_file(path: &Path) -> Result<(Table, SourceFormat)> {
    if !path.exists() {
        return Err(TranslatorError::FileNotFound(path.display().to_string()));
    }
    let format = SourceFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;

    let table = match format {
        SourceFormat::Csv => read_csv_bytes(&bytes),
        SourceFormat::Xlsx => read_workbook_bytes(bytes, None),
    }
    .map_err(|e| TranslatorError::SourceUnreachable(format!("{}: {}", path.display(), e)))?;

    Ok((table, format))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{Format, Workbook};
    use std::io::Write;

    #[test]
    fn csv_header_and_bom_handling() {
        let table = read_csv_bytes(b"\xEF\xBB\xBFid,english\n1,Hello\n2,\n3,World\n").unwrap();
        assert_eq!(table.headers(), &["id".to_string(), "english".to_string()][..]);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column(1), vec!["Hello", "", "World"]);
    }

    #[test]
    fn quoted_multiline_cells_survive() {
        let table = read_csv_bytes(b"en\n\"Line one\nline two, still one cell\"\n").unwrap();
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.cell(0, 0), "Line one\nline two, still one cell");
    }

    #[test]
    fn values_without_rows() {
        assert_eq!(table_from_values(Vec::new()).width(), 0);
        let table = table_from_values(vec![vec!["a".into(), "b".into()]]);
        assert_eq!(table.width(), 2);
        assert!(table.is_empty());
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(
            SourceFormat::from_path(Path::new("data/Lessons.CSV")).unwrap(),
            SourceFormat::Csv
        );
        assert_eq!(
            SourceFormat::from_path(Path::new("lessons.xlsx")).unwrap(),
            SourceFormat::Xlsx
        );
        assert!(matches!(
            SourceFormat::from_path(Path::new("lessons.txt")),
            Err(TranslatorError::SourceUnreachable(_))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = load_file(Path::new("/no/such/dir/input.csv")).unwrap_err();
        assert!(matches!(err, TranslatorError::FileNotFound(_)));
    }

    #[test]
    fn unsupported_extension_is_source_unreachable() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"en\nHello\n").unwrap();

        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err, TranslatorError::SourceUnreachable(_)));
    }

    #[test]
    fn blank_leading_rows_and_columns_keep_sheet_coordinates() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(1, 1, "Hello").unwrap();
        sheet.write_number(2, 2, 7.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = read_workbook_bytes(bytes, None).unwrap();
        assert_eq!(table.headers(), &["Column_A", "Column_B", "Column_C"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(0, 1), "Hello");
        assert_eq!(table.cell(1, 2), "7");
        assert_eq!(table.typed(1, 2), Some(TypedValue::Number(7.0)));
        assert_eq!(table.typed(0, 1), None);
    }

    #[test]
    fn workbook_cells_keep_their_types() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        let date = Format::new().set_num_format("yyyy-mm-dd");
        sheet.write_string(0, 0, "id").unwrap();
        sheet.write_string(0, 1, "done").unwrap();
        sheet.write_string(0, 2, "due").unwrap();
        sheet.write_number(1, 0, 42.0).unwrap();
        sheet.write_boolean(1, 1, true).unwrap();
        sheet.write_number_with_format(1, 2, 45366.0, &date).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let table = read_workbook_bytes(bytes, None).unwrap();
        assert_eq!(table.typed(0, 0), Some(TypedValue::Number(42.0)));
        assert_eq!(table.typed(0, 1), Some(TypedValue::Bool(true)));
        assert_eq!(table.typed(0, 2), Some(TypedValue::DateTime(45366.0)));
    }

    #[test]
    fn garbage_workbook_is_source_unreachable() {
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        file.write_all(b"definitely not a zip archive").unwrap();

        let err = load_file(file.path()).unwrap_err();
        assert!(matches!(err, TranslatorError::SourceUnreachable(_)));
    }
}
