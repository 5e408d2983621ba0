use crate::tabular::reader::SourceFormat;
use crate::tabular::table::{Table, TypedValue};
use crate::utils::{sanitize_cell, Result, TranslatorError};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};

pub const FILE_ARTIFACT_STEM: &str = "translated_result";
pub const SHEET_ARTIFACT_NAME: &str = "translated_sheets_result.xlsx";
const SHEET_NAME: &str = "Sheet1";

/// CSV bytes with a UTF-8 byte-order mark so spreadsheet apps detect Korean text.
pub fn write_csv_bytes(table: &Table, sanitize: bool) -> Result<Vec<u8>> {
    let mut buffer = b"\xEF\xBB\xBF".to_vec();
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer.write_record(table.headers())?;
        for row in table.rows() {
            if sanitize {
                let sanitized: Vec<String> = row.iter().map(|s| sanitize_cell(s)).collect();
                writer.write_record(&sanitized)?;
            } else {
                writer.write_record(row)?;
            }
        }
        writer.flush()?;
    }
    Ok(buffer)
}

/// Single-sheet workbook, header in the first row.
///
/// Cells that came from a workbook as numbers, booleans or dates keep that type.
pub fn write_xlsx_bytes(table: &Table) -> Result<Vec<u8>> {
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let datetime_format = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in table.headers().iter().enumerate() {
        worksheet.write_string(0, excel_col(col)?, header)?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let excel_row = u32::try_from(row_idx + 1).map_err(|_| {
            TranslatorError::ValidationError(format!("too many rows for a worksheet: {}", row_idx))
        })?;
        for (col_idx, value) in row.iter().enumerate() {
            let col = excel_col(col_idx)?;
            match table.typed(row_idx, col_idx) {
                Some(TypedValue::Number(n)) => worksheet.write_number(excel_row, col, n)?,
                Some(TypedValue::Bool(b)) => worksheet.write_boolean(excel_row, col, b)?,
                Some(TypedValue::DateTime(serial)) => {
                    let format = if serial.fract() == 0.0 {
                        &date_format
                    } else {
                        &datetime_format
                    };
                    worksheet.write_number_with_format(excel_row, col, serial, format)?
                }
                None if value.is_empty() => continue,
                None => worksheet.write_string(excel_row, col, value)?,
            };
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn excel_col(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| {
        TranslatorError::ValidationError(format!("too many columns for a worksheet: {}", col))
    })
}

pub fn write_artifact(table: &Table, format: SourceFormat, sanitize: bool) -> Result<Vec<u8>> {
    match format {
        SourceFormat::Csv => write_csv_bytes(table, sanitize),
        SourceFormat::Xlsx => write_xlsx_bytes(table),
    }
}

pub fn file_artifact_name(format: SourceFormat) -> String {
    format!("{}.{}", FILE_ARTIFACT_STEM, format.extension())
}

pub fn save_artifact(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes)?;
    Ok(path)
}
