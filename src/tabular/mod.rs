pub mod column;
pub mod reader;
pub mod table;
pub mod writer;

pub use column::{column_name, resolve, ColumnPlan, ColumnRef};
pub use reader::{load_file, read_csv_bytes, read_workbook_bytes, table_from_values, SourceFormat};
pub use table::{Table, TypedValue, WideningPolicy};
pub use writer::{
    file_artifact_name, save_artifact, write_artifact, write_csv_bytes, write_xlsx_bytes,
    SHEET_ARTIFACT_NAME,
};
