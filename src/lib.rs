pub mod server;
pub mod sheets;
pub mod tabular;
pub mod translation;
pub mod utils;

pub use server::{router, ServerState};
pub use sheets::{extract_sheet_id, SheetsClient};
pub use tabular::{ColumnPlan, ColumnRef, SourceFormat, Table, WideningPolicy};
pub use translation::{
    translate_file, translate_sheet, BatchOutcome, BatchTranslator, Category, FileReport,
    GeminiClient, Level, Progress, SheetReport, TranslationConfiguration, Translator, WriteBack,
};
pub use utils::{AppConfig, Result, TranslatorError};
