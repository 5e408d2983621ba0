pub mod config;
pub mod errors;

pub use config::{
    ApiConfig, AppConfig, LoggingConfig, OutputConfig, ServerConfig, SheetsConfig,
    TranslationDefaults,
};
pub use errors::{Result, TranslatorError};

/// Characters that make a spreadsheet application evaluate a cell as a formula.
const FORMULA_PREFIXES: [char; 4] = ['=', '+', '-', '@'];

pub fn sanitize_cell(value: &str) -> String {
    if value.starts_with(FORMULA_PREFIXES) {
        format!("'{}", value)
    } else {
        value.to_string()
    }
}

/// Truncates to at most `max_chars` characters without splitting a code point.
pub fn truncate_chars(value: &str, max_chars: usize) -> &str {
    match value.char_indices().nth(max_chars) {
        Some((idx, _)) => &value[..idx],
        None => value,
    }
}
