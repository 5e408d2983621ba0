use crate::utils::{Result, TranslatorError};

/// Extracts the spreadsheet id from a share URL (`.../spreadsheets/d/<id>/edit...`).
pub fn extract_sheet_id(url: &str) -> Result<String> {
    let rest = url
        .split_once("/d/")
        .map(|(_, rest)| rest)
        .ok_or_else(|| not_a_sheet_url(url))?;

    let id = rest
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default()
        .trim();

    if id.is_empty() {
        return Err(not_a_sheet_url(url));
    }
    Ok(id.to_string())
}

fn not_a_sheet_url(url: &str) -> TranslatorError {
    TranslatorError::SourceUnreachable(format!("not a Google Sheets URL: {}", url))
}
