pub mod batch;
pub mod client;
pub mod prompt;
pub mod rate_limit;

pub use batch::{
    BatchOutcome, BatchStatus, BatchTranslator, Progress, RowFailure, RowOutcome, ERROR_MARKER,
};
pub use client::{GeminiClient, Translator};
pub use prompt::{handoff_prompt, master_prompt, request_text, Category, Level, TranslationConfiguration};
pub use rate_limit::{ConfiguredLimiter, FixedInterval, RateLimiter, Unlimited};

use crate::sheets::{cell_updates, extract_sheet_id, SheetsClient, DATA_START_ROW};
use crate::tabular::{
    column_name, file_artifact_name, load_file, save_artifact, write_artifact, write_xlsx_bytes,
    ColumnPlan, SourceFormat, WideningPolicy, SHEET_ARTIFACT_NAME,
};
use crate::utils::Result;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Counts shared by file and sheet reports.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub status: BatchStatus,
    pub rows: usize,
    pub processed: usize,
    pub translated: usize,
    pub blank: usize,
    pub failed: usize,
    /// Letter of the column holding the translations.
    pub target_column: String,
    pub failures: Vec<RowFailure>,
}

impl RunSummary {
    fn from_outcome(outcome: &BatchOutcome) -> Self {
        Self {
            run_id: outcome.run_id,
            status: outcome.status,
            rows: outcome.progress.total,
            processed: outcome.progress.processed,
            translated: outcome.translated_count(),
            blank: outcome.blank_count(),
            failed: outcome.failed_count(),
            target_column: column_name(outcome.target_index),
            failures: outcome.failures.clone(),
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} rows processed into column {}: {} translated, {} blank, {} failed",
            self.processed, self.rows, self.target_column, self.translated, self.blank, self.failed
        )?;
        if matches!(self.status, BatchStatus::PartialBatch { .. }) {
            write!(f, " (cancelled)")?;
        }
        for failure in &self.failures {
            write!(f, "\n  {}", failure)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: SourceFormat,
    #[serde(flatten)]
    pub summary: RunSummary,
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} -> {}", self.input.display(), self.output.display())?;
        write!(f, "{}", self.summary)
    }
}

/// What happened to the remote sheet after translating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum WriteBack {
    Written { cells: usize },
    Failed(String),
    /// Loaded from the public export; nothing can be written.
    ReadOnly,
}

impl fmt::Display for WriteBack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteBack::Written { cells } => write!(f, "wrote {} cells back to the sheet", cells),
            WriteBack::Failed(message) => write!(f, "write-back failed: {}", message),
            WriteBack::ReadOnly => write!(f, "sheet is read-only; download the artifact instead"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetReport {
    pub sheet_id: String,
    pub worksheet: Option<String>,
    pub write_back: WriteBack,
    pub artifact: PathBuf,
    #[serde(flatten)]
    pub summary: RunSummary,
}

impl fmt::Display for SheetReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "sheet {} ({}): {}",
            self.sheet_id,
            self.worksheet.as_deref().unwrap_or("first worksheet"),
            self.write_back
        )?;
        writeln!(f, "artifact: {}", self.artifact.display())?;
        write!(f, "{}", self.summary)
    }
}

/// Translates one column of a local CSV or workbook and saves `translated_result.<ext>`.
pub async fn translate_file<T: Translator, L: RateLimiter>(
    batch: &BatchTranslator<T, L>,
    input: &Path,
    plan: ColumnPlan,
    output_dir: &Path,
    sanitize: bool,
) -> Result<FileReport> {
    let (table, format) = load_file(input)?;
    tracing::info!(
        input = %input.display(),
        rows = table.row_count(),
        source = %plan.source,
        target = %plan.target,
        config = %batch.config(),
        "Translating file"
    );

    let outcome = batch.run(table, plan).await?;
    let bytes = write_artifact(&outcome.table, format, sanitize)?;
    let output = save_artifact(output_dir, &file_artifact_name(format), &bytes)?;

    tracing::info!(run_id = %outcome.run_id, output = %output.display(), "Saved translated file");

    Ok(FileReport {
        input: input.to_path_buf(),
        output,
        format,
        summary: RunSummary::from_outcome(&outcome),
    })
}

/// Translates a Google Sheet, writes results back when the client holds a token, and
/// always saves `translated_sheets_result.xlsx`.
pub async fn translate_sheet<T: Translator, L: RateLimiter>(
    batch: &BatchTranslator<T, L>,
    sheets: &SheetsClient,
    url: &str,
    worksheet: Option<&str>,
    plan: ColumnPlan,
    output_dir: &Path,
) -> Result<SheetReport> {
    let sheet_id = extract_sheet_id(url)?;
    let remote = sheets.open(&sheet_id, worksheet).await?;

    // write-back is addressed by the requested letter, so the table is always padded to it
    if batch.widening() != WideningPolicy::PadToTarget {
        tracing::warn!(column = %plan.target, "Sheets are always padded to the target column");
    }
    let outcome = batch
        .run_with_widening(remote.table, plan, WideningPolicy::PadToTarget)
        .await?;

    let write_back = match remote.worksheet.as_deref() {
        Some(title) => {
            let updates = cell_updates(&outcome.translated_strings(), outcome.target_index, DATA_START_ROW);
            match sheets.write_cells(&sheet_id, title, &updates).await {
                Ok(()) => WriteBack::Written {
                    cells: updates.len(),
                },
                Err(e) if !e.is_fatal() => {
                    tracing::warn!(run_id = %outcome.run_id, error = %e, "Sheet write-back failed");
                    WriteBack::Failed(e.to_string())
                }
                Err(e) => return Err(e),
            }
        }
        None => WriteBack::ReadOnly,
    };

    let bytes = write_xlsx_bytes(&outcome.table)?;
    let artifact = save_artifact(output_dir, SHEET_ARTIFACT_NAME, &bytes)?;

    Ok(SheetReport {
        sheet_id,
        worksheet: remote.worksheet,
        write_back,
        artifact,
        summary: RunSummary::from_outcome(&outcome),
    })
}
