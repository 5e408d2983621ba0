//! Row-by-row batch translation of one table column into another.
//!
//! Rows are processed strictly in order, one translation call at a time. A failing row is
//! recorded in place (`Error: ...`) and never stops the batch; only structural problems
//! (an out-of-range source column) abort a run. Progress is pushed to an optional channel
//! after every row, and a [`CancellationToken`] is checked at each row boundary.

use crate::tabular::{column_name, ColumnPlan, Table, WideningPolicy};
use crate::translation::client::Translator;
use crate::translation::prompt::TranslationConfiguration;
use crate::translation::rate_limit::{RateLimiter, Unlimited};
use crate::utils::{truncate_chars, Result, TranslatorError};
use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Prefix marking a translation result as failed.
pub const ERROR_MARKER: &str = "Error:";

const EXCERPT_CHARS: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowOutcome {
    Translated { text: String },
    Blank,
    Failed { message: String },
}

impl RowOutcome {
    /// Classifies a translator result. Text carrying the error marker counts as a failure.
    pub fn from_translation(result: Result<String>) -> Self {
        match result {
            Ok(text) => match text.strip_prefix(ERROR_MARKER) {
                Some(message) => RowOutcome::Failed {
                    message: message.trim().to_string(),
                },
                None => RowOutcome::Translated { text },
            },
            Err(e) => RowOutcome::Failed {
                message: e.to_string(),
            },
        }
    }

    /// The value written into the target cell.
    pub fn cell_value(&self) -> String {
        match self {
            RowOutcome::Translated { text } => text.clone(),
            RowOutcome::Blank => String::new(),
            RowOutcome::Failed { message } => format!("{} {}", ERROR_MARKER, message),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, RowOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
    pub description: String,
}

impl Progress {
    fn start(total: usize) -> Self {
        Self {
            processed: 0,
            total,
            description: format!("Starting {} rows", total),
        }
    }

    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f32 / self.total as f32
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

/// A failed row, with enough context to fix it by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub row_index: usize,
    pub source_excerpt: String,
    pub message: String,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}: \"{}\": {}",
            self.row_index + 1,
            self.source_excerpt,
            self.message
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchStatus {
    Success,
    PartialSuccess { failed: usize },
    /// Cancelled at a row boundary; the table holds the rows finished so far.
    PartialBatch { processed: usize, failed: usize },
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub run_id: Uuid,
    pub table: Table,
    /// Column the translations were written to, after any widening.
    pub target_index: usize,
    pub results: Vec<RowOutcome>,
    pub failures: Vec<RowFailure>,
    pub progress: Progress,
    pub status: BatchStatus,
}

impl BatchOutcome {
    /// Cell values in row order, as written to a remote sheet.
    pub fn translated_strings(&self) -> Vec<String> {
        self.results.iter().map(RowOutcome::cell_value).collect()
    }

    pub fn translated_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r, RowOutcome::Translated { .. }))
            .count()
    }

    pub fn blank_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r, RowOutcome::Blank))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.status, BatchStatus::PartialBatch { .. })
    }

    pub fn summary(&self) -> String {
        let mut summary = format!(
            "{}/{} rows processed: {} translated, {} blank, {} failed",
            self.progress.processed,
            self.progress.total,
            self.translated_count(),
            self.blank_count(),
            self.failed_count()
        );
        if self.is_cancelled() {
            summary.push_str(" (cancelled)");
        }
        summary
    }
}

pub struct BatchTranslator<T, L = Unlimited> {
    translator: T,
    limiter: L,
    config: TranslationConfiguration,
    widening: WideningPolicy,
    progress: Option<mpsc::UnboundedSender<Progress>>,
    cancel: CancellationToken,
}

impl<T: Translator> BatchTranslator<T, Unlimited> {
    pub fn new(translator: T, config: TranslationConfiguration) -> Self {
        Self {
            translator,
            limiter: Unlimited,
            config,
            widening: WideningPolicy::default(),
            progress: None,
            cancel: CancellationToken::new(),
        }
    }
}

impl<T: Translator, L: RateLimiter> BatchTranslator<T, L> {
    pub fn with_rate_limiter<M: RateLimiter>(self, limiter: M) -> BatchTranslator<T, M> {
        BatchTranslator {
            translator: self.translator,
            limiter,
            config: self.config,
            widening: self.widening,
            progress: self.progress,
            cancel: self.cancel,
        }
    }

    pub fn with_widening(mut self, widening: WideningPolicy) -> Self {
        self.widening = widening;
        self
    }

    pub fn with_progress(mut self, tx: mpsc::UnboundedSender<Progress>) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &TranslationConfiguration {
        &self.config
    }

    pub fn widening(&self) -> WideningPolicy {
        self.widening
    }

    /// Translates a single sentence outside of any table.
    pub async fn translate_text(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(TranslatorError::ValidationError(
                "nothing to translate".to_string(),
            ));
        }
        self.translator.translate(text, &self.config).await
    }

    pub async fn run(&self, table: Table, plan: ColumnPlan) -> Result<BatchOutcome> {
        self.run_with_widening(table, plan, self.widening).await
    }

    /// Same as [`run`](Self::run) with an explicit widening policy for this table.
    pub async fn run_with_widening(
        &self,
        mut table: Table,
        plan: ColumnPlan,
        widening: WideningPolicy,
    ) -> Result<BatchOutcome> {
        let run_id = Uuid::new_v4();
        let source = plan.source.index();
        let width = table.width();

        if source >= width {
            return Err(TranslatorError::ColumnOutOfRange {
                column: plan.source.to_string(),
                width,
            });
        }

        let target = table.ensure_target_column(plan.target.index(), widening);
        if target != plan.target.index() || width != table.width() {
            debug!(%run_id, width_before = width, width_after = table.width(), "Widened table");
        }

        let total = table.row_count();
        info!(
            %run_id,
            rows = total,
            source = %plan.source,
            target = %column_name(target),
            config = %self.config,
            "Starting batch translation"
        );

        let mut progress = Progress::start(total);
        self.report(&progress);

        let mut results = Vec::with_capacity(total);
        let mut failures = Vec::new();
        let mut cancelled = false;

        for row in 0..total {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                _ = self.limiter.before_each_row() => {}
            }

            let source_text = table.cell(row, source).to_string();
            let outcome = if source_text.trim().is_empty() {
                RowOutcome::Blank
            } else {
                RowOutcome::from_translation(
                    self.translator.translate(&source_text, &self.config).await,
                )
            };

            if let RowOutcome::Failed { message } = &outcome {
                let failure = RowFailure {
                    row_index: row,
                    source_excerpt: truncate_chars(&source_text, EXCERPT_CHARS).to_string(),
                    message: message.clone(),
                };
                warn!(%run_id, row = row + 1, error = %message, "Row translation failed");
                failures.push(failure);
            }

            let value = outcome.cell_value();
            progress.processed = row + 1;
            progress.description = format!(
                "Processing row {}/{}: {}... → {}...",
                row + 1,
                total,
                truncate_chars(&source_text, EXCERPT_CHARS),
                truncate_chars(&value, EXCERPT_CHARS)
            );
            debug!(%run_id, row = row + 1, "{}", progress.description);

            table.set_cell(row, target, value);
            results.push(outcome);
            self.report(&progress);
        }

        let failed = failures.len();
        let status = if cancelled {
            BatchStatus::PartialBatch {
                processed: results.len(),
                failed,
            }
        } else if failed > 0 {
            BatchStatus::PartialSuccess { failed }
        } else {
            BatchStatus::Success
        };

        let outcome = BatchOutcome {
            run_id,
            table,
            target_index: target,
            results,
            failures,
            progress,
            status,
        };

        if cancelled {
            warn!(%run_id, summary = %outcome.summary(), "Batch translation cancelled");
        } else {
            info!(%run_id, summary = %outcome.summary(), "Batch translation finished");
        }

        Ok(outcome)
    }

    fn report(&self, progress: &Progress) {
        if let Some(tx) = &self.progress {
            let _ = tx.send(progress.clone());
        }
    }
}
