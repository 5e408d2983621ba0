use crate::tabular::column::column_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a table grows when the target column lies beyond its last column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WideningPolicy {
    /// Append columns until the requested index exists.
    #[default]
    PadToTarget,
    /// Append a single column and retarget to it.
    AppendOne,
}

/// Original value of a workbook cell that is not plain text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypedValue {
    Number(f64),
    Bool(bool),
    /// Excel serial date.
    DateTime(f64),
}

/// In-memory table: a header row plus rectangular string rows.
///
/// Missing cells are stored as empty strings; every row has exactly `width()` cells.
/// Workbook sources also remember non-text cells so they are written back with their type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    #[serde(skip)]
    typed: BTreeMap<(usize, usize), TypedValue>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut table = Self {
            headers,
            rows,
            typed: BTreeMap::new(),
        };
        table.normalize();
        table
    }

    /// Builds a table with generated `Column_<name>` headers.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self::new(Vec::new(), rows)
    }

    fn normalize(&mut self) {
        let width = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.headers.len()))
            .max()
            .unwrap_or(0);

        while self.headers.len() < width {
            let name = widened_column_name(self.headers.len());
            self.headers.push(name);
        }
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Overwrites a cell with text, dropping any typed value it had.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if let Some(cells) = self.rows.get_mut(row) {
            if cells.len() <= col {
                cells.resize(col + 1, String::new());
            }
            cells[col] = value.into();
            self.typed.remove(&(row, col));
        }
    }

    pub fn typed(&self, row: usize, col: usize) -> Option<TypedValue> {
        self.typed.get(&(row, col)).copied()
    }

    pub fn set_typed(&mut self, row: usize, col: usize, value: TypedValue) {
        if row < self.rows.len() && col < self.width() {
            self.typed.insert((row, col), value);
        }
    }

    pub fn column(&self, col: usize) -> Vec<&str> {
        (0..self.rows.len()).map(|row| self.cell(row, col)).collect()
    }

    pub fn push_column(&mut self, header: impl Into<String>) -> usize {
        self.headers.push(header.into());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Makes sure `target` is writable and returns the index translations go to.
    ///
    /// A column previously added under the same generated name is reused, so repeated
    /// runs over an already widened table do not keep growing it.
    pub fn ensure_target_column(&mut self, target: usize, policy: WideningPolicy) -> usize {
        if target < self.width() {
            return target;
        }

        match policy {
            WideningPolicy::PadToTarget => {
                while self.width() <= target {
                    let name = widened_column_name(self.width());
                    self.push_column(name);
                }
                target
            }
            WideningPolicy::AppendOne => {
                let name = widened_column_name(target);
                match self.headers.iter().position(|h| *h == name) {
                    Some(existing) => existing,
                    None => self.push_column(name),
                }
            }
        }
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<String>>) {
        (self.headers, self.rows)
    }
}

pub fn widened_column_name(index: usize) -> String {
    format!("Column_{}", column_name(index))
}
