//! Google Sheets as a remote source and write-back sink.

pub mod client;
pub mod url;

pub use client::{a1_cell, cell_updates, CellUpdate, RemoteSheet, SheetsClient, DATA_START_ROW};
pub use url::extract_sheet_id;
