use httpmock::prelude::*;
use sheet_translator::tabular::{read_csv_bytes, read_workbook_bytes, SHEET_ARTIFACT_NAME};
use sheet_translator::translation::{
    translate_file, translate_sheet, BatchStatus, BatchTranslator, Category, Level,
    TranslationConfiguration, Translator, WriteBack,
};
use sheet_translator::utils::SheetsConfig;
use sheet_translator::{ColumnPlan, Result, SheetsClient, TranslatorError, WideningPolicy};
use std::time::Duration;

fn fake_korean(text: &str, _config: &TranslationConfiguration) -> Result<String> {
    if text.contains("quota") {
        return Ok("Error: quota exhausted".to_string());
    }
    if text.contains("boom") {
        return Err(TranslatorError::ApiError("connection reset".to_string()));
    }
    Ok(format!("KO:{}", text))
}

fn batch() -> BatchTranslator<impl Translator> {
    BatchTranslator::new(
        fake_korean,
        TranslationConfiguration::new(Category::Travel, Level::Intermediate),
    )
}

fn sheets_client(server: &MockServer, token: Option<&str>) -> SheetsClient {
    let config = SheetsConfig {
        api_base: server.base_url(),
        export_base: server.base_url(),
        ..SheetsConfig::default()
    };
    SheetsClient::new(&config, token.map(str::to_string), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn csv_file_is_translated_into_a_padded_column() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("lessons.csv");
    std::fs::write(&input, "id,en\n1,Hello\n2,\n3,over quota\n4,boom\n").unwrap();

    let out_dir = dir.path().join("out");
    let report = translate_file(&batch(), &input, ColumnPlan::parse("B", "C").unwrap(), &out_dir, false)
        .await
        .unwrap();

    assert_eq!(report.output, out_dir.join("translated_result.csv"));
    assert_eq!(report.summary.rows, 4);
    assert_eq!(report.summary.translated, 1);
    assert_eq!(report.summary.blank, 1);
    assert_eq!(report.summary.failed, 2);
    assert_eq!(report.summary.target_column, "C");
    assert_eq!(report.summary.status, BatchStatus::PartialSuccess { failed: 2 });
    assert_eq!(report.summary.failures[0].row_index, 2);
    assert_eq!(report.summary.failures[0].source_excerpt, "over quota");

    let written = read_csv_bytes(&std::fs::read(&report.output).unwrap()).unwrap();
    assert_eq!(written.headers(), &["id", "en", "Column_C"]);
    assert_eq!(
        written.column(2),
        vec!["KO:Hello", "", "Error: quota exhausted", "Error: API error: connection reset"]
    );
    assert_eq!(written.column(0), vec!["1", "2", "3", "4"]);
}

#[tokio::test]
async fn missing_file_is_reported_before_any_translation() {
    let dir = tempfile::tempdir().unwrap();
    let err = translate_file(
        &batch(),
        &dir.path().join("nope.csv"),
        ColumnPlan::parse("A", "B").unwrap(),
        dir.path(),
        false,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, TranslatorError::FileNotFound(_)));
    assert!(!dir.path().join("translated_result.csv").exists());
}

#[tokio::test]
async fn out_of_range_source_column_aborts_file_run() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("narrow.csv");
    std::fs::write(&input, "en\nHello\n").unwrap();

    let err = translate_file(&batch(), &input, ColumnPlan::parse("D", "E").unwrap(), dir.path(), false)
        .await
        .unwrap_err();

    assert!(matches!(err, TranslatorError::ColumnOutOfRange { width: 1, .. }));
}

#[tokio::test]
async fn public_sheet_is_read_only_but_still_saved() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/spreadsheets/d/pub1/export");
            then.status(200)
                .header("content-type", "text/csv")
                .body("a,b,c,d,e\n1,2,3,Good morning,\n");
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let report = translate_sheet(
        &batch(),
        &sheets_client(&server, None),
        "https://docs.google.com/spreadsheets/d/pub1/edit#gid=0",
        None,
        ColumnPlan::parse("D", "E").unwrap(),
        dir.path(),
    )
    .await
    .unwrap();

    assert_eq!(report.sheet_id, "pub1");
    assert_eq!(report.write_back, WriteBack::ReadOnly);
    assert_eq!(report.artifact, dir.path().join(SHEET_ARTIFACT_NAME));

    let saved = read_workbook_bytes(std::fs::read(&report.artifact).unwrap(), None).unwrap();
    assert_eq!(saved.cell(0, 4), "KO:Good morning");
}

#[tokio::test]
async fn authenticated_sheet_gets_results_written_back() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v4/spreadsheets/sheet9/values/'Week1'");
            then.status(200).json_body(serde_json::json!({
                "values": [["id", "en", "ko"], ["1", "Thanks"], ["2", ""], ["3", "See you"]]
            }));
        })
        .await;
    let write = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v4/spreadsheets/sheet9/values:batchUpdate")
                .json_body(serde_json::json!({
                    "valueInputOption": "RAW",
                    "data": [
                        {"range": "'Week1'!C2", "values": [["KO:Thanks"]]},
                        {"range": "'Week1'!C3", "values": [[""]]},
                        {"range": "'Week1'!C4", "values": [["KO:See you"]]}
                    ]
                }));
            then.status(200).json_body(serde_json::json!({"totalUpdatedCells": 3}));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let report = translate_sheet(
        &batch(),
        &sheets_client(&server, Some("tok")),
        "https://docs.google.com/spreadsheets/d/sheet9/edit",
        Some("Week1"),
        ColumnPlan::parse("B", "C").unwrap(),
        dir.path(),
    )
    .await
    .unwrap();

    write.assert_hits_async(1).await;
    assert_eq!(report.write_back, WriteBack::Written { cells: 3 });
    assert_eq!(report.worksheet.as_deref(), Some("Week1"));
    assert_eq!(report.summary.status, BatchStatus::Success);
}

#[tokio::test]
async fn sheet_write_back_lands_in_the_requested_column() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v4/spreadsheets/narrow/values/'S'");
            then.status(200).json_body(serde_json::json!({
                "values": [["id", "en"], ["1", "Hello"]]
            }));
        })
        .await;
    let requested = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v4/spreadsheets/narrow/values:batchUpdate")
                .json_body(serde_json::json!({
                    "valueInputOption": "RAW",
                    "data": [{"range": "'S'!E2", "values": [["KO:Hello"]]}]
                }));
            then.status(200).json_body(serde_json::json!({"totalUpdatedCells": 1}));
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let batch = batch().with_widening(WideningPolicy::AppendOne);
    let report = translate_sheet(
        &batch,
        &sheets_client(&server, Some("tok")),
        "https://docs.google.com/spreadsheets/d/narrow/edit",
        Some("S"),
        ColumnPlan::parse("B", "E").unwrap(),
        dir.path(),
    )
    .await
    .unwrap();

    requested.assert_hits_async(1).await;
    assert_eq!(report.write_back, WriteBack::Written { cells: 1 });
    assert_eq!(report.summary.target_column, "E");

    let saved = read_workbook_bytes(std::fs::read(&report.artifact).unwrap(), None).unwrap();
    assert_eq!(saved.width(), 5);
    assert_eq!(saved.cell(0, 4), "KO:Hello");
}

#[tokio::test]
async fn failed_write_back_keeps_the_artifact() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/v4/spreadsheets/sheet9/values/'Sheet1'");
            then.status(200).json_body(serde_json::json!({
                "values": [["en", "ko"], ["Hi"]]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v4/spreadsheets/sheet9/values:batchUpdate");
            then.status(403).body("PERMISSION_DENIED");
        })
        .await;

    let dir = tempfile::tempdir().unwrap();
    let report = translate_sheet(
        &batch(),
        &sheets_client(&server, Some("tok")),
        "https://docs.google.com/spreadsheets/d/sheet9/",
        Some("Sheet1"),
        ColumnPlan::parse("A", "B").unwrap(),
        dir.path(),
    )
    .await
    .unwrap();

    assert!(matches!(report.write_back, WriteBack::Failed(ref m) if m.contains("403")));
    assert!(report.artifact.exists());
}

#[tokio::test]
async fn bad_sheet_url_is_source_unreachable() {
    let server = MockServer::start_async().await;
    let dir = tempfile::tempdir().unwrap();
    let err = translate_sheet(
        &batch(),
        &sheets_client(&server, None),
        "https://example.com/not-a-sheet",
        None,
        ColumnPlan::parse("D", "E").unwrap(),
        dir.path(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, TranslatorError::SourceUnreachable(_)));
}
