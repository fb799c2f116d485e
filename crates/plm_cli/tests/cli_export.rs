mod common;

use common::{FixtureServer, stderr, stdout, temp_path};

#[test]
fn export_xlsx_writes_filtered_tasks() {
    let server = FixtureServer::start();
    let path = temp_path("auftragsliste.xlsx");

    let output = server.run(&["export", "xlsx", "--output", path.to_str().unwrap()]);

    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Exported 3 tasks"));
    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn export_pdf_with_summary_respects_filters() {
    let server = FixtureServer::start();
    let path = temp_path("auftragsliste.pdf");

    let output = server.run(&[
        "export",
        "pdf",
        "--summary",
        "--year",
        "2024",
        "--output",
        path.to_str().unwrap(),
        "--json",
    ]);

    assert!(output.status.success(), "{}", stderr(&output));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["tasks"], 1);
    let bytes = std::fs::read(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn export_xlsx_rejects_summary_flag() {
    let server = FixtureServer::start();
    let path = temp_path("rejected.xlsx");

    let output = server.run(&[
        "export",
        "xlsx",
        "--summary",
        "--output",
        path.to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("ERROR: invalid_input"));
    assert!(!path.exists());
}
