use std::io::{Read, Write};

use thermogrid_core::{ChartSlot, Config, Document, parse_column_arg};
use thermogrid_engine::Value;
use thermogrid_engine::plot::Selection;

fn write_csv(dir: &std::path::Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("readings.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
fn import_edit_export_docx() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(
        dir.path(),
        "day,thermocouple2_middle,thermocouple3_top\n1,40,35\n,38,41\n",
    );

    let mut doc = Document::new(Config::default()).unwrap();
    doc.import_file(&csv).unwrap();
    assert_eq!(doc.dataset().row_count(), 2);
    // first column is filled down
    assert_eq!(doc.dataset().cell(1, "day"), Some(&Value::Number(1.0)));

    let diff = parse_column_arg(
        "diff Difference =ABS({thermocouple2_middle} - {thermocouple3_top})",
    )
    .unwrap();
    doc.add_column(diff).unwrap();
    assert_eq!(doc.dataset().cell(0, "diff"), Some(&Value::Number(5.0)));
    assert_eq!(doc.dataset().cell(1, "diff"), Some(&Value::Number(3.0)));

    doc.set_cell_from_input(1, "thermocouple3_top", "30").unwrap();
    assert_eq!(doc.dataset().cell(1, "diff"), Some(&Value::Number(8.0)));
    assert!(doc.modified);

    doc.set_selection(ChartSlot::First, Selection::parse_list("diff"))
        .unwrap();
    let out = dir.path().join("report.docx");
    doc.export_docx(&out).unwrap();
    assert!(!doc.modified);

    let mut archive = zip::ZipArchive::new(std::fs::File::open(&out).unwrap()).unwrap();
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .unwrap()
        .read_to_string(&mut xml)
        .unwrap();
    assert!(xml.contains("Temperature Monitoring"));
    assert!(xml.contains("Difference"));
    assert!(archive.by_name("word/media/chart1.png").is_ok());
}

#[test]
fn undo_restores_import_state() {
    let dir = tempfile::tempdir().unwrap();
    let csv = write_csv(dir.path(), "quantity,price\n2,3\n");
    let mut doc = Document::new(Config::default()).unwrap();
    doc.import_file(&csv).unwrap();
    assert_eq!(doc.dataset().cell(0, "total"), Some(&Value::Number(6.0)));

    doc.set_cell_from_input(0, "quantity", "4").unwrap();
    assert_eq!(doc.dataset().cell(0, "total"), Some(&Value::Number(12.0)));
    doc.undo().unwrap();
    assert_eq!(doc.dataset().cell(0, "total"), Some(&Value::Number(6.0)));
    assert!(doc.undo().is_err());
}
