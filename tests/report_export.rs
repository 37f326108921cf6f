mod common;

use common::{generated_at, payload, plant_payload, record, Call, FakeService, RecordingCanvas};
use equipment_report::canvas::{Align, HtmlCanvas, Rgb};
use equipment_report::errors::SessionError;
use equipment_report::report::{ReportLayout, FOOTER_TEXT, PAGE_HEIGHT, PAGE_WIDTH};
use equipment_report::session::Session;
use equipment_report::upload::Dataset;
use serde_json::{json, Value};
use std::fs;
use tempfile::tempdir;

fn ready_session(body: Value) -> Session {
    let mut session = Session::new();
    session.select_dataset(Dataset::new("plant.csv", b"x".to_vec()));
    session.upload(&FakeService::ok(body), |_| {}).unwrap();
    session
}

#[test]
fn report_without_analysis_is_a_precondition_error() {
    let session = Session::new();
    let mut canvas = RecordingCanvas::default();
    let err = session
        .export_report(&mut canvas, &ReportLayout::default(), generated_at())
        .unwrap_err();
    assert!(matches!(err, SessionError::NoAnalysis));
    assert!(canvas.calls.is_empty());
}

#[test]
fn plant_report_draws_rows_in_order_and_saves_once() {
    let session = ready_session(plant_payload());
    let mut canvas = RecordingCanvas::default();
    let path = session
        .export_report(&mut canvas, &ReportLayout::default(), generated_at())
        .unwrap();
    assert_eq!(path.to_str(), Some("Analysis_Report_plant.csv.html"));

    let texts = canvas.texts();
    assert_eq!(texts[1], "Generated on: 19/10/2026, 14:05:09");
    let rows: Vec<&str> = texts
        .iter()
        .copied()
        .filter(|t| t.contains("°C ("))
        .collect();
    assert_eq!(
        rows,
        vec!["120 °C (CRITICAL)", "50 °C (NORMAL)", "80 °C (NORMAL)"]
    );

    let saves: Vec<&Call> = canvas
        .calls
        .iter()
        .filter(|c| matches!(c, Call::Save(_)))
        .collect();
    assert_eq!(saves.len(), 1);
    assert_eq!(canvas.calls.last(), Some(&Call::Save("Analysis_Report_plant.csv".into())));

    match canvas.calls[canvas.calls.len() - 2].clone() {
        Call::Text(text, x, y, align) => {
            assert_eq!(text, FOOTER_TEXT);
            assert_eq!(x, PAGE_WIDTH / 2.0);
            assert_eq!(y, 288.0);
            assert_eq!(align, Align::Center);
        }
        other => panic!("expected footer text, got {other:?}"),
    }
}

#[test]
fn report_ignores_search_filter() {
    let mut session = ready_session(plant_payload());
    session.set_search_term("nothing-matches");
    let mut canvas = RecordingCanvas::default();
    session
        .export_report(&mut canvas, &ReportLayout::default(), generated_at())
        .unwrap();
    let rows = canvas.texts().iter().filter(|t| t.contains("°C (")).count();
    assert_eq!(rows, 3);
}

#[test]
fn critical_color_never_bleeds_into_next_row() {
    let records: Vec<Value> = (0..50)
        .map(|i| {
            let temp = if i % 3 == 0 { 130.0 } else { 90.0 };
            record(&format!("R{i}"), temp, 4.0, "Pump")
        })
        .collect();
    let session = ready_session(payload(records, json!([])));
    let mut canvas = RecordingCanvas::default();
    session
        .export_report(&mut canvas, &ReportLayout::default(), generated_at())
        .unwrap();

    let alert = Rgb(200, 0, 0);
    let mut color = Rgb::BLACK;
    let mut pages = 1;
    for call in &canvas.calls {
        match call {
            Call::TextColor(c) => color = *c,
            Call::AddPage => pages += 1,
            Call::Text(text, ..) if text.ends_with("(NORMAL)") => assert_eq!(color, Rgb::BLACK),
            Call::Text(text, ..) if text.ends_with("(CRITICAL)") => assert_eq!(color, alert),
            Call::Text(text, ..) if text.starts_with('R') => assert_eq!(color, Rgb::BLACK),
            _ => {}
        }
    }
    assert!(pages >= 2);
}

#[test]
fn empty_record_set_produces_frame_only() {
    let session = ready_session(payload(vec![], json!([])));
    let mut canvas = RecordingCanvas::default();
    session
        .export_report(&mut canvas, &ReportLayout::default(), generated_at())
        .unwrap();
    let texts = canvas.texts();
    assert!(texts.contains(&"Executive Summary"));
    assert!(texts.contains(&"Detailed Equipment Log"));
    assert!(texts.contains(&"Temperature Status"));
    assert_eq!(*texts.last().unwrap(), FOOTER_TEXT);
    assert!(!texts.iter().any(|t| t.contains("°C (")));
    assert_eq!(canvas.saved.as_deref(), Some("Analysis_Report_Unit"));
}

#[test]
fn storage_failure_surfaces_as_report_error() {
    let session = ready_session(plant_payload());
    let mut canvas = RecordingCanvas {
        fail_save: true,
        ..RecordingCanvas::default()
    };
    let err = session
        .export_report(&mut canvas, &ReportLayout::default(), generated_at())
        .unwrap_err();
    assert!(matches!(err, SessionError::Report(_)));
    assert!(canvas.saved.is_none());
}

#[test]
fn html_report_lands_in_output_dir() {
    let dir = tempdir().unwrap();

    let records: Vec<Value> = (0..45)
        .map(|i| record(&format!("Unit-{i}"), 100.0 + i as f64, 2.0, "Pump"))
        .collect();
    let session = ready_session(payload(
        records,
        json!([{"filename": "line-3.csv", "date": "19/10/2026, 14:05"}]),
    ));
    let mut canvas = HtmlCanvas::new(dir.path(), PAGE_WIDTH, PAGE_HEIGHT);
    let path = session
        .export_report(&mut canvas, &ReportLayout::default(), generated_at())
        .unwrap();

    assert_eq!(path, dir.path().join("Analysis_Report_line-3.csv.html"));
    let html = fs::read_to_string(&path).unwrap();
    assert_eq!(html.matches("<svg class=\"page\"").count(), canvas.page_count());
    assert!(canvas.page_count() >= 2);
    assert!(html.contains("Unit-44"));
    assert!(html.contains("(CRITICAL)"));
}
