#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use equipment_report::canvas::{Align, Canvas, FontWeight, Rgb};
use equipment_report::errors::{ReportError, UploadError};
use equipment_report::upload::{Dataset, UploadService};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;

pub fn generated_at() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_hms_opt(14, 5, 9)
        .unwrap()
}

pub fn record(name: &str, temperature: f64, pressure: f64, kind: &str) -> Value {
    json!({
        "Equipment Name": name,
        "Type": kind,
        "Flowrate": 100.0,
        "Pressure": pressure,
        "Temperature": temperature
    })
}

pub fn payload(records: Vec<Value>, history: Value) -> Value {
    json!({
        "total_count": records.len(),
        "avg_pressure": 4.5,
        "max_temp": 120,
        "avg_flowrate": 100.0,
        "type_distribution": {"Pump": 2, "Valve": 1},
        "raw_data": records,
        "history": history
    })
}

/// The three-unit plant used across the scenarios.
pub fn plant_payload() -> Value {
    payload(
        vec![
            record("A", 120.0, 4.0, "Pump"),
            record("B", 50.0, 5.0, "Valve"),
            record("C", 80.0, 0.0, "Pump"),
        ],
        json!([
            {"filename": "plant.csv", "date": "19/10/2026, 14:05", "count": 3, "avg_p": 3.0},
            {"filename": "older.csv", "date": "18/10/2026, 09:00"}
        ]),
    )
}

/// Replies with a canned body after reporting the given progress steps.
pub struct FakeService {
    pub reply: RefCell<Option<Result<String, UploadError>>>,
    pub steps: Vec<u8>,
    pub calls: Cell<usize>,
}

impl FakeService {
    pub fn ok(body: Value) -> Self {
        Self::with(Ok(body.to_string()))
    }

    pub fn raw(body: &str) -> Self {
        Self::with(Ok(body.to_string()))
    }

    pub fn failing(status: u16) -> Self {
        Self::with(Err(UploadError::Status(status)))
    }

    fn with(reply: Result<String, UploadError>) -> Self {
        Self {
            reply: RefCell::new(Some(reply)),
            steps: vec![10, 40, 40, 30, 100],
            calls: Cell::new(0),
        }
    }
}

impl UploadService for FakeService {
    fn upload(
        &self,
        _dataset: &Dataset,
        progress: &mut dyn FnMut(u8),
    ) -> Result<String, UploadError> {
        self.calls.set(self.calls.get() + 1);
        for step in &self.steps {
            progress(*step);
        }
        self.reply
            .borrow_mut()
            .take()
            .unwrap_or(Err(UploadError::Interrupted))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Fill(Rgb),
    Rect,
    TextColor(Rgb),
    Font(FontWeight, f64),
    Text(String, f64, f64, Align),
    Line,
    AddPage,
    Save(String),
}

/// Records every call; `fail_save` simulates storage failure.
#[derive(Default)]
pub struct RecordingCanvas {
    pub calls: Vec<Call>,
    pub fail_save: bool,
    pub saved: Option<String>,
}

impl Canvas for RecordingCanvas {
    fn set_fill_color(&mut self, color: Rgb) {
        self.calls.push(Call::Fill(color));
    }

    fn fill_rect(&mut self, _x: f64, _y: f64, _width: f64, _height: f64) {
        self.calls.push(Call::Rect);
    }

    fn set_text_color(&mut self, color: Rgb) {
        self.calls.push(Call::TextColor(color));
    }

    fn set_font(&mut self, weight: FontWeight, size: f64) {
        self.calls.push(Call::Font(weight, size));
    }

    fn text(&mut self, text: &str, x: f64, y: f64, align: Align) {
        self.calls.push(Call::Text(text.to_string(), x, y, align));
    }

    fn line(&mut self, _x1: f64, _y1: f64, _x2: f64, _y2: f64) {
        self.calls.push(Call::Line);
    }

    fn add_page(&mut self) {
        self.calls.push(Call::AddPage);
    }

    fn save(&mut self, file_stem: &str) -> Result<PathBuf, ReportError> {
        self.calls.push(Call::Save(file_stem.to_string()));
        if self.fail_save {
            return Err(ReportError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )));
        }
        self.saved = Some(file_stem.to_string());
        Ok(PathBuf::from(format!("{file_stem}.html")))
    }
}

impl RecordingCanvas {
    pub fn texts(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Text(t, ..) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }
}
