// Report paginator: flows an analysis result into A4 pages as a flat list of
// draw instructions. Building the plan is pure; drawing it is `canvas::execute`.
use crate::canvas::{Align, DrawOp, FontWeight, Rgb};
use crate::derive::classify;
use crate::types::{AnalysisResult, EquipmentRecord};
use crate::util::format_value;
use chrono::NaiveDateTime;
use tracing::debug;

pub const PAGE_WIDTH: f64 = 210.0;
pub const PAGE_HEIGHT: f64 = 297.0;
pub const PAGE_BOTTOM: f64 = 275.0;
pub const TOP_MARGIN: f64 = 20.0;
pub const ROW_HEIGHT: f64 = 8.0;
pub const FOOTER_Y: f64 = 288.0;

pub const REPORT_TITLE: &str = "Chemical Equipment Analysis Report";
pub const FOOTER_TEXT: &str = "Confidential Industrial Analysis Report";
pub const UNKNOWN_NAME: &str = "Unknown";
pub const FALLBACK_STEM: &str = "Unit";

const HEADER_FILL: Rgb = Rgb(26, 42, 108);
const COLUMN_HEADER_FILL: Rgb = Rgb(240, 240, 240);
const ALERT: Rgb = Rgb(200, 0, 0);
const MUTED: Rgb = Rgb(150, 150, 150);

const LEFT: f64 = 15.0;
const NAME_COLUMN: f64 = 20.0;
const STATUS_COLUMN: f64 = 140.0;
const VALUE_COLUMN: f64 = 80.0;
const HEADER_BAND_HEIGHT: f64 = 40.0;
const COLUMN_BAND_HEIGHT: f64 = 8.0;
/// Gap between the column header baseline and the first row.
const FIRST_ROW_GAP: f64 = 10.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub page_bottom: f64,
    pub top_margin: f64,
    pub row_height: f64,
    /// Draw the column header again at the top of every continuation page.
    pub repeat_table_header: bool,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            page_bottom: PAGE_BOTTOM,
            top_margin: TOP_MARGIN,
            row_height: ROW_HEIGHT,
            repeat_table_header: true,
        }
    }
}

/// Everything needed to draw and save one report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPlan {
    pub file_stem: String,
    pub ops: Vec<DrawOp>,
}

impl ReportPlan {
    pub fn page_count(&self) -> usize {
        1 + self
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::AddPage))
            .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Summary,
    TableHeader,
    RowStream,
    Footer,
    Done,
}

/// `Analysis_Report_<latest upload>`, or `Analysis_Report_Unit` with no history.
pub fn report_file_stem(result: &AnalysisResult) -> String {
    let name = result
        .history
        .first()
        .map(|h| h.filename.as_str())
        .filter(|f| !f.is_empty())
        .unwrap_or(FALLBACK_STEM);
    format!("Analysis_Report_{name}")
}

/// Lay out the report for `records` (normally the full, unfiltered set).
///
/// Taking the result by reference makes "no analysis loaded" unrepresentable
/// here; the session reports that case before calling in.
pub fn build_report(
    result: &AnalysisResult,
    records: &[EquipmentRecord],
    layout: &ReportLayout,
    generated_at: NaiveDateTime,
) -> ReportPlan {
    let mut paginator = Paginator::new(result, records, layout, generated_at);
    while paginator.section() != Section::Done {
        paginator.step();
    }
    let ops = paginator.finish();
    let plan = ReportPlan {
        file_stem: report_file_stem(result),
        ops,
    };
    debug!(
        rows = records.len(),
        pages = plan.page_count(),
        ops = plan.ops.len(),
        "report laid out"
    );
    plan
}

/// Section-by-section walk. Each [`Paginator::step`] emits one section, or a
/// single row while in [`Section::RowStream`].
pub struct Paginator<'a> {
    result: &'a AnalysisResult,
    records: &'a [EquipmentRecord],
    layout: &'a ReportLayout,
    generated_at: NaiveDateTime,
    section: Section,
    cursor: f64,
    next_row: usize,
    ops: Vec<DrawOp>,
}

impl<'a> Paginator<'a> {
    pub fn new(
        result: &'a AnalysisResult,
        records: &'a [EquipmentRecord],
        layout: &'a ReportLayout,
        generated_at: NaiveDateTime,
    ) -> Self {
        Self {
            result,
            records,
            layout,
            generated_at,
            section: Section::Header,
            cursor: 0.0,
            next_row: 0,
            ops: Vec::new(),
        }
    }

    pub fn section(&self) -> Section {
        self.section
    }

    /// Vertical offset where the next row would be drawn.
    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn step(&mut self) {
        let records = self.records;
        self.section = match self.section {
            Section::Header => {
                self.header();
                Section::Summary
            }
            Section::Summary => {
                self.summary();
                Section::TableHeader
            }
            Section::TableHeader => {
                self.table_header();
                Section::RowStream
            }
            Section::RowStream => match records.get(self.next_row) {
                Some(record) => {
                    self.row(record);
                    self.next_row += 1;
                    Section::RowStream
                }
                None => Section::Footer,
            },
            Section::Footer => {
                self.footer();
                Section::Done
            }
            Section::Done => Section::Done,
        };
    }

    pub fn finish(self) -> Vec<DrawOp> {
        self.ops
    }

    fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    fn font(&mut self, weight: FontWeight, size: f64) {
        self.push(DrawOp::SetFont { weight, size });
    }

    fn text(&mut self, text: impl Into<String>, x: f64, y: f64) {
        self.push(DrawOp::Text {
            text: text.into(),
            x,
            y,
            align: Align::Left,
        });
    }

    fn header(&mut self) {
        self.push(DrawOp::SetFillColor(HEADER_FILL));
        self.push(DrawOp::FillRect {
            x: 0.0,
            y: 0.0,
            width: PAGE_WIDTH,
            height: HEADER_BAND_HEIGHT,
        });
        self.push(DrawOp::SetTextColor(Rgb::WHITE));
        self.font(FontWeight::Normal, 22.0);
        self.text(REPORT_TITLE, LEFT, 20.0);
        self.font(FontWeight::Normal, 10.0);
        let stamp = self.generated_at.format("%d/%m/%Y, %H:%M:%S");
        self.text(format!("Generated on: {stamp}"), LEFT, 30.0);
    }

    fn summary(&mut self) {
        self.push(DrawOp::SetTextColor(Rgb::BLACK));
        self.font(FontWeight::Bold, 14.0);
        self.text("Executive Summary", LEFT, 55.0);
        self.font(FontWeight::Normal, 11.0);

        let result = self.result;
        let lines = [
            ("Total Units Analyzed:", result.total_count.to_string()),
            (
                "Average Plant Pressure:",
                format!("{} bar", format_value(result.avg_pressure)),
            ),
            (
                "Maximum Temperature:",
                format!("{} °C", format_value(result.max_temp)),
            ),
            (
                "Average Flow Rate:",
                format!("{} m³/h", format_value(result.avg_flow_rate)),
            ),
        ];
        self.cursor = 65.0;
        for (label, value) in lines {
            let y = self.cursor;
            self.text(label, LEFT, y);
            self.font(FontWeight::Bold, 11.0);
            self.text(value, VALUE_COLUMN, y);
            self.font(FontWeight::Normal, 11.0);
            self.cursor += 8.0;
        }
    }

    fn table_header(&mut self) {
        let y = self.cursor;
        self.push(DrawOp::Line {
            x1: LEFT,
            y1: y + 5.0,
            x2: PAGE_WIDTH - LEFT,
            y2: y + 5.0,
        });
        self.font(FontWeight::Bold, 14.0);
        self.text("Detailed Equipment Log", LEFT, y + 15.0);
        self.column_header(y + 25.0);
    }

    /// Grey band with the column titles, baseline at `baseline`. Leaves the
    /// cursor on the first row position and the row font selected.
    fn column_header(&mut self, baseline: f64) {
        self.push(DrawOp::SetFillColor(COLUMN_HEADER_FILL));
        self.push(DrawOp::FillRect {
            x: LEFT,
            y: baseline - 5.0,
            width: PAGE_WIDTH - 2.0 * LEFT,
            height: COLUMN_BAND_HEIGHT,
        });
        self.font(FontWeight::Bold, 10.0);
        self.text("Equipment Name", NAME_COLUMN, baseline);
        self.text("Temperature Status", STATUS_COLUMN, baseline);
        self.font(FontWeight::Normal, 10.0);
        self.cursor = baseline + FIRST_ROW_GAP;
    }

    fn row(&mut self, record: &EquipmentRecord) {
        if self.cursor + self.layout.row_height > self.layout.page_bottom {
            self.page_break();
        }
        let y = self.cursor;
        let name = record
            .name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_NAME);
        self.text(name, NAME_COLUMN, y);

        let status = classify(record.temperature);
        let label = format!("{} °C ({})", format_value(record.temperature), status.label());
        if status.is_critical() {
            self.push(DrawOp::SetTextColor(ALERT));
            self.text(label, STATUS_COLUMN, y);
            self.push(DrawOp::SetTextColor(Rgb::BLACK));
        } else {
            self.text(label, STATUS_COLUMN, y);
        }
        self.cursor += self.layout.row_height;
    }

    fn page_break(&mut self) {
        debug!(cursor = self.cursor, row = self.next_row, "page break");
        self.push(DrawOp::AddPage);
        self.cursor = self.layout.top_margin;
        if self.layout.repeat_table_header {
            self.column_header(self.layout.top_margin);
        }
    }

    fn footer(&mut self) {
        self.font(FontWeight::Normal, 8.0);
        self.push(DrawOp::SetTextColor(MUTED));
        self.push(DrawOp::Text {
            text: FOOTER_TEXT.to_string(),
            x: PAGE_WIDTH / 2.0,
            y: FOOTER_Y,
            align: Align::Center,
        });
    }
}
