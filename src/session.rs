// Session coordinator: dataset selection, the upload lifecycle, search state
// and the views derived from whatever analysis is currently installed.
use crate::canvas::{self, Canvas};
use crate::derive;
use crate::errors::{SessionError, UploadError};
use crate::loader;
use crate::report::{self, ReportLayout, ReportPlan};
use crate::types::{
    AnalysisResult, ChartSeries, HistoryEntry, HistoryRow, Kpi, LeaderboardRow, LogTableRow,
    SummaryStats,
};
use crate::upload::{Dataset, UploadService};
use crate::util::{format_int, format_number, format_value};
use chrono::NaiveDateTime;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const UPLOAD_FAILED_NOTICE: &str = "Upload failed. Ensure the analysis server is running.";
pub const MALFORMED_NOTICE: &str = "The analysis service returned an incomplete result.";
pub const NO_FILE_NOTICE: &str = "Please select a file first.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Uploading { generation: u64, progress: u8 },
    Ready,
}

/// Handed out by [`Session::begin_upload`]; completing with a ticket from an
/// older generation is ignored.
#[derive(Debug)]
pub struct UploadTicket {
    generation: u64,
    dataset: Dataset,
}

impl UploadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}

/// Everything the dashboard shows, recomputed from the installed result and
/// the current search term on every call.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub kpis: Vec<Kpi>,
    pub chart: ChartSeries,
    pub table: Vec<LogTableRow>,
    pub leaderboard: Vec<LeaderboardRow>,
    pub history: Vec<HistoryRow>,
}

#[derive(Debug)]
pub struct Session {
    selected: Option<Dataset>,
    search_term: String,
    phase: Phase,
    result: Option<Arc<AnalysisResult>>,
    notice: Option<String>,
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            selected: None,
            search_term: String::new(),
            phase: Phase::Idle,
            result: None,
            notice: None,
            generation: 0,
        }
    }

    pub fn select_dataset(&mut self, dataset: Dataset) {
        debug!(file = %dataset.file_name, bytes = dataset.bytes.len(), "dataset selected");
        self.selected = Some(dataset);
    }

    pub fn selected(&self) -> Option<&Dataset> {
        self.selected.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn progress(&self) -> u8 {
        match self.phase {
            Phase::Uploading { progress, .. } => progress,
            Phase::Ready => 100,
            Phase::Idle => 0,
        }
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.result.as_deref()
    }

    /// Shared handle on the installed snapshot.
    pub fn snapshot(&self) -> Option<Arc<AnalysisResult>> {
        self.result.clone()
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// The term survives new uploads and is applied to whatever is installed next.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    /// "Analyze new file": drop the current result and go back to idle. An
    /// upload still in flight is superseded and its outcome discarded.
    pub fn reset(&mut self) {
        if matches!(self.phase, Phase::Uploading { .. }) {
            debug!(generation = self.generation, "in-flight upload superseded");
        }
        self.generation += 1;
        self.phase = Phase::Idle;
        self.result = None;
        self.notice = None;
    }

    /// Move to uploading. Refused while another upload is in flight so two
    /// never interleave.
    pub fn begin_upload(&mut self) -> Result<UploadTicket, SessionError> {
        if matches!(self.phase, Phase::Uploading { .. }) {
            debug!("upload request ignored, one already in flight");
            return Err(SessionError::UploadInFlight);
        }
        let Some(dataset) = self.selected.clone() else {
            self.notice = Some(NO_FILE_NOTICE.to_string());
            return Err(SessionError::NoFileSelected);
        };
        self.generation += 1;
        self.phase = Phase::Uploading {
            generation: self.generation,
            progress: 0,
        };
        self.result = None;
        self.notice = None;
        Ok(UploadTicket {
            generation: self.generation,
            dataset,
        })
    }

    /// Progress only ever moves forward and is capped at 100.
    pub fn record_progress(&mut self, generation: u64, pct: u8) {
        if let Phase::Uploading {
            generation: current,
            progress,
        } = &mut self.phase
        {
            if *current == generation {
                *progress = (*progress).max(pct.min(100));
            }
        }
    }

    /// Finish an upload. Success installs a fresh result wholesale; upload
    /// failure or a malformed payload returns to idle with a notice and
    /// installs nothing.
    pub fn complete_upload(
        &mut self,
        ticket: UploadTicket,
        outcome: Result<String, UploadError>,
    ) -> Result<&AnalysisResult, SessionError> {
        let current = matches!(
            self.phase,
            Phase::Uploading { generation, .. } if generation == ticket.generation
        );
        if !current {
            debug!(generation = ticket.generation, "stale upload outcome discarded");
            return Err(SessionError::Superseded);
        }

        let body = match outcome {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, file = %ticket.dataset.file_name, "upload failed");
                self.phase = Phase::Idle;
                self.notice = Some(UPLOAD_FAILED_NOTICE.to_string());
                return Err(e.into());
            }
        };

        match loader::parse_analysis(&body) {
            Ok(result) => {
                info!(
                    file = %ticket.dataset.file_name,
                    records = result.records.len(),
                    "analysis installed"
                );
                self.phase = Phase::Ready;
                let installed = self.result.insert(Arc::new(result));
                Ok(&**installed)
            }
            Err(e) => {
                warn!(error = %e, "rejected malformed analysis result");
                self.phase = Phase::Idle;
                self.notice = Some(MALFORMED_NOTICE.to_string());
                Err(e.into())
            }
        }
    }

    /// Run a whole upload against `service`. `on_progress` sees the same
    /// monotonic percentage the session records.
    pub fn upload(
        &mut self,
        service: &dyn UploadService,
        mut on_progress: impl FnMut(u8),
    ) -> Result<&AnalysisResult, SessionError> {
        let ticket = self.begin_upload()?;
        let generation = ticket.generation;
        let outcome = service.upload(&ticket.dataset, &mut |pct| {
            self.record_progress(generation, pct);
            on_progress(self.progress());
        });
        self.complete_upload(ticket, outcome)
    }

    pub fn view(&self) -> Option<DashboardView> {
        let result = self.analysis()?;
        let visible = derive::filter_by_name(&result.records, &self.search_term);
        let board = derive::leaderboard(&result.records);
        Some(DashboardView {
            kpis: kpis(result),
            chart: derive::chart_series(&result.type_distribution),
            table: derive::log_table(&visible),
            leaderboard: derive::leaderboard_rows(&board),
            history: result.history.iter().map(history_row).collect(),
        })
    }

    pub fn summary(&self) -> Result<SummaryStats, SessionError> {
        let result = self.analysis().ok_or(SessionError::NoAnalysis)?;
        let board = derive::leaderboard(&result.records);
        Ok(SummaryStats {
            total_count: result.total_count,
            avg_pressure: result.avg_pressure,
            max_temp: result.max_temp,
            avg_flowrate: result.avg_flow_rate,
            critical_units: derive::critical_count(&result.records),
            leaderboard: derive::leaderboard_rows(&board),
        })
    }

    /// Lay out the printable report over the full record set.
    pub fn build_report(
        &self,
        layout: &ReportLayout,
        generated_at: NaiveDateTime,
    ) -> Result<ReportPlan, SessionError> {
        let result = self.analysis().ok_or(SessionError::NoAnalysis)?;
        Ok(report::build_report(
            result,
            &result.records,
            layout,
            generated_at,
        ))
    }

    /// Build, draw and persist the report in one go. Nothing is written
    /// unless every instruction was drawn.
    pub fn export_report(
        &self,
        canvas: &mut dyn Canvas,
        layout: &ReportLayout,
        generated_at: NaiveDateTime,
    ) -> Result<PathBuf, SessionError> {
        let plan = self.build_report(layout, generated_at)?;
        canvas::execute(&plan.ops, canvas);
        let path = canvas.save(&plan.file_stem)?;
        info!(path = %path.display(), pages = plan.page_count(), "report exported");
        Ok(path)
    }
}

fn kpis(result: &AnalysisResult) -> Vec<Kpi> {
    vec![
        Kpi {
            title: "Total Units",
            value: result.total_count.to_string(),
        },
        Kpi {
            title: "Avg Pressure",
            value: format!("{} bar", format_value(result.avg_pressure)),
        },
        Kpi {
            title: "Max Temp",
            value: format!("{} °C", format_value(result.max_temp)),
        },
        Kpi {
            title: "Avg Flow",
            value: format!("{} m³/h", format_value(result.avg_flow_rate)),
        },
    ]
}

fn history_row(entry: &HistoryEntry) -> HistoryRow {
    HistoryRow {
        filename: entry.filename.clone(),
        date: entry.date.clone(),
        units: entry.count.map(format_int).unwrap_or_else(|| "-".to_string()),
        avg_pressure: entry
            .avg_p
            .map(|p| format!("{} bar", format_number(p, 2)))
            .unwrap_or_else(|| "-".to_string()),
    }
}
