use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tabled::Tabled;

/// One row of the analyzed dataset, as the analysis service echoes it back.
///
/// Only name, temperature and pressure are interpreted. Every other column
/// (`Type`, `Flowrate`, ...) is kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EquipmentRecord {
    #[serde(rename = "Equipment Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Temperature")]
    pub temperature: f64,
    #[serde(rename = "Pressure")]
    pub pressure: f64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EquipmentRecord {
    pub fn new(name: &str, temperature: f64, pressure: f64) -> Self {
        Self {
            name: Some(name.to_string()),
            temperature,
            pressure,
            extra: Map::new(),
        }
    }

    /// Name as shown in tables; empty when the service sent none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// The `Type` column, when present and textual.
    pub fn equipment_type(&self) -> Option<&str> {
        self.extra.get("Type").and_then(Value::as_str)
    }
}

/// One upload in the service's history, most recent first.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryEntry {
    pub filename: String,
    pub date: String,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub avg_p: Option<f64>,
}

/// Immutable snapshot of one completed analysis.
///
/// The aggregates are computed upstream and are opaque here; `records` keeps
/// the service's order for the life of the session. Built by
/// [`crate::loader::parse_analysis`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub total_count: u64,
    pub avg_pressure: f64,
    pub max_temp: f64,
    pub avg_flow_rate: f64,
    pub type_distribution: BTreeMap<String, u64>,
    pub records: Vec<EquipmentRecord>,
    pub history: Vec<HistoryEntry>,
}

/// A record paired with its efficiency score. Always derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredRecord<'a> {
    pub record: &'a EquipmentRecord,
    /// Position in `AnalysisResult::records`.
    pub index: usize,
    /// `temperature / pressure` rounded to two places; non-finite when pressure is zero.
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TemperatureStatus {
    Normal,
    Critical,
}

impl TemperatureStatus {
    pub fn label(self) -> &'static str {
        match self {
            TemperatureStatus::Normal => "NORMAL",
            TemperatureStatus::Critical => "CRITICAL",
        }
    }

    pub fn is_critical(self) -> bool {
        self == TemperatureStatus::Critical
    }
}

impl fmt::Display for TemperatureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Podium marker for the first three leaderboard places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankMarker {
    First,
    Second,
    Third,
}

impl RankMarker {
    pub fn for_rank(rank: usize) -> Option<Self> {
        match rank {
            1 => Some(RankMarker::First),
            2 => Some(RankMarker::Second),
            3 => Some(RankMarker::Third),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RankMarker::First => "1st",
            RankMarker::Second => "2nd",
            RankMarker::Third => "3rd",
        }
    }

    pub fn medal(self) -> &'static str {
        match self {
            RankMarker::First => "🥇",
            RankMarker::Second => "🥈",
            RankMarker::Third => "🥉",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaderboardEntry<'a> {
    /// 1-based.
    pub rank: usize,
    pub marker: Option<RankMarker>,
    pub scored: ScoredRecord<'a>,
    pub status: TemperatureStatus,
}

/// What the chart renderer draws: labels and counts aligned by index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub categories: Vec<String>,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kpi {
    pub title: &'static str,
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct LogTableRow {
    #[serde(rename = "Name")]
    #[tabled(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    #[tabled(rename = "Type")]
    pub equipment_type: String,
    #[serde(rename = "Temperature")]
    #[tabled(rename = "Temperature")]
    pub temperature: String,
    #[serde(rename = "Pressure")]
    #[tabled(rename = "Pressure")]
    pub pressure: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: TemperatureStatus,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct LeaderboardRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Equipment")]
    #[tabled(rename = "Equipment")]
    pub name: String,
    #[serde(rename = "EfficiencyScore")]
    #[tabled(rename = "EfficiencyScore")]
    pub score: String,
    #[serde(rename = "Podium")]
    #[tabled(rename = "Podium")]
    pub podium: String,
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: TemperatureStatus,
}

#[derive(Debug, Serialize, Tabled, Clone, PartialEq)]
pub struct HistoryRow {
    #[serde(rename = "File")]
    #[tabled(rename = "File")]
    pub filename: String,
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "Units")]
    #[tabled(rename = "Units")]
    pub units: String,
    #[serde(rename = "AvgPressure")]
    #[tabled(rename = "AvgPressure")]
    pub avg_pressure: String,
}

/// JSON summary written next to an exported report.
#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub total_count: u64,
    pub avg_pressure: f64,
    pub max_temp: f64,
    pub avg_flowrate: f64,
    pub critical_units: usize,
    pub leaderboard: Vec<LeaderboardRow>,
}
