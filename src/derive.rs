// Pure projections of an analysis result: scores, leaderboard, search filter,
// temperature classification and chart/table rows. Nothing here mutates the
// records it is given.
use crate::types::{
    ChartSeries, EquipmentRecord, LeaderboardEntry, LeaderboardRow, LogTableRow, RankMarker,
    ScoredRecord, TemperatureStatus,
};
use crate::util::{format_score, format_value, round_half_up};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// Above this temperature (°C, strictly greater) a unit is CRITICAL.
pub const CRITICAL_TEMPERATURE: f64 = 115.0;
pub const LEADERBOARD_SIZE: usize = 5;
const SCORE_DECIMALS: u32 = 2;

pub fn classify(temperature: f64) -> TemperatureStatus {
    if temperature > CRITICAL_TEMPERATURE {
        TemperatureStatus::Critical
    } else {
        TemperatureStatus::Normal
    }
}

/// `temperature / pressure` rounded half-up to two places. Lower is better.
///
/// Zero pressure yields a non-finite value (infinity, or NaN for 0/0); it is
/// returned as-is and ranked last by [`leaderboard`].
pub fn efficiency_score(record: &EquipmentRecord) -> f64 {
    round_half_up(record.temperature / record.pressure, SCORE_DECIMALS)
}

pub fn score_records(records: &[EquipmentRecord]) -> Vec<ScoredRecord<'_>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| ScoredRecord {
            record,
            index,
            score: efficiency_score(record),
        })
        .collect()
}

/// Ascending by score with every non-finite score after every finite one.
fn compare_scores(a: f64, b: f64) -> Ordering {
    match (a.is_finite(), b.is_finite()) {
        (true, true) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => Ordering::Equal,
    }
}

/// Top [`LEADERBOARD_SIZE`] records by ascending efficiency score.
///
/// Equal scores keep their original order. Zero-pressure records are not
/// dropped; they sink to the bottom.
pub fn leaderboard(records: &[EquipmentRecord]) -> Vec<LeaderboardEntry<'_>> {
    let mut scored = score_records(records);
    scored.sort_by(|a, b| compare_scores(a.score, b.score).then(a.index.cmp(&b.index)));
    let entries: Vec<LeaderboardEntry<'_>> = scored
        .into_iter()
        .take(LEADERBOARD_SIZE)
        .enumerate()
        .map(|(i, scored)| {
            let rank = i + 1;
            LeaderboardEntry {
                rank,
                marker: RankMarker::for_rank(rank),
                status: classify(scored.record.temperature),
                scored,
            }
        })
        .collect();
    debug!(
        candidates = records.len(),
        ranked = entries.len(),
        "leaderboard derived"
    );
    entries
}

/// Case-insensitive substring match on the equipment name.
/// An empty term keeps every record, in order.
pub fn filter_by_name<'a>(records: &'a [EquipmentRecord], term: &str) -> Vec<&'a EquipmentRecord> {
    if term.is_empty() {
        return records.iter().collect();
    }
    let needle = term.to_lowercase();
    records
        .iter()
        .filter(|r| r.display_name().to_lowercase().contains(&needle))
        .collect()
}

/// Category labels and counts for the chart renderer, largest first; equal
/// counts fall back to the category name so the order is stable.
pub fn chart_series(distribution: &BTreeMap<String, u64>) -> ChartSeries {
    let mut pairs: Vec<(&String, u64)> = distribution.iter().map(|(k, v)| (k, *v)).collect();
    pairs.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ChartSeries {
        categories: pairs.iter().map(|(k, _)| (*k).clone()).collect(),
        counts: pairs.iter().map(|(_, v)| *v).collect(),
    }
}

pub fn log_table(records: &[&EquipmentRecord]) -> Vec<LogTableRow> {
    records
        .iter()
        .map(|r| LogTableRow {
            name: r.display_name().to_string(),
            equipment_type: r.equipment_type().unwrap_or("-").to_string(),
            temperature: format!("{} °C", format_value(r.temperature)),
            pressure: format!("{} bar", format_value(r.pressure)),
            status: classify(r.temperature),
        })
        .collect()
}

pub fn leaderboard_rows(entries: &[LeaderboardEntry<'_>]) -> Vec<LeaderboardRow> {
    entries
        .iter()
        .map(|e| LeaderboardRow {
            rank: e.rank,
            name: e.scored.record.display_name().to_string(),
            score: format_score(e.scored.score),
            podium: e
                .marker
                .map(|m| format!("{} {}", m.medal(), m.label()))
                .unwrap_or_default(),
            status: e.status,
        })
        .collect()
}

pub fn critical_count(records: &[EquipmentRecord]) -> usize {
    records
        .iter()
        .filter(|r| classify(r.temperature).is_critical())
        .count()
}
