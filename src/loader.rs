use crate::errors::ModelError;
use crate::types::{AnalysisResult, EquipmentRecord, HistoryEntry};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::error::Category;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// The service's response body as it arrives on the wire.
///
/// Records and history stay as raw values here so a bad element can be
/// reported by its position.
#[derive(Debug, Deserialize)]
struct Envelope {
    total_count: u64,
    avg_pressure: f64,
    max_temp: f64,
    avg_flowrate: f64,
    type_distribution: BTreeMap<String, u64>,
    raw_data: Vec<Value>,
    history: Vec<Value>,
}

/// Parse the analysis service's response body.
///
/// Every structural field is required. A missing `raw_data`, a missing
/// distribution, or a missing history (even an empty one) rejects the whole
/// payload rather than defaulting.
pub fn parse_analysis(body: &str) -> Result<AnalysisResult, ModelError> {
    let envelope: Envelope = serde_json::from_str(body).map_err(decode_error)?;

    let records = decode_each(envelope.raw_data, |index, reason| ModelError::BadRecord {
        index,
        reason,
    })?;
    let history = decode_each(envelope.history, |index, reason| ModelError::BadHistory {
        index,
        reason,
    })?;

    if records.len() as u64 != envelope.total_count {
        // The count is an upstream aggregate; keep it but note the mismatch.
        warn!(
            total_count = envelope.total_count,
            records = records.len(),
            "total_count does not match number of records"
        );
    }
    debug!(
        records = records.len(),
        categories = envelope.type_distribution.len(),
        history = history.len(),
        "analysis payload validated"
    );

    Ok(AnalysisResult {
        total_count: envelope.total_count,
        avg_pressure: envelope.avg_pressure,
        max_temp: envelope.max_temp,
        avg_flow_rate: envelope.avg_flowrate,
        type_distribution: envelope.type_distribution,
        records,
        history,
    })
}

fn decode_error(err: serde_json::Error) -> ModelError {
    match err.classify() {
        Category::Data => ModelError::Structure(err),
        Category::Syntax | Category::Eof | Category::Io => ModelError::InvalidJson(err),
    }
}

fn decode_each<T, F>(items: Vec<Value>, wrap: F) -> Result<Vec<T>, ModelError>
where
    T: DeserializeOwned,
    F: Fn(usize, String) -> ModelError,
{
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| serde_json::from_value(item).map_err(|e| wrap(index, e.to_string())))
        .collect()
}
