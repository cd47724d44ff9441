//! Export — JSON and CSV artifact generation.
//!
//! Two export formats for sweep and correlation results:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: flat tables for external analysis tools
//!
//! Persisted JSON includes a `schema_version` field; unknown versions are
//! rejected on import.

use anyhow::{bail, Context, Result};

use crate::config::Reduction;
use crate::corrs::CorrelationTable;
use crate::result::{ResultTensor, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a [`ResultTensor`] to pretty JSON.
pub fn export_tensor_json(tensor: &ResultTensor) -> Result<String> {
    serde_json::to_string_pretty(tensor).context("failed to serialize ResultTensor to JSON")
}

/// Deserialize a [`ResultTensor`] from JSON, rejecting unknown schema
/// versions.
pub fn import_tensor_json(json: &str) -> Result<ResultTensor> {
    let tensor: ResultTensor =
        serde_json::from_str(json).context("failed to deserialize ResultTensor from JSON")?;
    if tensor.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            tensor.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(tensor)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a result tensor as CSV, one row per (value, repetition) cell.
///
/// Columns: label, repetition, then `value` for scalar measures or
/// `value_0..value_{w-1}` for vector measures.
pub fn export_tensor_csv(tensor: &ResultTensor) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["label".to_string(), "repetition".to_string()];
    header.extend(value_columns(tensor.width));
    wtr.write_record(&header)?;

    for (value_index, label) in tensor.labels.iter().enumerate() {
        for rep in 0..tensor.n_reps {
            let mut record = vec![label.to_string(), rep.to_string()];
            for v in tensor.cell(value_index, rep) {
                record.push(format!("{v:.9}"));
            }
            wtr.write_record(&record)?;
        }
    }

    finish(wtr)
}

/// Export per-value summaries: the chosen reduction plus the NaN-aware
/// spread, one row per swept value.
pub fn export_summary_csv(tensor: &ResultTensor, reduction: Reduction) -> Result<String> {
    let reduced = tensor.reduce(reduction);
    let spread = tensor.spread();

    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["label".to_string()];
    header.extend(value_columns(tensor.width).into_iter().map(|c| format!("{c}_agg")));
    header.extend(value_columns(tensor.width).into_iter().map(|c| format!("{c}_std")));
    wtr.write_record(&header)?;

    for (value_index, label) in tensor.labels.iter().enumerate() {
        let mut record = vec![label.to_string()];
        for v in &reduced[value_index] {
            record.push(format!("{v:.9}"));
        }
        for v in &spread[value_index] {
            record.push(format!("{v:.9}"));
        }
        wtr.write_record(&record)?;
    }

    finish(wtr)
}

/// Export a correlation table in long format, one row per unordered pair.
///
/// Columns: measure_a, measure_b, r, ci_low, ci_high, p
pub fn export_corr_csv(table: &CorrelationTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["measure_a", "measure_b", "r", "ci_low", "ci_high", "p"])?;

    for (a, b, stats) in table.pairs() {
        wtr.write_record([
            a,
            b,
            &format!("{:.9}", stats.r),
            &format!("{:.9}", stats.ci_low),
            &format!("{:.9}", stats.ci_high),
            &format!("{:.9}", stats.p),
        ])?;
    }

    finish(wtr)
}

fn value_columns(width: usize) -> Vec<String> {
    if width == 1 {
        vec!["value".to_string()]
    } else {
        (0..width).map(|w| format!("value_{w}")).collect()
    }
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let bytes = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}
