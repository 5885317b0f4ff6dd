use serde::Deserialize;
use serde_json::Value;

use crate::domain::ValidationWarning;
use crate::error::{codes, AppError};
use crate::ingest::{parse_hours, ImportBuilder, IncidentImport, RecordDraft};
use crate::normalize::timestamps::{normalize_epoch_millis, normalize_timestamp, NormalizedTimestamp};

/// Wire-shaped record as returned by the remote API. Both camelCase and snake_case
/// spellings are accepted; `_id` is accepted for `id`. The `*_ts` and `*_ts_raw` names
/// let a serialized `Incident` snapshot be read back.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiIncidentRecord {
    #[serde(alias = "_id")]
    id: Value,
    #[serde(alias = "siteNumber")]
    site_number: Value,
    #[serde(alias = "siteCode")]
    site_code: Option<String>,
    region: Option<String>,
    severity: Option<String>,
    status: Option<String>,
    #[serde(alias = "rootCause")]
    root_cause: Option<String>,
    #[serde(alias = "expectedResolutionHours")]
    expected_resolution_hours: Value,
    #[serde(alias = "storedSlaStatus", alias = "slaStatus", alias = "sla_status")]
    stored_sla_status: Option<String>,
    #[serde(alias = "occurrenceTime", alias = "occurrence_ts")]
    occurrence_time: Value,
    #[serde(alias = "resolutionTime", alias = "resolution_ts")]
    resolution_time: Value,
    #[serde(alias = "mandatoryRestorationTime", alias = "mandatory_restoration_ts")]
    mandatory_restoration_time: Value,
    #[serde(alias = "expectedRestorationTime", alias = "expected_restoration_ts")]
    expected_restoration_time: Value,
    occurrence_ts_raw: Option<String>,
    resolution_ts_raw: Option<String>,
    mandatory_restoration_ts_raw: Option<String>,
    expected_restoration_ts_raw: Option<String>,
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn timestamp_from_value(
    field: &str,
    row: usize,
    v: &Value,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<NormalizedTimestamp> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(normalize_timestamp(field, s, warnings)),
        Value::Number(n) => match n.as_i64() {
            Some(ms) => Some(normalize_epoch_millis(field, ms, warnings)),
            None => {
                warnings.push(
                    ValidationWarning::new(
                        "INGEST_TS_UNPARSEABLE",
                        format!("Non-integer epoch value for {field}; preserved raw"),
                    )
                    .with_details(format!("row={row}; raw={n}")),
                );
                Some(NormalizedTimestamp {
                    canonical_rfc3339_utc: None,
                    raw: Some(n.to_string()),
                })
            }
        },
        other => {
            warnings.push(
                ValidationWarning::new(
                    "INGEST_TS_UNPARSEABLE",
                    format!("Unsupported JSON type for {field}; preserved raw"),
                )
                .with_details(format!("row={row}; raw={other}")),
            );
            Some(NormalizedTimestamp {
                canonical_rfc3339_utc: None,
                raw: Some(other.to_string()),
            })
        }
    }
}

/// A snapshot written by this crate carries the preserved input next to the canonical
/// value. With no canonical value the raw one is normalized again.
fn timestamp_with_raw(
    field: &str,
    row: usize,
    v: &Value,
    raw: Option<String>,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<NormalizedTimestamp> {
    let raw = raw
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    match (timestamp_from_value(field, row, v, warnings), raw) {
        (None, Some(raw)) => Some(normalize_timestamp(field, &raw, warnings)),
        (Some(mut ts), Some(raw)) if ts.raw.is_none() => {
            ts.raw = Some(raw);
            Some(ts)
        }
        (ts, _) => ts,
    }
}

fn hours_from_value(row: usize, v: &Value, warnings: &mut Vec<ValidationWarning>) -> Option<f64> {
    match v {
        Value::Null => None,
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_hours(s, row, warnings),
        other => {
            warnings.push(
                ValidationWarning::new(
                    "INGEST_HOURS_PARSE_FAILED",
                    "Failed to parse expected_resolution_hours",
                )
                .with_details(format!("row={row}; value={other}")),
            );
            None
        }
    }
}

fn draft_from_record(
    row: usize,
    rec: ApiIncidentRecord,
    warnings: &mut Vec<ValidationWarning>,
) -> RecordDraft {
    RecordDraft {
        id: scalar_to_string(&rec.id),
        site_number: scalar_to_string(&rec.site_number),
        site_code: rec.site_code,
        region: rec.region,
        severity: rec.severity,
        status: rec.status,
        root_cause: rec.root_cause,
        expected_resolution_hours: hours_from_value(row, &rec.expected_resolution_hours, warnings),
        stored_sla_status: rec.stored_sla_status,
        occurrence: timestamp_with_raw(
            "occurrence_ts",
            row,
            &rec.occurrence_time,
            rec.occurrence_ts_raw,
            warnings,
        ),
        resolution: timestamp_with_raw(
            "resolution_ts",
            row,
            &rec.resolution_time,
            rec.resolution_ts_raw,
            warnings,
        ),
        mandatory_restoration: timestamp_with_raw(
            "mandatory_restoration_ts",
            row,
            &rec.mandatory_restoration_time,
            rec.mandatory_restoration_ts_raw,
            warnings,
        ),
        expected_restoration: timestamp_with_raw(
            "expected_restoration_ts",
            row,
            &rec.expected_restoration_time,
            rec.expected_restoration_ts_raw,
            warnings,
        ),
    }
}

/// Adapt a JSON array of API incident records. Rows are 1-based in diagnostics.
///
/// Only a document that is not a JSON array is an error; individual malformed records
/// are skipped with a warning.
pub fn parse_incident_records(json_text: &str) -> Result<IncidentImport, AppError> {
    let rows: Vec<Value> = serde_json::from_str(json_text).map_err(|e| {
        AppError::new(
            codes::INGEST_JSON_PARSE_FAILED,
            "Incident payload is not a JSON array",
        )
        .with_details(e.to_string())
    })?;

    let mut builder = ImportBuilder::default();
    for (i, value) in rows.into_iter().enumerate() {
        let row = i + 1;
        match ApiIncidentRecord::deserialize(value) {
            Ok(rec) => {
                let draft = draft_from_record(row, rec, builder.warnings_mut());
                builder.push(row, draft);
            }
            Err(e) => builder.skip(
                row,
                ValidationWarning::new("INGEST_RECORD_MALFORMED", "Record skipped: malformed shape")
                    .with_details(format!("row={row}; err={e}")),
            ),
        }
    }
    Ok(builder.finish())
}
