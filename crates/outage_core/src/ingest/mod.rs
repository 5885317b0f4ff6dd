//! Adapters from fetched API payloads and CSV exports into canonical [`Incident`]s.
//!
//! Field-name aliasing, id fallback and timestamp normalisation happen here, once, so the
//! computation modules only ever see the typed entity.

pub mod csv_records;
pub mod json_records;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::domain::{Incident, IncidentStatus, SlaStatus, ValidationWarning};
use crate::normalize::timestamps::NormalizedTimestamp;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportConflict {
    pub row: usize,
    pub reason: String,
    pub id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncidentImport {
    pub incidents: Vec<Incident>,
    pub skipped: usize,
    pub conflicts: Vec<ImportConflict>,
    pub warnings: Vec<ValidationWarning>,
}

/// Adapter-neutral view of one input record, after per-format decoding.
#[derive(Debug, Clone, Default)]
pub(crate) struct RecordDraft {
    pub id: Option<String>,
    pub site_number: Option<String>,
    pub site_code: Option<String>,
    pub region: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub root_cause: Option<String>,
    pub expected_resolution_hours: Option<f64>,
    pub stored_sla_status: Option<String>,
    pub occurrence: Option<NormalizedTimestamp>,
    pub resolution: Option<NormalizedTimestamp>,
    pub mandatory_restoration: Option<NormalizedTimestamp>,
    pub expected_restoration: Option<NormalizedTimestamp>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub(crate) fn parse_hours(raw: &str, row: usize, warnings: &mut Vec<ValidationWarning>) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        Ok(v) => {
            warnings.push(
                ValidationWarning::new(
                    "INGEST_HOURS_NOT_FINITE",
                    "expected_resolution_hours is not a finite number",
                )
                .with_details(format!("row={row}; value={v}")),
            );
            None
        }
        Err(e) => {
            warnings.push(
                ValidationWarning::new(
                    "INGEST_HOURS_PARSE_FAILED",
                    "Failed to parse expected_resolution_hours",
                )
                .with_details(format!("row={row}; value={trimmed}; err={e}")),
            );
            None
        }
    }
}

/// Stable id for records that arrive without one: SHA-256 over the identifying fields.
pub fn fingerprint(
    site_number: Option<&str>,
    site_code: Option<&str>,
    region: Option<&str>,
    occurrence_ts: Option<&str>,
) -> String {
    let payload = format!(
        "site_number={}|site_code={}|region={}|occurrence={}",
        site_number.unwrap_or(""),
        site_code.unwrap_or(""),
        region.unwrap_or("").to_lowercase(),
        occurrence_ts.unwrap_or("")
    );
    let digest = Sha256::digest(payload.as_bytes());
    format!("fp-{}", hex::encode(digest))
}

fn split_ts(ts: Option<NormalizedTimestamp>) -> (Option<String>, Option<String>) {
    match ts {
        Some(n) => (n.canonical_rfc3339_utc, n.raw),
        None => (None, None),
    }
}

fn finish_record(
    row: usize,
    draft: RecordDraft,
    warnings: &mut Vec<ValidationWarning>,
) -> Option<Incident> {
    let status_raw = non_empty(draft.status);
    let Some(status) = status_raw.as_deref().and_then(IncidentStatus::from_label) else {
        warnings.push(
            ValidationWarning::new(
                "INGEST_STATUS_UNRECOGNIZED",
                "Record skipped: status is missing or not one of Open/In Progress/Resolved/Closed",
            )
            .with_details(format!(
                "row={row}; status={}",
                status_raw.as_deref().unwrap_or("")
            )),
        );
        return None;
    };

    let stored_sla_status = match non_empty(draft.stored_sla_status) {
        None => None,
        Some(raw) => match SlaStatus::from_label(&raw) {
            Some(s) => Some(s),
            None => {
                warnings.push(
                    ValidationWarning::new(
                        "INGEST_SLA_STATUS_UNRECOGNIZED",
                        "Ignored unrecognized stored SLA status; classification will be computed",
                    )
                    .with_details(format!("row={row}; value={raw}")),
                );
                None
            }
        },
    };

    let site_number = non_empty(draft.site_number);
    let site_code = non_empty(draft.site_code);
    let region = non_empty(draft.region);
    let (occurrence_ts, occurrence_ts_raw) = split_ts(draft.occurrence);
    let (resolution_ts, resolution_ts_raw) = split_ts(draft.resolution);
    let (mandatory_restoration_ts, mandatory_restoration_ts_raw) =
        split_ts(draft.mandatory_restoration);
    let (expected_restoration_ts, expected_restoration_ts_raw) =
        split_ts(draft.expected_restoration);

    let id = match non_empty(draft.id) {
        Some(id) => id,
        None => {
            let fp = fingerprint(
                site_number.as_deref(),
                site_code.as_deref(),
                region.as_deref(),
                occurrence_ts.as_deref().or(occurrence_ts_raw.as_deref()),
            );
            warnings.push(
                ValidationWarning::new("INGEST_ID_DERIVED", "Record had no id; derived a fingerprint id")
                    .with_details(format!("row={row}; id={fp}")),
            );
            fp
        }
    };

    Some(Incident {
        id,
        site_number,
        site_code,
        region,
        severity: non_empty(draft.severity),
        status,
        root_cause: non_empty(draft.root_cause),
        expected_resolution_hours: draft.expected_resolution_hours,
        stored_sla_status,
        occurrence_ts,
        resolution_ts,
        mandatory_restoration_ts,
        expected_restoration_ts,
        occurrence_ts_raw,
        resolution_ts_raw,
        mandatory_restoration_ts_raw,
        expected_restoration_ts_raw,
    })
}

/// Accumulates adapted records, skipping unusable rows and duplicate ids (first wins).
#[derive(Debug, Default)]
pub(crate) struct ImportBuilder {
    seen: BTreeSet<String>,
    incidents: Vec<Incident>,
    skipped: usize,
    conflicts: Vec<ImportConflict>,
    warnings: Vec<ValidationWarning>,
}

impl ImportBuilder {
    pub fn warnings_mut(&mut self) -> &mut Vec<ValidationWarning> {
        &mut self.warnings
    }

    pub fn skip(&mut self, row: usize, warning: ValidationWarning) {
        warn!(row, code = %warning.code, "skipped incident record");
        self.skipped += 1;
        self.warnings.push(warning);
    }

    pub fn push(&mut self, row: usize, draft: RecordDraft) {
        let Some(incident) = finish_record(row, draft, &mut self.warnings) else {
            warn!(row, "skipped incident record with unusable status");
            self.skipped += 1;
            return;
        };
        if !self.seen.insert(incident.id.clone()) {
            warn!(row, id = %incident.id, "skipped duplicate incident id");
            self.skipped += 1;
            self.conflicts.push(ImportConflict {
                row,
                reason: "duplicate id; first occurrence kept".to_string(),
                id: Some(incident.id),
            });
            return;
        }
        self.incidents.push(incident);
    }

    pub fn finish(self) -> IncidentImport {
        IncidentImport {
            incidents: self.incidents,
            skipped: self.skipped,
            conflicts: self.conflicts,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable_and_field_sensitive() {
        let a = fingerprint(Some("101"), Some("NRT-1"), Some("North"), Some("2026-01-01T00:00:00Z"));
        let b = fingerprint(Some("101"), Some("NRT-1"), Some("north"), Some("2026-01-01T00:00:00Z"));
        let c = fingerprint(Some("102"), Some("NRT-1"), Some("North"), Some("2026-01-01T00:00:00Z"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.starts_with("fp-"));
        assert_eq!(a.len(), 3 + 64);
    }

    #[test]
    fn duplicate_ids_are_conflicts() {
        let mut b = ImportBuilder::default();
        for row in 1..=2 {
            b.push(
                row,
                RecordDraft {
                    id: Some("INC-1".to_string()),
                    status: Some("Open".to_string()),
                    ..RecordDraft::default()
                },
            );
        }
        let out = b.finish();
        assert_eq!(out.incidents.len(), 1);
        assert_eq!(out.skipped, 1);
        assert_eq!(out.conflicts[0].row, 2);
    }

    #[test]
    fn hours_parse_warns_on_garbage() {
        let mut warnings = Vec::new();
        assert_eq!(parse_hours(" 2.5 ", 1, &mut warnings), Some(2.5));
        assert_eq!(parse_hours("two", 1, &mut warnings), None);
        assert_eq!(warnings[0].code, "INGEST_HOURS_PARSE_FAILED");
    }
}
