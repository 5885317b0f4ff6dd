use serde::{Deserialize, Serialize};

use crate::domain::ValidationWarning;
use crate::error::{codes, AppError};
use crate::ingest::{parse_hours, ImportBuilder, IncidentImport, RecordDraft};
use crate::normalize::timestamps::normalize_timestamp;

/// CSV column headers for each incident field. `status` and `occurrence_time` are required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncidentCsvMapping {
    pub id: Option<String>,
    pub site_number: Option<String>,
    pub site_code: Option<String>,
    pub region: Option<String>,
    pub severity: Option<String>,
    pub status: String,
    pub root_cause: Option<String>,
    pub expected_resolution_hours: Option<String>,
    pub stored_sla_status: Option<String>,
    pub occurrence_time: String,
    pub resolution_time: Option<String>,
    pub mandatory_restoration_time: Option<String>,
    pub expected_restoration_time: Option<String>,
}

impl Default for IncidentCsvMapping {
    /// Headers as written by the dashboard's own ticket export.
    fn default() -> Self {
        Self {
            id: Some("ID".to_string()),
            site_number: Some("Site Number".to_string()),
            site_code: Some("Site Code".to_string()),
            region: Some("Region".to_string()),
            severity: Some("Severity".to_string()),
            status: "Status".to_string(),
            root_cause: Some("Root Cause".to_string()),
            expected_resolution_hours: Some("Expected Resolution Hours".to_string()),
            stored_sla_status: Some("SLA Status".to_string()),
            occurrence_time: "Occurrence Time".to_string(),
            resolution_time: Some("Resolution Time".to_string()),
            mandatory_restoration_time: Some("Mandatory Restoration Time".to_string()),
            expected_restoration_time: Some("Expected Restoration Time".to_string()),
        }
    }
}

fn get<'a>(
    row: &'a csv::StringRecord,
    headers: &'a csv::StringRecord,
    header_name: Option<&str>,
) -> Option<&'a str> {
    let header_name = header_name?;
    headers
        .iter()
        .position(|h| h == header_name)
        .and_then(|idx| row.get(idx))
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn require_header(headers: &csv::StringRecord, name: &str) -> Result<(), AppError> {
    if headers.iter().any(|h| h == name) {
        return Ok(());
    }
    Err(AppError::new(
        codes::INGEST_CSV_MAPPING_INVALID,
        "Mapped CSV column not found in headers",
    )
    .with_details(format!("column={name}")))
}

/// Adapt a CSV export into incidents using a column mapping.
///
/// Missing required columns and unreadable headers are errors; per-row problems are
/// skips or warnings. Row numbers in diagnostics are 1-based data rows.
pub fn parse_incident_csv(
    csv_text: &str,
    mapping: &IncidentCsvMapping,
) -> Result<IncidentImport, AppError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv_text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| {
            AppError::new(codes::INGEST_CSV_HEADERS_FAILED, "Failed to read CSV headers")
                .with_details(e.to_string())
        })?
        .clone();

    require_header(&headers, &mapping.status)?;
    require_header(&headers, &mapping.occurrence_time)?;

    let mut builder = ImportBuilder::default();
    for (i, result) in rdr.records().enumerate() {
        let row_idx = i + 1;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                builder.skip(
                    row_idx,
                    ValidationWarning::new(
                        "INGEST_CSV_ROW_MALFORMED",
                        "Record skipped: malformed CSV row",
                    )
                    .with_details(format!("row={row_idx}; err={e}")),
                );
                continue;
            }
        };

        let cell = |name: Option<&str>| get(&record, &headers, name).map(str::to_string);
        let warnings = builder.warnings_mut();
        let ts = |field: &str, name: Option<&str>, warnings: &mut Vec<_>| {
            get(&record, &headers, name).map(|v| normalize_timestamp(field, v, warnings))
        };

        let draft = RecordDraft {
            id: cell(mapping.id.as_deref()),
            site_number: cell(mapping.site_number.as_deref()),
            site_code: cell(mapping.site_code.as_deref()),
            region: cell(mapping.region.as_deref()),
            severity: cell(mapping.severity.as_deref()),
            status: cell(Some(mapping.status.as_str())),
            root_cause: cell(mapping.root_cause.as_deref()),
            expected_resolution_hours: get(
                &record,
                &headers,
                mapping.expected_resolution_hours.as_deref(),
            )
            .and_then(|v| parse_hours(v, row_idx, warnings)),
            stored_sla_status: cell(mapping.stored_sla_status.as_deref()),
            occurrence: ts("occurrence_ts", Some(mapping.occurrence_time.as_str()), warnings),
            resolution: ts("resolution_ts", mapping.resolution_time.as_deref(), warnings),
            mandatory_restoration: ts(
                "mandatory_restoration_ts",
                mapping.mandatory_restoration_time.as_deref(),
                warnings,
            ),
            expected_restoration: ts(
                "expected_restoration_ts",
                mapping.expected_restoration_time.as_deref(),
                warnings,
            ),
        };
        builder.push(row_idx, draft);
    }

    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IncidentStatus;

    #[test]
    fn default_mapping_reads_export_headers() {
        let csv_text = "\
ID,Site Number,Site Code,Region,Severity,Status,Root Cause,Expected Resolution Hours,SLA Status,Occurrence Time,Resolution Time,Mandatory Restoration Time,Expected Restoration Time
T-1,101,N-101,North,MAJOR,Resolved,Fiber cut,3,,2026-01-01T00:00:00Z,2026-01-01T02:00:00Z,,
T-2,102,S-102,South,MINOR,In Progress,,,,2026-01-01 05:00,,,
";
        let out = parse_incident_csv(csv_text, &IncidentCsvMapping::default()).unwrap();
        assert_eq!(out.incidents.len(), 2);
        let t1 = &out.incidents[0];
        assert_eq!(t1.expected_resolution_hours, Some(3.0));
        assert_eq!(t1.root_cause.as_deref(), Some("Fiber cut"));
        let t2 = &out.incidents[1];
        assert_eq!(t2.status, IncidentStatus::InProgress);
        assert_eq!(t2.occurrence_ts.as_deref(), Some("2026-01-01T05:00:00Z"));
        assert_eq!(t2.occurrence_ts_raw.as_deref(), Some("2026-01-01 05:00"));
    }

    #[test]
    fn row_with_wrong_field_count_is_skipped_not_fatal() {
        let csv_text = "\
ID,Status,Occurrence Time
T-1,Open,2026-01-01T00:00:00Z
T-2,Open,2026-01-01T01:00:00Z,stray
T-3,Resolved,2026-01-01T02:00:00Z
";
        let out = parse_incident_csv(csv_text, &IncidentCsvMapping::default()).unwrap();
        let ids: Vec<_> = out.incidents.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["T-1", "T-3"]);
        assert_eq!(out.skipped, 1);
        let malformed = out
            .warnings
            .iter()
            .find(|w| w.code == "INGEST_CSV_ROW_MALFORMED")
            .unwrap();
        assert!(malformed.details.as_deref().unwrap().starts_with("row=2;"));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let csv_text = "ID,Status\nT-1,Open\n";
        let err = parse_incident_csv(csv_text, &IncidentCsvMapping::default()).unwrap_err();
        assert_eq!(err.code, codes::INGEST_CSV_MAPPING_INVALID);
    }
}
