use serde::{Deserialize, Serialize};

use crate::domain::{Incident, Severity, ValidationWarning};
use crate::normalize::timestamps::parse_canonical;

fn check_canonical(
    field: &str,
    canonical: &Option<String>,
    raw: &Option<String>,
    warnings: &mut Vec<ValidationWarning>,
) {
    match (canonical.as_deref(), raw.as_deref()) {
        (None, Some(raw)) => warnings.push(
            ValidationWarning::new(
                "VALIDATION_TS_RAW_PRESENT",
                format!("Non-canonical timestamp preserved for {field}; canonical is UNKNOWN"),
            )
            .with_details(format!("raw={raw}")),
        ),
        (Some(c), _) if parse_canonical(Some(c)).is_none() => warnings.push(
            ValidationWarning::new(
                "VALIDATION_TS_PARSE_FAILED",
                format!("Failed to parse {field}"),
            )
            .with_details(format!("value={c}")),
        ),
        _ => {}
    }
}

/// Data-quality checks for one incident. Nothing here changes how the incident is
/// counted; the warnings explain why it may land in `unknown` or be excluded from MTTR.
pub fn validate_incident(incident: &Incident) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for (field, canonical, raw) in [
        ("occurrence_ts", &incident.occurrence_ts, &incident.occurrence_ts_raw),
        ("resolution_ts", &incident.resolution_ts, &incident.resolution_ts_raw),
        (
            "mandatory_restoration_ts",
            &incident.mandatory_restoration_ts,
            &incident.mandatory_restoration_ts_raw,
        ),
        (
            "expected_restoration_ts",
            &incident.expected_restoration_ts,
            &incident.expected_restoration_ts_raw,
        ),
    ] {
        check_canonical(field, canonical, raw, &mut warnings);
    }

    if incident.occurrence_ts.is_none() && incident.occurrence_ts_raw.is_none() {
        warnings.push(ValidationWarning::new(
            "VALIDATION_OCCURRENCE_MISSING",
            "Incident has no occurrence time; it falls outside every report window",
        ));
    }

    let occurrence = parse_canonical(incident.occurrence_ts.as_deref());
    let resolution = parse_canonical(incident.resolution_ts.as_deref());
    if let (Some(o), Some(r)) = (occurrence, resolution) {
        if r < o {
            warnings.push(
                ValidationWarning::new(
                    "VALIDATION_TS_ORDER_VIOLATION",
                    "Timestamp order violation: occurrence_ts must be <= resolution_ts",
                )
                .with_details(format!("occurrence_ts={o}; resolution_ts={r}")),
            );
        }
    }

    if incident.status.is_resolved()
        && incident.resolution_ts.is_none()
        && incident.resolution_ts_raw.is_none()
    {
        warnings.push(
            ValidationWarning::new(
                "VALIDATION_RESOLVED_WITHOUT_RESOLUTION_TS",
                "Resolved incident has no resolution time; SLA is unknown",
            )
            .with_details(format!("status={}", incident.status.as_str())),
        );
    }

    if incident.status.is_ongoing() && incident.resolution_ts.is_some() {
        warnings.push(
            ValidationWarning::new(
                "VALIDATION_OPEN_WITH_RESOLUTION_TS",
                "Unresolved incident carries a resolution time",
            )
            .with_details(format!("status={}", incident.status.as_str())),
        );
    }

    if let Some(h) = incident.expected_resolution_hours {
        if !(h > 0.0) {
            warnings.push(
                ValidationWarning::new(
                    "VALIDATION_EXPECTED_HOURS_NON_POSITIVE",
                    "expected_resolution_hours is not positive; severity default applies",
                )
                .with_details(format!("value={h}")),
            );
        }
    }

    if let Some(label) = incident.severity.as_deref() {
        if Severity::from_label(label).is_none() {
            warnings.push(
                ValidationWarning::new(
                    "VALIDATION_SEVERITY_UNRECOGNIZED",
                    "Unrecognized severity; treated as INFO",
                )
                .with_details(format!("value={label}")),
            );
        }
    }

    warnings
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IncidentValidationReportItem {
    pub id: String,
    pub warnings: Vec<ValidationWarning>,
}

/// Per-incident validation results, ordered by id. Incidents without warnings are included.
pub fn validate_all(incidents: &[Incident]) -> Vec<IncidentValidationReportItem> {
    let mut out = incidents
        .iter()
        .map(|inc| IncidentValidationReportItem {
            id: inc.id.clone(),
            warnings: validate_incident(inc),
        })
        .collect::<Vec<_>>();
    out.sort_by(|a, b| a.id.cmp(&b.id));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IncidentStatus;

    fn codes(inc: &Incident) -> Vec<String> {
        validate_incident(inc).into_iter().map(|w| w.code).collect()
    }

    #[test]
    fn clean_incident_has_no_warnings() {
        let inc = Incident::new("a", IncidentStatus::Resolved)
            .with_severity("MAJOR")
            .with_occurrence("2026-01-01T00:00:00Z")
            .with_resolution("2026-01-01T01:00:00Z");
        assert!(codes(&inc).is_empty());
    }

    #[test]
    fn flags_order_violation_and_missing_resolution() {
        let reversed = Incident::new("a", IncidentStatus::Closed)
            .with_occurrence("2026-01-01T02:00:00Z")
            .with_resolution("2026-01-01T01:00:00Z");
        assert_eq!(codes(&reversed), vec!["VALIDATION_TS_ORDER_VIOLATION"]);

        let unresolved = Incident::new("b", IncidentStatus::Resolved)
            .with_occurrence("2026-01-01T02:00:00Z");
        assert_eq!(codes(&unresolved), vec!["VALIDATION_RESOLVED_WITHOUT_RESOLUTION_TS"]);
    }

    #[test]
    fn flags_missing_occurrence_and_odd_inputs() {
        let inc = Incident::new("c", IncidentStatus::Open)
            .with_severity("sev-9")
            .with_resolution("2026-01-01T01:00:00Z")
            .with_expected_resolution_hours(0.0);
        assert_eq!(
            codes(&inc),
            vec![
                "VALIDATION_OCCURRENCE_MISSING",
                "VALIDATION_OPEN_WITH_RESOLUTION_TS",
                "VALIDATION_EXPECTED_HOURS_NON_POSITIVE",
                "VALIDATION_SEVERITY_UNRECOGNIZED",
            ]
        );
    }

    #[test]
    fn validate_all_orders_by_id() {
        let items = validate_all(&[
            Incident::new("z", IncidentStatus::Open).with_occurrence("2026-01-01T00:00:00Z"),
            Incident::new("m", IncidentStatus::Open),
        ]);
        assert_eq!(items[0].id, "m");
        assert_eq!(items[0].warnings.len(), 1);
        assert!(items[1].warnings.is_empty());
    }
}
