use serde::{Deserialize, Serialize};

use crate::config::SlaPolicy;
use crate::domain::{Incident, SlaStatus};
use crate::normalize::timestamps::parse_canonical;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Which rule of the priority chain produced a classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SlaBasis {
    Stored,
    MissingTimestamps,
    MandatoryDeadline,
    ExpectedHours,
    SeverityDefault,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlaDecision {
    pub status: SlaStatus,
    pub basis: SlaBasis,
}

/// Classify against the built-in severity table.
pub fn classify(incident: &Incident) -> SlaStatus {
    classify_with_policy(incident, &SlaPolicy::default())
}

pub fn classify_with_policy(incident: &Incident, policy: &SlaPolicy) -> SlaStatus {
    classify_detailed(incident, policy).status
}

/// First matching rule wins:
/// stored status, then missing/unparseable timestamps (`unknown`), then the mandatory
/// restoration deadline, then a positive expected-hours target, then the severity default.
/// Duration comparisons are inclusive at the boundary.
pub fn classify_detailed(incident: &Incident, policy: &SlaPolicy) -> SlaDecision {
    if let Some(stored) = incident.stored_sla_status {
        return SlaDecision {
            status: stored,
            basis: SlaBasis::Stored,
        };
    }

    let occurrence = parse_canonical(incident.occurrence_ts.as_deref());
    let resolution = parse_canonical(incident.resolution_ts.as_deref());
    let (Some(occurrence), Some(resolution)) = (occurrence, resolution) else {
        return SlaDecision {
            status: SlaStatus::Unknown,
            basis: SlaBasis::MissingTimestamps,
        };
    };

    if let Some(deadline) = parse_canonical(incident.mandatory_restoration_ts.as_deref()) {
        let status = if resolution <= deadline {
            SlaStatus::Within
        } else {
            SlaStatus::Out
        };
        return SlaDecision {
            status,
            basis: SlaBasis::MandatoryDeadline,
        };
    }

    // Zero or negative targets fall through to the severity table.
    let (target_hours, basis) = match incident.expected_resolution_hours {
        Some(h) if h.is_finite() && h > 0.0 => (h, SlaBasis::ExpectedHours),
        _ => (
            policy.hours_for(incident.severity_level()),
            SlaBasis::SeverityDefault,
        ),
    };

    let actual_ms = (resolution - occurrence).whole_milliseconds() as f64;
    let status = if actual_ms <= target_hours * MS_PER_HOUR {
        SlaStatus::Within
    } else {
        SlaStatus::Out
    };
    SlaDecision { status, basis }
}
