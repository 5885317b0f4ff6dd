use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::Incident;
use crate::normalize::timestamps::parse_canonical;

const MS_PER_DAY: i128 = 86_400_000;

/// An incident that began before the window but is still relevant to it, with its
/// display duration in whole days (rounded up).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CarryOverIncident {
    pub incident: Incident,
    pub duration_days: i64,
}

/// Occurred before `window_start` and is either still open/in progress, or was resolved
/// at or after `window_start`.
///
/// A resolved incident whose resolution time is missing or malformed is not a carry-over:
/// nothing places its closure inside the window.
pub fn is_carry_over(incident: &Incident, window_start: OffsetDateTime) -> bool {
    let Some(occurrence) = parse_canonical(incident.occurrence_ts.as_deref()) else {
        return false;
    };
    if occurrence >= window_start {
        return false;
    }
    if incident.status.is_ongoing() {
        return true;
    }
    parse_canonical(incident.resolution_ts.as_deref()).is_some_and(|r| r >= window_start)
}

/// `ceil((resolution or now - occurrence) / 1 day)`, floored at zero.
pub fn carry_over_days(incident: &Incident, now: OffsetDateTime) -> i64 {
    let Some(occurrence) = parse_canonical(incident.occurrence_ts.as_deref()) else {
        return 0;
    };
    let end = if incident.status.is_resolved() {
        parse_canonical(incident.resolution_ts.as_deref()).unwrap_or(now)
    } else {
        now
    };
    let ms = (end - occurrence).whole_milliseconds();
    if ms <= 0 {
        return 0;
    }
    ((ms + MS_PER_DAY - 1) / MS_PER_DAY) as i64
}

/// Carry-overs relative to `window_start`, oldest occurrence first (ties by id).
pub fn detect_carry_over(
    incidents: &[Incident],
    window_start: OffsetDateTime,
    now: OffsetDateTime,
) -> Vec<CarryOverIncident> {
    let mut out: Vec<CarryOverIncident> = incidents
        .iter()
        .filter(|inc| is_carry_over(inc, window_start))
        .map(|inc| CarryOverIncident {
            incident: inc.clone(),
            duration_days: carry_over_days(inc, now),
        })
        .collect();
    out.sort_by_cached_key(|c| {
        (
            parse_canonical(c.incident.occurrence_ts.as_deref()),
            c.incident.id.clone(),
        )
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IncidentStatus;
    use time::macros::datetime;

    const START: OffsetDateTime = datetime!(2026-04-10 00:00 UTC);
    const NOW: OffsetDateTime = datetime!(2026-04-10 12:00 UTC);

    #[test]
    fn in_progress_from_previous_day_is_carried_over() {
        let inc = Incident::new("a", IncidentStatus::InProgress).with_occurrence("2026-04-09T00:00:00Z");
        let out = detect_carry_over(&[inc], START, NOW);
        assert_eq!(out.len(), 1);
        // 1.5 days elapsed rounds up to 2.
        assert_eq!(out[0].duration_days, 2);
    }

    #[test]
    fn resolved_before_window_is_not_carried_over() {
        let inc = Incident::new("a", IncidentStatus::Resolved)
            .with_occurrence("2026-04-09T00:00:00Z")
            .with_resolution("2026-04-09T20:00:00Z");
        assert!(detect_carry_over(&[inc], START, NOW).is_empty());
    }

    #[test]
    fn resolved_exactly_at_window_start_is_carried_over() {
        let inc = Incident::new("a", IncidentStatus::Closed)
            .with_occurrence("2026-04-08T00:00:00Z")
            .with_resolution("2026-04-10T00:00:00Z");
        let out = detect_carry_over(&[inc], START, NOW);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].duration_days, 2);
    }

    #[test]
    fn incidents_starting_in_window_are_not_carry_overs() {
        let inc = Incident::new("a", IncidentStatus::Open).with_occurrence("2026-04-10T00:00:00Z");
        assert!(!is_carry_over(&inc, START));
    }

    #[test]
    fn resolved_without_resolution_time_is_excluded() {
        let inc = Incident::new("a", IncidentStatus::Resolved).with_occurrence("2026-04-01T00:00:00Z");
        assert!(!is_carry_over(&inc, START));
    }

    #[test]
    fn ordering_is_by_occurrence_then_id() {
        let incidents = vec![
            Incident::new("z", IncidentStatus::Open).with_occurrence("2026-04-08T00:00:00Z"),
            Incident::new("b", IncidentStatus::Open).with_occurrence("2026-04-09T00:00:00Z"),
            Incident::new("a", IncidentStatus::Open).with_occurrence("2026-04-09T00:00:00Z"),
        ];
        let ids: Vec<_> = detect_carry_over(&incidents, START, NOW)
            .into_iter()
            .map(|c| c.incident.id)
            .collect();
        assert_eq!(ids, vec!["z", "a", "b"]);
    }
}
