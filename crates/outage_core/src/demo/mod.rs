use time::format_description::well_known::Rfc3339;
use time::{Date, Duration, OffsetDateTime};

use crate::domain::{Incident, IncidentStatus, SlaStatus};

const REGIONS: [&str; 5] = ["North", "South", "East", "West", "Central"];
const SEVERITIES: [&str; 5] = ["CRITICAL", "MAJOR", "MINOR", "WARNING", "INFO"];
const ROOT_CAUSES: [&str; 4] = ["Fiber cut", "Power outage", "Hardware failure", "Configuration"];

fn rfc3339(dt: OffsetDateTime) -> Option<String> {
    dt.format(&Rfc3339).ok()
}

/// Deterministic synthetic snapshot: `count` incidents spread over the 30 days starting at
/// `base_date` (UTC), cycling through regions, severities and lifecycle states.
///
/// Every 7th incident is still open and every 11th in progress; resolved ones take between
/// 20 minutes and ~20 hours, so both SLA outcomes appear. Every 13th resolved incident
/// carries a mandatory restoration deadline and every 17th a stored SLA status.
///
/// Near the end of the calendar, incidents whose occurrence cannot be represented are left
/// out and resolution or deadline timestamps that cannot be represented stay empty.
pub fn demo_incidents(base_date: Date, count: usize) -> Vec<Incident> {
    let base = base_date.midnight().assume_utc();
    let mut out = Vec::with_capacity(count);

    for i in 0..count {
        let region = REGIONS[i % REGIONS.len()];
        let severity = SEVERITIES[(i / 2) % SEVERITIES.len()];
        let day = (i % 30) as i64;
        let minute = ((i * 37) % (24 * 60)) as i64;
        let Some(occurrence) = base
            .checked_add(Duration::days(day))
            .and_then(|d| d.checked_add(Duration::minutes(minute)))
        else {
            continue;
        };

        let status = if i % 7 == 6 {
            IncidentStatus::Open
        } else if i % 11 == 10 {
            IncidentStatus::InProgress
        } else if i % 2 == 0 {
            IncidentStatus::Resolved
        } else {
            IncidentStatus::Closed
        };

        let mut inc = Incident::new(format!("INC-{:05}", i + 1), status)
            .with_region(region)
            .with_severity(severity);
        inc.site_number = Some(format!("{}", 1000 + i % 250));
        inc.site_code = Some(format!("{}-{:03}", &region[..1], i % 250));
        inc.occurrence_ts = rfc3339(occurrence);

        if status.is_resolved() {
            let took = Duration::minutes(20 + ((i * 53) % 1200) as i64);
            inc.resolution_ts = occurrence.checked_add(took).and_then(rfc3339);
            if i % 3 == 0 {
                inc.root_cause = Some(ROOT_CAUSES[i % ROOT_CAUSES.len()].to_string());
            }
            if i % 5 == 0 {
                inc.expected_resolution_hours = Some(((i % 6) + 1) as f64);
            }
            if i % 13 == 0 {
                inc.mandatory_restoration_ts =
                    occurrence.checked_add(Duration::hours(3)).and_then(rfc3339);
            }
            if i % 17 == 0 {
                inc.stored_sla_status = Some(SlaStatus::Within);
            }
        }
        out.push(inc);
    }
    out
}
