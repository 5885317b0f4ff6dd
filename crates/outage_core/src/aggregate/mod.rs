use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::SlaPolicy;
use crate::domain::{Incident, IncidentStatus, Severity, SlaStatus};
use crate::normalize::timestamps::parse_canonical;
use crate::sla::classify_with_policy;
use crate::window::ReportWindow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegionSummary {
    pub region: String,
    pub total_tickets: i64,
    pub open_tickets: i64,
    pub in_progress_tickets: i64,
    pub resolved_tickets: i64,
    pub within_sla_tickets: i64,
    pub out_of_sla_tickets: i64,
    pub critical_count: i64,
    pub major_count: i64,
    pub minor_count: i64,
}

impl RegionSummary {
    pub fn empty(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            total_tickets: 0,
            open_tickets: 0,
            in_progress_tickets: 0,
            resolved_tickets: 0,
            within_sla_tickets: 0,
            out_of_sla_tickets: 0,
            critical_count: 0,
            major_count: 0,
            minor_count: 0,
        }
    }

    fn record(&mut self, incident: &Incident, policy: &SlaPolicy) {
        self.total_tickets += 1;
        match incident.status {
            IncidentStatus::Open => self.open_tickets += 1,
            IncidentStatus::InProgress => self.in_progress_tickets += 1,
            IncidentStatus::Resolved | IncidentStatus::Closed => {
                self.resolved_tickets += 1;
                // `unknown` counts toward neither SLA bucket.
                match classify_with_policy(incident, policy) {
                    SlaStatus::Within => self.within_sla_tickets += 1,
                    SlaStatus::Out => self.out_of_sla_tickets += 1,
                    SlaStatus::Unknown => {}
                }
            }
        }
        match incident.severity_level() {
            Severity::Critical => self.critical_count += 1,
            Severity::Major => self.major_count += 1,
            Severity::Minor => self.minor_count += 1,
            Severity::Warning | Severity::Info => {}
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SeverityCount {
    pub severity: Severity,
    pub count: i64,
    pub incident_ids: Vec<String>,
}

/// True when the incident's occurrence falls inside the window. Missing or malformed
/// occurrence timestamps never match any window.
pub fn occurred_within(incident: &Incident, window: &ReportWindow) -> bool {
    parse_canonical(incident.occurrence_ts.as_deref()).is_some_and(|ts| window.contains(ts))
}

pub fn aggregate(incidents: &[Incident], window: &ReportWindow) -> Vec<RegionSummary> {
    aggregate_with_policy(incidents, window, &SlaPolicy::default())
}

/// One summary per region for incidents whose occurrence lies in `[start, end)`.
///
/// Output is ordered by region name. Callers ranking by volume should use
/// [`rank_regions_by_tickets`].
pub fn aggregate_with_policy(
    incidents: &[Incident],
    window: &ReportWindow,
    policy: &SlaPolicy,
) -> Vec<RegionSummary> {
    summarize_regions(
        incidents.iter().filter(|inc| occurred_within(inc, window)),
        policy,
    )
}

/// Group already-selected incidents by region, without any window filtering.
pub(crate) fn summarize_regions<'a>(
    incidents: impl IntoIterator<Item = &'a Incident>,
    policy: &SlaPolicy,
) -> Vec<RegionSummary> {
    let mut by_region: BTreeMap<String, RegionSummary> = BTreeMap::new();
    for inc in incidents {
        let key = inc.region_key();
        by_region
            .entry(key.clone())
            .or_insert_with(|| RegionSummary::empty(key))
            .record(inc, policy);
    }
    by_region.into_values().collect()
}

/// Most tickets first; ties broken by region name so the order is deterministic.
pub fn rank_regions_by_tickets(summaries: &[RegionSummary]) -> Vec<RegionSummary> {
    let mut ranked = summaries.to_vec();
    ranked.sort_by(|a, b| {
        (-(a.total_tickets), a.region.as_str()).cmp(&(-(b.total_tickets), b.region.as_str()))
    });
    ranked
}

/// Severity distribution of incidents occurring in the window, in severity order.
/// Every severity is present, with zero counts where nothing occurred.
pub fn severity_counts(incidents: &[Incident], window: &ReportWindow) -> Vec<SeverityCount> {
    let mut map: BTreeMap<Severity, Vec<String>> =
        Severity::ALL.iter().map(|s| (*s, Vec::new())).collect();
    for inc in incidents.iter().filter(|inc| occurred_within(inc, window)) {
        map.entry(inc.severity_level())
            .or_default()
            .push(inc.id.clone());
    }
    map.into_iter()
        .map(|(severity, mut ids)| {
            ids.sort();
            SeverityCount {
                severity,
                count: ids.len() as i64,
                incident_ids: ids,
            }
        })
        .collect()
}
