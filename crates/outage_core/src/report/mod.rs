use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::aggregate::{occurred_within, summarize_regions, RegionSummary};
use crate::carry_over::{detect_carry_over, CarryOverIncident};
use crate::config::SlaPolicy;
use crate::domain::Incident;
use crate::mttr::{compute_mttr, div_round_half_up};
use crate::normalize::timestamps::parse_canonical;
use crate::window::ReportWindow;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RootCauseCount {
    pub root_cause: String,
    pub count: i64,
    pub incident_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SlaTotals {
    pub resolved: i64,
    pub within: i64,
    pub out: i64,
}

impl SlaTotals {
    /// `round(within / resolved * 100)`, half-up; `0` when nothing was resolved.
    pub fn percent(&self) -> i64 {
        if self.resolved <= 0 {
            return 0;
        }
        div_round_half_up(i128::from(self.within) * 100, i128::from(self.resolved)) as i64
    }
}

/// Compliance report for one hour/day/month window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WindowReport {
    #[serde(with = "time::serde::rfc3339")]
    pub window_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub window_end: OffsetDateTime,
    pub ongoing_incidents: Vec<Incident>,
    pub resolved_incidents: Vec<Incident>,
    pub carry_over_incidents: Vec<CarryOverIncident>,
    pub region_summaries: Vec<RegionSummary>,
    pub root_cause_counts: Vec<RootCauseCount>,
    pub mttr_minutes: i64,
}

impl WindowReport {
    /// SLA tallies over incidents that occurred inside the window.
    pub fn sla_totals(&self) -> SlaTotals {
        self.region_summaries
            .iter()
            .fold(SlaTotals::default(), |mut acc, r| {
                acc.resolved += r.resolved_tickets;
                acc.within += r.within_sla_tickets;
                acc.out += r.out_of_sla_tickets;
                acc
            })
    }

    pub fn sla_compliance_percent(&self) -> i64 {
        self.sla_totals().percent()
    }

    pub fn total_tickets(&self) -> i64 {
        self.region_summaries.iter().map(|r| r.total_tickets).sum()
    }
}

fn by_occurrence_then_id(incidents: &mut [Incident]) {
    incidents.sort_by_cached_key(|inc| (parse_canonical(inc.occurrence_ts.as_deref()), inc.id.clone()));
}

pub(crate) fn root_cause_counts<'a>(
    resolved: impl IntoIterator<Item = &'a Incident>,
) -> Vec<RootCauseCount> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for inc in resolved {
        map.entry(inc.root_cause_key()).or_default().push(inc.id.clone());
    }
    let mut out = map
        .into_iter()
        .map(|(root_cause, mut ids)| {
            ids.sort();
            RootCauseCount {
                root_cause,
                count: ids.len() as i64,
                incident_ids: ids,
            }
        })
        .collect::<Vec<_>>();
    out.sort_by(|a, b| (-(a.count), a.root_cause.as_str()).cmp(&(-(b.count), b.root_cause.as_str())));
    out
}

pub fn build_window_report(
    incidents: &[Incident],
    window: &ReportWindow,
    now: OffsetDateTime,
) -> WindowReport {
    build_window_report_with_policy(incidents, window, now, &SlaPolicy::default())
}

/// Compose region summaries, carry-overs, root causes and MTTR for one window.
///
/// The ongoing/resolved partition covers incidents occurring in the window plus
/// carry-overs; region summaries cover only incidents occurring in the window.
/// `now` only feeds the display duration of unresolved carry-overs.
pub fn build_window_report_with_policy(
    incidents: &[Incident],
    window: &ReportWindow,
    now: OffsetDateTime,
    policy: &SlaPolicy,
) -> WindowReport {
    let in_window: Vec<&Incident> = incidents
        .iter()
        .filter(|inc| occurred_within(inc, window))
        .collect();
    let carry_over_incidents = detect_carry_over(incidents, window.start, now);

    let mut ongoing_incidents = Vec::new();
    let mut resolved_incidents = Vec::new();
    for inc in in_window
        .iter()
        .copied()
        .chain(carry_over_incidents.iter().map(|c| &c.incident))
    {
        if inc.status.is_resolved() {
            resolved_incidents.push(inc.clone());
        } else {
            ongoing_incidents.push(inc.clone());
        }
    }
    by_occurrence_then_id(&mut ongoing_incidents);
    by_occurrence_then_id(&mut resolved_incidents);

    let region_summaries = summarize_regions(in_window.iter().copied(), policy);
    let root_cause_counts = root_cause_counts(&resolved_incidents);
    let mttr_minutes = compute_mttr(&resolved_incidents);

    debug!(
        window_start = %window.start,
        window_end = %window.end,
        in_window = in_window.len(),
        carry_overs = carry_over_incidents.len(),
        resolved = resolved_incidents.len(),
        mttr_minutes,
        "built window report"
    );

    WindowReport {
        window_start: window.start,
        window_end: window.end,
        ongoing_incidents,
        resolved_incidents,
        carry_over_incidents,
        region_summaries,
        root_cause_counts,
        mttr_minutes,
    }
}
