use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};
use tracing::debug;

use crate::config::ReportOptions;
use crate::domain::{Incident, SlaStatus};
use crate::mttr::{resolution_ms, MttrAccumulator};
use crate::normalize::timestamps::parse_canonical;
use crate::report::SlaTotals;
use crate::sla::classify_with_policy;
use crate::window::local_date;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendPoint {
    pub date: Date,
    pub sla_percent: i64,
    pub mttr_minutes: i64,
    pub resolved_count: i64,
    pub within_sla_count: i64,
}

#[derive(Debug, Clone, Copy, Default)]
struct DayBucket {
    sla: SlaTotals,
    mttr: MttrAccumulator,
}

pub fn build_trend(incidents: &[Incident], end_date: Date, range_days: u32) -> Vec<TrendPoint> {
    build_trend_with_options(incidents, end_date, range_days, &ReportOptions::default())
}

/// Daily SLA percentage and MTTR for the `range_days` days ending at `end_date`
/// (inclusive, oldest first).
///
/// Each point equals what a one-day window report would give for that day, but the
/// incident set is scanned once: every incident is dropped into the day buckets it
/// affects. SLA tallies go to the occurrence day. A resolved incident's duration feeds
/// MTTR on every day from its occurrence day through its resolution day, since it is
/// a carry-over on each of the later days. Days with no data are zero-valued points.
pub fn build_trend_with_options(
    incidents: &[Incident],
    end_date: Date,
    range_days: u32,
    options: &ReportOptions,
) -> Vec<TrendPoint> {
    if range_days == 0 {
        return Vec::new();
    }
    let Some(first_date) = end_date.checked_sub(Duration::days(i64::from(range_days) - 1)) else {
        debug!(%end_date, range_days, "trend range underflows calendar; returning empty trend");
        return Vec::new();
    };

    let len = range_days as usize;
    let mut buckets = vec![DayBucket::default(); len];
    let last = len as i64 - 1;
    // An instant with no local date lies beyond one end of the calendar; it sorts
    // before or after every bucket accordingly.
    let day_index = |ts: OffsetDateTime| -> i64 {
        match local_date(ts, options.offset) {
            Some(d) => (d - first_date).whole_days(),
            None if ts.year() < 0 => -1,
            None => last + 1,
        }
    };

    for inc in incidents {
        let Some(occurrence) = parse_canonical(inc.occurrence_ts.as_deref()) else {
            continue;
        };
        if !inc.status.is_resolved() {
            continue;
        }
        let occ_idx = day_index(occurrence);

        if (0..=last).contains(&occ_idx) {
            let sla = &mut buckets[occ_idx as usize].sla;
            sla.resolved += 1;
            match classify_with_policy(inc, &options.sla_policy) {
                SlaStatus::Within => sla.within += 1,
                SlaStatus::Out => sla.out += 1,
                SlaStatus::Unknown => {}
            }
        }

        let (Some(ms), Some(resolution)) = (
            resolution_ms(inc),
            parse_canonical(inc.resolution_ts.as_deref()),
        ) else {
            continue;
        };
        let res_idx = day_index(resolution);
        let from = occ_idx.max(0);
        let to = res_idx.min(last);
        for idx in from..=to {
            buckets[idx as usize].mttr.add_ms(ms);
        }
    }

    let points: Vec<TrendPoint> = buckets
        .into_iter()
        .enumerate()
        .map(|(i, b)| TrendPoint {
            date: first_date + Duration::days(i as i64),
            sla_percent: b.sla.percent(),
            mttr_minutes: b.mttr.minutes(),
            resolved_count: b.sla.resolved,
            within_sla_count: b.sla.within,
        })
        .collect();

    debug!(
        %first_date,
        %end_date,
        days = points.len(),
        incidents = incidents.len(),
        "built trend"
    );
    points
}
