use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Month;
use tracing::{debug, warn};

use crate::config::ReportOptions;
use crate::domain::Incident;
use crate::normalize::timestamps::parse_canonical;
use crate::window::{first_of_month, local_date};

/// Region × day-of-month ticket counts for one calendar month.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthlyMatrix {
    pub year: i32,
    pub month: u8,
    pub days: u8,
    /// Every region observed in the month, sorted.
    pub regions: Vec<String>,
    /// `values[region][day - 1]` is the ticket count for that day.
    pub values: BTreeMap<String, Vec<i64>>,
}

impl MonthlyMatrix {
    /// Row normalised by its own maximum, for per-region intensity. An all-zero or
    /// unknown row yields zeros.
    pub fn row_intensity(&self, region: &str) -> Vec<f64> {
        let Some(row) = self.values.get(region) else {
            return vec![0.0; usize::from(self.days)];
        };
        let max = row.iter().copied().max().unwrap_or(0);
        if max <= 0 {
            return vec![0.0; row.len()];
        }
        row.iter().map(|v| *v as f64 / max as f64).collect()
    }

    pub fn region_total(&self, region: &str) -> i64 {
        self.values.get(region).map(|r| r.iter().sum()).unwrap_or(0)
    }
}

pub fn build_monthly_matrix(incidents: &[Incident], year: i32, month: Month) -> MonthlyMatrix {
    build_monthly_matrix_with_options(incidents, year, month, &ReportOptions::default())
}

/// Single pass over the incidents: each occurrence lands in its local calendar day and
/// region. Equivalent to running the region aggregator once per day of the month and
/// recording each region's total.
pub fn build_monthly_matrix_with_options(
    incidents: &[Incident],
    year: i32,
    month: Month,
    options: &ReportOptions,
) -> MonthlyMatrix {
    let days = time::util::days_in_year_month(year, month);
    let mut matrix = MonthlyMatrix {
        year,
        month: month as u8,
        days,
        regions: Vec::new(),
        values: BTreeMap::new(),
    };

    if let Err(e) = first_of_month(year, month) {
        warn!(error = %e, "monthly matrix requested for unrepresentable month");
        return matrix;
    }

    for inc in incidents {
        let Some(occurrence) = parse_canonical(inc.occurrence_ts.as_deref()) else {
            continue;
        };
        let Some(date) = local_date(occurrence, options.offset) else {
            debug!(id = %inc.id, "occurrence has no local date in the configured offset; skipped");
            continue;
        };
        if date.year() != year || date.month() != month {
            continue;
        }
        let row = matrix
            .values
            .entry(inc.region_key())
            .or_insert_with(|| vec![0; usize::from(days)]);
        row[usize::from(date.day()) - 1] += 1;
    }

    matrix.regions = matrix.values.keys().cloned().collect();
    debug!(
        year,
        month = matrix.month,
        regions = matrix.regions.len(),
        "built monthly matrix"
    );
    matrix
}
