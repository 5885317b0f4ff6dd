use crate::domain::Incident;
use crate::normalize::timestamps::parse_canonical;

const MS_PER_MINUTE: i128 = 60_000;

/// Round `num / den` half-up (toward positive infinity on .5) using exact integer math.
/// `den` must be positive.
pub(crate) fn div_round_half_up(num: i128, den: i128) -> i128 {
    (2 * num + den).div_euclid(2 * den)
}

/// Resolution duration in milliseconds, when both timestamps parse and are ordered.
pub fn resolution_ms(incident: &Incident) -> Option<i128> {
    let occurrence = parse_canonical(incident.occurrence_ts.as_deref())?;
    let resolution = parse_canonical(incident.resolution_ts.as_deref())?;
    let ms = (resolution - occurrence).whole_milliseconds();
    (ms >= 0).then_some(ms)
}

/// Running sum of resolution durations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MttrAccumulator {
    total_ms: i128,
    count: i64,
}

impl MttrAccumulator {
    pub fn add_ms(&mut self, ms: i128) {
        self.total_ms += ms;
        self.count += 1;
    }

    pub fn add(&mut self, incident: &Incident) {
        if let Some(ms) = resolution_ms(incident) {
            self.add_ms(ms);
        }
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    /// Mean in whole minutes, rounded half-up; `0` when nothing was added.
    pub fn minutes(&self) -> i64 {
        if self.count == 0 {
            return 0;
        }
        div_round_half_up(self.total_ms, i128::from(self.count) * MS_PER_MINUTE) as i64
    }
}

/// Mean time to resolution in whole minutes over the given (resolved) incidents.
///
/// Incidents missing either timestamp, or whose resolution precedes occurrence, are not
/// eligible. With no eligible incidents the result is `0`.
pub fn compute_mttr<'a>(resolved: impl IntoIterator<Item = &'a Incident>) -> i64 {
    let mut acc = MttrAccumulator::default();
    for inc in resolved {
        acc.add(inc);
    }
    acc.minutes()
}
