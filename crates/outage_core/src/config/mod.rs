use std::path::Path;

use serde::{Deserialize, Serialize};
use time::UtcOffset;

use crate::domain::Severity;
use crate::error::{codes, AppError};

/// Default resolution durations per severity, used when an incident carries neither a
/// mandatory restoration deadline nor a positive expected-hours target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SlaPolicy {
    pub critical_hours: f64,
    pub major_hours: f64,
    pub minor_hours: f64,
    pub warning_hours: f64,
    pub info_hours: f64,
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self {
            critical_hours: 1.0,
            major_hours: 2.0,
            minor_hours: 4.0,
            warning_hours: 8.0,
            info_hours: 24.0,
        }
    }
}

impl SlaPolicy {
    pub fn hours_for(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical_hours,
            Severity::Major => self.major_hours,
            Severity::Minor => self.minor_hours,
            Severity::Warning => self.warning_hours,
            Severity::Info => self.info_hours,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        for severity in Severity::ALL {
            let hours = self.hours_for(severity);
            if !hours.is_finite() || hours <= 0.0 {
                return Err(AppError::new(
                    codes::CONFIG_INVALID,
                    format!("SLA hours for {} must be a positive number", severity.as_str()),
                )
                .with_details(format!("value={hours}")));
            }
        }
        Ok(())
    }
}

/// Report-wide settings: the SLA default table and the offset in which day and month
/// windows start at local midnight.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    pub sla_policy: SlaPolicy,
    pub utc_offset_minutes: i32,
}

impl ReportConfig {
    pub fn utc_offset(&self) -> Result<UtcOffset, AppError> {
        let secs = self.utc_offset_minutes.checked_mul(60).ok_or_else(|| {
            AppError::new(codes::CONFIG_INVALID, "utc_offset_minutes out of range")
                .with_details(format!("value={}", self.utc_offset_minutes))
        })?;
        UtcOffset::from_whole_seconds(secs).map_err(|e| {
            AppError::new(codes::CONFIG_INVALID, "utc_offset_minutes out of range")
                .with_details(format!("value={}; err={e}", self.utc_offset_minutes))
        })
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.sla_policy.validate()?;
        self.utc_offset()?;
        Ok(())
    }

    pub fn from_json_str(raw: &str) -> Result<Self, AppError> {
        let cfg: ReportConfig = serde_json::from_str(raw).map_err(|e| {
            AppError::new(codes::CONFIG_PARSE_FAILED, "Failed to parse report config JSON")
                .with_details(e.to_string())
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(codes::CONFIG_READ_FAILED, "Failed to read report config file")
                .with_details(format!("path={}; err={e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }
}

/// Validated settings handed to the report builders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportOptions {
    pub sla_policy: SlaPolicy,
    pub offset: UtcOffset,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            sla_policy: SlaPolicy::default(),
            offset: UtcOffset::UTC,
        }
    }
}

impl TryFrom<&ReportConfig> for ReportOptions {
    type Error = AppError;

    fn try_from(cfg: &ReportConfig) -> Result<Self, Self::Error> {
        cfg.sla_policy.validate()?;
        Ok(Self {
            sla_policy: cfg.sla_policy,
            offset: cfg.utc_offset()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_severity_table() {
        let p = SlaPolicy::default();
        assert_eq!(p.hours_for(Severity::Critical), 1.0);
        assert_eq!(p.hours_for(Severity::Major), 2.0);
        assert_eq!(p.hours_for(Severity::Minor), 4.0);
        assert_eq!(p.hours_for(Severity::Warning), 8.0);
        assert_eq!(p.hours_for(Severity::Info), 24.0);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg =
            ReportConfig::from_json_str(r#"{"sla_policy":{"major_hours":3},"utc_offset_minutes":60}"#)
                .unwrap();
        assert_eq!(cfg.sla_policy.major_hours, 3.0);
        assert_eq!(cfg.sla_policy.critical_hours, 1.0);
        assert_eq!(cfg.utc_offset().unwrap().whole_hours(), 1);
    }

    #[test]
    fn rejects_non_positive_hours() {
        let err = ReportConfig::from_json_str(r#"{"sla_policy":{"info_hours":0}}"#).unwrap_err();
        assert_eq!(err.code, codes::CONFIG_INVALID);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = ReportConfig::from_json_str(r#"{"timezone":"UTC"}"#).unwrap_err();
        assert_eq!(err.code, codes::CONFIG_PARSE_FAILED);
    }

    #[test]
    fn options_from_config() {
        let cfg = ReportConfig {
            utc_offset_minutes: -330,
            ..ReportConfig::default()
        };
        let opts = ReportOptions::try_from(&cfg).unwrap();
        assert_eq!(opts.offset.whole_minutes(), -330);
        assert_eq!(opts.sla_policy, SlaPolicy::default());
    }

    #[test]
    fn rejects_out_of_range_offset() {
        let err = ReportConfig::from_json_str(r#"{"utc_offset_minutes":100000}"#).unwrap_err();
        assert_eq!(err.code, codes::CONFIG_INVALID);
    }
}
