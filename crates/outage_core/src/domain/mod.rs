use serde::{Deserialize, Serialize};

/// Region bucket for incidents that arrive without a usable region.
pub const UNKNOWN_REGION: &str = "Unknown";

/// Root-cause bucket for resolved incidents with no recorded cause.
pub const ROOT_CAUSE_NOT_SPECIFIED: &str = "Not specified";

/// Incident lifecycle state as reported by the ticketing side.
///
/// The core never transitions an incident; `Open -> In Progress -> Resolved -> Closed`
/// (with `Open -> Resolved` allowed) is owned by the remote system.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IncidentStatus {
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Closed,
}

impl IncidentStatus {
    /// Case-insensitive; accepts the spacing variants seen in exports
    /// (`In Progress`, `in_progress`, `in-progress`, `InProgress`).
    pub fn from_label(raw: &str) -> Option<Self> {
        let key: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "open" => Some(Self::Open),
            "inprogress" => Some(Self::InProgress),
            "resolved" => Some(Self::Resolved),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::InProgress => "In Progress",
            Self::Resolved => "Resolved",
            Self::Closed => "Closed",
        }
    }

    /// Resolved or Closed: terminal for reporting purposes.
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }

    pub fn is_ongoing(self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SlaStatus {
    Within,
    Out,
    Unknown,
}

impl SlaStatus {
    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "within" | "within sla" => Some(Self::Within),
            "out" | "out of sla" => Some(Self::Out),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Critical,
    Major,
    Minor,
    Warning,
    Info,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::Major,
        Severity::Minor,
        Severity::Warning,
        Severity::Info,
    ];

    pub fn from_label(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "CRITICAL" => Some(Self::Critical),
            "MAJOR" => Some(Self::Major),
            "MINOR" => Some(Self::Minor),
            "WARNING" => Some(Self::Warning),
            "INFO" => Some(Self::Info),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "CRITICAL",
            Self::Major => "MAJOR",
            Self::Minor => "MINOR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

/// Canonical incident snapshot consumed by the compliance and reporting computations.
///
/// Notes:
/// - Canonical timestamps are nullable RFC3339 UTC strings, populated by the ingest adapter.
/// - When an input timestamp could not be canonicalised, the original value is kept in
///   `*_ts_raw` and the canonical field stays `None`; computations treat it as missing.
/// - `stored_sla_status`, when present, is authoritative and bypasses classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Incident {
    pub id: String,
    pub site_number: Option<String>,
    pub site_code: Option<String>,
    pub region: Option<String>,
    pub severity: Option<String>,
    pub status: IncidentStatus,
    pub root_cause: Option<String>,
    pub expected_resolution_hours: Option<f64>,
    pub stored_sla_status: Option<SlaStatus>,

    pub occurrence_ts: Option<String>,
    pub resolution_ts: Option<String>,
    pub mandatory_restoration_ts: Option<String>,
    pub expected_restoration_ts: Option<String>,

    pub occurrence_ts_raw: Option<String>,
    pub resolution_ts_raw: Option<String>,
    pub mandatory_restoration_ts_raw: Option<String>,
    pub expected_restoration_ts_raw: Option<String>,
}

impl Incident {
    pub fn new(id: impl Into<String>, status: IncidentStatus) -> Self {
        Self {
            id: id.into(),
            site_number: None,
            site_code: None,
            region: None,
            severity: None,
            status,
            root_cause: None,
            expected_resolution_hours: None,
            stored_sla_status: None,
            occurrence_ts: None,
            resolution_ts: None,
            mandatory_restoration_ts: None,
            expected_restoration_ts: None,
            occurrence_ts_raw: None,
            resolution_ts_raw: None,
            mandatory_restoration_ts_raw: None,
            expected_restoration_ts_raw: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    pub fn with_occurrence(mut self, ts: impl Into<String>) -> Self {
        self.occurrence_ts = Some(ts.into());
        self
    }

    pub fn with_resolution(mut self, ts: impl Into<String>) -> Self {
        self.resolution_ts = Some(ts.into());
        self
    }

    pub fn with_mandatory_restoration(mut self, ts: impl Into<String>) -> Self {
        self.mandatory_restoration_ts = Some(ts.into());
        self
    }

    pub fn with_expected_resolution_hours(mut self, hours: f64) -> Self {
        self.expected_resolution_hours = Some(hours);
        self
    }

    pub fn with_root_cause(mut self, cause: impl Into<String>) -> Self {
        self.root_cause = Some(cause.into());
        self
    }

    pub fn with_stored_sla_status(mut self, status: SlaStatus) -> Self {
        self.stored_sla_status = Some(status);
        self
    }

    /// Grouping key for per-region aggregation.
    pub fn region_key(&self) -> String {
        match self.region.as_deref().map(str::trim) {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => UNKNOWN_REGION.to_string(),
        }
    }

    /// Severity bucket; missing or unrecognised labels fall into `Info`.
    pub fn severity_level(&self) -> Severity {
        self.severity
            .as_deref()
            .and_then(Severity::from_label)
            .unwrap_or(Severity::Info)
    }

    pub fn root_cause_key(&self) -> String {
        match self.root_cause.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => ROOT_CAUSE_NOT_SPECIFIED.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationWarning {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl ValidationWarning {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_are_lenient_about_spacing_and_case() {
        assert_eq!(
            IncidentStatus::from_label("in progress"),
            Some(IncidentStatus::InProgress)
        );
        assert_eq!(
            IncidentStatus::from_label("IN_PROGRESS"),
            Some(IncidentStatus::InProgress)
        );
        assert_eq!(IncidentStatus::from_label(" Closed "), Some(IncidentStatus::Closed));
        assert_eq!(IncidentStatus::from_label("pending"), None);
    }

    #[test]
    fn status_serializes_with_display_names() {
        let json = serde_json::to_string(&IncidentStatus::InProgress).unwrap();
        assert_eq!(json, "\"In Progress\"");
    }

    #[test]
    fn unknown_severity_falls_into_info_bucket() {
        let inc = Incident::new("1", IncidentStatus::Open).with_severity("catastrophic");
        assert_eq!(inc.severity_level(), Severity::Info);
        let inc = Incident::new("2", IncidentStatus::Open).with_severity("critical");
        assert_eq!(inc.severity_level(), Severity::Critical);
        let inc = Incident::new("3", IncidentStatus::Open);
        assert_eq!(inc.severity_level(), Severity::Info);
    }

    #[test]
    fn blank_region_and_root_cause_use_fallback_buckets() {
        let inc = Incident::new("1", IncidentStatus::Resolved)
            .with_region("  ")
            .with_root_cause("");
        assert_eq!(inc.region_key(), UNKNOWN_REGION);
        assert_eq!(inc.root_cause_key(), ROOT_CAUSE_NOT_SPECIFIED);
    }

    #[test]
    fn sla_status_labels() {
        assert_eq!(SlaStatus::from_label("Within SLA"), Some(SlaStatus::Within));
        assert_eq!(SlaStatus::from_label("out_of_sla"), Some(SlaStatus::Out));
        assert_eq!(SlaStatus::from_label("late"), None);
    }
}
