use std::fs;
use std::path::Path;

use serde::Serialize;
use time::{Month, OffsetDateTime};
use tracing::{info, warn};

use outage_core::aggregate::{
    aggregate_with_policy, rank_regions_by_tickets, severity_counts, RegionSummary, SeverityCount,
};
use outage_core::config::{ReportConfig, ReportOptions};
use outage_core::demo::demo_incidents;
use outage_core::domain::ValidationWarning;
use outage_core::error::{codes, AppError};
use outage_core::ingest::csv_records::{parse_incident_csv, IncidentCsvMapping};
use outage_core::ingest::json_records::parse_incident_records;
use outage_core::ingest::{ImportConflict, IncidentImport};
use outage_core::matrix::build_monthly_matrix_with_options;
use outage_core::report::{build_window_report_with_policy, WindowReport};
use outage_core::sla::{classify_detailed, SlaDecision};
use outage_core::trend::build_trend_with_options;
use outage_core::validate::{validate_all, IncidentValidationReportItem};
use outage_core::window::ReportWindow;

use crate::cli::{Cli, Command, InputArgs, InputFormat, WindowArg};

#[derive(Debug, Serialize)]
struct ReportOutput {
    #[serde(flatten)]
    report: WindowReport,
    total_tickets: i64,
    sla_compliance_percent: i64,
}

#[derive(Debug, Serialize)]
struct RegionsOutput {
    #[serde(with = "time::serde::rfc3339")]
    window_start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    window_end: OffsetDateTime,
    ranked_regions: Vec<RegionSummary>,
    severity_counts: Vec<SeverityCount>,
}

#[derive(Debug, Serialize)]
struct ClassifiedIncident {
    id: String,
    #[serde(flatten)]
    decision: SlaDecision,
}

#[derive(Debug, Serialize)]
struct ValidateOutput {
    skipped: usize,
    conflicts: Vec<ImportConflict>,
    import_warnings: Vec<ValidationWarning>,
    incidents: Vec<IncidentValidationReportItem>,
}

fn read_text(path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path).map_err(|e| {
        AppError::new(codes::INPUT_READ_FAILED, "Failed to read input file")
            .with_details(format!("path={}; err={e}", path.display()))
    })
}

fn load_options(config: Option<&Path>) -> Result<ReportOptions, AppError> {
    match config {
        Some(path) => {
            let cfg = ReportConfig::load(path)?;
            info!(path = %path.display(), offset_minutes = cfg.utc_offset_minutes, "loaded report config");
            ReportOptions::try_from(&cfg)
        }
        None => Ok(ReportOptions::default()),
    }
}

fn load_csv_mapping(path: Option<&Path>) -> Result<IncidentCsvMapping, AppError> {
    let Some(path) = path else {
        return Ok(IncidentCsvMapping::default());
    };
    serde_json::from_str(&read_text(path)?).map_err(|e| {
        AppError::new(codes::INGEST_CSV_MAPPING_INVALID, "Failed to parse CSV mapping JSON")
            .with_details(format!("path={}; err={e}", path.display()))
    })
}

fn is_csv(input: &InputArgs) -> bool {
    match input.format {
        InputFormat::Csv => true,
        InputFormat::Json => false,
        InputFormat::Auto => input
            .input
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv")),
    }
}

fn load_import(input: &InputArgs) -> Result<IncidentImport, AppError> {
    let text = read_text(&input.input)?;
    let import = if is_csv(input) {
        let mapping = load_csv_mapping(input.csv_mapping.as_deref())?;
        parse_incident_csv(&text, &mapping)?
    } else {
        parse_incident_records(&text)?
    };

    info!(
        path = %input.input.display(),
        incidents = import.incidents.len(),
        skipped = import.skipped,
        conflicts = import.conflicts.len(),
        warnings = import.warnings.len(),
        "loaded incident snapshot"
    );
    if import.skipped > 0 {
        warn!(skipped = import.skipped, "some records were skipped; run `validate` for details");
    }
    Ok(import)
}

fn month_arg(month: u8) -> Result<Month, AppError> {
    Month::try_from(month).map_err(|e| {
        AppError::new(codes::ARG_INVALID, "Month must be 1-12").with_details(e.to_string())
    })
}

fn resolve_window(arg: &WindowArg, options: &ReportOptions) -> Result<ReportWindow, AppError> {
    match *arg {
        WindowArg::Hour { date, hour } => ReportWindow::hour(date, hour, options.offset),
        WindowArg::Day { date } => ReportWindow::day(date, options.offset),
        WindowArg::Month { year, month } => ReportWindow::month(year, month_arg(month)?, options.offset),
    }
}

fn to_pretty<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value).map_err(|e| {
        AppError::new(codes::OUTPUT_WRITE_FAILED, "Failed to serialize output")
            .with_details(e.to_string())
    })
}

/// Run one command and return its JSON output.
pub fn run(cli: Cli) -> Result<String, AppError> {
    let options = load_options(cli.config.as_deref())?;

    match cli.command {
        Command::Report { input, now, window } => {
            let import = load_import(&input)?;
            let window = resolve_window(&window, &options)?;
            let now = now.unwrap_or_else(OffsetDateTime::now_utc);
            let report =
                build_window_report_with_policy(&import.incidents, &window, now, &options.sla_policy);
            to_pretty(&ReportOutput {
                total_tickets: report.total_tickets(),
                sla_compliance_percent: report.sla_compliance_percent(),
                report,
            })
        }
        Command::Regions { input, window } => {
            let import = load_import(&input)?;
            let window = resolve_window(&window, &options)?;
            let summaries = aggregate_with_policy(&import.incidents, &window, &options.sla_policy);
            to_pretty(&RegionsOutput {
                window_start: window.start,
                window_end: window.end,
                ranked_regions: rank_regions_by_tickets(&summaries),
                severity_counts: severity_counts(&import.incidents, &window),
            })
        }
        Command::Trend {
            input,
            end_date,
            days,
        } => {
            let import = load_import(&input)?;
            to_pretty(&build_trend_with_options(&import.incidents, end_date, days, &options))
        }
        Command::Matrix { input, year, month } => {
            let import = load_import(&input)?;
            let month = month_arg(month)?;
            to_pretty(&build_monthly_matrix_with_options(
                &import.incidents,
                year,
                month,
                &options,
            ))
        }
        Command::Classify { input } => {
            let import = load_import(&input)?;
            let rows: Vec<ClassifiedIncident> = import
                .incidents
                .iter()
                .map(|inc| ClassifiedIncident {
                    id: inc.id.clone(),
                    decision: classify_detailed(inc, &options.sla_policy),
                })
                .collect();
            to_pretty(&rows)
        }
        Command::Validate { input } => {
            let import = load_import(&input)?;
            to_pretty(&ValidateOutput {
                skipped: import.skipped,
                incidents: validate_all(&import.incidents),
                conflicts: import.conflicts,
                import_warnings: import.warnings,
            })
        }
        Command::Demo { base_date, count } => to_pretty(&demo_incidents(base_date, count)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use std::io::Write;

    const SNAPSHOT: &str = r#"[
      {"id": "a", "region": "North", "severity": "CRITICAL", "status": "Resolved",
       "occurrenceTime": "2026-03-15T10:00:00Z", "resolutionTime": "2026-03-15T10:45:00Z"},
      {"id": "b", "region": "North", "severity": "MAJOR", "status": "In Progress",
       "occurrenceTime": "2026-03-15T09:00:00Z"},
      {"id": "c", "region": "South", "severity": "MINOR", "status": "Resolved",
       "occurrenceTime": "2026-03-15T08:00:00Z", "resolutionTime": "2026-03-15T08:50:00Z",
       "expectedResolutionHours": 1}
    ]"#;

    fn snapshot_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();
        file
    }

    fn run_args(args: &[&str]) -> Result<Value, AppError> {
        let cli = Cli::try_parse_from(args).unwrap();
        run(cli).map(|out| serde_json::from_str(&out).unwrap())
    }

    #[test]
    fn day_report_outputs_summaries_and_mttr() {
        let file = snapshot_file();
        let path = file.path().to_str().unwrap();
        let out = run_args(&[
            "outage", "report", "-i", path, "--now", "2026-03-15T18:00:00Z", "day", "--date",
            "2026-03-15",
        ])
        .unwrap();
        assert_eq!(out["mttr_minutes"], 48);
        assert_eq!(out["total_tickets"], 3);
        assert_eq!(out["sla_compliance_percent"], 100);
        assert_eq!(out["region_summaries"][0]["region"], "North");
        assert_eq!(out["window_start"], "2026-03-15T00:00:00Z");
    }

    #[test]
    fn config_offset_moves_window_boundaries() {
        let file = snapshot_file();
        let mut cfg = tempfile::NamedTempFile::new().unwrap();
        cfg.write_all(br#"{"utc_offset_minutes": 600}"#).unwrap();
        let out = run_args(&[
            "outage",
            "--config",
            cfg.path().to_str().unwrap(),
            "regions",
            "-i",
            file.path().to_str().unwrap(),
            "day",
            "--date",
            "2026-03-15",
        ])
        .unwrap();
        // +10:00 local day 2026-03-15 ends at 14:00Z, so every incident is inside.
        assert_eq!(out["window_start"], "2026-03-15T00:00:00+10:00");
        assert_eq!(out["ranked_regions"][0]["region"], "North");
        assert_eq!(out["ranked_regions"][0]["total_tickets"], 2);
        assert_eq!(out["severity_counts"].as_array().unwrap().len(), 5);
    }

    #[test]
    fn classify_reports_deciding_rule() {
        let file = snapshot_file();
        let out = run_args(&["outage", "classify", "-i", file.path().to_str().unwrap()]).unwrap();
        assert_eq!(out[0]["id"], "a");
        assert_eq!(out[0]["status"], "within");
        assert_eq!(out[0]["basis"], "severity_default");
        assert_eq!(out[1]["basis"], "missing_timestamps");
        assert_eq!(out[2]["basis"], "expected_hours");
    }

    #[test]
    fn demo_output_feeds_back_as_input() {
        let demo = run_args(&["outage", "demo", "--base-date", "2026-01-01", "--count", "25"]).unwrap();
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(demo.to_string().as_bytes()).unwrap();
        let out = run_args(&[
            "outage", "matrix", "-i", file.path().to_str().unwrap(), "--year", "2026", "--month", "1",
        ])
        .unwrap();
        let total: i64 = out["values"]
            .as_object()
            .unwrap()
            .values()
            .flat_map(|row| row.as_array().unwrap().iter().map(|v| v.as_i64().unwrap()))
            .sum();
        assert_eq!(total, 25);
    }

    #[test]
    fn missing_input_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.json");
        let err = run_args(&["outage", "validate", "-i", missing.to_str().unwrap()]).unwrap_err();
        assert_eq!(err.code, codes::INPUT_READ_FAILED);
    }
}
