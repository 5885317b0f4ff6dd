use pretty_assertions::assert_eq;
use time::macros::{date, datetime};
use time::UtcOffset;

use outage_core::aggregate::{aggregate, RegionSummary};
use outage_core::carry_over::detect_carry_over;
use outage_core::domain::{Incident, IncidentStatus, SlaStatus};
use outage_core::mttr::compute_mttr;
use outage_core::report::build_window_report;
use outage_core::sla::classify;
use outage_core::window::ReportWindow;

fn scenario() -> Vec<Incident> {
    vec![
        Incident::new("a", IncidentStatus::Resolved)
            .with_severity("CRITICAL")
            .with_region("North")
            .with_occurrence("2026-03-15T10:00:00Z")
            .with_resolution("2026-03-15T10:45:00Z"),
        Incident::new("b", IncidentStatus::InProgress)
            .with_severity("MAJOR")
            .with_region("North")
            .with_occurrence("2026-03-15T09:00:00Z"),
        Incident::new("c", IncidentStatus::Resolved)
            .with_severity("MINOR")
            .with_region("South")
            .with_occurrence("2026-03-15T08:00:00Z")
            .with_resolution("2026-03-15T08:50:00Z")
            .with_expected_resolution_hours(1.0),
    ]
}

#[test]
fn one_day_report_matches_expected_summaries_and_mttr() {
    let window = ReportWindow::day(date!(2026 - 03 - 15), UtcOffset::UTC).unwrap();
    let report = build_window_report(&scenario(), &window, datetime!(2026-03-15 18:00 UTC));

    let north = RegionSummary {
        region: "North".to_string(),
        total_tickets: 2,
        open_tickets: 0,
        in_progress_tickets: 1,
        resolved_tickets: 1,
        within_sla_tickets: 1,
        out_of_sla_tickets: 0,
        critical_count: 1,
        major_count: 1,
        minor_count: 0,
    };
    let south = RegionSummary {
        region: "South".to_string(),
        total_tickets: 1,
        open_tickets: 0,
        in_progress_tickets: 0,
        resolved_tickets: 1,
        within_sla_tickets: 1,
        out_of_sla_tickets: 0,
        critical_count: 0,
        major_count: 0,
        minor_count: 1,
    };
    assert_eq!(report.region_summaries, vec![north, south]);
    // round(mean(45, 50)) with half-up rounding.
    assert_eq!(report.mttr_minutes, 48);
    assert_eq!(report.ongoing_incidents.len(), 1);
    assert_eq!(report.resolved_incidents.len(), 2);
    assert!(report.carry_over_incidents.is_empty());
    assert_eq!(report.sla_compliance_percent(), 100);
    assert_eq!(report.root_cause_counts.len(), 1);
    assert_eq!(report.root_cause_counts[0].count, 2);
}

#[test]
fn stored_status_is_returned_unchanged() {
    for stored in [SlaStatus::Within, SlaStatus::Out, SlaStatus::Unknown] {
        for inc in scenario() {
            assert_eq!(classify(&inc.with_stored_sla_status(stored)), stored);
        }
    }
}

#[test]
fn resolution_exactly_at_mandatory_deadline_is_within() {
    let inc = Incident::new("x", IncidentStatus::Closed)
        .with_severity("CRITICAL")
        .with_occurrence("2026-03-15T00:00:00Z")
        .with_resolution("2026-03-15T05:00:00Z")
        .with_mandatory_restoration("2026-03-15T05:00:00Z");
    assert_eq!(classify(&inc), SlaStatus::Within);
}

#[test]
fn compute_mttr_of_nothing_is_zero() {
    assert_eq!(compute_mttr(&[] as &[Incident]), 0);
}

#[test]
fn carry_over_depends_on_status_and_resolution_time() {
    let window_start = datetime!(2026-03-16 00:00 UTC);
    let now = datetime!(2026-03-16 09:00 UTC);
    let in_progress = Incident::new("y", IncidentStatus::InProgress)
        .with_region("North")
        .with_occurrence("2026-03-15T00:00:00Z");
    let carried = detect_carry_over(&[in_progress.clone()], window_start, now);
    assert_eq!(carried.len(), 1);
    assert_eq!(carried[0].incident.id, "y");

    let resolved_early = Incident {
        status: IncidentStatus::Resolved,
        ..in_progress
    }
    .with_resolution("2026-03-15T12:00:00Z");
    assert!(detect_carry_over(&[resolved_early], window_start, now).is_empty());
}

#[test]
fn next_day_report_carries_the_in_progress_incident() {
    let window = ReportWindow::day(date!(2026 - 03 - 16), UtcOffset::UTC).unwrap();
    let report = build_window_report(&scenario(), &window, datetime!(2026-03-16 21:00 UTC));
    assert!(report.region_summaries.is_empty());
    assert_eq!(report.carry_over_incidents.len(), 1);
    assert_eq!(report.carry_over_incidents[0].incident.id, "b");
    // 09:00 on the 15th to 21:00 on the 16th is 1.5 days.
    assert_eq!(report.carry_over_incidents[0].duration_days, 2);
    assert_eq!(report.ongoing_incidents.len(), 1);
    assert_eq!(report.mttr_minutes, 0);
}

#[test]
fn hourly_window_only_sees_that_hour() {
    let window = ReportWindow::hour(date!(2026 - 03 - 15), 10, UtcOffset::UTC).unwrap();
    let summaries = aggregate(&scenario(), &window);
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].region, "North");
    assert_eq!(summaries[0].total_tickets, 1);
}
