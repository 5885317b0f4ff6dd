use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

#[derive(Debug, Parser)]
#[command(
    name = "outage",
    version,
    about = "SLA compliance, MTTR and carry-over reports over an incident snapshot"
)]
pub struct Cli {
    /// Report config JSON: SLA hours per severity and the UTC offset for day boundaries.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Incident snapshot: a JSON array of API records or a CSV export.
    #[arg(long, short)]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    pub format: InputFormat,

    /// JSON file naming the CSV column for each incident field.
    #[arg(long)]
    pub csv_mapping: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// `.csv` files are read as CSV, everything else as JSON.
    Auto,
    Json,
    Csv,
}

#[derive(Debug, Clone, Subcommand)]
pub enum WindowArg {
    Hour {
        #[arg(long, value_parser = parse_date)]
        date: Date,
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
        hour: u8,
    },
    Day {
        #[arg(long, value_parser = parse_date)]
        date: Date,
    },
    Month {
        #[arg(long)]
        year: i32,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=12))]
        month: u8,
    },
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Window report: region summaries, carry-overs, root causes and MTTR.
    Report {
        #[command(flatten)]
        input: InputArgs,
        /// Reference instant for open carry-over durations (RFC3339). Defaults to now.
        #[arg(long, value_parser = parse_rfc3339)]
        now: Option<OffsetDateTime>,
        #[command(subcommand)]
        window: WindowArg,
    },
    /// Regions ranked by ticket count plus the severity distribution for a window.
    Regions {
        #[command(flatten)]
        input: InputArgs,
        #[command(subcommand)]
        window: WindowArg,
    },
    /// Daily SLA percentage and MTTR ending at a date.
    Trend {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_parser = parse_date)]
        end_date: Date,
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Region by day-of-month ticket counts.
    Matrix {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long)]
        year: i32,
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=12))]
        month: u8,
    },
    /// SLA outcome and deciding rule for every incident.
    Classify {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Data-quality warnings from import and per-incident validation.
    Validate {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print a deterministic synthetic snapshot as JSON.
    Demo {
        #[arg(long, value_parser = parse_date)]
        base_date: Date,
        #[arg(long, default_value_t = 200)]
        count: usize,
    },
}

fn parse_date(raw: &str) -> Result<Date, String> {
    Date::parse(raw.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn parse_rfc3339(raw: &str) -> Result<OffsetDateTime, String> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339).map_err(|e| format!("expected RFC3339: {e}"))
}
