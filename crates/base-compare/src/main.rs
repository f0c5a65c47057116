//! CLI entry point for the base comparison tool.

use anyhow::Result;
use base_compare::{
    AnalysisPipeline, AnalysisReport, CompareError, ComparatorConfig, Dataset, DatasetRole,
    IssueKind, KeyMode, QualityReport, ReportGenerator,
};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Historical vs. current base comparison",
    long_about = "Profiles two snapshots of a request register and compares them: null \
                  rates, inferred types, malformed dates, negative values, duplicates and \
                  month-over-month differences.\n\n\
                  EXAMPLES:\n  \
                  # Compare two ';'-delimited bases\n  \
                  base-compare --historical base_antiga.csv --current base_nova.csv\n\n  \
                  # Bucket by a month label column and export every table\n  \
                  base-compare --historical h.csv --current c.csv --month-column mes --export\n\n  \
                  # Machine-readable output\n  \
                  base-compare --historical h.csv --current c.csv --json | jq .comparison"
)]
struct Args {
    /// Path to the historical (prior) base
    #[arg(long)]
    historical: PathBuf,

    /// Path to the current (latest) base
    #[arg(long)]
    current: PathBuf,

    /// CSV field delimiter
    #[arg(short, long)]
    delimiter: Option<char>,

    /// JSON configuration file; command-line options override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Request number column
    #[arg(long)]
    request_column: Option<String>,

    /// Task identifier column
    #[arg(long)]
    task_column: Option<String>,

    /// Date column
    #[arg(long)]
    date_column: Option<String>,

    /// Month label column; when set, months come from this column instead of the date
    #[arg(long)]
    month_column: Option<String>,

    /// Numeric column that must not hold negative values (repeatable)
    ///
    /// If not specified, every numeric column except the key columns is checked
    #[arg(long = "non-negative")]
    non_negative: Vec<String>,

    /// Output directory for exported tables and reports
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export every non-empty result table as CSV
    #[arg(short, long)]
    export: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <current_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show warnings, errors and the summary)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    match run(&args) {
        Ok(()) => Ok(()),
        Err(e) => {
            if args.json {
                // Keep stdout machine-readable even on failure
                if let Some(compare_error) = e.downcast_ref::<CompareError>() {
                    let payload = serde_json::json!({ "error": compare_error });
                    println!("{}", serde_json::to_string_pretty(&payload)?);
                    std::process::exit(1);
                }
            } else {
                error!("{}", e);
            }
            Err(e)
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = build_config(args)?;

    let historical = Dataset::from_csv_path(DatasetRole::Historical, &args.historical, &config)?;
    let current = Dataset::from_csv_path(DatasetRole::Current, &args.current, &config)?;

    info!("{}", "=".repeat(80));
    info!("Starting base comparison...");
    info!("{}", "=".repeat(80));

    let pipeline = AnalysisPipeline::new(config.clone())?;
    let report = pipeline.run(&historical, &current)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let generator = ReportGenerator::new(&config.output_dir);

    if args.emit_report {
        let stem = extract_file_stem(&args.current);
        let report_path = generator.write_report_json(&report, &stem)?;
        info!("Report written to: {}", report_path.display());
    }

    let exported = if args.export {
        generator.export_tables(&report, &historical, &current)?
    } else {
        Vec::new()
    };

    print_human_readable_summary(&report, &exported);
    Ok(())
}

/// Merge the configuration file (if any) with command-line overrides.
///
/// Every failure is a [`CompareError`] so `--json` can report it.
fn build_config(args: &Args) -> base_compare::Result<ComparatorConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            ComparatorConfig::from_json_file(path)?
        }
        None => ComparatorConfig::default(),
    };

    if let Some(delimiter) = args.delimiter {
        if !delimiter.is_ascii() {
            return Err(CompareError::InvalidConfig(format!(
                "delimiter must be a single ASCII character: {:?}",
                delimiter
            )));
        }
        config.delimiter = delimiter as u8;
    }
    if let Some(ref column) = args.request_column {
        config.request_column = column.clone();
    }
    if let Some(ref column) = args.task_column {
        config.task_column = Some(column.clone());
    }
    if let Some(ref column) = args.date_column {
        config.date_column = Some(column.clone());
    }
    if let Some(ref column) = args.month_column {
        config.month_column = Some(column.clone());
    }
    if !args.non_negative.is_empty() {
        config.non_negative_columns = args.non_negative.clone();
    }
    if let Some(ref output) = args.output {
        config.output_dir = output.clone();
    }

    let config = config.normalized();
    config
        .validate()
        .map_err(|e| CompareError::InvalidConfig(e.to_string()))?;
    Ok(config)
}

/// Extract the file stem (name without extension) from a path.
fn extract_file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("comparison")
        .to_string()
}

/// Print a human-readable summary of the analysis.
///
/// Uses `println!` on purpose: this is the primary output and must show up
/// whatever the log level.
fn print_human_readable_summary(report: &AnalysisReport, exported: &[PathBuf]) {
    println!();
    println!("{}", "=".repeat(80));
    println!("BASE COMPARISON COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    for quality in [&report.historical, &report.current] {
        print_quality_section(quality);
    }

    println!("DUPLICATES");
    println!("{}", "-".repeat(40));
    for role in [DatasetRole::Historical, DatasetRole::Current] {
        let duplicates = report.duplicates(role);
        println!("  {}:", role.display_name());
        for mode in KeyMode::ALL {
            match duplicates.groups(mode) {
                Some(groups) => println!(
                    "    {:<28} {} groups, {} rows",
                    mode.display_name(),
                    groups.len(),
                    duplicates.duplicated_row_count(mode)
                ),
                None => println!("    {:<28} skipped (no task column)", mode.display_name()),
            }
        }
    }
    println!();

    let comparison = &report.comparison;
    println!("MONTHLY COMPARISON");
    println!("{}", "-".repeat(40));
    if comparison.months.is_empty() {
        println!("  No month present in both bases");
    } else {
        println!(
            "  {:<12} {:>10} {:>10} {:>10} {:>10}",
            "Month", "Hist rows", "Curr rows", "Missing", "New"
        );
        for month in &comparison.months {
            println!(
                "  {:<12} {:>10} {:>10} {:>10} {:>10}",
                month.month,
                month.historical_rows,
                month.current_rows,
                month.missing_in_current.len(),
                month.new_in_current.len()
            );
        }
    }
    for month in &comparison.new_months {
        println!(
            "  New month {}: {} requests ({} rows)",
            month.month,
            month.requests.len(),
            month.row_count
        );
    }
    for month in &comparison.dropped_months {
        println!(
            "  Dropped month {}: {} requests ({} rows)",
            month.month,
            month.requests.len(),
            month.row_count
        );
    }
    if !comparison.unbucketed.is_empty() {
        println!(
            "  {} rows left out of the comparison (missing/malformed date or request number)",
            comparison.unbucketed.len()
        );
    }
    println!();

    if !exported.is_empty() {
        println!("Exported Tables:");
        for path in exported {
            println!("  - {}", path.display());
        }
        println!();
    }

    println!("Duration: {}ms", report.duration_ms);
    println!("{}", "=".repeat(80));
}

fn print_quality_section(quality: &QualityReport) {
    println!(
        "{} ({} rows x {} columns)",
        quality.dataset, quality.row_count, quality.column_count
    );
    println!("{}", "-".repeat(40));
    println!(
        "  {:<30} {:<10} {:>8} {:>8}",
        "Column", "Type", "Null %", "Unique"
    );
    for column in &quality.columns {
        let name = if column.present {
            column.name.clone()
        } else {
            format!("{} (absent)", column.name)
        };
        println!(
            "  {:<30} {:<10} {:>7.1}% {:>8}",
            truncate_str(&name, 30),
            column.inferred_type.as_str(),
            column.null_percentage,
            column.unique_count
        );
    }

    let malformed = quality.flagged_count(IssueKind::MalformedDate);
    let negative = quality.flagged_count(IssueKind::NegativeValue);
    if malformed + negative == 0 {
        println!("  No data quality issues detected");
    } else {
        for issue in &quality.issues {
            println!(
                "  - [{}] {} (e.g. {})",
                issue.severity.as_str(),
                issue.description,
                issue.examples.join(", ")
            );
        }
    }
    println!();
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{}...", kept)
    }
}
