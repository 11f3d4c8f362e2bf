//! CLI entry point for the claims analytics toolkit.

use anyhow::{Result, anyhow};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use claims_analytics::{
    AnalysisConfig, HypothesisTestResult, MissingValueReport, OutlierReport, QuantileMethod,
    WinsorizationReport, ab_hypothesis_testing, find_missing_values, get_outlier_summary_with,
    hypothesis_test_difference_between_columns, load_data_with_config, winsorize_in_place,
};
use serde::Serialize;
use tracing::debug;

/// CLI-compatible quartile rule enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliQuantileMethod {
    /// Element at the floor of the rank position
    Lower,
    /// Element at the ceiling of the rank position
    Higher,
    /// Linear interpolation between neighbouring elements
    Linear,
    /// Closest element, halves to the even rank
    Nearest,
    /// Mean of the neighbouring elements
    Midpoint,
}

impl From<CliQuantileMethod> for QuantileMethod {
    fn from(cli: CliQuantileMethod) -> Self {
        match cli {
            CliQuantileMethod::Lower => QuantileMethod::Lower,
            CliQuantileMethod::Higher => QuantileMethod::Higher,
            CliQuantileMethod::Linear => QuantileMethod::Linear,
            CliQuantileMethod::Nearest => QuantileMethod::Nearest,
            CliQuantileMethod::Midpoint => QuantileMethod::Midpoint,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Data-quality checks and hypothesis tests for insurance claims data",
    long_about = "Inspect a delimited claims dataset for missing values and outliers, \
                  clip outliers to their IQR fences, and compare a metric across groups.\n\n\
                  EXAMPLES:\n  \
                  # Rank columns by missing values (reads docs/claims.txt)\n  \
                  claims-analytics missing claims.txt\n\n  \
                  # Outlier counts after declaring PostalCode categorical\n  \
                  claims-analytics --categorical PostalCode outliers claims.txt\n\n  \
                  # Do claims differ across provinces?\n  \
                  claims-analytics anova claims.txt --metric TotalClaims --group Province\n\n  \
                  # Do premiums differ between men and women?\n  \
                  claims-analytics ab-test claims.txt --feature Gender --value-a Male \
                  --value-b Female --metric TotalPremium"
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory the input file is resolved against (default: docs)
    #[arg(long, global = true)]
    data_dir: Option<String>,

    /// JSON configuration file; command-line flags override its values
    #[arg(long, global = true)]
    config: Option<String>,

    /// Field separator character (default: '|')
    #[arg(long, global = true)]
    separator: Option<char>,

    /// Declare a column categorical (repeatable)
    #[arg(long = "categorical", global = true)]
    categorical: Vec<String>,

    /// Quartile rule used for IQR fences
    #[arg(long, value_enum, global = true)]
    quantile_method: Option<CliQuantileMethod>,

    /// Output JSON to stdout instead of human-readable tables
    ///
    /// Disables all logs; only the JSON result is written.
    #[arg(long, global = true)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Suppress progress output (only show warnings and results)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(ClapArgs, Debug)]
struct Input {
    /// Data file name, resolved against the data directory
    file: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank columns by their share of missing values
    Missing(Input),

    /// Count IQR outliers in every numeric column
    Outliers(Input),

    /// Clip numeric columns to their IQR fences and report what changed
    Winsorize(Input),

    /// One-way ANOVA of a metric across every value of a group column
    Anova {
        #[command(flatten)]
        input: Input,

        /// Numeric column to compare
        #[arg(long)]
        metric: String,

        /// Column whose values define the groups
        #[arg(long)]
        group: String,
    },

    /// Welch's t-test of a metric between two values of a feature column
    AbTest {
        #[command(flatten)]
        input: Input,

        /// Column whose values define group A and group B
        #[arg(long)]
        feature: String,

        /// Feature value of group A
        #[arg(long)]
        value_a: String,

        /// Feature value of group B
        #[arg(long)]
        value_b: String,

        /// Numeric column to compare
        #[arg(long)]
        metric: String,
    },
}

impl Command {
    fn input(&self) -> &Input {
        match self {
            Command::Missing(input) | Command::Outliers(input) | Command::Winsorize(input) => input,
            Command::Anova { input, .. } | Command::AbTest { input, .. } => input,
        }
    }
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
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let config = build_config(&args)?;
    debug!("Effective configuration: {:?}", config);

    let mut data = load_data_with_config(&args.command.input().file, &config)?;

    match &args.command {
        Command::Missing(_) => {
            let report = find_missing_values(&data);
            emit(&args, &report, print_missing)
        }
        Command::Outliers(_) => {
            let report = get_outlier_summary_with(&data, config.quantile_method)?;
            emit(&args, &report, print_outliers)
        }
        Command::Winsorize(_) => {
            let clipped = winsorize_in_place(&mut data, config.quantile_method)?;
            let outliers_after = get_outlier_summary_with(&data, config.quantile_method)?;
            let report = WinsorizeOutput {
                rows: data.height(),
                clipped,
                outliers_after,
            };
            emit(&args, &report, print_winsorization)
        }
        Command::Anova { metric, group, .. } => {
            let result = hypothesis_test_difference_between_columns(&data, metric, group)?;
            emit(&args, &result, print_test_result)
        }
        Command::AbTest {
            feature,
            value_a,
            value_b,
            metric,
            ..
        } => {
            let result = ab_hypothesis_testing(&data, feature, value_a, value_b, metric)?;
            emit(&args, &result, print_test_result)
        }
    }
}

/// Clip report plus the outlier summary recomputed on the clipped data.
#[derive(Serialize)]
struct WinsorizeOutput {
    rows: usize,
    clipped: WinsorizationReport,
    outliers_after: OutlierReport,
}

/// Start from the config file (or defaults) and apply command-line overrides.
fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.into();
    }
    if let Some(sep) = args.separator {
        config.separator = u8::try_from(sep)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| anyhow!("Separator must be a single ASCII character, got {sep:?}"))?;
    }
    for column in &args.categorical {
        if !config.categorical_columns.contains(column) {
            config.categorical_columns.push(column.clone());
        }
    }
    if let Some(method) = args.quantile_method {
        config.quantile_method = method.into();
    }

    config.validate()?;
    Ok(config)
}

/// Write `value` as JSON or hand it to the human-readable printer.
///
/// Note: printers use `println!` intentionally; results are the primary
/// output and must show regardless of log level.
fn emit<T: Serialize>(args: &Args, value: &T, print: impl FnOnce(&T)) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        print(value);
    }
    Ok(())
}

fn print_missing(report: &MissingValueReport) {
    println!("\n{}", "=".repeat(70));
    println!("MISSING VALUES");
    println!("{}\n", "=".repeat(70));
    println!("{}", report.summary_line());

    if report.is_empty() {
        return;
    }

    println!();
    println!(
        "{:<30} {:<12} {:<10} {:<12}",
        "Column", "Missing", "Missing %", "Type"
    );
    println!("{}", "-".repeat(70));
    for entry in &report.entries {
        println!(
            "{:<30} {:<12} {:<10.1} {:<12}",
            truncate_str(&entry.column, 29),
            entry.missing_count,
            entry.missing_percentage,
            entry.kind
        );
    }
}

fn print_outliers(report: &OutlierReport) {
    println!("\n{}", "=".repeat(70));
    println!("OUTLIERS (1.5 x IQR)");
    println!("{}\n", "=".repeat(70));
    println!("{}", report.summary_line());

    let flagged: Vec<_> = report
        .entries
        .iter()
        .filter(|e| e.outlier_count > 0)
        .collect();
    if flagged.is_empty() {
        return;
    }

    println!();
    println!(
        "{:<30} {:<10} {:<14} {:<14}",
        "Column", "Outliers", "Lower bound", "Upper bound"
    );
    println!("{}", "-".repeat(70));
    for entry in flagged {
        let (lower, upper) = entry
            .fence
            .map(|f| (format!("{:.4}", f.lower), format!("{:.4}", f.upper)))
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
        println!(
            "{:<30} {:<10} {:<14} {:<14}",
            truncate_str(&entry.column, 29),
            entry.outlier_count,
            lower,
            upper
        );
    }
}

fn print_winsorization(output: &WinsorizeOutput) {
    let report = &output.clipped;
    println!("\n{}", "=".repeat(70));
    println!("WINSORIZATION");
    println!("{}\n", "=".repeat(70));
    println!(
        "Clipped {} values across {} numeric columns ({} rows kept).",
        report.total_clipped(),
        report.entries.len(),
        output.rows
    );

    let changed: Vec<_> = report.entries.iter().filter(|e| e.clipped() > 0).collect();
    if !changed.is_empty() {
        println!();
        println!(
            "{:<30} {:<10} {:<10} {:<20}",
            "Column", "Low", "High", "Clipped into"
        );
        println!("{}", "-".repeat(70));
        for entry in changed {
            let range = entry
                .fence
                .map(|f| format!("[{:.2}, {:.2}]", f.lower, f.upper))
                .unwrap_or_default();
            println!(
                "{:<30} {:<10} {:<10} {:<20}",
                truncate_str(&entry.column, 29),
                entry.clipped_low,
                entry.clipped_high,
                range
            );
        }
    }

    print_outliers(&output.outliers_after);
}

fn print_test_result(result: &HypothesisTestResult) {
    println!("\n{}", "=".repeat(70));
    println!("{}", result.test.display_name().to_uppercase());
    println!("{}\n", "=".repeat(70));
    println!("{result}");
}

fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
