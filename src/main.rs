//! CLI entry point for `salesmail`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use salesmail::config::{self, Config};
use salesmail::model::outcome::{AttachmentStatus, BatchSummary, ContainerStatus};
use salesmail::report::normalize::normalize_file;

/// Turn sales report spreadsheets attached to .eml files into clean CSV files.
#[derive(Parser)]
#[command(name = "salesmail", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (defaults to $SALESMAIL_CONFIG or the user config dir)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Process every .eml file in a directory (the default command)
    Run {
        /// Directory containing .eml files
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Directory receiving the CSV files
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Root directory for temporary attachment staging
        #[arg(long)]
        staging: Option<PathBuf>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save the spreadsheet attachments of one .eml file
    Extract {
        path: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Normalize one spreadsheet into a CSV file
    Convert {
        path: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Write the sheet as it is, named after the spreadsheet
        #[arg(long)]
        raw: bool,
    },
    /// Show what would be produced from one spreadsheet, without writing
    Inspect {
        path: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Write the current configuration to a file
    Config {
        /// Destination (defaults to the standard config location)
        #[arg(long)]
        init: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config(cli.config.as_deref());

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        None => cmd_run(&config, None, None, None, false),
        Some(Commands::Run {
            input,
            output,
            staging,
            json,
        }) => cmd_run(&config, input, output, staging, json),
        Some(Commands::Extract { path, output }) => cmd_extract(&config, &path, &output),
        Some(Commands::Convert { path, output, raw }) => {
            if raw {
                cmd_convert_raw(&config, &path, &output)
            } else {
                cmd_convert(&config, &path, &output)
            }
        }
        Some(Commands::Inspect { path, json }) => cmd_inspect(&config, &path, json),
        Some(Commands::Config { init }) => cmd_config(&config, init.as_deref()),
        Some(Commands::Completions { shell }) => cmd_completions(shell),
        Some(Commands::Manpage) => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "salesmail.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Batch-process a directory of .eml files.
fn cmd_run(
    config: &Config,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    staging: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let mut options = config.batch_options();
    if let Some(input) = input {
        options.input_dir = input;
    }
    if let Some(output) = output {
        options.output_dir = output;
    }
    if staging.is_some() {
        options.staging_dir = staging;
    }

    let containers = salesmail::batch::discover_containers(&options.input_dir)?;
    if containers.is_empty() && !json {
        println!("  No .eml files found in {}", options.input_dir.display());
        return Ok(());
    }

    if !json {
        println!(
            "  Found {} .eml file(s) in {}",
            containers.len(),
            options.input_dir.display()
        );
    }

    let pb = ProgressBar::new(containers.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Processing [{bar:40.cyan/blue}] {pos}/{len}")
            .expect("valid template")
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let summary = salesmail::batch::run_batch(&options, &|current, _total| {
        pb.set_position(current as u64);
    })?;
    pb.finish_and_clear();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary, start.elapsed());
    }
    Ok(())
}

/// Save the spreadsheet attachments of a single message.
fn cmd_extract(config: &Config, path: &Path, output: &Path) -> anyhow::Result<()> {
    use humansize::{format_size, BINARY};

    let extraction = salesmail::parser::eml::extract_from_file(path, &config.extract_options())?;
    for skipped in &extraction.skipped {
        println!("  Skipped '{}': {}", skipped.raw_filename, skipped.reason);
    }
    if extraction.is_empty() {
        println!("  No spreadsheet attachments found in {}", path.display());
        return Ok(());
    }

    let paths = salesmail::export::attachment::save_payloads(&extraction.payloads, output)?;
    for (payload, saved) in extraction.payloads.iter().zip(&paths) {
        println!(
            "  {:<40} {:>10}  -> {}",
            payload.filename,
            format_size(payload.size(), BINARY),
            saved.display()
        );
    }
    println!(
        "  Extracted {} spreadsheet(s) to {}",
        paths.len(),
        output.display()
    );
    Ok(())
}

/// Normalize one spreadsheet and write its CSV.
fn cmd_convert(config: &Config, path: &Path, output: &Path) -> anyhow::Result<()> {
    let report = normalize_file(path, &config.report_options())?;
    let written = salesmail::export::csv::save_report(&report, output, &config.csv_options())?;
    println!(
        "  {} -> {} ({} rows, {} columns)",
        path.display(),
        written.display(),
        report.table.row_count(),
        report.table.column_count()
    );
    Ok(())
}

/// Convert the first sheet (or the configured one) to CSV without normalizing.
fn cmd_convert_raw(config: &Config, path: &Path, output: &Path) -> anyhow::Result<()> {
    use salesmail::export::csv::{raw_csv_filename, save_table};

    let data = std::fs::read(path).map_err(|e| salesmail::SalesMailError::io(path, e))?;
    let table = salesmail::report::normalize::sheet_to_table(&data, config.report.sheet_index)?;
    let written = save_table(&table, output, &raw_csv_filename(path), &config.csv_options())?;
    println!(
        "  {} -> {} ({} rows, {} columns)",
        path.display(),
        written.display(),
        table.row_count(),
        table.column_count()
    );
    Ok(())
}

/// Print the detected period and table shape for one spreadsheet.
fn cmd_inspect(config: &Config, path: &Path, json: bool) -> anyhow::Result<()> {
    let report = normalize_file(path, &config.report_options())?;

    if json {
        let value = serde_json::json!({
            "file": path.to_string_lossy(),
            "title": report.title,
            "period_start": report.period.start_text,
            "period_end": report.period.end_text,
            "filename": report.filename,
            "columns": report.table.columns,
            "source_columns": report.source_columns,
            "rows": report.table.row_count(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!();
    println!("  {:<20} {}", "File", path.display());
    println!("  {:<20} {}", "Title", report.title);
    println!(
        "  {:<20} {} to {}",
        "Period", report.period.start_text, report.period.end_text
    );
    println!("  {:<20} {}", "Output name", report.filename);
    println!("  {:<20} {}", "Rows", report.table.row_count());
    println!("  {:<20} {}", "Columns", report.table.columns.join(", "));
    println!();
    Ok(())
}

/// Write the effective configuration to disk.
fn cmd_config(config: &Config, init: Option<&Path>) -> anyhow::Result<()> {
    let path = config::save_config(config, init)?;
    println!("  Wrote configuration to {}", path.display());
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "salesmail", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}

/// Print a batch summary as a human-readable listing.
fn print_summary(summary: &BatchSummary, elapsed: std::time::Duration) {
    println!();
    for container in &summary.containers {
        let name = container
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| container.source.display().to_string());
        println!("  {name}");

        match &container.status {
            ContainerStatus::Failed { kind, reason } => {
                println!("    failed ({kind}): {reason}");
            }
            ContainerStatus::NoSpreadsheets => println!("    no spreadsheet attachments"),
            ContainerStatus::Processed => {}
        }
        for skipped in &container.skipped {
            println!("    skipped '{}': {}", skipped.raw_filename, skipped.reason);
        }
        for attachment in &container.attachments {
            match &attachment.status {
                AttachmentStatus::Written {
                    path,
                    rows,
                    columns,
                } => println!(
                    "    {} -> {} ({rows} rows, {columns} columns)",
                    attachment.filename,
                    path.display()
                ),
                AttachmentStatus::Rejected { kind, reason } => {
                    println!("    {} rejected ({kind}): {reason}", attachment.filename)
                }
            }
        }
    }

    let outputs = summary.outputs();
    println!();
    println!("  Processing summary:");
    println!("  {:<20} {}", "Successful", summary.successful);
    println!("  {:<20} {}", "Failed", summary.failed);
    println!("  {:<20} {}", "CSV files written", outputs.len());
    println!("  {:<20} {}", "Output directory", summary.output_dir.display());
    println!("  {:<20} {:.2?}", "Elapsed", elapsed);
    println!();
}
