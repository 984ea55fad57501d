//! Command-line interface for the biosensor pipeline.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::{ColumnConfig, Delimiter, MetadataConfig};
use crate::core::series::{Baseline, IntervalId, SensorSeries};
use crate::processors::prompt::{self, Prompter};
use crate::visualization::PlotSummary;
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "biosense-pipeline")]
#[command(about = "Biosensor measurement processing pipeline", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert raw instrument output to CSV
    Convert {
        /// Raw input file or directory
        input: PathBuf,
        /// Output CSV file or directory (defaults next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Process entire directory (batch mode)
        #[arg(long)]
        batch: bool,
        /// Delimiter of the raw input
        #[arg(long, value_enum, ignore_case = true)]
        delimiter: Option<Delimiter>,
        /// Number of preamble lines to drop before the header row
        #[arg(long)]
        skip_rows: Option<usize>,
    },

    /// Write a JSON metadata sidecar for a measurement CSV
    Metadata {
        /// Directory containing the CSV file
        input_dir: PathBuf,
        /// CSV file name inside the input directory
        file: String,
        /// Output directory for the sidecar (defaults to the input directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Name of the connected Origin (.opj) file
        #[arg(long)]
        origin_file_id: Option<String>,
        /// Short file id
        #[arg(long)]
        short_file_id: Option<String>,
        /// Number of injections
        #[arg(long)]
        injections: Option<String>,
        /// Number of rounds
        #[arg(long)]
        rounds: Option<String>,
        /// Acquisition date (YYYY-MM-DD), overrides the file name
        #[arg(long)]
        date: Option<String>,
        /// Create the output directory if it is missing
        #[arg(long)]
        create_output_dir: bool,
        /// Ask for the metadata fields on the terminal
        #[arg(short, long)]
        interactive: bool,
    },

    /// Plot all sensors over time (PNG)
    Plot {
        /// Measurement CSV file
        csv_file: PathBuf,
        /// Output PNG file path (defaults to same name as CSV with .png extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Baseline policy for the traces
        #[arg(long, value_enum, ignore_case = true)]
        baseline: Option<Baseline>,
    },

    /// Plot all sensors of one injection interval (PNG)
    PlotInterval {
        /// Measurement CSV file
        csv_file: PathBuf,
        /// Injection interval id
        interval: String,
        /// Output PNG file path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Baseline policy for the traces
        #[arg(long, value_enum, ignore_case = true)]
        baseline: Option<Baseline>,
    },

    /// Overlay one sensor across all injection intervals (PNG)
    PlotSensor {
        /// Measurement CSV file
        csv_file: PathBuf,
        /// Sensor column name
        sensor: String,
        /// Output PNG file path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Baseline policy for the traces
        #[arg(long, value_enum, ignore_case = true)]
        baseline: Option<Baseline>,
    },

    /// Print injection intervals and sample-category regions of a CSV
    Inspect {
        /// Measurement CSV file
        csv_file: PathBuf,
        /// Also write every injection interval to its own CSV in this directory
        #[arg(long)]
        split: Option<PathBuf>,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            format!("{}...", value.chars().take(36).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

fn print_legend(summary: &PlotSummary) {
    if summary.regions.is_empty() {
        return;
    }
    println!("Legend:");
    for entry in &summary.legend {
        let (r, g, b, a) = entry.color;
        println!("  {:<20} rgba({}, {}, {}, {})", entry.label, r, g, b, a);
    }
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    // Dispatch to subcommands
    match cli.command {
        Commands::Convert { input, output, batch, delimiter, skip_rows } => {
            cmd_convert(&input, output, batch, delimiter, skip_rows, &config);
        }
        Commands::Metadata {
            input_dir,
            file,
            output_dir,
            origin_file_id,
            short_file_id,
            injections,
            rounds,
            date,
            create_output_dir,
            interactive,
        } => {
            let overrides = MetadataOverrides {
                origin_file_id,
                short_file_id,
                injections,
                rounds,
                date,
                create_output_dir,
            };
            cmd_metadata(&input_dir, &file, output_dir, overrides, interactive, &config);
        }
        Commands::Plot { csv_file, output, baseline } => {
            cmd_plot(&csv_file, output, baseline.unwrap_or(config.plot.baseline), &config);
        }
        Commands::PlotInterval { csv_file, interval, output, baseline } => {
            cmd_plot_interval(
                &csv_file,
                &IntervalId::parse(&interval),
                output,
                baseline.unwrap_or(config.plot.baseline),
                &config,
            );
        }
        Commands::PlotSensor { csv_file, sensor, output, baseline } => {
            cmd_plot_sensor(
                &csv_file,
                &sensor,
                output,
                baseline.unwrap_or(config.plot.sensor_baseline),
                &config,
            );
        }
        Commands::Inspect { csv_file, split } => {
            cmd_inspect(&csv_file, split.as_deref(), &config);
        }
    }
}

fn cmd_convert(
    input: &Path,
    output: Option<PathBuf>,
    batch: bool,
    delimiter: Option<Delimiter>,
    skip_rows: Option<usize>,
    config: &PipelineConfig,
) {
    use crate::processors::conversion;

    let start = Instant::now();

    let mut conversion_config = config.conversion.clone();
    if let Some(d) = delimiter {
        conversion_config.delimiter = d;
    }
    if let Some(n) = skip_rows {
        conversion_config.skip_rows = n;
    }

    if batch {
        let output_dir = output.unwrap_or_else(|| input.to_path_buf());

        println!("Converting raw files in batch mode...");
        println!("Input directory: {}", input.display());
        println!("Output directory: {}", output_dir.display());

        let spinner = create_spinner("Converting raw files...");

        match conversion::convert_directory(input, &output_dir, &conversion_config) {
            Ok(summary) => {
                spinner.finish_and_clear();

                for (src, reason) in &summary.failed {
                    println!("  FAILED {}: {}", src.display(), reason);
                }

                print_summary(
                    "Batch Conversion Complete",
                    &[
                        ("Input directory", input.display().to_string()),
                        ("Output directory", output_dir.display().to_string()),
                        ("Files converted", summary.converted.len().to_string()),
                        ("Files failed", summary.failed.len().to_string()),
                        ("Rows written", summary.total_rows().to_string()),
                        ("Duration", format!("{:.2?}", start.elapsed())),
                    ],
                );
            }
            Err(e) => {
                spinner.finish_and_clear();
                error!("Batch conversion failed: {:#}", e);
                std::process::exit(1);
            }
        }
    } else {
        let output_path = output.unwrap_or_else(|| conversion::default_output_path(input));

        println!("Converting single file...");
        println!("Input: {}", input.display());
        println!("Output: {}", output_path.display());

        let spinner = create_spinner("Converting to CSV...");

        match conversion::convert_raw_file(input, &output_path, &conversion_config) {
            Ok(rows) => {
                spinner.finish_and_clear();

                print_summary(
                    "Conversion Complete",
                    &[
                        ("Input file", input.display().to_string()),
                        ("Output file", output_path.display().to_string()),
                        ("Rows written", rows.to_string()),
                        ("Duration", format!("{:.2?}", start.elapsed())),
                    ],
                );
            }
            Err(e) => {
                spinner.finish_and_clear();
                error!("Conversion failed: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

/// Metadata fields given on the command line; they win over config and prompts.
struct MetadataOverrides {
    origin_file_id: Option<String>,
    short_file_id: Option<String>,
    injections: Option<String>,
    rounds: Option<String>,
    date: Option<String>,
    create_output_dir: bool,
}

impl MetadataOverrides {
    fn apply(self, mut config: MetadataConfig) -> MetadataConfig {
        if let Some(v) = self.origin_file_id {
            config.origin_file_id = v;
        }
        if let Some(v) = self.short_file_id {
            config.short_file_id = v;
        }
        if let Some(v) = self.injections {
            config.injections = v;
        }
        if let Some(v) = self.rounds {
            config.rounds = v;
        }
        if self.date.is_some() {
            config.manual_date = self.date;
        }
        config.create_output_dir |= self.create_output_dir;
        config
    }
}

/// Ask for the metadata fields, then apply command-line overrides.
///
/// The date and output-directory questions are only asked when neither the
/// config nor a flag already answers them.
fn prompt_metadata<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    defaults: MetadataConfig,
    overrides: MetadataOverrides,
    file: &str,
    output_dir: &Path,
) -> std::io::Result<MetadataConfig> {
    let answered = prompt::prompt_metadata_config(prompter, defaults)?;
    let mut config = overrides.apply(answered);

    if config.manual_date.is_none() {
        config.manual_date = prompt::prompt_date_fallback(prompter, file)?;
    }
    if !config.create_output_dir {
        config.create_output_dir = prompt::prompt_create_output_dir(prompter, output_dir)?;
    }

    Ok(config)
}

fn cmd_metadata(
    input_dir: &Path,
    file: &str,
    output_dir: Option<PathBuf>,
    overrides: MetadataOverrides,
    interactive: bool,
    config: &PipelineConfig,
) {
    use crate::processors::metadata;

    let start = Instant::now();
    let output_dir = output_dir.unwrap_or_else(|| input_dir.to_path_buf());

    let metadata_config = if interactive {
        let mut prompter = Prompter::stdio();
        match prompt_metadata(&mut prompter, config.metadata.clone(), overrides, file, &output_dir) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("Failed to read input: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        overrides.apply(config.metadata.clone())
    };

    println!("Generating metadata...");
    println!("Input: {}", input_dir.join(file).display());
    println!("Output directory: {}", output_dir.display());

    match metadata::generate_metadata(input_dir, &output_dir, file, &metadata_config, &config.columns) {
        Ok((json_path, written)) => {
            print_summary(
                "Metadata Complete",
                &[
                    ("Input file", file.to_string()),
                    ("Sidecar", json_path.display().to_string()),
                    ("Date", written.date),
                    ("Columns", format!("{} x {}", written.width, written.height)),
                    ("Injections", written.injections),
                    ("Rounds", written.rounds),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            error!("Metadata generation failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_or_exit(csv_file: &Path, columns: &ColumnConfig) -> SensorSeries {
    use crate::core::loaders;

    match loaders::load_series(csv_file, columns) {
        Ok(series) => series,
        Err(e) => {
            error!("Failed to load {}: {}", csv_file.display(), e);
            std::process::exit(1);
        }
    }
}

/// `<stem>_<suffix>.<extension>` for the CSV, with unsafe characters replaced.
fn derived_file_name(csv_file: &Path, suffix: &str, extension: &str) -> String {
    let stem = csv_file.file_stem().unwrap_or_default().to_string_lossy();
    let suffix: String = suffix
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{}_{}.{}", stem, suffix, extension)
}

/// PNG path next to the CSV.
fn derived_png_path(csv_file: &Path, suffix: &str) -> PathBuf {
    csv_file.with_file_name(derived_file_name(csv_file, suffix, "png"))
}

fn finish_plot(
    result: crate::visualization::Result<PlotSummary>,
    spinner: ProgressBar,
    csv_file: &Path,
    output_path: &Path,
    baseline: Baseline,
    start: Instant,
) {
    match result {
        Ok(summary) => {
            spinner.finish_and_clear();

            print_summary(
                "Plot Complete",
                &[
                    ("Input file", csv_file.display().to_string()),
                    ("Output PNG", output_path.display().to_string()),
                    ("Title", summary.title.clone()),
                    ("Baseline", baseline.to_string()),
                    ("Traces", summary.traces.to_string()),
                    ("Regions", summary.regions.len().to_string()),
                    ("Interval markers", summary.markers.to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
            print_legend(&summary);
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Plotting failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_plot(csv_file: &Path, output: Option<PathBuf>, baseline: Baseline, config: &PipelineConfig) {
    use crate::visualization;

    let start = Instant::now();
    let output_path = output.unwrap_or_else(|| csv_file.with_extension("png"));

    let spinner = create_spinner("Loading CSV file...");
    let series = load_or_exit(csv_file, &config.columns);

    spinner.set_message("Generating plot...");
    let result = visualization::plot_series(&output_path, &series, baseline, &config.plot);

    finish_plot(result, spinner, csv_file, &output_path, baseline, start);
}

fn cmd_plot_interval(
    csv_file: &Path,
    interval: &IntervalId,
    output: Option<PathBuf>,
    baseline: Baseline,
    config: &PipelineConfig,
) {
    use crate::visualization;

    let start = Instant::now();
    let output_path =
        output.unwrap_or_else(|| derived_png_path(csv_file, &format!("inj{}", interval)));

    let spinner = create_spinner("Loading CSV file...");
    let series = load_or_exit(csv_file, &config.columns);

    spinner.set_message(format!("Plotting injection interval {}...", interval));
    let result =
        visualization::plot_interval(&output_path, &series, interval, baseline, &config.plot);

    finish_plot(result, spinner, csv_file, &output_path, baseline, start);
}

fn cmd_plot_sensor(
    csv_file: &Path,
    sensor: &str,
    output: Option<PathBuf>,
    baseline: Baseline,
    config: &PipelineConfig,
) {
    use crate::visualization;

    let start = Instant::now();
    let output_path = output.unwrap_or_else(|| derived_png_path(csv_file, sensor));

    let spinner = create_spinner("Loading CSV file...");
    let series = load_or_exit(csv_file, &config.columns);

    spinner.set_message(format!("Plotting {} per interval...", sensor));
    let result =
        visualization::plot_sensor_by_interval(&output_path, &series, sensor, baseline, &config.plot);

    finish_plot(result, spinner, csv_file, &output_path, baseline, start);
}

/// Net change of every sensor over each interval (last minus first sample).
fn interval_deltas(series: &SensorSeries) -> Vec<(IntervalId, Vec<(String, f64)>)> {
    use crate::core::transforms;

    transforms::normalize_per_interval(series, Baseline::Start)
        .into_iter()
        .map(|(id, traces)| {
            let deltas = traces
                .into_iter()
                .map(|t| {
                    let delta = t.y.last().copied().unwrap_or(f64::NAN);
                    (t.name, delta)
                })
                .collect();
            (id, deltas)
        })
        .collect()
}

/// Write each interval as `<stem>_inj<id>.csv` into `dir`.
fn split_intervals(
    series: &SensorSeries,
    csv_file: &Path,
    dir: &Path,
    columns: &ColumnConfig,
) -> crate::core::writers::Result<Vec<PathBuf>> {
    use crate::core::{transforms, writers};

    let mut written = Vec::new();
    for (id, group) in transforms::group_by_interval(series) {
        let path = dir.join(derived_file_name(csv_file, &format!("inj{}", id), "csv"));
        writers::write_series_csv(&path, &group, columns)?;
        written.push(path);
    }
    Ok(written)
}

fn cmd_inspect(csv_file: &Path, split: Option<&Path>, config: &PipelineConfig) {
    use crate::core::transforms;

    let start = Instant::now();
    let series = load_or_exit(csv_file, &config.columns);

    let groups = transforms::group_by_interval(&series);
    let regions = transforms::derive_regions(&series);

    println!("Injection intervals:");
    for (id, group) in &groups {
        let (first, last) = match (group.time().first(), group.time().last()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => continue,
        };
        println!("  {:<8} {:>6} rows  [{} s .. {} s]", id.to_string(), group.len(), first, last);
    }

    println!("Net change per interval:");
    for (id, deltas) in interval_deltas(&series) {
        let cells: Vec<String> = deltas
            .iter()
            .map(|(name, delta)| format!("{}={:+.3}", name, delta))
            .collect();
        println!("  {:<8} {}", id.to_string(), cells.join("  "));
    }

    println!("Sample regions:");
    for region in &regions {
        let marker = if region.category.is_known() { "" } else { "  (unknown code)" };
        println!(
            "  {:<20} {} s .. {} s{}",
            region.category.label(),
            region.start_time,
            region.end_time,
            marker
        );
    }

    let mut items = vec![
        ("Input file", csv_file.display().to_string()),
        ("Rows", series.len().to_string()),
        ("Sensors", series.sensor_names().join(", ")),
        ("Intervals", groups.len().to_string()),
        ("Regions", regions.len().to_string()),
    ];

    if let Some(dir) = split {
        match split_intervals(&series, csv_file, dir, &config.columns) {
            Ok(paths) => items.push(("Interval files", paths.len().to_string())),
            Err(e) => {
                error!("Failed to split intervals: {}", e);
                std::process::exit(1);
            }
        }
    }

    items.push(("Duration", format!("{:.2?}", start.elapsed())));
    print_summary("Inspect Complete", &items);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_plot_sensor() {
        let cli = Cli::try_parse_from([
            "biosense-pipeline",
            "-vv",
            "plot-sensor",
            "data.csv",
            "S3",
            "--baseline",
            "end",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::PlotSensor { sensor, baseline, output, .. } => {
                assert_eq!(sensor, "S3");
                assert_eq!(baseline, Some(Baseline::End));
                assert!(output.is_none());
            }
            _ => panic!("expected plot-sensor"),
        }
    }

    #[test]
    fn test_cli_parses_convert_delimiter() {
        let cli = Cli::try_parse_from([
            "biosense-pipeline",
            "convert",
            "raw",
            "--batch",
            "--delimiter",
            "semicolon",
        ])
        .unwrap();

        match cli.command {
            Commands::Convert { batch, delimiter, .. } => {
                assert!(batch);
                assert_eq!(delimiter, Some(Delimiter::Semicolon));
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_metadata_overrides_win() {
        let base = MetadataConfig {
            injections: "3".to_string(),
            rounds: "1".to_string(),
            ..MetadataConfig::default()
        };
        let overrides = MetadataOverrides {
            origin_file_id: None,
            short_file_id: Some("K1".to_string()),
            injections: Some("5".to_string()),
            rounds: None,
            date: Some("2022-11-25".to_string()),
            create_output_dir: true,
        };

        let config = overrides.apply(base);

        assert_eq!(config.short_file_id, "K1");
        assert_eq!(config.injections, "5");
        assert_eq!(config.rounds, "1");
        assert_eq!(config.manual_date.as_deref(), Some("2022-11-25"));
        assert!(config.create_output_dir);
    }

    #[test]
    fn test_derived_png_path() {
        let path = derived_png_path(Path::new("/data/201253_25112022.csv"), "Sensor 1");
        assert_eq!(path, PathBuf::from("/data/201253_25112022_Sensor_1.png"));

        let path = derived_png_path(Path::new("run.csv"), "inj2");
        assert_eq!(path, PathBuf::from("run_inj2.png"));

        assert_eq!(derived_file_name(Path::new("a/run.csv"), "inj1.5", "csv"), "run_inj1_5.csv");
    }

    fn inspect_series() -> SensorSeries {
        use crate::core::series::{SampleCategory, SensorColumn};

        SensorSeries::new(
            vec![0.0, 1.0, 2.0, 3.0, 4.0],
            vec![SensorColumn {
                name: "S1".to_string(),
                values: vec![10.0, 12.0, 15.0, 20.0, 18.0],
            }],
            ["2", "2", "1", "1", "1"].iter().map(|s| IntervalId::parse(s)).collect(),
            ["1", "1", "2", "2", "3"].iter().map(|s| SampleCategory::from_code(s)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_interval_deltas_per_interval() {
        let deltas = interval_deltas(&inspect_series());

        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].0, IntervalId::from(2));
        assert_eq!(deltas[0].1, vec![("S1".to_string(), 2.0)]);
        assert_eq!(deltas[1].0, IntervalId::from(1));
        assert_eq!(deltas[1].1, vec![("S1".to_string(), 3.0)]);
    }

    #[test]
    fn test_split_intervals_writes_one_csv_each() {
        use crate::core::loaders::load_series;

        let dir = tempfile::tempdir().unwrap();
        let columns = ColumnConfig {
            sensor_column_count: 1,
            ..ColumnConfig::default()
        };

        let paths = split_intervals(
            &inspect_series(),
            Path::new("201253_25112022.csv"),
            &dir.path().join("split"),
            &columns,
        )
        .unwrap();

        assert_eq!(
            paths,
            vec![
                dir.path().join("split").join("201253_25112022_inj2.csv"),
                dir.path().join("split").join("201253_25112022_inj1.csv"),
            ]
        );

        let second = load_series(&paths[1], &columns).unwrap();
        assert_eq!(second.time(), &[2.0, 3.0, 4.0]);
        assert_eq!(second.sensor("S1").unwrap().values, vec![15.0, 20.0, 18.0]);
    }

    #[test]
    fn test_cli_baseline_ignores_case() {
        for (raw, expected) in [("START", Baseline::Start), ("End", Baseline::End), ("raw", Baseline::None)] {
            let cli = Cli::try_parse_from(["biosense-pipeline", "plot", "x.csv", "--baseline", raw])
                .unwrap();
            match cli.command {
                Commands::Plot { baseline, .. } => assert_eq!(baseline, Some(expected)),
                _ => panic!("expected plot"),
            }
        }

        let bad = Cli::try_parse_from(["biosense-pipeline", "plot", "x.csv", "--baseline", "mid"]);
        assert!(bad.is_err());
    }

    #[test]
    fn test_cli_parses_skip_rows() {
        let cli = Cli::try_parse_from(["biosense-pipeline", "convert", "a.raw", "--skip-rows", "2"])
            .unwrap();
        match cli.command {
            Commands::Convert { skip_rows, .. } => assert_eq!(skip_rows, Some(2)),
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn test_prompt_metadata_respects_flags() {
        use std::io::Cursor;

        let dir = tempfile::tempdir().unwrap();
        let mut prompter = Prompter::new(Cursor::new(b"origin\nK1\n3\n2\n".to_vec()), Vec::new());
        let overrides = MetadataOverrides {
            origin_file_id: None,
            short_file_id: None,
            injections: Some("4".to_string()),
            rounds: None,
            date: Some("2022-11-25".to_string()),
            create_output_dir: true,
        };

        let config = prompt_metadata(
            &mut prompter,
            MetadataConfig::default(),
            overrides,
            "run_20221125.csv",
            &dir.path().join("missing"),
        )
        .unwrap();

        assert_eq!(config.origin_file_id, "origin");
        assert_eq!(config.short_file_id, "K1");
        assert_eq!(config.injections, "4");
        assert_eq!(config.rounds, "2");
        assert_eq!(config.manual_date.as_deref(), Some("2022-11-25"));
        assert!(config.create_output_dir);

        let output = String::from_utf8(prompter.into_writer()).unwrap();
        assert!(!output.contains("date"));
        assert!(!output.contains("create it"));
    }
}
