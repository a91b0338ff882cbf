use std::path::{Component, Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use wrlr_core::io::mask_file::RADAR_DIR;
use wrlr_core::io::{mirror_dirs, parse_duration};
use wrlr_core::{
    classify_batch, overlapping_windows, BatchOptions, LightningSet, ScanCatalog, Site,
    SteinerClassifier, SteinerConfig,
};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convective/stratiform classification and lightning gridding for CAPPI archives
#[derive(Parser, Debug)]
#[command(name = "wrlr-headless")]
#[command(about = "Batch Steiner classification of radar archives", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify every product under a `Radar` tree, writing masks to the `Steiner` tree
    Classify {
        /// Site code (BRU, PPR, PI, SR)
        #[arg(short, long)]
        site: String,

        /// Directory holding raw products; must contain a `Radar` component
        #[arg(short, long)]
        input: PathBuf,

        /// Classify the inner 200x200 box only
        #[arg(long)]
        crop: bool,

        /// JSON file overriding the classifier parameters
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Keep masks that already exist
        #[arg(long)]
        reuse: bool,

        /// Worker threads (0 = one per core)
        #[arg(short = 'j', long, default_value_t = 0)]
        threads: usize,
    },

    /// Ingest an Earth Networks file and report stroke counts
    Lightning {
        #[arg(short, long)]
        site: String,

        /// Semicolon-separated lightning file
        #[arg(long)]
        csv: PathBuf,

        /// Keep strokes at or after this time (`YYYY-mm-dd HH:MM:SS`)
        #[arg(long)]
        from: Option<String>,

        /// Keep strokes before this time
        #[arg(long)]
        to: Option<String>,

        /// Number of busiest cells to list
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Also count strokes in overlapping n x n windows
        #[arg(long)]
        windows: Option<usize>,
    },

    /// List scan-time windows over a product tree
    Windows {
        #[arg(short, long)]
        input: PathBuf,

        /// Window length (e.g. 30m)
        #[arg(long, default_value = "30m")]
        window: String,

        /// Step between window starts (e.g. 450s)
        #[arg(long, default_value = "450s")]
        step: String,
    },

    /// Print the radar site table
    Sites {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    match args.command {
        Command::Classify {
            site,
            input,
            crop,
            config,
            reuse,
            threads,
        } => run_classify(&site, &input, crop, config.as_deref(), reuse, threads),
        Command::Lightning {
            site,
            csv,
            from,
            to,
            top,
            windows,
        } => run_lightning(&site, &csv, from.as_deref(), to.as_deref(), top, windows),
        Command::Windows {
            input,
            window,
            step,
        } => run_windows(&input, &window, &step),
        Command::Sites { json } => run_sites(json),
    }
}

fn run_classify(
    code: &str,
    input: &Path,
    crop: bool,
    config: Option<&Path>,
    reuse: bool,
    threads: usize,
) -> Result<()> {
    let site = Site::from_code(code)?;
    if !input
        .components()
        .any(|c| c == Component::Normal(RADAR_DIR.as_ref()))
    {
        bail!(
            "input {} has no '{RADAR_DIR}' directory; masks would overwrite the products' tree",
            input.display()
        );
    }
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker threads")?;
    }

    let defaults = SteinerConfig::for_site(&site);
    let config = if let Some(path) = config {
        SteinerConfig::load_over(&defaults, path)
            .with_context(|| format!("Failed to load config {}", path.display()))?
    } else {
        defaults
    };
    info!(
        site = site.code,
        radius_cells = config.background_radius_cells(),
        border = config.border_cells,
        "Classifier configured"
    );

    let catalog = ScanCatalog::scan(input)
        .with_context(|| format!("Failed to list {}", input.display()))?;
    let paths: Vec<PathBuf> = catalog.paths().map(Path::to_path_buf).collect();
    if paths.is_empty() {
        bail!("no products found under {}", input.display());
    }
    let dirs = mirror_dirs(input).context("Failed to create the Steiner tree")?;
    info!(files = paths.len(), dirs, "Output tree ready");

    let progress = ProgressBar::new(paths.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{elapsed_precise} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("=> "),
    );

    let start = Instant::now();
    let classifier = SteinerClassifier::try_new(config)?;
    let options = BatchOptions {
        crop,
        reuse_existing: reuse,
    };
    let report = classify_batch(&paths, &site, &classifier, options, |_| progress.inc(1));
    progress.finish_and_clear();

    let totals = report.totals();
    println!("=== Steiner classification ({}) ===", site.name);
    println!("Products:        {}", paths.len());
    println!("Classified:      {}", report.succeeded() - report.reused());
    println!("Reused:          {}", report.reused());
    println!("Failed:          {}", paths.len() - report.succeeded());
    println!("Convective+inv.: {} cells", totals.masked);
    println!("  intensity:     {}", totals.intensity);
    println!("  peaks:         {}", totals.peaks);
    println!("  dilated:       {}", totals.dilated);
    println!("  invalid:       {}", totals.invalid);
    println!("Elapsed:         {:.1}s", start.elapsed().as_secs_f64());

    for (path, err) in report.failures().take(10) {
        println!("  failed {}: {err}", path.display());
    }
    Ok(())
}

fn parse_time(text: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIME_FORMAT)
        .with_context(|| format!("Invalid time '{text}', expected {TIME_FORMAT}"))
}

fn run_lightning(
    code: &str,
    csv: &Path,
    from: Option<&str>,
    to: Option<&str>,
    top: usize,
    windows: Option<usize>,
) -> Result<()> {
    let site = Site::from_code(code)?;
    let mut set = LightningSet::read(csv, &site)
        .with_context(|| format!("Failed to read {}", csv.display()))?;

    if from.is_some() || to.is_some() {
        let start = from.map(parse_time).transpose()?.unwrap_or(NaiveDateTime::MIN);
        let end = to.map(parse_time).transpose()?.unwrap_or(NaiveDateTime::MAX);
        set = set.between(start, end);
    }

    let summary = set.summary();
    println!("=== Lightning over {} ===", site.name);
    println!("Records:         {}", summary.records);
    println!("Strokes:         {}", summary.strokes);
    println!("Cloud-to-ground: {}", summary.cloud_to_ground);
    println!("Intracloud:      {}", summary.intracloud);
    println!("Positive:        {}", summary.positive);
    println!("Negative:        {}", summary.negative);

    let lat = site.latitude_axis();
    let lon = site.longitude_axis();
    let density = set.density(&site);
    println!("\nBusiest cells:");
    for ((row, col), count) in density.densest(top) {
        println!(
            "  ({row:3}, {col:3})  {:9.4} {:9.4}  {count}",
            lat[row], lon[col]
        );
    }

    if let Some(n) = windows {
        let (rows, cols) = site.inner_shape();
        println!("\nWindows ({n}x{n}, overlapping):");
        for (i, window) in overlapping_windows(rows, cols, n).iter().enumerate() {
            let Some(geo) = window.geo_box(&site) else {
                continue;
            };
            println!(
                "  #{i:2} rows {:3}..{:3} cols {:3}..{:3}  {}",
                window.row_start,
                window.row_end,
                window.col_start,
                window.col_end,
                set.within(geo.lower(), geo.upper()).len()
            );
        }
    }
    Ok(())
}

fn run_windows(input: &Path, window: &str, step: &str) -> Result<()> {
    let window = parse_duration(window)?;
    let step = parse_duration(step)?;
    let catalog = ScanCatalog::scan(input)
        .with_context(|| format!("Failed to list {}", input.display()))?;

    let windows = catalog.date_windows(window, step);
    println!("=== {} products, {} windows ===", catalog.len(), windows.len());
    for w in &windows {
        println!(
            "{} .. {}  {:3} files",
            w.start.format(TIME_FORMAT),
            w.end.format(TIME_FORMAT),
            w.files.len()
        );
    }
    Ok(())
}

fn run_sites(json: bool) -> Result<()> {
    let sites = Site::all();
    if json {
        println!("{}", serde_json::to_string_pretty(&sites)?);
        return Ok(());
    }
    println!(
        "{:<4} {:<20} {:>10} {:>10} {:>10} {:>10} {:>9} {:>7}",
        "code", "name", "lat_min", "lat_max", "lon_min", "lon_max", "shape", "km/cell"
    );
    for site in &sites {
        println!(
            "{:<4} {:<20} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>4}x{:<4} {:>7.3}",
            site.code,
            site.name,
            site.lat_min,
            site.lat_max,
            site.lon_min,
            site.lon_max,
            site.shape.0,
            site.shape.1,
            site.resolution_km()
        );
    }
    Ok(())
}
