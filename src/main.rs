use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;

use plotdeck::data::ChartKind;
use plotdeck::demo::DemoDataset;
use plotdeck::host::ChartHost;
use plotdeck::json_path::chart_data_from_paths;
use plotdeck::options::{AnimationMode, ChartOptions, Theme};
use plotdeck::plugin::TICK_MS;
use plotdeck::scheme::ColorScheme;
use plotdeck::sheet::chart_sheet;
use plotdeck::upload::{ingest_upload, IngestOutcome, UploadedFileInfo};

#[derive(Parser, Debug)]
#[command(name = "plotdeck")]
#[command(about = "Render charts from JSON, CSV or XLSX data to PNG", long_about = None)]
struct Args {
    /// Input file (.json, .csv or .xlsx); omit to use a demo dataset
    input: Option<PathBuf>,

    /// Demo dataset: sales, users, performance, revenue, demographics,
    /// comparison, time-series
    #[arg(long, default_value = "sales")]
    demo: String,

    /// Chart kind: line, bar, radar, pie, doughnut, polarArea, bubble,
    /// scatter
    #[arg(long, default_value = "line")]
    kind: String,

    /// Color scheme: default, pastel, vibrant, monochrome, earth
    #[arg(long, default_value = "default")]
    scheme: String,

    /// Workbook sheet to chart by name (default: the first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// Spreadsheet columns to chart, comma separated (first is the label
    /// column)
    #[arg(long)]
    columns: Option<String>,

    /// JSON paths to chart, comma separated (first is the label path)
    #[arg(long)]
    paths: Option<String>,

    /// Chart title
    #[arg(long)]
    title: Option<String>,

    /// Dark theme
    #[arg(long)]
    dark: bool,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 400)]
    height: u32,

    /// Render N looping animation frames instead of one settled image
    #[arg(long, default_value_t = 0)]
    frames: u32,

    /// Output file; frame sequences get a numeric suffix per frame
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let kind = match ChartKind::parse(&args.kind) {
        Some(kind) => kind,
        None => {
            eprintln!("Unknown chart kind: '{}'", args.kind);
            std::process::exit(1);
        }
    };
    let scheme = match ColorScheme::by_id(&args.scheme) {
        Some(scheme) => scheme,
        None => {
            eprintln!("Unknown color scheme: '{}'", args.scheme);
            std::process::exit(1);
        }
    };

    let mut options = ChartOptions::default();
    if let Some(title) = &args.title {
        options.title.text = title.clone();
    }
    if args.dark {
        options.theme = Theme::Dark;
    }
    if args.frames > 0 {
        options.animation.mode = AnimationMode::Loop;
    }

    let mut host = ChartHost::new(options);
    host.set_surface_px(args.width, args.height);
    host.set_scheme(scheme);

    if let Some(input) = &args.input {
        // User data first so the kind is not corrected against a demo
        // dataset.
        load_file(&mut host, input, &args)?;
        host.set_kind(kind);
    } else {
        let dataset = match DemoDataset::parse(&args.demo) {
            Some(dataset) => dataset,
            None => {
                eprintln!("Unknown demo dataset: '{}'", args.demo);
                std::process::exit(1);
            }
        };
        host.set_dataset(dataset);
        host.set_kind(kind);
    }

    if args.frames > 0 {
        render_frames(&mut host, args.frames, args.output.as_deref())?;
    } else {
        host.complete_entry();
        let png = host.render().context("Failed to render chart")?;
        write_output(&png, args.output.as_deref())?;
    }

    Ok(())
}

fn load_file(host: &mut ChartHost, input: &Path, args: &Args) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    let info = UploadedFileInfo::new(name, "", bytes.len() as u64);

    match ingest_upload(&info, &bytes).context("Failed to ingest input file")? {
        IngestOutcome::Ready(chart) => host.set_user_data(chart),
        IngestOutcome::NeedsSelection { raw, paths, default_selection } => {
            let selection: Vec<String> = match &args.paths {
                Some(list) => list.split(',').map(|p| p.trim().to_string()).collect(),
                None => default_selection,
            };
            if selection.len() < 2 {
                eprintln!("The JSON needs at least 2 selected paths. Available paths:");
                for p in &paths {
                    eprintln!(
                        "  {}  (numeric: {}, common: {}, sample: {})",
                        p.path, p.is_numeric, p.common_across_all, p.sample_value
                    );
                }
                std::process::exit(1);
            }
            let chart = chart_data_from_paths(&raw, &selection)
                .context("Failed to build chart data from the selected paths")?;
            host.set_user_data(chart);
        }
        IngestOutcome::Workbook { workbook, chart } => {
            let columns: Option<Vec<String>> = args
                .columns
                .as_ref()
                .map(|list| list.split(',').map(|c| c.trim().to_string()).collect());
            let chart = if args.sheet.is_some() || columns.is_some() {
                chart_sheet(&workbook, args.sheet.as_deref(), columns.as_deref())
                    .context("Failed to chart the selected sheet")?
            } else {
                chart
            };
            host.set_user_data(chart);
        }
    }
    Ok(())
}

fn render_frames(host: &mut ChartHost, frames: u32, output: Option<&Path>) -> Result<()> {
    let Some(output) = output else {
        bail!("--frames requires -o so the frame files have somewhere to go");
    };
    let stem = output.file_stem().map(|s| s.to_string_lossy().into_owned());
    let stem = stem.as_deref().unwrap_or("frame");
    let dir = output.parent().unwrap_or_else(|| Path::new("."));

    host.complete_entry();
    for frame in 0..frames {
        host.tick(TICK_MS);
        let png = host.render().with_context(|| format!("Failed to render frame {frame}"))?;
        let path = dir.join(format!("{stem}-{frame:03}.png"));
        fs::write(&path, &png)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

fn write_output(png: &[u8], output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, png).with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(png).context("Failed to write PNG to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}
