use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;

use wbplot::color::colormap_names;
use wbplot::data::loader::load_scalars;
use wbplot::workbench::{PaletteArg, PaletteValue};
use wbplot::{
    ColorbarPosition, DenseOptions, Hemisphere, Orientation, ParcelOptions, Settings, config,
};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

#[derive(Debug, Parser)]
#[command(name = "wbplot", version, about = "Plot cortical scalars with Connectome Workbench")]
struct Cli {
    /// JSON settings file (data_dir, wb_command, font).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory with the template CIFTI files and scene.zip.
    #[arg(long, global = true, env = config::ENV_DATA_DIR)]
    data_dir: Option<PathBuf>,

    /// Path to wb_command.
    #[arg(long, global = true, env = config::ENV_WB_COMMAND)]
    wb_command: Option<PathBuf>,

    /// TrueType font for colorbar labels.
    #[arg(long, global = true, env = config::ENV_FONT)]
    font: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Plot one value per atlas region.
    Parcel(ParcelArgs),
    /// Plot one value per surface vertex.
    Dense(DenseArgs),
    /// List the accepted colormap names.
    Colormaps,
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Scalars (.parquet, .json, .csv or .txt).
    input: PathBuf,
    /// Output PNG.
    output: PathBuf,
    /// JSON file with plot options; flags given here override it.
    #[arg(long)]
    options: Option<PathBuf>,
    #[arg(long, value_enum)]
    orientation: Option<Orientation>,
    #[arg(long, value_enum)]
    hemisphere: Option<Hemisphere>,
    /// Make white background pixels transparent.
    #[arg(long)]
    transparent: bool,
}

#[derive(Debug, Args)]
struct ParcelArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long, requires = "vmax", allow_negative_numbers = true)]
    vmin: Option<f64>,
    #[arg(long, requires = "vmin", allow_negative_numbers = true)]
    vmax: Option<f64>,
    #[arg(long)]
    cmap: Option<String>,
    #[arg(long)]
    parcellation: Option<String>,
    #[arg(long)]
    no_colorbar: bool,
    #[arg(long, value_enum)]
    colorbar_position: Option<ColorbarPosition>,
    /// Colorbar tick label; repeat for each tick.
    #[arg(long = "colorbar-label")]
    colorbar_labels: Vec<String>,
}

#[derive(Debug, Args)]
struct DenseArgs {
    #[command(flatten)]
    common: CommonArgs,
    #[arg(long)]
    palette: Option<String>,
    #[arg(long)]
    palette_mode: Option<String>,
    /// Extra -cifti-palette option as KEY=VALUE; repeatable.
    #[arg(long = "palette-param", value_parser = parse_palette_param)]
    palette_params: Vec<(String, PaletteValue)>,
}

fn parse_palette_param(s: &str) -> Result<(String, PaletteValue), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.trim_start_matches('-').is_empty() {
        return Err(format!("missing option name in '{s}'"));
    }
    let value = match value {
        "true" => PaletteValue::Bool(true),
        "false" => PaletteValue::Bool(false),
        v if v.contains(',') => PaletteValue::List(
            v.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(PaletteArg::parse)
                .collect(),
        ),
        v => match v.parse::<f64>() {
            Ok(n) => PaletteValue::Number(n),
            Err(_) => PaletteValue::Text(v.to_string()),
        },
    };
    Ok((key.to_string(), value))
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let settings = settings(&cli)?;

    match cli.command {
        Command::Parcel(args) => run_parcel(&settings, args),
        Command::Dense(args) => run_dense(&settings, args),
        Command::Colormaps => {
            for name in colormap_names() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = dir.clone();
    }
    if let Some(cmd) = &cli.wb_command {
        settings.wb_command = cmd.clone();
    }
    if let Some(font) = &cli.font {
        settings.font = Some(font.clone());
    }
    log::debug!("Settings: {settings:?}");
    Ok(settings)
}

fn read_options<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading options file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing options file {}", path.display()))
}

fn load_input(path: &Path) -> Result<Vec<f64>> {
    let values = load_scalars(path).with_context(|| format!("loading {}", path.display()))?;
    if values.is_empty() {
        bail!("{} contains no values", path.display());
    }
    Ok(values)
}

fn run_parcel(settings: &Settings, args: ParcelArgs) -> Result<()> {
    let common = args.common;
    let mut opts: ParcelOptions = read_options(common.options.as_deref())?;
    if let Some(o) = common.orientation {
        opts.orientation = o;
    }
    if let Some(h) = common.hemisphere {
        opts.hemisphere = Some(h);
    }
    opts.transparent |= common.transparent;
    if let (Some(min), Some(max)) = (args.vmin, args.vmax) {
        opts.vrange = Some((min, max));
    }
    if let Some(cmap) = args.cmap {
        opts.cmap = cmap;
    }
    if let Some(p) = args.parcellation {
        opts.parcellation = p;
    }
    if args.no_colorbar {
        opts.colorbar = false;
    }
    if let Some(pos) = args.colorbar_position {
        opts.colorbar_position = pos;
    }
    if !args.colorbar_labels.is_empty() {
        opts.colorbar_labels = Some(args.colorbar_labels);
    }

    let values = load_input(&common.input)?;
    let figure = wbplot::pscalar(settings, &common.output, &values, &opts)
        .with_context(|| format!("plotting {}", common.input.display()))?;
    if let Some(legend) = &figure.legend {
        log::info!("Colorbar ticks: {}", legend.labels.join(", "));
    }
    println!("{}", common.output.display());
    Ok(())
}

fn run_dense(settings: &Settings, args: DenseArgs) -> Result<()> {
    let common = args.common;
    let mut opts: DenseOptions = read_options(common.options.as_deref())?;
    if let Some(o) = common.orientation {
        opts.orientation = o;
    }
    if let Some(h) = common.hemisphere {
        opts.hemisphere = Some(h);
    }
    opts.transparent |= common.transparent;
    if let Some(palette) = args.palette {
        opts.palette = palette;
    }
    if let Some(mode) = args.palette_mode {
        opts.palette_mode = mode;
    }
    for (key, value) in args.palette_params {
        opts.palette_params.insert(&key, value)?;
    }

    let values = load_input(&common.input)?;
    wbplot::dscalar(settings, &common.output, &values, &opts)
        .with_context(|| format!("plotting {}", common.input.display()))?;
    println!("{}", common.output.display());
    Ok(())
}
