use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use roommap_core::{
    render, AllocationSnapshot, MapConfig, RoomMapLayout, RoomMapper, SnapshotDocument,
};
use serde::de::DeserializeOwned;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "roommap")]
#[command(about = "Room Map - Draw a room allocation result as a single image", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the room map image
    Render {
        /// Allocation snapshot (JSON or YAML)
        #[arg(short, long)]
        input: PathBuf,

        /// Output image (.svg, anything else is written as PNG)
        #[arg(short, long)]
        output: PathBuf,

        /// Layout and theme overrides (JSON or YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pixel density multiplier for PNG output
        #[arg(short, long, default_value_t = 2.0)]
        scale: f32,
    },

    /// Compute the layout and write it as JSON
    Layout {
        /// Allocation snapshot (JSON or YAML)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for the layout (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Layout and theme overrides (JSON or YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the default configuration as YAML
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            input,
            output,
            config,
            scale,
        } => {
            render_command(input, output, config, scale)?;
        }
        Commands::Layout {
            input,
            output,
            config,
        } => {
            layout_command(input, output, config)?;
        }
        Commands::Config => {
            print!("{}", serde_yaml::to_string(&MapConfig::default())?);
        }
    }

    Ok(())
}

fn render_command(
    input: PathBuf,
    output: PathBuf,
    config: Option<PathBuf>,
    scale: f32,
) -> Result<()> {
    let mut status = io::stdout();
    let mapper = load_mapper(&input, config.as_deref(), &mut status)?;

    writeln!(status, "{}", "🎨 Composing room map...".bright_blue())?;

    let layout = mapper.layout()?;
    print_summary(&layout, &mut status)?;

    let is_svg = output.extension().and_then(|s| s.to_str()) == Some("svg");
    let svg = render::render_svg(&layout, &mapper.config().theme)?;
    let bytes = if is_svg {
        svg.into_bytes()
    } else {
        render::rasterize(&svg, scale)?
    };

    std::fs::write(&output, bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;

    writeln!(status)?;
    writeln!(
        status,
        "{} Saved room map to {}",
        "✅".bright_green(),
        output.display().to_string().bright_white()
    )?;

    Ok(())
}

fn layout_command(input: PathBuf, output: Option<PathBuf>, config: Option<PathBuf>) -> Result<()> {
    // Without an output file stdout carries the JSON, so progress moves to stderr
    let mut status: Box<dyn Write> = match output {
        Some(_) => Box::new(io::stdout()),
        None => Box::new(io::stderr()),
    };

    let mapper = load_mapper(&input, config.as_deref(), &mut status)?;
    write_layout(&mapper, output.as_deref(), &mut io::stdout(), &mut status)
}

fn write_layout(
    mapper: &RoomMapper,
    output: Option<&Path>,
    out: &mut dyn Write,
    status: &mut dyn Write,
) -> Result<()> {
    writeln!(status, "{}", "📐 Computing layout...".bright_blue())?;

    let layout = mapper.layout()?;
    print_summary(&layout, status)?;

    let json = serde_json::to_string_pretty(&layout)?;
    if let Some(output_path) = output {
        std::fs::write(output_path, json)
            .with_context(|| format!("failed to write {}", output_path.display()))?;
        writeln!(
            status,
            "💾 Saved layout to {}",
            output_path.display().to_string().bright_white()
        )?;
    } else {
        writeln!(out, "{}", json)?;
    }

    Ok(())
}

fn load_mapper(input: &Path, config: Option<&Path>, status: &mut dyn Write) -> Result<RoomMapper> {
    writeln!(status, "{}", "🔍 Loading snapshot...".bright_blue())?;

    let snapshot: AllocationSnapshot = read_document::<SnapshotDocument>(input)?.into_snapshot();
    let config = match config {
        Some(path) => read_document::<MapConfig>(path)?,
        None => MapConfig::default(),
    };
    let mapper = RoomMapper::new(snapshot, config)?;

    let snapshot = mapper.snapshot();
    writeln!(
        status,
        "  {} rooms",
        snapshot.rooms.len().to_string().bright_white().bold()
    )?;
    writeln!(
        status,
        "  {} unallocated courses",
        snapshot
            .unallocated_courses
            .len()
            .to_string()
            .bright_white()
            .bold()
    )?;
    writeln!(status)?;

    Ok(mapper)
}

/// Reads a JSON or YAML file, picking the parser from the extension.
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let extension = path.extension().and_then(|s| s.to_str());
    debug!(path = %path.display(), ?extension, "Parsing document");

    let document = if extension == Some("yaml") || extension == Some("yml") {
        serde_yaml::from_str(&content)
            .with_context(|| format!("invalid YAML in {}", path.display()))?
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", path.display()))?
    };

    Ok(document)
}

fn print_summary(layout: &RoomMapLayout, status: &mut dyn Write) -> io::Result<()> {
    writeln!(status)?;
    writeln!(status, "{}", "📊 Layout:".bright_yellow().bold())?;
    writeln!(
        status,
        "  Canvas: {}x{} px, {} rows x {} columns",
        layout.canvas.width,
        layout.canvas.height,
        layout.canvas.rows,
        layout.canvas.columns
    )?;
    writeln!(status, "  Categories:")?;
    for region in &layout.regions {
        let occupied = region
            .cards
            .iter()
            .filter(|card| card.occupancy.is_some())
            .count();
        writeln!(
            status,
            "    • {}: {} rooms, {} occupied ({}x{})",
            region.category.bright_white(),
            region.cards.len(),
            occupied,
            region.grid_columns,
            region.grid_rows
        )?;
    }
    writeln!(
        status,
        "  Occupied rooms: {}",
        format!("{}/{}", layout.occupied_count(), layout.card_count()).bright_white()
    )?;

    if let Some(overflow) = &layout.overflow {
        writeln!(
            status,
            "  Unallocated courses: {}",
            overflow.card_count().to_string().bright_red()
        )?;
    }

    Ok(())
}
