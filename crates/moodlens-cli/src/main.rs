use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use moodlens_core::canvas::ImageCanvas;
use moodlens_core::scheduler::CycleOutcome;
use moodlens_core::style::registry;
use moodlens_core::surface::{ChartWidget, DrawSurface, StatusSurface};
use moodlens_core::terminal::{TerminalStatus, TextChart};
use moodlens_core::{Frame, FrameScheduler, PipelineState, SchedulerConfig, ScriptedClassifier};
use moodlens_hw::Camera;
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "moodlens", about = "moodlens live emotion annotation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the colour, emoji and video filter of every category
    Styles,
    /// List V4L2 capture devices
    Devices,
    /// Run the pipeline over a detection script without a camera
    Replay {
        /// JSON-lines detection script
        #[arg(short, long)]
        script: PathBuf,
        /// Frame width the script's boxes refer to
        #[arg(long, default_value_t = 640)]
        width: u32,
        /// Frame height the script's boxes refer to
        #[arg(long, default_value_t = 480)]
        height: u32,
        /// Write composited overlay snapshots to this PNG
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Snapshot every N frames
        #[arg(long, default_value_t = 1)]
        every: u64,
        /// Print the final histogram as JSON
        #[arg(long)]
        json: bool,
        /// Disable ANSI colours
        #[arg(long)]
        no_color: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Styles => {
            for (category, style) in registry() {
                println!(
                    "{:<10} {}  {}  {}",
                    category.as_str(),
                    style.color,
                    style.glyph,
                    style.filter
                );
            }
        }
        Commands::Devices => {
            let devices = Camera::list_devices();
            if devices.is_empty() {
                println!("No video capture devices found");
            }
            for dev in devices {
                println!("{}  {} ({}, {})", dev.path, dev.name, dev.driver, dev.bus);
            }
        }
        Commands::Replay { script, width, height, snapshot, every, json, no_color } => {
            replay(script, width, height, snapshot, every, json, !no_color).await?;
        }
    }

    Ok(())
}

async fn replay(
    script: PathBuf,
    width: u32,
    height: u32,
    snapshot: Option<PathBuf>,
    every: u64,
    json: bool,
    ansi: bool,
) -> Result<()> {
    let classifier = ScriptedClassifier::load(&script)
        .with_context(|| format!("loading {}", script.display()))?;

    let mut canvas = ImageCanvas::new(width, height)?;
    if let Some(path) = snapshot {
        canvas = canvas.with_snapshots(path, every);
    }
    // Keep stdout clean for the JSON summary.
    let out: Box<dyn Write> = if json {
        Box::new(std::io::stderr())
    } else {
        Box::new(std::io::stdout())
    };
    let status = TerminalStatus::new(out, ansi);

    let mut scheduler = FrameScheduler::new(
        classifier,
        canvas,
        status,
        TextChart::new(ansi),
        SchedulerConfig::default(),
    );
    scheduler.init_chart(&PipelineState::default())?;
    tracing::info!(
        script = %script.display(),
        steps = scheduler.classifier().remaining(),
        width,
        height,
        "replay started"
    );
    let (state, seq) = replay_frames(&mut scheduler, width, height).await;
    tracing::info!(frames = seq, rendered = state.cycles, failed = state.failed_cycles, "replay finished");

    let (_, _, _, chart) = scheduler.into_parts();
    if json {
        let summary = serde_json::json!({
            "frames": seq,
            "cycles": state.cycles,
            "failed": state.failed_cycles,
            "histogram": state.histogram,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!();
        print!("{}", chart.rendered());
        println!(
            "{seq} frames, {} rendered, {} failed, {} faces",
            state.cycles,
            state.failed_cycles,
            state.histogram.total()
        );
    }
    Ok(())
}

/// Run one cycle per remaining script step on blank frames.
/// Returns the final state and the number of frames replayed.
async fn replay_frames<D, S, W>(
    scheduler: &mut FrameScheduler<ScriptedClassifier, D, S, W>,
    width: u32,
    height: u32,
) -> (PipelineState, u64)
where
    D: DrawSurface,
    S: StatusSurface,
    W: ChartWidget,
{
    let mut state = PipelineState::default();
    let mut seq = 0u64;
    while scheduler.classifier().remaining() > 0 {
        let frame = Frame::blank(width, height, seq);
        let (next, outcome) = scheduler.run_cycle(&frame, state).await;
        state = next;
        match outcome {
            CycleOutcome::Rendered { faces } => tracing::debug!(frame = seq, faces, "frame replayed"),
            CycleOutcome::Failed(err) => tracing::warn!(frame = seq, error = %err, "replay frame failed"),
        }
        seq += 1;
    }
    (state, seq)
}
