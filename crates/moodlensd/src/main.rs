use anyhow::{Context, Result};
use moodlens_core::canvas::ImageCanvas;
use moodlens_core::status::StatusReport;
use moodlens_core::terminal::{TerminalStatus, TextChart};
use moodlens_core::{FrameScheduler, PipelineState, ScriptedClassifier};
use moodlens_hw::Camera;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

mod capture;
mod config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("moodlensd starting");
    let config = config::Config::load()?;
    let mut status = TerminalStatus::new(std::io::stdout(), config.ansi);

    StatusReport::message("🔄 Loading classifier...").publish(&mut status)?;
    let classifier = match config.script_path.as_deref() {
        Some(path) => ScriptedClassifier::load(path)
            .with_context(|| format!("loading detection script {}", path.display()))?
            .looping(config.script_loop),
        None => {
            StatusReport::failure("No classifier", "set MOODLENS_SCRIPT or script_path")
                .publish(&mut status)?;
            anyhow::bail!("no classifier configured");
        }
    };
    StatusReport::message("✅ Classifier ready, starting camera...").publish(&mut status)?;

    // Acquisition failure is fatal: report it and never enter the loop.
    let camera = match Camera::open(&config.camera_device, config.capture_width, config.capture_height) {
        Ok(camera) => camera,
        Err(err) => {
            tracing::error!(device = %config.camera_device, error = %err, "camera unavailable");
            StatusReport::failure("No camera access", &err.to_string()).publish(&mut status)?;
            return Err(err.into());
        }
    };
    tracing::info!(
        device = %config.camera_device,
        width = camera.width,
        height = camera.height,
        format = ?camera.pixel_format(),
        "camera ready"
    );

    // Overlay matches the video's native resolution.
    let mut canvas = ImageCanvas::new(camera.width, camera.height)?;
    if let Some(path) = &config.snapshot_path {
        canvas = canvas.with_snapshots(path.clone(), config.snapshot_every);
    }

    let (frames, capture_thread) = capture::spawn_capture(camera)?;

    let mut scheduler = FrameScheduler::new(
        classifier,
        canvas,
        status,
        TextChart::new(config.ansi),
        config.scheduler(),
    );
    let state = PipelineState::default();
    scheduler.init_chart(&state)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("shutdown requested");
                let _ = shutdown_tx.send(true);
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot listen for ctrl-c; running until killed");
                // Keep the sender alive so the scheduler keeps running.
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    let state = scheduler.run(frames, shutdown_rx, state).await;

    let (_, _, _, chart) = scheduler.into_parts();
    print!("{}", chart.rendered());
    if capture_thread.join().is_err() {
        tracing::warn!("capture thread panicked");
    }

    tracing::info!(
        cycles = state.cycles,
        failed = state.failed_cycles,
        faces = state.histogram.total(),
        "moodlensd stopped"
    );
    Ok(())
}
