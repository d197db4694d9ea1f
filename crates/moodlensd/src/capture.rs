use moodlens_core::scheduler::FrameFeed;
use moodlens_hw::Camera;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::watch;

/// Give up after this many consecutive dequeue failures.
const MAX_CONSECUTIVE_ERRORS: u32 = 30;

/// Spawn the capture loop on a dedicated OS thread.
///
/// The thread publishes only the newest frame; the scheduler samples it on
/// each display tick, so slow cycles drop frames instead of queueing them.
/// The thread exits once every receiver is gone.
pub fn spawn_capture(camera: Camera) -> std::io::Result<(FrameFeed, JoinHandle<()>)> {
    let (tx, rx) = watch::channel(None);

    let handle = std::thread::Builder::new()
        .name("moodlens-capture".into())
        .spawn(move || {
            let mut stream = match camera.stream() {
                Ok(s) => s,
                Err(err) => {
                    tracing::error!(error = %err, "capture stream failed to start");
                    return;
                }
            };
            tracing::info!(device = %camera.device_path, "capture thread started");

            let mut failures = 0u32;
            loop {
                match stream.next_frame() {
                    Ok(frame) => {
                        failures = 0;
                        if tx.send(Some(Arc::new(frame))).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        failures += 1;
                        tracing::warn!(error = %err, failures, "frame capture failed");
                        if failures >= MAX_CONSECUTIVE_ERRORS {
                            tracing::error!("too many capture failures; stopping capture");
                            break;
                        }
                    }
                }
            }
            tracing::info!("capture thread exiting");
        })?;

    Ok((rx, handle))
}
