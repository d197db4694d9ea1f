//! Frame scheduler: one classification cycle per display tick.
//!
//! Each cycle runs classify → normalize → overlay → status → histogram →
//! chart. Cycles never overlap, and a failed cycle is logged and skipped
//! without touching the histogram.

use crate::classifier::{Classifier, ClassifierError, DetectOptions};
use crate::filter::VideoFilter;
use crate::frame::Frame;
use crate::histogram::Histogram;
use crate::normalizer::{normalize_all, NormalizeError};
use crate::overlay::OverlayRenderer;
use crate::status::StatusReport;
use crate::style::registry;
use crate::surface::{ChartWidget, DrawSurface, StatusSurface, SurfaceError};
use crate::types::NormalizedFace;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

const DEFAULT_REFRESH_HZ: f64 = 60.0;
const DEFAULT_CLASSIFY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Error, Debug)]
pub enum CycleError {
    #[error("classifier: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("classifier missed its {0:?} deadline")]
    TimedOut(Duration),
    #[error("normalize: {0}")]
    Normalize(#[from] NormalizeError),
    #[error("surface: {0}")]
    Surface(#[from] SurfaceError),
}

/// Where the scheduler is within the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Waiting on the classifier.
    Capturing,
    Rendering,
}

/// Result of one cycle.
#[derive(Debug)]
pub enum CycleOutcome {
    Rendered { faces: usize },
    Failed(CycleError),
}

/// State carried from cycle to cycle. Everything else lives for one cycle.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub histogram: Histogram,
    /// Filter currently applied to the video surface.
    pub ambient: VideoFilter,
    pub cycles: u64,
    pub failed_cycles: u64,
    /// Histogram changed but the chart has not redrawn it yet.
    pub chart_stale: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub detect: DetectOptions,
    /// Deadline for a single classifier call.
    pub classify_timeout: Duration,
    /// Display refresh rate the cycle cadence is bound to.
    pub refresh_rate_hz: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            detect: DetectOptions::default(),
            classify_timeout: DEFAULT_CLASSIFY_TIMEOUT,
            refresh_rate_hz: DEFAULT_REFRESH_HZ,
        }
    }
}

impl SchedulerConfig {
    pub fn frame_interval(&self) -> Duration {
        let hz = if self.refresh_rate_hz.is_finite() && self.refresh_rate_hz > 0.0 {
            self.refresh_rate_hz
        } else {
            DEFAULT_REFRESH_HZ
        };
        Duration::from_secs_f64(1.0 / hz)
    }
}

/// Latest captured frame, shared with the capture side.
pub type FrameFeed = watch::Receiver<Option<Arc<Frame>>>;

/// Drives the pipeline against its collaborators.
pub struct FrameScheduler<C, D, S, W> {
    classifier: C,
    canvas: D,
    status: S,
    chart: W,
    overlay: OverlayRenderer,
    config: SchedulerConfig,
    phase: Phase,
}

impl<C, D, S, W> FrameScheduler<C, D, S, W>
where
    C: Classifier,
    D: DrawSurface,
    S: StatusSurface,
    W: ChartWidget,
{
    pub fn new(classifier: C, canvas: D, status: S, chart: W, config: SchedulerConfig) -> Self {
        Self {
            classifier,
            canvas,
            status,
            chart,
            overlay: OverlayRenderer,
            config,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn canvas(&self) -> &D {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut D {
        &mut self.canvas
    }

    pub fn status(&self) -> &S {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut S {
        &mut self.status
    }

    pub fn chart(&self) -> &W {
        &self.chart
    }

    pub fn chart_mut(&mut self) -> &mut W {
        &mut self.chart
    }

    pub fn into_parts(self) -> (C, D, S, W) {
        (self.classifier, self.canvas, self.status, self.chart)
    }

    /// Declare chart bars and publish the initial zero counts.
    pub fn init_chart(&mut self, state: &PipelineState) -> Result<(), SurfaceError> {
        let series: Vec<_> = registry().map(|(c, style)| (c, style.color)).collect();
        self.chart.set_series(&series)?;
        self.chart.set_counts(&state.histogram.snapshot());
        self.chart.redraw()
    }

    /// Run exactly one cycle against `frame`.
    ///
    /// On failure the histogram, chart flag and cycle count are returned
    /// unchanged. `ambient` always mirrors the filter on the canvas.
    pub async fn run_cycle(
        &mut self,
        frame: &Frame,
        mut state: PipelineState,
    ) -> (PipelineState, CycleOutcome) {
        let outcome = match self.cycle(frame, &mut state).await {
            Ok(faces) => {
                state.cycles += 1;
                tracing::trace!(seq = frame.sequence, faces, "cycle complete");
                CycleOutcome::Rendered { faces }
            }
            Err(err) => {
                state.failed_cycles += 1;
                match &err {
                    CycleError::Normalize(_) => {
                        tracing::error!(seq = frame.sequence, error = %err, "classifier broke its contract; frame dropped")
                    }
                    _ => tracing::warn!(seq = frame.sequence, error = %err, "cycle failed; continuing"),
                }
                CycleOutcome::Failed(err)
            }
        };
        self.phase = Phase::Idle;
        (state, outcome)
    }

    async fn cycle(&mut self, frame: &Frame, state: &mut PipelineState) -> Result<usize, CycleError> {
        self.phase = Phase::Capturing;
        let timeout = self.config.classify_timeout;
        let detections = tokio::time::timeout(
            timeout,
            self.classifier.detect(frame, &self.config.detect),
        )
        .await
        .map_err(|_| CycleError::TimedOut(timeout))??;

        self.phase = Phase::Rendering;
        let faces = fit_to_surface(normalize_all(&detections)?, frame.size(), self.canvas.size());

        // The filter is live on the canvas from here on, even if a later step fails.
        state.ambient = self.overlay.render(&mut self.canvas, &faces)?;
        StatusReport::for_faces(&faces).publish(&mut self.status)?;
        self.canvas.present(frame)?;

        // Overlay and status are on screen; commit the aggregate.
        if !faces.is_empty() {
            state.histogram.record(&faces);
            state.chart_stale = true;
        }
        if state.chart_stale {
            self.chart.set_counts(&state.histogram.snapshot());
            match self.chart.redraw() {
                Ok(()) => state.chart_stale = false,
                // Counts stay committed; the next cycle retries the redraw.
                Err(err) => tracing::warn!(error = %err, "chart redraw failed"),
            }
        }

        Ok(faces.len())
    }

    /// Run cycles until `shutdown` becomes true or its sender is dropped.
    ///
    /// Cycles start on display ticks. A cycle that outlasts a tick makes
    /// the scheduler skip the missed ticks instead of queueing them.
    pub async fn run(
        &mut self,
        mut frames: FrameFeed,
        mut shutdown: watch::Receiver<bool>,
        mut state: PipelineState,
    ) -> PipelineState {
        let mut ticker = tokio::time::interval(self.config.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            interval = ?self.config.frame_interval(),
            timeout = ?self.config.classify_timeout,
            input_size = self.config.detect.input_size,
            "frame scheduler started"
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                _ = ticker.tick() => {}
            }

            let frame = frames.borrow_and_update().clone();
            let Some(frame) = frame else {
                tracing::trace!("no frame captured yet");
                continue;
            };

            let (next, outcome) = self.run_cycle(&frame, state).await;
            state = next;
            if let CycleOutcome::Rendered { faces } = outcome {
                tracing::debug!(seq = frame.sequence, faces, total = state.histogram.total(), "frame annotated");
            }
        }

        tracing::info!(
            cycles = state.cycles,
            failed = state.failed_cycles,
            faces = state.histogram.total(),
            "frame scheduler stopped"
        );
        state
    }
}

/// Rescale faces from classifier frame coordinates to the overlay surface.
fn fit_to_surface(
    faces: Vec<NormalizedFace>,
    frame_size: (u32, u32),
    surface_size: (u32, u32),
) -> Vec<NormalizedFace> {
    if frame_size == surface_size {
        return faces;
    }
    faces
        .into_iter()
        .map(|f| NormalizedFace { bbox: f.bbox.rescale(frame_size, surface_size), ..f })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ScriptStep, ScriptedClassifier};
    use crate::recording::{RecordingCanvas, RecordingChart, RecordingStatus};
    use crate::style::style_for;
    use crate::types::{BoundingBox, EmotionCategory, Expressions, RawDetection};

    type TestScheduler =
        FrameScheduler<ScriptedClassifier, RecordingCanvas, RecordingStatus, RecordingChart>;

    fn det(x: f32, scores: &[(EmotionCategory, f32)]) -> RawDetection {
        RawDetection {
            bbox: BoundingBox { x, y: 40.0, width: 50.0, height: 50.0, score: 0.9 },
            expressions: scores.iter().copied().collect::<Expressions>(),
        }
    }

    fn two_faces() -> ScriptStep {
        use EmotionCategory::*;
        ScriptStep::Detections(vec![
            det(10.0, &[(Happy, 0.8), (Sad, 0.1)]),
            det(200.0, &[(Angry, 0.95), (Neutral, 0.05)]),
        ])
    }

    fn failure() -> ScriptStep {
        ScriptStep::Failure { error: "boom".into() }
    }

    fn scheduler(steps: Vec<ScriptStep>) -> TestScheduler {
        FrameScheduler::new(
            ScriptedClassifier::from_steps(steps),
            RecordingCanvas::new(640, 480),
            RecordingStatus::default(),
            RecordingChart::default(),
            SchedulerConfig::default(),
        )
    }

    fn frame(seq: u64) -> Frame {
        Frame::blank(640, 480, seq)
    }

    #[tokio::test]
    async fn test_end_to_end_two_faces() {
        let mut s = scheduler(vec![two_faces()]);
        let (state, outcome) = s.run_cycle(&frame(1), PipelineState::default()).await;

        assert!(matches!(outcome, CycleOutcome::Rendered { faces: 2 }));
        assert_eq!(state.histogram.count(EmotionCategory::Happy), 1);
        assert_eq!(state.histogram.count(EmotionCategory::Angry), 1);
        assert_eq!(state.histogram.total(), 2);
        assert_eq!(state.cycles, 1);

        assert_eq!(
            s.status().text(),
            "👥 Faces detected: 2\n🧠 Person 1: 😄 happy (80%)\n🧠 Person 2: 😡 angry (95%)"
        );
        // Last face wins for the ambient filter and panel cosmetics.
        let angry = style_for(EmotionCategory::Angry);
        assert_eq!(s.canvas().ambient(), angry.filter);
        assert_eq!(state.ambient, angry.filter);
        assert_eq!(s.status().tint().unwrap().color, angry.color);

        assert_eq!(s.canvas().boxes().len(), 2);
        assert_eq!(s.canvas().presented(), &[1]);
        assert_eq!(s.chart().counts(), &state.histogram.snapshot()[..]);
        assert_eq!(s.chart().redraws, 1);
    }

    #[tokio::test]
    async fn test_empty_frame_leaves_histogram() {
        let mut s = scheduler(vec![two_faces(), ScriptStep::Detections(vec![])]);
        let (state, _) = s.run_cycle(&frame(1), PipelineState::default()).await;
        let before = state.histogram.clone();

        let (state, outcome) = s.run_cycle(&frame(2), state).await;
        assert!(matches!(outcome, CycleOutcome::Rendered { faces: 0 }));
        assert_eq!(state.histogram, before);
        assert!(state.ambient.is_neutral());
        assert!(s.canvas().ambient().is_neutral());
        assert_eq!(s.status().text(), "👀 Waiting for faces...");
        // Nothing changed, so the chart was not redrawn again.
        assert_eq!(s.chart().redraws, 1);
    }

    #[tokio::test]
    async fn test_classifier_failure_preserves_state() {
        let mut s = scheduler(vec![two_faces(), failure(), two_faces()]);
        let (state, _) = s.run_cycle(&frame(1), PipelineState::default()).await;
        let before = state.histogram.clone();
        let status_before = s.status().text();

        let (state, outcome) = s.run_cycle(&frame(2), state).await;
        assert!(matches!(outcome, CycleOutcome::Failed(CycleError::Classifier(_))));
        assert_eq!(state.histogram, before);
        assert_eq!(state.failed_cycles, 1);
        assert_eq!(s.status().text(), status_before);
        assert_eq!(s.phase(), Phase::Idle);

        // The next cycle runs normally.
        let (state, outcome) = s.run_cycle(&frame(3), state).await;
        assert!(matches!(outcome, CycleOutcome::Rendered { faces: 2 }));
        assert_eq!(state.histogram.count(EmotionCategory::Happy), 2);
        assert_eq!(state.cycles, 2);
    }

    #[tokio::test]
    async fn test_draw_failure_does_not_commit() {
        let mut s = scheduler(vec![two_faces(), two_faces()]);
        s.canvas_mut().fail_next_draw = true;

        let (state, outcome) = s.run_cycle(&frame(1), PipelineState::default()).await;
        assert!(matches!(outcome, CycleOutcome::Failed(CycleError::Surface(_))));
        assert_eq!(state.histogram.total(), 0);

        let (state, _) = s.run_cycle(&frame(2), state).await;
        assert_eq!(state.histogram.total(), 2);
    }

    #[tokio::test]
    async fn test_status_failure_keeps_ambient_in_sync() {
        let mut s = scheduler(vec![two_faces(), two_faces()]);
        s.status_mut().fail_replace = true;

        let (state, outcome) = s.run_cycle(&frame(1), PipelineState::default()).await;
        assert!(matches!(outcome, CycleOutcome::Failed(CycleError::Surface(SurfaceError::Status(_)))));
        assert_eq!(state.ambient, s.canvas().ambient());
        assert_eq!(state.ambient, style_for(EmotionCategory::Angry).filter);
        assert_eq!(state.histogram.total(), 0);
        assert!(!state.chart_stale);

        s.status_mut().fail_replace = false;
        let (state, _) = s.run_cycle(&frame(2), state).await;
        assert_eq!(state.histogram.total(), 2);
    }

    #[tokio::test]
    async fn test_present_failure_keeps_ambient_in_sync() {
        let mut s = scheduler(vec![two_faces()]);
        s.canvas_mut().fail_present = true;

        let (state, outcome) = s.run_cycle(&frame(1), PipelineState::default()).await;
        assert!(matches!(outcome, CycleOutcome::Failed(CycleError::Surface(_))));
        assert_eq!(state.ambient, s.canvas().ambient());
        assert!(!state.ambient.is_neutral());
        assert_eq!(state.histogram.total(), 0);
        assert!(s.canvas().presented().is_empty());
    }

    #[tokio::test]
    async fn test_empty_scores_abort_cycle() {
        let mut s = scheduler(vec![ScriptStep::Detections(vec![det(0.0, &[])])]);
        let (state, outcome) = s.run_cycle(&frame(1), PipelineState::default()).await;
        assert!(matches!(outcome, CycleOutcome::Failed(CycleError::Normalize(_))));
        assert_eq!(state.histogram.total(), 0);
    }

    #[tokio::test]
    async fn test_chart_failure_retried_next_cycle() {
        let mut s = scheduler(vec![two_faces(), ScriptStep::Detections(vec![])]);
        s.chart_mut().fail_redraw = true;
        let (state, outcome) = s.run_cycle(&frame(1), PipelineState::default()).await;
        assert!(matches!(outcome, CycleOutcome::Rendered { faces: 2 }));
        assert!(state.chart_stale);
        assert_eq!(state.histogram.total(), 2);

        s.chart_mut().fail_redraw = false;
        let (state, _) = s.run_cycle(&frame(2), state).await;
        assert!(!state.chart_stale);
        assert_eq!(s.chart().redraws, 1);
        assert_eq!(s.chart().counts()[0], (EmotionCategory::Happy, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_classifier_times_out() {
        let classifier =
            ScriptedClassifier::from_steps(vec![two_faces()]).with_latency(Duration::from_secs(10));
        let config = SchedulerConfig { classify_timeout: Duration::from_millis(100), ..Default::default() };
        let mut s = FrameScheduler::new(
            classifier,
            RecordingCanvas::new(640, 480),
            RecordingStatus::default(),
            RecordingChart::default(),
            config,
        );
        let (state, outcome) = s.run_cycle(&frame(1), PipelineState::default()).await;
        assert!(matches!(outcome, CycleOutcome::Failed(CycleError::TimedOut(_))));
        assert_eq!(state.histogram.total(), 0);
    }

    #[tokio::test]
    async fn test_boxes_rescaled_to_surface() {
        let mut s = FrameScheduler::new(
            ScriptedClassifier::from_steps(vec![two_faces()]),
            RecordingCanvas::new(1280, 960),
            RecordingStatus::default(),
            RecordingChart::default(),
            SchedulerConfig::default(),
        );
        s.run_cycle(&frame(1), PipelineState::default()).await;
        let boxes = s.canvas().boxes();
        assert_eq!(boxes[0].x, 20.0);
        assert_eq!(boxes[0].width, 100.0);
    }

    #[tokio::test]
    async fn test_init_chart_declares_series() {
        let mut s = scheduler(vec![]);
        s.init_chart(&PipelineState::default()).unwrap();
        assert_eq!(s.chart().series().len(), EmotionCategory::COUNT);
        assert_eq!(s.chart().series()[0].1, style_for(EmotionCategory::Happy).color);
        assert!(s.chart().counts().iter().all(|&(_, n)| n == 0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_continues_after_failures_and_stops_on_shutdown() {
        let steps = vec![failure(), two_faces(), failure(), two_faces()];
        let mut s = scheduler(steps);
        let (_frame_tx, frames) = watch::channel(Some(Arc::new(frame(7))));
        let (shutdown_tx, shutdown) = watch::channel(false);

        let run = s.run(frames, shutdown, PipelineState::default());
        let stop = async {
            // Enough ticks for every scripted step plus a few exhausted ones.
            tokio::time::sleep(Duration::from_millis(200)).await;
            shutdown_tx.send(true).unwrap();
        };
        let (state, ()) = tokio::join!(run, stop);

        assert_eq!(state.cycles, 2);
        assert_eq!(state.histogram.count(EmotionCategory::Happy), 2);
        assert_eq!(state.histogram.count(EmotionCategory::Angry), 2);
        assert!(state.failed_cycles >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_for_first_frame() {
        let mut s = scheduler(vec![two_faces()]);
        let (frame_tx, frames) = watch::channel(None);
        let (shutdown_tx, shutdown) = watch::channel(false);

        let run = s.run(frames, shutdown, PipelineState::default());
        let drive = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            frame_tx.send(Some(Arc::new(frame(1)))).unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(shutdown_tx);
        };
        let (state, ()) = tokio::join!(run, drive);
        assert_eq!(state.cycles, 1);
        assert_eq!(s.classifier().calls() - state.cycles, state.failed_cycles);
    }
}
