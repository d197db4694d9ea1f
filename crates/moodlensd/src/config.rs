use anyhow::Context;
use moodlens_core::{DetectOptions, SchedulerConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Daemon configuration.
///
/// Read from the TOML file named by `MOODLENS_CONFIG` (if set), then
/// overridden field by field from `MOODLENS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Requested capture size; the driver may negotiate another.
    pub capture_width: u32,
    pub capture_height: u32,
    /// Detector input size hint passed to the classifier.
    pub input_size: u32,
    /// Minimum face detector score.
    pub score_threshold: f32,
    /// Display refresh rate driving the cycle cadence.
    pub refresh_rate_hz: f64,
    /// Deadline in milliseconds for one classifier call.
    pub classify_timeout_ms: u64,
    /// JSON-lines detection script replayed as classifier output.
    pub script_path: Option<PathBuf>,
    /// Restart the script when it runs out.
    pub script_loop: bool,
    /// Where to write composited overlay snapshots, if anywhere.
    pub snapshot_path: Option<PathBuf>,
    /// Write a snapshot every N frames.
    pub snapshot_every: u64,
    /// Colour the terminal status panel.
    pub ansi: bool,
}

impl Default for Config {
    fn default() -> Self {
        let detect = DetectOptions::default();
        Self {
            camera_device: "/dev/video0".to_string(),
            capture_width: 640,
            capture_height: 480,
            input_size: detect.input_size,
            score_threshold: detect.score_threshold,
            refresh_rate_hz: 60.0,
            classify_timeout_ms: 2000,
            script_path: None,
            script_loop: true,
            snapshot_path: None,
            snapshot_every: 30,
            ansi: true,
        }
    }
}

impl Config {
    /// Load the config file (if any), then apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut config = match std::env::var("MOODLENS_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let src = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&src).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(src: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(src)
    }

    fn apply_env(&mut self) {
        if let Ok(device) = std::env::var("MOODLENS_CAMERA_DEVICE") {
            self.camera_device = device;
        }
        self.capture_width = env_parse("MOODLENS_CAPTURE_WIDTH", self.capture_width);
        self.capture_height = env_parse("MOODLENS_CAPTURE_HEIGHT", self.capture_height);
        self.input_size = env_parse("MOODLENS_INPUT_SIZE", self.input_size);
        self.score_threshold = env_parse("MOODLENS_SCORE_THRESHOLD", self.score_threshold);
        self.refresh_rate_hz = env_parse("MOODLENS_REFRESH_RATE_HZ", self.refresh_rate_hz);
        self.classify_timeout_ms = env_parse("MOODLENS_CLASSIFY_TIMEOUT_MS", self.classify_timeout_ms);
        if let Ok(path) = std::env::var("MOODLENS_SCRIPT") {
            self.script_path = Some(PathBuf::from(path));
        }
        if let Ok(v) = std::env::var("MOODLENS_SCRIPT_LOOP") {
            self.script_loop = v != "0";
        }
        if let Ok(path) = std::env::var("MOODLENS_SNAPSHOT_PATH") {
            self.snapshot_path = Some(PathBuf::from(path));
        }
        self.snapshot_every = env_parse("MOODLENS_SNAPSHOT_EVERY", self.snapshot_every);
        if std::env::var_os("NO_COLOR").is_some() {
            self.ansi = false;
        }
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig {
            detect: DetectOptions {
                input_size: self.input_size,
                score_threshold: self.score_threshold,
            },
            classify_timeout: Duration::from_millis(self.classify_timeout_ms),
            refresh_rate_hz: self.refresh_rate_hz,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
