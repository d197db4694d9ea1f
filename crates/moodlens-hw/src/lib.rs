//! moodlens-hw — Video capture for the annotation pipeline.
//!
//! Provides V4L2-based camera access and conversion of the negotiated
//! pixel format to the RGB frames the pipeline consumes.

pub mod camera;
pub mod frame;

pub use camera::{Camera, CameraError, DeviceInfo, FrameStream, PixelFormat};
pub use frame::FrameError;
