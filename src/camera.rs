use anyhow::{bail, Context, Result};
use opencv::{core::Mat, prelude::*, videoio};
use tracing::info;

use crate::config::CameraConfig;

/// Blocking frame source. `grab_frame` always hands back the newest available
/// frame; `None` means the stream ended and no further frames will arrive.
pub trait Camera {
    fn grab_frame(&mut self) -> Result<Option<Mat>>;
}

/// V4L/OpenCV-backed camera that applies the per-device configuration once at
/// open time.
pub struct OpenCvCamera {
    capture: videoio::VideoCapture,
    name: String,
}

impl OpenCvCamera {
    pub fn new(config: &CameraConfig) -> Result<Self> {
        info!(name = %config.name, path = %config.path, "Starting camera");

        let mut capture = match config.path.parse::<i32>() {
            Ok(index) => videoio::VideoCapture::new(index, videoio::CAP_ANY),
            Err(_) => videoio::VideoCapture::from_file(&config.path, videoio::CAP_ANY),
        }
        .with_context(|| format!("Failed to open camera '{}'", config.name))?;

        if !capture.is_opened()? {
            bail!("Camera '{}' is not available at {}", config.name, config.path);
        }

        // Keep no backlog: a late consumer always reads the newest frame.
        capture.set(videoio::CAP_PROP_BUFFERSIZE, 1.)?;

        if let Some(width) = config.width {
            capture.set(videoio::CAP_PROP_FRAME_WIDTH, width as f64)?;
        }
        if let Some(height) = config.height {
            capture.set(videoio::CAP_PROP_FRAME_HEIGHT, height as f64)?;
        }
        if let Some(fps) = config.fps {
            capture.set(videoio::CAP_PROP_FPS, fps)?;
        }
        if let Some(brightness) = config.brightness {
            capture.set(videoio::CAP_PROP_BRIGHTNESS, brightness)?;
        }
        if let Some(exposure) = config.exposure {
            // 1 = manual mode for V4L2 backends.
            capture.set(videoio::CAP_PROP_AUTO_EXPOSURE, 1.)?;
            capture.set(videoio::CAP_PROP_EXPOSURE, exposure)?;
        }

        Ok(OpenCvCamera {
            capture,
            name: config.name.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Camera for OpenCvCamera {
    fn grab_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        let grabbed = self
            .capture
            .read(&mut frame)
            .with_context(|| format!("Failed to read frame from camera '{}'", self.name))?;

        if !grabbed || frame.empty() {
            return Ok(None);
        }

        Ok(Some(frame))
    }
}
