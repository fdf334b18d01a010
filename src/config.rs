use std::{fs::File, path::Path};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level configuration, read from a JSON file at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub team: u32,
    pub cameras: Vec<CameraConfig>,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    pub name: String,
    /// Device path (e.g. "/dev/video0") or a bare index ("0").
    pub path: String,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub fps: Option<f64>,
    pub brightness: Option<f64>,
    /// Manual exposure value; `None` leaves the device in auto-exposure.
    pub exposure: Option<f64>,
}

/// Immutable pipeline constants, passed into pipeline construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub hsv_low: [u8; 3],
    pub hsv_high: [u8; 3],
    /// Gaussian blur kernel side length; must be odd and positive.
    pub blur_kernel: i32,
    /// Bounding-box area noise floor, in px^2.
    pub min_area: f64,
    pub min_aspect: f64,
    pub max_aspect: f64,
    pub offset_policy: OffsetPolicy,
}

/// What tx/ty report on a cycle with no qualifying candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffsetPolicy {
    /// Reset tx/ty to zero.
    Reset,
    /// Keep the previous cycle's tx/ty (legacy behavior).
    Hold,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            hsv_low: [30, 80, 80],
            hsv_high: [55, 255, 255],
            blur_kernel: 13,
            min_area: 60.,
            min_aspect: 0.9,
            max_aspect: 1.1,
            offset_policy: OffsetPolicy::Reset,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub bind_port: u16,
    pub destination: String,
    /// Directory the annotated-frame snapshots are written to; `None` disables them.
    pub frame_dir: Option<String>,
    /// Write a snapshot every this many cycles.
    pub frame_interval: u32,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            bind_port: 4904,
            destination: "nano2-4904-frc.local:4826".to_string(),
            frame_dir: None,
            frame_interval: 30,
        }
    }
}

impl Config {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;
        let config: Config = serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cameras.is_empty() {
            bail!("Config must list at least one camera");
        }
        self.pipeline.validate()
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.blur_kernel <= 0 || self.blur_kernel % 2 == 0 {
            bail!(
                "Blur kernel size must be odd and positive, got {}",
                self.blur_kernel
            );
        }

        for channel in 0..3 {
            if self.hsv_low[channel] > self.hsv_high[channel] {
                bail!(
                    "HSV range is inverted on channel {}: {} > {}",
                    channel,
                    self.hsv_low[channel],
                    self.hsv_high[channel]
                );
            }
        }

        if self.min_area < 0. {
            bail!("Minimum area must be non-negative, got {}", self.min_area);
        }

        if self.min_aspect > self.max_aspect {
            bail!(
                "Aspect ratio band is inverted: {} > {}",
                self.min_aspect,
                self.max_aspect
            );
        }

        Ok(())
    }
}
