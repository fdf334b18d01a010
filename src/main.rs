use std::{path::PathBuf, thread};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use ball_vision::camera::OpenCvCamera;
use ball_vision::config::Config;
use ball_vision::pipeline::VisionPipeline;
use ball_vision::telemetry::{ProcessedFrameWriter, TelemetryPacket, TelemetrySink, UdpTelemetry};

#[derive(Debug, Parser)]
#[command(about = "Single-target color blob tracker")]
struct Args {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let config = Config::read(&args.config)?;

    info!(team = config.team, "Starting vision tracker");

    // Vision runs against the first configured camera, as the original did.
    let camera_config = config.cameras.first().context("No camera configured")?;
    let camera = OpenCvCamera::new(camera_config)?;

    let mut sender = UdpTelemetry::new(config.telemetry.bind_port, &config.telemetry.destination)?;
    let mut frame_writer = ProcessedFrameWriter::new(&config.telemetry);

    let mut pipeline = VisionPipeline::new(camera, &config.pipeline);

    let vision_thread = thread::spawn(move || -> Result<()> {
        while let Some(output) = pipeline.run()? {
            debug!(report = ?output.report, "Cycle complete");

            if let Err(error) = sender.publish(&TelemetryPacket::new(&output.report)) {
                warn!(%error, "Telemetry publish failed");
            }
            if let Err(error) = frame_writer.put_frame(&output.annotated) {
                warn!(%error, "Frame snapshot failed");
            }
        }

        info!("Camera stream ended, stopping pipeline");
        Ok(())
    });

    vision_thread
        .join()
        .expect("Vision thread panicked")
        .context("Vision pipeline failed")?;

    Ok(())
}
