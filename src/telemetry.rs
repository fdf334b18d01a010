use std::{
    net::{SocketAddr, UdpSocket},
    path::PathBuf,
    thread,
    time::{Duration, SystemTime},
};

use anyhow::{Context, Result};
use opencv::{
    core::{Mat, Vector},
    imgcodecs,
};
use serde::Serialize;
use tracing::info;

use crate::analysis::TargetReport;
use crate::config::TelemetryConfig;

/// One cycle's worth of scalar telemetry, keyed the way consumers read it.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TelemetryPacket {
    pub timestamp: f64,
    pub val: u32,
    pub tx: f64,
    pub ty: f64,
    pub ta: f64,
}

impl TelemetryPacket {
    pub fn new(report: &TargetReport) -> Self {
        TelemetryPacket {
            timestamp: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs_f64())
                .unwrap_or(0.),
            val: report.val,
            tx: report.tx,
            ty: report.ty,
            ta: report.ta,
        }
    }
}

/// Key-value telemetry store boundary. Entries are overwritten every cycle;
/// external consumers poll them independently.
pub trait TelemetrySink {
    fn publish(&mut self, packet: &TelemetryPacket) -> Result<()>;
}

/// Sends MessagePack-encoded packets over UDP to the robot controller.
pub struct UdpTelemetry {
    socket: UdpSocket,
}

impl UdpTelemetry {
    /// Blocks until the destination hostname resolves, then switches the
    /// socket to non-blocking sends so a slow network never stalls a cycle.
    pub fn new(src_port: u16, dst_address: &str) -> Result<UdpTelemetry> {
        let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], src_port)))
            .with_context(|| format!("Failed to bind UDP port {}", src_port))?;

        while socket.connect(dst_address).is_err() {
            thread::sleep(Duration::from_secs(3));
        }
        socket
            .set_nonblocking(true)
            .context("Failed to set socket non-blocking")?;

        info!(destination = %dst_address, "Telemetry connected");

        Ok(UdpTelemetry { socket })
    }
}

impl TelemetrySink for UdpTelemetry {
    fn publish(&mut self, packet: &TelemetryPacket) -> Result<()> {
        let buf = rmp_serde::to_vec_named(packet).context("Failed to encode telemetry packet")?;
        self.socket
            .send(&buf)
            .context("Failed to send telemetry packet")?;
        Ok(())
    }
}

/// Periodically snapshots the annotated frame to disk in place of the
/// original's external "Processed" video stream.
pub struct ProcessedFrameWriter {
    path: Option<PathBuf>,
    interval: u32,
    cycle: u32,
}

impl ProcessedFrameWriter {
    pub fn new(config: &TelemetryConfig) -> Self {
        ProcessedFrameWriter {
            path: config
                .frame_dir
                .as_ref()
                .map(|dir| PathBuf::from(dir).join("processed.jpg")),
            interval: config.frame_interval.max(1),
            cycle: 0,
        }
    }

    pub fn put_frame(&mut self, frame: &Mat) -> Result<()> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };

        self.cycle = self.cycle.wrapping_add(1);
        if self.cycle % self.interval != 0 {
            return Ok(());
        }

        let path_str = path
            .to_str()
            .context("Frame snapshot path is not valid UTF-8")?;
        imgcodecs::imwrite(path_str, frame, &Vector::<i32>::new())
            .with_context(|| format!("Failed to write frame snapshot to {}", path_str))?;

        Ok(())
    }
}
