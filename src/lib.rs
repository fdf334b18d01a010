pub mod analysis;
pub mod annotate;
pub mod camera;
pub mod config;
pub mod extraction;
pub mod filter;
pub mod pipeline;
pub mod telemetry;
