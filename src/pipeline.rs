use anyhow::{Context, Result};
use opencv::{core::Mat, prelude::*};

use crate::analysis::{BallTargetAnalyzer, TargetReport};
use crate::annotate::annotate_frame;
use crate::camera::Camera;
use crate::config::{OffsetPolicy, PipelineConfig};
use crate::extraction::BallContourExtractor;
use crate::filter::CandidateFilter;

/// Everything one cycle produces: the scalar report and the annotated frame.
pub struct CycleOutput {
    pub report: TargetReport,
    pub annotated: Mat,
}

/// Runs the blob-detection stages in sequence against one frame at a time.
/// Cycles never overlap; each frame is processed exactly once, and frames
/// that arrive while a cycle is running are dropped by the capture layer.
pub struct VisionPipeline<C: Camera> {
    camera: C,
    extractor: BallContourExtractor,
    filter: CandidateFilter,
    analyzer: BallTargetAnalyzer,
    offset_policy: OffsetPolicy,
    last_report: TargetReport,
}

impl<C: Camera> VisionPipeline<C> {
    pub fn new(camera: C, config: &PipelineConfig) -> Self {
        VisionPipeline {
            camera,
            extractor: BallContourExtractor::new(config),
            filter: CandidateFilter::new(config),
            analyzer: BallTargetAnalyzer::new(),
            offset_policy: config.offset_policy,
            last_report: TargetReport::default(),
        }
    }

    /// Grabs the next frame and runs one cycle. `None` means the stream
    /// ended; the caller exits its loop and leaves restart to supervision.
    pub fn run(&mut self) -> Result<Option<CycleOutput>> {
        let frame = match self
            .camera
            .grab_frame()
            .context("Failed to read frame from camera")?
        {
            Some(frame) => frame,
            None => return Ok(None),
        };

        self.process(&frame).map(Some)
    }

    /// One cycle over an already-captured frame: threshold, extract contours,
    /// filter candidates, select the target, annotate. Any failure in the
    /// algorithmic stages propagates; there is nothing to recover per cycle.
    pub fn process(&mut self, frame: &Mat) -> Result<CycleOutput> {
        let mask = self.extractor.threshold_image(frame)?;
        let contours = self.extractor.find_contours(&mask)?;
        let candidates = self.filter.filter_contours(&contours)?;

        let frame_size = frame.size().context("Failed to query frame size")?;
        let mut report = self.analyzer.report(&candidates, frame_size);

        if report.val == 0 && self.offset_policy == OffsetPolicy::Hold {
            report.tx = self.last_report.tx;
            report.ty = self.last_report.ty;
        }
        self.last_report = report;

        let best = self.analyzer.select_target(&candidates);
        let annotated = annotate_frame(frame, best.as_ref())?;

        Ok(CycleOutput { report, annotated })
    }
}
