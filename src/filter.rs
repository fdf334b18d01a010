use anyhow::{Context, Result};
use opencv::{
    core::{Point, Rect, Vector},
    imgproc,
};

use crate::config::PipelineConfig;

/// A contour's axis-aligned bounding box with its derived size metrics.
///
/// `area` is the bounding-box area (width * height), not the contour-polygon
/// area. That overestimates non-rectangular blobs and is kept on purpose; the
/// filter thresholds are calibrated against it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateRect {
    pub rect: Rect,
    pub area: f64,
    pub aspect: f64,
}

impl CandidateRect {
    pub fn from_contour(contour: &Vector<Point>) -> Result<Self> {
        let rect = imgproc::bounding_rect(contour).context("Bounding rect failed")?;
        Ok(Self::from_rect(rect))
    }

    pub fn from_rect(rect: Rect) -> Self {
        CandidateRect {
            rect,
            area: rect.width as f64 * rect.height as f64,
            aspect: rect.width as f64 / rect.height as f64,
        }
    }
}

/// Rejects contours whose bounding box is too small or not square enough.
pub struct CandidateFilter {
    min_area: f64,
    min_aspect: f64,
    max_aspect: f64,
}

impl CandidateFilter {
    pub fn new(config: &PipelineConfig) -> Self {
        CandidateFilter {
            min_area: config.min_area,
            min_aspect: config.min_aspect,
            max_aspect: config.max_aspect,
        }
    }

    /// Keeps the candidates that pass both the area floor and the aspect-ratio
    /// band (inclusive bounds), preserving extraction order. The length of the
    /// returned sequence is the `val` count reported for the cycle.
    pub fn filter_contours(&self, contours: &Vector<Vector<Point>>) -> Result<Vec<CandidateRect>> {
        let mut candidates = Vec::new();

        for contour in contours.iter() {
            let candidate = CandidateRect::from_contour(&contour)?;
            if self.accepts(&candidate) {
                candidates.push(candidate);
            }
        }

        Ok(candidates)
    }

    fn accepts(&self, candidate: &CandidateRect) -> bool {
        candidate.area >= self.min_area
            && candidate.aspect >= self.min_aspect
            && candidate.aspect <= self.max_aspect
    }
}
