use anyhow::{Context, Result};
use opencv::{
    core::{self, Mat, Point, Size, Vector},
    imgproc,
};

use crate::config::PipelineConfig;

/// Thresholds frames against an HSV range and extracts candidate contours.
pub struct BallContourExtractor {
    hsv_low: [u8; 3],
    hsv_high: [u8; 3],
    blur_kernel: Size,
}

impl BallContourExtractor {
    pub fn new(config: &PipelineConfig) -> Self {
        BallContourExtractor {
            hsv_low: config.hsv_low,
            hsv_high: config.hsv_high,
            blur_kernel: Size::new(config.blur_kernel, config.blur_kernel),
        }
    }

    /// Produces a binary mask of the pixels whose blurred HSV value falls
    /// inside the configured range, inclusive on all three channels.
    /// The mask has the same dimensions as the input frame.
    pub fn threshold_image(&self, image: &Mat) -> Result<Mat> {
        let mut blurred_image = Mat::default();
        imgproc::gaussian_blur_def(image, &mut blurred_image, self.blur_kernel, 0.)
            .context("Gaussian blur failed")?;

        let mut hsv_image = Mat::default();
        imgproc::cvt_color_def(&blurred_image, &mut hsv_image, imgproc::COLOR_BGR2HSV)
            .context("HSV conversion failed")?;

        let mut thresholded_image = Mat::default();
        core::in_range(
            &hsv_image,
            &Mat::from_slice(&self.hsv_low)?,
            &Mat::from_slice(&self.hsv_high)?,
            &mut thresholded_image,
        )
        .context("HSV range threshold failed")?;

        Ok(thresholded_image)
    }

    /// Finds the boundary contours of all connected regions in the mask.
    /// Tree-mode extraction with simple chain approximation; nested regions
    /// are reported as independent contours and the hierarchy is discarded.
    /// The output order is whatever the extraction produces; callers must
    /// only rely on it for first-seen tie-breaking.
    pub fn find_contours(&self, mask: &Mat) -> Result<Vector<Vector<Point>>> {
        let mut contours = Vector::<Vector<Point>>::new();
        let mut hierarchy = Vector::<core::Vec4i>::new();
        imgproc::find_contours_with_hierarchy_def(
            mask,
            &mut contours,
            &mut hierarchy,
            imgproc::RETR_TREE,
            imgproc::CHAIN_APPROX_SIMPLE,
        )
        .context("Contour extraction failed")?;

        Ok(contours)
    }
}
