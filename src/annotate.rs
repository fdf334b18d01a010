use anyhow::{Context, Result};
use opencv::{
    core::{Mat, Scalar},
    imgproc,
    prelude::*,
};

use crate::filter::CandidateRect;

const OUTLINE_THICKNESS: i32 = 2;

// Red, in the frame's BGR channel order.
fn outline_color() -> Scalar {
    Scalar::new(0., 0., 255., 0.)
}

/// Returns a copy of the frame with the selected target's bounding box drawn
/// on it. Without a target the copy is returned unmodified; one annotated
/// frame is produced every cycle either way.
pub fn annotate_frame(frame: &Mat, target: Option<&CandidateRect>) -> Result<Mat> {
    let mut annotated = frame.try_clone().context("Frame clone failed")?;

    if let Some(target) = target {
        imgproc::rectangle(
            &mut annotated,
            target.rect,
            outline_color(),
            OUTLINE_THICKNESS,
            imgproc::LINE_8,
            0,
        )
        .context("Rectangle overlay failed")?;
    }

    Ok(annotated)
}

#[cfg(test)]
mod tests {
    use super::*;

    use opencv::core::{self, Rect};

    fn black_frame(width: i32, height: i32) -> Mat {
        Mat::new_rows_cols_with_default(height, width, core::CV_8UC3, Scalar::all(0.)).unwrap()
    }

    #[test]
    fn no_target_returns_identical_copy() {
        let frame = black_frame(320, 240);

        let annotated = annotate_frame(&frame, None).unwrap();

        assert_eq!(annotated.size().unwrap(), frame.size().unwrap());
        let diff = core::norm2_def(&annotated, &frame).unwrap();
        assert_eq!(diff, 0.);
    }

    #[test]
    fn target_outline_modifies_copy_not_original() {
        let frame = black_frame(320, 240);
        let target = CandidateRect::from_rect(Rect::new(100, 60, 40, 40));

        let annotated = annotate_frame(&frame, Some(&target)).unwrap();

        assert_eq!(annotated.size().unwrap(), frame.size().unwrap());
        assert!(core::norm2_def(&annotated, &frame).unwrap() > 0.);
        // The original frame stays black.
        assert_eq!(core::count_non_zero(&frame.reshape(1, 0).unwrap()).unwrap(), 0);

        // A pixel on the outline is pure red in BGR order.
        let pixel = annotated.at_2d::<core::Vec3b>(60, 120).unwrap();
        assert_eq!(*pixel, core::Vec3b::from([0, 0, 255]));
    }
}
