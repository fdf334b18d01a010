use anyhow::Result;
use opencv::{
    core::{self, Mat, Rect, Scalar},
    imgproc,
    prelude::*,
};

use ball_vision::analysis::TargetReport;
use ball_vision::camera::Camera;
use ball_vision::config::{OffsetPolicy, PipelineConfig};
use ball_vision::pipeline::VisionPipeline;

// BGR (0, 255, 128) is HSV (45, 255, 255), the middle of the default band.
const TARGET_BGR: (f64, f64, f64) = (0., 255., 128.);

struct FakeCamera {
    frames: Vec<Mat>,
}

impl FakeCamera {
    fn new(frames: Vec<Mat>) -> Self {
        FakeCamera { frames }
    }
}

impl Camera for FakeCamera {
    fn grab_frame(&mut self) -> Result<Option<Mat>> {
        if self.frames.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.frames.remove(0)))
    }
}

fn solid_frame(width: i32, height: i32, bgr: (f64, f64, f64)) -> Mat {
    Mat::new_rows_cols_with_default(
        height,
        width,
        core::CV_8UC3,
        Scalar::new(bgr.0, bgr.1, bgr.2, 0.),
    )
    .unwrap()
}

fn draw_region(frame: &mut Mat, rect: Rect) {
    imgproc::rectangle(
        frame,
        rect,
        Scalar::new(TARGET_BGR.0, TARGET_BGR.1, TARGET_BGR.2, 0.),
        imgproc::FILLED,
        imgproc::LINE_8,
        0,
    )
    .unwrap();
}

fn frame_with_regions(rects: &[Rect]) -> Mat {
    let mut frame = solid_frame(320, 240, (0., 0., 0.));
    for rect in rects {
        draw_region(&mut frame, *rect);
    }
    frame
}

/// Pipeline with a 1x1 blur kernel so region geometry survives exactly.
fn exact_pipeline(frames: Vec<Mat>) -> VisionPipeline<FakeCamera> {
    let config = PipelineConfig {
        blur_kernel: 1,
        ..PipelineConfig::default()
    };
    VisionPipeline::new(FakeCamera::new(frames), &config)
}

#[test]
fn out_of_range_frame_reports_nothing() {
    // Pure blue is far outside the hue band; default 13x13 blur.
    let frame = solid_frame(320, 240, (255., 0., 0.));
    let mut pipeline = VisionPipeline::new(FakeCamera::new(vec![]), &PipelineConfig::default());

    let output = pipeline.process(&frame).unwrap();

    assert_eq!(output.report, TargetReport::default());
    assert_eq!(output.annotated.size().unwrap(), frame.size().unwrap());
    assert_eq!(core::norm2_def(&output.annotated, &frame).unwrap(), 0.);
}

#[test]
fn single_square_reports_center_offset_and_area() {
    let frame = frame_with_regions(&[Rect::new(100, 60, 40, 40)]);
    let mut pipeline = exact_pipeline(vec![]);

    let output = pipeline.process(&frame).unwrap();

    assert_eq!(output.report.val, 1);
    assert_eq!(output.report.tx, -40.);
    assert_eq!(output.report.ty, -40.);
    assert_eq!(output.report.ta, 1600.);
    // The annotated frame differs from the input where the outline was drawn.
    assert!(core::norm2_def(&output.annotated, &frame).unwrap() > 0.);
}

#[test]
fn larger_of_two_regions_is_selected() {
    let frame = frame_with_regions(&[Rect::new(20, 20, 40, 40), Rect::new(200, 120, 60, 60)]);
    let mut pipeline = exact_pipeline(vec![]);

    let report = pipeline.process(&frame).unwrap().report;

    assert_eq!(report.val, 2);
    assert_eq!(report.ta, 3600.);
    assert_eq!(report.tx, 70.);
    assert_eq!(report.ty, 30.);
}

#[test]
fn region_below_area_floor_is_ignored() {
    // 7x7 = 49 px^2, below the 60 px^2 floor.
    let frame = frame_with_regions(&[Rect::new(150, 110, 7, 7)]);
    let mut pipeline = exact_pipeline(vec![]);

    let output = pipeline.process(&frame).unwrap();

    assert_eq!(output.report, TargetReport::default());
    assert_eq!(core::norm2_def(&output.annotated, &frame).unwrap(), 0.);
}

#[test]
fn region_with_bad_aspect_is_ignored_even_when_alone() {
    // 20x5 passes the area floor but has aspect 4.0.
    let frame = frame_with_regions(&[Rect::new(100, 100, 20, 5)]);
    let mut pipeline = exact_pipeline(vec![]);

    let output = pipeline.process(&frame).unwrap();

    assert_eq!(output.report, TargetReport::default());
}

#[test]
fn processing_is_idempotent() {
    let frame = frame_with_regions(&[Rect::new(100, 60, 40, 40)]);
    let mut pipeline = exact_pipeline(vec![]);

    let first = pipeline.process(&frame).unwrap();
    let second = pipeline.process(&frame).unwrap();

    assert_eq!(first.report, second.report);
    assert_eq!(core::norm2_def(&first.annotated, &second.annotated).unwrap(), 0.);
}

#[test]
fn reset_policy_zeroes_offsets_after_detection_loss() {
    let with_target = frame_with_regions(&[Rect::new(100, 60, 40, 40)]);
    let empty = solid_frame(320, 240, (0., 0., 0.));
    let mut pipeline = exact_pipeline(vec![]);

    assert_eq!(pipeline.process(&with_target).unwrap().report.tx, -40.);
    let report = pipeline.process(&empty).unwrap().report;

    assert_eq!(report, TargetReport::default());
}

#[test]
fn hold_policy_keeps_last_offsets_after_detection_loss() {
    let with_target = frame_with_regions(&[Rect::new(100, 60, 40, 40)]);
    let empty = solid_frame(320, 240, (0., 0., 0.));
    let config = PipelineConfig {
        blur_kernel: 1,
        offset_policy: OffsetPolicy::Hold,
        ..PipelineConfig::default()
    };
    let mut pipeline = VisionPipeline::new(FakeCamera::new(vec![]), &config);

    pipeline.process(&with_target).unwrap();
    let report = pipeline.process(&empty).unwrap().report;

    assert_eq!(report.val, 0);
    assert_eq!(report.ta, 0.);
    assert_eq!(report.tx, -40.);
    assert_eq!(report.ty, -40.);
}

#[test]
fn run_loop_stops_when_the_stream_ends() {
    let frames = vec![
        frame_with_regions(&[Rect::new(100, 60, 40, 40)]),
        solid_frame(320, 240, (0., 0., 0.)),
    ];
    let mut pipeline = exact_pipeline(frames);

    let first = pipeline.run().unwrap().expect("first frame");
    assert_eq!(first.report.val, 1);

    let second = pipeline.run().unwrap().expect("second frame");
    assert_eq!(second.report.val, 0);

    assert!(pipeline.run().unwrap().is_none());
}
