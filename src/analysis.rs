use opencv::core::Size;
use serde::Serialize;

use crate::filter::CandidateRect;

/// Scalar outputs of one pipeline cycle.
///
/// `tx`/`ty` are the offset of the selected candidate's center from the frame
/// center, in pixels, using the same integer-truncating center arithmetic as
/// the telemetry consumers expect. `ta` is the candidate's bounding-box area;
/// zero when nothing was selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TargetReport {
    pub val: u32,
    pub tx: f64,
    pub ty: f64,
    pub ta: f64,
}

/// Picks the best candidate of a cycle and derives its telemetry report.
pub struct BallTargetAnalyzer {}

impl BallTargetAnalyzer {
    pub fn new() -> Self {
        BallTargetAnalyzer {}
    }

    /// Selects the candidate with the strictly largest bounding-box area.
    /// Equal areas keep the incumbent, so ties resolve to the first-seen
    /// candidate in extraction order.
    pub fn select_target(&self, candidates: &[CandidateRect]) -> Option<CandidateRect> {
        candidates.iter().fold(None, |best, candidate| match best {
            Some(incumbent) if incumbent.area >= candidate.area => Some(incumbent),
            _ => Some(*candidate),
        })
    }

    /// Builds the cycle report from the surviving candidates. A degenerate
    /// frame (zero width or height) is treated as having no candidates.
    pub fn report(&self, candidates: &[CandidateRect], frame_size: Size) -> TargetReport {
        if frame_size.width <= 0 || frame_size.height <= 0 {
            return TargetReport::default();
        }

        let best = match self.select_target(candidates) {
            Some(best) => best,
            None => return TargetReport::default(),
        };

        let center_x = best.rect.x + best.rect.width / 2;
        let center_y = best.rect.y + best.rect.height / 2;

        TargetReport {
            val: candidates.len() as u32,
            tx: (center_x - frame_size.width / 2) as f64,
            ty: (center_y - frame_size.height / 2) as f64,
            ta: best.area,
        }
    }
}
