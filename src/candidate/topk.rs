//! Class-agnostic top-N candidate selection.

use std::cmp::Ordering;

use crate::geometry::BBox;
use crate::score::ProbabilityTable;
use crate::util::math::prob_cmp_desc;

/// Decoded box paired with its best class and joint probability.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredCandidate {
    /// Pixel-space box of the anchor.
    pub bbox: BBox,
    /// Class with the highest joint probability for this anchor.
    pub class_idx: usize,
    /// Joint probability of `class_idx`.
    pub prob: f64,
    /// Source anchor index.
    pub anchor_idx: usize,
}

fn candidate_cmp_desc(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    prob_cmp_desc(a.prob, b.prob)
}

/// Sorts candidates by descending probability.
///
/// The sort is stable, so equal probabilities keep their input order.
pub(crate) fn sort_candidates_desc(candidates: &mut [ScoredCandidate]) {
    candidates.sort_by(candidate_cmp_desc);
}

/// Returns the first index holding the row maximum; NaN never wins.
fn argmax(row: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, &value) in row.iter().enumerate() {
        match best {
            Some((_, best_value)) if prob_cmp_desc(value, best_value) != Ordering::Less => {}
            _ => best = Some((idx, value)),
        }
    }
    best
}

/// Selects the `n` anchors with the highest best-class probability.
///
/// Each anchor contributes one candidate, labeled with its arg-max class.
/// Anchors are ranked with a stable descending sort, so ties resolve toward
/// the lower anchor index. `n` is clamped to the number of anchors.
pub fn select_top_n(probs: &ProbabilityTable, boxes: &[BBox], n: usize) -> Vec<ScoredCandidate> {
    let mut ranked: Vec<ScoredCandidate> = probs
        .rows()
        .zip(boxes.iter())
        .enumerate()
        .filter_map(|(anchor_idx, (row, bbox))| {
            argmax(row).map(|(class_idx, prob)| ScoredCandidate {
                bbox: *bbox,
                class_idx,
                prob,
                anchor_idx,
            })
        })
        .collect();

    sort_candidates_desc(&mut ranked);
    ranked.truncate(n);
    ranked
}
