//! Per-class non-maximal suppression over IOU.

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::candidate::topk::ScoredCandidate;
use crate::geometry::BBox;
use crate::util::math::prob_cmp_desc;

/// Suppression parameters shared by every class.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NmsParams {
    /// IOU above which a lower-ranked box is suppressed.
    pub iou_thresh: f64,
    /// Added to the IOU denominator.
    pub epsilon: f64,
}

/// Greedy non-maximal suppression over one class.
///
/// Boxes are visited in descending probability order (stable, so ties keep
/// the earlier input as suppressor). Each box that is still kept suppresses
/// every lower-ranked kept box whose IOU with it exceeds `iou_thresh`;
/// suppressed boxes never suppress others. The returned mask is aligned with
/// the input order.
///
/// `boxes` and `probs` must have the same length. Debug builds assert this;
/// release builds only consider the common prefix, so the mask then has the
/// shorter length.
pub fn non_maximal_suppression(boxes: &[BBox], probs: &[f64], params: NmsParams) -> Vec<bool> {
    debug_assert_eq!(boxes.len(), probs.len(), "one probability per box");
    let len = boxes.len().min(probs.len());
    let mut keep = vec![true; len];
    let mut order: Vec<usize> = (0..len).collect();
    order.sort_by(|&a, &b| prob_cmp_desc(probs[a], probs[b]));

    for (rank, &base) in order.iter().enumerate() {
        if !keep[base] {
            continue;
        }
        let base_box = boxes[base];
        for &other in &order[rank + 1..] {
            if keep[other] && base_box.iou(&boxes[other], params.epsilon) > params.iou_thresh {
                keep[other] = false;
            }
        }
    }

    keep
}

/// Candidates of a single class together with their suppression mask.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassGroup {
    /// Class shared by every candidate of the group.
    pub class_idx: usize,
    /// Candidates in rank order.
    pub candidates: Vec<ScoredCandidate>,
    /// `keep[i]` is true when `candidates[i]` survived suppression.
    pub keep: Vec<bool>,
}

impl ClassGroup {
    fn suppress(&mut self, params: NmsParams) {
        let boxes: Vec<BBox> = self.candidates.iter().map(|c| c.bbox).collect();
        let probs: Vec<f64> = self.candidates.iter().map(|c| c.prob).collect();
        self.keep = non_maximal_suppression(&boxes, &probs, params);
    }

    /// Iterates the candidates that survived suppression, in rank order.
    pub fn survivors(&self) -> impl Iterator<Item = &ScoredCandidate> {
        self.candidates
            .iter()
            .zip(self.keep.iter())
            .filter_map(|(candidate, &kept)| kept.then_some(candidate))
    }
}

/// Partitions candidates by class and suppresses each class independently.
///
/// Groups are returned in ascending class order; classes without candidates
/// are omitted. With `parallel` set and the `rayon` feature enabled, classes
/// are processed concurrently; the output is identical either way.
pub fn nms_per_class(
    candidates: &[ScoredCandidate],
    num_classes: usize,
    params: NmsParams,
    parallel: bool,
) -> Vec<ClassGroup> {
    let mut buckets: Vec<Vec<ScoredCandidate>> = vec![Vec::new(); num_classes];
    for candidate in candidates {
        if let Some(bucket) = buckets.get_mut(candidate.class_idx) {
            bucket.push(*candidate);
        }
    }

    let mut groups: Vec<ClassGroup> = buckets
        .into_iter()
        .enumerate()
        .filter(|(_, bucket)| !bucket.is_empty())
        .map(|(class_idx, candidates)| ClassGroup {
            class_idx,
            keep: vec![true; candidates.len()],
            candidates,
        })
        .collect();

    suppress_groups(&mut groups, params, parallel);
    groups
}

#[cfg(feature = "rayon")]
fn suppress_groups(groups: &mut [ClassGroup], params: NmsParams, parallel: bool) {
    if parallel {
        groups.par_iter_mut().for_each(|group| group.suppress(params));
    } else {
        groups.iter_mut().for_each(|group| group.suppress(params));
    }
}

#[cfg(not(feature = "rayon"))]
fn suppress_groups(groups: &mut [ClassGroup], params: NmsParams, _parallel: bool) {
    groups.iter_mut().for_each(|group| group.suppress(params));
}

#[cfg(test)]
mod tests {
    use super::{nms_per_class, non_maximal_suppression, NmsParams};
    use crate::candidate::topk::ScoredCandidate;
    use crate::geometry::BBox;

    const PARAMS: NmsParams = NmsParams {
        iou_thresh: 0.5,
        epsilon: 1e-7,
    };

    fn candidate(bbox: BBox, class_idx: usize, prob: f64, anchor_idx: usize) -> ScoredCandidate {
        ScoredCandidate {
            bbox,
            class_idx,
            prob,
            anchor_idx,
        }
    }

    #[test]
    fn overlapping_lower_score_is_suppressed() {
        let b = BBox::new(10.0, 10.0, 50.0, 50.0);
        let keep = non_maximal_suppression(&[b, b], &[0.9, 0.95], PARAMS);
        assert_eq!(keep, vec![false, true]);
    }

    #[test]
    fn suppressed_box_does_not_suppress_others() {
        // a overlaps b, b overlaps c, a does not overlap c.
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(2.0, 0.0, 12.0, 10.0);
        let c = BBox::new(5.0, 0.0, 15.0, 10.0);
        assert!(a.iou(&b, 1e-7) > 0.5);
        assert!(b.iou(&c, 1e-7) > 0.5);
        assert!(a.iou(&c, 1e-7) <= 0.5);
        let keep = non_maximal_suppression(&[a, b, c], &[0.9, 0.8, 0.7], PARAMS);
        assert_eq!(keep, vec![true, false, true]);
    }

    #[test]
    fn ties_keep_earlier_candidate() {
        let b = BBox::new(0.0, 0.0, 10.0, 10.0);
        let keep = non_maximal_suppression(&[b, b, b], &[0.5, 0.5, 0.5], PARAMS);
        assert_eq!(keep, vec![true, false, false]);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "one probability per box")]
    fn mismatched_lengths_are_rejected() {
        let b = BBox::new(0.0, 0.0, 10.0, 10.0);
        non_maximal_suppression(&[b, b], &[0.9], PARAMS);
    }

    #[test]
    fn iou_equal_to_threshold_is_kept() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(0.0, 0.0, 10.0, 10.0);
        let params = NmsParams {
            iou_thresh: 1.0,
            epsilon: 0.0,
        };
        let keep = non_maximal_suppression(&[a, b], &[0.9, 0.8], params);
        assert_eq!(keep, vec![true, true]);
    }

    #[test]
    fn classes_are_suppressed_independently() {
        let b = BBox::new(0.0, 0.0, 20.0, 20.0);
        let candidates = [
            candidate(b, 2, 0.95, 0),
            candidate(b, 0, 0.9, 1),
            candidate(b, 2, 0.85, 2),
        ];
        let groups = nms_per_class(&candidates, 3, PARAMS, false);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].class_idx, 0);
        assert_eq!(groups[0].keep, vec![true]);
        assert_eq!(groups[1].class_idx, 2);
        assert_eq!(groups[1].keep, vec![true, false]);
        let survivors: Vec<usize> = groups[1].survivors().map(|c| c.anchor_idx).collect();
        assert_eq!(survivors, vec![0]);
    }
}
