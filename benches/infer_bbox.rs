use criterion::{criterion_group, criterion_main, Criterion};
use infer_bbox::lowlevel::{non_maximal_suppression, NmsParams};
use infer_bbox::{BBox, Detector, DetectorConfig};
use std::hint::black_box;

fn make_outputs(anchors: usize, num_classes: usize) -> (Vec<f32>, Vec<f32>, Vec<f32>) {
    let delta = (0..anchors * 4)
        .map(|i| (((i * 13) ^ (i * 7)) % 200) as f32 / 100.0 - 1.0)
        .collect();
    let class_scores = (0..anchors * num_classes)
        .map(|i| ((i * 31) % 97) as f32 / 97.0 / num_classes as f32)
        .collect();
    let conf = (0..anchors).map(|i| ((i * 17) % 53) as f32 / 52.0).collect();
    (delta, class_scores, conf)
}

fn bench_filter(c: &mut Criterion) {
    let cfg = DetectorConfig::default();
    let (delta, class_scores, conf) = make_outputs(cfg.anchors(), cfg.num_classes());
    let detector = Detector::new(cfg.clone()).unwrap();
    let pred = detector.prediction(&delta, &class_scores, &conf).unwrap();

    c.bench_function("filter_default_geometry", |b| {
        b.iter(|| black_box(detector.detect(black_box(&pred), 0.1)));
    });

    let wide = Detector::new(DetectorConfig {
        n_top_detections: 1024,
        ..cfg
    })
    .unwrap();
    let wide_pred = wide.prediction(&delta, &class_scores, &conf).unwrap();
    c.bench_function("filter_top_1024", |b| {
        b.iter(|| black_box(wide.detect(black_box(&wide_pred), 0.1)));
    });
}

fn bench_nms(c: &mut Criterion) {
    let boxes: Vec<BBox> = (0..512)
        .map(|i| {
            let x = ((i * 37) % 400) as f64;
            let y = ((i * 53) % 400) as f64;
            BBox::new(x, y, x + 40.0, y + 40.0)
        })
        .collect();
    let probs: Vec<f64> = (0..512).map(|i| ((i * 29) % 511) as f64 / 511.0).collect();
    let params = NmsParams {
        iou_thresh: 0.3,
        epsilon: 1e-7,
    };

    c.bench_function("nms_512_boxes", |b| {
        b.iter(|| black_box(non_maximal_suppression(&boxes, &probs, params)));
    });
}

criterion_group!(benches, bench_filter, bench_nms);
criterion_main!(benches);
