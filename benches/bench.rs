// Criterion benchmarks for Heart Risk

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use heart_risk::core::{validate, Predictor};
use heart_risk::models::RawFields;
use heart_risk::services::{DecisionTree, LoadedArtifact, TreeNode};

fn sample_fields() -> RawFields {
    serde_json::from_value(serde_json::json!({
        "generation": "baby boomer",
        "gender": "1",
        "chest_pain_type": "3",
        "resting_bp_category": "2",
        "cholesterol_category": "1",
        "fasting_blood_sugar": "1",
        "resting_ecg": "0",
        "max_heart_rate": "132.5",
        "exercise_angina": "1",
        "st_depression": "2.4",
        "st_slope": "2",
        "vessels_count": "2",
        "thalassemia_type": "3"
    }))
    .unwrap()
}

/// Complete binary tree of the given depth, splitting round-robin over features
fn deep_tree(depth: u32) -> DecisionTree {
    let internal = (1usize << depth) - 1;
    let total = (1usize << (depth + 1)) - 1;
    let nodes = (0..total)
        .map(|i| {
            if i < internal {
                TreeNode::Split {
                    feature: i % 13,
                    threshold: (i % 5) as f64,
                    left: 2 * i + 1,
                    right: 2 * i + 2,
                }
            } else {
                TreeNode::Leaf { class: (i % 2) as i64 }
            }
        })
        .collect();
    DecisionTree { nodes }
}

fn forest_artifact(trees: usize, depth: u32) -> LoadedArtifact {
    let trees: Vec<DecisionTree> = (0..trees).map(|_| deep_tree(depth)).collect();
    let json = serde_json::json!({
        "name": "bench-forest",
        "generation_encoding": {"gen Z": 0, "millennials": 1, "gen X": 2, "baby boomer": 3},
        "classifier": {"kind": "random_forest", "trees": trees}
    });
    LoadedArtifact::from_slice(json.to_string().as_bytes()).unwrap()
}

fn bench_validate(c: &mut Criterion) {
    let raw = sample_fields();
    c.bench_function("validate", |b| {
        b.iter(|| validate(black_box(&raw)))
    });
}

fn bench_predict(c: &mut Criterion) {
    let features = validate(&sample_fields()).unwrap();
    let mut group = c.benchmark_group("predict_forest");

    for trees in [1usize, 10, 100] {
        let artifact = forest_artifact(trees, 8);
        let predictor = Predictor::new(artifact.classifier.clone(), artifact.encoding);

        group.bench_with_input(BenchmarkId::from_parameter(trees), &predictor, |b, predictor| {
            b.iter(|| predictor.predict(black_box(&features)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_validate, bench_predict);
criterion_main!(benches);
