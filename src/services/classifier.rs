use crate::models::{FeatureVector, FEATURE_COUNT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Binary classifier consumed by the prediction pipeline
///
/// Implementations must be deterministic and side-effect free. The output
/// is returned as-is; checking it against {0, 1} is the caller's job.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> i64;

    /// Short name of the model family
    fn kind(&self) -> &'static str;
}

/// Output of a forest with no votes; outside {0, 1} so the pipeline rejects it
pub const NO_VOTE: i64 = -1;

fn default_threshold() -> f64 {
    0.5
}

/// Logistic regression over the raw feature vector
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LogisticModel {
    pub fn probability(&self, features: &FeatureVector) -> f64 {
        let z = self
            .coefficients
            .iter()
            .zip(features.iter())
            .fold(self.intercept, |acc, (w, x)| acc + w * x);
        1.0 / (1.0 + (-z).exp())
    }

    pub(crate) fn check_shape(&self) -> Result<(), String> {
        if self.coefficients.len() != FEATURE_COUNT {
            return Err(format!(
                "logistic model expects {} coefficients, got {}",
                FEATURE_COUNT,
                self.coefficients.len()
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|w| !w.is_finite()) {
            return Err("logistic model has non-finite parameters".to_string());
        }
        Ok(())
    }
}

impl Classifier for LogisticModel {
    fn predict(&self, features: &FeatureVector) -> i64 {
        if self.probability(features) >= self.threshold { 1 } else { 0 }
    }

    fn kind(&self) -> &'static str {
        "logistic"
    }
}

/// Node of a flattened decision tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    /// Go left when `x[feature] <= threshold`
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        class: i64,
    },
}

/// Decision tree stored as a node list rooted at index 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Children must point forward, which rules out cycles
    pub(crate) fn check_shape(&self) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("decision tree has no nodes".to_string());
        }

        for (index, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split { feature, left, right, threshold } = node {
                if *feature >= FEATURE_COUNT {
                    return Err(format!(
                        "node {} splits on feature {}, only {} features exist",
                        index, feature, FEATURE_COUNT
                    ));
                }
                if threshold.is_nan() {
                    return Err(format!("node {} has a NaN threshold", index));
                }
                for child in [*left, *right] {
                    if child <= index || child >= self.nodes.len() {
                        return Err(format!("node {} has invalid child {}", index, child));
                    }
                }
            }
        }

        Ok(())
    }
}

impl Classifier for DecisionTree {
    fn predict(&self, features: &FeatureVector) -> i64 {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { class } => return *class,
                TreeNode::Split { feature, threshold, left, right } => {
                    index = if features[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    fn kind(&self) -> &'static str {
        "decision_tree"
    }
}

/// Majority vote over decision trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub(crate) fn check_shape(&self) -> Result<(), String> {
        if self.trees.is_empty() {
            return Err("random forest has no trees".to_string());
        }
        self.trees
            .iter()
            .enumerate()
            .try_for_each(|(i, tree)| tree.check_shape().map_err(|e| format!("tree {}: {}", i, e)))
    }
}

impl Classifier for RandomForest {
    /// Ties go to the smaller class value
    fn predict(&self, features: &FeatureVector) -> i64 {
        let mut votes: BTreeMap<i64, usize> = BTreeMap::new();
        for tree in &self.trees {
            *votes.entry(tree.predict(features)).or_insert(0) += 1;
        }

        let mut best: Option<(i64, usize)> = None;
        for (class, count) in votes {
            match best {
                Some((_, best_count)) if count <= best_count => {}
                _ => best = Some((class, count)),
            }
        }
        best.map(|(class, _)| class).unwrap_or(NO_VOTE)
    }

    fn kind(&self) -> &'static str {
        "random_forest"
    }
}

/// Any classifier the artifact format can describe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierModel {
    Logistic(LogisticModel),
    DecisionTree(DecisionTree),
    RandomForest(RandomForest),
}

impl ClassifierModel {
    pub(crate) fn check_shape(&self) -> Result<(), String> {
        match self {
            ClassifierModel::Logistic(model) => model.check_shape(),
            ClassifierModel::DecisionTree(tree) => tree.check_shape(),
            ClassifierModel::RandomForest(forest) => forest.check_shape(),
        }
    }
}

impl Classifier for ClassifierModel {
    fn predict(&self, features: &FeatureVector) -> i64 {
        match self {
            ClassifierModel::Logistic(model) => model.predict(features),
            ClassifierModel::DecisionTree(tree) => tree.predict(features),
            ClassifierModel::RandomForest(forest) => forest.predict(features),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ClassifierModel::Logistic(model) => model.kind(),
            ClassifierModel::DecisionTree(tree) => tree.kind(),
            ClassifierModel::RandomForest(forest) => forest.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(feature: usize, threshold: f64, below: i64, above: i64) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split { feature, threshold, left: 1, right: 2 },
                TreeNode::Leaf { class: below },
                TreeNode::Leaf { class: above },
            ],
        }
    }

    #[test]
    fn test_logistic_threshold() {
        let mut coefficients = vec![0.0; FEATURE_COUNT];
        coefficients[7] = 0.1;
        let model = LogisticModel { coefficients, intercept: -15.0, threshold: 0.5 };

        let mut x = [0.0; FEATURE_COUNT];
        x[7] = 100.0;
        assert_eq!(model.predict(&x), 0);
        x[7] = 200.0;
        assert_eq!(model.predict(&x), 1);
    }

    #[test]
    fn test_logistic_shape() {
        let model = LogisticModel { coefficients: vec![1.0; 12], intercept: 0.0, threshold: 0.5 };
        assert!(model.check_shape().is_err());
    }

    #[test]
    fn test_tree_traversal() {
        let tree = stump(2, 1.5, 0, 1);
        let mut x = [0.0; FEATURE_COUNT];
        x[2] = 1.0;
        assert_eq!(tree.predict(&x), 0);
        x[2] = 3.0;
        assert_eq!(tree.predict(&x), 1);
    }

    #[test]
    fn test_tree_shape_rejects_backward_child() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split { feature: 0, threshold: 0.0, left: 0, right: 1 },
                TreeNode::Leaf { class: 1 },
            ],
        };
        assert!(tree.check_shape().is_err());
    }

    #[test]
    fn test_tree_shape_rejects_unknown_feature() {
        assert!(stump(FEATURE_COUNT, 0.0, 0, 1).check_shape().is_err());
    }

    #[test]
    fn test_forest_majority() {
        let forest = RandomForest {
            trees: vec![stump(0, 0.5, 0, 1), stump(1, 0.5, 0, 1), stump(2, 0.5, 0, 1)],
        };
        let mut x = [0.0; FEATURE_COUNT];
        x[0] = 1.0;
        x[1] = 1.0;
        assert_eq!(forest.predict(&x), 1);
        x[1] = 0.0;
        assert_eq!(forest.predict(&x), 0);
    }

    #[test]
    fn test_forest_tie_goes_to_smaller_class() {
        let forest = RandomForest { trees: vec![stump(0, 0.5, 0, 1), stump(1, 0.5, 0, 1)] };
        let mut x = [0.0; FEATURE_COUNT];
        x[0] = 1.0;
        assert_eq!(forest.predict(&x), 0);
    }

    #[test]
    fn test_empty_forest_has_no_vote() {
        let forest = RandomForest { trees: vec![] };
        assert_eq!(forest.predict(&[0.0; FEATURE_COUNT]), NO_VOTE);
        assert!(forest.check_shape().is_err());
    }

    #[test]
    fn test_model_deserializes_by_kind() {
        let json = r#"{
            "kind": "decision_tree",
            "nodes": [
                {"feature": 11, "threshold": 0.5, "left": 1, "right": 2},
                {"class": 0},
                {"class": 1}
            ]
        }"#;
        let model: ClassifierModel = serde_json::from_str(json).unwrap();
        assert_eq!(model.kind(), "decision_tree");
        assert!(model.check_shape().is_ok());
    }
}
