// Service exports
pub mod artifact;
pub mod classifier;

pub use artifact::{ArtifactError, ArtifactLoader, ArtifactLocation, LoadedArtifact, ModelArtifact};
pub use classifier::{Classifier, ClassifierModel, DecisionTree, LogisticModel, RandomForest, TreeNode};
