//! Model training and evaluation
//!
//! Fits the one model this system supports: a bagged ensemble of Gini
//! decision trees over the fixed student-record schema, with stratified
//! splitting, cross-validated accuracy, and impurity-based feature
//! importances.

pub mod decision_tree;
pub mod random_forest;
pub mod split;
pub mod metrics;
mod pipeline;

pub use decision_tree::{DecisionTree, TreeNode};
pub use random_forest::RandomForest;
pub use split::{stratified_split, StratifiedKFold};
pub use metrics::{ClassMetrics, ConfusionCounts, CvSummary, EvalReport, FeatureImportance};
pub use pipeline::{ModelArtifact, TrainConfig, TrainOutput, Trainer};
