//! Boosted Tree Model
//!
//! File-backed gradient-boosted tree ensemble produced by the offline
//! training job. The artifact is JSON:
//!
//! ```json
//! {
//!   "feature_names": ["ndvi_mean", "ndvi_stddev", "..."],
//!   "base_score": -0.2,
//!   "trees": [
//!     { "nodes": [
//!         { "feature": 0, "threshold": 0.45, "yes": 1, "no": 2, "gain": 31.5 },
//!         { "leaf": -0.8 },
//!         { "leaf": 0.9 }
//!     ] }
//!   ]
//! }
//! ```
//!
//! A split sends `value < threshold` to `yes`. The probability is the logistic
//! of `base_score` plus the leaf reached in every tree. Loaded once, then
//! read-only; safe to share across threads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::features::{FEATURE_COUNT, FEATURE_NAMES};
use crate::error::ModelError;
use crate::utils::l1_normalize;

/// Serialized gradient-boosted tree ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostedTreeModel {
    pub feature_names: Vec<String>,
    /// Initial margin (log-odds)
    #[serde(default)]
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

/// One regression tree; node 0 is the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        yes: usize,
        no: usize,
        #[serde(default)]
        gain: f64,
    },
    Leaf {
        leaf: f64,
    },
}

impl BoostedTreeModel {
    /// Load and structurally validate an artifact
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse and validate an artifact from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: BoostedTreeModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<(), ModelError> {
        let expected: Vec<&str> = FEATURE_NAMES.to_vec();
        let actual: Vec<&str> = self.feature_names.iter().map(String::as_str).collect();
        if actual != expected {
            return Err(ModelError::Malformed(format!(
                "feature order mismatch: expected {:?}, got {:?}",
                expected, actual
            )));
        }
        if !self.base_score.is_finite() {
            return Err(ModelError::Malformed("non-finite base_score".into()));
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(ModelError::Malformed(format!("tree {} has no nodes", t)));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match *node {
                    TreeNode::Split { feature, threshold, yes, no, .. } => {
                        if feature >= FEATURE_COUNT {
                            return Err(ModelError::Malformed(format!(
                                "tree {} node {}: feature index {} out of range",
                                t, i, feature
                            )));
                        }
                        if !threshold.is_finite() {
                            return Err(ModelError::Malformed(format!(
                                "tree {} node {}: non-finite threshold",
                                t, i
                            )));
                        }
                        // Children must come after their parent: rules out cycles
                        for child in [yes, no] {
                            if child <= i || child >= tree.nodes.len() {
                                return Err(ModelError::Malformed(format!(
                                    "tree {} node {}: invalid child index {}",
                                    t, i, child
                                )));
                            }
                        }
                    }
                    TreeNode::Leaf { leaf } => {
                        if !leaf.is_finite() {
                            return Err(ModelError::Malformed(format!(
                                "tree {} node {}: non-finite leaf",
                                t, i
                            )));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Raw margin (log-odds) for one input row
    pub fn margin(&self, input: &[f64; FEATURE_COUNT]) -> Result<f64, ModelError> {
        let mut margin = self.base_score;
        for (t, tree) in self.trees.iter().enumerate() {
            margin += tree.leaf_value(input).ok_or_else(|| {
                ModelError::Inference(format!("tree {} traversal did not reach a leaf", t))
            })?;
        }
        if !margin.is_finite() {
            return Err(ModelError::Inference("non-finite margin".into()));
        }
        Ok(margin)
    }

    /// Agricultural probability for one input row
    pub fn predict_probability(&self, input: &[f64; FEATURE_COUNT]) -> Result<f64, ModelError> {
        let margin = self.margin(input)?;
        Ok(1.0 / (1.0 + (-margin).exp()))
    }

    /// Mean split gain per feature, L1-normalized (3 decimals)
    pub fn feature_importance(&self) -> BTreeMap<String, f64> {
        let mut totals = [0.0f64; FEATURE_COUNT];
        let mut counts = [0usize; FEATURE_COUNT];

        for tree in &self.trees {
            for node in &tree.nodes {
                if let TreeNode::Split { feature, gain, .. } = *node {
                    if feature < FEATURE_COUNT && gain.is_finite() && gain > 0.0 {
                        totals[feature] += gain;
                        counts[feature] += 1;
                    }
                }
            }
        }

        let mean_gain: BTreeMap<String, f64> = FEATURE_NAMES
            .iter()
            .enumerate()
            .filter(|(i, _)| counts[*i] > 0)
            .map(|(i, name)| (name.to_string(), totals[i] / counts[i] as f64))
            .collect();

        l1_normalize(&mean_gain, 3)
    }
}

impl Tree {
    fn leaf_value(&self, input: &[f64; FEATURE_COUNT]) -> Option<f64> {
        let mut index = 0;
        // Bounded walk: each step moves strictly forward
        for _ in 0..self.nodes.len() {
            match *self.nodes.get(index)? {
                TreeNode::Leaf { leaf } => return Some(leaf),
                TreeNode::Split { feature, threshold, yes, no, .. } => {
                    let value = *input.get(feature)?;
                    index = if value < threshold { yes } else { no };
                }
            }
        }
        None
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Two-tree model keyed on NDVI and VH/VV ratio
    pub(crate) const TWO_TREE_MODEL: &str = r#"{
        "feature_names": ["ndvi_mean", "ndvi_stddev", "vh_mean_db", "vh_vv_ratio",
                          "elevation_m", "slope_deg", "rainfall_mm", "soil_moisture"],
        "base_score": 0.0,
        "trees": [
            { "nodes": [
                { "feature": 0, "threshold": 0.45, "yes": 1, "no": 2, "gain": 30.0 },
                { "leaf": -1.5 },
                { "leaf": 1.0 }
            ] },
            { "nodes": [
                { "feature": 3, "threshold": 0.4, "yes": 1, "no": 2, "gain": 10.0 },
                { "leaf": -0.5 },
                { "leaf": 1.0 }
            ] }
        ]
    }"#;

    #[test]
    fn test_predict_cropland_like_input() {
        let model = BoostedTreeModel::from_json(TWO_TREE_MODEL).unwrap();
        let input = [0.8, 0.1, -10.0, 0.6, 40.0, 2.0, 600.0, 0.3];
        // margin = 1.0 + 1.0 = 2.0
        assert_relative_eq!(model.margin(&input).unwrap(), 2.0, epsilon = 1e-12);
        let p = model.predict_probability(&input).unwrap();
        assert_relative_eq!(p, 1.0 / (1.0 + (-2.0f64).exp()), epsilon = 1e-12);
    }

    #[test]
    fn test_predict_forest_like_input() {
        let model = BoostedTreeModel::from_json(TWO_TREE_MODEL).unwrap();
        let input = [0.3, 0.02, -15.0, 0.2, 600.0, 20.0, 2500.0, 0.4];
        assert_relative_eq!(model.margin(&input).unwrap(), -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_feature_importance_normalized() {
        let model = BoostedTreeModel::from_json(TWO_TREE_MODEL).unwrap();
        let importance = model.feature_importance();
        assert_eq!(importance.len(), 2);
        assert_eq!(importance["ndvi_mean"], 0.75);
        assert_eq!(importance["vh_vv_ratio"], 0.25);
    }

    #[test]
    fn test_rejects_wrong_feature_order() {
        let json = TWO_TREE_MODEL.replace("\"ndvi_mean\", \"ndvi_stddev\"", "\"ndvi_stddev\", \"ndvi_mean\"");
        assert!(matches!(BoostedTreeModel::from_json(&json), Err(ModelError::Malformed(_))));
    }

    #[test]
    fn test_rejects_backward_child_index() {
        let json = TWO_TREE_MODEL.replace("\"yes\": 1, \"no\": 2, \"gain\": 30.0", "\"yes\": 0, \"no\": 2, \"gain\": 30.0");
        assert!(matches!(BoostedTreeModel::from_json(&json), Err(ModelError::Malformed(_))));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(BoostedTreeModel::from_json("not json"), Err(ModelError::Parse(_))));
    }
}
