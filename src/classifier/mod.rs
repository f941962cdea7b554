//! Cultivation Classifier
//!
//! Decides whether a parcel is actively cultivated from remote-sensing
//! statistics. Two interchangeable probability estimators are selected at
//! construction time:
//!
//! - `Learned`: a boosted tree ensemble loaded from a file artifact
//! - `RuleBased`: the deterministic optical + radar fusion formula
//!
//! A missing or corrupt artifact, or an inference error, always degrades to
//! the rule-based estimator. Classification never fails.
//!
//! Decision thresholds (both modes): > 0.7 PASS, > 0.4 REVIEW, else FAIL.

pub mod features;
pub mod model;
pub mod fallback;

pub use features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use model::BoostedTreeModel;
pub use fallback::rule_based_classification;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::data::ParcelStatistics;
use crate::utils::{clamp_unit, round_to};

/// Probability above which a parcel passes
pub const PASS_THRESHOLD: f64 = 0.7;

/// Probability above which a parcel goes to manual review
pub const REVIEW_THRESHOLD: f64 = 0.4;

/// Cultivation decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Pass,
    Review,
    Fail,
}

impl Decision {
    pub fn from_probability(probability: f64) -> Self {
        if probability > PASS_THRESHOLD {
            Decision::Pass
        } else if probability > REVIEW_THRESHOLD {
            Decision::Review
        } else {
            Decision::Fail
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Pass => "PASS",
            Decision::Review => "REVIEW",
            Decision::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// 0.0-1.0, rounded to 4 decimals
    pub agricultural_probability: f64,
    pub decision: Decision,
    /// Feature → weight, summing to ~1 (empty for a degenerate plot)
    pub feature_importance: BTreeMap<String, f64>,
    pub using_learned_model: bool,
}

/// Probability estimator strategy
#[derive(Debug, Clone)]
pub enum ProbabilityEstimator {
    Learned(BoostedTreeModel),
    RuleBased,
}

/// Agricultural land classifier
#[derive(Debug, Clone)]
pub struct CultivationClassifier {
    estimator: ProbabilityEstimator,
}

impl CultivationClassifier {
    pub fn new(estimator: ProbabilityEstimator) -> Self {
        Self { estimator }
    }

    /// Classifier without a learned model
    pub fn rule_based() -> Self {
        Self::new(ProbabilityEstimator::RuleBased)
    }

    /// Load the model artifact if one is configured and readable.
    ///
    /// Absence or corruption is logged and yields the rule-based estimator.
    pub fn from_artifact(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            tracing::info!("No model artifact configured; using rule-based fallback");
            return Self::rule_based();
        };

        if !path.exists() {
            tracing::info!(
                "Model file not found at {:?}; using rule-based fallback. Run the training job to produce one.",
                path
            );
            return Self::rule_based();
        }

        match BoostedTreeModel::load(path) {
            Ok(model) => {
                tracing::info!("Boosted tree model loaded from {:?} ({} trees)", path, model.trees.len());
                Self::new(ProbabilityEstimator::Learned(model))
            }
            Err(e) => {
                tracing::warn!("Failed to load model artifact {:?}: {}; using fallback", path, e);
                Self::rule_based()
            }
        }
    }

    /// True when a learned model is loaded
    pub fn is_learned(&self) -> bool {
        matches!(self.estimator, ProbabilityEstimator::Learned(_))
    }

    /// Classify one parcel
    pub fn classify(&self, features: &FeatureVector, stats: &ParcelStatistics) -> ClassificationResult {
        let result = match &self.estimator {
            ProbabilityEstimator::Learned(model) => match Self::classify_learned(model, features) {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!("Model prediction failed: {}; using fallback", e);
                    rule_based_classification(stats)
                }
            },
            ProbabilityEstimator::RuleBased => rule_based_classification(stats),
        };

        tracing::info!(
            "Classification: prob={:.4} decision={} using_learned_model={}",
            result.agricultural_probability,
            result.decision,
            result.using_learned_model
        );
        result
    }

    fn classify_learned(
        model: &BoostedTreeModel,
        features: &FeatureVector,
    ) -> Result<ClassificationResult, crate::error::ModelError> {
        let probability = clamp_unit(model.predict_probability(&features.as_model_input())?);

        Ok(ClassificationResult {
            agricultural_probability: round_to(probability, 4),
            decision: Decision::from_probability(probability),
            feature_importance: model.feature_importance(),
            using_learned_model: true,
        })
    }
}

impl Default for CultivationClassifier {
    fn default() -> Self {
        Self::rule_based()
    }
}
