// File: src/core/classifier.rs
use crate::core::types::{FeatureVector, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

/// Child index marking a leaf in the flat tree arrays.
const LEAF: i64 = -1;

/// Single-row inference over an encoded feature vector.
/// Returns the label code to be decoded by the target encoder.
pub trait Classifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> usize;
}

/// A binary decision tree stored as parallel arrays indexed by node id.
/// Node 0 is the root. `value[node]` holds per-class weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    pub fn n_nodes(&self) -> usize {
        self.children_left.len()
    }

    fn validate(&self, n_classes: usize) -> Result<(), String> {
        let n = self.n_nodes();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err(format!("tree arrays disagree on node count {n}"));
        }

        for node in 0..n {
            if self.value[node].len() != n_classes {
                return Err(format!(
                    "node {node} has {} class weights, expected {n_classes}",
                    self.value[node].len()
                ));
            }

            let (left, right) = (self.children_left[node], self.children_right[node]);
            if left == LEAF && right == LEAF {
                continue;
            }
            // children always follow their parent, so traversal terminates
            for child in [left, right] {
                if child <= node as i64 || child >= n as i64 {
                    return Err(format!("node {node} has invalid child {child}"));
                }
            }
            let feature = self.feature[node];
            if feature < 0 || feature >= FEATURE_COUNT as i64 {
                return Err(format!("node {node} splits on unknown feature {feature}"));
            }
        }
        Ok(())
    }

    /// Walks to the leaf for `features`. Comparisons run at single
    /// precision, matching how the trees were fitted.
    fn leaf(&self, features: &FeatureVector) -> usize {
        let mut node = 0;
        while self.children_left[node] != LEAF {
            let x = features.0[self.feature[node] as usize] as f32;
            node = if f64::from(x) <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }
        node
    }

    /// Leaf weights normalised to a probability row.
    fn predict_proba(&self, features: &FeatureVector) -> Vec<f64> {
        let weights = &self.value[self.leaf(features)];
        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            weights.iter().map(|w| w / total).collect()
        } else {
            weights.clone()
        }
    }
}

/// One or more trees whose probability rows are averaged. A single tree is
/// a plain decision tree classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEnsemble {
    /// Label code for each output column.
    pub classes: Vec<usize>,
    pub trees: Vec<DecisionTree>,
}

impl TreeEnsemble {
    /// Structural checks. An ensemble that passes cannot index out of
    /// bounds or loop during `predict`.
    pub fn validate(&self) -> Result<(), String> {
        if self.classes.is_empty() {
            return Err("classifier has no classes".to_string());
        }
        if self.trees.is_empty() {
            return Err("classifier has no trees".to_string());
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.classes.len())
                .map_err(|e| format!("tree {i}: {e}"))?;
        }
        Ok(())
    }

    pub fn predict_proba(&self, features: &FeatureVector) -> Vec<f64> {
        let mut mean = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in mean.iter_mut().zip(tree.predict_proba(features)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        mean.iter_mut().for_each(|p| *p /= n);
        mean
    }
}

impl Classifier for TreeEnsemble {
    fn predict(&self, features: &FeatureVector) -> usize {
        let proba = self.predict_proba(features);
        // first maximum wins on ties
        let mut best = 0;
        for (i, &p) in proba.iter().enumerate().skip(1) {
            if p > proba[best] {
                best = i;
            }
        }
        self.classes[best]
    }
}
