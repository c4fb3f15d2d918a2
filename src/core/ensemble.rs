use crate::core::predictor::{check_shape, FeatureMatrix, ModelError, PredictError, Predictor};
use serde::{Deserialize, Serialize};

/// A node of a regression tree
///
/// Splits send a row left when `row[feature] <= threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

/// A single regression tree stored as a flat node array rooted at index 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    /// Children must point strictly forward, so traversal always terminates.
    fn validate(&self, tree: usize, n_features: usize) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::EmptyTree { tree });
        }

        for (node, n) in self.nodes.iter().enumerate() {
            match *n {
                Node::Split { feature, threshold, left, right } => {
                    if feature >= n_features {
                        return Err(ModelError::FeatureOutOfRange {
                            tree,
                            node,
                            feature,
                            n_features,
                        });
                    }
                    if threshold.is_nan() {
                        return Err(ModelError::NonFinite("threshold"));
                    }
                    for child in [left, right] {
                        if child <= node || child >= self.nodes.len() {
                            return Err(ModelError::InvalidChild { tree, node, child });
                        }
                    }
                }
                Node::Leaf { value } => {
                    if !value.is_finite() {
                        return Err(ModelError::NonFinite("leaf value"));
                    }
                }
            }
        }

        Ok(())
    }

    #[inline]
    fn predict_row(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Split { feature, threshold, left, right } => {
                    idx = if row[feature] <= threshold { left } else { right };
                }
                Node::Leaf { value } => return value,
            }
        }
    }
}

/// How tree outputs are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Gradient boosting: `base_score + learning_rate * sum`
    #[default]
    Sum,
    /// Random forest: `base_score + mean`
    Mean,
}

/// Additive ensemble of regression trees
#[derive(Debug, Clone)]
pub struct TreeEnsemble {
    trees: Vec<Tree>,
    base_score: f64,
    learning_rate: f64,
    aggregation: Aggregation,
    n_features: usize,
}

impl TreeEnsemble {
    pub fn new(
        trees: Vec<Tree>,
        base_score: f64,
        learning_rate: f64,
        aggregation: Aggregation,
        n_features: usize,
    ) -> Result<Self, ModelError> {
        if trees.is_empty() {
            return Err(ModelError::NoTrees);
        }
        if !base_score.is_finite() {
            return Err(ModelError::NonFinite("base_score"));
        }
        if !learning_rate.is_finite() {
            return Err(ModelError::NonFinite("learning_rate"));
        }
        for (idx, tree) in trees.iter().enumerate() {
            tree.validate(idx, n_features)?;
        }

        Ok(Self {
            trees,
            base_score,
            learning_rate,
            aggregation,
            n_features,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        match self.aggregation {
            Aggregation::Sum => self.base_score + self.learning_rate * total,
            Aggregation::Mean => self.base_score + total / self.trees.len() as f64,
        }
    }
}

impl Predictor for TreeEnsemble {
    fn kind(&self) -> &'static str {
        "tree_ensemble"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, batch: &FeatureMatrix) -> Result<Vec<f64>, PredictError> {
        check_shape(self.n_features, batch)?;
        Ok(batch.rows().map(|row| self.predict_row(row)).collect())
    }
}
