use super::features::N_FEATURES;
use super::ModelKind;

// ---------------------------------------------------------------------------
// Pipeline – a validated, ready-to-run fitted model
// ---------------------------------------------------------------------------

/// A fitted preprocessing + estimator chain. Immutable once built; every
/// structural check happened when the artifact was loaded, so prediction
/// cannot fail.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub(crate) scaler: Option<StandardScaler>,
    pub(crate) model: FittedModel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FittedModel {
    Linear(LinearModel),
    RandomForest(RandomForest),
}

impl Pipeline {
    pub fn kind(&self) -> ModelKind {
        match self.model {
            FittedModel::Linear(_) => ModelKind::Linear,
            FittedModel::RandomForest(_) => ModelKind::RandomForest,
        }
    }

    /// Predicted Tmax for one row in feature order.
    pub fn predict(&self, row: &[f64; N_FEATURES]) -> f64 {
        let x = match &self.scaler {
            Some(scaler) => scaler.transform(row),
            None => *row,
        };
        match &self.model {
            FittedModel::Linear(m) => m.predict(&x),
            FittedModel::RandomForest(m) => m.predict(&x),
        }
    }

    /// Per-feature importances; only tree ensembles carry them.
    pub fn feature_importances(&self) -> Option<&[f64; N_FEATURES]> {
        match &self.model {
            FittedModel::RandomForest(m) => Some(&m.importances),
            FittedModel::Linear(_) => None,
        }
    }
}

/// `(x - mean) / scale`, column-wise.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    pub(crate) mean: [f64; N_FEATURES],
    pub(crate) scale: [f64; N_FEATURES],
}

impl StandardScaler {
    fn transform(&self, row: &[f64; N_FEATURES]) -> [f64; N_FEATURES] {
        std::array::from_fn(|i| (row[i] - self.mean[i]) / self.scale[i])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub(crate) coefficients: [f64; N_FEATURES],
    pub(crate) intercept: f64,
}

impl LinearModel {
    fn predict(&self, x: &[f64; N_FEATURES]) -> f64 {
        self.coefficients
            .iter()
            .zip(x)
            .fold(self.intercept, |acc, (c, v)| acc + c * v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomForest {
    pub(crate) trees: Vec<RegressionTree>,
    pub(crate) importances: [f64; N_FEATURES],
}

impl RandomForest {
    /// Mean of the tree outputs, summed in tree order.
    fn predict(&self, x: &[f64; N_FEATURES]) -> f64 {
        let total: f64 = self.trees.iter().map(|t| t.predict(x)).sum();
        total / self.trees.len() as f64
    }
}

/// A binary regression tree in flat array form.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionTree {
    pub(crate) nodes: Vec<Node>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf(f64),
}

impl RegressionTree {
    /// Children always sit at higher indices than their parent, so the walk
    /// terminates.
    fn predict(&self, x: &[f64; N_FEATURES]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf(value) => return value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => idx = if x[feature] <= threshold { left } else { right },
            }
        }
    }
}
