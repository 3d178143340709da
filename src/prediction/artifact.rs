use serde::{Deserialize, Serialize};

use super::features::{Feature, N_FEATURES};
use super::pipeline::{
    FittedModel, LinearModel, Node, Pipeline, RandomForest, RegressionTree, StandardScaler,
};
use super::ModelKind;

// ---------------------------------------------------------------------------
// On-disk artifact schema
// ---------------------------------------------------------------------------

/// Serialized pipeline as written by the offline training job.
///
/// ```json
/// {
///   "kind": "random_forest",
///   "feature_names": ["tmed", "tmin", "prec", "velmedia", "racha", "dir"],
///   "scaler": { "mean": [...], "scale": [...] },
///   "estimator": { "type": "random_forest", "trees": [...], "feature_importances": [...] }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineArtifact {
    pub kind: ModelKind,
    pub feature_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<ScalerArtifact>,
    pub estimator: EstimatorArtifact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerArtifact {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EstimatorArtifact {
    LinearRegression {
        coefficients: Vec<f64>,
        intercept: f64,
    },
    RandomForest {
        trees: Vec<TreeArtifact>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feature_importances: Option<Vec<f64>>,
    },
}

/// Tree arrays; node `i` is a leaf when `children_left[i] == -1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeArtifact {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<f64>,
}

const LEAF: i64 = -1;

// ---------------------------------------------------------------------------
// Validation: artifact → Pipeline
// ---------------------------------------------------------------------------

impl PipelineArtifact {
    /// Check the artifact against the interface expected for `expected`.
    ///
    /// Returns a description of the first mismatch.
    pub fn into_pipeline(self, expected: ModelKind) -> Result<Pipeline, String> {
        if self.kind != expected {
            return Err(format!("artifact declares kind '{}'", self.kind));
        }

        let columns: Vec<&str> = Feature::ORDER.iter().map(|f| f.column()).collect();
        if self.feature_names != columns {
            return Err(format!(
                "feature_names {:?} do not match {:?}",
                self.feature_names, columns
            ));
        }

        let scaler = self.scaler.map(ScalerArtifact::validate).transpose()?;

        let model = match (expected, self.estimator) {
            (
                ModelKind::Linear,
                EstimatorArtifact::LinearRegression {
                    coefficients,
                    intercept,
                },
            ) => {
                if !intercept.is_finite() {
                    return Err("intercept is not finite".into());
                }
                FittedModel::Linear(LinearModel {
                    coefficients: finite_row("coefficients", &coefficients)?,
                    intercept,
                })
            }
            (
                ModelKind::RandomForest,
                EstimatorArtifact::RandomForest {
                    trees,
                    feature_importances,
                },
            ) => {
                let importances = feature_importances
                    .ok_or("random forest has no feature_importances")?;
                if trees.is_empty() {
                    return Err("random forest has no trees".into());
                }
                let trees = trees
                    .into_iter()
                    .enumerate()
                    .map(|(i, t)| t.validate().map_err(|e| format!("tree {i}: {e}")))
                    .collect::<Result<Vec<_>, _>>()?;
                FittedModel::RandomForest(RandomForest {
                    trees,
                    importances: finite_row("feature_importances", &importances)?,
                })
            }
            (kind, _) => return Err(format!("estimator does not match kind '{kind}'")),
        };

        Ok(Pipeline { scaler, model })
    }
}

impl ScalerArtifact {
    fn validate(self) -> Result<StandardScaler, String> {
        let mean = finite_row("scaler.mean", &self.mean)?;
        let scale = finite_row("scaler.scale", &self.scale)?;
        if scale.contains(&0.0) {
            return Err("scaler.scale contains zero".into());
        }
        Ok(StandardScaler { mean, scale })
    }
}

impl TreeArtifact {
    fn validate(self) -> Result<RegressionTree, String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("no nodes".into());
        }
        if [
            self.children_right.len(),
            self.feature.len(),
            self.threshold.len(),
            self.value.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err("node arrays differ in length".into());
        }

        let child = |parent: usize, raw: i64| -> Result<usize, String> {
            usize::try_from(raw)
                .ok()
                .filter(|&c| c > parent && c < n)
                .ok_or_else(|| format!("node {parent}: invalid child index {raw}"))
        };

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            if self.children_left[i] == LEAF {
                if self.children_right[i] != LEAF {
                    return Err(format!("node {i}: leaf with a right child"));
                }
                if !self.value[i].is_finite() {
                    return Err(format!("node {i}: leaf value is not finite"));
                }
                nodes.push(Node::Leaf(self.value[i]));
                continue;
            }

            let feature = usize::try_from(self.feature[i])
                .ok()
                .filter(|&f| f < N_FEATURES)
                .ok_or_else(|| format!("node {i}: invalid feature {}", self.feature[i]))?;
            if self.threshold[i].is_nan() {
                return Err(format!("node {i}: threshold is NaN"));
            }
            nodes.push(Node::Split {
                feature,
                threshold: self.threshold[i],
                left: child(i, self.children_left[i])?,
                right: child(i, self.children_right[i])?,
            });
        }
        Ok(RegressionTree { nodes })
    }
}

fn finite_row(name: &str, values: &[f64]) -> Result<[f64; N_FEATURES], String> {
    let row: [f64; N_FEATURES] = values
        .try_into()
        .map_err(|_| format!("{name} has {} values, expected {N_FEATURES}", values.len()))?;
    if row.iter().any(|v| !v.is_finite()) {
        return Err(format!("{name} contains non-finite values"));
    }
    Ok(row)
}
