//! Tmax prediction: pipeline artifacts, the load-once registry, and the
//! service that validates input and builds explainability output.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod artifact;
pub mod features;
pub mod pipeline;
pub mod registry;
pub mod service;

pub use features::{Feature, FeatureVector};
pub use pipeline::Pipeline;
pub use registry::{ModelPaths, ModelRegistry};
pub use service::{Explainability, FeatureImportance, Prediction, PredictionService};

/// The two interchangeable pre-trained pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Linear,
    RandomForest,
}

impl ModelKind {
    pub const ALL: [ModelKind; 2] = [ModelKind::Linear, ModelKind::RandomForest];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::Linear => "linear",
            ModelKind::RandomForest => "random_forest",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown model kind '{0}' (expected 'linear' or 'random_forest')")]
pub struct UnknownModelKind(String);

impl FromStr for ModelKind {
    type Err = UnknownModelKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linear" | "lr" => Ok(ModelKind::Linear),
            "random_forest" | "random-forest" | "rf" => Ok(ModelKind::RandomForest),
            other => Err(UnknownModelKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("linear".parse::<ModelKind>().unwrap(), ModelKind::Linear);
        assert_eq!("rf".parse::<ModelKind>().unwrap(), ModelKind::RandomForest);
        assert!("../models/evil.json".parse::<ModelKind>().is_err());
        for kind in ModelKind::ALL {
            assert_eq!(kind.as_str().parse::<ModelKind>().unwrap(), kind);
        }
    }
}
