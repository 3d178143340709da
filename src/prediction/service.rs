use serde::Serialize;

use super::features::{Feature, FeatureVector};
use super::registry::{ModelPaths, ModelRegistry};
use super::ModelKind;
use crate::error::Result;
use crate::source::{FsSource, SourceReader};

/// Shown for the linear model, which carries no request-time explanation.
pub const LINEAR_NOTE: &str = "inspect pipeline coefficients directly";

/// A Tmax forecast and how to read it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub value: f64,
    pub explainability: Explainability,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Explainability {
    /// Tree-ensemble importances, least important first.
    Importance { ranking: Vec<FeatureImportance> },
    /// The linear model is explained by its coefficients, which are not
    /// reported per request.
    Coefficients { note: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: &'static str,
    pub importance: f64,
}

// ---------------------------------------------------------------------------
// PredictionService
// ---------------------------------------------------------------------------

pub struct PredictionService<R = FsSource> {
    registry: ModelRegistry<R>,
}

impl PredictionService<FsSource> {
    pub fn new(paths: ModelPaths) -> Self {
        Self::from_registry(ModelRegistry::new(paths))
    }
}

impl<R: SourceReader> PredictionService<R> {
    pub fn from_registry(registry: ModelRegistry<R>) -> Self {
        PredictionService { registry }
    }

    pub fn registry(&self) -> &ModelRegistry<R> {
        &self.registry
    }

    /// Predict Tmax with the chosen model.
    ///
    /// The vector is validated before the registry is touched, so invalid
    /// input never triggers an artifact load or a model call. Values outside
    /// the dashboard's ranges are logged and passed through.
    pub fn predict(&self, kind: ModelKind, vector: &FeatureVector) -> Result<Prediction> {
        let row = vector.to_row()?;

        let out_of_range = vector.out_of_range();
        if !out_of_range.is_empty() {
            log::warn!("extrapolating: {out_of_range:?} outside the usual input range");
        }

        let pipeline = self.registry.get_pipeline(kind)?;
        let value = pipeline.predict(&row);
        log::debug!("{kind} prediction {value:.3} for {row:?}");

        let explainability = match pipeline.feature_importances() {
            Some(importances) => {
                let mut ranking: Vec<FeatureImportance> = Feature::ORDER
                    .iter()
                    .zip(importances)
                    .map(|(f, &importance)| FeatureImportance {
                        feature: f.name(),
                        importance,
                    })
                    .collect();
                // Stable: ties keep feature order.
                ranking.sort_by(|a, b| a.importance.total_cmp(&b.importance));
                Explainability::Importance { ranking }
            }
            None => Explainability::Coefficients {
                note: LINEAR_NOTE.to_string(),
            },
        };

        Ok(Prediction {
            value,
            explainability,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::prediction::registry::fixtures;

    fn service() -> PredictionService<crate::source::testing::MemorySource> {
        PredictionService::from_registry(ModelRegistry::with_reader(
            fixtures::source(),
            fixtures::paths(),
        ))
    }

    #[test]
    fn test_forest_prediction_is_stable() {
        let service = service();
        let vector = FeatureVector {
            tmed: 25.0,
            tmin: 18.0,
            precipitation: 0.0,
            wind_mean: 1.5,
            wind_gust: 4.0,
            wind_direction: 180.0,
        };

        let first = service.predict(ModelKind::RandomForest, &vector).unwrap();
        let second = service.predict(ModelKind::RandomForest, &vector).unwrap();
        assert_eq!(first.value, 32.375);
        assert_eq!(first.value.to_bits(), second.value.to_bits());
        assert_eq!(first.explainability, second.explainability);
        assert_eq!(service.registry().reader().reads(), 1);
    }

    #[test]
    fn test_importance_ranking_ascending() {
        let prediction = service()
            .predict(ModelKind::RandomForest, &FeatureVector::default())
            .unwrap();
        let Explainability::Importance { ranking } = prediction.explainability else {
            panic!("expected importances");
        };
        let order: Vec<_> = ranking.iter().map(|r| r.feature).collect();
        assert_eq!(
            order,
            ["wind_direction", "precipitation", "wind_mean", "wind_gust", "tmin", "tmed"]
        );
        assert!(ranking.windows(2).all(|w| w[0].importance <= w[1].importance));
    }

    #[test]
    fn test_linear_prediction_and_note() {
        let prediction = service()
            .predict(ModelKind::Linear, &FeatureVector::default())
            .unwrap();
        assert!((prediction.value - 33.5).abs() < 1e-9);
        assert_eq!(
            prediction.explainability,
            Explainability::Coefficients {
                note: LINEAR_NOTE.to_string()
            }
        );
    }

    #[test]
    fn test_nan_rejected_without_loading() {
        let service = service();
        let vector = FeatureVector {
            precipitation: f64::NAN,
            ..FeatureVector::default()
        };
        for kind in ModelKind::ALL {
            assert!(matches!(
                service.predict(kind, &vector),
                Err(Error::InvalidInput(_))
            ));
        }
        assert_eq!(service.registry().reader().reads(), 0);
    }

    #[test]
    fn test_extrapolation_allowed() {
        let vector = FeatureVector {
            tmed: 55.0,
            wind_gust: 80.0,
            ..FeatureVector::default()
        };
        assert!(service().predict(ModelKind::Linear, &vector).is_ok());
    }

    #[test]
    fn test_serialized_shape() {
        let prediction = service()
            .predict(ModelKind::Linear, &FeatureVector::default())
            .unwrap();
        let json = serde_json::to_value(&prediction).unwrap();
        assert_eq!(json["explainability"]["kind"], "coefficients");
    }
}
