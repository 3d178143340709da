use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;

use super::artifact::PipelineArtifact;
use super::pipeline::Pipeline;
use super::ModelKind;
use crate::error::{Error, Result};
use crate::source::{FsSource, SourceReader};

/// Artifact location per model kind, fixed at configuration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub linear: PathBuf,
    pub random_forest: PathBuf,
}

impl ModelPaths {
    pub fn path(&self, kind: ModelKind) -> &Path {
        match kind {
            ModelKind::Linear => &self.linear,
            ModelKind::RandomForest => &self.random_forest,
        }
    }
}

/// Resolves a [`ModelKind`] to its fitted pipeline, loading each artifact on
/// first use and keeping it for the life of the process.
///
/// Only the two configured paths are ever read. Each kind has its own slot,
/// so a broken artifact for one kind does not affect the other.
pub struct ModelRegistry<R = FsSource> {
    reader: R,
    paths: ModelPaths,
    linear: OnceCell<Pipeline>,
    random_forest: OnceCell<Pipeline>,
}

impl ModelRegistry<FsSource> {
    pub fn new(paths: ModelPaths) -> Self {
        Self::with_reader(FsSource, paths)
    }
}

impl<R: SourceReader> ModelRegistry<R> {
    pub fn with_reader(reader: R, paths: ModelPaths) -> Self {
        ModelRegistry {
            reader,
            paths,
            linear: OnceCell::new(),
            random_forest: OnceCell::new(),
        }
    }

    pub fn get_pipeline(&self, kind: ModelKind) -> Result<&Pipeline> {
        let slot = match kind {
            ModelKind::Linear => &self.linear,
            ModelKind::RandomForest => &self.random_forest,
        };
        slot.get_or_try_init(|| self.load(kind))
    }

    fn load(&self, kind: ModelKind) -> Result<Pipeline> {
        let path = self.paths.path(kind);
        let load_err = |detail: String| Error::ModelLoad {
            kind,
            path: path.to_path_buf(),
            detail,
        };

        let bytes = self
            .reader
            .read(path)
            .map_err(|e| load_err(format!("reading artifact: {e}")))?;
        let artifact: PipelineArtifact = serde_json::from_slice(&bytes)
            .map_err(|e| load_err(format!("decoding artifact: {e}")))?;
        let pipeline = artifact.into_pipeline(kind).map_err(load_err)?;

        log::info!("loaded {kind} pipeline from {}", path.display());
        Ok(pipeline)
    }

    #[cfg(test)]
    pub(crate) fn reader(&self) -> &R {
        &self.reader
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::json;

    use super::ModelPaths;
    use crate::source::testing::MemorySource;

    pub const LINEAR_PATH: &str = "models/lr.json";
    pub const FOREST_PATH: &str = "models/rf.json";

    pub fn paths() -> ModelPaths {
        ModelPaths {
            linear: LINEAR_PATH.into(),
            random_forest: FOREST_PATH.into(),
        }
    }

    pub fn linear_artifact() -> String {
        json!({
            "kind": "linear",
            "feature_names": ["tmed", "tmin", "prec", "velmedia", "racha", "dir"],
            "estimator": {
                "type": "linear_regression",
                "coefficients": [2.0, -1.0, -0.1, 0.2, 0.05, 0.0],
                "intercept": 1.0
            }
        })
        .to_string()
    }

    pub fn forest_artifact() -> String {
        json!({
            "kind": "random_forest",
            "feature_names": ["tmed", "tmin", "prec", "velmedia", "racha", "dir"],
            "estimator": {
                "type": "random_forest",
                "trees": [
                    {
                        "children_left": [1, 3, -1, -1, -1],
                        "children_right": [2, 4, -1, -1, -1],
                        "feature": [0, 1, -2, -2, -2],
                        "threshold": [22.0, 12.0, -2.0, -2.0, -2.0],
                        "value": [27.0, 21.0, 33.5, 18.0, 24.0]
                    },
                    {
                        "children_left": [1, -1, -1],
                        "children_right": [2, -1, -1],
                        "feature": [4, -2, -2],
                        "threshold": [10.0, -2.0, -2.0],
                        "value": [28.0, 31.25, 25.0]
                    }
                ],
                "feature_importances": [0.55, 0.25, 0.02, 0.08, 0.1, 0.0]
            }
        })
        .to_string()
    }

    pub fn source() -> MemorySource {
        MemorySource::new()
            .with_file(LINEAR_PATH, linear_artifact())
            .with_file(FOREST_PATH, forest_artifact())
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{self, FOREST_PATH};
    use super::*;
    use crate::source::testing::MemorySource;

    #[test]
    fn test_each_kind_loaded_once() {
        let registry = ModelRegistry::with_reader(fixtures::source(), fixtures::paths());

        for _ in 0..5 {
            assert_eq!(
                registry.get_pipeline(ModelKind::RandomForest).unwrap().kind(),
                ModelKind::RandomForest
            );
        }
        assert_eq!(registry.reader().reads(), 1);

        for _ in 0..5 {
            registry.get_pipeline(ModelKind::Linear).unwrap();
        }
        assert_eq!(registry.reader().reads(), 2);
    }

    #[test]
    fn test_broken_kind_does_not_block_other() {
        let source = MemorySource::new()
            .with_file(fixtures::LINEAR_PATH, fixtures::linear_artifact())
            .with_file(FOREST_PATH, "{not json");
        let registry = ModelRegistry::with_reader(source, fixtures::paths());

        let err = registry.get_pipeline(ModelKind::RandomForest).unwrap_err();
        assert!(matches!(err, Error::ModelLoad { kind: ModelKind::RandomForest, .. }));
        assert!(registry.get_pipeline(ModelKind::Linear).is_ok());
    }

    #[test]
    fn test_artifact_under_wrong_slot() {
        let source = MemorySource::new().with_file(FOREST_PATH, fixtures::linear_artifact());
        let registry = ModelRegistry::with_reader(source, fixtures::paths());
        assert!(matches!(
            registry.get_pipeline(ModelKind::RandomForest),
            Err(Error::ModelLoad { .. })
        ));
    }

    #[test]
    fn test_missing_artifact_retried() {
        let registry = ModelRegistry::with_reader(MemorySource::new(), fixtures::paths());
        assert!(registry.get_pipeline(ModelKind::Linear).is_err());

        registry
            .reader()
            .insert(fixtures::LINEAR_PATH, fixtures::linear_artifact());
        assert!(registry.get_pipeline(ModelKind::Linear).is_ok());
        assert!(registry.get_pipeline(ModelKind::Linear).is_ok());
        assert_eq!(registry.reader().reads(), 2);
    }

    #[test]
    fn test_concurrent_first_access_loads_once() {
        let registry = ModelRegistry::with_reader(fixtures::source(), fixtures::paths());
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| registry.get_pipeline(ModelKind::RandomForest).unwrap().kind());
            }
        });
        assert_eq!(registry.reader().reads(), 1);
    }
}
