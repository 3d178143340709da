use std::path::PathBuf;

use serde::Deserialize;

use crate::data::cache::DataPaths;
use crate::prediction::ModelPaths;

/// Environment variable prefix, e.g. `URBANHEAT_CLIMATE_PATH`.
pub const ENV_PREFIX: &str = "URBANHEAT_";

/// Source and artifact locations. Resolved once at startup.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default = "default_climate_path")]
    pub climate_path: PathBuf,
    #[serde(default = "default_vegetation_path")]
    pub vegetation_path: PathBuf,
    #[serde(default = "default_linear_model_path")]
    pub linear_model_path: PathBuf,
    #[serde(default = "default_forest_model_path")]
    pub forest_model_path: PathBuf,
}

fn default_climate_path() -> PathBuf {
    PathBuf::from("data/raw/temperatura_valencia.csv")
}

fn default_vegetation_path() -> PathBuf {
    PathBuf::from("data/raw/vegetacion_valencia.geojson")
}

fn default_linear_model_path() -> PathBuf {
    PathBuf::from("models/pipeline_tmax_lr.json")
}

fn default_forest_model_path() -> PathBuf {
    PathBuf::from("models/pipeline_tmax_rf.json")
}

impl Default for Config {
    fn default() -> Self {
        Config {
            climate_path: default_climate_path(),
            vegetation_path: default_vegetation_path(),
            linear_model_path: default_linear_model_path(),
            forest_model_path: default_forest_model_path(),
        }
    }
}

impl Config {
    /// Read `URBANHEAT_*` variables (after an optional `.env`), falling back
    /// to the defaults for anything unset.
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>) -> Result<Self, envy::Error> {
        envy::prefixed(ENV_PREFIX).from_iter(vars)
    }

    pub fn data_paths(&self) -> DataPaths {
        DataPaths {
            climate: self.climate_path.clone(),
            vegetation: self.vegetation_path.clone(),
        }
    }

    pub fn model_paths(&self) -> ModelPaths {
        ModelPaths {
            linear: self.linear_model_path.clone(),
            random_forest: self.forest_model_path.clone(),
        }
    }
}
