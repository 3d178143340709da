//! Data and prediction core of the UrbanHeat Valencia dashboard.
//!
//! [`Dashboard`] bundles the two process-wide caches: the raw datasets
//! ([`data::cache::DatasetCache`]) and the fitted Tmax pipelines
//! ([`prediction::ModelRegistry`], behind [`prediction::PredictionService`]).
//! Both load lazily, once, and are independently fallible.

pub mod config;
pub mod data;
pub mod error;
pub mod prediction;
pub mod source;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};

use data::cache::DatasetCache;
use prediction::PredictionService;

/// Everything the presentation layer talks to.
pub struct Dashboard {
    pub data: DatasetCache,
    pub predictions: PredictionService,
}

impl Dashboard {
    pub fn new(config: &Config) -> Self {
        Dashboard {
            data: DatasetCache::new(config.data_paths()),
            predictions: PredictionService::new(config.model_paths()),
        }
    }
}
