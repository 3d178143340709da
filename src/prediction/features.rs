use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Number of model inputs.
pub const N_FEATURES: usize = 6;

/// One model input, in the order the pipelines expect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Tmed,
    Tmin,
    Precipitation,
    WindMean,
    WindGust,
    WindDirection,
}

impl Feature {
    pub const ORDER: [Feature; N_FEATURES] = [
        Feature::Tmed,
        Feature::Tmin,
        Feature::Precipitation,
        Feature::WindMean,
        Feature::WindGust,
        Feature::WindDirection,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Tmed => "tmed",
            Feature::Tmin => "tmin",
            Feature::Precipitation => "precipitation",
            Feature::WindMean => "wind_mean",
            Feature::WindGust => "wind_gust",
            Feature::WindDirection => "wind_direction",
        }
    }

    /// Column name the pipelines were fitted on.
    pub fn column(self) -> &'static str {
        match self {
            Feature::Tmed => "tmed",
            Feature::Tmin => "tmin",
            Feature::Precipitation => "prec",
            Feature::WindMean => "velmedia",
            Feature::WindGust => "racha",
            Feature::WindDirection => "dir",
        }
    }

    /// Input range offered by the dashboard form.
    pub fn ui_range(self) -> RangeInclusive<f64> {
        match self {
            Feature::Tmed => 0.0..=50.0,
            Feature::Tmin => -5.0..=50.0,
            Feature::Precipitation => 0.0..=200.0,
            Feature::WindMean => 0.0..=20.0,
            Feature::WindGust => 0.0..=50.0,
            Feature::WindDirection => 0.0..=360.0,
        }
    }

    fn lookup(key: &str) -> Option<Feature> {
        Feature::ORDER
            .into_iter()
            .find(|f| f.name() == key || f.column() == key)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Daily observations used to predict Tmax.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub tmed: f64,
    pub tmin: f64,
    pub precipitation: f64,
    pub wind_mean: f64,
    pub wind_gust: f64,
    pub wind_direction: f64,
}

impl Default for FeatureVector {
    /// The dashboard form's initial values.
    fn default() -> Self {
        FeatureVector {
            tmed: 25.0,
            tmin: 18.0,
            precipitation: 0.0,
            wind_mean: 1.5,
            wind_gust: 4.0,
            wind_direction: 180.0,
        }
    }
}

impl FeatureVector {
    /// Build from `(name, value)` pairs. Keys may be field names
    /// (`precipitation`) or source columns (`prec`); all six are required.
    pub fn from_named<'a>(values: impl IntoIterator<Item = (&'a str, f64)>) -> Result<Self> {
        let mut slots: [Option<f64>; N_FEATURES] = [None; N_FEATURES];
        for (key, value) in values {
            let feature = Feature::lookup(key)
                .ok_or_else(|| Error::InvalidInput(format!("unknown feature '{key}'")))?;
            slots[feature as usize] = Some(value);
        }

        let mut row = [0.0; N_FEATURES];
        for (feature, (slot, out)) in Feature::ORDER.into_iter().zip(slots.into_iter().zip(&mut row)) {
            *out = slot.ok_or_else(|| Error::InvalidInput(format!("missing feature '{feature}'")))?;
        }
        Ok(Self::from_row(row))
    }

    fn from_row(row: [f64; N_FEATURES]) -> Self {
        let [tmed, tmin, precipitation, wind_mean, wind_gust, wind_direction] = row;
        FeatureVector {
            tmed,
            tmin,
            precipitation,
            wind_mean,
            wind_gust,
            wind_direction,
        }
    }

    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Tmed => self.tmed,
            Feature::Tmin => self.tmin,
            Feature::Precipitation => self.precipitation,
            Feature::WindMean => self.wind_mean,
            Feature::WindGust => self.wind_gust,
            Feature::WindDirection => self.wind_direction,
        }
    }

    /// The model row in [`Feature::ORDER`], rejecting NaN and infinities.
    pub fn to_row(&self) -> Result<[f64; N_FEATURES]> {
        let mut row = [0.0; N_FEATURES];
        for (feature, out) in Feature::ORDER.into_iter().zip(&mut row) {
            let value = self.get(feature);
            if !value.is_finite() {
                return Err(Error::InvalidInput(format!(
                    "{feature} must be a finite number, got {value}"
                )));
            }
            *out = value;
        }
        Ok(row)
    }

    /// Features outside the dashboard's input ranges.
    pub fn out_of_range(&self) -> Vec<Feature> {
        Feature::ORDER
            .into_iter()
            .filter(|&f| !f.ui_range().contains(&self.get(f)))
            .collect()
    }
}
