use std::fmt;

use chrono::NaiveDate;
use geo::MultiPolygon;
use serde::Serialize;

// ---------------------------------------------------------------------------
// ClimateRecord – one day of the climate time series
// ---------------------------------------------------------------------------

/// One daily observation.
///
/// `tmin <= tmed <= tmax` usually holds but is not enforced; noisy rows are
/// kept as they are. Missing numeric cells are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct ClimateRecord {
    /// `None` when the source date could not be parsed.
    pub date: Option<NaiveDate>,
    pub tmed: f64,
    pub tmax: f64,
    pub tmin: f64,
    /// Millimetres.
    pub precipitation: f64,
    /// Mean wind speed, km/h.
    pub wind_mean: f64,
    /// Maximum gust, km/h.
    pub wind_gust: f64,
    /// Degrees; `None` when the optional `dir` column is absent or unreadable.
    pub wind_direction: Option<f64>,
}

/// The numeric columns of a [`ClimateRecord`], in source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimateField {
    Tmed,
    Tmax,
    Tmin,
    Precipitation,
    WindMean,
    WindGust,
    WindDirection,
}

impl ClimateField {
    pub const ALL: [ClimateField; 7] = [
        ClimateField::Tmed,
        ClimateField::Tmax,
        ClimateField::Tmin,
        ClimateField::Precipitation,
        ClimateField::WindMean,
        ClimateField::WindGust,
        ClimateField::WindDirection,
    ];

    /// Column name in the raw file and in CSV exports.
    pub fn column(self) -> &'static str {
        match self {
            ClimateField::Tmed => "tmed",
            ClimateField::Tmax => "tmax",
            ClimateField::Tmin => "tmin",
            ClimateField::Precipitation => "prec",
            ClimateField::WindMean => "velmedia",
            ClimateField::WindGust => "racha",
            ClimateField::WindDirection => "dir",
        }
    }

    /// The field's value, `None` when missing.
    pub fn value(self, record: &ClimateRecord) -> Option<f64> {
        let v = match self {
            ClimateField::Tmed => record.tmed,
            ClimateField::Tmax => record.tmax,
            ClimateField::Tmin => record.tmin,
            ClimateField::Precipitation => record.precipitation,
            ClimateField::WindMean => record.wind_mean,
            ClimateField::WindGust => record.wind_gust,
            ClimateField::WindDirection => record.wind_direction?,
        };
        (!v.is_nan()).then_some(v)
    }
}

impl fmt::Display for ClimateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ---------------------------------------------------------------------------
// ClimateDataset – the complete loaded series
// ---------------------------------------------------------------------------

/// Climate records sorted by ascending date, undated rows last.
#[derive(Debug, Clone, Default)]
pub struct ClimateDataset {
    records: Vec<ClimateRecord>,
}

impl ClimateDataset {
    /// Sort the records into dataset order. The sort is stable, so rows
    /// sharing a date keep their source order.
    pub fn from_records(mut records: Vec<ClimateRecord>) -> Self {
        records.sort_by_key(|r| (r.date.is_none(), r.date));
        ClimateDataset { records }
    }

    pub fn records(&self) -> &[ClimateRecord] {
        &self.records
    }

    /// A view over every record.
    pub fn view(&self) -> ClimateView<'_> {
        ClimateView::new(self.records.iter().collect())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// ClimateView – a borrowed subsequence of the dataset
// ---------------------------------------------------------------------------

/// An ordered selection of records borrowed from a [`ClimateDataset`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClimateView<'a> {
    records: Vec<&'a ClimateRecord>,
}

impl<'a> ClimateView<'a> {
    pub fn new(records: Vec<&'a ClimateRecord>) -> Self {
        ClimateView { records }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a ClimateRecord> + '_ {
        self.records.iter().copied()
    }

    /// The first `n` records, for table snapshots.
    pub fn head(&self, n: usize) -> &[&'a ClimateRecord] {
        &self.records[..n.min(self.records.len())]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// AttributeValue – a loosely typed GeoJSON property
// ---------------------------------------------------------------------------

/// A property value as it arrives in the geometry file.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl From<&serde_json::Value> for AttributeValue {
    fn from(val: &serde_json::Value) -> Self {
        use serde_json::Value;
        match val {
            Value::String(s) => AttributeValue::String(s.clone()),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    AttributeValue::Integer(i)
                } else if let Some(f) = n.as_f64() {
                    AttributeValue::Float(f)
                } else {
                    AttributeValue::String(n.to_string())
                }
            }
            Value::Bool(b) => AttributeValue::Bool(*b),
            Value::Null => AttributeValue::Null,
            other => AttributeValue::String(other.to_string()),
        }
    }
}

/// Display form used for tooltips; `Null` renders empty.
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::String(s) => write!(f, "{s}"),
            AttributeValue::Integer(i) => write!(f, "{i}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Null => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// VegetationFeature – one green-area polygon
// ---------------------------------------------------------------------------

/// A park, garden or other vegetated area. Read-only after load.
#[derive(Debug, Clone, PartialEq)]
pub struct VegetationFeature {
    /// The `elemento` label.
    pub category: String,
    /// The `fechacreac` attribute, normalised to a display string.
    pub created_on: String,
    /// Lon/lat outline in WGS 84; a source Polygon becomes a one-member
    /// MultiPolygon.
    pub geometry: MultiPolygon<f64>,
}
