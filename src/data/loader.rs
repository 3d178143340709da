use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use geo::{Coordinate, LineString, MultiPolygon, Polygon};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use super::model::{AttributeValue, ClimateDataset, ClimateRecord, VegetationFeature};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Climate CSV loader
// ---------------------------------------------------------------------------

/// Date layouts accepted in the `fecha` column, tried in order.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];

/// Timestamp layouts tried after [`DATE_FORMATS`]; the time of day is dropped.
const DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Columns that must be present and numeric after decimal normalisation.
const NUMERIC_COLUMNS: [&str; 6] = ["tmed", "tmax", "tmin", "prec", "velmedia", "racha"];

/// Parse the raw climate table.
///
/// Layout: `;`-separated with a header row, numbers written with a decimal
/// comma (`"21,4"`). Required columns are `fecha` plus [`NUMERIC_COLUMNS`];
/// `dir` is optional and every other column is ignored.
///
/// * An unparseable date becomes `None`; the row is kept.
/// * An empty numeric cell becomes `NaN`.
/// * Any other non-numeric token fails the whole load.
pub fn parse_climate_csv(bytes: &[u8], path: &Path) -> Result<ClimateDataset> {
    let format_err = |detail: String| Error::DataFormat {
        path: path.to_path_buf(),
        detail,
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| format_err(format!("reading header: {e}")))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let date_idx = column("fecha").ok_or_else(|| format_err("missing 'fecha' column".into()))?;
    let mut numeric_idx = [0usize; 6];
    for (slot, name) in numeric_idx.iter_mut().zip(NUMERIC_COLUMNS) {
        *slot = column(name).ok_or_else(|| format_err(format!("missing '{name}' column")))?;
    }
    let dir_idx = column("dir");

    let mut records = Vec::new();
    let mut undated = 0usize;

    for (row_no, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = row_no + 2;
        let row = result.map_err(|e| format_err(format!("line {line}: {e}")))?;

        let mut values = [0.0f64; 6];
        for ((value, &idx), name) in values.iter_mut().zip(&numeric_idx).zip(NUMERIC_COLUMNS) {
            let token = row.get(idx).unwrap_or("");
            *value = parse_decimal(token)
                .ok_or_else(|| format_err(format!("line {line}, {name}: '{token}' is not a number")))?;
        }

        let date = parse_date(row.get(date_idx).unwrap_or(""));
        if date.is_none() {
            undated += 1;
        }

        let wind_direction = dir_idx
            .and_then(|idx| row.get(idx))
            .and_then(parse_decimal)
            .filter(|v| !v.is_nan());

        let [tmed, tmax, tmin, precipitation, wind_mean, wind_gust] = values;
        records.push(ClimateRecord {
            date,
            tmed,
            tmax,
            tmin,
            precipitation,
            wind_mean,
            wind_gust,
            wind_direction,
        });
    }

    if undated > 0 {
        log::warn!(
            "{}: {undated} row(s) with an unparseable date kept without a date",
            path.display()
        );
    }

    Ok(ClimateDataset::from_records(records))
}

/// Parse a decimal-comma number. Empty cells are `NaN`.
pub fn parse_decimal(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.is_empty() {
        return Some(f64::NAN);
    }
    token.replace(',', ".").parse::<f64>().ok()
}

/// Parse a date in any of the accepted layouts.
pub fn parse_date(token: &str) -> Option<NaiveDate> {
    let token = token.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(token, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(token, fmt).ok())
                .map(|ts| ts.date())
        })
}

// ---------------------------------------------------------------------------
// Vegetation GeoJSON loader
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct RawCollection {
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, JsonValue>>,
    #[serde(default)]
    geometry: Option<RawGeometry>,
}

/// Coordinates stay untyped until the geometry kind is known.
#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: JsonValue,
}

/// Parse the vegetation FeatureCollection.
///
/// Expected properties per feature: `elemento` (category) and `fechacreac`
/// (creation date, string or number). Features without geometry are
/// skipped; geometry other than Polygon / MultiPolygon is rejected.
pub fn parse_vegetation_geojson(bytes: &[u8], path: &Path) -> Result<Vec<VegetationFeature>> {
    let format_err = |detail: String| Error::DataFormat {
        path: path.to_path_buf(),
        detail,
    };

    let collection: RawCollection = serde_json::from_slice(bytes)
        .map_err(|e| format_err(format!("parsing FeatureCollection: {e}")))?;

    let mut features = Vec::with_capacity(collection.features.len());
    let mut skipped = 0usize;

    for (i, raw) in collection.features.into_iter().enumerate() {
        let Some(raw_geometry) = raw.geometry else {
            skipped += 1;
            continue;
        };
        let geometry = convert_geometry(raw_geometry)
            .map_err(|detail| format_err(format!("feature {i}: {detail}")))?;

        let properties = raw.properties.unwrap_or_default();
        let attribute = |key: &str| {
            properties
                .get(key)
                .map(AttributeValue::from)
                .unwrap_or(AttributeValue::Null)
                .to_string()
        };

        features.push(VegetationFeature {
            category: attribute("elemento"),
            created_on: attribute("fechacreac"),
            geometry,
        });
    }

    if skipped > 0 {
        log::warn!(
            "{}: skipped {skipped} feature(s) without geometry",
            path.display()
        );
    }

    Ok(features)
}

fn convert_geometry(raw: RawGeometry) -> std::result::Result<MultiPolygon<f64>, String> {
    // Positions are read as plain arrays so 3-D coordinates still deserialize.
    match raw.kind.as_str() {
        "Polygon" => {
            let rings: Vec<Vec<Vec<f64>>> =
                serde_json::from_value(raw.coordinates).map_err(|e| e.to_string())?;
            Ok(MultiPolygon(vec![convert_polygon(rings)?]))
        }
        "MultiPolygon" => {
            let polys: Vec<Vec<Vec<Vec<f64>>>> =
                serde_json::from_value(raw.coordinates).map_err(|e| e.to_string())?;
            polys
                .into_iter()
                .map(convert_polygon)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(MultiPolygon)
        }
        other => Err(format!(
            "geometry must be a Polygon or MultiPolygon, got {other}"
        )),
    }
}

/// First ring is the exterior, the rest are holes.
fn convert_polygon(rings: Vec<Vec<Vec<f64>>>) -> std::result::Result<Polygon<f64>, String> {
    let mut rings = rings
        .into_iter()
        .map(|ring| {
            ring.into_iter()
                .map(convert_coordinate)
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(LineString)
        })
        .collect::<std::result::Result<Vec<_>, _>>()?
        .into_iter();
    let exterior = rings.next().ok_or("polygon has no rings")?;
    Ok(Polygon::new(exterior, rings.collect()))
}

fn convert_coordinate(coords: Vec<f64>) -> std::result::Result<Coordinate<f64>, String> {
    match coords.as_slice() {
        [x, y, ..] => Ok(Coordinate { x: *x, y: *y }),
        other => Err(format!("position needs two coordinates, got {}", other.len())),
    }
}
