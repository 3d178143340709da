use serde::Serialize;

use super::model::{ClimateField, ClimateView};

/// Decimal places kept in displayed statistics.
pub const DISPLAY_PRECISION: i32 = 2;

/// Aggregates for one numeric column, rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSummary {
    pub field: ClimateField,
    /// Non-missing values only.
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; zero for a single value.
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub median: f64,
    pub p75: f64,
    pub max: f64,
}

/// The `describe()` table of a view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStatistics {
    pub rows: usize,
    /// One entry per column holding at least one value, in column order.
    pub fields: Vec<FieldSummary>,
}

impl SummaryStatistics {
    pub fn get(&self, field: ClimateField) -> Option<&FieldSummary> {
        self.fields.iter().find(|s| s.field == field)
    }
}

/// Per-column statistics of the view, or `None` for an empty view.
pub fn summary_statistics(view: &ClimateView<'_>) -> Option<SummaryStatistics> {
    if view.is_empty() {
        return None;
    }

    let fields = ClimateField::ALL
        .into_iter()
        .filter_map(|field| {
            let values: Vec<f64> = view.iter().filter_map(|r| field.value(r)).collect();
            summarize(field, values)
        })
        .collect();

    Some(SummaryStatistics {
        rows: view.len(),
        fields,
    })
}

fn summarize(field: ClimateField, mut values: Vec<f64>) -> Option<FieldSummary> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = if values.len() > 1 {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1.0)).sqrt()
    } else {
        0.0
    };

    Some(FieldSummary {
        field,
        count: values.len(),
        mean: round(mean),
        std: round(std),
        min: round(values[0]),
        p25: round(quantile(&values, 0.25)),
        median: round(quantile(&values, 0.5)),
        p75: round(quantile(&values, 0.75)),
        max: round(values[values.len() - 1]),
    })
}

/// Linear interpolation between closest ranks; `sorted` must be non-empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn round(v: f64) -> f64 {
    let scale = 10f64.powi(DISPLAY_PRECISION);
    (v * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::model::{ClimateDataset, ClimateRecord};

    fn record(tmax: f64, prec: f64, dir: Option<f64>) -> ClimateRecord {
        ClimateRecord {
            date: NaiveDate::from_ymd_opt(2019, 8, 1),
            tmed: 25.0,
            tmax,
            tmin: 18.0,
            precipitation: prec,
            wind_mean: 2.0,
            wind_gust: 6.0,
            wind_direction: dir,
        }
    }

    #[test]
    fn test_empty_view_has_no_statistics() {
        assert_eq!(summary_statistics(&ClimateView::default()), None);
    }

    #[test]
    fn test_singleton_std_is_zero() {
        let ds = ClimateDataset::from_records(vec![record(30.0, 0.0, Some(90.0))]);
        let stats = summary_statistics(&ds.view()).unwrap();
        let tmax = stats.get(ClimateField::Tmax).unwrap();
        assert_eq!(tmax.count, 1);
        assert_eq!(tmax.std, 0.0);
        assert_eq!(tmax.min, 30.0);
        assert_eq!(tmax.median, 30.0);
    }

    #[test]
    fn test_describe_values() {
        let ds = ClimateDataset::from_records(vec![
            record(30.0, 0.0, Some(90.0)),
            record(31.0, f64::NAN, None),
            record(33.0, 1.0, Some(270.0)),
            record(34.0, 2.0, None),
        ]);
        let stats = summary_statistics(&ds.view()).unwrap();
        assert_eq!(stats.rows, 4);

        let tmax = stats.get(ClimateField::Tmax).unwrap();
        assert_eq!(tmax.count, 4);
        assert_eq!(tmax.mean, 32.0);
        // sqrt(10 / 3)
        assert_eq!(tmax.std, 1.83);
        assert_eq!(tmax.p25, 30.75);
        assert_eq!(tmax.median, 32.0);
        assert_eq!(tmax.p75, 33.25);
        assert_eq!(tmax.max, 34.0);

        let prec = stats.get(ClimateField::Precipitation).unwrap();
        assert_eq!(prec.count, 3);
        assert_eq!(prec.mean, 1.0);

        let dir = stats.get(ClimateField::WindDirection).unwrap();
        assert_eq!(dir.count, 2);
        assert_eq!(dir.mean, 180.0);
    }

    #[test]
    fn test_all_missing_column_is_omitted() {
        let ds = ClimateDataset::from_records(vec![record(30.0, 0.0, None)]);
        let stats = summary_statistics(&ds.view()).unwrap();
        assert!(stats.get(ClimateField::WindDirection).is_none());
        assert_eq!(stats.fields.len(), 6);
    }
}
