use std::path::Path;

use super::loader::parse_date;
use super::model::{ClimateField, ClimateRecord, ClimateView};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// CSV export of a filtered view
// ---------------------------------------------------------------------------

const DATE_COLUMN: &str = "fecha";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Serialise the view as UTF-8 CSV: header, then one row per record.
///
/// Comma-separated with dot decimals. Floats are written in their shortest
/// round-trip form; missing values are empty cells.
pub fn serialize_csv(view: &ClimateView<'_>) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let header = std::iter::once(DATE_COLUMN).chain(ClimateField::ALL.iter().map(|f| f.column()));
    writer.write_record(header)?;

    for record in view.iter() {
        let date = record
            .date
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default();
        let values = ClimateField::ALL
            .iter()
            .map(|f| f.value(record).map(|v| v.to_string()).unwrap_or_default());
        writer.write_record(std::iter::once(date).chain(values))?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Csv(e.into_error().into()))
}

/// Read an export produced by [`serialize_csv`] back into records.
pub fn parse_exported_csv(bytes: &[u8]) -> Result<Vec<ClimateRecord>> {
    let origin = Path::new("<export>");
    let format_err = |detail: String| Error::DataFormat {
        path: origin.to_path_buf(),
        detail,
    };

    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader.headers()?.clone();
    let expected = std::iter::once(DATE_COLUMN).chain(ClimateField::ALL.iter().map(|f| f.column()));
    if !headers.iter().eq(expected) {
        return Err(format_err(format!("unexpected header {headers:?}")));
    }

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let row = result?;
        let number = |idx: usize| -> Result<f64> {
            let token = row.get(idx).unwrap_or("");
            if token.is_empty() {
                return Ok(f64::NAN);
            }
            token
                .parse::<f64>()
                .map_err(|_| format_err(format!("row {row_no}: '{token}' is not a number")))
        };

        let wind_direction = number(7)?;
        records.push(ClimateRecord {
            date: parse_date(row.get(0).unwrap_or("")),
            tmed: number(1)?,
            tmax: number(2)?,
            tmin: number(3)?,
            precipitation: number(4)?,
            wind_mean: number(5)?,
            wind_gust: number(6)?,
            wind_direction: (!wind_direction.is_nan()).then_some(wind_direction),
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::model::ClimateDataset;

    #[test]
    fn test_round_trip_preserves_values() {
        let ds = ClimateDataset::from_records(vec![
            ClimateRecord {
                date: NaiveDate::from_ymd_opt(2022, 8, 14),
                tmed: 28.349999999999998,
                tmax: 36.1,
                tmin: -0.1,
                precipitation: 0.0,
                wind_mean: 1.0 / 3.0,
                wind_gust: 1e-7,
                wind_direction: Some(355.0),
            },
            ClimateRecord {
                date: None,
                tmed: 12.0,
                tmax: 15.5,
                tmin: 9.25,
                precipitation: f64::NAN,
                wind_mean: 2.2,
                wind_gust: 123456789.125,
                wind_direction: None,
            },
        ]);

        let bytes = serialize_csv(&ds.view()).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("fecha,tmed,tmax,tmin,prec,velmedia,racha,dir\n2022-08-14,"));

        let back = parse_exported_csv(&bytes).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[0], ds.records()[0]);

        let second = &back[1];
        assert_eq!(second.date, None);
        assert!(second.precipitation.is_nan());
        assert_eq!(second.wind_gust, 123456789.125);
        assert_eq!(second.wind_direction, None);
    }

    #[test]
    fn test_empty_view_writes_header_only() {
        let bytes = serialize_csv(&ClimateView::default()).unwrap();
        assert_eq!(bytes, b"fecha,tmed,tmax,tmin,prec,velmedia,racha,dir\n");
    }

    #[test]
    fn test_foreign_header_rejected() {
        let err = parse_exported_csv(b"a,b\n1,2\n").unwrap_err();
        assert!(matches!(err, Error::DataFormat { .. }));
    }
}
