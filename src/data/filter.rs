use chrono::NaiveDate;

use super::model::ClimateView;

// ---------------------------------------------------------------------------
// Filter predicates: date window and temperature thresholds
// ---------------------------------------------------------------------------

/// Records dated within `start..=end`, in view order.
///
/// Undated records never match. The bounds are taken as given: a caller
/// passing `start > end` gets an empty view.
pub fn filter_by_date<'a>(view: &ClimateView<'a>, start: NaiveDate, end: NaiveDate) -> ClimateView<'a> {
    ClimateView::new(
        view.iter()
            .filter(|r| r.date.is_some_and(|d| start <= d && d <= end))
            .collect(),
    )
}

/// Records with `tmin >= tmin_floor` and `tmax <= tmax_ceiling`.
///
/// A missing temperature fails the comparison, so the record is dropped.
pub fn filter_by_temperature_bounds<'a>(
    view: &ClimateView<'a>,
    tmin_floor: f64,
    tmax_ceiling: f64,
) -> ClimateView<'a> {
    ClimateView::new(
        view.iter()
            .filter(|r| r.tmin >= tmin_floor && r.tmax <= tmax_ceiling)
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Selector bounds
// ---------------------------------------------------------------------------

/// Earliest and latest date present in the view.
pub fn date_bounds(view: &ClimateView<'_>) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = view.iter().filter_map(|r| r.date);
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

/// Observed range of `tmin` and of `tmax` in the view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureBounds {
    pub tmin: (f64, f64),
    pub tmax: (f64, f64),
}

/// `None` when either column has no values in the view.
pub fn temperature_bounds(view: &ClimateView<'_>) -> Option<TemperatureBounds> {
    fn range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
        values
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
            })
    }

    Some(TemperatureBounds {
        tmin: range(view.iter().map(|r| r.tmin))?,
        tmax: range(view.iter().map(|r| r.tmax))?,
    })
}
