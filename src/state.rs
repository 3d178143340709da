use chrono::NaiveDate;

use crate::data::filter::{
    date_bounds, filter_by_date, filter_by_temperature_bounds, temperature_bounds,
};
use crate::data::model::{ClimateDataset, ClimateRecord, ClimateView};
use crate::data::stats::{summary_statistics, SummaryStatistics};

/// Rows shown in the table snapshot.
pub const SNAPSHOT_ROWS: usize = 10;

// ---------------------------------------------------------------------------
// Data page selection state
// ---------------------------------------------------------------------------

/// The user's current date window and temperature thresholds over a
/// dataset, together with the view they select.
pub struct DataSelection<'a> {
    dataset: &'a ClimateDataset,

    /// Full date extent of the dataset.
    pub date_limits: (NaiveDate, NaiveDate),

    /// Selected window, inclusive.
    pub start: NaiveDate,
    pub end: NaiveDate,

    /// Keep days with `tmin >= tmin_floor`.
    pub tmin_floor: f64,
    /// Keep days with `tmax <= tmax_ceiling`.
    pub tmax_ceiling: f64,

    /// Records passing the current selection (cached).
    visible: ClimateView<'a>,
}

impl<'a> DataSelection<'a> {
    /// Select everything. `None` when no record carries a date.
    pub fn new(dataset: &'a ClimateDataset) -> Option<Self> {
        let (first, last) = date_bounds(&dataset.view())?;
        let mut selection = DataSelection {
            dataset,
            date_limits: (first, last),
            start: first,
            end: last,
            tmin_floor: f64::NEG_INFINITY,
            tmax_ceiling: f64::INFINITY,
            visible: ClimateView::default(),
        };
        selection.set_date_range(first, last);
        Some(selection)
    }

    /// Change the window and re-seed both thresholds from the days it
    /// contains, so the new window starts unfiltered by temperature.
    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        self.start = start;
        self.end = end;
        let dated = filter_by_date(&self.dataset.view(), start, end);
        match temperature_bounds(&dated) {
            Some(bounds) => {
                self.tmin_floor = bounds.tmin.0;
                self.tmax_ceiling = bounds.tmax.1;
            }
            None => {
                self.tmin_floor = f64::NEG_INFINITY;
                self.tmax_ceiling = f64::INFINITY;
            }
        }
        self.refilter();
    }

    pub fn set_temperature_bounds(&mut self, tmin_floor: f64, tmax_ceiling: f64) {
        self.tmin_floor = tmin_floor;
        self.tmax_ceiling = tmax_ceiling;
        self.refilter();
    }

    /// Recompute the visible view after a selection change.
    fn refilter(&mut self) {
        let dated = filter_by_date(&self.dataset.view(), self.start, self.end);
        self.visible = filter_by_temperature_bounds(&dated, self.tmin_floor, self.tmax_ceiling);
    }

    pub fn view(&self) -> &ClimateView<'a> {
        &self.visible
    }

    /// First rows of the view for the table snapshot.
    pub fn snapshot(&self) -> &[&'a ClimateRecord] {
        self.visible.head(SNAPSHOT_ROWS)
    }

    pub fn summary(&self) -> Option<SummaryStatistics> {
        summary_statistics(&self.visible)
    }
}
