//! Irregular daily prices to a regular month-end series

use crate::data::{MonthlyPoint, PriceSeries, RegularSeries};
use crate::error::{ForecastError, Result};
use crate::period::MonthPeriod;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Resample observations to one value per calendar month.
///
/// Each month takes the price of its last trading day. Months without any
/// observation repeat the previous month's value, so the output never looks
/// ahead. Fails with `InsufficientData` when there are no observations.
pub fn normalize(observations: &PriceSeries) -> Result<RegularSeries> {
    let mut month_end: BTreeMap<MonthPeriod, f64> = BTreeMap::new();
    for observation in observations.observations() {
        // Input is sorted, so the last insert per month wins.
        month_end.insert(MonthPeriod::from_date(observation.timestamp), observation.price);
    }

    let (first, last) = match (month_end.keys().next(), month_end.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => {
            return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
        }
    };

    let mut points = Vec::with_capacity(first.months_until(&last) as usize + 1);
    let mut filled = 0usize;
    let mut carried = f64::NAN;
    let mut period = first;
    while period <= last {
        let value = match month_end.get(&period) {
            Some(&observed) => observed,
            None => {
                filled += 1;
                debug!(period = %period, value = carried, "Forward-filling empty month");
                carried
            }
        };
        points.push(MonthlyPoint { period, value });
        carried = value;
        period = period.succ();
    }

    info!(
        observations = observations.len(),
        months = points.len(),
        forward_filled = filled,
        first = %first,
        last = %last,
        "Normalized daily prices to month-end series"
    );

    RegularSeries::from_points(points)
}
