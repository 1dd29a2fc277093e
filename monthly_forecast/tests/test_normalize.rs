use chrono::{Datelike, Duration, NaiveDate};
use monthly_forecast::data::{PriceObservation, PriceSeries};
use monthly_forecast::normalize::normalize;
use monthly_forecast::period::MonthPeriod;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

// Random trading days with multi-month holes
fn sparse_observations(seed: u64) -> Vec<PriceObservation> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut day = NaiveDate::from_ymd_opt(2010, 3, 15).unwrap();
    let mut observations = Vec::new();
    for _ in 0..200 {
        observations.push(PriceObservation::new(day, rng.gen_range(10.0..200.0)));
        let gap = if rng.gen_bool(0.1) {
            rng.gen_range(35..100)
        } else {
            rng.gen_range(1..5)
        };
        day += Duration::days(gap);
    }
    observations
}

#[test]
fn test_month_count_matches_span() {
    let observations = sparse_observations(42);
    let first = MonthPeriod::from_date(observations[0].timestamp);
    let last = MonthPeriod::from_date(observations[observations.len() - 1].timestamp);

    let monthly = normalize(&PriceSeries::new(observations).unwrap()).unwrap();

    assert_eq!(monthly.len() as i64, first.months_until(&last) + 1);
    for pair in monthly.points().windows(2) {
        assert_eq!(pair[0].period.succ(), pair[1].period);
    }
}

#[test]
fn test_forward_fill_never_looks_ahead() {
    let observations = sparse_observations(7);
    let mut last_in_month: BTreeMap<MonthPeriod, f64> = BTreeMap::new();
    for obs in &observations {
        last_in_month.insert(MonthPeriod::from_date(obs.timestamp), obs.price);
    }

    let monthly = normalize(&PriceSeries::new(observations).unwrap()).unwrap();

    let mut filled = 0;
    for (i, point) in monthly.points().iter().enumerate() {
        match last_in_month.get(&point.period) {
            Some(&observed) => assert_eq!(point.value, observed),
            None => {
                filled += 1;
                assert_eq!(point.value, monthly.points()[i - 1].value);
            }
        }
    }
    assert!(filled > 0, "fixture should contain empty months");
}

#[test]
fn test_unsorted_input_gives_same_series() {
    let observations = sparse_observations(3);
    let mut reversed = observations.clone();
    reversed.reverse();

    let forward = normalize(&PriceSeries::new(observations).unwrap()).unwrap();
    let backward = normalize(&PriceSeries::new(reversed).unwrap()).unwrap();
    assert_eq!(forward, backward);
}

#[test]
fn test_constant_daily_prices_give_constant_months() {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let observations: Vec<PriceObservation> = (0..731)
        .map(|i| start + Duration::days(i))
        .filter(|d| d.weekday().number_from_monday() <= 5)
        .map(|d| PriceObservation::new(d, 100.0))
        .collect();

    let monthly = normalize(&PriceSeries::new(observations).unwrap()).unwrap();
    assert_eq!(monthly.len(), 24);
    assert!(monthly.values().iter().all(|&v| v == 100.0));
    assert_eq!(monthly.last().unwrap().period.to_string(), "2021-12");
}
