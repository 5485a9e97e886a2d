use chrono::Datelike;

use crate::error::MetricsError;
use crate::models::{CorrelationPoint, DiaryRecord, WeekdayStat, WeeklyAggregate};

/// Weekday labels indexed Sunday-first, matching how diary dates bucket.
pub const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Mean of one metric across the records that carry it. Records where the
/// selector yields `None` count toward neither numerator nor denominator;
/// when no record carries the metric the result is `InsufficientData`, not
/// a silent zero.
pub fn average_of<F>(
    records: &[DiaryRecord],
    metric: &'static str,
    select: F,
) -> Result<f64, MetricsError>
where
    F: Fn(&DiaryRecord) -> Option<f64>,
{
    let values: Vec<f64> = records.iter().filter_map(&select).collect();
    if values.is_empty() {
        return Err(MetricsError::InsufficientData(metric));
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// The last `n` records in date order, or all of them when fewer exist.
/// A subslice, so callers can iterate it as often as they like without
/// touching the source.
pub fn recent_window(records: &[DiaryRecord], n: usize) -> &[DiaryRecord] {
    &records[records.len().saturating_sub(n)..]
}

/// Bucket records by the weekday of their diary date (the morning the sleep
/// ended) and average one metric per bucket. Weekdays with no eligible
/// record report `None` so charts can show "no data" instead of a zero bar.
pub fn weekday_averages<F>(records: &[DiaryRecord], select: F) -> [WeekdayStat; 7]
where
    F: Fn(&DiaryRecord) -> Option<f64>,
{
    let mut sums = [0.0f64; 7];
    let mut counts = [0usize; 7];

    for record in records {
        if let Some(value) = select(record) {
            let day = record.date.weekday().num_days_from_sunday() as usize;
            sums[day] += value;
            counts[day] += 1;
        }
    }

    std::array::from_fn(|day| WeekdayStat {
        weekday: day,
        label: WEEKDAY_LABELS[day],
        average: (counts[day] > 0).then(|| sums[day] / counts[day] as f64),
    })
}

/// Paired samples for scatter analysis: the records where both metrics are
/// present, in date order. Only the sample is produced; any coefficient is
/// the caller's business.
pub fn correlation_series<FA, FB>(
    records: &[DiaryRecord],
    select_a: FA,
    select_b: FB,
) -> Vec<CorrelationPoint>
where
    FA: Fn(&DiaryRecord) -> Option<f64>,
    FB: Fn(&DiaryRecord) -> Option<f64>,
{
    records
        .iter()
        .filter_map(|record| {
            let a = select_a(record)?;
            let b = select_b(record)?;
            Some(CorrelationPoint {
                date: record.date,
                a,
                b,
            })
        })
        .collect()
}

/// Averages over the last `window` records, with deltas against the window
/// before it when one exists. Fails with `InsufficientData` when the current
/// window is empty or none of its records have computed sleep metrics.
pub fn weekly_aggregate(
    records: &[DiaryRecord],
    window: usize,
) -> Result<WeeklyAggregate, MetricsError> {
    let current = recent_window(records, window);
    if current.is_empty() {
        return Err(MetricsError::InsufficientData("diary entries"));
    }
    let prior_end = records.len() - current.len();
    let previous = &records[prior_end.saturating_sub(window)..prior_end];

    let avg_sleep_time = average_of(current, "total sleep time", |r| {
        r.total_sleep_time.map(f64::from)
    })?;
    let avg_sleep_efficiency = average_of(current, "sleep efficiency", |r| {
        r.sleep_efficiency.map(f64::from)
    })?;
    let avg_sleep_quality =
        average_of(current, "sleep quality", |r| r.sleep_quality.map(f64::from))?;
    let avg_awakenings = average_of(current, "awakenings", |r| r.awakenings.map(f64::from))?;
    let avg_stress_level =
        average_of(current, "stress level", |r| r.stress_level.map(f64::from)).ok();

    let sleep_time_change = average_of(previous, "total sleep time", |r| {
        r.total_sleep_time.map(f64::from)
    })
    .ok()
    .map(|prev| avg_sleep_time - prev);
    let efficiency_change = average_of(previous, "sleep efficiency", |r| {
        r.sleep_efficiency.map(f64::from)
    })
    .ok()
    .map(|prev| avg_sleep_efficiency - prev);

    Ok(WeeklyAggregate {
        days: current.len(),
        avg_sleep_time,
        avg_sleep_efficiency,
        avg_sleep_quality,
        avg_awakenings,
        avg_stress_level,
        sleep_time_change,
        efficiency_change,
    })
}
