use thiserror::Error;

/// Failures produced by the sleep-metrics core. All of them are local and
/// non-retryable: bad input or an empty sample, never I/O.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricsError {
    /// A clock time was missing, non-numeric, or outside HH:MM range.
    /// The original app silently treated these as a zero-minute night;
    /// we fail instead so a data-entry glitch surfaces as an error rather
    /// than a report showing "0 minutes of sleep".
    #[error("invalid time format: {0:?} (expected HH:MM)")]
    InvalidTimeFormat(String),

    /// An ordinal score fell outside its defined domain.
    #[error("{field} score {value} out of range {min}..={max}")]
    OutOfRangeScore {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    /// An aggregate was requested over zero eligible records. Distinct from
    /// a valid zero so callers can render "no data yet" instead of "0%".
    #[error("insufficient data: no records with a {0} value")]
    InsufficientData(&'static str),
}
