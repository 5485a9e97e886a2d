use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::MetricsError;
use crate::models::{AssessmentResult, Severity};

/// Number of items on the Insomnia Severity Index questionnaire.
pub const ISI_ITEMS: usize = 7;
/// Each item is scored 0..=4.
pub const ISI_MAX_ITEM_SCORE: u8 = 4;
/// Highest possible total: 7 items at 4 points each.
pub const ISI_MAX_TOTAL: u8 = 28;

/// Map an ISI total score to its severity band. The four bands partition
/// 0..=28 with inclusive boundaries: 0-7 none, 8-14 mild, 15-21 moderate,
/// 22-28 severe. Totals outside the scale are rejected rather than clamped,
/// so library misuse surfaces instead of being misclassified.
pub fn classify_severity(total_score: u8) -> Result<Severity, MetricsError> {
    match total_score {
        0..=7 => Ok(Severity::None),
        8..=14 => Ok(Severity::Mild),
        15..=21 => Ok(Severity::Moderate),
        22..=28 => Ok(Severity::Severe),
        out => Err(MetricsError::OutOfRangeScore {
            field: "ISI total",
            value: i64::from(out),
            min: 0,
            max: i64::from(ISI_MAX_TOTAL),
        }),
    }
}

impl AssessmentResult {
    /// Validate the seven item scores, sum them, and classify. This is the
    /// only way a result is built; severity always comes from the scores.
    pub fn from_scores(
        taken_on: NaiveDate,
        scores: [u8; ISI_ITEMS],
    ) -> Result<Self, MetricsError> {
        for &score in &scores {
            if score > ISI_MAX_ITEM_SCORE {
                return Err(MetricsError::OutOfRangeScore {
                    field: "ISI item",
                    value: i64::from(score),
                    min: 0,
                    max: i64::from(ISI_MAX_ITEM_SCORE),
                });
            }
        }
        let total_score: u8 = scores.iter().sum();
        let severity = classify_severity(total_score)?;
        Ok(Self {
            id: Uuid::new_v4(),
            taken_on,
            scores,
            total_score,
            severity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_partition_the_scale() {
        assert_eq!(classify_severity(0).unwrap(), Severity::None);
        assert_eq!(classify_severity(7).unwrap(), Severity::None);
        assert_eq!(classify_severity(8).unwrap(), Severity::Mild);
        assert_eq!(classify_severity(14).unwrap(), Severity::Mild);
        assert_eq!(classify_severity(15).unwrap(), Severity::Moderate);
        assert_eq!(classify_severity(21).unwrap(), Severity::Moderate);
        assert_eq!(classify_severity(22).unwrap(), Severity::Severe);
        assert_eq!(classify_severity(28).unwrap(), Severity::Severe);
    }

    #[test]
    fn severity_is_monotonic_in_total() {
        let mut previous = Severity::None;
        for total in 0..=28 {
            let severity = classify_severity(total).unwrap();
            assert!(severity >= previous);
            previous = severity;
        }
    }

    #[test]
    fn totals_beyond_the_scale_are_rejected() {
        assert!(matches!(
            classify_severity(29),
            Err(MetricsError::OutOfRangeScore { .. })
        ));
    }

    #[test]
    fn questionnaire_result_sums_and_classifies() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let result = AssessmentResult::from_scores(date, [2, 3, 1, 2, 3, 2, 2]).unwrap();
        assert_eq!(result.total_score, 15);
        assert_eq!(result.severity, Severity::Moderate);
    }

    #[test]
    fn item_scores_above_four_are_rejected() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let err = AssessmentResult::from_scores(date, [2, 3, 5, 2, 3, 2, 2]).unwrap_err();
        assert!(matches!(err, MetricsError::OutOfRangeScore { .. }));
    }
}
