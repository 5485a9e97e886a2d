use crate::models::ClockTime;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Sleep efficiency at or above this is considered good.
pub const EFFICIENCY_GOOD: u8 = 85;
/// Sleep efficiency at or above this (but below good) is borderline;
/// anything lower is poor.
pub const EFFICIENCY_BORDERLINE: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EfficiencyBand {
    Good,
    Borderline,
    Poor,
}

impl EfficiencyBand {
    pub fn of(efficiency: u8) -> Self {
        if efficiency >= EFFICIENCY_GOOD {
            Self::Good
        } else if efficiency >= EFFICIENCY_BORDERLINE {
            Self::Borderline
        } else {
            Self::Poor
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Borderline => "borderline",
            Self::Poor => "poor",
        }
    }
}

/// Minutes between going to bed and waking up. When the wake reading is at
/// or before the bedtime reading it belongs to the next calendar day, so a
/// day is added before subtracting; equal readings mean a full 24 hours.
///
/// Malformed times cannot reach this function: `ClockTime` construction and
/// parsing reject them with `InvalidTimeFormat`.
pub fn minutes_in_bed(bedtime: ClockTime, wake_time: ClockTime) -> u32 {
    let bed = bedtime.minutes_from_midnight();
    let mut wake = wake_time.minutes_from_midnight();
    if wake <= bed {
        wake += MINUTES_PER_DAY;
    }
    wake - bed
}

/// Total sleep time: time in bed minus sleep-onset latency minus WASO,
/// clamped at zero. Self-reported latency and WASO can exceed time in bed
/// through rounding or entry error; negative sleep is never reported.
pub fn total_sleep_time(
    bedtime: ClockTime,
    wake_time: ClockTime,
    sleep_onset_latency: u32,
    waso: u32,
) -> u32 {
    minutes_in_bed(bedtime, wake_time)
        .saturating_sub(sleep_onset_latency)
        .saturating_sub(waso)
}

/// Sleep efficiency as a rounded percentage in 0..=100.
pub fn sleep_efficiency(total_sleep_time: u32, bedtime: ClockTime, wake_time: ClockTime) -> u8 {
    let time_in_bed = minutes_in_bed(bedtime, wake_time);
    if time_in_bed == 0 {
        return 0;
    }
    let percent = (f64::from(total_sleep_time) / f64::from(time_in_bed) * 100.0).round();
    percent.min(100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    #[test]
    fn crosses_midnight() {
        assert_eq!(minutes_in_bed(t("23:00"), t("07:00")), 480);
        assert_eq!(minutes_in_bed(t("23:30"), t("07:00")), 450);
    }

    #[test]
    fn same_side_of_midnight() {
        // both readings already past midnight, no day added
        assert_eq!(minutes_in_bed(t("01:00"), t("09:00")), 480);
        assert_eq!(minutes_in_bed(t("22:00"), t("23:30")), 90);
    }

    #[test]
    fn equal_times_mean_a_full_day() {
        assert_eq!(minutes_in_bed(t("01:30"), t("01:30")), 1440);
        assert_eq!(minutes_in_bed(t("00:00"), t("00:00")), 1440);
    }

    #[test]
    fn total_sleep_time_clamps_at_zero() {
        // latency + waso exceed time in bed
        assert_eq!(total_sleep_time(t("23:00"), t("00:00"), 50, 40), 0);
        assert_eq!(total_sleep_time(t("23:00"), t("00:00"), 2000, 0), 0);
    }

    #[test]
    fn worked_example_night() {
        let tst = total_sleep_time(t("23:00"), t("07:00"), 20, 10);
        assert_eq!(tst, 450);
        assert_eq!(sleep_efficiency(tst, t("23:00"), t("07:00")), 94);
    }

    #[test]
    fn full_day_in_bed_is_fully_efficient() {
        let tst = total_sleep_time(t("01:30"), t("01:30"), 0, 0);
        assert_eq!(tst, 1440);
        assert_eq!(sleep_efficiency(tst, t("01:30"), t("01:30")), 100);
    }

    #[test]
    fn efficiency_stays_within_percent_range() {
        for (latency, waso) in [(0, 0), (30, 45), (400, 200), (1440, 1440)] {
            let tst = total_sleep_time(t("22:00"), t("06:00"), latency, waso);
            let eff = sleep_efficiency(tst, t("22:00"), t("06:00"));
            assert!(eff <= 100);
        }
    }

    #[test]
    fn recomputation_is_idempotent() {
        let first = total_sleep_time(t("23:15"), t("06:45"), 25, 15);
        let second = total_sleep_time(t("23:15"), t("06:45"), 25, 15);
        assert_eq!(first, second);
        assert_eq!(
            sleep_efficiency(first, t("23:15"), t("06:45")),
            sleep_efficiency(second, t("23:15"), t("06:45"))
        );
    }

    #[test]
    fn efficiency_bands_split_on_thresholds() {
        assert_eq!(EfficiencyBand::of(94), EfficiencyBand::Good);
        assert_eq!(EfficiencyBand::of(85), EfficiencyBand::Good);
        assert_eq!(EfficiencyBand::of(84), EfficiencyBand::Borderline);
        assert_eq!(EfficiencyBand::of(70), EfficiencyBand::Borderline);
        assert_eq!(EfficiencyBand::of(69), EfficiencyBand::Poor);
    }
}
