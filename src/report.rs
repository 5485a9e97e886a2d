use std::fmt::Write;

use crate::metrics::EfficiencyBand;
use crate::models::{AssessmentResult, DiaryRecord};
use crate::trends;

/// Minutes rendered as "7h 30m" (or "45m" / "7h" when a part is zero).
pub fn format_minutes(minutes: u32) -> String {
    let h = minutes / 60;
    let m = minutes % 60;
    if h == 0 {
        format!("{m}m")
    } else if m == 0 {
        format!("{h}h")
    } else {
        format!("{h}h {m}m")
    }
}

fn format_minutes_signed(minutes: f64) -> String {
    let rounded = minutes.round() as i64;
    let sign = if rounded < 0 { "-" } else { "+" };
    format!("{sign}{}", format_minutes(rounded.unsigned_abs() as u32))
}

/// One-line digest of a diary entry, listing only the fields it carries.
fn entry_line(record: &DiaryRecord) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(tst) = record.total_sleep_time {
        parts.push(format!("slept {}", format_minutes(tst)));
    }
    if let Some(eff) = record.sleep_efficiency {
        parts.push(format!("efficiency {eff}%"));
    }
    if let Some(quality) = record.sleep_quality {
        parts.push(format!("quality {quality}/5"));
    }
    if let Some(latency) = record.sleep_onset_latency {
        parts.push(format!("latency {latency}m"));
    }
    if let Some(awakenings) = record.awakenings {
        parts.push(format!("awakenings {awakenings}"));
    }
    if let Some(mood) = record.morning_mood {
        parts.push(format!("mood {}", mood.as_str()));
    }
    if let Some(stress) = record.stress_level {
        parts.push(format!("stress {stress}/10"));
    }
    if record.caffeine == Some(true) {
        parts.push("caffeine".to_string());
    }
    if record.exercise == Some(true) {
        parts.push("exercise".to_string());
    }
    if record.nap == Some(true) {
        parts.push("napped".to_string());
    }
    if parts.is_empty() {
        parts.push("no details".to_string());
    }
    format!("{}: {}", record.date, parts.join(", "))
}

/// Plain-text sleep context handed to the AI coach alongside the chat
/// transcript: the recent window day by day, then its averages. Produces
/// only numbers and labels; the prompt around it lives elsewhere.
pub fn coach_context(records: &[DiaryRecord], window: usize) -> String {
    if records.is_empty() {
        return "No sleep records yet.".to_string();
    }

    let recent = trends::recent_window(records, window);
    let mut output = String::new();

    let _ = writeln!(output, "Days logged: {}", records.len());
    let _ = writeln!(output, "Last {} days:", recent.len());
    for record in recent {
        let _ = writeln!(output, "- {}", entry_line(record));
    }

    if let Ok(avg_sleep) = trends::average_of(recent, "total sleep time", |r| {
        r.total_sleep_time.map(f64::from)
    }) {
        let _ = writeln!(
            output,
            "\nAverage sleep time: {}",
            format_minutes(avg_sleep.round() as u32)
        );
    }
    if let Ok(avg_eff) = trends::average_of(recent, "sleep efficiency", |r| {
        r.sleep_efficiency.map(f64::from)
    }) {
        let _ = writeln!(output, "Average sleep efficiency: {}%", avg_eff.round());
    }

    output
}

/// Markdown report over the trailing window: weekly summary, weekday
/// averages, the stress/quality scatter sample, recent entries, and the
/// latest assessment when one exists.
pub fn build_report(
    user: &str,
    window_days: usize,
    records: &[DiaryRecord],
    assessments: &[AssessmentResult],
) -> String {
    let window = trends::recent_window(records, window_days);
    let mut output = String::new();

    let _ = writeln!(output, "# Sleep Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} diary days, last {} considered)",
        user,
        records.len(),
        window.len()
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Summary");
    match trends::weekly_aggregate(records, window_days) {
        Ok(aggregate) => {
            let avg_eff = aggregate.avg_sleep_efficiency.round() as u8;
            let _ = writeln!(
                output,
                "- Average sleep time: {}",
                format_minutes(aggregate.avg_sleep_time.round() as u32)
            );
            let _ = writeln!(
                output,
                "- Average sleep efficiency: {}% ({})",
                avg_eff,
                EfficiencyBand::of(avg_eff).label()
            );
            let _ = writeln!(
                output,
                "- Average sleep quality: {:.1}/5",
                aggregate.avg_sleep_quality
            );
            let _ = writeln!(
                output,
                "- Average awakenings: {:.1}",
                aggregate.avg_awakenings
            );
            if let Some(stress) = aggregate.avg_stress_level {
                let _ = writeln!(output, "- Average stress level: {stress:.1}/10");
            }
            if let Some(change) = aggregate.sleep_time_change {
                let _ = writeln!(
                    output,
                    "- Sleep time vs previous window: {}",
                    format_minutes_signed(change)
                );
            }
            if let Some(change) = aggregate.efficiency_change {
                let _ = writeln!(
                    output,
                    "- Efficiency vs previous window: {:+.0}%",
                    change
                );
            }
        }
        Err(_) => {
            let _ = writeln!(output, "No diary entries with sleep metrics in this window.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Sleep Time by Weekday");
    let stats = trends::weekday_averages(window, |r| r.total_sleep_time.map(f64::from));
    for stat in stats {
        match stat.average {
            Some(avg) => {
                let _ = writeln!(
                    output,
                    "- {}: {}",
                    stat.label,
                    format_minutes(avg.round() as u32)
                );
            }
            None => {
                let _ = writeln!(output, "- {}: no data", stat.label);
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Stress vs Sleep Quality");
    let series = trends::correlation_series(
        window,
        |r| r.stress_level.map(f64::from),
        |r| r.sleep_quality.map(f64::from),
    );
    if series.is_empty() {
        let _ = writeln!(output, "No nights with both stress and quality recorded.");
    } else {
        let _ = writeln!(output, "{} nights with both recorded:", series.len());
        for point in &series {
            let _ = writeln!(
                output,
                "- {}: stress {:.0}, quality {:.0}",
                point.date, point.a, point.b
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Entries");
    if window.is_empty() {
        let _ = writeln!(output, "No diary entries recorded for this window.");
    } else {
        for record in window.iter().rev().take(5) {
            let _ = writeln!(output, "- {}", entry_line(record));
        }
    }

    if let Some(latest) = assessments.last() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Latest Assessment");
        let _ = writeln!(
            output,
            "ISI total {} on {} - {} ({})",
            latest.total_score,
            latest.taken_on,
            latest.severity,
            latest.severity.label()
        );
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DiaryRecord, DiaryUpdate, MorningMood};
    use chrono::NaiveDate;

    fn sample_record(date: &str) -> DiaryRecord {
        let mut record = DiaryRecord::new(date.parse::<NaiveDate>().unwrap());
        record
            .apply(DiaryUpdate {
                bedtime: Some("23:00".parse().unwrap()),
                wake_time: Some("07:00".parse().unwrap()),
                sleep_onset_latency: Some(20),
                awakenings: Some(1),
                waso: Some(10),
                sleep_quality: Some(4),
                morning_mood: Some(MorningMood::Good),
                stress_level: Some(6),
                caffeine: Some(true),
                ..Default::default()
            })
            .unwrap();
        record
    }

    #[test]
    fn minutes_formatting() {
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(420), "7h");
        assert_eq!(format_minutes(450), "7h 30m");
    }

    #[test]
    fn context_is_empty_safe() {
        assert_eq!(coach_context(&[], 7), "No sleep records yet.");
    }

    #[test]
    fn context_lists_recent_days_and_averages() {
        let records = vec![sample_record("2026-08-23"), sample_record("2026-08-24")];
        let context = coach_context(&records, 7);

        assert!(context.contains("Days logged: 2"));
        assert!(context.contains("Last 2 days:"));
        assert!(context.contains("2026-08-24: slept 7h 30m, efficiency 94%"));
        assert!(context.contains("mood good"));
        assert!(context.contains("caffeine"));
        assert!(context.contains("Average sleep time: 7h 30m"));
        assert!(context.contains("Average sleep efficiency: 94%"));
    }

    #[test]
    fn report_handles_an_empty_window() {
        let report = build_report("default", 7, &[], &[]);
        assert!(report.contains("No diary entries with sleep metrics"));
        assert!(report.contains("- Sun: no data"));
        assert!(report.contains("No nights with both stress and quality recorded."));
        assert!(report.contains("No diary entries recorded for this window."));
    }

    #[test]
    fn report_includes_summary_and_correlation() {
        let records = vec![sample_record("2026-08-23"), sample_record("2026-08-24")];
        let report = build_report("default", 7, &records, &[]);

        assert!(report.contains("## Weekly Summary"));
        assert!(report.contains("- Average sleep efficiency: 94% (good)"));
        assert!(report.contains("2 nights with both recorded:"));
        assert!(report.contains("- 2026-08-23: stress 6, quality 4"));
    }

    #[test]
    fn report_shows_latest_assessment() {
        let taken_on = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let assessment =
            crate::models::AssessmentResult::from_scores(taken_on, [2, 3, 1, 2, 3, 2, 2])
                .unwrap();
        let report = build_report("default", 7, &[], &[assessment]);
        assert!(report.contains("ISI total 15 on 2026-08-01 - moderate"));
    }
}
