use anyhow::Context;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::assessment::ISI_ITEMS;
use crate::models::{AssessmentResult, ClockTime, DiaryRecord, DiaryUpdate, MorningMood};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let nights = vec![
        ("2026-08-17", "23:40", "06:50", 35, 2, 25, 2, MorningMood::Bad, Some(7), Some(true)),
        ("2026-08-18", "23:20", "07:00", 30, 2, 20, 3, MorningMood::Neutral, Some(6), Some(true)),
        ("2026-08-19", "23:30", "06:40", 25, 1, 15, 3, MorningMood::Neutral, Some(6), Some(false)),
        ("2026-08-20", "23:10", "06:50", 20, 1, 15, 4, MorningMood::Good, Some(5), Some(false)),
        ("2026-08-21", "23:00", "07:00", 20, 1, 10, 4, MorningMood::Good, Some(4), Some(false)),
        ("2026-08-22", "23:50", "08:10", 15, 0, 10, 4, MorningMood::Good, None, Some(false)),
        ("2026-08-23", "23:00", "06:50", 15, 1, 10, 5, MorningMood::Great, Some(3), Some(false)),
    ];

    for (date, bedtime, wake, latency, awakenings, waso, quality, mood, stress, caffeine) in nights
    {
        let date: NaiveDate = date.parse()?;
        let mut record = DiaryRecord::new(date);
        record.apply(DiaryUpdate {
            bedtime: Some(bedtime.parse()?),
            wake_time: Some(wake.parse()?),
            sleep_onset_latency: Some(latency),
            awakenings: Some(awakenings),
            waso: Some(waso),
            sleep_quality: Some(quality),
            morning_mood: Some(mood),
            stress_level: stress,
            caffeine,
            ..Default::default()
        })?;
        upsert_diary(pool, "default", &record).await?;
    }

    let assessment = AssessmentResult::from_scores("2026-08-16".parse()?, [2, 3, 1, 2, 3, 2, 2])?;
    insert_assessment(pool, "default", &assessment).await?;

    Ok(())
}

pub async fn fetch_diary(pool: &PgPool, user: &str) -> anyhow::Result<Vec<DiaryRecord>> {
    let rows = sqlx::query(
        "SELECT * FROM sleepwell.sleep_diary WHERE user_id = $1 ORDER BY date ASC",
    )
    .bind(user)
    .fetch_all(pool)
    .await?;

    rows.iter().map(diary_from_row).collect()
}

pub async fn fetch_entry(
    pool: &PgPool,
    user: &str,
    date: NaiveDate,
) -> anyhow::Result<Option<DiaryRecord>> {
    let row = sqlx::query("SELECT * FROM sleepwell.sleep_diary WHERE user_id = $1 AND date = $2")
        .bind(user)
        .bind(date)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(diary_from_row).transpose()
}

pub async fn upsert_diary(pool: &PgPool, user: &str, record: &DiaryRecord) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO sleepwell.sleep_diary
        (user_id, date, bedtime, wake_time, sleep_onset_latency, awakenings, waso,
         sleep_quality, morning_mood, total_sleep_time, sleep_efficiency, stress_level,
         caffeine, caffeine_last_time, exercise, exercise_type, nap, nap_duration, worry_note)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        ON CONFLICT (user_id, date) DO UPDATE SET
            bedtime = EXCLUDED.bedtime,
            wake_time = EXCLUDED.wake_time,
            sleep_onset_latency = EXCLUDED.sleep_onset_latency,
            awakenings = EXCLUDED.awakenings,
            waso = EXCLUDED.waso,
            sleep_quality = EXCLUDED.sleep_quality,
            morning_mood = EXCLUDED.morning_mood,
            total_sleep_time = EXCLUDED.total_sleep_time,
            sleep_efficiency = EXCLUDED.sleep_efficiency,
            stress_level = EXCLUDED.stress_level,
            caffeine = EXCLUDED.caffeine,
            caffeine_last_time = EXCLUDED.caffeine_last_time,
            exercise = EXCLUDED.exercise,
            exercise_type = EXCLUDED.exercise_type,
            nap = EXCLUDED.nap,
            nap_duration = EXCLUDED.nap_duration,
            worry_note = EXCLUDED.worry_note
        "#,
    )
    .bind(user)
    .bind(record.date)
    .bind(record.bedtime.map(|t| t.to_string()))
    .bind(record.wake_time.map(|t| t.to_string()))
    .bind(record.sleep_onset_latency.map(|v| v as i32))
    .bind(record.awakenings.map(|v| v as i32))
    .bind(record.waso.map(|v| v as i32))
    .bind(record.sleep_quality.map(i32::from))
    .bind(record.morning_mood.map(|m| m.as_str()))
    .bind(record.total_sleep_time.map(|v| v as i32))
    .bind(record.sleep_efficiency.map(i32::from))
    .bind(record.stress_level.map(i32::from))
    .bind(record.caffeine)
    .bind(record.caffeine_last_time.map(|t| t.to_string()))
    .bind(record.exercise)
    .bind(record.exercise_type.as_deref())
    .bind(record.nap)
    .bind(record.nap_duration.map(|v| v as i32))
    .bind(record.worry_note.as_deref())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_assessment(
    pool: &PgPool,
    user: &str,
    result: &AssessmentResult,
) -> anyhow::Result<()> {
    let scores: Vec<i32> = result.scores.iter().map(|&s| i32::from(s)).collect();

    sqlx::query(
        r#"
        INSERT INTO sleepwell.assessments (id, user_id, taken_on, scores, total_score, severity)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(result.id)
    .bind(user)
    .bind(result.taken_on)
    .bind(scores)
    .bind(i32::from(result.total_score))
    .bind(result.severity.as_str())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn fetch_assessments(pool: &PgPool, user: &str) -> anyhow::Result<Vec<AssessmentResult>> {
    let rows = sqlx::query(
        "SELECT id, taken_on, scores FROM sleepwell.assessments \
         WHERE user_id = $1 ORDER BY taken_on ASC",
    )
    .bind(user)
    .fetch_all(pool)
    .await?;

    let mut results = Vec::new();
    for row in rows {
        let stored: Vec<i32> = row.get("scores");
        if stored.len() != ISI_ITEMS {
            anyhow::bail!("assessment row has {} scores, expected {ISI_ITEMS}", stored.len());
        }
        let mut scores = [0u8; ISI_ITEMS];
        for (slot, value) in scores.iter_mut().zip(&stored) {
            *slot = u8::try_from(*value).context("assessment score stored out of range")?;
        }
        // total and severity are recomputed from the scores, not read back
        let mut result = AssessmentResult::from_scores(row.get("taken_on"), scores)?;
        result.id = row.get("id");
        results.push(result);
    }

    Ok(results)
}

fn diary_from_row(row: &PgRow) -> anyhow::Result<DiaryRecord> {
    let date: NaiveDate = row.get("date");

    let parse_time = |column: &str| -> anyhow::Result<Option<ClockTime>> {
        row.get::<Option<String>, _>(column)
            .map(|s| s.parse::<ClockTime>())
            .transpose()
            .with_context(|| format!("bad {column} stored for {date}"))
    };
    let get_u32 = |column: &str| -> anyhow::Result<Option<u32>> {
        column_u32(column, row.get(column)).with_context(|| format!("row for {date}"))
    };
    let get_u8 = |column: &str| -> anyhow::Result<Option<u8>> {
        column_u8(column, row.get(column)).with_context(|| format!("row for {date}"))
    };

    Ok(DiaryRecord {
        date,
        bedtime: parse_time("bedtime")?,
        wake_time: parse_time("wake_time")?,
        sleep_onset_latency: get_u32("sleep_onset_latency")?,
        awakenings: get_u32("awakenings")?,
        waso: get_u32("waso")?,
        sleep_quality: get_u8("sleep_quality")?,
        morning_mood: row
            .get::<Option<String>, _>("morning_mood")
            .map(|s| {
                MorningMood::parse(&s)
                    .ok_or_else(|| anyhow::anyhow!("unknown morning mood {s:?} stored"))
            })
            .transpose()?,
        total_sleep_time: get_u32("total_sleep_time")?,
        sleep_efficiency: get_u8("sleep_efficiency")?,
        stress_level: get_u8("stress_level")?,
        caffeine: row.get("caffeine"),
        caffeine_last_time: parse_time("caffeine_last_time")?,
        exercise: row.get("exercise"),
        exercise_type: row.get("exercise_type"),
        nap: row.get("nap"),
        nap_duration: get_u32("nap_duration")?,
        worry_note: row.get("worry_note"),
    })
}

/// Checked conversions for stored diary integers: a negative or oversized
/// value from a corrupted row fails loudly instead of wrapping.
fn column_u32(column: &str, value: Option<i32>) -> anyhow::Result<Option<u32>> {
    value
        .map(|v| u32::try_from(v).with_context(|| format!("{column} stored out of range: {v}")))
        .transpose()
}

fn column_u8(column: &str, value: Option<i32>) -> anyhow::Result<Option<u8>> {
    value
        .map(|v| u8::try_from(v).with_context(|| format!("{column} stored out of range: {v}")))
        .transpose()
}
