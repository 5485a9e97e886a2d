use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::db;
use crate::models::{AssessmentResult, ClockTime, DiaryRecord, DiaryUpdate, MorningMood};

/// Record store keyed by (user, date). Postgres when `DATABASE_URL` is set,
/// otherwise a local JSON file so the tool works without an account or a
/// database, the way the original app fell back to browser storage.
pub enum Store {
    Postgres(PgPool),
    Local(LocalStore),
}

impl Store {
    pub async fn connect(data_file: PathBuf) -> anyhow::Result<Self> {
        match std::env::var("DATABASE_URL") {
            Ok(url) => {
                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect(&url)
                    .await
                    .context("failed to connect to Postgres")?;
                Ok(Self::Postgres(pool))
            }
            Err(_) => Ok(Self::Local(LocalStore::new(data_file))),
        }
    }

    /// All diary records for a user in ascending date order.
    pub async fn fetch_diary(&self, user: &str) -> anyhow::Result<Vec<DiaryRecord>> {
        match self {
            Self::Postgres(pool) => db::fetch_diary(pool, user).await,
            Self::Local(local) => Ok(local.load()?.diary),
        }
    }

    pub async fn fetch_entry(
        &self,
        user: &str,
        date: NaiveDate,
    ) -> anyhow::Result<Option<DiaryRecord>> {
        match self {
            Self::Postgres(pool) => db::fetch_entry(pool, user, date).await,
            Self::Local(local) => {
                Ok(local.load()?.diary.into_iter().find(|r| r.date == date))
            }
        }
    }

    pub async fn upsert_diary(&self, user: &str, record: &DiaryRecord) -> anyhow::Result<()> {
        match self {
            Self::Postgres(pool) => db::upsert_diary(pool, user, record).await,
            Self::Local(local) => {
                let mut data = local.load()?;
                data.upsert_diary(record.clone());
                local.save(&data)
            }
        }
    }

    pub async fn insert_assessment(
        &self,
        user: &str,
        result: &AssessmentResult,
    ) -> anyhow::Result<()> {
        match self {
            Self::Postgres(pool) => db::insert_assessment(pool, user, result).await,
            Self::Local(local) => {
                let mut data = local.load()?;
                data.assessments.push(result.clone());
                local.save(&data)
            }
        }
    }

    pub async fn fetch_assessments(&self, user: &str) -> anyhow::Result<Vec<AssessmentResult>> {
        match self {
            Self::Postgres(pool) => db::fetch_assessments(pool, user).await,
            Self::Local(local) => Ok(local.load()?.assessments),
        }
    }
}

/// Single-profile JSON file store. The `user` argument of `Store` is ignored
/// here; like the original's local storage, the file belongs to whoever runs
/// the tool.
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> anyhow::Result<LocalData> {
        if !self.path.exists() {
            return Ok(LocalData::default());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("malformed diary file {}", self.path.display()))
    }

    fn save(&self, data: &LocalData) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalData {
    #[serde(default)]
    pub diary: Vec<DiaryRecord>,
    #[serde(default)]
    pub assessments: Vec<AssessmentResult>,
}

impl LocalData {
    /// Replace the record for its date or insert it keeping date order.
    pub fn upsert_diary(&mut self, record: DiaryRecord) {
        match self.diary.iter().position(|r| r.date == record.date) {
            Some(existing) => self.diary[existing] = record,
            None => {
                self.diary.push(record);
                self.diary.sort_by_key(|r| r.date);
            }
        }
    }
}

/// Parse a diary CSV into save payloads keyed by date. Every row carries the
/// full morning block; evening columns may be left empty. The payloads go
/// through the same fetch-merge-apply path as interactive saves, so a row
/// for an existing date overwrites only the columns it carries.
pub fn read_csv(path: &Path) -> anyhow::Result<Vec<(NaiveDate, DiaryUpdate)>> {
    let reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    parse_csv(reader)
}

fn parse_csv<R: std::io::Read>(
    mut reader: csv::Reader<R>,
) -> anyhow::Result<Vec<(NaiveDate, DiaryUpdate)>> {
    #[derive(Deserialize)]
    struct CsvRow {
        date: NaiveDate,
        bedtime: ClockTime,
        wake_time: ClockTime,
        sleep_onset_latency: u32,
        awakenings: u32,
        waso: u32,
        sleep_quality: u8,
        morning_mood: MorningMood,
        stress_level: Option<u8>,
        caffeine: Option<bool>,
        exercise: Option<bool>,
        nap: Option<bool>,
        worry_note: Option<String>,
    }

    let mut rows = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let update = DiaryUpdate {
            bedtime: Some(row.bedtime),
            wake_time: Some(row.wake_time),
            sleep_onset_latency: Some(row.sleep_onset_latency),
            awakenings: Some(row.awakenings),
            waso: Some(row.waso),
            sleep_quality: Some(row.sleep_quality),
            morning_mood: Some(row.morning_mood),
            stress_level: row.stress_level,
            caffeine: row.caffeine,
            exercise: row.exercise,
            nap: row.nap,
            worry_note: row.worry_note,
            ..Default::default()
        };
        rows.push((row.date, update));
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MorningMood;

    fn record(date: &str) -> DiaryRecord {
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
                ..Default::default()
            })
            .unwrap();
        record
    }

    #[test]
    fn upsert_keeps_dates_unique_and_ordered() {
        let mut data = LocalData::default();
        data.upsert_diary(record("2026-08-24"));
        data.upsert_diary(record("2026-08-22"));
        data.upsert_diary(record("2026-08-23"));

        let dates: Vec<String> = data.diary.iter().map(|r| r.date.to_string()).collect();
        assert_eq!(dates, ["2026-08-22", "2026-08-23", "2026-08-24"]);

        // same date replaces instead of duplicating
        let mut replacement = record("2026-08-23");
        replacement.stress_level = Some(8);
        data.upsert_diary(replacement);
        assert_eq!(data.diary.len(), 3);
        assert_eq!(data.diary[1].stress_level, Some(8));
    }

    const MORNING_ONLY_CSV: &str = "\
date,bedtime,wake_time,sleep_onset_latency,awakenings,waso,sleep_quality,morning_mood,stress_level,caffeine,exercise,nap,worry_note
2026-08-23,23:00,07:00,20,1,10,4,good,6,true,,,
2026-08-24,23:30,06:30,15,0,5,3,neutral,,,,,
";

    #[test]
    fn csv_rows_become_dated_payloads() {
        let reader = csv::Reader::from_reader(MORNING_ONLY_CSV.as_bytes());
        let rows = parse_csv(reader).unwrap();
        assert_eq!(rows.len(), 2);

        let (date, update) = &rows[0];
        assert_eq!(date.to_string(), "2026-08-23");
        assert_eq!(update.bedtime, Some("23:00".parse().unwrap()));
        assert_eq!(update.stress_level, Some(6));
        assert_eq!(update.caffeine, Some(true));

        // empty evening columns stay absent rather than defaulting
        let (_, update) = &rows[1];
        assert_eq!(update.stress_level, None);
        assert_eq!(update.caffeine, None);
        assert_eq!(update.worry_note, None);
    }

    #[test]
    fn imported_row_merges_into_the_stored_record() {
        let mut data = LocalData::default();
        let mut stored = record("2026-08-24");
        stored
            .apply(DiaryUpdate {
                stress_level: Some(8),
                worry_note: Some("presentation".to_string()),
                ..Default::default()
            })
            .unwrap();
        data.upsert_diary(stored);

        let reader = csv::Reader::from_reader(MORNING_ONLY_CSV.as_bytes());
        let rows = parse_csv(reader).unwrap();
        for (date, update) in rows {
            let mut record = data
                .diary
                .iter()
                .find(|r| r.date == date)
                .cloned()
                .unwrap_or_else(|| DiaryRecord::new(date));
            record.apply(update).unwrap();
            data.upsert_diary(record);
        }

        assert_eq!(data.diary.len(), 2);
        // the morning-only row updated the sleep fields for 2026-08-24
        let merged = data.diary.iter().find(|r| r.date.to_string() == "2026-08-24").unwrap();
        assert_eq!(merged.bedtime, Some("23:30".parse().unwrap()));
        // without wiping the evening half saved earlier
        assert_eq!(merged.stress_level, Some(8));
        assert_eq!(merged.worry_note.as_deref(), Some("presentation"));
    }

    #[test]
    fn diary_file_round_trips_through_json() {
        let mut data = LocalData::default();
        data.upsert_diary(record("2026-08-24"));
        let raw = serde_json::to_string(&data).unwrap();

        // clock times serialize as HH:MM strings
        assert!(raw.contains("\"23:00\""));

        let loaded: LocalData = serde_json::from_str(&raw).unwrap();
        assert_eq!(loaded, data);
    }
}
