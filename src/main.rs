use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};

mod assessment;
mod db;
mod error;
mod metrics;
mod models;
mod report;
mod store;
mod trends;

use metrics::EfficiencyBand;
use models::{AssessmentResult, ClockTime, DiaryRecord, DiaryUpdate, MorningMood};
use store::Store;

#[derive(Parser)]
#[command(name = "sleepwell-diary")]
#[command(about = "Sleep diary and CBT-I analytics for SleepWell", long_about = None)]
struct Cli {
    /// User the records belong to (ignored by the local file store)
    #[arg(long, default_value = "default", global = true)]
    user: String,

    /// Diary file used when DATABASE_URL is not set
    #[arg(long, default_value = "sleep-diary.json", global = true)]
    data_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a week of realistic seed data
    Seed,
    /// Import diary entries from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Save or update the diary entry for one date
    Log {
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        bedtime: Option<ClockTime>,
        #[arg(long)]
        wake_time: Option<ClockTime>,
        /// Minutes until falling asleep
        #[arg(long)]
        latency: Option<u32>,
        #[arg(long)]
        awakenings: Option<u32>,
        /// Minutes awake after sleep onset
        #[arg(long)]
        waso: Option<u32>,
        /// Subjective sleep quality, 1-5
        #[arg(long)]
        quality: Option<u8>,
        #[arg(long)]
        mood: Option<MorningMood>,
        /// Evening stress level, 1-10
        #[arg(long)]
        stress: Option<u8>,
        #[arg(long)]
        caffeine: Option<bool>,
        #[arg(long)]
        caffeine_last_time: Option<ClockTime>,
        #[arg(long)]
        exercise: Option<bool>,
        #[arg(long)]
        exercise_type: Option<String>,
        #[arg(long)]
        nap: Option<bool>,
        #[arg(long)]
        nap_duration: Option<u32>,
        #[arg(long)]
        worry_note: Option<String>,
    },
    /// Recent-window averages
    Summary {
        #[arg(long, default_value_t = 7)]
        days: usize,
    },
    /// Generate a markdown report
    Report {
        #[arg(long, default_value_t = 30)]
        days: usize,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Score an ISI questionnaire (seven comma-separated item scores, 0-4)
    Assess {
        #[arg(long, value_delimiter = ',')]
        scores: Vec<u8>,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print the sleep context block handed to the AI coach
    Context {
        #[arg(long, default_value_t = 7)]
        days: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let store = Store::connect(cli.data_file.clone()).await?;

    match cli.command {
        Commands::InitDb => match &store {
            Store::Postgres(pool) => {
                db::init_db(pool).await?;
                println!("Schema ready.");
            }
            Store::Local(_) => anyhow::bail!("init-db requires DATABASE_URL"),
        },
        Commands::Seed => match &store {
            Store::Postgres(pool) => {
                db::seed(pool).await?;
                println!("Seed data inserted.");
            }
            Store::Local(_) => anyhow::bail!("seed requires DATABASE_URL"),
        },
        Commands::Import { csv } => {
            let rows = store::read_csv(&csv)?;
            let count = rows.len();
            for (date, update) in rows {
                let mut record = store
                    .fetch_entry(&cli.user, date)
                    .await?
                    .unwrap_or_else(|| DiaryRecord::new(date));
                record.apply(update)?;
                store.upsert_diary(&cli.user, &record).await?;
            }
            println!("Imported {count} entries from {}.", csv.display());
        }
        Commands::Log {
            date,
            bedtime,
            wake_time,
            latency,
            awakenings,
            waso,
            quality,
            mood,
            stress,
            caffeine,
            caffeine_last_time,
            exercise,
            exercise_type,
            nap,
            nap_duration,
            worry_note,
        } => {
            let mut record = store
                .fetch_entry(&cli.user, date)
                .await?
                .unwrap_or_else(|| DiaryRecord::new(date));

            record.apply(DiaryUpdate {
                bedtime,
                wake_time,
                sleep_onset_latency: latency,
                awakenings,
                waso,
                sleep_quality: quality,
                morning_mood: mood,
                stress_level: stress,
                caffeine,
                caffeine_last_time,
                exercise,
                exercise_type,
                nap,
                nap_duration,
                worry_note,
            })?;
            store.upsert_diary(&cli.user, &record).await?;

            println!("Saved entry for {date}.");
            if let (Some(tst), Some(eff)) = (record.total_sleep_time, record.sleep_efficiency) {
                println!(
                    "Slept {} with {}% efficiency ({}).",
                    report::format_minutes(tst),
                    eff,
                    EfficiencyBand::of(eff).label()
                );
            }
        }
        Commands::Summary { days } => {
            let records = store.fetch_diary(&cli.user).await?;
            if records.is_empty() {
                println!("No diary entries yet.");
            } else {
                match trends::weekly_aggregate(&records, days) {
                    Ok(aggregate) => {
                        let eff = aggregate.avg_sleep_efficiency.round() as u8;
                        println!("Summary of the last {} days:", aggregate.days);
                        println!(
                            "- Average sleep time: {}",
                            report::format_minutes(aggregate.avg_sleep_time.round() as u32)
                        );
                        println!(
                            "- Average sleep efficiency: {}% ({})",
                            eff,
                            EfficiencyBand::of(eff).label()
                        );
                        println!(
                            "- Average sleep quality: {:.1}/5",
                            aggregate.avg_sleep_quality
                        );
                        println!("- Average awakenings: {:.1}", aggregate.avg_awakenings);
                        if let Some(stress) = aggregate.avg_stress_level {
                            println!("- Average stress level: {stress:.1}/10");
                        }
                    }
                    Err(err) => println!("No data yet: {err}."),
                }
            }
        }
        Commands::Report { days, out } => {
            let records = store.fetch_diary(&cli.user).await?;
            let assessments = store.fetch_assessments(&cli.user).await?;
            let report = report::build_report(&cli.user, days, &records, &assessments);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Assess { scores, date } => {
            let scores: [u8; assessment::ISI_ITEMS] = scores
                .as_slice()
                .try_into()
                .map_err(|_| anyhow::anyhow!("expected {} item scores", assessment::ISI_ITEMS))?;
            let taken_on = date.unwrap_or_else(|| Utc::now().date_naive());
            let result = AssessmentResult::from_scores(taken_on, scores)?;
            store.insert_assessment(&cli.user, &result).await?;

            println!(
                "ISI total {} - {} ({}).",
                result.total_score,
                result.severity,
                result.severity.label()
            );
        }
        Commands::Context { days } => {
            let records = store.fetch_diary(&cli.user).await?;
            print!("{}", report::coach_context(&records, days));
        }
    }

    Ok(())
}
