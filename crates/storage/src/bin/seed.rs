use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use course_core::model::{Course, CourseId, Lesson, LessonDuration, LessonId, Module, ModuleId};
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    catalog: Option<PathBuf>,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("COURSE_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut catalog = std::env::var("COURSE_CATALOG").ok().map(PathBuf::from);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--catalog" => {
                    catalog = Some(PathBuf::from(require_value(&mut args, "--catalog")?));
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            catalog,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --catalog <file.json>     Course list as returned by the storefront API");
    eprintln!("                            (default: a built-in demo course)");
    eprintln!("  --now <rfc3339>           Fixed fetch time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  COURSE_DB_URL, COURSE_CATALOG");
}

/// Accepts either a bare array or the API's `{ "data": [...] }` envelope.
fn parse_catalog(raw: &str) -> Result<Vec<Course>, Box<dyn std::error::Error>> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Payload {
        List(Vec<Course>),
        Envelope { data: Vec<Course> },
    }

    let courses = match serde_json::from_str::<Payload>(raw)? {
        Payload::List(courses) | Payload::Envelope { data: courses } => courses,
    };
    courses
        .into_iter()
        .map(|course| course.validated().map_err(Into::into))
        .collect()
}

fn demo_course() -> Result<Course, Box<dyn std::error::Error>> {
    let module_id = ModuleId::new(1);
    let lessons = vec![
        Lesson::new(LessonId::new(1), module_id, "Welcome", 1)
            .with_description("What this course covers.")
            .with_video("https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8")
            .with_duration(LessonDuration::parse("10:34")),
        Lesson::new(LessonId::new(2), module_id, "Tools of the trade", 2)
            .with_video(
                "https://storage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4",
            )
            .with_duration(LessonDuration::parse("596")),
        Lesson::new(LessonId::new(3), module_id, "Reading list", 3),
    ];
    let module = Module::new(module_id, CourseId::new(1), "Getting started", 1, lessons)?;
    Ok(Course::new(
        CourseId::new(1),
        "Demo course",
        Some("Sample content for local development.".to_string()),
        vec![module],
    )?)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let courses = match &args.catalog {
        Some(path) => parse_catalog(&std::fs::read_to_string(path)?)?,
        None => vec![demo_course()?],
    };

    for course in &courses {
        storage.catalog.upsert_course(course, now).await?;
    }

    println!(
        "Seeded {} course(s) with {} lesson(s) into {}",
        courses.len(),
        courses.iter().map(Course::lesson_count).sum::<usize>(),
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
