use std::fmt;
use std::sync::Arc;

use course_core::model::UserId;
use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{AppServices, Clock, PlayerConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;
use ui::{App, UiApp, build_app_context};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidUser { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidUser { raw } => write!(f, "invalid --user value: {raw:?}"),
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

/// Command-line overrides on top of the `COURSE_*` environment.
#[derive(Debug, Default)]
struct Args {
    db_url: Option<String>,
    api_base: Option<String>,
    user_id: Option<UserId>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = Some(value);
                }
                "--api" => parsed.api_base = Some(require_value(args, "--api")?),
                "--user" => {
                    let value = require_value(args, "--user")?;
                    let user = UserId::new(value.clone())
                        .map_err(|_| ArgsError::InvalidUser { raw: value })?;
                    parsed.user_id = Some(user);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }
        Ok(parsed)
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--api <base_url>] [--user <id>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:dev.sqlite3");
    eprintln!("  no --api: browse the local cache only, no progress is sent");
    eprintln!("  no --user: progress is neither shown nor reported");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  COURSE_DB_URL, COURSE_API_BASE_URL, COURSE_USER_ID,");
    eprintln!("  COURSE_PROGRESS_PATH, COURSE_REPORT_INTERVAL_SECS,");
    eprintln!("  COURSE_REQUEST_TIMEOUT_SECS, COURSE_PAUSE_STATUS, RUST_LOG");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();

    let mut config = PlayerConfig::from_env()?;
    if let Some(api) = args.api_base.as_deref() {
        config = config.with_base_url(api)?;
    }
    if let Some(user) = args.user_id {
        config = config.with_user(user);
    }
    let db_url = args
        .db_url
        .or_else(|| std::env::var("COURSE_DB_URL").ok())
        .unwrap_or_else(|| "sqlite:dev.sqlite3".into());

    info!(
        db = %db_url,
        api = config.base_url.as_ref().map_or("disabled", |u| u.as_str()),
        reporting = config.reporting_enabled(),
        "starting course player"
    );
    let services = AppServices::new_sqlite(&db_url, Clock::default_clock(), config).await?;

    let app: Arc<dyn UiApp> = Arc::new(services);
    let context = build_app_context(&app);

    // Some tao setups default to an always-on-top window; the player is not modal.
    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("Courses")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(&mut args.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn parses_overrides() {
        let args = parse(&["--db", "sqlite::memory:", "--api", "https://shop.example.com", "--user", "cust-1"])
            .unwrap();
        assert_eq!(args.db_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(args.api_base.as_deref(), Some("https://shop.example.com"));
        assert_eq!(args.user_id.unwrap().as_str(), "cust-1");
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(matches!(parse(&["--db"]), Err(ArgsError::MissingValue { flag: "--db" })));
        assert!(matches!(parse(&["--user", "  "]), Err(ArgsError::InvalidUser { .. })));
        assert!(matches!(parse(&["--verbose"]), Err(ArgsError::UnknownArg(_))));
    }
}
