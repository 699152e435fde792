use std::fmt;
use std::sync::Arc;

use posture_core::model::{NotificationSettings, SessionKind, SettingsPatch, clamp_interval};
use posture_core::share_code::ShareCode;
use services::{AppServices, Clock, DashboardView, RoutineService, SessionLine};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod notifier;

use notifier::TerminalNotifier;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    MissingOperand { command: &'static str },
    UnexpectedOperand(String),
    SettingsFlagOutsideSettings { flag: String },
    InvalidDbUrl { raw: String },
    InvalidSession { raw: String },
    InvalidDay { raw: String },
    InvalidInterval { raw: String },
    InvalidToggle { flag: &'static str, raw: String },
    InvalidShareCode { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::MissingOperand { command } => write!(f, "{command} requires an argument"),
            ArgsError::UnexpectedOperand(arg) => write!(f, "unexpected argument: {arg}"),
            ArgsError::SettingsFlagOutsideSettings { flag } => {
                write!(f, "{flag} is only accepted by the settings command")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSession { raw } => {
                write!(f, "invalid session {raw:?} (expected morning, microbreak or evening)")
            }
            ArgsError::InvalidDay { raw } => write!(f, "invalid day: {raw}"),
            ArgsError::InvalidInterval { raw } => write!(f, "invalid --interval value: {raw}"),
            ArgsError::InvalidToggle { flag, raw } => {
                write!(f, "invalid {flag} value: {raw} (expected on or off)")
            }
            ArgsError::InvalidShareCode { raw } => write!(f, "unrecognized share code: {raw}"),
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

fn parse_toggle(flag: &'static str, raw: String) -> Result<bool, ArgsError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => Err(ArgsError::InvalidToggle { flag, raw }),
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  posture [status]                         [--db <sqlite_url>]");
    eprintln!("  posture next");
    eprintln!("  posture complete <morning|microbreak|evening>");
    eprintln!("  posture set-day <n>");
    eprintln!("  posture reset");
    eprintln!("  posture share");
    eprintln!("  posture restore <code>");
    eprintln!("  posture settings [--reminders on|off] [--interval <minutes>]");
    eprintln!("                   [--browser on|off] [--tab on|off] [--sound on|off]");
    eprintln!("  posture remind                           # runs until Ctrl-C");
    eprintln!("  posture wipe");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://posture.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  POSTURE_DB_URL, POSTURE_LOG");
}

/// Requested settings changes; `None` leaves the stored value alone.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct SettingsArgs {
    reminders: Option<bool>,
    interval: Option<u32>,
    browser: Option<bool>,
    tab: Option<bool>,
    sound: Option<bool>,
    first_flag: Option<String>,
}

impl SettingsArgs {
    fn is_empty(&self) -> bool {
        self.first_flag.is_none()
    }

    fn note_flag(&mut self, flag: &str) {
        if self.first_flag.is_none() {
            self.first_flag = Some(flag.to_string());
        }
    }

    /// Build a patch against `current`. Notification toggles replace the
    /// whole group, so untouched toggles are carried over.
    fn into_patch(self, current: NotificationSettings) -> SettingsPatch {
        let notifications = (self.browser.is_some() || self.tab.is_some() || self.sound.is_some())
            .then(|| NotificationSettings {
                browser: self.browser.unwrap_or(current.browser),
                tab_indicator: self.tab.unwrap_or(current.tab_indicator),
                sound: self.sound.unwrap_or(current.sound),
            });
        SettingsPatch {
            notifications,
            microbreak_interval: self.interval,
            reminder_enabled: self.reminders,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Status,
    Next,
    Complete(SessionKind),
    SetDay(i64),
    Reset,
    Share,
    Restore(ShareCode),
    Settings(SettingsArgs),
    Remind,
    Wipe,
}

impl Command {
    fn from_parts(
        name: Option<&str>,
        operands: Vec<String>,
        settings: SettingsArgs,
    ) -> Result<Self, ArgsError> {
        let name = name.unwrap_or("status");
        if name != "settings" {
            if let Some(flag) = &settings.first_flag {
                return Err(ArgsError::SettingsFlagOutsideSettings { flag: flag.clone() });
            }
        }

        let mut operands = operands.into_iter();
        let command = match name {
            "status" => Self::Status,
            "next" => Self::Next,
            "complete" => {
                let raw = operands
                    .next()
                    .ok_or(ArgsError::MissingOperand { command: "complete" })?;
                let kind = SessionKind::parse(&raw).ok_or(ArgsError::InvalidSession { raw })?;
                Self::Complete(kind)
            }
            "set-day" => {
                let raw = operands
                    .next()
                    .ok_or(ArgsError::MissingOperand { command: "set-day" })?;
                let day = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ArgsError::InvalidDay { raw: raw.clone() })?;
                Self::SetDay(day)
            }
            "reset" => Self::Reset,
            "share" => Self::Share,
            "restore" => {
                let raw = operands
                    .next()
                    .ok_or(ArgsError::MissingOperand { command: "restore" })?;
                let code = raw
                    .trim()
                    .parse::<ShareCode>()
                    .map_err(|_| ArgsError::InvalidShareCode { raw: raw.clone() })?;
                Self::Restore(code)
            }
            "settings" => Self::Settings(settings),
            "remind" => Self::Remind,
            "wipe" => Self::Wipe,
            other => return Err(ArgsError::UnknownCommand(other.to_string())),
        };

        if let Some(extra) = operands.next() {
            return Err(ArgsError::UnexpectedOperand(extra));
        }
        Ok(command)
    }
}

struct Args {
    db_url: String,
    command: Command,
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("POSTURE_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://posture.sqlite3".into(), normalize_sqlite_url);

        let mut args = argv.into_iter().peekable();
        let name = args.next_if(|first| !first.starts_with('-'));

        let mut operands = Vec::new();
        let mut settings = SettingsArgs::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--reminders" => {
                    settings.note_flag(&arg);
                    let value = require_value(&mut args, "--reminders")?;
                    settings.reminders = Some(parse_toggle("--reminders", value)?);
                }
                "--interval" => {
                    settings.note_flag(&arg);
                    let value = require_value(&mut args, "--interval")?;
                    let minutes: u32 = value
                        .trim()
                        .parse()
                        .map_err(|_| ArgsError::InvalidInterval { raw: value.clone() })?;
                    settings.interval = Some(clamp_interval(minutes));
                }
                "--browser" => {
                    settings.note_flag(&arg);
                    let value = require_value(&mut args, "--browser")?;
                    settings.browser = Some(parse_toggle("--browser", value)?);
                }
                "--tab" => {
                    settings.note_flag(&arg);
                    let value = require_value(&mut args, "--tab")?;
                    settings.tab = Some(parse_toggle("--tab", value)?);
                }
                "--sound" => {
                    settings.note_flag(&arg);
                    let value = require_value(&mut args, "--sound")?;
                    settings.sound = Some(parse_toggle("--sound", value)?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => operands.push(arg),
            }
        }

        let command = Command::from_parts(name.as_deref(), operands, settings)?;
        Ok(Self { db_url, command })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("POSTURE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn on_off(enabled: bool) -> &'static str {
    if enabled { "on" } else { "off" }
}

fn session_label(line: &SessionLine) -> String {
    match line.ordinal {
        Some(n) => format!("{} {n}", line.kind.label()),
        None => line.kind.label().to_string(),
    }
}

fn print_dashboard(view: &DashboardView) {
    println!(
        "Day {} of {}  (week {}, {}%)",
        view.day, view.total_days, view.week, view.progress_percent
    );
    println!("{}", view.phase);
    println!("  {}", view.phase.description());
    println!();
    println!("Today:");
    for line in &view.sessions {
        let mark = if line.completed { "x" } else { " " };
        let time = line.time.as_deref().unwrap_or("");
        println!("  [{mark}] {:<22} {time}", session_label(line));
    }
    println!();
    match view.next {
        Some(kind) => println!("Next: {}", kind.label()),
        None => println!("All sessions done for today."),
    }
    println!("Share code: {}", view.share_code);
}

fn print_settings(routine: &RoutineService) {
    let settings = routine.store().settings();
    let notifications = settings.notifications();
    println!("Reminders: {}", on_off(settings.reminder_enabled()));
    println!("Interval:  {} minutes", settings.microbreak_interval());
    println!("Browser notification: {}", on_off(notifications.browser));
    println!("Tab indicator:        {}", on_off(notifications.tab_indicator));
    println!("Sound:                {}", on_off(notifications.sound));
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    let parsed = Args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_logging();
    debug!(db_url = %parsed.db_url, command = ?parsed.command, "starting");

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let clock = Clock::system();

    if parsed.command == Command::Remind {
        let routine = AppServices::new_sqlite_with_reminders(
            &parsed.db_url,
            clock,
            Arc::new(TerminalNotifier),
        )
        .await?;
        if !routine.reminders_scheduled() {
            println!("Reminders are off. Enable them with: posture settings --reminders on");
            return Ok(());
        }
        let settings = routine.store().settings();
        if !settings.notifications().any_enabled() {
            println!("Every reminder effect is off; nothing will be shown.");
        }
        println!(
            "Reminding every {} minutes. Press Ctrl-C to stop.",
            settings.microbreak_interval()
        );
        tokio::signal::ctrl_c().await?;
        drop(routine);
        return Ok(());
    }

    let mut routine = AppServices::new_sqlite(&parsed.db_url, clock).await?;

    match parsed.command {
        Command::Status => print_dashboard(&routine.dashboard().await),
        Command::Next => {
            let view = routine.dashboard().await;
            match view.next {
                Some(kind) => println!("{}", kind.label()),
                None => println!("All sessions done for today."),
            }
        }
        Command::Complete(kind) => {
            let report = routine.complete(kind).await;
            if report.recorded {
                println!("{} done.", kind.label());
            } else {
                println!("All micro-breaks for today are already recorded.");
            }
            if let Some(day) = report.advanced_to {
                println!("Day complete! Moving on to day {day}.");
            } else if report.day_complete {
                println!("Day complete!");
            }
        }
        Command::SetDay(day) => {
            let day = routine.set_day(day).await;
            println!("Current day set to {day}.");
        }
        Command::Reset => {
            routine.reset_progress().await;
            println!("Progress reset to day 1.");
        }
        Command::Share => println!("{}", routine.share_code()),
        Command::Restore(code) => {
            if let Some(day) = routine.restore_share_code(&code.to_string()).await {
                println!("Restored to day {day}.");
            }
        }
        Command::Settings(settings) => {
            if !settings.is_empty() {
                let current = routine.store().settings().notifications();
                routine.update_settings(settings.into_patch(current)).await;
            }
            print_settings(&routine);
        }
        Command::Wipe => {
            routine.clear().await;
            println!("Stored progress and settings erased.");
        }
        Command::Remind => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
