use std::fmt;
use std::time::Duration;

use services::sessions::SessionConfig;
use services::{AppServices, Clock, ResultDetailsMode};
use spell_core::model::WordListId;

mod test_loop;

use test_loop::SpeechMode;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArg { what: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidDwell { raw: String },
    InvalidDetails { raw: String },
    InvalidSpeech { raw: String },
    InvalidSeed { raw: String },
    InvalidListId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArg { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidDwell { raw } => write!(f, "invalid --dwell-ms value: {raw}"),
            ArgsError::InvalidDetails { raw } => {
                write!(f, "invalid --details value (expected minimal|detailed): {raw}")
            }
            ArgsError::InvalidSpeech { raw } => {
                write!(f, "invalid --speech value (expected system|silent): {raw}")
            }
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidListId { raw } => write!(f, "invalid list id: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  spell [test]                          Take a spelling test over the active lists");
    eprintln!("  spell lists                           Show every word list");
    eprintln!("  spell add <name> <word,word,...>      Create a list (inactive)");
    eprintln!("  spell edit <id> <name> <word,...>     Replace a list's name and words");
    eprintln!("  spell activate <id>                   Include a list in tests");
    eprintln!("  spell deactivate <id>                 Leave a list out of tests");
    eprintln!("  spell delete <id>                     Delete a list");
    eprintln!("  spell results <id>                    Recent scores for a list");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://spell.sqlite3)");
    eprintln!("  --dwell-ms <ms>           Feedback time before the next word (default: 2000)");
    eprintln!("  --details <mode>          minimal|detailed result details (default: detailed)");
    eprintln!("  --speech <mode>           system|silent (default: system)");
    eprintln!("  --seed <u64>              Reproducible word order");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("During a test: type the word and press Enter.");
    eprintln!("  :r replay the word   :v next voice   :q quit   :again new test when finished");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SPELL_DB_URL, SPELL_DWELL_MS, SPELL_DETAILS, SPELL_SPEECH, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Test,
    Lists,
    Add,
    Edit,
    Activate,
    Deactivate,
    Delete,
    Results,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "test" => Some(Self::Test),
            "lists" => Some(Self::Lists),
            "add" => Some(Self::Add),
            "edit" => Some(Self::Edit),
            "activate" => Some(Self::Activate),
            "deactivate" => Some(Self::Deactivate),
            "delete" => Some(Self::Delete),
            "results" => Some(Self::Results),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    dwell: Duration,
    details: ResultDetailsMode,
    speech: SpeechMode,
    seed: Option<u64>,
    positional: Vec<String>,
}

fn parse_dwell(raw: String) -> Result<Duration, ArgsError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ArgsError::InvalidDwell { raw })
}

fn parse_details(raw: String) -> Result<ResultDetailsMode, ArgsError> {
    ResultDetailsMode::from_name(&raw).ok_or(ArgsError::InvalidDetails { raw })
}

fn parse_speech(raw: String) -> Result<SpeechMode, ArgsError> {
    SpeechMode::from_name(&raw).ok_or(ArgsError::InvalidSpeech { raw })
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("SPELL_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://spell.sqlite3".into(), normalize_sqlite_url);
        let mut dwell = match std::env::var("SPELL_DWELL_MS") {
            Ok(raw) => parse_dwell(raw)?,
            Err(_) => SessionConfig::default().dwell(),
        };
        let mut details = match std::env::var("SPELL_DETAILS") {
            Ok(raw) => parse_details(raw)?,
            Err(_) => ResultDetailsMode::default(),
        };
        let mut speech = match std::env::var("SPELL_SPEECH") {
            Ok(raw) => parse_speech(raw)?,
            Err(_) => SpeechMode::System,
        };
        let mut seed = None;
        let mut positional = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--dwell-ms" => dwell = parse_dwell(require_value(args, "--dwell-ms")?)?,
                "--details" => details = parse_details(require_value(args, "--details")?)?,
                "--speech" => speech = parse_speech(require_value(args, "--speech")?)?,
                "--seed" => {
                    let value = require_value(args, "--seed")?;
                    let parsed = value
                        .parse::<u64>()
                        .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?;
                    seed = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        Ok(Self {
            db_url,
            dwell,
            details,
            speech,
            seed,
            positional,
        })
    }

    fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_dwell(self.dwell)
            .with_details(self.details)
    }

    fn list_id(&self, index: usize) -> Result<WordListId, ArgsError> {
        let raw = self
            .positional
            .get(index)
            .ok_or(ArgsError::MissingArg { what: "list id" })?;
        raw.parse::<u64>()
            .map(WordListId::new)
            .map_err(|_| ArgsError::InvalidListId { raw: raw.clone() })
    }

    fn text(&self, index: usize, what: &'static str) -> Result<&str, ArgsError> {
        self.positional
            .get(index)
            .map(String::as_str)
            .ok_or(ArgsError::MissingArg { what })
    }

    /// Every positional from `index` on, joined as one comma-separated word list.
    fn words_from(&self, index: usize) -> Result<String, ArgsError> {
        let words = self.positional.get(index..).unwrap_or_default();
        if words.is_empty() {
            return Err(ArgsError::MissingArg { what: "words" });
        }
        Ok(words.join(","))
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

fn init_tracing() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "services=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_lists(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let lists = services.lists().list_lists().await?;
    if lists.is_empty() {
        println!("No word lists yet. Create one with: spell add <name> <word,word,...>");
        return Ok(());
    }
    for list in lists {
        let marker = if list.is_active() { "*" } else { " " };
        let words: Vec<_> = list.words().iter().map(|w| w.text.as_str()).collect();
        println!("{marker} {:>4}  {}  ({})", list.id(), list.name(), words.join(", "));
    }
    println!();
    println!("* = active");
    Ok(())
}

async fn run_results(
    services: &AppServices,
    list_id: WordListId,
) -> Result<(), Box<dyn std::error::Error>> {
    let list = services.lists().get_list(list_id).await?;
    let rows = services.lists().results_for_list(list_id, 20).await?;
    println!("Results for {}:", list.name());
    if rows.is_empty() {
        println!("  (no tests taken yet)");
    }
    for row in rows {
        println!(
            "  {}  {}/{}",
            row.result.completed_at().format("%Y-%m-%d %H:%M"),
            row.result.score(),
            row.result.total()
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: take a test when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Test,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Test,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    init_tracing();

    let config = parsed.session_config().validate()?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services =
        AppServices::new_sqlite(&parsed.db_url, Clock::default(), config, parsed.seed).await?;
    let lists = services.lists();

    match cmd {
        Command::Test => test_loop::run(&services, parsed.speech).await,
        Command::Lists => run_lists(&services).await,
        Command::Add => {
            let name = parsed.text(0, "list name")?;
            let id = lists.create_list(name, &parsed.words_from(1)?).await?;
            println!("Created list {id}. Activate it with: spell activate {id}");
            Ok(())
        }
        Command::Edit => {
            let id = parsed.list_id(0)?;
            let name = parsed.text(1, "list name")?;
            let list = lists.update_list(id, name, &parsed.words_from(2)?).await?;
            println!("Updated list {} ({} words).", list.id(), list.words().len());
            Ok(())
        }
        Command::Activate | Command::Deactivate => {
            let active = cmd == Command::Activate;
            let list = lists.set_active(parsed.list_id(0)?, active).await?;
            let state = if active { "active" } else { "inactive" };
            println!("{} is now {state}.", list.name());
            Ok(())
        }
        Command::Delete => {
            let id = parsed.list_id(0)?;
            lists.delete_list(id).await?;
            println!("Deleted list {id}.");
            Ok(())
        }
        Command::Results => run_results(&services, parsed.list_id(0)?).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
