use std::fmt;

use chrono::{DateTime, Duration, Utc};
use spell_core::model::WordListDraft;
use storage::repository::Storage;

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    lists: u32,
    activate: bool,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLists { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLists { raw } => write!(f, "invalid --lists value: {raw}"),
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
            std::env::var("SPELL_DB_URL").unwrap_or_else(|_| "sqlite:spell.sqlite3".into());
        let mut lists = std::env::var("SPELL_SEED_LISTS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(3);
        let mut activate = false;
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
                "--lists" => {
                    let value = require_value(&mut args, "--lists")?;
                    lists = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidLists { raw: value.clone() })?;
                }
                "--activate" => activate = true,
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
            lists,
            activate,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:spell.sqlite3)");
    eprintln!("  --lists <n>               Number of sample word lists to insert (default: 3)");
    eprintln!("  --activate                Mark the inserted lists active");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  SPELL_DB_URL, SPELL_SEED_LISTS");
}

const SAMPLES: [(&str, &str); 4] = [
    ("Short a", "cat, hat, map, bag, ran"),
    ("Digraphs", "ship, chip, that, when, much"),
    ("Long vowels", "rain, boat, seed, kite, cube"),
    ("Tricky words", "said, because, friend, people, could"),
];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    for i in 0..args.lists {
        let idx = (i as usize) % SAMPLES.len();
        let (name, words) = SAMPLES[idx];
        let draft = WordListDraft::parse(name, words)?;
        let created_at = now - Duration::minutes(i64::from(args.lists - i));
        let id = storage.lists.insert_new_list(&draft, created_at).await?;
        if args.activate {
            storage.lists.set_active(id, true).await?;
        }
    }

    println!(
        "Seeded {} word lists{} into {}",
        args.lists,
        if args.activate { " (active)" } else { "" },
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
