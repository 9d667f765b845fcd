//! Fellowship Setup Tool
//!
//! Writes the server's `.env`, prints the database schema and checks that a
//! running server is ready.

mod check;
mod env_file;
mod prompt;
mod schema;

use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use env_file::EnvFile;
use prompt::Prompter;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

const COMPLETION_FILE: &str = ".fellowship-setup-complete.json";

/// Fellowship Server Setup Tool
#[derive(Parser)]
#[command(name = "fellowship-setup")]
#[command(author = "Fellowship Team")]
#[command(version = "0.1.0")]
#[command(about = "Configure the fellowship server")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write or update the server's .env file
    Init(InitArgs),

    /// Print the database schema for manual execution
    Schema {
        /// Append sample groups, prayer requests and events
        #[arg(long)]
        sample_data: bool,
    },

    /// Wait for a running server to report ready
    Check {
        /// Server URL
        #[arg(long, default_value = "http://localhost:8080")]
        server: String,

        /// Seconds to keep polling
        #[arg(long, default_value = "30")]
        timeout: u64,
    },
}

#[derive(clap::Args)]
struct InitArgs {
    /// Path of the .env file to write
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// api.bible key for the Scripture API source
    #[arg(long, env = "SCRIPTURE_API_KEY")]
    scripture_api_key: Option<String>,

    /// Firecrawl key for study resource crawling
    #[arg(long, env = "FIRECRAWL_API_KEY")]
    firecrawl_api_key: Option<String>,

    /// Directory for the local store when no database is reachable
    #[arg(long)]
    local_store_dir: Option<PathBuf>,

    /// Never prompt; unset values keep their placeholders
    #[arg(long)]
    non_interactive: bool,
}

#[derive(Serialize)]
struct SetupRecord {
    setup_date: String,
    env_file: String,
    database_configured: bool,
    integrations: Vec<&'static str>,
}

/// Keys the server treats as unset
fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    let upper = value.to_ascii_uppercase();
    value.is_empty() || upper.starts_with("YOUR_") || upper.ends_with("_HERE") || upper == "CHANGEME"
}

fn configured(value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !is_placeholder(v))
        .map(|v| v.trim().to_string())
}

fn print_banner() {
    println!(
        "{}",
        r#"
╔══════════════════════════════════════════════════════════════╗
║              Fellowship Server Setup                         ║
╚══════════════════════════════════════════════════════════════╝
"#
        .cyan()
    );
}

/// Resolves one setting: flag or env first, then the existing file, then a prompt
fn resolve<R: BufRead, W: Write>(
    prompter: &mut Option<Prompter<R, W>>,
    given: Option<&str>,
    existing: Option<&str>,
    label: &str,
    is_url: bool,
) -> anyhow::Result<Option<String>> {
    if let Some(value) = configured(given) {
        if is_url && url::Url::parse(&value).is_err() {
            anyhow::bail!("{} is not a valid URL: {}", label, value);
        }
        return Ok(Some(value));
    }

    let existing = configured(existing);
    let Some(prompter) = prompter.as_mut() else {
        return Ok(existing);
    };

    let answer = if is_url {
        prompter.ask_url(label, existing.as_deref())?
    } else {
        prompter.ask(label, existing.as_deref())?
    };
    Ok(configured(answer.as_deref()))
}

fn run_init(args: InitArgs) -> anyhow::Result<()> {
    let mut env = EnvFile::load(&args.env_file)?;

    let mut prompter = if args.non_interactive {
        None
    } else {
        Some(Prompter::new(io::stdin().lock(), io::stdout()))
    };

    println!("{}", "Database".yellow().bold());
    let database_url = resolve(
        &mut prompter,
        args.database_url.as_deref(),
        env.get("DATABASE_URL"),
        "PostgreSQL URL (empty for the local store)",
        true,
    )?;

    println!("{}", "Content integrations (optional)".yellow().bold());
    let scripture_key = resolve(
        &mut prompter,
        args.scripture_api_key.as_deref(),
        env.get("SCRIPTURE_API_KEY"),
        "Scripture API key",
        false,
    )?;
    let firecrawl_key = resolve(
        &mut prompter,
        args.firecrawl_api_key.as_deref(),
        env.get("FIRECRAWL_API_KEY"),
        "Firecrawl API key",
        false,
    )?;

    if let Some(prompter) = prompter.as_mut() {
        let label = format!("Write settings to {}?", args.env_file.display());
        if !prompter.confirm(&label)? {
            println!("{}", "Nothing written.".yellow());
            return Ok(());
        }
    }

    match &database_url {
        Some(url) => env.set("DATABASE_URL", url),
        None if env.get("DATABASE_URL").is_none() => env.set("DATABASE_URL", "YOUR_DATABASE_URL"),
        None => {}
    }
    env.set(
        "SCRIPTURE_API_KEY",
        scripture_key.as_deref().unwrap_or("YOUR_SCRIPTURE_API_KEY"),
    );
    env.set(
        "FIRECRAWL_API_KEY",
        firecrawl_key.as_deref().unwrap_or("YOUR_FIRECRAWL_API_KEY"),
    );
    if let Some(dir) = &args.local_store_dir {
        env.set("LOCAL_STORE_DIR", &dir.display().to_string());
    }

    env.save(&args.env_file)?;
    println!(
        "\n{} {}",
        "Environment written to:".green(),
        args.env_file.display().to_string().cyan()
    );

    let mut integrations = Vec::new();
    if scripture_key.is_some() {
        integrations.push("scripture_api");
    }
    if firecrawl_key.is_some() {
        integrations.push("firecrawl");
    }
    write_record(
        &args.env_file,
        &SetupRecord {
            setup_date: Utc::now().to_rfc3339(),
            env_file: args.env_file.display().to_string(),
            database_configured: database_url.is_some(),
            integrations,
        },
    )?;

    if database_url.is_none() {
        println!(
            "{}",
            "No database configured: the server will use the local store.".dimmed()
        );
    } else {
        println!(
            "{}",
            "Run `fellowship-setup schema` and execute the SQL if migrations cannot run automatically."
                .dimmed()
        );
    }

    Ok(())
}

fn write_record(env_file: &Path, record: &SetupRecord) -> anyhow::Result<()> {
    let dir = env_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let json = serde_json::to_string_pretty(record)?;
    std::fs::write(dir.join(COMPLETION_FILE), json)?;
    Ok(())
}

async fn run_check(server: &str, timeout: u64) -> anyhow::Result<()> {
    println!("{}", "Waiting for server to be ready...".dimmed());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let report = check::wait_until_ready(&client, server, timeout).await?;

    println!("{}", "Server is ready!".green());
    println!("  {} {}", "store:".bold(), report.checks.store);
    println!("  {} {}", "backend:".bold(), report.checks.backend);
    println!(
        "  {} {}",
        "crawler:".bold(),
        if report.checks.crawler {
            "available".green()
        } else {
            "not configured".yellow()
        }
    );

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init(args) => {
            print_banner();
            run_init(args)?;
        }
        Commands::Schema { sample_data } => {
            print!("{}", schema::script(sample_data));
        }
        Commands::Check { server, timeout } => {
            run_check(&server, timeout).await?;
        }
    }

    Ok(())
}
