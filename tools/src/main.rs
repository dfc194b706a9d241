use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use glob::Pattern;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use widgetsync_tools::{format_report, inspect_message, replay, ToolsConfig};

#[derive(Parser)]
#[command(
    name = "widgetsync-tools",
    version,
    about = "widgetsync message inspection and replay tools"
)]
struct Cli {
    /// JSON configuration with `engine` and `sessions` sections.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log filter, in `RUST_LOG` syntax.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize protocol messages.
    Inspect {
        /// A message file, or a directory of message files.
        message_path: PathBuf,
        /// Optional glob filter when inspecting a directory.
        #[arg(long)]
        glob: Option<String>,
        /// Sort inspected messages.
        #[arg(long, value_enum)]
        sort: Option<InspectSort>,
        /// Limit the number of inspected messages (after sorting).
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Feed client messages to a demo session and print the responses.
    Replay {
        /// Client message files, in request order.
        #[arg(required = true)]
        messages: Vec<PathBuf>,
        /// Output format.
        #[arg(long, value_enum, default_value_t = ReplayFormat::Json)]
        format: ReplayFormat,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InspectSort {
    Size,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ReplayFormat {
    Json,
    Summary,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::new(&cli.log_level))
        .init();

    let config = cli
        .config
        .as_deref()
        .map(load_config)
        .transpose()
        .context("load config")?
        .unwrap_or_default();
    let limits = &config.engine.protocol;

    match cli.command {
        Command::Inspect {
            message_path,
            glob,
            sort,
            limit,
        } => {
            if message_path.is_dir() {
                let entries = collect_message_entries(&message_path, glob.as_deref())?;
                let mut entries = maybe_sort_entries(entries, sort);
                let limit = limit.or(sort.map(|InspectSort::Size| 10));
                if let Some(limit) = limit {
                    entries.truncate(limit);
                }
                for entry in entries {
                    let bytes = fs::read(&entry.path)
                        .with_context(|| format!("read message {}", entry.path.display()))?;
                    let report = inspect_message(&bytes, limits)
                        .with_context(|| format!("inspect {}", entry.path.display()))?;
                    println!("== {} ({} bytes) ==", entry.path.display(), entry.size);
                    print!("{}", format_report(&report));
                }
            } else {
                let bytes = fs::read(&message_path)
                    .with_context(|| format!("read message {}", message_path.display()))?;
                let report = inspect_message(&bytes, limits)?;
                print!("{}", format_report(&report));
            }
        }
        Command::Replay { messages, format } => {
            let bodies = messages
                .iter()
                .map(|path| {
                    fs::read(path).with_context(|| format!("read message {}", path.display()))
                })
                .collect::<Result<Vec<_>>>()?;
            info!(messages = bodies.len(), "replaying");
            let responses = replay(&bodies, &config)?;
            for (path, response) in messages.iter().zip(&responses) {
                match format {
                    ReplayFormat::Json => {
                        let value: serde_json::Value =
                            serde_json::from_slice(response).context("parse response")?;
                        let json =
                            serde_json::to_string_pretty(&value).context("serialize json")?;
                        println!("{json}");
                    }
                    ReplayFormat::Summary => {
                        let report = inspect_message(response, limits)?;
                        println!("== {} ==", path.display());
                        print!("{}", format_report(&report));
                    }
                }
            }
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<ToolsConfig> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    ToolsConfig::from_json(&contents)
}

struct MessageEntry {
    path: PathBuf,
    size: u64,
}

fn collect_message_entries(dir: &Path, glob: Option<&str>) -> Result<Vec<MessageEntry>> {
    let mut entries = Vec::new();
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    for entry in fs::read_dir(dir).with_context(|| format!("read dir {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Some(pattern) = &pattern {
            let matches_path = pattern.matches_path(&path);
            let matches_name = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| pattern.matches(name));
            if !matches_path && !matches_name {
                continue;
            }
        }
        let size = entry.metadata()?.len();
        entries.push(MessageEntry { path, size });
    }
    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

fn maybe_sort_entries(
    mut entries: Vec<MessageEntry>,
    sort: Option<InspectSort>,
) -> Vec<MessageEntry> {
    match sort {
        Some(InspectSort::Size) => {
            entries.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
        }
        None => {}
    }
    entries
}
