use std::io::{BufRead, IsTerminal};

use clap::{Parser, Subcommand};
use modcompat::batch::{AnalysisOutcome, analyze_all};
use modcompat::compat::{Filter, summarize};
use modcompat::config::{self, Config, DEFAULT_CONCURRENCY};
use modcompat::logging;
use modcompat::output::{OutputFormat, render};
use modcompat::provider::ProviderRegistry;
use tracing::info;

#[derive(Parser)]
#[command(name = "modcompat")]
#[command(
    version,
    about = "Minecraft version and mod loader compatibility for CurseForge and Modrinth mods"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the version/loader pairs of one or more mod URLs
    Analyze {
        /// Project URLs; read from stdin (one per line) when omitted
        urls: Vec<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Maximum number of mods fetched at the same time
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Only keep pairs for this game version
        #[arg(long)]
        game_version: Option<String>,

        /// Only keep pairs for this loader
        #[arg(long)]
        loader: Option<String>,
    },
    /// Remove every cached API page
    ClearCache,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = logging::init(config::debug_from_env(), &config::log_path())?;
    let config = Config::from_env();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli.command, config))
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    let registry = ProviderRegistry::from_config(&config)?;

    match command {
        Command::Analyze {
            urls,
            format,
            concurrency,
            game_version,
            loader,
        } => {
            let urls = if urls.is_empty() { read_urls()? } else { urls };
            let filter = Filter::new(game_version, loader.as_deref());
            if !filter.is_empty() {
                info!("Keeping only pairs matching {:?}", filter);
            }

            let outcomes: Vec<AnalysisOutcome> = analyze_all(&registry, &urls, concurrency)
                .await
                .into_iter()
                .map(|outcome| match outcome {
                    AnalysisOutcome::Ok(record) => AnalysisOutcome::Ok(filter.apply(&record)),
                    failed => failed,
                })
                .collect();

            let records: Vec<_> = outcomes
                .iter()
                .filter_map(AnalysisOutcome::record)
                .cloned()
                .collect();
            let summary = summarize(&records);

            println!("{}", render(format, &outcomes, &summary)?);
        }
        Command::ClearCache => {
            registry.clear_cache()?;
            println!("Cleared cache at {}", config.cache.dir.display());
        }
    }

    Ok(())
}

/// One URL per line until an empty line or EOF
fn read_urls() -> anyhow::Result<Vec<String>> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprintln!("Enter mod URLs (CurseForge or Modrinth), one per line. Empty line to finish:");
    }

    let mut urls = Vec::new();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        urls.push(line.to_string());
    }
    Ok(urls)
}
