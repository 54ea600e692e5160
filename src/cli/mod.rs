use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ConfigLoader;

pub mod commands;

use self::commands::{DecksArgs, QueueArgs, TuiArgs};

#[derive(Parser, Debug)]
#[command(
    name = "reviewq",
    version,
    about = "Spaced-repetition review queue for your notes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Override the config file location (takes precedence over REVIEWQ_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error); defaults from config
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Browse the review queue interactively
    Tui(TuiArgs),
    /// Print the review queue tree for a snapshot
    Queue(QueueArgs),
    /// List deck names, optionally filtered by a fuzzy query
    Decks(DecksArgs),
    /// Print the resolved configuration
    Config,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("REVIEWQ_CONFIG", path);
    }

    let loader = ConfigLoader::discover()?;
    let mut config = loader.load_or_init()?;
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.default_level().to_string());
    init_tracing(&level).with_context(|| format!("initialising logging at level {level}"))?;
    for issue in config.sanitize() {
        tracing::warn!(%issue, "invalid setting, falling back to default");
    }

    let config = Arc::new(config);
    match cli.command {
        Commands::Tui(args) => commands::run_tui(config, args),
        Commands::Queue(args) => {
            print!("{}", commands::render_queue(&config, &args)?);
            Ok(())
        }
        Commands::Decks(args) => {
            print!("{}", commands::list_decks(&args)?);
            Ok(())
        }
        Commands::Config => {
            let rendered = toml::to_string_pretty(config.as_ref()).context("serializing config")?;
            println!("# {}", loader.paths().config_file.display());
            print!("{rendered}");
            Ok(())
        }
    }
}

fn init_tracing(level: &str) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        Ok(())
    })
    .map(|_| ())
}
