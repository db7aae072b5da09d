mod resolve_cmd;
mod targets_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

use fiberlens_logging::{init_logger, LoggerOptions};

#[derive(Parser)]
#[command(name = "fiberlens")]
#[command(about = "fiberlens: find the source file behind any element of a running page")]
#[command(version)]
struct Cli {
    /// Config file (defaults to <config dir>/fiberlens/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve elements of a page target to their source files
    Resolve {
        /// Target id as listed by `fiberlens targets`
        #[arg(short, long)]
        target: String,
        /// CSS selector of an element; repeatable
        #[arg(short, long = "selector")]
        selectors: Vec<String>,
        /// JSON file holding an array of element descriptors
        #[arg(short, long)]
        elements: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// List debuggable page targets
    Targets,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = fiberlens_config::load_with_overrides(cli.config.as_deref()).await?;

    init_logger(&LoggerOptions {
        level: config.logging.level.clone(),
        json: config.logging.json,
        log_dir: config.logging.dir.clone(),
    });
    fiberlens_config::ensure_valid(&config)?;

    match cli.command {
        Commands::Resolve {
            target,
            selectors,
            elements,
            format,
        } => {
            resolve_cmd::run(&config, &target, selectors, elements.as_deref(), format).await?;
        }
        Commands::Targets => targets_cmd::run(&config).await?,
    }

    Ok(())
}
