mod cmd_edit;
mod cmd_show;
mod cmd_validate;
mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pulse_store::{SessionStore, StoreConfig};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "pulse")]
#[command(about = "Inspect and edit persisted Pulse workspace sessions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// State directory (overrides PULSE_STATE_DIR)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Storage key of the session
    #[arg(long, global = true)]
    key: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the workspace tree
    Show {
        /// Output as nested JSON
        #[arg(long)]
        json: bool,
    },
    #[command(flatten)]
    Edit(cmd_edit::EditOp),
    /// Check a serialized session file and report repairs
    Validate {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Print the stored session envelope
    Export,
    /// Replace the stored session with the seed workspace
    Reset,
}

fn main() -> Result<()> {
    logging::init();
    let Cli {
        command,
        state_dir,
        key,
        pretty,
    } = Cli::parse();
    let store = || open_store(state_dir.as_deref(), key.as_deref());

    match command {
        Commands::Show { json } => cmd_show::run(&store()?, json, pretty),
        Commands::Edit(op) => cmd_edit::run(&store()?, op),
        Commands::Validate { input } => cmd_validate::run(input),
        Commands::Export => cmd_show::export(&store()?, pretty),
        Commands::Reset => cmd_edit::reset(&store()?),
    }
}

fn open_store(state_dir: Option<&Path>, key: Option<&str>) -> Result<SessionStore> {
    let mut config = StoreConfig::from_env();
    if let Some(dir) = state_dir {
        config = config.with_root(dir);
    }
    if let Some(key) = key {
        config = config.with_key(key);
    }
    tracing::debug!(root = %config.root().display(), key = config.key(), "opening session store");

    SessionStore::open(&config)
        .with_context(|| format!("Failed to open session store at {:?}", config.root()))
}
