//! `orbitctl` — inspect and edit a consistent hashing ring kept in a file.
//!
//! The ring is stored as its `(nodes, replicas)` state; positions are
//! recomputed on every invocation.
//!
//! # Usage
//!
//! ```text
//! orbitctl init --replicas 150            # create an empty ring
//! orbitctl add cache-a cache-b cache-c    # add nodes
//! orbitctl get user:42                    # route a key
//! orbitctl get-n user:42 -n 2             # primary plus one replica
//! orbitctl status                         # keyspace share per node
//! orbitctl simulate --remove cache-b      # how many keys would move
//! orbitctl -s ./ring.json status          # use a specific state file
//! ```

mod commands;
mod config;
mod store;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use commands::Change;
use config::CliConfig;

// -----------------------------------------------------------------------
// CLI definition
// -----------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "orbitctl",
    version,
    about = "Inspect and edit a consistent hashing ring"
)]
struct Cli {
    /// Path to TOML config file.
    #[arg(short, long, global = true, env = "ORBIT_CONFIG")]
    config: Option<PathBuf>,

    /// Override the ring state file.
    #[arg(short, long, global = true, env = "ORBIT_STATE")]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty ring state file.
    Init {
        /// Virtual nodes per physical node (defaults to the config value).
        #[arg(short, long)]
        replicas: Option<u32>,

        /// Overwrite an existing state file.
        #[arg(long)]
        force: bool,
    },

    /// Add one or more nodes.
    Add {
        #[arg(required = true)]
        nodes: Vec<String>,
    },

    /// Remove one or more nodes.
    Remove {
        #[arg(required = true)]
        nodes: Vec<String>,
    },

    /// Show the node responsible for a key.
    Get { key: String },

    /// Show the first N distinct nodes for a key, primary first.
    GetN {
        key: String,

        /// How many distinct nodes to return.
        #[arg(short = 'n', long, default_value = "3")]
        count: usize,
    },

    /// Summarise the ring and each node's share of the keyspace.
    Status,

    /// Estimate how many keys a membership change would move.
    Simulate {
        #[command(flatten)]
        change: ChangeArgs,

        /// Number of synthetic keys to route.
        #[arg(short, long, default_value = "10000")]
        keys: usize,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ChangeArgs {
    /// Node to add.
    #[arg(long)]
    add: Option<String>,

    /// Node to remove.
    #[arg(long)]
    remove: Option<String>,
}

impl ChangeArgs {
    fn into_change(self) -> Result<Change> {
        match (self.add, self.remove) {
            (Some(node), None) => Ok(Change::Add(node)),
            (None, Some(node)) => Ok(Change::Remove(node)),
            _ => bail!("pass exactly one of --add or --remove"),
        }
    }
}

// -----------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = CliConfig::load(cli.config.as_deref()).context("failed to load config")?;

    setup_tracing(&config.log.level);

    // CLI args override config file values.
    if let Some(state) = cli.state {
        config.ring.state_file = state;
    }
    let path = config.ring.state_file.clone();
    let hash = config.ring.hash;
    debug!(state_file = %path.display(), ?hash, "resolved configuration");

    let output = match cli.command {
        Commands::Init { replicas, force } => commands::init(
            &path,
            replicas.unwrap_or(config.ring.replicas),
            hash,
            force,
        )?,
        Commands::Add { nodes } => {
            let mut ring = store::load(&path, hash)?;
            let out = commands::add(&mut ring, &nodes)?;
            store::save(&path, &ring)?;
            out
        }
        Commands::Remove { nodes } => {
            let mut ring = store::load(&path, hash)?;
            let out = commands::remove(&mut ring, &nodes)?;
            store::save(&path, &ring)?;
            out
        }
        Commands::Get { key } => commands::get(&store::load(&path, hash)?, &key)?,
        Commands::GetN { key, count } => {
            commands::get_n(&store::load(&path, hash)?, &key, count)?
        }
        Commands::Status => commands::status(&store::load(&path, hash)?)?,
        Commands::Simulate { change, keys } => {
            let ring = store::load(&path, hash)?;
            commands::simulate(&ring, &change.into_change()?, keys)?
        }
    };

    print!("{output}");
    Ok(())
}

/// Initialize the `tracing` subscriber with the given level filter.
///
/// Respects `RUST_LOG` env var if set, otherwise uses the config value.
/// Logs go to stderr so command output can be piped.
fn setup_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
