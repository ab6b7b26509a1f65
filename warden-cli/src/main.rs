use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use warden_core::config::WardenConfig;
use warden_core::core_policy::SqlPolicyStore;
use warden_core::logging::{init_logging_with_config, LogConfig, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Path of the configuration file
    #[arg(short, long, default_value = "warden.toml")]
    config: String,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Parser, Debug)]
enum Command {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Validate the configuration and prepare the policy database
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = LogLevel::from_str(&args.log_level).unwrap_or_else(|| {
        eprintln!("Invalid log level '{}', using 'info'", args.log_level);
        LogLevel::Info
    });
    let config = LogConfig::new(log_level).json_format(args.json_logs);
    init_logging_with_config(config)?;

    let config_path = PathBuf::from(shellexpand::tilde(&args.config).into_owned());

    match args.command {
        Some(Command::Init { force }) => init_config(&config_path, force),
        Some(Command::Check) => check(&config_path),
        None => {
            info!("No command specified. Use --help for usage information.");
            Ok(())
        }
    }
}

fn init_config(path: &PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let config = WardenConfig::default();
    std::fs::write(path, config.to_toml()?)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    println!("Configuration written to {}", path.display());
    println!("Fill in at least two [[identities]] entries before running a check.");
    Ok(())
}

fn check(path: &PathBuf) -> Result<()> {
    let config = WardenConfig::load(path)
        .with_context(|| format!("loading {}", path.display()))?;
    info!(
        identities = config.identities.len(),
        db = %config.storage.path.display(),
        "configuration is valid"
    );

    // Opening the store runs any pending schema migrations.
    SqlPolicyStore::open(&config.storage.path)
        .with_context(|| format!("opening {}", config.storage.path.display()))?;

    println!("OK: {} identities, database at {}", config.identities.len(),
        config.storage.path.display());
    Ok(())
}
