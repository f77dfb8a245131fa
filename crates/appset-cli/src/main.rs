//! appsetctl - expand and flatten application-set specs offline.
//!
//! This is the entry point for the `appsetctl` binary.

mod commands;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use appset_core::{EngineConfig, ServerVersion};
use appset_generators::ExpandContext;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Expand and flatten application-set specs.
#[derive(Parser, Debug)]
#[command(name = "appsetctl")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ArgoCD server version to gate features against. Overrides
    /// `ARGOCD_SERVER_VERSION`; when neither is set every feature is enabled.
    #[arg(long, global = true)]
    server_version: Option<ServerVersion>,

    /// Reject generator blocks that populate more than one kind. Also
    /// enabled by `APPSET_STRICT=true`.
    #[arg(long, global = true)]
    strict: bool,

    /// Enable debug logging.
    #[arg(long, global = true, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Expand a raw configuration document into the wire spec.
    Expand {
        /// JSON document with a `spec` block list at its root.
        file: PathBuf,
    },
    /// Flatten a wire spec into a raw configuration document.
    Flatten {
        /// JSON application-set spec, or a whole application set resource.
        file: PathBuf,
    },
    /// Show which features the configured server supports.
    Features,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.debug {
        "appsetctl=debug,appset_generators=debug,warn"
    } else {
        "appsetctl=info,appset_generators=info,warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = EngineConfig::try_from_env().context("invalid environment")?;
    if let Some(version) = args.server_version {
        config.server_version = Some(version);
    }
    config.strict |= args.strict;
    tracing::debug!(
        server_version = ?config.server_version,
        strict = config.strict,
        "Loaded configuration"
    );

    let output = match args.command {
        Command::Expand { file } => {
            let ctx = ExpandContext::from(&config);
            serde_json::to_string_pretty(&commands::expand(&file, &ctx)?)?
        }
        Command::Flatten { file } => serde_json::to_string_pretty(&commands::flatten(&file)?)?,
        Command::Features => commands::features(&config.feature_set()),
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}").context("failed to write output")?;
    Ok(())
}
