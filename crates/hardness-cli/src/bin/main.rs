//! hardness-kb CLI binary
//!
//! Run with:
//! ```bash
//! cargo run -p hardness-cli --bin hardness-kb -- --data-dir ./data report --format json
//! ```

use clap::{Parser, Subcommand};
use hardness_cli::{Format, Source};
use hardness_core::KnowledgeBase;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "hardness-kb")]
#[command(about = "Resolve the security of cryptographic assumptions and schemes")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Directory holding attacks.yml, assumptions.yml and schemes.yml
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Report nodes without a known attack as unbounded instead of failing
    #[arg(long, global = true)]
    allow_unknown: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load, link and resolve every node
    Check,

    /// Print the security of every scheme, assumption and attack
    Report {
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,

        /// Write output to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Best attack on an assumption or scheme
    Query {
        /// Dotted longid, e.g. ssi.oriented
        longid: String,

        /// Assume a quantum adversary
        #[arg(long)]
        quantum: bool,
    },

    /// Every attack applicable to an assumption or scheme
    Attacks {
        longid: String,

        #[arg(long)]
        quantum: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("hardness_kb={level}").parse()?)
                .add_directive(format!("hardness_core={level}").parse()?)
                .add_directive(format!("hardness_cli={level}").parse()?),
        )
        .init();

    let source = Source {
        data_dir: args.data_dir,
        config: args.config,
        allow_unknown: args.allow_unknown,
    };
    let config = source.config()?;
    let policy = config.unknown_policy;
    tracing::info!(
        attacks = %config.attacks.display(),
        assumptions = %config.assumptions.display(),
        schemes = %config.schemes.display(),
        policy = %policy,
        "Loading knowledge base"
    );
    let kb = KnowledgeBase::load(&config)?;

    match args.command {
        Command::Check => print!("{}", hardness_cli::check(&kb, policy)?),
        Command::Report { format, output } => {
            let rendered = hardness_cli::report(&kb, policy, format)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    tracing::info!(path = %path.display(), "Report written");
                }
                None => print!("{rendered}"),
            }
        }
        Command::Query { longid, quantum } => {
            print!("{}", hardness_cli::query(&kb, &longid, quantum, policy)?)
        }
        Command::Attacks { longid, quantum } => {
            print!("{}", hardness_cli::attacks(&kb, &longid, quantum)?)
        }
    }

    Ok(())
}
