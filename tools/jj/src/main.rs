use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use jj_entropy::{
    audit, parse_player, AuditReport, Config, ExtractionStrategy, RpcBlockSource, SecureSampler,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jj", about = "jj: The Jackpot Junction CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Calculate the entropy of block-hash derived outcomes over a random sample of blocks
    Entropy(EntropyArgs),
    /// Print the version of jj that you are currently using
    Version,
}

#[derive(Args)]
struct EntropyArgs {
    /// JSON-RPC API URL for the blockchain to sample from
    #[arg(short, long)]
    rpc: Option<String>,

    /// Entropy is calculated for raw blockhashes modulo this base
    #[arg(short = 'N', long = "base", conflicts_with = "player")]
    base: Option<u64>,

    /// Player address mixed into each blockhash (reports item, terrain and outcome entropy)
    #[arg(short, long)]
    player: Option<String>,

    /// Number of blocks to sample
    #[arg(short, long)]
    samples: Option<usize>,

    /// Deadline in seconds for each JSON-RPC request
    #[arg(long)]
    timeout: Option<u64>,

    /// Also print field names, bounds and sample sizes
    #[arg(short, long)]
    verbose: bool,

    /// Print the full report as JSON
    #[arg(long, conflicts_with = "verbose")]
    json: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    match Cli::parse().command {
        Command::Entropy(args) => run_entropy(args).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn run_entropy(args: EntropyArgs) -> Result<()> {
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(rpc) = args.rpc {
        config.rpc_url = rpc;
    }
    if let Some(samples) = args.samples {
        config.samples = samples;
    }
    if let Some(timeout) = args.timeout {
        config.timeout = Duration::from_secs(timeout);
    }
    if args.player.is_some() {
        config.player = args.player;
    }

    if config.samples == 0 {
        bail!("--samples/-s must be positive");
    }

    let strategy = match (args.base, config.player.as_deref()) {
        (Some(modulus), _) => ExtractionStrategy::RawHash { modulus },
        (None, Some(player)) => ExtractionStrategy::PlayerMixed {
            player: parse_player(player)?,
        },
        (None, None) => return Err(anyhow!("one of --base/-N or --player/-p is required")),
    };

    let source = RpcBlockSource::from_config(&config)?;
    let mut sampler = SecureSampler::os();
    let report = audit(Arc::new(source), &mut sampler, config.samples, &strategy)
        .await
        .with_context(|| format!("Entropy audit against {} failed", config.rpc_url))?;

    print_report(&report, args.verbose, args.json)
}

fn print_report(report: &AuditReport, verbose: bool, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if verbose {
        println!(
            "head: {}, sampled: {}, distinct: {}",
            report.head, report.requested, report.distinct
        );
        for field in &report.fields {
            println!(
                "{}: {} bits (max {} for modulus {})",
                field.name, field.entropy, field.max_entropy, field.modulus
            );
        }
    } else {
        for field in &report.fields {
            println!("{}", field.entropy);
        }
    }
    Ok(())
}
