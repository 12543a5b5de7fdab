use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solreclaim::{
    config::{self, Config},
    logger::{self as logger, LogLevel, LogTag},
    reclaim::{ReclaimAction, ReclaimService},
    rpc::HttpLedgerClient,
    tokens::{DasMetadataClient, MetadataSource},
    vesting::{self, VestingType},
};
use std::sync::Arc;

/// Token account rent reclamation and vesting helper
#[derive(Parser, Debug)]
#[command(
    name = "solreclaim",
    about = "Scan wallets for reclaimable token-account rent and build unsigned reclaim transactions"
)]
struct Args {
    /// Configuration file (defaults are used when missing)
    #[arg(long, global = true, default_value = config::CONFIG_FILE_PATH)]
    config: String,

    /// Enable debug output for a log tag (repeatable, "all" for every tag)
    #[arg(long = "debug", global = true, value_name = "TAG")]
    debug_tags: Vec<String>,

    /// Print verbose output
    #[arg(long, global = true)]
    verbose: bool,

    /// Only print errors
    #[arg(long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify the token accounts of one or more wallets
    Scan {
        /// Wallet addresses (base58)
        #[arg(required = true)]
        wallets: Vec<String>,
    },

    /// Build an unsigned close/burn transaction for selected accounts
    Build {
        /// Owner wallet, also the fee payer
        #[arg(long)]
        wallet: String,

        /// close or burn
        #[arg(long)]
        action: String,

        /// Token account addresses to include
        #[arg(required = true)]
        accounts: Vec<String>,
    },

    /// Compute the vested amount of a schedule at a given time
    VestingQuote {
        /// Total amount in base units
        #[arg(long)]
        total: u64,

        /// Schedule start (unix seconds)
        #[arg(long)]
        start: i64,

        /// Schedule end (unix seconds)
        #[arg(long)]
        end: i64,

        /// Cliff time (unix seconds)
        #[arg(long)]
        cliff: Option<i64>,

        /// linear, cliff or step
        #[arg(long = "type", default_value = "linear")]
        vesting_type: String,

        /// Evaluation time (unix seconds, defaults to now)
        #[arg(long)]
        at: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    config::load_config_from_path(&args.config)?;
    let config = config::get_config_clone();
    init_logger(&config, &args);

    logger::debug(
        LogTag::System,
        &format!("Loaded configuration from {}", args.config),
    );

    let result = run(&config, args.command).await;
    if let Err(e) = &result {
        logger::error(LogTag::System, &format!("{:#}", e));
    }
    logger::flush();
    result
}

fn init_logger(config: &Config, args: &Args) {
    let mut logger_config = config::logger_config_from(config);
    if args.verbose {
        logger_config.min_level = LogLevel::Verbose;
    }
    if args.quiet {
        logger_config.min_level = LogLevel::Error;
    }
    logger_config
        .debug_tags
        .extend(args.debug_tags.iter().map(|tag| tag.to_lowercase()));
    logger::init_with(logger_config);
}

async fn run(config: &Config, command: Command) -> Result<()> {
    match command {
        Command::Scan { wallets } => {
            let service = reclaim_service(config)?;
            let entries = service.scan_wallets(&wallets).await;
            print_json(&entries)
        }
        Command::Build {
            wallet,
            action,
            accounts,
        } => {
            let action: ReclaimAction = action.parse()?;
            let service = reclaim_service(config)?;
            let built = service
                .build_transaction(&wallet, &accounts, action)
                .await
                .with_context(|| format!("building {} transaction for {}", action, wallet))?;
            print_json(&built)
        }
        Command::VestingQuote {
            total,
            start,
            end,
            cliff,
            vesting_type,
            at,
        } => {
            let vesting_type: VestingType = vesting_type.parse()?;
            let at = at.unwrap_or_else(|| chrono::Utc::now().timestamp());
            let vested = vesting::vested_amount(total, start, end, cliff, vesting_type, at);
            print_json(&serde_json::json!({
                "total_amount": total,
                "vested_amount": vested,
                "unvested_amount": total - vested,
                "vesting_type": vesting_type,
                "as_of": at,
            }))
        }
    }
}

fn reclaim_service(config: &Config) -> Result<ReclaimService> {
    let rpc = Arc::new(HttpLedgerClient::from_config(&config.rpc)?);
    let metadata: Arc<dyn MetadataSource> =
        Arc::from(DasMetadataClient::from_config(&config.metadata, &config.rpc.url)?);
    Ok(ReclaimService::from_config(config, rpc, metadata)?)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
