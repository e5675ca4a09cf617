use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint};
use num_bigint::BigUint;
use price_oracle::{Address, BigDecimal, BoundaryRule};
use serde_json::json;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "price-oracle")]
#[command(about = "Historical token prices and USD conversions from recorded observations")]
struct Cli {
    /// Path to the oracle configuration file
    #[arg(
        long,
        global = true,
        default_value = "oracle.json",
        env = "PRICE_ORACLE_CONFIG",
        value_hint = ValueHint::FilePath
    )]
    config: PathBuf,

    /// Match in-range blocks at or before the requested block instead of strictly before it
    #[arg(long, global = true)]
    at_or_before: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert raw token units to USD
    ToUsd {
        #[command(flatten)]
        target: Target,
        /// Raw token amount (scaled by the token's decimals)
        #[arg(long)]
        amount: BigUint,
    },

    /// Convert a USD amount to raw token units
    FromUsd {
        #[command(flatten)]
        target: Target,
        /// USD amount, e.g. 12.5
        #[arg(long)]
        amount: BigDecimal,
    },

    /// Show the rate applicable at a block
    Rate {
        #[command(flatten)]
        target: Target,
    },

    /// List every recorded observation for a chain
    Prices {
        #[arg(long)]
        chain: u64,
    },
}

#[derive(Args, Debug)]
struct Target {
    #[arg(long)]
    chain: u64,

    /// Token address (any letter case)
    #[arg(long)]
    token: Address,

    /// Block number; the latest price is used when omitted
    #[arg(long)]
    block: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "price_oracle=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    debug!(config = %cli.config.display(), "loading configuration");

    let mut engine = price_oracle::load_engine(&cli.config)?;
    if cli.at_or_before {
        engine = engine.with_boundary_rule(BoundaryRule::AtOrBefore);
    }

    let output = match cli.cmd {
        Command::ToUsd { target, amount } => {
            let result = engine
                .convert_to_usd(target.chain, &target.token, &amount, target.block)
                .await?;
            json!({
                "token": target.token.to_checksum(),
                "amount": result.amount.to_string(),
                "price": result.price.to_string(),
            })
        }
        Command::FromUsd { target, amount } => {
            let result = engine
                .convert_from_usd(target.chain, &target.token, &amount, target.block)
                .await?;
            json!({
                "token": target.token.to_checksum(),
                "amount": result.amount.to_string(),
                "price": result.price.to_string(),
            })
        }
        Command::Rate { target } => {
            let rate = engine
                .get_usd_conversion_rate(target.chain, &target.token, target.block)
                .await?;
            json!({
                "token": rate.token.to_checksum(),
                "block": rate.block,
                "price": rate.price.to_string(),
                "decimals": rate.decimals,
            })
        }
        Command::Prices { chain } => {
            let observations = engine.get_all_prices_for_chain(chain).await?;
            serde_json::to_value(&*observations)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
