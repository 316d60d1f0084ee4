use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use coinapult::{CoinapultClient, DEFAULT_BASE_URL, EccIdentity};

#[derive(Parser)]
#[command(name = "coinapult-cli", about = "Talk to the Coinapult API from the command line")]
struct Args {
    #[clap(long, env = "COINAPULT_URL", default_value = DEFAULT_BASE_URL)]
    url: String,

    /// API key for shared-secret (HMAC) authentication.
    #[clap(long, env = "COINAPULT_KEY")]
    key: Option<String>,

    /// API secret for shared-secret (HMAC) authentication.
    #[clap(long, env = "COINAPULT_SECRET")]
    secret: Option<String>,

    /// PEM file holding a secp256k1 private key for ECC authentication.
    #[clap(long, env = "COINAPULT_ECC_KEY_FILE")]
    ecc_key_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Current exchange rates (unauthenticated).
    Ticker {
        #[clap(long)]
        market: Option<String>,
        #[clap(long)]
        filter: Option<String>,
    },
    /// Balances and account details.
    AccountInfo,
    /// Request a fresh bitcoin deposit address.
    NewAddress,
    /// Generate a key pair and start ECC account provisioning.
    CreateAccount {
        /// Where to store the generated private key (PEM).
        #[clap(long)]
        key_out: PathBuf,
    },
    /// Accept the terms for an account created with `create-account`.
    ActivateAccount,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    match &args.command {
        Command::Ticker { market, filter } => {
            let client = CoinapultClient::unauthenticated().base_url(args.url.clone());
            print_json(&client.ticker(market.as_deref(), filter.as_deref()).await?)
        }
        Command::AccountInfo => {
            let client = build_client(&args)?;
            print_json(&client.account_info().await?)
        }
        Command::NewAddress => {
            let client = build_client(&args)?;
            print_json(&client.new_bitcoin_address().await?)
        }
        Command::CreateAccount { key_out } => {
            let identity = EccIdentity::random()?;
            std::fs::write(key_out, identity.private_key_pem()?)
                .with_context(|| format!("writing private key to {}", key_out.display()))?;
            println!("private key written to {}", key_out.display());
            println!("fingerprint: {}", identity.fingerprint());

            let mut client =
                CoinapultClient::with_unregistered_ecc(identity).base_url(args.url.clone());
            let created = client.create_account(coinapult::Params::new()).await?;
            if let Some(info) = &created.info {
                println!("{info}");
            }
            if let Some(terms) = &created.terms {
                println!("terms hash: {terms}");
            }
            println!("run `activate-account` with this key file to finish provisioning");
            Ok(())
        }
        Command::ActivateAccount => {
            let Some(path) = &args.ecc_key_file else {
                bail!("activate-account requires --ecc-key-file");
            };
            let pem = std::fs::read_to_string(path)
                .with_context(|| format!("reading private key from {}", path.display()))?;
            let identity = EccIdentity::from_pem(&pem)?;
            let mut client =
                CoinapultClient::with_unregistered_ecc(identity).base_url(args.url.clone());
            print_json(&client.activate_account(true).await?)
        }
    }
}

fn build_client(args: &Args) -> Result<CoinapultClient> {
    let client = match (&args.key, &args.secret, &args.ecc_key_file) {
        (Some(key), Some(secret), _) => {
            CoinapultClient::with_shared_secret(key.clone(), secret.clone())
        }
        (_, _, Some(path)) => {
            let pem = std::fs::read_to_string(path)
                .with_context(|| format!("reading private key from {}", path.display()))?;
            CoinapultClient::with_ecc(EccIdentity::from_pem(&pem)?)
        }
        _ => bail!("supply --key and --secret, or --ecc-key-file"),
    };
    Ok(client.base_url(args.url.clone()))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
