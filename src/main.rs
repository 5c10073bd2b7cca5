use token_drain::config::Config;
use token_drain::core::orchestrator::DrainOrchestrator;
use token_drain::keypair::load_keypair;
use token_drain::rpc::SolanaRpc;
use solana_sdk::signature::Signer;
use log::info;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Path to the wallet key file (overrides solana.keypair_path)
    #[arg(short, long)]
    keypair: Option<String>,

    /// Plan and log batches without sending anything
    #[arg(short, long)]
    dry_run: bool,

    /// RPC endpoint (overrides solana.rpc_url)
    #[arg(long, env = "SOLANA_RPC_URL")]
    rpc_url: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;

    if let Some(path) = args.keypair {
        config.solana.keypair_path = path;
    }
    if let Some(url) = args.rpc_url {
        config.solana.rpc_url = url;
    }
    if args.dry_run {
        config.settings.dry_run = true;
    }

    let keypair = load_keypair(&config.solana.keypair_path)?;
    info!("Wallet: {}", keypair.pubkey());

    let rpc = SolanaRpc::new(&config.solana.rpc_url, config.commitment()?, config.timeout());
    info!("RPC: {}", rpc.url());

    let orchestrator = DrainOrchestrator::new(rpc, keypair, config.drain_config()?);
    orchestrator.run().await?;

    Ok(())
}
