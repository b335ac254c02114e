use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Command-line client for a running Elements gateway", long_about = None)]
struct Cli {
    #[arg(short, long, env = "GATEWAY_URL", default_value = "http://localhost:5010")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway and node connectivity
    Status,
    /// Show chain info reported by the node
    Info,
    /// Show the wallet balance of an asset
    Balance {
        #[arg(long)]
        asset: Option<String>,
    },
    /// Show the base-asset balance of every backend
    Balances,
    /// List labelled assets
    Assets,
    /// Show the chain tip summary
    Transactions,
    /// Generate a new receive address
    Address {
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        format: Option<String>,
    },
    /// Send tokens (smallest units) to an address
    Send {
        address: String,
        tokens: u64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        asset: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/api/status", base)),
        Commands::Info => client.get(format!("{}/api/node/info", base)),
        Commands::Balance { asset } => {
            let request = client.get(format!("{}/api/liquid/balance", base));
            match asset {
                Some(asset) => request.query(&[("asset", asset)]),
                None => request,
            }
        }
        Commands::Balances => client.get(format!("{}/api/balances", base)),
        Commands::Assets => client.get(format!("{}/api/liquid/assets", base)),
        Commands::Transactions => client.get(format!("{}/api/liquid/transactions", base)),
        Commands::Address { label, format } => client
            .post(format!("{}/api/liquid/address", base))
            .json(&json!({ "label": label, "format": format })),
        Commands::Send {
            address,
            tokens,
            description,
            asset,
        } => client.post(format!("{}/api/liquid/send", base)).json(&json!({
            "address": address,
            "tokens": tokens,
            "description": description,
            "asset": asset,
        })),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
