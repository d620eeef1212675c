use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "minichain-cli")]
#[command(about = "CLI client for the minichain node")]
struct Cli {
    /// Node base URL (e.g. http://127.0.0.1:8080)
    #[arg(long, global = true, env = "MINICHAIN_NODE", default_value = "http://127.0.0.1:8080")]
    node: String,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit a transaction to the pending block
    Submit {
        /// Sender
        #[arg(long)]
        sender: String,
        /// Recipient
        #[arg(long)]
        recipient: String,
        /// Amount
        #[arg(long, allow_negative_numbers = true)]
        amount: f64,
    },
    /// Mine the next block
    Mine,
    /// Print the whole chain
    Chain,
    /// Ask the node to re-verify every block
    Validate,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Tx {
    sender: String,
    recipient: String,
    amount: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let node = cli.node.trim_end_matches('/');
    let client = reqwest::Client::new();

    let req = match cli.cmd {
        Command::Submit {
            sender,
            recipient,
            amount,
        } => client
            .post(format!("{node}/transactions/new"))
            .json(&Tx {
                sender,
                recipient,
                amount,
            }),
        Command::Mine => client.get(format!("{node}/mine")),
        Command::Chain => client.get(format!("{node}/chain")),
        Command::Validate => client.get(format!("{node}/chain/validate")),
    };

    debug!("sending {:?}", req);
    let res = req.send().await?;
    let status = res.status();
    let body = res.text().await?;
    println!("status: {status}");
    match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{body}"),
    }
    Ok(())
}
