use clap::{Parser, Subcommand};
use reqwest::header::HeaderMap;
use serde_json::Value;

#[derive(Parser)]
#[command(name = "ack-cli")]
#[command(about = "Call an ack-speaking endpoint and print the envelope", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    url: String,

    /// Correlation id sent in the `uuid` request header.
    #[arg(long)]
    uuid: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a path and print its ack
    Get { path: String },
    /// POST a JSON body to a path and print its ack
    Post {
        path: String,
        #[arg(short, long)]
        data: String,
    },
    /// Print the server's Prometheus metrics
    Metrics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(uuid) = &cli.uuid {
        headers.insert("uuid", uuid.parse()?);
    }

    match cli.command {
        Commands::Get { path } => {
            let res = client
                .get(format!("{}{}", cli.url, path))
                .headers(headers)
                .send()
                .await?;
            print_ack(res).await?;
        }
        Commands::Post { path, data } => {
            let body: Value = serde_json::from_str(&data)?;
            let res = client
                .post(format!("{}{}", cli.url, path))
                .headers(headers)
                .json(&body)
                .send()
                .await?;
            print_ack(res).await?;
        }
        Commands::Metrics => {
            let res = client.get(format!("{}/metrics", cli.url)).send().await?;
            println!("{}", res.text().await?);
        }
    }

    Ok(())
}

async fn print_ack(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    println!("HTTP {}", res.status());
    for line in ack_header_lines(res.headers()) {
        println!("{line}");
    }

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => {
            eprintln!("Error: response is not an ack envelope");
            eprintln!("Response: {}", text);
        }
    }
    Ok(())
}

/// `X-Ack-*` headers as printable lines.
///
/// Values are decoded lossily since durations carry a non-ASCII `µ`.
fn ack_header_lines(headers: &HeaderMap) -> Vec<String> {
    headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-ack-"))
        .map(|(name, value)| format!("{}: {}", name, String::from_utf8_lossy(value.as_bytes())))
        .collect()
}
