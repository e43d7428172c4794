use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

#[derive(Parser)]
#[command(name = "imagectl")]
#[command(about = "Client for the image API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download an image and write it to disk
    Fetch {
        id: String,
        /// Output file (defaults to `<id>.png`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Report whether an image can be served, without saving it
    Check { id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Fetch { id, output } => {
            let mut res = client.get(image_url(&cli.url, &id)?).send().await?;
            if !res.status().is_success() {
                return print_error(res).await;
            }

            let output = output.unwrap_or_else(|| PathBuf::from(format!("{id}.png")));
            let mut file = tokio::fs::File::create(&output).await?;
            let mut written = 0usize;
            while let Some(chunk) = res.chunk().await? {
                file.write_all(&chunk).await?;
                written += chunk.len();
            }
            file.flush().await?;
            println!("Saved {} bytes to {}", written, output.display());
        }
        Commands::Check { id } => {
            let res = client.get(image_url(&cli.url, &id)?).send().await?;
            if !res.status().is_success() {
                return print_error(res).await;
            }

            let content_type = res
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string();
            let status = res.status();
            let size = res.bytes().await?.len();
            println!("{id}: {status}, {content_type}, {size} bytes");
        }
    }

    Ok(())
}

/// `{base}/api/images/{id}` with the id percent-encoded as one segment.
fn image_url(base: &str, id: &str) -> Result<Url, Box<dyn std::error::Error>> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| format!("'{base}' cannot be used as a base URL"))?
        .pop_if_empty()
        .extend(["api", "images", id]);
    Ok(url)
}

async fn print_error(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    eprintln!("Error: image API returned status {}", status);
    let text = res.text().await.unwrap_or_default();
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => eprintln!("{}", json["message"].as_str().unwrap_or(&text)),
        Err(_) if !text.is_empty() => eprintln!("Response: {}", text),
        Err(_) => {}
    }
    std::process::exit(1);
}
