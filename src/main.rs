use agent_media::config::{Config, Provider};
use agent_media::generator::{VideoOptions, generate_video};
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "agent-media", version, about = "Generate media through hosted model APIs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a video from a prompt, optionally animating an input image
    Video {
        #[arg(long, short)]
        prompt: String,
        /// Local image path or http(s) URL
        #[arg(long, short)]
        input: Option<String>,
        /// Clip length in seconds (snapped to 5, 10 or 15)
        #[arg(long, short, value_parser = parse_duration)]
        duration: Option<f64>,
        /// 720p or 1080p
        #[arg(long, short)]
        resolution: Option<String>,
        #[arg(long)]
        audio: bool,
        /// Output directory, or a file path with a media extension
        #[arg(long, short)]
        out: Option<String>,
        /// Output filename (extension is replaced with .mp4)
        #[arg(long, short)]
        name: Option<String>,
        #[arg(long)]
        provider: Option<Provider>,
    },
}

fn parse_duration(raw: &str) -> Result<f64, String> {
    let seconds: f64 = raw
        .parse()
        .map_err(|_| format!("`{raw}` is not a number of seconds"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("duration must be a positive number of seconds, got `{raw}`"));
    }
    Ok(seconds)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;

    match cli.command {
        Command::Video {
            prompt,
            input,
            duration,
            resolution,
            audio,
            out,
            name,
            provider,
        } => {
            let options = VideoOptions {
                prompt,
                input,
                duration,
                resolution,
                audio,
                out,
                name,
                provider,
            };
            let file = generate_video(&config, &options).await?;
            println!("{}", serde_json::to_string_pretty(&file)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        tracing::error!("{:#}", err);
        std::process::exit(1);
    }
}
