use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;

use live_config::codec::Format;
use live_config::config::{load_settings, Settings, SettingsOverrides, SourceKind, SourceSettings};
use live_config::lifecycle::{build_controller, initial_load};
use live_config::source::ConsulSource;

#[derive(Parser)]
#[command(name = "config-cli")]
#[command(about = "Inspect and update live-config sources", long_about = None)]
struct Cli {
    /// Path to a TOML settings file
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Configuration source: consul or file
    #[arg(long)]
    source: Option<SourceKind>,

    /// Consul key
    #[arg(short, long)]
    key: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Consul agent address
    #[arg(long)]
    consul_address: Option<String>,

    /// Payload format: json, yaml or toml
    #[arg(long)]
    format: Option<Format>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and decode the configuration, print it with its version
    Show,
    /// Upload a local file to the configured Consul key
    Put {
        /// File whose bytes become the key's value
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let base = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    let overrides = SettingsOverrides {
        source: cli.source,
        key: cli.key.clone(),
        path: cli.path.clone(),
        address: cli.consul_address.clone(),
        format: cli.format,
        ..SettingsOverrides::default()
    };
    let settings = overrides.apply(base)?;

    match cli.command {
        Commands::Show => {
            let controller = build_controller(&settings)?;
            let snapshot = initial_load(&controller).await?;
            let output = json!({
                "source": controller.source_name(),
                "key": controller.key(),
                "version": snapshot.version(),
                "config": snapshot.config(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Put { file } => {
            let consul = match &settings.source {
                SourceSettings::Consul(consul) => consul,
                SourceSettings::File(_) => {
                    eprintln!("Error: put requires a consul source");
                    std::process::exit(2);
                }
            };
            let value = tokio::fs::read(&file).await?;
            let source = ConsulSource::new(consul)?;
            if source.put(&consul.key, value).await? {
                println!("Wrote {} to {}", file.display(), consul.key);
            } else {
                eprintln!("Error: Consul rejected the write to {}", consul.key);
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
