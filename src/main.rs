use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::EnvFilter;
use world_population_dashboard::config::AppConfig;
use world_population_dashboard::render::render_text;
use world_population_dashboard::server::{self, DataState};
use world_population_dashboard::view::{build_view, MapStyle};
use world_population_dashboard::{data, Selection};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration; built-in defaults are used when omitted
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard page and its JSON API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print one country's dashboard to the terminal
    Report {
        #[arg(long)]
        country: String,
        /// Year label such as "1970 Population" or "1970"; repeatable
        #[arg(short, long = "years", value_name = "YEAR")]
        years: Vec<String>,
        /// Print the view as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut app_config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                app_config.server.port = port;
            }

            // Loaded once; every request reads the same dataset
            let loaded = data::load_dataset(&app_config).await;
            if let Err(e) = &loaded {
                error!("{}", e.notice());
            }

            server::start_server(app_config, DataState::from(loaded)).await?;
        }
        Commands::Report { country, years, json } => {
            let selection = Selection::from_labels(Some(country.as_str()), &years)?;
            let dataset = data::load_dataset(&app_config)
                .await
                .map_err(|e| anyhow!(e.notice()))?;

            let view = build_view(&dataset, &selection, &MapStyle::from(&app_config.map))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
            } else {
                print!("{}", render_text(&view)?);
            }
        }
    }

    Ok(())
}
