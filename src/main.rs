use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use clap::{Parser, Subcommand};

use strato_watch::constellation::SnapshotClient;
use strato_watch::pipeline::{run_pipeline, PipelineOptions};
use strato_watch::weather::ForecastClient;
use strato_watch::web::{run_server, Config};

const DEFAULT_SNAPSHOT_URL: &str = "https://a.windbornesystems.com/treasure";
const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com";

#[derive(Parser)]
#[command(name = "strato-watch")]
#[command(about = "Balloon constellation analytics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once and print the report as JSON
    Report {
        /// Primary cluster count
        #[arg(long, default_value_t = 100)]
        clusters: usize,
        /// Coarse cluster count for the secondary grouping
        #[arg(long, default_value_t = 10)]
        coarse_clusters: usize,
        /// Snapshot base URL serving 00.json .. 23.json
        #[arg(long, default_value = DEFAULT_SNAPSHOT_URL)]
        base_url: String,
        /// Forecast API base URL
        #[arg(long, default_value = DEFAULT_WEATHER_URL)]
        weather_url: String,
    },
    /// Serve the analytics API, refreshing on an interval
    Serve {
        /// Path to the YAML config file
        #[arg(long, default_value = "config.yaml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            clusters,
            coarse_clusters,
            base_url,
            weather_url,
        } => report(clusters, coarse_clusters, &base_url, &weather_url).await,
        Commands::Serve { config } => serve(&config).await,
    }
}

async fn report(
    clusters: usize,
    coarse_clusters: usize,
    base_url: &str,
    weather_url: &str,
) -> ExitCode {
    let snapshots = match SnapshotClient::new(base_url) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to set up snapshot client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let forecast = match ForecastClient::new(weather_url) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Failed to set up forecast client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let options = PipelineOptions {
        cluster_count: clusters,
        coarse_cluster_count: coarse_clusters,
    };

    let hours = snapshots.fetch_window().await;
    let report = match run_pipeline(&hours, forecast, &options, Utc::now()).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Pipeline produced no report: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to serialize report: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn serve(config_path: &str) -> ExitCode {
    let config = match Config::from_file(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error reading config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
