//! Score Client - credit decision lookup from the terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use credit_scoring::client::{
    prepare_features, ClientError, RecordSource, ScoringClient, DEFAULT_API_URL, DEFAULT_ID_COLUMN,
};

#[derive(Parser)]
#[command(name = "score-client", version, about = "Credit decision support for account managers")]
struct Cli {
    /// Client records (CSV)
    #[arg(long, short, global = true, default_value = "donnees_sample.csv")]
    data: PathBuf,

    /// Identifier column in the CSV
    #[arg(long, global = true, default_value = DEFAULT_ID_COLUMN)]
    id_column: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List client ids available in the data file
    List {
        /// Show at most this many ids
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Score one client through the decision service
    Predict {
        /// Client id
        #[arg(long)]
        id: String,

        /// Prediction endpoint
        #[arg(long, env = "SCORING_API_URL", default_value = DEFAULT_API_URL)]
        api_url: String,

        /// Print the features that were sent
        #[arg(long)]
        show_features: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let source = RecordSource::from_path(&cli.data, &cli.id_column)
        .with_context(|| format!("Failed to load client records from {}", cli.data.display()))?;

    match cli.command {
        Command::List { limit } => {
            let limit = limit.unwrap_or(usize::MAX);
            for id in source.ids().take(limit) {
                println!("{}", id);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Predict {
            id,
            api_url,
            show_features,
        } => {
            let record = source
                .find(&id)
                .with_context(|| format!("No client with {} = {}", source.id_column(), id))?;
            let features = prepare_features(record);
            let client = ScoringClient::new(api_url)?;

            match client.predict(features.clone()) {
                Ok(result) => {
                    let low_risk = matches!(result.decision.as_str(), "GRANTED" | "ACCORDÉ");
                    println!("Decision: {}", result.decision);
                    println!("{}", if low_risk { "Low risk" } else { "High risk" });
                    println!("Default probability: {:.1}%", result.score * 100.0);
                    println!("Refusal threshold: {}%", result.threshold * 100.0);

                    if show_features {
                        println!("{}", serde_json::to_string_pretty(&features)?);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                Err(ClientError::Unreachable(url)) => {
                    eprintln!("Cannot reach the scoring API at {}.", url);
                    eprintln!("Make sure the credit-scoring server is running.");
                    Ok(ExitCode::from(2))
                }
                Err(ClientError::Api { status, body }) => {
                    eprintln!("API error ({}): {}", status, body);
                    Ok(ExitCode::FAILURE)
                }
                Err(e) => Err(e.into()),
            }
        }
    }
}
