pub mod config;
pub mod diagnosis;
pub mod error;
pub mod models;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;
use crate::diagnosis::emergency::scan_text;
use crate::diagnosis::{DiagnosisEngine, KnowledgeBase};
use crate::error::EngineError;
use crate::models::UserSymptomData;

#[derive(Parser)]
#[command(name = "symptom-engine")]
#[command(version)]
#[command(about = "Rank candidate conditions for a symptom report and pick the next question", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Diagnose one symptom report (JSON) and print the response as JSON
    Diagnose {
        /// UserSymptomData JSON file
        #[arg(short, long)]
        symptoms: PathBuf,

        /// Directory holding conditions.json (and optionally patterns.json)
        #[arg(short, long)]
        knowledge: Option<PathBuf>,

        /// EngineConfig JSON file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Run only the emergency scanner over free text
    Scan {
        #[arg(short, long)]
        text: String,
    },
}

pub fn run() {
    // Logs go to stderr; stdout carries the JSON response.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("{} v{}", config::APP_NAME, config::APP_VERSION);

    let cli = Cli::parse();
    match execute(cli.command) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            tracing::error!(error = %e, "symptom-engine failed");
            std::process::exit(1);
        }
    }
}

fn execute(command: Commands) -> Result<String, EngineError> {
    match command {
        Commands::Diagnose {
            symptoms,
            knowledge,
            config: config_path,
        } => {
            let engine_config = match config_path {
                Some(path) => EngineConfig::load(&path)?,
                None => EngineConfig::default(),
            };
            let knowledge_dir = knowledge.unwrap_or_else(config::bundled_resources_dir);
            let knowledge_base = KnowledgeBase::load(&knowledge_dir)?;

            let report: UserSymptomData =
                serde_json::from_str(&std::fs::read_to_string(&symptoms)?)?;

            let engine = DiagnosisEngine::from_knowledge_base(engine_config, &knowledge_base);
            tracing::debug!(
                early_exit = engine.config().early_exit_confidence,
                "Engine ready"
            );
            let response = engine.diagnose_with(&knowledge_base, &report)?;
            Ok(serde_json::to_string_pretty(&response)?)
        }
        Commands::Scan { text } => Ok(serde_json::to_string_pretty(&scan_text(&text))?),
    }
}
