//! CLI command definitions for lingoforge.
//!
//! The `translate` command runs the full four-stage pipeline over a local
//! JSON dataset in one shot; `jobs` and `languages` are inspection helpers.

use std::collections::BTreeMap;
use std::sync::Arc;

use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};

use crate::config;
use crate::dataset::{detect_column_types, Dataset, Row};
use crate::job::JobStatus;
use crate::llm::GeminiClient;
use crate::pipeline::JobOrchestrator;
use crate::prompts::AgentPromptOverrides;
use crate::storage::{FileStore, RecordStore};

/// Default path for the on-disk record store.
const DEFAULT_STORE_PATH: &str = "./lingoforge_store.json";

/// Translation quality pipeline for LLM datasets.
#[derive(Parser)]
#[command(name = "lingoforge")]
#[command(about = "Translate datasets with multi-agent quality scoring")]
#[command(version)]
#[command(
    long_about = "lingoforge translates the text column of a dataset through a four-stage \
agent pipeline (translate, evaluate, back-translate, compare), producing per-row quality \
scores and an accept/revise recommendation.\n\nExample usage:\n  lingoforge translate --input rows.json --language ko --output rows_ko.json"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Translate a dataset file through the full quality pipeline.
    #[command(alias = "tr")]
    Translate(TranslateArgs),

    /// List jobs recorded in the store.
    Jobs(JobsArgs),

    /// List supported target languages.
    Languages,
}

/// Arguments for `lingoforge translate`.
#[derive(Parser, Debug)]
pub struct TranslateArgs {
    /// Input dataset: a JSON array of row objects.
    #[arg(short, long)]
    pub input: String,

    /// Target language code (see `lingoforge languages`).
    #[arg(short = 'L', long)]
    pub language: String,

    /// Extra instructions appended to every agent prompt.
    #[arg(long)]
    pub instructions: Option<String>,

    /// Name for the output dataset record.
    #[arg(long)]
    pub name: Option<String>,

    /// Path to write the translated rows as a JSON array.
    #[arg(short, long)]
    pub output: Option<String>,

    /// Record store file for job and dataset bookkeeping.
    #[arg(long, default_value = DEFAULT_STORE_PATH)]
    pub store: String,

    /// Override the forward translator prompt with the contents of a file.
    #[arg(long)]
    pub forward_prompt: Option<String>,

    /// Override the evaluator prompt with the contents of a file.
    #[arg(long)]
    pub evaluator_prompt: Option<String>,

    /// Override the backward translator prompt with the contents of a file.
    #[arg(long)]
    pub backward_prompt: Option<String>,

    /// Override the comparator prompt with the contents of a file.
    #[arg(long)]
    pub comparator_prompt: Option<String>,

    /// Gemini API key (can also be set via GEMINI_API_KEY env var).
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

/// Arguments for `lingoforge jobs`.
#[derive(Parser, Debug)]
pub struct JobsArgs {
    /// Record store file to read.
    #[arg(long, default_value = DEFAULT_STORE_PATH)]
    pub store: String,
}

/// Parse CLI arguments without running the command.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
///
/// This is the main entry point for the lingoforge CLI.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Translate(args) => run_translate_command(args).await,
        Commands::Jobs(args) => run_jobs_command(args).await,
        Commands::Languages => {
            run_languages_command();
            Ok(())
        }
    }
}

async fn run_translate_command(args: TranslateArgs) -> anyhow::Result<()> {
    let client = match args.api_key.clone() {
        Some(key) => GeminiClient::new(key),
        None => GeminiClient::from_env()?,
    };
    info!(api_key = %client.api_key_masked(), url = client.api_url(), "Using Gemini API");

    let dataset = load_dataset_file(&args.input)?;
    info!(
        rows = dataset.rows.len(),
        columns = dataset.columns.len(),
        "Loaded dataset from {}",
        args.input
    );

    let store = Arc::new(FileStore::open(&args.store).await?);
    store.save_dataset(&dataset).await?;

    let orchestrator = Arc::new(JobOrchestrator::new(store, Arc::new(client)));
    let overrides = load_prompt_overrides(&args)?;
    let job = orchestrator
        .create_job(
            &dataset.id,
            &args.language,
            args.instructions.clone(),
            overrides,
        )
        .await?;

    let handle = orchestrator.start(&job.id).await?;
    let job_id = handle.job_id().to_string();

    // Translate Ctrl-C into a cooperative cancel; the in-flight row finishes
    // and everything processed so far stays in the store.
    let cancel_target = Arc::clone(&orchestrator);
    let cancel_job = job_id.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling job");
            cancel_target.cancel(&cancel_job);
        }
    });

    handle.wait().await;

    let finished = orchestrator
        .get_job(&job_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("job '{job_id}' disappeared from the store"))?;

    match finished.status {
        JobStatus::Completed => {
            let output = orchestrator
                .save_as_dataset(&job_id, args.name.clone())
                .await?;
            println!(
                "Completed {} rows -> dataset '{}' ({})",
                finished.results.len(),
                output.name,
                output.id
            );
            let accepted = finished
                .results
                .iter()
                .filter(|r| r.recommendation == crate::parser::Recommendation::Accept)
                .count();
            println!(
                "{} accepted, {} flagged for revision",
                accepted,
                finished.results.len() - accepted
            );
            if let Some(path) = &args.output {
                write_rows_file(path, &output.rows)?;
                println!("Wrote translated rows to {path}");
            }
            Ok(())
        }
        JobStatus::Cancelled => {
            println!(
                "Cancelled after {}/{} rows; partial results kept in {}",
                finished.progress.current, finished.progress.total, args.store
            );
            Ok(())
        }
        other => {
            anyhow::bail!(
                "job '{}' finished with status {}: {}",
                job_id,
                other,
                finished.error.unwrap_or_else(|| "unknown error".to_string())
            )
        }
    }
}

async fn run_jobs_command(args: JobsArgs) -> anyhow::Result<()> {
    let store = FileStore::open(&args.store).await?;
    let jobs = store.list_jobs().await?;
    if jobs.is_empty() {
        println!("No jobs in {}", args.store);
        return Ok(());
    }
    for job in jobs {
        println!(
            "{}  {:<11}  {:>4}/{:<4}  {} -> {}  {}",
            job.id,
            job.status.to_string(),
            job.progress.current,
            job.progress.total,
            job.source_dataset_name,
            job.target_language,
            job.created_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    Ok(())
}

fn run_languages_command() {
    for language in config::SUPPORTED_LANGUAGES {
        println!("{:<6} {}", language.code, language.name);
    }
}

/// Reads a JSON array of row objects and wraps it in a dataset record.
///
/// Column types are inferred from the first row's keys.
fn load_dataset_file(path: &str) -> anyhow::Result<Dataset> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read '{path}': {e}"))?;
    let values: Vec<BTreeMap<String, Value>> = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("'{path}' is not a JSON array of objects: {e}"))?;

    let names: Vec<String> = values
        .first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default();
    let columns = detect_column_types(&names);
    let rows: Vec<Row> = values;

    let name = std::path::Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("dataset")
        .to_string();
    Ok(Dataset::new(name, columns, rows))
}

fn write_rows_file(path: &str, rows: &[Row]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(rows)?;
    std::fs::write(path, json).map_err(|e| anyhow::anyhow!("failed to write '{path}': {e}"))?;
    Ok(())
}

/// Loads any per-agent prompt override files named on the command line.
fn load_prompt_overrides(args: &TranslateArgs) -> anyhow::Result<Option<AgentPromptOverrides>> {
    let read = |path: &Option<String>| -> anyhow::Result<Option<String>> {
        match path {
            Some(p) => Ok(Some(std::fs::read_to_string(p).map_err(|e| {
                anyhow::anyhow!("failed to read prompt file '{p}': {e}")
            })?)),
            None => Ok(None),
        }
    };

    let overrides = AgentPromptOverrides {
        forward_translator: read(&args.forward_prompt)?,
        evaluator: read(&args.evaluator_prompt)?,
        backward_translator: read(&args.backward_prompt)?,
        comparator: read(&args.comparator_prompt)?,
    };

    let any = overrides.forward_translator.is_some()
        || overrides.evaluator.is_some()
        || overrides.backward_translator.is_some()
        || overrides.comparator.is_some();
    Ok(any.then_some(overrides))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_dataset_file_infers_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        std::fs::write(
            &path,
            r#"[{"prompt": "hello", "label": "a"}, {"prompt": "world", "label": "b"}]"#,
        )
        .unwrap();

        let dataset = load_dataset_file(path.to_str().unwrap()).unwrap();
        assert_eq!(dataset.rows.len(), 2);
        assert_eq!(dataset.columns.len(), 2);
        assert_eq!(dataset.name, "rows");
        assert_eq!(dataset.text_column().unwrap().name, "prompt");
    }

    #[test]
    fn test_load_dataset_file_rejects_non_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"prompt": "hello"}"#).unwrap();
        assert!(load_dataset_file(path.to_str().unwrap()).is_err());
    }

    #[test]
    fn test_prompt_override_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval.txt");
        std::fs::write(&path, "Rate this. Score: [0-100]").unwrap();

        let mut args = TranslateArgs::parse_from(["translate", "-i", "x.json", "-L", "ko"]);
        assert!(load_prompt_overrides(&args).unwrap().is_none());

        args.evaluator_prompt = Some(path.to_str().unwrap().to_string());
        let overrides = load_prompt_overrides(&args).unwrap().unwrap();
        assert!(overrides.evaluator.unwrap().contains("Score:"));
        assert!(overrides.forward_translator.is_none());
    }

    #[test]
    fn test_cli_parses_translate() {
        let cli = Cli::parse_from([
            "lingoforge",
            "translate",
            "--input",
            "rows.json",
            "--language",
            "ja",
            "--instructions",
            "keep markdown intact",
        ]);
        match cli.command {
            Commands::Translate(args) => {
                assert_eq!(args.input, "rows.json");
                assert_eq!(args.language, "ja");
                assert_eq!(args.instructions.as_deref(), Some("keep markdown intact"));
                assert_eq!(args.store, DEFAULT_STORE_PATH);
            }
            _ => panic!("expected translate subcommand"),
        }
    }
}
