//! CLI entry point for the CRZ analyst.
//!
//! Answers natural-language questions about the Congestion Relief Zone
//! vehicle-entry dataset, or runs an analysis function directly.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use crz_analyst::config::Config;
use crz_analyst::dataset::{self, Aggregates, Dataset, EntryTotals};
use crz_analyst::llm::ChatModel;
use crz_analyst::output::{HistoryRecord, append_record, print_json};
use crz_analyst::pipeline::Pipeline;
use crz_analyst::registry::{self, FunctionCall, FunctionName};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "crz_analyst")]
#[command(about = "Ask questions about NYC Congestion Relief Zone vehicle entries", long_about = None)]
struct Cli {
    /// Dataset CSV (plain or .gz); overrides CRZ_DATA_PATH
    #[arg(long, global = true, value_name = "PATH")]
    data: Option<PathBuf>,

    /// CSV file to append answered queries to
    #[arg(long, global = true, value_name = "CSV")]
    history: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask {
        /// The question, e.g. "Which entry point is busiest on weekdays?"
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Print the full answer, including the analysis result, as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Answer questions read from stdin until "exit" or "quit"
    Interactive,
    /// Run an analysis function directly, without the language model
    Call {
        /// Registry function name, e.g. analyze_peak_periods
        function: String,

        /// Parameters as a JSON object
        #[arg(short, long, default_value = "{}")]
        params: String,
    },
    /// List the registered analysis functions
    Functions {
        /// Show the parameter schema of this function instead
        name: Option<String>,
    },
    /// Print an overview of the loaded dataset
    Summary,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/crz_analyst.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("crz_analyst.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(path) = cli.data {
        config.data_path = path;
    }

    match cli.command {
        Commands::Ask { query, json } => {
            let (dataset, _) = dataset::load(&config.data_path)?;
            let pipeline = pipeline(&config, dataset)?;
            let query = query.join(" ");

            let answer = pipeline.run(&query).await?;
            if let Some(path) = &cli.history {
                append_record(path, &HistoryRecord::new(&query, &answer))?;
            }
            if json {
                print_json(&answer)?;
            } else {
                println!("{}", answer.response);
            }
        }
        Commands::Interactive => {
            let (dataset, _) = dataset::load(&config.data_path)?;
            let pipeline = pipeline(&config, dataset)?;
            interactive(&pipeline, cli.history.as_deref()).await?;
        }
        Commands::Call { function, params } => {
            let name: FunctionName = function.parse()?;
            let parameters: Map<String, Value> =
                serde_json::from_str(&params).context("--params must be a JSON object")?;
            let call = FunctionCall::from_parameters(name, parameters)?;

            let (dataset, _) = dataset::load(&config.data_path)?;
            let result = registry::execute(&dataset, &call, Local::now().date_naive())?;
            print_json(&result)?;
        }
        Commands::Functions { name: Some(name) } => {
            let descriptor = registry::describe(&name)?;
            print_json(&json!({
                "function": descriptor,
                "parameters": registry::parameter_schema(&name)?,
            }))?;
        }
        Commands::Functions { name: None } => {
            for descriptor in registry::functions() {
                println!("{:<32} {}", descriptor.name.as_str(), descriptor.description);
            }
        }
        Commands::Summary => {
            let (dataset, aggregates) = dataset::load(&config.data_path)?;
            print_json(&summary(&dataset, &aggregates))?;
        }
    }

    Ok(())
}

fn pipeline(config: &Config, dataset: Dataset) -> Result<Pipeline<ChatModel>> {
    let model = config.llm.chat_model()?;
    info!(endpoint = model.endpoint(), model = %config.llm.model, "Language model configured");
    Ok(Pipeline::new(model, Arc::new(dataset)).with_max_attempts(config.llm.max_attempts))
}

/// Reads queries line by line, answering each until `exit`, `quit` or EOF.
/// A failed query is reported and the loop continues.
async fn interactive(pipeline: &Pipeline<ChatModel>, history: Option<&str>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    println!("Ask about Congestion Relief Zone traffic. Type 'exit' to quit.");
    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query.to_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        match pipeline.run(query).await {
            Ok(answer) => {
                println!("{}\n", answer.response);
                if let Some(path) = history {
                    append_record(path, &HistoryRecord::new(query, &answer))?;
                }
            }
            Err(e) => error!(error = %e, "Query failed"),
        }
    }

    Ok(())
}

fn summary(dataset: &Dataset, aggregates: &Aggregates) -> Value {
    let top = |buckets: &BTreeMap<String, EntryTotals>| {
        let mut rows: Vec<_> = buckets.iter().collect();
        rows.sort_by(|a, b| b.1.crz_entries.cmp(&a.1.crz_entries).then(a.0.cmp(b.0)));
        rows.into_iter()
            .take(10)
            .map(|(name, totals)| json!({"name": name, "totals": totals}))
            .collect::<Vec<_>>()
    };

    json!({
        "rows": dataset.len(),
        "date_span": aggregates
            .date_span()
            .map(|(first, last)| format!("{first} to {last}")),
        "days": aggregates.daily.len(),
        "totals": aggregates.totals(),
        "vehicle_classes": top(&aggregates.vehicle_class),
        "top_entry_points": top(&aggregates.entry_point),
    })
}
