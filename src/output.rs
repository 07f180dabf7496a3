//! Output formatting and the query history log.

use anyhow::Result;
use chrono::Utc;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::debug;

use crate::pipeline::Answer;

/// One answered query, as stored in the history CSV.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryRecord {
    pub timestamp: String,
    pub query: String,
    pub outcome: String,
    pub function: String,
    pub answer: String,
}

impl HistoryRecord {
    pub fn new(query: &str, answer: &Answer) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            query: query.to_string(),
            outcome: answer.stage.to_string(),
            function: answer
                .function
                .map(|f| f.to_string())
                .unwrap_or_default(),
            answer: answer.response.clone(),
        }
    }
}

/// Prints `value` to stdout as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends a [`HistoryRecord`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, record: &HistoryRecord) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending history record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}
