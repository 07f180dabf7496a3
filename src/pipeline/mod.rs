//! The query dispatch pipeline.
//!
//! A query moves through
//! `Received → IntentTriaged → FunctionSelected → ParametersExtracted →
//! Executed → Answered`, or stops early at `AnsweredWithoutData` (no data
//! needed) or `DataUnavailable` (no function fits). Every transition is
//! decided by a validated model reply, so the state machine runs
//! deterministically against a scripted [`LanguageModel`].

pub mod execute;
pub mod prompts;
pub mod schemas;

use crate::analyzers::AnalysisError;
use crate::dataset::Dataset;
use crate::llm::{self, LanguageModel, LlmError};
use crate::registry::{self, AnalysisResult, FunctionCall, FunctionName, RegistryError};
use chrono::{Local, NaiveDate};
use schemas::{FinalAnswer, FindFunction, Reception};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Received,
    IntentTriaged,
    FunctionSelected,
    ParametersExtracted,
    Executed,
    Answered,
    AnsweredWithoutData,
    DataUnavailable,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Received => "received",
            Stage::IntentTriaged => "intent_triaged",
            Stage::FunctionSelected => "function_selected",
            Stage::ParametersExtracted => "parameters_extracted",
            Stage::Executed => "executed",
            Stage::Answered => "answered",
            Stage::AnsweredWithoutData => "answered_without_data",
            Stage::DataUnavailable => "data_unavailable",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{stage} failed: {source}")]
    Llm {
        stage: &'static str,
        #[source]
        source: LlmError,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("failed to encode the analysis result: {0}")]
    Encode(#[from] serde_json::Error),
}

fn llm_failure(stage: &'static str) -> impl FnOnce(LlmError) -> PipelineError {
    move |source| PipelineError::Llm { stage, source }
}

/// The outcome of one query.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Terminal stage the query reached.
    pub stage: Stage,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
}

impl Answer {
    fn terminal(stage: Stage, response: String) -> Self {
        Self {
            stage,
            response,
            function: None,
            result: None,
        }
    }
}

pub struct Pipeline<M> {
    model: M,
    dataset: Arc<Dataset>,
    max_attempts: u32,
    today: Option<NaiveDate>,
}

impl<M: LanguageModel> Pipeline<M> {
    pub fn new(model: M, dataset: Arc<Dataset>) -> Self {
        Self {
            model,
            dataset,
            max_attempts: llm::DEFAULT_MAX_ATTEMPTS,
            today: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Fixes the date forecasts count from; defaults to the local date.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Answers one natural-language query.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self, query: &str) -> Result<Answer, PipelineError> {
        info!(stage = %Stage::Received, "Query received");

        let reception = self.triage(query).await?;
        if !reception.retrieve_data {
            info!(stage = %Stage::AnsweredWithoutData, "No data needed");
            return Ok(Answer::terminal(Stage::AnsweredWithoutData, reception.response));
        }
        info!(stage = %Stage::IntentTriaged, data = %reception.data_description, "Data needed");

        let selection = self.select(query, &reception.data_description).await?;
        let Some(function) = selection.function() else {
            info!(stage = %Stage::DataUnavailable, "No function fits the query");
            return Ok(Answer::terminal(Stage::DataUnavailable, selection.response));
        };
        info!(stage = %Stage::FunctionSelected, %function, "Function selected");

        let call = self.extract(query, function).await?;
        info!(stage = %Stage::ParametersExtracted, ?call, "Parameters extracted");

        let result = self.execute(&call)?;
        info!(stage = %Stage::Executed, "Function executed");

        let answer = self.answer(query, &result).await?;
        info!(stage = %Stage::Answered, "Query answered");

        Ok(Answer {
            stage: Stage::Answered,
            response: answer.response,
            function: Some(function),
            result: Some(result),
        })
    }

    #[tracing::instrument(skip(self, query))]
    async fn triage(&self, query: &str) -> Result<Reception, PipelineError> {
        llm::invoke_structured(&self.model, &prompts::triage(query), self.max_attempts)
            .await
            .map_err(llm_failure("triage"))
    }

    #[tracing::instrument(skip(self, query))]
    async fn select(&self, query: &str, data_description: &str) -> Result<FindFunction, PipelineError> {
        let prompt = prompts::selection(query, data_description, registry::functions());
        llm::invoke_structured(&self.model, &prompt, self.max_attempts)
            .await
            .map_err(llm_failure("function selection"))
    }

    /// Extracts parameters for `function`. A reply that cannot be bound to
    /// the function's parameter type is rejected and retried.
    #[tracing::instrument(skip(self, query))]
    async fn extract(&self, query: &str, function: FunctionName) -> Result<FunctionCall, PipelineError> {
        let name = function.as_str();
        let descriptor = registry::describe(name)?;
        let options = registry::enumerated_options(name)?;
        let schema = registry::parameter_schema(name)?;
        let prompt = prompts::extraction(query, descriptor, &options);

        llm::invoke(&self.model, &prompt, &schema, self.max_attempts, |value| {
            let Value::Object(parameters) = value else {
                return Err("expected a JSON object of parameters".to_string());
            };
            debug!(?parameters, "Extracted parameters");
            execute::bind(function, parameters).map_err(|e| e.to_string())
        })
        .await
        .map_err(llm_failure("parameter extraction"))
    }

    fn execute(&self, call: &FunctionCall) -> Result<AnalysisResult, PipelineError> {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        Ok(registry::execute(&self.dataset, call, today)?)
    }

    #[tracing::instrument(skip(self, query, result))]
    async fn answer(&self, query: &str, result: &AnalysisResult) -> Result<FinalAnswer, PipelineError> {
        let data = serde_json::to_string_pretty(result)?;
        debug!(bytes = data.len(), "Summarizing result");
        llm::invoke_structured(&self.model, &prompts::answer(query, &data), self.max_attempts)
            .await
            .map_err(llm_failure("answer synthesis"))
    }
}
