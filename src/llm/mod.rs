//! Language-model capability used by the dispatch pipeline.
//!
//! A [`LanguageModel`] turns a prompt into raw text. [`invoke`] and
//! [`invoke_structured`] wrap it with the JSON contract the pipeline relies
//! on: the target schema is embedded in the prompt, the reply is parsed and
//! checked, and rejected replies are retried until the attempt budget runs
//! out.

pub mod chat;

pub use chat::ChatModel;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("model request failed: {0:#}")]
    Transport(anyhow::Error),
    #[error("unusable model reply: {0}")]
    Parse(String),
    #[error("no acceptable reply after {attempts} attempts: {last}")]
    ExhaustedRetries { attempts: u32, last: String },
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Sends `prompt` and returns the model's raw reply.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

#[async_trait]
impl<M: LanguageModel + ?Sized> LanguageModel for Box<M> {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).complete(prompt).await
    }
}

#[async_trait]
impl<M: LanguageModel + ?Sized> LanguageModel for Arc<M> {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        (**self).complete(prompt).await
    }
}

/// A reply shape with a fixed JSON schema.
pub trait StructuredOutput: DeserializeOwned {
    fn schema() -> Value;

    /// Checks the parsed reply beyond what the schema expresses.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Invokes `model` until a reply parses into `T` and validates.
pub async fn invoke_structured<T, M>(
    model: &M,
    prompt: &str,
    max_attempts: u32,
) -> Result<T, LlmError>
where
    T: StructuredOutput,
    M: LanguageModel + ?Sized,
{
    invoke(model, prompt, &T::schema(), max_attempts, |value| {
        let reply: T = serde_json::from_value(value).map_err(|e| e.to_string())?;
        reply.validate()?;
        Ok(reply)
    })
    .await
}

/// Invokes `model` with `schema` embedded in the prompt until `accept` takes
/// the parsed JSON reply.
///
/// Each rejection is fed back into the next prompt. Transport failures use
/// up an attempt too and back off before retrying.
pub async fn invoke<M, T, F>(
    model: &M,
    prompt: &str,
    schema: &Value,
    max_attempts: u32,
    mut accept: F,
) -> Result<T, LlmError>
where
    M: LanguageModel + ?Sized,
    F: FnMut(Value) -> Result<T, String>,
{
    let attempts = max_attempts.max(1);
    let base = with_schema(prompt, schema);
    let mut request = base.clone();
    let mut last = String::new();

    for attempt in 1..=attempts {
        debug!(attempt, "Invoking language model");

        let reply = match model.complete(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(attempt, error = %e, "Language model call failed");
                last = e.to_string();
                if attempt < attempts {
                    tokio::time::sleep(Duration::from_millis(250 << attempt.min(4))).await;
                }
                continue;
            }
        };
        debug!(attempt, reply = %reply, "Model reply");

        match parse_reply(&reply).and_then(|value| accept(value).map_err(LlmError::Parse)) {
            Ok(accepted) => return Ok(accepted),
            Err(e) => {
                warn!(attempt, error = %e, "Model reply rejected");
                last = e.to_string();
                request = format!(
                    "{base}\n\nYour previous reply was rejected ({last}). \
                     Reply again with only the JSON object."
                );
            }
        }
    }

    Err(LlmError::ExhaustedRetries { attempts, last })
}

fn with_schema(prompt: &str, schema: &Value) -> String {
    format!(
        "{prompt}\n\nRespond with a single JSON object that conforms to this JSON schema:\n{schema}"
    )
}

/// Parses the JSON object in a reply, tolerating fenced code blocks and
/// surrounding prose.
pub fn parse_reply(reply: &str) -> Result<Value, LlmError> {
    let text = strip_fences(reply.trim());
    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(LlmError::Parse("reply contains no JSON object".to_string()));
    };
    if end < start {
        return Err(LlmError::Parse("reply contains no JSON object".to_string()));
    }
    serde_json::from_str(&text[start..=end]).map_err(|e| LlmError::Parse(e.to_string()))
}

fn strip_fences(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop the info string, e.g. ```json
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Scripted {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<&str, &str>>) -> Self {
            let replies = replies
                .into_iter()
                .map(|r| {
                    r.map(str::to_string)
                        .map_err(|e| LlmError::Transport(anyhow::anyhow!(e.to_string())))
                })
                .collect();
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for Scripted {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(LlmError::Parse("script exhausted".into())))
        }
    }

    #[derive(Debug, Deserialize)]
    struct Verdict {
        ok: bool,
    }

    impl StructuredOutput for Verdict {
        fn schema() -> Value {
            json!({"type": "object", "properties": {"ok": {"type": "boolean"}}, "required": ["ok"]})
        }

        fn validate(&self) -> Result<(), String> {
            if self.ok { Ok(()) } else { Err("ok must be true".into()) }
        }
    }

    #[test]
    fn test_parse_reply_forms() {
        assert_eq!(parse_reply(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
        assert_eq!(
            parse_reply("```json\n{\"a\": 2}\n```").unwrap(),
            json!({"a": 2})
        );
        assert_eq!(
            parse_reply("Sure! Here it is: {\"a\": 3} Hope that helps.").unwrap(),
            json!({"a": 3})
        );
        assert!(matches!(parse_reply("no json here"), Err(LlmError::Parse(_))));
    }

    #[tokio::test]
    async fn test_schema_is_embedded_and_first_valid_reply_wins() {
        let model = Scripted::new(vec![Ok(r#"{"ok": true}"#)]);
        let verdict: Verdict = invoke_structured(&model, "Decide.", 3).await.unwrap();

        assert!(verdict.ok);
        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].starts_with("Decide."));
        assert!(prompts[0].contains("\"required\":[\"ok\"]"));
    }

    #[tokio::test]
    async fn test_rejections_are_retried_with_feedback() {
        let model = Scripted::new(vec![Ok("garbage"), Ok(r#"{"ok": false}"#), Ok(r#"{"ok": true}"#)]);
        let verdict: Verdict = invoke_structured(&model, "Decide.", 3).await.unwrap();

        assert!(verdict.ok);
        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[2].contains("ok must be true"));
    }

    #[tokio::test]
    async fn test_exhausted_retries() {
        let model = Scripted::new(vec![Ok("{}"), Err("connection reset"), Ok(r#"{"ok": 1}"#)]);
        let err = invoke_structured::<Verdict, _>(&model, "Decide.", 3)
            .await
            .unwrap_err();

        match err {
            LlmError::ExhaustedRetries { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(last.contains("invalid type"), "{last}");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
