use crate::http::{HttpClient, post_json};
use crate::llm::{LanguageModel, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// OpenAI-compatible chat-completions model.
///
/// Works against any endpoint that accepts `POST {base_url}/chat/completions`
/// with a JSON response format, including Gemini's compatibility layer and
/// local Ollama servers.
pub struct ChatModel {
    client: Box<dyn HttpClient>,
    endpoint: String,
    model: String,
}

impl ChatModel {
    pub fn new(client: Box<dyn HttpClient>, base_url: &str, model: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl ChatResponse {
    fn into_content(self) -> Result<String, LlmError> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("response carried no message content".to_string()))
    }
}

#[async_trait]
impl LanguageModel for ChatModel {
    #[tracing::instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let response: ChatResponse =
            post_json(&*self.client, &self.endpoint, &self.request(prompt))
                .await
                .map_err(LlmError::Transport)?;
        response.into_content()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Unused;

    #[async_trait]
    impl HttpClient for Unused {
        async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            unreachable!("not called")
        }
    }

    #[test]
    fn test_endpoint_and_request_body() {
        let model = ChatModel::new(Box::new(Unused), "http://localhost:11434/v1/", "llama3");
        assert_eq!(model.endpoint(), "http://localhost:11434/v1/chat/completions");

        let body = serde_json::to_value(model.request("hello")).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "llama3",
                "messages": [{"role": "user", "content": "hello"}],
                "temperature": 0.0,
                "response_format": {"type": "json_object"}
            })
        );
    }

    #[test]
    fn test_reads_first_choice() {
        let response: ChatResponse = serde_json::from_value(json!({
            "id": "x",
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "{\"response\": \"hi\"}"}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ]
        }))
        .unwrap();
        assert_eq!(response.into_content().unwrap(), "{\"response\": \"hi\"}");
    }

    #[test]
    fn test_missing_content_is_a_parse_error() {
        let response: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(response.into_content(), Err(LlmError::Parse(_))));
    }
}
