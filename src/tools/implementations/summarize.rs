//! Summarize tool: chat-completions summary within a word budget

use crate::errors::ToolError;
use crate::net::ChatClient;
use crate::tools::types::{parse_input, require_text, whole_number, Operation, OperationContext};
use crate::types::Request;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_WORDS: u32 = 200;
pub const MAX_WORDS_LIMIT: u32 = 5_000;

const SYSTEM_PROMPT: &str =
    "You are a precise technical summarizer. Output within the requested word budget.";

#[derive(Debug, Deserialize)]
struct RawSummarizeInput {
    text: Option<String>,
    max_words: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummarizeInput {
    pub text: String,
    pub max_words: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarizeOutput {
    pub summary: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SummarizeOperation;

#[async_trait]
impl Operation for SummarizeOperation {
    type Input = SummarizeInput;
    type Output = SummarizeOutput;

    fn name(&self) -> &'static str {
        "summarize"
    }

    fn validate(&self, request: &Request) -> Result<SummarizeInput, ToolError> {
        let raw: RawSummarizeInput = parse_input(request)?;
        let text = require_text("text", raw.text)?;

        let max_words = match raw.max_words {
            None => DEFAULT_MAX_WORDS,
            Some(n) => match whole_number(n) {
                Some(words) if (1..=MAX_WORDS_LIMIT as i64).contains(&words) => words as u32,
                _ => {
                    return Err(ToolError::input_invalid(format!(
                        "`max_words` must be a whole number between 1 and {}, got {}",
                        MAX_WORDS_LIMIT, n
                    )))
                }
            },
        };

        Ok(SummarizeInput { text, max_words })
    }

    async fn execute(
        &self,
        input: SummarizeInput,
        ctx: OperationContext,
    ) -> Result<SummarizeOutput, ToolError> {
        let api_key = ctx.credentials.openai_api_key()?;
        let client = ChatClient::new(&ctx.openai);
        let user = format!(
            "Summarize in <= {} words:\n\n{}",
            input.max_words, input.text
        );

        let content = client
            .complete(&ctx.fetcher(), api_key, SYSTEM_PROMPT, &user)
            .await?
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| ToolError::decode_failed("Model returned empty content"))?;

        Ok(SummarizeOutput { summary: content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, HttpConfig, OpenAiConfig};
    use crate::errors::ErrorCode;
    use crate::net::ConnectionPool;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(value: serde_json::Value) -> Request {
        value.as_object().cloned().unwrap()
    }

    fn context(base_url: String, credentials: Credentials) -> OperationContext {
        let pool = ConnectionPool::new(&HttpConfig::default()).unwrap();
        OperationContext::new(pool, CancellationToken::new())
            .with_credentials(credentials)
            .with_openai(OpenAiConfig {
                base_url,
                ..OpenAiConfig::default()
            })
    }

    #[test]
    fn test_validate_defaults_max_words() {
        let input = SummarizeOperation
            .validate(&request(json!({"text": "long text"})))
            .unwrap();
        assert_eq!(input.max_words, DEFAULT_MAX_WORDS);
    }

    #[test]
    fn test_validate_accepts_whole_float() {
        let input = SummarizeOperation
            .validate(&request(json!({"text": "t", "max_words": 150.0})))
            .unwrap();
        assert_eq!(input.max_words, 150);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        for bad in [json!(0), json!(-5), json!(100_000), json!(12.5)] {
            let err = SummarizeOperation
                .validate(&request(json!({"text": "t", "max_words": bad})))
                .unwrap_err();
            assert_eq!(err.code, ErrorCode::InputInvalid);
        }
    }

    #[test]
    fn test_validate_requires_text() {
        let err = SummarizeOperation.validate(&request(json!({}))).unwrap_err();
        assert_eq!(err.code, ErrorCode::InputInvalid);
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let ctx = context("http://127.0.0.1:1".to_string(), Credentials::default());
        let input = SummarizeInput {
            text: "t".to_string(),
            max_words: 10,
        };

        let err = SummarizeOperation.execute(input, ctx.clone()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InputInvalid);
        assert_eq!(ctx.pool.requests_issued(), 0);
    }

    #[tokio::test]
    async fn test_summary_from_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("Summarize in <= 150 words"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": "A short summary."}}]
            })))
            .mount(&server)
            .await;

        let ctx = context(server.uri(), Credentials::default().with_openai_api_key("k"));
        let input = SummarizeInput {
            text: "Alan Turing was a mathematician.".to_string(),
            max_words: 150,
        };

        let out = SummarizeOperation.execute(input, ctx).await.unwrap();
        assert_eq!(out.summary, "A short summary.");
    }

    #[tokio::test]
    async fn test_empty_summary_is_decode_failed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"content": ""}}]
            })))
            .mount(&server)
            .await;

        let ctx = context(server.uri(), Credentials::default().with_openai_api_key("k"));
        let input = SummarizeInput {
            text: "t".to_string(),
            max_words: 5,
        };

        let err = SummarizeOperation.execute(input, ctx).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DecodeFailed);
    }
}
