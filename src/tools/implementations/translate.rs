//! Translate tool

use crate::errors::ToolError;
use crate::net::ChatClient;
use crate::tools::types::{parse_input, require_text, Operation, OperationContext};
use crate::types::Request;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str =
    "You translate succinctly into the requested language. Keep meaning; preserve names; no explanations.";

#[derive(Debug, Deserialize)]
struct RawTranslateInput {
    text: Option<String>,
    target_language: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranslateInput {
    pub text: String,
    pub target_language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslateOutput {
    pub translated: String,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TranslateOperation;

#[async_trait]
impl Operation for TranslateOperation {
    type Input = TranslateInput;
    type Output = TranslateOutput;

    fn name(&self) -> &'static str {
        "translate"
    }

    fn validate(&self, request: &Request) -> Result<TranslateInput, ToolError> {
        let raw: RawTranslateInput = parse_input(request)?;
        Ok(TranslateInput {
            text: require_text("text", raw.text)?,
            target_language: require_text("target_language", raw.target_language)?
                .trim()
                .to_string(),
        })
    }

    async fn execute(
        &self,
        input: TranslateInput,
        ctx: OperationContext,
    ) -> Result<TranslateOutput, ToolError> {
        let api_key = ctx.credentials.openai_api_key()?;
        let client = ChatClient::new(&ctx.openai);
        let user = format!("Translate into {}:\n\n{}", input.target_language, input.text);

        let translated = client
            .complete(&ctx.fetcher(), api_key, SYSTEM_PROMPT, &user)
            .await?
            .unwrap_or_default();

        Ok(TranslateOutput { translated })
    }
}
