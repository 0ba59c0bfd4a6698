//! Tool execution types
//!
//! The [`Operation`] trait is the seam between the runner and a tool's
//! business logic. An operation validates its own input synchronously and
//! then executes with an [`OperationContext`] that carries the connection
//! pool and the cancellation token owned by the runner.

use crate::config::{Credentials, OpenAiConfig};
use crate::errors::ToolError;
use crate::net::{ConnectionPool, Fetcher};
use crate::types::Request;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// A tool's business logic behind the process protocol
#[async_trait]
pub trait Operation: Send + Sync + 'static {
    /// Validated, typed projection of the request
    type Input: Send + 'static;

    /// Result record merged into the success envelope
    type Output: Serialize + Send + 'static;

    /// Tool name used in logs
    fn name(&self) -> &'static str;

    /// Validate the request. Must not perform I/O.
    fn validate(&self, request: &Request) -> Result<Self::Input, ToolError>;

    /// Run the operation. Network calls must go through `ctx.fetcher()`
    /// so the execution deadline can cancel them.
    async fn execute(
        &self,
        input: Self::Input,
        ctx: OperationContext,
    ) -> Result<Self::Output, ToolError>;
}

/// Resources handed to an executing operation
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub pool: ConnectionPool,
    pub cancel: CancellationToken,
    pub credentials: Credentials,
    pub openai: OpenAiConfig,
}

impl OperationContext {
    pub fn new(pool: ConnectionPool, cancel: CancellationToken) -> Self {
        Self {
            pool,
            cancel,
            credentials: Credentials::default(),
            openai: OpenAiConfig::default(),
        }
    }

    /// Set credentials
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Set chat endpoint settings
    pub fn with_openai(mut self, openai: OpenAiConfig) -> Self {
        self.openai = openai;
        self
    }

    /// HTTP helper bound to this invocation's pool and token
    pub fn fetcher(&self) -> Fetcher<'_> {
        Fetcher::new(&self.pool, &self.cancel)
    }
}

/// Deserialize the request into a raw input record
pub fn parse_input<T: DeserializeOwned>(request: &Request) -> Result<T, ToolError> {
    serde_json::from_value(serde_json::Value::Object(request.clone()))
        .map_err(|e| ToolError::input_invalid(format!("Invalid input: {}", e)))
}

/// Require a non-blank string field
pub fn require_text(field: &str, value: Option<String>) -> Result<String, ToolError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(ToolError::input_invalid(format!("`{}` is required", field))
            .with_details(serde_json::json!({ "field": field }))),
    }
}

/// Integer value of a JSON number with no fractional part (`256` or `256.0`)
pub fn whole_number(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

/// Tool schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name
    pub name: String,

    /// Tool description
    pub description: String,

    /// Input schema (JSON Schema)
    pub inputs: serde_json::Value,

    /// Output schema (JSON Schema) of the success envelope fields
    pub outputs: serde_json::Value,

    /// Whether the tool reaches the network
    pub network: bool,
}

impl ToolSchema {
    /// Create new tool schema
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        inputs: serde_json::Value,
        outputs: serde_json::Value,
        network: bool,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            inputs,
            outputs,
            network,
        }
    }
}
