//! The text-generation boundary.
//!
//! Everything above this module sees the model as `generate(system, prompt)
//! -> text`. Timeouts and retries belong to whoever calls these functions.

use std::future::Future;

use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message, SystemContentBlock,
};
use goldrock_core::models::usage::TokenUsage;
use tracing::{debug, info};

use crate::error::BedrockError;
use crate::tokens;

/// Raw model output and what it cost.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub usage: TokenUsage,
}

/// A model that turns a system prompt and one user message into text.
pub trait TextGenerator: Send + Sync {
    fn model_id(&self) -> &str;

    fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> impl Future<Output = Result<Generation, BedrockError>> + Send;
}

/// [`TextGenerator`] over the Bedrock Converse API.
#[derive(Debug, Clone)]
pub struct BedrockGenerator {
    client: Client,
    model_id: String,
    max_tokens: i32,
    temperature: f32,
}

impl BedrockGenerator {
    pub fn new(client: Client, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
            max_tokens: 4096,
            temperature: 0.4,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: i32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl TextGenerator for BedrockGenerator {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn generate(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<Generation, BedrockError> {
        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(user_message.to_string()))
            .build()
            .map_err(|e| BedrockError::Invocation(e.to_string()))?;

        info!(model_id = %self.model_id, prompt_len = user_message.len(), "invoking model");

        let response = self
            .client
            .converse()
            .model_id(&self.model_id)
            .system(SystemContentBlock::Text(system_prompt.to_string()))
            .messages(message)
            .inference_config(
                InferenceConfiguration::builder()
                    .max_tokens(self.max_tokens)
                    .temperature(self.temperature)
                    .build(),
            )
            .send()
            .await
            .map_err(|e| BedrockError::Invocation(e.into_service_error().to_string()))?;

        let output_message = response
            .output()
            .and_then(|o| o.as_message().ok())
            .ok_or_else(|| BedrockError::ResponseParse("no message in response".to_string()))?;

        let text = output_message
            .content()
            .iter()
            .filter_map(|block| {
                if let ContentBlock::Text(t) = block {
                    Some(t.as_str())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        let usage = response
            .usage()
            .map(|u| tokens::priced_usage(&self.model_id, u))
            .unwrap_or_default();

        debug!(
            model_id = %self.model_id,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "model responded"
        );

        Ok(Generation { text, usage })
    }
}
