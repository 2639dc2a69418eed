use goldrock_core::models::usage::{ModelPricing, TokenUsage};

/// Convert Bedrock Converse usage into priced token usage.
///
/// Unknown models are reported with a cost of zero.
pub fn priced_usage(
    model_id: &str,
    usage: &aws_sdk_bedrockruntime::types::TokenUsage,
) -> TokenUsage {
    let input = u64::try_from(usage.input_tokens).unwrap_or(0);
    let output = u64::try_from(usage.output_tokens).unwrap_or(0);
    match get_pricing(model_id) {
        Some(pricing) => pricing.price(input, output),
        None => TokenUsage {
            input_tokens: input,
            output_tokens: output,
            cost_usd: 0.0,
        },
    }
}

/// Known model pricing (per million tokens).
/// These are approximate and should be updated as pricing changes.
pub fn get_pricing(model_id: &str) -> Option<ModelPricing> {
    match model_id {
        id if id.contains("claude-opus-4") => Some(ModelPricing {
            input_per_million: 15.0,
            output_per_million: 75.0,
        }),
        id if id.contains("claude-sonnet-4") => Some(ModelPricing {
            input_per_million: 3.0,
            output_per_million: 15.0,
        }),
        id if id.contains("claude-haiku") => Some(ModelPricing {
            input_per_million: 0.80,
            output_per_million: 4.0,
        }),
        _ => None,
    }
}
