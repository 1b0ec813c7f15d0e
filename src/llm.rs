use async_trait::async_trait;
use serde_json::Value;

use crate::config::{check_timeout, require_api_key, ClerkConfig};
use crate::error::{ClerkError, Result};
use crate::form::validate_input;
use crate::gemini::{Content, GeminiTransport, GenerateContentRequest, GenerationConfig};
use crate::model::{clerk_response_typedef, ClerkInput, ClerkResponse, Platform};
use crate::schema::{to_wire_schema, validate};

pub const SYSTEM_INSTRUCTION: &str = "
You are Clerk, an advanced assistant embedded in a messaging application. Your job is to help the user draft, adapt, and send one message across multiple platforms.
You must be precise, safe, and platform-aware.

Core goals:
1. Capture intent: understand what the user wants to communicate, to whom, and why.
2. Generate variants: produce platform-optimized message versions that keep the same meaning.
3. Respect constraints: character limits, tone, formatting, etiquette, and compliance per platform.
4. Prepare payloads: output structured data the app can send via integrations.
5. Minimize friction: ask only essential clarifying questions; otherwise make reasonable assumptions and proceed.

Platform rules (follow strictly):
* Email: include a clear subject, greeting, short paragraphs, and a sign-off if appropriate.
* SMS: ultra-compact, no heavy punctuation, links only if essential.
* WhatsApp/Telegram: friendly readability, short lines, light emojis only if allowed.
* Slack/Discord: concise, can use bullets, markdown if allowed.
* LinkedIn DM: polite, professional, no hype, clear ask + easy next step.
* X/Twitter DM: very short, direct, one action.

Behavioral rules:
* If required details are missing, ask up to 2 clarifying questions.
* Otherwise proceed with assumptions and list them.
* Never invent real personal data.
* If the user requests harassment, scams, impersonation, or anything illegal: refuse and propose a safe rewrite.
* Style: Crisp. Avoid fluff. Keep meaning consistent.
";

const MAX_CLARIFYING_QUESTIONS: usize = 2;

/// One request/response exchange with a generative endpoint.
///
/// Returns the model's text output (possibly empty).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn generate_content(
        &self,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<String>;
}

pub struct GenerationClient<T> {
    transport: T,
    api_key: Option<String>,
}

impl GenerationClient<GeminiTransport> {
    pub fn from_config(config: &ClerkConfig) -> Result<Self> {
        let timeout = check_timeout(config.timeout)?;
        let transport = GeminiTransport::new(&config.base_url, &config.model, timeout)?;
        Ok(Self::new(transport, config.api_key.clone()))
    }
}

impl<T: Transport> GenerationClient<T> {
    pub fn new(transport: T, api_key: Option<String>) -> Self {
        Self { transport, api_key }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Draft one message variant per target. No retries, no caching.
    pub async fn generate(&self, input: &ClerkInput) -> Result<ClerkResponse> {
        let api_key = require_api_key(self.api_key.as_deref())?;
        validate_input(input)?;

        let request = build_request(input)?;
        tracing::info!(targets = input.targets.len(), "requesting message variants");

        let text = self
            .transport
            .generate_content(api_key, &request)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "generation request failed"))?;

        let response = parse_response(&text, input)
            .inspect_err(|e| tracing::error!(error = %e, "generation produced an unusable result"))?;
        tracing::info!(
            variants = response.message_variants.len(),
            questions = response.clarifying_questions.len(),
            "message variants generated"
        );
        Ok(response)
    }
}

/// Assemble the full wire request for an input.
pub fn build_request(input: &ClerkInput) -> Result<GenerateContentRequest> {
    let user_text = serde_json::to_string(input)
        .map_err(|e| ClerkError::Validation(format!("input is not serializable: {e}")))?;

    Ok(GenerateContentRequest {
        system_instruction: Content::text(None, SYSTEM_INSTRUCTION),
        contents: vec![Content::text(Some("user"), user_text)],
        generation_config: GenerationConfig {
            response_mime_type: "application/json".into(),
            response_schema: to_wire_schema(&clerk_response_typedef()),
        },
    })
}

/// Turn the endpoint's text into a checked response for `input`.
pub fn parse_response(text: &str, input: &ClerkInput) -> Result<ClerkResponse> {
    if text.trim().is_empty() {
        return Err(ClerkError::generation("No response text generated"));
    }

    let cleaned = clean_json_response(text);
    let value: Value = serde_json::from_str(cleaned).map_err(|e| {
        ClerkError::generation_with_raw(format!("response is not valid JSON: {e}"), text)
    })?;

    if let Err(issues) = validate(&clerk_response_typedef(), &value) {
        return Err(ClerkError::schema_mismatch(&issues, text));
    }

    let response: ClerkResponse = serde_json::from_value(value).map_err(|e| {
        ClerkError::generation_with_raw(format!("response does not decode: {e}"), text)
    })?;

    check_contract(&response, input).map_err(|msg| ClerkError::generation_with_raw(msg, text))?;
    Ok(response)
}

fn check_contract(response: &ClerkResponse, input: &ClerkInput) -> std::result::Result<(), String> {
    if response.message_variants.len() != input.targets.len() {
        return Err(format!(
            "expected {} message variants, got {}",
            input.targets.len(),
            response.message_variants.len()
        ));
    }

    for (idx, (variant, target)) in response.message_variants.iter().zip(&input.targets).enumerate() {
        if variant.platform.parse::<Platform>() != Ok(target.platform) {
            return Err(format!(
                "variant {idx} is for platform {:?}, target is {}",
                variant.platform, target.platform
            ));
        }
        let (got, want) = (&variant.recipient, &target.recipient);
        if got.name.trim() != want.name.trim()
            || got.handle_or_address.trim() != want.handle_or_address.trim()
        {
            return Err(format!(
                "variant {idx} is addressed to {:?} <{}>, target is {:?} <{}>",
                got.name, got.handle_or_address, want.name, want.handle_or_address
            ));
        }
        if variant.char_count_mismatch() {
            tracing::warn!(
                variant = idx,
                reported = variant.char_count,
                computed = variant.computed_char_count(),
                "reported char_count does not match body length"
            );
        }
    }

    if response.clarifying_questions.len() > MAX_CLARIFYING_QUESTIONS {
        tracing::warn!(
            count = response.clarifying_questions.len(),
            "more clarifying questions than allowed"
        );
    }
    Ok(())
}

/// Strip markdown code fences some models wrap around JSON.
fn clean_json_response(response: &str) -> &str {
    let mut cleaned = response.trim();

    if let Some(rest) = cleaned.strip_prefix("```") {
        // Drop the info string (```json) up to the first newline.
        cleaned = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest,
        };
        cleaned = cleaned.trim_end();
        if let Some(body) = cleaned.strip_suffix("```") {
            cleaned = body;
        }
    }

    cleaned.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{build_input, FormState};

    #[test]
    fn system_instruction_keeps_the_policy() {
        assert!(SYSTEM_INSTRUCTION.contains("You are Clerk"));
        assert!(SYSTEM_INSTRUCTION.contains("ask up to 2 clarifying questions"));
        assert!(SYSTEM_INSTRUCTION.contains("X/Twitter DM: very short, direct, one action."));
    }

    #[test]
    fn request_carries_input_as_single_user_turn() {
        let input = build_input(&FormState::default()).unwrap();
        let req = build_request(&input).unwrap();
        assert_eq!(req.contents.len(), 1);
        assert_eq!(req.contents[0].role.as_deref(), Some("user"));
        let text = req.contents[0].parts[0].text.as_deref().unwrap();
        let echoed: ClerkInput = serde_json::from_str(text).unwrap();
        assert_eq!(echoed, input);
        assert_eq!(req.generation_config.response_mime_type, "application/json");
        assert_eq!(req.system_instruction.parts[0].text.as_deref(), Some(SYSTEM_INSTRUCTION));
    }

    #[test]
    fn fences_are_stripped() {
        assert_eq!(clean_json_response("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(clean_json_response("  {\"a\":1} "), "{\"a\":1}");
        assert_eq!(clean_json_response("```{}```"), "{}");
    }

    #[test]
    fn blank_text_is_a_generation_error() {
        let input = build_input(&FormState::default()).unwrap();
        let err = parse_response("  ", &input).unwrap_err();
        assert_eq!(err.to_string(), "generation error: No response text generated");
    }
}
