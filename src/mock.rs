//! Offline stand-in for the `generateContent` endpoint.
//!
//! Drafts one deterministic variant per target of the submitted input, so the
//! whole pipeline can run without credentials or network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::gemini::GenerateContentRequest;
use crate::model::{
    ClerkInput, ClerkResponse, MessageVariant, Platform, QualityChecks, SendPayload, Target,
};

#[derive(Clone, Default)]
pub struct MockState {
    attempt_count: Arc<AtomicUsize>,
    fail_attempts: usize,
    delay: Option<Duration>,
}

impl MockState {
    /// The first `fail_attempts` calls answer with malformed JSON.
    pub fn new(fail_attempts: usize) -> Self {
        Self {
            attempt_count: Arc::new(AtomicUsize::new(0)),
            fail_attempts,
            delay: None,
        }
    }

    /// Hold every answer back for `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn attempts(&self) -> usize {
        self.attempt_count.load(Ordering::SeqCst)
    }
}

pub fn router(state: MockState) -> Router {
    Router::new()
        .route("/v1beta/models/:model_action", post(generate_content))
        .with_state(state)
}

async fn generate_content(
    State(state): State<MockState>,
    Path(model_action): Path<String>,
    headers: HeaderMap,
    Json(request): Json<GenerateContentRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Some(model) = model_action.strip_suffix(":generateContent") else {
        return Err(error(StatusCode::NOT_FOUND, "unknown method"));
    };
    let has_key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|k| !k.is_empty());
    if !has_key {
        return Err(error(StatusCode::UNAUTHORIZED, "API key not valid"));
    }

    let attempt = state.attempt_count.fetch_add(1, Ordering::SeqCst) + 1;
    tracing::info!(model, attempt, "mock generateContent");
    if let Some(delay) = state.delay {
        tokio::time::sleep(delay).await;
    }

    let user_text: String = request
        .contents
        .iter()
        .filter(|c| c.role.as_deref() == Some("user"))
        .flat_map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()))
        .collect();
    let input: ClerkInput = serde_json::from_str(&user_text).map_err(|e| {
        error(StatusCode::BAD_REQUEST, &format!("user turn is not a ClerkInput: {e}"))
    })?;

    let text = if attempt <= state.fail_attempts {
        tracing::info!("mock returning malformed JSON");
        r#"{"message_variants": [ {"platform": "email", missing_fields: true}"#.to_string()
    } else {
        serde_json::to_string(&draft_response(&input))
            .map_err(|e| error(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()))?
    };

    Ok(Json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{"text": text}]},
            "finishReason": "STOP"
        }],
        "modelVersion": model
    })))
}

fn error(status: StatusCode, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({"error": {"code": status.as_u16(), "message": message}})),
    )
}

/// Deterministic drafts honoring each target's length limit.
pub fn draft_response(input: &ClerkInput) -> ClerkResponse {
    let mut assumptions = Vec::new();
    if input.message_context.dates_times.is_empty() {
        assumptions.push("No specific date or time was given.".to_string());
    }

    ClerkResponse {
        clarifying_questions: Vec::new(),
        assumptions,
        message_variants: input.targets.iter().map(|t| draft_variant(input, t)).collect(),
        safety_notes: Vec::new(),
        quality_checks: QualityChecks {
            intent_preserved: true,
            platform_fit: true,
            no_private_data_leak: true,
        },
    }
}

fn draft_variant(input: &ClerkInput, target: &Target) -> MessageVariant {
    let ctx = &input.message_context;
    let mut lines = Vec::new();

    let greeting_name = if target.recipient.name.is_empty() {
        "there"
    } else {
        target.recipient.name.as_str()
    };
    if target.platform == Platform::Email {
        lines.push(format!("Hi {greeting_name},"));
        lines.push(String::new());
    }
    lines.push(input.user_goal.clone());
    let bullet = if target.constraints.allow_markdown { "- " } else { "" };
    for point in ctx.key_points.iter().chain(&ctx.must_include) {
        lines.push(format!("{bullet}{point}"));
    }
    if target.platform == Platform::Email && !input.user_preferences.sign_off.is_empty() {
        lines.push(String::new());
        lines.push(input.user_preferences.sign_off.clone());
    }

    let limit = target.constraints.max_chars.get() as usize;
    let body: String = lines.join("\n").chars().take(limit).collect();
    let subject = if target.platform == Platform::Email {
        if ctx.topic.is_empty() {
            "Quick update".to_string()
        } else {
            ctx.topic.clone()
        }
    } else {
        String::new()
    };

    MessageVariant {
        platform: target.platform.as_str().to_string(),
        recipient: target.recipient.clone(),
        subject: subject.clone(),
        char_count: body.chars().count() as u64,
        send_payload: SendPayload {
            platform: target.platform.as_str().to_string(),
            to: target.recipient.handle_or_address.clone(),
            subject,
            text: body.clone(),
        },
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{build_input, FormState, TargetUpdate};

    #[test]
    fn one_variant_per_target_within_limits() {
        let mut form = FormState::default();
        let sms = form.add_target();
        form.update_target(sms, TargetUpdate::Platform(Platform::Sms)).unwrap();
        form.key_points = "x".repeat(400);
        let input = build_input(&form).unwrap();

        let resp = draft_response(&input);
        assert_eq!(resp.message_variants.len(), 2);
        assert_eq!(resp.message_variants[0].platform, "email");
        assert_eq!(resp.message_variants[0].subject, "Meeting reschedule");
        let sms = &resp.message_variants[1];
        assert_eq!(sms.platform, "sms");
        assert_eq!(sms.subject, "");
        assert!(sms.body.chars().count() <= 160);
        assert!(!sms.char_count_mismatch());
    }
}
