use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::{FieldDef, TypeDef};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relationship {
    Customer,
    Friend,
    Coworker,
    Boss,
    Public,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Friendly,
    Formal,
    Urgent,
    Apologetic,
    Salesy,
    Neutral,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Email,
    Sms,
    Whatsapp,
    Telegram,
    Slack,
    Discord,
    LinkedinDm,
    XDm,
}

impl Platform {
    pub const ALL: [Platform; 8] = [
        Platform::Email,
        Platform::Sms,
        Platform::Whatsapp,
        Platform::Telegram,
        Platform::Slack,
        Platform::Discord,
        Platform::LinkedinDm,
        Platform::XDm,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Email => "email",
            Platform::Sms => "sms",
            Platform::Whatsapp => "whatsapp",
            Platform::Telegram => "telegram",
            Platform::Slack => "slack",
            Platform::Discord => "discord",
            Platform::LinkedinDm => "linkedin_dm",
            Platform::XDm => "x_dm",
        }
    }

    /// Constraint profile a target gets when this platform is selected.
    pub fn default_constraints(self) -> TargetConstraint {
        let (max_chars, allow_emojis, allow_markdown) = match self {
            Platform::Email => (10_000, true, false),
            Platform::Sms => (160, false, false),
            Platform::Whatsapp => (1_000, true, true),
            Platform::Telegram => (4_096, true, true),
            Platform::Slack => (4_000, true, true),
            Platform::Discord => (2_000, true, true),
            Platform::LinkedinDm => (2_000, true, false),
            Platform::XDm => (1_000, true, false),
        };
        TargetConstraint {
            max_chars: NonZeroU32::new(max_chars).unwrap_or(NonZeroU32::MIN),
            allow_emojis,
            allow_markdown,
            allow_links: true,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for UnknownVariant {}

/// Parses through the serde wire names so there is one spelling per variant.
fn parse_wire_name<T: serde::de::DeserializeOwned>(
    kind: &'static str,
    s: &str,
) -> Result<T, UnknownVariant> {
    let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    serde_json::from_value(serde_json::Value::String(normalized)).map_err(|_| UnknownVariant {
        kind,
        value: s.to_string(),
    })
}

impl FromStr for Platform {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire_name("platform", s)
    }
}

impl FromStr for Relationship {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire_name("relationship", s)
    }
}

impl FromStr for Tone {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_wire_name("tone", s)
    }
}

/// Optional generator fields may come back as `null`; treat that as absent.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub handle_or_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConstraint {
    pub max_chars: NonZeroU32,
    pub allow_emojis: bool,
    pub allow_markdown: bool,
    pub allow_links: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub platform: Platform,
    pub recipient: Recipient,
    pub constraints: TargetConstraint,
}

impl Target {
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            platform,
            recipient: Recipient::default(),
            constraints: platform.default_constraints(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audience {
    pub relationship: Relationship,
    pub tone: Tone,
    pub language: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContext {
    pub topic: String,
    pub key_points: Vec<String>,
    pub must_include: Vec<String>,
    pub must_avoid: Vec<String>,
    pub dates_times: Vec<String>,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreferences {
    pub sign_off: String,
    pub brand_voice_notes: String,
}

/// The document sent as the user turn of a generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClerkInput {
    pub user_goal: String,
    pub audience: Audience,
    pub message_context: MessageContext,
    pub targets: Vec<Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
    pub user_preferences: UserPreferences,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub platform: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub to: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageVariant {
    pub platform: String,
    pub recipient: Recipient,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    pub body: String,
    /// Length reported by the generator. See [`MessageVariant::char_count_mismatch`].
    #[serde(default, deserialize_with = "null_as_default")]
    pub char_count: u64,
    pub send_payload: SendPayload,
}

impl MessageVariant {
    /// Length of `body` in Unicode scalar values.
    pub fn computed_char_count(&self) -> u64 {
        self.body.chars().count() as u64
    }

    pub fn char_count_mismatch(&self) -> bool {
        self.char_count != self.computed_char_count()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityChecks {
    pub intent_preserved: bool,
    pub platform_fit: bool,
    pub no_private_data_leak: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClerkResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub clarifying_questions: Vec<String>,
    pub assumptions: Vec<String>,
    pub message_variants: Vec<MessageVariant>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub safety_notes: Vec<String>,
    pub quality_checks: QualityChecks,
}

// TypeDef for ClerkResponse (wire schema and validation of generator JSON)
pub fn clerk_response_typedef() -> TypeDef {
    let strings = || TypeDef::list(TypeDef::Text);
    let recipient = TypeDef::Object(vec![
        FieldDef::optional("name", TypeDef::Text),
        FieldDef::optional("handle_or_address", TypeDef::Text),
    ]);
    let send_payload = TypeDef::Object(vec![
        FieldDef::optional("platform", TypeDef::Text),
        FieldDef::optional("to", TypeDef::Text),
        FieldDef::optional("subject", TypeDef::Text),
        FieldDef::optional("text", TypeDef::Text),
    ]);
    let variant = TypeDef::Object(vec![
        FieldDef::required("platform", TypeDef::Text),
        FieldDef::required("recipient", recipient),
        FieldDef::optional("subject", TypeDef::Text)
            .describe("Subject line for Email, otherwise empty string."),
        FieldDef::required("body", TypeDef::Text).describe("The actual message content."),
        FieldDef::optional("char_count", TypeDef::Integer),
        FieldDef::required("send_payload", send_payload),
    ]);
    let quality_checks = TypeDef::Object(vec![
        FieldDef::required("intent_preserved", TypeDef::Bool),
        FieldDef::required("platform_fit", TypeDef::Bool),
        FieldDef::required("no_private_data_leak", TypeDef::Bool),
    ]);

    TypeDef::Object(vec![
        FieldDef::optional("clarifying_questions", strings())
            .describe("Any questions needed to clear up ambiguity (max 2)."),
        FieldDef::required("assumptions", strings())
            .describe("List of assumptions made if data was missing."),
        FieldDef::required("message_variants", TypeDef::list(variant)),
        FieldDef::optional("safety_notes", strings())
            .describe("Any safety warnings or notes about the content."),
        FieldDef::required("quality_checks", quality_checks),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{to_wire_schema, validate};
    use serde_json::json;

    #[test]
    fn sms_and_slack_profiles() {
        let sms = Platform::Sms.default_constraints();
        assert_eq!(sms.max_chars.get(), 160);
        assert!(!sms.allow_emojis && !sms.allow_markdown && sms.allow_links);

        let slack = Platform::Slack.default_constraints();
        assert_eq!(slack.max_chars.get(), 4000);
        assert!(slack.allow_emojis && slack.allow_markdown && slack.allow_links);
    }

    #[test]
    fn every_platform_allows_links() {
        for p in Platform::ALL {
            assert!(p.default_constraints().allow_links, "{p}");
        }
    }

    #[test]
    fn platform_wire_names_round_trip_through_from_str() {
        for p in Platform::ALL {
            assert_eq!(serde_json::to_value(p).unwrap(), json!(p.as_str()));
            assert_eq!(p.as_str().parse::<Platform>().unwrap(), p);
        }
        assert_eq!("LinkedIn DM".parse::<Platform>().unwrap(), Platform::LinkedinDm);
        assert_eq!("x-dm".parse::<Platform>().unwrap(), Platform::XDm);
        assert!("fax".parse::<Platform>().is_err());
        assert_eq!("Boss".parse::<Relationship>().unwrap(), Relationship::Boss);
        assert_eq!("apologetic".parse::<Tone>().unwrap(), Tone::Apologetic);
    }

    #[test]
    fn blank_draft_is_not_serialized() {
        let input = ClerkInput {
            user_goal: "hi".into(),
            audience: Audience {
                relationship: Relationship::Friend,
                tone: Tone::Friendly,
                language: "en".into(),
            },
            message_context: MessageContext::default(),
            targets: vec![Target::for_platform(Platform::Sms)],
            draft: None,
            user_preferences: UserPreferences::default(),
        };
        let v = serde_json::to_value(&input).unwrap();
        assert!(v.get("draft").is_none());
        assert_eq!(v["targets"][0]["constraints"]["max_chars"], 160);
        assert_eq!(v["targets"][0]["platform"], "sms");
    }

    #[test]
    fn char_count_mismatch_uses_unicode_length() {
        let mut variant = MessageVariant {
            platform: "sms".into(),
            recipient: Recipient::default(),
            subject: String::new(),
            body: "héllo 👋".into(),
            char_count: 7,
            send_payload: SendPayload::default(),
        };
        assert!(!variant.char_count_mismatch());
        variant.char_count = variant.body.len() as u64;
        assert!(variant.char_count_mismatch());
    }

    #[test]
    fn response_decodes_with_optional_keys_missing() {
        let v = json!({
            "assumptions": [],
            "message_variants": [{
                "platform": "sms",
                "recipient": {"name": "Sam"},
                "body": "Running late",
                "send_payload": {"to": "+100"}
            }],
            "quality_checks": {"intent_preserved": true, "platform_fit": true, "no_private_data_leak": true}
        });
        assert!(validate(&clerk_response_typedef(), &v).is_ok());
        let resp: ClerkResponse = serde_json::from_value(v).unwrap();
        assert!(resp.clarifying_questions.is_empty());
        assert!(resp.safety_notes.is_empty());
        assert_eq!(resp.message_variants[0].subject, "");
        assert_eq!(resp.message_variants[0].recipient.handle_or_address, "");
    }

    #[test]
    fn null_optional_fields_read_as_absent() {
        let v = json!({
            "clarifying_questions": null,
            "assumptions": [],
            "message_variants": [{
                "platform": "sms",
                "recipient": {"name": "Sam", "handle_or_address": null},
                "subject": null,
                "body": "Running late",
                "char_count": null,
                "send_payload": {"platform": "sms", "to": "+100", "subject": null, "text": null}
            }],
            "safety_notes": null,
            "quality_checks": {"intent_preserved": true, "platform_fit": true, "no_private_data_leak": true}
        });
        assert!(validate(&clerk_response_typedef(), &v).is_ok());
        let resp: ClerkResponse = serde_json::from_value(v).unwrap();
        let variant = &resp.message_variants[0];
        assert_eq!(variant.subject, "");
        assert_eq!(variant.char_count, 0);
        assert_eq!(variant.recipient.handle_or_address, "");
        assert_eq!(variant.send_payload.text, "");
        assert!(resp.clarifying_questions.is_empty() && resp.safety_notes.is_empty());
    }

    #[test]
    fn null_required_field_is_still_rejected() {
        let v = json!({
            "assumptions": null,
            "message_variants": [],
            "quality_checks": {"intent_preserved": true, "platform_fit": true, "no_private_data_leak": true}
        });
        assert!(validate(&clerk_response_typedef(), &v).is_err());
    }

    #[test]
    fn response_schema_required_keys() {
        let schema = to_wire_schema(&clerk_response_typedef());
        assert_eq!(
            schema["required"],
            json!(["assumptions", "message_variants", "quality_checks"])
        );
        assert_eq!(
            schema["properties"]["message_variants"]["items"]["required"],
            json!(["platform", "recipient", "body", "send_payload"])
        );
        assert_eq!(
            schema["properties"]["quality_checks"]["required"],
            json!(["intent_preserved", "platform_fit", "no_private_data_leak"])
        );
        assert_eq!(
            schema["properties"]["message_variants"]["items"]["properties"]["char_count"]["type"],
            "INTEGER"
        );
    }
}
