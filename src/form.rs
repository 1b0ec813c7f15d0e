//! Raw form state and the pure request builder that turns it into a
//! [`ClerkInput`].
//!
//! Targets are addressed by their position in [`FormState::targets`]; nothing
//! UI-local ever reaches the serialized input.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::error::{ClerkError, Result};
use crate::model::{
    Audience, ClerkInput, MessageContext, Platform, Relationship, Target, Tone, UserPreferences,
};

/// Everything the form holds before submission. Multi-line fields are kept
/// as the user typed them and only split by [`build_input`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormState {
    pub goal: String,
    pub relationship: Relationship,
    pub tone: Tone,
    pub language: String,
    pub topic: String,
    pub key_points: String,
    pub must_include: String,
    pub must_avoid: String,
    pub dates_times: String,
    pub links: String,
    pub draft: String,
    pub sign_off: String,
    pub brand_voice: String,
    pub targets: Vec<Target>,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            goal: "Tell my client we need to move tomorrow's meeting by 30 minutes.".into(),
            relationship: Relationship::Customer,
            tone: Tone::Formal,
            language: "en".into(),
            topic: "Meeting reschedule".into(),
            key_points: "Move meeting 30 mins later\nApologize briefly\nConfirm new time".into(),
            must_include: "New time: 10:30 AM".into(),
            must_avoid: "Blaming anyone".into(),
            dates_times: "Tomorrow 10:30 AM".into(),
            links: String::new(),
            draft: String::new(),
            sign_off: "Best, Clerk".into(),
            brand_voice: "Professional, helpful, concise".into(),
            targets: vec![Target::for_platform(Platform::Email)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecipientField {
    Name,
    HandleOrAddress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintChange {
    MaxChars(NonZeroU32),
    AllowEmojis(bool),
    AllowMarkdown(bool),
    AllowLinks(bool),
}

/// One edit to a single target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetUpdate {
    /// Switches platform and resets constraints to that platform's profile.
    Platform(Platform),
    Recipient(RecipientField, String),
    Constraint(ConstraintChange),
}

impl FormState {
    /// Appends a fresh email target and returns its index.
    pub fn add_target(&mut self) -> usize {
        self.targets.push(Target::for_platform(Platform::Email));
        self.targets.len() - 1
    }

    /// Removes the target at `index`. The last remaining target stays.
    pub fn remove_target(&mut self, index: usize) -> Result<Target> {
        if index >= self.targets.len() {
            return Err(no_target(index));
        }
        if self.targets.len() == 1 {
            return Err(ClerkError::Validation(
                "at least one target is required".into(),
            ));
        }
        Ok(self.targets.remove(index))
    }

    pub fn update_target(&mut self, index: usize, update: TargetUpdate) -> Result<()> {
        let target = self.targets.get_mut(index).ok_or_else(|| no_target(index))?;
        match update {
            TargetUpdate::Platform(platform) => {
                target.platform = platform;
                target.constraints = platform.default_constraints();
            }
            TargetUpdate::Recipient(RecipientField::Name, value) => target.recipient.name = value,
            TargetUpdate::Recipient(RecipientField::HandleOrAddress, value) => {
                target.recipient.handle_or_address = value
            }
            TargetUpdate::Constraint(change) => {
                let c = &mut target.constraints;
                match change {
                    ConstraintChange::MaxChars(n) => c.max_chars = n,
                    ConstraintChange::AllowEmojis(b) => c.allow_emojis = b,
                    ConstraintChange::AllowMarkdown(b) => c.allow_markdown = b,
                    ConstraintChange::AllowLinks(b) => c.allow_links = b,
                }
            }
        }
        Ok(())
    }
}

fn no_target(index: usize) -> ClerkError {
    ClerkError::Validation(format!("no target at index {index}"))
}

/// Split free text into trimmed, non-empty lines, preserving order.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build the generation input from form state. Pure and deterministic.
pub fn build_input(form: &FormState) -> Result<ClerkInput> {
    let input = ClerkInput {
        user_goal: form.goal.trim().to_string(),
        audience: Audience {
            relationship: form.relationship,
            tone: form.tone,
            language: form.language.trim().to_string(),
        },
        message_context: MessageContext {
            topic: form.topic.trim().to_string(),
            key_points: split_lines(&form.key_points),
            must_include: split_lines(&form.must_include),
            must_avoid: split_lines(&form.must_avoid),
            dates_times: split_lines(&form.dates_times),
            links: split_lines(&form.links),
        },
        targets: form.targets.clone(),
        draft: Some(form.draft.trim())
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        user_preferences: UserPreferences {
            sign_off: form.sign_off.clone(),
            brand_voice_notes: form.brand_voice.clone(),
        },
    };
    validate_input(&input)?;
    Ok(input)
}

/// Preconditions every input must meet before a generation call.
pub fn validate_input(input: &ClerkInput) -> Result<()> {
    if input.user_goal.trim().is_empty() {
        return Err(ClerkError::Validation("user goal must not be empty".into()));
    }
    if input.targets.is_empty() {
        return Err(ClerkError::Validation(
            "at least one target is required".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_trims_and_drops_blanks() {
        assert_eq!(split_lines("a\n \nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines("  first \r\n\n\tsecond"), vec!["first", "second"]);
        assert!(split_lines("").is_empty());
    }

    #[test]
    fn platform_change_resets_constraints() {
        let mut form = FormState::default();
        form.update_target(0, TargetUpdate::Constraint(ConstraintChange::AllowEmojis(false)))
            .unwrap();
        form.update_target(0, TargetUpdate::Platform(Platform::Sms)).unwrap();
        assert_eq!(form.targets[0].constraints, Platform::Sms.default_constraints());

        form.update_target(0, TargetUpdate::Platform(Platform::Slack)).unwrap();
        let c = form.targets[0].constraints;
        assert_eq!(
            (c.max_chars.get(), c.allow_emojis, c.allow_markdown, c.allow_links),
            (4000, true, true, true)
        );
    }

    #[test]
    fn recipient_and_constraint_updates_touch_only_their_field() {
        let mut form = FormState::default();
        form.update_target(0, TargetUpdate::Recipient(RecipientField::Name, "Alex".into()))
            .unwrap();
        form.update_target(
            0,
            TargetUpdate::Recipient(RecipientField::HandleOrAddress, "alex@co.com".into()),
        )
        .unwrap();
        let max = NonZeroU32::new(500).unwrap();
        form.update_target(0, TargetUpdate::Constraint(ConstraintChange::MaxChars(max)))
            .unwrap();

        let t = &form.targets[0];
        assert_eq!(t.platform, Platform::Email);
        assert_eq!(t.recipient.name, "Alex");
        assert_eq!(t.recipient.handle_or_address, "alex@co.com");
        assert_eq!(t.constraints.max_chars, max);
        assert!(t.constraints.allow_emojis);
    }

    #[test]
    fn out_of_range_update_is_rejected() {
        let mut form = FormState::default();
        let err = form
            .update_target(3, TargetUpdate::Platform(Platform::Sms))
            .unwrap_err();
        assert!(matches!(err, ClerkError::Validation(_)));
    }

    #[test]
    fn last_target_cannot_be_removed() {
        let mut form = FormState::default();
        assert!(form.remove_target(0).is_err());
        let idx = form.add_target();
        assert_eq!(idx, 1);
        form.update_target(idx, TargetUpdate::Platform(Platform::Discord)).unwrap();
        let removed = form.remove_target(0).unwrap();
        assert_eq!(removed.platform, Platform::Email);
        assert_eq!(form.targets[0].platform, Platform::Discord);
    }

    #[test]
    fn blank_draft_becomes_absent() {
        let mut form = FormState::default();
        form.draft = "   \n".into();
        assert_eq!(build_input(&form).unwrap().draft, None);
        form.draft = " rough text ".into();
        assert_eq!(build_input(&form).unwrap().draft.as_deref(), Some("rough text"));
    }

    #[test]
    fn multi_line_fields_are_split() {
        let input = build_input(&FormState::default()).unwrap();
        assert_eq!(
            input.message_context.key_points,
            vec!["Move meeting 30 mins later", "Apologize briefly", "Confirm new time"]
        );
        assert_eq!(input.message_context.must_include, vec!["New time: 10:30 AM"]);
        assert!(input.message_context.links.is_empty());
    }

    #[test]
    fn empty_goal_or_targets_fail_validation() {
        let mut form = FormState::default();
        form.goal = "  ".into();
        assert!(matches!(build_input(&form), Err(ClerkError::Validation(_))));

        let mut form = FormState::default();
        form.targets.clear();
        assert!(matches!(build_input(&form), Err(ClerkError::Validation(_))));
    }

    #[test]
    fn building_twice_gives_identical_json() {
        let mut form = FormState::default();
        form.add_target();
        let a = serde_json::to_string(&build_input(&form).unwrap()).unwrap();
        let b = serde_json::to_string(&build_input(&form).unwrap()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn form_state_accepts_partial_json() {
        let form: FormState = serde_json::from_str(
            r#"{"goal": "Say hi", "targets": [{"platform": "sms",
                "recipient": {"name": "Sam", "handle_or_address": "+1"},
                "constraints": {"max_chars": 160, "allow_emojis": false,
                                "allow_markdown": false, "allow_links": true}}]}"#,
        )
        .unwrap();
        assert_eq!(form.goal, "Say hi");
        assert_eq!(form.tone, Tone::Formal);
        assert_eq!(form.targets.len(), 1);
    }
}
