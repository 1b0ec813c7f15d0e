use std::fmt::Write;

use crate::model::{ClerkResponse, MessageVariant};

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn bullet_section(out: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "{title}:");
    for item in items {
        let _ = writeln!(out, "  - {item}");
    }
    out.push('\n');
}

/// Plain-text rendering of a result with `active_tab` expanded.
pub fn render_response(response: &ClerkResponse, active_tab: usize) -> String {
    let mut out = String::new();
    let qc = &response.quality_checks;
    let _ = writeln!(
        out,
        "Quality: Intent Preserved: {} | Platform Fit: {} | Safe: {}",
        yes_no(qc.intent_preserved),
        yes_no(qc.platform_fit),
        if qc.no_private_data_leak { "Yes" } else { "Warning" },
    );
    out.push('\n');

    bullet_section(&mut out, "Clarifying questions", &response.clarifying_questions);
    bullet_section(&mut out, "Assumptions", &response.assumptions);
    bullet_section(&mut out, "Safety notes", &response.safety_notes);

    let tabs: Vec<String> = response
        .message_variants
        .iter()
        .enumerate()
        .map(|(idx, v)| {
            let label = v.platform.to_uppercase();
            if idx == active_tab {
                format!("[{label}]")
            } else {
                format!(" {label} ")
            }
        })
        .collect();
    let _ = writeln!(out, "{}", tabs.join(" "));

    if let Some(variant) = response.message_variants.get(active_tab) {
        out.push_str(&render_variant(variant));
    }
    out
}

/// Text placed on the clipboard by the copy action: the body, nothing else.
pub fn clipboard_text(variant: &MessageVariant) -> &str {
    &variant.body
}

pub fn render_variant(variant: &MessageVariant) -> String {
    let mut out = String::new();
    let subject = if variant.subject.is_empty() {
        "No Subject"
    } else {
        variant.subject.as_str()
    };
    let _ = writeln!(out, "Subject: {subject}");
    let _ = writeln!(
        out,
        "To: {} ({})",
        variant.recipient.name, variant.recipient.handle_or_address
    );
    if variant.char_count_mismatch() {
        let _ = writeln!(
            out,
            "{} chars (body is actually {})",
            variant.char_count,
            variant.computed_char_count()
        );
    } else {
        let _ = writeln!(out, "{} chars", variant.char_count);
    }
    out.push('\n');
    out.push_str(&variant.body);
    out.push_str("\n\n");

    let payload = serde_json::to_string_pretty(&variant.send_payload)
        .unwrap_or_else(|e| format!("<payload unavailable: {e}>"));
    let _ = writeln!(out, "Payload:\n{payload}");
    out
}
