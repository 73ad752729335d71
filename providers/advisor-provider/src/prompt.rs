//! Rendering of structured advisor requests into chat messages.
//!
//! The wording lives here only; transport never inspects message text.

use claims_common::AdvisorRequestV1;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// System message followed by one user message carrying the data and question.
pub fn render_messages(
    request: &AdvisorRequestV1,
    system_role: &str,
    max_claims: usize,
) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(system_role),
        ChatMessage::user(render_user_prompt(request, max_claims)),
    ]
}

/// Tab-separated claims (at most `max_claims`), the summary when present, the
/// event and policies, then the question as the last line.
pub fn render_user_prompt(request: &AdvisorRequestV1, max_claims: usize) -> String {
    let mut lines = vec![
        format!("Claims data ({} rows):", request.claims.len()),
        "Claim_ID\tAmount_EUR\tDamage_Type\tRegion".to_string(),
    ];
    lines.extend(request.claims.iter().take(max_claims).map(|claim| {
        format!(
            "{}\t{:.2}\t{}\t{}",
            claim.claim_id, claim.amount_eur, claim.damage_type, claim.region
        )
    }));
    if request.claims.len() > max_claims {
        lines.push(format!(
            "... {} more rows not shown",
            request.claims.len() - max_claims
        ));
    }

    if let Some(metrics) = &request.metrics {
        lines.extend([
            String::new(),
            "Summary:".to_string(),
            format!("- claims: {}", metrics.claim_count),
            format!("- total: {:.2} EUR", metrics.total_amount),
            format!("- average: {:.2} EUR", metrics.average_amount),
            format!(
                "- min / max: {:.2} / {:.2} EUR",
                metrics.min_amount, metrics.max_amount
            ),
            format!("- top region: {}", metrics.top_region),
        ]);
    }

    lines.push(String::new());
    lines.push(format!("External event: {}", request.event.describe()));
    if !request.policies.is_empty() {
        lines.push("Policies (policy_id, region, coverage, active):".to_string());
        lines.extend(request.policies.iter().map(|policy| {
            format!(
                "{}\t{}\t{}\t{}",
                policy.policy_id, policy.region, policy.coverage, policy.active
            )
        }));
    }

    lines.push(String::new());
    lines.push("Question:".to_string());
    lines.push(request.question.trim().to_string());

    lines.join("\n")
}
