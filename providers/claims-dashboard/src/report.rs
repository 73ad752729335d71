//! Report and alert-summary rendering.
//!
//! Numbers are formatted here, so templates only place strings.

use chrono::{DateTime, Utc};
use claims_analytics::AnalysisSnapshot;
use claims_common::{ClaimRecord, QaPair};
use serde::Serialize;

use crate::error::DashboardError;
use crate::templates::{Templates, ALERT_SUMMARY, REPORT_HTML, REPORT_TEXT};

pub const REPORT_TITLE: &str = "Claims Analysis Report";
const UNDEFINED: &str = "undefined (no claims loaded)";

/// Inputs of one report: the pipeline snapshot, the rows and an optional Q&A
pub struct ReportInput<'a> {
    pub snapshot: &'a AnalysisSnapshot,
    pub claims: &'a [ClaimRecord],
    pub qa: Option<&'a QaPair>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ReportView {
    title: &'static str,
    source_name: String,
    generated_at: String,
    claim_count: usize,
    warnings: Vec<String>,
    metrics: Option<MetricsView>,
    region_totals: Vec<RegionView>,
    alerts: AlertsView,
    exposure: ExposureView,
    qa: Option<QaView>,
    claims: Vec<ClaimView>,
}

#[derive(Debug, Serialize)]
struct MetricsView {
    total: String,
    average: String,
    max: String,
    min: String,
    top_region: String,
}

#[derive(Debug, Serialize)]
struct RegionView {
    region: String,
    claim_count: usize,
    total: String,
}

#[derive(Debug, Serialize)]
struct AlertsView {
    threshold: String,
    count: usize,
    total: String,
    claims: Vec<ClaimView>,
}

#[derive(Debug, Serialize)]
struct ExposureView {
    event: String,
    matching_policies: usize,
    policy_ids: String,
    average_claim: String,
    estimated_exposure: String,
}

#[derive(Debug, Serialize)]
struct QaView {
    question: String,
    answer: String,
    answered_at: String,
}

#[derive(Debug, Serialize)]
struct ClaimView {
    row: usize,
    claim_id: String,
    amount: String,
    damage_type: String,
    region: String,
}

pub fn format_eur(amount: f64) -> String {
    format!("{:.2}", amount)
}

fn format_optional_eur(amount: Option<f64>) -> String {
    amount
        .map(|a| format!("{} EUR", format_eur(a)))
        .unwrap_or_else(|| UNDEFINED.to_string())
}

fn claim_views(claims: &[ClaimRecord]) -> Vec<ClaimView> {
    claims
        .iter()
        .enumerate()
        .map(|(idx, claim)| ClaimView {
            row: idx + 1,
            claim_id: claim.claim_id.clone(),
            amount: format_eur(claim.amount_eur),
            damage_type: claim.damage_type.clone(),
            region: claim.region.clone(),
        })
        .collect()
}

fn report_view(input: &ReportInput<'_>) -> ReportView {
    let snapshot = input.snapshot;

    ReportView {
        title: REPORT_TITLE,
        source_name: snapshot.source_name.clone(),
        generated_at: input.generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        claim_count: snapshot.claim_count,
        warnings: snapshot.warnings.clone(),
        metrics: snapshot.metrics.as_ref().map(|m| MetricsView {
            total: format_eur(m.total_amount),
            average: format_eur(m.average_amount),
            max: format_eur(m.max_amount),
            min: format_eur(m.min_amount),
            top_region: m.top_region.clone(),
        }),
        region_totals: snapshot
            .region_totals
            .iter()
            .map(|r| RegionView {
                region: r.region.clone(),
                claim_count: r.claim_count,
                total: format_eur(r.total_amount),
            })
            .collect(),
        alerts: AlertsView {
            threshold: format_eur(snapshot.alerts.threshold),
            count: snapshot.alerts.len(),
            total: format_eur(snapshot.alerts.total_amount),
            claims: claim_views(&snapshot.alerts.claims),
        },
        exposure: ExposureView {
            event: snapshot.exposure.event.describe(),
            matching_policies: snapshot.exposure.matching_policies,
            policy_ids: snapshot.exposure.matching_policy_ids.join(", "),
            average_claim: format_optional_eur(snapshot.exposure.average_claim),
            estimated_exposure: format_optional_eur(snapshot.exposure.estimated_exposure),
        },
        qa: input.qa.map(|qa| QaView {
            question: qa.question.clone(),
            answer: qa.answer.clone(),
            answered_at: qa.answered_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        }),
        claims: claim_views(input.claims),
    }
}

/// Standalone UTF-8 HTML document
pub fn render_report_html(templates: &Templates, input: &ReportInput<'_>) -> Result<String, DashboardError> {
    templates.render_markup(REPORT_HTML, &report_view(input))
}

/// Plain-text rendition of the same report
pub fn render_report_text(templates: &Templates, input: &ReportInput<'_>) -> Result<String, DashboardError> {
    templates.render_text(REPORT_TEXT, &report_view(input))
}

/// Subject and body of the alert email for a snapshot
pub fn render_alert_summary(
    templates: &Templates,
    snapshot: &AnalysisSnapshot,
) -> Result<(String, String), DashboardError> {
    let subject = if snapshot.alerts.is_triggered() {
        format!(
            "{} claims above {} EUR in {}",
            snapshot.alerts.len(),
            format_eur(snapshot.alerts.threshold),
            snapshot.source_name
        )
    } else {
        format!(
            "No claims above {} EUR in {}",
            format_eur(snapshot.alerts.threshold),
            snapshot.source_name
        )
    };

    let input = ReportInput {
        snapshot,
        claims: &[],
        qa: None,
        generated_at: Utc::now(),
    };
    let body = templates.render_text(ALERT_SUMMARY, &report_view(&input))?;
    Ok((subject, body))
}

pub fn report_filename(generated_at: DateTime<Utc>) -> String {
    format!("claims-report-{}.html", generated_at.format("%Y%m%d-%H%M%S"))
}
