//! Request handlers. Each one runs its pipeline stages in order and turns
//! failures into a [`DashboardError`] rejection; the session always survives.

use chrono::{DateTime, Utc};
use claims_analytics::{
    compute_metrics, estimate_exposure, filter_alerts, load_claims, region_totals, AnalysisSnapshot,
    ClaimsTable, DatasetFormat,
};
use claims_common::{AdvisorRequestV1, ClaimRecord, QaPair};
use notification_common::{NotificationAttachment, NotificationChannel, NotificationPriority, NotificationRequest};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use warp::hyper::body::Bytes;
use warp::{Rejection, Reply};

use crate::chart::render_region_chart;
use crate::error::DashboardError;
use crate::report::{render_alert_summary, render_report_html, render_report_text, report_filename, ReportInput};
use crate::session::SessionState;
use crate::state::AppState;
use crate::templates::INDEX_PAGE;

const DASHBOARD_TITLE: &str = "Claims Insight Dashboard";
const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
const SVG_CONTENT_TYPE: &str = "image/svg+xml";
/// Name given to the stand-in table when exposure is requested before any upload
const NO_UPLOAD_SOURCE: &str = "(no upload)";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadSummary {
    pub source_name: String,
    pub format: &'static str,
    pub rows: usize,
    pub loaded_at: DateTime<Utc>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ClaimsListing<'a> {
    pub source_name: &'a str,
    pub loaded_at: DateTime<Utc>,
    pub rows: usize,
    pub claims: &'a [ClaimRecord],
}

#[derive(Debug, Default, Deserialize)]
pub struct AlertsQuery {
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AdvisorQuestion {
    pub question: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportRequest {
    pub question: Option<String>,
    pub answer: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotifyRequest {
    pub subject: Option<String>,
    pub body: Option<String>,
    #[serde(default)]
    pub attach_report: bool,
    pub priority: Option<NotificationPriority>,
}

fn loaded_claims(session: &SessionState) -> Result<Arc<ClaimsTable>, DashboardError> {
    session.claims.clone().ok_or_else(DashboardError::no_dataset)
}

/// Parse a JSON body that may be absent altogether
fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, DashboardError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| DashboardError::invalid(format!("invalid JSON body: {}", e)))
}

fn snapshot_for(
    state: &AppState,
    session: &SessionState,
    claims: &ClaimsTable,
) -> Result<AnalysisSnapshot, DashboardError> {
    AnalysisSnapshot::compute(
        claims,
        session.threshold,
        &state.registry.policies(),
        &state.events.current_event(),
    )
    .map_err(DashboardError::from)
}

pub async fn index(state: AppState) -> Result<impl Reply, Rejection> {
    let page = state.templates.render_markup(
        INDEX_PAGE,
        &serde_json::json!({
            "title": DASHBOARD_TITLE,
            "threshold": state.config.analysis.threshold,
        }),
    )?;
    Ok(warp::reply::html(page))
}

pub async fn health() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&serde_json::json!({ "status": "ok" })))
}

#[instrument(skip_all, fields(username = %request.username))]
pub async fn login(request: LoginRequest, state: AppState) -> Result<impl Reply, Rejection> {
    let session = state
        .auth
        .authenticate(&request.username, &request.password)
        .await
        .map_err(DashboardError::from)?;

    let response = LoginResponse {
        token: session.token.clone(),
        username: session.username.clone(),
        expires_at: session.expires_at,
    };
    state.sessions.open(session, state.default_threshold()).await;

    Ok(warp::reply::json(&response))
}

pub async fn logout(session: SessionState, state: AppState) -> Result<impl Reply, Rejection> {
    state.sessions.close(&session.session.token).await;
    Ok(warp::reply::json(&serde_json::json!({ "status": "logged_out" })))
}

#[instrument(skip_all, fields(filename = ?query.filename, bytes = body.len()))]
pub async fn upload_claims(
    query: UploadQuery,
    body: Bytes,
    session: SessionState,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let source_name = query
        .filename
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("upload")
        .to_string();

    let format = match (&query.format, &query.filename) {
        (Some(format), _) => format.parse::<DatasetFormat>(),
        (None, Some(filename)) => DatasetFormat::from_filename(filename),
        (None, None) => {
            return Err(DashboardError::invalid("either filename or format is required").into());
        }
    }
    .map_err(|e| DashboardError::UnreadableFile(e.to_string()))?;

    let limits = state.config.analysis.load_limits();
    let name = source_name.clone();
    let table = tokio::task::spawn_blocking(move || load_claims(&name, &body, format, &limits))
        .await
        .map_err(|e| DashboardError::Internal(format!("loader task failed: {}", e)))?
        .map_err(DashboardError::from)?;

    let mut warnings = Vec::new();
    if table.is_empty() {
        warnings.push("file contains a header but no claim rows".to_string());
    }

    let summary = UploadSummary {
        source_name,
        format: format.as_str(),
        rows: table.len(),
        loaded_at: table.loaded_at(),
        warnings,
    };

    let table = Arc::new(table);
    state
        .sessions
        .update(&session.session.token, |s| {
            s.claims = Some(table);
            s.last_qa = None;
        })
        .await
        .map_err(DashboardError::from)?;

    info!("📥 Loaded {} claims from {}", summary.rows, summary.source_name);
    Ok(warp::reply::json(&summary))
}

pub async fn list_claims(session: SessionState) -> Result<impl Reply, Rejection> {
    let claims = loaded_claims(&session)?;
    Ok(warp::reply::json(&ClaimsListing {
        source_name: claims.source_name(),
        loaded_at: claims.loaded_at(),
        rows: claims.len(),
        claims: claims.records(),
    }))
}

pub async fn metrics(session: SessionState) -> Result<impl Reply, Rejection> {
    let claims = loaded_claims(&session)?;
    let metrics = compute_metrics(&claims).map_err(DashboardError::from)?;
    Ok(warp::reply::json(&metrics))
}

pub async fn alerts(query: AlertsQuery, session: SessionState, state: AppState) -> Result<impl Reply, Rejection> {
    let claims = loaded_claims(&session)?;

    let threshold = match query.threshold {
        Some(requested) => {
            let threshold = state
                .config
                .analysis
                .threshold
                .validate(requested)
                .map_err(DashboardError::InvalidInput)?;
            state
                .sessions
                .update(&session.session.token, |s| s.threshold = threshold)
                .await
                .map_err(DashboardError::from)?;
            threshold
        }
        None => session.threshold,
    };

    let alerts = filter_alerts(&claims, threshold).map_err(DashboardError::from)?;
    debug!("{} of {} claims above {}", alerts.len(), claims.len(), threshold);
    Ok(warp::reply::json(&alerts))
}

pub async fn exposure(session: SessionState, state: AppState) -> Result<impl Reply, Rejection> {
    let claims = session
        .claims
        .clone()
        .unwrap_or_else(|| Arc::new(ClaimsTable::empty(NO_UPLOAD_SOURCE)));

    let estimate = estimate_exposure(&state.registry.policies(), &state.events.current_event(), &claims)
        .map_err(DashboardError::from)?;
    Ok(warp::reply::json(&estimate))
}

pub async fn region_chart(session: SessionState, state: AppState) -> Result<impl Reply, Rejection> {
    let claims = loaded_claims(&session)?;
    let totals = region_totals(&claims).map_err(DashboardError::from)?;
    let svg = render_region_chart(&state.templates, &totals)?;
    Ok(warp::reply::with_header(svg, "content-type", SVG_CONTENT_TYPE))
}

#[instrument(skip_all, fields(user = %session.session.username))]
pub async fn ask_advisor(
    request: AdvisorQuestion,
    session: SessionState,
    state: AppState,
) -> Result<impl Reply, Rejection> {
    let question = request.question.trim();
    if question.is_empty() {
        return Err(DashboardError::invalid("question must not be empty").into());
    }
    let max_chars = state.config.analysis.max_question_chars;
    if question.chars().count() > max_chars {
        return Err(DashboardError::invalid(format!("question is longer than {} characters", max_chars)).into());
    }

    let claims = loaded_claims(&session)?;
    let advisor = state.advisor.clone().ok_or_else(|| DashboardError::ExternalService {
        message: "advisor is not configured".to_string(),
        timeout: false,
    })?;

    let advisor_request = AdvisorRequestV1::new(
        question,
        claims.records().to_vec(),
        state.registry.policies(),
        state.events.current_event(),
    )
    .with_metrics(compute_metrics(&claims).ok());

    let answer = advisor.ask(advisor_request).await.map_err(|e| {
        warn!("Advisor request failed ({}): {}", e.kind(), e);
        DashboardError::from(e)
    })?;

    let qa = QaPair::new(question, answer);
    let stored = qa.clone();
    state
        .sessions
        .update(&session.session.token, |s| s.last_qa = Some(stored))
        .await
        .map_err(DashboardError::from)?;

    Ok(warp::reply::json(&qa))
}

pub async fn report(body: Bytes, session: SessionState, state: AppState) -> Result<impl Reply, Rejection> {
    let request: ReportRequest = optional_json(&body)?;
    let qa = match (request.question, request.answer) {
        (Some(question), Some(answer)) => Some(QaPair::new(question, answer)),
        (None, None) => session.last_qa.clone(),
        _ => return Err(DashboardError::invalid("question and answer must be given together").into()),
    };

    let claims = loaded_claims(&session)?;
    let snapshot = snapshot_for(&state, &session, &claims)?;
    let generated_at = Utc::now();
    let html = render_report_html(
        &state.templates,
        &ReportInput {
            snapshot: &snapshot,
            claims: claims.records(),
            qa: qa.as_ref(),
            generated_at,
        },
    )?;

    info!("📄 Rendered report for {} ({} claims)", snapshot.source_name, snapshot.claim_count);
    let disposition = format!("attachment; filename=\"{}\"", report_filename(generated_at));
    Ok(warp::reply::with_header(
        warp::reply::with_header(html, "content-type", HTML_CONTENT_TYPE),
        "content-disposition",
        disposition,
    ))
}

#[instrument(skip_all, fields(user = %session.session.username))]
pub async fn notify(body: Bytes, session: SessionState, state: AppState) -> Result<impl Reply, Rejection> {
    let request: NotifyRequest = optional_json(&body)?;
    let notifier = state.notifier.clone().ok_or_else(|| DashboardError::ExternalService {
        message: "email notifications are not configured".to_string(),
        timeout: false,
    })?;

    let needs_dataset = request.subject.is_none() || request.body.is_none() || request.attach_report;
    let snapshot = if needs_dataset {
        let claims = loaded_claims(&session)?;
        Some((snapshot_for(&state, &session, &claims)?, claims))
    } else {
        None
    };

    let generated_at = Utc::now();
    let (subject, text) = match (request.subject, request.body, &snapshot) {
        (Some(subject), Some(text), _) => (subject, text),
        (subject, text, Some((snapshot, claims))) => {
            let (default_subject, summary) = render_alert_summary(&state.templates, snapshot)?;
            let text = match text {
                Some(text) => text,
                None => {
                    let report = render_report_text(
                        &state.templates,
                        &ReportInput {
                            snapshot,
                            claims: claims.records(),
                            qa: session.last_qa.as_ref(),
                            generated_at,
                        },
                    )?;
                    format!("{}\n\n{}", summary.trim_end(), report)
                }
            };
            (subject.unwrap_or(default_subject), text)
        }
        (_, _, None) => return Err(DashboardError::no_dataset().into()),
    };

    let mut notification = NotificationRequest::new(NotificationChannel::Email, subject, text)
        .with_priority(request.priority.unwrap_or_default());

    if request.attach_report {
        if let Some((snapshot, claims)) = &snapshot {
            let html = render_report_html(
                &state.templates,
                &ReportInput {
                    snapshot,
                    claims: claims.records(),
                    qa: session.last_qa.as_ref(),
                    generated_at,
                },
            )?;
            notification = notification.with_attachment(NotificationAttachment {
                filename: report_filename(generated_at),
                content_type: HTML_CONTENT_TYPE.to_string(),
                content: html.into_bytes(),
            });
        }
    }

    let status = notifier
        .send_notification(notification)
        .await
        .map_err(DashboardError::from)?;

    info!("📧 Notification {} delivered after {} retries", status.notification_id, status.retry_count);
    Ok(warp::reply::json(&status))
}
