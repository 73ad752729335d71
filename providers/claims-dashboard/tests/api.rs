use advisor_provider::{Advisor, AdvisorError};
use async_trait::async_trait;
use chrono::Duration;
use claims_analytics::{StaticEventFeed, StaticPolicyRegistry};
use claims_common::AdvisorRequestV1;
use claims_dashboard::{routes, AppState, ConfiguredCredentials, DashboardConfig};
use email_notification_provider::{EmailConfig, EmailProvider};
use notification_common::{
    DeliveryStatus, NotificationChannel, NotificationProvider, NotificationRequest, ProviderError, RetryConfig,
};
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use warp::http::StatusCode;
use warp::{Filter, Reply};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USERNAME: &str = "analyst";
const PASSWORD: &str = "s3cret-pass";

const CLAIMS_CSV: &str = "Claim_ID,Amount_EUR,Damage_Type,Region\n\
C1,1000,Πλημμύρα,A\n\
C2,5000,Fire,B\n\
C3,2000,Hail,A\n";

struct CannedAdvisor {
    answer: String,
    seen: Mutex<Vec<AdvisorRequestV1>>,
}

#[async_trait]
impl Advisor for CannedAdvisor {
    async fn ask(&self, request: AdvisorRequestV1) -> Result<String, AdvisorError> {
        self.seen.lock().unwrap().push(request);
        Ok(self.answer.clone())
    }
}

struct TimingOutAdvisor;

#[async_trait]
impl Advisor for TimingOutAdvisor {
    async fn ask(&self, _request: AdvisorRequestV1) -> Result<String, AdvisorError> {
        Err(AdvisorError::Timeout)
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<NotificationRequest>>,
}

#[async_trait]
impl NotificationProvider for RecordingNotifier {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Email
    }

    async fn send_notification(&self, request: NotificationRequest) -> Result<DeliveryStatus, ProviderError> {
        let status = DeliveryStatus::delivered(&request, Some("msg-1".to_string()), 0);
        self.sent.lock().unwrap().push(request);
        Ok(status)
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

fn config() -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.auth.username = USERNAME.to_string();
    config.auth.password = PASSWORD.to_string();
    config
}

fn state() -> AppState {
    let auth = Arc::new(ConfiguredCredentials::new(
        USERNAME.to_string(),
        PASSWORD.to_string(),
        Duration::minutes(5),
    ));
    AppState::new(
        config(),
        auth,
        Arc::new(StaticPolicyRegistry::sample()),
        Arc::new(StaticEventFeed::sample()),
    )
    .unwrap()
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

async fn login<F>(api: &F) -> String
where
    F: Filter + 'static,
    F::Extract: Reply + Send,
{
    let res = warp::test::request()
        .method("POST")
        .path("/api/login")
        .json(&serde_json::json!({"username": USERNAME, "password": PASSWORD}))
        .reply(api)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    json(res.body())["token"].as_str().unwrap().to_string()
}

async fn upload<F>(api: &F, token: &str, filename: &str, body: &str) -> warp::http::Response<warp::hyper::body::Bytes>
where
    F: Filter + 'static,
    F::Extract: Reply + Send,
{
    warp::test::request()
        .method("POST")
        .path(&format!("/api/claims?filename={}", filename))
        .header("authorization", format!("Bearer {}", token))
        .body(body.to_string())
        .reply(api)
        .await
}

async fn get<F>(api: &F, token: &str, route: &str) -> warp::http::Response<warp::hyper::body::Bytes>
where
    F: Filter + 'static,
    F::Extract: Reply + Send,
{
    warp::test::request()
        .method("GET")
        .path(route)
        .header("authorization", format!("Bearer {}", token))
        .reply(api)
        .await
}

async fn post<F>(api: &F, token: &str, route: &str, body: Value) -> warp::http::Response<warp::hyper::body::Bytes>
where
    F: Filter + 'static,
    F::Extract: Reply + Send,
{
    warp::test::request()
        .method("POST")
        .path(route)
        .header("authorization", format!("Bearer {}", token))
        .json(&body)
        .reply(api)
        .await
}

#[tokio::test]
async fn test_health_and_index_are_public() {
    let api = routes(state());

    let res = warp::test::request().path("/health").reply(&api).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json(res.body())["status"], "ok");

    let res = warp::test::request().path("/").reply(&api).await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = String::from_utf8(res.body().to_vec()).unwrap();
    assert!(page.contains("Claims Insight Dashboard"));
}

#[tokio::test]
async fn test_api_requires_session() {
    let api = routes(state());

    let res = warp::test::request().path("/api/metrics").reply(&api).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(res.body())["error"], "authentication");

    let res = get(&api, "not-a-token", "/api/metrics").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = warp::test::request()
        .method("POST")
        .path("/api/login")
        .json(&serde_json::json!({"username": USERNAME, "password": "wrong"}))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json(res.body())["message"], "invalid username or password");
}

#[tokio::test]
async fn test_upload_then_metrics_and_listing() {
    let api = routes(state());
    let token = login(&api).await;

    let res = upload(&api, &token, "claims.csv", CLAIMS_CSV).await;
    assert_eq!(res.status(), StatusCode::OK);
    let summary = json(res.body());
    assert_eq!(summary["rows"], 3);
    assert_eq!(summary["format"], "csv");
    assert_eq!(summary["source_name"], "claims.csv");

    let res = get(&api, &token, "/api/metrics").await;
    assert_eq!(res.status(), StatusCode::OK);
    let metrics = json(res.body());
    assert_eq!(metrics["total_amount"], 8000.0);
    assert_eq!(metrics["max_amount"], 5000.0);
    assert_eq!(metrics["min_amount"], 1000.0);
    assert_eq!(metrics["top_region"], "A");
    assert!((metrics["average_amount"].as_f64().unwrap() - 2666.67).abs() < 0.01);

    let res = get(&api, &token, "/api/claims").await;
    let listing = json(res.body());
    assert_eq!(listing["rows"], 3);
    assert_eq!(listing["claims"][0]["damage_type"], "Πλημμύρα");
}

#[tokio::test]
async fn test_empty_table_metrics_and_exposure() {
    let api = routes(state());
    let token = login(&api).await;

    let res = upload(&api, &token, "empty.csv", "Claim_ID,Amount_EUR,Damage_Type,Region\n").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json(res.body())["rows"], 0);

    let res = get(&api, &token, "/api/metrics").await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json(res.body())["error"], "insufficient_data");

    let res = get(&api, &token, "/api/exposure").await;
    assert_eq!(res.status(), StatusCode::OK);
    let exposure = json(res.body());
    assert_eq!(exposure["matching_policies"], 2);
    assert_eq!(exposure["estimated_exposure"], Value::Null);
}

#[tokio::test]
async fn test_bad_upload_keeps_previous_dataset() {
    let api = routes(state());
    let token = login(&api).await;
    upload(&api, &token, "claims.csv", CLAIMS_CSV).await;

    let res = upload(&api, &token, "broken.csv", "Claim_ID,Amount_EUR\nC9,10\n").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = json(res.body());
    assert_eq!(body["error"], "unreadable_file");
    assert!(body["message"].as_str().unwrap().contains("Damage_Type"));

    let res = upload(&api, &token, "claims.pdf", CLAIMS_CSV).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = get(&api, &token, "/api/metrics").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json(res.body())["claim_count"], 3);
}

#[tokio::test]
async fn test_requests_before_upload_are_invalid_input() {
    let api = routes(state());
    let token = login(&api).await;

    for route in ["/api/metrics", "/api/claims", "/api/alerts", "/api/chart/regions"] {
        let res = get(&api, &token, route).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", route);
        assert_eq!(json(res.body())["error"], "invalid_input");
    }

    let res = get(&api, &token, "/api/exposure").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json(res.body())["average_claim"], Value::Null);
}

#[tokio::test]
async fn test_alert_threshold_is_validated_and_remembered() {
    let api = routes(state());
    let token = login(&api).await;
    upload(&api, &token, "claims.csv", CLAIMS_CSV).await;

    let res = get(&api, &token, "/api/alerts?threshold=3000").await;
    let alerts = json(res.body());
    assert_eq!(alerts["claims"].as_array().unwrap().len(), 1);
    assert_eq!(alerts["claims"][0]["claim_id"], "C2");
    assert_eq!(alerts["claims"][0]["region"], "B");

    let res = get(&api, &token, "/api/alerts?threshold=100").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(res.body())["error"], "invalid_input");

    let res = get(&api, &token, "/api/alerts?threshold=abc").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = get(&api, &token, "/api/alerts?threshold=6000").await;
    assert!(json(res.body())["claims"].as_array().unwrap().is_empty());

    let res = get(&api, &token, "/api/alerts").await;
    let alerts = json(res.body());
    assert_eq!(alerts["threshold"], 6000.0);
    assert!(alerts["claims"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_region_chart_is_svg() {
    let api = routes(state());
    let token = login(&api).await;
    upload(&api, &token, "claims.csv", CLAIMS_CSV).await;

    let res = get(&api, &token, "/api/chart/regions").await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/svg+xml");
    let svg = String::from_utf8(res.body().to_vec()).unwrap();
    assert!(svg.contains("A: 3000.00 EUR (2 claims)"));
    assert!(svg.contains("B: 5000.00 EUR (1 claims)"));
}

#[tokio::test]
async fn test_advisor_answer_flows_into_report() {
    let advisor = Arc::new(CannedAdvisor {
        answer: "Focus on <Attica>.".to_string(),
        seen: Mutex::new(Vec::new()),
    });
    let api = routes(state().with_advisor(advisor.clone()));
    let token = login(&api).await;
    upload(&api, &token, "claims.csv", CLAIMS_CSV).await;

    let res = post(&api, &token, "/api/advisor", serde_json::json!({"question": "  "})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = post(
        &api,
        &token,
        "/api/advisor",
        serde_json::json!({"question": "Ποια περιοχή έχει τον μεγαλύτερο κίνδυνο;"}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json(res.body())["answer"], "Focus on <Attica>.");

    {
        let seen = advisor.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].claims.len(), 3);
        assert_eq!(seen[0].event.location, "Attica");
        assert_eq!(seen[0].metrics.as_ref().map(|m| m.total_amount), Some(8000.0));
    }

    let res = warp::test::request()
        .method("POST")
        .path("/api/report")
        .header("authorization", format!("Bearer {}", token))
        .body("")
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "text/html; charset=utf-8");
    let disposition = res.headers()["content-disposition"].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"claims-report-"));

    let html = String::from_utf8(res.body().to_vec()).unwrap();
    assert!(html.contains("Ποια περιοχή έχει τον μεγαλύτερο κίνδυνο;"));
    assert!(html.contains("Focus on &lt;Attica&gt;."));
    assert!(html.contains("Πλημμύρα"));
}

#[tokio::test]
async fn test_advisor_failures_are_reported_not_fatal() {
    let api = routes(state());
    let token = login(&api).await;
    upload(&api, &token, "claims.csv", CLAIMS_CSV).await;

    let res = post(&api, &token, "/api/advisor", serde_json::json!({"question": "Why?"})).await;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json(res.body())["error"], "external_service");

    let api = routes(state().with_advisor(Arc::new(TimingOutAdvisor)));
    let token = login(&api).await;
    upload(&api, &token, "claims.csv", CLAIMS_CSV).await;

    let res = post(&api, &token, "/api/advisor", serde_json::json!({"question": "Why?"})).await;
    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(json(res.body())["error"], "external_service_timeout");

    let res = get(&api, &token, "/api/metrics").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_report_with_explicit_qa() {
    let api = routes(state());
    let token = login(&api).await;
    upload(&api, &token, "claims.csv", CLAIMS_CSV).await;

    let res = post(&api, &token, "/api/report", serde_json::json!({"question": "Q?"})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = post(
        &api,
        &token,
        "/api/report",
        serde_json::json!({"question": "Q?", "answer": "A & B"}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = String::from_utf8(res.body().to_vec()).unwrap();
    assert!(html.contains("A &amp; B"));
}

#[tokio::test]
async fn test_reupload_forgets_previous_answer() {
    let advisor = Arc::new(CannedAdvisor {
        answer: "Region B carries the largest claim.".to_string(),
        seen: Mutex::new(Vec::new()),
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let api = routes(state().with_advisor(advisor).with_notifier(notifier.clone()));
    let token = login(&api).await;
    upload(&api, &token, "claims.csv", CLAIMS_CSV).await;

    let res = post(&api, &token, "/api/advisor", serde_json::json!({"question": "Which region?"})).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = upload(
        &api,
        &token,
        "march.csv",
        "Claim_ID,Amount_EUR,Damage_Type,Region\nM1,700,Hail,Crete\n",
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = post(&api, &token, "/api/report", serde_json::json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    let html = String::from_utf8(res.body().to_vec()).unwrap();
    assert!(html.contains("march.csv"));
    assert!(!html.contains("Which region?"));
    assert!(!html.contains("Region B carries the largest claim."));

    let res = post(&api, &token, "/api/notify", serde_json::json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    let sent = notifier.sent.lock().unwrap();
    assert!(!sent[0].body.contains("Which region?"));
}

#[tokio::test]
async fn test_notify_sends_alert_summary_with_report() {
    let notifier = Arc::new(RecordingNotifier::default());
    let api = routes(state().with_notifier(notifier.clone()));
    let token = login(&api).await;
    upload(&api, &token, "claims.csv", CLAIMS_CSV).await;
    get(&api, &token, "/api/alerts?threshold=3000").await;

    let res = post(&api, &token, "/api/notify", serde_json::json!({"attach_report": true})).await;
    assert_eq!(res.status(), StatusCode::OK);
    let status = json(res.body());
    assert_eq!(status["delivered"], true);
    assert_eq!(status["provider_message_id"], "msg-1");

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "1 claims above 3000.00 EUR in claims.csv");
    assert!(sent[0].body.contains("- C2: 5000.00 EUR"));
    assert_eq!(sent[0].attachments.len(), 1);
    assert!(sent[0].attachments[0].filename.ends_with(".html"));
}

#[tokio::test]
async fn test_notify_default_body_is_plain_text_report() {
    let advisor = Arc::new(CannedAdvisor {
        answer: "Review the Fire claim in B.".to_string(),
        seen: Mutex::new(Vec::new()),
    });
    let notifier = Arc::new(RecordingNotifier::default());
    let api = routes(state().with_advisor(advisor).with_notifier(notifier.clone()));
    let token = login(&api).await;
    upload(&api, &token, "claims.csv", CLAIMS_CSV).await;
    post(&api, &token, "/api/advisor", serde_json::json!({"question": "What stands out?"})).await;

    let res = post(&api, &token, "/api/notify", serde_json::json!({"subject": "Weekly claims"})).await;
    assert_eq!(res.status(), StatusCode::OK);

    let sent = notifier.sent.lock().unwrap();
    assert_eq!(sent[0].subject, "Weekly claims");
    let body = &sent[0].body;
    let summary_at = body.find("1 claims in claims.csv exceed 3000.00 EUR").unwrap();
    let report_at = body.find("SUMMARY").unwrap();
    assert!(summary_at < report_at);
    assert!(body.contains("Total:      8000.00 EUR"));
    assert!(body.contains("Top region: A"));
    assert!(body.contains("C2  5000.00 EUR  Fire  B"));
    assert!(body.contains("Q: What stands out?"));
    assert!(body.contains("A: Review the Fire claim in B."));
    assert!(sent[0].attachments.is_empty());
}

#[tokio::test]
async fn test_notify_with_explicit_message_needs_no_dataset() {
    let notifier = Arc::new(RecordingNotifier::default());
    let api = routes(state().with_notifier(notifier.clone()));
    let token = login(&api).await;

    let res = post(
        &api,
        &token,
        "/api/notify",
        serde_json::json!({"subject": "Check-in", "body": "Nothing loaded yet", "priority": "low"}),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(notifier.sent.lock().unwrap()[0].subject, "Check-in");

    let res = post(&api, &token, "/api/notify", serde_json::json!({})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_notify_failure_through_email_provider() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let email = EmailConfig {
        resend_api_key: "test-api-key".to_string(),
        resend_base_url: Some(server.uri()),
        from_email: "alerts@claims.example".to_string(),
        to_email: "analyst@claims.example".to_string(),
        timeout_secs: 5,
        ..EmailConfig::default()
    };
    let provider = EmailProvider::new(email).unwrap().with_retry_config(RetryConfig::no_retry());

    let api = routes(state().with_notifier(Arc::new(provider)));
    let token = login(&api).await;
    upload(&api, &token, "claims.csv", CLAIMS_CSV).await;

    let res = post(&api, &token, "/api/notify", serde_json::json!({})).await;
    assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    assert!(json(res.body())["message"].as_str().unwrap().starts_with("notifier:"));

    let res = get(&api, &token, "/api/claims").await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_sessions_are_isolated_and_logout_ends_session() {
    let api = routes(state());
    let first = login(&api).await;
    let second = login(&api).await;
    assert_ne!(first, second);

    upload(&api, &first, "claims.csv", CLAIMS_CSV).await;

    assert_eq!(get(&api, &first, "/api/metrics").await.status(), StatusCode::OK);
    assert_eq!(get(&api, &second, "/api/metrics").await.status(), StatusCode::BAD_REQUEST);

    let res = warp::test::request()
        .method("POST")
        .path("/api/logout")
        .header("authorization", format!("Bearer {}", first))
        .reply(&api)
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    assert_eq!(get(&api, &first, "/api/metrics").await.status(), StatusCode::UNAUTHORIZED);
}
