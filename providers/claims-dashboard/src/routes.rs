use std::convert::Infallible;
use warp::{Filter, Rejection, Reply};

use crate::auth::bearer_token;
use crate::error::{recover, DashboardError};
use crate::handlers;
use crate::session::SessionState;
use crate::state::AppState;

/// Upper bound on small JSON request bodies
const JSON_BODY_LIMIT: u64 = 64 * 1024;

fn with_state(state: AppState) -> impl Filter<Extract = (AppState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

async fn authorize(header: Option<String>, state: AppState) -> Result<SessionState, Rejection> {
    let token = bearer_token(header.as_deref()).map_err(DashboardError::from)?;
    let session = state.sessions.get(token).await.map_err(DashboardError::from)?;
    Ok(session)
}

/// Resolves the bearer token to a live session or rejects with 401
fn with_session(state: AppState) -> impl Filter<Extract = (SessionState,), Error = Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .and(with_state(state))
        .and_then(authorize)
}

/// Every dashboard route, with JSON error recovery and request tracing
pub fn routes(state: AppState) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let upload_limit = state.config.analysis.max_upload_bytes as u64;

    let index = warp::path::end()
        .and(warp::get())
        .and(with_state(state.clone()))
        .and_then(handlers::index);

    let health = warp::path!("health").and(warp::get()).and_then(handlers::health);

    let login = warp::path!("api" / "login")
        .and(warp::post())
        .and(warp::body::content_length_limit(JSON_BODY_LIMIT))
        .and(warp::body::json())
        .and(with_state(state.clone()))
        .and_then(handlers::login);

    let logout = warp::path!("api" / "logout")
        .and(warp::post())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handlers::logout);

    let upload = warp::path!("api" / "claims")
        .and(warp::post())
        .and(warp::query::<handlers::UploadQuery>())
        .and(warp::body::content_length_limit(upload_limit))
        .and(warp::body::bytes())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handlers::upload_claims);

    let list = warp::path!("api" / "claims")
        .and(warp::get())
        .and(with_session(state.clone()))
        .and_then(handlers::list_claims);

    let metrics = warp::path!("api" / "metrics")
        .and(warp::get())
        .and(with_session(state.clone()))
        .and_then(handlers::metrics);

    let alerts = warp::path!("api" / "alerts")
        .and(warp::get())
        .and(warp::query::<handlers::AlertsQuery>())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handlers::alerts);

    let exposure = warp::path!("api" / "exposure")
        .and(warp::get())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handlers::exposure);

    let chart = warp::path!("api" / "chart" / "regions")
        .and(warp::get())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handlers::region_chart);

    let advisor = warp::path!("api" / "advisor")
        .and(warp::post())
        .and(warp::body::content_length_limit(JSON_BODY_LIMIT))
        .and(warp::body::json())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handlers::ask_advisor);

    let report = warp::path!("api" / "report")
        .and(warp::post())
        .and(warp::body::content_length_limit(JSON_BODY_LIMIT))
        .and(warp::body::bytes())
        .and(with_session(state.clone()))
        .and(with_state(state.clone()))
        .and_then(handlers::report);

    let notify = warp::path!("api" / "notify")
        .and(warp::post())
        .and(warp::body::content_length_limit(JSON_BODY_LIMIT))
        .and(warp::body::bytes())
        .and(with_session(state.clone()))
        .and(with_state(state))
        .and_then(handlers::notify);

    index
        .or(health)
        .or(login)
        .or(logout)
        .or(upload)
        .or(list)
        .or(metrics)
        .or(alerts)
        .or(exposure)
        .or(chart)
        .or(advisor)
        .or(report)
        .or(notify)
        .recover(recover)
        .with(warp::trace::request())
}
