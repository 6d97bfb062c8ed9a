//! Controller for BankID authentication.
//!
//! The transaction key never appears in a response body. It travels in the
//! `bankidTransaction` cookie, scoped to `/bankid`.

use std::net::SocketAddr;

use crate::params::bankid::StartParams;
use crate::{AppState, Error};

use axum::extract::{ConnectInfo, Query, State};
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use bankid::status::{TRANSACTION_EXPIRED, TRANSACTION_NOT_STARTED};
use bankid::{is_mobile_user_agent, StartRequest, Status, StatusResponse};
use log::*;
use service::config::Config;

pub(crate) const TRANSACTION_COOKIE: &str = "bankidTransaction";
const COOKIE_PATH: &str = "/bankid";

/// POST /bankid/start
///
/// Start a BankID authentication on the same or another device.
#[utoipa::path(
    post,
    path = "/bankid/start",
    params(StartParams),
    responses(
        (status = 200, description = "Started. Body carries `launchUrl` or `qrCodeData`, the transaction cookie is set"),
        (status = 401, description = "BankID refused to start the order, or the CSRF header is missing"),
        (status = 502, description = "BankID could not be reached"),
    ),
    security(
        ("csrf_header" = [])
    )
)]
pub async fn start(
    State(app_state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    Query(params): Query<StartParams>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<Response, Error> {
    let provider = app_state.provider();

    // Only one live transaction per browser.
    if let Some(previous) = transaction_key(&jar) {
        debug!("Cancelling previous BankID transaction before starting a new one");
        provider.cancel(&previous).await;
    }

    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let request = StartRequest {
        same_device: params.same_device(),
        is_mobile: is_mobile_user_agent(user_agent),
        user_ip: client_ip(&headers, peer, app_state.config.trust_forwarded_for),
        message_for_user: app_state.config.visible_message.clone(),
    };
    debug!(
        "Starting BankID authentication (same device: {}, mobile: {})",
        request.same_device, request.is_mobile
    );

    let response = provider.start(request).await?;
    match response.transaction_key.clone() {
        Some(key) if response.success => {
            let jar = jar.add(transaction_cookie(&app_state.config, key));
            Ok((StatusCode::OK, jar, Json(response)).into_response())
        }
        _ => Ok((StatusCode::UNAUTHORIZED, Json(response)).into_response()),
    }
}

/// GET /bankid/status
///
/// Collect the current state of the authentication named by the transaction cookie.
#[utoipa::path(
    get,
    path = "/bankid/status",
    responses(
        (status = 200, description = "Pending or complete"),
        (status = 400, description = "No transaction cookie"),
        (status = 401, description = "The authentication failed or the transaction is gone"),
        (status = 502, description = "BankID could not be reached"),
    )
)]
pub async fn status(
    State(app_state): State<AppState>,
    jar: CookieJar,
) -> Result<impl IntoResponse, Error> {
    let Some(key) = transaction_key(&jar) else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::failed(TRANSACTION_EXPIRED)),
        ));
    };

    let response = app_state.provider().status(&key).await?;
    let code = match response.status {
        Status::Failed => StatusCode::UNAUTHORIZED,
        Status::Pending | Status::Complete => StatusCode::OK,
    };
    Ok((code, Json(response)))
}

/// POST /bankid/cancel
///
/// Cancel the authentication named by the transaction cookie.
#[utoipa::path(
    post,
    path = "/bankid/cancel",
    responses(
        (status = 204, description = "Cancelled, the transaction cookie is cleared"),
        (status = 400, description = "No transaction cookie"),
        (status = 401, description = "The CSRF header is missing"),
    ),
    security(
        ("csrf_header" = [])
    )
)]
pub async fn cancel(State(app_state): State<AppState>, jar: CookieJar) -> Response {
    let Some(key) = transaction_key(&jar) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(StatusResponse::failed(TRANSACTION_NOT_STARTED)),
        )
            .into_response();
    };

    app_state.provider().cancel(&key).await;
    let jar = jar.remove(Cookie::build(TRANSACTION_COOKIE).path(COOKIE_PATH));
    (StatusCode::NO_CONTENT, jar).into_response()
}

pub(crate) fn transaction_key(jar: &CookieJar) -> Option<String> {
    jar.get(TRANSACTION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|key| !key.is_empty())
}

fn transaction_cookie(config: &Config, key: String) -> Cookie<'static> {
    let mut cookie = Cookie::build((TRANSACTION_COOKIE, key))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path(COOKIE_PATH)
        .max_age(time::Duration::seconds(config.session_timeout_secs as i64))
        .secure(config.is_production());
    if let Some(domain) = config.cookie_domain() {
        cookie = cookie.domain(domain.to_string());
    }
    cookie.build()
}

/// End user IP as seen by this service.
fn client_ip(headers: &HeaderMap, peer: SocketAddr, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    peer.ip().to_string()
}
