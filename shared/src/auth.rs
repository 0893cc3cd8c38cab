use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use lambda_http::http::header::{HeaderValue, CONTENT_TYPE};
use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error as ThisError;

use crate::config::AppConfig;

type HmacSha256 = Hmac<Sha256>;

pub const SESSION_COOKIE: &str = "studio_session";

#[derive(ThisError, Debug, PartialEq)]
pub enum AuthError {
    #[error("Admin login is not configured")]
    NotConfigured,
    #[error("Invalid password")]
    InvalidPassword,
    #[error("Not signed in")]
    MissingSession,
    #[error("Invalid session")]
    InvalidSession,
    #[error("Session expired")]
    Expired,
}

#[derive(Deserialize)]
struct LoginPayload {
    password: String,
}

fn mac_for(secret: &str) -> Result<HmacSha256, AuthError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::NotConfigured)
}

fn sign(secret: &str, payload: &str) -> Result<String, AuthError> {
    let mut mac = mac_for(secret)?;
    mac.update(payload.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
}

/// Compare via HMAC tags so the check takes the same time for any input
pub fn password_matches(secret: &str, expected: &str, candidate: &str) -> bool {
    let Ok(mut expected_mac) = mac_for(secret) else {
        return false;
    };
    expected_mac.update(expected.as_bytes());
    let expected_tag = expected_mac.finalize().into_bytes();

    let Ok(mut candidate_mac) = mac_for(secret) else {
        return false;
    };
    candidate_mac.update(candidate.as_bytes());
    candidate_mac.verify_slice(&expected_tag).is_ok()
}

/// Session token: `<expiry unix seconds>.<base64url(HMAC-SHA256(secret, expiry))>`
pub fn issue_session(secret: &str, ttl_hours: i64, now: DateTime<Utc>) -> Result<String, AuthError> {
    let expiry = (now + Duration::hours(ttl_hours)).timestamp().to_string();
    let signature = sign(secret, &expiry)?;
    Ok(format!("{}.{}", expiry, signature))
}

/// Returns the session expiry when the token is authentic and still live
pub fn verify_session(secret: &str, token: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, AuthError> {
    let (expiry, signature) = token.split_once('.').ok_or(AuthError::InvalidSession)?;
    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| AuthError::InvalidSession)?;

    let mut mac = mac_for(secret)?;
    mac.update(expiry.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| AuthError::InvalidSession)?;

    let expires_at = expiry
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .ok_or(AuthError::InvalidSession)?;

    if expires_at <= now {
        return Err(AuthError::Expired);
    }
    Ok(expires_at)
}

pub fn session_cookie(token: &str, ttl_hours: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl_hours * 3600
    )
}

pub fn clear_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0", name)
}

/// Pull one cookie value out of a `Cookie` request header
pub fn read_cookie<'a>(cookie_header: Option<&'a str>, name: &str) -> Option<&'a str> {
    cookie_header?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Origin to echo back; credentials need a concrete origin, not `*`
pub fn get_cors_origin(config: &AppConfig, request_origin: Option<&str>) -> String {
    match (config.cors_origin.as_str(), request_origin) {
        ("*", Some(origin)) => origin.to_string(),
        (configured, _) => configured.to_string(),
    }
}

/// Check the session cookie of an admin request.
///
/// On failure the ready-made 401 response is returned for the router to send.
pub fn authenticate_admin(config: &AppConfig, cookie_header: Option<&str>) -> Result<(), Response<Body>> {
    let result = match (config.session_secret.as_deref(), read_cookie(cookie_header, SESSION_COOKIE)) {
        (None, _) => Err(AuthError::NotConfigured),
        (_, None) => Err(AuthError::MissingSession),
        (Some(secret), Some(token)) => verify_session(secret, token, Utc::now()).map(|_| ()),
    };

    result.map_err(|e| {
        tracing::warn!("🔒 Admin request rejected: {}", e);
        unauthorized(&e.to_string())
    })
}

fn json_error(status: StatusCode, message: &str) -> Response<Body> {
    let mut resp = Response::new(Body::from(
        serde_json::json!({ "error": message }).to_string(),
    ));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

fn unauthorized(message: &str) -> Response<Body> {
    json_error(StatusCode::UNAUTHORIZED, message)
}

/// POST /admin/login
pub fn login(config: &AppConfig, body: &[u8]) -> Result<Response<Body>, Error> {
    let req: LoginPayload = match serde_json::from_slice(body) {
        Ok(req) => req,
        Err(e) => {
            tracing::warn!("Rejected login payload: {}", e);
            return Ok(json_error(
                StatusCode::BAD_REQUEST,
                &format!("Invalid request body: {}", e),
            ));
        }
    };

    let (Some(expected), Some(secret)) = (config.admin_password.as_deref(), config.session_secret.as_deref()) else {
        tracing::error!("❌ Admin login attempted without ADMIN_PASSWORD/SESSION_SECRET configured");
        return Ok(Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .header("Content-Type", "application/json")
            .body(
                serde_json::json!({"error": AuthError::NotConfigured.to_string()})
                    .to_string()
                    .into(),
            )
            .map_err(Box::new)?);
    };

    if !password_matches(secret, expected, &req.password) {
        tracing::warn!("🔒 Admin login failed");
        return Ok(unauthorized(&AuthError::InvalidPassword.to_string()));
    }

    let token = issue_session(secret, config.session_ttl_hours, Utc::now())?;
    tracing::info!("🔑 Admin session issued for {}h", config.session_ttl_hours);

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Set-Cookie", session_cookie(&token, config.session_ttl_hours))
        .body(serde_json::json!({"message": "ok"}).to_string().into())
        .map_err(Box::new)?)
}

/// POST /admin/logout
pub fn logout() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .header("Set-Cookie", clear_cookie(SESSION_COOKIE))
        .body(serde_json::json!({"message": "ok"}).to_string().into())
        .map_err(Box::new)?)
}
