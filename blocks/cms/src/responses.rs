use lambda_http::{http::StatusCode, Body, Error, Response};
use serde::Serialize;
use studio_atoms::{ContentError, MediaError};

pub fn json<T: Serialize>(status: StatusCode, value: &T) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(serde_json::to_string(value)?.into())
        .map_err(Box::new)?)
}

pub fn error(status: StatusCode, message: &str) -> Result<Response<Body>, Error> {
    json(status, &serde_json::json!({ "error": message }))
}

pub fn no_content() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .body(Body::Empty)
        .map_err(Box::new)?)
}

/// Body that failed to deserialize; the serde message names the bad field
pub fn bad_payload(e: serde_json::Error) -> Result<Response<Body>, Error> {
    tracing::warn!("Rejected payload: {}", e);
    error(StatusCode::BAD_REQUEST, &format!("Invalid request body: {}", e))
}

pub fn content_status(e: &ContentError) -> StatusCode {
    match e {
        ContentError::NotFound(_) => StatusCode::NOT_FOUND,
        ContentError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ContentError::MinimumBlocks
        | ContentError::IndexOutOfRange { .. }
        | ContentError::FieldMismatch { .. }
        | ContentError::InvalidBlocks(_)
        | ContentError::Validation(_) => StatusCode::BAD_REQUEST,
    }
}

pub fn content_error(e: ContentError) -> Result<Response<Body>, Error> {
    let status = content_status(&e);
    if status.is_server_error() {
        tracing::error!("❌ Content request failed: {}", e);
    }
    error(status, &e.to_string())
}

pub fn media_status(e: &MediaError) -> StatusCode {
    match e {
        MediaError::Decode(_) | MediaError::InvalidOptions(_) => StatusCode::UNPROCESSABLE_ENTITY,
        MediaError::Upload(_) => StatusCode::BAD_GATEWAY,
        MediaError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        MediaError::Encode(_) | MediaError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn media_error(e: MediaError) -> Result<Response<Body>, Error> {
    error(media_status(&e), &e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses() {
        assert_eq!(content_status(&ContentError::MinimumBlocks), StatusCode::BAD_REQUEST);
        assert_eq!(content_status(&ContentError::NotFound("Post".into())), StatusCode::NOT_FOUND);
        assert_eq!(media_status(&MediaError::decode("bad")), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(media_status(&MediaError::upload("s3")), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn error_body_is_json() {
        let resp = error(StatusCode::NOT_FOUND, "Post not found").unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        match resp.body() {
            Body::Text(text) => assert_eq!(text, r#"{"error":"Post not found"}"#),
            other => panic!("unexpected body {:?}", other),
        }
    }
}
