use std::sync::Arc;
use std::time::Duration;

use cms_block::{case_studies, posts, uploads};
use lambda_http::http::header::{HeaderValue, VARY};
use lambda_http::{
    http::{Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use studio_atoms::media::CancelFlag;
use studio_shared::{auth, AppConfig, AppState};
use tokio::task::JoinHandle;

// Uploads give up this long before the invocation deadline
const DEADLINE_MARGIN_MS: u64 = 1_500;

fn with_cors_headers(
    mut resp: Response<Body>,
    config: &AppConfig,
    request_origin: Option<&str>,
) -> Response<Body> {
    let cors_origin = auth::get_cors_origin(config, request_origin);

    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(&cors_origin).unwrap_or_else(|_| HeaderValue::from_static("*")),
    );
    headers.insert("Access-Control-Allow-Credentials", HeaderValue::from_static("true"));
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,PATCH,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Cookie"),
    );
    headers.append(VARY, HeaderValue::from_static("Origin"));

    resp
}

fn finalize_response(
    resp: Result<Response<Body>, Error>,
    config: &AppConfig,
    request_origin: Option<&str>,
) -> Result<Response<Body>, Error> {
    resp.map(|r| with_cors_headers(r, config, request_origin))
}

/// Cancel flag that trips shortly before the Lambda deadline, so a slow
/// upload is abandoned instead of being killed mid-response
fn deadline_cancel_flag(event: &Request) -> (CancelFlag, Option<JoinHandle<()>>) {
    let flag = CancelFlag::new();
    let Some(deadline) = event
        .lambda_context_ref()
        .map(|ctx| ctx.deadline)
        .filter(|deadline| *deadline > 0)
    else {
        return (flag, None);
    };

    let now_ms = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
    let remaining = deadline
        .saturating_sub(now_ms)
        .saturating_sub(DEADLINE_MARGIN_MS);

    let trip = flag.clone();
    let timer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(remaining)).await;
        tracing::warn!("⏱️ Invocation deadline is close, cancelling upload");
        trip.cancel();
    });
    (flag, Some(timer))
}

/// Main Lambda handler - routes public content reads and the admin CMS
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    let body = event.body();
    let config = &state.config;
    let request_origin = event.headers().get("Origin").and_then(|v| v.to_str().ok());
    tracing::info!("🚀 Studio API invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if *method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, config, request_origin));
    }

    let table_name = config.table_name.as_str();
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // Session endpoints (no session required)
    match (method, parts.as_slice()) {
        (&Method::POST, ["admin", "login"]) => {
            return finalize_response(auth::login(config, body), config, request_origin);
        }
        (&Method::POST, ["admin", "logout"]) => {
            return finalize_response(auth::logout(), config, request_origin);
        }
        _ => {}
    }

    // Everything else under /admin requires a live session
    if parts.first() == Some(&"admin") {
        let cookie_header = event.headers().get("Cookie").and_then(|v| v.to_str().ok());
        if let Err(resp) = auth::authenticate_admin(config, cookie_header) {
            return Ok(with_cors_headers(resp, config, request_origin));
        }

        let client = &state.dynamo_client;
        let resp = match (method, &parts[1..]) {
            // --- POSTS ---
            (&Method::GET, ["posts"]) => posts::list_posts(client, table_name).await,
            (&Method::POST, ["posts"]) => posts::create_post(client, table_name, body).await,
            (&Method::GET, ["posts", post_id]) => posts::get_post(client, table_name, post_id).await,
            (&Method::PATCH, ["posts", post_id]) => {
                posts::update_post(client, table_name, post_id, body).await
            }
            (&Method::DELETE, ["posts", post_id]) => {
                posts::delete_post(client, table_name, post_id).await
            }

            // --- CASE STUDIES ---
            (&Method::GET, ["case-studies"]) => {
                case_studies::list_case_studies(client, table_name).await
            }
            (&Method::POST, ["case-studies"]) => {
                case_studies::create_case_study(client, table_name, body).await
            }
            (&Method::GET, ["case-studies", case_study_id]) => {
                case_studies::get_case_study(client, table_name, case_study_id).await
            }
            (&Method::PATCH, ["case-studies", case_study_id]) => {
                case_studies::update_case_study(client, table_name, case_study_id, body).await
            }
            (&Method::DELETE, ["case-studies", case_study_id]) => {
                case_studies::delete_case_study(client, table_name, case_study_id).await
            }

            // --- UPLOADS ---
            (&Method::POST, ["uploads", area]) => {
                let (cancel, timer) = deadline_cancel_flag(&event);
                let resp = uploads::upload_image(
                    &state.optimizer,
                    &state.storage,
                    &config.bucket_name,
                    area,
                    body,
                    &cancel,
                )
                .await;
                if let Some(timer) = timer {
                    timer.abort();
                }
                resp
            }
            (&Method::POST, ["uploads", area, "gallery"]) => {
                let (cancel, timer) = deadline_cancel_flag(&event);
                let resp = uploads::upload_gallery_images(
                    &state.optimizer,
                    &state.storage,
                    &config.bucket_name,
                    area,
                    body,
                    &cancel,
                )
                .await;
                if let Some(timer) = timer {
                    timer.abort();
                }
                resp
            }
            _ => not_found(),
        };

        return finalize_response(resp, config, request_origin);
    }

    // Public site reads
    let client = &state.dynamo_client;
    let resp = match (method, parts.as_slice()) {
        (&Method::GET, ["posts"]) => posts::list_published_posts(client, table_name).await,
        (&Method::GET, ["posts", slug]) => posts::get_published_post(client, table_name, slug).await,
        (&Method::GET, ["case-studies"]) => {
            case_studies::list_published_case_studies(client, table_name).await
        }
        (&Method::GET, ["case-studies", slug]) => {
            case_studies::get_published_case_study(client, table_name, slug).await
        }
        _ => not_found(),
    };

    finalize_response(resp, config, request_origin)
}

fn not_found() -> Result<Response<Body>, Error> {
    tracing::warn!("No route matched");
    Ok(Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(serde_json::json!({"error": "Not found"}).to_string().into())
        .map_err(Box::new)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::config::{BehaviorVersion, Region};
    use studio_atoms::media::ImageOptimizer;
    use studio_shared::S3Storage;

    // Clients are built offline; these tests only hit routes that never call AWS
    fn state() -> Arc<AppState> {
        let config = AppConfig::from_lookup(|key| match key {
            "ADMIN_PASSWORD" => Some("hunter2".to_string()),
            "SESSION_SECRET" => Some("secret".to_string()),
            "CORS_ORIGIN" => Some("https://studio.example".to_string()),
            _ => None,
        });
        let dynamo_config = aws_sdk_dynamodb::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("ap-southeast-2"))
            .build();
        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("ap-southeast-2"))
            .build();

        Arc::new(AppState {
            dynamo_client: aws_sdk_dynamodb::Client::from_conf(dynamo_config),
            storage: S3Storage::new(aws_sdk_s3::Client::from_conf(s3_config), "ap-southeast-2", None),
            optimizer: ImageOptimizer::raster(),
            config,
        })
    }

    fn request(method: &str, path: &str, body: &str, cookie: Option<&str>) -> Request {
        let mut builder = lambda_http::http::Request::builder().method(method).uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header("Cookie", cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn preflight_gets_cors_headers() {
        let resp = function_handler(request("OPTIONS", "/admin/posts", "", None), state())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("Access-Control-Allow-Origin").unwrap(),
            "https://studio.example"
        );
    }

    #[tokio::test]
    async fn admin_routes_need_a_session() {
        for (method, path) in [
            ("GET", "/admin/posts"),
            ("DELETE", "/admin/case-studies/c1"),
            ("POST", "/admin/uploads/blog"),
        ] {
            let resp = function_handler(request(method, path, "{}", None), state())
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{} {}", method, path);
        }
    }

    #[tokio::test]
    async fn login_then_reach_admin_only_routes() {
        let state = state();
        let resp = function_handler(
            request("POST", "/admin/login", r#"{"password":"hunter2"}"#, None),
            Arc::clone(&state),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let set_cookie = resp.headers().get("Set-Cookie").unwrap().to_str().unwrap();
        let cookie = set_cookie.split(';').next().unwrap().to_string();

        // Unknown upload area is rejected before any AWS call
        let resp = function_handler(
            request("POST", "/admin/uploads/videos", r#"{"file_name":"a.png","data":""}"#, Some(&cookie)),
            Arc::clone(&state),
        )
        .await
        .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = function_handler(request("PUT", "/admin/posts/p1", "{}", Some(&cookie)), state)
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn logout_clears_cookie_and_unknown_routes_404() {
        let resp = function_handler(request("POST", "/admin/logout", "", None), state())
            .await
            .unwrap();
        let cookie = resp.headers().get("Set-Cookie").unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));

        let resp = function_handler(request("GET", "/services", "", None), state())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
