#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test, web};
use quillpad::AppState;
use serde_json::{json, Value};

/// bcrypt's minimum cost keeps the suite fast.
pub const TEST_BCRYPT_COST: u32 = 4;

pub fn test_state() -> web::Data<AppState> {
    web::Data::new(AppState::in_memory(TEST_BCRYPT_COST).expect("failed to build test state"))
}

/// Calls the service and returns the status with the body parsed as JSON
/// (`Value::Null` for an empty body).
pub async fn send(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    req: Request,
) -> (StatusCode, Value) {
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    if body.is_empty() {
        return (status, Value::Null);
    }
    let json = serde_json::from_slice(&body).unwrap_or_else(|e| {
        panic!(
            "response is not JSON ({}): {:?}",
            e,
            String::from_utf8_lossy(&body)
        )
    });
    (status, json)
}

/// Recursively looks for a `password`-like key. The `errors` map of a validation failure
/// names fields, not values, and is skipped.
pub fn contains_password_field(value: &Value) -> bool {
    match value {
        Value::Object(map) => map
            .iter()
            .any(|(k, v)| k != "errors" && (k.contains("password") || contains_password_field(v))),
        Value::Array(items) => items.iter().any(contains_password_field),
        _ => false,
    }
}

/// Registers a user and logs in, returning the bearer token.
pub async fn register_and_login(
    app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    name: &str,
    email: &str,
    password: &str,
) -> String {
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({ "name": name, "email": email, "password": password }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": email, "password": password }))
        .to_request();
    let (status, body) = send(app, req).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    body["token"]
        .as_str()
        .expect("login response has a token")
        .to_string()
}
