use crate::{
    auth::{AuthMiddleware, Authenticated, LoginRequest, RegisterRequest},
    error::AppError,
    routes::parse_body,
    state::AppState,
};
use actix_web::{get, post, web, HttpResponse, Responder};
use serde_json::{json, Value};

/// Register a new user
///
/// Creates a new account and returns it (without any password material) with `201`.
#[post("/register")]
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<impl Responder, AppError> {
    let request: RegisterRequest = parse_body(body.into_inner())?;
    let user = state.auth.register(request).await?;
    Ok(HttpResponse::Created().json(user))
}

/// Login user
///
/// Authenticates a user and returns `{user, token, message}`.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<impl Responder, AppError> {
    let request: LoginRequest = parse_body(body.into_inner())?;
    let response = state.auth.login(request).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// Logout user
///
/// Revokes the token the request was made with. Other tokens of the same user stay valid.
#[post("/logout", wrap = "AuthMiddleware")]
pub async fn logout(
    state: web::Data<AppState>,
    auth: Authenticated,
) -> Result<impl Responder, AppError> {
    state.auth.logout(&auth.token).await?;
    log::info!("user {} logged out", auth.user.id);
    Ok(HttpResponse::Ok().json(json!({ "message": "Logged out successfully." })))
}

/// Current user
#[get("/user", wrap = "AuthMiddleware")]
pub async fn current_user(auth: Authenticated) -> impl Responder {
    HttpResponse::Ok().json(auth.user)
}
