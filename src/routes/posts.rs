use crate::{
    error::AppError,
    models::{PostInput, PostUpdate},
    routes::parse_body,
    state::AppState,
};
use actix_web::{delete, get, post, route, web, HttpResponse, Responder};
use serde_json::Value;
use validator::Validate;

fn not_found() -> AppError {
    AppError::NotFound("Post not found".into())
}

/// Lists every post, oldest first.
#[get("/posts")]
pub async fn list_posts(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let posts = state.posts.list().await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Creates a post.
///
/// ## Responses:
/// - `201 Created`: the new `Post`.
/// - `422 Unprocessable Entity`: `title` or `content` missing or invalid.
#[post("/posts")]
pub async fn create_post(
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> Result<impl Responder, AppError> {
    let post_data: PostInput = parse_body(body.into_inner())?;
    post_data.validate()?;
    let post = state.posts.create(post_data.into_new_post()).await?;
    Ok(HttpResponse::Created().json(post))
}

#[get("/posts/{id}")]
pub async fn get_post(
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    let post = state.posts.get(post_id.into_inner()).await?.ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(post))
}

/// Updates the fields present in the body; absent fields are left untouched.
///
/// An unknown id is reported before the body is validated.
#[route("/posts/{id}", method = "PUT", method = "PATCH")]
pub async fn update_post(
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
    body: web::Json<Value>,
) -> Result<impl Responder, AppError> {
    let id = post_id.into_inner();
    if state.posts.get(id).await?.is_none() {
        return Err(not_found());
    }
    let post_data: PostUpdate = parse_body(body.into_inner())?;
    post_data.validate()?;

    let post = state
        .posts
        .update(id, post_data)
        .await?
        .ok_or_else(not_found)?;
    Ok(HttpResponse::Ok().json(post))
}

#[delete("/posts/{id}")]
pub async fn delete_post(
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
) -> Result<impl Responder, AppError> {
    if !state.posts.delete(post_id.into_inner()).await? {
        return Err(not_found());
    }
    Ok(HttpResponse::NoContent().finish())
}
