pub mod auth;
pub mod health;
pub mod posts;
pub mod tasks;

use actix_web::web;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;
use crate::state::AppState;

/// Registers every route of the API.
///
/// `/user` and `/logout` carry `AuthMiddleware` themselves; everything else is public.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health)
        .service(auth::register)
        .service(auth::login)
        .service(auth::logout)
        .service(auth::current_user)
        .service(posts::list_posts)
        .service(posts::create_post)
        .service(posts::get_post)
        .service(posts::update_post)
        .service(posts::delete_post)
        .service(tasks::get_tasks)
        .service(tasks::pending_list)
        .service(tasks::create_task)
        .service(tasks::get_task)
        .service(tasks::update_task)
        .service(tasks::delete_task);
}

/// Unparseable JSON is a 400. Bodies are taken as `serde_json::Value` and typed by
/// [`parse_body`], so shape errors never reach this handler.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid JSON body: {}", err)).into()
    })
}

/// Turns a JSON body into a request struct, reporting a wrong-typed field under its own
/// name, e.g. `errors.is_completed = ["The is completed field must be true or false."]`.
pub fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    if !body.is_object() {
        return Err(AppError::field("body", "The request body must be a JSON object."));
    }
    serde_path_to_error::deserialize(body).map_err(|err| {
        let field = err.path().to_string();
        let label = field.replace('_', " ");
        AppError::field(&field, format!("The {} field {}", label, err.inner()))
    })
}

/// A non-numeric id can never match a record.
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| AppError::NotFound("Resource not found".into()).into())
}

/// Installs the shared state, the extractor configs and all routes. Used by `main` and by
/// the integration tests so both serve the same application.
pub fn configure_app(state: web::Data<AppState>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(state)
            .app_data(json_config())
            .app_data(path_config())
            .configure(config);
    }
}
