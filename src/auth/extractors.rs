use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::fmt;
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::User;

/// The identity resolved for the current request.
///
/// `AuthMiddleware` inserts this into request extensions after resolving the bearer
/// token; handlers receive it as an extractor. The raw token is kept so that logout can
/// revoke exactly the token the request was made with.
///
/// If the value is missing (the route is not wrapped by `AuthMiddleware`), extraction
/// fails with `AppError::Unauthorized`, so a handler taking `Authenticated` can never run
/// without an identity.
#[derive(Clone)]
pub struct Authenticated {
    pub user: User,
    pub token: String,
}

impl fmt::Debug for Authenticated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticated")
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl FromRequest for Authenticated {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Authenticated>().cloned() {
            Some(auth) => ready(Ok(auth)),
            None => {
                let err = AppError::Unauthorized("Unauthenticated.".to_string());
                ready(Err(err.into()))
            }
        }
    }
}
