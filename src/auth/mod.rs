pub mod extractors;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::User;

// Re-export necessary items
pub use extractors::Authenticated;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use service::AuthService;
pub use token::TokenRegistry;

/// Represents the payload for a user login request.
///
/// Fields are optional so that an absent value is reported per field with a 422.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct LoginRequest {
    /// User's email address. Must be a valid email format.
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address.")
    )]
    #[serde(default, deserialize_with = "crate::models::input::trimmed")]
    pub email: Option<String>,
    /// User's password. Only presence is checked here.
    #[validate(
        required(message = "The password field is required."),
        length(min = 1, message = "The password field is required.")
    )]
    #[serde(default, deserialize_with = "crate::models::input::string")]
    pub password: Option<String>,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name, 3 to 255 characters.
    #[validate(
        required(message = "The name field is required."),
        length(
            min = 3,
            max = 255,
            message = "The name field must be between 3 and 255 characters."
        )
    )]
    #[serde(default, deserialize_with = "crate::models::input::trimmed")]
    pub name: Option<String>,
    /// Email address for the new account. Must be a valid email format, at most 255 characters.
    #[validate(
        required(message = "The email field is required."),
        email(message = "The email field must be a valid email address."),
        length(
            max = 255,
            message = "The email field must not be greater than 255 characters."
        )
    )]
    #[serde(default, deserialize_with = "crate::models::input::trimmed")]
    pub email: Option<String>,
    /// Password for the new account. Must be at least 8 characters long.
    #[validate(
        required(message = "The password field is required."),
        length(min = 8, message = "The password field must be at least 8 characters.")
    )]
    #[serde(default, deserialize_with = "crate::models::input::string")]
    pub password: Option<String>,
}

/// Response body of a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    /// Plaintext bearer token. Shown once; only its digest is stored.
    pub token: String,
    pub message: String,
}
