use std::sync::Arc;
use validator::Validate;

use super::password::{hash_password, hash_password_blocking, verify_password_blocking};
use super::token::{TokenRegistry, LOGIN_TOKEN_NAME};
use super::{LoginRequest, LoginResponse, RegisterRequest};
use crate::error::AppError;
use crate::models::{NewUser, User};
use crate::store::{TokenStore, UserStore};

/// Emails are compared case-insensitively: they are stored and looked up in lower case.
fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}

/// Register, login and logout on top of the credential store and the token registry.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: TokenRegistry,
    bcrypt_cost: u32,
    /// Verified against when the email is unknown, so both failure paths cost one bcrypt
    /// verification.
    dummy_hash: String,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStore>,
        bcrypt_cost: u32,
    ) -> Result<Self, AppError> {
        let dummy_hash = hash_password(&super::token::generate_secret(), bcrypt_cost)?;
        Ok(Self {
            tokens: TokenRegistry::new(tokens, users.clone()),
            users,
            bcrypt_cost,
            dummy_hash,
        })
    }

    /// Validates the request, hashes the password and creates the user. A taken email
    /// comes back from the store as a duplicate and surfaces as a validation error.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AppError> {
        request.validate()?;
        let RegisterRequest {
            name: Some(name),
            email: Some(email),
            password: Some(password),
        } = request
        else {
            return Err(AppError::InternalServerError(
                "validated register request is missing a field".into(),
            ));
        };

        let password_hash = hash_password_blocking(password, self.bcrypt_cost).await?;
        let user = self
            .users
            .create(NewUser {
                name,
                email: normalize_email(&email),
                password_hash,
            })
            .await?;
        log::info!("registered user {}", user.id);
        Ok(user)
    }

    /// Checks the credentials and issues a new token. Unknown email and wrong password
    /// produce the same error.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        request.validate()?;
        let LoginRequest {
            email: Some(email),
            password: Some(password),
        } = request
        else {
            return Err(AppError::InvalidCredentials);
        };

        let credentials = self.users.find_by_email(&normalize_email(&email)).await?;
        let hash = credentials
            .as_ref()
            .map(|c| c.password_hash.clone())
            .unwrap_or_else(|| self.dummy_hash.clone());
        let matches = verify_password_blocking(password, hash).await?;

        let user = match credentials {
            Some(credentials) if matches => credentials.user,
            _ => {
                log::warn!("rejected login attempt");
                return Err(AppError::InvalidCredentials);
            }
        };

        let token = self.tokens.issue(user.id, LOGIN_TOKEN_NAME).await?;
        log::info!("issued token for user {}", user.id);
        Ok(LoginResponse {
            user,
            token,
            message: "Logged in successfully.".into(),
        })
    }

    /// Revokes exactly the presented token.
    pub async fn logout(&self, token: &str) -> Result<(), AppError> {
        if self.tokens.revoke(token).await? {
            Ok(())
        } else {
            Err(AppError::Unauthorized("Unauthenticated.".into()))
        }
    }

    pub async fn resolve(&self, token: &str) -> Result<Option<User>, AppError> {
        self.tokens.resolve(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use futures::future::join_all;

    fn service() -> AuthService {
        let store = Arc::new(MemoryStore::new());
        AuthService::new(store.clone(), store, 4).unwrap()
    }

    fn alice() -> RegisterRequest {
        RegisterRequest {
            name: Some("Alice Smith".into()),
            email: Some("alice@example.com".into()),
            password: Some("secret123".into()),
        }
    }

    fn login(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[test_log::test(actix_rt::test)]
    async fn test_register_login_logout_cycle() {
        let auth = service();
        let user = auth.register(alice()).await.unwrap();
        assert_eq!(user.email, "alice@example.com");

        let response = auth
            .login(login("alice@example.com", "secret123"))
            .await
            .unwrap();
        assert_eq!(response.user, user);
        assert_eq!(auth.resolve(&response.token).await.unwrap(), Some(user));

        auth.logout(&response.token).await.unwrap();
        assert_eq!(auth.resolve(&response.token).await.unwrap(), None);
        assert!(matches!(
            auth.logout(&response.token).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[actix_rt::test]
    async fn test_duplicate_registration_fails_on_email() {
        let auth = service();
        auth.register(alice()).await.unwrap();
        match auth.register(alice()).await {
            Err(AppError::ValidationError(errors)) => {
                assert_eq!(
                    errors["email"],
                    vec!["The email has already been taken.".to_string()]
                );
            }
            other => panic!("expected duplicate email error, got {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn test_concurrent_registration_admits_one() {
        let auth = service();
        let attempts = (0..8).map(|_| {
            let auth = auth.clone();
            async move { auth.register(alice()).await }
        });
        let results = join_all(attempts).await;
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, AppError::ValidationError(errors) if errors.contains_key("email"))));
    }

    #[actix_rt::test]
    async fn test_login_failures_are_indistinguishable() {
        let auth = service();
        auth.register(alice()).await.unwrap();

        let wrong_password = auth.login(login("alice@example.com", "secret124")).await;
        let unknown_user = auth.login(login("nobody@example.com", "secret123")).await;

        assert!(matches!(wrong_password, Err(AppError::InvalidCredentials)));
        assert!(matches!(unknown_user, Err(AppError::InvalidCredentials)));
    }

    #[actix_rt::test]
    async fn test_invalid_register_creates_nothing() {
        let auth = service();
        let mut request = alice();
        request.password = Some("12345".into());
        assert!(matches!(
            auth.register(request).await,
            Err(AppError::ValidationError(errors)) if errors.contains_key("password")
        ));
        // The same email is still free afterwards.
        assert!(auth.register(alice()).await.is_ok());
    }

    #[actix_rt::test]
    async fn test_email_is_case_insensitive() {
        let auth = service();
        let mut shouting = alice();
        shouting.email = Some("ALICE@Example.com".into());
        let user = auth.register(shouting).await.unwrap();
        assert_eq!(user.email, "alice@example.com");

        assert!(matches!(
            auth.register(alice()).await,
            Err(AppError::ValidationError(errors)) if errors.contains_key("email")
        ));
        let response = auth
            .login(login("Alice@EXAMPLE.com", "secret123"))
            .await
            .unwrap();
        assert_eq!(response.user, user);
    }
}
