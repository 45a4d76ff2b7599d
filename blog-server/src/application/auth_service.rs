use crate::data::user_repository::UserRepository;
use crate::domain::user::{LoginUserRequest, RegisterUserRequest, UserResponse};
use crate::domain::DomainError;
use crate::infrastructure::jwt::JwtService;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::Arc;

pub struct AuthService {
    user_repo: Arc<dyn UserRepository + Send + Sync>,
    jwt_service: Arc<JwtService>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository + Send + Sync>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            user_repo,
            jwt_service,
        }
    }

    pub async fn register(
        &self,
        req: RegisterUserRequest,
    ) -> Result<(String, UserResponse), DomainError> {
        let (new_user, password) = req.validate()?;
        tracing::debug!(
            "Registering user: name={}, email={}",
            new_user.name,
            new_user.email
        );

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Password hashing failed: {}", e);
                DomainError::InternalError(format!("Password hashing failed: {}", e))
            })?
            .to_string();

        // The unique index on email is the authority on duplicates
        let user = self
            .user_repo
            .create(new_user, password_hash)
            .await
            .map_err(|e| {
                if matches!(e, DomainError::UserAlreadyExists) {
                    tracing::warn!("Registration failed: email already exists");
                }
                e
            })?;

        let token = self
            .jwt_service
            .generate_token(user.id, user.name.clone())?;

        tracing::info!("User registered: id={}, name={}", user.id, user.name);

        Ok((token, UserResponse::from(user)))
    }

    pub async fn login(
        &self,
        req: LoginUserRequest,
    ) -> Result<(String, UserResponse), DomainError> {
        let email = req.email();
        tracing::debug!("Login attempt: email={}", email);

        let user = match self.user_repo.find_by_email(&email).await {
            Ok(u) => u,
            Err(DomainError::UserNotFound) => {
                tracing::warn!("Login failed: unknown email {}", email);
                return Err(DomainError::InvalidCredentials);
            }
            Err(e) => return Err(e),
        };

        let parsed_hash = PasswordHash::new(&user.password_hash).map_err(|e| {
            tracing::error!("Invalid password hash format for user {}: {}", user.id, e);
            DomainError::InternalError(format!("Invalid password hash: {}", e))
        })?;

        if Argon2::default()
            .verify_password(req.password.as_bytes(), &parsed_hash)
            .is_err()
        {
            tracing::warn!("Invalid password for user {}", user.id);
            return Err(DomainError::InvalidCredentials);
        }

        let token = self
            .jwt_service
            .generate_token(user.id, user.name.clone())?;

        tracing::info!("User logged in: id={}, name={}", user.id, user.name);

        Ok((token, UserResponse::from(user)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::memory::MemoryStore;

    fn service() -> (Arc<JwtService>, AuthService) {
        let jwt = Arc::new(JwtService::new("a-test-secret-that-is-long-enough-for-hs256").unwrap());
        let store = Arc::new(MemoryStore::new());
        (jwt.clone(), AuthService::new(store, jwt))
    }

    fn registration(email: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            name: Some("Ann".into()),
            email: Some(email.into()),
            password: Some("correct horse".into()),
        }
    }

    #[tokio::test]
    async fn register_then_login_issues_tokens_for_same_user() {
        let (jwt, auth) = service();

        let (token, user) = auth.register(registration("ann@example.com")).await.unwrap();
        assert_eq!(jwt.verify_token(&token).unwrap(), user.id);

        let (token, logged_in) = auth
            .login(LoginUserRequest {
                email: "ann@example.com".into(),
                password: "correct horse".into(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
        assert_eq!(jwt.verify_token(&token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let (_, auth) = service();
        auth.register(registration("ann@example.com")).await.unwrap();

        let again = auth.register(registration("ann@example.com")).await;
        assert!(matches!(again, Err(DomainError::UserAlreadyExists)));

        let shouting = auth.register(registration("ANN@example.com")).await;
        assert!(matches!(shouting, Err(DomainError::UserAlreadyExists)));
    }

    #[tokio::test]
    async fn login_ignores_email_case() {
        let (_, auth) = service();
        let (_, user) = auth.register(registration("Ann@Example.com")).await.unwrap();
        assert_eq!(user.email, "ann@example.com");

        let (_, logged_in) = auth
            .login(LoginUserRequest {
                email: "ANN@EXAMPLE.COM".into(),
                password: "correct horse".into(),
            })
            .await
            .unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn bad_credentials_do_not_reveal_which_part_was_wrong() {
        let (_, auth) = service();
        auth.register(registration("ann@example.com")).await.unwrap();

        let wrong_password = auth
            .login(LoginUserRequest {
                email: "ann@example.com".into(),
                password: "nope-nope".into(),
            })
            .await;
        assert!(matches!(wrong_password, Err(DomainError::InvalidCredentials)));

        let unknown = auth
            .login(LoginUserRequest {
                email: "ghost@example.com".into(),
                password: "whatever".into(),
            })
            .await;
        assert!(matches!(unknown, Err(DomainError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn short_password_is_a_validation_error() {
        let (_, auth) = service();
        let mut req = registration("ann@example.com");
        req.password = Some("abc".into());

        assert!(matches!(
            auth.register(req).await,
            Err(DomainError::ValidationError(_))
        ));
    }
}
