//! Accounts and authentication: argon2 password hashing, HS256 bearer
//! tokens, and the [`Principal`] every protected operation receives.
//!
//! Auth failures get their own error enum instead of [`DomainError`]
//! because the REST layer maps them differently (401/409 rather than the
//! domain taxonomy's 400/403/404).

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString};
use argon2::{Argon2, PasswordVerifier};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use shared::{LoginRequest, LoginResponse, RegisterRequest, Role, User};

use crate::storage::traits::{Connection, UserDraft, UserStorage};

/// Verified caller identity attached to every protected request
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
}

impl Principal {
    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }
}

/// JWT claims carried by a bearer token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub role: Role,
    /// Expiration time (seconds since epoch)
    pub exp: usize,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("{0}")]
    Validation(String),

    #[error("storage failure: {0}")]
    Store(anyhow::Error),
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Store(err)
    }
}

/// Service for user accounts, login, and token verification
#[derive(Clone)]
pub struct AuthService<C: Connection> {
    user_repository: C::UserRepository,
    jwt_secret: String,
}

impl<C: Connection> AuthService<C> {
    pub fn new(connection: Arc<C>, jwt_secret: String) -> Self {
        let user_repository = connection.create_user_repository();
        Self {
            user_repository,
            jwt_secret,
        }
    }

    /// Register a new account. The role defaults to parent; teacher accounts
    /// are created explicitly.
    pub fn register(&self, request: RegisterRequest) -> Result<User, AuthError> {
        let email = request.email.trim().to_lowercase();
        info!("Registering account: {}", email);

        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::Validation("A valid email is required".to_string()));
        }
        if request.name.trim().is_empty() {
            return Err(AuthError::Validation("Name is required".to_string()));
        }
        if request.password.len() < 8 {
            return Err(AuthError::Validation(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if self.user_repository.find_user_by_email(&email)?.is_some() {
            warn!("Registration rejected, email already taken: {}", email);
            return Err(AuthError::EmailTaken);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(request.password.as_bytes(), &salt)
            .map_err(|e| AuthError::Store(anyhow::anyhow!("Failed to hash password: {}", e)))?
            .to_string();

        let stored = self.user_repository.create_user(UserDraft {
            email,
            name: request.name.trim().to_string(),
            role: request.role.unwrap_or(Role::Parent),
            password_hash,
        })?;

        info!("Registered account {} with ID: {}", stored.email, stored.id);
        Ok(stored.to_user())
    }

    /// Verify credentials and issue a 24-hour bearer token
    pub fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let email = request.email.trim().to_lowercase();
        info!("Login attempt: {}", email);

        let Some(stored) = self.user_repository.find_user_by_email(&email)? else {
            warn!("Login failed, unknown email: {}", email);
            return Err(AuthError::InvalidCredentials);
        };

        let parsed_hash = PasswordHash::new(&stored.password_hash)
            .map_err(|e| AuthError::Store(anyhow::anyhow!("Corrupt password hash: {}", e)))?;
        if Argon2::default()
            .verify_password(request.password.as_bytes(), &parsed_hash)
            .is_err()
        {
            warn!("Login failed, wrong password: {}", email);
            return Err(AuthError::InvalidCredentials);
        }

        let expiration = Utc::now() + Duration::hours(24);
        let claims = Claims {
            sub: stored.id.clone(),
            role: stored.role,
            exp: expiration.timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )
        .map_err(|e| AuthError::Store(anyhow::anyhow!("Failed to issue token: {}", e)))?;

        info!("Login succeeded: {} ({})", email, stored.id);
        Ok(LoginResponse {
            token,
            user: stored.to_user(),
        })
    }

    /// Decode and validate a bearer token into the calling principal
    pub fn verify_token(&self, token: &str) -> Result<Principal, AuthError> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        Ok(Principal {
            user_id: data.claims.sub,
            role: data.claims.role,
        })
    }

    /// Look up the account behind a verified principal
    pub fn current_user(&self, principal: &Principal) -> Result<User, AuthError> {
        let stored = self
            .user_repository
            .get_user(&principal.user_id)?
            .ok_or(AuthError::InvalidToken)?;
        Ok(stored.to_user())
    }
}
