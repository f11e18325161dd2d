// src/auth.rs
use crate::app_log;
use crate::core::{ConfigManager, Database};
use crate::models::{Role, User};
use crate::repositories::UserRepository;
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::{Request, State};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Session,
    Verify,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64, // User ID
    pub email: String,
    pub role: Role,
    pub purpose: TokenPurpose,
    pub exp: usize, // Expiration timestamp
    pub iat: usize, // Issued at timestamp
}

pub struct AuthConfig {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_ttl: Duration,
    verification_ttl: Duration,
    bcrypt_cost: u32,
}

impl AuthConfig {
    pub fn new(secret: &str, session_ttl_hours: i64, verification_ttl_hours: i64, bcrypt_cost: u32) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_ttl: Duration::hours(session_ttl_hours),
            verification_ttl: Duration::hours(verification_ttl_hours),
            bcrypt_cost,
        }
    }

    pub fn from_config(config: &ConfigManager) -> Self {
        Self::new(
            config.jwt_secret(),
            config.auth.token_ttl_hours,
            config.auth.verification_ttl_hours,
            config.auth.bcrypt_cost,
        )
    }

    pub fn issue_session_token(&self, user: &User) -> Result<String> {
        self.issue(user, TokenPurpose::Session, self.session_ttl)
    }

    pub fn issue_verification_token(&self, user: &User) -> Result<String> {
        self.issue(user, TokenPurpose::Verify, self.verification_ttl)
    }

    fn issue(&self, user: &User, purpose: TokenPurpose, ttl: Duration) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            purpose,
            exp: (now + ttl).timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to sign token")
    }

    /// Decode `token` and insist it was issued for `purpose`
    pub fn verify_token(&self, token: &str, purpose: TokenPurpose) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;
        if data.claims.purpose != purpose {
            anyhow::bail!("Token was issued for another purpose");
        }
        Ok(data.claims)
    }

    pub fn hash_password(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.bcrypt_cost).context("Failed to hash password")
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }
}

/// Message of the last guard failure, read back by the 401/403 catchers
#[derive(Debug, Default)]
pub struct AuthFailure(pub Option<AuthError>);

/// Authenticated user loaded from the database
pub struct AuthenticatedUser {
    pub user: User,
}

impl AuthenticatedUser {
    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn id(&self) -> i64 {
        self.user.id
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }

    pub fn is_admin(&self) -> bool {
        self.user.role == Role::Admin
    }
}

fn fail<T>(req: &Request<'_>, status: Status, error: AuthError) -> Outcome<T, AuthError> {
    req.local_cache(|| AuthFailure(Some(error)));
    Outcome::Error((status, error))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_config = match req.guard::<&State<AuthConfig>>().await {
            Outcome::Success(config) => config,
            Outcome::Error((status, _)) => return fail(req, status, AuthError::DatabaseError),
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        let db = match req.guard::<&State<Database>>().await {
            Outcome::Success(db) => db,
            Outcome::Error((status, _)) => return fail(req, status, AuthError::DatabaseError),
            Outcome::Forward(f) => return Outcome::Forward(f),
        };

        // Extract Authorization header
        let token = match req.headers().get_one("Authorization") {
            Some(header) => match header.strip_prefix("Bearer ") {
                Some(token) => token.trim(),
                None => {
                    app_log!(warn, "Invalid Authorization header format");
                    return fail(req, Status::Unauthorized, AuthError::InvalidToken);
                }
            },
            None => return fail(req, Status::Unauthorized, AuthError::MissingToken),
        };

        let claims = match auth_config.verify_token(token, TokenPurpose::Session) {
            Ok(claims) => claims,
            Err(e) => {
                app_log!(warn, "Token verification failed: {}", e);
                return fail(req, Status::Unauthorized, AuthError::TokenVerificationFailed);
            }
        };

        let user = match UserRepository::new(db.pool()).find_by_id(claims.sub).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                app_log!(warn, "Token for deleted user {}", claims.sub);
                return fail(req, Status::Unauthorized, AuthError::UnknownUser);
            }
            Err(e) => {
                app_log!(error, "Failed to load user {}: {}", claims.sub, e);
                return fail(req, Status::InternalServerError, AuthError::DatabaseError);
            }
        };

        app_log!(debug, "User {} authenticated as {}", user.email, user.role);

        Outcome::Success(AuthenticatedUser { user })
    }
}

/// Authenticated user holding the `admin` role
pub struct AdminUser(pub AuthenticatedUser);

impl std::ops::Deref for AdminUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthenticatedUser::from_request(req).await {
            Outcome::Success(auth) if auth.is_admin() => Outcome::Success(AdminUser(auth)),
            Outcome::Success(auth) => {
                app_log!(warn, "User {} tried an admin route", auth.email());
                fail(req, Status::Forbidden, AuthError::AdminRequired)
            }
            Outcome::Error(e) => Outcome::Error(e),
            Outcome::Forward(f) => Outcome::Forward(f),
        }
    }
}

/// Authenticated user holding the `seeker` role
pub struct SeekerUser(pub AuthenticatedUser);

impl std::ops::Deref for SeekerUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for SeekerUser {
    type Error = AuthError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthenticatedUser::from_request(req).await {
            Outcome::Success(auth) if !auth.is_admin() => Outcome::Success(SeekerUser(auth)),
            Outcome::Success(_) => fail(req, Status::Forbidden, AuthError::SeekerRequired),
            Outcome::Error(e) => Outcome::Error(e),
            Outcome::Forward(f) => Outcome::Forward(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    TokenVerificationFailed,
    UnknownUser,
    AdminRequired,
    SeekerRequired,
    DatabaseError,
}

impl AuthError {
    pub fn message(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "Authorization token required",
            AuthError::InvalidToken => "Invalid authorization token format",
            AuthError::TokenVerificationFailed => "Token verification failed",
            AuthError::UnknownUser => "Account no longer exists",
            AuthError::AdminRequired => "Admin role required",
            AuthError::SeekerRequired => "Only job seekers can do this",
            AuthError::DatabaseError => "Database error occurred",
        }
    }
}

// Optional auth guard that doesn't fail if no auth is provided
pub struct OptionalAuth {
    pub user: Option<AuthenticatedUser>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for OptionalAuth {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match AuthenticatedUser::from_request(req).await {
            Outcome::Success(auth) => Outcome::Success(OptionalAuth { user: Some(auth) }),
            _ => Outcome::Success(OptionalAuth { user: None }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DisabilityStatus;

    fn config() -> AuthConfig {
        AuthConfig::new("unit-test-secret-value", 1, 1, 4)
    }

    fn user() -> User {
        User {
            id: 7,
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            password_hash: String::new(),
            role: Role::Seeker,
            education: String::new(),
            skills: String::new(),
            disability_status: DisabilityStatus::NonPwd,
            is_verified: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_token_round_trip() {
        let auth = config();
        let token = auth.issue_session_token(&user()).unwrap();
        let claims = auth.verify_token(&token, TokenPurpose::Session).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, Role::Seeker);
    }

    #[test]
    fn test_purpose_is_enforced() {
        let auth = config();
        let token = auth.issue_verification_token(&user()).unwrap();
        assert!(auth.verify_token(&token, TokenPurpose::Session).is_err());
        assert!(auth.verify_token(&token, TokenPurpose::Verify).is_ok());
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let token = config().issue_session_token(&user()).unwrap();
        let other = AuthConfig::new("a-completely-different-secret", 1, 1, 4);
        assert!(other.verify_token(&token, TokenPurpose::Session).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = AuthConfig::new("unit-test-secret-value", -2, 1, 4);
        let token = auth.issue_session_token(&user()).unwrap();
        assert!(auth.verify_token(&token, TokenPurpose::Session).is_err());
    }

    #[test]
    fn test_password_hashing() {
        let auth = config();
        let hash = auth.hash_password("correct horse").unwrap();
        assert!(auth.verify_password("correct horse", &hash));
        assert!(!auth.verify_password("wrong horse", &hash));
        assert!(!auth.verify_password("correct horse", "not-a-hash"));
    }
}
