//! Admin login, first-use bootstrap, and credential rotation.

pub mod password;
pub mod token;

use std::sync::Arc;

use metrics::counter;
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::application::repos::{AdminsRepo, RepoError};
use crate::domain::entities::AdminRecord;

pub use password::PasswordError;
pub use token::{Claims, TokenError, TokenIssuer};

pub(crate) const METRIC_LOGIN_TOTAL: &str = "lekha_admin_login_total";

/// Argon2id hash of no real password, verified against when the username is
/// unknown so that path costs the same as a wrong password.
const DECOY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("missing bearer token")]
    MissingToken,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error("password hashing task failed: {0}")]
    Blocking(String),
}

/// Verified identity attached to authenticated admin requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal {
    pub id: i64,
    pub username: String,
}

impl From<Claims> for AdminPrincipal {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            username: claims.username,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BootstrapCredentials {
    pub username: String,
    pub password: String,
}

impl BootstrapCredentials {
    fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = self.username.as_bytes().ct_eq(username.as_bytes());
        let pass_ok = self.password.as_bytes().ct_eq(password.as_bytes());
        bool::from(user_ok & pass_ok)
    }
}

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub admin: AdminPrincipal,
    /// Set when this login created the first admin.
    pub bootstrapped: bool,
}

#[derive(Clone)]
pub struct AuthService {
    admins: Arc<dyn AdminsRepo>,
    tokens: Arc<TokenIssuer>,
    bootstrap: BootstrapCredentials,
    decoy_hash: Arc<str>,
}

impl AuthService {
    pub fn new(
        admins: Arc<dyn AdminsRepo>,
        tokens: Arc<TokenIssuer>,
        bootstrap: BootstrapCredentials,
    ) -> Self {
        Self {
            admins,
            tokens,
            bootstrap,
            decoy_hash: Arc::from(DECOY_PASSWORD_HASH),
        }
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let result = self.login_inner(username, password).await;
        let outcome = match &result {
            Ok(outcome) if outcome.bootstrapped => "bootstrap",
            Ok(_) => "success",
            Err(AuthError::InvalidCredentials) => "rejected",
            Err(_) => "error",
        };
        counter!(METRIC_LOGIN_TOTAL, "outcome" => outcome).increment(1);
        result
    }

    async fn login_inner(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        if let Some(admin) = self.admins.find_by_username(username).await? {
            if !verify_blocking(password, &admin.password_hash).await? {
                warn!(
                    target = "lekha::auth",
                    username, "admin login rejected: wrong password"
                );
                return Err(AuthError::InvalidCredentials);
            }
            return self.issue_for(&admin, false);
        }

        verify_blocking(password, &self.decoy_hash).await?;

        if !self.bootstrap.matches(username, password) {
            warn!(
                target = "lekha::auth",
                username, "admin login rejected: unknown user"
            );
            return Err(AuthError::InvalidCredentials);
        }

        let hash = hash_blocking(password).await?;
        match self.admins.create_if_none(username, &hash).await? {
            Some(admin) => {
                info!(
                    target = "lekha::auth",
                    admin_id = admin.id,
                    "created bootstrap admin"
                );
                self.issue_for(&admin, true)
            }
            None => {
                warn!(
                    target = "lekha::auth",
                    username, "bootstrap login refused: an admin already exists"
                );
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Replace the first admin's credentials, creating the row if needed.
    pub async fn update_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AdminPrincipal, AuthError> {
        let username = username.trim();
        if username.is_empty() || password.trim().is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let hash = hash_blocking(password).await?;
        let admin = self.admins.upsert_first_admin(username, &hash).await?;
        info!(
            target = "lekha::auth",
            admin_id = admin.id,
            "admin credentials updated"
        );
        Ok(AdminPrincipal {
            id: admin.id,
            username: admin.username,
        })
    }

    pub fn authenticate(&self, bearer: Option<&str>) -> Result<AdminPrincipal, AuthError> {
        let token = bearer.ok_or(AuthError::MissingToken)?;
        let claims = self.tokens.verify(token)?;
        Ok(claims.into())
    }

    fn issue_for(&self, admin: &AdminRecord, bootstrapped: bool) -> Result<LoginOutcome, AuthError> {
        let token = self
            .tokens
            .issue(admin.id, &admin.username, OffsetDateTime::now_utc())?;
        Ok(LoginOutcome {
            token,
            admin: AdminPrincipal {
                id: admin.id,
                username: admin.username.clone(),
            },
            bootstrapped,
        })
    }
}

async fn hash_blocking(password: &str) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|err| AuthError::Blocking(err.to_string()))?
        .map_err(AuthError::from)
}

async fn verify_blocking(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
        .await
        .map_err(|err| AuthError::Blocking(err.to_string()))?
        .map_err(AuthError::from)
}
