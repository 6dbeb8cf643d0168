//! Authentication service implementation
//!
//! This service handles account sign-up and sign-in, session tokens,
//! sign-out revocation, role lookup and assignment, and broadcasts auth
//! state changes to subscribers.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::database::DatabaseService;
use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter};
use crate::models::{AssignRoleRequest, AuthUser, CreateAccountRequest, Role, UpdateRoleRequest, UserRole};
use crate::state::StateStorage;
use crate::utils::errors::{HostelBridgeError, Result, ValidationErrors};
use crate::utils::helpers::{is_valid_email, normalize_email};
use crate::utils::logging::log_auth_event;

pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Where users without a usable role are sent
pub const PORTALS_ROUTE: &str = "/portals";

/// Session token claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Account id
    pub sub: Uuid,
    pub email: String,
    /// Session id, the unit of revocation
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Auth state changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthEvent {
    SignedUp { user_id: Uuid },
    SignedIn { user_id: Uuid },
    SignedOut { user_id: Uuid },
    RoleChanged { user_id: Uuid, role: Option<Role> },
    AccountDeleted { user_id: Uuid },
}

impl AuthEvent {
    pub fn user_id(&self) -> Uuid {
        match self {
            AuthEvent::SignedUp { user_id }
            | AuthEvent::SignedIn { user_id }
            | AuthEvent::SignedOut { user_id }
            | AuthEvent::RoleChanged { user_id, .. }
            | AuthEvent::AccountDeleted { user_id } => *user_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AuthEvent::SignedUp { .. } => "signed_up",
            AuthEvent::SignedIn { .. } => "signed_in",
            AuthEvent::SignedOut { .. } => "signed_out",
            AuthEvent::RoleChanged { .. } => "role_changed",
            AuthEvent::AccountDeleted { .. } => "account_deleted",
        }
    }
}

/// Result of a successful sign-in
#[derive(Debug, Clone, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub user: AuthUser,
    pub role: Option<Role>,
    /// Dashboard of the user's role, or the portal list
    pub redirect: String,
    pub expires_at: DateTime<Utc>,
}

/// Landing route for a (possibly missing) role
pub fn redirect_for(role: Option<Role>) -> String {
    role.map(|r| r.dashboard_route())
        .unwrap_or_else(|| PORTALS_ROUTE.to_string())
}

/// Hash a password using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verify a password against its Argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Authentication service backed by the account store
#[derive(Clone)]
pub struct AuthService {
    database: DatabaseService,
    storage: StateStorage,
    limiter: RateLimiter,
    events: broadcast::Sender<AuthEvent>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_ttl_seconds: u64,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("session_ttl_seconds", &self.session_ttl_seconds)
            .field("subscribers", &self.events.receiver_count())
            .finish_non_exhaustive()
    }
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(database: DatabaseService, storage: StateStorage, config: &AuthConfig) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            database,
            storage,
            limiter: RateLimiter::new(RateLimitConfig::from(config)),
            events,
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            session_ttl_seconds: config.session_ttl_seconds,
        }
    }

    /// Periodically forget sign-in attempts for keys that went quiet
    pub fn start_limiter_cleanup(&self, interval: std::time::Duration) -> tokio::task::JoinHandle<()> {
        self.limiter.start_cleanup(interval)
    }

    /// Subscribe to auth state changes
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: AuthEvent) {
        debug!(event = event.name(), user_id = %event.user_id(), "Auth event");
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Create an account
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = normalize_email(email);
        let mut errors = ValidationErrors::new();
        if !is_valid_email(&email) {
            errors.add("email", "Invalid email format");
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            errors.add("password", format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH));
        }
        errors.into_result()?;

        let password_hash = hash_password(password)?;
        let account = match self
            .database
            .backend()
            .create_account(CreateAccountRequest { email: email.clone(), password_hash })
            .await
        {
            Ok(account) => account,
            Err(e) => {
                log_auth_event(&email, "sign_up", false, Some(e.kind()));
                return Err(e);
            }
        };

        log_auth_event(&email, "sign_up", true, None);
        self.emit(AuthEvent::SignedUp { user_id: account.id });
        Ok(account.into())
    }

    /// Verify credentials and open a session
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<SignInResponse> {
        let email = normalize_email(email);
        self.limiter.check(&email)?;

        let account = self.database.backend().find_account_by_email(&email).await?;
        let account = match account {
            Some(account) if verify_password(password, &account.password_hash) => account,
            _ => {
                log_auth_event(&email, "sign_in", false, Some("invalid credentials"));
                return Err(HostelBridgeError::InvalidCredentials);
            }
        };
        self.limiter.clear(&email);

        let user = AuthUser::from(account);
        let (token, claims) = self.issue_token(&user)?;
        let role = self.lookup_role_or_none(user.id).await;

        log_auth_event(&email, "sign_in", true, role.map(|r| r.as_str()));
        self.emit(AuthEvent::SignedIn { user_id: user.id });

        Ok(SignInResponse {
            token,
            redirect: redirect_for(role),
            role,
            user,
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now),
        })
    }

    /// Issue a signed session token for a user
    pub fn issue_token(&self, user: &AuthUser) -> Result<(String, Claims)> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.session_ttl_seconds as i64,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok((token, claims))
    }

    /// Decode a token and check it has not been revoked
    pub async fn verify_token(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))?;
        if self.storage.is_revoked(&data.claims.jti).await? {
            debug!(user_id = %data.claims.sub, "Rejected revoked session");
            return Err(HostelBridgeError::NotAuthenticated);
        }
        Ok(data.claims)
    }

    /// The account behind a token
    pub async fn current_user(&self, token: &str) -> Result<AuthUser> {
        let claims = self.verify_token(token).await?;
        self.database
            .backend()
            .find_account(claims.sub)
            .await?
            .map(AuthUser::from)
            .ok_or(HostelBridgeError::NotAuthenticated)
    }

    /// Revoke a session until its natural expiry
    pub async fn sign_out(&self, token: &str) -> Result<()> {
        let claims = self.verify_token(token).await?;
        let remaining = (claims.exp - Utc::now().timestamp()).max(1) as u64;
        self.storage.revoke_token(&claims.jti, remaining).await?;

        log_auth_event(&claims.email, "sign_out", true, None);
        self.emit(AuthEvent::SignedOut { user_id: claims.sub });
        Ok(())
    }

    /// Role assigned to a user, if any
    pub async fn lookup_role(&self, user_id: Uuid) -> Result<Option<Role>> {
        Ok(self.database.find_role(user_id).await?.map(|r| r.role))
    }

    /// Role lookup where a failure means "no role"
    pub async fn lookup_role_or_none(&self, user_id: Uuid) -> Option<Role> {
        match self.lookup_role(user_id).await {
            Ok(role) => role,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Role lookup failed");
                None
            }
        }
    }

    /// Give a user a role, replacing any existing one
    pub async fn assign_role(&self, user_id: Uuid, role: Role) -> Result<UserRole> {
        let assigned = match self.database.find_role(user_id).await? {
            Some(existing) => {
                self.database
                    .roles
                    .update(existing.id, &UpdateRoleRequest { role })
                    .await?
            }
            None => {
                self.database
                    .roles
                    .create(&AssignRoleRequest { user_id, role })
                    .await?
            }
        };

        info!(user_id = %user_id, role = %role, "Role assigned");
        self.emit(AuthEvent::RoleChanged { user_id, role: Some(role) });
        Ok(assigned)
    }

    /// Remove a user's role row
    pub async fn remove_role(&self, user_id: Uuid) -> Result<bool> {
        let Some(existing) = self.database.find_role(user_id).await? else {
            return Ok(false);
        };
        let removed = self.database.roles.delete(existing.id).await?;
        if removed {
            self.emit(AuthEvent::RoleChanged { user_id, role: None });
        }
        Ok(removed)
    }

    /// Delete an account
    pub async fn delete_account(&self, user_id: Uuid) -> Result<bool> {
        let removed = self.database.backend().delete_account(user_id).await?;
        if removed {
            self.emit(AuthEvent::AccountDeleted { user_id });
        }
        Ok(removed)
    }

    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }
}
