//! # Auth Session Manager
//!
//! Login, lockout, sessions and password changes.
//!
//! ## Lockout State Machine
//! ```text
//!                  bad password            bad password (count = 4→5)
//! [counting: 0..5] ───────────► [counting] ───────────► [locked 15 min]
//!        ▲                                                    │
//!        │ good password (resets counter)                     │ window elapses
//!        └──────────────────────────────────── [counting: 5] ◄┘
//! ```
//! The counter resets only on a successful login; a lockout window merely
//! expiring leaves the count at the threshold, so one more failure re-locks
//! immediately.
//!
//! ## Enumeration Resistance
//! Unknown user, inactive account and wrong password all surface as the
//! same `InvalidCredentials`. Only a known-and-locked account answers
//! differently (`AccountLocked`), matching the original behavior.
//!
//! Credential values never reach the logs; log fields carry ids and counts
//! only.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info, warn};

use panaderia_core::validation::validate_password_strength;
use panaderia_core::{
    permissions_for_role, CoreError, Employee, EmployeeRole, PermissionSet, Session,
};
use panaderia_db::Database;

use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::error::EngineResult;
use crate::hasher::{Argon2Hasher, PasswordHasher};
use crate::remember::{issue_remember_token, verify_remember_token};
use crate::session::{generate_session_token, InMemorySessionStore, SessionStore};

// =============================================================================
// Outcomes
// =============================================================================

/// The employee fields safe to hand to a client. No hash, no counters.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EmployeeProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub role: EmployeeRole,
    pub last_access: Option<chrono::DateTime<chrono::Utc>>,
}

impl From<&Employee> for EmployeeProfile {
    fn from(employee: &Employee) -> Self {
        EmployeeProfile {
            id: employee.id.clone(),
            username: employee.username.clone(),
            email: employee.email.clone(),
            first_name: employee.first_name.clone(),
            last_name: employee.last_name.clone(),
            full_name: employee.full_name(),
            role: employee.role,
            last_access: employee.last_access,
        }
    }
}

/// What a successful login returns.
#[derive(Debug)]
pub struct LoginOutcome {
    pub profile: EmployeeProfile,
    pub session: Session,
    pub permissions: PermissionSet,
    /// Present when the caller asked to be remembered.
    pub remember_token: Option<String>,
}

/// Snapshot of a token's authentication state (never errors; "not logged
/// in" is a valid answer).
#[derive(Debug)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub profile: Option<EmployeeProfile>,
    pub session: Option<Session>,
    pub permissions: PermissionSet,
}

// =============================================================================
// Manager
// =============================================================================

/// The auth session manager service.
pub struct AuthSessionManager {
    db: Database,
    config: AuthConfig,
    clock: Arc<dyn Clock>,
    hasher: Arc<dyn PasswordHasher>,
    sessions: Arc<dyn SessionStore>,
}

impl AuthSessionManager {
    /// Creates a manager with production components: system clock, Argon2
    /// hashing, in-memory sessions.
    pub fn new(db: Database, config: AuthConfig) -> Self {
        AuthSessionManager {
            db,
            config,
            clock: Arc::new(SystemClock),
            hasher: Arc::new(Argon2Hasher),
            sessions: Arc::new(InMemorySessionStore::new()),
        }
    }

    /// Swaps the clock (tests drive a `ManualClock`).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Swaps the password hasher.
    pub fn with_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    /// Swaps the session store.
    pub fn with_session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    /// The hasher, for seeding accounts with properly hashed passwords.
    pub fn hasher(&self) -> &dyn PasswordHasher {
        self.hasher.as_ref()
    }

    // =========================================================================
    // Login / Logout
    // =========================================================================

    /// Attempts a login with a username or email plus password.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        remember_me: bool,
    ) -> EngineResult<LoginOutcome> {
        if identifier.trim().is_empty() || password.is_empty() {
            return Err(CoreError::InvalidCredentials.into());
        }

        let employee = match self
            .db
            .employees()
            .find_active_by_identifier(identifier.trim())
            .await?
        {
            Some(employee) => employee,
            None => {
                // Same answer as a bad password; nothing to count against.
                warn!("Login attempt for unknown or inactive account");
                return Err(CoreError::InvalidCredentials.into());
            }
        };

        let now = self.clock.now();
        if let Some(locked_until) = employee.locked_until {
            if locked_until > now {
                let retry_after_secs = (locked_until - now).num_seconds().max(1);
                warn!(
                    employee_id = %employee.id,
                    retry_after_secs,
                    "Login rejected, account locked"
                );
                return Err(CoreError::AccountLocked { retry_after_secs }.into());
            }
        }

        if !self.hasher.verify(password, &employee.password_hash)? {
            let failed_count = employee.failed_login_count + 1;
            let locked_until = if failed_count >= self.config.max_login_attempts {
                Some(now + Duration::minutes(self.config.lockout_minutes))
            } else {
                None
            };

            self.db
                .employees()
                .record_failed_attempt(&employee.id, failed_count, locked_until)
                .await?;

            warn!(
                employee_id = %employee.id,
                failed_count,
                locked = locked_until.is_some(),
                "Failed login attempt"
            );
            return Err(CoreError::InvalidCredentials.into());
        }

        // Success: failure state resets here and only here.
        self.db
            .employees()
            .clear_failed_attempts(&employee.id, now)
            .await?;

        let session = Session {
            user_id: employee.id.clone(),
            token: generate_session_token(),
            issued_at: now,
            expires_at: now + Duration::seconds(self.config.session_lifetime_secs),
            remember_me,
        };
        self.sessions.insert(session.clone());

        let remember_token = if remember_me {
            Some(issue_remember_token(
                &self.config.jwt_secret,
                &employee.id,
                now,
                self.config.remember_me_days,
            )?)
        } else {
            None
        };

        info!(employee_id = %employee.id, remember_me, "Login successful");
        Ok(LoginOutcome {
            profile: EmployeeProfile::from(&employee),
            permissions: permissions_for_role(employee.role),
            session,
            remember_token,
        })
    }

    /// Logs out a session. Idempotent: an unknown or already-removed token
    /// is a no-op.
    pub async fn logout(&self, token: &str) -> EngineResult<()> {
        if let Some(session) = self.sessions.remove(token) {
            info!(employee_id = %session.user_id, "Logout");
        }
        Ok(())
    }

    /// Re-establishes a session from a remember-me token, e.g. after a
    /// process restart wiped the session store. The account is re-checked:
    /// a disabled or locked account cannot ride an old token back in.
    pub async fn resume_session(&self, remember_token: &str) -> EngineResult<LoginOutcome> {
        let now = self.clock.now();
        let claims = verify_remember_token(&self.config.jwt_secret, remember_token, now)?;

        let employee = self
            .db
            .employees()
            .get_by_id(&claims.sub)
            .await?
            .filter(|e| e.status == panaderia_core::EmployeeStatus::Active)
            .ok_or(CoreError::Unauthenticated)?;

        if employee.is_locked(now) {
            return Err(CoreError::Unauthenticated.into());
        }

        let session = Session {
            user_id: employee.id.clone(),
            token: generate_session_token(),
            issued_at: now,
            expires_at: now + Duration::seconds(self.config.session_lifetime_secs),
            remember_me: true,
        };
        self.sessions.insert(session.clone());
        self.db.employees().update_last_access(&employee.id, now).await?;

        info!(employee_id = %employee.id, "Session resumed from remember-me token");
        Ok(LoginOutcome {
            profile: EmployeeProfile::from(&employee),
            permissions: permissions_for_role(employee.role),
            session,
            remember_token: None,
        })
    }

    // =========================================================================
    // Session Validation
    // =========================================================================

    /// Validates a session token against the store and the clock. An
    /// expired session is dropped from the store on sight.
    pub async fn validate_token(&self, token: &str) -> EngineResult<Session> {
        let session = self
            .sessions
            .get(token)
            .ok_or(CoreError::Unauthenticated)?;

        if session.is_expired(self.clock.now()) {
            debug!(employee_id = %session.user_id, "Session expired");
            self.sessions.remove(token);
            return Err(CoreError::Unauthenticated.into());
        }

        Ok(session)
    }

    /// Validates a token and returns the authenticated employee id.
    pub async fn require_authentication(&self, token: &str) -> EngineResult<String> {
        Ok(self.validate_token(token).await?.user_id)
    }

    /// Replaces a valid session with a fresh token and a full lifetime.
    /// The old token is invalid the moment this returns.
    pub async fn refresh_session(&self, token: &str) -> EngineResult<Session> {
        let old = self.validate_token(token).await?;
        self.sessions.remove(token);

        let now = self.clock.now();
        let session = Session {
            user_id: old.user_id.clone(),
            token: generate_session_token(),
            issued_at: now,
            expires_at: now + Duration::seconds(self.config.session_lifetime_secs),
            remember_me: old.remember_me,
        };
        self.sessions.insert(session.clone());
        self.db.employees().update_last_access(&old.user_id, now).await?;

        debug!(employee_id = %session.user_id, "Session refreshed");
        Ok(session)
    }

    /// Reports the authentication state of a token without erroring.
    pub async fn status(&self, token: &str) -> EngineResult<AuthStatus> {
        let session = match self.validate_token(token).await {
            Ok(session) => session,
            Err(_) => {
                return Ok(AuthStatus {
                    authenticated: false,
                    profile: None,
                    session: None,
                    permissions: PermissionSet::new(),
                })
            }
        };

        let employee = self
            .db
            .employees()
            .get_by_id(&session.user_id)
            .await?
            .ok_or(CoreError::Unauthenticated)?;

        Ok(AuthStatus {
            authenticated: true,
            profile: Some(EmployeeProfile::from(&employee)),
            permissions: permissions_for_role(employee.role),
            session: Some(session),
        })
    }

    // =========================================================================
    // Password Change
    // =========================================================================

    /// Changes the authenticated user's password.
    ///
    /// Checks run in order: session, confirmation match, strength policy,
    /// current password. Every other session of the user is revoked; the
    /// calling session survives.
    pub async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> EngineResult<()> {
        let session = self.validate_token(token).await?;

        if new_password != confirm_password {
            return Err(CoreError::PasswordMismatch.into());
        }
        validate_password_strength(new_password).map_err(CoreError::WeakPassword)?;

        let employee = self
            .db
            .employees()
            .get_by_id(&session.user_id)
            .await?
            .ok_or(CoreError::Unauthenticated)?;

        if !self
            .hasher
            .verify(current_password, &employee.password_hash)?
        {
            warn!(employee_id = %employee.id, "Password change with wrong current password");
            return Err(CoreError::CurrentPasswordMismatch.into());
        }

        let new_hash = self.hasher.hash(new_password)?;
        self.db
            .employees()
            .set_password_hash(&employee.id, &new_hash)
            .await?;

        // Revoke everything else, keep the session that made the change.
        self.sessions.remove_for_user(&employee.id);
        self.sessions.insert(session);

        info!(employee_id = %employee.id, "Password changed");
        Ok(())
    }
}
