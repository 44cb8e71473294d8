//! # Engine Configuration
//!
//! Tunables for the auth state machine, loaded from `PANADERIA_*`
//! environment variables with production defaults from panaderia-core.

use panaderia_core::{
    LOCKOUT_MINUTES, MAX_LOGIN_ATTEMPTS, REMEMBER_ME_DAYS, SESSION_LIFETIME_SECS,
};
use tracing::warn;

/// Configuration for the auth session manager.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Consecutive failures that trigger a lockout.
    pub max_login_attempts: i64,

    /// Lockout window length, in minutes.
    pub lockout_minutes: i64,

    /// Regular session lifetime, in seconds.
    pub session_lifetime_secs: i64,

    /// Remember-me token lifetime, in days.
    pub remember_me_days: i64,

    /// HMAC secret for remember-me tokens. Must be overridden in
    /// production via `PANADERIA_JWT_SECRET`.
    pub jwt_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        AuthConfig {
            max_login_attempts: MAX_LOGIN_ATTEMPTS,
            lockout_minutes: LOCKOUT_MINUTES,
            session_lifetime_secs: SESSION_LIFETIME_SECS,
            remember_me_days: REMEMBER_ME_DAYS,
            jwt_secret: "panaderia-dev-secret-change-me".to_string(),
        }
    }
}

impl AuthConfig {
    /// Loads configuration from the environment, falling back to defaults
    /// for anything unset or unparseable.
    pub fn load() -> Self {
        let defaults = AuthConfig::default();

        let jwt_secret = match std::env::var("PANADERIA_JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                warn!("PANADERIA_JWT_SECRET not set, using development secret");
                defaults.jwt_secret.clone()
            }
        };

        AuthConfig {
            max_login_attempts: env_i64("PANADERIA_MAX_LOGIN_ATTEMPTS", defaults.max_login_attempts),
            lockout_minutes: env_i64("PANADERIA_LOCKOUT_MINUTES", defaults.lockout_minutes),
            session_lifetime_secs: env_i64(
                "PANADERIA_SESSION_LIFETIME_SECS",
                defaults.session_lifetime_secs,
            ),
            remember_me_days: env_i64("PANADERIA_REMEMBER_ME_DAYS", defaults.remember_me_days),
            jwt_secret,
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    match std::env::var(key) {
        Ok(value) => match value.parse::<i64>() {
            Ok(parsed) if parsed > 0 => parsed,
            _ => {
                warn!(key, value, "Ignoring unparseable config value");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_domain_constants() {
        let config = AuthConfig::default();
        assert_eq!(config.max_login_attempts, 5);
        assert_eq!(config.lockout_minutes, 15);
        assert_eq!(config.session_lifetime_secs, 7200);
        assert_eq!(config.remember_me_days, 30);
    }
}
