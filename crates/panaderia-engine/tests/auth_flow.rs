//! Tests for the auth session manager: the lockout state machine, session
//! lifecycle and password changes. Time is driven by a manual clock; no
//! test sleeps.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{seed_employee, test_db};
use panaderia_core::{CoreError, EmployeeRole};
use panaderia_db::Database;
use panaderia_engine::auth::AuthSessionManager;
use panaderia_engine::clock::{Clock, ManualClock};
use panaderia_engine::config::AuthConfig;
use panaderia_engine::error::EngineError;
use panaderia_engine::hasher::{Argon2Hasher, PasswordHasher};

const PASSWORD: &str = "pan123";

async fn setup() -> (Database, AuthSessionManager, Arc<ManualClock>) {
    let db = test_db().await;
    let hash = Argon2Hasher.hash(PASSWORD).unwrap();
    seed_employee(&db, "maria", EmployeeRole::Cashier, &hash).await;

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let manager =
        AuthSessionManager::new(db.clone(), AuthConfig::default()).with_clock(clock.clone());
    (db, manager, clock)
}

fn assert_invalid_credentials(err: EngineError) {
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn five_failures_lock_the_account_even_for_the_right_password() {
    let (_db, manager, clock) = setup().await;

    for _ in 0..5 {
        let err = manager.login("maria", "wrong-pass1", false).await.unwrap_err();
        assert_invalid_credentials(err);
    }

    // Correct password, but the window is active.
    let err = manager.login("maria", PASSWORD, false).await.unwrap_err();
    match err {
        EngineError::Core(CoreError::AccountLocked { retry_after_secs }) => {
            assert!(retry_after_secs > 0 && retry_after_secs <= 15 * 60);
        }
        other => panic!("expected AccountLocked, got {other:?}"),
    }

    // Once the window elapses the right password gets in.
    clock.advance(Duration::minutes(16));
    let outcome = manager.login("maria", PASSWORD, false).await.unwrap();
    assert_eq!(outcome.profile.username, "maria");
}

#[tokio::test]
async fn an_expired_lock_relocks_on_the_very_next_failure() {
    let (db, manager, clock) = setup().await;

    for _ in 0..5 {
        let _ = manager.login("maria", "wrong-pass1", false).await;
    }
    clock.advance(Duration::minutes(16));

    // The window expired but the counter did not reset: one more failure
    // crosses the threshold again immediately.
    let err = manager.login("maria", "wrong-pass1", false).await.unwrap_err();
    assert_invalid_credentials(err);
    let err = manager.login("maria", PASSWORD, false).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::AccountLocked { .. })
    ));

    let employee = db
        .employees()
        .find_active_by_identifier("maria")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(employee.failed_login_count, 6);
}

#[tokio::test]
async fn success_resets_the_failure_counter() {
    let (db, manager, _clock) = setup().await;

    for _ in 0..4 {
        let _ = manager.login("maria", "wrong-pass1", false).await;
    }
    manager.login("maria", PASSWORD, false).await.unwrap();

    let employee = db
        .employees()
        .find_active_by_identifier("maria")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(employee.failed_login_count, 0);
    assert!(employee.locked_until.is_none());
    assert!(employee.last_access.is_some());

    // Four fresh failures stay under the threshold.
    for _ in 0..4 {
        let _ = manager.login("maria", "wrong-pass1", false).await;
    }
    let outcome = manager.login("maria", PASSWORD, false).await;
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn unknown_user_and_wrong_password_are_indistinguishable() {
    let (_db, manager, _clock) = setup().await;

    let unknown = manager
        .login("nadie", "whatever1", false)
        .await
        .unwrap_err();
    let wrong = manager
        .login("maria", "wrong-pass1", false)
        .await
        .unwrap_err();

    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn login_by_email_works_too() {
    let (_db, manager, _clock) = setup().await;

    let outcome = manager
        .login("maria@panaderia.test", PASSWORD, false)
        .await
        .unwrap();
    assert_eq!(outcome.profile.username, "maria");
    // Cashiers can create sales but not delete them.
    let sales_actions = outcome
        .permissions
        .get(&panaderia_core::Module::Sales)
        .unwrap();
    assert!(sales_actions.contains(&panaderia_core::Action::Create));
    assert!(!sales_actions.contains(&panaderia_core::Action::Delete));
}

#[tokio::test]
async fn session_lifecycle_validate_then_logout() {
    let (_db, manager, _clock) = setup().await;

    let outcome = manager.login("maria", PASSWORD, false).await.unwrap();
    let token = outcome.session.token.clone();

    let session = manager.validate_token(&token).await.unwrap();
    assert_eq!(session.user_id, outcome.profile.id);

    manager.logout(&token).await.unwrap();
    let err = manager.validate_token(&token).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::Unauthenticated)
    ));

    // Logout is idempotent.
    manager.logout(&token).await.unwrap();
}

#[tokio::test]
async fn sessions_expire_after_their_lifetime() {
    let (_db, manager, clock) = setup().await;

    let outcome = manager.login("maria", PASSWORD, false).await.unwrap();
    let token = outcome.session.token;

    clock.advance(Duration::seconds(7199));
    assert!(manager.validate_token(&token).await.is_ok());

    clock.advance(Duration::seconds(2));
    let err = manager.validate_token(&token).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::Unauthenticated)
    ));

    let status = manager.status(&token).await.unwrap();
    assert!(!status.authenticated);
    assert!(status.permissions.is_empty());
}

#[tokio::test]
async fn refresh_rotates_the_token_and_kills_the_old_one() {
    let (_db, manager, clock) = setup().await;

    let outcome = manager.login("maria", PASSWORD, false).await.unwrap();
    let old_token = outcome.session.token;

    clock.advance(Duration::minutes(90));
    let fresh = manager.refresh_session(&old_token).await.unwrap();
    assert_ne!(fresh.token, old_token);
    // Full lifetime from the refresh instant.
    assert_eq!(fresh.expires_at, clock.now() + Duration::seconds(7200));

    assert!(manager.validate_token(&old_token).await.is_err());
    assert!(manager.validate_token(&fresh.token).await.is_ok());
}

#[tokio::test]
async fn change_password_checks_run_in_order_and_session_survives() {
    let (_db, manager, _clock) = setup().await;

    let outcome = manager.login("maria", PASSWORD, false).await.unwrap();
    let token = outcome.session.token.clone();

    let err = manager
        .change_password(&token, PASSWORD, "nueva456", "otra456")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::PasswordMismatch)
    ));

    let err = manager
        .change_password(&token, PASSWORD, "corta", "corta")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Core(CoreError::WeakPassword(_))));

    let err = manager
        .change_password(&token, "wrong-current1", "nueva456", "nueva456")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::CurrentPasswordMismatch)
    ));

    manager
        .change_password(&token, PASSWORD, "nueva456", "nueva456")
        .await
        .unwrap();

    // The calling session is still valid after the change.
    assert!(manager.validate_token(&token).await.is_ok());

    // Old password is dead, new one works.
    let err = manager.login("maria", PASSWORD, false).await.unwrap_err();
    assert_invalid_credentials(err);
    manager.login("maria", "nueva456", false).await.unwrap();
}

#[tokio::test]
async fn change_password_revokes_other_sessions() {
    let (_db, manager, _clock) = setup().await;

    let first = manager.login("maria", PASSWORD, false).await.unwrap();
    let second = manager.login("maria", PASSWORD, false).await.unwrap();

    manager
        .change_password(&second.session.token, PASSWORD, "nueva456", "nueva456")
        .await
        .unwrap();

    assert!(manager.validate_token(&first.session.token).await.is_err());
    assert!(manager.validate_token(&second.session.token).await.is_ok());
}

#[tokio::test]
async fn remember_me_token_resumes_a_session_after_logout() {
    let (_db, manager, clock) = setup().await;

    let outcome = manager.login("maria", PASSWORD, true).await.unwrap();
    let remember = outcome.remember_token.expect("remember token issued");
    manager.logout(&outcome.session.token).await.unwrap();

    clock.advance(Duration::days(3));
    let resumed = manager.resume_session(&remember).await.unwrap();
    assert_eq!(resumed.profile.username, "maria");
    assert!(manager.validate_token(&resumed.session.token).await.is_ok());

    // Past its lifetime the token is refused.
    clock.advance(Duration::days(30));
    let err = manager.resume_session(&remember).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::Unauthenticated)
    ));
}

#[tokio::test]
async fn plain_login_issues_no_remember_token() {
    let (_db, manager, _clock) = setup().await;

    let outcome = manager.login("maria", PASSWORD, false).await.unwrap();
    assert!(outcome.remember_token.is_none());
}
