//! # Employee Repository
//!
//! Database operations for employee accounts and their auth counters.
//!
//! Time never originates here: the auth manager computes lockout expiries
//! and access timestamps through its injected clock and passes them down,
//! so the lockout state machine is testable without sleeping.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use panaderia_core::Employee;

/// Repository for employee database operations.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

const EMPLOYEE_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, \
     role, status, failed_login_count, locked_until, last_access, \
     created_at, updated_at";

impl EmployeeRepository {
    /// Creates a new EmployeeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    /// Finds an active employee by username or email.
    ///
    /// Inactive accounts are filtered out here, so to the caller a disabled
    /// account is indistinguishable from a missing one.
    pub async fn find_active_by_identifier(&self, identifier: &str) -> DbResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            r#"
            SELECT {EMPLOYEE_COLUMNS}
            FROM employees
            WHERE (username = ?1 OR email = ?1) AND status = 'active'
            "#
        ))
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    /// Gets an employee by id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(&format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(employee)
    }

    /// Inserts an employee (seed data and tests).
    pub async fn insert(&self, employee: &Employee) -> DbResult<()> {
        debug!(id = %employee.id, username = %employee.username, "Inserting employee");

        sqlx::query(
            r#"
            INSERT INTO employees (
                id, username, email, first_name, last_name, password_hash,
                role, status, failed_login_count, locked_until, last_access,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&employee.id)
        .bind(&employee.username)
        .bind(&employee.email)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.password_hash)
        .bind(employee.role)
        .bind(employee.status)
        .bind(employee.failed_login_count)
        .bind(employee.locked_until)
        .bind(employee.last_access)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a failed login: new counter value plus the lockout expiry,
    /// if this failure crossed the threshold.
    pub async fn record_failed_attempt(
        &self,
        id: &str,
        failed_count: i64,
        locked_until: Option<DateTime<Utc>>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE employees
            SET failed_login_count = ?2, locked_until = ?3,
                updated_at = datetime('now')
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(failed_count)
        .bind(locked_until)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Clears the failure counter and lock after a successful login, and
    /// stamps last_access in the same write.
    pub async fn clear_failed_attempts(
        &self,
        id: &str,
        last_access: DateTime<Utc>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            UPDATE employees
            SET failed_login_count = 0, locked_until = NULL,
                last_access = ?2, updated_at = datetime('now')
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(last_access)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Stamps last_access (session refresh, authenticated activity).
    pub async fn update_last_access(&self, id: &str, at: DateTime<Utc>) -> DbResult<()> {
        sqlx::query(
            "UPDATE employees SET last_access = ?2, updated_at = datetime('now') WHERE id = ?1",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replaces the stored password hash.
    pub async fn set_password_hash(&self, id: &str, password_hash: &str) -> DbResult<()> {
        debug!(id, "Updating password hash");

        sqlx::query(
            "UPDATE employees SET password_hash = ?2, updated_at = datetime('now') WHERE id = ?1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
