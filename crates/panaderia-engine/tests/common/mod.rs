//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use chrono::Utc;
use uuid::Uuid;

use panaderia_core::{
    Employee, EmployeeRole, EmployeeStatus, Product, ProductStatus,
};
use panaderia_db::{Database, DbConfig};

/// Fresh in-memory database with migrations applied.
pub async fn test_db() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

/// Inserts an active product and returns it.
pub async fn seed_product(db: &Database, code: &str, price_cents: i64, stock: i64) -> Product {
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        code: code.to_string(),
        name: format!("Producto {code}"),
        description: None,
        price_cents,
        cost_cents: price_cents / 3,
        current_stock: stock,
        min_stock: 5,
        category_id: None,
        status: ProductStatus::Active,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.unwrap();
    product
}

/// Inserts an active employee with the given pre-computed password hash.
pub async fn seed_employee(
    db: &Database,
    username: &str,
    role: EmployeeRole,
    password_hash: &str,
) -> Employee {
    let now = Utc::now();
    let employee = Employee {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        email: format!("{username}@panaderia.test"),
        first_name: "Ana".to_string(),
        last_name: "Martínez".to_string(),
        password_hash: password_hash.to_string(),
        role,
        status: EmployeeStatus::Active,
        failed_login_count: 0,
        locked_until: None,
        last_access: None,
        created_at: now,
        updated_at: now,
    };
    db.employees().insert(&employee).await.unwrap();
    employee
}
