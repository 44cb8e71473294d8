//! Seeds a development database with a starter catalog and an admin
//! account.
//!
//! ```text
//! PANADERIA_DB=./panaderia.db PANADERIA_ADMIN_PASSWORD=admin123 cargo run --bin seed
//! ```

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use panaderia_core::{Employee, EmployeeRole, EmployeeStatus, Product, ProductStatus};
use panaderia_db::{Database, DbConfig};
use panaderia_engine::hasher::{Argon2Hasher, PasswordHasher};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_path =
        std::env::var("PANADERIA_DB").unwrap_or_else(|_| "./panaderia.db".to_string());
    let db = Database::new(DbConfig::new(&db_path)).await?;
    info!(path = %db_path, "Database ready");

    seed_products(&db).await?;
    seed_admin(&db).await?;

    db.close().await;
    Ok(())
}

async fn seed_products(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    let catalog: [(&str, &str, i64, i64, i64, i64); 5] = [
        // (code, name, price_cents, cost_cents, stock, min_stock)
        ("PAN-BOLILLO", "Bolillo", 250, 90, 120, 40),
        ("PAN-CONCHA", "Concha de vainilla", 1200, 450, 60, 20),
        ("PAN-CUERNO", "Cuerno", 1000, 380, 45, 15),
        ("PAST-TRES-LECHES", "Pastel tres leches (rebanada)", 4500, 1800, 12, 4),
        ("GAL-POLVORON", "Polvorón", 800, 250, 80, 25),
    ];

    let now = Utc::now();
    for (code, name, price_cents, cost_cents, stock, min_stock) in catalog {
        if db.products().get_by_code(code).await?.is_some() {
            warn!(code, "Product already seeded, skipping");
            continue;
        }

        db.products()
            .insert(&Product {
                id: Uuid::new_v4().to_string(),
                code: code.to_string(),
                name: name.to_string(),
                description: None,
                price_cents,
                cost_cents,
                current_stock: stock,
                min_stock,
                category_id: None,
                status: ProductStatus::Active,
                created_at: now,
                updated_at: now,
            })
            .await?;
        info!(code, "Product seeded");
    }

    Ok(())
}

async fn seed_admin(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    if db
        .employees()
        .find_active_by_identifier("admin")
        .await?
        .is_some()
    {
        warn!("Admin account already exists, skipping");
        return Ok(());
    }

    let password = std::env::var("PANADERIA_ADMIN_PASSWORD")
        .unwrap_or_else(|_| "admin123".to_string());
    let password_hash = Argon2Hasher.hash(&password)?;

    let now = Utc::now();
    db.employees()
        .insert(&Employee {
            id: Uuid::new_v4().to_string(),
            username: "admin".to_string(),
            email: "admin@panaderia.test".to_string(),
            first_name: "Administrador".to_string(),
            last_name: "Sistema".to_string(),
            password_hash,
            role: EmployeeRole::Admin,
            status: EmployeeStatus::Active,
            failed_login_count: 0,
            locked_until: None,
            last_access: None,
            created_at: now,
            updated_at: now,
        })
        .await?;

    info!("Admin account seeded");
    Ok(())
}
