//! End-to-end tests for the sale/inventory consistency flow: a sale and
//! its stock effects commit together or not at all, and cancellation puts
//! every unit back.

mod common;

use common::{seed_employee, seed_product, test_db};
use panaderia_core::{
    CoreError, EmployeeRole, MovementType, PaymentMethod, SaleStatus,
};
use panaderia_db::{SaleHeaderPatch, SaleListFilter};
use panaderia_engine::error::EngineError;
use panaderia_engine::sales::{NewSale, NewSaleLine, SalesEngine};

fn header(employee_id: &str) -> NewSale {
    NewSale {
        employee_id: employee_id.to_string(),
        customer_name: Some("Cliente mostrador".to_string()),
        customer_phone: None,
        tax_cents: 0,
        payment_method: PaymentMethod::Cash,
        notes: None,
        invoice_number: None,
    }
}

fn line(product_id: &str, quantity: i64) -> NewSaleLine {
    NewSaleLine {
        product_id: product_id.to_string(),
        quantity,
        unit_price_cents: None,
    }
}

#[tokio::test]
async fn sale_larger_than_stock_is_rejected_without_side_effects() {
    let db = test_db().await;
    let employee = seed_employee(&db, "caja1", EmployeeRole::Cashier, "x").await;
    let product = seed_product(&db, "PAN-CONCHA", 1200, 10).await;
    let engine = SalesEngine::new(db.clone());

    let err = engine
        .process_sale(header(&employee.id), vec![line(&product.id, 12)])
        .await
        .unwrap_err();

    match err {
        EngineError::Core(CoreError::InsufficientStock {
            available,
            requested,
            ..
        }) => {
            assert_eq!(available, 10);
            assert_eq!(requested, 12);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Nothing moved, nothing recorded.
    let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(stock.current_stock, 10);
    assert!(db.movements().list_recent(10).await.unwrap().is_empty());
    assert!(db
        .sales()
        .list(&SaleListFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn processed_sale_debits_stock_and_logs_exit_movements() {
    let db = test_db().await;
    let employee = seed_employee(&db, "caja1", EmployeeRole::Cashier, "x").await;
    let product = seed_product(&db, "PAN-CONCHA", 1200, 10).await;
    let engine = SalesEngine::new(db.clone());

    let (sale, lines) = engine
        .process_sale(header(&employee.id), vec![line(&product.id, 4)])
        .await
        .unwrap();

    assert_eq!(sale.status, SaleStatus::Completed);
    assert_eq!(sale.subtotal_cents, 4 * 1200);
    assert_eq!(sale.total_cents, 4 * 1200);
    assert!(sale.invoice_number.starts_with("FAC-"));
    assert_eq!(lines.len(), 1);
    // Price snapshotted from the product.
    assert_eq!(lines[0].unit_price_cents, 1200);
    assert_eq!(lines[0].line_subtotal_cents, 4800);

    let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(stock.current_stock, 6);

    let movements = db.movements().list_for_reference(&sale.id).await.unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0].movement_type, MovementType::Exit);
    assert_eq!(movements[0].quantity, 4);
    assert_eq!(movements[0].stock_delta, -4);
    assert_eq!(movements[0].reason, "Venta");
}

#[tokio::test]
async fn two_lines_that_jointly_overdraw_roll_back_the_whole_sale() {
    let db = test_db().await;
    let employee = seed_employee(&db, "caja1", EmployeeRole::Cashier, "x").await;
    let product = seed_product(&db, "PAN-CONCHA", 1200, 10).await;
    let engine = SalesEngine::new(db.clone());

    // Each line alone fits (6 <= 10), together they need 12. The first
    // exit movement lands, the second hits the guard, and the transaction
    // must take the first one down with it.
    let err = engine
        .process_sale(
            header(&employee.id),
            vec![line(&product.id, 6), line(&product.id, 6)],
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InsufficientStock { .. })
    ));

    let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(stock.current_stock, 10);
    assert!(db.movements().list_recent(10).await.unwrap().is_empty());
    assert!(db
        .sales()
        .list(&SaleListFilter::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn cancelling_a_completed_sale_restores_stock_exactly_once() {
    let db = test_db().await;
    let employee = seed_employee(&db, "caja1", EmployeeRole::Cashier, "x").await;
    let product = seed_product(&db, "PAN-CONCHA", 1200, 10).await;
    let engine = SalesEngine::new(db.clone());

    let (sale, _) = engine
        .process_sale(header(&employee.id), vec![line(&product.id, 4)])
        .await
        .unwrap();

    let cancelled = engine.cancel_sale(&sale.id, &employee.id).await.unwrap();
    assert_eq!(cancelled.status, SaleStatus::Cancelled);

    let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(stock.current_stock, 10);

    let movements = db.movements().list_for_reference(&sale.id).await.unwrap();
    assert_eq!(movements.len(), 2);
    let entry = movements
        .iter()
        .find(|m| m.movement_type == MovementType::Entry)
        .unwrap();
    assert_eq!(entry.quantity, 4);
    assert_eq!(entry.stock_delta, 4);
    assert_eq!(entry.reason, "Cancelación de venta");

    // Second cancel must not restock again.
    let err = engine.cancel_sale(&sale.id, &employee.id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::AlreadyCancelled(_))
    ));
    let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(stock.current_stock, 10);
}

#[tokio::test]
async fn pending_sales_are_editable_and_deletable_completed_are_not() {
    let db = test_db().await;
    let employee = seed_employee(&db, "caja1", EmployeeRole::Cashier, "x").await;
    let product = seed_product(&db, "PAN-CONCHA", 1200, 10).await;
    let engine = SalesEngine::new(db.clone());

    let pending = engine
        .create_sale(header(&employee.id), 0, 0, Some(SaleStatus::Pending))
        .await
        .unwrap();
    assert_eq!(pending.status, SaleStatus::Pending);
    // Header-only creation touches no stock.
    let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(stock.current_stock, 10);

    let updated = engine
        .update_sale(
            &pending.id,
            SaleHeaderPatch {
                customer_name: Some("Doña Lupita".to_string()),
                customer_phone: None,
                subtotal_cents: 2400,
                tax_cents: 0,
                total_cents: 2400,
                payment_method: PaymentMethod::Card,
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.customer_name.as_deref(), Some("Doña Lupita"));
    assert_eq!(updated.total_cents, 2400);

    engine.delete_sale(&pending.id).await.unwrap();
    assert!(db.sales().get_by_id(&pending.id).await.unwrap().is_none());

    // A processed (completed) sale refuses both.
    let (completed, _) = engine
        .process_sale(header(&employee.id), vec![line(&product.id, 2)])
        .await
        .unwrap();
    let err = engine.delete_sale(&completed.id).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Core(CoreError::InvalidSaleState { .. })
    ));
}

#[tokio::test]
async fn listing_filters_by_status() {
    let db = test_db().await;
    let employee = seed_employee(&db, "caja1", EmployeeRole::Cashier, "x").await;
    let product = seed_product(&db, "PAN-CONCHA", 1200, 50).await;
    let engine = SalesEngine::new(db.clone());

    let (a, _) = engine
        .process_sale(header(&employee.id), vec![line(&product.id, 1)])
        .await
        .unwrap();
    engine
        .process_sale(header(&employee.id), vec![line(&product.id, 2)])
        .await
        .unwrap();
    engine.cancel_sale(&a.id, &employee.id).await.unwrap();

    let completed = engine
        .list_sales(&SaleListFilter {
            status: Some(SaleStatus::Completed),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);

    let cancelled = engine
        .list_sales(&SaleListFilter {
            status: Some(SaleStatus::Cancelled),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(cancelled.len(), 1);
    assert_eq!(cancelled[0].id, a.id);
}

#[tokio::test]
async fn receipt_resolves_product_names_and_formats_amounts() {
    let db = test_db().await;
    let employee = seed_employee(&db, "caja1", EmployeeRole::Cashier, "x").await;
    let product = seed_product(&db, "PAN-CONCHA", 1250, 10).await;
    let engine = SalesEngine::new(db.clone());

    let (sale, _) = engine
        .process_sale(header(&employee.id), vec![line(&product.id, 3)])
        .await
        .unwrap();

    let receipt = engine.receipt(&sale.id).await.unwrap();
    assert_eq!(receipt.lines.len(), 1);
    assert_eq!(receipt.lines[0].product_name, product.name);
    assert_eq!(receipt.lines[0].unit_price, "$12.50");
    assert_eq!(receipt.lines[0].line_subtotal, "$37.50");
    assert_eq!(receipt.total, "$37.50");
}
