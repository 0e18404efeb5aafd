//! End-to-end order fulfillment against in-memory and file databases.

use emporium_core::{
    generate_id, CoreError, Customer, LineRequest, Money, OrderStatus, Payment, Product,
};
use emporium_db::{CancelOutcome, Database, DbConfig, DbError};

// =============================================================================
// Fixtures
// =============================================================================

async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn add_product(db: &Database, name: &str, price: &str, stock: i64) -> Product {
    let product = Product::new(name, "Test", price.parse().unwrap(), stock).unwrap();
    db.products().insert(&product).await.unwrap()
}

async fn add_customer(db: &Database, name: &str) -> Customer {
    let customer = Customer::new(name, None, None).unwrap();
    db.customers().insert(&customer).await.unwrap()
}

async fn stock_of(db: &Database, product: &Product) -> i64 {
    db.products()
        .get_by_id(&product.id)
        .await
        .unwrap()
        .unwrap()
        .stock
}

fn domain(err: DbError) -> CoreError {
    match err {
        DbError::Domain(e) => e,
        other => panic!("expected a domain error, got {other:?}"),
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_place_pay_then_cancel_is_refused() {
    let db = setup().await;
    let engine = db.fulfillment();
    let pen = add_product(&db, "Pen", "10.00", 5).await;
    let ada = add_customer(&db, "Ada").await;

    let order = engine
        .place_order(&ada.id, &[LineRequest::new(&pen.id, 3)])
        .await
        .unwrap();
    assert_eq!(order.total(), Money::from_cents(3000));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(stock_of(&db, &pen).await, 2);

    let paid = engine
        .record_payment(&order.id, "30.00".parse().unwrap(), "cash")
        .await
        .unwrap();
    assert_eq!(paid.status, OrderStatus::Paid);
    assert!(paid.paid_at.is_some());

    let err = domain(engine.cancel_order(&order.id, true).await.unwrap_err());
    assert!(matches!(
        err,
        CoreError::OrderNotCancellable { status: OrderStatus::Paid, .. }
    ));
    assert_eq!(stock_of(&db, &pen).await, 2);
}

#[tokio::test]
async fn test_insufficient_stock_writes_nothing() {
    let db = setup().await;
    let engine = db.fulfillment();
    let pen = add_product(&db, "Pen", "10.00", 5).await;
    let ada = add_customer(&db, "Ada").await;

    let err = domain(
        engine
            .place_order(&ada.id, &[LineRequest::new(&pen.id, 10)])
            .await
            .unwrap_err(),
    );
    assert_eq!(
        err,
        CoreError::InsufficientStock {
            product_id: pen.id.clone(),
            available: 5,
            requested: 10,
        }
    );

    assert_eq!(stock_of(&db, &pen).await, 5);
    assert!(engine.list_orders_for_customer(&ada.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_cancel_unpaid_order_restores_stock() {
    let db = setup().await;
    let engine = db.fulfillment();
    let mug = add_product(&db, "Mug", "4.00", 5).await;
    let ada = add_customer(&db, "Ada").await;

    let order = engine
        .place_order(&ada.id, &[LineRequest::new(&mug.id, 2)])
        .await
        .unwrap();
    assert_eq!(order.total(), Money::from_cents(800));
    assert_eq!(stock_of(&db, &mug).await, 3);

    let outcome = engine.cancel_order(&order.id, false).await.unwrap();
    let CancelOutcome::Cancelled(cancelled) = outcome else {
        panic!("expected the order to be cancelled");
    };
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(stock_of(&db, &mug).await, 5);

    let err = domain(engine.cancel_order(&order.id, false).await.unwrap_err());
    assert!(matches!(
        err,
        CoreError::OrderNotCancellable { status: OrderStatus::Cancelled, .. }
    ));
    assert_eq!(stock_of(&db, &mug).await, 5);
}

#[tokio::test]
async fn test_underpayment_leaves_order_pending() {
    let db = setup().await;
    let engine = db.fulfillment();
    let mug = add_product(&db, "Mug", "4.00", 5).await;
    let ada = add_customer(&db, "Ada").await;

    let order = engine
        .place_order(&ada.id, &[LineRequest::new(&mug.id, 2)])
        .await
        .unwrap();

    let err = domain(
        engine
            .record_payment(&order.id, "7.99".parse().unwrap(), "card")
            .await
            .unwrap_err(),
    );
    assert!(matches!(err, CoreError::UnderPayment { .. }));

    let err = domain(
        engine
            .record_payment(&order.id, "8.01".parse().unwrap(), "card")
            .await
            .unwrap_err(),
    );
    assert!(matches!(err, CoreError::OverPayment { .. }));

    let details = engine.get_order(&order.id).await.unwrap();
    assert_eq!(details.order.status, OrderStatus::Pending);
    assert!(details.payment.is_none());
}

// =============================================================================
// Properties
// =============================================================================

#[tokio::test]
async fn test_total_and_stock_follow_each_line() {
    let db = setup().await;
    let engine = db.fulfillment();
    let pen = add_product(&db, "Pen", "1.50", 10).await;
    let ink = add_product(&db, "Ink", "3.25", 4).await;
    let ada = add_customer(&db, "Ada").await;

    let order = engine
        .place_order(
            &ada.id,
            &[
                LineRequest::new(&ink.id, 1),
                LineRequest::new(&pen.id, 4),
                LineRequest::new(&ink.id, 2),
            ],
        )
        .await
        .unwrap();

    // 1 x 3.25 + 4 x 1.50 + 2 x 3.25
    assert_eq!(order.total_cents, 325 + 600 + 650);
    assert_eq!(stock_of(&db, &pen).await, 6);
    assert_eq!(stock_of(&db, &ink).await, 1);

    let details = engine.get_order(&order.id).await.unwrap();
    let products: Vec<_> = details.lines.iter().map(|l| l.product_id.clone()).collect();
    assert_eq!(products, vec![ink.id.clone(), pen.id.clone(), ink.id.clone()]);
    assert_eq!(details.lines_total(), order.total());
}

#[tokio::test]
async fn test_place_order_is_all_or_nothing() {
    let db = setup().await;
    let engine = db.fulfillment();
    let pen = add_product(&db, "Pen", "1.00", 10).await;
    let ink = add_product(&db, "Ink", "2.00", 1).await;
    let ada = add_customer(&db, "Ada").await;

    // First line fits, second does not
    let err = domain(
        engine
            .place_order(
                &ada.id,
                &[LineRequest::new(&pen.id, 5), LineRequest::new(&ink.id, 2)],
            )
            .await
            .unwrap_err(),
    );
    assert!(matches!(err, CoreError::InsufficientStock { .. }));
    assert_eq!(stock_of(&db, &pen).await, 10);
    assert_eq!(stock_of(&db, &ink).await, 1);

    // Unknown product after a valid one
    let err = domain(
        engine
            .place_order(
                &ada.id,
                &[LineRequest::new(&pen.id, 5), LineRequest::new("no-such-product", 1)],
            )
            .await
            .unwrap_err(),
    );
    assert_eq!(err, CoreError::ProductNotFound("no-such-product".into()));
    assert_eq!(stock_of(&db, &pen).await, 10);

    // Repeated product whose combined quantity exceeds stock
    let err = domain(
        engine
            .place_order(
                &ada.id,
                &[LineRequest::new(&ink.id, 1), LineRequest::new(&ink.id, 1)],
            )
            .await
            .unwrap_err(),
    );
    assert!(matches!(err, CoreError::InsufficientStock { requested: 2, .. }));
    assert_eq!(stock_of(&db, &ink).await, 1);

    assert!(engine.list_orders_for_customer(&ada.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_customer_and_empty_order() {
    let db = setup().await;
    let engine = db.fulfillment();
    let pen = add_product(&db, "Pen", "1.00", 10).await;
    let ada = add_customer(&db, "Ada").await;

    let err = domain(
        engine
            .place_order("nobody", &[LineRequest::new(&pen.id, 1)])
            .await
            .unwrap_err(),
    );
    assert_eq!(err, CoreError::CustomerNotFound("nobody".into()));

    let err = domain(engine.place_order(&ada.id, &[]).await.unwrap_err());
    assert!(matches!(err, CoreError::Validation(_)));

    let err = domain(
        engine
            .place_order(&ada.id, &[LineRequest::new(&pen.id, 0)])
            .await
            .unwrap_err(),
    );
    assert!(matches!(err, CoreError::Validation(_)));
    assert_eq!(stock_of(&db, &pen).await, 10);
}

#[tokio::test]
async fn test_second_payment_is_refused_and_payment_moves_no_stock() {
    let db = setup().await;
    let engine = db.fulfillment();
    let pen = add_product(&db, "Pen", "2.50", 4).await;
    let ada = add_customer(&db, "Ada").await;

    let order = engine
        .place_order(&ada.id, &[LineRequest::new(&pen.id, 2)])
        .await
        .unwrap();
    assert_eq!(stock_of(&db, &pen).await, 2);

    let paid = engine
        .record_payment(&order.id, order.total(), "cash")
        .await
        .unwrap();
    assert_eq!(paid.total_cents, order.total_cents);
    assert_eq!(stock_of(&db, &pen).await, 2);

    let err = domain(
        engine
            .record_payment(&order.id, order.total(), "cash")
            .await
            .unwrap_err(),
    );
    assert!(matches!(
        err,
        CoreError::OrderNotPending { status: OrderStatus::Paid, .. }
    ));

    let details = engine.get_order(&order.id).await.unwrap();
    let payment = details.payment.unwrap();
    assert_eq!(payment.amount(), order.total());
    assert_eq!(payment.method, "cash");
    assert_eq!(details.order.total_cents, order.total_cents);
    assert_eq!(stock_of(&db, &pen).await, 2);
}

#[tokio::test]
async fn test_payment_on_unknown_order_and_bad_method() {
    let db = setup().await;
    let engine = db.fulfillment();

    let err = domain(
        engine
            .record_payment("missing", Money::from_cents(100), "cash")
            .await
            .unwrap_err(),
    );
    assert_eq!(err, CoreError::OrderNotFound("missing".into()));

    let err = domain(
        engine
            .record_payment("missing", Money::from_cents(100), "  ")
            .await
            .unwrap_err(),
    );
    assert!(matches!(err, CoreError::Validation(_)));

    let err = domain(engine.cancel_order("missing", true).await.unwrap_err());
    assert_eq!(err, CoreError::OrderNotFound("missing".into()));
}

#[tokio::test]
async fn test_free_order_settles_with_zero() {
    let db = setup().await;
    let engine = db.fulfillment();
    let sample = add_product(&db, "Sample", "0", 3).await;
    let ada = add_customer(&db, "Ada").await;

    let order = engine
        .place_order(&ada.id, &[LineRequest::new(&sample.id, 1)])
        .await
        .unwrap();
    assert!(order.total().is_zero());

    let paid = engine
        .record_payment(&order.id, Money::zero(), "voucher")
        .await
        .unwrap();
    assert_eq!(paid.status, OrderStatus::Paid);
}

// =============================================================================
// Paid-but-Pending Cancellation
// =============================================================================

/// Attaches a payment without moving the order out of Pending, the way an
/// external tool writing straight to the database could.
async fn attach_payment_only(db: &Database, order_id: &str, cents: i64) {
    let mut uow = db.begin().await.unwrap();
    let payment = Payment {
        id: generate_id(),
        order_id: order_id.to_string(),
        amount_cents: cents,
        method: "transfer".to_string(),
        created_at: uow.now(),
    };
    uow.insert_payment(&payment).await.unwrap();
    uow.commit().await.unwrap();
}

#[tokio::test]
async fn test_cancel_with_payment_needs_confirmation() {
    let db = setup().await;
    let engine = db.fulfillment();
    let pen = add_product(&db, "Pen", "5.00", 5).await;
    let ada = add_customer(&db, "Ada").await;

    let order = engine
        .place_order(&ada.id, &[LineRequest::new(&pen.id, 2)])
        .await
        .unwrap();
    attach_payment_only(&db, &order.id, order.total_cents).await;

    let outcome = engine.cancel_order(&order.id, false).await.unwrap();
    assert_eq!(
        outcome,
        CancelOutcome::Aborted {
            order_id: order.id.clone()
        }
    );
    assert_eq!(stock_of(&db, &pen).await, 3);
    let details = engine.get_order(&order.id).await.unwrap();
    assert_eq!(details.order.status, OrderStatus::Pending);

    let outcome = engine.cancel_order(&order.id, true).await.unwrap();
    assert!(matches!(outcome, CancelOutcome::Cancelled(_)));
    assert_eq!(stock_of(&db, &pen).await, 5);

    // The payment stays attached to the cancelled order
    let details = engine.get_order(&order.id).await.unwrap();
    assert_eq!(details.order.status, OrderStatus::Cancelled);
    assert!(details.payment.is_some());
}

#[tokio::test]
async fn test_pending_order_with_payment_refuses_another() {
    let db = setup().await;
    let engine = db.fulfillment();
    let pen = add_product(&db, "Pen", "5.00", 5).await;
    let ada = add_customer(&db, "Ada").await;

    let order = engine
        .place_order(&ada.id, &[LineRequest::new(&pen.id, 1)])
        .await
        .unwrap();
    attach_payment_only(&db, &order.id, order.total_cents).await;

    let err = domain(
        engine
            .record_payment(&order.id, order.total(), "cash")
            .await
            .unwrap_err(),
    );
    assert_eq!(err, CoreError::PaymentAlreadyRecorded(order.id.clone()));
}

// =============================================================================
// History, Spend and Account Deletion
// =============================================================================

#[tokio::test]
async fn test_history_and_lifetime_spend() {
    let db = setup().await;
    let engine = db.fulfillment();
    let pen = add_product(&db, "Pen", "2.00", 20).await;
    let ada = add_customer(&db, "Ada").await;
    let grace = add_customer(&db, "Grace").await;

    let first = engine
        .place_order(&ada.id, &[LineRequest::new(&pen.id, 1)])
        .await
        .unwrap();
    engine
        .record_payment(&first.id, first.total(), "cash")
        .await
        .unwrap();

    let second = engine
        .place_order(&ada.id, &[LineRequest::new(&pen.id, 3)])
        .await
        .unwrap();
    engine
        .record_payment(&second.id, second.total(), "card")
        .await
        .unwrap();

    let third = engine
        .place_order(&ada.id, &[LineRequest::new(&pen.id, 5)])
        .await
        .unwrap();
    engine.cancel_order(&third.id, false).await.unwrap();

    let fourth = engine
        .place_order(&ada.id, &[LineRequest::new(&pen.id, 2)])
        .await
        .unwrap();

    engine
        .place_order(&grace.id, &[LineRequest::new(&pen.id, 1)])
        .await
        .unwrap();

    let history = engine.list_orders_for_customer(&ada.id).await.unwrap();
    let ids: Vec<_> = history.iter().map(|o| o.id.clone()).collect();
    assert_eq!(ids, vec![fourth.id, third.id, second.id, first.id]);

    // Only paid orders count: 1 x 2.00 + 3 x 2.00
    assert_eq!(
        engine.lifetime_spend(&ada.id).await.unwrap(),
        Money::from_cents(800)
    );
    assert!(engine.lifetime_spend(&grace.id).await.unwrap().is_zero());

    let err = domain(engine.lifetime_spend("nobody").await.unwrap_err());
    assert_eq!(err, CoreError::CustomerNotFound("nobody".into()));
}

#[tokio::test]
async fn test_delete_account_removes_orders_without_restocking() {
    let db = setup().await;
    let engine = db.fulfillment();
    let pen = add_product(&db, "Pen", "2.00", 10).await;
    let ada = add_customer(&db, "Ada").await;
    let grace = add_customer(&db, "Grace").await;

    let paid = engine
        .place_order(&ada.id, &[LineRequest::new(&pen.id, 2)])
        .await
        .unwrap();
    engine
        .record_payment(&paid.id, paid.total(), "cash")
        .await
        .unwrap();
    let pending = engine
        .place_order(&ada.id, &[LineRequest::new(&pen.id, 3)])
        .await
        .unwrap();
    let kept = engine
        .place_order(&grace.id, &[LineRequest::new(&pen.id, 1)])
        .await
        .unwrap();
    assert_eq!(stock_of(&db, &pen).await, 4);

    let deleted = engine.delete_account(&ada.id).await.unwrap();
    assert_eq!(deleted, 2);

    assert!(db.customers().get_by_id(&ada.id).await.unwrap().is_none());
    for id in [&paid.id, &pending.id] {
        let err = domain(engine.get_order(id).await.unwrap_err());
        assert!(matches!(err, CoreError::OrderNotFound(_)));
    }
    assert!(engine.get_order(&kept.id).await.is_ok());
    assert_eq!(stock_of(&db, &pen).await, 4);

    let err = domain(engine.delete_account(&ada.id).await.unwrap_err());
    assert_eq!(err, CoreError::CustomerNotFound(ada.id.clone()));
}

#[tokio::test]
async fn test_price_change_keeps_order_snapshot() {
    let db = setup().await;
    let engine = db.fulfillment();
    let mut pen = add_product(&db, "Pen", "2.00", 10).await;
    let ada = add_customer(&db, "Ada").await;

    let order = engine
        .place_order(&ada.id, &[LineRequest::new(&pen.id, 2)])
        .await
        .unwrap();

    pen.price_cents = 999;
    pen.name = "Premium Pen".to_string();
    db.products().update(&pen).await.unwrap();

    let details = engine.get_order(&order.id).await.unwrap();
    assert_eq!(details.order.total_cents, 400);
    assert_eq!(details.lines[0].unit_price_cents, 200);
    assert_eq!(details.lines[0].name_snapshot, "Pen");

    // Product still referenced by a line cannot be removed
    assert!(matches!(
        db.products().delete(&pen.id).await,
        Err(DbError::ForeignKeyViolation { .. })
    ));
}

// =============================================================================
// Concurrent Writers
// =============================================================================

/// A file database removed when dropped. `:memory:` pins the pool to a
/// single connection, so only a file exercises competing connections.
struct ScratchFile(std::path::PathBuf);

impl ScratchFile {
    fn new() -> Self {
        ScratchFile(std::env::temp_dir().join(format!("emporium-{}.db", generate_id())))
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut path = self.0.clone().into_os_string();
            path.push(suffix);
            let _ = std::fs::remove_file(path);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_placements_on_file_database_all_commit() {
    let file = ScratchFile::new();
    let db = Database::new(DbConfig::new(&file.0)).await.unwrap();
    let pen = add_product(&db, "Pen", "1.00", 1000).await;
    let ada = add_customer(&db, "Ada").await;

    for _ in 0..20 {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let db = db.clone();
                let customer_id = ada.id.clone();
                let product_id = pen.id.clone();
                tokio::spawn(async move {
                    db.fulfillment()
                        .place_order(&customer_id, &[LineRequest::new(product_id, 1)])
                        .await
                })
            })
            .collect();

        for handle in handles {
            let placed = handle.await.unwrap();
            assert!(placed.is_ok(), "placement failed: {:?}", placed.err());
        }
    }

    assert_eq!(stock_of(&db, &pen).await, 920);
    let orders = db.fulfillment().list_orders_for_customer(&ada.id).await.unwrap();
    assert_eq!(orders.len(), 80);

    db.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_placements_never_oversell() {
    let file = ScratchFile::new();
    let db = Database::new(DbConfig::new(&file.0)).await.unwrap();
    let mug = add_product(&db, "Mug", "4.00", 3).await;
    let ada = add_customer(&db, "Ada").await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let db = db.clone();
            let customer_id = ada.id.clone();
            let product_id = mug.id.clone();
            tokio::spawn(async move {
                db.fulfillment()
                    .place_order(&customer_id, &[LineRequest::new(product_id, 1)])
                    .await
            })
        })
        .collect();

    let mut placed = 0;
    let mut short = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => placed += 1,
            Err(err) => {
                assert!(
                    matches!(err.domain(), Some(CoreError::InsufficientStock { .. })),
                    "unexpected failure: {err:?}"
                );
                short += 1;
            }
        }
    }

    assert_eq!((placed, short), (3, 5));
    assert_eq!(stock_of(&db, &mug).await, 0);

    db.close().await;
}
