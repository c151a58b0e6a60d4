//! Integration tests for the checkout → transfer-settlement flow, run against a real SQLite database.

mod support;

use spg_common::Money;
use storefront_payment_engine::{
    db_types::{NewOrder, NewOrderItem, NewUser, OrderStatusType, PaymentMethod, PaymentStatus, ShippingAddress, TransferNotice},
    events::EventProducers,
    traits::{AccountManagement, AuthManagement, TransferOutcome},
    AccountApi,
    OrderFlowApi,
    PricingPolicy,
    SqliteDatabase,
};
use support::{prepare_test_env, random_db_path};

async fn new_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

fn shipping() -> ShippingAddress {
    ShippingAddress {
        name: "Trần Thị B".into(),
        phone: "0912345678".into(),
        address: "12 Nguyễn Huệ".into(),
        province: "79".into(),
        district: "760".into(),
        ward: "26740".into(),
        note: Some("Giao giờ hành chính".into()),
    }
}

fn checkout(user_id: i64, method: PaymentMethod, unit_price: i64, quantity: i64) -> NewOrder {
    NewOrder {
        user_id,
        payment_method: method,
        shipping: shipping(),
        items: vec![NewOrderItem {
            product_id: 11,
            product_name: "Áo khoác".into(),
            quantity,
            unit_price: Money::from(unit_price),
        }],
    }
}

async fn seed_user(db: &SqliteDatabase) -> i64 {
    let user = db
        .create_user(NewUser { username: "buyer".into(), email: "buyer@example.com".into(), display_name: None })
        .await
        .expect("Error creating user");
    user.id
}

#[tokio::test]
async fn checkout_assigns_number_reference_and_totals() {
    let db = new_db().await;
    let user_id = seed_user(&db).await;
    let api = OrderFlowApi::new(db.clone(), PricingPolicy::default(), EventProducers::default());

    let order = api.process_checkout(checkout(user_id, PaymentMethod::Sepay, 110_000, 2)).await.expect("checkout");
    assert_eq!(order.order_number.as_str(), format!("ORD-{:06}", order.id));
    let expected_ref = order.order_number.as_str().replace('-', "");
    assert_eq!(order.payment_ref.as_deref(), Some(expected_ref.as_str()));
    assert_eq!(order.subtotal, Money::from(220_000));
    assert_eq!(order.shipping_fee, Money::from(30_000));
    assert_eq!(order.total, Money::from(250_000));
    assert_eq!(order.total, order.subtotal - order.discount + order.shipping_fee);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.status, OrderStatusType::Pending);

    let items = db.fetch_order_items(order.id).await.expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].subtotal, Money::from(220_000));
}

#[tokio::test]
async fn cod_checkout_has_no_payment_reference() {
    let db = new_db().await;
    let user_id = seed_user(&db).await;
    let api = OrderFlowApi::new(db.clone(), PricingPolicy::default(), EventProducers::default());
    let order = api.process_checkout(checkout(user_id, PaymentMethod::Cod, 50_000, 1)).await.expect("checkout");
    assert!(order.payment_ref.is_none());
}

#[tokio::test]
async fn matching_transfer_pays_the_order() {
    let db = new_db().await;
    let user_id = seed_user(&db).await;
    let api = OrderFlowApi::new(db.clone(), PricingPolicy::default(), EventProducers::default());
    let order = api.process_checkout(checkout(user_id, PaymentMethod::Sepay, 110_000, 2)).await.expect("checkout");
    let reference = order.payment_ref.clone().unwrap();

    let notice = TransferNotice::new("FT2400123", order.total).with_reference(reference);
    let outcome = api.process_transfer_notification(notice.clone()).await.expect("transfer");
    let paid = match outcome {
        TransferOutcome::Paid(o) => o,
        other => panic!("Expected Paid, got {other:?}"),
    };
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.status, OrderStatusType::Confirmed);

    // A replay of the same bank txid reports the recorded match and changes nothing
    let outcome = api.process_transfer_notification(notice).await.expect("replay");
    match outcome {
        TransferOutcome::Duplicate { order: Some(o), .. } => assert_eq!(o.payment_status, PaymentStatus::Paid),
        other => panic!("Expected Duplicate, got {other:?}"),
    }
}

#[tokio::test]
async fn reference_is_scavenged_from_the_memo_case_insensitively() {
    let db = new_db().await;
    let user_id = seed_user(&db).await;
    let api = OrderFlowApi::new(db.clone(), PricingPolicy::default(), EventProducers::default());
    let order = api.process_checkout(checkout(user_id, PaymentMethod::Sepay, 110_000, 2)).await.expect("checkout");
    let memo = format!("MBVCB.77812 {} chuyen khoan", order.payment_ref.clone().unwrap().to_lowercase());

    let notice = TransferNotice::new("FT2400124", order.total).with_memo(memo);
    let outcome = api.process_transfer_notification(notice).await.expect("transfer");
    assert!(matches!(outcome, TransferOutcome::Paid(_)));
}

#[tokio::test]
async fn underpayment_is_recorded_but_not_matched() {
    let db = new_db().await;
    let user_id = seed_user(&db).await;
    let api = OrderFlowApi::new(db.clone(), PricingPolicy::default(), EventProducers::default());
    let order = api.process_checkout(checkout(user_id, PaymentMethod::Sepay, 110_000, 2)).await.expect("checkout");
    let reference = order.payment_ref.clone().unwrap();

    let notice = TransferNotice::new("FT2400125", Money::from(100_000)).with_reference(reference);
    let outcome = api.process_transfer_notification(notice).await.expect("transfer");
    assert!(matches!(outcome, TransferOutcome::Unmatched { .. }));
    let order = db.fetch_order_by_id(order.id).await.expect("fetch").unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn overdue_pending_transfers_expire() {
    let db = new_db().await;
    let user_id = seed_user(&db).await;
    let api = OrderFlowApi::new(db.clone(), PricingPolicy::default(), EventProducers::default());
    let overdue = api.process_checkout(checkout(user_id, PaymentMethod::Sepay, 110_000, 2)).await.expect("checkout");
    let cod = api.process_checkout(checkout(user_id, PaymentMethod::Cod, 50_000, 1)).await.expect("checkout");

    // A negative window makes every pending transfer order overdue without waiting on wall-clock time
    let expired = api.expire_overdue_payments(chrono::Duration::seconds(-1)).await.expect("expire");
    assert_eq!(expired.len(), 1);
    assert_eq!(expired[0].id, overdue.id);
    assert_eq!(expired[0].payment_status, PaymentStatus::Failed);
    assert_eq!(expired[0].status, OrderStatusType::Cancelled);

    let cod = db.fetch_order_by_id(cod.id).await.expect("fetch").unwrap();
    assert_eq!(cod.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn a_failed_payment_cancels_the_order_once() {
    let db = new_db().await;
    let user_id = seed_user(&db).await;
    let api = OrderFlowApi::new(db.clone(), PricingPolicy::default(), EventProducers::default());
    let order = api.process_checkout(checkout(user_id, PaymentMethod::Sepay, 110_000, 2)).await.expect("checkout");

    let failed = api.fail_payment(&order.order_number).await.expect("fail payment");
    assert_eq!(failed.payment_status, PaymentStatus::Failed);
    assert_eq!(failed.status, OrderStatusType::Cancelled);

    // A settled payment cannot be transitioned again
    assert!(api.fail_payment(&order.order_number).await.is_err());
}

#[tokio::test]
async fn the_tracking_report_follows_the_latest_event() {
    let db = new_db().await;
    let user_id = seed_user(&db).await;
    let flow = OrderFlowApi::new(db.clone(), PricingPolicy::default(), EventProducers::default());
    let order = flow.process_checkout(checkout(user_id, PaymentMethod::Cod, 50_000, 1)).await.expect("checkout");

    let accounts = AccountApi::new(db.clone());
    assert!(accounts.tracking_report(order.id).await.expect("report").is_none());

    db.record_tracking_event(order.id, "picked_up", "Package picked up", "HCM hub", Some("Da Nang hub"))
        .await
        .expect("event");
    db.record_tracking_event(order.id, "in_transit", "Departed sorting centre", "Da Nang hub", Some("Ha Noi hub"))
        .await
        .expect("event");

    let report = accounts.tracking_report(order.id).await.expect("report").expect("report exists");
    assert_eq!(report.current_status, "in_transit");
    assert_eq!(report.current_station, "Da Nang hub");
    assert_eq!(report.next_station.as_deref(), Some("Ha Noi hub"));
    assert_eq!(report.timeline.len(), 2);
}

#[tokio::test]
async fn paid_orders_do_not_expire() {
    let db = new_db().await;
    let user_id = seed_user(&db).await;
    let api = OrderFlowApi::new(db.clone(), PricingPolicy::default(), EventProducers::default());
    let order = api.process_checkout(checkout(user_id, PaymentMethod::Sepay, 110_000, 2)).await.expect("checkout");
    let notice = TransferNotice::new("FT2400126", order.total).with_reference(order.payment_ref.clone().unwrap());
    api.process_transfer_notification(notice).await.expect("transfer");

    let expired = api.expire_overdue_payments(chrono::Duration::seconds(-1)).await.expect("expire");
    assert!(expired.is_empty());
}
