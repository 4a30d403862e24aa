//! HyperPay checkout and reconciliation over the in-memory adapters.

use backend::domain::ports::{
    BookingCommand, CreateBookingRequest, CreateCheckoutRequest, PaymentCommand,
    PaymentStatusRequest,
};
use backend::domain::{
    Booking, BookingStatus, ErrorCode, NotificationTemplate, PartyRole, PaymentRedirect,
    PaymentStatus, Profile,
};
use backend::test_support::{Marketplace, StubPaymentGateway};
use rstest::{fixture, rstest};
use serde_json::json;

struct Checkout {
    market: Marketplace,
    client: Profile,
    booking: Booking,
}

#[fixture]
async fn checkout() -> Checkout {
    let market = Marketplace::new();
    let client = market.register(PartyRole::Client, "Sara");
    let talent = market.register(PartyRole::Talent, "Omar");
    let created = market
        .bookings
        .create_booking(CreateBookingRequest {
            user_id: client.user_id,
            talent_id: talent.id,
            skill_id: None,
            note: None,
            slots_by_date: json!({ "2025-09-20": ["09:00-10:00"] }),
        })
        .await
        .expect("booking created");
    let booking = market
        .payments
        .create_checkout(CreateCheckoutRequest {
            user_id: client.user_id,
            booking_id: created.booking.id,
            amount: "150".parse().expect("amount"),
            merchant_transaction_id: "txn-1".to_owned(),
        })
        .await
        .expect("checkout created");
    market.notifier.clear();
    Checkout {
        market,
        client,
        booking,
    }
}

fn return_path() -> String {
    format!("/v1/checkouts/{}/payment", StubPaymentGateway::checkout_id(1))
}

#[rstest]
#[tokio::test]
async fn checkout_links_the_provider_session(#[future] checkout: Checkout) {
    let checkout = checkout.await;

    let payment = &checkout.booking.payment;
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.checkout_id.as_deref(), Some("stub-checkout-1"));
    assert_eq!(payment.merchant_transaction_id.as_deref(), Some("txn-1"));
    assert_eq!(payment.currency.as_deref(), Some("SAR"));
    assert_eq!(payment.amount.map(|a| a.to_string()).as_deref(), Some("150.00"));

    let sent = checkout.market.gateway.checkouts();
    let request = sent.first().expect("checkout request");
    assert_eq!(request.billing.given_name, "Sara");
    assert_eq!(request.billing.country, "SA");
}

#[rstest]
#[tokio::test]
async fn repeated_returns_settle_and_notify_once(#[future] checkout: Checkout) {
    let checkout = checkout.await;
    let payments = &checkout.market.payments;

    let first = payments.handle_return(return_path()).await.expect("first return");
    let second = payments.handle_return(return_path()).await.expect("second return");

    assert_eq!(first, PaymentRedirect::Success(checkout.booking.id));
    assert_eq!(second, PaymentRedirect::Success(checkout.booking.id));
    let stored = checkout.market.store.booking(&checkout.booking.id).expect("booking");
    assert_eq!(stored.status, BookingStatus::IsPaid);
    assert_eq!(stored.payment.status, PaymentStatus::Paid);
    assert_eq!(
        checkout.market.notifier.templates(),
        vec![NotificationTemplate::PaymentReceived]
    );
    assert_eq!(checkout.market.notifier.last_players(), vec!["player-omar".to_owned()]);
}

#[rstest]
#[tokio::test]
async fn polling_after_a_return_is_idempotent(#[future] checkout: Checkout) {
    let checkout = checkout.await;
    let payments = &checkout.market.payments;
    payments.handle_return(return_path()).await.expect("return");

    let polled = payments
        .payment_status(PaymentStatusRequest {
            user_id: checkout.client.user_id,
            booking_id: checkout.booking.id,
            checkout_id: StubPaymentGateway::checkout_id(1),
        })
        .await
        .expect("status");

    assert_eq!(polled.booking.payment.status, PaymentStatus::Paid);
    assert_eq!(polled.payment_result.code, "000.100.110");
    assert_eq!(checkout.market.gateway.lookup_count(), 2);
    assert_eq!(checkout.market.notifier.sent().len(), 1);
}

#[rstest]
#[tokio::test]
async fn declined_payment_redirects_to_failure(#[future] checkout: Checkout) {
    let checkout = checkout.await;
    checkout.market.gateway.answer_with("800.100.151");

    let redirect = checkout
        .market
        .payments
        .handle_return(return_path())
        .await
        .expect("return");

    assert_eq!(redirect, PaymentRedirect::Failure(checkout.booking.id));
    let stored = checkout.market.store.booking(&checkout.booking.id).expect("booking");
    assert_eq!(stored.payment.status, PaymentStatus::Failed);
    assert_eq!(stored.status, BookingStatus::Pending);
    assert!(checkout.market.notifier.sent().is_empty());
}

#[rstest]
#[tokio::test]
async fn unknown_checkout_redirects_to_error(#[future] checkout: Checkout) {
    let checkout = checkout.await;

    let redirect = checkout
        .market
        .payments
        .handle_return("/v1/checkouts/someone-else/payment".to_owned())
        .await
        .expect("return");

    assert_eq!(redirect, PaymentRedirect::Error);
}

#[rstest]
#[tokio::test]
async fn paid_booking_refuses_another_checkout(#[future] checkout: Checkout) {
    let checkout = checkout.await;
    checkout
        .market
        .payments
        .handle_return(return_path())
        .await
        .expect("return");

    let err = checkout
        .market
        .payments
        .create_checkout(CreateCheckoutRequest {
            user_id: checkout.client.user_id,
            booking_id: checkout.booking.id,
            amount: "150".parse().expect("amount"),
            merchant_transaction_id: "txn-2".to_owned(),
        })
        .await
        .expect_err("already paid");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(checkout.market.gateway.checkouts().len(), 1);
}

#[rstest]
#[tokio::test]
async fn status_for_a_foreign_checkout_is_rejected(#[future] checkout: Checkout) {
    let checkout = checkout.await;

    let err = checkout
        .market
        .payments
        .payment_status(PaymentStatusRequest {
            user_id: checkout.client.user_id,
            booking_id: checkout.booking.id,
            checkout_id: "stub-checkout-99".to_owned(),
        })
        .await
        .expect_err("mismatch");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(checkout.market.gateway.lookup_count(), 0);
}

#[rstest]
#[tokio::test]
async fn paid_checkout_cannot_settle_a_booking_without_one(#[future] checkout: Checkout) {
    let checkout = checkout.await;
    let market = &checkout.market;
    market.payments.handle_return(return_path()).await.expect("return");
    let talent_id = checkout.booking.talent_id;
    let other = market
        .bookings
        .create_booking(CreateBookingRequest {
            user_id: checkout.client.user_id,
            talent_id,
            skill_id: None,
            note: None,
            slots_by_date: json!({ "2025-09-21": ["09:00-10:00"] }),
        })
        .await
        .expect("second booking");

    let err = market
        .payments
        .payment_status(PaymentStatusRequest {
            user_id: checkout.client.user_id,
            booking_id: other.booking.id,
            checkout_id: StubPaymentGateway::checkout_id(1),
        })
        .await
        .expect_err("checkout belongs to the first booking");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    let stored = market.store.booking(&other.booking.id).expect("booking");
    assert_ne!(stored.payment.status, PaymentStatus::Paid);
    assert_eq!(stored.status, BookingStatus::Pending);
    assert_eq!(market.gateway.lookup_count(), 1);
    assert_eq!(market.notifier.sent().len(), 1);
}
