//! Integration tests for the Diesel booking and reschedule repositories.
//!
//! These run against embedded PostgreSQL so the advisory lock, the slot
//! unique constraint and the conditional updates are exercised by the real
//! database rather than the in-memory adapters.

use backend::domain::ports::{
    BookingRepository, BookingRepositoryError, RescheduleRepository, RescheduleRepositoryError,
    SettlementOutcome,
};
use backend::domain::{
    BookingId, BookingStatus, CheckoutAttachment, Money, NewBooking, PartyRole, PaymentOutcome,
    PaymentSettlement, PaymentStatus, ProfileId, Reschedule, RescheduleDecision,
    RescheduleProposal, RescheduleStatus, SlotRequest,
};
use backend::outbound::persistence::{
    DbPool, DieselBookingRepository, DieselRescheduleRepository, PoolConfig,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use postgres::{Client, NoTls};
use rstest::{fixture, rstest};
use serde_json::json;
use tokio::runtime::Runtime;

mod support;

use support::{
    format_postgres_error, handle_cluster_setup_failure, provision_template_database,
    shared_cluster,
};

struct TestContext {
    runtime: Runtime,
    bookings: DieselBookingRepository,
    reschedules: DieselRescheduleRepository,
    client_id: ProfileId,
    talent_id: ProfileId,
    database_url: String,
    _database: TemporaryDatabase,
}

fn seed_profiles(url: &str, client_id: ProfileId, talent_id: ProfileId) -> Result<(), String> {
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    for (id, role, name) in [(client_id, "client", "Sara"), (talent_id, "talent", "Omar")] {
        client
            .execute(
                concat!(
                    "INSERT INTO profiles (id, user_id, role, first_name) ",
                    "VALUES ($1, gen_random_uuid(), $2, $3)"
                ),
                &[id.as_uuid(), &role, &name],
            )
            .map_err(|err| format_postgres_error(&err))?;
    }
    Ok(())
}

fn drop_table(url: &str, table_name: &str) -> Result<(), String> {
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    let escaped_name = table_name.replace('"', "\"\"");
    let sql = format!(r#"DROP TABLE IF EXISTS "{escaped_name}" CASCADE"#);
    client
        .batch_execute(sql.as_str())
        .map_err(|err| format_postgres_error(&err))
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let temp_db = provision_template_database(cluster)?;
    let database_url = temp_db.url().to_string();

    let client_id = ProfileId::random();
    let talent_id = ProfileId::random();
    seed_profiles(database_url.as_str(), client_id, talent_id)?;

    let config = PoolConfig::new(database_url.as_str())
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(async { DbPool::new(config).await })
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        bookings: DieselBookingRepository::new(pool.clone()),
        reschedules: DieselRescheduleRepository::new(pool),
        client_id,
        talent_id,
        database_url,
        _database: temp_db,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, hour, 0, 0)
        .single()
        .expect("valid instant")
}

fn date(value: &str) -> NaiveDate {
    value.parse().expect("valid date")
}

fn slot(day: &str, time: &str) -> SlotRequest {
    SlotRequest {
        date: date(day),
        time: time.parse().expect("valid range"),
    }
}

impl TestContext {
    fn new_booking(&self, hour: u32) -> NewBooking {
        NewBooking {
            id: BookingId::random(),
            client_id: self.client_id,
            talent_id: self.talent_id,
            note: None,
            skill_id: None,
            created_at: at(hour),
        }
    }

    fn book(&self, slots: &[SlotRequest]) -> Result<BookingId, BookingRepositoryError> {
        let booking = self.new_booking(8);
        self.runtime
            .block_on(self.bookings.create_with_slots(&booking, slots))
            .map(|created| created.booking.id)
    }

    fn slot_times(&self, id: &BookingId) -> Vec<(NaiveDate, String)> {
        self.runtime
            .block_on(self.bookings.list_slots(id))
            .expect("list slots")
            .into_iter()
            .map(|slot| (slot.date, slot.time))
            .collect()
    }

    fn propose(
        &self,
        booking_id: BookingId,
        old: (&str, &str),
        new: (&str, &str),
    ) -> Result<Reschedule, RescheduleRepositoryError> {
        let proposal = RescheduleProposal {
            booking_id,
            requested_by_role: PartyRole::Client,
            requested_by: self.client_id,
            old_date: date(old.0),
            old_time: old.1.to_owned(),
            new_date: date(new.0),
            new_time: new.1.to_owned(),
            proposed_at: at(9),
        };
        self.runtime.block_on(self.reschedules.propose(&proposal))
    }

    fn decision(&self, remarks: &str) -> RescheduleDecision {
        RescheduleDecision {
            decided_by: self.talent_id,
            remarks: Some(remarks.to_owned()),
            decided_at: at(10),
        }
    }

    fn attach(&self, id: &BookingId, checkout_id: &str) {
        let checkout = CheckoutAttachment {
            merchant_transaction_id: format!("txn-{checkout_id}"),
            checkout_id: checkout_id.to_owned(),
            amount: Money::from_major_units(150).expect("amount"),
            currency: "SAR".to_owned(),
            attached_at: at(9),
        };
        self.runtime
            .block_on(self.bookings.attach_checkout(id, &checkout))
            .expect("attach checkout")
            .expect("booking present");
    }

    fn settle(
        &self,
        id: &BookingId,
        checkout_id: &str,
        outcome: PaymentOutcome,
    ) -> SettlementOutcome {
        let settlement = PaymentSettlement {
            checkout_id: checkout_id.to_owned(),
            outcome,
            result: json!({ "result": { "code": "000.100.110" } }),
            settled_at: at(11),
        };
        self.runtime
            .block_on(self.bookings.settle_payment(id, &settlement))
            .expect("settle payment")
            .expect("booking present")
    }
}

#[rstest]
fn overlapping_creation_reports_the_booked_slots(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: overlapping_creation_reports_the_booked_slots skipped");
        return;
    };

    context
        .book(&[slot("2025-09-20", "09:00-10:00")])
        .expect("first booking");

    let error = context
        .book(&[
            slot("2025-09-20", "09:30-10:30"),
            slot("2025-09-20", "11:00-12:00"),
        ])
        .expect_err("talent already booked");
    assert_eq!(
        error,
        BookingRepositoryError::slots_booked(vec![slot("2025-09-20", "09:30-10:30")])
    );

    context
        .book(&[slot("2025-09-20", "11:00-12:00")])
        .expect("free time books");
}

#[rstest]
fn cancelled_bookings_release_their_time(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: cancelled_bookings_release_their_time skipped");
        return;
    };
    let first = context
        .book(&[slot("2025-09-20", "09:00-10:00")])
        .expect("first booking");

    context
        .runtime
        .block_on(
            context
                .bookings
                .update_status(&first, BookingStatus::CanceledByUser, at(9)),
        )
        .expect("cancel")
        .expect("booking present");

    let second = context
        .book(&[slot("2025-09-20", "09:00-10:00")])
        .expect("released time books again");
    let busy = context
        .runtime
        .block_on(context.bookings.list_active_slots_for_talent(
            &context.talent_id,
            Some(date("2025-09-20")),
            Some(date("2025-09-20")),
        ))
        .expect("busy slots");
    assert_eq!(busy.len(), 1);
    assert_eq!(busy.first().map(|s| s.booking_id), Some(second));
}

#[rstest]
fn repeated_slot_in_one_booking_maps_to_slot_taken(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: repeated_slot_in_one_booking_maps_to_slot_taken skipped");
        return;
    };
    let booking = context.new_booking(8);

    let error = context
        .runtime
        .block_on(context.bookings.create_with_slots(
            &booking,
            &[
                slot("2025-09-20", "09:00-10:00"),
                slot("2025-09-20", "09:00-10:00"),
            ],
        ))
        .expect_err("unique constraint");

    assert!(matches!(error, BookingRepositoryError::SlotTaken { .. }));
    let stored = context
        .runtime
        .block_on(context.bookings.find_by_id(&booking.id))
        .expect("lookup");
    assert!(stored.is_none(), "failed creation must roll back the booking row");
}

#[rstest]
fn settlement_only_lands_for_the_attached_checkout(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: settlement_only_lands_for_the_attached_checkout skipped");
        return;
    };
    let unattached = context
        .book(&[slot("2025-09-21", "09:00-10:00")])
        .expect("booking without checkout");
    let id = context
        .book(&[slot("2025-09-20", "09:00-10:00")])
        .expect("booking");
    context.attach(&id, "checkout-1");

    let stray = context.settle(&unattached, "checkout-1", PaymentOutcome::Paid);
    assert!(!stray.changed);
    assert_eq!(stray.booking.payment.status, PaymentStatus::Unpaid);

    let foreign = context.settle(&id, "checkout-2", PaymentOutcome::Paid);
    assert!(!foreign.changed);
    assert_eq!(foreign.booking.payment.status, PaymentStatus::Pending);

    let paid = context.settle(&id, "checkout-1", PaymentOutcome::Paid);
    assert!(paid.changed);
    assert_eq!(paid.booking.status, BookingStatus::IsPaid);
    assert_eq!(paid.booking.payment.status, PaymentStatus::Paid);

    let repeated = context.settle(&id, "checkout-1", PaymentOutcome::Paid);
    let late_failure = context.settle(&id, "checkout-1", PaymentOutcome::Failed);
    assert!(!repeated.changed);
    assert!(!late_failure.changed);
    assert_eq!(late_failure.booking.payment.status, PaymentStatus::Paid);
}

#[rstest]
fn failed_settlement_detaches_the_checkout(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: failed_settlement_detaches_the_checkout skipped");
        return;
    };
    let id = context
        .book(&[slot("2025-09-20", "09:00-10:00")])
        .expect("booking");
    context.attach(&id, "checkout-1");

    let failed = context.settle(&id, "checkout-1", PaymentOutcome::Failed);

    assert!(failed.changed);
    assert_eq!(failed.booking.payment.status, PaymentStatus::Failed);
    assert_eq!(failed.booking.payment.checkout_id, None);
    let by_checkout = context
        .runtime
        .block_on(context.bookings.find_by_checkout_id("checkout-1"))
        .expect("lookup");
    assert!(by_checkout.is_none());
}

#[rstest]
fn rejected_proposal_is_revived_in_place(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: rejected_proposal_is_revived_in_place skipped");
        return;
    };
    let id = context
        .book(&[slot("2025-09-20", "13:00-14:00")])
        .expect("booking");
    let old = ("2025-09-20", "13:00 - 14:00");
    let first = context
        .propose(id, old, ("2025-09-22", "16:00 - 17:00"))
        .expect("first proposal");

    let pending = context
        .propose(id, old, ("2025-09-23", "16:00 - 17:00"))
        .expect_err("still pending");
    assert!(matches!(pending, RescheduleRepositoryError::AlreadyPending { .. }));

    context
        .runtime
        .block_on(context.reschedules.reject(&first.id, &context.decision("busy")))
        .expect("reject")
        .expect("was pending");
    let revived = context
        .propose(id, old, ("2025-09-24", "10:00 - 11:00"))
        .expect("revived");

    assert_eq!(revived.id, first.id);
    assert_eq!(revived.status, RescheduleStatus::Pending);
    assert_eq!(revived.new_date, date("2025-09-24"));
    assert_eq!(revived.remarks, None);
    assert_eq!(revived.decided_by, None);
}

#[rstest]
fn approval_rewrites_the_ledger_slot(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: approval_rewrites_the_ledger_slot skipped");
        return;
    };
    let id = context
        .book(&[
            slot("2025-09-20", "09:00-10:00"),
            slot("2025-09-20", "13:00-14:00"),
        ])
        .expect("booking");
    let proposal = context
        .propose(
            id,
            ("2025-09-20", "13:00 - 14:00"),
            ("2025-09-22", "16:00 - 17:00"),
        )
        .expect("proposal");

    let approved = context
        .runtime
        .block_on(context.reschedules.approve(&proposal.id, &context.decision("ok")))
        .expect("approve")
        .expect("was pending");
    let again = context
        .runtime
        .block_on(context.reschedules.approve(&proposal.id, &context.decision("ok")))
        .expect("approve again");

    assert_eq!(approved.status, RescheduleStatus::Accepted);
    assert_eq!(approved.decided_by, Some(context.talent_id));
    assert!(again.is_none(), "decided proposals are not approved twice");
    assert_eq!(
        context.slot_times(&id),
        vec![
            (date("2025-09-20"), "09:00 - 10:00".to_owned()),
            (date("2025-09-22"), "16:00 - 17:00".to_owned()),
        ]
    );
}

#[rstest]
fn approval_onto_booked_time_leaves_the_proposal_pending(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!(
            "SKIP-TEST-CLUSTER: approval_onto_booked_time_leaves_the_proposal_pending skipped"
        );
        return;
    };
    let moving = context
        .book(&[slot("2025-09-20", "11:00-12:00")])
        .expect("booking to move");
    let proposal = context
        .propose(
            moving,
            ("2025-09-20", "11:00 - 12:00"),
            ("2025-09-20", "09:00 - 10:00"),
        )
        .expect("proposal");
    context
        .book(&[slot("2025-09-20", "09:30-10:30")])
        .expect("time taken before approval");

    let error = context
        .runtime
        .block_on(context.reschedules.approve(&proposal.id, &context.decision("ok")))
        .expect_err("calendar overlap");

    assert_eq!(
        error,
        RescheduleRepositoryError::slot_booked(date("2025-09-20"), "09:00 - 10:00")
    );
    let stored = context
        .runtime
        .block_on(context.reschedules.find_by_id(&proposal.id))
        .expect("lookup")
        .expect("proposal present");
    assert_eq!(stored.status, RescheduleStatus::Pending);
    assert_eq!(
        context.slot_times(&moving),
        vec![(date("2025-09-20"), "11:00 - 12:00".to_owned())]
    );
}

#[rstest]
fn approval_may_shift_within_the_moved_slot(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: approval_may_shift_within_the_moved_slot skipped");
        return;
    };
    let id = context
        .book(&[slot("2025-09-20", "11:00-12:00")])
        .expect("booking");
    let proposal = context
        .propose(
            id,
            ("2025-09-20", "11:00 - 12:00"),
            ("2025-09-20", "11:30 - 12:30"),
        )
        .expect("proposal");

    context
        .runtime
        .block_on(context.reschedules.approve(&proposal.id, &context.decision("ok")))
        .expect("approve")
        .expect("was pending");

    assert_eq!(
        context.slot_times(&id),
        vec![(date("2025-09-20"), "11:30 - 12:30".to_owned())]
    );
}

#[rstest]
fn missing_slot_table_maps_to_query_error(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: missing_slot_table_maps_to_query_error skipped");
        return;
    };
    let id = context
        .book(&[slot("2025-09-20", "09:00-10:00")])
        .expect("booking");

    drop_table(context.database_url.as_str(), "booking_slots").expect("drop table succeeds");

    let error = context
        .runtime
        .block_on(context.bookings.list_slots(&id))
        .expect_err("list should fail when the table is missing");
    assert!(matches!(error, BookingRepositoryError::Query { .. }));
}
