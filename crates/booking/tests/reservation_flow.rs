//! End-to-end booking flows against the in-memory store: acceptance,
//! conflict rejection, half-open boundaries, booking number
//! monotonicity and the concurrent double-booking race.

use std::sync::Arc;

use booking::{
    BookingError, BookingService, CustomerDetails, InMemoryStore, PricingPolicy, RejectionReason,
    ReservationStatus, ReservationStore, Van, VanRef,
};
use chrono::{Days, NaiveDate, Utc};
use uuid::Uuid;

fn fleet_van() -> Van {
    Van {
        id: Uuid::new_v4(),
        slug: "grand-california".to_string(),
        name: "Grand California".to_string(),
        active: true,
        daily_rate_cents: 9_500,
    }
}

fn customer(name: &str) -> CustomerDetails {
    CustomerDetails {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
    }
}

fn day(offset: u64) -> NaiveDate {
    Utc::now().date_naive() + Days::new(offset)
}

async fn service_with_van() -> (Arc<BookingService>, Arc<InMemoryStore>, Van) {
    let store = Arc::new(InMemoryStore::new());
    let van = fleet_van();
    store.add_van(van.clone()).await;
    let service = Arc::new(BookingService::new(
        store.clone(),
        "VAN",
        PricingPolicy::default(),
    ));
    (service, store, van)
}

fn rejection_reason(error: BookingError) -> RejectionReason {
    match error {
        BookingError::Rejected(rejection) => rejection.reason,
        other => panic!("expected a rejection, got {other}"),
    }
}

#[tokio::test]
async fn fresh_van_accepts_a_request() {
    let (service, _, van) = service_with_van().await;

    let reservation = service
        .create_reservation(&VanRef::ById(van.id), day(7), day(11), customer("Ana Souza"))
        .await
        .unwrap();

    assert_eq!(reservation.status, ReservationStatus::Confirmed);
    assert_eq!(reservation.nights(), 4);
    assert!(reservation.booking_number.ends_with("-1001"));
    // Pricing frozen at commit: 4 nights at 95.00 + 12% + 19%.
    assert_eq!(reservation.base_price_cents, 38_000);
    assert_eq!(reservation.total_amount_cents, 49_780);
}

#[tokio::test]
async fn overlapping_request_is_rejected_with_the_blocker() {
    let (service, _, van) = service_with_van().await;

    let blocker = service
        .create_reservation(&VanRef::ById(van.id), day(7), day(11), customer("Ana Souza"))
        .await
        .unwrap();

    let error = service
        .create_reservation(&VanRef::ById(van.id), day(9), day(12), customer("Jo Martin"))
        .await
        .unwrap_err();
    let BookingError::Rejected(rejection) = error else {
        panic!("expected a rejection");
    };
    assert_eq!(rejection.reason, RejectionReason::ResourceNotAvailable);
    assert_eq!(rejection.conflicts.len(), 1);
    assert_eq!(rejection.conflicts[0].reservation_id, blocker.id);
    assert_eq!(rejection.conflicts[0].booking_number, blocker.booking_number);
}

#[tokio::test]
async fn identical_range_is_rejected() {
    let (service, _, van) = service_with_van().await;

    service
        .create_reservation(&VanRef::ById(van.id), day(7), day(11), customer("Ana Souza"))
        .await
        .unwrap();
    let error = service
        .create_reservation(&VanRef::ById(van.id), day(7), day(11), customer("Jo Martin"))
        .await
        .unwrap_err();
    assert_eq!(rejection_reason(error), RejectionReason::ResourceNotAvailable);
}

#[tokio::test]
async fn back_to_back_ranges_both_succeed() {
    let (service, _, van) = service_with_van().await;

    // Half-open intervals: [d7, d11) and [d11, d14) share only the
    // handover day.
    service
        .create_reservation(&VanRef::ById(van.id), day(7), day(11), customer("Ana Souza"))
        .await
        .unwrap();
    service
        .create_reservation(&VanRef::ById(van.id), day(11), day(14), customer("Jo Martin"))
        .await
        .unwrap();
}

#[tokio::test]
async fn check_availability_is_idempotent() {
    let (service, _, van) = service_with_van().await;
    let van_ref = VanRef::BySlug(van.slug.clone());

    service
        .create_reservation(&van_ref, day(7), day(11), customer("Ana Souza"))
        .await
        .unwrap();

    let first = service
        .check_availability(&van_ref, day(9), day(12))
        .await
        .unwrap();
    for _ in 0..3 {
        let again = service
            .check_availability(&van_ref, day(9), day(12))
            .await
            .unwrap();
        assert_eq!(again.available, first.available);
        assert_eq!(again.conflicts.len(), first.conflicts.len());
        assert_eq!(again.suggestions, first.suggestions);
    }
    assert!(!first.available);
}

#[tokio::test]
async fn sequential_reservations_get_increasing_numbers() {
    let (service, _, van) = service_with_van().await;

    let mut previous = 0u32;
    for i in 0..4u64 {
        let start = day(7 + i * 10);
        let reservation = service
            .create_reservation(&VanRef::ById(van.id), start, start + Days::new(3), customer("Ana Souza"))
            .await
            .unwrap();
        let seq: u32 = reservation
            .booking_number
            .rsplit('-')
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert!(seq > previous, "{seq} not above {previous}");
        previous = seq;
    }
    assert_eq!(previous, 1004);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_disjoint_requests_get_distinct_numbers() {
    let (service, _, van) = service_with_van().await;

    let mut handles = Vec::new();
    for i in 0..4u64 {
        let service = service.clone();
        let van_id = van.id;
        handles.push(tokio::spawn(async move {
            let start = day(7 + i * 10);
            service
                .create_reservation(&VanRef::ById(van_id), start, start + Days::new(3), customer("Ana Souza"))
                .await
        }));
    }

    let mut numbers = Vec::new();
    for handle in handles {
        let reservation = handle.await.unwrap().unwrap();
        numbers.push(reservation.booking_number);
    }
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fully_overlapping_race_admits_exactly_one() {
    let (service, store, van) = service_with_van().await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        let van_id = van.id;
        handles.push(tokio::spawn(async move {
            service
                .create_reservation(
                    &VanRef::ById(van_id),
                    day(7),
                    day(11),
                    customer(&format!("Racer {i}")),
                )
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(error) => {
                assert_eq!(rejection_reason(error), RejectionReason::ResourceNotAvailable);
            }
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(store.reservations().await.len(), 1);
}

#[tokio::test]
async fn cancelling_frees_the_range_for_a_new_booking() {
    let (service, store, van) = service_with_van().await;

    let reservation = service
        .create_reservation(&VanRef::ById(van.id), day(7), day(11), customer("Ana Souza"))
        .await
        .unwrap();
    store
        .set_status(reservation.id, ReservationStatus::Cancelled)
        .await
        .unwrap();

    let report = service
        .check_availability(&VanRef::ById(van.id), day(7), day(11))
        .await
        .unwrap();
    assert!(report.available);

    service
        .create_reservation(&VanRef::ById(van.id), day(7), day(11), customer("Jo Martin"))
        .await
        .unwrap();
}

#[tokio::test]
async fn unknown_van_and_past_dates_reject_before_commit() {
    let (service, store, van) = service_with_van().await;

    let error = service
        .create_reservation(
            &VanRef::BySlug("missing".to_string()),
            day(7),
            day(11),
            customer("Ana Souza"),
        )
        .await
        .unwrap_err();
    assert_eq!(rejection_reason(error), RejectionReason::ResourceNotFound);

    let yesterday = Utc::now().date_naive() - Days::new(1);
    let error = service
        .create_reservation(&VanRef::ById(van.id), yesterday, day(11), customer("Ana Souza"))
        .await
        .unwrap_err();
    assert_eq!(rejection_reason(error), RejectionReason::InvalidStartDate);

    assert!(store.reservations().await.is_empty());
}
