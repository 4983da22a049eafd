mod common;

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Duration, NaiveDate};
use common::*;
use staffdesk_lib::attendance::{AttendanceController, AttendanceState, DeskRegistry};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

#[tokio::test]
async fn same_day_reuses_the_open_desk() {
    let registry = DeskRegistry::new();
    let desk = DeskBuilder::new().on(day()).build();
    let opened = AtomicUsize::new(0);
    let (counter, controller) = (&opened, &desk.controller);
    let open = move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok::<_, anyhow::Error>(controller.clone())
    };

    registry.get_or_open(STAFF, day(), open).await.unwrap();
    let again = registry.get_or_open(STAFF, day(), open).await.unwrap();

    assert_eq!(opened.load(Ordering::SeqCst), 1);
    assert_eq!(again.date(), day());
    assert!(registry.is_open(STAFF).await);
    assert!(!registry.is_open("staff-2").await);
}

#[tokio::test]
async fn desk_from_yesterday_rolls_over_to_today() {
    let yesterday = DeskBuilder::new().on(day()).located_at(site()).build();
    let registry = DeskRegistry::new();
    registry
        .get_or_open(STAFF, day(), || async {
            Ok::<_, anyhow::Error>(yesterday.controller.clone())
        })
        .await
        .unwrap();
    yesterday.locate().await;
    yesterday.controller.capture_photo().await.unwrap();
    yesterday.controller.confirm(None, false, None).await.unwrap();
    assert_eq!(
        yesterday.controller.get_state().await,
        AttendanceState::CheckedIn
    );

    let next_day = day() + Duration::days(1);
    let today = DeskBuilder::new().on(next_day).located_at(site()).build();
    let controller = registry
        .get_or_open(STAFF, next_day, || async {
            Ok::<_, anyhow::Error>(today.controller.clone())
        })
        .await
        .unwrap();

    assert_eq!(controller.date(), next_day);
    assert_eq!(controller.get_state().await, AttendanceState::NotCheckedIn);
    assert_eq!(yesterday.location.active(), 0);
    assert_eq!(yesterday.camera.live_streams(), 0);
    assert!(controller.is_locating().await);
    assert!(wait_until(|| today.location.active() == 1).await);

    registry.close(STAFF).await.unwrap();
    assert!(!registry.is_open(STAFF).await);
    assert_eq!(today.location.active(), 0);
}

#[tokio::test]
async fn failed_open_leaves_no_desk() {
    let registry = DeskRegistry::new();
    let result = registry
        .get_or_open(STAFF, day(), || async {
            Err::<AttendanceController, _>(anyhow::anyhow!("database offline"))
        })
        .await;

    assert!(result.is_err());
    assert!(!registry.is_open(STAFF).await);
    registry.close(STAFF).await.unwrap();
}
