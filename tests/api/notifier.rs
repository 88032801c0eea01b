use voyager_notifier::domain::distance_unit::LIGHT_SECOND_KM;
use voyager_notifier::notifier::PassReport;
use voyager_notifier::store;

use crate::helpers::TestApp;

#[tokio::test(flavor = "multi_thread")]
async fn one_light_second_triggers_exactly_one_notification() {
    let test_app = TestApp::spawn_app().await;
    let id = test_app.register("second@test.com", "light_second").await;

    let report = test_app.notifier.run_pass(LIGHT_SECOND_KM).await.unwrap();

    assert_eq!(report.notified, 1);
    let sent = test_app.email_client.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "second@test.com");
    assert_eq!(test_app.reference_distance(id).await, LIGHT_SECOND_KM);
}

#[tokio::test(flavor = "multi_thread")]
async fn one_light_second_past_a_large_reference_notifies() {
    let test_app = TestApp::spawn_app().await;
    let id = test_app.register("far@test.com", "light_second").await;
    let d0 = 850_424_295.660_189_3;
    test_app.set_reference_distance(id, d0).await;

    let report = test_app
        .notifier
        .run_pass(d0 + LIGHT_SECOND_KM)
        .await
        .unwrap();

    assert_eq!(report.notified, 1);
    assert_eq!(test_app.email_client.sent_emails().len(), 1);
    assert_eq!(test_app.reference_distance(id).await, d0 + LIGHT_SECOND_KM);
}

#[tokio::test(flavor = "multi_thread")]
async fn just_under_one_light_second_past_a_large_reference_does_not_notify() {
    let test_app = TestApp::spawn_app().await;
    let id = test_app.register("almost@test.com", "light_second").await;
    let d0 = 850_424_295.660_189_3;
    test_app.set_reference_distance(id, d0).await;

    let report = test_app.notifier.run_pass(d0 + 299_792.457).await.unwrap();

    assert_eq!(report.notified, 0);
    assert!(test_app.email_client.sent_emails().is_empty());
    assert_eq!(test_app.reference_distance(id).await, d0);
}

#[tokio::test(flavor = "multi_thread")]
async fn just_under_one_light_second_does_not_notify() {
    let test_app = TestApp::spawn_app().await;
    let id = test_app.register("under@test.com", "light_second").await;

    let report = test_app.notifier.run_pass(299_792.457).await.unwrap();

    assert_eq!(report.notified, 0);
    assert!(test_app.email_client.sent_emails().is_empty());
    assert_eq!(test_app.reference_distance(id).await, 0.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn several_units_send_one_email_and_reset_to_the_current_distance() {
    let test_app = TestApp::spawn_app().await;
    let id = test_app.register("five@test.com", "light_second").await;
    let current_distance = 5.0 * LIGHT_SECOND_KM;

    test_app.notifier.run_pass(current_distance).await.unwrap();

    assert_eq!(test_app.email_client.sent_emails().len(), 1);
    assert_eq!(test_app.reference_distance(id).await, current_distance);
}

#[tokio::test(flavor = "multi_thread")]
async fn light_minute_subscriber_is_notified_once_per_crossing() {
    let test_app = TestApp::spawn_app().await;
    let id = test_app.register("a@x.com", "light_minute").await;

    let first = test_app.notifier.run_pass(17_987_547.48).await.unwrap();
    let second = test_app.notifier.run_pass(17_987_547.48).await.unwrap();

    assert_eq!(first.notified, 1);
    assert_eq!(second.notified, 0);
    assert_eq!(test_app.email_client.sent_emails().len(), 1);
    assert_eq!(test_app.reference_distance(id).await, 17_987_547.48);
}

#[tokio::test(flavor = "multi_thread")]
async fn each_subscriber_is_measured_against_their_own_unit() {
    let test_app = TestApp::spawn_app().await;
    let second = test_app.register("s@test.com", "light_second").await;
    let minute = test_app.register("m@test.com", "light_minute").await;
    let hour = test_app.register("h@test.com", "light_hour").await;
    let current_distance = 2.0 * LIGHT_SECOND_KM * 60.0;

    let report = test_app.notifier.run_pass(current_distance).await.unwrap();

    assert_eq!(
        report,
        PassReport {
            checked: 3,
            notified: 2,
            failed: 0,
            vanished: 0,
        }
    );
    assert_eq!(test_app.reference_distance(second).await, current_distance);
    assert_eq!(test_app.reference_distance(minute).await, current_distance);
    assert_eq!(test_app.reference_distance(hour).await, 0.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn a_failed_send_does_not_stop_the_pass() {
    let test_app = TestApp::spawn_app().await;
    let broken = test_app.register("broken@test.com", "light_second").await;
    let healthy = test_app.register("healthy@test.com", "light_second").await;
    test_app.email_client.fail_for("broken@test.com");

    let report = test_app.notifier.run_pass(LIGHT_SECOND_KM).await.unwrap();

    assert_eq!(report.notified, 1);
    assert_eq!(report.failed, 1);
    let sent = test_app.email_client.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "healthy@test.com");
    assert_eq!(test_app.reference_distance(broken).await, 0.0);
    assert_eq!(test_app.reference_distance(healthy).await, LIGHT_SECOND_KM);
}

#[tokio::test(flavor = "multi_thread")]
async fn scheduled_check_skips_the_pass_when_the_distance_is_unavailable() {
    let test_app = TestApp::spawn_app().await;
    let id = test_app.register("skip@test.com", "light_second").await;
    test_app.mount_ephemeris_failure().await;

    let report = test_app.notifier.check_and_notify().await.unwrap();

    assert_eq!(report, None);
    assert!(test_app.email_client.sent_emails().is_empty());
    assert_eq!(test_app.reference_distance(id).await, 0.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn scheduled_check_uses_the_fetched_distance() {
    let test_app = TestApp::spawn_app().await;
    let id = test_app.register("fetched@test.com", "light_hour").await;
    let current_distance = 3.0 * LIGHT_SECOND_KM * 3600.0;
    test_app.mount_distance(current_distance).await;

    let report = test_app.notifier.check_and_notify().await.unwrap();

    assert_eq!(report.map(|report| report.notified), Some(1));
    let sent = test_app.email_client.sent_emails();
    assert_eq!(sent[0].content.subject, "Voyager 2 moved light hour");
    assert_eq!(test_app.reference_distance(id).await, current_distance);
}

#[tokio::test(flavor = "multi_thread")]
async fn updating_a_deleted_subscriber_is_a_no_op() {
    let test_app = TestApp::spawn_app().await;
    let id = test_app.register("gone@test.com", "light_second").await;
    test_app.delete_user(id).await;

    let updated = store::update_reference_distance(&test_app.db_pool, id, LIGHT_SECOND_KM)
        .await
        .unwrap();

    assert!(!updated);
    assert_eq!(test_app.count_subscribers("gone@test.com").await, 0);
}
