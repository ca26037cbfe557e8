//! Admin settings endpoint integration tests.

mod common;

use common::TestHarness;
use serde_json::json;

async fn get_settings(harness: &TestHarness) -> serde_json::Value {
    let response = harness
        .server
        .get("/v1/admin/settings")
        .add_header("x-api-key", &harness.service_api_key)
        .await;
    response.assert_status_ok();
    response.json()
}

// ============================================================================
// Reading
// ============================================================================

#[tokio::test]
async fn settings_are_readable() {
    let harness = TestHarness::new().await;

    let body = get_settings(&harness).await;

    assert_eq!(body["accept_new_offers"], true);
    assert_eq!(body["auto_accept_free_trial"], false);
    assert_eq!(body["invite_discount"], 5);
    assert_eq!(body["for_invited_discount"], 10);
    assert_eq!(body["limit_participants_message"], "The shop is full");
    // Unset broadcast message stays out of the document.
    assert!(body.get("broadcast_message").is_none());
}

// ============================================================================
// Updating
// ============================================================================

#[tokio::test]
async fn updated_settings_take_effect_immediately() {
    let harness = TestHarness::new().await;
    harness.register_user(100, "alice").await;

    let mut settings = common::test_settings();
    settings.accept_new_offers = false;
    settings.new_offers_message = "Back after the holidays".into();

    let response = harness
        .server
        .put("/v1/admin/settings")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&settings)
        .await;
    response.assert_status_ok();
    let echoed: serde_json::Value = response.json();
    assert_eq!(echoed["accept_new_offers"], false);

    let refused = harness
        .server
        .post("/v1/offers")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&json!({"user_id": 100, "tier_id": "light"}))
        .await;
    refused.assert_status_forbidden();
    let body: serde_json::Value = refused.json();
    assert_eq!(body["error"]["message"], "Back after the holidays");
}

#[tokio::test]
async fn accepted_settings_persist_to_disk() {
    let harness = TestHarness::new().await;

    let mut settings = common::test_settings();
    settings.invite_discount = 7;
    settings.broadcast_message = Some("Spring promo is live".into());

    harness
        .server
        .put("/v1/admin/settings")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&settings)
        .await
        .assert_status_ok();

    let contents = tokio::fs::read_to_string(&harness.state.config.settings_path)
        .await
        .expect("settings file was written");
    let on_disk: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(on_disk["invite_discount"], 7);
    assert_eq!(on_disk["broadcast_message"], "Spring promo is live");
}

#[tokio::test]
async fn rejected_settings_leave_the_old_document_in_place() {
    let harness = TestHarness::new().await;

    let mut settings = common::test_settings();
    settings.invite_discount = 150;

    let response = harness
        .server
        .put("/v1/admin/settings")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&settings)
        .await;
    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("invite_discount"));

    let current = get_settings(&harness).await;
    assert_eq!(current["invite_discount"], 5);
    // Nothing reached the disk either.
    assert!(!std::path::Path::new(&harness.state.config.settings_path).exists());
}

#[tokio::test]
async fn broadcast_message_can_be_set_and_cleared() {
    let harness = TestHarness::new().await;

    let mut settings = common::test_settings();
    settings.broadcast_message = Some("Maintenance tonight".into());
    harness
        .server
        .put("/v1/admin/settings")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&settings)
        .await
        .assert_status_ok();
    assert_eq!(
        get_settings(&harness).await["broadcast_message"],
        "Maintenance tonight"
    );

    settings.broadcast_message = None;
    harness
        .server
        .put("/v1/admin/settings")
        .add_header("x-api-key", &harness.service_api_key)
        .json(&settings)
        .await
        .assert_status_ok();
    assert!(get_settings(&harness)
        .await
        .get("broadcast_message")
        .is_none());
}
