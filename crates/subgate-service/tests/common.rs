//! Common test utilities for subgate integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use subgate_core::{unix_now, OfferId, PromoCode, PromoId, Tier, TierId, UserId};
use subgate_panel::{PanelClient, PanelConfig};
use subgate_service::{create_router, AppState, Notifier, ServiceConfig, ShopSettings};
use subgate_store::{MemoryStore, NewOffer, Store};

/// Admin recipient id used across the tests.
pub const ADMIN_ID: i64 = 777;

/// Session cookie the mocked panel hands out.
pub const SESSION: &str = "3x-ui=abc123";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The mocked access panel.
    pub panel: MockServer,
    /// The mocked bot notification service.
    pub notify: MockServer,
    /// Shared application state, for driving sweeps directly.
    pub state: Arc<AppState>,
    /// Temporary directory for the settings file (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// The service API key.
    pub service_api_key: String,
}

impl TestHarness {
    /// Create a harness with the default test settings.
    pub async fn new() -> Self {
        Self::with_settings(test_settings()).await
    }

    /// Create a harness with custom shop settings.
    ///
    /// The panel mock starts with only the placeholder client; tests mount
    /// further `/panel/inbound/list` states on `harness.panel` as needed.
    pub async fn with_settings(settings: ShopSettings) -> Self {
        let panel = MockServer::start().await;
        let notify = MockServer::start().await;

        mount_panel_login(&panel).await;
        // Serves exactly the startup inbound discovery, then expires so the
        // per-test list mocks take over.
        Mock::given(method("POST"))
            .and(path("/panel/inbound/list"))
            .respond_with(list_response(json!([inbound_obj(
                json!([client_entry("root", "u-0", 0, 0)]),
                json!([stat_entry("root", 0, 0, 0)]),
            )])))
            .up_to_n_times(1)
            .mount(&panel)
            .await;
        // Notification delivery succeeds unless a test says otherwise.
        mount_notify_ok(&notify).await;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let settings_path = temp_dir.path().join("shop-settings.json");
        let service_api_key = "test-service-key".to_string();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            database_url: "sqlite::memory:".into(),
            settings_path: settings_path.to_string_lossy().to_string(),
            api_key: Some(service_api_key.clone()),
            admin_id: ADMIN_ID,
            panel_base_url: panel.uri(),
            panel_username: "admin".into(),
            panel_password: "secret".into(),
            panel_public_host: None,
            panel_inbound_port: 443,
            panel_inbound_remark: "gate".into(),
            notify_url: notify.uri(),
            remote_timeout_seconds: 5,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            expiry_sweep_secs: 86_400,
            disengagement_sweep_secs: 604_800,
            broadcast_sweep_secs: 1_209_600,
        };

        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        seed_catalog(store.as_ref()).await;

        let panel_client = Arc::new(
            PanelClient::new(PanelConfig {
                base_url: panel.uri(),
                username: "admin".into(),
                password: "secret".into(),
                public_host: None,
                inbound_port: 443,
                inbound_remark: "gate".into(),
                timeout_seconds: 5,
            })
            .expect("Failed to build panel client"),
        );

        let notifier =
            Arc::new(Notifier::new(notify.uri(), ADMIN_ID, 5).expect("Failed to build notifier"));

        let state = Arc::new(AppState::new(
            store,
            panel_client,
            notifier,
            settings,
            config,
        ));
        state
            .panel
            .init_inbound()
            .await
            .expect("Failed to initialize panel inbound");

        let router: Router = create_router(state.as_ref().clone());
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            panel,
            notify,
            state,
            _temp_dir: temp_dir,
            service_api_key,
        }
    }

    /// Register a user through the API and return the created record.
    pub async fn register_user(&self, id: i64, handle: &str) -> serde_json::Value {
        let response = self
            .server
            .post("/v1/users")
            .add_header("x-api-key", &self.service_api_key)
            .json(&json!({
                "id": id,
                "handle": handle,
                "display_name": format!("User {handle}")
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    /// Register a user carrying someone's invite code.
    pub async fn register_invited(
        &self,
        id: i64,
        handle: &str,
        invite_code: &str,
    ) -> serde_json::Value {
        let response = self
            .server
            .post("/v1/users")
            .add_header("x-api-key", &self.service_api_key)
            .json(&json!({
                "id": id,
                "handle": handle,
                "display_name": format!("User {handle}"),
                "invited_with_code": invite_code
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    /// Place an offer through the API and return its detail view.
    pub async fn create_offer(&self, user_id: i64, tier_id: &str) -> serde_json::Value {
        let response = self
            .server
            .post("/v1/offers")
            .add_header("x-api-key", &self.service_api_key)
            .json(&json!({"user_id": user_id, "tier_id": tier_id}))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    /// Insert a pending offer for a registered user directly into the store.
    pub async fn seed_offer(
        &self,
        user_id: i64,
        tier: &str,
        payment: i64,
        ends_in_secs: i64,
    ) -> OfferId {
        let now = unix_now();
        self.state
            .store
            .insert_offer(&NewOffer {
                user_id: UserId(user_id),
                tier_id: TierId::from(tier),
                promo_id: PromoId::from(PromoCode::DEFAULT),
                payment,
                discount_percent: 0,
                created_at: now,
                end_time: now + ends_in_secs,
            })
            .await
            .expect("Failed to seed offer")
    }

    /// Insert a confirmed offer with a stored connection string.
    pub async fn seed_confirmed_offer(
        &self,
        user_id: i64,
        tier: &str,
        ends_in_secs: i64,
    ) -> OfferId {
        let id = self.seed_offer(user_id, tier, 1000, ends_in_secs).await;
        self.state
            .store
            .set_conn_string(id, Some("vless://seeded"))
            .await
            .expect("Failed to set conn string");
        id
    }

    /// Replace the mocked panel contents for subsequent list calls.
    pub async fn mount_panel_state(&self, clients: serde_json::Value, stats: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/panel/inbound/list"))
            .respond_with(list_response(json!([inbound_obj(clients, stats)])))
            .mount(&self.panel)
            .await;
    }

    /// Forget every notification recorded so far, keeping delivery working.
    pub async fn reset_notify(&self) {
        self.notify.reset().await;
        mount_notify_ok(&self.notify).await;
    }

    /// Decoded bodies of every notification batch sent so far.
    pub async fn notify_bodies(&self) -> Vec<serde_json::Value> {
        self.notify
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|r| r.url.path() == "/notify")
            .map(|r| serde_json::from_slice(&r.body).expect("notify body is JSON"))
            .collect()
    }

    /// Every individual notice sent so far, flattened across batches.
    pub async fn sent_notices(&self) -> Vec<serde_json::Value> {
        self.notify_bodies()
            .await
            .into_iter()
            .flat_map(|body| {
                body["users"]
                    .as_array()
                    .cloned()
                    .unwrap_or_default()
                    .into_iter()
            })
            .collect()
    }
}

/// Shop settings the harness starts with.
pub fn test_settings() -> ShopSettings {
    ShopSettings {
        accept_new_offers: true,
        new_offers_message: "The shop is closed for maintenance".into(),
        auto_accept_free_trial: false,
        total_participants_limit: 0,
        limit_participants_message: "The shop is full".into(),
        welcome_message: "Welcome".into(),
        invite_discount: 5,
        for_invited_discount: 10,
        broadcast_message: None,
    }
}

async fn seed_catalog(store: &dyn Store) {
    let tiers = [
        Tier {
            id: TierId::from(Tier::FREE),
            title: "Trial".into(),
            data_limit_gb: 5,
            duration_secs: 604_800,
            price: 0,
            promo_eligible: false,
        },
        Tier {
            id: TierId::from("light"),
            title: "Light".into(),
            data_limit_gb: 30,
            duration_secs: 2_592_000,
            price: 1000,
            promo_eligible: true,
        },
        Tier {
            id: TierId::from("unlim"),
            title: "Unlimited".into(),
            data_limit_gb: 0,
            duration_secs: 2_592_000,
            price: 2000,
            promo_eligible: true,
        },
    ];
    for tier in &tiers {
        store.insert_tier(tier).await.expect("Failed to seed tier");
    }

    // The default promo is part of the store bootstrap already.
    store
        .insert_promo(&PromoCode {
            id: PromoId::from("spring"),
            title: "Spring sale".into(),
            discount_percent: 20,
        })
        .await
        .expect("Failed to seed promo");
}

/// Mount the dashboard login endpoint.
pub async fn mount_panel_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .and(body_string_contains("username=admin"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "3x-ui=abc123; Path=/; HttpOnly")
                .set_body_json(json!({"success": true, "msg": "", "obj": null})),
        )
        .mount(server)
        .await;
}

/// Mount the always-succeeding notification delivery mock.
pub async fn mount_notify_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/notify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"delivered": true})))
        .mount(server)
        .await;
}

/// A panel client entry as the inbound settings blob carries it.
pub fn client_entry(name: &str, uuid: &str, quota: i64, expiry_ms: i64) -> serde_json::Value {
    json!({
        "id": uuid,
        "flow": "xtls-rprx-vision",
        "email": name,
        "limitIp": 0,
        "totalGB": quota,
        "expiryTime": expiry_ms,
        "enable": true,
        "tgId": "",
        "subId": "abcdefgh12345678",
        "reset": 0
    })
}

/// A traffic stats entry as `clientStats` carries it.
pub fn stat_entry(name: &str, up: i64, down: i64, total: i64) -> serde_json::Value {
    json!({"email": name, "up": up, "down": down, "total": total})
}

/// An inbound as `/panel/inbound/list` reports it, with the nested blobs
/// encoded as JSON strings.
pub fn inbound_obj(clients: serde_json::Value, stats: serde_json::Value) -> serde_json::Value {
    let settings = json!({"clients": clients, "decryption": "none", "fallbacks": []}).to_string();
    let stream = json!({
        "network": "tcp",
        "security": "reality",
        "realitySettings": {
            "serverNames": ["example.com", "www.example.com"],
            "shortIds": ["ab12", "cd34"],
            "privateKey": "priv",
            "settings": {"publicKey": "pub", "fingerprint": "chrome", "spiderX": "/"}
        }
    })
    .to_string();
    json!({
        "id": 3,
        "remark": "gate",
        "port": 443,
        "protocol": "vless",
        "settings": settings,
        "streamSettings": stream,
        "clientStats": stats,
        "up": 0,
        "down": 0,
        "total": 0,
        "enable": true,
        "expiryTime": 0
    })
}

/// A successful panel list envelope.
pub fn list_response(inbounds: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"success": true, "msg": "", "obj": inbounds}))
}

/// A successful panel action envelope.
pub fn ok_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"success": true, "msg": "", "obj": null}))
}
