//! Panel client implementation.

use std::time::Duration;

use rand::Rng;
use reqwest::header;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::{OnceCell, RwLock};

use crate::error::PanelError;
use crate::link::{self, LinkParams};
use crate::wire::{ClientConfig, Envelope, Inbound, InboundSettings, KeyPair, StreamSettings};

/// Name of the dashboard session cookie.
const SESSION_COOKIE: &str = "3x-ui";

/// Flow assigned to every provisioned client.
const CLIENT_FLOW: &str = "xtls-rprx-vision";

/// Placeholder client created on a fresh inbound so it is never empty.
const ROOT_CLIENT: &str = "root";

/// Camouflage target for a freshly created inbound.
const REALITY_DEST: &str = "yahoo.com:443";

/// Alphabet of generated subscription ids.
const SUB_ID_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Connection settings for [`PanelClient::new`].
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Dashboard base URL, e.g. `http://203.0.113.9:2053`.
    pub base_url: String,
    /// Dashboard login.
    pub username: String,
    /// Dashboard password.
    pub password: String,
    /// Host clients connect to. Falls back to the dashboard host.
    pub public_host: Option<String>,
    /// Port a freshly created inbound listens on.
    pub inbound_port: u16,
    /// Remark attached to a freshly created inbound; also the link label
    /// prefix.
    pub inbound_remark: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

/// A provisioned client credential as reported by the panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// Credential name, the panel-side `email` field.
    pub name: String,
    /// Client identity embedded in the connection string.
    pub uuid: String,
    /// Traffic quota in bytes. Zero means unlimited.
    pub quota_bytes: i64,
    /// Bytes consumed so far, upload plus download.
    pub used_bytes: i64,
    /// Entitlement end, UNIX seconds, rounded up from the panel's
    /// milliseconds. Zero means never.
    pub expires_at: i64,
    /// Ready-to-use connection string.
    pub conn_string: String,
}

/// Outcome of a single authenticated request.
enum Reply<T> {
    /// The panel answered with a parsed envelope.
    Body(Envelope<T>),
    /// The session was rejected; the caller should log in again.
    Expired(StatusCode),
}

/// Client for the session-cookie access panel.
///
/// Holds a cached session cookie and the id of the shared inbound every
/// credential lives on. [`PanelClient::init_inbound`] must run once before
/// credentials are provisioned.
#[derive(Debug)]
pub struct PanelClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    public_host: String,
    inbound_port: u16,
    inbound_remark: String,
    session: RwLock<Option<String>>,
    inbound_id: OnceCell<i64>,
}

impl PanelClient {
    /// Creates a new panel client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be parsed or carries no
    /// host, or if the HTTP client cannot be built.
    pub fn new(config: PanelConfig) -> Result<Self, PanelError> {
        let parsed = url::Url::parse(&config.base_url)?;
        let dashboard_host = parsed
            .host_str()
            .ok_or_else(|| {
                PanelError::Configuration(format!("panel URL has no host: {}", config.base_url))
            })?
            .to_owned();
        let public_host = config
            .public_host
            .filter(|host| !host.is_empty())
            .unwrap_or(dashboard_host);

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(PanelError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            username: config.username,
            password: config.password,
            public_host,
            inbound_port: config.inbound_port,
            inbound_remark: config.inbound_remark,
            session: RwLock::new(None),
            inbound_id: OnceCell::new(),
        })
    }

    /// Opens a dashboard session and caches its cookie.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Auth`] when the panel rejects the credentials
    /// or answers without a session cookie.
    pub async fn login(&self) -> Result<(), PanelError> {
        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
            ])
            .send()
            .await?;

        let cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.split('=').next() == Some(SESSION_COOKIE))
            .and_then(|value| value.split(';').next())
            .map(ToOwned::to_owned);

        let envelope: Envelope<serde_json::Value> = response
            .json()
            .await
            .map_err(|err| PanelError::Auth(format!("unexpected login response: {err}")))?;
        if !envelope.success {
            return Err(PanelError::Auth(envelope.msg));
        }

        let Some(cookie) = cookie else {
            return Err(PanelError::Auth("login response carried no session cookie".into()));
        };
        *self.session.write().await = Some(cookie);
        tracing::debug!("panel session opened");
        Ok(())
    }

    /// Discovers the shared inbound, creating it if the panel has none.
    ///
    /// Runs the discovery at most once per client; concurrent callers wait
    /// for the first. Safe to call again after the first success.
    ///
    /// # Errors
    ///
    /// Returns an error when the panel cannot be reached or refuses the
    /// inbound creation.
    pub async fn init_inbound(&self) -> Result<i64, PanelError> {
        let id = self
            .inbound_id
            .get_or_try_init(|| self.discover_or_create_inbound())
            .await?;
        Ok(*id)
    }

    /// Provisions a named credential on the shared inbound and reads it
    /// back.
    ///
    /// `quota_bytes` zero means unlimited; `expiry_ms` zero means never.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Uninitialized`] before [`Self::init_inbound`],
    /// or the panel's rejection.
    pub async fn create_credential(
        &self,
        name: &str,
        quota_bytes: i64,
        expiry_ms: i64,
    ) -> Result<Credential, PanelError> {
        let inbound_id = self.require_inbound()?;
        self.add_client(inbound_id, name, quota_bytes, expiry_ms)
            .await?;
        tracing::info!(name, quota_bytes, "panel credential created");

        match self.get_credential(name).await? {
            Some(credential) => Ok(credential),
            None => Err(PanelError::Api {
                endpoint: "addClient",
                message: format!("created client {name} is not visible on the inbound"),
            }),
        }
    }

    /// Looks a named credential up on the shared inbound.
    ///
    /// Absence is `Ok(None)`, never an error.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Uninitialized`] before [`Self::init_inbound`],
    /// or a transport/decoding failure.
    pub async fn get_credential(&self, name: &str) -> Result<Option<Credential>, PanelError> {
        let inbound_id = self.require_inbound()?;
        let inbound = self.fetch_inbound(inbound_id).await?;

        let settings: InboundSettings = serde_json::from_str(&inbound.settings)?;
        let Some(client) = settings.clients.iter().find(|c| c.email == name) else {
            return Ok(None);
        };
        let stats = inbound.client_stats.iter().find(|s| s.email == name);
        let stream: StreamSettings = serde_json::from_str(&inbound.stream_settings)?;

        let conn_string = link::build(&LinkParams {
            protocol: &inbound.protocol,
            uuid: &client.id,
            host: &self.public_host,
            port: inbound.port,
            network: &stream.network,
            security: &stream.security,
            public_key: &stream.reality_settings.settings.public_key,
            fingerprint: &stream.reality_settings.settings.fingerprint,
            sni: stream
                .reality_settings
                .server_names
                .first()
                .map_or("", String::as_str),
            short_id: stream
                .reality_settings
                .short_ids
                .first()
                .map_or("", String::as_str),
            spider_x: &stream.reality_settings.settings.spider_x,
            flow: &client.flow,
            remark: &inbound.remark,
            name,
        })?;

        Ok(Some(Credential {
            name: name.to_owned(),
            uuid: client.id.clone(),
            quota_bytes: stats.map_or(0, |s| s.total),
            used_bytes: stats.map_or(0, |s| s.up + s.down),
            expires_at: client.expiry_time / 1000 + i64::from(client.expiry_time % 1000 > 0),
            conn_string,
        }))
    }

    /// Removes a named credential from the shared inbound.
    ///
    /// A credential that is already absent is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`PanelError::Uninitialized`] before [`Self::init_inbound`],
    /// or the panel's rejection.
    pub async fn delete_credential(&self, name: &str) -> Result<(), PanelError> {
        let inbound_id = self.require_inbound()?;
        let Some(credential) = self.get_credential(name).await? else {
            tracing::debug!(name, "panel credential already absent");
            return Ok(());
        };

        let path = format!("/panel/inbound/{inbound_id}/delClient/{}", credential.uuid);
        self.call::<serde_json::Value>(&path, &[])
            .await?
            .accept("delClient")?;
        tracing::info!(name, "panel credential deleted");
        Ok(())
    }

    fn require_inbound(&self) -> Result<i64, PanelError> {
        self.inbound_id.get().copied().ok_or(PanelError::Uninitialized)
    }

    async fn discover_or_create_inbound(&self) -> Result<i64, PanelError> {
        let inbounds: Vec<Inbound> = self
            .call("/panel/inbound/list", &[])
            .await?
            .accept("inbound/list")?
            .unwrap_or_default();
        if let Some(inbound) = inbounds.first() {
            tracing::info!(inbound_id = inbound.id, "found existing inbound");
            return Ok(inbound.id);
        }

        let keys: KeyPair = self
            .call("/server/getNewX25519Cert", &[])
            .await?
            .accept("getNewX25519Cert")?
            .ok_or_else(|| PanelError::Api {
                endpoint: "getNewX25519Cert",
                message: "empty key pair".to_owned(),
            })?;

        let id = self.add_inbound(&keys).await?;
        tracing::info!(inbound_id = id, "inbound created");

        // A placeholder client keeps the inbound non-empty; some panel
        // builds refuse to delete the last remaining client.
        self.add_client(id, ROOT_CLIENT, 0, 0).await?;
        Ok(id)
    }

    async fn add_inbound(&self, keys: &KeyPair) -> Result<i64, PanelError> {
        let short_ids: Vec<String> = (0..8).map(|_| random_short_id()).collect();
        let settings = serde_json::json!({
            "clients": [],
            "decryption": "none",
            "fallbacks": [],
        })
        .to_string();
        let stream_settings = serde_json::json!({
            "network": "tcp",
            "security": "reality",
            "externalProxy": [],
            "realitySettings": {
                "show": false,
                "xver": 0,
                "dest": REALITY_DEST,
                "serverNames": ["yahoo.com", "www.yahoo.com"],
                "privateKey": keys.private_key,
                "publicKey": keys.public_key,
                "maxTimediff": 0,
                "shortIds": short_ids,
                "settings": {
                    "publicKey": keys.public_key,
                    "fingerprint": "chrome",
                    "serverName": "",
                    "spiderX": "/",
                },
            },
            "tcpSettings": {
                "acceptProxyProtocol": false,
                "header": { "type": "none" },
            },
        })
        .to_string();
        let sniffing = serde_json::json!({
            "enabled": true,
            "destOverride": ["http", "tls", "quic", "fastopen"],
        })
        .to_string();
        let allocate = serde_json::json!({
            "strategy": "always",
            "refresh": 5,
            "concurrency": 3,
        })
        .to_string();

        let form = [
            ("up", "0".to_owned()),
            ("down", "0".to_owned()),
            ("total", "0".to_owned()),
            ("remark", self.inbound_remark.clone()),
            ("enable", "true".to_owned()),
            ("expiryTime", "0".to_owned()),
            ("listen", String::new()),
            ("port", self.inbound_port.to_string()),
            ("protocol", "vless".to_owned()),
            ("settings", settings),
            ("streamSettings", stream_settings),
            ("sniffing", sniffing),
            ("allocate", allocate),
        ];
        let inbound: Inbound = self
            .call("/panel/inbound/add", &form)
            .await?
            .accept("inbound/add")?
            .ok_or_else(|| PanelError::Api {
                endpoint: "inbound/add",
                message: "no inbound in response".to_owned(),
            })?;
        Ok(inbound.id)
    }

    async fn add_client(
        &self,
        inbound_id: i64,
        name: &str,
        quota_bytes: i64,
        expiry_ms: i64,
    ) -> Result<(), PanelError> {
        let settings = InboundSettings {
            clients: vec![ClientConfig {
                id: uuid::Uuid::new_v4().to_string(),
                flow: CLIENT_FLOW.to_owned(),
                email: name.to_owned(),
                limit_ip: 0,
                total_gb: quota_bytes,
                expiry_time: expiry_ms,
                enable: true,
                tg_id: String::new(),
                sub_id: random_sub_id(),
                reset: 0,
            }],
        };
        let form = [
            ("id", inbound_id.to_string()),
            ("settings", serde_json::to_string(&settings)?),
        ];
        self.call::<serde_json::Value>("/panel/inbound/addClient", &form)
            .await?
            .accept("addClient")?;
        Ok(())
    }

    async fn fetch_inbound(&self, id: i64) -> Result<Inbound, PanelError> {
        let inbounds: Vec<Inbound> = self
            .call("/panel/inbound/list", &[])
            .await?
            .accept("inbound/list")?
            .unwrap_or_default();
        inbounds
            .into_iter()
            .find(|inbound| inbound.id == id)
            .ok_or_else(|| PanelError::Api {
                endpoint: "inbound/list",
                message: format!("inbound {id} is missing from the panel"),
            })
    }

    /// Sends an authenticated POST, renewing the session once if the panel
    /// rejects it.
    async fn call<T: DeserializeOwned + Default>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<Envelope<T>, PanelError> {
        self.ensure_session().await?;
        if let Reply::Body(envelope) = self.attempt(path, form).await? {
            return Ok(envelope);
        }

        tracing::debug!(path, "panel session expired, logging in again");
        *self.session.write().await = None;
        self.login().await?;
        match self.attempt(path, form).await? {
            Reply::Body(envelope) => Ok(envelope),
            Reply::Expired(status) => Err(PanelError::Auth(format!(
                "session rejected again after re-login (HTTP {status})"
            ))),
        }
    }

    async fn ensure_session(&self) -> Result<(), PanelError> {
        if self.session.read().await.is_some() {
            return Ok(());
        }
        self.login().await
    }

    /// One authenticated request. An auth-level rejection (401/403, a
    /// redirect to the login page, or a non-JSON body) is reported as
    /// [`Reply::Expired`] rather than an error.
    async fn attempt<T: DeserializeOwned + Default>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<Reply<T>, PanelError> {
        let cookie = self.session.read().await.clone().unwrap_or_default();
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header(header::COOKIE, cookie)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
            || status.is_redirection()
        {
            return Ok(Reply::Expired(status));
        }

        let body = response.text().await?;
        match serde_json::from_str(&body) {
            Ok(envelope) => Ok(Reply::Body(envelope)),
            Err(_) => Ok(Reply::Expired(status)),
        }
    }
}

/// 16 characters of `[a-z0-9]`, the panel's subscription-id shape.
fn random_sub_id() -> String {
    let mut rng = rand::thread_rng();
    (0..16)
        .map(|_| {
            let idx = rng.gen_range(0..SUB_ID_CHARS.len());
            SUB_ID_CHARS[idx] as char
        })
        .collect()
}

/// A hex short id of random even length between 2 and 16.
fn random_short_id() -> String {
    let mut rng = rand::thread_rng();
    let len = 2 * rng.gen_range(1..=8);
    (0..len)
        .map(|_| char::from_digit(rng.gen_range(0..16), 16).unwrap_or('0'))
        .collect()
}
