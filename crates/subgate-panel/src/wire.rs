//! Wire types for the panel dashboard API.
//!
//! Every endpoint answers a `{success, msg, obj}` envelope. Inbound
//! `settings` and `streamSettings` arrive as JSON encoded *strings* inside
//! the outer JSON document and are decoded separately.

use serde::{Deserialize, Serialize};

use crate::error::PanelError;

/// Response envelope shared by every panel endpoint.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub obj: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwraps the payload, turning a `success: false` envelope into an
    /// operation rejection.
    pub fn accept(self, endpoint: &'static str) -> Result<Option<T>, PanelError> {
        if self.success {
            Ok(self.obj)
        } else {
            Err(PanelError::Api {
                endpoint,
                message: self.msg,
            })
        }
    }
}

/// An inbound as listed by `/panel/inbound/list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inbound {
    pub id: i64,
    #[serde(default)]
    pub remark: String,
    pub port: u16,
    pub protocol: String,
    /// JSON string holding [`InboundSettings`].
    pub settings: String,
    /// JSON string holding [`StreamSettings`].
    pub stream_settings: String,
    #[serde(default)]
    pub client_stats: Vec<ClientStat>,
}

/// Per-client traffic counters attached to an inbound.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientStat {
    pub email: String,
    #[serde(default)]
    pub up: i64,
    #[serde(default)]
    pub down: i64,
    #[serde(default)]
    pub total: i64,
}

/// Decoded inbound `settings` blob. Also serialized as the body of
/// `addClient` requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundSettings {
    pub clients: Vec<ClientConfig>,
}

/// A client entry inside the inbound `settings` blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub id: String,
    #[serde(default)]
    pub flow: String,
    pub email: String,
    #[serde(default)]
    pub limit_ip: i64,
    /// Quota in bytes despite the name; zero means unlimited.
    #[serde(rename = "totalGB", default)]
    pub total_gb: i64,
    /// Entitlement end in UNIX milliseconds; zero means never.
    #[serde(default)]
    pub expiry_time: i64,
    pub enable: bool,
    #[serde(default)]
    pub tg_id: String,
    #[serde(default)]
    pub sub_id: String,
    #[serde(default)]
    pub reset: i64,
}

/// Decoded inbound `streamSettings` blob.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSettings {
    pub network: String,
    pub security: String,
    #[serde(default)]
    pub reality_settings: RealitySettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealitySettings {
    #[serde(default)]
    pub server_names: Vec<String>,
    #[serde(default)]
    pub short_ids: Vec<String>,
    #[serde(default)]
    pub settings: RealityClientSettings,
}

/// Client-facing REALITY parameters nested inside [`RealitySettings`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealityClientSettings {
    #[serde(default)]
    pub public_key: String,
    #[serde(default)]
    pub fingerprint: String,
    #[serde(default)]
    pub spider_x: String,
}

/// Key pair returned by `/server/getNewX25519Cert`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPair {
    pub private_key: String,
    pub public_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_accept_unwraps_payload() {
        let envelope: Envelope<Vec<i64>> =
            serde_json::from_str(r#"{"success": true, "msg": "", "obj": [1, 2]}"#).unwrap();
        assert_eq!(envelope.accept("list").unwrap(), Some(vec![1, 2]));
    }

    #[test]
    fn envelope_accept_rejects_failure() {
        let envelope: Envelope<Vec<i64>> =
            serde_json::from_str(r#"{"success": false, "msg": "nope"}"#).unwrap();
        match envelope.accept("list") {
            Err(PanelError::Api { endpoint, message }) => {
                assert_eq!(endpoint, "list");
                assert_eq!(message, "nope");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn inbound_settings_blob_round_trips() {
        let blob = r#"{"clients":[{"id":"u-1","flow":"xtls-rprx-vision","email":"light_7",
            "limitIp":0,"totalGB":32212254720,"expiryTime":1700000000000,"enable":true,
            "tgId":"","subId":"abcdefgh12345678","reset":0}],"decryption":"none"}"#;
        let settings: InboundSettings = serde_json::from_str(blob).unwrap();
        assert_eq!(settings.clients.len(), 1);
        let client = &settings.clients[0];
        assert_eq!(client.email, "light_7");
        assert_eq!(client.total_gb, 32_212_254_720);
        assert_eq!(client.expiry_time, 1_700_000_000_000);

        let out = serde_json::to_string(&settings).unwrap();
        assert!(out.contains(r#""totalGB":32212254720"#));
        assert!(out.contains(r#""limitIp":0"#));
    }

    #[test]
    fn stream_settings_blob_decodes() {
        let blob = r#"{"network":"tcp","security":"reality","realitySettings":{
            "serverNames":["example.com","www.example.com"],"shortIds":["ab12","cd34"],
            "privateKey":"priv","settings":{"publicKey":"pub","fingerprint":"chrome","spiderX":"/"}}}"#;
        let stream: StreamSettings = serde_json::from_str(blob).unwrap();
        assert_eq!(stream.network, "tcp");
        assert_eq!(stream.reality_settings.server_names[0], "example.com");
        assert_eq!(stream.reality_settings.settings.public_key, "pub");
    }
}
