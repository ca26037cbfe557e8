//! Connection-string assembly.

use url::Url;

/// Everything needed to format one client connection string.
#[derive(Debug)]
pub struct LinkParams<'a> {
    pub protocol: &'a str,
    pub uuid: &'a str,
    pub host: &'a str,
    pub port: u16,
    pub network: &'a str,
    pub security: &'a str,
    pub public_key: &'a str,
    pub fingerprint: &'a str,
    pub sni: &'a str,
    pub short_id: &'a str,
    pub spider_x: &'a str,
    pub flow: &'a str,
    pub remark: &'a str,
    pub name: &'a str,
}

/// Formats a client connection string:
/// `vless://{uuid}@{host}:{port}?type=…&security=…&…#{remark} - {name}`.
///
/// Pure string assembly; query values and the fragment are percent-encoded.
pub fn build(params: &LinkParams<'_>) -> Result<String, url::ParseError> {
    let mut url = Url::parse(&format!(
        "{}://{}@{}:{}",
        params.protocol, params.uuid, params.host, params.port
    ))?;
    url.query_pairs_mut()
        .append_pair("type", params.network)
        .append_pair("security", params.security)
        .append_pair("pbk", params.public_key)
        .append_pair("fp", params.fingerprint)
        .append_pair("sni", params.sni)
        .append_pair("sid", params.short_id)
        .append_pair("spx", params.spider_x)
        .append_pair("flow", params.flow);
    url.set_fragment(Some(&format!("{} - {}", params.remark, params.name)));
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params<'a>(host: &'a str, name: &'a str) -> LinkParams<'a> {
        LinkParams {
            protocol: "vless",
            uuid: "d9f0f924-1f3a-4e42-aa2f-6f90f9a9b3a1",
            host,
            port: 443,
            network: "tcp",
            security: "reality",
            public_key: "pubkey",
            fingerprint: "chrome",
            sni: "example.com",
            short_id: "ab12",
            spider_x: "/",
            flow: "xtls-rprx-vision",
            remark: "gate",
            name,
        }
    }

    #[test]
    fn link_carries_identity_and_stream_params() {
        let link = build(&params("203.0.113.9", "light_7")).unwrap();
        assert!(link.starts_with("vless://d9f0f924-1f3a-4e42-aa2f-6f90f9a9b3a1@203.0.113.9:443?"));
        assert!(link.contains("type=tcp"));
        assert!(link.contains("security=reality"));
        assert!(link.contains("pbk=pubkey"));
        assert!(link.contains("fp=chrome"));
        assert!(link.contains("sni=example.com"));
        assert!(link.contains("sid=ab12"));
        assert!(link.contains("flow=xtls-rprx-vision"));
    }

    #[test]
    fn query_values_are_percent_encoded() {
        let link = build(&params("203.0.113.9", "light_7")).unwrap();
        assert!(link.contains("spx=%2F"));
    }

    #[test]
    fn fragment_labels_the_credential() {
        let link = build(&params("203.0.113.9", "light_7")).unwrap();
        assert!(link.ends_with("#gate%20-%20light_7"));
    }

    #[test]
    fn hostname_hosts_are_accepted() {
        let link = build(&params("gate.example.net", "light_7")).unwrap();
        assert!(link.contains("@gate.example.net:443"));
    }
}
