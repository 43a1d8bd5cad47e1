//! Request dialects and endpoint URL handling.
//!
//! Nodes from the 0.37 line onward take JSON-RPC 2.0 POST bodies. Older nodes
//! are driven through URI-style GET requests, which every release serves.

/// Version prefixes that select [`RpcDialect::Modern`].
const MODERN_VERSION_PREFIXES: [&str; 3] = ["0.37.", "0.38.", "1."];

/// How requests are encoded for a given node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcDialect {
    /// JSON-RPC 2.0 POST to the endpoint root.
    Modern,
    /// `GET /<method>?param=value` with quoted strings and `0x` hex.
    Legacy,
}

impl RpcDialect {
    /// Pick the dialect for a reported node version such as `0.37.2` or `v0.34.27`.
    pub fn for_version(version: &str) -> Self {
        let version = version.trim().trim_start_matches('v');
        if MODERN_VERSION_PREFIXES
            .iter()
            .any(|prefix| version.starts_with(prefix))
        {
            Self::Modern
        } else {
            Self::Legacy
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Modern => "modern",
            Self::Legacy => "legacy",
        }
    }
}

/// Derive the HTTP query URL from a stream endpoint.
///
/// `wss://host/websocket` becomes `https://host`, `ws://` becomes `http://`.
/// Plain HTTP URLs pass through with any trailing slash removed.
pub fn query_url(endpoint: &str) -> String {
    let endpoint = endpoint.trim();
    let converted = if let Some(rest) = endpoint.strip_prefix("wss://") {
        format!("https://{rest}")
    } else if let Some(rest) = endpoint.strip_prefix("ws://") {
        format!("http://{rest}")
    } else {
        endpoint.to_string()
    };
    let trimmed = converted.trim_end_matches('/');
    trimmed
        .strip_suffix("/websocket")
        .unwrap_or(trimmed)
        .to_string()
}
