//! HTTP Client Factory
//!
//! Builds the shared `reqwest` client and runs a prepared request down to its
//! body text, mapping transport and status failures on the way.

use truth_detective_core::ProxyConfig;

use crate::provider::parse_http_error;
use crate::types::{LlmError, LlmResult, ProviderType};

/// Build a `reqwest::Client` with the resolved proxy configuration.
///
/// - `Some(proxy)` -> configure proxy on the client
/// - `None` -> explicitly disable proxy (`no_proxy`), ignoring env vars
///
/// No request timeout is set; provider calls rely on the transport defaults.
pub fn build_http_client(proxy: Option<&ProxyConfig>) -> LlmResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    match proxy {
        Some(cfg) => {
            let mut p = reqwest::Proxy::all(cfg.url()).map_err(|e| LlmError::Network {
                message: format!("Invalid proxy {}: {}", cfg.url(), e),
            })?;
            if let (Some(u), Some(pw)) = (&cfg.username, &cfg.password) {
                p = p.basic_auth(u, pw);
            }
            builder = builder.proxy(p);
        }
        None => {
            builder = builder.no_proxy();
        }
    }
    builder.build().map_err(|e| LlmError::Network {
        message: format!("Failed to build HTTP client: {}", e),
    })
}

/// Send a request and return the body of a successful response.
pub(crate) async fn send_for_body(
    provider: ProviderType,
    request: reqwest::RequestBuilder,
) -> LlmResult<String> {
    let response = request.send().await.map_err(|e| LlmError::Network {
        message: e.to_string(),
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| LlmError::Network {
        message: e.to_string(),
    })?;

    if !status.is_success() {
        tracing::error!(
            provider = provider.as_str(),
            status = status.as_u16(),
            body = %body,
            "provider returned an error status"
        );
        return Err(parse_http_error(provider, status.as_u16(), &body));
    }

    Ok(body)
}
