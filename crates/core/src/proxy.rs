//! Proxy Configuration Types
//!
//! Outbound proxy settings for the provider and transcript HTTP clients.
//! The client factory itself lives in the `truth-detective-llm` crate.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Proxy protocol type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProxyProtocol {
    Http,
    Https,
    Socks5,
}

impl ProxyProtocol {
    /// Return the URL scheme string for this protocol.
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyProtocol::Http => "http",
            ProxyProtocol::Https => "https",
            ProxyProtocol::Socks5 => "socks5",
        }
    }
}

/// Proxy configuration as stored in the host config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProxyConfig {
    pub protocol: ProxyProtocol,
    pub host: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Build the proxy URL string (without auth).
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.protocol.scheme(), self.host, self.port)
    }

    /// Reject configurations a client builder would choke on.
    pub fn validate(&self) -> CoreResult<()> {
        if self.host.trim().is_empty() {
            return Err(CoreError::config("proxy host must not be empty"));
        }
        if self.port == 0 {
            return Err(CoreError::config("proxy port must be non-zero"));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(CoreError::config("proxy password given without a username"));
        }
        Ok(())
    }
}
