//! Client configuration.
//!
//! Read from a JSON file with camelCase keys, then overridden from
//! `KUKSA_CLIENT_*` environment variables.

use crate::domain::error::{ClientError, ClientResult};
use crate::domain::types::Protocol;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "kuksa-client.json";

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "KUKSA_CLIENT_";

/// File names expected inside `certs_dir`
pub const CLIENT_CERT_FILE: &str = "Client.pem";
pub const CLIENT_KEY_FILE: &str = "Client.key";
pub const CA_CERT_FILE: &str = "CA.pem";

/// Connection settings shared by both transports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Server host name or IP address
    pub server_address: String,
    /// Server port
    #[serde(deserialize_with = "port_from_number_or_string")]
    pub server_port: u16,
    /// Plain-text connection when true
    pub insecure: bool,
    /// Directory holding Client.pem, Client.key and CA.pem
    pub certs_dir: PathBuf,
    /// Token, or path to a file containing it
    pub token_or_tokenfile: String,
    /// Transport to use
    pub protocol: Protocol,
    /// Per-request deadline in milliseconds
    pub request_timeout_ms: u64,
    /// Capacity of each subscription's update queue
    pub subscription_buffer: usize,
    /// Server name checked during the TLS handshake, when it differs from the address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls_server_name: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1".to_string(),
            server_port: 8090,
            insecure: false,
            certs_dir: PathBuf::from("../kuksa_certificates"),
            token_or_tokenfile: String::new(),
            protocol: Protocol::Ws,
            request_timeout_ms: 1000,
            subscription_buffer: 10,
            tls_server_name: None,
        }
    }
}

impl ClientConfig {
    /// Load from `path`, or from [`DEFAULT_CONFIG_FILE`] when `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an
    /// error. Environment overrides are applied on top.
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    Self::from_file(default_path)?
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    Self::default()
                }
            }
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON config file without applying overrides.
    pub fn from_file(path: &Path) -> ClientResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| ClientError::Config(format!("invalid {}: {}", path.display(), e)))
    }

    /// Apply `KUKSA_CLIENT_*` overrides read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(address) = var("SERVERADDRESS") {
            self.server_address = address;
        }
        if let Some(port) = var("SERVERPORT") {
            match port.trim().parse() {
                Ok(p) => self.server_port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid {}SERVERPORT", ENV_PREFIX),
            }
        }
        if let Some(insecure) = var("INSECURE") {
            match crate::domain::array::parse_bool(&insecure) {
                Some(b) => self.insecure = b,
                None => warn!(value = %insecure, "Ignoring invalid {}INSECURE", ENV_PREFIX),
            }
        }
        if let Some(dir) = var("CERTSDIR") {
            self.certs_dir = PathBuf::from(dir);
        }
        if let Some(token) = var("TOKENORTOKENFILE") {
            self.token_or_tokenfile = token;
        }
        if let Some(protocol) = var("PROTOCOL") {
            match protocol.parse() {
                Ok(p) => self.protocol = p,
                Err(_) => warn!(value = %protocol, "Ignoring invalid {}PROTOCOL", ENV_PREFIX),
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> ClientResult<()> {
        if self.server_address.trim().is_empty() {
            return Err(ClientError::Config("serverAddress cannot be empty".into()));
        }
        if self.server_port == 0 {
            return Err(ClientError::Config("serverPort cannot be 0".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ClientError::Config("requestTimeoutMs cannot be 0".into()));
        }
        if self.subscription_buffer == 0 {
            return Err(ClientError::Config(
                "subscriptionBuffer cannot be 0".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// WebSocket URL for the message transport
    pub fn ws_url(&self) -> String {
        let scheme = if self.insecure { "ws" } else { "wss" };
        format!("{}://{}:{}", scheme, self.server_address, self.server_port)
    }

    /// Endpoint URI for the RPC transport
    pub fn grpc_url(&self) -> String {
        let scheme = if self.insecure { "http" } else { "https" };
        format!("{}://{}:{}", scheme, self.server_address, self.server_port)
    }

    pub fn client_cert_path(&self) -> PathBuf {
        self.certs_dir.join(CLIENT_CERT_FILE)
    }

    pub fn client_key_path(&self) -> PathBuf {
        self.certs_dir.join(CLIENT_KEY_FILE)
    }

    pub fn ca_cert_path(&self) -> PathBuf {
        self.certs_dir.join(CA_CERT_FILE)
    }
}

impl fmt::Display for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.token_or_tokenfile.is_empty() {
            "<none>".to_string()
        } else if Path::new(&self.token_or_tokenfile).is_file() {
            format!("file {}", self.token_or_tokenfile)
        } else {
            "<inline>".to_string()
        };
        writeln!(f, "  Server address: {}", self.server_address)?;
        writeln!(f, "  Server port:    {}", self.server_port)?;
        writeln!(f, "  Insecure:       {}", self.insecure)?;
        writeln!(f, "  Certs dir:      {}", self.certs_dir.display())?;
        writeln!(f, "  Token:          {}", token)?;
        write!(f, "  Protocol:       {}", self.protocol)
    }
}

fn port_from_number_or_string<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(p) => Ok(p),
        Port::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}
