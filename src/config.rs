//! Process configuration, read from the environment.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Six hours: how long a built reward top-up stays submittable.
pub const DEFAULT_VALIDITY_WINDOW_MS: u64 = 6 * 60 * 60 * 1000;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_LISTEN: &str = "0.0.0.0:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Knobs of the transaction builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Forward validity window for reward top-ups, in milliseconds.
    pub validity_window_ms: u64,
    /// Upper bound on a single ledger fetch.
    pub fetch_timeout: Duration,
}

impl ClientConfig {
    /// Rejects knobs that would make every plan unusable: a zero validity
    /// window yields an empty interval, a zero timeout fails every fetch.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.validity_window_ms == 0 {
            return Err(ConfigError::Invalid {
                var: "GITHONEY_VALIDITY_WINDOW_MS",
                reason: "must be greater than zero".into(),
            });
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "GITHONEY_FETCH_TIMEOUT_MS",
                reason: "must be greater than zero".into(),
            });
        }
        Ok(self)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            validity_window_ms: DEFAULT_VALIDITY_WINDOW_MS,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Settings of the `api` binary.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen: SocketAddr,
    /// JSON genesis used to seed the in-memory ledger.
    pub genesis: Option<PathBuf>,
    pub client: ClientConfig,
}

fn parse_var<T: std::str::FromStr>(var: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: format!("{raw:?}: {e}"),
            }),
        Err(_) => Ok(None),
    }
}

impl ApiConfig {
    /// Reads `GITHONEY_LISTEN`, `GITHONEY_GENESIS`,
    /// `GITHONEY_VALIDITY_WINDOW_MS` and `GITHONEY_FETCH_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let listen = match parse_var::<SocketAddr>("GITHONEY_LISTEN")? {
            Some(addr) => addr,
            None => DEFAULT_LISTEN.parse().map_err(|e| ConfigError::Invalid {
                var: "GITHONEY_LISTEN",
                reason: format!("{e}"),
            })?,
        };
        let mut client = ClientConfig::default();
        if let Some(ms) = parse_var::<u64>("GITHONEY_VALIDITY_WINDOW_MS")? {
            client.validity_window_ms = ms;
        }
        if let Some(ms) = parse_var::<u64>("GITHONEY_FETCH_TIMEOUT_MS")? {
            client.fetch_timeout = Duration::from_millis(ms);
        }
        Ok(Self {
            listen,
            genesis: env::var_os("GITHONEY_GENESIS").map(PathBuf::from),
            client: client.validated()?,
        })
    }
}
